pub mod profile;
pub mod replay;
