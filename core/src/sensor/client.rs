use crate::prelude::{ClientError, ClientResult};
use crate::sensor::frame::{FrameInfo, SensorConfig, SessionInfo, SweepFrame};
use log::{info, warn};

/// Details reported by the sensor server on connect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectInfo {
    pub version: Option<String>,
}

/// Raw transport hooks; lifecycle checks live in [`SensorClient`].
pub trait Transport {
    fn connect(&mut self) -> ClientResult<ConnectInfo>;
    fn setup_session(&mut self, config: &SensorConfig) -> ClientResult<SessionInfo>;
    fn start_streaming(&mut self) -> ClientResult<()>;
    fn next_frame(&mut self) -> ClientResult<(FrameInfo, SweepFrame)>;
    fn stop_streaming(&mut self) -> ClientResult<()>;
    fn disconnect(&mut self) -> ClientResult<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self) -> ClientResult<ConnectInfo> {
        (**self).connect()
    }

    fn setup_session(&mut self, config: &SensorConfig) -> ClientResult<SessionInfo> {
        (**self).setup_session(config)
    }

    fn start_streaming(&mut self) -> ClientResult<()> {
        (**self).start_streaming()
    }

    fn next_frame(&mut self) -> ClientResult<(FrameInfo, SweepFrame)> {
        (**self).next_frame()
    }

    fn stop_streaming(&mut self) -> ClientResult<()> {
        (**self).stop_streaming()
    }

    fn disconnect(&mut self) -> ClientResult<()> {
        (**self).disconnect()
    }
}

/// Source of frames consumed by the polling loop.
pub trait FrameSource {
    fn next_frame(&mut self) -> ClientResult<(FrameInfo, SweepFrame)>;
}

/// Sensor client enforcing the connect / setup / stream lifecycle once for
/// every transport.
pub struct SensorClient<T: Transport> {
    transport: T,
    connected: bool,
    session_setup_done: bool,
    streaming: bool,
}

impl<T: Transport> SensorClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            connected: false,
            session_setup_done: false,
            streaming: false,
        }
    }

    pub fn connect(&mut self) -> ClientResult<ConnectInfo> {
        if self.connected {
            return Err(ClientError::AlreadyConnected);
        }
        let info = self.transport.connect()?;
        self.connected = true;
        match &info.version {
            Some(version) => info!("reported version: {}", version),
            None => warn!("could not read software version (might be too old)"),
        }
        Ok(info)
    }

    /// Applies `config`, connecting first when needed.
    pub fn setup_session(&mut self, config: &SensorConfig) -> ClientResult<SessionInfo> {
        if self.streaming {
            return Err(ClientError::SessionWhileStreaming);
        }
        if !self.connected {
            self.connect()?;
        }
        let session = self.transport.setup_session(config)?;
        self.session_setup_done = true;

        let start_ok = (config.range_start() - session.actual_range_start).abs() < 0.01;
        let len_ok = (config.range_length() - session.actual_range_length).abs() < 0.01;
        if !start_ok || !len_ok {
            warn!("actual measured range differs from the requested");
        }
        Ok(session)
    }

    pub fn start_streaming(&mut self) -> ClientResult<()> {
        if self.streaming {
            return Err(ClientError::AlreadyStreaming);
        }
        if !self.session_setup_done {
            return Err(ClientError::SessionNotSetUp);
        }
        self.transport.start_streaming()?;
        self.streaming = true;
        Ok(())
    }

    pub fn next_frame(&mut self) -> ClientResult<(FrameInfo, SweepFrame)> {
        if !self.streaming {
            return Err(ClientError::NotStreaming);
        }
        self.transport.next_frame()
    }

    pub fn stop_streaming(&mut self) -> ClientResult<()> {
        if !self.streaming {
            return Err(ClientError::NotStreaming);
        }
        self.transport.stop_streaming()?;
        self.streaming = false;
        Ok(())
    }

    /// Disconnects, stopping the stream first if it is running.
    pub fn disconnect(&mut self) -> ClientResult<()> {
        if !self.connected {
            return Err(ClientError::NotConnected);
        }
        if self.streaming {
            self.stop_streaming()?;
        }
        self.transport.disconnect()?;
        self.connected = false;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> FrameSource for SensorClient<T> {
    fn next_frame(&mut self) -> ClientResult<(FrameInfo, SweepFrame)> {
        SensorClient::next_frame(self)
    }
}
