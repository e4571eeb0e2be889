//! JSON-lines frame captures.
//!
//! The first line holds the [`SessionInfo`]; every following line is a
//! [`FrameRecord`].

use radarcore::sensor::{
    ConnectInfo, FrameInfo, FrameRecord, SensorConfig, SessionInfo, SweepFrame, Transport,
};
use radarcore::ClientError;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};

fn transport_error(err: impl std::fmt::Display) -> ClientError {
    ClientError::Transport(err.to_string())
}

/// Replays a recorded capture file.
pub struct ReplayTransport {
    path: PathBuf,
    lines: Option<Lines<BufReader<File>>>,
    session: Option<SessionInfo>,
}

impl ReplayTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: None,
            session: None,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, ClientError> {
        let lines = self
            .lines
            .as_mut()
            .ok_or_else(|| transport_error("capture file not open"))?;
        for line in lines {
            let line = line.map_err(transport_error)?;
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }
}

impl Transport for ReplayTransport {
    fn connect(&mut self) -> Result<ConnectInfo, ClientError> {
        let file = File::open(&self.path)
            .map_err(|err| transport_error(format!("{}: {}", self.path.display(), err)))?;
        self.lines = Some(BufReader::new(file).lines());
        let header = self
            .next_line()?
            .ok_or_else(|| transport_error("capture file is empty"))?;
        let session: SessionInfo = serde_json::from_str(&header).map_err(transport_error)?;
        self.session = Some(session);
        Ok(ConnectInfo {
            version: Some(format!("replay {}", self.path.display())),
        })
    }

    fn setup_session(&mut self, _config: &SensorConfig) -> Result<SessionInfo, ClientError> {
        self.session
            .clone()
            .ok_or_else(|| transport_error("capture header missing"))
    }

    fn start_streaming(&mut self) -> Result<(), ClientError> {
        Ok(())
    }

    fn next_frame(&mut self) -> Result<(FrameInfo, SweepFrame), ClientError> {
        let line = self.next_line()?.ok_or(ClientError::EndOfStream)?;
        FrameRecord::from_json_line(&line)
            .map_err(transport_error)?
            .into_frame()
            .ok_or_else(|| transport_error("ragged frame in capture file"))
    }

    fn stop_streaming(&mut self) -> Result<(), ClientError> {
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), ClientError> {
        self.lines = None;
        Ok(())
    }
}

/// Wraps a transport and writes every session and frame to a capture file.
pub struct RecordingTransport<T> {
    inner: T,
    writer: BufWriter<File>,
}

impl<T: Transport> RecordingTransport<T> {
    pub fn create(inner: T, path: &Path) -> std::io::Result<Self> {
        let writer = BufWriter::new(File::create(path)?);
        Ok(Self { inner, writer })
    }

    fn write_line(&mut self, line: &str) -> Result<(), ClientError> {
        writeln!(self.writer, "{}", line).map_err(transport_error)
    }
}

impl<T: Transport> Transport for RecordingTransport<T> {
    fn connect(&mut self) -> Result<ConnectInfo, ClientError> {
        self.inner.connect()
    }

    fn setup_session(&mut self, config: &SensorConfig) -> Result<SessionInfo, ClientError> {
        let session = self.inner.setup_session(config)?;
        let header = serde_json::to_string(&session).map_err(transport_error)?;
        self.write_line(&header)?;
        Ok(session)
    }

    fn start_streaming(&mut self) -> Result<(), ClientError> {
        self.inner.start_streaming()
    }

    fn next_frame(&mut self) -> Result<(FrameInfo, SweepFrame), ClientError> {
        let (info, frame) = self.inner.next_frame()?;
        let record = FrameRecord {
            info: info.clone(),
            data: frame.view().outer_iter().map(|row| row.to_vec()).collect(),
        };
        let line = record.to_json_line().map_err(transport_error)?;
        self.write_line(&line)?;
        Ok((info, frame))
    }

    fn stop_streaming(&mut self) -> Result<(), ClientError> {
        self.writer.flush().map_err(transport_error)?;
        self.inner.stop_streaming()
    }

    fn disconnect(&mut self) -> Result<(), ClientError> {
        self.writer.flush().map_err(transport_error)?;
        self.inner.disconnect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{GeneratorConfig, SyntheticTransport};
    use radarcore::sensor::SensorClient;

    #[test]
    fn recorded_capture_replays_identical_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.jsonl");
        let synthetic = SyntheticTransport::new(GeneratorConfig {
            realtime: false,
            idle_frames: 1,
            pass_frames: 2,
            ..Default::default()
        });

        let mut recorded = Vec::new();
        {
            let transport = RecordingTransport::create(synthetic, &path).unwrap();
            let mut client = SensorClient::new(transport);
            client.setup_session(&SensorConfig::default()).unwrap();
            client.start_streaming().unwrap();
            for _ in 0..3 {
                recorded.push(client.next_frame().unwrap().1);
            }
            client.disconnect().unwrap();
        }

        let mut client = SensorClient::new(ReplayTransport::new(&path));
        let session = client.setup_session(&SensorConfig::default()).unwrap();
        assert_eq!(session.actual_subsweep_rate, 12_000.0);
        client.start_streaming().unwrap();
        for expected in &recorded {
            let (_, frame) = client.next_frame().unwrap();
            assert_eq!(frame.view().dim(), expected.view().dim());
            assert!(frame
                .view()
                .iter()
                .zip(expected.view().iter())
                .all(|(a, b)| (a - b).abs() < 1e-9));
        }
        assert!(matches!(client.next_frame(), Err(ClientError::EndOfStream)));
    }

    #[test]
    fn missing_capture_file_is_a_transport_error() {
        let mut client = SensorClient::new(ReplayTransport::new("/nonexistent/capture.jsonl"));
        assert!(matches!(
            client.setup_session(&SensorConfig::default()),
            Err(ClientError::Transport(_))
        ));
    }
}
