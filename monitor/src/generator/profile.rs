use ndarray::Array2;
use radarcore::processing::HALF_WAVELENGTH;
use radarcore::sensor::{ConnectInfo, FrameInfo, SensorConfig, SessionInfo, SweepFrame, Transport};
use radarcore::ClientError;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::thread;
use std::time::Duration;

/// Parameters of the synthetic passing-target source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub subsweep_rate: f64,
    pub depths: usize,
    /// Target speed in km/h.
    pub target_speed_kmh: f64,
    pub amplitude: f64,
    pub noise: f64,
    /// Empty frames between two passes.
    pub idle_frames: usize,
    /// Frames during which the target is visible.
    pub pass_frames: usize,
    pub approaching: bool,
    /// Pace frames at the configured sweep rate.
    pub realtime: bool,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            subsweep_rate: 12_000.0,
            depths: 10,
            target_speed_kmh: 12.0,
            amplitude: 20.0,
            noise: 0.5,
            idle_frames: 400,
            pass_frames: 60,
            approaching: true,
            realtime: true,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    /// Doppler frequency of the target in Hz.
    pub fn doppler_hz(&self) -> f64 {
        self.target_speed_kmh / 3.6 / HALF_WAVELENGTH
    }
}

/// Transport producing frames of a target repeatedly passing the sensor.
pub struct SyntheticTransport {
    config: GeneratorConfig,
    sensor: Option<SensorConfig>,
    rng: StdRng,
    sequence: u64,
}

impl SyntheticTransport {
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            sensor: None,
            rng,
            sequence: 0,
        }
    }

    /// Depth bin of the target for the current frame, `None` while idle.
    fn target_depth(&self) -> Option<usize> {
        let cycle = (self.config.idle_frames + self.config.pass_frames).max(1) as u64;
        let position = (self.sequence % cycle) as usize;
        let offset = position.checked_sub(self.config.idle_frames)?;
        let depths = self.config.depths.max(1);
        let progressed = offset * depths / self.config.pass_frames.max(1);
        let depth = progressed.min(depths - 1);
        Some(if self.config.approaching {
            depths - 1 - depth
        } else {
            depth
        })
    }

    fn build_frame(&mut self, subsweeps: usize) -> SweepFrame {
        let depths = self.config.depths.max(1);
        let noise = self.config.noise.abs();
        let rng = &mut self.rng;
        let mut data = Array2::from_shape_fn((subsweeps, depths), |_| {
            if noise > 0.0 {
                rng.gen_range(-noise..noise)
            } else {
                0.0
            }
        });

        if let Some(depth) = self.target_depth() {
            let step = 2.0 * PI * self.config.doppler_hz() / self.config.subsweep_rate;
            let start_phase = self.rng.gen_range(0.0..2.0 * PI);
            for n in 0..subsweeps {
                data[[n, depth]] += self.config.amplitude * (start_phase + step * n as f64).sin();
            }
        }
        SweepFrame::new(data)
    }
}

impl Transport for SyntheticTransport {
    fn connect(&mut self) -> Result<ConnectInfo, ClientError> {
        Ok(ConnectInfo {
            version: Some(format!("synthetic-{}", env!("CARGO_PKG_VERSION"))),
        })
    }

    fn setup_session(&mut self, config: &SensorConfig) -> Result<SessionInfo, ClientError> {
        if config.number_of_subsweeps == 0 {
            return Err(ClientError::Transport("subsweep count must be positive".into()));
        }
        self.sensor = Some(config.clone());
        Ok(SessionInfo {
            actual_subsweep_rate: self.config.subsweep_rate,
            actual_range_start: config.range_start(),
            actual_range_length: config.range_length(),
            data_length: config.number_of_subsweeps * self.config.depths.max(1),
        })
    }

    fn start_streaming(&mut self) -> Result<(), ClientError> {
        self.sequence = 0;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<(FrameInfo, SweepFrame), ClientError> {
        let sensor = self
            .sensor
            .clone()
            .ok_or_else(|| ClientError::Transport("session not configured".into()))?;
        if self.config.realtime && sensor.sweep_rate > 0.0 {
            thread::sleep(Duration::from_secs_f64(1.0 / sensor.sweep_rate));
        }
        let frame = self.build_frame(sensor.number_of_subsweeps);
        let info = FrameInfo {
            sequence_number: self.sequence,
            sensor: sensor.sensor,
            timestamp: None,
        };
        self.sequence += 1;
        Ok((info, frame))
    }

    fn stop_streaming(&mut self) -> Result<(), ClientError> {
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), ClientError> {
        self.sensor = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(config: GeneratorConfig) -> SyntheticTransport {
        let mut transport = SyntheticTransport::new(config);
        transport.setup_session(&SensorConfig::default()).unwrap();
        transport
    }

    #[test]
    fn frames_match_session_shape() {
        let mut transport = transport(GeneratorConfig {
            realtime: false,
            ..Default::default()
        });
        let (info, frame) = transport.next_frame().unwrap();
        assert_eq!(info.sequence_number, 0);
        assert_eq!(frame.num_subsweeps(), SensorConfig::default().number_of_subsweeps);
        assert_eq!(frame.num_depths(), 10);
    }

    #[test]
    fn approaching_target_moves_towards_first_depth() {
        let mut transport = transport(GeneratorConfig {
            idle_frames: 2,
            pass_frames: 10,
            depths: 10,
            realtime: false,
            ..Default::default()
        });
        let mut depths = Vec::new();
        for _ in 0..12 {
            depths.push(transport.target_depth());
            transport.next_frame().unwrap();
        }
        assert_eq!(depths[0], None);
        assert_eq!(depths[2], Some(9));
        assert_eq!(depths[11], Some(0));
    }

    #[test]
    fn doppler_matches_half_wavelength() {
        let config = GeneratorConfig {
            target_speed_kmh: 3.6,
            ..Default::default()
        };
        assert!((config.doppler_hz() - 1.0 / HALF_WAVELENGTH).abs() < 1e-9);
    }
}
