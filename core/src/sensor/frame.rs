use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// One sweep: rows are subsweeps, columns are depth bins.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepFrame {
    data: Array2<f64>,
}

impl SweepFrame {
    pub fn new(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// Builds a frame from row-major subsweep rows; all rows must share a length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let depths = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != depths) {
            return None;
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Array2::from_shape_vec((rows.len(), depths), flat)
            .ok()
            .map(Self::new)
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn num_subsweeps(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_depths(&self) -> usize {
        self.data.ncols()
    }
}

/// Metadata delivered alongside each frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub sequence_number: u64,
    pub sensor: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

/// Session parameters actually applied by the sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub actual_subsweep_rate: f64,
    pub actual_range_start: f64,
    pub actual_range_length: f64,
    /// Samples per sweep, subsweeps times depth bins.
    pub data_length: usize,
}

/// Requested sensor setup, forwarded to the transport untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub sensor: u32,
    pub range_interval: [f64; 2],
    pub number_of_subsweeps: usize,
    pub sweep_rate: f64,
    pub gain: f64,
}

impl SensorConfig {
    pub fn range_start(&self) -> f64 {
        self.range_interval[0]
    }

    pub fn range_length(&self) -> f64 {
        self.range_interval[1] - self.range_interval[0]
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sensor: 1,
            range_interval: [2.1, 3.0],
            number_of_subsweeps: 64,
            sweep_rate: 200.0,
            gain: 0.6,
        }
    }
}

/// Recorded frame as stored in a JSON-lines capture file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    pub info: FrameInfo,
    pub data: Vec<Vec<f64>>,
}

impl FrameRecord {
    pub fn from_json_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn into_frame(self) -> Option<(FrameInfo, SweepFrame)> {
        let frame = SweepFrame::from_rows(&self.data)?;
        Some((self.info, frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_from_rows_rejects_ragged_input() {
        assert!(SweepFrame::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_none());
        let frame = SweepFrame::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(frame.num_subsweeps(), 2);
        assert_eq!(frame.num_depths(), 2);
    }

    #[test]
    fn frame_record_parses_json_line() {
        let line = r#"{"info":{"sequence_number":4,"sensor":1},"data":[[0.5,1.0],[0.0,2.0]]}"#;
        let (info, frame) = FrameRecord::from_json_line(line)
            .unwrap()
            .into_frame()
            .unwrap();
        assert_eq!(info.sequence_number, 4);
        assert_eq!(frame.view()[[1, 1]], 2.0);
    }
}
