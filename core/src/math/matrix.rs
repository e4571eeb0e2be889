use ndarray::{Array2, ArrayView2, Axis};

pub struct MatrixHelper;

impl MatrixHelper {
    /// Subtract the per-column mean taken along the row axis.
    pub fn zero_mean_columns(matrix: ArrayView2<f64>) -> Array2<f64> {
        let mut centered = matrix.to_owned();
        if matrix.nrows() == 0 {
            return centered;
        }
        if let Some(means) = matrix.mean_axis(Axis(0)) {
            centered -= &means.insert_axis(Axis(0));
        }
        centered
    }
}
