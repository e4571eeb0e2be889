pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    /// Largest value ignoring NaN entries, `None` when nothing comparable remains.
    pub fn max(samples: &[f64]) -> Option<f64> {
        samples
            .iter()
            .copied()
            .filter(|value| !value.is_nan())
            .reduce(f64::max)
    }

    /// Index of the first maximum, NaN entries never win.
    pub fn argmax(samples: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, &value) in samples.iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            match best {
                Some((_, current)) if value <= current => {}
                _ => best = Some((idx, value)),
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// `count` evenly spaced values from `start` to `stop` inclusive.
    pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
        match count {
            0 => Vec::new(),
            1 => vec![start],
            _ => {
                let step = (stop - start) / (count - 1) as f64;
                (0..count).map(|i| start + step * i as f64).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_sequence_is_zero() {
        assert_eq!(StatsHelper::mean(&[]), 0.0);
        assert_eq!(StatsHelper::mean(&[1.0, 3.0]), 2.0);
    }

    #[test]
    fn argmax_prefers_first_maximum_and_skips_nan() {
        assert_eq!(StatsHelper::argmax(&[1.0, 4.0, 4.0, f64::NAN]), Some(1));
        assert_eq!(StatsHelper::argmax(&[f64::NAN]), None);
        assert_eq!(StatsHelper::max(&[f64::NAN, 2.0, 1.0]), Some(2.0));
    }

    #[test]
    fn linspace_includes_both_ends() {
        assert_eq!(StatsHelper::linspace(2.0, 3.0, 3), vec![2.0, 2.5, 3.0]);
        assert_eq!(StatsHelper::linspace(2.0, 3.0, 1), vec![2.0]);
    }
}
