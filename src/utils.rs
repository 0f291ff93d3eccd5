use chrono::{DateTime, Utc};
use nalgebra::DMatrix;

/// Shorten `s` to at most `max_len` characters, marking the cut with "...".
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        kept + "..."
    }
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Mean over the finite entries of a matrix, NaN if there are none.
pub fn finite_mean(matrix: &DMatrix<f64>) -> f64 {
    let (sum, count) = matrix
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Row-major nested rows, for JSON output.
pub fn matrix_rows<T: nalgebra::Scalar + Copy>(matrix: &DMatrix<T>) -> Vec<Vec<T>> {
    matrix
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}
