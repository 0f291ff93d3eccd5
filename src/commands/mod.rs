pub mod extract;
pub mod simulate;

pub use extract::extract_statistics;
pub use simulate::simulate_series;
