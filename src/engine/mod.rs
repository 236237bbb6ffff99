pub mod trend;

pub use trend::TrendEngine;
