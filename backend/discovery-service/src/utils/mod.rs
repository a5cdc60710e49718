pub mod params;
pub mod timeout;

pub use timeout::run_with_timeout;
