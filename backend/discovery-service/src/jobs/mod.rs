pub mod session_sweeper;

pub use session_sweeper::start_session_sweeper;
