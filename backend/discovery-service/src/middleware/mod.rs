pub mod viewer;

pub use viewer::{Viewer, VIEWER_HEADER};
