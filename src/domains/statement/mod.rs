pub mod completeness;

pub use completeness::is_complete;
