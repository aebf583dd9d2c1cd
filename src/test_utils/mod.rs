//! the test_utils folder here will share utils or test components between
//! unit tests
mod recorder;
mod scripted_backend;

pub use recorder::*;
pub use scripted_backend::*;
