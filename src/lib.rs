pub mod error;
pub mod model;
pub mod sys;

pub use error::{Error, Result};
