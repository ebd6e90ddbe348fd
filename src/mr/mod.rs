pub mod emitter;
pub mod error;
pub mod mapper;
pub mod rows;

pub use error::{Error, Result};
