// Utility functions
pub mod error;
pub mod number;

pub use error::*;
pub use number::*;
