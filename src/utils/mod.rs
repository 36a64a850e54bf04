pub mod limits;

pub use limits::*;
