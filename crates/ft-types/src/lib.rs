pub mod errors;
pub mod sample;
pub mod trial;

pub use errors::*;
pub use sample::*;
pub use trial::*;
