pub mod indicators;
pub mod fibonacci;


pub use indicators::*;
pub use fibonacci::*;
