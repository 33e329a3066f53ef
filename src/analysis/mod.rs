pub mod periodicity;
pub mod similarity;

pub use periodicity::*;
pub use similarity::*;
