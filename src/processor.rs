pub use convolver::Convolver;
pub use filter::Filter;
pub use gain::Gain;

mod convolver;
mod filter;
mod gain;
