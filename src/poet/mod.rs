mod gates;
mod orchestrator;
mod preambles;
mod verdict;

pub use gates::*;
pub use orchestrator::*;
pub use preambles::*;
pub use verdict::*;
