pub mod runner;

pub use runner::{RunOutcome, TestRunner};
