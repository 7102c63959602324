pub mod checklist;
mod checkers;
pub mod evaluate;
pub mod matcher;
pub mod normalize;
pub mod registry;
#[cfg(test)]
mod tests;

pub use evaluate::{EvaluationConfig, evaluate};
pub use registry::builtin;
