pub use crate::diagnostics::EasysshError;

pub mod cli;
pub mod diagnostics;
pub mod engine;
pub mod macros;
pub mod nodes;
pub mod runtime;
pub mod syntax;
pub mod target;

#[cfg(test)]
mod testing;
