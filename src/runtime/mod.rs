//! Registries, node construction and the process-running services nodes depend on.

pub mod construct;
pub mod context;
pub mod process;
pub mod registry;

pub use construct::{construct, construct_from_str};
pub use context::Context;
pub use registry::{NodeRegistry, Registries};
