//! Filters transform the discovered target list before execution.
//!
//! Filters take the list by value and return a new one; order is preserved unless a
//! filter's contract says otherwise.

use std::fmt;

use crate::diagnostics::Family;
use crate::nodes::{Arg, Node};
use crate::runtime::{Context, NodeRegistry};
use crate::target::Target;
use crate::EasysshError;

mod basic;
mod coalesce;
mod ec2;
mod external;

pub use basic::{First, Id, ListFilter};
pub use coalesce::Coalesce;
pub use ec2::Ec2InstanceId;
pub use external::ExternalFilter;

#[derive(Debug)]
pub enum Filter {
    Id(Id),
    First(First),
    List(ListFilter),
    Coalesce(Coalesce),
    External(ExternalFilter),
    Ec2InstanceId(Ec2InstanceId),
}

impl Filter {
    /// An unconfigured `(id)`.
    pub fn identity() -> Self {
        Filter::Id(Id)
    }

    pub fn filter(&self, targets: Vec<Target>, ctx: &Context) -> Result<Vec<Target>, EasysshError> {
        match self {
            Filter::Id(_) => Ok(targets),
            Filter::First(_) => Ok(targets.into_iter().take(1).collect()),
            Filter::List(f) => f.filter(targets, ctx),
            Filter::Coalesce(f) => f.filter(targets),
            Filter::External(f) => f.filter(targets, ctx),
            Filter::Ec2InstanceId(f) => f.filter(targets, ctx),
        }
    }
}

impl Node for Filter {
    const FAMILY: Family = Family::Filter;

    fn configure(&mut self, args: Vec<Arg<Self>>) -> Result<(), EasysshError> {
        match self {
            Filter::Id(f) => f.configure(args),
            Filter::First(f) => f.configure(args),
            Filter::List(f) => f.configure(args),
            Filter::Coalesce(f) => f.configure(args),
            Filter::External(f) => f.configure(args),
            Filter::Ec2InstanceId(f) => f.configure(args),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Id(x) => fmt::Display::fmt(x, f),
            Filter::First(x) => fmt::Display::fmt(x, f),
            Filter::List(x) => fmt::Display::fmt(x, f),
            Filter::Coalesce(x) => fmt::Display::fmt(x, f),
            Filter::External(x) => fmt::Display::fmt(x, f),
            Filter::Ec2InstanceId(x) => fmt::Display::fmt(x, f),
        }
    }
}

/// Built-in filters.
pub fn registry() -> Result<NodeRegistry<Filter>, EasysshError> {
    let mut registry = NodeRegistry::new();
    registry.register("id", Filter::identity)?;
    registry.register("first", || Filter::First(First))?;
    registry.register("list", || Filter::List(ListFilter::default()))?;
    registry.register("coalesce", || Filter::Coalesce(Coalesce::default()))?;
    registry.register("external", || Filter::External(ExternalFilter::default()))?;
    registry.register("ec2-instance-id", || {
        Filter::Ec2InstanceId(Ec2InstanceId::default())
    })?;
    Ok(registry)
}
