//! Discoverers turn the operator's lookup string into targets.

use std::fmt;

use crate::diagnostics::Family;
use crate::macros::RewriteRule;
use crate::nodes::{Arg, Node};
use crate::runtime::{Context, NodeRegistry};
use crate::target::Target;
use crate::EasysshError;

mod first_matching;
mod fixed;
mod knife;
mod separated_by;

pub use first_matching::FirstMatching;
pub use fixed::Fixed;
pub use knife::{Knife, KnifeAddress};
pub use separated_by::SeparatedBy;

#[derive(Debug)]
pub enum Discoverer {
    Fixed(Fixed),
    SeparatedBy(SeparatedBy),
    FirstMatching(FirstMatching),
    Knife(Knife),
}

impl Discoverer {
    pub fn discover(&self, input: &str, ctx: &Context) -> Result<Vec<Target>, EasysshError> {
        match self {
            Discoverer::Fixed(d) => d.discover(),
            Discoverer::SeparatedBy(d) => d.discover(input),
            Discoverer::FirstMatching(d) => d.discover(input, ctx),
            Discoverer::Knife(d) => d.discover(input, ctx),
        }
    }
}

impl Node for Discoverer {
    const FAMILY: Family = Family::Discoverer;

    fn configure(&mut self, args: Vec<Arg<Self>>) -> Result<(), EasysshError> {
        match self {
            Discoverer::Fixed(d) => d.configure(args),
            Discoverer::SeparatedBy(d) => d.configure(args),
            Discoverer::FirstMatching(d) => d.configure(args),
            Discoverer::Knife(d) => d.configure(args),
        }
    }
}

impl fmt::Display for Discoverer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discoverer::Fixed(d) => fmt::Display::fmt(d, f),
            Discoverer::SeparatedBy(d) => fmt::Display::fmt(d, f),
            Discoverer::FirstMatching(d) => fmt::Display::fmt(d, f),
            Discoverer::Knife(d) => fmt::Display::fmt(d, f),
        }
    }
}

/// Built-in discoverers and their aliases.
pub fn registry() -> Result<NodeRegistry<Discoverer>, EasysshError> {
    let mut registry = NodeRegistry::new();
    registry.register("fixed", || Discoverer::Fixed(Fixed::default()))?;
    registry.register("separated-by", || {
        Discoverer::SeparatedBy(SeparatedBy::default())
    })?;
    registry.register("first-matching", || {
        Discoverer::FirstMatching(FirstMatching::default())
    })?;
    registry.register("knife", || Discoverer::Knife(Knife::new(KnifeAddress::Ip)))?;
    registry.register("knife-hostname", || {
        Discoverer::Knife(Knife::new(KnifeAddress::Hostname))
    })?;

    registry
        .add_rule(RewriteRule::rename("const", "fixed"))
        .add_rule(RewriteRule::replace("(comma-separated)", "(separated-by ,)")?);
    Ok(registry)
}
