use std::fmt;

use crate::diagnostics::Arity;
use crate::nodes::{atom_strings, check_arity, Arg, Filter};
use crate::target::{Coalescer, Target};
use crate::EasysshError;

/// `(coalesce field...)`: sets which target fields form the ssh address, in order.
///
/// Fields are `ip`, `host` and `hostname`.
#[derive(Debug, Default)]
pub struct Coalesce {
    order: Vec<Coalescer>,
}

impl Coalesce {
    pub(crate) fn configure(&mut self, args: Vec<Arg<Filter>>) -> Result<(), EasysshError> {
        let owner = self.to_string();
        check_arity(&owner, Arity::AtLeast(1), &args)?;
        let names = atom_strings(&owner, args)?;
        let order = names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                name.parse::<Coalescer>().map_err(|_| {
                    EasysshError::invalid_argument(
                        &owner,
                        format!("unknown target coalescer {name} (index {index})"),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.order = order;
        Ok(())
    }

    pub(crate) fn filter(&self, targets: Vec<Target>) -> Result<Vec<Target>, EasysshError> {
        if self.order.is_empty() {
            return Err(EasysshError::unconfigured(self));
        }
        Ok(targets
            .into_iter()
            .map(|target| target.with_coalesce_order(self.order.clone()))
            .collect())
    }
}

impl fmt::Display for Coalesce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.order.iter().map(Coalescer::as_str).collect();
        write!(f, "<coalesce [{}]>", names.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::construct_from_str;

    fn make(definition: &str) -> Result<Filter, EasysshError> {
        let registry = crate::nodes::filters::registry()?;
        construct_from_str(definition, &registry)
    }

    #[test]
    fn sets_the_order_on_every_target() {
        let coalesce = match make("(coalesce hostname ip)").unwrap() {
            Filter::Coalesce(c) => c,
            other => panic!("unexpected {other}"),
        };
        assert_eq!(coalesce.to_string(), "<coalesce [hostname ip]>");

        let target = Target::new("web-1.internal", Some("10.0.0.1".parse().unwrap()))
            .unwrap()
            .with_hostname("web-1");
        let without_hostname = Target::from_ip("10.0.0.2".parse().unwrap());
        let out = coalesce.filter(vec![target, without_hostname]).unwrap();
        let addresses: Vec<String> = out.iter().map(Target::ssh_target).collect();
        assert_eq!(addresses, vec!["web-1", "10.0.0.2"]);
        assert_eq!(out[0].coalesce_order(), &[Coalescer::Hostname, Coalescer::Ip]);
    }

    #[test]
    fn unknown_coalescer_names_its_index() {
        let err = make("(coalesce ip foobar hostname)").unwrap_err();
        assert_eq!(
            err.to_string(),
            "<coalesce []>: unknown target coalescer foobar (index 1)"
        );
    }

    #[test]
    fn needs_at_least_one_field() {
        let err = make("(coalesce)").unwrap_err();
        assert!(matches!(err, EasysshError::Arity { received: 0, .. }));
    }
}
