//! Builds configured node trees from definitions.
//!
//! Construction of one list:
//!
//! 1. rewrite the list with the registry's rules until it settles
//! 2. read the head atom as the node name and instantiate it
//! 3. construct every list argument as a child of the same family, depth-first
//! 4. hand atoms and children to `configure`

use tracing::debug;

use crate::nodes::{Arg, Node};
use crate::runtime::registry::NodeRegistry;
use crate::syntax::{display_list, parse, Term};
use crate::EasysshError;

/// Parses `input` and constructs the node it defines.
pub fn construct_from_str<N: Node>(
    input: &str,
    registry: &NodeRegistry<N>,
) -> Result<N, EasysshError> {
    let term = parse(input)?;
    debug!("MakeFromString {input} -> {term}");
    construct(term, registry)
}

pub fn construct<N: Node>(term: Term, registry: &NodeRegistry<N>) -> Result<N, EasysshError> {
    let items = match term {
        Term::List(items) => items,
        atom @ Term::Atom(_) => {
            return Err(EasysshError::MalformedTerm {
                term: atom.to_string(),
                message: "a node definition must be a list".to_string(),
            })
        }
    };

    let items = registry.rules().rewrite(items)?;
    let shown = display_list(&items);
    let malformed = |message: &str| EasysshError::MalformedTerm {
        term: shown.clone(),
        message: message.to_string(),
    };

    let mut items = items.into_iter();
    let name = match items.next() {
        Some(Term::Atom(bytes)) => {
            String::from_utf8(bytes).map_err(|_| malformed("node name is not valid UTF-8"))?
        }
        Some(Term::List(_)) => return Err(malformed("node name must be an atom")),
        None => return Err(malformed("empty definition")),
    };

    let factory = registry
        .get(&name)
        .ok_or_else(|| EasysshError::UnknownNode {
            family: registry.family(),
            name: name.clone(),
            supported: registry.supported_names(),
        })?;
    let mut node = factory();

    let args = items
        .map(|item| match item {
            Term::Atom(bytes) => Ok(Arg::Atom(bytes)),
            list @ Term::List(_) => construct(list, registry).map(Arg::Node),
        })
        .collect::<Result<Vec<_>, _>>()?;

    node.configure(args)?;
    debug!("Make {shown} -> {node}");
    Ok(node)
}
