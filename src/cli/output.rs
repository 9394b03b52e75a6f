//! Handles all user-facing output for the CLI.
//!
//! Logs and captured job output go through `tracing`; this module only prints the
//! `--list-nodes` and `--explain` reports.

use std::io::Write;

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::engine::Explanation;
use crate::runtime::Registries;
use crate::syntax::display_list;

fn stdout() -> StandardStream {
    let choice = if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

fn heading(stdout: &mut StandardStream, text: &str) {
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
    let _ = writeln!(stdout, "{text}");
    let _ = stdout.reset();
}

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// Prints every supported node name, grouped by family.
pub fn print_supported_names(registries: &Registries) {
    let mut stdout = stdout();
    let families = [
        ("discoverers", registries.discoverers.supported_names()),
        ("filters", registries.filters.supported_names()),
        ("executors", registries.executors.supported_names()),
    ];
    for (family, names) in families {
        heading(&mut stdout, &format!("{family}:"));
        for name in names {
            let _ = writeln!(stdout, "  {name}");
        }
    }
}

/// Prints each definition's rewrite steps as colored diffs, then the node it built.
pub fn print_explanations(explanations: &[Explanation]) {
    let mut stdout = stdout();
    for explanation in explanations {
        heading(
            &mut stdout,
            &format!("--- {}: {} ---", explanation.family, explanation.definition),
        );
        for (i, step) in explanation.steps.iter().enumerate() {
            let _ = writeln!(stdout, "Step {}: {}", i + 1, step.rule);
            let before = display_list(&step.input);
            let after = display_list(&step.output);
            let changeset = Changeset::new(&before, &after, " ");
            print_diff(&mut stdout, &changeset.diffs);
        }
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
        let _ = writeln!(stdout, "=> {}", explanation.description);
        let _ = stdout.reset();
        let _ = writeln!(stdout);
    }
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn print_diff(stdout: &mut StandardStream, diffs: &[Difference]) {
    for diff in diffs {
        match diff {
            Difference::Same(x) => {
                let _ = stdout.reset();
                let _ = writeln!(stdout, "  {x}");
            }
            Difference::Add(x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                let _ = writeln!(stdout, "+ {x}");
            }
            Difference::Rem(x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                let _ = writeln!(stdout, "- {x}");
            }
        }
    }
    let _ = stdout.reset();
}
