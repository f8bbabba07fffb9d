//! `App`: the crate's outer entry point — construct once, hand it argv,
//! get back an exit code. Everything it does (`run_initialize`, `parse`,
//! `execute_path`, error formatting) is already implemented in
//! `pipeline`/`parser`; this module is just the one place that sequences
//! them and decides what reaches stderr.

use std::io::Write;

use crate::command::{CommandTree, NodeId};
use crate::error::CliError;
use crate::parser::{self, ParseOutcome};
use crate::pipeline::{engine, synopsis, CancellationToken, Io};

/// What the process should do once `App::run` returns: exit cleanly, or
/// exit with a specific code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    Code(i32),
}

impl ExitOutcome {
    pub fn code(self) -> i32 {
        match self {
            ExitOutcome::Success => 0,
            ExitOutcome::Code(code) => code,
        }
    }
}

pub struct App {
    tree: CommandTree,
}

impl App {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            tree: CommandTree::new(root_name),
        }
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut CommandTree {
        &mut self.tree
    }

    pub fn root_id(&self) -> NodeId {
        self.tree.root_id()
    }

    /// Runs Initialize to a fix point, parses `argv` against the resulting
    /// tree, and if a command matched, runs its Before/Action/After chain.
    /// `argv` excludes the program name.
    pub fn run(mut self, argv: Vec<String>) -> ExitOutcome {
        self.run_with_io(argv, Io::real(), CancellationToken::new())
    }

    /// `run` with an injectable `Io`/`CancellationToken`, used by tests and
    /// by callers that want to wire their own signal handling ahead of
    /// time.
    pub fn run_with_io(mut self, argv: Vec<String>, io: Io, cancel: CancellationToken) -> ExitOutcome {
        if let Err(e) = engine::run_initialize(&mut self.tree, &io, &cancel) {
            return Self::report(&self.tree, self.tree.root_id(), &io, e);
        }

        match parser::parse(&self.tree, &argv, &io, &cancel, false) {
            Ok(ParseOutcome::Matched(invocation)) => {
                let leaf = *invocation.path.last().expect("parse always produces a non-empty path");
                match engine::execute_path(&self.tree, &invocation.path, invocation.argv, &io, &cancel) {
                    Ok(()) => ExitOutcome::Success,
                    Err(e) => Self::report(&self.tree, leaf, &io, e),
                }
            }
            Ok(ParseOutcome::Partial(_)) => {
                unreachable!("App::run always parses in non-robust mode")
            }
            Err(e) => Self::report(&self.tree, self.tree.root_id(), &io, e),
        }
    }

    /// `Exit`/`SkipCommand` are orderly outcomes, not failures — nothing is
    /// written to stderr for either. Everything else gets a
    /// one-line message, with a synopsis appended for the error classes a
    /// user can act on (bad flags/args, missing requireds).
    fn report(tree: &CommandTree, node: NodeId, io: &Io, err: CliError) -> ExitOutcome {
        match &err {
            CliError::Exit(code) => return ExitOutcome::Code(*code),
            CliError::SkipCommand => return ExitOutcome::Code(0),
            _ => {}
        }
        let code = err.exit_code();
        let mut stderr = io.stderr.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(stderr, "error: {err}");
        if matches!(err, CliError::Usage(_) | CliError::Validation(_)) {
            let _ = writeln!(stderr, "usage: {}", synopsis::render(tree, node));
        }
        ExitOutcome::Code(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ArgSlot, FlagSlot};
    use crate::value::builtins::StringValue;

    fn io_cancel() -> (Io, CancellationToken) {
        (
            Io::new(std::io::sink(), std::io::sink(), std::io::empty(), std::sync::Arc::new(crate::pipeline::fs::RealFs)),
            CancellationToken::new(),
        )
    }

    #[test]
    fn missing_required_arg_exits_nonzero() {
        let mut app = App::new("app");
        let root = app.root_id();
        app.tree_mut()
            .add_arg(root, ArgSlot::new("name", Box::new(StringValue::default()), 1).required())
            .unwrap();
        let (io, cancel) = io_cancel();
        let outcome = app.run_with_io(vec![], io, cancel);
        assert_eq!(outcome, ExitOutcome::Code(1));
    }

    #[test]
    fn successful_run_exits_zero() {
        let mut app = App::new("app");
        let root = app.root_id();
        app.tree_mut()
            .add_flag(root, FlagSlot::new("name", Box::new(StringValue::default())))
            .unwrap();
        let (io, cancel) = io_cancel();
        let outcome = app.run_with_io(vec!["--name".to_string(), "x".to_string()], io, cancel);
        assert_eq!(outcome, ExitOutcome::Success);
    }
}
