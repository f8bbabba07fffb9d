//! The dispatcher: runs Initialize to a fix point, then the
//! bubble-Before / leaf-Action / tunnel-After traversal over a resolved
//! command path.
//!
//! Traversal disciplines, spec §4.F:
//! - **Bubble** (Before): a command's own Before fires before its
//!   children's, and hooks registered on any ancestor that match the full
//!   matched path fire once, immediately before the leaf's Action.
//! - **Tunnel** (Initialize, After): ancestors initialize/tear down their
//!   descendants before/after themselves — Initialize walks root-to-leaf;
//!   After walks leaf-to-root, running each ancestor's matching hooks
//!   immediately before that ancestor's own After.
//!
//! This ordering is verified against the literal hook-sequence scenario in
//! the engine's integration tests.

use crate::command::{CommandTree, NodeId};
use crate::error::{CliError, Result};

use super::context::{CancellationToken, Context, Io, Target};
use super::timing::Timing;

/// Runs Initialize over the whole tree to a fix point: nodes added by an
/// Initialize action (via `Context::queue_mutation`) are themselves
/// initialized on the next pass, until a pass adds nothing new. Each node's `initialized` flag prevents re-running an
/// already-initialized node's Initialize pipeline.
pub fn run_initialize(tree: &mut CommandTree, io: &Io, cancel: &CancellationToken) -> Result<()> {
    loop {
        let mutations = super::context::MutationQueueHandle::new();
        initialize_node(tree, tree.root_id(), io, cancel, &mutations)?;
        let pending = mutations.drain();
        if pending.is_empty() {
            return Ok(());
        }
        for edit in pending {
            edit(tree)?;
        }
    }
}

fn initialize_node(
    tree: &CommandTree,
    id: NodeId,
    io: &Io,
    cancel: &CancellationToken,
    mutations: &super::context::MutationQueueHandle,
) -> Result<()> {
    let node = tree.node(id);
    if !*node.initialized.borrow() {
        tracing::debug!(command = %node.name, timing = ?Timing::Initial, "phase transition");
        // `Customize(pattern, action)`: ancestors' matching
        // hooks run before this node's own Initialize, tunnel-style, same
        // discipline as `executeAfterDescendent` in the After phase.
        let mut ancestors = Vec::new();
        let mut cur = node.parent;
        while let Some(a) = cur {
            ancestors.push(a);
            cur = tree.node(a).parent;
        }
        ancestors.reverse();
        for ancestor in ancestors {
            for (pattern, action) in tree.node(ancestor).pipeline.hooks_initial() {
                if tree.matches_pattern(id, &pattern) {
                    tracing::trace!(command = %node.name, ancestor = %tree.node(ancestor).name, "customize hook matched");
                    let mut ctx = Context::new(
                        Timing::Initial,
                        tree,
                        Target::Command(id),
                        io.clone(),
                        cancel.clone(),
                        Vec::new(),
                        mutations.queue(),
                    );
                    action.call(&mut ctx)?;
                }
            }
        }

        let mut ctx = Context::new(
            Timing::Initial,
            tree,
            Target::Command(id),
            io.clone(),
            cancel.clone(),
            Vec::new(),
            mutations.queue(),
        );
        node.pipeline.run(Timing::Initial, &mut ctx)?;

        for (idx, flag) in node.flags.iter().enumerate() {
            let mut ctx = Context::new(
                Timing::Initial,
                tree,
                Target::Flag(id, idx),
                io.clone(),
                cancel.clone(),
                Vec::new(),
                mutations.queue(),
            );
            flag.pipeline.run(Timing::Initial, &mut ctx)?;
            if let Some(init) = flag.value.borrow().initializer() {
                init.call(&mut ctx)?;
            }
        }

        for (idx, arg) in node.args.iter().enumerate() {
            let mut ctx = Context::new(
                Timing::Initial,
                tree,
                Target::Arg(id, idx),
                io.clone(),
                cancel.clone(),
                Vec::new(),
                mutations.queue(),
            );
            arg.pipeline.run(Timing::Initial, &mut ctx)?;
            if let Some(init) = arg.value.borrow().initializer() {
                init.call(&mut ctx)?;
            }
        }

        *node.initialized.borrow_mut() = true;
    }

    for &child in &node.children {
        initialize_node(tree, child, io, cancel, mutations)?;
    }
    Ok(())
}

/// Runs Before/Action/After over `path` (root-to-leaf node ids of the
/// matched command chain). `argv` is what `Context::argv` reports during
/// the leaf's Action.
pub fn execute_path(
    tree: &CommandTree,
    path: &[NodeId],
    argv: Vec<String>,
    io: &Io,
    cancel: &CancellationToken,
) -> Result<()> {
    let leaf = *path.last().expect("execute_path: empty path");

    // `SkipCommand` is not an error: it aborts only the Action
    // phase of this invocation. Before phases of every node still run to
    // completion (env/file sourcing, required-option bookkeeping), and
    // After always fires afterward — only the two Action blocks below are
    // gated on it.
    let mut skip_action = false;

    for (i, &id) in path.iter().enumerate() {
        let is_leaf = i + 1 == path.len();
        let node = tree.node(id);

        tracing::debug!(command = %node.name, timing = ?Timing::Before, "phase transition");
        let mut ctx = before_ctx(tree, Target::Command(id), &argv, io, cancel);
        match node.pipeline.run(Timing::Before, &mut ctx) {
            Ok(()) => {}
            Err(CliError::SkipCommand) => skip_action = true,
            Err(e) => return Err(e),
        }

        for (idx, flag) in node.flags.iter().enumerate() {
            apply_flag_sources(flag, io)?;
            if flag.options.implied_action || flag.state.borrow().should_run_action() {
                let mut ctx = before_ctx(tree, Target::Flag(id, idx), &argv, io, cancel);
                match flag.pipeline.run(Timing::Before, &mut ctx) {
                    Ok(()) => {}
                    Err(CliError::SkipCommand) => skip_action = true,
                    Err(e) => return Err(e),
                }
            }
        }
        for (idx, arg) in node.args.iter().enumerate() {
            apply_arg_sources(arg, io)?;
            if arg.options.implied_action || arg.state.borrow().should_run_action() {
                let mut ctx = before_ctx(tree, Target::Arg(id, idx), &argv, io, cancel);
                match arg.pipeline.run(Timing::Before, &mut ctx) {
                    Ok(()) => {}
                    Err(CliError::SkipCommand) => skip_action = true,
                    Err(e) => return Err(e),
                }
            }
        }

        if is_leaf {
            for &ancestor in path {
                for (pattern, action) in tree.node(ancestor).pipeline.hooks_before() {
                    if tree.matches_pattern(leaf, &pattern) {
                        tracing::trace!(leaf = %tree.node(leaf).name, ancestor = %tree.node(ancestor).name, "before hook matched");
                        let mut ctx = before_ctx(tree, Target::Command(leaf), &argv, io, cancel);
                        match action.call(&mut ctx) {
                            Ok(()) => {}
                            Err(CliError::SkipCommand) => skip_action = true,
                            Err(e) => return Err(e),
                        }
                    }
                }
            }
            if !skip_action {
                tracing::debug!(command = %node.name, timing = ?Timing::Action, "phase transition");
                let mut ctx = Context::new(
                    Timing::Action,
                    tree,
                    Target::Command(leaf),
                    io.clone(),
                    cancel.clone(),
                    argv.clone(),
                    super::context::MutationQueueHandle::new().queue(),
                );
                node.pipeline.run(Timing::Action, &mut ctx)?;
            } else {
                tracing::debug!(command = %node.name, "action phase skipped by SkipCommand");
            }
        }

        if !skip_action {
            for (idx, arg) in node.args.iter().enumerate() {
                if arg.options.implied_action || arg.state.borrow().should_run_action() {
                    let mut ctx = action_ctx(tree, Target::Arg(id, idx), &argv, io, cancel);
                    arg.pipeline.run(Timing::Action, &mut ctx)?;
                }
            }
            for (idx, flag) in node.flags.iter().enumerate() {
                if flag.options.implied_action || flag.state.borrow().should_run_action() {
                    let mut ctx = action_ctx(tree, Target::Flag(id, idx), &argv, io, cancel);
                    flag.pipeline.run(Timing::Action, &mut ctx)?;
                    // `Exits`: on success, exit 0 right after
                    // this flag's own Action — same orderly-return shape as
                    // the explicit `Exit(code)` action.
                    if flag.options.exits {
                        return Err(CliError::Exit(0));
                    }
                }
            }
        }
    }

    let mut first_err = None;
    for &id in path.iter().rev() {
        let node = tree.node(id);
        // Spec invariant 3: a required option must be `Seen()` by the time
        // its own command's After phase runs.
        if let Err(e) = require_seen(node) {
            first_err.get_or_insert(e);
        }
        for (pattern, action) in node.pipeline.hooks_after() {
            if tree.matches_pattern(leaf, &pattern) {
                tracing::trace!(leaf = %tree.node(leaf).name, ancestor = %node.name, "after hook matched");
                let mut ctx = after_ctx(tree, Target::Command(id), &argv, io, cancel);
                if let Err(e) = action.call(&mut ctx) {
                    first_err.get_or_insert(e);
                }
            }
        }
        tracing::debug!(command = %node.name, timing = ?Timing::After, "phase transition");
        let mut ctx = after_ctx(tree, Target::Command(id), &argv, io, cancel);
        if let Err(e) = node.pipeline.run(Timing::After, &mut ctx) {
            first_err.get_or_insert(e);
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn require_seen(node: &crate::command::CommandNode) -> Result<()> {
    for flag in &node.flags {
        if flag.options.required && !flag.state.borrow().seen() {
            return Err(crate::error::ValidationError::RequiredMissing {
                name: flag.name.clone(),
            }
            .into());
        }
    }
    for arg in &node.args {
        if arg.options.required && !arg.state.borrow().seen() {
            return Err(crate::error::ValidationError::RequiredMissing {
                name: arg.name.clone(),
            }
            .into());
        }
    }
    Ok(())
}

/// `FromEnv`/`FromFilePath` sourcing: consulted during
/// Before of each option, first non-empty source in declared order wins.
/// Only applies when the option hasn't already been bound from argv.
fn apply_flag_sources(flag: &crate::command::FlagSlot, io: &Io) -> Result<()> {
    if flag.state.borrow().seen() {
        return Ok(());
    }
    let Some(raw) = first_source_value(&flag.env_vars, flag.file_source.as_deref(), io) else {
        return Ok(());
    };
    let text = crate::parser::apply_transform(flag, raw.clone());
    flag.value.borrow_mut().set(&text, crate::parser::set_opts(flag))?;
    flag.state.borrow_mut().record_occurrence(raw);
    Ok(())
}

fn apply_arg_sources(arg: &crate::command::ArgSlot, io: &Io) -> Result<()> {
    if arg.state.borrow().seen() {
        return Ok(());
    }
    let Some(raw) = first_source_value(&arg.env_vars, arg.file_source.as_deref(), io) else {
        return Ok(());
    };
    let text = match &arg.transform {
        Some(f) => f(raw.clone()),
        None => raw.clone(),
    };
    let opts = super::super::value::SetOptions {
        disable_splitting: arg.options.disable_splitting,
        merge: arg.options.merge,
    };
    arg.value.borrow_mut().set(&text, opts)?;
    arg.state.borrow_mut().record_occurrence(raw);
    Ok(())
}

/// First non-empty value among the env vars in declared order, falling
/// back to the file source.
fn first_source_value(env_vars: &[String], file_source: Option<&std::path::Path>, io: &Io) -> Option<String> {
    for var in env_vars {
        if let Ok(val) = std::env::var(var) {
            if !val.is_empty() {
                return Some(val);
            }
        }
    }
    let path = file_source?;
    io.fs.read_file(&path.to_string_lossy()).ok().filter(|s| !s.is_empty())
}

fn before_ctx<'a>(
    tree: &'a CommandTree,
    target: Target,
    argv: &[String],
    io: &Io,
    cancel: &CancellationToken,
) -> Context<'a> {
    Context::new(
        Timing::Before,
        tree,
        target,
        io.clone(),
        cancel.clone(),
        argv.to_vec(),
        super::context::MutationQueueHandle::new().queue(),
    )
}

fn action_ctx<'a>(
    tree: &'a CommandTree,
    target: Target,
    argv: &[String],
    io: &Io,
    cancel: &CancellationToken,
) -> Context<'a> {
    Context::new(
        Timing::Action,
        tree,
        target,
        io.clone(),
        cancel.clone(),
        argv.to_vec(),
        super::context::MutationQueueHandle::new().queue(),
    )
}

fn after_ctx<'a>(
    tree: &'a CommandTree,
    target: Target,
    argv: &[String],
    io: &Io,
    cancel: &CancellationToken,
) -> Context<'a> {
    Context::new(
        Timing::After,
        tree,
        target,
        io.clone(),
        cancel.clone(),
        argv.to_vec(),
        super::context::MutationQueueHandle::new().queue(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandTree;
    use crate::pipeline::builtins;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn io_cancel() -> (Io, CancellationToken) {
        (Io::real(), CancellationToken::new())
    }

    #[test]
    fn skip_command_aborts_action_but_after_still_runs() {
        let mut tree = CommandTree::new("app");
        let root = tree.root_id();
        let action_ran = Arc::new(AtomicBool::new(false));
        let after_ran = Arc::new(AtomicBool::new(false));
        {
            let action_ran = action_ran.clone();
            tree.node_mut(root)
                .pipeline
                .push(Timing::Action, crate::pipeline::Action::infallible(move |_| {
                    action_ran.store(true, Ordering::SeqCst);
                }));
        }
        {
            let after_ran = after_ran.clone();
            tree.node_mut(root)
                .pipeline
                .push(Timing::After, crate::pipeline::Action::infallible(move |_| {
                    after_ran.store(true, Ordering::SeqCst);
                }));
        }
        tree.node_mut(root).pipeline.push(Timing::Before, builtins::skip_command());

        let (io, cancel) = io_cancel();
        run_initialize(&mut tree, &io, &cancel).unwrap();
        execute_path(&tree, &[root], vec!["app".to_string()], &io, &cancel).unwrap();

        assert!(!action_ran.load(Ordering::SeqCst), "Action must not run after SkipCommand");
        assert!(after_ran.load(Ordering::SeqCst), "After must still run after SkipCommand");
    }
}
