//! Action surface normalization.
//!
//! Accepting many call signatures via reflection-based dispatch has no good
//! Rust equivalent and isn't idiomatic here, so this crate exposes exactly
//! one normalized signature (`for<'a> Fn(&mut Context<'a>) -> Result<()>`)
//! plus a small set of typed adapters that convert looser shapes into it.

use std::fmt;
use std::sync::Arc;

use crate::error::{CliError, Result};

use super::context::Context;

type ActionFn = dyn for<'a> Fn(&mut Context<'a>) -> Result<()> + Send + Sync;

/// A single unit of pipeline work. Cheap to clone (reference-counted), so
/// the same action can be registered as both a command's Action and a
/// hook's payload without duplicating the closure.
#[derive(Clone)]
pub struct Action(Arc<ActionFn>);

impl Action {
    /// The canonical signature: `Context → Result<()>`.
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(&mut Context<'a>) -> Result<()> + Send + Sync + 'static,
    {
        Action(Arc::new(f))
    }

    /// Adapts `Context → ()` (infallible actions never fail).
    pub fn infallible<F>(f: F) -> Self
    where
        F: for<'a> Fn(&mut Context<'a>) + Send + Sync + 'static,
    {
        Action::new(move |ctx| {
            f(ctx);
            Ok(())
        })
    }

    /// Adapts `() → Result<()>`, for actions that don't need the context
    /// (e.g. a constant `SetData` value computed once).
    pub fn niladic<F>(f: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        Action::new(move |_ctx| f())
    }

    /// Adapts `() → ()`.
    pub fn niladic_infallible<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Action::new(move |_ctx| {
            f();
            Ok(())
        })
    }

    /// Wraps an action so it always succeeds, discarding errors. Used by
    /// `IfMatch`/`Customize` adapters that must not fail Initialize.
    pub fn ignore_errors(self) -> Self {
        Action::new(move |ctx| {
            let _ = self.call(ctx);
            Ok(())
        })
    }

    pub fn call(&self, ctx: &mut Context<'_>) -> Result<()> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action(..)")
    }
}

/// `HandleCommandNotFound`: consulted by the parser when no
/// subcommand matches a token and tokens remain. Returns the name of an
/// existing sibling command to redirect to, or `None` to let the default
/// `UnexpectedPositional` error fire. Synthesizing a brand-new command at
/// parse time is not supported here — the tree is read-only once Initialize
/// ends, and this crate keeps that invariant absolute rather than
/// carve out a parse-time exception for it (see DESIGN.md).
pub type CommandNotFoundFn =
    Arc<dyn for<'a> Fn(&mut Context<'a>, &str) -> Result<Option<String>> + Send + Sync>;

/// An ordered sequence of actions run at one timing for one context. The
/// first failure short-circuits the remaining actions in the pipeline
///.
#[derive(Clone, Default, Debug)]
pub struct ActionPipeline(Vec<Action>);

impl ActionPipeline {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, action: Action) {
        self.0.push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Runs every action in declared order. Stops at, and returns, the
    /// first error; callers that must keep running the remainder (After's
    /// "errors are aggregated" rule) use `run_collect` instead.
    pub fn run(&self, ctx: &mut Context<'_>) -> Result<()> {
        for action in &self.0 {
            action.call(ctx)?;
        }
        Ok(())
    }

    /// Runs every action regardless of earlier failures, returning the
    /// first error encountered: remaining After actions still run even
    /// once one has failed.
    pub fn run_collect(&self, ctx: &mut Context<'_>) -> Result<()> {
        let mut first_err: Option<CliError> = None;
        for action in &self.0 {
            if let Err(e) = action.call(ctx) {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
