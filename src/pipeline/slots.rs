//! Per-target pipeline slots.
//!
//! Every command, flag, and arg carries one `PipelineSlots`. The tree
//! structure itself is immutable once Initialize ends, but the *contents*
//! of a slot can still grow at runtime — `c.After(fn)` called from a
//! running Action legitimately appends to the After slot — so
//! each slot is behind its own `RefCell` rather than requiring `&mut` on
//! the owning node.

use std::cell::RefCell;

use super::action::{Action, ActionPipeline};
use super::context::Context;
use super::timing::Timing;
use crate::command::PathPattern;
use crate::error::Result;

#[derive(Debug, Default)]
pub struct PipelineSlots {
    uses: RefCell<ActionPipeline>,
    before: RefCell<ActionPipeline>,
    action: RefCell<ActionPipeline>,
    after: RefCell<ActionPipeline>,
    hooks_before: RefCell<Vec<(PathPattern, Action)>>,
    hooks_after: RefCell<Vec<(PathPattern, Action)>>,
    /// `Customize(pattern, action)` payloads: run at Initialize
    /// for matched descendants, same tunnel discipline as `hooks_after`.
    hooks_initial: RefCell<Vec<(PathPattern, Action)>>,
}

impl PipelineSlots {
    /// Appends `action` to the slot named by `timing`.
    pub fn push(&self, timing: Timing, action: Action) {
        match timing {
            Timing::Initial => self.uses.borrow_mut().push(action),
            Timing::Before => self.before.borrow_mut().push(action),
            Timing::Action => self.action.borrow_mut().push(action),
            Timing::After => self.after.borrow_mut().push(action),
        }
    }

    pub fn is_empty(&self, timing: Timing) -> bool {
        match timing {
            Timing::Initial => self.uses.borrow().is_empty(),
            Timing::Before => self.before.borrow().is_empty(),
            Timing::Action => self.action.borrow().is_empty(),
            Timing::After => self.after.borrow().is_empty(),
        }
    }

    /// Runs the slot named by `timing`. `After` uses `run_collect` so a
    /// failing teardown action doesn't suppress the ones that follow it.
    pub fn run(&self, timing: Timing, ctx: &mut Context<'_>) -> Result<()> {
        match timing {
            Timing::Initial => self.uses.borrow().run(ctx),
            Timing::Before => self.before.borrow().run(ctx),
            Timing::Action => self.action.borrow().run(ctx),
            Timing::After => self.after.borrow().run_collect(ctx),
        }
    }

    pub fn push_hook_before(&self, pattern: PathPattern, action: Action) {
        self.hooks_before.borrow_mut().push((pattern, action));
    }

    pub fn push_hook_after(&self, pattern: PathPattern, action: Action) {
        self.hooks_after.borrow_mut().push((pattern, action));
    }

    pub fn hooks_before(&self) -> Vec<(PathPattern, Action)> {
        self.hooks_before.borrow().clone()
    }

    pub fn hooks_after(&self) -> Vec<(PathPattern, Action)> {
        self.hooks_after.borrow().clone()
    }

    pub fn push_hook_initial(&self, pattern: PathPattern, action: Action) {
        self.hooks_initial.borrow_mut().push((pattern, action));
    }

    pub fn hooks_initial(&self) -> Vec<(PathPattern, Action)> {
        self.hooks_initial.borrow().clone()
    }
}
