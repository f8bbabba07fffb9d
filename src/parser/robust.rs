//! Robust parse mode: captures a parse failure into a partial-bindings record
//! instead of aborting, so shell-completion producers (out of scope here)
//! can inspect tokens-so-far and the last incomplete token.

use std::cell::RefCell;

use crate::command::NodeId;
use crate::error::UsageError;

/// What completion needs: the path matched so far, every token successfully
/// consumed, the last token that was in flight when parsing gave up, and
/// the error that stopped it.
#[derive(Debug, Clone)]
pub struct PartialBindings {
    pub path: Vec<NodeId>,
    pub consumed: Vec<String>,
    pub last_incomplete: Option<String>,
    pub failure: UsageError,
}

/// Interior-mutable accumulator threaded through the recursive descent so
/// that whichever call frame trips a `UsageError` doesn't need to thread the
/// bookkeeping back up by hand — the top-level `parse` entry point reads it
/// once the error has propagated out.
#[derive(Default)]
pub struct PartialBuilder {
    path: RefCell<Vec<NodeId>>,
    consumed: RefCell<Vec<String>>,
    last_incomplete: RefCell<Option<String>>,
}

impl PartialBuilder {
    pub fn enter(&self, node: NodeId) {
        self.path.borrow_mut().push(node);
    }

    pub fn consume(&self, token: impl Into<String>) {
        self.consumed.borrow_mut().push(token.into());
    }

    pub fn mark_incomplete(&self, token: impl Into<String>) {
        *self.last_incomplete.borrow_mut() = Some(token.into());
    }

    pub fn finish(&self, failure: UsageError) -> PartialBindings {
        PartialBindings {
            path: self.path.borrow().clone(),
            consumed: self.consumed.borrow().clone(),
            last_incomplete: self.last_incomplete.borrow().clone(),
            failure,
        }
    }
}
