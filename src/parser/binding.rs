//! Positional arg-binding state machine.
//!
//! Holds the ordered list of counters for one command's args and offers
//! tokens to the current one, advancing past exhausted counters until one
//! accepts the token, defers it to the flag lane (intersperse), or every
//! counter is spent.

use crate::argcount::TakeOutcome;
use crate::command::CommandNode;
use crate::error::Result;
use crate::value::SetOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionalOutcome {
    /// The token was bound to an arg's destination.
    Bound,
    /// Every counter for this command is spent; the caller should try
    /// subcommand dispatch or raise `UnexpectedPositional`.
    NoMoreCounters,
    /// Intersperse mode: the token must be handed to the flag lane without
    /// advancing past the current counter.
    DeferToFlagLane,
}

pub struct ArgBinding<'t> {
    node: &'t CommandNode,
    current: usize,
}

impl<'t> ArgBinding<'t> {
    pub fn new(node: &'t CommandNode) -> Self {
        Self { node, current: 0 }
    }

    pub fn offer(&mut self, token: &str, is_flag_shaped: bool) -> Result<PositionalOutcome> {
        loop {
            if self.current >= self.node.args.len() {
                return Ok(PositionalOutcome::NoMoreCounters);
            }
            let arg = &self.node.args[self.current];
            let outcome = arg.counter.borrow_mut().take(token, is_flag_shaped);
            match outcome {
                TakeOutcome::Accepted => {
                    let opts = SetOptions {
                        disable_splitting: arg.options.disable_splitting,
                        merge: arg.options.merge,
                    };
                    let text = match &arg.transform {
                        Some(f) => f(token.to_string()),
                        None => token.to_string(),
                    };
                    arg.value.borrow_mut().set(&text, opts)?;
                    arg.state.borrow_mut().record_occurrence(token.to_string());
                    return Ok(PositionalOutcome::Bound);
                }
                TakeOutcome::EndOfArguments => {
                    self.current += 1;
                    continue;
                }
                TakeOutcome::CannotUseFlag => return Ok(PositionalOutcome::DeferToFlagLane),
            }
        }
    }

    /// Finalizes every counter for this command, regardless of whether it
    /// was ever reached — an untouched `Discrete(n)` still reports its
    /// shortfall.
    pub fn finish(&self) -> Result<()> {
        for arg in &self.node.args {
            arg.counter.borrow().done(&arg.name)?;
        }
        Ok(())
    }
}

/// Right-to-left fill. Takes
/// the positional tokens already separated from flags by the caller's
/// left-to-right scan, and distributes them to counters in reverse: the
/// last arg is filled first, excess cascades leftward. Implemented by
/// reversing both the counter order and the token order and running the
/// ordinary left-to-right distribution — which produces the same bindings
/// as if positions were reversed, as required.
pub fn bind_right_to_left(node: &CommandNode, positional_tokens: &[String]) -> Result<()> {
    let n = node.args.len();
    let order: Vec<usize> = (0..n).rev().collect();
    let mut order_pos = 0usize;

    for token in positional_tokens.iter().rev() {
        loop {
            if order_pos >= order.len() {
                return Err(crate::error::UsageError::UnexpectedPositional {
                    token: token.clone(),
                }
                .into());
            }
            let idx = order[order_pos];
            let arg = &node.args[idx];
            let outcome = arg.counter.borrow_mut().take(token, false);
            match outcome {
                TakeOutcome::Accepted => {
                    let opts = SetOptions {
                        disable_splitting: arg.options.disable_splitting,
                        merge: arg.options.merge,
                    };
                    let text = match &arg.transform {
                        Some(f) => f(token.clone()),
                        None => token.clone(),
                    };
                    arg.value.borrow_mut().set(&text, opts)?;
                    arg.state.borrow_mut().record_occurrence(token.clone());
                    break;
                }
                TakeOutcome::EndOfArguments | TakeOutcome::CannotUseFlag => {
                    order_pos += 1;
                    continue;
                }
            }
        }
    }
    for arg in &node.args {
        arg.counter.borrow().done(&arg.name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ArgSlot, CommandTree};
    use crate::value::builtins::StringValue;
    use crate::value::Value;

    fn node_with_args(counts: &[i64]) -> (CommandTree, crate::command::NodeId) {
        let mut tree = CommandTree::new("app");
        let root = tree.root_id();
        for (i, n) in counts.iter().enumerate() {
            tree.add_arg(root, ArgSlot::new(format!("a{i}"), Box::new(StringValue::default()), *n))
                .unwrap();
        }
        (tree, root)
    }

    #[test]
    fn right_to_left_fills_last_arg_first() {
        let (tree, root) = node_with_args(&[0, 0, 1]);
        bind_right_to_left(tree.node(root), &["1".to_string()]).unwrap();
        let node = tree.node(root);
        assert_eq!(node.args[0].value.borrow().string(), "");
        assert_eq!(node.args[1].value.borrow().string(), "");
        assert_eq!(node.args[2].value.borrow().string(), "1");
    }

    #[test]
    fn left_to_right_binding_advances_past_exhausted_counters() {
        let (tree, root) = node_with_args(&[1, 1]);
        let node = tree.node(root);
        let mut binding = ArgBinding::new(node);
        assert_eq!(binding.offer("x", false).unwrap(), PositionalOutcome::Bound);
        assert_eq!(binding.offer("y", false).unwrap(), PositionalOutcome::Bound);
        assert_eq!(binding.offer("z", false).unwrap(), PositionalOutcome::NoMoreCounters);
        assert_eq!(node.args[0].value.borrow().string(), "x");
        assert_eq!(node.args[1].value.borrow().string(), "y");
    }
}
