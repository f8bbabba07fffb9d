//! The parser / set: argv tokenization, short/long flag
//! recognition, positional dispatch, and command descent.
//!
//! The main loop offers every token to the active positional counter
//! first — flag-shaped or not — exactly like `ArgCounter::take`'s uniform
//! signature suggests: a `Discrete`/`Default` counter ignores
//! `is_flag_shaped` and swallows whatever it's given, while only `VarArgs`
//! (and a user `Matches`) actually consult it to decide whether to stop,
//! defer, or keep going. Only when the counter says it has no
//! more capacity (or defers) does the token fall through to the flag
//! lookup table built from `CommandTree::visible_flags`.

mod binding;
pub mod quote;
mod robust;
mod tokens;

use crate::command::{CommandTree, FlagSlot, NodeId};
use crate::error::{CliError, Result, UsageError};
use crate::pipeline::{CancellationToken, Context, Io, Target};
use crate::pipeline::Timing;
use crate::value::SetOptions;

use binding::{bind_right_to_left, ArgBinding, PositionalOutcome};
pub use robust::PartialBindings;
use robust::PartialBuilder;
use tokens::{classify, TokenShape};

/// The result of a successful parse: the matched command chain (root to
/// leaf) and the argv the leaf's Action will see.
#[derive(Debug, Clone)]
pub struct ParsedInvocation {
    pub path: Vec<NodeId>,
    pub argv: Vec<String>,
}

#[derive(Debug)]
pub enum ParseOutcome {
    Matched(ParsedInvocation),
    Partial(PartialBindings),
}

/// Parses `argv` (program name already stripped by the caller) against
/// `tree`, starting from the root. When `robust` is set,
/// a `UsageError` anywhere in the descent is captured into a
/// `PartialBindings` record instead of propagating.
pub fn parse(
    tree: &CommandTree,
    argv: &[String],
    io: &Io,
    cancel: &CancellationToken,
    robust: bool,
) -> Result<ParseOutcome> {
    let builder = PartialBuilder::default();
    let mut path = Vec::new();
    match parse_node(tree, tree.root_id(), argv, &mut path, &builder, io, cancel) {
        Ok(inv) => Ok(ParseOutcome::Matched(inv)),
        Err(CliError::Usage(e)) if robust => Ok(ParseOutcome::Partial(builder.finish(e))),
        Err(e) => Err(e),
    }
}

#[derive(Clone, Copy)]
struct ResolvedFlag {
    id: NodeId,
    idx: usize,
    negated: bool,
}

/// Short/long lookup built fresh per command context from
/// `CommandTree::visible_flags`, which already orders nearest-command-first
/// so a locally redeclared name shadows an ancestor's.
struct FlagTable {
    short: std::collections::HashMap<char, ResolvedFlag>,
    long: std::collections::HashMap<String, ResolvedFlag>,
}

impl FlagTable {
    fn build(tree: &CommandTree, node: NodeId) -> Self {
        let mut short = std::collections::HashMap::new();
        let mut long = std::collections::HashMap::new();
        for (id, idx) in tree.visible_flags(node) {
            let flag = &tree.node(id).flags[idx];
            for c in flag.short_forms() {
                short.entry(c).or_insert(ResolvedFlag { id, idx, negated: false });
            }
            for l in flag.long_forms() {
                long.entry(l.to_string()).or_insert(ResolvedFlag { id, idx, negated: false });
                if flag.options.no && flag.is_boolean() {
                    long.entry(format!("no-{l}"))
                        .or_insert(ResolvedFlag { id, idx, negated: true });
                }
            }
        }
        Self { short, long }
    }
}

pub(crate) fn set_opts(flag: &FlagSlot) -> SetOptions {
    SetOptions {
        disable_splitting: flag.options.disable_splitting,
        merge: flag.options.merge,
    }
}

pub(crate) fn apply_transform(flag: &FlagSlot, text: String) -> String {
    match &flag.transform {
        Some(f) => f(text),
        None => text,
    }
}

fn build_argv(name: &str, tokens: &[String]) -> Vec<String> {
    std::iter::once(name.to_string()).chain(tokens.iter().cloned()).collect()
}

fn parse_node(
    tree: &CommandTree,
    node: NodeId,
    tokens: &[String],
    path: &mut Vec<NodeId>,
    builder: &PartialBuilder,
    io: &Io,
    cancel: &CancellationToken,
) -> Result<ParsedInvocation> {
    path.push(node);
    builder.enter(node);
    let cmd = tree.node(node);
    tracing::debug!(command = %cmd.name, tokens = %quote::join(tokens.iter().map(String::as_str)), "entering command");

    // `SkipFlagParsing`: every token is positional, no flag
    // lookup, no subcommand descent.
    if cmd.options.skip_flag_parsing {
        return bind_all_positional(tree, node, tokens, path, builder);
    }

    let flag_table = FlagTable::build(tree, node);
    let right_to_left = cmd.options.right_to_left;
    let mut binding = ArgBinding::new(cmd);
    let mut rtl_positionals: Vec<String> = Vec::new();
    let mut terminator_seen = false;
    let mut positional_taken = false;
    let mut i = 0usize;

    while i < tokens.len() {
        let token = &tokens[i];

        if !terminator_seen && token == "--" {
            terminator_seen = true;
            builder.consume(token.clone());
            i += 1;
            continue;
        }

        if terminator_seen {
            if right_to_left {
                rtl_positionals.push(token.clone());
                builder.consume(token.clone());
                i += 1;
                continue;
            }
            match binding.offer(token, false)? {
                PositionalOutcome::Bound => {
                    positional_taken = true;
                    builder.consume(token.clone());
                    i += 1;
                }
                PositionalOutcome::NoMoreCounters => {
                    return descend_or_fail(tree, node, &tokens[i..], path, builder, io, cancel);
                }
                PositionalOutcome::DeferToFlagLane => unreachable!("terminator disables the flag lane"),
            }
            continue;
        }

        match classify(token) {
            TokenShape::Terminator => unreachable!("handled above"),
            TokenShape::LoneDash => {
                if right_to_left {
                    rtl_positionals.push(token.clone());
                    builder.consume(token.clone());
                    i += 1;
                    continue;
                }
                match binding.offer(token, false)? {
                    PositionalOutcome::Bound => {
                        positional_taken = true;
                        builder.consume(token.clone());
                        i += 1;
                    }
                    PositionalOutcome::NoMoreCounters => {
                        return descend_or_fail(tree, node, &tokens[i..], path, builder, io, cancel);
                    }
                    PositionalOutcome::DeferToFlagLane => unreachable!(),
                }
            }
            TokenShape::Positional => {
                if right_to_left {
                    rtl_positionals.push(token.clone());
                    builder.consume(token.clone());
                    i += 1;
                    continue;
                }
                match binding.offer(token, false)? {
                    PositionalOutcome::Bound => {
                        positional_taken = true;
                        builder.consume(token.clone());
                        i += 1;
                    }
                    PositionalOutcome::NoMoreCounters => {
                        return descend_or_fail(tree, node, &tokens[i..], path, builder, io, cancel);
                    }
                    PositionalOutcome::DeferToFlagLane => unreachable!(),
                }
            }
            TokenShape::LongFlag { name, value } => {
                if !right_to_left {
                    match binding.offer(token, true)? {
                        PositionalOutcome::Bound => {
                            positional_taken = true;
                            builder.consume(token.clone());
                            i += 1;
                            continue;
                        }
                        PositionalOutcome::DeferToFlagLane | PositionalOutcome::NoMoreCounters => {}
                    }
                }
                if cmd.options.disallow_flags_after_args && positional_taken {
                    builder.mark_incomplete(token.clone());
                    return Err(UsageError::FlagAfterArgs {
                        name: name.to_string(),
                    }
                    .into());
                }
                let consumed_next = apply_long_flag(tree, &flag_table, name, value, tokens, i, builder)?;
                i += if consumed_next { 2 } else { 1 };
            }
            TokenShape::ShortCluster(rest) => {
                if !right_to_left {
                    match binding.offer(token, true)? {
                        PositionalOutcome::Bound => {
                            positional_taken = true;
                            builder.consume(token.clone());
                            i += 1;
                            continue;
                        }
                        PositionalOutcome::DeferToFlagLane | PositionalOutcome::NoMoreCounters => {}
                    }
                }
                if cmd.options.disallow_flags_after_args && positional_taken {
                    builder.mark_incomplete(token.clone());
                    return Err(UsageError::FlagAfterArgs {
                        name: rest.chars().next().map(String::from).unwrap_or_default(),
                    }
                    .into());
                }
                let consumed_next = apply_short_cluster(tree, &flag_table, rest, tokens, i, builder)?;
                i += if consumed_next { 2 } else { 1 };
            }
        }
    }

    if right_to_left {
        bind_right_to_left(cmd, &rtl_positionals)?;
    } else {
        binding.finish()?;
    }
    Ok(ParsedInvocation {
        path: path.clone(),
        argv: build_argv(&cmd.name, tokens),
    })
}

fn bind_all_positional(
    tree: &CommandTree,
    node: NodeId,
    tokens: &[String],
    path: &mut Vec<NodeId>,
    builder: &PartialBuilder,
) -> Result<ParsedInvocation> {
    let cmd = tree.node(node);
    if cmd.options.right_to_left {
        bind_right_to_left(cmd, tokens)?;
    } else {
        let mut binding = ArgBinding::new(cmd);
        for t in tokens {
            match binding.offer(t, false)? {
                PositionalOutcome::Bound => {}
                PositionalOutcome::NoMoreCounters => {
                    return Err(UsageError::UnexpectedPositional { token: t.clone() }.into());
                }
                PositionalOutcome::DeferToFlagLane => unreachable!(),
            }
        }
        binding.finish()?;
    }
    for t in tokens {
        builder.consume(t.clone());
    }
    Ok(ParsedInvocation {
        path: path.clone(),
        argv: build_argv(&cmd.name, tokens),
    })
}

/// Tokens belong to `node` but its positional capacity is spent (or it has
/// none). The next token may name a subcommand; failing that,
/// `HandleCommandNotFound` gets a chance to redirect.
fn descend_or_fail(
    tree: &CommandTree,
    node: NodeId,
    remaining: &[String],
    path: &mut Vec<NodeId>,
    builder: &PartialBuilder,
    io: &Io,
    cancel: &CancellationToken,
) -> Result<ParsedInvocation> {
    let candidate = &remaining[0];

    if let Some(child) = tree.find_child_by_name(node, candidate) {
        tracing::trace!(from = %tree.node(node).name, to = %candidate, "descending into subcommand");
        builder.consume(candidate.clone());
        return parse_node(tree, child, &remaining[1..], path, builder, io, cancel);
    }

    if let Some(handler) = tree.node(node).command_not_found.clone() {
        let mut ctx = Context::new(
            Timing::Before,
            tree,
            Target::Command(node),
            io.clone(),
            cancel.clone(),
            Vec::new(),
            crate::pipeline::context::new_mutation_queue(),
        );
        if let Some(target_name) = handler(&mut ctx, candidate)? {
            if let Some(child) = tree.find_child_by_name(node, &target_name) {
                // The redirect reinterprets the failing token itself as the
                // target's own first token rather than
                // consuming it as a name.
                return parse_node(tree, child, remaining, path, builder, io, cancel);
            }
        }
    }

    builder.mark_incomplete(candidate.clone());
    Err(UsageError::UnexpectedPositional {
        token: candidate.clone(),
    }
    .into())
}

fn apply_long_flag(
    tree: &CommandTree,
    table: &FlagTable,
    name: &str,
    explicit_value: Option<&str>,
    tokens: &[String],
    i: usize,
    builder: &PartialBuilder,
) -> Result<bool> {
    let resolved = table.long.get(name).copied().or_else(|| {
        let mut chars = name.chars();
        let only = chars.next()?;
        if chars.next().is_none() {
            table.short.get(&only).copied()
        } else {
            None
        }
    });
    let Some(resolved) = resolved else {
        builder.mark_incomplete(tokens[i].clone());
        return Err(UsageError::UnknownLongFlag { name: name.to_string() }.into());
    };
    let flag = &tree.node(resolved.id).flags[resolved.idx];

    if flag.is_boolean() {
        let raw = if resolved.negated {
            "false".to_string()
        } else {
            explicit_value.map(str::to_string).unwrap_or_else(|| "true".to_string())
        };
        let text = apply_transform(flag, raw.clone());
        flag.value.borrow_mut().set(&text, set_opts(flag))?;
        flag.state.borrow_mut().record_occurrence(raw);
        builder.consume(tokens[i].clone());
        return Ok(false);
    }

    if resolved.negated {
        builder.mark_incomplete(tokens[i].clone());
        return Err(UsageError::UnexpectedValueForBoolean {
            name: flag.name.clone(),
        }
        .into());
    }

    let (raw, consumed_next) = match explicit_value {
        Some(v) => (v.to_string(), false),
        None => match &flag.optional_default {
            Some(default) => (default.clone(), false),
            None => match tokens.get(i + 1) {
                Some(v) => (v.clone(), true),
                None => {
                    builder.mark_incomplete(tokens[i].clone());
                    return Err(UsageError::MissingValue {
                        name: flag.name.clone(),
                    }
                    .into());
                }
            },
        },
    };
    let text = apply_transform(flag, raw.clone());
    flag.value.borrow_mut().set(&text, set_opts(flag))?;
    flag.state.borrow_mut().record_occurrence(raw);
    builder.consume(tokens[i].clone());
    if consumed_next {
        builder.consume(tokens[i + 1].clone());
    }
    Ok(consumed_next)
}

fn apply_short_cluster(
    tree: &CommandTree,
    table: &FlagTable,
    rest: &str,
    tokens: &[String],
    i: usize,
    builder: &PartialBuilder,
) -> Result<bool> {
    let chars: Vec<char> = rest.chars().collect();

    // `-x=VALUE` is only legal when `x` has a long form.
    if let Some(eq_byte) = rest.find('=') {
        if chars.len() >= 2 && eq_byte == chars[0].len_utf8() {
            let name = chars[0];
            let value = &rest[eq_byte + 1..];
            let Some(resolved) = table.short.get(&name).copied() else {
                builder.mark_incomplete(tokens[i].clone());
                return Err(UsageError::UnknownShortFlag { name }.into());
            };
            let flag = &tree.node(resolved.id).flags[resolved.idx];
            if flag.long_forms().is_empty() {
                builder.mark_incomplete(tokens[i].clone());
                return Err(UsageError::ShortEqualsMisuse { name }.into());
            }
            let text = apply_transform(flag, value.to_string());
            flag.value.borrow_mut().set(&text, set_opts(flag))?;
            flag.state.borrow_mut().record_occurrence(value.to_string());
            builder.consume(tokens[i].clone());
            return Ok(false);
        }
    }

    let mut pos = 0usize;
    while pos < chars.len() {
        let c = chars[pos];
        let Some(resolved) = table.short.get(&c).copied() else {
            builder.mark_incomplete(tokens[i].clone());
            return Err(UsageError::UnknownShortFlag { name: c }.into());
        };
        let flag = &tree.node(resolved.id).flags[resolved.idx];

        if flag.is_boolean() {
            let text = apply_transform(flag, "true".to_string());
            flag.value.borrow_mut().set(&text, set_opts(flag))?;
            flag.state.borrow_mut().record_occurrence("true");
            pos += 1;
            continue;
        }

        let remainder: String = chars[pos + 1..].iter().collect();
        if !remainder.is_empty() {
            let text = apply_transform(flag, remainder.clone());
            flag.value.borrow_mut().set(&text, set_opts(flag))?;
            flag.state.borrow_mut().record_occurrence(remainder);
            builder.consume(tokens[i].clone());
            return Ok(false);
        }
        if let Some(default) = &flag.optional_default {
            let text = apply_transform(flag, default.clone());
            flag.value.borrow_mut().set(&text, set_opts(flag))?;
            flag.state.borrow_mut().record_occurrence(default.clone());
            builder.consume(tokens[i].clone());
            return Ok(false);
        }
        return match tokens.get(i + 1) {
            Some(v) => {
                let text = apply_transform(flag, v.clone());
                flag.value.borrow_mut().set(&text, set_opts(flag))?;
                flag.state.borrow_mut().record_occurrence(v.clone());
                builder.consume(tokens[i].clone());
                builder.consume(v.clone());
                Ok(true)
            }
            None => {
                builder.mark_incomplete(tokens[i].clone());
                Err(UsageError::MissingValue {
                    name: flag.name.clone(),
                }
                .into())
            }
        };
    }
    builder.consume(tokens[i].clone());
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ArgSlot, FlagSlot};
    use crate::value::builtins::{BoolValue, StringListValue, StringValue};
    use crate::value::Value;

    fn io_cancel() -> (Io, CancellationToken) {
        (Io::new(std::io::sink(), std::io::sink(), std::io::empty(), std::sync::Arc::new(crate::pipeline::fs::RealFs)), CancellationToken::new())
    }

    #[test]
    fn long_and_short_boolean_flags_bind() {
        let mut tree = CommandTree::new("app");
        let root = tree.root_id();
        tree.add_flag(root, FlagSlot::new("flag", Box::new(BoolValue::default())).alias("f").negatable())
            .unwrap();
        let (io, cancel) = io_cancel();

        let outcome = parse(&tree, &["--flag".to_string()], &io, &cancel, false).unwrap();
        let ParseOutcome::Matched(inv) = outcome else { panic!("expected match") };
        assert_eq!(inv.path, vec![root]);
        let flag = &tree.node(root).flags[0];
        assert!(flag.state.borrow().seen());
        assert_eq!(flag.value.borrow().string(), "true");
    }

    #[test]
    fn negation_mirror_sets_false() {
        let mut tree = CommandTree::new("app");
        let root = tree.root_id();
        tree.add_flag(root, FlagSlot::new("flag", Box::new(BoolValue::default())).negatable())
            .unwrap();
        let (io, cancel) = io_cancel();
        parse(&tree, &["--no-flag".to_string()], &io, &cancel, false).unwrap();
        assert_eq!(tree.node(root).flags[0].value.borrow().string(), "false");
    }

    #[test]
    fn short_cluster_of_booleans_then_value_flag() {
        let mut tree = CommandTree::new("app");
        let root = tree.root_id();
        tree.add_flag(root, FlagSlot::new("a", Box::new(BoolValue::default()))).unwrap();
        tree.add_flag(root, FlagSlot::new("b", Box::new(BoolValue::default()))).unwrap();
        tree.add_flag(root, FlagSlot::new("name", Box::new(StringValue::default())).alias("n"))
            .unwrap();
        let (io, cancel) = io_cancel();
        parse(&tree, &["-abnVALUE".to_string()], &io, &cancel, false).unwrap();
        let node = tree.node(root);
        assert_eq!(node.flags[0].value.borrow().string(), "true");
        assert_eq!(node.flags[1].value.borrow().string(), "true");
        assert_eq!(node.flags[2].value.borrow().string(), "VALUE");
    }

    #[test]
    fn terminator_routes_everything_to_positionals() {
        let mut tree = CommandTree::new("app");
        let root = tree.root_id();
        tree.add_arg(root, ArgSlot::new("rest", Box::new(StringListValue::default()), -1))
            .unwrap();
        let (io, cancel) = io_cancel();
        let outcome = parse(&tree, &["--".to_string(), "-x".to_string(), "-y".to_string()], &io, &cancel, false).unwrap();
        let ParseOutcome::Matched(_) = outcome else { panic!() };
        assert_eq!(tree.node(root).args[0].value.borrow().string(), "-x,-y");
    }

    #[test]
    fn subcommand_descent_replaces_argv_head() {
        let mut tree = CommandTree::new("app");
        let root = tree.root_id();
        let sub = tree.add_command(root, "sub").unwrap();
        tree.add_arg(sub, ArgSlot::new("u", Box::new(StringValue::default()), 0)).unwrap();
        let (io, cancel) = io_cancel();
        let outcome = parse(&tree, &["sub".to_string(), "u".to_string()], &io, &cancel, false).unwrap();
        let ParseOutcome::Matched(inv) = outcome else { panic!() };
        assert_eq!(inv.path, vec![root, sub]);
        assert_eq!(inv.argv, vec!["sub".to_string(), "u".to_string()]);
    }

    #[test]
    fn unknown_flag_is_a_usage_error() {
        let tree = CommandTree::new("app");
        let (io, cancel) = io_cancel();
        let err = parse(&tree, &["--nope".to_string()], &io, &cancel, false).unwrap_err();
        assert!(matches!(err, CliError::Usage(UsageError::UnknownLongFlag { .. })));
    }

    #[test]
    fn robust_mode_captures_partial_bindings_instead_of_erroring() {
        let tree = CommandTree::new("app");
        let (io, cancel) = io_cancel();
        let outcome = parse(&tree, &["--nope".to_string()], &io, &cancel, true).unwrap();
        match outcome {
            ParseOutcome::Partial(p) => assert!(matches!(p.failure, UsageError::UnknownLongFlag { .. })),
            ParseOutcome::Matched(_) => panic!("expected a partial-bindings capture"),
        }
    }

    #[test]
    fn disallow_flags_after_args_rejects_trailing_flag() {
        let mut tree = CommandTree::new("app");
        let root = tree.root_id();
        tree.node_mut(root).options.disallow_flags_after_args = true;
        tree.add_arg(root, ArgSlot::new("pos", Box::new(StringValue::default()), 0)).unwrap();
        tree.add_flag(root, FlagSlot::new("flag", Box::new(BoolValue::default()))).unwrap();
        let (io, cancel) = io_cancel();
        let err = parse(&tree, &["value".to_string(), "--flag".to_string()], &io, &cancel, false).unwrap_err();
        assert!(matches!(err, CliError::Usage(UsageError::FlagAfterArgs { .. })));
    }
}
