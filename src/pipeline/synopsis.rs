//! Minimal synopsis rendering: a one-line usage string for a
//! resolved command, used by `App`'s usage-error formatting. This is not a
//! full help-page renderer (manual text, categories, and column alignment
//! are left to application code via the `Data`/`HelpText`/`ManualText`
//! metadata bag) — just enough to answer "what did I get wrong" at the
//! point a `UsageError`/`ValidationError` surfaces.

use crate::command::{CommandTree, NodeId};

/// Renders `app sub ... [flags] <positional> ...` for the command at `id`,
/// walking from the root so every ancestor's name appears in order.
pub fn render(tree: &CommandTree, id: NodeId) -> String {
    let mut parts = tree.path_names(id);
    let node = tree.node(id);

    for flag in &node.flags {
        parts.push(flag_synopsis(flag));
    }
    for arg in &node.args {
        parts.push(arg_synopsis(arg));
    }
    if node.children.iter().any(|c| tree.node(*c).is_visible(node.options.disable_auto_visibility)) {
        parts.push("<command>".to_string());
    }
    parts.join(" ")
}

/// `--name`/`-n`, with the `--[no-]name` mirrored form for a negatable
/// boolean and `<value>` appended for
/// anything that isn't a bare boolean switch.
fn flag_synopsis(flag: &crate::command::FlagSlot) -> String {
    let long = flag.long_forms().first().map(|s| s.to_string());
    let label = match long {
        Some(name) if flag.options.no && flag.is_boolean() => format!("--[no-]{name}"),
        Some(name) => format!("--{name}"),
        None => flag
            .short_forms()
            .first()
            .map(|c| format!("-{c}"))
            .unwrap_or_else(|| format!("--{}", flag.name)),
    };
    let body = if flag.is_boolean() {
        label
    } else {
        format!("{label} <{}>", flag.name)
    };
    if flag.options.required {
        body
    } else {
        format!("[{body}]")
    }
}

fn arg_synopsis(arg: &crate::command::ArgSlot) -> String {
    let body = format!("<{}>", arg.name);
    if arg.options.required {
        body
    } else {
        format!("[{body}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ArgSlot, FlagSlot};
    use crate::value::builtins::{BoolValue, StringValue};

    #[test]
    fn renders_flags_and_positionals_in_declaration_order() {
        let mut tree = CommandTree::new("app");
        let root = tree.root_id();
        tree.add_flag(root, FlagSlot::new("verbose", Box::new(BoolValue::default())).negatable())
            .unwrap();
        tree.add_flag(root, FlagSlot::new("name", Box::new(StringValue::default())).required())
            .unwrap();
        tree.add_arg(root, ArgSlot::new("target", Box::new(StringValue::default()), 1).required())
            .unwrap();

        let rendered = render(&tree, root);
        assert_eq!(rendered, "app [--[no-]verbose] --name <name> <target>");
    }

    #[test]
    fn visible_subcommand_adds_command_placeholder() {
        let mut tree = CommandTree::new("app");
        let root = tree.root_id();
        tree.add_command(root, "sub").unwrap();
        assert_eq!(render(&tree, root), "app <command>");
    }
}
