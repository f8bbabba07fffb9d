//! Command tree
//!
//! The tree is an arena: nodes are addressed by `NodeId` rather than by
//! owned pointers, the same way the teacher keeps its command registry as
//! a flat `HashMap<String, Box<dyn Command>>` instead of nested owned
//! references — it sidesteps Rust's aliasing rules for a structure that
//! needs parent-pointers *and* owned children.
//!
//! Tree shape (names, aliases, nesting, Options bitsets) is mutable only
//! during `Initialize`; after that every `CommandTree` method
//! used by the parser and pipeline takes `&self` and mutates only the
//! `RefCell`-wrapped per-option parse state, never the arena itself.

pub mod flag;
pub mod arg;
mod meta;
mod options;
mod pattern;

use std::cell::RefCell;

use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::pipeline::PipelineSlots;

pub use arg::ArgSlot;
pub use flag::FlagSlot;
pub use meta::MetaValue;
pub use options::CommandOptions;
pub use pattern::{PathPattern, Segment};

/// Arena index into `CommandTree::nodes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug)]
pub struct CommandNode {
    pub name: String,
    pub aliases: Vec<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub flags: Vec<FlagSlot>,
    pub args: Vec<ArgSlot>,
    pub options: CommandOptions,
    pub category: String,
    pub metadata: RefCell<IndexMap<String, MetaValue>>,
    pub pipeline: PipelineSlots,
    /// Set by `HandleCommandNotFound`; consulted by the
    /// parser when no subcommand matches and tokens remain.
    pub command_not_found: Option<crate::pipeline::CommandNotFoundFn>,
    /// Set during Initialize only; toggled to read-only semantics once
    /// the apply-queue fix point is reached.
    pub(crate) initialized: RefCell<bool>,
}

impl CommandNode {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            parent: None,
            children: Vec::new(),
            flags: Vec::new(),
            args: Vec::new(),
            options: CommandOptions::default(),
            category: String::new(),
            metadata: RefCell::new(IndexMap::new()),
            pipeline: PipelineSlots::default(),
            command_not_found: None,
            initialized: RefCell::new(false),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.options.hidden = true;
        self
    }

    pub fn on_command_not_found(mut self, f: crate::pipeline::CommandNotFoundFn) -> Self {
        self.command_not_found = Some(f);
        self
    }

    pub fn matches_name(&self, token: &str) -> bool {
        self.name == token || self.aliases.iter().any(|a| a == token)
    }

    pub fn is_visible(&self, ancestor_disable_auto_visibility: bool) -> bool {
        if self.options.hidden {
            return false;
        }
        if self.options.visible {
            return true;
        }
        if self.options.disable_auto_visibility || ancestor_disable_auto_visibility {
            return true;
        }
        !self.name.starts_with('_')
    }

    /// Full space-separated path from the root, used in error messages and
    /// for `InternalError`'s context path.
    pub fn path_string(&self, tree: &CommandTree) -> String {
        let mut names = vec![self.name.clone()];
        let mut cur = self.parent;
        while let Some(id) = cur {
            let node = tree.node(id);
            names.push(node.name.clone());
            cur = node.parent;
        }
        names.reverse();
        names.join(" ")
    }
}

#[derive(Debug)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
    pub root: NodeId,
}

impl CommandTree {
    pub fn new(root_name: impl Into<String>) -> Self {
        let root = CommandNode::new(root_name);
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut CommandNode {
        &mut self.nodes[id.0]
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Add a subcommand under `parent`. Valid at any time per spec (tree
    /// mutation is restricted to Initialize by convention, enforced by
    /// callers only invoking this from an Initialize action).
    pub fn add_command(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, ConfigError> {
        let name = name.into();
        validate_identifier(&name)?;
        {
            let parent_node = self.node(parent);
            if parent_node.children.iter().any(|c| self.node(*c).matches_name(&name)) {
                return Err(ConfigError::DuplicateName {
                    path: parent_node.path_string(self),
                    name,
                });
            }
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(CommandNode::new(name));
        self.node_mut(id).parent = Some(parent);
        self.node_mut(parent).children.push(id);
        Ok(id)
    }

    pub fn remove_command(&mut self, parent: NodeId, name: &str) {
        let child = self
            .node(parent)
            .children
            .iter()
            .copied()
            .find(|c| self.node(*c).matches_name(name));
        if let Some(child) = child {
            self.node_mut(parent).children.retain(|c| *c != child);
        }
    }

    pub fn add_flag(&mut self, node: NodeId, flag: FlagSlot) -> Result<(), ConfigError> {
        self.check_name_unique(node, &flag.name, &flag.aliases)?;
        self.node_mut(node).flags.push(flag);
        Ok(())
    }

    pub fn remove_flag(&mut self, node: NodeId, name: &str) {
        self.node_mut(node).flags.retain(|f| f.name != name);
    }

    pub fn add_arg(&mut self, node: NodeId, mut arg: ArgSlot) -> Result<(), ConfigError> {
        self.check_name_unique(node, &arg.name, &[])?;
        let idx = self.node(node).args.len();
        arg.positional_index = idx;
        self.node_mut(node).args.push(arg);
        Ok(())
    }

    pub fn remove_arg(&mut self, node: NodeId, name: &str) {
        self.node_mut(node).args.retain(|a| a.name != name);
        let ids: Vec<usize> = (0..self.node(node).args.len()).collect();
        for (new_idx, _) in ids.iter().enumerate() {
            self.node_mut(node).args[new_idx].positional_index = new_idx;
        }
    }

    fn check_name_unique(
        &self,
        node: NodeId,
        name: &str,
        aliases: &[String],
    ) -> Result<(), ConfigError> {
        validate_identifier(name)?;
        let n = self.node(node);
        let mut all_names: Vec<&str> = Vec::new();
        for f in &n.flags {
            all_names.push(&f.name);
            all_names.extend(f.aliases.iter().map(|s| s.as_str()));
        }
        for a in &n.args {
            all_names.push(&a.name);
        }
        if all_names.contains(&name) || aliases.iter().any(|a| all_names.contains(&a.as_str())) {
            return Err(ConfigError::DuplicateName {
                path: n.path_string(self),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Exact match on name then alias, direct child of `node`.
    pub fn find_child_by_name(&self, node: NodeId, token: &str) -> Option<NodeId> {
        self.node(node)
            .children
            .iter()
            .copied()
            .find(|c| self.node(*c).matches_name(token))
    }

    /// Every flag visible in `node`'s context: its own flags plus every
    /// ancestor flag not marked `NonPersistent`.
    /// Returned in nearest-first order so a locally redeclared name shadows
    /// an ancestor's.
    pub fn visible_flags(&self, node: NodeId) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        let mut seen_names: Vec<&str> = Vec::new();
        let mut cur = Some(node);
        let mut first = true;
        while let Some(id) = cur {
            let n = self.node(id);
            for (i, f) in n.flags.iter().enumerate() {
                if !first && f.options.non_persistent {
                    continue;
                }
                if seen_names.contains(&f.name.as_str()) {
                    continue;
                }
                seen_names.push(&f.name);
                out.push((id, i));
            }
            first = false;
            cur = n.parent;
        }
        out
    }

    /// Path-pattern lookup: `*` any command, `-` any flag,
    /// `-name` a specific flag, `<>` any arg, `<name>` a specific arg.
    /// Pattern matching is right-anchored against the context path; a
    /// leading `*` is implicit.
    pub fn matches_pattern(&self, node: NodeId, pattern: &PathPattern) -> bool {
        pattern.matches_path(&self.path_names(node))
    }

    pub fn path_names(&self, node: NodeId) -> Vec<String> {
        let mut names = vec![self.node(node).name.clone()];
        let mut cur = self.node(node).parent;
        while let Some(id) = cur {
            let n = self.node(id);
            names.push(n.name.clone());
            cur = n.parent;
        }
        names.reverse();
        names
    }
}

/// Flag names must be letters, digits, `-`, `_`, or one of `@ # * + :`
/// (spec invariant 2); whitespace and `&` are invalid.
pub fn validate_identifier(name: &str) -> Result<(), ConfigError> {
    let ok = !name.is_empty()
        && name.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '@' | '#' | '*' | '+' | ':')
        });
    if ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_whitespace_and_ampersand() {
        assert!(validate_identifier("good-name_1").is_ok());
        assert!(validate_identifier("bad name").is_err());
        assert!(validate_identifier("bad&name").is_err());
    }

    #[test]
    fn duplicate_subcommand_name_is_rejected() {
        let mut tree = CommandTree::new("app");
        let root = tree.root_id();
        tree.add_command(root, "sub").unwrap();
        assert!(tree.add_command(root, "sub").is_err());
    }

    #[test]
    fn persistent_flags_are_visible_in_descendants() {
        let mut tree = CommandTree::new("app");
        let root = tree.root_id();
        let sub = tree.add_command(root, "sub").unwrap();
        tree.add_flag(
            root,
            FlagSlot::new("global", Box::new(crate::value::builtins::BoolValue::default())),
        )
        .unwrap();
        let visible = tree.visible_flags(sub);
        assert!(visible
            .iter()
            .any(|(id, i)| tree.node(*id).flags[*i].name == "global"));
    }
}
