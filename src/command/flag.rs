//! Flag declaration.

use std::cell::RefCell;
use std::path::PathBuf;

use indexmap::IndexMap;

use crate::option::{OptionState, TransformFn};
use crate::pipeline::PipelineSlots;
use crate::value::Value;

use super::meta::MetaValue;
use super::options::FlagOptions;

pub struct FlagSlot {
    pub name: String,
    pub aliases: Vec<String>,
    pub value: RefCell<Box<dyn Value>>,
    pub transform: Option<TransformFn>,
    /// Used when the flag is present without an explicit argument (spec
    /// §4.D "Values and optional values").
    pub optional_default: Option<String>,
    pub options: FlagOptions,
    pub pipeline: PipelineSlots,
    pub metadata: RefCell<IndexMap<String, MetaValue>>,
    /// `EnvVars`/`FromFilePath` sourcing, consulted left-to-right during
    /// Before.
    pub env_vars: Vec<String>,
    pub file_source: Option<PathBuf>,
    pub state: RefCell<OptionState>,
}

impl FlagSlot {
    pub fn new(name: impl Into<String>, value: Box<dyn Value>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            value: RefCell::new(value),
            transform: None,
            optional_default: None,
            options: FlagOptions::default(),
            pipeline: PipelineSlots::default(),
            metadata: RefCell::new(IndexMap::new()),
            env_vars: Vec::new(),
            file_source: None,
            state: RefCell::new(OptionState::default()),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.options.required = true;
        self
    }

    /// Auto-generate the `--no-<name>` negation mirror.
    pub fn negatable(mut self) -> Self {
        self.options.no = true;
        self
    }

    pub fn non_persistent(mut self) -> Self {
        self.options.non_persistent = true;
        self
    }

    /// Lists split on comma by default; this opts a flag out.
    pub fn disable_splitting(mut self) -> Self {
        self.options.disable_splitting = true;
        self
    }

    /// Repeated `key=value` assignments merge into the existing map instead
    /// of replacing it.
    pub fn merge(mut self) -> Self {
        self.options.merge = true;
        self
    }

    /// `Exits`: after this flag's own Action runs successfully,
    /// the run exits 0.
    pub fn exits(mut self) -> Self {
        self.options.exits = true;
        self
    }

    /// `ImpliedAction`: this flag's Action runs even when not
    /// `Seen()`.
    pub fn implied_action(mut self) -> Self {
        self.options.implied_action = true;
        self
    }

    /// The implicit-value single-assignment discipline (spec invariant 5):
    /// `SetValue` may assign this destination at most once per run.
    pub fn implicit_value(mut self) -> Self {
        self.options.implicit_value = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.options.hidden = true;
        self
    }

    pub fn optional_value(mut self, default: impl Into<String>) -> Self {
        self.optional_default = Some(default.into());
        self
    }

    pub fn transform(mut self, f: TransformFn) -> Self {
        self.transform = Some(f);
        self
    }

    pub fn env(mut self, vars: impl IntoIterator<Item = &'static str>) -> Self {
        self.env_vars.extend(vars.into_iter().map(String::from));
        self
    }

    pub fn data(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata.get_mut().insert(key.into(), value.into());
        self
    }

    /// Whether this flag's destination is boolean — the parser treats
    /// boolean flags specially (no value, negation mirror applies).
    pub fn is_boolean(&self) -> bool {
        self.value.borrow().is_boolean()
    }

    /// Short forms are single characters; `-name`/`--name` are long forms
    ///. Aliases of length 1 become short forms.
    pub fn short_forms(&self) -> Vec<char> {
        let mut out = Vec::new();
        if self.name.chars().count() == 1 {
            out.push(self.name.chars().next().unwrap());
        }
        out.extend(
            self.aliases
                .iter()
                .filter(|a| a.chars().count() == 1)
                .map(|a| a.chars().next().unwrap()),
        );
        out
    }

    pub fn long_forms(&self) -> Vec<&str> {
        let mut out = Vec::new();
        if self.name.chars().count() > 1 {
            out.push(self.name.as_str());
        }
        out.extend(self.aliases.iter().filter(|a| a.chars().count() > 1).map(|s| s.as_str()));
        out
    }
}
