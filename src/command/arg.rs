//! Positional arg declaration.

use std::cell::RefCell;
use std::path::PathBuf;

use indexmap::IndexMap;

use crate::argcount::{self, ArgCounter};
use crate::option::{OptionState, TransformFn};
use crate::pipeline::PipelineSlots;
use crate::value::Value;

use super::meta::MetaValue;
use super::options::ArgOptions;

pub struct ArgSlot {
    pub name: String,
    pub value: RefCell<Box<dyn Value>>,
    pub transform: Option<TransformFn>,
    pub options: ArgOptions,
    pub pipeline: PipelineSlots,
    pub metadata: RefCell<IndexMap<String, MetaValue>>,
    pub env_vars: Vec<String>,
    pub file_source: Option<PathBuf>,
    pub counter: RefCell<Box<dyn ArgCounter>>,
    /// Stable positional index within the owning command.
    pub positional_index: usize,
    pub state: RefCell<OptionState>,
}

impl ArgSlot {
    /// `count` follows the conventional-integer scheme: n>=1
    /// Discrete, 0 Default, -1/-2/-3 the VarArgs disciplines. A value type
    /// that supplies `new_counter()` overrides this.
    pub fn new(name: impl Into<String>, value: Box<dyn Value>, count: i64) -> Self {
        let counter = value
            .new_counter()
            .unwrap_or_else(|| argcount::from_conventional_count(count));
        Self {
            name: name.into(),
            value: RefCell::new(value),
            transform: None,
            options: ArgOptions::default(),
            pipeline: PipelineSlots::default(),
            metadata: RefCell::new(IndexMap::new()),
            env_vars: Vec::new(),
            file_source: None,
            counter: RefCell::new(counter),
            positional_index: 0,
            state: RefCell::new(OptionState::default()),
        }
    }

    pub fn required(mut self) -> Self {
        self.options.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.options.hidden = true;
        self
    }

    pub fn disable_splitting(mut self) -> Self {
        self.options.disable_splitting = true;
        self
    }

    pub fn merge(mut self) -> Self {
        self.options.merge = true;
        self
    }

    pub fn implied_action(mut self) -> Self {
        self.options.implied_action = true;
        self
    }

    pub fn implicit_value(mut self) -> Self {
        self.options.implicit_value = true;
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
}
