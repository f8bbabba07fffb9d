//! Key/value metadata map shared by Command/Flag/Arg nodes.

use std::fmt;
use std::sync::Arc;

/// A metadata value: either plain text (the common case — `Data(k, v)`)
/// or an arbitrary typed payload (`Description(any)`).
#[derive(Clone)]
pub enum MetaValue {
    Text(String),
    Any(Arc<dyn std::any::Any + Send + Sync>),
}

impl fmt::Debug for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Text(s) => write!(f, "Text({s:?})"),
            MetaValue::Any(_) => write!(f, "Any(..)"),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::Text(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::Text(s)
    }
}
