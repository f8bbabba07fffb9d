//! The closed set of built-in value kinds.
//!
//! Integer/float widths are expressed as one generic `NumberValue<T>` over
//! each primitive rather than one struct per width — one trait, many
//! concrete backends.

use std::any::Any;
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;

use crate::error::ValueError;

use super::{parse_duration, SetOptions, Value};

/// Parse helper shared by every numeric `NumberValue<T>`.
fn coerce<T: FromStr>(name: &str, text: &str) -> Result<T, ValueError> {
    text.parse::<T>().map_err(|_| ValueError::Coercion {
        name: name.to_string(),
        text: text.to_string(),
        reason: format!("not a valid {}", std::any::type_name::<T>()),
    })
}

#[derive(Debug, Clone, Default)]
pub struct BoolValue {
    pub value: bool,
}

impl Value for BoolValue {
    fn set(&mut self, text: &str, _opts: SetOptions) -> Result<(), ValueError> {
        self.value = parse_bool(text).ok_or_else(|| ValueError::Coercion {
            name: "bool".into(),
            text: text.to_string(),
            reason: "expected true/false/1/0/yes/no".into(),
        })?;
        Ok(())
    }

    fn string(&self) -> String {
        self.value.to_string()
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }

    fn is_boolean(&self) -> bool {
        true
    }
}

/// Booleans accept `true/false/1/0/yes/no` and empty string (treated as
/// true for boolean flags).
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// A numeric destination over any primitive that implements `FromStr` +
/// `ToString`. Backs the int8..int64/uint8..uint64/f32/f64 members of the
/// closed set.
#[derive(Debug, Clone, Default)]
pub struct NumberValue<T> {
    pub value: T,
}

impl<T> Value for NumberValue<T>
where
    T: FromStr + ToString + Copy + fmt::Debug + Send + Sync + 'static,
{
    fn set(&mut self, text: &str, _opts: SetOptions) -> Result<(), ValueError> {
        self.value = coerce::<T>(std::any::type_name::<T>(), text)?;
        Ok(())
    }

    fn string(&self) -> String {
        self.value.to_string()
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

pub type I8Value = NumberValue<i8>;
pub type I16Value = NumberValue<i16>;
pub type I32Value = NumberValue<i32>;
pub type I64Value = NumberValue<i64>;
pub type U8Value = NumberValue<u8>;
pub type U16Value = NumberValue<u16>;
pub type U32Value = NumberValue<u32>;
pub type U64Value = NumberValue<u64>;
pub type F32Value = NumberValue<f32>;
pub type F64Value = NumberValue<f64>;

#[derive(Debug, Clone, Default)]
pub struct DurationValue {
    pub value: Duration,
}

impl Value for DurationValue {
    fn set(&mut self, text: &str, _opts: SetOptions) -> Result<(), ValueError> {
        self.value = parse_duration(text).map_err(|reason| ValueError::Coercion {
            name: "duration".into(),
            text: text.to_string(),
            reason,
        })?;
        Ok(())
    }

    fn string(&self) -> String {
        format!("{:?}", self.value)
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

#[derive(Debug, Clone, Default)]
pub struct StringValue {
    pub value: String,
}

impl Value for StringValue {
    fn set(&mut self, text: &str, _opts: SetOptions) -> Result<(), ValueError> {
        self.value = text.to_string();
        Ok(())
    }

    fn string(&self) -> String {
        self.value.clone()
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

/// `Vec<String>`. Repeated occurrences append; within one occurrence the
/// text is split on comma unless `DisableSplitting` is set.
#[derive(Debug, Clone, Default)]
pub struct StringListValue {
    pub value: Vec<String>,
}

impl Value for StringListValue {
    fn set(&mut self, text: &str, opts: SetOptions) -> Result<(), ValueError> {
        if opts.disable_splitting {
            self.value.push(text.to_string());
        } else {
            self.value
                .extend(text.split(',').map(|s| s.to_string()));
        }
        Ok(())
    }

    fn string(&self) -> String {
        self.value.join(",")
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

/// `key=value,...` map. Without `Merge`, each `Set` call replaces the
/// whole map; with `Merge`, pairs are folded into the existing map
///.
#[derive(Debug, Clone, Default)]
pub struct StringMapValue {
    pub value: IndexMap<String, String>,
}

impl Value for StringMapValue {
    fn set(&mut self, text: &str, opts: SetOptions) -> Result<(), ValueError> {
        let mut parsed = IndexMap::new();
        let parts: Vec<&str> = if opts.disable_splitting {
            vec![text]
        } else {
            text.split(',').collect()
        };
        for part in parts {
            let (k, v) = part.split_once('=').ok_or_else(|| ValueError::MalformedPair {
                name: "map".into(),
                text: part.to_string(),
            })?;
            parsed.insert(k.to_string(), v.to_string());
        }
        if opts.merge {
            self.value.extend(parsed);
        } else {
            self.value = parsed;
        }
        Ok(())
    }

    fn string(&self) -> String {
        self.value
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

#[derive(Debug, Clone, Default)]
pub struct IpAddrValue {
    pub value: Option<IpAddr>,
}

impl Value for IpAddrValue {
    fn set(&mut self, text: &str, _opts: SetOptions) -> Result<(), ValueError> {
        self.value = Some(text.parse::<IpAddr>().map_err(|e| ValueError::Coercion {
            name: "ip".into(),
            text: text.to_string(),
            reason: e.to_string(),
        })?);
        Ok(())
    }

    fn string(&self) -> String {
        self.value.map(|v| v.to_string()).unwrap_or_default()
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegexValue {
    pub value: Option<Arc<regex_lite::Regex>>,
    text: String,
}

impl Value for RegexValue {
    fn set(&mut self, text: &str, _opts: SetOptions) -> Result<(), ValueError> {
        let re = regex_lite::Regex::new(text).map_err(|e| ValueError::Coercion {
            name: "regex".into(),
            text: text.to_string(),
            reason: e.to_string(),
        })?;
        self.value = Some(Arc::new(re));
        self.text = text.to_string();
        Ok(())
    }

    fn string(&self) -> String {
        self.text.clone()
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

#[derive(Debug, Clone, Default)]
pub struct UrlValue {
    pub value: Option<url::Url>,
}

impl Value for UrlValue {
    fn set(&mut self, text: &str, _opts: SetOptions) -> Result<(), ValueError> {
        self.value = Some(url::Url::parse(text).map_err(|e| ValueError::Coercion {
            name: "url".into(),
            text: text.to_string(),
            reason: e.to_string(),
        })?);
        Ok(())
    }

    fn string(&self) -> String {
        self.value.as_ref().map(|v| v.to_string()).unwrap_or_default()
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

/// Arbitrary-precision integer. Stored as its canonical decimal text; the
/// engine's job is coercion and accounting, not arithmetic, so no bignum
/// crate is pulled in for a capability nothing in this crate exercises.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BigIntValue {
    pub value: String,
}

impl Value for BigIntValue {
    fn set(&mut self, text: &str, _opts: SetOptions) -> Result<(), ValueError> {
        let body = text.strip_prefix('-').unwrap_or(text);
        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValueError::Coercion {
                name: "bigint".into(),
                text: text.to_string(),
                reason: "not a valid integer literal".into(),
            });
        }
        self.value = text.to_string();
        Ok(())
    }

    fn string(&self) -> String {
        self.value.clone()
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BigFloatValue {
    pub value: String,
}

impl Value for BigFloatValue {
    fn set(&mut self, text: &str, _opts: SetOptions) -> Result<(), ValueError> {
        text.parse::<f64>().map_err(|e| ValueError::Coercion {
            name: "bigfloat".into(),
            text: text.to_string(),
            reason: e.to_string(),
        })?;
        self.value = text.to_string();
        Ok(())
    }

    fn string(&self) -> String {
        self.value.clone()
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

#[derive(Debug, Clone, Default)]
pub struct BytesValue {
    pub value: Vec<u8>,
}

impl Value for BytesValue {
    fn set(&mut self, text: &str, _opts: SetOptions) -> Result<(), ValueError> {
        self.value = text.as_bytes().to_vec();
        Ok(())
    }

    fn string(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

/// A single `name=value` pair, distinct from `StringMapValue` (which
/// accumulates repeated pairs); used for single-assignment destinations
/// like `--header Name=Value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameValue {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct NameValueValue {
    pub value: NameValue,
}

impl Value for NameValueValue {
    fn set(&mut self, text: &str, _opts: SetOptions) -> Result<(), ValueError> {
        let (name, value) = text.split_once('=').ok_or_else(|| ValueError::MalformedPair {
            name: "name-value".into(),
            text: text.to_string(),
        })?;
        self.value = NameValue {
            name: name.to_string(),
            value: value.to_string(),
        };
        Ok(())
    }

    fn string(&self) -> String {
        format!("{}={}", self.value.name, self.value.value)
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileValue {
    pub value: Option<PathBuf>,
}

impl Value for FileValue {
    fn set(&mut self, text: &str, _opts: SetOptions) -> Result<(), ValueError> {
        self.value = Some(PathBuf::from(text));
        Ok(())
    }

    fn string(&self) -> String {
        self.value
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

/// A set of file paths, accumulated across occurrences (comma-split unless
/// `DisableSplitting`), the path-valued counterpart of `StringListValue`.
#[derive(Debug, Clone, Default)]
pub struct FileSetValue {
    pub value: Vec<PathBuf>,
}

impl Value for FileSetValue {
    fn set(&mut self, text: &str, opts: SetOptions) -> Result<(), ValueError> {
        if opts.disable_splitting {
            self.value.push(PathBuf::from(text));
        } else {
            self.value
                .extend(text.split(',').map(PathBuf::from));
        }
        Ok(())
    }

    fn string(&self) -> String {
        self.value
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_accepts_documented_spellings() {
        for (text, expected) in [
            ("true", true),
            ("1", true),
            ("yes", true),
            ("", true),
            ("false", false),
            ("0", false),
            ("no", false),
        ] {
            let mut v = BoolValue::default();
            v.set(text, SetOptions::default()).unwrap();
            assert_eq!(v.value, expected, "text={text:?}");
        }
    }

    #[test]
    fn list_appends_across_occurrences() {
        let mut v = StringListValue::default();
        v.set("a,b", SetOptions::default()).unwrap();
        v.set("c", SetOptions::default()).unwrap();
        assert_eq!(v.value, vec!["a", "b", "c"]);
    }

    #[test]
    fn map_replaces_without_merge_but_merges_with_merge() {
        let mut v = StringMapValue::default();
        v.set("a=1,b=2", SetOptions::default()).unwrap();
        v.set("c=3", SetOptions::default()).unwrap();
        assert_eq!(v.value.len(), 1);
        assert_eq!(v.value.get("c"), Some(&"3".to_string()));

        let mut merged = StringMapValue::default();
        let merge_opts = SetOptions {
            merge: true,
            ..Default::default()
        };
        merged.set("a=1,b=2", merge_opts).unwrap();
        merged.set("c=3", merge_opts).unwrap();
        assert_eq!(merged.value.len(), 3);
    }

    #[test]
    fn bigint_rejects_non_digits() {
        let mut v = BigIntValue::default();
        assert!(v.set("123", SetOptions::default()).is_ok());
        assert!(v.set("-456", SetOptions::default()).is_ok());
        assert!(v.set("12a", SetOptions::default()).is_err());
    }
}
