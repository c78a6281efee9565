//! Structural codec
//!
//! Converts between the host's generic attribute bags and the strongly-shaped
//! records the management API accepts:
//! - expand: attribute bag -> domain record
//! - flatten: domain record -> attribute bag
//!
//! Expansion is permissive. A missing or null input expands to `None` rather
//! than an error, and set elements that are not blocks (or lack a required
//! string) are skipped. Every skip is recorded on the [`Decoder`] as a
//! [`DecodeDiagnostic`] so callers can surface it.

pub mod pipeline;
pub mod policy;

use serde_json::Value;
use std::fmt;
use tracing::warn;

use crate::Bag;

/// A bag element the decoder skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeDiagnostic {
    /// Dotted path of the skipped element (e.g. `pipeline_object.1.field.0`)
    pub path: String,
    pub reason: String,
}

impl fmt::Display for DecodeDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Collects diagnostics while expanding attribute bags
#[derive(Debug, Default)]
pub struct Decoder {
    diagnostics: Vec<DecodeDiagnostic>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics recorded so far
    pub fn diagnostics(&self) -> &[DecodeDiagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<DecodeDiagnostic> {
        self.diagnostics
    }

    fn skip(&mut self, path: String, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(path = %path, reason = %reason, "Skipping malformed configuration element");
        self.diagnostics.push(DecodeDiagnostic { path, reason });
    }

    /// Returns the block elements of a set-valued attribute
    ///
    /// `None` when the value is missing, null, empty or not a set at all.
    fn elements<'a>(&mut self, path: &str, value: Option<&'a Value>) -> Option<Vec<(String, &'a Bag)>> {
        let items = match value {
            None | Some(Value::Null) => return None,
            Some(Value::Array(items)) => items,
            Some(_) => {
                self.skip(path.to_string(), "expected a set of blocks");
                return None;
            }
        };

        if items.is_empty() {
            return None;
        }

        let mut elements = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_path = join(path, &i.to_string());
            match item {
                Value::Object(bag) => elements.push((item_path, bag)),
                _ => self.skip(item_path, "element is not a block"),
            }
        }

        Some(elements)
    }

    fn required_string(&mut self, path: &str, bag: &Bag, key: &str) -> Option<String> {
        match bag.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.skip(path.to_string(), format!("`{}` is not a string", key));
                None
            }
            None => {
                self.skip(path.to_string(), format!("missing required `{}`", key));
                None
            }
        }
    }

    /// Present and non-empty strings only; `""` means "not set"
    fn optional_string(&mut self, path: &str, bag: &Bag, key: &str) -> Option<String> {
        match bag.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            None | Some(Value::Null) | Some(Value::String(_)) => None,
            Some(_) => {
                self.skip(join(path, key), "value is not a string, ignoring it");
                None
            }
        }
    }
}

fn join(prefix: &str, name: &str) -> String {
    format!("{}.{}", prefix, name)
}

/// `None` for an empty collection, mirroring "absent" at the request level
fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}
