#![forbid(unsafe_code)]
//! Bounded diagnostic rendering of argument values.
//!
//! [`InvocationRecord::describe`](crate::invocation_record::InvocationRecord::describe)
//! takes its formatter as a collaborator so diagnostic output stays
//! pluggable. [`ShortenedExport`] is the stock implementation: every value
//! renders to a short, deterministic string regardless of how large the
//! underlying structure is.

use crate::value::Value;

/// Formatting collaborator used by invocation-record diagnostics.
pub trait ValueExporter {
    /// Bounded, human-readable rendering of an arbitrary value.
    ///
    /// Must be deterministic and side-effect free.
    fn shortened_export(&self, value: &Value) -> String;
}

/// Default exporter: scalars render bare, strings single-quoted and
/// truncated, sequences capped at a fixed element count, objects as
/// `TypeName Object (...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortenedExport {
    /// Maximum rendered characters of a string before truncation.
    pub max_string_len: usize,
    /// Maximum rendered elements of a sequence.
    pub max_seq_items: usize,
}

impl Default for ShortenedExport {
    fn default() -> Self {
        Self {
            max_string_len: 32,
            max_seq_items: 5,
        }
    }
}

impl ValueExporter for ShortenedExport {
    fn shortened_export(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(x) => x.to_string(),
            Value::Str(s) => {
                if s.chars().count() > self.max_string_len {
                    let head: String = s.chars().take(self.max_string_len).collect();
                    format!("'{head}...'")
                } else {
                    format!("'{s}'")
                }
            }
            Value::Seq(items) => {
                let mut parts: Vec<String> = items
                    .iter()
                    .take(self.max_seq_items)
                    .map(|item| self.shortened_export(item))
                    .collect();
                if items.len() > self.max_seq_items {
                    parts.push("...".to_string());
                }
                format!("[{}]", parts.join(", "))
            }
            Value::Object(handle) => format!("{} Object (...)", handle.type_name()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
