#![forbid(unsafe_code)]
//! Duplication-safety policy for captured arguments.
//!
//! Snapshotting an intercepted call means copying its arguments before the
//! caller can mutate them, but copying is not universally safe: native
//! resource handles crash or misbehave when duplicated, and types can
//! restrict copying through their own hooks. The policy classifies each
//! object value through a fixed, ordered rule list and performs the copy
//! only when the verdict allows it. Every failure path degrades to keeping
//! the original reference; nothing here ever aborts a test run.
//!
//! Rule precedence (reordering changes behavior for types matching more
//! than one rule):
//!
//! 1. explicit override hook, either answer
//! 2. provider blocklist
//! 3. type-name blocklist
//! 4. restricted on-copy hook
//! 5. default allow

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::{HookVisibility, TypeDescriptor, Value};

// ---------------------------------------------------------------------------
// NonDuplicableTables — injected, read-only configuration
// ---------------------------------------------------------------------------

/// Provider namespaces whose exposed types must never be duplicated.
///
/// Duplicating a live driver handle is undefined at best; these are the
/// namespaces known to expose such handles.
const DEFAULT_PROVIDERS: [&str; 6] = ["mysqli", "SQLite", "sqlite3", "tidy", "xmlwriter", "xsl"];

/// Specific type names, regardless of provider, known unsafe to duplicate:
/// iterator adapters, callable wrappers, archive handles.
const DEFAULT_TYPE_NAMES: [&str; 10] = [
    "AppendIterator",
    "CachingIterator",
    "Closure",
    "COMPersistHelper",
    "IteratorIterator",
    "LimitIterator",
    "RecursiveCachingIterator",
    "RecursiveRegexIterator",
    "RegexIterator",
    "ZipArchive",
];

/// The two blocklists driving rules 2 and 3.
///
/// Passed into [`DuplicationPolicy::new`] as data; never mutated after
/// construction. The set of unsafe native types is platform-dependent and
/// growing it must not require touching policy logic, so the tables are
/// extensible via the `with_*` builders and serializable as configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonDuplicableTables {
    pub providers: BTreeSet<String>,
    pub type_names: BTreeSet<String>,
}

impl Default for NonDuplicableTables {
    fn default() -> Self {
        Self {
            providers: DEFAULT_PROVIDERS.iter().map(|s| s.to_string()).collect(),
            type_names: DEFAULT_TYPE_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl NonDuplicableTables {
    /// Tables with nothing listed; every type classifies by hooks alone.
    pub fn empty() -> Self {
        Self {
            providers: BTreeSet::new(),
            type_names: BTreeSet::new(),
        }
    }

    pub fn with_provider(mut self, provider: &str) -> Self {
        self.providers.insert(provider.to_string());
        self
    }

    pub fn with_type_name(mut self, type_name: &str) -> Self {
        self.type_names.insert(type_name.to_string());
        self
    }

    pub fn covers_provider(&self, provider: &str) -> bool {
        self.providers.contains(provider)
    }

    pub fn covers_type_name(&self, type_name: &str) -> bool {
        self.type_names.contains(type_name)
    }
}

// ---------------------------------------------------------------------------
// Classification — verdict plus the rule that produced it
// ---------------------------------------------------------------------------

/// Outcome of classifying one type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Duplicate,
    KeepOriginal,
}

/// Which rule of the ordered list produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyRule {
    ExplicitOverride,
    ProviderBlocklist,
    TypeNameBlocklist,
    RestrictedCopyHook,
    DefaultAllow,
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ExplicitOverride => "explicit_override",
            Self::ProviderBlocklist => "provider_blocklist",
            Self::TypeNameBlocklist => "type_name_blocklist",
            Self::RestrictedCopyHook => "restricted_copy_hook",
            Self::DefaultAllow => "default_allow",
        };
        f.write_str(name)
    }
}

/// Verdict plus provenance, for auditability of individual decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub verdict: Verdict,
    pub rule: PolicyRule,
}

/// What actually happened to one argument during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Non-object value; value semantics already isolate it.
    PassedThrough,
    /// Classified duplicable and the copy succeeded.
    Duplicated { rule: PolicyRule },
    /// Classified non-duplicable; original reference kept.
    KeptOriginal { rule: PolicyRule },
    /// Classified duplicable but the copy raised; original reference kept.
    FallbackAfterFailure { rule: PolicyRule },
}

// ---------------------------------------------------------------------------
// DuplicationPolicy — ordered predicate→verdict rules
// ---------------------------------------------------------------------------

type Rule = fn(&NonDuplicableTables, &TypeDescriptor) -> Option<Classification>;

fn explicit_override(_: &NonDuplicableTables, d: &TypeDescriptor) -> Option<Classification> {
    d.duplicable_override.map(|duplicable| Classification {
        verdict: if duplicable {
            Verdict::Duplicate
        } else {
            Verdict::KeepOriginal
        },
        rule: PolicyRule::ExplicitOverride,
    })
}

fn provider_blocklist(tables: &NonDuplicableTables, d: &TypeDescriptor) -> Option<Classification> {
    let listed = d
        .provider
        .as_deref()
        .is_some_and(|provider| tables.covers_provider(provider));
    listed.then_some(Classification {
        verdict: Verdict::KeepOriginal,
        rule: PolicyRule::ProviderBlocklist,
    })
}

fn type_name_blocklist(tables: &NonDuplicableTables, d: &TypeDescriptor) -> Option<Classification> {
    tables
        .covers_type_name(&d.type_name)
        .then_some(Classification {
            verdict: Verdict::KeepOriginal,
            rule: PolicyRule::TypeNameBlocklist,
        })
}

fn restricted_copy_hook(_: &NonDuplicableTables, d: &TypeDescriptor) -> Option<Classification> {
    let restricted = d
        .on_copy
        .is_some_and(|hook| hook.visibility != HookVisibility::Public);
    restricted.then_some(Classification {
        verdict: Verdict::KeepOriginal,
        rule: PolicyRule::RestrictedCopyHook,
    })
}

/// Order is the contract; see the module docs.
const RULES: [Rule; 4] = [
    explicit_override,
    provider_blocklist,
    type_name_blocklist,
    restricted_copy_hook,
];

/// Classifies values as safe-to-duplicate and performs the duplication.
///
/// Stateless apart from the injected [`NonDuplicableTables`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicationPolicy {
    tables: NonDuplicableTables,
}

impl DuplicationPolicy {
    pub fn new(tables: NonDuplicableTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &NonDuplicableTables {
        &self.tables
    }

    /// Run the ordered rule list over one type descriptor.
    pub fn classify(&self, descriptor: &TypeDescriptor) -> Classification {
        for rule in RULES {
            if let Some(classification) = rule(&self.tables, descriptor) {
                return classification;
            }
        }
        Classification {
            verdict: Verdict::Duplicate,
            rule: PolicyRule::DefaultAllow,
        }
    }

    /// Best-effort snapshot of one argument value.
    ///
    /// Non-object values pass through untouched; sequences are not recursed
    /// into. Object values are replaced by a shallow duplicate when the
    /// classification allows it and the copy succeeds; every other path
    /// returns the original reference. Never fails.
    pub fn resolve(&self, value: Value) -> Value {
        self.resolve_detailed(value).0
    }

    /// [`resolve`](Self::resolve) plus a [`Resolution`] record naming the
    /// rule that fired and whether the fallback path was taken.
    pub fn resolve_detailed(&self, value: Value) -> (Value, Resolution) {
        let handle = match value {
            Value::Object(handle) => handle,
            other => return (other, Resolution::PassedThrough),
        };
        let Classification { verdict, rule } = self.classify(&handle.descriptor());
        match verdict {
            Verdict::KeepOriginal => (Value::Object(handle), Resolution::KeptOriginal { rule }),
            Verdict::Duplicate => match handle.duplicate() {
                Ok(copy) => (Value::Object(copy), Resolution::Duplicated { rule }),
                Err(_) => (
                    Value::Object(handle),
                    Resolution::FallbackAfterFailure { rule },
                ),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
