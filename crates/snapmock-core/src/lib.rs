#![forbid(unsafe_code)]
//! Invocation snapshot core for a test-double library.
//!
//! When a stubbed call fires, the framework captures an immutable record of
//! what was called — receiver identity, method name, and the argument
//! values as they existed at call time — so later assertions compare
//! against that moment even if the caller mutates its arguments afterward.
//!
//! Two components:
//!
//! - [`duplication_policy::DuplicationPolicy`] decides, per object value,
//!   whether duplicating it is safe, and performs the shallow copy when it
//!   is. Driven by injected blocklist tables plus the type's own hooks;
//!   every failure path degrades to keeping the original reference.
//! - [`invocation_record::InvocationRecord`] is the captured call: it runs
//!   each object argument through the policy at construction time and can
//!   render a `Target::method(args)` diagnostic line through a pluggable
//!   [`export::ValueExporter`].
//!
//! Duplication is shallow (one level) by design; nested mutable objects
//! reachable through an argument's own fields are not protected. See the
//! module docs of [`invocation_record`].

pub mod duplication_policy;
pub mod export;
pub mod invocation_record;
pub mod value;

pub use duplication_policy::{
    Classification, DuplicationPolicy, NonDuplicableTables, PolicyRule, Resolution, Verdict,
};
pub use export::{ShortenedExport, ValueExporter};
pub use invocation_record::{InvocationError, InvocationRecord, Target};
pub use value::{
    CopyBehavior, DuplicationFailed, HookVisibility, ObjectHandle, OnCopyHook, TypeDescriptor,
    Value,
};
