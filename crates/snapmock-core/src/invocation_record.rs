#![forbid(unsafe_code)]
//! Immutable snapshots of intercepted calls.
//!
//! The mock/proxy layer builds one [`InvocationRecord`] per intercepted
//! call, at interception time. Construction runs every object argument
//! through the [`DuplicationPolicy`], so later mutation by the caller does
//! not corrupt what the verification engine compares against.
//!
//! Known limitation, carried over deliberately: duplication is shallow.
//! An argument kept by reference (non-duplicable type, or a failed copy)
//! and any mutable object reachable through a duplicated argument's own
//! fields can still change after capture.

use std::fmt;

use crate::duplication_policy::DuplicationPolicy;
use crate::export::ValueExporter;
use crate::value::{ObjectHandle, Value};

// ---------------------------------------------------------------------------
// Target — receiver identity
// ---------------------------------------------------------------------------

/// Identity of the receiver of an intercepted call.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Static/class-level call; identified by type name.
    Class(String),
    /// Instance call; identified by the instance itself.
    Instance(ObjectHandle),
}

impl Target {
    pub fn class(name: &str) -> Self {
        Target::Class(name.to_string())
    }

    pub fn instance(handle: ObjectHandle) -> Self {
        Target::Instance(handle)
    }

    /// Type name of the receiver, for display.
    pub fn type_name(&self) -> String {
        match self {
            Target::Class(name) => name.clone(),
            Target::Instance(handle) => handle.type_name(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

// ---------------------------------------------------------------------------
// InvocationRecord
// ---------------------------------------------------------------------------

/// A malformed record would corrupt assertion results downstream, so
/// construction rejects it instead of accepting it silently.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvocationError {
    #[error("method name must not be empty")]
    EmptyMethodName,
}

/// One intercepted call: receiver identity, method name, and the argument
/// values as they existed at call time.
///
/// Immutable after construction; the fields expose read access only.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRecord {
    target: Target,
    method_name: String,
    arguments: Vec<Value>,
}

impl InvocationRecord {
    /// Capture one call.
    ///
    /// Every argument is passed through `policy`: object values are
    /// replaced by independent shallow duplicates where the policy allows,
    /// and kept by reference otherwise. Length and order of `arguments`
    /// are preserved. Apart from the empty-method-name check this never
    /// fails; duplication failures degrade inside the policy.
    pub fn create(
        target: Target,
        method_name: &str,
        arguments: Vec<Value>,
        policy: &DuplicationPolicy,
    ) -> Result<Self, InvocationError> {
        if method_name.is_empty() {
            return Err(InvocationError::EmptyMethodName);
        }
        let arguments = arguments
            .into_iter()
            .map(|argument| policy.resolve(argument))
            .collect();
        Ok(Self {
            target,
            method_name: method_name.to_string(),
            arguments,
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Render `"<target>::<method>(<arg>, <arg>, ...)"` for diagnostics.
    ///
    /// Argument rendering is delegated to the injected exporter. No side
    /// effects; identical calls yield identical strings.
    pub fn describe(&self, exporter: &dyn ValueExporter) -> String {
        let rendered: Vec<String> = self
            .arguments
            .iter()
            .map(|argument| exporter.shortened_export(argument))
            .collect();
        format!(
            "{}::{}({})",
            self.target,
            self.method_name,
            rendered.join(", ")
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ShortenedExport;
    use crate::value::{CopyBehavior, HookVisibility, TypeDescriptor};

    fn policy() -> DuplicationPolicy {
        DuplicationPolicy::default()
    }

    // -- Construction --

    #[test]
    fn empty_method_name_is_rejected() {
        let err = InvocationRecord::create(Target::class("Svc"), "", vec![], &policy());
        assert_eq!(err.unwrap_err(), InvocationError::EmptyMethodName);
    }

    #[test]
    fn empty_argument_list_is_fine() {
        let record =
            InvocationRecord::create(Target::class("Svc"), "ping", vec![], &policy()).expect("ok");
        assert!(record.arguments().is_empty());
    }

    #[test]
    fn scalar_arguments_are_stored_by_value() {
        let record = InvocationRecord::create(
            Target::class("Calculator"),
            "add",
            vec![Value::Int(3), Value::Int(4)],
            &policy(),
        )
        .expect("ok");
        assert_eq!(record.arguments().len(), 2);
        assert_eq!(record.arguments()[0], Value::Int(3));
        assert_eq!(record.arguments()[1], Value::Int(4));
    }

    #[test]
    fn object_arguments_are_snapshotted() {
        let o = ObjectHandle::new(TypeDescriptor::user("Order")).with_field("x", Value::Int(1));
        let record = InvocationRecord::create(
            Target::class("Svc"),
            "handle",
            vec![Value::Object(o.clone())],
            &policy(),
        )
        .expect("ok");

        o.set_field("x", Value::Int(2));

        let Value::Object(stored) = &record.arguments()[0] else {
            panic!("object lost");
        };
        assert!(!ObjectHandle::ptr_eq(stored, &o));
        assert_eq!(stored.field("x"), Some(Value::Int(1)));
    }

    #[test]
    fn non_duplicable_argument_keeps_identity() {
        let h = ObjectHandle::new(TypeDescriptor::user("Closure"));
        let record = InvocationRecord::create(
            Target::class("Svc"),
            "save",
            vec![Value::Object(h.clone())],
            &policy(),
        )
        .expect("ok");
        let Value::Object(stored) = &record.arguments()[0] else {
            panic!("object lost");
        };
        assert!(ObjectHandle::ptr_eq(stored, &h));
    }

    #[test]
    fn order_is_preserved_across_mixed_duplication() {
        let a = Value::Int(1);
        let b = Value::Object(ObjectHandle::new(TypeDescriptor::user("Order")));
        let c = Value::Object(ObjectHandle::new(TypeDescriptor::user("Closure")));
        let record = InvocationRecord::create(
            Target::class("Svc"),
            "mixed",
            vec![a.clone(), b.clone(), c.clone()],
            &policy(),
        )
        .expect("ok");

        assert_eq!(record.arguments().len(), 3);
        assert_eq!(record.arguments()[0], a);
        // b was duplicated in place, c kept by reference.
        assert_ne!(record.arguments()[1], b);
        assert_eq!(record.arguments()[2], c);
    }

    #[test]
    fn failed_duplication_never_propagates_out_of_create() {
        let flaky = ObjectHandle::new(
            TypeDescriptor::user("Flaky")
                .with_on_copy(HookVisibility::Public, CopyBehavior::Fails),
        );
        let record = InvocationRecord::create(
            Target::class("Svc"),
            "handle",
            vec![Value::Object(flaky.clone())],
            &policy(),
        )
        .expect("create must succeed");
        let Value::Object(stored) = &record.arguments()[0] else {
            panic!("object lost");
        };
        assert!(ObjectHandle::ptr_eq(stored, &flaky));
    }

    // -- Target --

    #[test]
    fn instance_target_displays_its_type_name() {
        let h = ObjectHandle::new(TypeDescriptor::user("OrderService"));
        assert_eq!(Target::instance(h).to_string(), "OrderService");
        assert_eq!(Target::class("Calculator").to_string(), "Calculator");
    }

    // -- describe --

    #[test]
    fn describe_renders_the_call_signature() {
        let record = InvocationRecord::create(
            Target::class("Calculator"),
            "add",
            vec![Value::Int(3), Value::Int(4)],
            &policy(),
        )
        .expect("ok");
        assert_eq!(
            record.describe(&ShortenedExport::default()),
            "Calculator::add(3, 4)"
        );
    }

    #[test]
    fn describe_is_deterministic() {
        let record = InvocationRecord::create(
            Target::class("Svc"),
            "save",
            vec![
                Value::Str("abc".to_string()),
                Value::Object(ObjectHandle::new(TypeDescriptor::user("Order"))),
            ],
            &policy(),
        )
        .expect("ok");
        let exporter = ShortenedExport::default();
        assert_eq!(record.describe(&exporter), record.describe(&exporter));
        assert_eq!(
            record.describe(&exporter),
            "Svc::save('abc', Order Object (...))"
        );
    }

    #[test]
    fn describe_with_no_arguments() {
        let record =
            InvocationRecord::create(Target::class("Svc"), "ping", vec![], &policy()).expect("ok");
        assert_eq!(record.describe(&ShortenedExport::default()), "Svc::ping()");
    }
}
