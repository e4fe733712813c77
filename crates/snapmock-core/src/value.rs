#![forbid(unsafe_code)]
//! Runtime value model and structural type descriptors.
//!
//! The duplication policy cannot reflect over arbitrary Rust types, so the
//! mock layer hands arguments to the core as [`Value`] trees. Scalars and
//! strings carry value semantics and need no protection; objects are
//! [`ObjectHandle`]s with reference semantics, observable identity, and a
//! [`TypeDescriptor`] describing exactly what the policy needs to know about
//! the underlying type: its name, its originating provider namespace, and
//! its copy hooks.
//!
//! Duplication is shallow by design: [`ObjectHandle::duplicate`] copies the
//! field map one level deep, so nested object fields keep sharing state with
//! the original. This matches the capture semantics of the surrounding mock
//! framework and is documented there as an accepted limitation, not fixed
//! here.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TypeDescriptor — the introspection surface the policy consumes
// ---------------------------------------------------------------------------

/// Visibility of a type's on-copy hook.
///
/// A `Restricted` hook means the type limits copying to internal callers;
/// the capture layer must not duplicate such a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HookVisibility {
    Public,
    Restricted,
}

/// What a type's on-copy hook does when it actually runs.
///
/// `Fails` models a hook that raises at copy time; the attempt degrades to
/// keeping the original reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopyBehavior {
    Succeeds,
    Fails,
}

/// An on-copy callback declared by a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnCopyHook {
    pub visibility: HookVisibility,
    pub behavior: CopyBehavior,
}

/// Structural description of a value's runtime type.
///
/// This is everything the duplication policy inspects: the exact type name,
/// the provider namespace the type originates from (`None` for user-defined
/// types), an optional explicit duplicability override, and an optional
/// on-copy hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Exact type name, as the runtime reports it.
    pub type_name: String,
    /// Originating runtime/extension namespace; `None` for user-defined types.
    pub provider: Option<String>,
    /// Explicit self-declared answer to "is this instance duplicable".
    /// Overrides every other rule when present.
    pub duplicable_override: Option<bool>,
    /// On-copy callback declared by the type, if any.
    pub on_copy: Option<OnCopyHook>,
}

impl TypeDescriptor {
    /// Descriptor for a plain user-defined type: no provider, no hooks.
    pub fn user(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            provider: None,
            duplicable_override: None,
            on_copy: None,
        }
    }

    /// Descriptor for a type exposed by a runtime/extension provider.
    pub fn native(type_name: &str, provider: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            provider: Some(provider.to_string()),
            duplicable_override: None,
            on_copy: None,
        }
    }

    /// Attach an explicit duplicability override.
    pub fn with_override(mut self, duplicable: bool) -> Self {
        self.duplicable_override = Some(duplicable);
        self
    }

    /// Attach an on-copy hook.
    pub fn with_on_copy(mut self, visibility: HookVisibility, behavior: CopyBehavior) -> Self {
        self.on_copy = Some(OnCopyHook {
            visibility,
            behavior,
        });
        self
    }
}

// ---------------------------------------------------------------------------
// ObjectHandle — reference semantics with observable identity
// ---------------------------------------------------------------------------

/// Error produced when an attempted duplication raises.
///
/// Never surfaces past the policy: the caller falls back to the original
/// reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("duplication of `{type_name}` raised in its on-copy hook")]
pub struct DuplicationFailed {
    pub type_name: String,
}

#[derive(Debug)]
struct ObjectState {
    descriptor: TypeDescriptor,
    fields: BTreeMap<String, Value>,
}

/// Shared, mutable object instance.
///
/// Cloning the handle aliases the same instance; [`ObjectHandle::duplicate`]
/// creates an independent instance. Equality is identity, not structure.
#[derive(Debug, Clone)]
pub struct ObjectHandle(Rc<RefCell<ObjectState>>);

impl ObjectHandle {
    pub fn new(descriptor: TypeDescriptor) -> Self {
        Self(Rc::new(RefCell::new(ObjectState {
            descriptor,
            fields: BTreeMap::new(),
        })))
    }

    /// Builder-style field initialization.
    pub fn with_field(self, name: &str, value: Value) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn set_field(&self, name: &str, value: Value) {
        self.0.borrow_mut().fields.insert(name.to_string(), value);
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.0.borrow().fields.get(name).cloned()
    }

    pub fn field_count(&self) -> usize {
        self.0.borrow().fields.len()
    }

    pub fn type_name(&self) -> String {
        self.0.borrow().descriptor.type_name.clone()
    }

    pub fn descriptor(&self) -> TypeDescriptor {
        self.0.borrow().descriptor.clone()
    }

    /// Whether two handles refer to the same instance.
    pub fn ptr_eq(a: &ObjectHandle, b: &ObjectHandle) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Shallow copy: produces a new instance with its own field map.
    ///
    /// Nested object fields are carried over by handle and keep sharing
    /// state with the original (one-level copy). Runs the type's on-copy
    /// hook; a restricted hook is not invocable from the capture layer and
    /// a failing hook raises, both of which surface as
    /// [`DuplicationFailed`].
    pub fn duplicate(&self) -> Result<ObjectHandle, DuplicationFailed> {
        let state = self.0.borrow();
        if let Some(hook) = state.descriptor.on_copy {
            let raised = hook.visibility == HookVisibility::Restricted
                || hook.behavior == CopyBehavior::Fails;
            if raised {
                return Err(DuplicationFailed {
                    type_name: state.descriptor.type_name.clone(),
                });
            }
        }
        Ok(Self(Rc::new(RefCell::new(ObjectState {
            descriptor: state.descriptor.clone(),
            fields: state.fields.clone(),
        }))))
    }
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        ObjectHandle::ptr_eq(self, other)
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

// ---------------------------------------------------------------------------
// Value — what an intercepted call passes as arguments
// ---------------------------------------------------------------------------

/// A single argument value as seen by the capture layer.
///
/// Everything except `Object` has value semantics; storing it already
/// isolates the record from later caller mutation. Sequences are not
/// recursed into by the policy (shallow capture).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Value>),
    Object(ObjectHandle),
}

impl Value {
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<ObjectHandle> for Value {
    fn from(v: ObjectHandle) -> Self {
        Value::Object(v)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
