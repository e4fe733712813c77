#![no_main]

use libfuzzer_sys::fuzz_target;
use snapmock_core::{
    CopyBehavior, DuplicationPolicy, HookVisibility, InvocationRecord, NonDuplicableTables,
    ObjectHandle, ShortenedExport, Target, TypeDescriptor, Value,
};

const MAX_ARGS: usize = 16;

fn byte(data: &[u8], index: usize) -> u8 {
    data.get(index).copied().unwrap_or(0)
}

fn descriptor(data: &[u8], index: usize) -> TypeDescriptor {
    let selector = byte(data, index);
    let mut d = match selector % 4 {
        0 => TypeDescriptor::user("Order"),
        1 => TypeDescriptor::user("Closure"),
        2 => TypeDescriptor::native("mysqli_result", "mysqli"),
        _ => TypeDescriptor::native("pcre_match", "pcre"),
    };
    if selector & 0x10 != 0 {
        d = d.with_override(selector & 0x20 != 0);
    }
    if selector & 0x40 != 0 {
        let visibility = if selector & 0x80 != 0 {
            HookVisibility::Restricted
        } else {
            HookVisibility::Public
        };
        let behavior = if selector & 0x08 != 0 {
            CopyBehavior::Fails
        } else {
            CopyBehavior::Succeeds
        };
        d = d.with_on_copy(visibility, behavior);
    }
    d
}

fn value(data: &[u8], index: usize) -> Value {
    match byte(data, index) % 6 {
        0 => Value::Null,
        1 => Value::Bool(byte(data, index + 1) & 1 == 1),
        2 => Value::Int(i64::from(byte(data, index + 1))),
        3 => Value::Str("x".repeat(usize::from(byte(data, index + 1)))),
        4 => Value::Seq(vec![Value::Int(1), Value::Null]),
        _ => Value::Object(
            ObjectHandle::new(descriptor(data, index + 1)).with_field("f", Value::Int(0)),
        ),
    }
}

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let tables = if data[0] & 1 == 0 {
        NonDuplicableTables::default()
    } else {
        NonDuplicableTables::empty().with_provider("mysqli")
    };
    let policy = DuplicationPolicy::new(tables);

    let arg_count = usize::from(byte(data, 1)) % MAX_ARGS;
    let arguments: Vec<Value> = (0..arg_count).map(|i| value(data, 2 + i * 2)).collect();

    // Resolution never panics and never changes the argument count.
    let record = InvocationRecord::create(Target::class("Fuzz"), "call", arguments, &policy)
        .expect("non-empty method name");
    assert_eq!(record.arguments().len(), arg_count);

    // Rendering is bounded-ish per argument and deterministic.
    let exporter = ShortenedExport::default();
    let first = record.describe(&exporter);
    assert_eq!(first, record.describe(&exporter));
});
