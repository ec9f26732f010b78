//! Serialization-constructor handler (spec.md §4.1): after observing an
//! `ObjectStreamClass(Class)` construction, walks the target class's
//! superclass chain (the class-data-layout order `ObjectStreamClass`
//! itself walks) to enumerate transitively-referenced stream classes,
//! emitting one record per transitive target. Lambda-synthetic classes
//! (name containing `$$Lambda$`) are suppressed entirely — never counted,
//! never emitted.

use super::HitContext;
use crate::context::AgentContext;
use crate::error::AgentError;
use crate::trace::{TraceKind, TraceRecord, TraceValue};

const LAMBDA_MARKER: &str = "$$Lambda$";

pub fn handle(ctx: &AgentContext, hit: &HitContext<'_, '_>) -> Result<(), AgentError> {
    let shim = hit.shim();
    let caller_class = shim.caller_class_name(hit.thread);

    let Some(target) = shim.local_object_argument(hit.thread, 1) else {
        return Ok(());
    };

    for class_name in serializable_chain(hit, target) {
        if class_name.contains(LAMBDA_MARKER) {
            continue;
        }
        let record = TraceRecord::new(TraceKind::Serialization, "ObjectStreamClass.<init>")
            .with_caller_class(caller_class.clone())
            .with_args(vec![TraceValue::Str(class_name)]);
        ctx.trace_emitter.trace_call(record);
    }
    Ok(())
}

/// Walks `target` and its superclasses, stopping at the first
/// non-serializable ancestor (matching `ObjectStreamClass`'s own
/// class-data-layout scan, which only descends through the serializable
/// prefix of the hierarchy).
fn serializable_chain(hit: &HitContext<'_, '_>, target: jvmti::sys::jni::jobject) -> Vec<String> {
    let shim = hit.shim();
    let mut names = Vec::new();
    let mut current = Some(target);
    while let Some(class) = current {
        if !hit.jvmti.is_assignable_to(class, "java/io/Serializable").unwrap_or(false) {
            break;
        }
        if let TraceValue::Str(name) = shim.class_name(class) {
            names.push(name);
        }
        current = hit.jvmti.get_superclass(class).ok().filter(|c| !c.is_null());
    }
    names
}
