//! Enclosing-method handler (spec.md §4.1): given a returned reflective
//! method reference, resolves the declaring class, name, and descriptor via
//! the runtime's debug interface and formats them as
//! `"<class>.<name><descriptor>"`. No re-invocation: by the time the
//! breakpoint fires at method entry the handler only has the *arguments*,
//! not yet a return value, so this operates on the method-handle argument
//! itself rather than on a produced result.

use super::HitContext;
use crate::context::AgentContext;
use crate::error::AgentError;
use crate::trace::{TraceKind, TraceRecord, TraceValue};

pub fn handle(ctx: &AgentContext, hit: &HitContext<'_, '_>) -> Result<(), AgentError> {
    let shim = hit.shim();
    let caller_class = shim.caller_class_name(hit.thread);

    let method_handle = shim.local_object_argument(hit.thread, 1);
    let formatted = method_handle
        .and_then(|obj| hit.jvmti.method_handle_target(obj).ok())
        .map(|(method, _obj)| format_method_reference(hit, method))
        .unwrap_or_else(TraceValue::unknown);

    // `asInterfaceInstance` is a static `MethodHandleProxies` method; there
    // is no receiver to read a class name off of.
    let record = TraceRecord::new(TraceKind::Reflect, "asInterfaceInstance")
        .with_clazz("java.lang.invoke.MethodHandleProxies")
        .with_caller_class(caller_class)
        .with_result(formatted);
    ctx.trace_emitter.trace_call(record);
    Ok(())
}

fn format_method_reference(hit: &HitContext<'_, '_>, method: jvmti::sys::jni::jmethodID) -> TraceValue {
    let shim = hit.shim();
    let TraceValue::Str(declaring_class) = shim.method_declaring_class_name(method) else {
        return TraceValue::unknown();
    };
    let Some(name) = shim.method_name(method) else {
        return TraceValue::unknown();
    };
    let descriptor = hit
        .jvmti
        .get_method_name(method)
        .map(|(_name, sig)| sig)
        .unwrap_or_default();
    TraceValue::Str(format!("{declaring_class}.{name}{descriptor}"))
}
