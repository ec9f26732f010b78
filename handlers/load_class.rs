//! The `loadClass` classloader handler (spec.md §4.1, §4.5). Dispatch only
//! reaches this handler after [`crate::callsite_filter`] has accepted the
//! call site as an explicit user invocation; this function's only job is
//! the re-invocation and trace emission described in spec.md §4.5 step 7.

use super::HitContext;
use crate::context::AgentContext;
use crate::error::AgentError;
use crate::trace::{TraceKind, TraceRecord, TraceValue};
use jvmti::env::JValue;

pub fn handle(ctx: &AgentContext, hit: &HitContext<'_, '_>) -> Result<(), AgentError> {
    if !crate::callsite_filter::is_explicit_call_site(ctx, hit.jvmti, hit.jni, hit.thread)? {
        return Ok(());
    }

    let shim = hit.shim();
    let caller_class = shim.caller_class_name(hit.thread);
    let classloader_class = shim.class_name_of(hit.receiver);
    let name = shim.local_string_argument(hit.thread, 1);

    let arg = match &name {
        TraceValue::Str(s) => hit.jni.new_string_utf(s).ok(),
        _ => None,
    };
    let result = hit.jni.call_object_method(hit.receiver, hit.method, &[JValue::Object(arg)]);
    let failed = crate::jvmti_clear_pending_exception(hit.jni);
    let resolved = !failed && matches!(result, Ok(Some(_)));

    let record = TraceRecord::new(TraceKind::Reflect, "loadClass")
        .with_clazz(classloader_class)
        .with_caller_class(caller_class)
        .with_result(TraceValue::Bool(resolved))
        .with_args(vec![name]);
    ctx.trace_emitter.trace_call(record);
    Ok(())
}
