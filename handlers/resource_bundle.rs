//! `ResourceBundle.getBundle` handler (spec.md §4.1). `getBundle` resolves
//! its caller through an internal trampoline
//! (`ResourceBundle.Control`/`getCallerClass`-equivalent machinery), so the
//! direct caller frame is never the real user code — the handler must
//! climb two additional frames, same as the bundled JDK helper it traces.
//! Per spec.md §9's third Open Question, the exact depth is runtime-version
//! dependent: we probe depth 3 first and fall back to depth 4 if that frame
//! is itself still inside `java.util.ResourceBundle`.

use super::HitContext;
use crate::context::AgentContext;
use crate::error::AgentError;
use crate::trace::{TraceKind, TraceRecord, TraceValue};
use jvmti::env::JValue;

pub fn handle(ctx: &AgentContext, hit: &HitContext<'_, '_>) -> Result<(), AgentError> {
    let shim = hit.shim();
    let caller_class = real_caller_class(hit);

    let name = shim.local_string_argument(hit.thread, 0);
    let Ok(class) = hit.jni.find_class("java/util/ResourceBundle") else {
        return Ok(());
    };
    let arg = match &name {
        TraceValue::Str(s) => hit.jni.new_string_utf(s).ok(),
        _ => None,
    };
    let result = hit.jni.call_static_object_method(&class, hit.method, &[JValue::Object(arg)]);
    let failed = crate::jvmti_clear_pending_exception(hit.jni);
    let outcome = !failed && matches!(result, Ok(Some(_)));

    let record = TraceRecord::new(TraceKind::Reflect, "getBundle")
        .with_clazz(TraceValue::Str("java.util.ResourceBundle".to_string()))
        .with_caller_class(caller_class)
        .with_result(TraceValue::Bool(outcome))
        .with_args(vec![name]);
    ctx.trace_emitter.trace_call(record);
    Ok(())
}

fn real_caller_class(hit: &HitContext<'_, '_>) -> TraceValue {
    let shim = hit.shim();
    for depth in [3, 4] {
        if let TraceValue::Str(name) = shim.caller_class_name_at_depth(hit.thread, depth) {
            if !name.starts_with("java.util.ResourceBundle") {
                return TraceValue::Str(name);
            }
        }
    }
    TraceValue::unknown()
}
