//! `Unsafe.objectFieldOffset` handlers (spec.md §4.1): three variants —
//! by `Field` object, by `(Class, String)` pair, and the native entry point
//! substituted via [`crate::native_binding`]. Each extracts the target
//! field's declaring class and name and emits `(declaring class, field
//! name, success)`; `success` is whether the re-invocation returned without
//! raising, since the offset value itself carries no semantic content worth
//! tracing.

use super::{HitContext, UnsafeOffsetOp};
use crate::context::AgentContext;
use crate::error::AgentError;
use crate::trace::{TraceKind, TraceRecord, TraceValue};
use jvmti::env::JValue;

pub fn handle(ctx: &AgentContext, hit: &HitContext<'_, '_>, op: UnsafeOffsetOp) -> Result<(), AgentError> {
    let shim = hit.shim();
    let caller_class = shim.caller_class_name(hit.thread);

    let (declaring_class, field_name, outcome) = match op {
        UnsafeOffsetOp::ByField => {
            let field = shim.local_object_argument(hit.thread, 1);
            let (declaring_class, field_name) = field
                .and_then(|f| hit.jvmti.field_declaring_class_and_name(f).ok())
                .unwrap_or((TraceValue::unknown(), TraceValue::unknown()));
            let outcome = reinvoke_instance(hit, &[JValue::Object(field)]);
            (declaring_class, field_name, outcome)
        }
        UnsafeOffsetOp::ByClassAndName => {
            let class_arg = shim.local_object_argument(hit.thread, 1);
            let name_arg = shim.local_string_argument(hit.thread, 2);
            let declaring_class = class_arg
                .map(|c| shim.class_name_of(c))
                .unwrap_or_else(TraceValue::unknown);
            let outcome = reinvoke_instance(
                hit,
                &[
                    JValue::Object(class_arg),
                    JValue::Object(shim.local_object_argument(hit.thread, 2)),
                ],
            );
            (declaring_class, name_arg, outcome)
        }
        UnsafeOffsetOp::Native => {
            // Invoked from the native-binding replacement entry, which has
            // no stopped frame to read locals from and so passes its one
            // object argument directly via `hit.native_arg`. The
            // re-invocation itself already happened there (spec.md §4.3),
            // so this path only formats the trace record.
            let field = hit.native_arg;
            let (declaring_class, field_name) = field
                .and_then(|f| hit.jvmti.field_declaring_class_and_name(f).ok())
                .unwrap_or((TraceValue::unknown(), TraceValue::unknown()));
            (declaring_class, field_name, true)
        }
    };

    let record = TraceRecord::new(TraceKind::Reflect, op.function_name())
        .with_clazz(shim.class_name_of(hit.receiver))
        .with_declaring_class(declaring_class)
        .with_caller_class(caller_class)
        .with_result(TraceValue::Bool(outcome))
        .with_args(vec![field_name]);
    ctx.trace_emitter.trace_call(record);
    Ok(())
}

fn reinvoke_instance(hit: &HitContext<'_, '_>, args: &[JValue]) -> bool {
    let result = hit.jni.call_long_method(hit.receiver, hit.method, args);
    let failed = crate::jvmti_clear_pending_exception(hit.jni);
    !failed && result.is_ok()
}
