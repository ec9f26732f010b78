//! Re-invoking handlers (spec.md §4.1): `forName`, `getField`,
//! `getDeclaredField`, `getMethod`, `getDeclaredMethod`, `getConstructor`,
//! `getDeclaredConstructor`, the two resource lookups, and the two
//! method-handle `Lookup.find*` operations. Each calls the intercepted
//! method again with the same arguments and reports success as a boolean,
//! following the **re-invocation contract** in spec.md §4.1: a failure
//! raised by the re-invocation is captured and cleared via
//! [`crate::jvmti_clear_pending_exception`], never left pending on the
//! runtime's thread-state.

use super::{HitContext, ReInvokeOp};
use crate::context::AgentContext;
use crate::error::AgentError;
use crate::trace::{TraceKind, TraceRecord, TraceValue};
use jvmti::env::JValue;
use jvmti::sys::jni::jmethodID;
use std::sync::OnceLock;

pub fn handle(ctx: &AgentContext, hit: &HitContext<'_, '_>, op: ReInvokeOp) -> Result<(), AgentError> {
    let shim = hit.shim();
    let caller_class = shim.caller_class_name(hit.thread);

    let (args, outcome) = match op {
        ReInvokeOp::ForName => {
            let name = shim.local_string_argument(hit.thread, 0);
            let outcome = reinvoke_for_name(hit, &name);
            (vec![name], outcome)
        }
        ReInvokeOp::GetField
        | ReInvokeOp::GetDeclaredField
        | ReInvokeOp::GetResource
        | ReInvokeOp::GetResourceAsStream => {
            let name = shim.local_string_argument(hit.thread, 1);
            let outcome = reinvoke_instance(hit, &[JValue::Object(shim.local_object_argument(hit.thread, 1))]);
            (vec![name], outcome)
        }
        ReInvokeOp::GetMethod | ReInvokeOp::GetDeclaredMethod => {
            let name = shim.local_string_argument(hit.thread, 1);
            let outcome = reinvoke_instance(
                hit,
                &[
                    JValue::Object(shim.local_object_argument(hit.thread, 1)),
                    JValue::Object(shim.local_object_argument(hit.thread, 2)),
                ],
            );
            (vec![name], outcome)
        }
        ReInvokeOp::GetConstructor | ReInvokeOp::GetDeclaredConstructor => {
            let outcome =
                reinvoke_instance(hit, &[JValue::Object(shim.local_object_argument(hit.thread, 1))]);
            (Vec::new(), outcome)
        }
        ReInvokeOp::MethodHandleFindStatic | ReInvokeOp::MethodHandleFindVirtual => {
            let name = shim.local_string_argument(hit.thread, 2);
            let outcome = reinvoke_instance(
                hit,
                &[
                    JValue::Object(shim.local_object_argument(hit.thread, 1)),
                    JValue::Object(shim.local_object_argument(hit.thread, 2)),
                    JValue::Object(shim.local_object_argument(hit.thread, 3)),
                ],
            );
            (vec![name], outcome)
        }
    };

    // `forName` has no receiver at all (static); the field/method/ctor
    // lookups' receiver IS the `Class` being reflected on, so its own name
    // is what belongs here. `getResource*` and the `Lookup.find*` pair
    // receive a plain ClassLoader/Lookup instance, so the runtime class of
    // that instance is what belongs there instead.
    let clazz = match op {
        ReInvokeOp::ForName => TraceValue::Str("java.lang.Class".to_string()),
        ReInvokeOp::GetField
        | ReInvokeOp::GetDeclaredField
        | ReInvokeOp::GetMethod
        | ReInvokeOp::GetDeclaredMethod
        | ReInvokeOp::GetConstructor
        | ReInvokeOp::GetDeclaredConstructor => shim.class_name(hit.receiver),
        ReInvokeOp::GetResource
        | ReInvokeOp::GetResourceAsStream
        | ReInvokeOp::MethodHandleFindStatic
        | ReInvokeOp::MethodHandleFindVirtual => shim.class_name_of(hit.receiver),
    };

    // The field/method/constructor lookups' receiver IS the declaring class
    // of whatever member gets looked up, so `declaringClass` is the same
    // name as `clazz` for them (spec.md §8 scenario 1). The other ops have
    // no declaring class to report — it stays the `TraceRecord::new` default.
    let declaring_class = match op {
        ReInvokeOp::GetField
        | ReInvokeOp::GetDeclaredField
        | ReInvokeOp::GetMethod
        | ReInvokeOp::GetDeclaredMethod
        | ReInvokeOp::GetConstructor
        | ReInvokeOp::GetDeclaredConstructor => clazz.clone(),
        ReInvokeOp::ForName
        | ReInvokeOp::GetResource
        | ReInvokeOp::GetResourceAsStream
        | ReInvokeOp::MethodHandleFindStatic
        | ReInvokeOp::MethodHandleFindVirtual => TraceValue::null(),
    };

    let record = TraceRecord::new(TraceKind::Reflect, op.function_name())
        .with_clazz(clazz)
        .with_declaring_class(declaring_class)
        .with_caller_class(caller_class)
        .with_result(TraceValue::Bool(outcome))
        .with_args(args);
    ctx.trace_emitter.trace_call(record);
    Ok(())
}

/// `forName` is caller-sensitive; re-invoking it faithfully would require
/// passing the direct caller's classloader, which in turn forces us onto
/// the three-argument overload. Per spec.md §9's first Open Question, that
/// overload is invoked with `initialize=false` regardless of what the
/// original call requested, to avoid triggering further hookable class-init
/// events from inside our own re-invocation.
fn reinvoke_for_name(hit: &HitContext<'_, '_>, name: &TraceValue) -> bool {
    let TraceValue::Str(name) = name else {
        return false;
    };
    let Some(method) = for_name_three_arg_method_id(hit) else {
        return false;
    };
    let Ok(jname) = hit.jni.new_string_utf(name) else {
        return false;
    };
    let caller_loader = hit
        .jvmti
        .get_frame_location(hit.thread, 1)
        .ok()
        .and_then(|(caller_method, _)| hit.jvmti.get_method_declaring_class(caller_method).ok())
        .and_then(|class| hit.jvmti.get_class_loader(class).ok());
    let Ok(class_class) = hit.jni.find_class("java/lang/Class") else {
        return false;
    };
    let result = hit.jni.call_static_object_method(
        &class_class,
        method,
        &[JValue::Object(Some(jname)), JValue::Bool(false), JValue::Object(caller_loader)],
    );
    let failed = crate::jvmti_clear_pending_exception(hit.jni);
    !failed && matches!(result, Ok(Some(_)))
}

static FOR_NAME_THREE_ARG: OnceLock<Option<jmethodID>> = OnceLock::new();

fn for_name_three_arg_method_id(hit: &HitContext<'_, '_>) -> Option<jmethodID> {
    *FOR_NAME_THREE_ARG.get_or_init(|| {
        let class = hit.jni.find_class("java/lang/Class").ok()?;
        hit.jni
            .get_static_method_id(
                &class,
                "forName",
                "(Ljava/lang/String;ZLjava/lang/ClassLoader;)Ljava/lang/Class;",
            )
            .ok()
    })
}

/// Generic re-invocation of an instance method on `hit.receiver` with
/// object-shaped arguments, clearing any raised exception and reporting
/// whether the call produced a non-null result.
fn reinvoke_instance(hit: &HitContext<'_, '_>, args: &[JValue]) -> bool {
    let result = hit.jni.call_object_method(hit.receiver, hit.method, args);
    let failed = crate::jvmti_clear_pending_exception(hit.jni);
    !failed && matches!(result, Ok(Some(_)))
}
