//! Argument-expanding handlers (spec.md §4.1): `Proxy.newProxyInstance` and
//! `Proxy.getProxyClass`. Beyond the re-invoking handlers' behaviour, these
//! also materialise the `Class<?>[]` interfaces argument into a list of
//! class names via [`crate::argument_shim::ArgumentShim::class_array_names`].

use super::{ArgExpandOp, HitContext};
use crate::context::AgentContext;
use crate::error::AgentError;
use crate::trace::{TraceKind, TraceRecord, TraceValue};
use jvmti::env::JValue;

pub fn handle(ctx: &AgentContext, hit: &HitContext<'_, '_>, op: ArgExpandOp) -> Result<(), AgentError> {
    let shim = hit.shim();
    let caller_class = shim.caller_class_name(hit.thread);

    // Both hooked overloads take `(ClassLoader, Class<?>[], ...)`: the
    // loader at slot 0, the interfaces array at slot 1.
    let loader = shim.local_object_argument(hit.thread, 0);
    let interfaces = shim.local_object_argument(hit.thread, 1);
    let interface_names = interfaces.map(|arr| shim.class_array_names(arr)).unwrap_or_default();

    let outcome = match op {
        ArgExpandOp::NewProxyInstance => {
            let handler = shim.local_object_argument(hit.thread, 2);
            reinvoke_static(
                hit,
                "java/lang/reflect/Proxy",
                &[JValue::Object(loader), JValue::Object(interfaces), JValue::Object(handler)],
            )
        }
        ArgExpandOp::GetProxyClass => reinvoke_static(
            hit,
            "java/lang/reflect/Proxy",
            &[JValue::Object(loader), JValue::Object(interfaces)],
        ),
    };

    // Both overloads are static `Proxy` methods; there is no receiver to
    // read a class name off of.
    let record = TraceRecord::new(TraceKind::Reflect, op.function_name())
        .with_clazz("java.lang.reflect.Proxy")
        .with_caller_class(caller_class)
        .with_result(TraceValue::Bool(outcome))
        .with_args(vec![TraceValue::List(interface_names)]);
    ctx.trace_emitter.trace_call(record);
    Ok(())
}

fn reinvoke_static(hit: &HitContext<'_, '_>, owner: &str, args: &[JValue]) -> bool {
    let Ok(class) = hit.jni.find_class(owner) else {
        return false;
    };
    let result = hit.jni.call_static_object_method(&class, hit.method, args);
    let failed = crate::jvmti_clear_pending_exception(hit.jni);
    !failed && matches!(result, Ok(Some(_)))
}
