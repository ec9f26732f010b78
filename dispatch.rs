//! DispatchCore (spec.md §4.4): the single entry point every hook-hit event
//! funnels through. Guards reentry, looks up the installed [`Hook`], hands
//! off to its [`HandlerKind`], and enforces the "no leaked pending failure"
//! postcondition before returning.

use crate::context::AgentContext;
use crate::error::AgentError;
use crate::handlers::HitContext;
use crate::hook::MethodId;
use crate::recursion::RecursionGuard;
use jvmti::env::{Jvmti, JniEnv};
use jvmti::sys::jni::{jmethodID, jthread};

/// Runs on every hook-hit event. Returns whether a handler actually ran
/// (spec.md §4.4: "advisory... true indicating the handler accepted the
/// event") — `false` covers both the reentrancy short-circuit and a
/// deliberately-skipped optional hook, neither of which is an error.
///
/// `thread`/`method` are everything the host runtime's `Breakpoint` event
/// hands us directly — it carries no receiver argument, unlike
/// [`crate::native_binding`]'s replacement entry, which gets `this`
/// straight from its own native signature. For an instance method the
/// receiver is local variable 0 of the stopped frame; for a static method
/// there is no receiver at all. Which applies depends on the looked-up
/// [`crate::hook::Hook`]'s `spec.is_static`, so this can only be resolved
/// after the lookup, not before.
pub fn dispatch_hit(ctx: &AgentContext, jvmti: &Jvmti, jni: &JniEnv<'_>, thread: jthread, method: jmethodID) -> bool {
    let Some(_guard) = RecursionGuard::try_acquire() else {
        return false;
    };

    let method_id = method as MethodId;
    let outcome = ctx.installed.with_hook(method_id, |hook| {
        let receiver = if hook.spec.is_static {
            std::ptr::null_mut()
        } else {
            jvmti.get_local_object(thread, 0, 0).unwrap_or(std::ptr::null_mut())
        };
        let hit = HitContext {
            jvmti,
            jni,
            thread,
            method,
            receiver,
            native_arg: None,
        };
        match hook.spec.handler.invoke(ctx, &hit) {
            Ok(()) => true,
            Err(AgentError::OptionalAbsence { .. } | AgentError::CallsiteRejected(_)) => false,
            Err(AgentError::Invariant(msg)) => crate::error::abort_on_invariant_violation(&msg),
            Err(other) => {
                crate::log_warn!("handler for {}.{} failed: {other}", hook.spec.class_name, hook.spec.method_name);
                false
            }
        }
    });

    let ran = match outcome {
        Some(ran) => ran,
        None => crate::error::abort_on_invariant_violation(&format!(
            "dispatch received event for unknown method identity {method_id}"
        )),
    };

    // Postcondition (spec.md §4.4 step 6): a handler's own re-invocations
    // already clear their exceptions through the documented contract
    // (`crate::jvmti_clear_pending_exception` inside each handler), so
    // anything still pending here was never ours to begin with and the
    // handler leaked it — always a fatal internal error, never just a
    // warning.
    if jni.exception_check() {
        crate::error::abort_on_invariant_violation(&format!(
            "pending failure leaked past dispatch for method identity {method_id}"
        ));
    }
    crate::take_cleared_exception_flag();

    ctx.stats.record_hit_dispatched();
    ran
}
