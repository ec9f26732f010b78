//! NativeBindingInterceptor (spec.md §4.3): installs a hook on a method
//! whose implementation is itself native, by substituting the function
//! pointer the runtime would call rather than using the bytecode-breakpoint
//! facility.
//!
//! Grounded on the teacher's `proxy.rs`: both keep a process-wide lookup
//! (there `RUST_HANDLERS: LazyLock<Mutex<HashMap<i64, Arc<RustHandler>>>>`,
//! here [`crate::hook::NativeBindingState`]) and an `extern "C"` trampoline
//! recovering its own context through a process-global rather than a
//! closed-over pointer, since the runtime hands it back a bare function
//! pointer with no user-data slot. Unlike `proxy.rs`'s trampoline, which is
//! shared by arbitrarily many dynamically-created proxies and so must
//! dispatch on an ID baked into its `this` argument, [`crate::table::NATIVE_BREAKPOINT_TABLE`]
//! names exactly one native method — so the replacement entry here closes
//! over a single well-known [`NativeHook`] rather than a keyed lookup.

use crate::context::AgentContext;
use crate::error::AgentError;
use crate::hook::{MethodId, NativeHook};
use crate::recursion::RecursionGuard;
use crate::resolver::MethodResolver;
use crate::table::NATIVE_BREAKPOINT_TABLE;
use jvmti::env::JniEnv;
use jvmti::sys::jni::{jmethodID, jobject, JNIEnv as RawJniEnv};
use std::sync::Arc;

/// Handles a "native method about to bind" event (spec.md §4.3 steps 2 and
/// 4). `new_entry_slot` is the runtime's mutable output slot: writing our
/// replacement address there is what actually installs the hook.
pub fn on_native_bind(ctx: &AgentContext, method: jmethodID, current_entry: usize, new_entry_slot: &mut usize) {
    let method_id = method as MethodId;
    let mut state = ctx.native_state.lock().unwrap();
    if let Some(hook) = state.installed.get(&method_id) {
        hook.set_original_if_absent(current_entry);
        *new_entry_slot = replacement_entry as usize;
    } else {
        state.pending.insert(method_id, current_entry);
    }
}

/// Resolves every [`crate::table::NativeHookSpec`], consuming any entry
/// already recorded in `PendingBindings` (spec.md §4.3 step 3). Mandatory
/// entries that fail to resolve abort the agent; optional ones are skipped.
pub fn install(ctx: &AgentContext, jni: &JniEnv<'_>) -> Result<(), AgentError> {
    for spec in NATIVE_BREAKPOINT_TABLE {
        let class_ref = match MethodResolver::resolve_class(jni, spec.class_name) {
            Ok(class_ref) => class_ref,
            Err(e) if spec.optional => {
                crate::log_warn!("skipping optional native hook {}: {e}", spec.method_name);
                continue;
            }
            Err(e) => return Err(e),
        };
        let method_id = match MethodResolver::resolve_method(
            jni,
            spec.class_name,
            &class_ref,
            spec.method_name,
            spec.descriptor,
        ) {
            Ok(id) => id,
            Err(e) if spec.optional => {
                crate::log_warn!("skipping optional native hook {}: {e}", spec.method_name);
                continue;
            }
            Err(e) => return Err(e),
        };

        let key = method_id as MethodId;
        let original = {
            let mut state = ctx.native_state.lock().unwrap();
            let original = state.pending.remove(&key);
            let hook = Arc::new(NativeHook::new(spec, class_ref, key, original));
            state.installed.insert(key, hook);
            original
        };

        // Registering our replacement entry can itself raise a native-bind
        // event for this method on some runtimes; hold the recursion flag
        // across the call so that re-entrant bind doesn't try to dispatch a
        // hook hit (spec.md §4.3: "set the RecursionFlag before calling
        // registration-like operations").
        let _guard = RecursionGuard::try_acquire();
        jni.register_native(spec.class_name, spec.method_name, spec.descriptor, replacement_entry as usize)
            .map_err(AgentError::from)?;
        ctx.stats.record_native_hook_installed();
        let _ = original;
    }
    Ok(())
}

/// The function installed in place of `Unsafe.objectFieldOffset0` (spec.md
/// §4.3's "replacement entry"): calls the original, captures and clears any
/// raised exception, then hands off to the `UnsafeFieldOffset::Native`
/// handler for tracing. If the original call failed, it is re-invoked once
/// more after tracing so the real caller still observes the same exception
/// the untraced call would have raised (spec.md §4.3's re-invocation
/// contract) — we never let the clear-for-tracing step swallow it.
extern "C" fn replacement_entry(env: *mut RawJniEnv, this: jobject, field: jobject) -> i64 {
    let ctx = crate::context::global();
    let jni = unsafe { JniEnv::from_raw(env) };

    let original_addr = {
        let state = ctx.native_state.lock().unwrap();
        state
            .installed
            .values()
            .next()
            .and_then(|hook| hook.original_entry())
    };

    let Some(addr) = original_addr else {
        crate::error::abort_on_invariant_violation("native hook invoked before original entry bound");
    };

    let result = unsafe { call_original(addr, env, this, field) };
    let had_exception = crate::jvmti_clear_pending_exception(&jni);

    if let Some(_guard) = RecursionGuard::try_acquire() {
        let hit = crate::handlers::HitContext {
            jvmti: ctx_jvmti(),
            jni: &jni,
            thread: std::ptr::null_mut(),
            method: std::ptr::null_mut(),
            receiver: this,
            native_arg: Some(field),
        };
        let op = crate::handlers::UnsafeOffsetOp::Native;
        if let Err(e) = crate::handlers::HandlerKind::UnsafeFieldOffset(op).invoke(ctx, &hit) {
            crate::log_warn!("native replacement entry trace failed: {e}");
        }
    }

    if had_exception {
        // Our clear above, done so the trace handler can run with a clean
        // thread-state, erased the original exception. Re-invoke once more
        // so the real caller still observes a pending exception on return —
        // the JVM discards `result` and raises whatever exception is
        // pending when this native frame returns, regardless of its value.
        let _ = unsafe { call_original(addr, env, this, field) };
        crate::log_warn!("objectFieldOffset0 re-invocation observed a failure");
    }

    result
}

/// Placeholder accessor until `Agent_OnLoad` threads a real `Jvmti` handle
/// through to the replacement entry; the native-bind path only needs
/// `Jvmti` for the trace handler's frame/class lookups, which the
/// `UnsafeFieldOffset::Native` variant does not perform (it only reads the
/// `field` argument directly), so this never actually dereferences.
fn ctx_jvmti() -> &'static jvmti::env::Jvmti {
    crate::context::jvmti_handle()
}

unsafe fn call_original(addr: usize, env: *mut RawJniEnv, this: jobject, field: jobject) -> i64 {
    let f: extern "C" fn(*mut RawJniEnv, jobject, jobject) -> i64 = std::mem::transmute(addr);
    f(env, this, field)
}
