//! Process-wide agent bootstrap (SPEC_FULL.md §3 "Agent lifecycle entry
//! points"): spec.md itself keeps this out of scope ("the process-wide
//! agent bootstrap... argument parsing, isolate startup"), but the binding
//! crate still needs a concrete [`jvmti::Agent`] impl to generate
//! `Agent_OnLoad`/`Agent_OnUnload` at all, so this is what
//! [`jvmti::export_agent!`] is pointed at.
//!
//! Split across the two lifecycle points the runtime actually gives us a
//! live `JNIEnv` for: `on_load` only receives a raw `JavaVM*` (per spec.md
//! §4.3 step 1, this is still enough to start native-method-bind delivery
//! immediately, so no early binding event is lost to
//! [`crate::hook::NativeBindingState`]'s `pending` map); `vm_init` is the
//! first point with a real `JNIEnv*`, so per spec.md §4.2 ("on VM init,
//! iterates the table, installs per-method hooks") that's where
//! [`crate::installer`] and [`crate::native_binding`]'s table-driven
//! installs run, followed immediately by enabling breakpoint delivery
//! (spec.md §4.2's ordering requirement: "the host runtime's hook-event
//! notification is enabled only after installation completes").

use crate::context::{self, AgentContext};
use crate::error::{self, AgentError};
use crate::native_binding;
use crate::options::AgentOptions;
use crate::trace::StdoutTraceEmitter;
use crate::{installer, log_error};
use jvmti::env::{Jvmti, JniEnv};
use jvmti::sys::jni;
use jvmti::sys::jvmti as jvmti_sys;
use std::os::raw::c_void;

#[cfg(feature = "classloader-discovery")]
use crate::classloader_discovery;

#[derive(Debug, Default)]
pub struct InterceptorAgent;

impl jvmti::Agent for InterceptorAgent {
    fn on_load(&self, vm: *mut jni::JavaVM, options: &str) -> jni::jint {
        error::to_jni_status(self.try_on_load(vm, options))
    }

    fn vm_init(&self, jni_env: *mut jni::JNIEnv, _thread: jni::jthread) {
        if !context::is_installed() {
            log_error!("vm_init fired before on_load installed the agent context");
            return;
        }
        let ctx = context::global();
        let jvmti = context::jvmti_handle();
        let jni_env = unsafe { JniEnv::from_raw(jni_env) };

        // Mandatory-entry resolution failure is fatal to the agent
        // (spec.md §4.2) and there's no longer a `jint` return channel to
        // report it through at this lifecycle point, so this is the same
        // fatal path as any other broken invariant.
        if let Err(e) = installer::install(ctx, jvmti, &jni_env) {
            error::abort_on_invariant_violation(&format!("breakpoint install failed: {e}"));
        }
        if let Err(e) = native_binding::install(ctx, &jni_env) {
            error::abort_on_invariant_violation(&format!("native binding install failed: {e}"));
        }

        if let Err(e) =
            jvmti.set_event_notification_mode(true, jvmti_sys::JVMTI_EVENT_BREAKPOINT, std::ptr::null_mut())
        {
            log_error!("failed to enable breakpoint events: {e:?}");
            return;
        }

        #[cfg(feature = "classloader-discovery")]
        if ctx.options.classloader_discovery {
            if let Err(e) = jvmti.set_event_notification_mode(
                true,
                jvmti_sys::JVMTI_EVENT_CLASS_PREPARE,
                std::ptr::null_mut(),
            ) {
                log_error!("failed to enable class-prepare events: {e:?}");
            }
            if let Err(e) = classloader_discovery::discover_existing(ctx, jvmti, &jni_env) {
                log_error!("classloader discovery failed: {e}");
            }
        }
    }

    /// Agent unload is a barrier (spec.md): nothing installed needs
    /// unwinding, since every hook, the trace emitter, and the stats
    /// counters all live for the process's remaining lifetime anyway.
    fn vm_death(&self, _jni: *mut jni::JNIEnv) {}

    fn native_method_bind(
        &self,
        _jni: *mut jni::JNIEnv,
        _thread: jni::jthread,
        method: jni::jmethodID,
        address: *mut c_void,
        new_address_ptr: *mut *mut c_void,
    ) {
        if !context::is_installed() {
            return;
        }
        let ctx = context::global();
        let mut new_entry = address as usize;
        native_binding::on_native_bind(ctx, method, address as usize, &mut new_entry);
        if !new_address_ptr.is_null() {
            unsafe {
                *new_address_ptr = new_entry as *mut c_void;
            }
        }
    }

    fn breakpoint(
        &self,
        jni_env: *mut jni::JNIEnv,
        thread: jni::jthread,
        method: jni::jmethodID,
        _location: jvmti_sys::jlocation,
    ) {
        if !context::is_installed() {
            return;
        }
        let ctx = context::global();
        let jvmti = context::jvmti_handle();
        let jni_env = unsafe { JniEnv::from_raw(jni_env) };
        crate::dispatch::dispatch_hit(ctx, jvmti, &jni_env, thread, method);
    }

    #[cfg(feature = "classloader-discovery")]
    fn class_prepare(&self, jni_env: *mut jni::JNIEnv, _thread: jni::jthread, klass: jni::jclass) {
        if !context::is_installed() {
            return;
        }
        let ctx = context::global();
        if !ctx.options.classloader_discovery {
            return;
        }
        let jvmti = context::jvmti_handle();
        let jni_env = unsafe { JniEnv::from_raw(jni_env) };
        if let Err(e) = classloader_discovery::on_class_prepare(ctx, jvmti, &jni_env, klass) {
            log_error!("class-prepare classloader discovery failed: {e}");
        }
    }
}

impl InterceptorAgent {
    fn try_on_load(&self, vm: *mut jni::JavaVM, options: &str) -> Result<(), AgentError> {
        let parsed = AgentOptions::parse(options);
        let jvmti = Jvmti::new(vm).map_err(AgentError::from)?;

        let mut caps = jvmti_sys::jvmtiCapabilities::default();
        caps.set_can_generate_breakpoint_events(true);
        caps.set_can_generate_native_method_bind_events(true);
        jvmti.add_capabilities(&caps).map_err(AgentError::from)?;

        let callbacks = jvmti::get_default_callbacks();
        jvmti.set_event_callbacks(callbacks).map_err(AgentError::from)?;

        // spec.md §4.3 step 1: enable native-method-bind delivery
        // immediately, before the table is even resolved, so bindings that
        // race agent startup still land in `NativeBindingState::pending`
        // rather than being missed.
        jvmti
            .set_event_notification_mode(true, jvmti_sys::JVMTI_EVENT_NATIVE_METHOD_BIND, std::ptr::null_mut())
            .map_err(AgentError::from)?;

        let ctx = AgentContext::new(parsed, Box::new(StdoutTraceEmitter::new()));
        context::install_global(ctx)?;
        context::install_jvmti_global(jvmti)?;
        Ok(())
    }
}

jvmti::export_agent!(InterceptorAgent);
