//! ClassLoaderDiscovery (spec.md §4.6): the optional mode that hooks
//! `loadClass(String)` on every classloader subclass, including ones
//! defined after the agent starts. Gated by
//! [`crate::options::AgentOptions::classloader_discovery`] and the
//! `classloader-discovery` Cargo feature.

#![cfg(feature = "classloader-discovery")]

use crate::context::AgentContext;
use crate::error::AgentError;
use crate::hook::{Hook, HookSpec};
use crate::resolver::MethodResolver;
use jvmti::env::{Jvmti, JniEnv};
use jvmti::sys::jni::jobject;

const ROOT_CLASSLOADER: &str = "java/lang/ClassLoader";
const LOAD_CLASS_DESCRIPTOR: &str = "(Ljava/lang/String;)Ljava/lang/Class;";

static LOAD_CLASS_SPEC: HookSpec = HookSpec {
    class_name: ROOT_CLASSLOADER,
    method_name: "loadClass",
    descriptor: LOAD_CLASS_DESCRIPTOR,
    handler: crate::handlers::HandlerKind::LoadClass,
    optional: false,
    is_static: false,
};

/// Runs at agent-ready time: iterates every currently-loaded class and
/// installs `loadClass` on each one assignment-compatible with
/// `java.lang.ClassLoader` (spec.md §4.6 bullet 1).
pub fn discover_existing(ctx: &AgentContext, jvmti: &Jvmti, jni: &JniEnv<'_>) -> Result<(), AgentError> {
    let classes = jvmti.get_loaded_classes().map_err(AgentError::from)?;
    for class in classes {
        maybe_install(ctx, jvmti, jni, class)?;
    }
    Ok(())
}

/// Runs on every "class prepared" event once discovery is enabled (spec.md
/// §4.6 bullet 2).
pub fn on_class_prepare(ctx: &AgentContext, jvmti: &Jvmti, jni: &JniEnv<'_>, class: jobject) -> Result<(), AgentError> {
    maybe_install(ctx, jvmti, jni, class)
}

fn maybe_install(ctx: &AgentContext, jvmti: &Jvmti, jni: &JniEnv<'_>, class: jobject) -> Result<(), AgentError> {
    if !jni.is_assignable_from(class, ROOT_CLASSLOADER).unwrap_or(false) {
        return Ok(());
    }
    let class_ref = jni.new_global_ref(&class).map_err(AgentError::from)?;
    let method_id = match MethodResolver::resolve_method(
        jni,
        ROOT_CLASSLOADER,
        &class_ref,
        "loadClass",
        LOAD_CLASS_DESCRIPTOR,
    ) {
        Ok(id) => id,
        // Resolution genuinely failing here (rather than resolving to the
        // inherited method — see below) means the class isn't in a state
        // `GetMethodID` can look up yet; skip it rather than treat it as
        // fatal, the same optional-absence posture as every other resolver
        // call in this crate.
        Err(_) => return Ok(()),
    };
    let method_key = method_id as crate::hook::MethodId;
    // A classloader subclass that doesn't override `loadClass` still
    // resolves `id` above, to the same inherited `ClassLoader.loadClass`
    // method identity a previously-discovered class (or `ClassLoader`
    // itself, via `discover_existing`) already installed — this check, not
    // the `Err` arm, is what skips the duplicate attach.
    if ctx.installed.contains(method_key) {
        return Ok(());
    }

    jvmti.set_breakpoint(method_id, 0).map_err(AgentError::from)?;
    let hook = Hook {
        spec: &LOAD_CLASS_SPEC,
        class_ref,
        method_id: method_key,
    };
    // A concurrent discoverer may race us to the same method identity; a
    // losing insert here is not a fatal duplicate-install bug the way
    // `BreakpointInstaller`'s is; it just means another class-prepare event
    // for the same subclass already won.
    let _ = ctx.installed.insert(hook);
    ctx.stats.record_hook_installed();
    Ok(())
}
