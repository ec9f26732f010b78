//! BreakpointInstaller (spec.md §4.2): resolves every
//! [`crate::table::HookSpec`] to a runtime class and method identity and
//! attaches a bytecode-offset-0 hook, memoising class resolution across
//! consecutive entries sharing a class name to amortise lookups — the
//! table is declared grouped by class for exactly this reason (see
//! [`crate::table::BREAKPOINT_TABLE`]'s ordering).

use crate::context::AgentContext;
use crate::error::AgentError;
use crate::hook::Hook;
use crate::resolver::MethodResolver;
use crate::table::BREAKPOINT_TABLE;
use jvmti::env::{GlobalRef, JniEnv, Jvmti};

/// Installs every entry in [`crate::table::BREAKPOINT_TABLE`]. Must run
/// (and complete) before the host runtime's hook-event notification is
/// enabled (spec.md §4.2's ordering requirement) — callers enable
/// notification only after this returns `Ok`.
pub fn install(ctx: &AgentContext, jvmti: &Jvmti, jni: &JniEnv<'_>) -> Result<(), AgentError> {
    let mut memo: Option<(&str, GlobalRef)> = None;

    for spec in BREAKPOINT_TABLE {
        let class_ref = match &memo {
            Some((name, class_ref)) if *name == spec.class_name => class_ref.clone(),
            _ => {
                let resolved = resolve_class(spec.class_name, spec.optional, jni)?;
                let Some(resolved) = resolved else {
                    memo = None;
                    continue;
                };
                memo = Some((spec.class_name, resolved.clone()));
                resolved
            }
        };

        let resolved = if spec.is_static {
            MethodResolver::resolve_static_method(jni, spec.class_name, &class_ref, spec.method_name, spec.descriptor)
        } else {
            MethodResolver::resolve_method(jni, spec.class_name, &class_ref, spec.method_name, spec.descriptor)
        };
        let method_id = match resolved {
            Ok(id) => id,
            Err(e) if spec.optional => {
                crate::log_warn!("skipping optional hook {}.{}: {e}", spec.class_name, spec.method_name);
                continue;
            }
            Err(e) => return Err(e),
        };

        jvmti.set_breakpoint(method_id, 0).map_err(AgentError::from)?;

        let hook = Hook {
            spec,
            class_ref: class_ref.clone(),
            method_id: method_id as crate::hook::MethodId,
        };
        if ctx.installed.insert(hook).is_err() {
            return Err(AgentError::Invariant(format!(
                "duplicate method identity while installing {}.{}",
                spec.class_name, spec.method_name
            )));
        }
        ctx.stats.record_hook_installed();
    }

    Ok(())
}

fn resolve_class(class_name: &str, optional: bool, jni: &JniEnv<'_>) -> Result<Option<GlobalRef>, AgentError> {
    match MethodResolver::resolve_class(jni, class_name) {
        Ok(class_ref) => Ok(Some(class_ref)),
        Err(_) if optional => {
            crate::log_warn!("skipping optional hook family rooted at {class_name}: class not present");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
