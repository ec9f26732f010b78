//! BytecodeCallsiteFilter (spec.md §4.5): decides whether a `loadClass` hit
//! originated from an explicit user invocation or an internal VM-driven
//! one, the first time a given call site is observed. Classified sites are
//! remembered in [`crate::hook::ExplicitCallSiteSet`] so repeat hits skip
//! straight past bytecode/constant-pool parsing (spec.md §8's "re-hitting
//! the same `(method, bci)` does not re-execute constant-pool parsing").

use crate::constant_pool::ConstantPoolReader;
use crate::context::AgentContext;
use crate::error::AgentError;
use crate::hook::MethodLocation;
use jvmti::env::{Jvmti, JniEnv};
use jvmti::sys::jni::{jmethodID, jthread};

const OPCODE_INVOKEVIRTUAL: u8 = 0xb6;

/// The method name/descriptor the filter is screening for — the hooked
/// `ClassLoader.loadClass(String)`.
const TARGET_NAME: &str = "loadClass";
const TARGET_DESCRIPTOR: &str = "(Ljava/lang/String;)Ljava/lang/Class;";

/// Runs the full classification protocol of spec.md §4.5. Returns `true`
/// if the site is (now, or already) classified as explicit and tracing
/// should proceed.
pub fn is_explicit_call_site(
    ctx: &AgentContext,
    jvmti: &Jvmti,
    jni: &JniEnv<'_>,
    thread: jthread,
) -> Result<bool, AgentError> {
    let (caller_method, bci) = jvmti.get_frame_location(thread, 1).map_err(AgentError::from)?;

    if caller_is_classloader(jvmti, jni, caller_method) {
        return Ok(false);
    }

    let location = MethodLocation {
        method_id: caller_method as crate::hook::MethodId,
        bci,
    };
    if ctx.explicit_call_sites.contains(location) {
        return Ok(true);
    }

    let bytecodes = jvmti.get_bytecodes(caller_method).map_err(AgentError::from)?;
    let offset = bci as usize;
    let Some(&opcode) = bytecodes.get(offset) else {
        return Err(AgentError::CallsiteRejected("bci past end of bytecode array"));
    };
    if opcode != OPCODE_INVOKEVIRTUAL {
        return Err(AgentError::CallsiteRejected("bci is not an invokevirtual"));
    }
    let Some(hi) = bytecodes.get(offset + 1) else {
        return Err(AgentError::CallsiteRejected("truncated invokevirtual operand"));
    };
    let Some(lo) = bytecodes.get(offset + 2) else {
        return Err(AgentError::CallsiteRejected("truncated invokevirtual operand"));
    };
    let pool_index = ((*hi as u16) << 8) | (*lo as u16);

    let caller_class = jvmti.get_method_declaring_class(caller_method).map_err(AgentError::from)?;
    let (pool_count, pool_bytes) = jvmti.get_constant_pool(caller_class).map_err(AgentError::from)?;
    let reader = ConstantPoolReader::new(pool_count, &pool_bytes);
    let method_ref = reader
        .resolve_method_reference(pool_index)
        .map_err(|_| AgentError::CallsiteRejected("constant pool entry did not resolve to loadClass"))?;

    if method_ref.name != TARGET_NAME || method_ref.descriptor != TARGET_DESCRIPTOR {
        return Err(AgentError::CallsiteRejected("constant pool entry named a different method"));
    }

    ctx.explicit_call_sites.insert(location);
    Ok(true)
}

fn caller_is_classloader(jvmti: &Jvmti, jni: &JniEnv<'_>, method: jmethodID) -> bool {
    jvmti
        .get_method_declaring_class(method)
        .ok()
        .map(|class| jni.is_assignable_from(class, "java/lang/ClassLoader").unwrap_or(false))
        .unwrap_or(false)
}
