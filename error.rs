use jvmti::env::JvmtiError;
use jvmti::sys::jni::jint;

/// The four error kinds named by the interceptor's error-handling design:
/// an optional hook/variant simply absent on this runtime, a failure produced
/// by our own re-invocation of an intercepted method, a rejected callsite
/// classification, and an invariant violation that must abort the process.
#[derive(Debug)]
pub enum AgentError {
    /// A class or method named in the breakpoint table does not exist on
    /// this runtime. Only fatal for entries marked mandatory.
    OptionalAbsence { class: String, member: String },
    /// A re-invocation performed inside a handler raised a Java exception;
    /// it has already been cleared from the thread's pending-exception slot.
    Transient(String),
    /// The callsite filter rejected a site as not an explicit user call.
    CallsiteRejected(&'static str),
    /// A broken invariant: duplicate install, missing hook for a delivered
    /// event, a leaked pending failure, or a native hook invoked before its
    /// original entry was ever bound. Always fatal.
    Invariant(String),
    /// Propagated from the underlying JNI/JVMTI binding.
    Jvmti(JvmtiError),
}

impl std::fmt::Display for AgentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentError::OptionalAbsence { class, member } => {
                write!(f, "optional breakpoint absent: {class}.{member}")
            }
            AgentError::Transient(msg) => write!(f, "transient re-invocation failure: {msg}"),
            AgentError::CallsiteRejected(reason) => write!(f, "callsite rejected: {reason}"),
            AgentError::Invariant(msg) => write!(f, "invariant violation: {msg}"),
            AgentError::Jvmti(e) => write!(f, "jvmti error: {e:?}"),
        }
    }
}

impl std::error::Error for AgentError {}

impl From<JvmtiError> for AgentError {
    fn from(e: JvmtiError) -> Self {
        AgentError::Jvmti(e)
    }
}

/// Logs the violation and aborts the process, as spec'd: invariant
/// violations are never recoverable and must never be swallowed.
///
/// Matches the teacher crate's own willingness to `.unwrap()` at points it
/// considers truly impossible (e.g. reading back a `OnceLock` right after
/// `set()` succeeded) — we just make the "this cannot happen" contract
/// explicit and diagnosable instead of panicking inside a JVM-owned thread.
#[inline(never)]
pub(crate) fn abort_on_invariant_violation(msg: &str) -> ! {
    crate::log_error!("invariant violation, aborting: {msg}");
    std::process::abort()
}

/// Converts an [`AgentError`] into the `jint` status code the binding
/// crate's `Agent::on_load` contract expects.
pub(crate) fn to_jni_status(result: Result<(), AgentError>) -> jint {
    match result {
        Ok(()) => jvmti::sys::jni::JNI_OK,
        Err(e) => {
            crate::log_error!("agent initialization failed: {e}");
            jvmti::sys::jni::JNI_ERR
        }
    }
}
