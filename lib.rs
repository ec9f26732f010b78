//! Breakpoint interceptor: a table-driven, event-loop-free JVMTI agent that
//! installs per-method hooks in a running JVM, re-invokes intercepted
//! methods to observe their outcome, and emits a structured trace of every
//! reflection, resource-lookup, dynamic-proxy, method-handle, serialization
//! and `Unsafe` field-access call it observes.
//!
//! `jvmti` is re-exported here for the user to import its types from this
//! crate, avoiding version inconsistency between `jvmti` and this crate.

pub use jvmti;

#[cfg(not(target_os = "android"))]
macro_rules! log_warn {
    ($($arg:tt)+) => (eprintln!("[reflect-trace-agent] WARN: {}", format!($($arg)+)))
}

#[cfg(target_os = "android")]
macro_rules! log_warn {
    ($($arg:tt)+) => (log::warn!($($arg)+))
}

macro_rules! log_error {
    ($($arg:tt)+) => (eprintln!("[reflect-trace-agent] ERROR: {}", format!($($arg)+)))
}

pub(crate) use log_error;
pub(crate) use log_warn;

mod agent;
mod argument_shim;
mod callsite_filter;
mod classloader_discovery;
mod constant_pool;
mod context;
mod dispatch;
pub mod error;
mod handlers;
mod hook;
mod installer;
mod native_binding;
mod options;
mod recursion;
mod resolver;
mod stats;
mod table;
pub mod trace;

pub use agent::InterceptorAgent;
pub use constant_pool::{ConstantPoolError, ConstantPoolReader, MethodReference};
pub use context::AgentContext;
pub use error::AgentError;
pub use options::AgentOptions;
pub use stats::{AgentStats, AgentStatsSnapshot};
pub use trace::{CollectingTraceEmitter, Sentinel, StdoutTraceEmitter, TraceEmitter, TraceRecord, TraceValue};

use std::cell::Cell;

thread_local! {
    static HAD_CLEARED_EXCEPTION: Cell<bool> = const { Cell::new(false) };
}

/// Clears a pending Java exception on the current thread. Every
/// re-invocation path in this crate calls this before returning control to
/// the JVM, so no pending failure of our own making ever leaks back into a
/// managed frame (the dispatch core's postcondition). Mirrors the teacher
/// crate's `jni_clear_ex`, minus the `Result::map_err` plumbing: here the
/// check happens right after a direct re-invocation call rather than at the
/// tail of a `jni`-crate `Result` chain.
pub(crate) fn jvmti_clear_pending_exception(jni: &jvmti::env::JniEnv<'_>) -> bool {
    if !jni.exception_check() {
        return false;
    }
    jni.exception_clear();
    HAD_CLEARED_EXCEPTION.with(|cell| cell.set(true));
    true
}

/// Takes this thread's "a re-invocation just cleared a pending exception"
/// flag, resetting it to false. Consumed once per dispatch to decide
/// whether a trace record's `result` field reports `Ok` or `Threw`.
pub(crate) fn take_cleared_exception_flag() -> bool {
    HAD_CLEARED_EXCEPTION.with(|cell| cell.replace(false))
}
