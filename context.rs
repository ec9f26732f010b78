//! Models the Design Notes' "process-wide static state" item: the agent's
//! installed-set, native-binding state, trace emitter, stats, and options
//! are all held by one `AgentContext` struct rather than scattered
//! top-level statics (as the teacher's own Android-only statics —
//! `ANDROID_CONTEXT`, `API_LEVEL`, `APP_NAME` in `loader.rs` — are). The
//! event-entry trampolines the binding crate generates are fixed by ABI to
//! carry no user-data pointer, so they recover this struct via a single
//! process-global, set exactly once by [`crate::agent::InterceptorAgent`]'s
//! `on_load`.

use crate::error::AgentError;
use crate::hook::{ExplicitCallSiteSet, InstalledSet, NativeBindingState};
use crate::options::AgentOptions;
use crate::stats::AgentStats;
use crate::trace::TraceEmitter;
use jvmti::env::Jvmti;
use std::sync::{Mutex, OnceLock};

pub struct AgentContext {
    pub options: AgentOptions,
    pub installed: InstalledSet,
    pub native_state: Mutex<NativeBindingState>,
    pub explicit_call_sites: ExplicitCallSiteSet,
    pub trace_emitter: Box<dyn TraceEmitter>,
    pub stats: AgentStats,
}

impl AgentContext {
    pub fn new(options: AgentOptions, trace_emitter: Box<dyn TraceEmitter>) -> Self {
        Self {
            options,
            installed: InstalledSet::new(),
            native_state: Mutex::new(NativeBindingState::new()),
            explicit_call_sites: ExplicitCallSiteSet::new(),
            trace_emitter,
            stats: AgentStats::new(),
        }
    }
}

static AGENT_CONTEXT: OnceLock<AgentContext> = OnceLock::new();

/// Installs the process-wide context. Must be called exactly once, from
/// `Agent_OnLoad`. A second call is an invariant violation: it would mean
/// the JVM loaded this agent twice in the same process, which the design
/// never supports (there is exactly one `InstalledSet` per process).
pub fn install_global(ctx: AgentContext) -> Result<(), AgentError> {
    AGENT_CONTEXT
        .set(ctx)
        .map_err(|_| AgentError::Invariant("agent context installed twice".to_string()))
}

/// Recovers the process-wide context. Every event trampoline calls this
/// first. Missing context (a trampoline firing before `Agent_OnLoad`
/// completed, or after `Agent_OnUnload`) is a fatal internal error per
/// spec.md §5 ("the dispatch entry treats uninitialised tables as a fatal
/// internal error").
pub fn global() -> &'static AgentContext {
    AGENT_CONTEXT
        .get()
        .unwrap_or_else(|| crate::error::abort_on_invariant_violation("agent context not installed"))
}

pub fn is_installed() -> bool {
    AGENT_CONTEXT.get().is_some()
}

/// Process-wide `Jvmti` handle, installed alongside [`AgentContext`] from
/// `Agent_OnLoad`. Kept separate from `AgentContext` because it is supplied
/// by the binding crate's own agent bootstrap rather than constructed by
/// us, and is needed by entry points (like [`crate::native_binding`]'s
/// replacement entry) that receive only a raw `JNIEnv*` from the runtime.
static JVMTI: OnceLock<Jvmti> = OnceLock::new();

pub fn install_jvmti_global(jvmti: Jvmti) -> Result<(), AgentError> {
    JVMTI
        .set(jvmti)
        .map_err(|_| AgentError::Invariant("jvmti handle installed twice".to_string()))
}

pub fn jvmti_handle() -> &'static Jvmti {
    JVMTI
        .get()
        .unwrap_or_else(|| crate::error::abort_on_invariant_violation("jvmti handle not installed"))
}
