//! The trace emitter interface named as an external collaborator: this
//! crate only defines the shape of a trace record and the single
//! `traceCall`-equivalent operation a consumer must implement. The offline
//! ahead-of-time image builder that actually persists these records lives
//! outside this crate.

use std::sync::Mutex;

/// A value that stands in for "we couldn't observe this" rather than
/// crashing the trace — e.g. a missing local variable, an unreadable array
/// element, or an unset object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// The underlying reference was null / absent.
    Null,
    /// The underlying reference existed but could not be read.
    Unknown,
}

impl std::fmt::Display for Sentinel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Sentinel::Null => "null",
            Sentinel::Unknown => "unknown",
        })
    }
}

/// One field of a [`TraceRecord`]: a boolean outcome, a resolved name, a
/// list of resolved names (argument-expanding handlers), or a sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceValue {
    Bool(bool),
    Str(String),
    List(Vec<String>),
    Sentinel(Sentinel),
}

impl TraceValue {
    pub fn null() -> Self {
        TraceValue::Sentinel(Sentinel::Null)
    }

    pub fn unknown() -> Self {
        TraceValue::Sentinel(Sentinel::Unknown)
    }
}

impl From<bool> for TraceValue {
    fn from(v: bool) -> Self {
        TraceValue::Bool(v)
    }
}

impl From<String> for TraceValue {
    fn from(v: String) -> Self {
        TraceValue::Str(v)
    }
}

impl From<&str> for TraceValue {
    fn from(v: &str) -> Self {
        TraceValue::Str(v.to_string())
    }
}

impl From<Vec<String>> for TraceValue {
    fn from(v: Vec<String>) -> Self {
        TraceValue::List(v)
    }
}

impl From<Option<String>> for TraceValue {
    fn from(v: Option<String>) -> Self {
        match v {
            Some(s) => TraceValue::Str(s),
            None => TraceValue::null(),
        }
    }
}

/// The three trace kinds named by the external interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Reflect,
    Serialization,
    Jni,
}

impl TraceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceKind::Reflect => "reflect",
            TraceKind::Serialization => "serialization",
            TraceKind::Jni => "jni",
        }
    }
}

/// One structured call record, matching the external `traceCall` operation
/// field for field.
#[derive(Debug, Clone)]
pub struct TraceRecord {
    pub kind: TraceKind,
    pub function: String,
    pub clazz: TraceValue,
    pub declaring_class: TraceValue,
    pub caller_class: TraceValue,
    pub result: TraceValue,
    pub args: Vec<TraceValue>,
}

impl TraceRecord {
    pub fn new(kind: TraceKind, function: impl Into<String>) -> Self {
        Self {
            kind,
            function: function.into(),
            clazz: TraceValue::null(),
            declaring_class: TraceValue::null(),
            caller_class: TraceValue::null(),
            result: TraceValue::null(),
            args: Vec::new(),
        }
    }

    pub fn with_clazz(mut self, v: impl Into<TraceValue>) -> Self {
        self.clazz = v.into();
        self
    }

    pub fn with_declaring_class(mut self, v: impl Into<TraceValue>) -> Self {
        self.declaring_class = v.into();
        self
    }

    pub fn with_caller_class(mut self, v: impl Into<TraceValue>) -> Self {
        self.caller_class = v.into();
        self
    }

    pub fn with_result(mut self, v: impl Into<TraceValue>) -> Self {
        self.result = v.into();
        self
    }

    pub fn with_args(mut self, args: Vec<TraceValue>) -> Self {
        self.args = args;
        self
    }
}

/// Accepts structured trace records. Implementations must be append-only,
/// thread-safe, and must not block the calling handler for any meaningful
/// duration — callers run inside a JVM-owned thread with a recursion guard
/// held.
pub trait TraceEmitter: Send + Sync {
    fn trace_call(&self, record: TraceRecord);
}

/// An in-memory emitter used by tests and doc-tests. Not used in a real
/// deployment, where the trace is expected to leave the process (e.g. over
/// a pipe to the offline image builder) — that serializer is the external
/// collaborator the core spec keeps out of scope.
#[derive(Debug, Default)]
pub struct CollectingTraceEmitter {
    records: Mutex<Vec<TraceRecord>>,
}

impl CollectingTraceEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TraceEmitter for CollectingTraceEmitter {
    fn trace_call(&self, record: TraceRecord) {
        self.records.lock().unwrap().push(record);
    }
}

/// The production default installed by [`crate::agent::InterceptorAgent`]:
/// writes one line per record to stdout. The actual wire protocol the
/// offline image builder expects is external to this crate (spec.md's
/// "external collaborator" for the trace emitter); this just gives
/// `Agent_OnLoad` a real, non-test implementation to install rather than
/// requiring every deployment to supply its own before the agent can load
/// at all.
pub struct StdoutTraceEmitter {
    out: Mutex<std::io::Stdout>,
}

impl StdoutTraceEmitter {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(std::io::stdout()),
        }
    }
}

impl Default for StdoutTraceEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceEmitter for StdoutTraceEmitter {
    fn trace_call(&self, record: TraceRecord) {
        use std::io::Write;
        let mut out = self.out.lock().unwrap();
        let _ = writeln!(
            out,
            "{}\t{}\tclazz={:?}\tdeclaring_class={:?}\tcaller_class={:?}\tresult={:?}\targs={:?}",
            record.kind.as_str(),
            record.function,
            record.clazz,
            record.declaring_class,
            record.caller_class,
            record.result,
            record.args,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_emitter_preserves_order() {
        let emitter = CollectingTraceEmitter::new();
        emitter.trace_call(TraceRecord::new(TraceKind::Reflect, "forName").with_result(true));
        emitter.trace_call(TraceRecord::new(TraceKind::Reflect, "getField").with_result(false));
        let records = emitter.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].function, "forName");
        assert_eq!(records[1].function, "getField");
    }

    #[test]
    fn trace_value_conversions_round_trip_sentinels() {
        assert_eq!(TraceValue::from(None::<String>), TraceValue::null());
        assert_eq!(TraceValue::unknown(), TraceValue::Sentinel(Sentinel::Unknown));
    }
}
