//! Trace-only handlers: reflective field/method/class listings (spec.md
//! §4.1). These never re-invoke — the listing method already ran to
//! completion by the time the breakpoint fires at its entry, so the only
//! observable outcome worth recording is that the call happened at all.

use super::{HitContext, TraceOnlyOp};
use crate::context::AgentContext;
use crate::error::AgentError;
use crate::trace::{TraceKind, TraceRecord};

pub fn handle(ctx: &AgentContext, hit: &HitContext<'_, '_>, op: TraceOnlyOp) -> Result<(), AgentError> {
    let shim = hit.shim();
    // The receiver of e.g. `C.class.getFields()` IS the `Class<C>` object
    // being reflected on, so its own name (`C`) is what's wanted here —
    // not the runtime class of the receiver (`java.lang.Class`), which is
    // what `class_name_of` would give.
    let clazz = shim.class_name(hit.receiver);
    let caller_class = shim.caller_class_name(hit.thread);
    let record = TraceRecord::new(TraceKind::Reflect, op.function_name())
        .with_clazz(clazz)
        .with_caller_class(caller_class);
    ctx.trace_emitter.trace_call(record);
    Ok(())
}
