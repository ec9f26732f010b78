//! HandlerSet: one handler per hook kind. Modeled as the Design Notes
//! recommend for "dynamic dispatch across handler kinds" — a closed set of
//! tagged variants rather than a trait object, so [`crate::table`]'s static
//! array can stay `'static` data with no vtable and the whole set is
//! exhaustively matched (and therefore auditable) in
//! [`crate::dispatch::dispatch_hit`].

mod arg_expanding;
mod enclosing_method;
mod load_class;
mod reinvoke;
mod resource_bundle;
mod serialization;
mod trace_only;
mod unsafe_offset;

use crate::context::AgentContext;
use crate::error::AgentError;
use jvmti::env::{Jvmti, JniEnv};
use jvmti::sys::jni::{jmethodID, jobject, jthread};

/// Arguments common to every handler invocation: the frame the hook fired
/// in, plus the bits each handler family needs to reconstruct semantic
/// arguments via [`crate::argument_shim`].
pub struct HitContext<'a, 'e> {
    pub jvmti: &'a Jvmti,
    pub jni: &'a JniEnv<'e>,
    pub thread: jthread,
    pub method: jmethodID,
    /// The object instance the intercepted method was invoked on, or null
    /// for a static method.
    pub receiver: jobject,
    /// Set only by [`crate::native_binding`]'s replacement entry, which has
    /// no stopped frame to read locals from and so passes its one object
    /// argument directly.
    pub native_arg: Option<jobject>,
}

impl<'a, 'e> HitContext<'a, 'e> {
    pub fn shim(&self) -> crate::argument_shim::ArgumentShim<'a, 'e> {
        crate::argument_shim::ArgumentShim::new(self.jvmti, self.jni)
    }
}

/// The closed set of handler kinds named in spec.md §4.1. Every
/// [`crate::table::HookSpec`]/[`crate::table::NativeHookSpec`] names
/// exactly one of these.
#[derive(Debug, Clone, Copy)]
pub enum HandlerKind {
    /// Read the receiver and direct caller class, emit once, never
    /// re-invoke.
    TraceOnly(TraceOnlyOp),
    /// Re-invoke the intercepted method with the same arguments, observe
    /// success/failure.
    ReInvoke(ReInvokeOp),
    /// Like `ReInvoke`, but also expands an array argument into a list of
    /// class names.
    ArgExpanding(ArgExpandOp),
    /// Resolves a returned `java.lang.reflect.Method` to
    /// `"<class>.<name><descriptor>"`.
    EnclosingMethod,
    /// One of the three `Unsafe.objectFieldOffset` variants.
    UnsafeFieldOffset(UnsafeOffsetOp),
    /// `ObjectStreamClass` construction: walks class-data layout,
    /// suppresses lambda-synthetic classes.
    SerializationConstructor,
    /// `ResourceBundle.getBundle`: climbs two extra frames to find the
    /// real caller.
    ResourceBundle,
    /// The heuristic `loadClass` hook, gated by
    /// [`crate::callsite_filter`].
    LoadClass,
}

impl HandlerKind {
    pub fn invoke(
        &self,
        ctx: &AgentContext,
        hit: &HitContext<'_, '_>,
    ) -> Result<(), AgentError> {
        match self {
            HandlerKind::TraceOnly(op) => trace_only::handle(ctx, hit, *op),
            HandlerKind::ReInvoke(op) => reinvoke::handle(ctx, hit, *op),
            HandlerKind::ArgExpanding(op) => arg_expanding::handle(ctx, hit, *op),
            HandlerKind::EnclosingMethod => enclosing_method::handle(ctx, hit),
            HandlerKind::UnsafeFieldOffset(op) => unsafe_offset::handle(ctx, hit, *op),
            HandlerKind::SerializationConstructor => serialization::handle(ctx, hit),
            HandlerKind::ResourceBundle => resource_bundle::handle(ctx, hit),
            HandlerKind::LoadClass => load_class::handle(ctx, hit),
        }
    }
}

/// Trace-only reflective listing operations (spec.md §4.1: "reflective
/// field/method/class listings").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOnlyOp {
    GetFields,
    GetMethods,
    GetDeclaredFields,
    GetDeclaredMethods,
    GetClasses,
    GetDeclaredClasses,
}

impl TraceOnlyOp {
    pub fn function_name(&self) -> &'static str {
        match self {
            TraceOnlyOp::GetFields => "getFields",
            TraceOnlyOp::GetMethods => "getMethods",
            TraceOnlyOp::GetDeclaredFields => "getDeclaredFields",
            TraceOnlyOp::GetDeclaredMethods => "getDeclaredMethods",
            TraceOnlyOp::GetClasses => "getClasses",
            TraceOnlyOp::GetDeclaredClasses => "getDeclaredClasses",
        }
    }
}

/// Re-invoking operations (spec.md §4.1: `forName`, `getField`,
/// `getMethod`, `getConstructor`, resource lookups, proxy factories,
/// method-handle lookups).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReInvokeOp {
    ForName,
    GetField,
    GetDeclaredField,
    GetMethod,
    GetDeclaredMethod,
    GetConstructor,
    GetDeclaredConstructor,
    GetResource,
    GetResourceAsStream,
    MethodHandleFindStatic,
    MethodHandleFindVirtual,
}

impl ReInvokeOp {
    pub fn function_name(&self) -> &'static str {
        match self {
            ReInvokeOp::ForName => "forName",
            ReInvokeOp::GetField => "getField",
            ReInvokeOp::GetDeclaredField => "getDeclaredField",
            ReInvokeOp::GetMethod => "getMethod",
            ReInvokeOp::GetDeclaredMethod => "getDeclaredMethod",
            ReInvokeOp::GetConstructor => "getConstructor",
            ReInvokeOp::GetDeclaredConstructor => "getDeclaredConstructor",
            ReInvokeOp::GetResource => "getResource",
            ReInvokeOp::GetResourceAsStream => "getResourceAsStream",
            ReInvokeOp::MethodHandleFindStatic => "findStatic",
            ReInvokeOp::MethodHandleFindVirtual => "findVirtual",
        }
    }

    /// `forName` is caller-sensitive and its re-invocation contract (spec.md
    /// §4.1) forces class initialization off, per the preserved-but-flagged
    /// Open Question in spec.md §9.
    pub fn forces_initialize_off(&self) -> bool {
        matches!(self, ReInvokeOp::ForName)
    }
}

/// Argument-expanding operations (spec.md §4.1: `newProxyInstance`,
/// `getProxyClass`, method-handle lookups that take a class array).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgExpandOp {
    NewProxyInstance,
    GetProxyClass,
}

impl ArgExpandOp {
    pub fn function_name(&self) -> &'static str {
        match self {
            ArgExpandOp::NewProxyInstance => "newProxyInstance",
            ArgExpandOp::GetProxyClass => "getProxyClass",
        }
    }
}

/// The three `Unsafe.objectFieldOffset` variants (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsafeOffsetOp {
    ByField,
    ByClassAndName,
    Native,
}

impl UnsafeOffsetOp {
    pub fn function_name(&self) -> &'static str {
        "objectFieldOffset"
    }
}
