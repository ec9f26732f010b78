//! Data model from spec.md §3: [`Hook`]/[`NativeHook`] (resolved,
//! installed breakpoints), [`MethodLocation`] (the classifier's set key),
//! and the installed-set/pending-bindings containers that hold them.
//!
//! The "tracked global reference" a [`Hook`] carries is the binding
//! crate's own `env::GlobalRef` — already an owned handle releasing on
//! `Drop`, the same shape the Design Notes ask for, so no extra wrapper is
//! needed here (contrast with the teacher's `JniClassLoader`, which wraps
//! a `jni::objects::GlobalRef` only to add class-loader-specific methods;
//! a [`Hook`] needs no such methods, just the reference kept alive).

use crate::handlers::HandlerKind;
use jvmti::env::GlobalRef;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

/// The runtime's opaque, process-lifetime method identity.
pub type MethodId = i64;

#[derive(Debug, Clone, Copy)]
pub struct HookSpec {
    pub class_name: &'static str,
    pub method_name: &'static str,
    pub descriptor: &'static str,
    pub handler: HandlerKind,
    pub optional: bool,
    /// Whether `method_name` is declared `static`. JNI resolves static and
    /// instance methods through different functions
    /// (`GetStaticMethodID`/`GetMethodID`), so [`crate::installer`] must
    /// know this before it can resolve a method identity at all — and
    /// [`crate::dispatch`] uses it to decide whether a hit has a receiver
    /// object to read off the stopped frame.
    pub is_static: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct NativeHookSpec {
    pub class_name: &'static str,
    pub method_name: &'static str,
    pub descriptor: &'static str,
    pub handler: HandlerKind,
    pub optional: bool,
}

/// A resolved [`HookSpec`] bound to a runtime class reference and method
/// identity. Invariant: `method_id` is unique across the installed set —
/// [`crate::installer`] treats a collision as a fatal bug, never a
/// silent overwrite.
pub struct Hook {
    pub spec: &'static HookSpec,
    pub class_ref: GlobalRef,
    pub method_id: MethodId,
}

/// A resolved [`NativeHookSpec`] plus the cell holding the original native
/// entry, populated by the first native-bind event this method sees.
/// Invariant: once set, read-only for the hook's lifetime.
pub struct NativeHook {
    pub spec: &'static NativeHookSpec,
    pub class_ref: GlobalRef,
    pub method_id: MethodId,
    original_entry: Mutex<Option<usize>>,
}

impl NativeHook {
    pub fn new(
        spec: &'static NativeHookSpec,
        class_ref: GlobalRef,
        method_id: MethodId,
        original_entry: Option<usize>,
    ) -> Self {
        Self {
            spec,
            class_ref,
            method_id,
            original_entry: Mutex::new(original_entry),
        }
    }

    /// Writes the original entry the first time it becomes known. A
    /// second binding event for the same method (which should not happen
    /// under normal JVM behavior) leaves the existing value untouched,
    /// upholding "once set, read-only."
    pub fn set_original_if_absent(&self, addr: usize) {
        let mut slot = self.original_entry.lock().unwrap();
        if slot.is_none() {
            *slot = Some(addr);
        }
    }

    pub fn original_entry(&self) -> Option<usize> {
        *self.original_entry.lock().unwrap()
    }
}

/// A `(method identity, bytecode index)` pair: the classifier's set key for
/// "already classified as an explicit call site."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodLocation {
    pub method_id: MethodId,
    pub bci: i64,
}

/// Mapping method-identity → [`Hook`], mutated insert-only at install time
/// (or concurrently when classloader discovery adds entries after initial
/// install) and read concurrently from every dispatch.
#[derive(Default)]
pub struct InstalledSet {
    inner: RwLock<HashMap<MethodId, Hook>>,
}

impl InstalledSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a newly-resolved hook. Returns `Err` if `method_id` is
    /// already present — spec.md §3: "inserting a duplicate is a fatal
    /// bug," left for the caller to turn into an invariant-violation abort.
    pub fn insert(&self, hook: Hook) -> Result<(), Hook> {
        let mut guard = self.inner.write().unwrap();
        if guard.contains_key(&hook.method_id) {
            return Err(hook);
        }
        guard.insert(hook.method_id, hook);
        Ok(())
    }

    pub fn contains(&self, method_id: MethodId) -> bool {
        self.inner.read().unwrap().contains_key(&method_id)
    }

    pub fn with_hook<R>(&self, method_id: MethodId, f: impl FnOnce(&Hook) -> R) -> Option<R> {
        self.inner.read().unwrap().get(&method_id).map(f)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Guards [`NativeInstalledSet`] and `PendingBindings` under one mutex, per
/// spec.md §4.3's mutual-exclusion requirement and the Design Notes' "single
/// mutex plus an explicit reentrancy bit" for the native-bind/install cycle.
#[derive(Default)]
pub struct NativeBindingState {
    pub installed: HashMap<MethodId, std::sync::Arc<NativeHook>>,
    pub pending: HashMap<MethodId, usize>,
}

impl NativeBindingState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Concurrent insert-only set of [`MethodLocation`], populated the first
/// time a callsite is classified as explicit.
#[derive(Default)]
pub struct ExplicitCallSiteSet {
    inner: Mutex<HashSet<MethodLocation>>,
}

impl ExplicitCallSiteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, loc: MethodLocation) -> bool {
        self.inner.lock().unwrap().contains(&loc)
    }

    /// Returns `true` if this call newly inserted the location (i.e. it
    /// had not been classified before).
    pub fn insert(&self, loc: MethodLocation) -> bool {
        self.inner.lock().unwrap().insert(loc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_call_site_set_is_insert_once() {
        let set = ExplicitCallSiteSet::new();
        let loc = MethodLocation {
            method_id: 42,
            bci: 7,
        };
        assert!(!set.contains(loc));
        assert!(set.insert(loc));
        assert!(set.contains(loc));
        assert!(!set.insert(loc));
    }
}
