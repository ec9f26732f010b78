//! A thread-local one-bit flag guarding re-entry into [`crate::dispatch`]
//! when a handler itself calls back into the runtime and triggers another
//! hookable event on the same thread. Grounded on the teacher crate's own
//! `thread_local! { static LAST_CLEARED_EX: Cell<...> }` pattern in `lib.rs`
//! — same mechanism (a `Cell` behind `thread_local!`), different bit.

use std::cell::Cell;

thread_local! {
    static RECURSING: Cell<bool> = const { Cell::new(false) };
}

/// RAII guard that sets the flag on acquisition and clears it on drop,
/// covering every exit path (including an early return or a panic unwind)
/// as spec.md §4.4 step 5 requires ("Clear RecursionFlag on all exit
/// paths").
pub struct RecursionGuard {
    _private: (),
}

impl RecursionGuard {
    /// Attempts to acquire the guard for the current thread. Returns
    /// `None` if the thread is already inside a handler — the caller must
    /// then return immediately without dispatching (spec.md §4.4 step 1).
    pub fn try_acquire() -> Option<Self> {
        RECURSING.with(|flag| {
            if flag.get() {
                None
            } else {
                flag.set(true);
                Some(RecursionGuard { _private: () })
            }
        })
    }

    /// True if the current thread is already inside a handler.
    pub fn is_recursing() -> bool {
        RECURSING.with(|flag| flag.get())
    }
}

impl Drop for RecursionGuard {
    fn drop(&mut self) {
        RECURSING.with(|flag| flag.set(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquisition_on_same_thread_fails_while_first_is_held() {
        let outer = RecursionGuard::try_acquire();
        assert!(outer.is_some());
        assert!(RecursionGuard::try_acquire().is_none());
        drop(outer);
        assert!(RecursionGuard::try_acquire().is_some());
    }

    #[test]
    fn guard_clears_flag_on_drop_even_after_nested_checks() {
        assert!(!RecursionGuard::is_recursing());
        {
            let _guard = RecursionGuard::try_acquire().unwrap();
            assert!(RecursionGuard::is_recursing());
        }
        assert!(!RecursionGuard::is_recursing());
    }
}
