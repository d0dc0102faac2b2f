use std::cell::Cell;

thread_local! {
    static BUSY: Cell<u32> = const { Cell::new(0) };
}

/// Per-thread reentrancy counter. `busy() > 0` means the current thread is
/// already inside an interposed call whose observation step has already
/// run; a nested call into the same interposed name must bypass
/// observation to avoid recursing into an allocator that is itself
/// calling allocation primitives. Strictly thread-local — never a lock,
/// since lock acquisition may itself allocate.
pub struct ReentrancyGuard;

impl ReentrancyGuard {
    pub fn busy() -> bool {
        BUSY.with(|b| b.get() > 0)
    }

    pub fn enter() {
        BUSY.with(|b| b.set(b.get() + 1));
    }

    pub fn exit() {
        BUSY.with(|b| b.set(b.get().saturating_sub(1)));
    }

    /// Run `f` only if this thread is not already inside an observed
    /// interposed call, bracketing it with `enter`/`exit`. Returns `true`
    /// if `f` ran. The actual call to the real heap function must happen
    /// outside `f` — the allocator is allowed, and expected, to recurse.
    pub fn observe_if_not_busy(f: impl FnOnce()) -> bool {
        if Self::busy() {
            return false;
        }
        Self::enter();
        f();
        Self::exit();
        true
    }
}
