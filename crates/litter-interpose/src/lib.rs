//! Platform-abstraction layer for diverting calls to the host allocator's
//! C API into user-supplied code, while keeping the real implementation
//! addressable from inside the replacement.
//!
//! This implementation uses the symbol-preemption style: replacements are
//! exported under their original name from a `cdylib` preloaded ahead of
//! the system allocator (`LD_PRELOAD`/`DYLD_INSERT_LIBRARIES`), and real
//! functions are resolved with `dlsym(RTLD_NEXT, ...)`, matching
//! `original_source/src/include/interpose.h`'s non-Apple branch.

mod guard;
mod real_fn;

pub use guard::ReentrancyGuard;
pub use real_fn::RealFn;

/// Declares a cached accessor for the real implementation of a named C
/// function, resolved once via `dlsym(RTLD_NEXT, name)` and cached in a
/// function-local static — the Rust shape of the interposer contract's
/// "obtain a handle to the real function" requirement. `$name` must be a
/// C-string literal (e.g. `c"malloc"`); `$ty` must be an `unsafe extern
/// "C" fn(...) -> ...` type.
#[macro_export]
macro_rules! real_fn {
    ($name:expr, $ty:ty) => {{
        static CACHE: $crate::RealFn<$ty> = $crate::RealFn::new($name);
        CACHE.get()
    }};
}
