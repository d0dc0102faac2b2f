use std::ffi::c_void;
use std::path::Path;

use libc::{c_int, size_t};
use litter_interpose::{ReentrancyGuard, real_fn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::state::STATE;

pub(crate) fn init_logging(log_path: Option<&Path>) -> Option<WorkerGuard> {
    match log_path {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file_name = path.file_name().unwrap_or(path.as_os_str());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = tracing_subscriber::fmt()
                .with_writer(writer)
                .with_ansi(false)
                .try_init();
            Some(guard)
        }
        None => {
            let _ = tracing_subscriber::fmt().with_writer(std::io::stderr).try_init();
            None
        }
    }
}

/// Bracket `observe` with the reentrancy guard, then always call the real
/// function outside the guarded region — the allocator is allowed, and
/// expected, to recurse.
#[inline]
fn guarded<R>(observe: impl FnOnce(), call_real: impl FnOnce() -> R) -> R {
    ReentrancyGuard::observe_if_not_busy(observe);
    call_real()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn malloc(size: size_t) -> *mut c_void {
    type Real = unsafe extern "C" fn(size_t) -> *mut c_void;
    let real = real_fn!(c"malloc", Real);
    guarded(
        || STATE.observe_allocation(size, true),
        || unsafe { real(size) },
    )
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn free(ptr: *mut c_void) {
    type Real = unsafe extern "C" fn(*mut c_void);
    let real = real_fn!(c"free", Real);
    guarded(|| STATE.observe_release(ptr), || unsafe { real(ptr) });
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn calloc(nmemb: size_t, size: size_t) -> *mut c_void {
    type Real = unsafe extern "C" fn(size_t, size_t) -> *mut c_void;
    let real = real_fn!(c"calloc", Real);
    guarded(
        || STATE.observe_allocation(nmemb.saturating_mul(size), true),
        || unsafe { real(nmemb, size) },
    )
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn realloc(ptr: *mut c_void, size: size_t) -> *mut c_void {
    type Real = unsafe extern "C" fn(*mut c_void, size_t) -> *mut c_void;
    let real = real_fn!(c"realloc", Real);
    guarded(
        || {
            if ptr.is_null() {
                // A reallocation from null is semantically a fresh
                // allocation (Open Question in the design notes; this is
                // the rule a correct implementation adopts).
                STATE.observe_allocation(size, true);
            } else if size == 0 {
                // Some platforms treat realloc(ptr, 0) as a free. Treated
                // symmetrically here: counts as a release, not binned.
                STATE.observe_release(ptr);
            } else {
                STATE.observe_allocation(size, false);
            }
        },
        || unsafe { real(ptr, size) },
    )
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn reallocarray(ptr: *mut c_void, nmemb: size_t, size: size_t) -> *mut c_void {
    type Real = unsafe extern "C" fn(*mut c_void, size_t, size_t) -> *mut c_void;
    let real = real_fn!(c"reallocarray", Real);
    let total = nmemb.saturating_mul(size);
    guarded(
        || {
            if ptr.is_null() {
                STATE.observe_allocation(total, true);
            } else if total == 0 {
                STATE.observe_release(ptr);
            } else {
                STATE.observe_allocation(total, false);
            }
        },
        || unsafe { real(ptr, nmemb, size) },
    )
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn posix_memalign(
    memptr: *mut *mut c_void,
    alignment: size_t,
    size: size_t,
) -> c_int {
    type Real = unsafe extern "C" fn(*mut *mut c_void, size_t, size_t) -> c_int;
    let real = real_fn!(c"posix_memalign", Real);
    guarded(
        || STATE.observe_allocation(size, true),
        || unsafe { real(memptr, alignment, size) },
    )
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn aligned_alloc(alignment: size_t, size: size_t) -> *mut c_void {
    type Real = unsafe extern "C" fn(size_t, size_t) -> *mut c_void;
    let real = real_fn!(c"aligned_alloc", Real);
    guarded(
        || STATE.observe_allocation(size, true),
        || unsafe { real(alignment, size) },
    )
}
