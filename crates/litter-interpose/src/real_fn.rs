use std::ffi::CStr;
use std::marker::PhantomData;
use std::sync::OnceLock;

/// Caches the address of the real implementation of a named C function,
/// resolved once via `dlsym(RTLD_NEXT, name)`. `F` must be an `unsafe
/// extern "C" fn` pointer type (same representation as `usize`). Lookup
/// is idempotent and safe to call from multiple threads: `OnceLock`
/// serializes the first resolution, every subsequent call reads the
/// cached address.
///
/// The name is taken as a borrowed `&'static CStr` rather than built from
/// a `&str` on demand: allocating here (as `CString::new` would) recurses
/// into the very allocator hook this module exists to resolve, and the
/// first resolution would deadlock against its own `OnceLock`.
pub struct RealFn<F> {
    name: &'static CStr,
    cache: OnceLock<usize>,
    _marker: PhantomData<F>,
}

impl<F: Copy> RealFn<F> {
    pub const fn new(name: &'static CStr) -> Self {
        Self {
            name,
            cache: OnceLock::new(),
            _marker: PhantomData,
        }
    }

    /// Resolve (or return the cached) real function pointer. Aborts the
    /// process with a diagnostic if resolution fails, per the
    /// interposer's failure semantics — a replacement that can't reach
    /// the real allocator has no safe fallback.
    pub fn get(&self) -> F {
        debug_assert_eq!(
            std::mem::size_of::<F>(),
            std::mem::size_of::<usize>(),
            "RealFn::<F> requires F to be a bare fn pointer"
        );
        let addr = *self.cache.get_or_init(|| self.resolve());
        // SAFETY: F is documented to be a bare `unsafe extern "C" fn`
        // pointer, which has the same size and representation as usize.
        unsafe { std::mem::transmute_copy::<usize, F>(&addr) }
    }

    fn resolve(&self) -> usize {
        // SAFETY: dlsym with a valid C string and RTLD_NEXT is always
        // sound to call; the returned pointer is only ever transmuted
        // back into the same function type it was resolved for.
        let sym = unsafe { libc::dlsym(libc::RTLD_NEXT, self.name.as_ptr()) };
        if sym.is_null() {
            eprintln!(
                "litter-interpose: could not resolve real `{}` via dlsym(RTLD_NEXT, ...)",
                self.name.to_string_lossy()
            );
            std::process::abort();
        }
        sym as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_and_caches_a_known_libc_symbol() {
        type GetpidFn = unsafe extern "C" fn() -> libc::pid_t;
        static CACHE: RealFn<GetpidFn> = RealFn::new(c"getpid");
        let f = CACHE.get();
        let pid = unsafe { f() };
        assert_eq!(pid, std::process::id() as libc::pid_t);
        // second call hits the cache and must still resolve to the same fn
        let f2 = CACHE.get();
        assert_eq!(f as usize, f2 as usize);
    }
}
