//! Minimal host program for the end-to-end `LD_PRELOAD` test: performs
//! exactly the allocate/release sequence scenario S1 describes
//! (allocate(8), allocate(16), release(first), allocate(8), exit) by
//! calling `libc::malloc`/`libc::free` directly.
fn main() {
    unsafe {
        let a = libc::malloc(8);
        let _b = libc::malloc(16);
        libc::free(a);
        let _c = libc::malloc(8);
    }
}
