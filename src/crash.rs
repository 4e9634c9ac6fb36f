//! SIGSEGV crash notice
//!
//! The handler runs on a corrupted process, so it only uses
//! async-signal-safe calls: it writes a notice prepared at install time to
//! stderr, dumps a best-effort backtrace (glibc) and leaves with `_exit(1)`.
//! It never touches the logging pipeline or the allocator.

use crate::error::{Result, TaspError};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::OnceLock;

static NOTICE: OnceLock<Vec<u8>> = OnceLock::new();

const FALLBACK_NOTICE: &[u8] = b"fatal: segmentation fault\n";

#[cfg(all(target_os = "linux", target_env = "gnu"))]
mod trace {
    use libc::{c_int, c_void};

    const DEPTH: usize = 64;

    extern "C" {
        fn backtrace(buffer: *mut *mut c_void, size: c_int) -> c_int;
        fn backtrace_symbols_fd(buffer: *const *mut c_void, size: c_int, fd: c_int);
    }

    /// First call loads libgcc, which may allocate; do it outside the handler
    pub(super) fn warm_up() {
        let mut frames = [std::ptr::null_mut(); 4];
        // SAFETY: the buffer holds as many entries as passed in.
        unsafe { backtrace(frames.as_mut_ptr(), frames.len() as c_int) };
    }

    pub(super) fn dump(fd: c_int) {
        let mut frames = [std::ptr::null_mut(); DEPTH];
        // SAFETY: the buffer holds DEPTH entries and backtrace fills at most that.
        unsafe {
            let depth = backtrace(frames.as_mut_ptr(), DEPTH as c_int);
            backtrace_symbols_fd(frames.as_ptr(), depth, fd);
        }
    }
}

#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
mod trace {
    pub(super) fn warm_up() {}
    pub(super) fn dump(_fd: libc::c_int) {}
}

/// Install the SIGSEGV handler for the whole process
///
/// `program` names the process in the notice.
pub fn install(program: &str) -> Result<()> {
    let _ = NOTICE.set(
        format!(
            "{}[{}]: fatal signal SIGSEGV, backtrace follows\n",
            program,
            std::process::id()
        )
        .into_bytes(),
    );
    trace::warm_up();

    let handler = SigAction::new(
        SigHandler::Handler(on_segv),
        SaFlags::SA_RESETHAND,
        SigSet::empty(),
    );
    // SAFETY: on_segv only calls async-signal-safe functions.
    unsafe { sigaction(Signal::SIGSEGV, &handler) }
        .map(|_| ())
        .map_err(|source| TaspError::Signal {
            action: "install SIGSEGV handler",
            source,
        })
}

fn write_stderr(bytes: &[u8]) {
    let mut rest = bytes;
    while !rest.is_empty() {
        // SAFETY: the pointer and length describe a live slice.
        let written =
            unsafe { libc::write(libc::STDERR_FILENO, rest.as_ptr().cast(), rest.len()) };
        if written <= 0 {
            return;
        }
        rest = &rest[written as usize..];
    }
}

extern "C" fn on_segv(_signal: libc::c_int) {
    let notice = NOTICE.get().map(Vec::as_slice).unwrap_or(FALLBACK_NOTICE);
    write_stderr(notice);
    trace::dump(libc::STDERR_FILENO);
    // SAFETY: _exit skips every handler and destructor, nothing else runs.
    unsafe { libc::_exit(1) }
}
