//! Ctrl-C handling.
//!
//! While a [`Guard`] is alive, SIGINT sets a process-wide flag instead of
//! killing the process, so callers can stop at the next safe point and
//! report what was processed. Dropping the guard puts back whatever handler
//! was installed before it. On non-unix targets the flag is never set.

use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Flag set by SIGINT while a [`Guard`] is alive.
#[must_use]
pub fn flag() -> &'static AtomicBool {
    &INTERRUPTED
}

/// Whether SIGINT arrived since the last [`install`].
#[must_use]
pub fn requested() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Keeps the SIGINT handler installed until dropped.
#[derive(Debug)]
#[must_use = "the handler is removed when the guard is dropped"]
pub struct Guard {
    previous: imp::Saved,
}

/// Clear the flag and install the handler.
pub fn install() -> Guard {
    INTERRUPTED.store(false, Ordering::SeqCst);
    Guard {
        previous: imp::install(),
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        imp::restore(self.previous);
    }
}

#[cfg(unix)]
mod imp {
    use std::sync::atomic::Ordering;

    pub(super) type Saved = libc::sighandler_t;

    extern "C" fn on_sigint(_: libc::c_int) {
        // Only async-signal-safe work here: a single atomic store.
        super::INTERRUPTED.store(true, Ordering::SeqCst);
    }

    pub(super) fn install() -> Saved {
        let handler = on_sigint as extern "C" fn(libc::c_int) as libc::sighandler_t;
        // SAFETY: `on_sigint` only performs an atomic store.
        let previous = unsafe { libc::signal(libc::SIGINT, handler) };
        if previous == libc::SIG_ERR {
            tracing::warn!("failed to install SIGINT handler");
            return libc::SIG_DFL;
        }
        previous
    }

    pub(super) fn restore(previous: Saved) {
        // SAFETY: `previous` came from `signal` for this very signal.
        unsafe {
            libc::signal(libc::SIGINT, previous);
        }
    }
}

#[cfg(not(unix))]
mod imp {
    pub(super) type Saved = ();

    pub(super) fn install() -> Saved {}
    pub(super) fn restore(_: Saved) {}
}
