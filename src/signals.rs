//! Signals driving the daemon loop
//!
//! The handled set is blocked on the main thread before any other thread
//! exists, so every thread inherits the mask and delivery only happens
//! through `sigwait` in [`crate::Daemon::exec`].

use crate::error::{Result, TaspError};
use nix::sys::signal::{SigSet, Signal};

/// Signals the daemon waits for
pub const HANDLED: [Signal; 6] = [
    Signal::SIGINT,
    Signal::SIGTERM,
    Signal::SIGQUIT,
    Signal::SIGKILL,
    Signal::SIGUSR1,
    Signal::SIGUSR2,
];

/// What the daemon loop does with a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    Reload,
    Terminate,
}

pub fn action(signal: Signal) -> SignalAction {
    match signal {
        Signal::SIGUSR1 | Signal::SIGUSR2 => SignalAction::Reload,
        _ => SignalAction::Terminate,
    }
}

/// Human-readable description of a handled signal
pub const fn describe(signal: Signal) -> &'static str {
    match signal {
        Signal::SIGINT => "SIGINT (Interrupt/Ctrl+C)",
        Signal::SIGTERM => "SIGTERM (Terminate)",
        Signal::SIGQUIT => "SIGQUIT (Quit)",
        Signal::SIGKILL => "SIGKILL (Kill)",
        Signal::SIGUSR1 => "SIGUSR1 (Reload)",
        Signal::SIGUSR2 => "SIGUSR2 (Reload)",
        _ => "Unhandled signal",
    }
}

pub fn signal_set() -> SigSet {
    let mut set = SigSet::empty();
    for signal in HANDLED {
        set.add(signal);
    }
    set
}

/// Block the handled set on the calling thread
///
/// SIGKILL cannot be blocked; the kernel drops it from the mask silently.
pub fn block() -> Result<SigSet> {
    let set = signal_set();
    set.thread_block().map_err(|source| TaspError::Signal {
        action: "block daemon signals",
        source,
    })?;
    Ok(set)
}

/// Wait for the next signal of `set`
pub fn wait(set: &SigSet) -> Result<Signal> {
    set.wait().map_err(|source| TaspError::Signal {
        action: "wait for signals",
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::raise;

    #[test]
    fn test_actions() {
        assert_eq!(action(Signal::SIGUSR1), SignalAction::Reload);
        assert_eq!(action(Signal::SIGUSR2), SignalAction::Reload);
        for signal in [Signal::SIGINT, Signal::SIGTERM, Signal::SIGQUIT, Signal::SIGKILL] {
            assert_eq!(action(signal), SignalAction::Terminate);
        }
    }

    #[test]
    fn test_set_contains_handled() {
        let set = signal_set();
        for signal in HANDLED {
            assert!(set.contains(signal));
        }
        assert!(!set.contains(Signal::SIGHUP));
        assert!(!set.contains(Signal::SIGSEGV));
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(Signal::SIGTERM), "SIGTERM (Terminate)");
        assert_eq!(describe(Signal::SIGHUP), "Unhandled signal");
    }

    #[test]
    fn test_blocked_signal_is_waited_for() {
        let received = std::thread::spawn(|| {
            let set = block().unwrap();
            raise(Signal::SIGUSR2).unwrap();
            wait(&set).unwrap()
        })
        .join()
        .unwrap();
        assert_eq!(received, Signal::SIGUSR2);
    }
}
