//! signalfd-backed signal sources.
//!
//! A signal source blocks its signal for the calling thread, so the signal is
//! only ever observed through the descriptor.

use nix::sys::signal::{SigSet, Signal};
use nix::sys::signalfd::SignalFd;
use crate::io::{Result, SelectorError, SignalInfo};

cfg_if::cfg_if! {
    if #[cfg(target_os = "android")] {
        pub(crate) fn create_signal_fd(_signal: Signal) -> Result<(SignalFd, bool)> {
            Err(SelectorError::Unsupported("signalfd"))
        }
    } else {
        use nix::sys::signal::{pthread_sigmask, SigmaskHow};
        use nix::sys::signalfd::SfdFlags;

        /// Blocks `signal` for the calling thread and creates a non-blocking signalfd for it.
        ///
        /// The flag is `true` if this call blocked the signal, `false` if it was blocked already.
        pub(crate) fn create_signal_fd(signal: Signal) -> Result<(SignalFd, bool)> {
            let mut mask = SigSet::empty();
            mask.add(signal);
            let mut previous = SigSet::empty();
            pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(&mask), Some(&mut previous)).map_err(SelectorError::Os)?;
            let blocked = !previous.contains(signal);

            match SignalFd::with_flags(&mask, SfdFlags::SFD_NONBLOCK | SfdFlags::SFD_CLOEXEC) {
                Ok(fd) => Ok((fd, blocked)),
                Err(errno) => {
                    if blocked {
                        let _ = mask.thread_unblock();
                    }
                    Err(SelectorError::Resource(errno))
                }
            }
        }
    }
}

/// Returns `true` if signal and process sources can be registered on this platform.
pub const fn signals_supported() -> bool {
    !cfg!(target_os = "android")
}

/// Restores default delivery of `signal` for the calling thread.
pub(crate) fn unblock_signal(signal: Signal) -> Result<()> {
    let mut mask = SigSet::empty();
    mask.add(signal);
    mask.thread_unblock().map_err(SelectorError::Os)
}

/// Reads one pending `signalfd_siginfo` record. `None` if nothing is pending.
pub(crate) fn read_signal_info(fd: &mut SignalFd) -> Result<Option<SignalInfo>> {
    match fd.read_signal() {
        Ok(info) => Ok(info.as_ref().map(SignalInfo::from)),
        Err(errno) => Err(SelectorError::Os(errno))
    }
}
