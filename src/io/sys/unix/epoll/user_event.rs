//! [`UserEvent`]: a cross-thread wake-up for a [`Selector`](crate::Selector).
//!
//! The event is a kernel counter. Triggers add to it, and one wait drains the whole value,
//! so any number of triggers between two waits show up as one `USER` key.

use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use nix::errno::Errno;
use crate::io::sys::unix::fd::write_counter;
use crate::io::{Result, SelectorError};

/// A kernel counter usable for waking a selector from any thread.
///
/// `UserEvent` is `Send + Sync`; share it with `Arc` and call [`trigger`](Self::trigger)
/// from anywhere. Register it with [`Selector::register_event`](crate::Selector::register_event).
///
/// The selector does not own the descriptor. Unregister the event before closing or dropping it,
/// otherwise the selector is left with the number of a closed descriptor.
#[derive(Debug)]
pub struct UserEvent {
    fd: OwnedFd
}

impl UserEvent {
    /// Creates a new eventfd with `EFD_NONBLOCK | EFD_CLOEXEC`.
    pub fn new() -> Result<Self> {
        let fd = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
        if fd < 0 {
            return Err(SelectorError::Resource(Errno::last()));
        }
        log::debug!("created user event {}", fd);

        Ok(Self { fd: unsafe { OwnedFd::from_raw_fd(fd) } })
    }

    /// Wakes the selector this event is registered with. Never blocks.
    pub fn trigger(&self) -> Result<()> {
        match write_counter(self.fd.as_raw_fd(), 1) {
            // The counter would overflow, so a wake-up is already pending.
            Ok(()) | Err(Errno::EAGAIN) => Ok(()),
            Err(errno) => Err(SelectorError::Os(errno))
        }
    }

    /// Closes the eventfd. Same as dropping the event.
    pub fn close(self) {
        log::debug!("closing user event {}", self.fd.as_raw_fd());
    }
}

impl AsRawFd for UserEvent {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl AsFd for UserEvent {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sys::unix::fd::read_counter;

    #[test]
    fn test_trigger_coalesces() {
        let event = UserEvent::new().unwrap();
        assert_eq!(read_counter(event.as_raw_fd()), Err(Errno::EAGAIN));

        event.trigger().unwrap();
        event.trigger().unwrap();
        event.trigger().unwrap();

        assert_eq!(read_counter(event.as_raw_fd()), Ok(3));
        assert_eq!(read_counter(event.as_raw_fd()), Err(Errno::EAGAIN));
    }

    #[test]
    fn test_trigger_saturated_counter() {
        let event = UserEvent::new().unwrap();
        write_counter(event.as_raw_fd(), u64::MAX - 1).unwrap();

        assert!(event.trigger().is_ok());
    }
}
