//! Event sources and the per-descriptor entries of the [`DescriptorTable`](crate::io::table::DescriptorTable).

use std::fmt::{Debug, Formatter};
use std::os::fd::{AsRawFd, OwnedFd};
use nix::sys::signal::Signal;
use nix::sys::signalfd::SignalFd;
use nix::sys::timerfd::TimerFd;
use nix::unistd::Pid;
use crate::io::EventFlags;

/// The kind of a registered source together with the kernel object it owns.
///
/// Dropping a `Source` closes the descriptor it owns. `Handle` and `User`
/// own nothing: the former belongs to the caller, the latter to a
/// [`UserEvent`](crate::UserEvent).
pub(crate) enum Source {
    Handle,
    Timer(TimerFd),
    Signal { fd: SignalFd, signal: Signal },
    Process { fd: OwnedFd, pid: Pid },
    User
}

impl Source {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Source::Handle => "handle",
            Source::Timer(_) => "timer",
            Source::Signal { .. } => "signal",
            Source::Process { .. } => "process",
            Source::User => "user event"
        }
    }
}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Signal { signal, .. } => write!(f, "Signal({})", signal),
            Source::Process { fd, pid } => write!(f, "Process({}, pidfd {})", pid, fd.as_raw_fd()),
            _ => f.write_str(self.name())
        }
    }
}

pub(crate) struct Entry<T> {
    pub(crate) source: Source,
    /// Interest (`READ`/`WRITE` for handles, the kind flag otherwise) plus `ONESHOT`/`FINISHED`.
    pub(crate) events: EventFlags,
    pub(crate) data: T
}

impl<T> Entry<T> {
    #[inline(always)]
    pub(crate) fn new(source: Source, events: EventFlags, data: T) -> Self {
        Self { source, events, data }
    }

    /// Returns `true` if the descriptor is currently added to the epoll handle.
    #[inline(always)]
    pub(crate) fn is_live(&self) -> bool {
        match self.source {
            Source::Handle => self.events.intersects(EventFlags::INTEREST),
            _ => !self.events.contains(EventFlags::FINISHED)
        }
    }
}
