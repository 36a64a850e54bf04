use std::os::fd::RawFd;
use bitflags::bitflags;
use nix::errno::Errno;

bitflags! {
    /// Semantic events reported by [`Selector::select`](crate::Selector::select).
    ///
    /// `READ` and `WRITE` are also the interest set of a handle registration.
    /// `ONESHOT` and `FINISHED` are bookkeeping: a key carrying `FINISHED` comes from a
    /// one-shot source that will not fire again until it is registered anew.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventFlags: u16 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const TIMER = 1 << 2;
        const SIGNAL = 1 << 3;
        const PROCESS = 1 << 4;
        const USER = 1 << 5;
        const ERROR = 1 << 6;
        const ONESHOT = 1 << 7;
        const FINISHED = 1 << 8;
    }
}

impl EventFlags {
    /// Events a caller may ask for when registering a handle.
    pub const INTEREST: EventFlags = EventFlags::READ.union(EventFlags::WRITE);
}

/// The fields of a kernel signal-info record that the selector keeps: `signalfd_siginfo`
/// for signal sources, the `waitid` result for process sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalInfo {
    /// Signal number (`ssi_signo`).
    pub signo: u32,
    /// Sender pid, or the pid of the terminated process (`ssi_pid`, `si_pid`).
    pub pid: u32,
    /// Sender real uid (`ssi_uid`).
    pub uid: u32,
    /// Exit code, or the terminating signal of a process (`ssi_status`, `si_status`).
    pub status: i32
}

impl From<&libc::signalfd_siginfo> for SignalInfo {
    fn from(info: &libc::signalfd_siginfo) -> Self {
        Self {
            signo: info.ssi_signo,
            pid: info.ssi_pid,
            uid: info.ssi_uid,
            status: info.ssi_status
        }
    }
}

/// A ready source returned by a wait.
///
/// It is not a reference into the selector. Use `fd` to look the payload up
/// with [`Selector::get_data`](crate::Selector::get_data) before the next
/// call that mutates the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyKey {
    pub fd: RawFd,
    pub events: EventFlags,
    /// Set together with [`EventFlags::ERROR`]: `ECONNRESET` on hang-up, or the
    /// pending `SO_ERROR` of a socket.
    pub error: Option<Errno>,
    /// Set for [`EventFlags::SIGNAL`] and [`EventFlags::PROCESS`] keys.
    pub signal: Option<SignalInfo>
}

impl ReadyKey {
    #[inline(always)]
    pub(crate) fn new(fd: RawFd) -> Self {
        Self {
            fd,
            events: EventFlags::empty(),
            error: None,
            signal: None
        }
    }

    /// Empty key, used to fill buffers for [`Selector::select_into`](crate::Selector::select_into).
    pub const fn empty() -> Self {
        Self {
            fd: -1,
            events: EventFlags::empty(),
            error: None,
            signal: None
        }
    }
}

impl Default for ReadyKey {
    fn default() -> Self {
        Self::empty()
    }
}
