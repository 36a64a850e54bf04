//! pidfd-backed process sources.
//!
//! A pidfd turns readable once its process has terminated. Every registration watches
//! exactly one child, so it never sees the exits of other children and does not depend
//! on which thread of the process a `SIGCHLD` would be delivered to.

use std::os::fd::OwnedFd;
use nix::unistd::Pid;
use crate::io::{Result, SelectorError, SignalInfo};

cfg_if::cfg_if! {
    if #[cfg(target_os = "android")] {
        pub(crate) fn open_process(_pid: Pid) -> Result<OwnedFd> {
            Err(SelectorError::Unsupported("pidfd"))
        }

        pub(crate) fn exit_info(_pid: Pid) -> Result<Option<SignalInfo>> {
            Ok(None)
        }
    } else {
        use std::mem::MaybeUninit;
        use std::os::fd::{FromRawFd, RawFd};
        use nix::errno::Errno;
        use crate::io::sys::unix::epoll::check_error::check_error;

        /// Opens a pidfd for `pid`. The descriptor is close-on-exec.
        ///
        /// # Errors
        ///
        /// * [`SelectorError::InvalidState`] if `pid` is not positive.
        /// * [`SelectorError::Os`] with `ESRCH` if the process is already reaped.
        /// * [`SelectorError::Unsupported`] if the kernel has no `pidfd_open`.
        pub(crate) fn open_process(pid: Pid) -> Result<OwnedFd> {
            if pid.as_raw() <= 0 {
                return Err(SelectorError::InvalidState("process id must be positive"));
            }

            let res = unsafe { libc::syscall(libc::SYS_pidfd_open, pid.as_raw(), 0) };
            match check_error(res as isize, "cannot open pidfd") {
                Ok(fd) => Ok(unsafe { OwnedFd::from_raw_fd(fd as RawFd) }),
                Err(Errno::ENOSYS) => Err(SelectorError::Unsupported("pidfd_open")),
                Err(Errno::ESRCH) => Err(SelectorError::Os(Errno::ESRCH)),
                Err(errno) => Err(SelectorError::Resource(errno))
            }
        }

        /// Reads how the child `pid` terminated without reaping it.
        ///
        /// `None` if `pid` has not terminated or is not a child of this process.
        pub(crate) fn exit_info(pid: Pid) -> Result<Option<SignalInfo>> {
            let mut info = MaybeUninit::<libc::siginfo_t>::zeroed();
            let res = unsafe {
                libc::waitid(
                    libc::P_PID,
                    pid.as_raw() as libc::id_t,
                    info.as_mut_ptr(),
                    libc::WEXITED | libc::WNOHANG | libc::WNOWAIT
                )
            };
            match check_error(res as isize, "cannot query process") {
                Ok(_) => {}
                Err(Errno::ECHILD) => return Ok(None),
                Err(errno) => return Err(SelectorError::Os(errno))
            }

            let info = unsafe { info.assume_init() };
            let child = unsafe { info.si_pid() };
            if child == 0 {
                return Ok(None);
            }

            Ok(Some(SignalInfo {
                signo: info.si_signo as u32,
                pid: child as u32,
                uid: unsafe { info.si_uid() },
                status: unsafe { info.si_status() }
            }))
        }
    }
}
