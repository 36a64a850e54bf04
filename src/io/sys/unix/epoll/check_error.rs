//! This module provides a function, that checks the result of a raw syscall.
//!
//! Read [`check_error`] for more info.

use nix::errno::Errno;

/// Checks the result of a raw `libc` syscall.
///
/// Returns the non-negative result as `usize`, or the `errno` of the failed call.
/// Failures other than `EAGAIN` are logged at debug level with `msg`.
///
/// # Examples
///
/// ```ignore
/// let n = check_error(unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) }, "cannot read timer")?;
/// ```
#[inline(always)]
pub(crate) fn check_error(res: isize, msg: &str) -> Result<usize, Errno> {
    if res < 0 {
        let errno = Errno::last();
        if errno != Errno::EAGAIN {
            log::debug!("{}: {}", msg, errno);
        }
        return Err(errno);
    }

    Ok(res as usize)
}
