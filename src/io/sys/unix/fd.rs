//! Reads and writes of the 8-byte counters used by timerfd and eventfd.

use std::mem::size_of;
use std::os::fd::RawFd;
use nix::errno::Errno;
use crate::io::sys::unix::epoll::check_error::check_error;

/// Reads an 8-byte native-endian counter, resetting it to zero.
///
/// Returns `EAGAIN` if the counter is zero and `fd` is non-blocking.
#[inline]
pub(crate) fn read_counter(fd: RawFd) -> Result<u64, Errno> {
    let mut value: u64 = 0;
    let n = check_error(
        unsafe { libc::read(fd, &mut value as *mut u64 as *mut libc::c_void, size_of::<u64>()) },
        "cannot read counter"
    )?;
    if n != size_of::<u64>() {
        return Err(Errno::EIO);
    }

    Ok(value)
}

/// Adds `value` to an 8-byte counter.
#[inline]
pub(crate) fn write_counter(fd: RawFd, value: u64) -> Result<(), Errno> {
    let n = check_error(
        unsafe { libc::write(fd, &value as *const u64 as *const libc::c_void, size_of::<u64>()) },
        "cannot write counter"
    )?;
    if n != size_of::<u64>() {
        return Err(Errno::EIO);
    }

    Ok(())
}
