//! timerfd-backed timer sources.

use std::time::Duration;
use nix::sys::time::TimeSpec;
use nix::sys::timerfd::{ClockId, Expiration, TimerFd, TimerFlags, TimerSetTimeFlags};
use crate::io::{Result, SelectorError};

/// Creates a non-blocking monotonic timer that first expires after `interval_ms`
/// and, unless `oneshot`, every `interval_ms` after that.
pub(crate) fn create_timer(interval_ms: u64, oneshot: bool) -> Result<TimerFd> {
    // A zero it_value disarms a timerfd.
    if interval_ms == 0 {
        return Err(SelectorError::InvalidState("timer interval must be positive"));
    }

    let timer = TimerFd::new(ClockId::CLOCK_MONOTONIC, TimerFlags::TFD_NONBLOCK | TimerFlags::TFD_CLOEXEC)
        .map_err(SelectorError::Resource)?;

    let interval = TimeSpec::from_duration(Duration::from_millis(interval_ms));
    let expiration = if oneshot {
        Expiration::OneShot(interval)
    } else {
        Expiration::Interval(interval)
    };
    timer.set(expiration, TimerSetTimeFlags::empty()).map_err(SelectorError::Os)?;

    Ok(timer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::{AsFd, AsRawFd};
    use std::thread::sleep;
    use nix::errno::Errno;
    use crate::io::sys::unix::fd::read_counter;

    #[test]
    fn test_zero_interval() {
        assert_eq!(
            create_timer(0, true).err(),
            Some(SelectorError::InvalidState("timer interval must be positive"))
        );
    }

    #[test]
    fn test_oneshot_expires_once() {
        let timer = create_timer(10, true).unwrap();
        let fd = timer.as_fd().as_raw_fd();
        assert_eq!(read_counter(fd), Err(Errno::EAGAIN));

        sleep(Duration::from_millis(50));
        assert_eq!(read_counter(fd), Ok(1));

        sleep(Duration::from_millis(30));
        assert_eq!(read_counter(fd), Err(Errno::EAGAIN));
    }

    #[test]
    fn test_interval_accumulates() {
        let timer = create_timer(10, false).unwrap();

        sleep(Duration::from_millis(55));
        let expirations = read_counter(timer.as_fd().as_raw_fd()).unwrap();
        assert!(expirations >= 2, "expirations: {}", expirations);
    }
}
