//! Waiting on the epoll handle and translating raw readiness into [`ReadyKey`]s.

use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::time::Duration;
use nix::errno::Errno;
use nix::sys::epoll::{EpollFlags, EpollTimeout};
use nix::sys::socket::{getsockopt, sockopt};
use crate::io::source::Source;
use crate::io::sys::unix::epoll::process::exit_info;
use crate::io::sys::unix::epoll::signal::read_signal_info;
use crate::io::sys::unix::epoll::{Selector, MAX_EVENTS};
use crate::io::sys::unix::fd::read_counter;
use crate::io::{EventFlags, ReadyKey, Result, SelectorError};

impl<T> Selector<T> {
    /// Waits for ready sources and returns up to [`MAX_EVENTS`] keys.
    ///
    /// `timeout_ms` is `-1` to wait forever, `0` to poll, or a positive number of milliseconds.
    /// A wait interrupted by a signal returns no keys.
    ///
    /// One-shot sources are disarmed when reported: the key carries `ONESHOT | FINISHED` and the
    /// source stays registered (with its payload) until [`unregister`](Self::unregister).
    pub fn select(&mut self, timeout_ms: i32) -> Result<Vec<ReadyKey>> {
        let mut keys = [ReadyKey::empty(); MAX_EVENTS];
        let n = self.select_into(timeout_ms, &mut keys)?;

        Ok(keys[..n].to_vec())
    }

    /// Same as [`select`](Self::select), but writes the keys into `keys` and returns how many were
    /// written. At most `min(keys.len(), MAX_EVENTS)` keys are written; an empty `keys` returns
    /// immediately.
    ///
    /// If a source fails to drain after other keys of the same batch were produced, those keys
    /// are returned and the error is logged. The failed source stays ready and comes back
    /// on the next wait.
    pub fn select_into(&mut self, timeout_ms: i32, keys: &mut [ReadyKey]) -> Result<usize> {
        let timeout = epoll_timeout(timeout_ms)?;
        let max = keys.len().min(MAX_EVENTS);
        if max == 0 {
            return Ok(0);
        }

        let n = match self.epoll.wait(&mut self.events[..max], timeout) {
            Ok(n) => n,
            Err(Errno::EINTR) => {
                log::trace!("epoll_wait was interrupted");
                return Ok(0);
            }
            Err(errno) => return Err(SelectorError::Os(errno))
        };

        let mut ready = 0;
        for i in 0..n {
            let event = self.events[i];
            let fd = event.data() as RawFd;
            match self.translate(fd, event.events()) {
                Ok(Some(key)) => {
                    keys[ready] = key;
                    ready += 1;
                }
                Ok(None) => {}
                // The rest of the batch is level-triggered and still ready.
                Err(err) if ready > 0 => {
                    log::warn!("cannot drain descriptor {}, returning {} keys: {}", fd, ready, err);
                    break;
                }
                Err(err) => return Err(err)
            }
        }

        Ok(ready)
    }

    /// Turns the raw readiness of `fd` into a key, draining the source.
    ///
    /// Returns `None` if there is nothing to report: the slot is free or finished,
    /// or the source had nothing to drain.
    fn translate(&mut self, fd: RawFd, raw: EpollFlags) -> Result<Option<ReadyKey>> {
        let entry = match self.table.get_mut(fd) {
            Some(entry) if !entry.events.contains(EventFlags::FINISHED) => entry,
            _ => {
                log::trace!("dropping event for unregistered or finished descriptor {}", fd);
                return Ok(None);
            }
        };

        let mut key = ReadyKey::new(fd);
        if raw.intersects(EpollFlags::EPOLLERR | EpollFlags::EPOLLHUP) {
            key.events |= EventFlags::ERROR;
            key.error = if raw.contains(EpollFlags::EPOLLHUP) {
                Some(Errno::ECONNRESET)
            } else {
                socket_error(fd)
            };
        }
        if raw.contains(EpollFlags::EPOLLOUT) {
            key.events |= EventFlags::WRITE;
        }

        if raw.intersects(EpollFlags::EPOLLIN | EpollFlags::EPOLLRDHUP) {
            match &mut entry.source {
                Source::Handle => {
                    if entry.events.contains(EventFlags::READ) {
                        key.events |= EventFlags::READ;
                    } else if raw.contains(EpollFlags::EPOLLRDHUP) {
                        // Without read interest a peer shutdown can only show up as an error.
                        key.events |= EventFlags::ERROR;
                        key.error = key.error.or(Some(Errno::ECONNRESET));
                    }
                }
                Source::Timer(timer) => match read_counter(timer.as_fd().as_raw_fd()) {
                    Ok(_) => key.events |= EventFlags::TIMER,
                    Err(Errno::EAGAIN) => return Ok(None),
                    Err(errno) => return Err(SelectorError::Os(errno))
                },
                Source::Signal { fd: signal_fd, .. } => match read_signal_info(signal_fd)? {
                    Some(info) => {
                        key.events |= EventFlags::SIGNAL;
                        key.signal = Some(info);
                    }
                    None => return Ok(None)
                },
                Source::Process { pid, .. } => {
                    key.events |= EventFlags::PROCESS;
                    key.signal = exit_info(*pid)?;
                    match key.signal {
                        Some(info) if info.pid != pid.as_raw() as u32 => {
                            log::warn!("process source {} waits for {}, got the exit of {}", fd, pid, info.pid);
                            return Ok(None);
                        }
                        Some(_) => {}
                        None => log::debug!("process {} terminated, but is not a child", pid)
                    }
                }
                Source::User => match read_counter(fd) {
                    Ok(_) => key.events |= EventFlags::USER,
                    Err(Errno::EAGAIN) => return Ok(None),
                    Err(errno) => return Err(SelectorError::Os(errno))
                }
            }
        }

        if key.events.is_empty() {
            return Ok(None);
        }

        if entry.events.contains(EventFlags::ONESHOT) {
            entry.events |= EventFlags::FINISHED;
            key.events |= EventFlags::ONESHOT | EventFlags::FINISHED;
            self.count -= 1;
            // Finished entries are skipped above, so the key is reported even if fd stays in epoll.
            if let Err(errno) = self.epoll.delete(unsafe { BorrowedFd::borrow_raw(fd) }) {
                log::warn!("cannot remove one-shot descriptor {} from epoll: {}", fd, errno);
            }
        }
        log::trace!("descriptor {} is ready: {:?}", fd, key.events);

        Ok(Some(key))
    }
}

fn epoll_timeout(timeout_ms: i32) -> Result<EpollTimeout> {
    match timeout_ms {
        -1 => Ok(EpollTimeout::NONE),
        0 => Ok(EpollTimeout::ZERO),
        ms if ms > 0 => EpollTimeout::try_from(Duration::from_millis(ms as u64))
            .map_err(|_| SelectorError::InvalidState("timeout is out of range")),
        _ => Err(SelectorError::InvalidState("timeout must be -1, 0 or positive"))
    }
}

/// Returns the pending `SO_ERROR` of `fd`, if it is a socket with an error.
fn socket_error(fd: RawFd) -> Option<Errno> {
    match getsockopt(&unsafe { BorrowedFd::borrow_raw(fd) }, sockopt::SocketError) {
        Ok(0) | Err(_) => None,
        Ok(code) => Some(Errno::from_raw(code))
    }
}
