use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use nix::errno::Errno;
use nix::sys::epoll::{Epoll, EpollCreateFlags, EpollEvent, EpollFlags};
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use crate::cfg::SelectorCfg;
use crate::io::source::{Entry, Source};
use crate::io::sys::unix::epoll::process::open_process;
use crate::io::sys::unix::epoll::signal::{create_signal_fd, unblock_signal};
use crate::io::sys::unix::epoll::timer::create_timer;
use crate::io::sys::unix::epoll::UserEvent;
use crate::io::table::DescriptorTable;
use crate::io::{EventFlags, Result, SelectorError};
use crate::utils::descriptor_limit;

/// The maximum number of [`ReadyKey`](crate::ReadyKey)s a single wait returns.
/// Callers with more ready sources must wait again.
pub const MAX_EVENTS: usize = 64;

/// An epoll selector over handles, timers, signals, child processes and [`UserEvent`]s.
///
/// Every registered source is addressed by its raw descriptor and owns a payload `T`.
///
/// # Ownership
///
/// The selector closes the descriptors it creates (timers, signalfds, pidfds) on
/// [`unregister`](Self::unregister) and on drop. It never closes handle descriptors or the
/// descriptor of a [`UserEvent`].
///
/// # Threads
///
/// The selector is driven through `&mut self` by one thread. Move it to a dedicated poller thread
/// if you need one; other threads wake it with a registered [`UserEvent`].
pub struct Selector<T> {
    pub(super) epoll: Epoll,
    pub(super) table: DescriptorTable<T>,
    /// Entries with live kernel interest.
    pub(super) count: usize,
    pub(super) events: [EpollEvent; MAX_EVENTS],
    /// Signals this selector blocked itself and has to unblock once unused.
    blocked: Vec<Signal>,
    limit: usize,
    cfg: SelectorCfg
}

impl<T> Selector<T> {
    /// Creates a selector with the default [`SelectorCfg`].
    pub fn new() -> Result<Self> {
        Self::with_cfg(SelectorCfg::default())
    }

    /// Creates a selector.
    ///
    /// # Errors
    ///
    /// [`SelectorError::Resource`] if the kernel refuses to create the epoll instance
    /// or the descriptor limit cannot be queried.
    pub fn with_cfg(cfg: SelectorCfg) -> Result<Self> {
        let limit = match cfg.max_descriptors() {
            Some(limit) => limit,
            None => descriptor_limit()?
        };
        let epoll = Epoll::new(EpollCreateFlags::EPOLL_CLOEXEC).map_err(SelectorError::Resource)?;
        log::debug!("created selector {} (descriptor limit: {})", epoll.0.as_raw_fd(), limit);

        Ok(Selector {
            epoll,
            table: DescriptorTable::new(cfg.initial_capacity(), limit),
            count: 0,
            events: [EpollEvent::empty(); MAX_EVENTS],
            blocked: Vec::new(),
            limit,
            cfg
        })
    }

    /// Closes the epoll instance and every descriptor the selector created. Same as dropping it.
    ///
    /// Signals blocked by signal registrations stay blocked.
    pub fn close(self) {
        log::debug!("closing selector {} with {} live sources", self.epoll.0.as_raw_fd(), self.count);
    }

    /// Returns `true` if no registered source has live kernel interest.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the number of sources with live kernel interest. Finished one-shot sources and
    /// handles with empty interest are registered but not counted.
    #[inline(always)]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns the current number of slots in the descriptor table.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Registers a caller-owned descriptor with `interest` (a subset of `READ | WRITE`).
    /// Peer hang-up is always monitored.
    ///
    /// If `fd` is already registered as a handle, its interest and payload are replaced.
    ///
    /// # Errors
    ///
    /// * [`SelectorError::InvalidState`] if `interest` has flags other than `READ`/`WRITE`,
    ///   or `fd` is registered as another kind of source.
    /// * [`SelectorError::Limit`] if `fd` is beyond the descriptor limit.
    /// * [`SelectorError::Os`] if epoll rejects `fd`.
    pub fn register_handle(&mut self, fd: RawFd, interest: EventFlags, data: T) -> Result<()> {
        check_interest(interest)?;
        self.reserve(fd)?;

        let live = match self.table.get(fd) {
            None => false,
            Some(entry) => match entry.source {
                Source::Handle => entry.is_live(),
                _ => return Err(SelectorError::InvalidState("descriptor is registered as another source"))
            }
        };
        self.apply_interest(fd, live, interest)?;
        self.table.insert(fd, Entry::new(Source::Handle, interest, data));
        log::debug!("registered handle {} for {:?}", fd, interest);

        Ok(())
    }

    /// Changes the interest of a registered handle.
    ///
    /// Empty interest removes the descriptor from epoll but keeps the registration
    /// (and the payload); non-empty interest adds it back.
    ///
    /// # Errors
    ///
    /// [`SelectorError::InvalidState`] if `fd` is not a registered handle
    /// or `interest` has flags other than `READ`/`WRITE`.
    pub fn update_handle(&mut self, fd: RawFd, interest: EventFlags) -> Result<()> {
        check_interest(interest)?;

        let live = match self.table.get(fd) {
            Some(entry) if matches!(entry.source, Source::Handle) => entry.is_live(),
            Some(_) => return Err(SelectorError::InvalidState("descriptor is not a handle")),
            None => return Err(SelectorError::InvalidState("descriptor is not registered"))
        };
        self.apply_interest(fd, live, interest)?;
        if let Some(entry) = self.table.get_mut(fd) {
            entry.events = interest;
        }
        log::trace!("updated handle {} to {:?}", fd, interest);

        Ok(())
    }

    /// Registers a monotonic timer that fires after `interval_ms` and, unless `oneshot`,
    /// every `interval_ms` after that. Returns the descriptor of the timer.
    ///
    /// A one-shot timer is reported once and then stays registered as finished
    /// until it is [unregistered](Self::unregister).
    pub fn register_timer(&mut self, interval_ms: u64, oneshot: bool, data: T) -> Result<RawFd> {
        let timer = create_timer(interval_ms, oneshot)?;
        let fd = timer.as_fd().as_raw_fd();

        let mut events = EventFlags::TIMER;
        if oneshot {
            events |= EventFlags::ONESHOT;
        }
        self.register_source(fd, Source::Timer(timer), events, data)?;
        log::debug!("registered timer {} ({} ms, oneshot: {})", fd, interval_ms, oneshot);

        Ok(fd)
    }

    /// Blocks `signal` for the calling thread and registers a signalfd for it.
    /// Returns the descriptor of the signalfd.
    ///
    /// Wait on the same thread that registered the signal: a signal directed at the process
    /// may be delivered to any thread that does not block it.
    ///
    /// If the signal was not blocked before, unregistering its last registration unblocks it.
    /// A signal the caller had blocked stays blocked.
    ///
    /// # Errors
    ///
    /// [`SelectorError::Unsupported`] on platforms without signalfd support.
    pub fn register_signal(&mut self, signal: Signal, data: T) -> Result<RawFd> {
        let (signal_fd, blocked) = create_signal_fd(signal)?;
        let fd = signal_fd.as_fd().as_raw_fd();
        if blocked && !self.blocked.contains(&signal) {
            self.blocked.push(signal);
        }

        let source = Source::Signal { fd: signal_fd, signal };
        if let Err(err) = self.register_source(fd, source, EventFlags::SIGNAL, data) {
            self.release_signal(signal);
            return Err(err);
        }
        log::debug!("registered signal {} as {}", signal, fd);

        Ok(fd)
    }

    /// Registers a one-shot source that fires when the child `pid` terminates.
    /// Returns the descriptor of the underlying pidfd.
    ///
    /// The child is not reaped: its exit status is read with `WNOWAIT` and stays
    /// available to [`Child::wait`](std::process::Child::wait) or `waitpid`.
    /// Signal masks are not touched, so any thread may run the wait.
    ///
    /// # Errors
    ///
    /// * [`SelectorError::Unsupported`] on platforms without pidfd support.
    /// * [`SelectorError::Os`] with `ESRCH` if the child is already reaped.
    pub fn register_process(&mut self, pid: Pid, data: T) -> Result<RawFd> {
        let pidfd = open_process(pid)?;
        let fd = pidfd.as_raw_fd();

        self.register_source(fd, Source::Process { fd: pidfd, pid }, EventFlags::PROCESS | EventFlags::ONESHOT, data)?;
        log::debug!("registered process {} as {}", pid, fd);

        Ok(fd)
    }

    /// Registers a [`UserEvent`]. The event keeps owning its descriptor.
    pub fn register_event(&mut self, event: &UserEvent, data: T) -> Result<()> {
        let fd = event.as_raw_fd();
        if self.table.contains(fd) {
            return Err(SelectorError::InvalidState("user event is already registered"));
        }
        self.register_source(fd, Source::User, EventFlags::USER, data)?;
        log::debug!("registered user event {}", fd);

        Ok(())
    }

    /// Removes a registration.
    ///
    /// Handles and user events are only removed from epoll. Timers, signals and processes also
    /// have their descriptor closed. A signal this selector blocked is unblocked once no other
    /// registration of this selector reads it.
    ///
    /// # Errors
    ///
    /// [`SelectorError::InvalidState`] if `fd` is not registered.
    pub fn unregister(&mut self, fd: RawFd) -> Result<()> {
        let entry = self.table.remove(fd).ok_or(SelectorError::InvalidState("descriptor is not registered"))?;
        log::debug!("unregistering {:?} {}", entry.source, fd);

        if entry.is_live() {
            self.count -= 1;
            match self.epoll.delete(unsafe { BorrowedFd::borrow_raw(fd) }) {
                // The descriptor was already closed by its owner, so epoll has forgotten it.
                Ok(()) | Err(Errno::EBADF) | Err(Errno::ENOENT) => {}
                Err(errno) => return Err(SelectorError::Os(errno))
            }
        }

        match entry.source {
            Source::Signal { fd: signal_fd, signal } => {
                drop(signal_fd);
                self.release_signal(signal);
            }
            Source::Timer(_) | Source::Process { .. } | Source::Handle | Source::User => {}
        }

        Ok(())
    }

    /// Removes a registered [`UserEvent`]. The event itself stays open.
    ///
    /// # Errors
    ///
    /// [`SelectorError::InvalidState`] if `event` is not registered with this selector.
    pub fn unregister_event(&mut self, event: &UserEvent) -> Result<()> {
        let fd = event.as_raw_fd();
        match self.table.get(fd) {
            Some(Entry { source: Source::User, .. }) => self.unregister(fd),
            _ => Err(SelectorError::InvalidState("user event is not registered"))
        }
    }

    /// Returns `true` if `fd` is registered (including finished one-shot sources).
    #[inline(always)]
    pub fn contains(&self, fd: RawFd) -> bool {
        self.table.contains(fd)
    }

    /// Returns the payload of `fd`.
    ///
    /// # Panics
    ///
    /// If `fd` is not registered. Use [`with_data`](Self::with_data) to probe.
    #[inline(always)]
    pub fn get_data(&mut self, fd: RawFd) -> &mut T {
        match self.table.get_mut(fd) {
            Some(entry) => &mut entry.data,
            None => panic!("descriptor {} is not registered", fd)
        }
    }

    /// Replaces the payload of `fd`. Returns `false` if `fd` is not registered.
    pub fn set_data(&mut self, fd: RawFd, data: T) -> bool {
        match self.table.get_mut(fd) {
            Some(entry) => {
                entry.data = data;
                true
            }
            None => false
        }
    }

    /// Calls `f` with the payload of `fd` if it is registered.
    pub fn with_data<R>(&mut self, fd: RawFd, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.table.get_mut(fd).map(|entry| f(&mut entry.data))
    }

    /// Calls `f` with the payload of `fd` if it is registered, otherwise calls `otherwise`.
    pub fn with_data_or<R>(
        &mut self,
        fd: RawFd,
        f: impl FnOnce(&mut T) -> R,
        otherwise: impl FnOnce() -> R
    ) -> R {
        match self.table.get_mut(fd) {
            Some(entry) => f(&mut entry.data),
            None => otherwise()
        }
    }

    /// Grows the table for `fd`, re-reading the descriptor limit when it has to grow.
    fn reserve(&mut self, fd: RawFd) -> Result<()> {
        if fd >= 0 && (fd as usize) < self.table.capacity() {
            return Ok(());
        }

        if self.cfg.max_descriptors().is_none() {
            self.limit = descriptor_limit()?;
        }
        self.table.reserve(fd, self.limit)
    }

    /// Adds a selector-created descriptor to epoll and stores its entry.
    pub(super) fn register_source(&mut self, fd: RawFd, source: Source, events: EventFlags, data: T) -> Result<()> {
        self.reserve(fd)?;

        if let Some(stale) = self.table.remove(fd) {
            // The number was reused after its owner closed it without unregistering.
            log::warn!("descriptor {} was still registered as {:?}, dropping it", fd, stale.source);
            if stale.is_live() {
                self.count -= 1;
            }
        }

        self.epoll
            .add(unsafe { BorrowedFd::borrow_raw(fd) }, EpollEvent::new(EpollFlags::EPOLLIN, fd as u64))
            .map_err(SelectorError::Os)?;
        self.count += 1;
        self.table.insert(fd, Entry::new(source, events, data));

        Ok(())
    }

    /// Brings the kernel interest of the handle `fd` from `live` to `interest`.
    fn apply_interest(&mut self, fd: RawFd, live: bool, interest: EventFlags) -> Result<()> {
        let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
        let mut event = EpollEvent::new(handle_flags(interest), fd as u64);

        match (live, interest.is_empty()) {
            (true, true) => {
                self.epoll.delete(borrowed).map_err(SelectorError::Os)?;
                self.count -= 1;
            }
            (false, false) => {
                self.epoll.add(borrowed, event).map_err(SelectorError::Os)?;
                self.count += 1;
            }
            (true, false) => {
                self.epoll.modify(borrowed, &mut event).map_err(SelectorError::Os)?;
            }
            (false, true) => {}
        }

        Ok(())
    }

    /// Unblocks `signal` if this selector blocked it and no registration still reads it.
    fn release_signal(&mut self, signal: Signal) {
        let in_use = self.table.iter().any(|entry| match entry.source {
            Source::Signal { signal: other, .. } => other == signal,
            _ => false
        });
        if in_use {
            return;
        }
        let Some(index) = self.blocked.iter().position(|blocked| *blocked == signal) else {
            return;
        };
        self.blocked.swap_remove(index);

        if let Err(err) = unblock_signal(signal) {
            log::warn!("cannot unblock {}: {}", signal, err);
        }
    }
}

impl<T> AsRawFd for Selector<T> {
    /// Returns the epoll descriptor, for example to register this selector in another one.
    fn as_raw_fd(&self) -> RawFd {
        self.epoll.0.as_raw_fd()
    }
}

impl<T> AsFd for Selector<T> {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.epoll.0.as_fd()
    }
}

#[inline(always)]
fn check_interest(interest: EventFlags) -> Result<()> {
    if EventFlags::INTEREST.contains(interest) {
        Ok(())
    } else {
        Err(SelectorError::InvalidState("handle interest must be a subset of READ | WRITE"))
    }
}

#[inline(always)]
fn handle_flags(interest: EventFlags) -> EpollFlags {
    let mut flags = EpollFlags::EPOLLRDHUP;
    if interest.contains(EventFlags::READ) {
        flags |= EpollFlags::EPOLLIN;
    }
    if interest.contains(EventFlags::WRITE) {
        flags |= EpollFlags::EPOLLOUT;
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::fd::{FromRawFd, OwnedFd};
    use std::os::unix::net::UnixStream;
    use nix::sys::resource::{getrlimit, setrlimit, Resource};
    use nix::sys::signal::SigSet;

    fn assert_count(selector: &Selector<usize>) {
        assert_eq!(selector.count(), selector.table.live());
    }

    #[test]
    fn test_new() {
        let selector = Selector::<()>::new().unwrap();
        assert!(selector.is_empty());
        assert_eq!(selector.count(), 0);
        assert_eq!(selector.capacity(), 1024);
        assert!(selector.as_raw_fd() >= 0);
    }

    #[test]
    fn test_count_follows_live_interest() {
        let mut selector = Selector::new().unwrap();
        let (a, _b) = UnixStream::pair().unwrap();
        let event = UserEvent::new().unwrap();

        selector.register_handle(a.as_raw_fd(), EventFlags::READ, 1).unwrap();
        assert_count(&selector);
        let timer = selector.register_timer(1000, false, 2).unwrap();
        assert_count(&selector);
        selector.register_event(&event, 3).unwrap();
        assert_count(&selector);
        assert_eq!(selector.count(), 3);

        selector.update_handle(a.as_raw_fd(), EventFlags::empty()).unwrap();
        assert_count(&selector);
        assert_eq!(selector.count(), 2);
        assert!(selector.contains(a.as_raw_fd()));

        selector.update_handle(a.as_raw_fd(), EventFlags::READ | EventFlags::WRITE).unwrap();
        assert_count(&selector);
        selector.update_handle(a.as_raw_fd(), EventFlags::WRITE).unwrap();
        assert_count(&selector);
        assert_eq!(selector.count(), 3);

        selector.unregister(timer).unwrap();
        assert_count(&selector);
        selector.unregister_event(&event).unwrap();
        assert_count(&selector);
        selector.unregister(a.as_raw_fd()).unwrap();
        assert_count(&selector);
        assert!(selector.is_empty());
    }

    #[test]
    fn test_register_handle_with_empty_interest() {
        let mut selector = Selector::new().unwrap();
        let (a, _b) = UnixStream::pair().unwrap();

        selector.register_handle(a.as_raw_fd(), EventFlags::empty(), 7).unwrap();
        assert!(selector.contains(a.as_raw_fd()));
        assert!(selector.is_empty());

        selector.update_handle(a.as_raw_fd(), EventFlags::READ).unwrap();
        assert_eq!(selector.count(), 1);
        assert_count(&selector);
    }

    #[test]
    fn test_register_handle_overwrites() {
        let mut selector = Selector::new().unwrap();
        let (a, _b) = UnixStream::pair().unwrap();

        selector.register_handle(a.as_raw_fd(), EventFlags::READ, 1).unwrap();
        selector.register_handle(a.as_raw_fd(), EventFlags::WRITE, 2).unwrap();
        assert_eq!(selector.count(), 1);
        assert_eq!(*selector.get_data(a.as_raw_fd()), 2);

        selector.register_handle(a.as_raw_fd(), EventFlags::empty(), 3).unwrap();
        assert_eq!(selector.count(), 0);
        assert_count(&selector);
    }

    #[test]
    fn test_contract_violations() {
        let mut selector = Selector::new().unwrap();
        let (a, _b) = UnixStream::pair().unwrap();
        let timer = selector.register_timer(1000, false, 0).unwrap();

        assert_eq!(
            selector.update_handle(timer, EventFlags::READ),
            Err(SelectorError::InvalidState("descriptor is not a handle"))
        );
        assert_eq!(
            selector.update_handle(a.as_raw_fd(), EventFlags::READ),
            Err(SelectorError::InvalidState("descriptor is not registered"))
        );
        assert!(matches!(
            selector.register_handle(timer, EventFlags::READ, 0),
            Err(SelectorError::InvalidState(_))
        ));
        assert!(matches!(
            selector.register_handle(a.as_raw_fd(), EventFlags::READ | EventFlags::TIMER, 0),
            Err(SelectorError::InvalidState(_))
        ));
        assert_eq!(
            selector.unregister(a.as_raw_fd()),
            Err(SelectorError::InvalidState("descriptor is not registered"))
        );
        assert!(matches!(selector.register_timer(0, true, 0), Err(SelectorError::InvalidState(_))));
        assert_count(&selector);
    }

    #[test]
    fn test_user_event_registration() {
        let mut selector = Selector::new().unwrap();
        let event = UserEvent::new().unwrap();
        let other = UserEvent::new().unwrap();

        selector.register_event(&event, 1).unwrap();
        assert!(matches!(selector.register_event(&event, 1), Err(SelectorError::InvalidState(_))));
        assert!(matches!(selector.unregister_event(&other), Err(SelectorError::InvalidState(_))));

        selector.unregister_event(&event).unwrap();
        assert!(!selector.contains(event.as_raw_fd()));
        // The event is still usable.
        event.trigger().unwrap();
    }

    #[test]
    fn test_unregister_leaves_handle_open() {
        let mut selector = Selector::new().unwrap();
        let (mut a, _b) = UnixStream::pair().unwrap();

        selector.register_handle(a.as_raw_fd(), EventFlags::READ, 0).unwrap();
        selector.unregister(a.as_raw_fd()).unwrap();

        assert!(!selector.contains(a.as_raw_fd()));
        a.write_all(b"still open").unwrap();
    }

    #[test]
    fn test_data_access() {
        let mut selector = Selector::new().unwrap();
        let (a, _b) = UnixStream::pair().unwrap();
        let fd = a.as_raw_fd();

        assert!(!selector.contains(fd));
        assert!(!selector.set_data(fd, 1));
        assert_eq!(selector.with_data(fd, |data| *data), None);
        assert_eq!(selector.with_data_or(fd, |data| *data, || 100), 100);

        selector.register_handle(fd, EventFlags::READ, 1).unwrap();
        assert!(selector.contains(fd));
        *selector.get_data(fd) += 1;
        assert_eq!(*selector.get_data(fd), 2);

        assert!(selector.set_data(fd, 10));
        assert_eq!(selector.with_data(fd, |data| {
            *data += 1;
            *data
        }), Some(11));
        assert_eq!(selector.with_data_or(fd, |data| *data, || 100), 11);
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn test_get_data_panics_on_free_slot() {
        let mut selector = Selector::<usize>::new().unwrap();
        selector.get_data(3);
    }

    #[test]
    fn test_limit() {
        let mut selector = Selector::with_cfg(SelectorCfg::default().with_max_descriptors(64)).unwrap();
        assert_eq!(selector.capacity(), 64);

        assert_eq!(
            selector.register_handle(100, EventFlags::READ, 0),
            Err(SelectorError::Limit { fd: 100, limit: 64 })
        );
        assert!(selector.is_empty());
    }

    #[test]
    fn test_table_growth_with_2000_handles() {
        const HANDLES: usize = 2000;

        let (soft, hard) = getrlimit(Resource::RLIMIT_NOFILE).unwrap();
        let wanted = (HANDLES as u64 + 512).min(hard as u64);
        if wanted < HANDLES as u64 + 512 {
            eprintln!("skipping: RLIMIT_NOFILE hard limit {} is too low", hard);
            return;
        }
        if (soft as u64) < wanted {
            setrlimit(Resource::RLIMIT_NOFILE, wanted as _, hard).unwrap();
        }

        let (a, _b) = UnixStream::pair().unwrap();
        let fds: Vec<OwnedFd> = (0..HANDLES)
            .map(|_| {
                let fd = unsafe { libc::dup(a.as_raw_fd()) };
                assert!(fd >= 0, "dup failed: {}", Errno::last());
                unsafe { OwnedFd::from_raw_fd(fd) }
            })
            .collect();

        let mut selector = Selector::new().unwrap();
        assert_eq!(selector.capacity(), 1024);
        for (i, fd) in fds.iter().enumerate() {
            selector.register_handle(fd.as_raw_fd(), EventFlags::READ, i).unwrap();
        }

        assert!(selector.capacity() >= 2048);
        assert_eq!(selector.count(), HANDLES);
        for (i, fd) in fds.iter().enumerate() {
            assert!(selector.contains(fd.as_raw_fd()));
            assert_eq!(*selector.get_data(fd.as_raw_fd()), i);
        }

        for fd in &fds {
            selector.unregister(fd.as_raw_fd()).unwrap();
        }
        assert!(selector.is_empty());
    }

    fn is_blocked(signal: Signal) -> bool {
        SigSet::thread_get_mask().unwrap().contains(signal)
    }

    #[test]
    fn test_unregister_unblocks_only_after_last_registration() {
        let mut selector = Selector::new().unwrap();
        assert!(!is_blocked(Signal::SIGURG));

        let first = selector.register_signal(Signal::SIGURG, 1).unwrap();
        let second = selector.register_signal(Signal::SIGURG, 2).unwrap();
        assert!(is_blocked(Signal::SIGURG));

        selector.unregister(first).unwrap();
        assert!(is_blocked(Signal::SIGURG));
        selector.unregister(second).unwrap();
        assert!(!is_blocked(Signal::SIGURG));
    }

    #[test]
    fn test_unregister_keeps_caller_blocked_signal() {
        let mut mask = SigSet::empty();
        mask.add(Signal::SIGWINCH);
        mask.thread_block().unwrap();

        let mut selector = Selector::new().unwrap();
        let fd = selector.register_signal(Signal::SIGWINCH, 0).unwrap();
        selector.unregister(fd).unwrap();
        assert!(is_blocked(Signal::SIGWINCH));

        mask.thread_unblock().unwrap();
    }

    #[test]
    fn test_nested_selector() {
        let mut outer = Selector::new().unwrap();
        let mut inner = Selector::new().unwrap();
        let event = UserEvent::new().unwrap();

        inner.register_event(&event, 1).unwrap();
        outer.register_handle(inner.as_raw_fd(), EventFlags::READ, 2).unwrap();
        event.trigger().unwrap();

        let keys = outer.select(1000).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].fd, inner.as_raw_fd());
        assert!(keys[0].events.contains(EventFlags::READ));

        let keys = inner.select(0).unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].events.contains(EventFlags::USER));

        outer.unregister(inner.as_raw_fd()).unwrap();
        inner.unregister_event(&event).unwrap();
        inner.close();
        outer.close();
    }
}
