//! An epoll-backed selector.
//!
//! [`Selector`] multiplexes five kinds of event sources behind one API:
//! caller-owned descriptors, timers, signals, child-process termination and
//! cross-thread [`UserEvent`]s. Every registered source is addressed by its
//! raw descriptor number and carries a user payload of type `T`.
//!
//! ```no_run
//! use selector::{EventFlags, Selector};
//!
//! let mut selector = Selector::<&str>::new().unwrap();
//! let timer = selector.register_timer(50, false, "tick").unwrap();
//! for key in selector.select(-1).unwrap() {
//!     if key.events.contains(EventFlags::TIMER) {
//!         assert_eq!(*selector.get_data(key.fd), "tick");
//!     }
//! }
//! selector.unregister(timer).unwrap();
//! ```

#[cfg(not(any(target_os = "linux", target_os = "android")))]
compile_error!("selector supports only epoll-based platforms (Linux, Android)");

pub mod cfg;
pub mod io;
pub mod utils;

pub use cfg::SelectorCfg;
pub use io::*;
