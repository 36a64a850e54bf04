//! This module is for unix epoll. It provides [`Selector`] and [`UserEvent`].

pub(crate) mod check_error;
pub(crate) mod process;
pub(crate) mod signal;
pub(crate) mod timer;
pub mod selector;
pub mod user_event;
mod wait;

pub use selector::*;
pub use signal::signals_supported;
pub use user_event::*;
