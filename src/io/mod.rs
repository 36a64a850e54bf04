pub mod error;
pub mod event;
pub(crate) mod source;
pub(crate) mod table;
pub mod sys;

pub use error::*;
pub use event::*;
pub use sys::unix::epoll::{signals_supported, Selector, UserEvent, MAX_EVENTS};
