pub mod epoll;
pub(crate) mod fd;
