/// The initial number of slots in the descriptor table.
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

/// Configuration of a [`Selector`](crate::Selector).
///
/// ```
/// use selector::{Selector, SelectorCfg};
///
/// let cfg = SelectorCfg::default().with_initial_capacity(64);
/// let selector = Selector::<()>::with_cfg(cfg).unwrap();
/// assert!(selector.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorCfg {
    initial_capacity: usize,
    max_descriptors: Option<usize>
}

impl SelectorCfg {
    pub const fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_descriptors: None
        }
    }

    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// Returns the configured descriptor ceiling.
    /// `None` means the hard `RLIMIT_NOFILE` of the process, queried at creation and on every table growth.
    pub fn max_descriptors(&self) -> Option<usize> {
        self.max_descriptors
    }

    pub const fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub const fn with_max_descriptors(mut self, max_descriptors: usize) -> Self {
        self.max_descriptors = Some(max_descriptors);
        self
    }
}

impl Default for SelectorCfg {
    fn default() -> Self {
        SelectorCfg::default()
    }
}
