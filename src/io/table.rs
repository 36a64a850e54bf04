//! The descriptor table: entries indexed by raw descriptor number.
//!
//! Lookups on the wait path are a bounds check and an index. Removal leaves
//! a `None` tombstone, so the table never shrinks.

use std::os::fd::RawFd;
use crate::io::source::Entry;
use crate::io::{Result, SelectorError};

pub(crate) struct DescriptorTable<T> {
    slots: Vec<Option<Entry<T>>>
}

impl<T> DescriptorTable<T> {
    /// Creates a table with `capacity` free slots, clamped to `limit`.
    pub(crate) fn new(capacity: usize, limit: usize) -> Self {
        let capacity = capacity.clamp(1, limit.max(1));
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots }
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Makes sure that `fd` fits into the table.
    ///
    /// The table doubles until `fd` fits, but never grows past `limit`.
    ///
    /// # Errors
    ///
    /// [`SelectorError::Limit`] if `fd` is negative or not below `limit`.
    pub(crate) fn reserve(&mut self, fd: RawFd, limit: usize) -> Result<()> {
        if fd < 0 || fd as usize >= limit {
            return Err(SelectorError::Limit { fd, limit });
        }

        let index = fd as usize;
        if index < self.slots.len() {
            return Ok(());
        }

        let mut capacity = self.slots.len().max(1);
        while capacity <= index {
            capacity *= 2;
        }
        let capacity = capacity.min(limit);
        log::debug!("descriptor table grows from {} to {} slots", self.slots.len(), capacity);
        self.slots.resize_with(capacity, || None);

        Ok(())
    }

    #[inline(always)]
    pub(crate) fn get(&self, fd: RawFd) -> Option<&Entry<T>> {
        if fd < 0 {
            return None;
        }
        self.slots.get(fd as usize).and_then(Option::as_ref)
    }

    #[inline(always)]
    pub(crate) fn get_mut(&mut self, fd: RawFd) -> Option<&mut Entry<T>> {
        if fd < 0 {
            return None;
        }
        self.slots.get_mut(fd as usize).and_then(Option::as_mut)
    }

    #[inline(always)]
    pub(crate) fn contains(&self, fd: RawFd) -> bool {
        self.get(fd).is_some()
    }

    /// Stores `entry` at `fd`, returning the previous occupant.
    ///
    /// # Panics
    ///
    /// If `fd` was not [`reserved`](Self::reserve) before.
    pub(crate) fn insert(&mut self, fd: RawFd, entry: Entry<T>) -> Option<Entry<T>> {
        self.slots[fd as usize].replace(entry)
    }

    pub(crate) fn remove(&mut self, fd: RawFd) -> Option<Entry<T>> {
        if fd < 0 {
            return None;
        }
        self.slots.get_mut(fd as usize).and_then(Option::take)
    }

    /// Iterates over occupied slots.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entry<T>> {
        self.slots.iter().flatten()
    }

    #[cfg(test)]
    pub(crate) fn occupied(&self) -> usize {
        self.iter().count()
    }

    /// Returns the number of occupied slots with live kernel interest.
    #[cfg(test)]
    pub(crate) fn live(&self) -> usize {
        self.iter().filter(|entry| entry.is_live()).count()
    }
}
