//! Scoped result iterators for range and history scans.
//!
//! A scan hands out a [`ResultsIterator`]; its resources are released exactly
//! once, either by [`ResultsIterator::close`] or when the iterator is dropped.
//! Callers can bail out with `?` mid-scan without leaking the scan.

use std::fmt;

use crate::LedgerError;

type Items<'a, T> = Box<dyn Iterator<Item = Result<T, LedgerError>> + 'a>;
type Release<'a> = Box<dyn FnOnce() + 'a>;

/// Finite, non-restartable sequence of scan results.
pub struct ResultsIterator<'a, T> {
    label: &'static str,
    items: Option<Items<'a, T>>,
    release: Option<Release<'a>>,
}

impl<'a, T> ResultsIterator<'a, T> {
    pub fn new(label: &'static str, items: impl Iterator<Item = Result<T, LedgerError>> + 'a) -> Self {
        Self {
            label,
            items: Some(Box::new(items)),
            release: None,
        }
    }

    /// Register a hook that runs once when the scan is released.
    #[must_use]
    pub fn on_release(mut self, release: impl FnOnce() + 'a) -> Self {
        self.release = Some(Box::new(release));
        self
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.items.is_none()
    }

    /// Release the scan before it is exhausted.
    pub fn close(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if self.items.take().is_some() {
            tracing::trace!(scan = self.label, "Results iterator released");
        }
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl<T> Iterator for ResultsIterator<'_, T> {
    type Item = Result<T, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.as_mut()?.next()
    }
}

impl<T> Drop for ResultsIterator<'_, T> {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl<T> fmt::Debug for ResultsIterator<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultsIterator")
            .field("label", &self.label)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
