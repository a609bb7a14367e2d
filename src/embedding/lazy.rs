//! Once-only, fallible model initialisation.

use std::sync::OnceLock;

use parking_lot::Mutex;

/// A model resource loaded on first use.
///
/// Concurrent first callers serialize on one loader; everyone after that reads
/// the loaded value without locking. A failed load is not remembered, so the
/// next call tries again.
pub struct LazyModel<T> {
    cell: OnceLock<T>,
    init: Mutex<()>,
}

impl<T> Default for LazyModel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LazyModel<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// Returns the loaded value, running `load` if nothing is loaded yet.
    pub fn get_or_try_load<E, F>(&self, load: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }

        let _guard = self.init.lock();
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }

        let value = load()?;
        Ok(self.cell.get_or_init(|| value))
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}
