//! Linear undo/redo timeline over full raster snapshots.
//!
//! The cursor points at the entry that matches the current raster. Pushing
//! while the cursor is behind the end discards everything after it, so the
//! timeline never branches. Every entry is a whole-canvas copy; memory grows
//! with `width * height * 4 * len`, which is what `limit` is for.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

/// Snapshot timeline with a cursor.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<T>,
    cursor: Option<usize>,
    limit: Option<usize>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self { entries: Vec::new(), cursor: None, limit: None }
    }
}

impl<T> History<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeline that keeps at most `limit` entries, evicting the oldest.
    ///
    /// A limit of zero is treated as one: the current state always stays.
    #[must_use]
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self { limit: limit.map(|n| n.max(1)), ..Self::default() }
    }

    /// Record a new state after the cursor and move onto it.
    pub fn push(&mut self, entry: T) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);
        self.entries.push(entry);

        let excess = self.limit.map_or(0, |limit| self.entries.len().saturating_sub(limit));
        if excess > 0 {
            self.entries.drain(..excess);
        }
        self.cursor = self.entries.len().checked_sub(1);
    }

    /// Step back and return the state to restore, or `None` at the start.
    pub fn undo(&mut self) -> Option<&T> {
        let target = self.cursor?.checked_sub(1)?;
        self.cursor = Some(target);
        self.entries.get(target)
    }

    /// Step forward and return the state to restore, or `None` at the end.
    pub fn redo(&mut self) -> Option<&T> {
        let target = self.redo_target()?;
        self.cursor = Some(target);
        self.entries.get(target)
    }

    /// Step back only if `apply` accepts the earlier state.
    ///
    /// Returns `Ok(false)` at the start of the timeline.
    ///
    /// # Errors
    ///
    /// Propagates the error from `apply`; the cursor is left where it was.
    pub fn undo_with<E, F>(&mut self, apply: F) -> Result<bool, E>
    where
        F: FnOnce(&T) -> Result<(), E>,
    {
        let Some(target) = self.cursor.and_then(|c| c.checked_sub(1)) else {
            return Ok(false);
        };
        self.step_to(target, apply)
    }

    /// Step forward only if `apply` accepts the later state.
    ///
    /// Returns `Ok(false)` at the end of the timeline.
    ///
    /// # Errors
    ///
    /// Propagates the error from `apply`; the cursor is left where it was.
    pub fn redo_with<E, F>(&mut self, apply: F) -> Result<bool, E>
    where
        F: FnOnce(&T) -> Result<(), E>,
    {
        let Some(target) = self.redo_target() else {
            return Ok(false);
        };
        self.step_to(target, apply)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.redo_target().is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the current entry; `None` only when empty.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The entry matching the current raster.
    #[must_use]
    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.cursor?)
    }

    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Drop every entry. The limit is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    fn redo_target(&self) -> Option<usize> {
        let next = self.cursor? + 1;
        (next < self.entries.len()).then_some(next)
    }

    fn step_to<E, F>(&mut self, target: usize, apply: F) -> Result<bool, E>
    where
        F: FnOnce(&T) -> Result<(), E>,
    {
        let Some(entry) = self.entries.get(target) else {
            return Ok(false);
        };
        apply(entry)?;
        self.cursor = Some(target);
        Ok(true)
    }
}
