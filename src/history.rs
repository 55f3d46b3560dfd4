use crate::pixel_buffer::PixelBuffer;

/// Snapshots kept before the oldest one is dropped. Full-buffer snapshots
/// are memory-heavy, so the stack is bounded.
pub const MAX_DEPTH: usize = 64;

/// Snapshot-based undo/redo over whole pixel buffers.
///
/// Every entry is an independent deep copy; nothing on either stack aliases
/// the live canvas. Undo and redo move buffers by ownership: the installed
/// snapshot leaves its stack, and the displaced live buffer lands on the
/// opposite stack as a fresh copy.
pub struct History {
    undo_stack: Vec<PixelBuffer>,
    redo_stack: Vec<PixelBuffer>,
}

impl History {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Captures the live buffer onto the undo stack and clears redo.
    /// Called on pointer press, before the edit mutates anything.
    pub fn push_snapshot(&mut self, live: &PixelBuffer) {
        if self.undo_stack.len() >= MAX_DEPTH {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(live.clone());
        self.redo_stack.clear();
    }

    /// Swaps the live buffer for the newest undo snapshot. Returns false on
    /// an empty stack (a no-op, not an error).
    pub fn undo(&mut self, live: &mut PixelBuffer) -> bool {
        match self.undo_stack.pop() {
            Some(snapshot) => {
                self.redo_stack.push(live.clone());
                *live = snapshot;
                true
            }
            None => false,
        }
    }

    /// Symmetric to [`undo`](Self::undo).
    pub fn redo(&mut self, live: &mut PixelBuffer) -> bool {
        match self.redo_stack.pop() {
            Some(snapshot) => {
                self.undo_stack.push(live.clone());
                *live = snapshot;
                true
            }
            None => false,
        }
    }

    /// Restores the newest undo snapshot without recording anything on the
    /// redo stack. This backs Escape during an active interaction:
    /// cancellation is not a historical event.
    pub fn restore_last(&mut self, live: &mut PixelBuffer) -> bool {
        match self.undo_stack.pop() {
            Some(snapshot) => {
                *live = snapshot;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Drops both stacks. Used by New and Open.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
