//! The in-flight resolution stack.

use parking_lot::Mutex;

use crate::id::ServiceId;

/// Ids currently under construction, outermost first.
///
/// Entries are pushed by [`enter`](Self::enter) and popped when the
/// returned [`Frame`] drops, so a failing construction never leaves its id
/// behind.
#[derive(Debug, Default)]
pub struct ResolutionStack {
    frames: Mutex<Vec<ServiceId>>,
}

impl ResolutionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &ServiceId) -> bool {
        self.frames.lock().contains(id)
    }

    /// Marks `id` as under construction until the frame is dropped.
    #[must_use = "the id is popped as soon as the frame is dropped"]
    pub fn enter(&self, id: &ServiceId) -> Frame<'_> {
        self.frames.lock().push(id.clone());
        Frame { stack: self }
    }

    pub fn depth(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn snapshot(&self) -> Vec<ServiceId> {
        self.frames.lock().clone()
    }

    /// The loop closed by requesting `id` again: the stack from the first
    /// occurrence of `id` on, followed by `id`.
    pub fn cycle(&self, id: &ServiceId) -> Vec<ServiceId> {
        let frames = self.frames.lock();
        let start = frames.iter().position(|frame| frame == id).unwrap_or(0);

        let mut chain = frames[start..].to_vec();
        chain.push(id.clone());
        chain
    }
}

/// Pops its id from the [`ResolutionStack`] on drop.
#[derive(Debug)]
pub struct Frame<'a> {
    stack: &'a ResolutionStack,
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        self.stack.frames.lock().pop();
    }
}
