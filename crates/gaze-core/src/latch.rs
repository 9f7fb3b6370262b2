//! Edge-triggered problem reporting.
//!
//! Per-tick code paths hit the same missing collaborator every frame. The
//! latch remembers the last reported condition so each one is logged once,
//! and again only after the condition has changed or cleared.

/// Remembers the last reported condition of type `P`.
#[derive(Debug)]
pub struct ProblemLatch<P> {
    current: Option<P>,
}

impl<P> Default for ProblemLatch<P> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<P: PartialEq + Copy> ProblemLatch<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `problem`. Returns true when it differs from the last one
    /// reported, meaning the caller should log it.
    pub fn raise(&mut self, problem: P) -> bool {
        if self.current == Some(problem) {
            return false;
        }
        self.current = Some(problem);
        true
    }

    /// The condition went away. Returns true if something was latched.
    pub fn clear(&mut self) -> bool {
        self.current.take().is_some()
    }

    pub fn current(&self) -> Option<P> {
        self.current
    }
}
