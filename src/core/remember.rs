use tracing::trace;

/// Value retained across frames and rebuilt only when its construction
/// arguments change (compared by value, never by identity).
#[derive(Debug, Clone)]
pub struct Remembered<A, T> {
    slot: Option<(A, T)>,
}

impl<A, T> Default for Remembered<A, T> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<A: PartialEq, T> Remembered<A, T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the retained value, rebuilding it first when `args` differ from
    /// the arguments it was built with.
    pub fn get_or_rebuild(&mut self, args: A, build: impl FnOnce(&A) -> T) -> &mut T {
        let stale = self
            .slot
            .as_ref()
            .is_none_or(|(current, _)| *current != args);
        if stale {
            trace!(rebuilt = self.slot.is_some(), "rebuilding remembered value");
            self.slot = None;
        }
        let (_, value) = self.slot.get_or_insert_with(|| {
            let value = build(&args);
            (args, value)
        });
        value
    }

    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.slot.as_ref().map(|(_, value)| value)
    }

    #[must_use]
    pub fn args(&self) -> Option<&A> {
        self.slot.as_ref().map(|(args, _)| args)
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }
}
