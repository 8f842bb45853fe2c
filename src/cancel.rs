//! Cooperative cancellation
//!
//! A run is stopped by flipping a shared flag. Long-running calls take the
//! token explicitly, poll it at well-defined points (leaf admission, ancestor
//! walk step) and report how they finished through [`Outcome`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag.
///
/// Cloning is cheap; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the "not cancelled" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every call holding a clone of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// How a cancellable computation ended.
///
/// A cancelled computation still hands back whatever it produced so far;
/// callers decide whether partial data is usable (it never is for output).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    /// Ran to completion.
    Complete(T),
    /// Stopped early because the token was cancelled.
    Cancelled(T),
}

impl<T> Outcome<T> {
    /// True for [`Outcome::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled(_))
    }

    /// Value of a completed computation, `None` if it was cancelled.
    pub fn complete(self) -> Option<T> {
        match self {
            Outcome::Complete(value) => Some(value),
            Outcome::Cancelled(_) => None,
        }
    }

    /// Unwrap the carried value regardless of how the computation ended.
    pub fn into_inner(self) -> T {
        match self {
            Outcome::Complete(value) | Outcome::Cancelled(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn outcome_keeps_value_either_way() {
        let done = Outcome::Complete(3);
        assert!(!done.is_cancelled());
        assert_eq!(done.complete(), Some(3));

        let stopped = Outcome::Cancelled(3);
        assert!(stopped.is_cancelled());
        assert_eq!(stopped.into_inner(), 3);
        assert_eq!(stopped.complete(), None);
    }
}
