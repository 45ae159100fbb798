//! Generation tokens for sessions
//!
//! Every session gets a token when its creation is dispatched. Background
//! results carry the token back and are dropped unless it is still current.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionToken(u64);

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Issues tokens and remembers which one is live
#[derive(Debug, Default)]
pub struct TokenSource {
    generation: u64,
    current: Option<SessionToken>,
}

impl TokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation; any earlier token stops being current
    pub fn issue(&mut self) -> SessionToken {
        self.generation += 1;
        let token = SessionToken(self.generation);
        self.current = Some(token);
        token
    }

    /// Drop the live token without issuing another
    pub fn invalidate(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<SessionToken> {
        self.current
    }

    pub fn is_current(&self, token: SessionToken) -> bool {
        self.current == Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_never_reused() {
        let mut source = TokenSource::new();
        let first = source.issue();
        let second = source.issue();
        assert_ne!(first, second);
        assert!(!source.is_current(first));
        assert!(source.is_current(second));
    }

    #[test]
    fn test_invalidate_clears_current() {
        let mut source = TokenSource::new();
        let token = source.issue();
        source.invalidate();
        assert!(!source.is_current(token));
        assert_eq!(source.current(), None);

        let next = source.issue();
        assert_ne!(token, next);
    }
}
