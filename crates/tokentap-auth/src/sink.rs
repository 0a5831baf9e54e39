//! Where obtained tokens go.

use crate::tokens::TokenSet;

/// Receives the token payload of a successful flow.
///
/// Delivery happens before the browser gets its response and before the
/// run shuts down, so a sink sees every successful result exactly once.
pub trait TokenSink: Send + Sync {
    /// Hand over the tokens of a completed grant.
    fn deliver(&self, tokens: &TokenSet);
}

impl<F> TokenSink for F
where
    F: Fn(&TokenSet) + Send + Sync,
{
    fn deliver(&self, tokens: &TokenSet) {
        (self)(tokens)
    }
}
