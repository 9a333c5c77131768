//! Ordered strategy chains.
//!
//! Each extraction step that has fallbacks is a list of named strategies
//! tried top to bottom. The fallback trigger is explicit: a strategy that
//! errors or yields nothing hands over to the next one; the first strategy
//! that yields at least one item wins and the rest are never run.

use tracing::{debug, warn};

use crate::error::ParseResult;

/// One heuristic procedure for recovering items from unreliable input.
pub trait Strategy<I: ?Sized> {
    type Output;

    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    /// Recover zero or more items. Errors are scoped to this strategy.
    fn extract(&self, input: &I) -> ParseResult<Vec<Self::Output>>;
}

/// Result of running a chain.
#[derive(Debug)]
pub struct ChainOutcome<T> {
    /// Name of the winning strategy, `None` if every strategy came up empty.
    pub strategy: Option<&'static str>,
    pub items: Vec<T>,
}

impl<T> ChainOutcome<T> {
    fn exhausted() -> Self {
        Self {
            strategy: None,
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Run strategies in order and keep the output of the first productive one.
pub fn first_productive<I: ?Sized, T>(
    strategies: &[&dyn Strategy<I, Output = T>],
    input: &I,
) -> ChainOutcome<T> {
    for strategy in strategies {
        match strategy.extract(input) {
            Ok(items) if !items.is_empty() => {
                debug!(strategy = strategy.name(), count = items.len(), "Strategy produced items");
                return ChainOutcome {
                    strategy: Some(strategy.name()),
                    items,
                };
            }
            Ok(_) => {
                debug!(strategy = strategy.name(), "Strategy yielded nothing, falling through");
            }
            Err(e) => {
                warn!(strategy = strategy.name(), error = %e, "Strategy failed, falling through");
            }
        }
    }

    ChainOutcome::exhausted()
}
