use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use crate::error::RoutingError;

/// Bounds of a single search, checked every time a node is taken from the queue
#[derive(Clone, Debug, Default)]
pub struct SearchLimits {
    pub deadline: Option<Instant>,
    pub cancel: Option<Arc<AtomicBool>>,
    pub max_settled_nodes: Option<usize>,
}

impl SearchLimits {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_max_settled_nodes(mut self, max_settled_nodes: usize) -> Self {
        self.max_settled_nodes = Some(max_settled_nodes);
        self
    }

    #[inline]
    pub fn check(&self, settled_nodes: usize) -> Result<(), RoutingError> {
        if let Some(cancel) = &self.cancel {
            if cancel.load(Ordering::Relaxed) {
                return Err(RoutingError::Cancelled);
            }
        }

        if let Some(max) = self.max_settled_nodes {
            if settled_nodes > max {
                return Err(RoutingError::MaxVisitedNodesExceeded(max));
            }
        }

        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(RoutingError::Timeout);
            }
        }

        Ok(())
    }
}
