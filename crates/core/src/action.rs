//! Actions returned by the consensus engine.

use crate::{ConsensusEvent, OutboundMessage};

/// Work the runner performs on behalf of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send a message to every configured peer (best effort).
    Broadcast(OutboundMessage),

    /// Notify observers.
    Emit(ConsensusEvent),
}

/// The result of an engine operation plus the actions it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handled<T> {
    /// What the engine decided.
    pub outcome: T,
    /// Side effects for the runner to execute, in order.
    pub actions: Vec<Action>,
}

impl<T> Handled<T> {
    /// An outcome with no side effects.
    pub fn quiet(outcome: T) -> Self {
        Self {
            outcome,
            actions: Vec::new(),
        }
    }

    /// An outcome with side effects.
    pub fn new(outcome: T, actions: Vec<Action>) -> Self {
        Self { outcome, actions }
    }

    /// Iterate over the broadcast messages among the actions.
    pub fn broadcasts(&self) -> impl Iterator<Item = &OutboundMessage> {
        self.actions.iter().filter_map(|action| match action {
            Action::Broadcast(message) => Some(message),
            Action::Emit(_) => None,
        })
    }

    /// Iterate over the emitted events among the actions.
    pub fn events(&self) -> impl Iterator<Item = &ConsensusEvent> {
        self.actions.iter().filter_map(|action| match action {
            Action::Emit(event) => Some(event),
            Action::Broadcast(_) => None,
        })
    }
}
