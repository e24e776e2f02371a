//! Core types shared between the consensus engine and its runners.
//!
//! The engine performs no I/O. Every operation returns a list of
//! [`Action`]s which the runner executes: broadcasting to peers and
//! emitting [`ConsensusEvent`]s to observers. Time and signature checks
//! are supplied through the [`Clock`] and [`SignatureVerifier`] traits.

mod action;
mod event;
mod message;
mod traits;

pub use action::{Action, Handled};
pub use event::ConsensusEvent;
pub use message::OutboundMessage;
pub use traits::{Clock, MessageSink, OpaqueSignatures, SignatureVerifier, SystemClock};
