#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::similar_names
)]

//! # Muster Hub
//!
//! A dual-transport (TCP reliable + UDP datagram) real-time multiplayer
//! lobby and scheduler server: rooms, positional voice, admin moderation,
//! and a due-time scheduler for recurring server-side jobs.

/// Admin-principal authorization, kick/ban/mute, and forced room closure.
pub mod admin;

/// Wire framing and body encoding shared by both transports.
pub mod codec;

/// Server configuration, layered loading, and validation.
pub mod config;

/// Id → handler registry and the context every handler receives.
pub mod dispatch;

/// Known error kinds and the `Ack` response envelope.
pub mod error;

/// Request handlers, one file per concern, registered against the dispatcher.
pub mod handlers;

/// Room and player registries plus the operations handlers call into.
pub mod lobby;

/// Structured logging configuration.
pub mod logging;

/// Process-wide atomic counters.
pub mod metrics;

/// In-lobby player record and its state machine.
pub mod player;

/// Wire message bodies, identifiers, and room state.
pub mod protocol;

/// Due-time and recurring job scheduler.
pub mod scheduler;

/// Main server orchestration: wiring, transport startup, cleanup sweep.
pub mod server;

/// Per-connection session handle shared between the read and write halves.
pub mod session;

/// Persisted key/value storage, used only for ban records.
pub mod store;

/// Reliable and datagram transport listeners.
pub mod transport;
