//! Protocol module: identifiers, wire message bodies, and room state.

pub mod messages;
pub mod room;
pub mod types;

pub use messages::*;
pub use room::{Room, RoomState};
pub use types::{BanRecord, PlayerId, RoomId, RoomSummary, Vec3};
