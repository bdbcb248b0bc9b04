//! Fan-out helpers for pushing a reliable-channel message to many sessions.

use std::collections::HashSet;

use bytes::Bytes;
use dashmap::DashMap;
use tracing::debug;

use crate::codec;
use crate::protocol::types::PlayerId;
use crate::session::Session;
use std::sync::Arc;

/// Encode `body` under `message_id` once and push it to every member of
/// `targets`, skipping `exclude` if given. Returns the number of sessions the
/// frame was actually queued to.
pub fn broadcast_to<T: serde::Serialize>(
    sessions: &DashMap<PlayerId, Arc<Session>>,
    targets: &HashSet<PlayerId>,
    exclude: Option<PlayerId>,
    message_id: &str,
    body: &T,
) -> usize {
    let encoded = match codec::encode_body(body) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(%message_id, error = %err, "failed to encode broadcast body");
            return 0;
        }
    };
    let frame: Bytes = codec::encode_reliable_frame(message_id, &encoded);

    let mut delivered = 0;
    for player_id in targets {
        if Some(*player_id) == exclude {
            continue;
        }
        if let Some(session) = sessions.get(player_id) {
            if session.send_reliable(frame.clone()) {
                delivered += 1;
            }
        }
    }
    delivered
}
