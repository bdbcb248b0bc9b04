//! Handler catalogue: one file per concern, each registering its message ids
//! against the shared [`Dispatcher`] at startup. Handlers never return a
//! value to the caller directly — they answer by queuing a reply on the
//! relevant channel themselves, since a request and its response don't
//! always travel the same direction (e.g. a join broadcasts to others too).

pub mod admin_handlers;
pub mod gameplay_handlers;
pub mod lobby_handlers;
pub mod voice_handlers;

use serde::Serialize;
use tracing::debug;

use crate::codec;
use crate::dispatch::{Dispatcher, HandlerContext};
use crate::protocol::types::PlayerId;

/// Register every handler in the catalogue. Called once at startup before
/// either transport listener starts accepting connections.
pub fn register_all(dispatcher: &Dispatcher) {
    lobby_handlers::register(dispatcher);
    gameplay_handlers::register(dispatcher);
    voice_handlers::register(dispatcher);
    admin_handlers::register(dispatcher);
}

/// Encode `body` under `id` and queue it on the caller's reliable channel.
pub(crate) fn reply_reliable<T: Serialize>(ctx: &HandlerContext, id: &'static str, body: &T) {
    let Ok(encoded) = codec::encode_body(body) else {
        debug!(%id, "failed to encode reliable reply");
        return;
    };
    let frame = codec::encode_reliable_frame(id, &encoded);
    if let Some(session) = ctx.lobby.session(ctx.caller) {
        session.send_reliable(frame);
    }
}

/// Encode `body` under `id` and send it to `target`'s last-known datagram
/// peer address.
pub(crate) async fn reply_datagram<T: Serialize>(
    ctx: &HandlerContext,
    target: PlayerId,
    id: &'static str,
    body: &T,
) {
    let Ok(encoded) = codec::encode_body(body) else {
        debug!(%id, "failed to encode datagram reply");
        return;
    };
    ctx.datagram.send_to(target, id, &encoded).await;
}
