//! Gameplay datagram handlers: position sync, generic actions, latency ping.
//! All three arrive and answer over the datagram channel.

use chrono::Utc;

use crate::codec;
use crate::dispatch::{Dispatcher, HandlerContext};
use crate::error::HandlerResult;
use crate::handlers::reply_datagram;
use crate::protocol::messages::{
    PingRequest, PlayerAction, PlayerActionBroadcast, PlayerPositionBroadcast,
    PlayerPositionUpdate, PongResponse,
};

pub fn register(dispatcher: &Dispatcher) {
    dispatcher.register::<PlayerPositionUpdate, _, _>("PlayerPositionUpdate", position_update);
    dispatcher.register::<PlayerAction, _, _>("PlayerAction", player_action);
    dispatcher.register::<PingRequest, _, _>("PingRequest", ping);
}

async fn position_update(ctx: HandlerContext, req: PlayerPositionUpdate) -> HandlerResult<()> {
    let Some(accepted) = ctx
        .lobby
        .update_position(ctx.caller, req.sequence, req.position, req.rotation, req.velocity)
        .await
    else {
        return Ok(());
    };
    if !accepted {
        // Stale or duplicate sequence number: dropped silently per the
        // per-player last-seq guard, not an error.
        return Ok(());
    }
    let Some(room_id) = ctx.lobby.player_room(ctx.caller).await else {
        return Ok(());
    };
    let Some(members) = ctx.lobby.room_members(room_id).await else {
        return Ok(());
    };
    let event = PlayerPositionBroadcast {
        player_id: ctx.caller,
        position: req.position,
        rotation: req.rotation,
        velocity: req.velocity,
    };
    let Ok(encoded) = codec::encode_body(&event) else {
        return Ok(());
    };
    for member in members {
        if member == ctx.caller {
            continue;
        }
        ctx.datagram
            .send_to(member, "PlayerPositionBroadcast", &encoded)
            .await;
    }
    Ok(())
}

async fn player_action(ctx: HandlerContext, req: PlayerAction) -> HandlerResult<()> {
    ctx.lobby.record_action_stat(ctx.caller, &req.action).await;
    let Some(room_id) = ctx.lobby.player_room(ctx.caller).await else {
        return Ok(());
    };
    let Some(members) = ctx.lobby.room_members(room_id).await else {
        return Ok(());
    };
    let event = PlayerActionBroadcast {
        player_id: ctx.caller,
        action: req.action,
        payload: req.payload,
    };
    let Ok(encoded) = codec::encode_body(&event) else {
        return Ok(());
    };
    for member in members {
        if member == ctx.caller {
            continue;
        }
        ctx.datagram
            .send_to(member, "PlayerActionBroadcast", &encoded)
            .await;
    }
    Ok(())
}

async fn ping(ctx: HandlerContext, req: PingRequest) -> HandlerResult<()> {
    let response = PongResponse {
        client_ts: req.client_ts,
        server_ts: Utc::now().timestamp_millis(),
    };
    reply_datagram(&ctx, ctx.caller, "PongResponse", &response).await;
    Ok(())
}
