//! Admin-initiated actions: kick, ban, unban, mute, unmute, server-wide
//! broadcast, and forced room closure. Each request carries its own
//! `admin_token`; [`AdminService::authorize`] turns that into an
//! [`crate::admin::AdminPrincipal`] before the underlying action runs.

use crate::dispatch::{Dispatcher, HandlerContext};
use crate::error::HandlerResult;
use crate::handlers::reply_reliable;
use crate::protocol::messages::{
    Ack, AdminResponse, BanPlayer, CloseRoom, KickPlayer, MutePlayer, ServerBroadcast,
    ServerBroadcastMessage, UnbanPlayer, UnmutePlayer,
};

pub fn register(dispatcher: &Dispatcher) {
    dispatcher.register::<KickPlayer, _, _>("KickPlayer", kick_player);
    dispatcher.register::<BanPlayer, _, _>("BanPlayer", ban_player);
    dispatcher.register::<UnbanPlayer, _, _>("UnbanPlayer", unban_player);
    dispatcher.register::<MutePlayer, _, _>("MutePlayer", mute_player);
    dispatcher.register::<UnmutePlayer, _, _>("UnmutePlayer", unmute_player);
    dispatcher.register::<ServerBroadcast, _, _>("ServerBroadcast", server_broadcast);
    dispatcher.register::<CloseRoom, _, _>("CloseRoom", close_room);
}

async fn kick_player(ctx: HandlerContext, req: KickPlayer) -> HandlerResult<()> {
    let caller = ctx.admin.authorize(&req.admin_token);
    let result = ctx.admin.kick(caller, req.target).await;
    reply(&ctx, result);
    Ok(())
}

async fn ban_player(ctx: HandlerContext, req: BanPlayer) -> HandlerResult<()> {
    let caller = ctx.admin.authorize(&req.admin_token);
    let result = ctx.admin.ban(caller, req.target, req.reason).await;
    reply(&ctx, result);
    Ok(())
}

async fn unban_player(ctx: HandlerContext, req: UnbanPlayer) -> HandlerResult<()> {
    let caller = ctx.admin.authorize(&req.admin_token);
    let result = ctx.admin.unban(caller, req.target).await;
    reply(&ctx, result);
    Ok(())
}

async fn mute_player(ctx: HandlerContext, req: MutePlayer) -> HandlerResult<()> {
    let caller = ctx.admin.authorize(&req.admin_token);
    let result = ctx.admin.mute(caller, req.target).await;
    reply(&ctx, result);
    Ok(())
}

async fn unmute_player(ctx: HandlerContext, req: UnmutePlayer) -> HandlerResult<()> {
    let caller = ctx.admin.authorize(&req.admin_token);
    let result = ctx.admin.unmute(caller, req.target).await;
    reply(&ctx, result);
    Ok(())
}

async fn server_broadcast(ctx: HandlerContext, req: ServerBroadcast) -> HandlerResult<()> {
    let caller = ctx.admin.authorize(&req.admin_token);
    let result = if caller.is_admin {
        ctx.lobby
            .broadcast_to_all("ServerBroadcastMessage", &ServerBroadcastMessage { text: req.text });
        Ok(())
    } else {
        Err(crate::error::ErrorKind::Unauthorized)
    };
    reply(&ctx, result);
    Ok(())
}

async fn close_room(ctx: HandlerContext, req: CloseRoom) -> HandlerResult<()> {
    let caller = ctx.admin.authorize(&req.admin_token);
    let result = ctx.admin.close_room(caller, req.room_id).await;
    reply(&ctx, result);
    Ok(())
}

fn reply(ctx: &HandlerContext, result: Result<(), crate::error::ErrorKind>) {
    let ack = result.map_or_else(Ack::err, |()| Ack::ok());
    reply_reliable(ctx, "AdminResponse", &AdminResponse { ack });
}
