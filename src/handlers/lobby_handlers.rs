//! Room lifecycle: create, join, leave, ready, start, list — plus the
//! reliable-channel chat relay and heartbeat liveness mark.

use chrono::Utc;

use crate::dispatch::{Dispatcher, HandlerContext};
use crate::error::HandlerResult;
use crate::handlers::reply_reliable;
use crate::protocol::messages::{
    Ack, ChatMessage, ChatMessageBroadcast, CreateRoomRequest, CreateRoomResponse, EndGameRequest,
    EndGameResponse, GetRoomListRequest, GetRoomListResponse, Heartbeat, HeartbeatAck,
    JoinRoomRequest, JoinRoomResponse, LeaveRoomRequest, LeaveRoomResponse, PauseGameRequest,
    PauseGameResponse, PlayerReadyBroadcast, PlayerReadyRequest, PlayerReadyResponse,
    ResumeGameRequest, ResumeGameResponse, StartGameRequest, StartGameResponse,
};
use crate::protocol::room::RoomState;

pub fn register(dispatcher: &Dispatcher) {
    dispatcher.register::<CreateRoomRequest, _, _>("CreateRoomRequest", create_room);
    dispatcher.register::<JoinRoomRequest, _, _>("JoinRoomRequest", join_room);
    dispatcher.register::<LeaveRoomRequest, _, _>("LeaveRoomRequest", leave_room);
    dispatcher.register::<GetRoomListRequest, _, _>("GetRoomListRequest", get_room_list);
    dispatcher.register::<PlayerReadyRequest, _, _>("PlayerReadyRequest", player_ready);
    dispatcher.register::<StartGameRequest, _, _>("StartGameRequest", start_game);
    dispatcher.register::<PauseGameRequest, _, _>("PauseGameRequest", pause_game);
    dispatcher.register::<ResumeGameRequest, _, _>("ResumeGameRequest", resume_game);
    dispatcher.register::<EndGameRequest, _, _>("EndGameRequest", end_game);
    dispatcher.register::<ChatMessage, _, _>("ChatMessage", chat_message);
    dispatcher.register::<Heartbeat, _, _>("Heartbeat", heartbeat);
}

async fn create_room(ctx: HandlerContext, req: CreateRoomRequest) -> HandlerResult<()> {
    let result = ctx
        .lobby
        .create_room(ctx.caller, req.name, req.password, req.max_players, req.late_join)
        .await;
    let response = match result {
        Ok(room_id) => CreateRoomResponse {
            ack: Ack::ok(),
            room_id: Some(room_id),
        },
        Err(kind) => CreateRoomResponse {
            ack: Ack::err(kind),
            room_id: None,
        },
    };
    reply_reliable(&ctx, "CreateRoomResponse", &response);
    Ok(())
}

async fn join_room(ctx: HandlerContext, req: JoinRoomRequest) -> HandlerResult<()> {
    let result = ctx
        .lobby
        .join_room(ctx.caller, req.room_id, req.password.as_deref())
        .await;
    let response = match result {
        Ok(members) => JoinRoomResponse {
            ack: Ack::ok(),
            members,
        },
        Err(kind) => JoinRoomResponse {
            ack: Ack::err(kind),
            members: Vec::new(),
        },
    };
    reply_reliable(&ctx, "JoinRoomResponse", &response);
    Ok(())
}

async fn leave_room(ctx: HandlerContext, req: LeaveRoomRequest) -> HandlerResult<()> {
    let result = ctx.lobby.leave_room(ctx.caller, req.room_id).await;
    let ack = result.map_or_else(Ack::err, |()| Ack::ok());
    reply_reliable(&ctx, "LeaveRoomResponse", &LeaveRoomResponse { ack });
    Ok(())
}

async fn get_room_list(ctx: HandlerContext, _req: GetRoomListRequest) -> HandlerResult<()> {
    let rooms = ctx
        .lobby
        .list_rooms()
        .into_iter()
        .filter(|room| {
            !room.is_private
                && room.player_count < room.max_players
                && room.state != RoomState::InProgress
        })
        .collect();
    reply_reliable(&ctx, "GetRoomListResponse", &GetRoomListResponse { rooms });
    Ok(())
}

async fn player_ready(ctx: HandlerContext, req: PlayerReadyRequest) -> HandlerResult<()> {
    let result = ctx.lobby.set_ready(ctx.caller, req.room_id, req.ready).await;
    let ok = result.is_ok();
    let ack = result.map_or_else(Ack::err, |()| Ack::ok());
    reply_reliable(&ctx, "PlayerReadyResponse", &PlayerReadyResponse { ack });
    if ok {
        let event = PlayerReadyBroadcast {
            room_id: req.room_id,
            player_id: ctx.caller,
            ready: req.ready,
        };
        ctx.lobby
            .broadcast_to_room(req.room_id, "PlayerReadyBroadcast", &event, None)
            .await;
    }
    Ok(())
}

async fn start_game(ctx: HandlerContext, req: StartGameRequest) -> HandlerResult<()> {
    let result = ctx.lobby.start_game(ctx.caller, req.room_id).await;
    let ack = result.map_or_else(Ack::err, |()| Ack::ok());
    reply_reliable(&ctx, "StartGameResponse", &StartGameResponse { ack });
    Ok(())
}

async fn pause_game(ctx: HandlerContext, req: PauseGameRequest) -> HandlerResult<()> {
    let result = ctx.lobby.pause_game(ctx.caller, req.room_id).await;
    let ack = result.map_or_else(Ack::err, |()| Ack::ok());
    reply_reliable(&ctx, "PauseGameResponse", &PauseGameResponse { ack });
    Ok(())
}

async fn resume_game(ctx: HandlerContext, req: ResumeGameRequest) -> HandlerResult<()> {
    let result = ctx.lobby.resume_game(ctx.caller, req.room_id).await;
    let ack = result.map_or_else(Ack::err, |()| Ack::ok());
    reply_reliable(&ctx, "ResumeGameResponse", &ResumeGameResponse { ack });
    Ok(())
}

async fn end_game(ctx: HandlerContext, req: EndGameRequest) -> HandlerResult<()> {
    let result = ctx.lobby.end_game(ctx.caller, req.room_id).await;
    let ack = result.map_or_else(Ack::err, |()| Ack::ok());
    reply_reliable(&ctx, "EndGameResponse", &EndGameResponse { ack });
    Ok(())
}

async fn chat_message(ctx: HandlerContext, req: ChatMessage) -> HandlerResult<()> {
    let event = ChatMessageBroadcast {
        room_id: req.room_id,
        player_id: ctx.caller,
        text: req.text,
        server_timestamp: Utc::now(),
    };
    ctx.lobby
        .broadcast_to_room(req.room_id, "ChatMessageBroadcast", &event, None)
        .await;
    Ok(())
}

async fn heartbeat(ctx: HandlerContext, _req: Heartbeat) -> HandlerResult<()> {
    if let Some(session) = ctx.lobby.session(ctx.caller) {
        session.touch();
    }
    reply_reliable(&ctx, "HeartbeatAck", &HeartbeatAck);
    Ok(())
}
