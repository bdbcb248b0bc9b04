//! Voice relay handlers: positional-gain audio relay and voice state
//! propagation. `AudioPacket` is the only handler that does real per-listener
//! computation; the rest mutate per-player voice flags and fan the update
//! back out unchanged.

use crate::dispatch::{Dispatcher, HandlerContext};
use crate::error::HandlerResult;
use crate::handlers::{reply_datagram, reply_reliable};
use crate::lobby::positional::compute_gain;
use crate::protocol::messages::{
    Ack, AudioDeviceRequest, AudioDeviceResponse, AudioPacket, AudioPacketRelay, PushToTalkState,
    VoiceQualityMetrics, VoiceSettingsUpdate, VoiceStateUpdate,
};

pub fn register(dispatcher: &Dispatcher) {
    dispatcher.register::<AudioPacket, _, _>("AudioPacket", audio_packet);
    dispatcher.register::<VoiceStateUpdate, _, _>("VoiceStateUpdate", voice_state_update);
    dispatcher.register::<PushToTalkState, _, _>("PushToTalkState", push_to_talk);
    dispatcher.register::<VoiceSettingsUpdate, _, _>("VoiceSettingsUpdate", voice_settings);
    dispatcher.register::<VoiceQualityMetrics, _, _>("VoiceQualityMetrics", voice_quality);
    dispatcher.register::<AudioDeviceRequest, _, _>("AudioDeviceRequest", audio_device);
}

async fn audio_packet(ctx: HandlerContext, req: AudioPacket) -> HandlerResult<()> {
    if ctx.lobby.is_muted(ctx.caller).await {
        return Ok(());
    }
    let Some(room_id) = ctx.lobby.player_room(ctx.caller).await else {
        return Ok(());
    };
    let Some(sender_pos) = ctx.lobby.player_position(ctx.caller).await else {
        return Ok(());
    };
    let listeners = ctx.lobby.hearing_members(room_id, ctx.caller).await;
    let (min_distance, max_distance) = {
        let audio = ctx.lobby.audio();
        (audio.min_distance, audio.max_distance)
    };
    for listener in listeners {
        let Some(listener_pos) = ctx.lobby.player_position(listener).await else {
            continue;
        };
        let gain = compute_gain(listener_pos, sender_pos, min_distance, max_distance);
        if gain <= 0.0 {
            continue;
        }
        let relay = AudioPacketRelay {
            player_id: ctx.caller,
            sequence: req.sequence,
            codec: req.codec.clone(),
            samples: req.samples.clone(),
            gain,
        };
        reply_datagram(&ctx, listener, "AudioPacketRelay", &relay).await;
    }
    Ok(())
}

async fn voice_state_update(ctx: HandlerContext, req: VoiceStateUpdate) -> HandlerResult<()> {
    ctx.lobby.mute(ctx.caller, req.muted).await;
    ctx.lobby.set_deafened(ctx.caller, req.deafened).await;
    if let Some(room_id) = ctx.lobby.player_room(ctx.caller).await {
        ctx.lobby
            .broadcast_to_room(room_id, "VoiceStateUpdate", &req, Some(ctx.caller))
            .await;
    }
    Ok(())
}

async fn push_to_talk(ctx: HandlerContext, req: PushToTalkState) -> HandlerResult<()> {
    if let Some(room_id) = ctx.lobby.player_room(ctx.caller).await {
        ctx.lobby
            .broadcast_to_room(room_id, "PushToTalkState", &req, Some(ctx.caller))
            .await;
    }
    Ok(())
}

async fn voice_settings(_ctx: HandlerContext, _req: VoiceSettingsUpdate) -> HandlerResult<()> {
    // Input/output device selection is client-local; nothing here mutates
    // server state, so the request is simply accepted.
    Ok(())
}

async fn voice_quality(_ctx: HandlerContext, _req: VoiceQualityMetrics) -> HandlerResult<()> {
    // Telemetry only; this core does no quality-based adaptation.
    Ok(())
}

async fn audio_device(ctx: HandlerContext, _req: AudioDeviceRequest) -> HandlerResult<()> {
    reply_reliable(
        &ctx,
        "AudioDeviceResponse",
        &AudioDeviceResponse { ack: Ack::ok() },
    );
    Ok(())
}
