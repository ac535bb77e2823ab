//! `WorldRoom`: the per-world actor. One `tokio` task owns one room's
//! state; everything else talks to it through [`WorldRoomHandle`] over a
//! bounded `mpsc` channel, the same single-owning-task discipline the
//! simulation-server teacher's room actor uses, generalized from one
//! channel of commands to four event sources (commands, tick, auto-save,
//! idle-check) selected over in the run loop.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value as Json;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Instant, MissedTickBehavior};

use tile_room_persistence::{CharacterRow, PersistenceError, PersistenceStore};
use tile_room_sim::{Direction, MapError, MapModel, TileKind};
use tile_room_wire::{
    close_code, server_message, IdleKick, IdleWarning, PlayerPatch, ServerMessage, StateBroadcast, WireDirection,
};

use crate::constants::{
    tick_period, AUTO_SAVE_INTERVAL, IDLE_CHECK_INTERVAL, IDLE_KICK_THRESHOLD, IDLE_WARN_THRESHOLD,
    MAX_PARTY_SIZE,
};
use crate::error::JoinError;
use crate::session::SessionContext;
use crate::state::{Patch, PlayerRecord, RoomState};
use crate::types::{AccountId, SessionId, WorldId};
use crate::validation::{validate_input, RejectReason, ValidationOutcome};

/// The per-room lifecycle state named in spec §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Loading,
    Open,
    Disposing,
}

/// Everything a room can push toward one connected session: a wire
/// message to relay, or an instruction to close the transport with a
/// specific close code. The room never touches the socket itself (spec
/// §4.6 — that's the gateway's job), so a server-initiated close (idle
/// kick, §6) has to travel over the same channel as state patches.
#[derive(Debug, Clone)]
pub enum RoomOutboundMessage {
    Deliver(ServerMessage),
    Close(u16),
}

/// Sink for pushing messages to one connected session. The gateway owns
/// the other end and forwards onto the socket.
pub type OutboundSender = mpsc::UnboundedSender<RoomOutboundMessage>;

enum RoomCommand {
    Join {
        session_id: SessionId,
        account_id: AccountId,
        character_name: String,
        outbound: OutboundSender,
        reply: oneshot::Sender<Result<(), JoinError>>,
    },
    Input {
        session_id: SessionId,
        sequence_number: u64,
        direction: i32,
    },
    Leave {
        session_id: SessionId,
    },
    Shutdown,
}

/// External dependencies a room needs, passed in at construction (spec
/// §9: "globals and singletons ... expressed as ports").
pub struct WorldRoomPorts {
    pub persistence: Arc<dyn PersistenceStore>,
}

/// Cheap-to-clone handle to a running room's command channel.
#[derive(Clone)]
pub struct WorldRoomHandle {
    world_id: WorldId,
    sender: mpsc::Sender<RoomCommand>,
}

impl WorldRoomHandle {
    pub fn world_id(&self) -> &str {
        &self.world_id
    }

    pub async fn join(
        &self,
        session_id: SessionId,
        account_id: AccountId,
        character_name: String,
        outbound: OutboundSender,
    ) -> Result<(), JoinError> {
        let (reply, recv) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                session_id,
                account_id,
                character_name,
                outbound,
                reply,
            })
            .await
            .map_err(|_| JoinError::RoomDisposing {
                world_id: self.world_id.clone(),
            })?;
        recv.await.map_err(|_| JoinError::RoomDisposing {
            world_id: self.world_id.clone(),
        })?
    }

    pub async fn submit_input(&self, session_id: SessionId, sequence_number: u64, direction: i32) {
        let _ = self
            .sender
            .send(RoomCommand::Input {
                session_id,
                sequence_number,
                direction,
            })
            .await;
    }

    pub async fn leave(&self, session_id: SessionId) {
        let _ = self.sender.send(RoomCommand::Leave { session_id }).await;
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(RoomCommand::Shutdown).await;
    }
}

/// The shape of `world_data` this runtime understands: a tile grid plus
/// a spawn point. Anything else in the JSON blob (decoration, scripting
/// hooks) round-trips unread through `save_all`.
#[derive(Debug, Deserialize)]
struct WorldLayout {
    width: u32,
    height: u32,
    tiles: Vec<TileCode>,
    spawn_x: u32,
    spawn_y: u32,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum TileCode {
    Ground,
    Wall,
    Water,
}

impl From<TileCode> for TileKind {
    fn from(code: TileCode) -> Self {
        match code {
            TileCode::Ground => TileKind::Ground,
            TileCode::Wall => TileKind::Wall,
            TileCode::Water => TileKind::Water,
        }
    }
}

fn map_from_world_data(world_data: &Json) -> Result<MapModel, JoinError> {
    let layout: WorldLayout = serde_json::from_value(world_data.clone())
        .map_err(|e| JoinError::Persistence(format!("malformed world_data: {e}")))?;
    let tiles = layout.tiles.into_iter().map(TileKind::from).collect();
    MapModel::new(layout.width, layout.height, tiles, (layout.spawn_x, layout.spawn_y))
        .map_err(|e: MapError| JoinError::Persistence(e.to_string()))
}

pub struct WorldRoom {
    world_id: WorldId,
    phase: RoomPhase,
    map: MapModel,
    host_account_id: AccountId,
    host_session_id: Option<SessionId>,
    state: RoomState,
    sessions: HashMap<SessionId, SessionContext>,
    outbounds: HashMap<SessionId, OutboundSender>,
    character_ids: HashMap<SessionId, i64>,
    /// The world's opaque data blob, as last read from or written to
    /// persistence. The room never interprets it beyond the tile layout
    /// parsed out at `open`; it must still round-trip unchanged through
    /// every `save_all` call rather than being replaced with an empty
    /// value, or a save would silently erase the world's own layout.
    world_data: Json,
    saving: bool,
    ports: WorldRoomPorts,
}

impl WorldRoom {
    /// `onCreate`: load the world, build its map, spawn the run loop, and
    /// return a handle. `dispose_notify` is signalled with the world id
    /// once the room finishes disposing, so the registry can drop its
    /// entry.
    pub async fn open(
        world_id: WorldId,
        ports: WorldRoomPorts,
        dispose_notify: mpsc::UnboundedSender<WorldId>,
    ) -> Result<WorldRoomHandle, JoinError> {
        let world = ports
            .persistence
            .get_world(&world_id)
            .await
            .map_err(|e| JoinError::Persistence(e.to_string()))?
            .ok_or_else(|| JoinError::WorldNotFound {
                world_id: world_id.clone(),
            })?;
        let map = map_from_world_data(&world.world_data)?;
        let (sender, receiver) = mpsc::channel(256);
        let room = WorldRoom {
            world_id: world_id.clone(),
            phase: RoomPhase::Open,
            map,
            host_account_id: world.owner_account_id,
            host_session_id: None,
            state: RoomState::new(),
            sessions: HashMap::new(),
            outbounds: HashMap::new(),
            character_ids: HashMap::new(),
            world_data: world.world_data,
            saving: false,
            ports,
        };
        tokio::spawn(async move {
            room.run(receiver, dispose_notify).await;
        });
        Ok(WorldRoomHandle { world_id, sender })
    }

    async fn run(mut self, mut receiver: mpsc::Receiver<RoomCommand>, dispose_notify: mpsc::UnboundedSender<WorldId>) {
        tracing::info!(world_id = %self.world_id, "room open");

        let mut tick_timer = interval(tick_period());
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut autosave_timer = interval(AUTO_SAVE_INTERVAL);
        autosave_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut idle_timer = interval(IDLE_CHECK_INTERVAL);
        idle_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = receiver.recv() => {
                    match cmd {
                        Some(RoomCommand::Join { session_id, account_id, character_name, outbound, reply }) => {
                            let result = self.handle_join(session_id, account_id, character_name, outbound).await;
                            // A rejected join into a room with no players leaves it
                            // with nobody ever having joined; without this it would
                            // idle forever; timers firing on an empty room with no
                            // path to "last player leaves".
                            if result.is_err() && self.state.is_empty() {
                                self.phase = RoomPhase::Disposing;
                            }
                            let _ = reply.send(result);
                        }
                        Some(RoomCommand::Input { session_id, sequence_number, direction }) => {
                            self.handle_input(session_id, sequence_number, direction);
                        }
                        Some(RoomCommand::Leave { session_id }) => {
                            self.on_leave(session_id).await;
                        }
                        Some(RoomCommand::Shutdown) | None => break,
                    }
                }
                _ = tick_timer.tick() => {
                    self.tick();
                }
                _ = autosave_timer.tick() => {
                    self.auto_save().await;
                }
                _ = idle_timer.tick() => {
                    self.check_idle().await;
                }
            }

            if self.phase == RoomPhase::Disposing {
                break;
            }
        }

        self.on_dispose().await;
        let _ = dispose_notify.send(self.world_id.clone());
        tracing::info!(world_id = %self.world_id, "room disposed");
    }

    async fn handle_join(
        &mut self,
        session_id: SessionId,
        account_id: AccountId,
        character_name: String,
        outbound: OutboundSender,
    ) -> Result<(), JoinError> {
        if self.phase == RoomPhase::Disposing {
            return Err(JoinError::RoomDisposing {
                world_id: self.world_id.clone(),
            });
        }
        if self.state.is_empty() && account_id != self.host_account_id {
            return Err(JoinError::NotOwner {
                account_id,
                world_id: self.world_id.clone(),
            });
        }
        if self.state.len() >= MAX_PARTY_SIZE {
            return Err(JoinError::RoomFull {
                world_id: self.world_id.clone(),
            });
        }

        let character = self.load_or_create_character(account_id, &character_name).await?;

        // Snapshot who's already here before inserting the newcomer, so
        // the snapshot we hand them doesn't include their own record
        // (that arrives separately via the `Add` broadcast below).
        let existing: Vec<PlayerPatch> = self
            .state
            .iter()
            .cloned()
            .map(Patch::Add)
            .map(PlayerPatch::from)
            .collect();

        let record = PlayerRecord {
            session_id,
            account_id,
            name: character.name.clone(),
            x: character.x as u32,
            y: character.y as u32,
            last_processed_sequence_number: 0,
        };
        self.state.insert(record);
        self.outbounds.insert(session_id, outbound);
        self.character_ids.insert(session_id, character.id);
        self.sessions
            .insert(session_id, SessionContext::new(account_id, character.id, Instant::now()));

        if account_id == self.host_account_id {
            self.host_session_id = Some(session_id);
        }

        // Scenario 5 (a joining session must learn about everyone already
        // in the room, not just itself): send the snapshot directly to
        // the newcomer before the regular broadcast carries their own
        // `Add` patch to everyone else.
        if !existing.is_empty() {
            self.send_to(
                session_id,
                ServerMessage {
                    body: Some(server_message::Body::State(StateBroadcast { patches: existing })),
                },
            );
        }

        tracing::info!(world_id = %self.world_id, session_id, account_id, "session joined");
        self.broadcast_patches();
        Ok(())
    }

    async fn load_or_create_character(
        &self,
        account_id: AccountId,
        character_name: &str,
    ) -> Result<CharacterRow, JoinError> {
        match self
            .ports
            .persistence
            .get_character(account_id, &self.world_id)
            .await
        {
            Ok(Some(character)) => Ok(character),
            Ok(None) => {
                let trimmed = character_name.trim();
                let name = if trimmed.is_empty() {
                    format!("account-{account_id}")
                } else {
                    trimmed.to_string()
                };
                let (sx, sy) = self.map.spawn();
                self.ports
                    .persistence
                    .create_character(account_id, &self.world_id, &name, sx as i32, sy as i32)
                    .await
                    .map_err(|e: PersistenceError| JoinError::Persistence(e.to_string()))
            }
            Err(e) => Err(JoinError::Persistence(e.to_string())),
        }
    }

    fn handle_input(&mut self, session_id: SessionId, sequence_number: u64, direction: i32) {
        let direction: Option<Direction> = WireDirection::try_from(direction).ok().map(Direction::from);
        let has_player = self.state.contains(session_id);
        let last_processed = self
            .sessions
            .get(&session_id)
            .map(|ctx| ctx.last_processed_sequence_number)
            .unwrap_or(0);

        match validate_input(has_player, sequence_number, direction, last_processed) {
            ValidationOutcome::Accepted(input) => {
                if let Some(ctx) = self.sessions.get_mut(&session_id) {
                    ctx.note_activity(Instant::now());
                    if !ctx.queue.push(input) {
                        tracing::debug!(world_id = %self.world_id, session_id, "input queue full, dropping newest");
                    }
                }
            }
            ValidationOutcome::Rejected(RejectReason::Stale {
                sequence_number,
                last_processed,
            }) => {
                if let Some(ctx) = self.sessions.get_mut(&session_id) {
                    ctx.note_activity(Instant::now());
                }
                tracing::debug!(world_id = %self.world_id, session_id, sequence_number, last_processed, "stale input dropped");
            }
            ValidationOutcome::Rejected(reason) => {
                tracing::warn!(world_id = %self.world_id, session_id, ?reason, "input rejected");
            }
        }
    }

    /// `tick()`: drain one input per session with a non-empty queue,
    /// evaluate movement, and always advance the acknowledged sequence
    /// number (spec §4.4's reconciliation contract).
    fn tick(&mut self) {
        let session_ids: Vec<SessionId> = self.sessions.keys().copied().collect();
        for session_id in session_ids {
            let Some(input) = self.sessions.get_mut(&session_id).and_then(|ctx| ctx.queue.pop()) else {
                continue;
            };
            let Some(player) = self.state.get(session_id) else {
                continue;
            };
            let (x, y, _moved) = tile_room_sim::evaluate(&self.map, player.x, player.y, input.direction);
            self.state.apply_move(session_id, x, y, input.sequence_number);
            if let Some(ctx) = self.sessions.get_mut(&session_id) {
                ctx.last_processed_sequence_number = input.sequence_number;
            }
        }
        self.broadcast_patches();
    }

    /// `checkIdle()`: warn at 14 minutes, kick at 15, imprecise by the
    /// 30s poll interval per spec §4.4/§9.
    async fn check_idle(&mut self) {
        let now = Instant::now();
        let mut to_kick = Vec::new();
        let mut to_warn = Vec::new();

        for (&session_id, ctx) in self.sessions.iter_mut() {
            let elapsed = ctx.idle_for(now);
            if elapsed >= IDLE_KICK_THRESHOLD {
                to_kick.push(session_id);
            } else if elapsed >= IDLE_WARN_THRESHOLD && !ctx.idle_warned {
                ctx.idle_warned = true;
                to_warn.push(session_id);
            }
        }

        for session_id in to_warn {
            self.send_to(
                session_id,
                ServerMessage {
                    body: Some(server_message::Body::IdleWarning(IdleWarning {
                        seconds_remaining: 60,
                    })),
                },
            );
        }

        for session_id in to_kick {
            self.send_to(
                session_id,
                ServerMessage {
                    body: Some(server_message::Body::IdleKick(IdleKick {
                        reason: "idle timeout".to_string(),
                    })),
                },
            );
            self.close_session(session_id, close_code::IDLE_TIMEOUT);
            tracing::info!(world_id = %self.world_id, session_id, "idle kick");
            self.on_leave(session_id).await;
        }
    }

    /// `autoSave()`: single-flight, snapshot-then-persist. A no-op while
    /// a prior save is still in flight.
    async fn auto_save(&mut self) {
        if self.saving {
            return;
        }
        self.saving = true;
        let result = self.save_snapshot().await;
        self.saving = false;
        if let Err(e) = result {
            tracing::error!(world_id = %self.world_id, error = %e, "autosave failed, data loss bounded to next interval");
        }
    }

    async fn save_snapshot(&self) -> Result<(), PersistenceError> {
        let characters: Vec<(i64, i32, i32)> = self
            .state
            .iter()
            .filter_map(|player| {
                self.character_ids
                    .get(&player.session_id)
                    .map(|&character_id| (character_id, player.x as i32, player.y as i32))
            })
            .collect();
        self.ports
            .persistence
            .save_all(&self.world_id, self.world_data.clone(), &characters)
            .await
    }

    /// `onLeave(session, consented)`: fire-and-forget save, then remove
    /// all bookkeeping for the session. Idempotent: a second call for an
    /// already-removed session is a no-op (spec §8). The save is spawned
    /// onto its own task rather than awaited here: spec §5 requires
    /// `onLeave` not suspend the leave, so the single-owning run loop
    /// must stay free to process the next command/tick/timer while the
    /// save is still in flight.
    async fn on_leave(&mut self, session_id: SessionId) {
        if !self.state.contains(session_id) {
            return;
        }

        if let (Some(player), Some(&character_id)) =
            (self.state.get(session_id), self.character_ids.get(&session_id))
        {
            let persistence = self.ports.persistence.clone();
            let world_id = self.world_id.clone();
            let world_data = self.world_data.clone();
            let (x, y) = (player.x as i32, player.y as i32);
            tokio::spawn(async move {
                if let Err(e) = persistence.save_all(&world_id, world_data, &[(character_id, x, y)]).await {
                    tracing::error!(world_id = %world_id, error = %e, "leave save failed, data loss bounded to next autosave");
                }
            });
        }

        self.sessions.remove(&session_id);
        self.outbounds.remove(&session_id);
        self.character_ids.remove(&session_id);
        if self.host_session_id == Some(session_id) {
            self.host_session_id = None;
        }
        self.state.remove(session_id);
        self.broadcast_patches();

        tracing::info!(world_id = %self.world_id, session_id, "session left");

        if self.state.is_empty() {
            self.phase = RoomPhase::Disposing;
        }
    }

    /// `onDispose()`: final synchronous save. Timers stop simply by this
    /// task's loop exiting; a command that arrives after this point sees
    /// a closed channel, which callers already treat as room-gone.
    async fn on_dispose(&mut self) {
        self.phase = RoomPhase::Disposing;
        if let Err(e) = self.save_snapshot().await {
            tracing::error!(world_id = %self.world_id, error = %e, "final save failed on dispose");
        }
    }

    fn send_to(&self, session_id: SessionId, message: ServerMessage) {
        if let Some(sender) = self.outbounds.get(&session_id) {
            let _ = sender.send(RoomOutboundMessage::Deliver(message));
        }
    }

    /// Ask the gateway to close this session's transport with `code`
    /// (spec §6's close codes). The room never holds the socket itself,
    /// so this travels over the same outbound channel as state patches.
    fn close_session(&self, session_id: SessionId, code: u16) {
        if let Some(sender) = self.outbounds.get(&session_id) {
            let _ = sender.send(RoomOutboundMessage::Close(code));
        }
    }

    /// Drain `RoomState`'s pending patches and broadcast them to every
    /// connected session (spec: "patches for tick N are delivered before
    /// any patch for tick N+1" — each session's `UnboundedSender` is FIFO,
    /// so this ordering is free).
    fn broadcast_patches(&mut self) {
        let patches = self.state.take_patches();
        if patches.is_empty() {
            return;
        }
        let wire_patches: Vec<PlayerPatch> = patches.into_iter().map(PlayerPatch::from).collect();
        let message = ServerMessage {
            body: Some(server_message::Body::State(StateBroadcast {
                patches: wire_patches,
            })),
        };
        let session_ids: Vec<SessionId> = self.outbounds.keys().copied().collect();
        for session_id in session_ids {
            self.send_to(session_id, message.clone());
        }
    }
}
