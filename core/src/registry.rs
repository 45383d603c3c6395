use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::board::Node;
use crate::bot::{self, BotAction};
use crate::dice::{self, ThrowResult};
use crate::error::GameError;
use crate::game::{create_pieces, GameState, GameStatus};
use crate::protocol::{ClientMsg, ServerMsg};
use crate::room::{hash_password, ConnectionId, Room, MIN_PLAYERS};
use crate::room_id::RoomId;
use crate::snapshot::RoomSummary;

/// Deliberation delay before a bot acts; the transport's scheduler waits
/// this long before delivering the bot tick.
pub const BOT_DELAY_MS: u64 = 350;

/// Outbound capability held by the registry: deliver a message to one
/// connection, or to every connected client.
pub trait Broadcaster: Send {
    fn send(&self, target: ConnectionId, msg: &ServerMsg);
    fn send_all(&self, msg: &ServerMsg);
}

/// One cancellable deferred bot action per room; scheduling again replaces
/// any pending action for that room.
pub trait BotScheduler: Send {
    fn schedule(&self, room_id: &RoomId);
    fn cancel(&self, room_id: &RoomId);
}

/// Owns every room and the connection-to-room map. All mutation follows
/// the same shape: validate, mutate, broadcast the room snapshot to the
/// room's members plus the refreshed summary list to everyone. Failures
/// leave the room untouched and are reported to the caller only.
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    conn_rooms: HashMap<ConnectionId, RoomId>,
    broadcaster: Box<dyn Broadcaster>,
    scheduler: Box<dyn BotScheduler>,
}

impl RoomRegistry {
    pub fn new(broadcaster: Box<dyn Broadcaster>, scheduler: Box<dyn BotScheduler>) -> Self {
        Self {
            rooms: HashMap::new(),
            conn_rooms: HashMap::new(),
            broadcaster,
            scheduler,
        }
    }

    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn room_mut(&mut self, room_id: &RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// A freshly connected client immediately learns the room list.
    pub fn client_connected(&self, conn: ConnectionId) {
        self.broadcaster.send(conn, &ServerMsg::Rooms { rooms: self.summaries() });
    }

    pub fn handle(&mut self, conn: ConnectionId, msg: ClientMsg) {
        let result = self.dispatch(conn, msg);
        if let Err(err) = result {
            debug!(conn, code = err.code(), "command rejected: {err}");
            self.broadcaster.send(
                conn,
                &ServerMsg::Error {
                    code: err.code().to_string(),
                    message: err.to_string(),
                },
            );
        }
    }

    fn dispatch(&mut self, conn: ConnectionId, msg: ClientMsg) -> Result<(), GameError> {
        match msg {
            ClientMsg::Create {
                name,
                nickname,
                max_players,
                password,
                allow_back_step,
                piece_count,
            } => self.create_room(
                conn,
                &name,
                &nickname,
                max_players,
                password.as_deref(),
                allow_back_step,
                piece_count,
            ),
            ClientMsg::Join {
                room_id,
                nickname,
                password,
                player_id,
                as_spectator,
            } => self.join_room(
                conn,
                &room_id,
                &nickname,
                password.as_deref(),
                player_id.as_deref(),
                as_spectator,
            ),
            ClientMsg::Ready {
                room_id,
                player_id,
                ready,
            } => self.toggle_ready(&room_id, &player_id, ready),
            ClientMsg::Start { room_id, player_id } => self.start_game(&room_id, &player_id),
            ClientMsg::Roll { room_id, player_id } => self.roll(&room_id, &player_id),
            ClientMsg::Move {
                room_id,
                player_id,
                piece_id,
                result_index,
                use_diagonal,
            } => self.apply_move(&room_id, &player_id, &piece_id, result_index, use_diagonal),
            ClientMsg::Skip {
                room_id,
                player_id,
                result_index,
            } => self.consume_result(&room_id, &player_id, result_index),
            ClientMsg::Restart { room_id, player_id } => self.restart(&room_id, &player_id),
            ClientMsg::Chat {
                room_id,
                sender,
                text,
            } => self.chat(&room_id, sender.as_deref(), &text),
            ClientMsg::AddDummies {
                room_id,
                player_id,
                count,
            } => self.add_dummies(&room_id, &player_id, count),
            ClientMsg::ListRooms => {
                self.broadcaster
                    .send(conn, &ServerMsg::Rooms { rooms: self.summaries() });
                Ok(())
            }
            ClientMsg::Ping { nonce } => {
                self.broadcaster.send(conn, &ServerMsg::Pong { nonce });
                Ok(())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn create_room(
        &mut self,
        conn: ConnectionId,
        name: &str,
        nickname: &str,
        max_players: u8,
        password: Option<&str>,
        allow_back_step: bool,
        piece_count: u8,
    ) -> Result<(), GameError> {
        let mut room = Room::new(name, max_players, password, allow_back_step, piece_count);
        let host_id = room.add_player(nickname, Some(conn), true, false);
        let host_name = room
            .player(&host_id)
            .map(|player| player.name.clone())
            .unwrap_or_default();
        room.log_activity(format!("{host_name} created the room."));
        let room_id = room.id.clone();
        info!(room = %room_id, host = %host_id, "room created");

        self.conn_rooms.insert(conn, room_id.clone());
        self.rooms.insert(room_id.clone(), room);

        let snapshot = self.rooms[&room_id].snapshot();
        self.broadcaster.send(
            conn,
            &ServerMsg::Joined {
                room: snapshot,
                player_id: Some(host_id),
            },
        );
        self.broadcast_rooms();
        Ok(())
    }

    fn join_room(
        &mut self,
        conn: ConnectionId,
        room_id: &str,
        nickname: &str,
        password: Option<&str>,
        player_id: Option<&str>,
        as_spectator: bool,
    ) -> Result<(), GameError> {
        let room_id = parse_room_id(room_id)?;
        let room = self.rooms.get_mut(&room_id).ok_or(GameError::RoomNotFound)?;

        if room.game.status == GameStatus::Playing && player_id.is_none() && !as_spectator {
            return Err(GameError::GameInProgress);
        }
        if let Some(hash) = &room.password_hash {
            if &hash_password(password.unwrap_or("")) != hash {
                return Err(GameError::WrongPassword);
            }
        }

        let joined_player_id = if as_spectator {
            room.add_spectator(nickname, Some(conn));
            None
        } else if let Some(player) = player_id.and_then(|id| room.player_mut(id)) {
            // reconnect in place; game state is untouched
            player.conn = Some(conn);
            player.connected = true;
            let id = player.id.clone();
            room.ensure_host();
            Some(id)
        } else {
            if room.players.len() >= room.max_players as usize {
                return Err(GameError::RoomFull);
            }
            let id = room.add_player(nickname, Some(conn), false, false);
            let name = room
                .player(&id)
                .map(|player| player.name.clone())
                .unwrap_or_default();
            room.log_activity(format!("{name} joined."));
            Some(id)
        };

        self.conn_rooms.insert(conn, room_id.clone());
        info!(room = %room_id, conn, spectator = as_spectator, "joined");
        self.broadcast_room(&room_id);
        let snapshot = match self.rooms.get(&room_id) {
            Some(room) => room.snapshot(),
            None => return Ok(()),
        };
        self.broadcaster.send(
            conn,
            &ServerMsg::Joined {
                room: snapshot,
                player_id: joined_player_id,
            },
        );
        Ok(())
    }

    /// Connection loss maps to leave: players are marked disconnected (and
    /// may reconnect later), spectators are dropped, the host role and the
    /// turn move on, and an emptied room is destroyed.
    pub fn disconnect(&mut self, conn: ConnectionId) {
        let Some(room_id) = self.conn_rooms.remove(&conn) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };

        if let Some(index) = room.players.iter().position(|p| p.conn == Some(conn)) {
            let player = &mut room.players[index];
            let player_id = player.id.clone();
            let name = player.name.clone();
            let was_host = player.is_host;
            player.connected = false;
            player.conn = None;
            player.is_host = false;
            room.log_activity(format!("{name} left."));
            if was_host {
                room.ensure_host();
            }
            // raw index, not the self-healing lookup, which would already
            // have skipped past the leaver
            let was_current = room.game.status == GameStatus::Playing
                && room.game.turn_order.get(room.game.current_turn_index)
                    == Some(&player_id);
            if was_current {
                room.advance_turn();
            }
            info!(room = %room_id, player = %player_id, "player disconnected");
            self.broadcast_room(&room_id);
            return;
        }

        if let Some(index) = room.spectators.iter().position(|s| s.conn == Some(conn)) {
            room.spectators.remove(index);
            self.broadcast_room(&room_id);
            return;
        }

        if room.players.is_empty() {
            self.rooms.remove(&room_id);
            self.scheduler.cancel(&room_id);
            info!(room = %room_id, "room destroyed");
            self.broadcast_rooms();
        }
    }

    fn toggle_ready(&mut self, room_id: &str, player_id: &str, ready: bool) -> Result<(), GameError> {
        let room_id = parse_room_id(room_id)?;
        let room = self.rooms.get_mut(&room_id).ok_or(GameError::RoomNotFound)?;
        if room.game.status != GameStatus::Waiting {
            return Err(GameError::GameInProgress);
        }
        let player = room.player_mut(player_id).ok_or(GameError::PlayerNotFound)?;
        player.is_ready = ready;
        self.broadcast_room(&room_id);
        Ok(())
    }

    fn start_game(&mut self, room_id: &str, player_id: &str) -> Result<(), GameError> {
        let room_id = parse_room_id(room_id)?;
        let room = self.rooms.get_mut(&room_id).ok_or(GameError::RoomNotFound)?;
        let player = room.player(player_id).ok_or(GameError::PlayerNotFound)?;
        if !player.is_host {
            return Err(GameError::HostOnly);
        }
        if room.game.status != GameStatus::Waiting {
            return Err(GameError::GameInProgress);
        }
        if room.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }
        if !room.players.iter().all(|p| p.is_ready || p.is_bot) {
            return Err(GameError::NotAllReady);
        }

        let piece_count = room.piece_count;
        for p in &mut room.players {
            p.pieces = create_pieces(piece_count);
            p.finished_count = 0;
        }
        let turn_order: Vec<String> = room.players.iter().map(|p| p.id.clone()).collect();
        room.game = GameState::begin(turn_order);
        room.log_activity("The game has started. First player is up.".to_string());
        info!(room = %room_id, "game started");
        self.broadcast_room(&room_id);
        Ok(())
    }

    fn roll(&mut self, room_id: &str, player_id: &str) -> Result<(), GameError> {
        let room_id = parse_room_id(room_id)?;
        let room = self.rooms.get_mut(&room_id).ok_or(GameError::RoomNotFound)?;
        if room.game.status != GameStatus::Playing {
            return Err(GameError::NotPlaying);
        }
        let name = room
            .player(player_id)
            .ok_or(GameError::PlayerNotFound)?
            .name
            .clone();
        if room.current_player_id().as_deref() != Some(player_id) {
            return Err(GameError::NotYourTurn);
        }
        if room.game.throw_quota == 0 {
            return Err(GameError::NoThrowsLeft);
        }

        let outcome = dice::roll(room.allow_back_step);
        room.game.throw_quota -= 1;
        let result = ThrowResult::from(outcome);
        room.game.pending_results.push(result.clone());
        room.game.last_roll = Some(result);
        if outcome.extra {
            room.game.throw_quota += 1;
            room.log_activity(format!("{} grants another throw.", outcome.label));
        }
        room.log_activity(format!("{name} threw {} ({}).", outcome.label, outcome.value));
        debug!(room = %room_id, player = %player_id, label = outcome.label, "rolled");
        self.broadcast_room(&room_id);
        Ok(())
    }

    fn apply_move(
        &mut self,
        room_id: &str,
        player_id: &str,
        piece_id: &str,
        result_index: u32,
        use_diagonal: bool,
    ) -> Result<(), GameError> {
        let room_id = parse_room_id(room_id)?;
        let room = self.rooms.get_mut(&room_id).ok_or(GameError::RoomNotFound)?;
        if room.game.status != GameStatus::Playing {
            return Err(GameError::NotPlaying);
        }
        let player_index = room
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(GameError::PlayerNotFound)?;
        if room.current_player_id().as_deref() != Some(player_id) {
            return Err(GameError::NotYourTurn);
        }
        let result = room
            .game
            .pending_results
            .get(result_index as usize)
            .cloned()
            .ok_or(GameError::NoSuchResult)?;

        let plan = crate::game::validate_move(
            &room.players[player_index].pieces,
            piece_id,
            result.value,
            use_diagonal,
        )?;

        let player = &mut room.players[player_index];
        for &index in &plan.moving {
            let piece = &mut player.pieces[index];
            piece.position = plan.destination;
            piece.last_entry = plan.last_entry;
            if piece.position == Node::End {
                player.finished_count += 1;
            }
        }

        let captured = room.capture_pieces(plan.destination, player_id);
        if captured > 0 {
            room.game.throw_quota += 1;
            room.log_activity("Capture! One more throw earned.".to_string());
        }
        room.game.pending_results.remove(result_index as usize);
        room.check_winner(player_id);

        if room.game.status != GameStatus::Finished
            && room.game.throw_quota == 0
            && room.game.pending_results.is_empty()
        {
            room.advance_turn();
        }
        debug!(
            room = %room_id,
            player = %player_id,
            piece = piece_id,
            captured,
            "move applied"
        );
        self.broadcast_room(&room_id);
        Ok(())
    }

    fn consume_result(
        &mut self,
        room_id: &str,
        player_id: &str,
        result_index: u32,
    ) -> Result<(), GameError> {
        let room_id = parse_room_id(room_id)?;
        let room = self.rooms.get_mut(&room_id).ok_or(GameError::RoomNotFound)?;
        if room.game.status != GameStatus::Playing {
            return Err(GameError::NotPlaying);
        }
        if room.current_player_id().as_deref() != Some(player_id) {
            return Err(GameError::NotYourTurn);
        }
        let result = room
            .game
            .pending_results
            .get(result_index as usize)
            .cloned()
            .ok_or(GameError::NoSuchResult)?;
        let player = room.player(player_id).ok_or(GameError::PlayerNotFound)?;
        if crate::game::movable_exists(&player.pieces, result.value) {
            return Err(GameError::MoveAvailable);
        }
        let name = player.name.clone();

        room.game.pending_results.remove(result_index as usize);
        room.log_activity(format!("{name} could not use {} and forfeited it.", result.label));
        if room.game.throw_quota == 0 && room.game.pending_results.is_empty() {
            room.advance_turn();
        }
        self.broadcast_room(&room_id);
        Ok(())
    }

    fn restart(&mut self, room_id: &str, player_id: &str) -> Result<(), GameError> {
        let room_id = parse_room_id(room_id)?;
        let room = self.rooms.get_mut(&room_id).ok_or(GameError::RoomNotFound)?;
        let player = room.player(player_id).ok_or(GameError::PlayerNotFound)?;
        if !player.is_host {
            return Err(GameError::HostOnly);
        }
        room.reset_game();
        room.ensure_host();
        info!(room = %room_id, "room restarted");
        self.broadcast_room(&room_id);
        Ok(())
    }

    fn chat(&mut self, room_id: &str, sender: Option<&str>, text: &str) -> Result<(), GameError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let room_id = parse_room_id(room_id)?;
        let room = self.rooms.get_mut(&room_id).ok_or(GameError::RoomNotFound)?;
        room.push_chat(sender.unwrap_or(""), text);
        self.broadcast_room(&room_id);
        Ok(())
    }

    fn add_dummies(&mut self, room_id: &str, player_id: &str, count: u8) -> Result<(), GameError> {
        let room_id = parse_room_id(room_id)?;
        let room = self.rooms.get_mut(&room_id).ok_or(GameError::RoomNotFound)?;
        let player = room.player(player_id).ok_or(GameError::PlayerNotFound)?;
        if !player.is_host {
            return Err(GameError::HostOnly);
        }
        if room.game.status != GameStatus::Waiting {
            return Err(GameError::GameInProgress);
        }
        let available = (room.max_players as usize).saturating_sub(room.players.len());
        let to_add = (count as usize).min(available);
        for _ in 0..to_add {
            let name = format!("Dummy {}", room.players.len() + 1);
            room.add_player(&name, None, false, true);
        }
        self.broadcast_room(&room_id);
        Ok(())
    }

    /// Fired by the scheduler after the deliberation delay. Re-confirms it
    /// is still a bot's turn, then issues the same command a human would.
    /// Errors are swallowed after logging so a misbehaving bot can never
    /// take the room down.
    pub fn run_bot_turn(&mut self, room_id: &RoomId) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        if room.game.status != GameStatus::Playing {
            return;
        }
        let Some(current_id) = room.current_player_id() else {
            return;
        };
        let is_bot = room
            .player(&current_id)
            .map(|player| player.is_bot)
            .unwrap_or(false);
        if !is_bot {
            return;
        }

        let Some(action) = bot::choose_action(room, &current_id) else {
            return;
        };
        let raw_id = room_id.to_string();
        let result = match action {
            BotAction::Roll => self.roll(&raw_id, &current_id),
            BotAction::Move {
                piece_id,
                result_index,
                use_diagonal,
            } => self.apply_move(&raw_id, &current_id, &piece_id, result_index, use_diagonal),
            BotAction::Skip { result_index } => {
                self.consume_result(&raw_id, &current_id, result_index)
            }
        };
        if let Err(err) = result {
            warn!(room = %room_id, bot = %current_id, "bot action failed: {err}");
        }
    }

    fn summaries(&self) -> Vec<RoomSummary> {
        self.rooms.values().map(Room::summary).collect()
    }

    fn broadcast_rooms(&self) {
        self.broadcaster
            .send_all(&ServerMsg::Rooms { rooms: self.summaries() });
    }

    /// Pushes the room snapshot to every member, the summary list to every
    /// client, then re-arms (or cancels) the room's deferred bot action.
    fn broadcast_room(&mut self, room_id: &RoomId) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        let snapshot = room.snapshot();
        let targets: Vec<ConnectionId> = room
            .players
            .iter()
            .filter(|player| player.connected)
            .filter_map(|player| player.conn)
            .chain(room.spectators.iter().filter_map(|spectator| spectator.conn))
            .collect();
        let bot_turn = room.game.status == GameStatus::Playing
            && room
                .current_player_id()
                .and_then(|id| room.player(&id).map(|player| player.is_bot))
                .unwrap_or(false);

        let msg = ServerMsg::State { room: snapshot };
        for target in targets {
            self.broadcaster.send(target, &msg);
        }
        self.broadcast_rooms();

        if bot_turn {
            self.scheduler.schedule(room_id);
        } else {
            self.scheduler.cancel(room_id);
        }
    }
}

fn parse_room_id(raw: &str) -> Result<RoomId, GameError> {
    RoomId::parse(raw).map_err(|_| GameError::RoomNotFound)
}
