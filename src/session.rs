//! Per-client session state machine (§4.3).
//!
//! The source's `PlayerSocket::run` is a flat loop with no explicit states:
//! it reads a `RawPacket`, hands it to a free-standing `defaultPacketHandler`
//! switch that returns `true`/`false`, and force-disconnects once
//! `bad_packets > 15`. This reimplementation keeps that exact threshold and
//! handler-table shape but makes the handshake's implicit ordering
//! (Login, then Load, then free play) an explicit `SessionState`, so a
//! session can reject packets that arrive out of turn instead of silently
//! acting on them.

use std::io::{Read, Write};
use std::sync::{Arc, RwLock};

use crate::config::ServerConfig;
use crate::error::{ProtocolError, Result};
use crate::frame::{read_frame, write_frame};
use crate::packet::{self, Packet, PlayerStats};
use crate::types::entity::WorldId;
use crate::types::tile::Tile;
use crate::types::{Color, Version};
use crate::world::WorldStore;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Just accepted; only Login is meaningful.
    New,
    /// Logged in; server has sent Player+Init, awaiting Load.
    Authed,
    /// Load received; server is about to reply Tiles+Entities+Game.
    Loading,
    /// Full packet vocabulary accepted.
    Playing,
    /// Terminal; all further I/O is a no-op.
    Closed,
}

/// One connected client: its transport, its place in the state machine, and
/// its bad-packet budget.
pub struct Session<S> {
    stream: S,
    state: SessionState,
    bad_packets: u32,
    bad_packet_limit: u32,
    world_store: Arc<RwLock<WorldStore>>,
    username: Option<String>,
    client_version: Option<Version>,
    world: WorldId,
}

impl<S: Read + Write> Session<S> {
    pub fn new(stream: S, world_store: Arc<RwLock<WorldStore>>, config: &ServerConfig) -> Session<S> {
        Session {
            stream,
            state: SessionState::New,
            bad_packets: 0,
            bad_packet_limit: config.bad_packet_limit,
            world_store,
            username: None,
            client_version: None,
            world: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn send(&mut self, packet: Packet) -> Result<()> {
        let raw = packet::encode(&packet);
        write_frame(&mut self.stream, &raw)
    }

    fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    /// Blocking read loop: reads and dispatches frames until the session
    /// closes (gracefully or via the bad-packet threshold) or a fatal
    /// transport/framing error surfaces, which terminates the loop per §7.
    pub fn run(&mut self) -> Result<()> {
        while self.state != SessionState::Closed {
            let raw = read_frame(&mut self.stream)?;
            match packet::decode(&raw) {
                Ok(packet) => self.dispatch(packet)?,
                Err(e) if e.counts_as_bad_packet() => self.register_bad_packet()?,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, packet: Packet) -> Result<()> {
        match self.handle(packet) {
            Ok(()) => {
                self.bad_packets = 0;
                Ok(())
            }
            Err(ProtocolError::Internal(message)) => {
                log::error!("internal error, dropping packet: {}", message);
                Ok(())
            }
            Err(e) if e.counts_as_bad_packet() => self.register_bad_packet(),
            Err(e) => Err(e),
        }
    }

    /// Increments the bad-packet counter; past the threshold, emits Invalid
    /// and closes the connection (§8 "after exactly 16 consecutive unhandled
    /// packets").
    fn register_bad_packet(&mut self) -> Result<()> {
        self.bad_packets += 1;
        log::debug!("bad packet #{} ({}>{} closes)", self.bad_packets, self.bad_packets, self.bad_packet_limit);
        if self.bad_packets > self.bad_packet_limit {
            self.send(Packet::Invalid { message: "Many bad packets".to_string() })?;
            self.close();
        }
        Ok(())
    }

    fn handle(&mut self, packet: Packet) -> Result<()> {
        use Packet::*;
        let tag = packet.tag();
        match packet {
            // Handled in every state, matching the source's unconditional
            // PING/DISCONNECT handling in `defaultPacketHandler`.
            Ping { kind } => {
                log::trace!("ping ({:?})", kind);
                Ok(())
            }
            Invalid { message } => {
                log::warn!("peer sent Invalid: {}", message);
                Ok(())
            }
            Disconnect => {
                self.close();
                Ok(())
            }
            Login { username, version } if self.state == SessionState::New => self.handle_login(username, version),
            Load { current_level } if self.state == SessionState::Authed => self.handle_load(current_level),
            Save if self.state != SessionState::New => Ok(()),
            Move { .. } if self.state == SessionState::Playing => {
                log::trace!("move");
                Ok(())
            }
            Interact { .. }
            | Push { .. }
            | Pickup { .. }
            | ChestIn { .. }
            | ChestOut { .. }
            | Bed { .. }
            | Potion { .. }
            | Die
            | Respawn
            | Drop { .. }
            | Shirt { .. }
                if self.state == SessionState::Playing =>
            {
                Ok(())
            }
            Entity { .. } if self.state == SessionState::Playing => Ok(()),
            // Every remaining case is either a server-to-client-only packet
            // arriving inbound, or a state-gated packet out of turn.
            _ => Err(ProtocolError::Unhandled { tag }),
        }
    }

    fn handle_login(&mut self, username: String, version: Version) -> Result<()> {
        log::info!("login from {:?} (client {})", username, version);
        self.username = Some(username);
        self.client_version = Some(version);

        let stats = PlayerStats {
            x: 0,
            y: 0,
            spawn_x: 0,
            spawn_y: 0,
            health: 10,
            hunger: 10,
            armor: 0,
            armor_damage_buffer: 0,
            cur_armor: None,
            score: 0,
            level: 0,
            potions: Vec::new(),
            shirt_color: Color::default(),
            skin_on: false,
        };
        self.send(Packet::Player { version, stats, inventory: Vec::new() })?;
        self.send(Packet::Init { id: 12, width: 128, height: 128, level: 0, x: 0, y: 0 })?;
        self.state = SessionState::Authed;
        Ok(())
    }

    fn handle_load(&mut self, current_level: i32) -> Result<()> {
        log::debug!("load level {}", current_level);
        self.state = SessionState::Loading;

        let entities = {
            let mut store = self.world_store.write().unwrap();
            let world = store.load_world(self.world, "overworld");
            world.entities().cloned().collect()
        };
        self.send(Packet::Tiles { tiles: vec![Tile::default(); 128 * 128] })?;
        self.send(Packet::Entities { entities })?;
        self.send(Packet::Game {
            mode: "survival".to_string(),
            time: 6000,
            game_speed: 1.0,
            past_day: true,
            score: 10,
            player_count: 1,
            awaken_player: 1,
        })?;
        self.state = SessionState::Playing;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read, Write};

    fn config() -> ServerConfig {
        ServerConfig::default()
    }

    fn store() -> Arc<RwLock<WorldStore>> {
        Arc::new(RwLock::new(WorldStore::new()))
    }

    /// Feeds `frames` through a session's read loop over an in-memory duplex
    /// buffer and returns everything the session wrote back.
    struct Duplex {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.output.write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn frames_of(packets: &[Packet]) -> Vec<u8> {
        let mut buf = Vec::new();
        for packet in packets {
            write_frame(&mut buf, &packet::encode(packet)).unwrap();
        }
        buf
    }

    fn read_all_frames(bytes: &[u8]) -> Vec<crate::frame::RawPacket> {
        let mut cursor = Cursor::new(bytes.to_vec());
        let mut frames = Vec::new();
        while (cursor.position() as usize) < bytes.len() {
            match read_frame(&mut cursor) {
                Ok(frame) => frames.push(frame),
                Err(_) => break,
            }
        }
        frames
    }

    #[test]
    fn handshake_scenario_sends_player_then_init() {
        let input = frames_of(&[Packet::Login { username: "alice".to_string(), version: Version::new(2, 0, 6) }]);
        let mut duplex = Duplex { input: Cursor::new(input), output: Vec::new() };
        let mut session = Session::new(&mut duplex, store(), &config());

        // a disconnect after login lets run() return cleanly for the test
        let _ = session.handle(Packet::Login { username: "alice".to_string(), version: Version::new(2, 0, 6) });
        assert_eq!(session.state(), SessionState::Authed);

        let frames = read_all_frames(&duplex.output);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].tag, packet::tag::PLAYER);
        assert!(frames[0].payload.starts_with("2.0.6\n0,0,0,0,10,10,0,0,NULL,0,0"));
        assert_eq!(frames[1].tag, packet::tag::INIT);
        assert_eq!(frames[1].payload, "12,128,128,0,0,0");
    }

    #[test]
    fn load_scenario_sends_tiles_entities_game_and_enters_playing() {
        let mut duplex = Duplex { input: Cursor::new(Vec::new()), output: Vec::new() };
        let mut session = Session::new(&mut duplex, store(), &config());
        session.state = SessionState::Authed;

        session.handle(Packet::Load { current_level: 0 }).unwrap();
        assert_eq!(session.state(), SessionState::Playing);

        let frames = read_all_frames(&duplex.output);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].tag, packet::tag::TILES);
        assert_eq!(frames[0].payload.split(',').count(), 128 * 128 * 2);
        assert_eq!(frames[1].tag, packet::tag::ENTITIES);
        assert_eq!(frames[1].payload, "");
        assert_eq!(frames[2].tag, packet::tag::GAME);
        assert_eq!(frames[2].payload, "survival;6000;1;true;10;1;1");
    }

    #[test]
    fn login_out_of_turn_is_unhandled() {
        let mut duplex = Duplex { input: Cursor::new(Vec::new()), output: Vec::new() };
        let mut session = Session::new(&mut duplex, store(), &config());
        session.state = SessionState::Playing;

        let err = session.handle(Packet::Login { username: "bob".to_string(), version: Version::new(1, 0, 0) }).unwrap_err();
        assert!(matches!(err, ProtocolError::Unhandled { tag } if tag == packet::tag::LOGIN));
    }

    #[test]
    fn invalid_flood_scenario_closes_after_sixteenth_bad_packet() {
        let mut packets = Vec::new();
        for _ in 0..16 {
            packets.push((packet::tag::USERNAMES, String::new()));
        }
        let mut buf = Vec::new();
        for (tag, payload) in &packets {
            write_frame(&mut buf, &crate::frame::RawPacket::new(*tag, payload.clone())).unwrap();
        }
        let mut duplex = Duplex { input: Cursor::new(buf), output: Vec::new() };
        let mut session = Session::new(&mut duplex, store(), &config());

        session.run().unwrap();
        assert_eq!(session.state(), SessionState::Closed);

        let frames = read_all_frames(&duplex.output);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].tag, packet::tag::INVALID);
        assert_eq!(frames[0].payload, "Many bad packets");
    }

    #[test]
    fn fifteen_bad_packets_then_one_handled_resets_counter() {
        let mut buf = Vec::new();
        for _ in 0..15 {
            write_frame(&mut buf, &crate::frame::RawPacket::new(packet::tag::USERNAMES, "")).unwrap();
        }
        write_frame(&mut buf, &packet::encode(&Packet::Ping { kind: crate::packet::PingKind::Auto })).unwrap();
        write_frame(&mut buf, &crate::frame::RawPacket::new(packet::tag::USERNAMES, "")).unwrap();

        let mut duplex = Duplex { input: Cursor::new(buf), output: Vec::new() };
        let mut session = Session::new(&mut duplex, store(), &config());

        for _ in 0..15 {
            let raw = read_frame(&mut session.stream).unwrap();
            let err = packet::decode(&raw).unwrap_err();
            assert!(matches!(err, ProtocolError::Unhandled { .. }));
            session.register_bad_packet().unwrap();
        }
        assert_eq!(session.bad_packets, 15);
        assert_ne!(session.state(), SessionState::Closed);

        let raw = read_frame(&mut session.stream).unwrap();
        session.dispatch(packet::decode(&raw).unwrap()).unwrap();
        assert_eq!(session.bad_packets, 0);
        assert_ne!(session.state(), SessionState::Closed);
    }

    #[test]
    fn disconnect_closes_without_emitting_further_packets() {
        let mut duplex = Duplex { input: Cursor::new(Vec::new()), output: Vec::new() };
        let mut session = Session::new(&mut duplex, store(), &config());
        session.state = SessionState::Playing;

        session.handle(Packet::Disconnect).unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(duplex.output.is_empty());
    }
}
