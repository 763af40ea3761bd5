//! Typed packet variants and their wire grammars.
//!
//! The source models packets as a class hierarchy sharing a `Packet` base
//! with virtual encode/decode. This reimplementation prefers a tagged sum
//! (see design notes): one variant per packet, plus two free functions,
//! [`encode`] and [`decode`], so the compiler can check variant coverage.

use crate::error::{ProtocolError, Result};
use crate::frame::RawPacket;
use crate::types::entity::{Entity, EntityId, WorldId};
use crate::types::item::Item;
use crate::types::potion::PotionType;
use crate::types::tile::Tile;
use crate::types::{Color, Direction, Potion, Version};

pub mod tag {
    pub const INVALID: u16 = 0x01;
    pub const PING: u16 = 0x02;
    pub const USERNAMES: u16 = 0x03;
    pub const LOGIN: u16 = 0x04;
    pub const GAME: u16 = 0x05;
    pub const INIT: u16 = 0x06;
    pub const LOAD: u16 = 0x07;
    pub const TILES: u16 = 0x08;
    pub const ENTITIES: u16 = 0x09;
    pub const TILE: u16 = 0x0A;
    pub const ENTITY: u16 = 0x0B;
    pub const PLAYER: u16 = 0x0C;
    pub const MOVE: u16 = 0x0D;
    pub const ADD: u16 = 0x0E;
    pub const REMOVE: u16 = 0x0F;
    pub const DISCONNECT: u16 = 0x10;
    pub const SAVE: u16 = 0x11;
    pub const NOTIFY: u16 = 0x12;
    pub const INTERACT: u16 = 0x13;
    pub const PUSH: u16 = 0x14;
    pub const PICKUP: u16 = 0x15;
    pub const CHEST_IN: u16 = 0x16;
    pub const CHEST_OUT: u16 = 0x17;
    pub const ADD_ITEMS: u16 = 0x18;
    pub const BED: u16 = 0x19;
    pub const POTION: u16 = 0x1A;
    pub const HURT: u16 = 0x1B;
    pub const DIE: u16 = 0x1C;
    pub const RESPAWN: u16 = 0x1D;
    pub const DROP: u16 = 0x1E;
    pub const STAMINA: u16 = 0x1F;
    pub const SHIRT: u16 = 0x20;
    pub const STOP_FISHING: u16 = 0x21;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PingKind {
    Auto,
    Manual,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerStats {
    pub x: i32,
    pub y: i32,
    pub spawn_x: i32,
    pub spawn_y: i32,
    pub health: i32,
    pub hunger: i32,
    pub armor: i32,
    pub armor_damage_buffer: i32,
    pub cur_armor: Option<Item>,
    pub score: i32,
    pub level: i32,
    pub potions: Vec<Potion>,
    pub shirt_color: Color,
    pub skin_on: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntityPayload {
    /// Client asking for an entity it doesn't yet have, by id.
    Request(EntityId),
    /// Changed-fields-only update for an entity the client already has.
    Update { id: EntityId, delta: String },
    /// A complete self-description, as used to announce a new entity.
    Full(Entity),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChestDeposit {
    pub item_index: i32,
    pub whole_stack: bool,
    pub input_index: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChestOutPayload {
    /// Player leaving an item in a chest, or a bare request for a death chest's contents.
    In { chest_id: EntityId, deposit: Option<ChestDeposit> },
    /// Server handing back a resolved item at an inventory index.
    Out { item: Item, index: i32 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum InteractPayload {
    /// Client requesting an interaction for the item it's holding.
    ClientRequest { item: Item },
    /// Server's resolved response.
    ServerResponse { item: Item, stamina: i32, arrow_count: i32 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Packet {
    Invalid { message: String },
    Ping { kind: PingKind },
    Login { username: String, version: Version },
    Game { mode: String, time: i32, game_speed: f32, past_day: bool, score: i32, player_count: i32, awaken_player: i32 },
    Init { id: i32, width: i32, height: i32, level: i32, x: i32, y: i32 },
    Load { current_level: i32 },
    Tiles { tiles: Vec<Tile> },
    Entities { entities: Vec<Entity> },
    Tile { world: WorldId, position: i32, tile: Tile },
    Entity { payload: EntityPayload },
    Player { version: Version, stats: PlayerStats, inventory: Vec<Item> },
    Move { packed_x: i32, packed_y: i32, direction: Direction, world: WorldId },
    Add { entity: Entity },
    Remove { entity: EntityId, world: Option<WorldId> },
    Disconnect,
    Save,
    Notify { note_time: i32, note: String },
    Interact { payload: InteractPayload },
    Push { entity: EntityId },
    Pickup { entity: EntityId },
    ChestIn { chest_id: EntityId, index: i32, item: Item },
    ChestOut { payload: ChestOutPayload },
    AddItems { items: Vec<Item> },
    Bed { enabled: bool, bed_id: EntityId },
    Potion { kind: PotionType, enabled: bool },
    Hurt { entity: EntityId, damage: f32, direction: Direction },
    Die,
    Respawn,
    Drop { item: Item },
    Stamina { stamina: i32 },
    Shirt { color: Color },
    StopFishing { entity: EntityId },
}

impl Packet {
    pub fn tag(&self) -> u16 {
        use Packet::*;
        match self {
            Invalid { .. } => tag::INVALID,
            Ping { .. } => tag::PING,
            Login { .. } => tag::LOGIN,
            Game { .. } => tag::GAME,
            Init { .. } => tag::INIT,
            Load { .. } => tag::LOAD,
            Tiles { .. } => tag::TILES,
            Entities { .. } => tag::ENTITIES,
            Tile { .. } => tag::TILE,
            Entity { .. } => tag::ENTITY,
            Player { .. } => tag::PLAYER,
            Move { .. } => tag::MOVE,
            Add { .. } => tag::ADD,
            Remove { .. } => tag::REMOVE,
            Disconnect => tag::DISCONNECT,
            Save => tag::SAVE,
            Notify { .. } => tag::NOTIFY,
            Interact { .. } => tag::INTERACT,
            Push { .. } => tag::PUSH,
            Pickup { .. } => tag::PICKUP,
            ChestIn { .. } => tag::CHEST_IN,
            ChestOut { .. } => tag::CHEST_OUT,
            AddItems { .. } => tag::ADD_ITEMS,
            Bed { .. } => tag::BED,
            Potion { .. } => tag::POTION,
            Hurt { .. } => tag::HURT,
            Die => tag::DIE,
            Respawn => tag::RESPAWN,
            Drop { .. } => tag::DROP,
            Stamina { .. } => tag::STAMINA,
            Shirt { .. } => tag::SHIRT,
            StopFishing { .. } => tag::STOP_FISHING,
        }
    }
}

fn malformed(variant: &'static str, raw: &str) -> ProtocolError {
    ProtocolError::Malformed { variant, raw: raw.to_string() }
}

fn parse_bool(variant: &'static str, s: &str) -> Result<bool> {
    match s {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(malformed(variant, s)),
    }
}

fn parse_num<T: std::str::FromStr>(variant: &'static str, s: &str) -> Result<T> {
    s.parse().map_err(|_| malformed(variant, s))
}

/// Encodes a typed packet to its wire `RawPacket`.
pub fn encode(packet: &Packet) -> RawPacket {
    use Packet::*;
    let tag = packet.tag();
    let payload = match packet {
        Invalid { message } => message.clone(),
        Ping { kind } => match kind {
            PingKind::Auto => "auto".to_string(),
            PingKind::Manual => "manual".to_string(),
        },
        Login { username, version } => format!("{};{}", username, version),
        Game { mode, time, game_speed, past_day, score, player_count, awaken_player } => {
            format!("{};{};{};{};{};{};{}", mode, time, game_speed, past_day, score, player_count, awaken_player)
        }
        Init { id, width, height, level, x, y } => format!("{},{},{},{},{},{}", id, width, height, level, x, y),
        Load { current_level } => current_level.to_string(),
        Tiles { tiles } => tiles.iter().map(|t| format!("{},{}", t.id, t.data)).collect::<Vec<_>>().join(","),
        Entities { entities } => entities.iter().map(|e| e.raw()).collect::<Vec<_>>().join(","),
        Tile { world, position, tile } => format!("{};{};{};{}", world, position, tile.id, tile.data),
        Entity { payload } => match payload {
            EntityPayload::Request(id) => id.to_string(),
            EntityPayload::Update { id, delta } => format!("{};{}", id, delta),
            EntityPayload::Full(entity) => entity.raw(),
        },
        Player { version, stats, inventory } => {
            let cur_armor_name = match &stats.cur_armor {
                Some(item) => crate::types::item::item_name(item.material).to_string(),
                None => "NULL".to_string(),
            };
            let potions = stats
                .potions
                .iter()
                .map(|p| format!("{};{}", crate::types::potion::potion_name(p.kind), p.duration))
                .collect::<Vec<_>>()
                .join(":");
            let stats_line = format!(
                "{},{},{},{},{},{},{},{},{},{},{},PotionEffects[{}],{},{}",
                stats.x,
                stats.y,
                stats.spawn_x,
                stats.spawn_y,
                stats.health,
                stats.hunger,
                stats.armor,
                stats.armor_damage_buffer,
                cur_armor_name,
                stats.score,
                stats.level,
                potions,
                stats.shirt_color.raw(),
                stats.skin_on,
            );
            let inventory_line = if inventory.is_empty() {
                "NULL".to_string()
            } else {
                inventory.iter().map(|i| i.raw()).collect::<Vec<_>>().join(",")
            };
            format!("{}\n{}\n{}", version, stats_line, inventory_line)
        }
        Move { packed_x, packed_y, direction, world } => format!("{};{};{};{}", packed_x, packed_y, direction.ordinal(), world),
        Add { entity } => entity.raw(),
        Remove { entity, world } => match world {
            Some(world) => format!("{};{}", entity, world),
            None => entity.to_string(),
        },
        Disconnect | Save | Die | Respawn => String::new(),
        Notify { note_time, note } => format!("{};{}", note_time, note),
        Interact { payload } => match payload {
            InteractPayload::ClientRequest { item } => item.raw(),
            InteractPayload::ServerResponse { item, stamina, arrow_count } => format!("{};{};{}", item.raw(), stamina, arrow_count),
        },
        Push { entity } => entity.to_string(),
        Pickup { entity } => entity.to_string(),
        ChestIn { chest_id, index, item } => format!("{};{};{}", chest_id, index, item.raw()),
        ChestOut { payload } => match payload {
            ChestOutPayload::In { chest_id, deposit: None } => chest_id.to_string(),
            ChestOutPayload::In { chest_id, deposit: Some(d) } => {
                format!("{};{};{};{}", chest_id, d.item_index, d.whole_stack, d.input_index)
            }
            ChestOutPayload::Out { item, index } => format!("{};{}", item.raw(), index),
        },
        // Encodes the list exactly once; the source double-iterates here (prefix write
        // plus a for-each), producing a duplicate leading item, which is not reproduced.
        AddItems { items } => items.iter().map(|i| i.raw()).collect::<Vec<_>>().join(";"),
        Bed { enabled, bed_id } => format!("{};{}", enabled, bed_id),
        Potion { kind, enabled } => format!("{};{}", crate::types::potion::potion_name(*kind), enabled),
        Hurt { entity, damage, direction } => format!("{};{};{}", entity, damage, direction.ordinal()),
        Drop { item } => item.raw(),
        Stamina { stamina } => stamina.to_string(),
        Shirt { color } => color.raw().to_string(),
        StopFishing { entity } => entity.to_string(),
    };
    RawPacket::new(tag, payload)
}

/// Decodes a `RawPacket` into its typed variant, dispatching on `raw.tag`.
/// Tags with no corresponding variant (including the reserved `USERNAMES`
/// tag) yield [`ProtocolError::Unhandled`].
pub fn decode(raw: &RawPacket) -> Result<Packet> {
    let payload = raw.payload.as_str();
    match raw.tag {
        tag::INVALID => Ok(Packet::Invalid { message: payload.to_string() }),
        tag::PING => Ok(Packet::Ping {
            kind: match payload {
                "auto" => PingKind::Auto,
                "manual" => PingKind::Manual,
                _ => return Err(malformed("ping", payload)),
            },
        }),
        tag::LOGIN => {
            let (username, version) = payload.split_once(';').ok_or_else(|| malformed("login", payload))?;
            Ok(Packet::Login { username: username.to_string(), version: Version::parse(version)? })
        }
        tag::GAME => {
            let parts: Vec<&str> = payload.split(';').collect();
            if parts.len() != 7 {
                return Err(malformed("game", payload));
            }
            Ok(Packet::Game {
                mode: parts[0].to_string(),
                time: parse_num("game", parts[1])?,
                game_speed: parse_num("game", parts[2])?,
                past_day: parse_bool("game", parts[3])?,
                score: parse_num("game", parts[4])?,
                player_count: parse_num("game", parts[5])?,
                awaken_player: parse_num("game", parts[6])?,
            })
        }
        tag::INIT => {
            let parts: Vec<&str> = payload.split(',').collect();
            if parts.len() != 6 {
                return Err(malformed("init", payload));
            }
            Ok(Packet::Init {
                id: parse_num("init", parts[0])?,
                width: parse_num("init", parts[1])?,
                height: parse_num("init", parts[2])?,
                level: parse_num("init", parts[3])?,
                x: parse_num("init", parts[4])?,
                y: parse_num("init", parts[5])?,
            })
        }
        tag::LOAD => Ok(Packet::Load { current_level: parse_num("load", payload)? }),
        tag::TILES => {
            if payload.is_empty() {
                return Ok(Packet::Tiles { tiles: Vec::new() });
            }
            let parts: Vec<&str> = payload.split(',').collect();
            if parts.len() % 2 != 0 {
                return Err(malformed("tiles", payload));
            }
            let tiles = parts
                .chunks(2)
                .map(|pair| Ok(Tile::new(parse_num("tiles", pair[0])?, parse_num("tiles", pair[1])?)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Packet::Tiles { tiles })
        }
        tag::ENTITIES => {
            if payload.is_empty() {
                return Ok(Packet::Entities { entities: Vec::new() });
            }
            let entities = split_entity_list(payload).into_iter().map(Entity::parse).collect::<Result<Vec<_>>>()?;
            Ok(Packet::Entities { entities })
        }
        tag::TILE => {
            let parts: Vec<&str> = payload.split(';').collect();
            if parts.len() != 4 {
                return Err(malformed("tile", payload));
            }
            Ok(Packet::Tile {
                world: parse_num("tile", parts[0])?,
                position: parse_num("tile", parts[1])?,
                tile: Tile::new(parse_num("tile", parts[2])?, parse_num("tile", parts[3])?),
            })
        }
        tag::ENTITY => {
            if let Some(bracket) = payload.find('[') {
                if payload.ends_with(']') && bracket > 0 {
                    return Ok(Packet::Entity { payload: EntityPayload::Full(Entity::parse(payload)?) });
                }
            }
            match payload.split_once(';') {
                Some((id, delta)) => Ok(Packet::Entity {
                    payload: EntityPayload::Update { id: parse_num("entity", id)?, delta: delta.to_string() },
                }),
                None => Ok(Packet::Entity { payload: EntityPayload::Request(parse_num("entity", payload)?) }),
            }
        }
        tag::PLAYER => {
            let mut lines = payload.splitn(3, '\n');
            let version = lines.next().ok_or_else(|| malformed("player", payload))?;
            let stats_line = lines.next().ok_or_else(|| malformed("player", payload))?;
            let inventory_line = lines.next().ok_or_else(|| malformed("player", payload))?;

            let stats_fields: Vec<&str> = stats_line.splitn(12, ',').collect();
            if stats_fields.len() != 12 {
                return Err(malformed("player", payload));
            }
            // splitn(12, ',') above leaves "shirtColorRaw,skinOn" bundled together
            // with "PotionEffects[...]" in the 12th field; find the bracket that
            // actually closes the potion list and split the tail back out from
            // there, rather than assuming the field ends at the bracket.
            let potions_field = stats_fields[11];
            let after_open = potions_field.strip_prefix("PotionEffects[").ok_or_else(|| malformed("player", payload))?;
            let bracket_close = after_open.find(']').ok_or_else(|| malformed("player", payload))?;
            let potions_inner = &after_open[..bracket_close];
            let tail = &after_open[bracket_close + 1..];
            let tail_parts: Vec<&str> = tail.trim_start_matches(',').splitn(2, ',').collect();
            if tail_parts.len() != 2 {
                return Err(malformed("player", payload));
            }
            let potions = if potions_inner.is_empty() {
                Vec::new()
            } else {
                potions_inner
                    .split(':')
                    .map(|entry| {
                        let (name, duration) = entry.split_once(';').ok_or_else(|| malformed("player", payload))?;
                        Ok(Potion::new(crate::types::potion::potion_type(name)?, parse_num("player", duration)?))
                    })
                    .collect::<Result<Vec<_>>>()?
            };

            let cur_armor = match stats_fields[8] {
                "NULL" => None,
                name => Some(Item::new(crate::types::item::item_material(name)?)),
            };

            let stats = PlayerStats {
                x: parse_num("player", stats_fields[0])?,
                y: parse_num("player", stats_fields[1])?,
                spawn_x: parse_num("player", stats_fields[2])?,
                spawn_y: parse_num("player", stats_fields[3])?,
                health: parse_num("player", stats_fields[4])?,
                hunger: parse_num("player", stats_fields[5])?,
                armor: parse_num("player", stats_fields[6])?,
                armor_damage_buffer: parse_num("player", stats_fields[7])?,
                cur_armor,
                score: parse_num("player", stats_fields[9])?,
                level: parse_num("player", stats_fields[10])?,
                potions,
                shirt_color: Color::from_raw(parse_num("player", tail_parts[0])?),
                skin_on: parse_bool("player", tail_parts[1])?,
            };

            // Inventory is one item per comma-separated entry (the source's
            // decode re-pairs these with a stride of 2, which does not match
            // its own comma-separated single-item encode grammar; this follows
            // the canonical single-item grammar instead).
            let inventory = if inventory_line == "NULL" || inventory_line.is_empty() {
                Vec::new()
            } else {
                inventory_line.split(',').map(Item::parse).collect::<Result<Vec<_>>>()?
            };

            Ok(Packet::Player { version: Version::parse(version)?, stats, inventory })
        }
        tag::MOVE => {
            let parts: Vec<&str> = payload.split(';').collect();
            if parts.len() != 4 {
                return Err(malformed("move", payload));
            }
            Ok(Packet::Move {
                packed_x: parse_num("move", parts[0])?,
                packed_y: parse_num("move", parts[1])?,
                direction: Direction::from_ordinal(parse_num("move", parts[2])?),
                world: parse_num("move", parts[3])?,
            })
        }
        tag::ADD => Ok(Packet::Add { entity: Entity::parse(payload)? }),
        tag::REMOVE => match payload.split_once(';') {
            Some((id, world)) => Ok(Packet::Remove { entity: parse_num("remove", id)?, world: Some(parse_num("remove", world)?) }),
            None => Ok(Packet::Remove { entity: parse_num("remove", payload)?, world: None }),
        },
        tag::DISCONNECT => Ok(Packet::Disconnect),
        tag::SAVE => Ok(Packet::Save),
        tag::NOTIFY => {
            let (note_time, note) = payload.split_once(';').ok_or_else(|| malformed("notify", payload))?;
            Ok(Packet::Notify { note_time: parse_num("notify", note_time)?, note: note.to_string() })
        }
        tag::INTERACT => {
            let parts: Vec<&str> = payload.split(';').collect();
            match parts.as_slice() {
                [item] => Ok(Packet::Interact { payload: InteractPayload::ClientRequest { item: Item::parse(item)? } }),
                [item, stamina, arrow_count] => Ok(Packet::Interact {
                    payload: InteractPayload::ServerResponse {
                        item: Item::parse(item)?,
                        stamina: parse_num("interact", stamina)?,
                        arrow_count: parse_num("interact", arrow_count)?,
                    },
                }),
                _ => Err(malformed("interact", payload)),
            }
        }
        tag::PUSH => Ok(Packet::Push { entity: parse_num("push", payload)? }),
        tag::PICKUP => Ok(Packet::Pickup { entity: parse_num("pickup", payload)? }),
        tag::CHEST_IN => {
            let parts: Vec<&str> = payload.splitn(3, ';').collect();
            if parts.len() != 3 {
                return Err(malformed("chest_in", payload));
            }
            Ok(Packet::ChestIn {
                chest_id: parse_num("chest_in", parts[0])?,
                index: parse_num("chest_in", parts[1])?,
                item: Item::parse(parts[2])?,
            })
        }
        tag::CHEST_OUT => {
            let parts: Vec<&str> = payload.split(';').collect();
            let payload_variant = match parts.as_slice() {
                [chest_id] => ChestOutPayload::In { chest_id: parse_num("chest_out", chest_id)?, deposit: None },
                [chest_id, item_index, whole_stack, input_index] => ChestOutPayload::In {
                    chest_id: parse_num("chest_out", chest_id)?,
                    deposit: Some(ChestDeposit {
                        item_index: parse_num("chest_out", item_index)?,
                        whole_stack: parse_bool("chest_out", whole_stack)?,
                        input_index: parse_num("chest_out", input_index)?,
                    }),
                },
                [item, index] => ChestOutPayload::Out { item: Item::parse(item)?, index: parse_num("chest_out", index)? },
                _ => return Err(malformed("chest_out", payload)),
            };
            Ok(Packet::ChestOut { payload: payload_variant })
        }
        tag::ADD_ITEMS => {
            if payload.is_empty() {
                return Ok(Packet::AddItems { items: Vec::new() });
            }
            let items = payload.split(';').map(Item::parse).collect::<Result<Vec<_>>>()?;
            Ok(Packet::AddItems { items })
        }
        tag::BED => {
            let (enabled, bed_id) = payload.split_once(';').ok_or_else(|| malformed("bed", payload))?;
            Ok(Packet::Bed { enabled: parse_bool("bed", enabled)?, bed_id: parse_num("bed", bed_id)? })
        }
        tag::POTION => {
            let (kind, enabled) = payload.split_once(';').ok_or_else(|| malformed("potion", payload))?;
            Ok(Packet::Potion { kind: crate::types::potion::potion_type(kind)?, enabled: parse_bool("potion", enabled)? })
        }
        tag::HURT => {
            let parts: Vec<&str> = payload.split(';').collect();
            if parts.len() != 3 {
                return Err(malformed("hurt", payload));
            }
            Ok(Packet::Hurt {
                entity: parse_num("hurt", parts[0])?,
                damage: parse_num("hurt", parts[1])?,
                direction: Direction::from_ordinal(parse_num("hurt", parts[2])?),
            })
        }
        tag::DIE => Ok(Packet::Die),
        tag::RESPAWN => Ok(Packet::Respawn),
        tag::DROP => Ok(Packet::Drop { item: Item::parse(payload)? }),
        tag::STAMINA => Ok(Packet::Stamina { stamina: parse_num("stamina", payload)? }),
        tag::SHIRT => Ok(Packet::Shirt { color: Color::from_raw(parse_num("shirt", payload)?) }),
        tag::STOP_FISHING => Ok(Packet::StopFishing { entity: parse_num("stop_fishing", payload)? }),
        other => Err(ProtocolError::Unhandled { tag: other }),
    }
}

/// Decodes `raw` only if it carries `expected_tag`; otherwise yields
/// [`ProtocolError::TagMismatch`] without attempting to parse the payload.
pub fn decode_expecting(raw: &RawPacket, expected_tag: u16) -> Result<Packet> {
    if raw.tag != expected_tag {
        return Err(ProtocolError::TagMismatch { expected: expected_tag, found: raw.tag });
    }
    decode(raw)
}

/// Entity lists are comma-separated, but individual entity bodies may
/// themselves contain commas inside their bracketed payload; split only on
/// commas outside of `[...]`.
fn split_entity_list(payload: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in payload.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&payload[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&payload[start..]);
    parts
}
