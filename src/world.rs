//! Authoritative shared state: worlds indexed by id, chunks indexed by a 2D
//! coordinate, entities indexed by id within their world.
//!
//! The source keeps one `unordered_map<Vector2i, Chunk>` per `World` and a
//! process-wide `static EntityId next_entity_id` (`Entity.cpp`). The crate
//! reproduces the coordinate hash exactly (`std::hash<mcplus::Vector2i>` in
//! `Dimension.h`: `h(x) ^ (h(y) << 1)`) and replaces the bare global counter
//! with an `AtomicU32` owned by the store (see design notes: "never a true
//! global").

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::types::entity::{Entity, EntityId, WorldId};
use crate::types::tile::Tile;

pub const CHUNK_WIDTH: usize = 16;
pub const CHUNK_HEIGHT: usize = 16;
pub const CHUNK_SIZE: usize = CHUNK_WIDTH * CHUNK_HEIGHT;

/// An integer 2D chunk coordinate with the source's exact hash shape.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, y: i32) -> ChunkCoord {
        ChunkCoord { x, y }
    }
}

impl Hash for ChunkCoord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // h(x) XOR (h(y) << 1), matching std::hash<mcplus::Vector2i> rather
        // than deriving from the (x, y) tuple.
        let h1 = fnv1a(self.x);
        let h2 = fnv1a(self.y);
        (h1 ^ (h2 << 1)).hash(state);
    }
}

fn fnv1a(value: i32) -> u64 {
    let mut hash = 0xcbf29ce484222325u64;
    for byte in value.to_le_bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// A fixed 16x16 grid of tiles, row-major: `x + y*16`.
#[derive(Clone, Debug)]
pub struct Chunk {
    tiles: Box<[Tile; CHUNK_SIZE]>,
}

impl Chunk {
    pub fn new() -> Chunk {
        Chunk { tiles: Box::new([Tile::default(); CHUNK_SIZE]) }
    }

    fn index(x: usize, y: usize) -> usize {
        x + y * CHUNK_WIDTH
    }

    pub fn tile_at(&self, x: usize, y: usize) -> Tile {
        self.tiles[Chunk::index(x, y)]
    }

    pub fn set_tile_at(&mut self, x: usize, y: usize, tile: Tile) {
        self.tiles[Chunk::index(x, y)] = tile;
    }

    /// Row-major `(id, data)` pairs, as used by the Tiles packet.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        self.tiles.iter().copied()
    }
}

impl Default for Chunk {
    fn default() -> Chunk {
        Chunk::new()
    }
}

/// A named collection of chunks and entities, identified by a [`WorldId`].
pub struct World {
    pub name: String,
    chunks: HashMap<ChunkCoord, Chunk>,
    entities: HashMap<EntityId, Entity>,
}

impl World {
    pub fn new(name: impl Into<String>) -> World {
        World { name: name.into(), chunks: HashMap::new(), entities: HashMap::new() }
    }

    /// Loads the chunk at `coord` on demand; chunks are never evicted.
    pub fn chunk_at(&mut self, coord: ChunkCoord) -> &Chunk {
        self.chunks.entry(coord).or_insert_with(Chunk::new)
    }

    pub fn chunk_at_if_loaded(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn insert_entity(&mut self, entity: Entity) {
        self.entities.insert(entity.id, entity);
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Removes entities whose `removed` flag is set, yielding their ids so
    /// callers can emit the final Remove packet to observers.
    pub fn drain_removed(&mut self) -> Vec<EntityId> {
        let removed: Vec<EntityId> = self.entities.values().filter(|e| e.removed).map(|e| e.id).collect();
        for id in &removed {
            self.entities.remove(id);
        }
        removed
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }
}

/// Worlds indexed by id, plus the process-wide monotonic entity id counter.
///
/// `EntityId`s are never reused within a process lifetime (§3 invariant);
/// the counter is shared across every world rather than reset per-world.
pub struct WorldStore {
    worlds: HashMap<WorldId, World>,
    next_entity_id: AtomicU32,
}

impl WorldStore {
    pub fn new() -> WorldStore {
        WorldStore { worlds: HashMap::new(), next_entity_id: AtomicU32::new(0) }
    }

    pub fn next_entity_id(&self) -> EntityId {
        self.next_entity_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn load_world(&mut self, id: WorldId, name: impl Into<String>) -> &mut World {
        self.worlds.entry(id).or_insert_with(|| World::new(name))
    }

    pub fn world(&self, id: WorldId) -> Option<&World> {
        self.worlds.get(&id)
    }

    pub fn world_mut(&mut self, id: WorldId) -> Option<&mut World> {
        self.worlds.get_mut(&id)
    }

    pub fn unload_world(&mut self, id: WorldId) {
        self.worlds.remove(&id);
    }

    pub fn world_ids(&self) -> impl Iterator<Item = WorldId> + '_ {
        self.worlds.keys().copied()
    }
}

impl Default for WorldStore {
    fn default() -> WorldStore {
        WorldStore::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::direction::Direction;
    use crate::types::entity::Location;
    use crate::types::fixed::FixedLocation;

    #[test]
    fn chunk_coordinate_never_maps_to_two_chunks() {
        let mut world = World::new("overworld");
        let coord = ChunkCoord::new(3, -2);
        world.chunk_at(coord).tile_at(0, 0);
        let first_ptr = world.chunk_at(coord) as *const Chunk;
        let second_ptr = world.chunk_at(coord) as *const Chunk;
        assert_eq!(first_ptr, second_ptr);
        assert_eq!(world.chunk_count(), 1);
    }

    #[test]
    fn entity_ids_never_reused_across_sequence_of_constructions() {
        let store = WorldStore::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(store.next_entity_id()));
        }
    }

    #[test]
    fn tile_round_trips_through_chunk_grid() {
        let mut chunk = Chunk::new();
        chunk.set_tile_at(5, 7, Tile::new(42, 3));
        assert_eq!(chunk.tile_at(5, 7), Tile::new(42, 3));
        assert_eq!(chunk.tile_at(0, 0), Tile::default());
    }

    #[test]
    fn chunk_row_major_layout_matches_x_plus_y_times_16() {
        let mut chunk = Chunk::new();
        chunk.set_tile_at(1, 2, Tile::new(9, 0));
        let flat: Vec<Tile> = chunk.tiles().collect();
        assert_eq!(flat[1 + 2 * 16], Tile::new(9, 0));
    }

    #[test]
    fn removed_entities_are_drained_and_forgotten() {
        let mut world = World::new("overworld");
        let location = Location { world: 0, position: FixedLocation::default(), direction: Direction::None };
        let mut entity = Entity::new_arrow(1, location, 0, Direction::None, 0.0);
        world.insert_entity(entity.clone());
        entity.remove();
        world.insert_entity(entity);

        let removed = world.drain_removed();
        assert_eq!(removed, vec![1]);
        assert!(world.entity(1).is_none());
    }

    #[test]
    fn world_store_loads_world_on_demand_and_reuses_it() {
        let mut store = WorldStore::new();
        store.load_world(0, "overworld");
        assert!(store.world(0).is_some());
        assert!(store.world(1).is_none());
    }
}
