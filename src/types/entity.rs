//! Entity variants and the per-tick "what changed" delta mechanism.
//!
//! The source models entities as a class hierarchy with a shared
//! `Entity::Data` and a map of "field name -> extractor closure" consulted on
//! transmission. Rust prefers a tagged sum with a plain dirty-fields record
//! (see design notes): closures over `self` don't fit ownership as cleanly,
//! and a handful of `Option<T>` staged values serves the same role.

use crate::types::direction::Direction;
use crate::types::fixed::FixedLocation;

pub type EntityId = u32;
pub type WorldId = i16;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Location {
    pub world: WorldId,
    pub position: FixedLocation,
    pub direction: Direction,
}

/// Staged field changes since the last [`Entity::drain_update`], keyed the
/// same way the source's update map is: `eid`, `x`, `y`, `level`. The entity
/// id never changes after construction, so only position and world are
/// tracked here.
#[derive(Debug, Default, Clone, PartialEq)]
struct DirtyFields {
    x: Option<i32>,
    y: Option<i32>,
    level: Option<WorldId>,
}

impl DirtyFields {
    fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.level.is_none()
    }

    fn drain(&mut self) -> String {
        let mut parts = Vec::new();
        if let Some(x) = self.x.take() {
            parts.push(format!("x,{}", x));
        }
        if let Some(y) = self.y.take() {
            parts.push(format!("y,{}", y));
        }
        if let Some(level) = self.level.take() {
            parts.push(format!("level,{}", level));
        }
        parts.join(";")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntityKind {
    /// A fired arrow. Owner is stored by id and resolved through the world's
    /// entity table on use, avoiding the owner/arrow reference cycle.
    Arrow { owner: EntityId, attack_direction: Direction, damage: f32 },
    /// Any entity kind whose wire grammar this crate does not yet model
    /// structurally; its `Name[...]` text is preserved verbatim.
    Generic { name: String, body: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub location: Location,
    pub removed: bool,
    pub kind: EntityKind,
    dirty: DirtyFields,
}

impl Entity {
    pub fn new_arrow(id: EntityId, location: Location, owner: EntityId, attack_direction: Direction, damage: f32) -> Entity {
        Entity { id, location, removed: false, kind: EntityKind::Arrow { owner, attack_direction, damage }, dirty: DirtyFields::default() }
    }

    pub fn set_location(&mut self, location: Location) {
        if self.location.position.packed_x() != location.position.packed_x() {
            self.dirty.x = Some(location.position.packed_x());
        }
        if self.location.position.packed_y() != location.position.packed_y() {
            self.dirty.y = Some(location.position.packed_y());
        }
        if self.location.world != location.world {
            self.dirty.level = Some(location.world);
        }
        self.location = location;
    }

    pub fn remove(&mut self) {
        self.removed = true;
    }

    pub fn has_pending_update(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Drains the accumulated field changes into `field,value;field,value;...`.
    pub fn drain_update(&mut self) -> String {
        self.dirty.drain()
    }

    fn base_raw(&self) -> String {
        format!("{}:{}", self.location.position.packed_x(), self.location.position.packed_y())
    }

    /// Full self-description used by Add/Entities packets.
    pub fn raw(&self) -> String {
        match &self.kind {
            EntityKind::Arrow { owner, attack_direction, damage } => format!(
                "Arrow[{}:{}:{}:{}:{}:{}]",
                self.base_raw(),
                self.id,
                owner,
                attack_direction.ordinal(),
                damage,
                self.location.world,
            ),
            EntityKind::Generic { body, .. } => body.clone(),
        }
    }

    pub fn parse(raw: &str) -> crate::error::Result<Entity> {
        use crate::error::ProtocolError;

        let malformed = || ProtocolError::Malformed { variant: "entity", raw: raw.to_string() };
        let open = raw.find('[').ok_or_else(malformed)?;
        if !raw.ends_with(']') {
            return Err(malformed());
        }
        let name = &raw[..open];
        let inner = &raw[open + 1..raw.len() - 1];

        match name {
            "Arrow" => {
                // `<base>` expands to the packed x:y location pair, so the full
                // bracket body is x:y:id:ownerId:attackDirInt:damage:world — seven
                // colon-separated fields, not six. The source's own decoder
                // (`createArrowEntity` in Entity.cpp) misindexes these (it never
                // reads the owner field by position, relying on a solver lookup by
                // the entity's own id instead); this follows spec.md §4.2.3's
                // canonical grammar rather than reproducing that bug.
                let fields: Vec<&str> = inner.split(':').collect();
                if fields.len() != 7 {
                    return Err(malformed());
                }
                let packed_x: i32 = fields[0].parse().map_err(|_| malformed())?;
                let packed_y: i32 = fields[1].parse().map_err(|_| malformed())?;
                let id: EntityId = fields[2].parse().map_err(|_| malformed())?;
                let owner: EntityId = fields[3].parse().map_err(|_| malformed())?;
                let attack_direction = Direction::from_ordinal(fields[4].parse().map_err(|_| malformed())?);
                let damage: f32 = fields[5].parse().map_err(|_| malformed())?;
                let world: WorldId = fields[6].parse().map_err(|_| malformed())?;
                let location = Location { world, position: FixedLocation::from_packed(packed_x, packed_y), direction: Direction::None };
                Ok(Entity::new_arrow(id, location, owner, attack_direction, damage))
            }
            other => Ok(Entity {
                id: 0,
                location: Location::default(),
                removed: false,
                kind: EntityKind::Generic { name: other.to_string(), body: raw.to_string() },
                dirty: DirtyFields::default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_raw_round_trips() {
        let location = Location { world: 3, position: FixedLocation::new(1, 0, 2, 0), direction: Direction::None };
        let entity = Entity::new_arrow(42, location, 7, Direction::Right, 2.5);
        let raw = entity.raw();
        let parsed = Entity::parse(&raw).unwrap();
        assert_eq!(parsed.id, entity.id);
        assert_eq!(parsed.kind, entity.kind);
        assert_eq!(parsed.location.world, entity.location.world);
        assert_eq!(parsed.location.position, entity.location.position);
    }

    #[test]
    fn arrow_raw_has_seven_colon_separated_fields() {
        let location = Location { world: 3, position: FixedLocation::new(1, 0, 2, 0), direction: Direction::None };
        let entity = Entity::new_arrow(42, location, 7, Direction::Right, 2.5);
        let raw = entity.raw();
        let inner = &raw["Arrow[".len()..raw.len() - 1];
        assert_eq!(inner.split(':').count(), 7);
    }

    #[test]
    fn set_location_marks_only_changed_fields_dirty() {
        let mut entity = Entity::new_arrow(1, Location::default(), 0, Direction::None, 0.0);
        assert!(!entity.has_pending_update());

        let mut next = entity.location;
        next.position.whole_x = 5;
        entity.set_location(next);

        assert!(entity.has_pending_update());
        let update = entity.drain_update();
        assert!(update.contains("x,"));
        assert!(!update.contains("y,"));
        assert!(!entity.has_pending_update());
    }

    #[test]
    fn entity_ids_are_distinct_across_constructions() {
        let a = Entity::new_arrow(1, Location::default(), 0, Direction::None, 0.0);
        let b = Entity::new_arrow(2, Location::default(), 0, Direction::None, 0.0);
        assert_ne!(a.id, b.id);
    }
}
