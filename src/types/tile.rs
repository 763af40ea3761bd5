//! Tile materials and the wire `Tile` value (id + data byte).

use std::sync::OnceLock;
use std::collections::HashMap;

use crate::error::ProtocolError;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Tile {
    pub id: u16,
    pub data: u8,
}

impl Tile {
    pub fn new(id: u16, data: u8) -> Tile {
        Tile { id, data }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TileMaterial {
    Grass,
    Dirt,
    Flower,
    Hole,
    StairsUp,
    StairsDown,
    Water,
    Lava,
    Rock,
    Tree,
    TreeSapling,
    Sand,
    Cactus,
    CactusSapling,
    IronOre,
    GoldOre,
    GemOre,
    LapisOre,
    LavaBrick,
    Exploded,
    Farmland,
    Wheat,
    HardRock,
    InfiniteFall,
    Cloud,
    CloudCactus,
    WoodDoor,
    StoneDoor,
    ObsidianDoor,
    WoodFloor,
    StoneFloor,
    ObsidianFloor,
    WoodWall,
    StoneWall,
    ObsidianWall,
    Wool,
    RedWool,
    BlueWool,
    GreenWool,
    YellowWool,
    BlackWool,
    Path,
    Potato,
    Torch,
}

const CATALOG: &[(TileMaterial, &str)] = {
    use TileMaterial::*;
    &[
        (Grass, "Grass"),
        (Dirt, "Dirt"),
        (Flower, "Flower"),
        (Hole, "Hole"),
        (StairsUp, "Stairs Up"),
        (StairsDown, "Stairs Down"),
        (Water, "Water"),
        (Lava, "Lava"),
        (Rock, "Rock"),
        (Tree, "Tree"),
        (TreeSapling, "Tree Sapling"),
        (Sand, "Sand"),
        (Cactus, "Cactus"),
        (CactusSapling, "Cactus Sapling"),
        (IronOre, "Iron Ore"),
        (GoldOre, "Gold Ore"),
        (GemOre, "Gem Ore"),
        (LapisOre, "Lapis Ore"),
        (LavaBrick, "Lava Brick"),
        (Exploded, "Explode"),
        (Farmland, "Farmland"),
        (Wheat, "Wheat"),
        (HardRock, "Hard Rock"),
        (InfiniteFall, "Infinite Fall"),
        (Cloud, "Cloud"),
        (CloudCactus, "Cloud Cactus"),
        (WoodDoor, "Wood Door"),
        (StoneDoor, "Stone Door"),
        (ObsidianDoor, "Obsidian Door"),
        (WoodFloor, "Wood Floor"),
        (StoneFloor, "Stone Floor"),
        (ObsidianFloor, "Obsidian Floor"),
        (WoodWall, "Wood Wall"),
        (StoneWall, "Stone Wall"),
        (ObsidianWall, "Obsidian Wall"),
        (Wool, "Wool"),
        (RedWool, "Red Wool"),
        (BlueWool, "Blue Wool"),
        (GreenWool, "Green Wool"),
        (YellowWool, "Yellow Wool"),
        (BlackWool, "Black Wool"),
        (Path, "Path"),
        (Potato, "Potato"),
        (Torch, "Torch"),
    ]
};

fn name_table() -> &'static HashMap<TileMaterial, &'static str> {
    static TABLE: OnceLock<HashMap<TileMaterial, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| CATALOG.iter().copied().collect())
}

fn reverse_table() -> &'static HashMap<&'static str, TileMaterial> {
    static TABLE: OnceLock<HashMap<&'static str, TileMaterial>> = OnceLock::new();
    TABLE.get_or_init(|| CATALOG.iter().map(|&(m, n)| (n, m)).collect())
}

pub fn tile_name(material: TileMaterial) -> &'static str {
    name_table().get(&material).copied().unwrap_or("Unknown")
}

pub fn tile_material(name: &str) -> Result<TileMaterial, ProtocolError> {
    reverse_table()
        .get(name)
        .copied()
        .ok_or_else(|| ProtocolError::Malformed { variant: "tile_material", raw: name.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_entry_round_trips_through_its_name() {
        for &(material, name) in CATALOG {
            assert_eq!(tile_name(material), name);
            assert_eq!(tile_material(name).unwrap(), material);
        }
    }

    #[test]
    fn unknown_name_is_malformed() {
        assert!(tile_material("Not A Real Tile").is_err());
    }
}
