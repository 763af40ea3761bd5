//! Item materials, their catalog of display names, and the item value type.
//!
//! The original catalog drove variant selection from contiguous numeric id
//! ranges and left most display names unspecified; this reimplementation
//! uses an explicit material → (kind, name) table built once at startup
//! instead (see design notes: "prefer an explicit mapping ... rather than
//! repeating range checks").

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::ProtocolError;
use crate::types::potion::{self, Potion, PotionType};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ItemMaterial {
    Unknown,
    NullMaterial,
    PowerGlove,
    FishingRod,
    Shear,

    FurnitureCowSpawner,
    FurniturePigSpawner,
    FurnitureSheepSpawner,
    FurnitureSlimeSpawner,
    FurnitureZombieSpawner,
    FurnitureCreeperSpawner,
    FurnitureSkeletonSpawner,
    FurnitureSnakeSpawner,
    FurnitureKnightSpawner,
    FurnitureAirWizardSpawner,
    FurnitureChest,
    FurnitureWorkbench,
    FurnitureOven,
    FurnitureFurnace,
    FurnitureAnvil,
    FurnitureEnchanter,
    FurnitureLoom,
    FurnitureLantern,
    FurnitureIronLantern,
    FurnitureGoldLantern,
    FurnitureTnt,
    FurnitureBed,

    Book,
    BookAntidious,

    ToolShovel,
    ToolHoe,
    ToolSword,
    ToolPickaxe,
    ToolAxe,
    ToolBow,
    ToolClaymore,

    StackableWood,
    StackableStone,
    StackableLeather,
    StackableWheat,
    StackableKey,
    StackableArrow,
    StackableString,
    StackableCoal,
    StackableIronOre,
    StackableGoldOre,
    StackableIron,
    StackableGold,
    StackableLapis,
    StackableGem,
    StackableRose,
    StackableGunPowder,
    StackableSlime,
    StackableGlass,
    StackableCloth,
    StackableScale,
    StackableShard,

    ArmorLeather,
    ArmorSnake,
    ArmorIron,
    ArmorGold,
    ArmorGem,

    BucketEmpty,
    BucketWater,
    BucketLava,

    ClothingRed,
    ClothingBlue,
    ClothingGreen,
    ClothingYellow,
    ClothingBlack,
    ClothingOrange,
    ClothingPurple,
    ClothingCyan,
    ClothingReg,

    FoodApple,
    FoodRawPork,
    FoodRawFish,
    FoodRawBeef,
    FoodBread,
    FoodCookedFish,
    FoodCookedPork,
    FoodSteak,
    FoodGoldApple,

    Potion,

    TileFlower,
    TileAcorn,
    TileDirt,
    TilePlank,
    TilePlankWall,
    TileWoodDoor,
    TileStoneBrick,
    TileStoneWall,
    TileStoneDoor,
    TileObsidianBrick,
    TileObsidianWall,
    TileObsidianDoor,
    TileWool,
    TileRedWool,
    TileBlueWool,
    TileGreenWool,
    TileYellowWool,
    TileBlackWool,
    TileSand,
    TileCactus,
    TileBone,
    TileCloud,
    TileWheatSeeds,
    TilePotato,
    TileGrassSeeds,

    TorchItem,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Plain,
    Stackable,
    Tool,
    Spawner,
    Potion,
    FishingRod,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ToolLevel {
    #[default]
    Wood,
    Rock,
    Iron,
    Gold,
    Gem,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FishingRodLevel {
    #[default]
    Wood,
    Iron,
    Gold,
    Gem,
}

impl ToolLevel {
    pub fn name(self) -> &'static str {
        match self {
            ToolLevel::Wood => "Wood",
            ToolLevel::Rock => "Rock",
            ToolLevel::Iron => "Iron",
            ToolLevel::Gold => "Gold",
            ToolLevel::Gem => "Gem",
        }
    }

    pub fn parse(name: &str) -> Result<ToolLevel, ProtocolError> {
        Ok(match name {
            "Wood" => ToolLevel::Wood,
            "Rock" => ToolLevel::Rock,
            "Iron" => ToolLevel::Iron,
            "Gold" => ToolLevel::Gold,
            "Gem" => ToolLevel::Gem,
            other => return Err(ProtocolError::Malformed { variant: "tool_level", raw: other.to_string() }),
        })
    }
}

impl FishingRodLevel {
    pub fn name(self) -> &'static str {
        match self {
            FishingRodLevel::Wood => "Wood",
            FishingRodLevel::Iron => "Iron",
            FishingRodLevel::Gold => "Gold",
            FishingRodLevel::Gem => "Gem",
        }
    }

    pub fn parse(name: &str) -> Result<FishingRodLevel, ProtocolError> {
        Ok(match name {
            "Wood" => FishingRodLevel::Wood,
            "Iron" => FishingRodLevel::Iron,
            "Gold" => FishingRodLevel::Gold,
            "Gem" => FishingRodLevel::Gem,
            other => return Err(ProtocolError::Malformed { variant: "fishing_rod_level", raw: other.to_string() }),
        })
    }
}

macro_rules! catalog {
    ($({ $material:ident, $kind:ident, $name:expr })+) => {
        const CATALOG: &[(ItemMaterial, ItemKind, &str)] = &[
            $((ItemMaterial::$material, ItemKind::$kind, $name)),+
        ];
    };
}

catalog! {
    { Unknown, Plain, "Unknown Blank" }
    { NullMaterial, Plain, "NULL" }
    { PowerGlove, Plain, "Power Glove" }
    { FishingRod, FishingRod, "Fishing Rod" }
    { Shear, Plain, "Shear" }

    { FurnitureCowSpawner, Spawner, "Cow Spawner" }
    { FurniturePigSpawner, Spawner, "Pig Spawner" }
    { FurnitureSheepSpawner, Spawner, "Sheep Spawner" }
    { FurnitureSlimeSpawner, Spawner, "Slime Spawner" }
    { FurnitureZombieSpawner, Spawner, "Zombie Spawner" }
    { FurnitureCreeperSpawner, Spawner, "Creeper Spawner" }
    { FurnitureSkeletonSpawner, Spawner, "Skeleton Spawner" }
    { FurnitureSnakeSpawner, Spawner, "Snake Spawner" }
    { FurnitureKnightSpawner, Spawner, "Knight Spawner" }
    { FurnitureAirWizardSpawner, Spawner, "AirWizard Spawner" }
    { FurnitureChest, Plain, "Chest" }
    { FurnitureWorkbench, Plain, "Workbench" }
    { FurnitureOven, Plain, "Oven" }
    { FurnitureFurnace, Plain, "Furnace" }
    { FurnitureAnvil, Plain, "Anvil" }
    { FurnitureEnchanter, Plain, "Enchanter" }
    { FurnitureLoom, Plain, "Loom" }
    { FurnitureLantern, Plain, "Lantern" }
    { FurnitureIronLantern, Plain, "Iron Lantern" }
    { FurnitureGoldLantern, Plain, "Gold Lantern" }
    { FurnitureTnt, Plain, "Tnt" }
    { FurnitureBed, Plain, "Bed" }

    { Book, Plain, "Book" }
    { BookAntidious, Plain, "Book Antidious" }

    { ToolShovel, Tool, "Shovel" }
    { ToolHoe, Tool, "Hoe" }
    { ToolSword, Tool, "Sword" }
    { ToolPickaxe, Tool, "Pickaxe" }
    { ToolAxe, Tool, "Axe" }
    { ToolBow, Tool, "Bow" }
    { ToolClaymore, Tool, "Claymore" }

    { StackableWood, Stackable, "Wood" }
    { StackableStone, Stackable, "Stone" }
    { StackableLeather, Stackable, "Leather" }
    { StackableWheat, Stackable, "Wheat" }
    { StackableKey, Stackable, "Key" }
    { StackableArrow, Stackable, "Arrow" }
    { StackableString, Stackable, "String" }
    { StackableCoal, Stackable, "Coal" }
    { StackableIronOre, Stackable, "Iron Ore" }
    { StackableGoldOre, Stackable, "Gold Ore" }
    { StackableIron, Stackable, "Iron" }
    { StackableGold, Stackable, "Gold" }
    { StackableLapis, Stackable, "Lapis" }
    { StackableGem, Stackable, "Gem" }
    { StackableRose, Stackable, "Rose" }
    { StackableGunPowder, Stackable, "Gun Powder" }
    { StackableSlime, Stackable, "Slime" }
    { StackableGlass, Stackable, "Glass" }
    { StackableCloth, Stackable, "Cloth" }
    { StackableScale, Stackable, "Scale" }
    { StackableShard, Stackable, "Shard" }

    { ArmorLeather, Stackable, "Leather Armor" }
    { ArmorSnake, Stackable, "Snake Armor" }
    { ArmorIron, Stackable, "Iron Armor" }
    { ArmorGold, Stackable, "Gold Armor" }
    { ArmorGem, Stackable, "Gem Armor" }

    { BucketEmpty, Stackable, "Bucket Empty" }
    { BucketWater, Stackable, "Bucket Water" }
    { BucketLava, Stackable, "Bucket Lava" }

    { ClothingRed, Stackable, "Red Shirt" }
    { ClothingBlue, Stackable, "Blue Shirt" }
    { ClothingGreen, Stackable, "Green Shirt" }
    { ClothingYellow, Stackable, "Yellow Shirt" }
    { ClothingBlack, Stackable, "Black Shirt" }
    { ClothingOrange, Stackable, "Orange Shirt" }
    { ClothingPurple, Stackable, "Purple Shirt" }
    { ClothingCyan, Stackable, "Cyan Shirt" }
    { ClothingReg, Stackable, "Reg Shirt" }

    { FoodApple, Stackable, "Apple" }
    { FoodRawPork, Stackable, "Raw Pork" }
    { FoodRawFish, Stackable, "Raw Fish" }
    { FoodRawBeef, Stackable, "Raw Beef" }
    { FoodBread, Stackable, "Bread" }
    { FoodCookedFish, Stackable, "Cooked Fish" }
    { FoodCookedPork, Stackable, "Cooked Pork" }
    { FoodSteak, Stackable, "Steak" }
    { FoodGoldApple, Stackable, "Gold Apple" }

    { Potion, Potion, "Potion" }

    { TileFlower, Stackable, "Flower" }
    { TileAcorn, Stackable, "Acorn" }
    { TileDirt, Stackable, "Dirt" }
    { TilePlank, Stackable, "Plank" }
    { TilePlankWall, Stackable, "Plank Wall" }
    { TileWoodDoor, Stackable, "Wood Door" }
    { TileStoneBrick, Stackable, "Stone Brick" }
    { TileStoneWall, Stackable, "Stone Wall" }
    { TileStoneDoor, Stackable, "Stone Door" }
    { TileObsidianBrick, Stackable, "Obsidian Brick" }
    { TileObsidianWall, Stackable, "Obsidian Wall" }
    { TileObsidianDoor, Stackable, "Obsidian Door" }
    { TileWool, Stackable, "Wool" }
    { TileRedWool, Stackable, "Red Wool" }
    { TileBlueWool, Stackable, "Blue Wool" }
    { TileGreenWool, Stackable, "Green Wool" }
    { TileYellowWool, Stackable, "Yellow Wool" }
    { TileBlackWool, Stackable, "Black Wool" }
    { TileSand, Stackable, "Sand" }
    { TileCactus, Stackable, "Cactus" }
    { TileBone, Stackable, "Bone" }
    { TileCloud, Stackable, "Cloud" }
    { TileWheatSeeds, Stackable, "Wheat Seeds" }
    { TilePotato, Stackable, "Potato" }
    { TileGrassSeeds, Stackable, "Grass Seeds" }

    { TorchItem, Plain, "Torch" }
}

struct Tables {
    kind: HashMap<ItemMaterial, ItemKind>,
    name: HashMap<ItemMaterial, &'static str>,
    by_name: HashMap<&'static str, ItemMaterial>,
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| Tables {
        kind: CATALOG.iter().map(|&(m, k, _)| (m, k)).collect(),
        name: CATALOG.iter().map(|&(m, _, n)| (m, n)).collect(),
        by_name: CATALOG.iter().map(|&(m, _, n)| (n, m)).collect(),
    })
}

pub fn item_kind(material: ItemMaterial) -> ItemKind {
    *tables().kind.get(&material).unwrap_or(&ItemKind::Plain)
}

pub fn item_name(material: ItemMaterial) -> &'static str {
    tables().name.get(&material).copied().unwrap_or("Unknown Blank")
}

pub fn item_material(name: &str) -> Result<ItemMaterial, ProtocolError> {
    tables()
        .by_name
        .get(name)
        .copied()
        .ok_or_else(|| ProtocolError::Malformed { variant: "item_material", raw: name.to_string() })
}

#[derive(Clone, Debug, PartialEq)]
pub enum ItemData {
    Plain,
    Stackable { amount: u16 },
    Tool { level: ToolLevel, durability: i32 },
    Spawner { health: i32, level: i32, max_mob_level: i32 },
    Potion { amount: u16, potion: Potion },
    FishingRod { level: FishingRodLevel },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub material: ItemMaterial,
    pub data: ItemData,
}

impl Item {
    pub fn new(material: ItemMaterial) -> Item {
        let data = match item_kind(material) {
            ItemKind::Plain => ItemData::Plain,
            ItemKind::Stackable => ItemData::Stackable { amount: 1 },
            ItemKind::Tool => ItemData::Tool { level: ToolLevel::default(), durability: 0 },
            ItemKind::Spawner => ItemData::Spawner { health: 0, level: 0, max_mob_level: 0 },
            ItemKind::Potion => ItemData::Potion { amount: 1, potion: Potion::with_default_duration(PotionType::None) },
            ItemKind::FishingRod => ItemData::FishingRod { level: FishingRodLevel::default() },
        };
        Item { material, data }
    }

    pub fn null() -> Item {
        Item { material: ItemMaterial::NullMaterial, data: ItemData::Plain }
    }

    /// Formats this item per the item-raw grammar (§4.2.2):
    /// tools → "`<levelName> <itemName>`", stackables → "`<itemName>_<amount>`",
    /// potions → "`<potionName>_<amount>`", everything else → "`<itemName>`".
    pub fn raw(&self) -> String {
        match &self.data {
            ItemData::Tool { level, .. } => format!("{} {}", level.name(), item_name(self.material)),
            ItemData::Stackable { amount } => format!("{}_{}", item_name(self.material), amount),
            ItemData::Potion { amount, potion } => format!("{}_{}", potion::potion_name(potion.kind), amount),
            _ => item_name(self.material).to_string(),
        }
    }

    /// Parses a single item-raw entry (§4.2.2).
    ///
    /// Catalog names beginning with a word that also spells a [`ToolLevel`]
    /// ("Gold Apple", "Iron Ore", "Iron Armor", "Gold Lantern", ...) would
    /// otherwise be misread as a level-prefixed tool; the trailing `_amount`
    /// (stackable/potion) shape and a direct catalog match are both tried
    /// before falling back to the tool grammar, and the tool grammar itself
    /// only commits once `rest` actually names a tool-kind material.
    pub fn parse(raw: &str) -> Result<Item, ProtocolError> {
        let malformed = || ProtocolError::Malformed { variant: "item", raw: raw.to_string() };

        if let Some((prefix, amount)) = raw.rsplit_once('_') {
            if let Ok(amount) = amount.parse::<u16>() {
                if let Ok(potion_kind) = potion::potion_type(prefix) {
                    return Ok(Item {
                        material: ItemMaterial::Potion,
                        data: ItemData::Potion { amount, potion: Potion::with_default_duration(potion_kind) },
                    });
                }
                if let Ok(material) = item_material(prefix) {
                    return Ok(Item { material, data: ItemData::Stackable { amount } });
                }
            }
        }

        if let Some((level_name, rest)) = raw.split_once(' ') {
            if let Ok(level) = ToolLevel::parse(level_name) {
                if let Ok(material) = item_material(rest) {
                    if item_kind(material) == ItemKind::Tool {
                        return Ok(Item { material, data: ItemData::Tool { level, durability: 0 } });
                    }
                }
            }
        }

        let material = item_material(raw).map_err(|_| malformed())?;
        Ok(Item::new(material))
    }
}
