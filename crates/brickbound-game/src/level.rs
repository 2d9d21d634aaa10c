//! Level text → world builder.
//!
//! A level is a character grid, one block cell per character. Each character
//! maps to a block/item/mob identity through the fixed lookup tables below;
//! anything unmapped becomes a generic placeholder entity so typos in a level
//! file degrade visibly instead of fatally. An identity id with no registered
//! constructor, on the other hand, aborts the load: no partial world is ever
//! exposed.

use std::fs;
use std::path::Path;

use glam::Vec2;

use brickbound_engine::{
    BlockKind, EntityId, GoalKind, GoalState, ItemKind, MobState, MysteryState, SwitchState,
};

use crate::config::ConfigError;
use crate::contact::ContactKind;

pub type GameWorld = brickbound_engine::World<ContactKind>;

/// Side of one grid cell in world units.
pub const BLOCK_SIZE: f32 = 16.0;

/// Goal footprints in cells: the flag is a tall thin pole, the tunnel a
/// two-by-two mouth.
const FLAG_CELLS: (f32, f32) = (0.2, 9.0);
const TUNNEL_CELLS: (f32, f32) = (2.0, 2.0);

/// Drop configuration for the coin mystery block.
const MYSTERY_COIN_RANGE: (u32, u32) = (3, 6);

fn block_ident(ch: char) -> Option<&'static str> {
    Some(match ch {
        '#' => "brick",
        '%' => "brick_base",
        '?' => "mystery_empty",
        '$' => "mystery_coin",
        '^' => "cube",
        'b' => "bounce_block",
        '=' => "tunnel",
        'I' => "flag",
        'S' => "switch",
        _ => return None,
    })
}

fn item_ident(ch: char) -> Option<&'static str> {
    Some(match ch {
        'C' => "coin",
        '*' => "star",
        _ => return None,
    })
}

fn mob_ident(ch: char) -> Option<&'static str> {
    Some(match ch {
        '&' => "cloud",
        '@' => "mushroom",
        _ => return None,
    })
}

fn block_for(ident: &str) -> Result<BlockKind, ConfigError> {
    Ok(match ident {
        "brick" | "brick_base" | "cube" => BlockKind::Plain,
        "mystery_empty" => BlockKind::Mystery(MysteryState::new(None, None)),
        "mystery_coin" => {
            BlockKind::Mystery(MysteryState::new(Some("coin"), Some(MYSTERY_COIN_RANGE)))
        }
        "bounce_block" => BlockKind::Bounce,
        "flag" => BlockKind::Goal(GoalState {
            kind: GoalKind::Flag,
            cell_size: FLAG_CELLS,
        }),
        "tunnel" => BlockKind::Goal(GoalState {
            kind: GoalKind::Tunnel,
            cell_size: TUNNEL_CELLS,
        }),
        "switch" | "switch_up" => BlockKind::Switch(SwitchState::new()),
        "empty_block" => BlockKind::Empty,
        _ => return Err(ConfigError::UnknownIdentity(ident.to_owned())),
    })
}

/// Items fall back to a generic dropped item for unrecognized identities.
pub fn item_for(ident: &str) -> ItemKind {
    match ident {
        "coin" => ItemKind::Coin,
        "star" => ItemKind::Star,
        _ => ItemKind::Dropped,
    }
}

fn mob_for(ident: &str) -> Result<MobState, ConfigError> {
    Ok(match ident {
        "mushroom" => MobState::mushroom(),
        "cloud" => MobState::cloud(crate::behavior::CLOUD_DROP_INTERVAL),
        "fireball" => MobState::fireball(),
        _ => return Err(ConfigError::UnknownIdentity(ident.to_owned())),
    })
}

/// World center for a kind-sized block anchored to grid cell (x, y): the
/// footprint sits on the cell's bottom edge, so tall goals grow upward.
fn anchored_center(x: usize, y: usize, cells: (f32, f32)) -> Vec2 {
    Vec2::new(
        x as f32 * BLOCK_SIZE + cells.0 * BLOCK_SIZE / 2.0,
        (y as f32 + 1.0) * BLOCK_SIZE - cells.1 * BLOCK_SIZE / 2.0,
    )
}

fn cell_center(x: usize, y: usize) -> Vec2 {
    anchored_center(x, y, (1.0, 1.0))
}

/// Create a block by identity at grid cell (x, y).
pub fn create_block(
    world: &mut GameWorld,
    ident: &str,
    x: usize,
    y: usize,
) -> Result<EntityId, ConfigError> {
    let kind = block_for(ident)?;
    let cells = match &kind {
        BlockKind::Goal(goal) => goal.cell_size,
        _ => (1.0, 1.0),
    };
    let pos = anchored_center(x, y, cells);
    Ok(world.add_block(ident, kind, pos.x, pos.y))
}

/// Create an item by identity at grid cell (x, y).
pub fn create_item(world: &mut GameWorld, ident: &str, x: usize, y: usize) -> EntityId {
    let pos = cell_center(x, y);
    world.add_item(ident, item_for(ident), pos.x, pos.y)
}

/// Create a mob by identity at grid cell (x, y).
pub fn create_mob(
    world: &mut GameWorld,
    ident: &str,
    x: usize,
    y: usize,
) -> Result<EntityId, ConfigError> {
    let state = mob_for(ident)?;
    let pos = cell_center(x, y);
    Ok(world.add_mob(ident, state, pos.x, pos.y))
}

/// Build a world from level text. Row 0 is the top of the level.
pub fn build_world(text: &str, gravity: f32) -> Result<GameWorld, ConfigError> {
    let rows: Vec<&str> = text.lines().collect();
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let mut world = GameWorld::new(gravity, BLOCK_SIZE);
    world.set_bounds(width as f32 * BLOCK_SIZE, rows.len() as f32 * BLOCK_SIZE);

    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            if ch == ' ' {
                continue;
            }
            if let Some(ident) = block_ident(ch) {
                create_block(&mut world, ident, x, y)?;
            } else if let Some(ident) = item_ident(ch) {
                create_item(&mut world, ident, x, y);
            } else if let Some(ident) = mob_ident(ch) {
                create_mob(&mut world, ident, x, y)?;
            } else {
                let pos = cell_center(x, y);
                world.add_thing("unknown", pos.x, pos.y, Vec2::splat(BLOCK_SIZE));
            }
        }
    }
    Ok(world)
}

/// Load and build the level named by `path` (level names are file paths).
pub fn load_world(path: impl AsRef<Path>, gravity: f32) -> Result<GameWorld, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    build_world(&text, gravity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brickbound_engine::Category;

    #[test]
    fn builds_blocks_items_and_mobs() {
        let world = build_world("#C@\n%%%\n", 300.0).unwrap();
        let idents: Vec<&str> = world.get_all_things().map(|e| e.ident.as_str()).collect();
        assert!(idents.contains(&"brick"));
        assert!(idents.contains(&"coin"));
        assert!(idents.contains(&"mushroom"));
        assert_eq!(idents.iter().filter(|i| **i == "brick_base").count(), 3);
    }

    #[test]
    fn unknown_char_becomes_placeholder_at_grid_position() {
        let world = build_world("  \n x\n", 300.0).unwrap();
        let thing = world
            .get_all_things()
            .find(|e| e.ident == "unknown")
            .expect("placeholder entity");
        assert_eq!(thing.category, Category::Block);
        // Cell (1, 1), centered, scaled by the block size constant.
        assert_eq!(thing.pos.x, 1.5 * BLOCK_SIZE);
        assert_eq!(thing.pos.y, 1.5 * BLOCK_SIZE);
    }

    #[test]
    fn unknown_identity_aborts_the_load() {
        let mut world = GameWorld::new(300.0, BLOCK_SIZE);
        assert!(matches!(
            create_block(&mut world, "obsidian", 0, 0),
            Err(ConfigError::UnknownIdentity(_))
        ));
        assert!(matches!(
            create_mob(&mut world, "dragon", 0, 0),
            Err(ConfigError::UnknownIdentity(_))
        ));
    }

    #[test]
    fn flag_grows_upward_from_its_cell() {
        let mut world = GameWorld::new(300.0, BLOCK_SIZE);
        let id = create_block(&mut world, "flag", 2, 8).unwrap();
        let flag = world.get(id).unwrap();
        assert_eq!(flag.size.y, 9.0 * BLOCK_SIZE);
        // Bottom edge flush with the bottom of cell row 8.
        let bottom = flag.pos.y + flag.size.y / 2.0;
        assert_eq!(bottom, 9.0 * BLOCK_SIZE);
    }

    #[test]
    fn mystery_coin_carries_drop_range() {
        let mut world = GameWorld::new(300.0, BLOCK_SIZE);
        let id = create_block(&mut world, "mystery_coin", 0, 0).unwrap();
        match world.get(id).unwrap().block() {
            Some(BlockKind::Mystery(m)) => {
                assert_eq!(m.drop.as_deref(), Some("coin"));
                assert_eq!(m.drop_range, Some((3, 6)));
                assert!(m.active);
            }
            other => panic!("expected mystery block, got {other:?}"),
        }
    }
}
