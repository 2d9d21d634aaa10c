//! Typed entity model: a fat entity struct with a tagged-variant `kind`
//! carrying subtype state. Favors plain data over ECS machinery; the world
//! holds entities in a flat Vec.

pub mod block;
pub mod item;
pub mod mob;
pub mod player;

use glam::Vec2;

use crate::api::types::{Category, EntityId};
use crate::core::physics::PhysicsBody;

pub use block::{BlockKind, GoalKind, GoalState, MysteryState, SwitchState};
pub use item::ItemKind;
pub use mob::{MobKind, MobState};
pub use player::PlayerState;

/// Subtype state, tagged by variant. The variant always agrees with the
/// entity's `category`.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Block(BlockKind),
    Item(ItemKind),
    Mob(MobState),
    Player(PlayerState),
}

/// A simulated object: identity, category tag, subtype state, geometry and
/// its owned physics body.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub category: Category,
    /// Identity string, e.g. "brick", "mushroom". Selects a sprite and
    /// distinguishes plain-block subtypes.
    pub ident: String,
    /// False once marked for removal; swept at end of tick.
    pub alive: bool,
    /// Center position in world units.
    pub pos: Vec2,
    /// Width and height in world units.
    pub size: Vec2,
    pub kind: EntityKind,
    pub body: Option<PhysicsBody>,
}

impl Entity {
    pub fn new(
        id: EntityId,
        category: Category,
        ident: &str,
        pos: Vec2,
        size: Vec2,
        kind: EntityKind,
    ) -> Self {
        Self {
            id,
            category,
            ident: ident.to_owned(),
            alive: true,
            pos,
            size,
            kind,
            body: None,
        }
    }

    // -- Kind projections --

    pub fn block(&self) -> Option<&BlockKind> {
        match &self.kind {
            EntityKind::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn block_mut(&mut self) -> Option<&mut BlockKind> {
        match &mut self.kind {
            EntityKind::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn item(&self) -> Option<ItemKind> {
        match self.kind {
            EntityKind::Item(i) => Some(i),
            _ => None,
        }
    }

    pub fn mob(&self) -> Option<&MobState> {
        match &self.kind {
            EntityKind::Mob(m) => Some(m),
            _ => None,
        }
    }

    pub fn mob_mut(&mut self) -> Option<&mut MobState> {
        match &mut self.kind {
            EntityKind::Mob(m) => Some(m),
            _ => None,
        }
    }

    pub fn player(&self) -> Option<&PlayerState> {
        match &self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn player_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }
}
