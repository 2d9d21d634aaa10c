//! Entity storage plus the fixed-step world loop: behavior happens in the
//! game crate, this module owns adding/removing entities, range queries,
//! advancing the physics simulation and draining its contact events through
//! the dispatch table.
//!
//! Removal is mark-and-sweep: handlers may flag entities mid-dispatch, the
//! bodies are actually freed in `end_tick` after the whole contact batch has
//! been processed, so the physics engine's event list is never invalidated
//! mid-iteration. Flagging an already-removed entity is a no-op.

use std::collections::HashSet;

use glam::Vec2;

use crate::api::snapshot::EntitySnapshot;
use crate::api::types::{Category, EntityId};
use crate::collision::dispatch::DispatchTable;
use crate::core::physics::{
    pass_pair, BodyDesc, ColliderDesc, ColliderMaterial, CollisionPair, ContactPhase, PassPair,
    PhysicsWorld,
};
use crate::core::rng::Rng;
use crate::entities::{BlockKind, Entity, EntityKind, ItemKind, MobKind, MobState, PlayerState};
use crate::error::EngineError;

const RNG_SEED: u64 = 0x5eed_b10c;

/// A routed contact produced by `advance`, ready for the game's handler
/// match. `first`/`second` are ordered to match handler registration.
#[derive(Debug, Clone, Copy)]
pub struct Contact<H> {
    pub handler: H,
    pub first: EntityId,
    pub second: EntityId,
    pub phase: ContactPhase,
}

pub struct World<H: Copy> {
    entities: Vec<Entity>,
    physics: PhysicsWorld,
    dispatch: DispatchTable<H>,
    /// Entity pairs whose contacts are logical-only this frame onward.
    pass_through: HashSet<PassPair>,
    pending_removal: Vec<EntityId>,
    /// Category pairs already warned about, to keep the log quiet.
    unrouted_warned: HashSet<(Category, Category)>,
    rng: Rng,
    next_id: u32,
    clock: f64,
    block_size: f32,
    pixel_size: Vec2,
}

impl<H: Copy> World<H> {
    /// A world with downward gravity `gravity_y` (Y-down coordinates) whose
    /// grid cells are `block_size` world units across.
    pub fn new(gravity_y: f32, block_size: f32) -> Self {
        Self {
            entities: Vec::with_capacity(256),
            physics: PhysicsWorld::new(Vec2::new(0.0, gravity_y)),
            dispatch: DispatchTable::new(),
            pass_through: HashSet::new(),
            pending_removal: Vec::new(),
            unrouted_warned: HashSet::new(),
            rng: Rng::new(RNG_SEED),
            next_id: 1,
            clock: 0.0,
            block_size,
            pixel_size: Vec2::ZERO,
        }
    }

    pub fn block_size(&self) -> f32 {
        self.block_size
    }

    /// Simulated seconds since the world was created.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn rng_mut(&mut self) -> &mut Rng {
        &mut self.rng
    }

    /// Record the world's pixel extent and fence it with boundary walls so
    /// nothing escapes the level.
    pub fn set_bounds(&mut self, width: f32, height: f32) {
        self.pixel_size = Vec2::new(width, height);
        let t = self.block_size;
        let walls = [
            // (center, half-extents)
            (Vec2::new(width / 2.0, -t / 2.0), Vec2::new(width / 2.0 + t, t / 2.0)),
            (Vec2::new(width / 2.0, height + t / 2.0), Vec2::new(width / 2.0 + t, t / 2.0)),
            (Vec2::new(-t / 2.0, height / 2.0), Vec2::new(t / 2.0, height / 2.0 + t)),
            (Vec2::new(width + t / 2.0, height / 2.0), Vec2::new(t / 2.0, height / 2.0 + t)),
        ];
        for (center, half) in walls {
            let entity = Entity::new(
                EntityId(0),
                Category::Block,
                "boundary",
                center,
                half * 2.0,
                EntityKind::Block(BlockKind::Plain),
            );
            let desc = BodyDesc::fixed(ColliderDesc::Cuboid {
                half_width: half.x,
                half_height: half.y,
            })
            .with_position(center);
            self.insert(entity, desc, ColliderMaterial::default());
        }
    }

    pub fn get_pixel_size(&self) -> (f32, f32) {
        (self.pixel_size.x, self.pixel_size.y)
    }

    // -- World mutation -----------------------------------------------------

    /// Add a block centered at (x, y). Goal blocks size themselves from their
    /// cell metadata; empty blocks get sensor colliders so they never resolve
    /// physically.
    pub fn add_block(&mut self, ident: &str, kind: BlockKind, x: f32, y: f32) -> EntityId {
        let size = match &kind {
            BlockKind::Goal(goal) => Vec2::new(
                goal.cell_size.0 * self.block_size,
                goal.cell_size.1 * self.block_size,
            ),
            _ => Vec2::splat(self.block_size),
        };
        let sensor = !kind.is_solid();
        let pos = Vec2::new(x, y);
        let entity = Entity::new(
            EntityId(0),
            Category::Block,
            ident,
            pos,
            size,
            EntityKind::Block(kind),
        );
        let desc = BodyDesc::fixed(ColliderDesc::Cuboid {
            half_width: size.x / 2.0,
            half_height: size.y / 2.0,
        })
        .with_position(pos)
        .with_sensor(sensor);
        self.insert(entity, desc, ColliderMaterial::default())
    }

    /// Add a collectible item centered at (x, y). Items are static sensors:
    /// pickups are logical contacts, never physical ones.
    pub fn add_item(&mut self, ident: &str, kind: ItemKind, x: f32, y: f32) -> EntityId {
        let size = Vec2::splat(self.block_size);
        let pos = Vec2::new(x, y);
        let entity = Entity::new(
            EntityId(0),
            Category::Item,
            ident,
            pos,
            size,
            EntityKind::Item(kind),
        );
        let desc = BodyDesc::fixed(ColliderDesc::Cuboid {
            half_width: size.x / 2.0,
            half_height: size.y / 2.0,
        })
        .with_position(pos)
        .with_sensor(true);
        self.insert(entity, desc, ColliderMaterial::default())
    }

    /// Add a mob centered at (x, y). Fireballs are small balls, everything
    /// else is a block-sized box.
    pub fn add_mob(&mut self, ident: &str, state: MobState, x: f32, y: f32) -> EntityId {
        let pos = Vec2::new(x, y);
        let (size, collider) = match state.kind {
            MobKind::Fireball => {
                let r = self.block_size / 4.0;
                (Vec2::splat(r * 2.0), ColliderDesc::Ball { radius: r })
            }
            _ => {
                let s = self.block_size;
                (
                    Vec2::splat(s),
                    ColliderDesc::Cuboid {
                        half_width: s / 2.0,
                        half_height: s / 2.0,
                    },
                )
            }
        };
        let desc = BodyDesc::dynamic(collider)
            .with_position(pos)
            .with_velocity(Vec2::new(state.tempo, 0.0))
            .with_gravity_scale(state.gravity_scale())
            .with_fixed_rotation(true)
            .with_mass(state.weight);
        let entity = Entity::new(
            EntityId(0),
            Category::Mob,
            ident,
            pos,
            size,
            EntityKind::Mob(state),
        );
        self.insert(entity, desc, ColliderMaterial::default())
    }

    /// Add the player centered at (x, y) with the given physics mass.
    pub fn add_player(&mut self, state: PlayerState, x: f32, y: f32, mass: f32) -> EntityId {
        let pos = Vec2::new(x, y);
        let size = Vec2::splat(self.block_size);
        let ident = state.name.clone();
        let desc = BodyDesc::dynamic(ColliderDesc::Cuboid {
            half_width: size.x / 2.0,
            half_height: size.y / 2.0,
        })
        .with_position(pos)
        .with_fixed_rotation(true)
        .with_ccd(true)
        .with_mass(mass);
        let entity = Entity::new(
            EntityId(0),
            Category::Player,
            &ident,
            pos,
            size,
            EntityKind::Player(state),
        );
        self.insert(entity, desc, ColliderMaterial::default())
    }

    /// Add a generic placeholder thing: a solid block-category box. Level
    /// text falls back to this for characters it does not recognize.
    pub fn add_thing(&mut self, ident: &str, x: f32, y: f32, size: Vec2) -> EntityId {
        let pos = Vec2::new(x, y);
        let entity = Entity::new(
            EntityId(0),
            Category::Block,
            ident,
            pos,
            size,
            EntityKind::Block(BlockKind::Plain),
        );
        let desc = BodyDesc::fixed(ColliderDesc::Cuboid {
            half_width: size.x / 2.0,
            half_height: size.y / 2.0,
        })
        .with_position(pos);
        self.insert(entity, desc, ColliderMaterial::default())
    }

    fn insert(&mut self, mut entity: Entity, desc: BodyDesc, material: ColliderMaterial) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        entity.id = id;
        entity.body = Some(self.physics.create_body(id, &desc, material));
        self.entities.push(entity);
        id
    }

    /// Mark an entity for removal at the end of the tick. A no-op when the id
    /// is unknown or already marked, since several handlers may flag the same
    /// entity within one contact batch.
    pub fn remove_thing(&mut self, id: EntityId) {
        if let Some(e) = self.entities.iter_mut().find(|e| e.id == id) {
            if e.alive {
                e.alive = false;
                self.pending_removal.push(id);
            }
        }
    }

    pub fn remove_block(&mut self, id: EntityId) {
        self.remove_thing(id);
    }

    pub fn remove_item(&mut self, id: EntityId) {
        self.remove_thing(id);
    }

    pub fn remove_mob(&mut self, id: EntityId) {
        self.remove_thing(id);
    }

    // -- Queries ------------------------------------------------------------

    /// Live entity by id. Entities marked for removal are already invisible
    /// here, before the sweep runs.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.alive && e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.alive && e.id == id)
    }

    /// Ids of all live entities whose center lies within `radius` of (x, y).
    pub fn get_things_in_range(&self, x: f32, y: f32, radius: f32) -> Vec<EntityId> {
        let center = Vec2::new(x, y);
        self.entities
            .iter()
            .filter(|e| e.alive && e.pos.distance(center) <= radius)
            .map(|e| e.id)
            .collect()
    }

    /// All live entities.
    pub fn get_all_things(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.alive)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.iter().filter(|e| e.alive).count()
    }

    /// Current velocity of an entity's body.
    pub fn velocity(&self, id: EntityId) -> Vec2 {
        self.get(id)
            .and_then(|e| e.body.as_ref())
            .map(|body| self.physics.velocity(body))
            .unwrap_or(Vec2::ZERO)
    }

    /// Set the velocity of an entity's body directly.
    pub fn set_velocity(&mut self, id: EntityId, vel: Vec2) {
        if let Some(body) = self.get(id).and_then(|e| e.body) {
            self.physics.set_velocity(&body, vel);
        }
    }

    /// Read-only entity snapshots for the renderer.
    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        self.get_all_things()
            .map(|e| {
                let vel = e
                    .body
                    .as_ref()
                    .map(|b| self.physics.velocity(b))
                    .unwrap_or(Vec2::ZERO);
                let active = match &e.kind {
                    EntityKind::Block(b) => b.active_flag(),
                    _ => true,
                };
                EntitySnapshot {
                    id: e.id.0,
                    category: e.category,
                    ident: e.ident.clone(),
                    pos: (e.pos.x, e.pos.y),
                    vel: (vel.x, vel.y),
                    size: (e.size.x, e.size.y),
                    active,
                }
            })
            .collect()
    }

    // -- Collision routing --------------------------------------------------

    /// Register begin/separate handler tags for an unordered category pair.
    /// One registration serves both orderings. Duplicate registration is a
    /// configuration error.
    pub fn add_collision_handler(
        &mut self,
        a: Category,
        b: Category,
        on_begin: H,
        on_separate: Option<H>,
    ) -> Result<(), EngineError> {
        self.dispatch.register(a, b, on_begin, on_separate)
    }

    /// Apply a begin handler's verdict: `solid = false` turns the pair's
    /// contact logical-only until it separates.
    pub fn set_solid(&mut self, a: EntityId, b: EntityId, solid: bool) {
        let key = pass_pair(a, b);
        if solid {
            self.pass_through.remove(&key);
        } else {
            self.pass_through.insert(key);
        }
    }

    // -- Stepping -----------------------------------------------------------

    /// Advance the simulation by `dt`: integrate bodies, detect contacts,
    /// sync entity positions, and route the tick's contact events through the
    /// dispatch table. Events touching removed entities are dropped; begin
    /// events for unregistered category pairs default to solid-physical with
    /// a one-time warning.
    pub fn advance(&mut self, dt: f32) -> Vec<Contact<H>> {
        self.clock += dt as f64;
        self.physics.set_dt(dt);

        let mut raw: Vec<CollisionPair> = Vec::new();
        self.physics.step_into(&self.pass_through, &mut raw);

        // Sync body positions back to entities.
        for e in self.entities.iter_mut() {
            if let Some(body) = &e.body {
                e.pos = self.physics.body_position(body);
            }
        }

        let mut contacts = Vec::with_capacity(raw.len());
        for event in raw {
            if event.phase == ContactPhase::Separate {
                // Whatever the verdict was, the pair is gone.
                self.pass_through
                    .remove(&pass_pair(event.entity_a, event.entity_b));
            }

            let (cat_a, cat_b) = match (self.get(event.entity_a), self.get(event.entity_b)) {
                (Some(a), Some(b)) => (a.category, b.category),
                _ => continue, // one side already removed this tick
            };

            let Some(routed) = self.dispatch.route(cat_a, cat_b) else {
                if event.phase == ContactPhase::Begin
                    && self.unrouted_warned.insert((cat_a, cat_b))
                {
                    log::warn!(
                        "no collision handler for {}/{}; contact stays solid",
                        cat_a.as_str(),
                        cat_b.as_str()
                    );
                }
                continue;
            };

            let handler = match event.phase {
                ContactPhase::Begin => routed.entry.on_begin,
                ContactPhase::Separate => match routed.entry.on_separate {
                    Some(h) => h,
                    None => continue,
                },
            };
            let (first, second) = if routed.swapped {
                (event.entity_b, event.entity_a)
            } else {
                (event.entity_a, event.entity_b)
            };
            contacts.push(Contact {
                handler,
                first,
                second,
                phase: event.phase,
            });
        }
        contacts
    }

    /// Sweep entities marked for removal: free each physics body and drop the
    /// entity in one go, and forget any pass-through pairs that referenced
    /// them.
    pub fn end_tick(&mut self) {
        for id in std::mem::take(&mut self.pending_removal) {
            if let Some(idx) = self.entities.iter().position(|e| e.id == id) {
                if let Some(body) = self.entities[idx].body.take() {
                    self.physics.remove_body(&body);
                }
                self.entities.swap_remove(idx);
            }
            self.pass_through.retain(|&(a, b)| a != id.0 && b != id.0);
        }
    }
}
