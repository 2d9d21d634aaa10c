//! The play session: owns the world, the player, and the tick orchestration.
//!
//! One tick runs the behavior pass, advances physics, drains the routed
//! contact batch through the handler match, applies solidity verdicts, sweeps
//! removals, then settles session-level state (invincibility expiry, death,
//! goal intents). Level transitions and score persistence never happen inside
//! the contact loop; they surface as `SessionEvent`s for the host.

use std::mem;

use glam::Vec2;
use serde::Serialize;

use brickbound_engine::{Category, ContactPhase, Entity, EntityId, FixedTimestep, PlayerState};

use crate::behavior;
use crate::config::{ConfigError, Settings};
use crate::contact::{self, ContactCtx, ContactKind};
use crate::level::{self, GameWorld};

/// Seconds a star's invincibility lasts.
pub const INVINCIBILITY_SECS: f64 = 10.0;

const FIXED_DT: f32 = 1.0 / 60.0;
const JUMP_VELOCITY: f32 = 150.0;
const DUCK_VELOCITY: f32 = 120.0;
const MOVE_VELOCITY_STEP: f32 = 60.0;
/// Goal value that finishes the session instead of naming a next level.
const GOAL_END: &str = "END";

/// Intents surfaced to the host after each tick. The host owns dialogs,
/// high-score prompts and the decision to reset or quit.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The player reached the goal flag. The host may prompt for a name and
    /// record the score before the session moves on.
    LevelComplete { level: String, score: i64 },
    /// The goal routed to "END": the session is over.
    GameWon,
    /// The player ducked into a tunnel; the session is switching levels.
    TunnelEntered { level: String },
    /// Health hit zero. It has been restored; the host decides what happens.
    PlayerDied,
}

/// HUD-facing player state.
#[derive(Debug, Clone, Serialize)]
pub struct HudState {
    pub health: f32,
    pub max_health: f32,
    pub score: i64,
    /// Seconds of invincibility left, when active.
    pub invincible_remaining: Option<f32>,
    pub level: String,
}

pub struct Session {
    settings: Settings,
    world: GameWorld,
    player: EntityId,
    timestep: FixedTimestep,
    current_level: String,
    max_velocity: f32,
    on_tunnel: bool,
    goal_reached: bool,
    pending_level: Option<String>,
    ended: bool,
    events: Vec<SessionEvent>,
}

impl Session {
    /// Validate the settings and load the starting level. Any configuration
    /// problem aborts here, before gameplay starts.
    pub fn new(settings: Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let start = settings.start_level()?.to_owned();
        let state = PlayerState::new(settings.player_name(), settings.player_health()?);
        let max_velocity = settings.max_velocity()?;
        let (world, player) = build_level(&settings, &start, state)?;
        log::info!(
            "session started on {} ({} entities)",
            start,
            world.entity_count()
        );
        Ok(Self {
            settings,
            world,
            player,
            timestep: FixedTimestep::new(FIXED_DT),
            current_level: start,
            max_velocity,
            on_tunnel: false,
            goal_reached: false,
            pending_level: None,
            ended: false,
            events: Vec::new(),
        })
    }

    pub fn world(&self) -> &GameWorld {
        &self.world
    }

    pub fn current_level(&self) -> &str {
        &self.current_level
    }

    pub fn is_over(&self) -> bool {
        self.ended
    }

    /// Advance one fixed step. Returns the tick's session events.
    pub fn step(&mut self, dt: f32) -> Result<Vec<SessionEvent>, ConfigError> {
        if self.ended {
            return Ok(mem::take(&mut self.events));
        }
        if let Some(p) = self.world.get_mut(self.player).and_then(Entity::player_mut) {
            p.ducking = false;
        }

        behavior::run_tick(&mut self.world, self.player, dt);

        let contacts = self.world.advance(dt);
        for c in contacts {
            // A handler earlier in the batch may have consumed either side.
            if self.world.get(c.first).is_none() || self.world.get(c.second).is_none() {
                continue;
            }
            match c.phase {
                ContactPhase::Begin => {
                    let solid = self.dispatch_begin(c.handler, c.first, c.second);
                    self.world.set_solid(c.first, c.second, solid);
                }
                ContactPhase::Separate => self.dispatch_separate(c.handler, c.first, c.second),
            }
        }
        self.world.end_tick();
        self.after_tick()?;
        Ok(mem::take(&mut self.events))
    }

    /// Feed a variable frame delta; runs as many fixed steps as it covers.
    pub fn pump(&mut self, frame_dt: f32) -> Result<Vec<SessionEvent>, ConfigError> {
        let steps = self.timestep.accumulate(frame_dt);
        let dt = self.timestep.dt();
        let mut out = Vec::new();
        for _ in 0..steps {
            out.extend(self.step(dt)?);
        }
        Ok(out)
    }

    // -- Player commands ----------------------------------------------------

    /// Nudge horizontal velocity by one input step; `dx` is -1.0 or 1.0.
    pub fn move_player(&mut self, dx: f32) {
        let v = self.world.velocity(self.player);
        let vx = (v.x + dx * MOVE_VELOCITY_STEP).clamp(-self.max_velocity, self.max_velocity);
        self.world.set_velocity(self.player, Vec2::new(vx, v.y));
    }

    pub fn jump(&mut self) {
        let jumping = self.player_state().map(|p| p.jumping).unwrap_or(true);
        if jumping {
            return;
        }
        if let Some(p) = self.world.get_mut(self.player).and_then(Entity::player_mut) {
            p.jumping = true;
        }
        let v = self.world.velocity(self.player);
        self.world
            .set_velocity(self.player, Vec2::new(v.x, v.y - JUMP_VELOCITY));
    }

    /// Duck: push downward, and descend if standing on a tunnel mouth.
    pub fn duck(&mut self) {
        let v = self.world.velocity(self.player);
        self.world
            .set_velocity(self.player, Vec2::new(v.x, v.y + DUCK_VELOCITY));
        if let Some(p) = self.world.get_mut(self.player).and_then(Entity::player_mut) {
            p.ducking = true;
        }
        if self.on_tunnel {
            if let Some(target) = self.settings.level_tunnel(&self.current_level) {
                let target = target.to_owned();
                self.events.push(SessionEvent::TunnelEntered {
                    level: target.clone(),
                });
                self.pending_level = Some(target);
                self.on_tunnel = false;
            }
        }
    }

    /// Restore health, zero the score, and rebuild the current level.
    pub fn reset_level(&mut self) -> Result<(), ConfigError> {
        if let Some(p) = self.world.get_mut(self.player).and_then(Entity::player_mut) {
            p.set_health(p.max_health);
            p.score = 0;
            p.invincible = false;
        }
        let level = self.current_level.clone();
        self.reset_world(&level)
    }

    pub fn hud(&self) -> HudState {
        let clock = self.world.clock();
        let p = self.player_state();
        HudState {
            health: p.map(|p| p.health).unwrap_or(0.0),
            max_health: p.map(|p| p.max_health).unwrap_or(0.0),
            score: p.map(|p| p.score).unwrap_or(0),
            invincible_remaining: p.and_then(|p| {
                p.invincible.then(|| {
                    (INVINCIBILITY_SECS - (clock - p.invincible_since)).max(0.0) as f32
                })
            }),
            level: self.current_level.clone(),
        }
    }

    // -- Internals ----------------------------------------------------------

    fn player_state(&self) -> Option<&PlayerState> {
        self.world.get(self.player).and_then(|e| e.player())
    }

    fn ctx(&mut self) -> ContactCtx<'_> {
        ContactCtx {
            world: &mut self.world,
            player: self.player,
            on_tunnel: &mut self.on_tunnel,
            goal_reached: &mut self.goal_reached,
        }
    }

    fn dispatch_begin(&mut self, handler: ContactKind, first: EntityId, second: EntityId) -> bool {
        let mut ctx = self.ctx();
        match handler {
            ContactKind::PlayerItem => contact::player_collide_item(&mut ctx, first, second),
            ContactKind::PlayerBlock => contact::player_collide_block(&mut ctx, first, second),
            ContactKind::PlayerMob => contact::player_collide_mob(&mut ctx, first, second),
            ContactKind::MobBlock => contact::mob_collide_block(&mut ctx, first, second),
            ContactKind::MobMob => contact::mob_collide_mob(&mut ctx, first, second),
            ContactKind::MobItem => contact::mob_collide_item(&mut ctx, first, second),
            // Registered as a separate tag only; a begin default stays solid.
            ContactKind::PlayerBlockEnd => true,
        }
    }

    fn dispatch_separate(&mut self, handler: ContactKind, first: EntityId, second: EntityId) {
        if handler == ContactKind::PlayerBlockEnd {
            let mut ctx = self.ctx();
            contact::player_separate_block(&mut ctx, first, second);
        }
    }

    /// Post-contact settlement: invincibility expiry, death, goal routing,
    /// and the actual level switch, all outside the hot loop.
    fn after_tick(&mut self) -> Result<(), ConfigError> {
        let clock = self.world.clock();
        if let Some(p) = self.world.get_mut(self.player).and_then(Entity::player_mut) {
            if p.invincible && clock - p.invincible_since > INVINCIBILITY_SECS {
                p.set_invincible(false, clock);
            }
            if p.is_dead() {
                p.set_health(p.max_health);
                self.events.push(SessionEvent::PlayerDied);
            }
        }

        if mem::take(&mut self.goal_reached) && self.pending_level.is_none() && !self.ended {
            let score = self.player_state().map(|p| p.score).unwrap_or(0);
            self.events.push(SessionEvent::LevelComplete {
                level: self.current_level.clone(),
                score,
            });
            match self.settings.level_goal(&self.current_level) {
                Some(next) if next != GOAL_END => self.pending_level = Some(next.to_owned()),
                _ => {
                    self.ended = true;
                    self.events.push(SessionEvent::GameWon);
                }
            }
        }

        if let Some(next) = self.pending_level.take() {
            self.reset_world(&next)?;
        }
        Ok(())
    }

    /// Rebuild the world for `level`, carrying the player state across.
    fn reset_world(&mut self, level: &str) -> Result<(), ConfigError> {
        let mut state = match self.player_state() {
            Some(p) => p.clone(),
            None => PlayerState::new(self.settings.player_name(), self.settings.player_health()?),
        };
        state.on_switch = false;
        state.jumping = false;
        state.ducking = false;
        if state.invincible {
            // The new world starts its clock at zero.
            state.invincible_since = 0.0;
        }
        let (world, player) = build_level(&self.settings, level, state)?;
        log::info!("level loaded: {} ({} entities)", level, world.entity_count());
        self.world = world;
        self.player = player;
        self.current_level = level.to_owned();
        self.on_tunnel = false;
        Ok(())
    }
}

fn build_level(
    settings: &Settings,
    level: &str,
    state: PlayerState,
) -> Result<(GameWorld, EntityId), ConfigError> {
    let mut world = level::load_world(level, settings.gravity()?)?;
    let (x, y) = settings.player_spawn()?;
    let mass = settings.player_mass()?;
    let player = world.add_player(state, x, y, mass);
    register_handlers(&mut world)?;
    Ok((world, player))
}

fn register_handlers(world: &mut GameWorld) -> Result<(), ConfigError> {
    world.add_collision_handler(
        Category::Player,
        Category::Item,
        ContactKind::PlayerItem,
        None,
    )?;
    world.add_collision_handler(
        Category::Player,
        Category::Block,
        ContactKind::PlayerBlock,
        Some(ContactKind::PlayerBlockEnd),
    )?;
    world.add_collision_handler(
        Category::Player,
        Category::Mob,
        ContactKind::PlayerMob,
        None,
    )?;
    world.add_collision_handler(Category::Mob, Category::Block, ContactKind::MobBlock, None)?;
    world.add_collision_handler(Category::Mob, Category::Mob, ContactKind::MobMob, None)?;
    world.add_collision_handler(Category::Mob, Category::Item, ContactKind::MobItem, None)?;
    Ok(())
}
