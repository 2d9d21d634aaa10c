//! Collision reaction logic, one handler per registered category pair.
//!
//! Each begin handler returns the solidity verdict for the contact: `true`
//! lets the physics engine resolve the pair normally, `false` leaves the
//! contact logical-only (pickups, pass-through switches, empty blocks).
//! Handlers mutate the world through an explicit context; entity removal is
//! mark-and-sweep, so flagging the same entity twice in one batch is safe.

use glam::Vec2;

use brickbound_engine::{
    BlockKind, ContactSide, Entity, EntityId, GoalKind, ItemKind, MobKind, PlayerState,
};

use crate::level::{item_for, GameWorld};

/// Handler tags resolved at registration time; the session matches on the
/// tag to run one of the functions below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    PlayerItem,
    PlayerBlock,
    PlayerBlockEnd,
    PlayerMob,
    MobBlock,
    MobMob,
    MobItem,
}

/// Upward speed granted by a bounce block or a stomp.
pub const BOUNCE_VELOCITY: f32 = 280.0;
/// Horizontal shove applied when a mob sideswipes the player.
pub const KNOCKBACK_VELOCITY: f32 = 60.0;
/// Health lost per mob contact.
pub const CONTACT_DAMAGE: f32 = 1.0;

/// Explicit handler context: the world, the player, and the session latches
/// the handlers may set. No ambient state.
pub struct ContactCtx<'a> {
    pub world: &'a mut GameWorld,
    pub player: EntityId,
    /// Set while the player stands on a tunnel mouth; ducking then descends.
    pub on_tunnel: &'a mut bool,
    /// Set when the player touches the goal flag; the session resolves the
    /// level transition outside the contact loop.
    pub goal_reached: &'a mut bool,
}

fn side_of(world: &GameWorld, target: EntityId, other: EntityId) -> Option<ContactSide> {
    let t = world.get(target)?;
    let o = world.get(other)?;
    ContactSide::between(t.pos, t.size, o.pos, o.size)
}

fn player_state_mut(world: &mut GameWorld, id: EntityId) -> Option<&mut PlayerState> {
    world.get_mut(id).and_then(Entity::player_mut)
}

fn damage_player(ctx: &mut ContactCtx<'_>) {
    if let Some(p) = player_state_mut(ctx.world, ctx.player) {
        p.change_health(-CONTACT_DAMAGE);
    }
}

fn reverse_mob(world: &mut GameWorld, id: EntityId) {
    if let Some(m) = world.get_mut(id).and_then(Entity::mob_mut) {
        m.reverse();
    }
}

/// Pick up an item: apply its effect and take it out of the world. Pickups
/// are never physical.
pub fn player_collide_item(ctx: &mut ContactCtx<'_>, player: EntityId, item: EntityId) -> bool {
    let Some(kind) = ctx.world.get(item).and_then(|e| e.item()) else {
        return false;
    };
    let now = ctx.world.clock();
    if let Some(p) = player_state_mut(ctx.world, player) {
        match kind {
            ItemKind::Coin => p.change_score(1),
            ItemKind::Star => p.set_invincible(true, now),
            ItemKind::Dropped => {}
        }
    }
    ctx.world.remove_item(item);
    false
}

pub fn player_collide_block(ctx: &mut ContactCtx<'_>, player: EntityId, block: EntityId) -> bool {
    let side = side_of(ctx.world, block, player);

    // Landing on anything resets the jump.
    if side == Some(ContactSide::Above) {
        if let Some(p) = player_state_mut(ctx.world, ctx.player) {
            p.jumping = false;
        }
    }

    let Some(entity) = ctx.world.get(block) else {
        return true;
    };
    let kind = match entity.block() {
        Some(k) => k.clone(),
        None => return true,
    };
    let block_pos = entity.pos;

    match kind {
        BlockKind::Empty => false,
        BlockKind::Switch(_) => {
            let on_switch = ctx
                .world
                .get(ctx.player)
                .and_then(|e| e.player())
                .map(|p| p.on_switch)
                .unwrap_or(false);
            if on_switch {
                // The pressed switch stops being solid for the player.
                return false;
            }
            if side == Some(ContactSide::Above) {
                let now = ctx.world.clock();
                if let Some(BlockKind::Switch(sw)) =
                    ctx.world.get_mut(block).and_then(Entity::block_mut)
                {
                    if !sw.active {
                        sw.active = true;
                        sw.activated_at = now;
                    }
                }
                if let Some(p) = player_state_mut(ctx.world, ctx.player) {
                    p.on_switch = true;
                }
            }
            true
        }
        BlockKind::Goal(goal) => {
            match goal.kind {
                GoalKind::Flag => {
                    if side == Some(ContactSide::Above) {
                        if let Some(p) = player_state_mut(ctx.world, ctx.player) {
                            p.set_health(p.max_health);
                        }
                    }
                    *ctx.goal_reached = true;
                }
                GoalKind::Tunnel => {
                    if side == Some(ContactSide::Above) {
                        *ctx.on_tunnel = true;
                    }
                }
            }
            true
        }
        BlockKind::Bounce => {
            if side == Some(ContactSide::Above) {
                let v = ctx.world.velocity(player);
                ctx.world
                    .set_velocity(player, Vec2::new(v.x, -BOUNCE_VELOCITY));
            }
            true
        }
        BlockKind::Mystery(_) => {
            if side == Some(ContactSide::Below) {
                trigger_mystery(ctx, block, block_pos);
            }
            true
        }
        BlockKind::Plain => true,
    }
}

/// Spend a mystery block: flips active → used exactly once and spawns its
/// configured drops directly above itself.
fn trigger_mystery(ctx: &mut ContactCtx<'_>, block: EntityId, block_pos: Vec2) {
    let block_size = ctx.world.block_size();
    let (drop, range) = {
        let Some(BlockKind::Mystery(m)) = ctx.world.get_mut(block).and_then(Entity::block_mut)
        else {
            return;
        };
        if !m.active {
            return;
        }
        m.active = false;
        (m.drop.clone(), m.drop_range)
    };
    let Some(drop) = drop else { return };
    let count = match range {
        Some((lo, hi)) => ctx.world.rng_mut().range_inclusive(lo, hi),
        None => 1,
    };
    for _ in 0..count {
        ctx.world.add_item(
            &drop,
            item_for(&drop),
            block_pos.x,
            block_pos.y - block_size,
        );
    }
}

pub fn player_separate_block(ctx: &mut ContactCtx<'_>, _player: EntityId, block: EntityId) {
    let is_tunnel = matches!(
        ctx.world.get(block).and_then(|e| e.block()),
        Some(BlockKind::Goal(goal)) if goal.kind == GoalKind::Tunnel
    );
    if is_tunnel {
        *ctx.on_tunnel = false;
    }
}

pub fn player_collide_mob(ctx: &mut ContactCtx<'_>, player: EntityId, mob: EntityId) -> bool {
    let invincible = ctx
        .world
        .get(ctx.player)
        .and_then(|e| e.player())
        .map(|p| p.invincible)
        .unwrap_or(false);
    if invincible {
        ctx.world.remove_mob(mob);
        return true;
    }

    let Some(kind) = ctx.world.get(mob).and_then(|e| e.mob()).map(|m| m.kind.clone()) else {
        return true;
    };
    match kind {
        MobKind::Mushroom => match side_of(ctx.world, mob, player) {
            Some(ContactSide::Above) => {
                // Stomp: the mob dies, the player bounces.
                ctx.world
                    .set_velocity(player, Vec2::new(0.0, -BOUNCE_VELOCITY));
                ctx.world.remove_mob(mob);
            }
            Some(ContactSide::Left) => {
                ctx.world
                    .set_velocity(player, Vec2::new(-KNOCKBACK_VELOCITY, 0.0));
                damage_player(ctx);
                reverse_mob(ctx.world, mob);
            }
            Some(ContactSide::Right) => {
                ctx.world
                    .set_velocity(player, Vec2::new(KNOCKBACK_VELOCITY, 0.0));
                damage_player(ctx);
                reverse_mob(ctx.world, mob);
                // A right-side hit lands twice as hard.
                damage_player(ctx);
            }
            _ => damage_player(ctx),
        },
        MobKind::Fireball => {
            damage_player(ctx);
            ctx.world.remove_mob(mob);
        }
        MobKind::Cloud { .. } => damage_player(ctx),
    }
    true
}

pub fn mob_collide_block(ctx: &mut ContactCtx<'_>, mob: EntityId, block: EntityId) -> bool {
    let block_is_brick = ctx
        .world
        .get(block)
        .map(|e| e.ident == "brick")
        .unwrap_or(false);
    let block_is_empty = matches!(
        ctx.world.get(block).and_then(|e| e.block()),
        Some(BlockKind::Empty)
    );

    match ctx.world.get(mob).and_then(|e| e.mob()).map(|m| m.kind.clone()) {
        Some(MobKind::Fireball) => {
            if block_is_brick {
                ctx.world.remove_block(block);
            }
            ctx.world.remove_mob(mob);
        }
        Some(MobKind::Mushroom) => {
            if matches!(
                side_of(ctx.world, block, mob),
                Some(ContactSide::Left) | Some(ContactSide::Right)
            ) {
                reverse_mob(ctx.world, mob);
            }
        }
        _ => {}
    }

    !block_is_empty
}

pub fn mob_collide_mob(ctx: &mut ContactCtx<'_>, mob1: EntityId, mob2: EntityId) -> bool {
    let kind_of = |world: &GameWorld, id: EntityId| {
        world.get(id).and_then(|e| e.mob()).map(|m| m.kind.clone())
    };
    let k1 = kind_of(ctx.world, mob1);
    let k2 = kind_of(ctx.world, mob2);

    let fireball = matches!(k1, Some(MobKind::Fireball)) || matches!(k2, Some(MobKind::Fireball));
    let mushroom = matches!(k1, Some(MobKind::Mushroom)) || matches!(k2, Some(MobKind::Mushroom));

    if fireball {
        ctx.world.remove_mob(mob1);
        ctx.world.remove_mob(mob2);
    } else if mushroom {
        reverse_mob(ctx.world, mob1);
        reverse_mob(ctx.world, mob2);
    }
    // Mobs never resolve against each other physically.
    false
}

pub fn mob_collide_item(ctx: &mut ContactCtx<'_>, mob: EntityId, _item: EntityId) -> bool {
    if matches!(
        ctx.world.get(mob).and_then(|e| e.mob()).map(|m| m.kind.clone()),
        Some(MobKind::Mushroom)
    ) {
        reverse_mob(ctx.world, mob);
    }
    false
}
