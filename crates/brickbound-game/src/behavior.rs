//! Time-based entity behavior, run once per tick before the physics step:
//! mobs hold their tempo, clouds drop fireballs on a timer, and pressed
//! switches swap nearby bricks out (and back in when the window closes).
//! All of this is collision-independent state evolution.

use glam::Vec2;

use brickbound_engine::{BlockKind, Entity, EntityId, MobKind};

use crate::level::GameWorld;

/// Seconds a pressed switch keeps bricks swapped out.
pub const SWITCH_WINDOW_SECS: f64 = 10.0;
/// Radius of the switch's effect, in blocks.
pub const SWITCH_RADIUS_BLOCKS: f32 = 3.0;
/// Seconds between a cloud's fireball drops.
pub const CLOUD_DROP_INTERVAL: f32 = 3.0;

pub fn run_tick(world: &mut GameWorld, player: EntityId, dt: f32) {
    drive_mobs(world, dt);
    update_switches(world, player);
}

/// Hold every mob at its tempo horizontally (gravity keeps vertical motion),
/// and count down cloud drop timers, spawning fireballs as they expire.
fn drive_mobs(world: &mut GameWorld, dt: f32) {
    let mobs: Vec<(EntityId, f32)> = world
        .get_all_things()
        .filter_map(|e| e.mob().map(|m| (e.id, m.tempo)))
        .collect();
    for (id, tempo) in &mobs {
        let v = world.velocity(*id);
        world.set_velocity(*id, Vec2::new(*tempo, v.y));
    }

    let block_size = world.block_size();
    let mut spawns: Vec<Vec2> = Vec::new();
    for (id, _) in &mobs {
        let pos = match world.get(*id) {
            Some(e) => e.pos,
            None => continue,
        };
        if let Some(MobKind::Cloud { drop_clock }) = world
            .get_mut(*id)
            .and_then(Entity::mob_mut)
            .map(|m| &mut m.kind)
        {
            *drop_clock -= dt;
            if *drop_clock <= 0.0 {
                *drop_clock = CLOUD_DROP_INTERVAL;
                spawns.push(pos + Vec2::new(0.0, block_size));
            }
        }
    }
    for pos in spawns {
        world.add_mob(
            "fireball",
            brickbound_engine::MobState::fireball(),
            pos.x,
            pos.y,
        );
    }
}

/// Advance every pressed switch's window. While open, bricks within range
/// become empty blocks; once the window closes they come back and the switch
/// releases.
fn update_switches(world: &mut GameWorld, player: EntityId) {
    let clock = world.clock();
    let radius = SWITCH_RADIUS_BLOCKS * world.block_size();

    let pressed: Vec<(EntityId, Vec2, f64)> = world
        .get_all_things()
        .filter_map(|e| match e.block() {
            Some(BlockKind::Switch(sw)) if sw.active => Some((e.id, e.pos, sw.activated_at)),
            _ => None,
        })
        .collect();

    for (switch, pos, activated_at) in pressed {
        let in_range = world.get_things_in_range(pos.x, pos.y, radius);
        if clock - activated_at < SWITCH_WINDOW_SECS {
            let bricks: Vec<(EntityId, Vec2)> = in_range
                .iter()
                .filter_map(|&id| world.get(id))
                .filter(|e| e.ident == "brick")
                .map(|e| (e.id, e.pos))
                .collect();
            for (id, at) in bricks {
                world.remove_block(id);
                world.add_block("empty_block", BlockKind::Empty, at.x, at.y);
            }
        } else {
            let empties: Vec<(EntityId, Vec2)> = in_range
                .iter()
                .filter_map(|&id| world.get(id))
                .filter(|e| e.ident == "empty_block")
                .map(|e| (e.id, e.pos))
                .collect();
            for (id, at) in empties {
                world.remove_block(id);
                world.add_block("brick", BlockKind::Plain, at.x, at.y);
            }
            if let Some(BlockKind::Switch(sw)) =
                world.get_mut(switch).and_then(Entity::block_mut)
            {
                sw.active = false;
            }
            if let Some(p) = world.get_mut(player).and_then(Entity::player_mut) {
                p.on_switch = false;
            }
        }
    }
}
