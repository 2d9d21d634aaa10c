//! Block subtype state. Blocks are static; all of them report category
//! `Block` regardless of subtype.

/// Subtype state for a block entity.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    /// Plain solid block; the identity string ("brick", "cube", ...) tells
    /// subtypes apart where it matters.
    Plain,
    /// Launches the player upward when landed on.
    Bounce,
    /// Spawns drops once when struck from below.
    Mystery(MysteryState),
    /// Temporarily swaps nearby bricks for empty blocks.
    Switch(SwitchState),
    /// Level exit: flag pole or tunnel.
    Goal(GoalState),
    /// Invisible brick; lives in the entity graph but never resolves
    /// physically (sensor collider). Contacts stay logical-only.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MysteryState {
    /// True until the block has been triggered. Never reactivates.
    pub active: bool,
    /// Identity of the item to spawn, if any.
    pub drop: Option<String>,
    /// Inclusive range for a randomized drop count. `None` means one drop.
    pub drop_range: Option<(u32, u32)>,
}

impl MysteryState {
    pub fn new(drop: Option<&str>, drop_range: Option<(u32, u32)>) -> Self {
        Self {
            active: true,
            drop: drop.map(str::to_owned),
            drop_range,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchState {
    pub active: bool,
    /// World-clock second the switch was pressed. Meaningful while active.
    pub activated_at: f64,
}

impl SwitchState {
    pub fn new() -> Self {
        Self {
            active: false,
            activated_at: 0.0,
        }
    }
}

impl Default for SwitchState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalKind {
    Flag,
    Tunnel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalState {
    pub kind: GoalKind,
    /// Footprint in block cells (w, h); the flag is a tall thin pole.
    pub cell_size: (f32, f32),
}

impl BlockKind {
    /// Whether this block's collider participates in solid resolution at all.
    pub fn is_solid(&self) -> bool {
        !matches!(self, BlockKind::Empty)
    }

    /// The flag reported to the renderer: mystery blocks go inactive once
    /// used, switches while pressed report their pressed state.
    pub fn active_flag(&self) -> bool {
        match self {
            BlockKind::Mystery(m) => m.active,
            BlockKind::Switch(s) => s.active,
            _ => true,
        }
    }
}
