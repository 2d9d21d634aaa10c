//! Read-only views handed to the renderer/HUD collaborator. Enough to pick a
//! sprite and draw it; nothing here can mutate the world.

use serde::Serialize;

use crate::api::types::Category;

/// One entity as the renderer sees it.
#[derive(Debug, Clone, Serialize)]
pub struct EntitySnapshot {
    pub id: u32,
    pub category: Category,
    pub ident: String,
    /// Center position.
    pub pos: (f32, f32),
    pub vel: (f32, f32),
    pub size: (f32, f32),
    /// Mystery blocks: still unspent. Switches: pressed. Everything else:
    /// always true.
    pub active: bool,
}
