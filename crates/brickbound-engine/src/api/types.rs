use serde::Serialize;

/// Unique identifier for an entity in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EntityId(pub u32);

/// Coarse entity class used for collision routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Block,
    Item,
    Mob,
    Player,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Block => "block",
            Category::Item => "item",
            Category::Mob => "mob",
            Category::Player => "player",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_have_stable_order() {
        // Pair normalization in the dispatch table relies on Ord.
        assert!(Category::Block < Category::Item);
        assert!(Category::Item < Category::Mob);
        assert!(Category::Mob < Category::Player);
    }
}
