//! Registry of the pickups scattered across a level.

use std::collections::BTreeMap;

use glam::Vec3;
use haggis_hunt_core::{CellCoord, ItemId, ItemKind};

use crate::player::Entity;

/// Pickup resting on a maze cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    id: ItemId,
    kind: ItemKind,
    entity: Entity,
    spent: bool,
    billboard: Option<f32>,
}

impl Item {
    /// Identifier allocated at load.
    #[must_use]
    pub const fn id(&self) -> ItemId {
        self.id
    }

    /// Kind of pickup.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Cell the item rests on.
    #[must_use]
    pub const fn cell(&self) -> Option<CellCoord> {
        self.entity.cell()
    }

    /// Movable state of the item.
    #[must_use]
    pub const fn entity(&self) -> &Entity {
        &self.entity
    }

    /// Reports whether the item was already collected.
    #[must_use]
    pub const fn is_spent(&self) -> bool {
        self.spent
    }

    /// Height of the floating label shown while the item is collected.
    #[must_use]
    pub const fn billboard(&self) -> Option<f32> {
        self.billboard
    }

    pub(crate) fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    pub(crate) fn collect(&mut self) {
        self.spent = true;
        self.entity.set_visible(true);
        self.billboard = Some(0.0);
    }

    pub(crate) fn raise_billboard(&mut self, amount: f32) {
        if let Some(height) = self.billboard.as_mut() {
            *height += amount;
        }
    }
}

/// Registry that stores items and manages identifier allocation.
#[derive(Debug, Default)]
pub(crate) struct ItemRegistry {
    entries: BTreeMap<ItemId, Item>,
    next_item_id: u32,
}

impl ItemRegistry {
    /// Places a cloaked item of `kind` on `cell`.
    pub(crate) fn insert(&mut self, cell: CellCoord, kind: ItemKind) -> ItemId {
        let id = ItemId::new(self.next_item_id);
        self.next_item_id += 1;
        let item = Item {
            id,
            kind,
            entity: Entity::new(Some(cell), Vec3::ZERO, false),
            spent: false,
            billboard: None,
        };
        let _ = self.entries.insert(id, item);
        id
    }

    pub(crate) fn get(&self, id: ItemId) -> Option<&Item> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: ItemId) -> Option<Item> {
        self.entries.remove(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Item> {
        self.entries.values()
    }

    /// First uncollected item resting on `cell`, in identifier order.
    pub(crate) fn unspent_at(&self, cell: CellCoord) -> Option<ItemId> {
        self.entries
            .values()
            .find(|item| !item.spent && item.cell() == Some(cell))
            .map(Item::id)
    }
}
