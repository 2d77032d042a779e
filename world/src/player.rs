//! Agent state: the movable entity plus clamped statistics.

use glam::Vec3;
use haggis_hunt_core::{CellCoord, PlayerStats, Side};

/// Offset of an agent standing at rest on its cell.
pub(crate) const STANDING_OFFSET: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Movable object resting on, or travelling between, maze cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    cell: Option<CellCoord>,
    offset: Vec3,
    rotation: f32,
    visible: bool,
}

impl Entity {
    pub(crate) const fn new(cell: Option<CellCoord>, offset: Vec3, visible: bool) -> Self {
        Self {
            cell,
            offset,
            rotation: 0.0,
            visible,
        }
    }

    /// Cell the entity belongs to, if it has been placed.
    #[must_use]
    pub const fn cell(&self) -> Option<CellCoord> {
        self.cell
    }

    /// Displacement from the cell centre, animated by actions.
    #[must_use]
    pub const fn offset(&self) -> Vec3 {
        self.offset
    }

    /// Rotation around the vertical axis, in radians.
    #[must_use]
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Reports whether presentation layers should draw the entity.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_cell(&mut self, cell: Option<CellCoord>) {
        self.cell = cell;
    }

    pub(crate) fn set_offset(&mut self, offset: Vec3) {
        self.offset = offset;
    }

    pub(crate) fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

/// One of the two agents of a level.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    side: Side,
    stats: PlayerStats,
    entity: Entity,
}

impl Player {
    /// Creates an agent with full statistics standing on `cell`.
    pub(crate) fn new(side: Side, cell: CellCoord) -> Self {
        Self {
            side,
            stats: PlayerStats::full(),
            entity: Entity::new(Some(cell), STANDING_OFFSET, true),
        }
    }

    /// Side the agent plays for.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Current statistics.
    #[must_use]
    pub const fn stats(&self) -> PlayerStats {
        self.stats
    }

    /// Movable state of the agent.
    #[must_use]
    pub const fn entity(&self) -> &Entity {
        &self.entity
    }

    /// Cell the agent stands on, if placed.
    #[must_use]
    pub const fn cell(&self) -> Option<CellCoord> {
        self.entity.cell
    }

    /// Reports whether the agent ran out of health or energy.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.stats.is_dead()
    }

    pub(crate) fn stats_mut(&mut self) -> &mut PlayerStats {
        &mut self.stats
    }

    pub(crate) fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_players_start_rested_and_visible() {
        let player = Player::new(Side::Opponent, CellCoord::new(2, 3));

        assert_eq!(player.side(), Side::Opponent);
        assert_eq!(player.stats(), PlayerStats::full());
        assert_eq!(player.cell(), Some(CellCoord::new(2, 3)));
        assert_eq!(player.entity().offset(), STANDING_OFFSET);
        assert!(player.entity().is_visible());
        assert!(!player.is_dead());
    }

    #[test]
    fn stats_changes_are_clamped() {
        let mut player = Player::new(Side::Hero, CellCoord::new(0, 0));
        let stats = player.stats_mut();
        stats.set_health(stats.health() - 40);

        assert_eq!(player.stats().health(), 0);
        assert!(player.is_dead());
    }
}
