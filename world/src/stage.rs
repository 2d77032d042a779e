//! Loaded level contents and the legality rules actions are checked against.

use haggis_hunt_core::{
    hex, ActionError, ActionKind, ActionRequest, CellCoord, Event, ItemKind, PlayerStats, Side,
};

use crate::{items::ItemRegistry, maze::Maze, player::Player, EntityRef};

/// Rows and columns a jump or throw may span in either direction.
const REACH_WINDOW: u32 = 4;

/// Planar squared distance a jump or throw must stay under.
const REACH_RADIUS_SQ: f32 = 25.0;

/// Everything created by a level load and destroyed by an unload.
#[derive(Debug)]
pub(crate) struct Stage {
    pub(crate) maze: Maze,
    pub(crate) hero: Player,
    pub(crate) opponent: Player,
    pub(crate) items: ItemRegistry,
}

impl Stage {
    pub(crate) fn new(maze: Maze) -> Self {
        let mut stage = Self {
            hero: Player::new(Side::Hero, maze.hero_start()),
            opponent: Player::new(Side::Opponent, maze.opponent_start()),
            maze,
            items: ItemRegistry::default(),
        };
        for side in Side::ALL {
            let start = stage.player(side).cell();
            if let Some(cell) = start.and_then(|start| stage.maze.cell_mut(start)) {
                cell.add_entity(EntityRef::Player(side));
            }
        }
        stage
    }

    /// Registers a cloaked item and rests it on `cell`.
    pub(crate) fn place_item(&mut self, cell: CellCoord, kind: ItemKind) {
        let id = self.items.insert(cell, kind);
        if let Some(cell) = self.maze.cell_mut(cell) {
            cell.add_entity(EntityRef::Item(id));
        }
    }

    pub(crate) fn player(&self, side: Side) -> &Player {
        match side {
            Side::Hero => &self.hero,
            Side::Opponent => &self.opponent,
        }
    }

    pub(crate) fn player_mut(&mut self, side: Side) -> &mut Player {
        match side {
            Side::Hero => &mut self.hero,
            Side::Opponent => &mut self.opponent,
        }
    }

    /// Side of the first dead agent, checking the opponent before the hero.
    pub(crate) fn defeated(&self) -> Option<Side> {
        [&self.opponent, &self.hero]
            .into_iter()
            .find(|player| player.is_dead())
            .map(Player::side)
    }

    /// Moves an agent onto `to`, keeping cell occupancy in sync.
    pub(crate) fn move_player(&mut self, side: Side, to: CellCoord, out_events: &mut Vec<Event>) {
        let from = self.player(side).cell();
        if let Some(cell) = from.and_then(|from| self.maze.cell_mut(from)) {
            cell.remove_entity(EntityRef::Player(side));
        }
        if let Some(cell) = self.maze.cell_mut(to) {
            cell.add_entity(EntityRef::Player(side));
        }
        self.player_mut(side).entity_mut().set_cell(Some(to));

        if let Some(from) = from {
            out_events.push(Event::PlayerMoved { side, from, to });
        }
    }

    /// Applies `change` to an agent's statistics and reports any difference.
    pub(crate) fn change_stats(
        &mut self,
        side: Side,
        change: impl FnOnce(&mut PlayerStats),
        out_events: &mut Vec<Event>,
    ) {
        let stats = self.player_mut(side).stats_mut();
        let before = *stats;
        change(stats);
        if *stats != before {
            out_events.push(Event::StatsChanged {
                side,
                stats: *stats,
            });
        }
    }

    /// Verifies that `side` may perform `request` right now.
    pub(crate) fn check(&self, side: Side, request: &ActionRequest) -> Result<(), ActionError> {
        let kind = request.kind();
        let player = self.player(side);
        let stats = player.stats();

        if stats.energy() < kind.energy_required() {
            return Err(ActionError::InsufficientEnergy {
                required: kind.energy_required(),
                available: stats.energy(),
            });
        }
        if stats.ammo() < kind.ammo_required() {
            return Err(ActionError::NoAmmo);
        }

        let Some(target) = request.target() else {
            return Ok(());
        };
        let from = player.cell().ok_or(ActionError::ActorNotPlaced)?;
        self.check_target(from, kind, target)
    }

    /// Cells `side` could aim `kind` at, in row-major order.
    pub(crate) fn legal_targets(&self, side: Side, kind: ActionKind) -> Vec<CellCoord> {
        let player = self.player(side);
        if !kind.needs_target() || !player.stats().can_perform(kind) {
            return Vec::new();
        }
        let Some(from) = player.cell() else {
            return Vec::new();
        };

        let last_row = (from.row() + REACH_WINDOW).min(self.maze.height() - 1);
        let last_column = (from.column() + REACH_WINDOW).min(self.maze.width() - 1);
        let mut targets = Vec::new();
        for row in from.row().saturating_sub(REACH_WINDOW)..=last_row {
            for column in from.column().saturating_sub(REACH_WINDOW)..=last_column {
                let target = CellCoord::new(row, column);
                if self.check_target(from, kind, target).is_ok() {
                    targets.push(target);
                }
            }
        }
        targets
    }

    fn check_target(
        &self,
        from: CellCoord,
        kind: ActionKind,
        target: CellCoord,
    ) -> Result<(), ActionError> {
        let Some(cell) = self.maze.cell(target) else {
            return Err(ActionError::OutOfBounds { cell: target });
        };
        if target == from {
            return Err(ActionError::TargetsSelf);
        }

        let within_reach = || self.within_reach(from, target);
        match kind {
            ActionKind::Wait => Ok(()),
            ActionKind::Walk | ActionKind::Reveal => {
                if !hex::are_adjacent(from, target, self.maze.height(), self.maze.width()) {
                    Err(ActionError::NotAdjacent { cell: target })
                } else if !cell.is_open() {
                    Err(ActionError::Blocked { cell: target })
                } else {
                    Ok(())
                }
            }
            ActionKind::Jump => {
                if !within_reach() {
                    Err(ActionError::OutOfRange { cell: target })
                } else if !cell.is_open() {
                    Err(ActionError::Blocked { cell: target })
                } else {
                    Ok(())
                }
            }
            ActionKind::Throw => {
                if within_reach() {
                    Ok(())
                } else {
                    Err(ActionError::OutOfRange { cell: target })
                }
            }
        }
    }

    fn within_reach(&self, from: CellCoord, target: CellCoord) -> bool {
        if from.row().abs_diff(target.row()) > REACH_WINDOW
            || from.column().abs_diff(target.column()) > REACH_WINDOW
        {
            return false;
        }
        let (Some(origin), Some(destination)) = (self.maze.cell(from), self.maze.cell(target))
        else {
            return false;
        };
        hex::planar_distance_squared(origin.position(), destination.position()) < REACH_RADIUS_SQ
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haggis_hunt_core::LevelSpec;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn stage(height: u32, width: u32, codes: Vec<i32>) -> Stage {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let (maze, _) =
            Maze::from_spec(&LevelSpec::new(height, width, codes), &mut rng).expect("valid layout");
        Stage::new(maze)
    }

    fn open_field() -> Stage {
        let mut codes = vec![1; 81];
        codes[4 * 9 + 4] = 3;
        codes[0] = 4;
        codes[4 * 9 + 5] = 2;
        stage(9, 9, codes)
    }

    #[test]
    fn agents_occupy_their_start_cells() {
        let stage = open_field();
        let hero = stage.maze.get_cell(CellCoord::new(4, 4));
        assert!(hero.is_occupied());
        assert_eq!(hero.player(), Some(Side::Hero));
        assert!(stage.maze.get_cell(CellCoord::new(0, 0)).is_occupied());
    }

    #[test]
    fn walking_requires_an_open_neighbour() {
        let stage = open_field();
        let walk = |row, column| {
            stage.check(
                Side::Hero,
                &ActionRequest::Walk {
                    to: CellCoord::new(row, column),
                },
            )
        };

        assert_eq!(walk(4, 3), Ok(()));
        assert_eq!(
            walk(4, 5),
            Err(ActionError::Blocked {
                cell: CellCoord::new(4, 5)
            })
        );
        assert_eq!(
            walk(4, 6),
            Err(ActionError::NotAdjacent {
                cell: CellCoord::new(4, 6)
            })
        );
        assert_eq!(walk(4, 4), Err(ActionError::TargetsSelf));
        assert_eq!(
            walk(9, 0),
            Err(ActionError::OutOfBounds {
                cell: CellCoord::new(9, 0)
            })
        );
    }

    #[test]
    fn throws_may_target_walls_but_jumps_may_not() {
        let stage = open_field();
        let wall = CellCoord::new(4, 5);

        assert_eq!(stage.check(Side::Hero, &ActionRequest::Throw { at: wall }), Ok(()));
        assert_eq!(
            stage.check(Side::Hero, &ActionRequest::Jump { to: wall }),
            Err(ActionError::Blocked { cell: wall })
        );
    }

    #[test]
    fn legal_targets_match_individual_checks() {
        let stage = open_field();
        for kind in [ActionKind::Walk, ActionKind::Jump, ActionKind::Throw, ActionKind::Reveal] {
            let targets = stage.legal_targets(Side::Hero, kind);
            assert!(!targets.is_empty());
            for row in 0..9 {
                for column in 0..9 {
                    let cell = CellCoord::new(row, column);
                    let legal = stage.check(Side::Hero, &kind.targeting(cell)).is_ok();
                    assert_eq!(targets.contains(&cell), legal, "{kind:?} at {cell:?}");
                }
            }
        }
        assert!(stage.legal_targets(Side::Hero, ActionKind::Wait).is_empty());
    }

    #[test]
    fn exhausted_agents_have_no_targets() {
        let mut stage = open_field();
        let mut events = Vec::new();
        stage.change_stats(Side::Hero, |stats| stats.set_ammo(0), &mut events);
        stage.change_stats(Side::Hero, |stats| stats.set_energy(4), &mut events);

        assert!(stage.legal_targets(Side::Hero, ActionKind::Throw).is_empty());
        assert!(stage.legal_targets(Side::Hero, ActionKind::Jump).is_empty());
        assert_eq!(
            stage.check(Side::Hero, &ActionRequest::Jump { to: CellCoord::new(4, 3) }),
            Err(ActionError::InsufficientEnergy {
                required: 5,
                available: 4
            })
        );
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn moving_transfers_occupancy() {
        let mut stage = open_field();
        let mut events = Vec::new();
        stage.move_player(Side::Hero, CellCoord::new(4, 3), &mut events);

        assert!(!stage.maze.get_cell(CellCoord::new(4, 4)).is_occupied());
        assert!(stage.maze.get_cell(CellCoord::new(4, 3)).is_occupied());
        assert_eq!(stage.hero.cell(), Some(CellCoord::new(4, 3)));
        assert_eq!(
            events,
            vec![Event::PlayerMoved {
                side: Side::Hero,
                from: CellCoord::new(4, 4),
                to: CellCoord::new(4, 3),
            }]
        );
    }
}
