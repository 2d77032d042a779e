#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level state for Haggis Hunt.
//!
//! The world owns the loaded maze, both agents, the item registry and the two
//! action slots. It is the single writer: every mutation arrives as a
//! [`Command`] through [`apply`], and every observable consequence leaves as
//! an [`Event`].

mod actions;
mod items;
mod maze;
mod player;
mod stage;

use std::time::Duration;

use haggis_hunt_core::{
    ActionKind, ActionRequest, Command, Event, ItemId, LevelPhase, LevelSpec, LoadError, Side,
};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{actions::Action, stage::Stage};

pub use items::Item;
pub use maze::{Cell, Maze};
pub use player::{Entity, Player};

const DEFAULT_WALL_SEED: u64 = 0x4a61_6767_6973_0001;

/// Reference to an entity resting on a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityRef {
    /// One of the agents.
    Player(Side),
    /// An item from the level's registry.
    Item(ItemId),
}

#[derive(Debug)]
struct PlayerAction {
    side: Side,
    kind: ActionKind,
    action: Action,
}

/// Represents the authoritative Haggis Hunt level state.
#[derive(Debug)]
pub struct World {
    seed: u64,
    phase: LevelPhase,
    turn: Side,
    stage: Option<Stage>,
    player_action: Option<PlayerAction>,
    general_action: Option<Action>,
    loser: Option<Side>,
}

impl World {
    /// Creates an empty world whose wall heights derive from a fixed seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_WALL_SEED)
    }

    /// Creates an empty world whose wall heights derive from `seed`.
    ///
    /// Every load reseeds the generator, so reloading a layout reproduces
    /// the same maze.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            phase: LevelPhase::NotLoaded,
            turn: Side::Hero,
            stage: None,
            player_action: None,
            general_action: None,
            loser: None,
        }
    }

    fn enter_phase(&mut self, phase: LevelPhase, out_events: &mut Vec<Event>) {
        info!("level phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        out_events.push(Event::PhaseChanged { phase });
    }

    fn load(&mut self, spec: &LevelSpec, out_events: &mut Vec<Event>) -> Result<(), LoadError> {
        if self.phase != LevelPhase::NotLoaded {
            return Err(LoadError::AlreadyLoaded);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let (maze, placements) = Maze::from_spec(spec, &mut rng)?;
        let mut stage = Stage::new(maze);
        for (cell, kind) in placements {
            stage.place_item(cell, kind);
        }

        self.stage = Some(stage);
        self.turn = Side::Hero;
        self.player_action = None;
        self.general_action = None;
        self.loser = None;

        out_events.push(Event::LevelLoaded {
            height: spec.height(),
            width: spec.width(),
        });
        self.enter_phase(LevelPhase::BeginScreen, out_events);
        Ok(())
    }

    fn unload(&mut self, out_events: &mut Vec<Event>) {
        self.stage = None;
        self.player_action = None;
        self.general_action = None;
        self.loser = None;
        out_events.push(Event::LevelUnloaded);
        self.enter_phase(LevelPhase::NotLoaded, out_events);
    }

    fn submit(&mut self, side: Side, request: ActionRequest, out_events: &mut Vec<Event>) {
        if self.phase != LevelPhase::Playing {
            warn!("{side:?} submitted {request:?} outside of play");
            return;
        }
        if self.turn != side || self.player_action.is_some() {
            debug!("dropping out-of-turn {request:?} from {side:?}");
            return;
        }
        let Some(stage) = self.stage.as_ref() else {
            return;
        };
        if let Some(loser) = stage.defeated() {
            debug!("dropping {request:?} from {side:?}: {loser:?} is already down");
            return;
        }

        let kind = request.kind();
        match Action::build(stage, side, request) {
            Ok(action) => {
                debug!("{side:?} starts {request:?}");
                self.player_action = Some(PlayerAction { side, kind, action });
                self.turn = side.other();
                out_events.push(Event::ActionAccepted { side, kind });
            }
            Err(reason) => {
                debug!("{side:?} cannot perform {request:?}: {reason}");
                out_events.push(Event::ActionRejected { side, kind, reason });
            }
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        out_events.push(Event::TimeAdvanced { dt });
        if self.phase != LevelPhase::Playing {
            return;
        }
        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        let seconds = dt.as_secs_f32();

        let mut turn_finished = false;
        if let Some(active) = self.player_action.as_mut() {
            if !active.action.update(seconds, stage, out_events) {
                out_events.push(Event::ActionCompleted {
                    side: active.side,
                    kind: active.kind,
                });
                self.player_action = None;
                turn_finished = true;
            }
        }

        if let Some(action) = self.general_action.as_mut() {
            if !action.update(seconds, stage, out_events) {
                self.general_action = None;
            }
        }

        for side in Side::ALL {
            if self.general_action.is_some() || stage.defeated().is_some() {
                break;
            }
            let Some(item) = stage
                .player(side)
                .cell()
                .and_then(|cell| stage.items.unspent_at(cell))
            else {
                continue;
            };
            self.general_action = Action::pickup(stage, side, item, out_events);
        }

        let Some(loser) = stage.defeated() else {
            if turn_finished {
                out_events.push(Event::TurnStarted { side: self.turn });
            }
            return;
        };
        if self.player_action.is_some() || self.general_action.is_some() {
            debug!("{loser:?} is down, waiting for running actions");
            return;
        }

        info!("{loser:?} lost the level");
        self.loser = Some(loser);
        out_events.push(Event::LevelEnded { loser });
        self.enter_phase(LevelPhase::EndScreen, out_events);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadLevel { spec } => {
            if let Err(error) = world.load(&spec, out_events) {
                warn!("level load refused: {error}");
                out_events.push(Event::LevelLoadFailed { error });
            }
        }
        Command::UnloadLevel => {
            if world.phase == LevelPhase::NotLoaded {
                warn!("unload requested with no level loaded");
            } else {
                world.unload(out_events);
            }
        }
        Command::StartLevel => {
            if world.phase == LevelPhase::BeginScreen {
                world.turn = Side::Hero;
                world.enter_phase(LevelPhase::Playing, out_events);
                out_events.push(Event::TurnStarted { side: Side::Hero });
            } else {
                warn!("start requested during {:?}", world.phase);
            }
        }
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SubmitAction { side, request } => world.submit(side, request, out_events),
        Command::BeginCellSelection { side, kind } => {
            if let Some(stage) = world.stage.as_mut() {
                let targets = stage.legal_targets(side, kind);
                stage.maze.clear_selectable();
                for target in targets {
                    if let Some(cell) = stage.maze.cell_mut(target) {
                        cell.set_selectable(true);
                    }
                }
            }
        }
        Command::EndCellSelection => {
            if let Some(stage) = world.stage.as_mut() {
                stage.maze.clear_selectable();
            }
        }
        Command::HoverCell { cell } => {
            if let Some(stage) = world.stage.as_mut() {
                stage.maze.highlight(cell);
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec3;
    use haggis_hunt_core::{
        ActionError, ActionKind, ActionRequest, CellCoord, ItemId, LevelPhase, Side, Turn,
    };

    use super::{Item, Maze, Player, World};

    /// Current lifecycle phase of the level.
    #[must_use]
    pub fn phase(world: &World) -> LevelPhase {
        world.phase
    }

    /// Turn as presentation layers see it; [`Turn::Action`] while a player
    /// action is running.
    #[must_use]
    pub fn current_turn(world: &World) -> Turn {
        if world.player_action.is_some() {
            return Turn::Action;
        }
        match world.turn {
            Side::Hero => Turn::Hero,
            Side::Opponent => Turn::Opponent,
        }
    }

    /// Side whose submission the level would accept next, ignoring the
    /// in-flight action.
    #[must_use]
    pub fn turn_owner(world: &World) -> Side {
        world.turn
    }

    /// Provides read-only access to the loaded maze.
    #[must_use]
    pub fn maze(world: &World) -> Option<&Maze> {
        world.stage.as_ref().map(|stage| &stage.maze)
    }

    /// Provides read-only access to one of the agents.
    #[must_use]
    pub fn player(world: &World, side: Side) -> Option<&Player> {
        world.stage.as_ref().map(|stage| stage.player(side))
    }

    /// Items still present in the level, in identifier order.
    pub fn items(world: &World) -> impl Iterator<Item = &Item> {
        world.stage.iter().flat_map(|stage| stage.items.iter())
    }

    /// Looks up an item by identifier.
    #[must_use]
    pub fn item(world: &World, id: ItemId) -> Option<&Item> {
        world.stage.as_ref().and_then(|stage| stage.items.get(id))
    }

    /// Runs the legality check the level applies to submissions.
    pub fn check_action(
        world: &World,
        side: Side,
        request: &ActionRequest,
    ) -> Result<(), ActionError> {
        match world.stage.as_ref() {
            Some(stage) => stage.check(side, request),
            None => Err(ActionError::ActorNotPlaced),
        }
    }

    /// Reports whether the agent's statistics allow `kind`.
    #[must_use]
    pub fn can_perform(world: &World, side: Side, kind: ActionKind) -> bool {
        player(world, side).map_or(false, |player| player.stats().can_perform(kind))
    }

    /// Cells `side` could legally aim `kind` at.
    #[must_use]
    pub fn legal_targets(world: &World, side: Side, kind: ActionKind) -> Vec<CellCoord> {
        world
            .stage
            .as_ref()
            .map(|stage| stage.legal_targets(side, kind))
            .unwrap_or_default()
    }

    /// Cells currently flagged selectable.
    #[must_use]
    pub fn selectable_cells(world: &World) -> Vec<CellCoord> {
        maze(world).map(Maze::selectable_cells).unwrap_or_default()
    }

    /// Side and kind of the running player action, if any.
    #[must_use]
    pub fn player_action(world: &World) -> Option<(Side, ActionKind)> {
        world
            .player_action
            .as_ref()
            .map(|active| (active.side, active.kind))
    }

    /// Reports whether the general slot holds an action.
    #[must_use]
    pub fn general_action_running(world: &World) -> bool {
        world.general_action.is_some()
    }

    /// World position of a grenade in flight.
    #[must_use]
    pub fn projectile(world: &World) -> Option<Vec3> {
        world
            .player_action
            .as_ref()
            .and_then(|active| active.action.projectile())
    }

    /// Agent under a floating damage label and the label's height.
    #[must_use]
    pub fn hit_label(world: &World) -> Option<(Side, f32)> {
        world
            .player_action
            .as_ref()
            .and_then(|active| active.action.hit_label())
    }

    /// Side that lost the level, once it has ended.
    #[must_use]
    pub fn loser(world: &World) -> Option<Side> {
        world.loser
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haggis_hunt_core::{CellCoord, Turn};

    const FRAME: Duration = Duration::from_millis(16);

    fn corridor() -> LevelSpec {
        LevelSpec::new(1, 5, vec![3, 1, 5, 1, 4])
    }

    fn started(spec: LevelSpec) -> (World, Vec<Event>) {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::LoadLevel { spec }, &mut events);
        apply(&mut world, Command::StartLevel, &mut events);
        (world, events)
    }

    fn finish_action(world: &mut World, events: &mut Vec<Event>) {
        for _ in 0..600 {
            apply(world, Command::Tick { dt: FRAME }, events);
            if query::player_action(world).is_none() {
                return;
            }
        }
        panic!("player action never finished");
    }

    #[test]
    fn load_enters_begin_screen_and_start_hands_turn_to_hero() {
        let (world, events) = started(corridor());

        assert_eq!(
            events,
            vec![
                Event::LevelLoaded {
                    height: 1,
                    width: 5
                },
                Event::PhaseChanged {
                    phase: LevelPhase::BeginScreen
                },
                Event::PhaseChanged {
                    phase: LevelPhase::Playing
                },
                Event::TurnStarted { side: Side::Hero },
            ]
        );
        assert_eq!(query::current_turn(&world), Turn::Hero);
        assert_eq!(
            query::player(&world, Side::Opponent).and_then(Player::cell),
            Some(CellCoord::new(0, 4))
        );
    }

    #[test]
    fn second_load_is_refused() {
        let (mut world, _) = started(corridor());
        let mut events = Vec::new();

        apply(&mut world, Command::LoadLevel { spec: corridor() }, &mut events);

        assert_eq!(
            events,
            vec![Event::LevelLoadFailed {
                error: LoadError::AlreadyLoaded
            }]
        );
        assert_eq!(query::phase(&world), LevelPhase::Playing);
    }

    #[test]
    fn accepted_action_flips_the_turn_and_signals_on_completion() {
        let (mut world, _) = started(corridor());
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::SubmitAction {
                side: Side::Hero,
                request: ActionRequest::Wait,
            },
            &mut events,
        );
        assert_eq!(query::current_turn(&world), Turn::Action);
        assert_eq!(query::turn_owner(&world), Side::Opponent);

        finish_action(&mut world, &mut events);

        assert!(events.contains(&Event::ActionCompleted {
            side: Side::Hero,
            kind: ActionKind::Wait
        }));
        assert_eq!(events.last(), Some(&Event::TurnStarted { side: Side::Opponent }));
        assert_eq!(query::current_turn(&world), Turn::Opponent);
    }

    #[test]
    fn stepping_on_an_item_collects_it_once() {
        let (mut world, _) = started(corridor());
        let mut events = Vec::new();

        for to in [CellCoord::new(0, 1), CellCoord::new(0, 2)] {
            apply(
                &mut world,
                Command::SubmitAction {
                    side: Side::Hero,
                    request: ActionRequest::Walk { to },
                },
                &mut events,
            );
            finish_action(&mut world, &mut events);
            apply(
                &mut world,
                Command::SubmitAction {
                    side: Side::Opponent,
                    request: ActionRequest::Wait,
                },
                &mut events,
            );
            finish_action(&mut world, &mut events);
        }
        for _ in 0..120 {
            apply(&mut world, Command::Tick { dt: FRAME }, &mut events);
        }

        let collected = events
            .iter()
            .filter(|event| matches!(event, Event::ItemCollected { .. }))
            .count();
        assert_eq!(collected, 1);
        assert_eq!(query::items(&world).count(), 0);
        assert!(!query::general_action_running(&world));
        let health = query::player(&world, Side::Hero).map(|hero| hero.stats().health());
        assert_eq!(health, Some(haggis_hunt_core::MAX_STAT));
    }

    #[test]
    fn selection_marks_exactly_the_legal_targets() {
        let (mut world, _) = started(corridor());
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::BeginCellSelection {
                side: Side::Hero,
                kind: ActionKind::Walk,
            },
            &mut events,
        );
        assert_eq!(query::selectable_cells(&world), vec![CellCoord::new(0, 1)]);
        assert_eq!(
            query::selectable_cells(&world),
            query::legal_targets(&world, Side::Hero, ActionKind::Walk)
        );

        apply(&mut world, Command::EndCellSelection, &mut events);
        assert!(query::selectable_cells(&world).is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn unload_returns_to_not_loaded() {
        let (mut world, _) = started(corridor());
        let mut events = Vec::new();

        apply(&mut world, Command::UnloadLevel, &mut events);

        assert_eq!(query::phase(&world), LevelPhase::NotLoaded);
        assert!(query::maze(&world).is_none());
        assert_eq!(
            events,
            vec![
                Event::LevelUnloaded,
                Event::PhaseChanged {
                    phase: LevelPhase::NotLoaded
                }
            ]
        );
    }
}
