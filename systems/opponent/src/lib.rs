#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Computer-controlled opponent that answers every turn signal with one action.
//!
//! The controller lobs a grenade when the enemy is close and a coin flip
//! agrees. Otherwise it wanders towards a random reachable cell along a
//! breadth-first path that is cached across turns.

use std::collections::VecDeque;

use haggis_hunt_core::{
    hex, ActionKind, ActionRequest, CellCoord, Command, Event, PlayerStats, Side,
};
use haggis_hunt_world::{Maze, Player};
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Planar squared distance within which the opponent considers throwing.
const GRENADE_RADIUS_SQ: f32 = 25.0;

/// Snapshot of an agent as the opponent sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgentView {
    /// Cell the agent stands on, if placed.
    pub cell: Option<CellCoord>,
    /// Current statistics of the agent.
    pub stats: PlayerStats,
}

impl AgentView {
    /// Creates a new agent snapshot.
    #[must_use]
    pub const fn new(cell: Option<CellCoord>, stats: PlayerStats) -> Self {
        Self { cell, stats }
    }
}

impl From<&Player> for AgentView {
    fn from(player: &Player) -> Self {
        Self::new(player.cell(), player.stats())
    }
}

/// Configuration for the opponent controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Side the controller plays.
    pub side: Side,
    /// Seed for the coin flips and destination choices.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            side: Side::Opponent,
            seed: 0x6861_6767_6973,
        }
    }
}

/// Pure system that reacts to turn signals and emits exactly one action each.
#[derive(Debug)]
pub struct Opponent {
    side: Side,
    rng: ChaCha8Rng,
    path: Vec<CellCoord>,
}

impl Default for Opponent {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Opponent {
    /// Creates a controller from the provided configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            side: config.side,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            path: Vec::new(),
        }
    }

    /// Side the controller plays.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Remaining steps of the cached wander path, next step last.
    #[must_use]
    pub fn path(&self) -> &[CellCoord] {
        &self.path
    }

    /// Consumes world events and emits one action per turn signal.
    ///
    /// The `is_legal` closure should mirror the world's
    /// `query::check_action` for this side; any move it refuses degrades to
    /// Wait so the turn always produces an accepted action.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        maze: &Maze,
        me: AgentView,
        enemy: AgentView,
        is_legal: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(&ActionRequest) -> bool,
    {
        for event in events {
            if let Event::TurnStarted { side } = event {
                if *side == self.side {
                    let request = self.decide(maze, me, enemy, &is_legal);
                    debug!("{:?} decides {request:?}", self.side);
                    out.push(Command::SubmitAction {
                        side: self.side,
                        request,
                    });
                }
            }
        }
    }

    fn decide<F>(
        &mut self,
        maze: &Maze,
        me: AgentView,
        enemy: AgentView,
        is_legal: &F,
    ) -> ActionRequest
    where
        F: Fn(&ActionRequest) -> bool,
    {
        let Some(here) = me.cell else {
            return ActionRequest::Wait;
        };

        if me.stats.can_perform(ActionKind::Throw) && self.rng.gen_bool(0.5) {
            if let Some(target) = enemy.cell.filter(|target| within_throw(maze, here, *target)) {
                let throw = ActionRequest::Throw { at: target };
                if is_legal(&throw) {
                    return throw;
                }
            }
        }

        if !me.stats.can_perform(ActionKind::Walk) {
            return ActionRequest::Wait;
        }

        if self.path.is_empty() {
            self.plan(maze, here);
        }

        let Some(step) = self.path.pop() else {
            return ActionRequest::Wait;
        };
        let occupied = maze.cell(step).map_or(true, |cell| cell.is_occupied());
        let request = if !occupied {
            ActionRequest::Walk { to: step }
        } else if let Some(beyond) = self.path.pop() {
            ActionRequest::Jump { to: beyond }
        } else {
            ActionRequest::Wait
        };

        if request == ActionRequest::Wait || !is_legal(&request) {
            self.path.clear();
            return ActionRequest::Wait;
        }
        request
    }

    /// Replaces the cached path with one towards a random reachable cell.
    fn plan(&mut self, maze: &Maze, start: CellCoord) {
        self.path.clear();

        let (reachable, parents) = explore(maze, start);
        if reachable.len() < 2 {
            return;
        }

        let mut cursor = reachable[self.rng.gen_range(1..reachable.len())];
        while cursor != start {
            self.path.push(cursor);
            let Some(parent) = parents[index(maze, cursor)] else {
                self.path.clear();
                return;
            };
            cursor = parent;
        }
    }
}

fn within_throw(maze: &Maze, from: CellCoord, target: CellCoord) -> bool {
    match (maze.cell(from), maze.cell(target)) {
        (Some(origin), Some(destination)) => {
            hex::planar_distance_squared(origin.position(), destination.position())
                < GRENADE_RADIUS_SQ
        }
        _ => false,
    }
}

fn index(maze: &Maze, cell: CellCoord) -> usize {
    cell.row() as usize * maze.width() as usize + cell.column() as usize
}

/// Breadth-first search over visible, wall-free cells.
///
/// Returns the cells in discovery order, starting with `start`, together with
/// the parent of every discovered cell.
fn explore(maze: &Maze, start: CellCoord) -> (Vec<CellCoord>, Vec<Option<CellCoord>>) {
    let cell_count = maze.height() as usize * maze.width() as usize;
    let mut visited = vec![false; cell_count];
    let mut parents = vec![None; cell_count];
    let mut reachable = Vec::new();
    let mut queue = VecDeque::new();

    if !maze.contains(start) {
        return (reachable, parents);
    }
    visited[index(maze, start)] = true;
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        reachable.push(current);
        for &neighbour in maze.neighbours(current) {
            let slot = index(maze, neighbour);
            if visited[slot] {
                continue;
            }
            let passable = maze
                .cell(neighbour)
                .map_or(false, |cell| cell.is_visible() && !cell.is_wall());
            if !passable {
                continue;
            }
            visited[slot] = true;
            parents[slot] = Some(current);
            queue.push_back(neighbour);
        }
    }

    (reachable, parents)
}
