#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Haggis Hunt engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to. The opponent controller, for example, waits for
//! [`Event::TurnStarted`] and answers with exactly one
//! [`Command::SubmitAction`].

pub mod hex;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound shared by every player statistic.
pub const MAX_STAT: i32 = 16;

/// Smallest accepted maze dimension, in cells.
pub const MIN_DIMENSION: u32 = 1;

/// Largest accepted maze dimension, in cells.
pub const MAX_DIMENSION: u32 = 1000;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Builds the maze, items and both agents from the provided level layout.
    LoadLevel {
        /// Layout describing the maze dimensions and per-cell codes.
        spec: LevelSpec,
    },
    /// Destroys the loaded maze so another level can be loaded.
    UnloadLevel,
    /// Leaves the level begin screen and hands the first turn to the hero.
    StartLevel,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Proposes a turn-consuming action on behalf of one of the agents.
    SubmitAction {
        /// Agent issuing the action.
        side: Side,
        /// Action the agent wants to perform.
        request: ActionRequest,
    },
    /// Marks every cell that is a legal target for the action selectable.
    BeginCellSelection {
        /// Agent whose surroundings determine the legal targets.
        side: Side,
        /// Action whose targeting rules apply.
        kind: ActionKind,
    },
    /// Clears every selectable flag in the maze.
    EndCellSelection,
    /// Highlights the hovered cell, clearing any previous highlight.
    HoverCell {
        /// Cell under the cursor, if any.
        cell: Option<CellCoord>,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a level finished loading and awaits the start signal.
    LevelLoaded {
        /// Number of cell rows in the maze.
        height: u32,
        /// Number of cell columns in the maze.
        width: u32,
    },
    /// Reports that a level could not be loaded.
    LevelLoadFailed {
        /// Reason the layout was refused.
        error: LoadError,
    },
    /// Confirms that the loaded level was destroyed.
    LevelUnloaded,
    /// Announces that the level entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: LevelPhase,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Signals that the side may now decide its next action.
    TurnStarted {
        /// Agent that holds the turn.
        side: Side,
    },
    /// Confirms that a submitted action was installed as the player action.
    ActionAccepted {
        /// Agent performing the action.
        side: Side,
        /// Kind of action that started.
        kind: ActionKind,
    },
    /// Reports that a submitted action failed its legality check.
    ActionRejected {
        /// Agent that submitted the action.
        side: Side,
        /// Kind of action that was refused.
        kind: ActionKind,
        /// Specific reason the action was refused.
        reason: ActionError,
    },
    /// Confirms that a player action ran to completion.
    ActionCompleted {
        /// Agent that performed the action.
        side: Side,
        /// Kind of action that finished.
        kind: ActionKind,
    },
    /// Confirms that an agent moved between two cells.
    PlayerMoved {
        /// Agent that moved.
        side: Side,
        /// Cell the agent occupied before moving.
        from: CellCoord,
        /// Cell the agent occupies after moving.
        to: CellCoord,
    },
    /// Reports the new statistics of an agent after they changed.
    StatsChanged {
        /// Agent whose statistics changed.
        side: Side,
        /// Statistics after the change.
        stats: PlayerStats,
    },
    /// Confirms that a grenade knocked a layer off a wall.
    WallDamaged {
        /// Wall cell that was hit.
        cell: CellCoord,
        /// Wall height left after the hit; zero means the wall is gone.
        remaining: u8,
    },
    /// Confirms that a grenade hit an agent.
    PlayerHit {
        /// Agent that was hit.
        side: Side,
        /// Health removed before clamping.
        damage: i32,
    },
    /// Confirms that an agent collected an item.
    ItemCollected {
        /// Identifier of the collected item.
        item: ItemId,
        /// Kind of the collected item.
        kind: ItemKind,
        /// Agent that collected the item.
        side: Side,
    },
    /// Confirms that a psychic reveal uncovered a cell.
    CellRevealed {
        /// Cell that was revealed.
        cell: CellCoord,
        /// Number of entities made visible on the cell.
        entities: usize,
    },
    /// Announces that the level ended because an agent died.
    LevelEnded {
        /// Agent that lost the level.
        loser: Side,
    },
}

/// One of the two agents taking part in a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Human-controlled agent.
    Hero,
    /// Computer-controlled agent, the haggis.
    Opponent,
}

impl Side {
    /// Both sides in turn order.
    pub const ALL: [Side; 2] = [Side::Hero, Side::Opponent];

    /// Returns the side playing against this one.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Hero => Self::Opponent,
            Self::Opponent => Self::Hero,
        }
    }
}

/// Turn reported to presentation layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Turn {
    /// The hero may submit an action.
    Hero,
    /// The opponent may submit an action.
    Opponent,
    /// A player action is running; nobody may submit.
    Action,
}

/// Lifecycle phase of a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LevelPhase {
    /// No maze is loaded.
    NotLoaded,
    /// The maze is loaded and the begin screen is shown.
    BeginScreen,
    /// Agents are taking turns.
    Playing,
    /// An agent died and the end screen is shown.
    EndScreen,
}

/// Location of a single maze cell expressed as row and column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new cell coordinate from a row and a column.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }
}

/// Unique identifier assigned to an item when a level loads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Pickups that can be placed in a maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Restores health.
    Health,
    /// Restores energy.
    Energy,
    /// Adds a grenade.
    Grenade,
    /// Removes health.
    Trap,
}

impl ItemKind {
    /// Applies the item's fixed effect to the provided statistics.
    pub fn apply(self, stats: &mut PlayerStats) {
        match self {
            Self::Health => stats.set_health(stats.health() + 4),
            Self::Energy => stats.set_energy(stats.energy() + 4),
            Self::Grenade => stats.set_ammo(stats.ammo() + 1),
            Self::Trap => stats.set_health(stats.health() - 4),
        }
    }
}

/// Meaning of a single code in a level layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellCode {
    /// Code `0`: no cell; impassable and invisible.
    Hole,
    /// Code `1`: plain floor.
    Floor,
    /// Code `2`: wall of random height.
    Wall,
    /// Code `3`: the hero's starting cell.
    HeroStart,
    /// Code `4`: the opponent's starting cell.
    OpponentStart,
    /// Codes `5..=8`: floor holding an item.
    Item(ItemKind),
}

impl CellCode {
    /// Decodes a raw layout code, returning `None` for unknown values.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Hole),
            1 => Some(Self::Floor),
            2 => Some(Self::Wall),
            3 => Some(Self::HeroStart),
            4 => Some(Self::OpponentStart),
            5 => Some(Self::Item(ItemKind::Health)),
            6 => Some(Self::Item(ItemKind::Energy)),
            7 => Some(Self::Item(ItemKind::Grenade)),
            8 => Some(Self::Item(ItemKind::Trap)),
            _ => None,
        }
    }
}

/// Level layout consumed by the world when loading a maze.
///
/// Codes are stored row-major exactly as they appear in a level file. No
/// validation happens here; the world refuses out-of-range dimensions,
/// unknown codes and missing start cells with a [`LoadError`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSpec {
    height: u32,
    width: u32,
    codes: Vec<i32>,
}

impl LevelSpec {
    /// Creates a new layout from its dimensions and row-major codes.
    #[must_use]
    pub fn new(height: u32, width: u32, codes: Vec<i32>) -> Self {
        Self {
            height,
            width,
            codes,
        }
    }

    /// Number of cell rows in the layout.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of cell columns in the layout.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Raw row-major layout codes.
    #[must_use]
    pub fn codes(&self) -> &[i32] {
        &self.codes
    }
}

/// Health, energy and ammunition of an agent.
///
/// Every setter clamps into `0..=MAX_STAT`, so no sequence of actions can
/// push a statistic out of range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlayerStats {
    health: i32,
    energy: i32,
    ammo: i32,
}

impl PlayerStats {
    /// Statistics with every value at its maximum.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            health: MAX_STAT,
            energy: MAX_STAT,
            ammo: MAX_STAT,
        }
    }

    /// Creates statistics from raw values, clamping each into range.
    #[must_use]
    pub fn new(health: i32, energy: i32, ammo: i32) -> Self {
        Self {
            health: clamp_stat(health),
            energy: clamp_stat(energy),
            ammo: clamp_stat(ammo),
        }
    }

    /// Remaining health.
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    /// Remaining energy.
    #[must_use]
    pub const fn energy(&self) -> i32 {
        self.energy
    }

    /// Remaining grenades.
    #[must_use]
    pub const fn ammo(&self) -> i32 {
        self.ammo
    }

    /// Sets health, clamped into range.
    pub fn set_health(&mut self, health: i32) {
        self.health = clamp_stat(health);
    }

    /// Sets energy, clamped into range.
    pub fn set_energy(&mut self, energy: i32) {
        self.energy = clamp_stat(energy);
    }

    /// Sets ammunition, clamped into range.
    pub fn set_ammo(&mut self, ammo: i32) {
        self.ammo = clamp_stat(ammo);
    }

    /// Reports whether the agent is dead, i.e. out of health or energy.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.health <= 0 || self.energy <= 0
    }

    /// Reports whether the agent can afford the provided action.
    #[must_use]
    pub const fn can_perform(&self, kind: ActionKind) -> bool {
        self.energy >= kind.energy_required() && self.ammo >= kind.ammo_required()
    }
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self::full()
    }
}

fn clamp_stat(value: i32) -> i32 {
    value.clamp(0, MAX_STAT)
}

/// Turn-consuming actions an agent can perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Spin on the spot for half a second.
    Wait,
    /// Step onto a neighbouring cell.
    Walk,
    /// Leap onto a cell up to two rings away.
    Jump,
    /// Lob a grenade at a cell in range.
    Throw,
    /// Uncover the entities hidden on a neighbouring cell.
    Reveal,
}

impl ActionKind {
    /// Every action kind in button order.
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Wait,
        ActionKind::Walk,
        ActionKind::Jump,
        ActionKind::Throw,
        ActionKind::Reveal,
    ];

    /// Energy the agent must hold before the action is legal.
    #[must_use]
    pub const fn energy_required(self) -> i32 {
        match self {
            Self::Wait | Self::Throw => 0,
            Self::Walk | Self::Reveal => 1,
            Self::Jump => 5,
        }
    }

    /// Energy deducted when the action completes.
    ///
    /// Reveal is checked against its requirement but never charged.
    #[must_use]
    pub const fn energy_cost(self) -> i32 {
        match self {
            Self::Walk => 1,
            Self::Jump => 5,
            Self::Wait | Self::Throw | Self::Reveal => 0,
        }
    }

    /// Grenades the agent must hold before the action is legal.
    #[must_use]
    pub const fn ammo_required(self) -> i32 {
        match self {
            Self::Throw => 1,
            _ => 0,
        }
    }

    /// Reports whether the action needs a target cell.
    #[must_use]
    pub const fn needs_target(self) -> bool {
        !matches!(self, Self::Wait)
    }

    /// Builds the request for this kind aimed at `cell`.
    ///
    /// Wait ignores the target.
    #[must_use]
    pub const fn targeting(self, cell: CellCoord) -> ActionRequest {
        match self {
            Self::Wait => ActionRequest::Wait,
            Self::Walk => ActionRequest::Walk { to: cell },
            Self::Jump => ActionRequest::Jump { to: cell },
            Self::Throw => ActionRequest::Throw { at: cell },
            Self::Reveal => ActionRequest::Reveal { at: cell },
        }
    }
}

/// Concrete action proposed by an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionRequest {
    /// Spin on the spot.
    Wait,
    /// Walk to a neighbouring cell.
    Walk {
        /// Destination cell.
        to: CellCoord,
    },
    /// Jump to a cell in range.
    Jump {
        /// Destination cell.
        to: CellCoord,
    },
    /// Throw a grenade at a cell in range.
    Throw {
        /// Target cell.
        at: CellCoord,
    },
    /// Reveal a neighbouring cell.
    Reveal {
        /// Target cell.
        at: CellCoord,
    },
}

impl ActionRequest {
    /// Kind of action requested.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Wait => ActionKind::Wait,
            Self::Walk { .. } => ActionKind::Walk,
            Self::Jump { .. } => ActionKind::Jump,
            Self::Throw { .. } => ActionKind::Throw,
            Self::Reveal { .. } => ActionKind::Reveal,
        }
    }

    /// Target cell of the request, if it has one.
    #[must_use]
    pub const fn target(&self) -> Option<CellCoord> {
        match self {
            Self::Wait => None,
            Self::Walk { to } | Self::Jump { to } => Some(*to),
            Self::Throw { at } | Self::Reveal { at } => Some(*at),
        }
    }
}

/// Reasons a level layout may be refused by the world.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LoadError {
    /// A level is already loaded; it must be unloaded first.
    #[error("a level is already loaded")]
    AlreadyLoaded,
    /// The layout dimensions fall outside `1..=1000`.
    #[error("maze dimensions {height}x{width} are outside 1..=1000")]
    DimensionsOutOfRange {
        /// Requested number of rows.
        height: u32,
        /// Requested number of columns.
        width: u32,
    },
    /// The number of codes differs from `height * width`.
    #[error("expected {expected} cell codes but found {found}")]
    CellCountMismatch {
        /// Number of codes the dimensions require.
        expected: usize,
        /// Number of codes supplied.
        found: usize,
    },
    /// A cell carries a code outside `0..=8`.
    #[error("cell ({}, {}) has unknown code {code}", .cell.row(), .cell.column())]
    UnknownCellCode {
        /// Cell carrying the code.
        cell: CellCoord,
        /// Offending code.
        code: i32,
    },
    /// The layout does not place the hero.
    #[error("the layout has no hero start cell")]
    MissingHeroStart,
    /// The layout does not place the opponent.
    #[error("the layout has no opponent start cell")]
    MissingOpponentStart,
}

/// Reasons an action request may fail its legality check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum ActionError {
    /// The acting agent is not standing on a cell.
    #[error("the agent is not standing on a cell")]
    ActorNotPlaced,
    /// The agent lacks the energy the action requires.
    #[error("{required} energy required but only {available} available")]
    InsufficientEnergy {
        /// Energy the action requires.
        required: i32,
        /// Energy the agent holds.
        available: i32,
    },
    /// The agent has no grenade left.
    #[error("no grenades left")]
    NoAmmo,
    /// The target lies outside the maze.
    #[error("cell ({}, {}) is outside the maze", .cell.row(), .cell.column())]
    OutOfBounds {
        /// Requested target.
        cell: CellCoord,
    },
    /// The target is not a neighbour of the agent's cell.
    #[error("cell ({}, {}) is not adjacent", .cell.row(), .cell.column())]
    NotAdjacent {
        /// Requested target.
        cell: CellCoord,
    },
    /// The target is a wall, a hole or occupied by the other agent.
    #[error("cell ({}, {}) is blocked", .cell.row(), .cell.column())]
    Blocked {
        /// Requested target.
        cell: CellCoord,
    },
    /// The target lies beyond the action's radius.
    #[error("cell ({}, {}) is out of range", .cell.row(), .cell.column())]
    OutOfRange {
        /// Requested target.
        cell: CellCoord,
    },
    /// The target is the agent's own cell.
    #[error("an agent cannot target its own cell")]
    TargetsSelf,
}
