#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns action-button presses and cell clicks into hero commands.
//!
//! Pressing Wait submits immediately. Every other button marks the legal
//! target cells selectable and waits for a click on one of them; pressing
//! the same button again cancels the selection.

use haggis_hunt_core::{
    ActionKind, ActionRequest, CellCoord, Command, Event, LevelPhase, PlayerStats, Side,
};
use log::debug;

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeroInput {
    /// Action button pressed on this frame, if any.
    pub action_button: Option<ActionKind>,
    /// Cell currently under the cursor.
    pub hovered_cell: Option<CellCoord>,
    /// Cell clicked on this frame, if any.
    pub clicked_cell: Option<CellCoord>,
}

impl HeroInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(
        action_button: Option<ActionKind>,
        hovered_cell: Option<CellCoord>,
        clicked_cell: Option<CellCoord>,
    ) -> Self {
        Self {
            action_button,
            hovered_cell,
            clicked_cell,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Selection {
    Idle,
    AwaitingCell(ActionKind),
}

/// Selection state machine for the human-controlled side.
#[derive(Clone, Debug)]
pub struct HeroControls {
    side: Side,
    my_turn: bool,
    selection: Selection,
    hovered: Option<CellCoord>,
}

impl Default for HeroControls {
    fn default() -> Self {
        Self::new(Side::Hero)
    }
}

impl HeroControls {
    /// Creates controls acting on behalf of `side`.
    #[must_use]
    pub const fn new(side: Side) -> Self {
        Self {
            side,
            my_turn: false,
            selection: Selection::Idle,
            hovered: None,
        }
    }

    /// Action whose target cell is being chosen, if any.
    #[must_use]
    pub const fn pending(&self) -> Option<ActionKind> {
        match self.selection {
            Selection::Idle => None,
            Selection::AwaitingCell(kind) => Some(kind),
        }
    }

    /// Reports whether the controlled side may act, as of the last events seen.
    #[must_use]
    pub const fn is_my_turn(&self) -> bool {
        self.my_turn
    }

    /// Consumes world events and frame input to emit hero commands.
    ///
    /// `stats` gates the action buttons the way a presentation layer would
    /// disable them. The `is_selectable` closure should mirror the flag the
    /// world sets on cells after a [`Command::BeginCellSelection`].
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        stats: PlayerStats,
        input: &HeroInput,
        is_selectable: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(CellCoord) -> bool,
    {
        for event in events {
            match event {
                Event::TurnStarted { side } => self.my_turn = *side == self.side,
                Event::ActionAccepted { side, .. } if *side == self.side => self.my_turn = false,
                Event::PhaseChanged { phase } if *phase != LevelPhase::Playing => {
                    self.my_turn = false;
                    self.selection = Selection::Idle;
                    self.hovered = None;
                }
                _ => {}
            }
        }

        if input.hovered_cell != self.hovered {
            self.hovered = input.hovered_cell;
            out.push(Command::HoverCell {
                cell: input.hovered_cell,
            });
        }

        if !self.my_turn {
            return;
        }

        if let Some(kind) = input.action_button {
            self.press(kind, stats, out);
        }

        if let (Selection::AwaitingCell(kind), Some(cell)) = (self.selection, input.clicked_cell) {
            if is_selectable(cell) {
                debug!("{:?} chose {kind:?} at {cell:?}", self.side);
                out.push(Command::SubmitAction {
                    side: self.side,
                    request: kind.targeting(cell),
                });
                self.cancel(out);
            }
        }
    }

    fn press(&mut self, kind: ActionKind, stats: PlayerStats, out: &mut Vec<Command>) {
        if !stats.can_perform(kind) {
            debug!("{:?} cannot afford {kind:?}", self.side);
            return;
        }

        if self.selection == Selection::AwaitingCell(kind) {
            self.cancel(out);
            return;
        }

        if kind.needs_target() {
            self.selection = Selection::AwaitingCell(kind);
            out.push(Command::BeginCellSelection {
                side: self.side,
                kind,
            });
        } else {
            if self.selection != Selection::Idle {
                self.cancel(out);
            }
            out.push(Command::SubmitAction {
                side: self.side,
                request: ActionRequest::Wait,
            });
        }
    }

    fn cancel(&mut self, out: &mut Vec<Command>) {
        self.selection = Selection::Idle;
        out.push(Command::EndCellSelection);
    }
}
