//! Timed actions driven by the level's tick.
//!
//! Every action advances by `dt` seconds through [`Action::update`] and
//! returns `false` once it has finished. Player actions are built through
//! [`Action::build`], which runs the legality check first; item pickups are
//! general actions created by the level itself.

use std::f32::consts::TAU;

use glam::Vec3;
use haggis_hunt_core::{ActionError, ActionKind, ActionRequest, CellCoord, Event, ItemId, Side};

use crate::{player::STANDING_OFFSET, stage::Stage, EntityRef};

const WALK_SPEED: f32 = 10.0;
const GRAVITY: f32 = -100.0;
const SPIN_DURATION: f32 = 0.5;
const HIT_LABEL_DURATION: f32 = 0.5;
const PICKUP_RISE_DURATION: f32 = 0.5;
const PICKUP_DURATION: f32 = 1.0;
const LABEL_RISE_SPEED: f32 = 0.5;
const GRENADE_DAMAGE: i32 = 4;

/// Action occupying either the player slot or the general slot of a level.
#[derive(Debug)]
pub(crate) enum Action {
    Wait(Spin),
    Walk(Stride),
    Jump(Leap),
    Throw(Grenade),
    Reveal(Reveal),
    Pickup(Pickup),
}

impl Action {
    /// Checks `request` for `side` and builds the matching action.
    pub(crate) fn build(
        stage: &Stage,
        side: Side,
        request: ActionRequest,
    ) -> Result<Self, ActionError> {
        stage.check(side, &request)?;

        let action = match request {
            ActionRequest::Wait => Self::Wait(Spin {
                side,
                initial: stage.player(side).entity().rotation(),
                elapsed: 0.0,
            }),
            ActionRequest::Walk { to } => Self::Walk(Stride {
                side,
                to,
                initial: stage.player(side).entity().offset(),
                flight: Flight::straight(displacement(stage, side, to)),
            }),
            ActionRequest::Jump { to } => {
                let initial = stage.player(side).entity().offset();
                Self::Jump(Leap {
                    side,
                    to,
                    initial,
                    offset: initial,
                    flight: Flight::ballistic(displacement(stage, side, to)),
                })
            }
            ActionRequest::Throw { at } => Self::Throw(Grenade {
                side,
                at,
                position: launch_point(stage, side),
                flight: Flight::ballistic(displacement(stage, side, at)),
                hit_label: None,
            }),
            ActionRequest::Reveal { at } => Self::Reveal(Reveal { at }),
        };
        Ok(action)
    }

    /// Collects `item` for `side`, applying its effect immediately.
    pub(crate) fn pickup(
        stage: &mut Stage,
        side: Side,
        item: ItemId,
        out_events: &mut Vec<Event>,
    ) -> Option<Self> {
        let collected = stage.items.get_mut(item)?;
        collected.collect();
        let kind = collected.kind();

        stage.change_stats(side, |stats| kind.apply(stats), out_events);
        out_events.push(Event::ItemCollected { item, kind, side });
        Some(Self::Pickup(Pickup {
            item,
            elapsed: 0.0,
        }))
    }

    /// Advances the action by `dt` seconds, returning `false` once finished.
    pub(crate) fn update(&mut self, dt: f32, stage: &mut Stage, out_events: &mut Vec<Event>) -> bool {
        match self {
            Self::Wait(spin) => spin.update(dt, stage),
            Self::Walk(stride) => stride.update(dt, stage, out_events),
            Self::Jump(leap) => leap.update(dt, stage, out_events),
            Self::Throw(grenade) => grenade.update(dt, stage, out_events),
            Self::Reveal(reveal) => reveal.update(stage, out_events),
            Self::Pickup(pickup) => pickup.update(dt, stage),
        }
    }

    /// Agent under a floating damage label and the label's height above it.
    pub(crate) fn hit_label(&self) -> Option<(Side, f32)> {
        match self {
            Self::Throw(grenade) => grenade
                .hit_label
                .as_ref()
                .map(|label| (label.target, label.height())),
            _ => None,
        }
    }

    /// Position of a grenade still in the air.
    pub(crate) fn projectile(&self) -> Option<Vec3> {
        match self {
            Self::Throw(grenade) if !grenade.flight.landed() => Some(grenade.position),
            _ => None,
        }
    }
}

/// Displacement between the actor's cell and `to`, if both exist.
fn displacement(stage: &Stage, side: Side, to: CellCoord) -> Option<Vec3> {
    let from = stage.player(side).cell()?;
    let origin = stage.maze.cell(from)?;
    let destination = stage.maze.cell(to)?;
    Some(destination.position() - origin.position())
}

fn launch_point(stage: &Stage, side: Side) -> Vec3 {
    stage
        .player(side)
        .cell()
        .and_then(|cell| stage.maze.cell(cell))
        .map_or(Vec3::ZERO, |cell| cell.position() + STANDING_OFFSET)
}

/// Timing and velocity of a movement between two cells.
#[derive(Debug)]
pub(crate) struct Flight {
    elapsed: f32,
    duration: f32,
    velocity: Vec3,
}

impl Flight {
    /// Flight that never starts; used when the actor had no cell.
    const GROUNDED: Self = Self {
        elapsed: 0.0,
        duration: -1.0,
        velocity: Vec3::ZERO,
    };

    fn straight(displacement: Option<Vec3>) -> Self {
        let Some(displacement) = displacement else {
            return Self::GROUNDED;
        };
        let length = displacement.length();
        let velocity = if length > 0.0 {
            displacement * (WALK_SPEED / length)
        } else {
            Vec3::ZERO
        };
        Self {
            elapsed: 0.0,
            duration: length / WALK_SPEED,
            velocity,
        }
    }

    fn ballistic(displacement: Option<Vec3>) -> Self {
        let Some(displacement) = displacement else {
            return Self::GROUNDED;
        };
        let duration = displacement.length() / WALK_SPEED;
        if duration <= 0.0 {
            return Self {
                elapsed: 0.0,
                duration,
                velocity: Vec3::ZERO,
            };
        }
        let mut velocity = displacement / duration;
        velocity.y = displacement.y / duration - 0.5 * GRAVITY * duration;
        Self {
            elapsed: 0.0,
            duration,
            velocity,
        }
    }

    fn is_grounded(&self) -> bool {
        self.duration < 0.0
    }

    /// Adds `dt` to the clock and reports whether the flight is still running.
    fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        !self.landed()
    }

    fn landed(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Full turn on the spot.
#[derive(Debug)]
pub(crate) struct Spin {
    side: Side,
    initial: f32,
    elapsed: f32,
}

impl Spin {
    fn update(&mut self, dt: f32, stage: &mut Stage) -> bool {
        self.elapsed += dt;
        let entity = stage.player_mut(self.side).entity_mut();
        if self.elapsed >= SPIN_DURATION {
            entity.set_rotation(self.initial);
            return false;
        }
        entity.set_rotation(self.initial + self.elapsed / SPIN_DURATION * TAU);
        true
    }
}

/// Straight-line walk onto a neighbouring cell.
#[derive(Debug)]
pub(crate) struct Stride {
    side: Side,
    to: CellCoord,
    initial: Vec3,
    flight: Flight,
}

impl Stride {
    fn update(&mut self, dt: f32, stage: &mut Stage, out_events: &mut Vec<Event>) -> bool {
        if self.flight.is_grounded() {
            return false;
        }
        if !self.flight.advance(dt) {
            stage.player_mut(self.side).entity_mut().set_offset(self.initial);
            stage.move_player(self.side, self.to, out_events);
            spend_energy(stage, self.side, ActionKind::Walk, out_events);
            return false;
        }

        let offset = self.initial + self.flight.velocity * self.flight.elapsed;
        stage.player_mut(self.side).entity_mut().set_offset(offset);
        true
    }
}

/// Parabolic leap onto a cell in reach.
#[derive(Debug)]
pub(crate) struct Leap {
    side: Side,
    to: CellCoord,
    initial: Vec3,
    offset: Vec3,
    flight: Flight,
}

impl Leap {
    fn update(&mut self, dt: f32, stage: &mut Stage, out_events: &mut Vec<Event>) -> bool {
        if self.flight.is_grounded() {
            return false;
        }
        if !self.flight.advance(dt) {
            stage.player_mut(self.side).entity_mut().set_offset(self.initial);
            stage.move_player(self.side, self.to, out_events);
            spend_energy(stage, self.side, ActionKind::Jump, out_events);
            return false;
        }

        self.flight.velocity.y += GRAVITY * dt;
        self.offset += self.flight.velocity * dt;
        stage.player_mut(self.side).entity_mut().set_offset(self.offset);
        true
    }
}

fn spend_energy(stage: &mut Stage, side: Side, kind: ActionKind, out_events: &mut Vec<Event>) {
    stage.change_stats(
        side,
        |stats| stats.set_energy(stats.energy() - kind.energy_cost()),
        out_events,
    );
}

/// Grenade lobbed along the same arc as a jump.
#[derive(Debug)]
pub(crate) struct Grenade {
    side: Side,
    at: CellCoord,
    position: Vec3,
    flight: Flight,
    hit_label: Option<HitLabel>,
}

impl Grenade {
    fn update(&mut self, dt: f32, stage: &mut Stage, out_events: &mut Vec<Event>) -> bool {
        if self.flight.is_grounded() {
            return false;
        }
        if self.flight.advance(dt) {
            self.flight.velocity.y += GRAVITY * dt;
            self.position += self.flight.velocity * dt;
            return true;
        }
        if let Some(label) = self.hit_label.as_mut() {
            return label.update(dt);
        }

        stage.change_stats(self.side, |stats| stats.set_ammo(stats.ammo() - 1), out_events);

        if let Some(cell) = stage.maze.cell_mut(self.at).filter(|cell| cell.is_wall()) {
            let remaining = cell.hit_wall();
            out_events.push(Event::WallDamaged {
                cell: self.at,
                remaining,
            });
            return false;
        }

        let target = self.side.other();
        if stage.player(target).cell() != Some(self.at) {
            return false;
        }
        stage.change_stats(
            target,
            |stats| stats.set_health(stats.health() - GRENADE_DAMAGE),
            out_events,
        );
        out_events.push(Event::PlayerHit {
            side: target,
            damage: GRENADE_DAMAGE,
        });
        self.hit_label = Some(HitLabel {
            target,
            elapsed: 0.0,
        });
        true
    }
}

/// Damage label floating above a hit agent.
#[derive(Debug)]
pub(crate) struct HitLabel {
    target: Side,
    elapsed: f32,
}

impl HitLabel {
    fn update(&mut self, dt: f32) -> bool {
        self.elapsed = (self.elapsed + dt).min(HIT_LABEL_DURATION);
        self.elapsed < HIT_LABEL_DURATION
    }

    fn height(&self) -> f32 {
        self.elapsed * LABEL_RISE_SPEED
    }
}

/// Psychic reveal of everything resting on a neighbouring cell.
#[derive(Debug)]
pub(crate) struct Reveal {
    at: CellCoord,
}

impl Reveal {
    fn update(&mut self, stage: &mut Stage, out_events: &mut Vec<Event>) -> bool {
        let entities = stage
            .maze
            .cell(self.at)
            .map(|cell| cell.entities().to_vec())
            .unwrap_or_default();

        for entity in &entities {
            match *entity {
                EntityRef::Player(side) => stage.player_mut(side).entity_mut().set_visible(true),
                EntityRef::Item(id) => {
                    if let Some(item) = stage.items.get_mut(id) {
                        item.entity_mut().set_visible(true);
                    }
                }
            }
        }

        out_events.push(Event::CellRevealed {
            cell: self.at,
            entities: entities.len(),
        });
        false
    }
}

/// Rising label shown while an item is collected.
#[derive(Debug)]
pub(crate) struct Pickup {
    item: ItemId,
    elapsed: f32,
}

impl Pickup {
    fn update(&mut self, dt: f32, stage: &mut Stage) -> bool {
        self.elapsed += dt;
        if self.elapsed >= PICKUP_DURATION {
            if let Some(cell) = stage.items.remove(self.item).and_then(|item| item.cell()) {
                if let Some(cell) = stage.maze.cell_mut(cell) {
                    cell.remove_entity(EntityRef::Item(self.item));
                }
            }
            return false;
        }
        if self.elapsed < PICKUP_RISE_DURATION {
            if let Some(item) = stage.items.get_mut(self.item) {
                item.raise_billboard(self.elapsed * LABEL_RISE_SPEED);
            }
        }
        true
    }
}
