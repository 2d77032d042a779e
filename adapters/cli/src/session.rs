use std::io::{BufRead, Write};

use anyhow::{bail, ensure, Context, Result};
use haggis_hunt_core::{
    ActionKind, CellCoord, Command, Event, ItemKind, LevelPhase, LevelSpec, PlayerStats, Side,
    Turn,
};
use haggis_hunt_system_hero_input::{HeroControls, HeroInput};
use haggis_hunt_system_opponent::{AgentView, Config, Opponent};
use haggis_hunt_world::{self as world, query, Cell, EntityRef, Item, World};
use log::{debug, info};

use crate::config::SessionConfig;

/// Mixed into the session seed so an autoplaying hero does not mirror the haggis.
const HERO_SEED_MIX: u64 = 0xa5a5;

const HELP: &str = "\
commands:
  start              begin the level
  wait               spin on the spot
  walk <row> <col>   step to a neighbouring cell
  jump <row> <col>   leap up to two cells away
  throw <row> <col>  lob a grenade
  reveal <row> <col> look under a neighbouring cell
  show               redraw the maze
  retry              reload the level
  quit               leave the game";

/// One line of typed input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Order {
    Start,
    Retry,
    Quit,
    Help,
    Show,
    Act {
        kind: ActionKind,
        target: Option<CellCoord>,
    },
}

impl Order {
    /// Parses a typed line. Blank lines redraw the maze.
    pub(crate) fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Ok(Self::Show);
        };

        let order = match word.to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "retry" => Self::Retry,
            "quit" | "exit" => Self::Quit,
            "help" | "?" => Self::Help,
            "show" => Self::Show,
            verb_word => {
                let Some(kind) = ActionKind::ALL
                    .into_iter()
                    .find(|kind| verb(*kind) == verb_word)
                else {
                    bail!("unknown command '{word}', type help for a list");
                };
                let target = if kind.needs_target() {
                    let row = coordinate(words.next(), "row")?;
                    let column = coordinate(words.next(), "column")?;
                    Some(CellCoord::new(row, column))
                } else {
                    None
                };
                Self::Act { kind, target }
            }
        };

        ensure!(words.next().is_none(), "too many arguments for '{word}'");
        Ok(order)
    }
}

fn coordinate(token: Option<&str>, name: &str) -> Result<u32> {
    let Some(token) = token else {
        bail!("missing {name}");
    };
    token
        .parse()
        .with_context(|| format!("{name} '{token}' is not a cell index"))
}

const fn verb(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Wait => "wait",
        ActionKind::Walk => "walk",
        ActionKind::Jump => "jump",
        ActionKind::Throw => "throw",
        ActionKind::Reveal => "reveal",
    }
}

const fn label(side: Side) -> &'static str {
    match side {
        Side::Hero => "hero",
        Side::Opponent => "haggis",
    }
}

fn at(cell: CellCoord) -> String {
    format!("({}, {})", cell.row(), cell.column())
}

enum HeroDriver {
    Keyboard(HeroControls),
    Computer(Opponent),
}

/// Owns the world and both controllers and pumps frames between them.
pub(crate) struct Session {
    world: World,
    spec: LevelSpec,
    config: SessionConfig,
    hero: HeroDriver,
    haggis: Opponent,
    events: Vec<Event>,
    frames: u64,
}

impl Session {
    /// Loads `spec` into a fresh world. Load errors are fatal.
    pub(crate) fn new(spec: LevelSpec, config: SessionConfig) -> Result<Self> {
        let mut session = Self {
            world: World::with_seed(config.seed),
            spec,
            hero: hero_driver(&config),
            haggis: Opponent::new(haggis_config(&config)),
            config,
            events: Vec::new(),
            frames: 0,
        };
        session.load()?;
        Ok(session)
    }

    /// Number of frames simulated so far.
    #[must_use]
    pub(crate) const fn frames(&self) -> u64 {
        self.frames
    }

    /// Reads orders from `input` until it ends or the player quits.
    pub(crate) fn run_interactive<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: BufRead,
        W: Write,
    {
        writeln!(out, "{HELP}")?;
        self.settle(out)?;
        self.render(out)?;

        for line in input.lines() {
            let line = line.context("failed to read from stdin")?;
            match Order::parse(&line) {
                Err(error) => writeln!(out, "{error:#}")?,
                Ok(Order::Quit) => break,
                Ok(Order::Help) => writeln!(out, "{HELP}")?,
                Ok(Order::Show) => {}
                Ok(Order::Start) => self.start(out)?,
                Ok(Order::Retry) => self.retry(out)?,
                Ok(Order::Act { kind, target }) => self.act(kind, target, out)?,
            }
            self.render(out)?;
        }
        Ok(())
    }

    /// Lets both controllers play until the level ends or the frame budget runs out.
    ///
    /// Returns the losing side, if there is one.
    pub(crate) fn run_autoplay<W: Write>(&mut self, out: &mut W) -> Result<Option<Side>> {
        world::apply(&mut self.world, Command::StartLevel, &mut self.events);
        for _ in 0..self.config.max_frames {
            let commands = self.dispatch(HeroInput::default(), out)?;
            self.apply_all(commands);
            if query::phase(&self.world) != LevelPhase::Playing {
                break;
            }
            self.tick();
        }
        self.render(out)?;
        Ok(query::loser(&self.world))
    }

    fn load(&mut self) -> Result<()> {
        world::apply(
            &mut self.world,
            Command::LoadLevel {
                spec: self.spec.clone(),
            },
            &mut self.events,
        );
        let failure = self.events.iter().find_map(|event| match event {
            Event::LevelLoadFailed { error } => Some(error.clone()),
            _ => None,
        });
        if let Some(error) = failure {
            return Err(error).context("failed to load level");
        }
        Ok(())
    }

    fn start<W: Write>(&mut self, out: &mut W) -> Result<()> {
        if query::phase(&self.world) != LevelPhase::BeginScreen {
            writeln!(out, "the level has already started; type retry to reload it")?;
            return Ok(());
        }
        world::apply(&mut self.world, Command::StartLevel, &mut self.events);
        self.settle(out)
    }

    fn retry<W: Write>(&mut self, out: &mut W) -> Result<()> {
        info!("reloading level after {} frames", self.frames);
        world::apply(&mut self.world, Command::UnloadLevel, &mut self.events);
        self.haggis = Opponent::new(haggis_config(&self.config));
        if let HeroDriver::Computer(_) = self.hero {
            self.hero = hero_driver(&self.config);
        }
        self.load()?;
        self.settle(out)
    }

    fn act<W: Write>(
        &mut self,
        kind: ActionKind,
        target: Option<CellCoord>,
        out: &mut W,
    ) -> Result<()> {
        if query::phase(&self.world) != LevelPhase::Playing {
            writeln!(out, "the level is not running")?;
            return Ok(());
        }
        if !self.awaiting_hero() {
            writeln!(out, "it is not your turn")?;
            return Ok(());
        }

        let press = self.dispatch(HeroInput::new(Some(kind), None, None), out)?;
        self.apply_all(press);
        if let Some(cell) = target {
            let click = self.dispatch(HeroInput::new(None, Some(cell), Some(cell)), out)?;
            self.apply_all(click);
        }

        let pending = match &self.hero {
            HeroDriver::Keyboard(controls) => controls.pending(),
            HeroDriver::Computer(_) => None,
        };
        let rejected = self
            .events
            .iter()
            .any(|event| matches!(event, Event::ActionRejected { .. }));
        if let Some(pending) = pending {
            let cancel = self.dispatch(HeroInput::new(Some(pending), None, None), out)?;
            self.apply_all(cancel);
            writeln!(out, "cannot {} there", verb(pending))?;
        } else if query::player_action(&self.world).is_none() && !rejected {
            writeln!(out, "cannot {} right now", verb(kind))?;
        }

        self.settle(out)
    }

    /// Pumps frames until the hero has to choose or the level stops running.
    fn settle<W: Write>(&mut self, out: &mut W) -> Result<()> {
        for _ in 0..self.config.max_frames {
            let commands = self.dispatch(HeroInput::default(), out)?;
            let quiet = commands.is_empty();
            self.apply_all(commands);

            let playing = query::phase(&self.world) == LevelPhase::Playing;
            if quiet && (!playing || self.awaiting_hero()) {
                return Ok(());
            }
            if playing {
                self.tick();
            }
        }
        bail!(
            "no decision was needed within {} frames",
            self.config.max_frames
        )
    }

    fn awaiting_hero(&self) -> bool {
        let ready = match &self.hero {
            HeroDriver::Keyboard(controls) => controls.is_my_turn(),
            HeroDriver::Computer(_) => false,
        };
        ready && query::current_turn(&self.world) == Turn::Hero
    }

    /// Narrates pending events and lets both controllers react to them.
    fn dispatch<W: Write>(&mut self, input: HeroInput, out: &mut W) -> Result<Vec<Command>> {
        for event in &self.events {
            narrate(event, out)?;
        }

        let mut commands = Vec::new();
        if let Some(maze) = query::maze(&self.world) {
            let hero = agent(&self.world, Side::Hero);
            let haggis = agent(&self.world, Side::Opponent);
            let world = &self.world;

            match &mut self.hero {
                HeroDriver::Keyboard(controls) => {
                    let selectable = query::selectable_cells(world);
                    controls.handle(
                        &self.events,
                        hero.stats,
                        &input,
                        |cell| selectable.contains(&cell),
                        &mut commands,
                    );
                }
                HeroDriver::Computer(controller) => controller.handle(
                    &self.events,
                    maze,
                    hero,
                    haggis,
                    |request| query::check_action(world, Side::Hero, request).is_ok(),
                    &mut commands,
                ),
            }
            self.haggis.handle(
                &self.events,
                maze,
                haggis,
                hero,
                |request| query::check_action(world, Side::Opponent, request).is_ok(),
                &mut commands,
            );
        }

        self.events.clear();
        Ok(commands)
    }

    fn apply_all(&mut self, commands: Vec<Command>) {
        for command in commands {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }

    fn tick(&mut self) {
        world::apply(
            &mut self.world,
            Command::Tick {
                dt: self.config.frame(),
            },
            &mut self.events,
        );
        self.frames += 1;
    }

    fn render<W: Write>(&self, out: &mut W) -> Result<()> {
        let Some(maze) = query::maze(&self.world) else {
            writeln!(out, "no level loaded")?;
            return Ok(());
        };

        let header: String = (0..maze.width())
            .map(|column| format!("{} ", column % 10))
            .collect();
        writeln!(out, "    {}", header.trim_end())?;
        for row in 0..maze.height() {
            let mut line = String::new();
            if row % 2 == 1 {
                line.push(' ');
            }
            for column in 0..maze.width() {
                line.push(glyph(&self.world, maze.get_cell(CellCoord::new(row, column))));
                line.push(' ');
            }
            writeln!(out, "{row:>3} {}", line.trim_end())?;
        }

        for side in Side::ALL {
            if let Some(player) = query::player(&self.world, side) {
                let stats = player.stats();
                writeln!(
                    out,
                    "{:<7} health {:>2}  energy {:>2}  ammo {:>2}",
                    label(side),
                    stats.health(),
                    stats.energy(),
                    stats.ammo()
                )?;
            }
        }

        match query::phase(&self.world) {
            LevelPhase::BeginScreen => writeln!(out, "type start to begin")?,
            LevelPhase::EndScreen => writeln!(out, "type retry to play again or quit to leave")?,
            LevelPhase::NotLoaded => {}
            LevelPhase::Playing if self.awaiting_hero() => {
                let available: Vec<_> = ActionKind::ALL
                    .into_iter()
                    .filter(|kind| query::can_perform(&self.world, Side::Hero, *kind))
                    .map(verb)
                    .collect();
                writeln!(out, "your turn: {}", available.join(", "))?;
            }
            LevelPhase::Playing => {}
        }
        Ok(())
    }
}

fn hero_driver(config: &SessionConfig) -> HeroDriver {
    if config.autoplay {
        HeroDriver::Computer(Opponent::new(Config {
            side: Side::Hero,
            seed: config.seed ^ HERO_SEED_MIX,
        }))
    } else {
        HeroDriver::Keyboard(HeroControls::new(Side::Hero))
    }
}

fn haggis_config(config: &SessionConfig) -> Config {
    Config {
        side: Side::Opponent,
        seed: config.seed,
    }
}

fn agent(world: &World, side: Side) -> AgentView {
    query::player(world, side).map_or_else(
        || AgentView::new(None, PlayerStats::default()),
        AgentView::from,
    )
}

fn glyph(world: &World, cell: &Cell) -> char {
    if let Some(side) = cell.player() {
        return match side {
            Side::Hero => 'H',
            Side::Opponent => 'G',
        };
    }
    if !cell.is_visible() {
        return ' ';
    }
    if cell.is_selectable() {
        return '*';
    }
    if cell.is_wall() {
        return char::from_digit(u32::from(cell.wall_height()), 10).unwrap_or('#');
    }

    let item = cell
        .entities()
        .iter()
        .find_map(|entity| match entity {
            EntityRef::Item(id) => query::item(world, *id),
            EntityRef::Player(_) => None,
        })
        .filter(|item| item.entity().is_visible() && !item.is_spent());
    match item.map(Item::kind) {
        Some(ItemKind::Health) => '+',
        Some(ItemKind::Energy) => 'e',
        Some(ItemKind::Grenade) => 'o',
        Some(ItemKind::Trap) => 'x',
        None => '.',
    }
}

fn narrate<W: Write>(event: &Event, out: &mut W) -> Result<()> {
    debug!("{event:?}");
    match event {
        Event::LevelLoaded { height, width } => {
            writeln!(out, "loaded a {height}x{width} maze")?;
        }
        Event::LevelLoadFailed { error } => writeln!(out, "level failed to load: {error}")?,
        Event::TurnStarted { side } => writeln!(out, "{}'s turn", label(*side))?,
        Event::ActionAccepted { side, kind } => {
            writeln!(out, "{} chose to {}", label(*side), verb(*kind))?;
        }
        Event::ActionRejected { side, kind, reason } => {
            writeln!(out, "{} cannot {}: {reason}", label(*side), verb(*kind))?;
        }
        Event::PlayerMoved { side, to, .. } => {
            writeln!(out, "{} moved to {}", label(*side), at(*to))?;
        }
        Event::WallDamaged { cell, remaining } => {
            writeln!(out, "the wall at {} drops to height {remaining}", at(*cell))?;
        }
        Event::PlayerHit { side, damage } => {
            writeln!(out, "{} takes {damage} damage", label(*side))?;
        }
        Event::ItemCollected { item, kind, side } => {
            writeln!(out, "{} picked up {kind:?} item #{}", label(*side), item.get())?;
        }
        Event::CellRevealed { cell, entities } => {
            writeln!(out, "{} holds {entities} thing(s)", at(*cell))?;
        }
        Event::LevelEnded { loser } => {
            writeln!(out, "the {} wins", label(loser.other()))?;
        }
        Event::LevelUnloaded
        | Event::PhaseChanged { .. }
        | Event::TimeAdvanced { .. }
        | Event::ActionCompleted { .. }
        | Event::StatsChanged { .. } => {}
    }
    Ok(())
}
