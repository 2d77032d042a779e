use std::time::Duration;

use haggis_hunt_core::{
    ActionKind, ActionRequest, CellCoord, Command, Event, LevelPhase, LevelSpec, PlayerStats, Side,
};
use haggis_hunt_system_opponent::{AgentView, Config, Opponent};
use haggis_hunt_world::{self as world, query, World};

const FRAME: Duration = Duration::from_millis(16);

fn bordered(height: u32, width: u32, hero: CellCoord, opponent: CellCoord) -> LevelSpec {
    let mut codes = Vec::new();
    for row in 0..height {
        for column in 0..width {
            let cell = CellCoord::new(row, column);
            let code = if cell == hero {
                3
            } else if cell == opponent {
                4
            } else if row == 0 || column == 0 || row == height - 1 || column == width - 1 {
                2
            } else {
                1
            };
            codes.push(code);
        }
    }
    LevelSpec::new(height, width, codes)
}

fn loaded(spec: LevelSpec) -> (World, Vec<Event>) {
    let mut world = World::with_seed(17);
    let mut events = Vec::new();
    world::apply(&mut world, Command::LoadLevel { spec }, &mut events);
    world::apply(&mut world, Command::StartLevel, &mut events);
    assert_eq!(query::phase(&world), LevelPhase::Playing);
    (world, events)
}

fn view(world: &World, side: Side) -> AgentView {
    query::player(world, side)
        .map(AgentView::from)
        .expect("agent is placed")
}

fn decide_once(
    opponent: &mut Opponent,
    world: &World,
    me: AgentView,
    enemy: AgentView,
) -> Vec<Command> {
    let maze = query::maze(world).expect("level is loaded");
    let mut commands = Vec::new();
    opponent.handle(
        &[Event::TurnStarted {
            side: Side::Opponent,
        }],
        maze,
        me,
        enemy,
        |request| {
            me.stats.can_perform(request.kind())
                && query::check_action(world, Side::Opponent, request).is_ok()
        },
        &mut commands,
    );
    commands
}

fn submitted(commands: &[Command]) -> Vec<ActionRequest> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::SubmitAction {
                side: Side::Opponent,
                request,
            } => Some(*request),
            _ => None,
        })
        .collect()
}

#[test]
fn every_turn_signal_yields_one_accepted_action() {
    let (mut world, mut events) = loaded(bordered(
        11,
        11,
        CellCoord::new(2, 2),
        CellCoord::new(8, 8),
    ));
    let mut opponent = Opponent::new(Config {
        side: Side::Opponent,
        seed: 3,
    });

    let mut signals = 0;
    let mut accepted = 0;
    for _ in 0..20_000 {
        if query::phase(&world) != LevelPhase::Playing || signals >= 100 {
            break;
        }

        let mut commands = Vec::new();
        for event in &events {
            match event {
                Event::TurnStarted { side: Side::Hero } => commands.push(Command::SubmitAction {
                    side: Side::Hero,
                    request: ActionRequest::Wait,
                }),
                Event::TurnStarted {
                    side: Side::Opponent,
                } => signals += 1,
                _ => {}
            }
        }
        let maze = query::maze(&world).expect("level is loaded");
        opponent.handle(
            &events,
            maze,
            view(&world, Side::Opponent),
            view(&world, Side::Hero),
            |request| query::check_action(&world, Side::Opponent, request).is_ok(),
            &mut commands,
        );

        events.clear();
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }
        for event in &events {
            match event {
                Event::ActionAccepted {
                    side: Side::Opponent,
                    ..
                } => accepted += 1,
                Event::ActionRejected { side, reason, .. } => {
                    panic!("{side:?} action rejected: {reason}")
                }
                _ => {}
            }
        }
        world::apply(&mut world, Command::Tick { dt: FRAME }, &mut events);
    }

    assert!(signals > 0, "opponent never got a turn");
    assert_eq!(accepted, signals);
}

#[test]
fn exhausted_opponent_degrades_to_wait_for_a_hundred_turns() {
    let (world, _) = loaded(bordered(
        11,
        11,
        CellCoord::new(1, 1),
        CellCoord::new(1, 2),
    ));
    let mut opponent = Opponent::default();
    let here = view(&world, Side::Opponent).cell;
    let enemy = view(&world, Side::Hero);

    for stats in [PlayerStats::new(16, 0, 0), PlayerStats::new(16, 0, 16)] {
        for _ in 0..100 {
            let me = AgentView::new(here, stats);
            let requests = submitted(&decide_once(&mut opponent, &world, me, enemy));
            assert_eq!(requests.len(), 1);
            assert!(matches!(
                requests[0],
                ActionRequest::Wait | ActionRequest::Throw { .. }
            ));
            if stats.ammo() == 0 {
                assert_eq!(requests[0], ActionRequest::Wait);
            }
        }
    }
}

#[test]
fn stale_paths_never_produce_illegal_requests() {
    let (world, _) = loaded(bordered(
        11,
        11,
        CellCoord::new(1, 1),
        CellCoord::new(6, 6),
    ));
    let mut opponent = Opponent::default();
    let me = view(&world, Side::Opponent);
    let enemy = view(&world, Side::Hero);

    for _ in 0..100 {
        let requests = submitted(&decide_once(&mut opponent, &world, me, enemy));
        assert_eq!(requests.len(), 1);
        assert_eq!(
            query::check_action(&world, Side::Opponent, &requests[0]),
            Ok(())
        );
    }
}

#[test]
fn walled_in_opponent_waits() {
    let (world, _) = loaded(LevelSpec::new(1, 3, vec![3, 2, 4]));
    let mut opponent = Opponent::default();
    let me = AgentView::new(view(&world, Side::Opponent).cell, PlayerStats::new(16, 16, 0));
    let enemy = view(&world, Side::Hero);

    for _ in 0..20 {
        let requests = submitted(&decide_once(&mut opponent, &world, me, enemy));
        assert_eq!(requests, vec![ActionRequest::Wait]);
    }
    assert!(opponent.path().is_empty());
}

#[test]
fn grenades_are_only_thrown_at_a_nearby_hero() {
    let (near, _) = loaded(bordered(7, 7, CellCoord::new(3, 2), CellCoord::new(3, 3)));
    let (far, _) = loaded(bordered(
        11,
        11,
        CellCoord::new(1, 1),
        CellCoord::new(9, 9),
    ));

    let count_throws = |world: &World| {
        let mut opponent = Opponent::default();
        let me = view(world, Side::Opponent);
        let enemy = view(world, Side::Hero);
        (0..40)
            .flat_map(|_| submitted(&decide_once(&mut opponent, world, me, enemy)))
            .filter(|request| request.kind() == ActionKind::Throw)
            .count()
    };

    assert!(count_throws(&near) > 0);
    assert_eq!(count_throws(&far), 0);
}

#[test]
fn signals_for_the_other_side_are_ignored() {
    let (world, _) = loaded(bordered(5, 5, CellCoord::new(1, 1), CellCoord::new(3, 3)));
    let mut opponent = Opponent::default();
    let mut commands = Vec::new();

    opponent.handle(
        &[
            Event::TurnStarted { side: Side::Hero },
            Event::TimeAdvanced { dt: FRAME },
        ],
        query::maze(&world).expect("level is loaded"),
        view(&world, Side::Opponent),
        view(&world, Side::Hero),
        |_| true,
        &mut commands,
    );

    assert!(commands.is_empty());
}
