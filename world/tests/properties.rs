use std::time::Duration;

use haggis_hunt_core::{
    hex, ActionKind, ActionRequest, CellCoord, Command, Event, LevelPhase, LevelSpec, PlayerStats,
    Side, MAX_STAT,
};
use haggis_hunt_world::{self as world, query, World};
use proptest::prelude::*;

fn open_floor(height: u32, width: u32) -> LevelSpec {
    let count = (height * width) as usize;
    let mut codes = vec![1; count];
    codes[0] = 3;
    codes[count - 1] = 4;
    LevelSpec::new(height, width, codes)
}

fn stocked_arena() -> LevelSpec {
    #[rustfmt::skip]
    let codes = vec![
        2, 2, 2, 2, 2, 2, 2, 2,
        2, 3, 1, 5, 8, 1, 7, 2,
        2, 6, 1, 2, 1, 8, 1, 2,
        2, 1, 7, 1, 6, 1, 1, 2,
        2, 8, 1, 5, 1, 7, 4, 2,
        2, 2, 2, 2, 2, 2, 2, 2,
    ];
    LevelSpec::new(6, 8, codes)
}

fn stats_in_bounds(world: &World) -> bool {
    Side::ALL.into_iter().all(|side| {
        query::player(world, side).map_or(false, |player| {
            let stats = player.stats();
            [stats.health(), stats.energy(), stats.ammo()]
                .into_iter()
                .all(|value| (0..=MAX_STAT).contains(&value))
        })
    })
}

fn dimensions() -> impl Strategy<Value = (u32, u32)> {
    (1_u32..8, 1_u32..8).prop_filter("two starts need two cells", |(h, w)| h * w >= 2)
}

proptest! {
    #[test]
    fn loaded_grids_cover_every_cell((height, width) in dimensions(), seed in any::<u64>()) {
        let mut world = World::with_seed(seed);
        let mut events = Vec::new();
        world::apply(&mut world, Command::LoadLevel { spec: open_floor(height, width) }, &mut events);

        prop_assert_eq!(events.first(), Some(&Event::LevelLoaded { height, width }));
        let maze = query::maze(&world).expect("level is loaded");
        prop_assert_eq!(maze.cells().count(), (height * width) as usize);
    }

    #[test]
    fn neighbours_are_symmetric_and_close((height, width) in dimensions()) {
        let mut world = World::new();
        let mut events = Vec::new();
        world::apply(&mut world, Command::LoadLevel { spec: open_floor(height, width) }, &mut events);
        let maze = query::maze(&world).expect("level is loaded");

        for cell in maze.cells() {
            prop_assert!(cell.neighbours().len() <= 6);
            for &neighbour in cell.neighbours() {
                prop_assert!(maze.neighbours(neighbour).contains(&cell.coord()));
                let distance = hex::planar_distance_squared(
                    maze.get_cell(cell.coord()).position(),
                    maze.get_cell(neighbour).position(),
                );
                prop_assert!(distance < 1.8 * 1.8);
            }
        }
    }

    #[test]
    fn stats_stay_within_bounds(health in any::<i32>(), energy in any::<i32>(), ammo in any::<i32>()) {
        let stats = PlayerStats::new(health, energy, ammo);
        for value in [stats.health(), stats.energy(), stats.ammo()] {
            prop_assert!((0..=MAX_STAT).contains(&value));
        }
        prop_assert_eq!(stats.is_dead(), health <= 0 || energy <= 0);
    }

    #[test]
    fn interior_neighbours_number_six(row in 1_u32..6, column in 1_u32..6) {
        let cell = CellCoord::new(row, column);
        prop_assert_eq!(hex::hex_neighbours(cell, 7, 7).count(), 6);
    }

    #[test]
    fn stats_stay_within_bounds_through_play(
        choices in prop::collection::vec((0_usize..ActionKind::ALL.len(), any::<usize>()), 1..40),
        seed in any::<u64>(),
    ) {
        let mut world = World::with_seed(seed);
        let mut events = Vec::new();
        world::apply(&mut world, Command::LoadLevel { spec: stocked_arena() }, &mut events);
        world::apply(&mut world, Command::StartLevel, &mut events);

        for (kind, pick) in choices {
            if query::phase(&world) != LevelPhase::Playing {
                break;
            }
            let side = query::turn_owner(&world);
            let kind = ActionKind::ALL[kind];
            let targets = query::legal_targets(&world, side, kind);
            let request = if kind == ActionKind::Wait || targets.is_empty() {
                ActionRequest::Wait
            } else {
                kind.targeting(targets[pick % targets.len()])
            };
            world::apply(&mut world, Command::SubmitAction { side, request }, &mut events);
            prop_assert!(query::player_action(&world).is_some());

            for _ in 0..1_000 {
                world::apply(
                    &mut world,
                    Command::Tick { dt: Duration::from_millis(16) },
                    &mut events,
                );
                prop_assert!(stats_in_bounds(&world));
                let idle = query::player_action(&world).is_none()
                    && !query::general_action_running(&world);
                if idle {
                    break;
                }
            }
        }
        prop_assert!(stats_in_bounds(&world));
    }
}
