use glam::Vec3;
use walkgrid_core::{CellCoord, CollisionFilter, Command, Event};
use walkgrid_scene::{Collider, StaticScene};
use walkgrid_system_classification::CellClassifier;
use walkgrid_system_sampling::{EnvironmentSampler, ProbeFilters, SamplerConfig};
use walkgrid_world::{self as world, query, Grid};

const GROUND: CollisionFilter = CollisionFilter::from_bits(0b001);
const SPAWN_PAD: CollisionFilter = CollisionFilter::from_bits(0b010);
const FENCE: CollisionFilter = CollisionFilter::from_bits(0b100);

fn scene() -> StaticScene {
    StaticScene::new(vec![
        Collider::new(Vec3::new(0.0, -1.0, 0.0), Vec3::new(6.0, 0.0, 4.0), GROUND),
        Collider::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.1, 4.0), SPAWN_PAD),
        Collider::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(6.0, 2.0, 4.0), FENCE),
        Collider::new(Vec3::new(2.0, 5.0, 0.0), Vec3::new(3.0, 6.0, 4.0), GROUND),
    ])
    .expect("scene")
}

fn sampler() -> EnvironmentSampler {
    EnvironmentSampler::new(SamplerConfig {
        filters: ProbeFilters {
            walkable: GROUND,
            enemy_spawnable: SPAWN_PAD,
            grid_edge: FENCE,
            ..ProbeFilters::default()
        },
        batch_size: 5,
        probe_height: 3.0,
        probe_length: 10.0,
    })
    .expect("sampler")
}

#[test]
fn scene_survey_drives_grid_flags() {
    let mut grid = Grid::create(6, 4, 1.0, 1.0, Vec3::ZERO).expect("grid");
    let survey = sampler().refresh(grid.layout(), &scene()).expect("survey");

    let mut events = Vec::new();
    world::apply(&mut grid, Command::ApplySurvey { survey }, &mut events);
    let command = CellClassifier.command_for(&query::walkability(&grid));
    world::apply(&mut grid, command, &mut events);
    assert!(matches!(
        events.as_slice(),
        [
            Event::SurveyApplied {
                walkable: 20,
                changed: 4,
                failed_probes: 0
            },
            Event::EdgesReclassified { .. }
        ]
    ));

    for y in 0..4 {
        let pad = query::cell_at(&grid, CellCoord::new(0, y)).expect("in bounds");
        assert!(pad.is_walkable() && pad.is_enemy_spawnable());

        let fence = query::cell_at(&grid, CellCoord::new(5, y)).expect("in bounds");
        assert!(!fence.is_walkable());

        let beside_fence = query::cell_at(&grid, CellCoord::new(4, y)).expect("in bounds");
        assert!(beside_fence.is_walkable() && beside_fence.is_walkable_edge());

        let below_overhang = query::cell_at(&grid, CellCoord::new(2, y)).expect("in bounds");
        assert!(below_overhang.is_walkable());
        assert!(!below_overhang.is_enemy_spawnable());
    }

    assert_eq!(query::enemy_spawn_cells(&grid).len(), 4);
}
