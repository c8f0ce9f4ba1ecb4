use waypath_core::{CellCoord, CellRect, CellRectSize, GridError, BLOCKED_THRESHOLD};
use waypath_grid::{CostLayers, Grid};
use waypath_system_pathing::PathingConfig;
use waypath_system_placement::{
    MovementClass, Mover, PlacementPlanner, PlacementRejection, Route,
};

fn open_route(class: MovementClass, start: CellCoord, goal: CellCoord) -> Route {
    let mut terrain = Grid::filled(5, 5, 1);
    terrain.set_start(start).expect("in bounds");
    terrain.set_goal(goal).expect("in bounds");
    Route::new(class, CostLayers::open(terrain))
}

fn corridor_route() -> Route {
    let wall = BLOCKED_THRESHOLD;
    let mut terrain = Grid::from_weights(&[
        vec![1, wall, wall, wall, wall],
        vec![1, wall, wall, wall, wall],
        vec![1, 1, 1, 1, wall],
        vec![wall, wall, wall, 1, wall],
        vec![wall, wall, wall, 1, 1],
    ])
    .expect("rectangular table");
    terrain.set_start(CellCoord::new(0, 0)).expect("in bounds");
    terrain.set_goal(CellCoord::new(4, 4)).expect("in bounds");
    Route::new(MovementClass::Ground, CostLayers::open(terrain))
}

fn tower_at(x: u32, y: u32) -> CellRect {
    CellRect::from_origin_and_size(CellCoord::new(x, y), CellRectSize::new(1, 1))
}

fn square_at(x: u32, y: u32) -> CellRect {
    CellRect::from_origin_and_size(CellCoord::new(x, y), CellRectSize::new(2, 2))
}

#[test]
fn harmless_footprint_is_placeable() {
    let planner = PlacementPlanner::default();
    let routes = [open_route(
        MovementClass::Ground,
        CellCoord::new(0, 0),
        CellCoord::new(4, 4),
    )];

    let preview = planner.preview(&routes, square_at(1, 1), &[]);

    assert!(preview.placeable);
    assert_eq!(preview.rejection, None);
    assert_eq!(preview.region, square_at(1, 1));
}

#[test]
fn footprint_leaving_the_grid_is_rejected_first() {
    let planner = PlacementPlanner::default();
    let routes = [open_route(
        MovementClass::Ground,
        CellCoord::new(0, 0),
        CellCoord::new(4, 4),
    )];

    let preview = planner.preview(&routes, square_at(4, 4), &[]);

    assert!(!preview.placeable);
    assert_eq!(preview.rejection, Some(PlacementRejection::OutOfBounds));
}

#[test]
fn footprint_covering_an_endpoint_is_rejected() {
    let planner = PlacementPlanner::default();
    let routes = [open_route(
        MovementClass::Ground,
        CellCoord::new(0, 0),
        CellCoord::new(4, 4),
    )];

    let preview = planner.preview(&routes, square_at(3, 3), &[]);

    assert_eq!(
        preview.rejection,
        Some(PlacementRejection::CoversEndpoint(CellCoord::new(4, 4)))
    );
}

#[test]
fn overlapping_an_existing_structure_is_rejected() {
    let planner = PlacementPlanner::default();
    let mut routes = [open_route(
        MovementClass::Ground,
        CellCoord::new(0, 0),
        CellCoord::new(4, 4),
    )];
    planner
        .commit(&mut routes, tower_at(2, 2))
        .expect("footprint fits");

    let preview = planner.preview(&routes, square_at(1, 1), &[]);

    assert_eq!(
        preview.rejection,
        Some(PlacementRejection::Occupied(CellCoord::new(2, 2)))
    );
}

#[test]
fn sealing_the_ground_corridor_is_rejected() {
    let planner = PlacementPlanner::default();
    let routes = [
        open_route(MovementClass::Flying, CellCoord::new(0, 0), CellCoord::new(4, 4)),
        corridor_route(),
    ];

    let preview = planner.preview(&routes, tower_at(3, 2), &[]);

    assert_eq!(
        preview.rejection,
        Some(PlacementRejection::SealsRoute(MovementClass::Ground))
    );
}

#[test]
fn diagonal_movement_keeps_the_corridor_open() {
    let planner = PlacementPlanner::new(PathingConfig {
        allow_diagonal: true,
        ..PathingConfig::default()
    });
    let routes = [corridor_route()];

    let preview = planner.preview(&routes, tower_at(3, 2), &[]);

    assert!(preview.placeable, "rejected: {:?}", preview.rejection);
}

#[test]
fn enclosing_a_mover_is_rejected() {
    let planner = PlacementPlanner::default();
    let mut routes = [open_route(
        MovementClass::Ground,
        CellCoord::new(0, 0),
        CellCoord::new(4, 0),
    )];
    planner
        .commit(&mut routes, tower_at(1, 4))
        .expect("footprint fits");
    let movers = [Mover::new(MovementClass::Ground, CellCoord::new(0, 4))];

    let preview = planner.preview(&routes, tower_at(0, 3), &movers);

    assert_eq!(
        preview.rejection,
        Some(PlacementRejection::StrandsMover(CellCoord::new(0, 4)))
    );
}

#[test]
fn mover_under_the_footprint_may_walk_out() {
    let planner = PlacementPlanner::default();
    let routes = [open_route(
        MovementClass::Ground,
        CellCoord::new(0, 0),
        CellCoord::new(4, 4),
    )];
    let movers = [Mover::new(MovementClass::Ground, CellCoord::new(2, 2))];

    let preview = planner.preview(&routes, tower_at(2, 2), &movers);

    assert!(preview.placeable, "rejected: {:?}", preview.rejection);
}

#[test]
fn movers_without_a_route_are_ignored() {
    let planner = PlacementPlanner::default();
    let mut routes = [open_route(
        MovementClass::Ground,
        CellCoord::new(0, 0),
        CellCoord::new(4, 0),
    )];
    planner
        .commit(&mut routes, tower_at(1, 4))
        .expect("footprint fits");
    let movers = [Mover::new(MovementClass::Flying, CellCoord::new(0, 4))];

    let preview = planner.preview(&routes, tower_at(0, 3), &movers);

    assert!(preview.placeable, "rejected: {:?}", preview.rejection);
}

#[test]
fn preview_leaves_routes_untouched() {
    let planner = PlacementPlanner::default();
    let routes = [open_route(
        MovementClass::Ground,
        CellCoord::new(0, 0),
        CellCoord::new(4, 4),
    )];
    let before = routes[0].layers().filter().clone();

    let _ = planner.preview(&routes, square_at(1, 1), &[]);

    assert_eq!(routes[0].layers().filter(), &before);
}

#[test]
fn commit_and_remove_update_every_route() {
    let planner = PlacementPlanner::default();
    let mut routes = [
        open_route(MovementClass::Ground, CellCoord::new(0, 0), CellCoord::new(4, 4)),
        open_route(MovementClass::Flying, CellCoord::new(0, 0), CellCoord::new(4, 4)),
    ];
    let footprint = square_at(1, 1);

    planner.commit(&mut routes, footprint).expect("footprint fits");
    for route in &routes {
        for cell in footprint.cells() {
            assert_eq!(
                route.layers().filter().weight(cell).expect("in bounds"),
                BLOCKED_THRESHOLD
            );
        }
    }

    planner.remove(&mut routes, footprint).expect("footprint fits");
    for route in &routes {
        assert!(route.layers().filter().iter().all(|node| node.weight() == 0));
    }
}

#[test]
fn commit_outside_the_grid_writes_nothing() {
    let planner = PlacementPlanner::default();
    let mut routes = [open_route(
        MovementClass::Ground,
        CellCoord::new(0, 0),
        CellCoord::new(4, 4),
    )];

    let result = planner.commit(&mut routes, square_at(4, 0));

    assert!(matches!(result, Err(GridError::OutOfBounds { .. })));
    assert!(routes[0]
        .layers()
        .filter()
        .iter()
        .all(|node| node.weight() == 0));
}

#[test]
fn remove_restores_the_overlay_beneath_a_structure() {
    let planner = PlacementPlanner::default();
    let mut routes = [open_route(
        MovementClass::Ground,
        CellCoord::new(0, 0),
        CellCoord::new(4, 4),
    )];
    let cell = CellCoord::new(1, 1);
    routes[0]
        .layers_mut()
        .filter_mut()
        .set_weight(cell, 40)
        .expect("in bounds");

    planner.commit(&mut routes, tower_at(1, 1)).expect("footprint fits");
    planner.commit(&mut routes, tower_at(1, 1)).expect("footprint fits");
    assert!(routes[0].layers().filter().is_blocked(cell).expect("in bounds"));

    planner.remove(&mut routes, tower_at(1, 1)).expect("footprint fits");
    assert_eq!(routes[0].layers().filter().weight(cell).expect("in bounds"), 40);
}

#[test]
fn resized_overlay_is_reported_as_mismatched_layers() {
    let planner = PlacementPlanner::default();
    let mut routes = [open_route(
        MovementClass::Ground,
        CellCoord::new(0, 0),
        CellCoord::new(4, 4),
    )];
    routes[0]
        .layers_mut()
        .filter_mut()
        .clear_with_dimensions(2, 2, 0);

    let preview = planner.preview(&routes, tower_at(1, 1), &[]);

    assert!(!preview.placeable);
    assert_eq!(
        preview.rejection,
        Some(PlacementRejection::MismatchedLayers(MovementClass::Ground))
    );
}
