use std::{
    fs,
    path::PathBuf,
    process::{Command, Output},
};

const MAZE: &str = "\
5 5
1 1 1 100 1
1 100 100 1 1
1 100 1 10 1
1 1 1 100 1
100 100 1 1 1
0 0
4 0
";

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let path = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    fs::write(&path, contents).expect("failed to write scratch file");
    path
}

fn waypath(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_waypath"))
        .args(args)
        .output()
        .expect("failed to run waypath binary")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "waypath failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).expect("utf-8 output")
}

#[test]
fn check_reports_reachability() {
    let terrain = scratch_file("check_maze.txt", MAZE);
    let output = waypath(&["check", terrain.to_str().expect("utf-8 path")]);
    assert_eq!(stdout(&output), "path exists\n");
}

#[test]
fn check_honours_the_filter_layer() {
    let terrain = scratch_file("check_filtered_maze.txt", MAZE);
    let filter = scratch_file(
        "check_filter.txt",
        "5 5\n0 0 0 0 0\n0 0 0 0 100\n0 0 0 0 0\n0 0 0 0 0\n0 0 0 0 0\n0 0\n4 0\n",
    );
    let output = waypath(&[
        "check",
        terrain.to_str().expect("utf-8 path"),
        "--filter",
        filter.to_str().expect("utf-8 path"),
    ]);
    assert_eq!(stdout(&output), "no path\n");
}

#[test]
fn route_prints_nodes_and_totals() {
    let terrain = scratch_file("route_maze.txt", MAZE);
    let output = waypath(&["route", terrain.to_str().expect("utf-8 path")]);
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 14);
    assert_eq!(lines[0], "0 0 1");
    assert_eq!(lines[12], "4 0 1");
    assert_eq!(lines[13], "nodes 13 weight 13 cost 12");
}

#[test]
fn route_accepts_an_explicit_destination() {
    let terrain = scratch_file("route_to_maze.txt", MAZE);
    let output = waypath(&[
        "route",
        terrain.to_str().expect("utf-8 path"),
        "--to",
        "4,4",
        "--heuristic",
        "euclidean",
    ]);
    let text = stdout(&output);
    assert!(text.ends_with("nodes 9 weight 9 cost 8\n"), "{text}");
}

#[test]
fn normalize_blocks_zero_weights() {
    let terrain = scratch_file("normalize.txt", "1 2\n0 3\n\n0 0\n1 0\n");
    let output = waypath(&["normalize", terrain.to_str().expect("utf-8 path")]);
    assert_eq!(stdout(&output), "1 2\n100 3\n0 0\n1 0\n");
}

#[test]
fn place_rejects_a_sealing_tower() {
    let terrain = scratch_file("place_maze.txt", MAZE);
    let output = waypath(&[
        "place",
        terrain.to_str().expect("utf-8 path"),
        "--at",
        "4,1",
    ]);
    assert_eq!(
        stdout(&output),
        "rejected: ground movers could no longer reach the goal\n"
    );
}

#[test]
fn malformed_grid_fails_with_context() {
    let terrain = scratch_file("broken.txt", "2 2\n1 1\n1 x\n0 0\n1 1\n");
    let output = waypath(&["check", terrain.to_str().expect("utf-8 path")]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to parse grid"), "{stderr}");
}

#[test]
fn negative_heuristic_scale_is_rejected() {
    let terrain = scratch_file("route_negative_scale.txt", MAZE);
    let output = waypath(&[
        "route",
        terrain.to_str().expect("utf-8 path"),
        "--h-modifier=-1",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("h_modifier must be a non-negative number"), "{stderr}");
}

#[test]
fn help_lists_every_subcommand() {
    let text = stdout(&waypath(&["--help"]));
    for command in ["check", "route", "normalize", "place"] {
        assert!(text.contains(command), "missing {command} in {text}");
    }
}
