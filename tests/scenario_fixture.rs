use std::path::PathBuf;

use biosim::{report::ReportWriter, scenario::ScenarioLoader, Engine, Species};

fn scenario_loader() -> ScenarioLoader {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
}

fn scenario_path() -> PathBuf {
    PathBuf::from("scenarios/rossumoya.yaml")
}

#[test]
fn scenario_loader_reads_fixture() {
    let scenario = scenario_loader().load(scenario_path()).expect("scenario parses");
    assert_eq!(scenario.name, "rossumoya");
    assert_eq!(scenario.years(None), 60);
    assert_eq!(scenario.seed_records().len(), 13);

    let world = scenario.build_world().expect("world builds");
    assert_eq!(world.count(Species::Herbivore), 10);
    assert_eq!(world.count(Species::Carnivore), 3);
    assert_eq!(world.species().get(Species::Carnivore).delta_phi_max, 9.0);
}

#[test]
fn scenario_runs_deterministically() {
    let scenario = scenario_loader().load(scenario_path()).unwrap();

    let mut world_a = scenario.build_world().unwrap();
    let report_a = Engine::new(scenario.seed).advance(&mut world_a, 20).unwrap();

    let mut world_b = scenario.build_world().unwrap();
    let report_b = Engine::new(scenario.seed).advance(&mut world_b, 20).unwrap();

    assert_eq!(report_a, report_b);
    assert_eq!(report_a.year, 20);
}

#[test]
fn advancing_in_chunks_matches_one_long_run() {
    let scenario = scenario_loader().load(scenario_path()).unwrap();

    let mut whole = scenario.build_world().unwrap();
    let single = Engine::new(scenario.seed).advance(&mut whole, 12).unwrap();

    let mut pieces = scenario.build_world().unwrap();
    let mut engine = Engine::new(scenario.seed);
    engine.advance(&mut pieces, 5).unwrap();
    let chunked = engine.advance(&mut pieces, 7).unwrap();

    assert_eq!(single, chunked);
}

#[test]
fn scenario_emits_reports() {
    let scenario = scenario_loader().load(scenario_path()).unwrap();
    let temp_dir = tempfile::tempdir().unwrap();
    let writer = ReportWriter::new(temp_dir.path().join("reports"), 10);

    let mut world = scenario.build_world().unwrap();
    let mut written = Vec::new();
    Engine::new(scenario.seed)
        .run_with_hook(&mut world, 20, |report| {
            if let Some(path) = writer.maybe_write(&scenario.name, report).unwrap() {
                written.push(path);
            }
        })
        .unwrap();

    assert_eq!(written.len(), 2);
    let expected = temp_dir
        .path()
        .join("reports")
        .join("rossumoya")
        .join("year_00010.json");
    assert!(expected.exists(), "expected report {} to exist", expected.display());

    let data = std::fs::read_to_string(expected).unwrap();
    assert!(data.contains("\"per_species\""));
}

#[test]
fn engine_runs_hook_each_year() {
    let scenario = scenario_loader()
        .load(scenario_path())
        .expect("scenario should load");
    let mut world = scenario.build_world().expect("world builds");
    let mut engine = Engine::new(scenario.seed);

    let mut years = Vec::new();
    let last = engine
        .run_with_hook(&mut world, 6, |report| years.push(report.year))
        .expect("run succeeds");

    assert_eq!(years, (1..=6).collect::<Vec<_>>());
    assert_eq!(last.year, 6);
    assert_eq!(world.year(), 6);
}
