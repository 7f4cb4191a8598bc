//! End-to-end checks through the public simulation API.

use afterglow_kernel::{parse, Preset, RuleSpec, Simulation, SimulationSettings, SpawnPattern};
use glam::Vec3;

fn settings(workers: usize, seed: u64) -> SimulationSettings {
    SimulationSettings {
        worker_count: workers,
        seed: Some(seed),
        ..SimulationSettings::default()
    }
}

fn simulation(rule: &str, spawn: SpawnPattern, workers: usize) -> Simulation {
    Simulation::with_settings(
        48,
        40,
        parse(rule).expect("valid rule"),
        spawn,
        Vec3::ONE,
        Vec3::ZERO,
        &settings(workers, 99),
    )
}

#[test]
fn test_one_and_many_workers_agree() {
    for preset in Preset::ALL {
        let mut single = simulation(preset.rule_text(), SpawnPattern::Random, 1);
        let mut many = simulation(preset.rule_text(), SpawnPattern::Random, 8);
        for _ in 0..10 {
            let a = single.step().clone();
            let b = many.step();
            assert_eq!(&a, b, "{preset}");
        }
        assert_eq!(single.cells(), many.cells(), "{preset}");
    }
}

#[test]
fn test_states_never_exceed_max() {
    let mut sim = simulation("0/1-8/100/N", SpawnPattern::Cross, 4);
    for _ in 0..60 {
        sim.step();
        assert!(sim.cells().iter().all(|&s| s <= 100));
    }
}

#[test]
fn test_diamond_grows_from_center() {
    let mut sim = simulation("0-8/1-8/1/N", SpawnPattern::Middle, 3);
    for generation in 1..=5i64 {
        sim.step();
        // von Neumann growth fills a diamond of radius `generation`
        assert_eq!(sim.cell(24 + generation, 20), 1);
        assert_eq!(sim.cell(24, 20 - generation), 1);
        assert_eq!(sim.cell(24 + generation, 20 + 1), 0);
    }
}

#[test]
fn test_line_wraps_across_edges() {
    // A full horizontal line is its own neighbor across the seam; every
    // cell has exactly two live neighbors (west and east) and survives.
    let mut sim = simulation("2/9/1/M", SpawnPattern::HorizontalLine, 2);
    sim.step();
    assert_eq!(sim.live_count(), 48);
    assert_eq!(sim.cell(0, 20), 1);
    assert_eq!(sim.cell(47, 20), 1);
}

#[test]
fn test_raster_matches_states() {
    let mut sim = simulation("0-4/1-3/3/M", SpawnPattern::Circle, 4);
    sim.step();
    sim.step();
    let cells = sim.cells();
    let buffer = sim.color_buffer();
    for (state, pixel) in cells.iter().zip(buffer.pixels()) {
        let expected = (f32::from(*state) / 3.0 * 255.0).round() as u8;
        assert_eq!(*pixel, [expected, expected, expected, 255]);
    }
}

#[test]
fn test_bad_rule_text_produces_no_rule() {
    assert!(RuleSpec::parse("2,3/3/M").is_err());
    assert!("x/3/1/M".parse::<RuleSpec>().is_err());
}
