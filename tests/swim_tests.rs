//! End-to-end swimming tests.
//!
//! These drive a whole aquarium headlessly through the public API, the same
//! way the viewer's frame loop does.

use aquarium::prelude::*;
use aquarium::ConfigError;

const DT: f32 = 1.0 / 60.0;

fn single_fish_config(speed: f32) -> AquariumConfig {
    AquariumConfig {
        tank: Tank::new(Vec3::new(42.0, 25.0, 55.0), 2.0).unwrap(),
        fish: vec![FishConfig::new("./models/fish.glb", 1.0, speed, 0xff8800)],
        props: Vec::new(),
        seed: 3,
        ..Default::default()
    }
}

// ============================================================================
// Containment
// ============================================================================

#[test]
fn test_single_fish_stays_in_tank_for_five_seconds() {
    let config = single_fish_config(1.0);
    let mut aquarium = Aquarium::from_config(&config, &mut BuiltinModels);
    assert_eq!(aquarium.fish().len(), 1);

    let safe = aquarium.tank().safe_half_extents();
    let start = aquarium.fish()[0].node.position;
    let mut travelled = 0.0;
    let mut last = start;

    for frame in 1..=300 {
        let report = aquarium.frame(&config.tuning, frame as f32 * DT, DT);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.nudges, 0, "stalled on frame {}", frame);

        let fish = &aquarium.fish()[0];
        let p = aquarium.world().position(fish.body).unwrap();
        assert!(p.is_finite());
        assert!(
            p.abs().cmple(safe).all(),
            "left the safe box at {:?} on frame {}",
            p,
            frame
        );
        travelled += (p - last).length();
        last = p;
    }

    // The fish actually swims rather than hovering at its spawn point.
    assert!(travelled > 1.0, "only travelled {}", travelled);
}

#[test]
fn test_whole_roster_inside_boundary_planes() {
    let config = AquariumConfig::default();
    let mut aquarium = Aquarium::from_config(&config, &mut BuiltinModels);
    for frame in 1..=240 {
        aquarium.frame(&config.tuning, frame as f32 * DT, DT);
    }
    for fish in aquarium.fish() {
        let p = aquarium.world().position(fish.body).unwrap();
        assert!(aquarium.boundary().contains(p), "fish {} at {:?}", fish.index, p);
    }
}

// ============================================================================
// Live tuning
// ============================================================================

#[test]
fn test_speed_change_applies_next_frame() {
    let config = single_fish_config(1.0);
    let mut aquarium = Aquarium::from_config(&config, &mut BuiltinModels);

    for frame in 1..=60 {
        aquarium.frame(&config.tuning, frame as f32 * DT, DT);
    }
    let t1 = aquarium.fish()[0].t;
    assert!((t1 - 0.2).abs() < 1e-3, "t = {}", t1);

    aquarium.fish_mut()[0].set_speed(2.0);
    for frame in 61..=120 {
        aquarium.frame(&config.tuning, frame as f32 * DT, DT);
    }
    let t2 = aquarium.fish()[0].t;
    assert!((t2 - 0.6).abs() < 1e-3, "t = {}", t2);
}

#[test]
fn test_clock_pause_freezes_aquarium() {
    let config = single_fish_config(1.0);
    let mut aquarium = Aquarium::from_config(&config, &mut BuiltinModels);
    let mut clock = Clock::fixed(DT);

    for _ in 0..30 {
        let (elapsed, delta) = clock.update();
        aquarium.frame(&config.tuning, elapsed, delta);
    }
    let body = aquarium.fish()[0].body;
    let position = aquarium.world().position(body);
    let t = aquarium.fish()[0].t;

    clock.pause();
    for _ in 0..30 {
        let (elapsed, delta) = clock.update();
        assert_eq!(delta, 0.0);
        aquarium.frame(&config.tuning, elapsed, delta);
    }
    assert_eq!(aquarium.world().position(body), position);
    assert_eq!(aquarium.fish()[0].t, t);

    clock.resume();
    let (elapsed, delta) = clock.update();
    aquarium.frame(&config.tuning, elapsed, delta);
    assert!(aquarium.fish()[0].t > t);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_scene_from_json() {
    let json = r#"{
        "tank": { "extents": [30.0, 20.0, 30.0], "margin": 2.0 },
        "fish": [
            { "model": "./models/fish.glb", "scale": 1.0, "speed": 1.0, "color": 16711680 },
            { "model": "./models/whale.glb", "scale": 1.0, "speed": 1.0, "color": 255 },
            { "model": "./models/grouper.glb", "scale": 0.5, "speed": 2.0, "color": 65280 }
        ],
        "props": []
    }"#;
    let config = AquariumConfig::from_json(json).unwrap();
    let aquarium = Aquarium::from_config(&config, &mut BuiltinModels);

    // The whale has no model and is left out.
    assert_eq!(aquarium.fish().len(), 2);
    assert_eq!(aquarium.fish()[1].node.model, ModelKind::Grouper);
    assert_eq!(aquarium.fish()[1].speed, 2.0);
    assert_eq!(aquarium.tank().half_extents(), Vec3::new(15.0, 10.0, 15.0));
}

#[test]
fn test_bad_tank_in_json_is_rejected() {
    let json = r#"{ "tank": { "extents": [30.0, -1.0, 30.0], "margin": 2.0 } }"#;
    assert!(matches!(
        AquariumConfig::from_json(json),
        Err(ConfigError::Json(_))
    ));
}
