use liveness::{
    Decision, FusionConfig, FusionWeights, LivenessError, ScoreFusion, SignalScores,
};

fn scores(values: [f64; 6]) -> SignalScores {
    let [motion, texture, consistency, edge_density, color_variance, pattern_detection] = values;
    SignalScores {
        motion,
        texture,
        consistency,
        edge_density,
        color_variance,
        pattern_detection,
    }
}

#[test]
fn test_all_zero_is_spoof() {
    let fusion = ScoreFusion::with_defaults();
    let outcome = fusion.fuse(&SignalScores::uniform(0.0));
    assert_eq!(outcome.overall, 0.0);
    assert_eq!(outcome.decision, Decision::Spoof);
    assert!(!outcome.vetoed);
}

#[test]
fn test_all_one_is_live() {
    let fusion = ScoreFusion::with_defaults();
    let outcome = fusion.fuse(&SignalScores::uniform(1.0));
    assert!((outcome.overall - 1.0).abs() < 1e-9);
    assert_eq!(outcome.decision, Decision::Live);
}

#[test]
fn test_uniform_input_gives_same_overall() {
    let fusion = ScoreFusion::with_defaults();
    for value in [0.1, 0.45, 0.8] {
        let overall = fusion.overall(&SignalScores::uniform(value));
        assert!((overall - value).abs() < 1e-9, "{value} -> {overall}");
    }
}

#[test]
fn test_threshold_is_inclusive() {
    let config = FusionConfig {
        threshold: 0.5,
        ..FusionConfig::default()
    };
    let fusion = ScoreFusion::new(&config).expect("valid config");
    assert_eq!(
        fusion.fuse(&SignalScores::uniform(0.5)).decision,
        Decision::Live
    );
    assert_eq!(
        fusion.fuse(&SignalScores::uniform(0.49)).decision,
        Decision::Spoof
    );
}

#[test]
fn test_overall_is_monotonic_in_every_signal() {
    let fusion = ScoreFusion::with_defaults();
    let base = [0.3, 0.4, 0.5, 0.6, 0.2, 0.7];
    let before = fusion.overall(&scores(base));
    for i in 0..6 {
        let mut raised = base;
        raised[i] += 0.2;
        let after = fusion.overall(&scores(raised));
        assert!(after > before, "raising signal {i} lowered overall");
    }
}

#[test]
fn test_overall_stays_in_unit_interval() {
    let fusion = ScoreFusion::with_defaults();
    let high = fusion.overall(&SignalScores::uniform(3.0));
    let low = fusion.overall(&SignalScores::uniform(-2.0));
    assert!((0.0..=1.0).contains(&high));
    assert!((0.0..=1.0).contains(&low));
}

#[test]
fn test_strong_live_vector() {
    let fusion = ScoreFusion::with_defaults();
    let outcome = fusion.fuse(&scores([0.8, 0.9, 0.8, 0.7, 0.6, 0.8]));
    // 0.28 + 0.225 + 0.12 + 0.07 + 0.06 + 0.04
    assert!((outcome.overall - 0.795).abs() < 1e-9);
    assert_eq!(outcome.decision, Decision::Live);
}

#[test]
fn test_screen_veto_forces_spoof() {
    let config = FusionConfig {
        screen_veto: Some(0.3),
        ..FusionConfig::default()
    };
    let fusion = ScoreFusion::new(&config).expect("valid config");

    let outcome = fusion.fuse(&scores([1.0, 1.0, 1.0, 1.0, 0.1, 1.0]));
    assert!(outcome.overall > fusion.threshold());
    assert_eq!(outcome.decision, Decision::Spoof);
    assert!(outcome.vetoed);

    let outcome = fusion.fuse(&SignalScores::uniform(1.0));
    assert_eq!(outcome.decision, Decision::Live);
    assert!(!outcome.vetoed);
}

#[test]
fn test_new_rejects_bad_weights() {
    let config = FusionConfig {
        weights: FusionWeights {
            motion: 0.9,
            ..FusionWeights::default()
        },
        ..FusionConfig::default()
    };
    let err = ScoreFusion::new(&config).unwrap_err();
    assert!(matches!(err, LivenessError::Config(_)));
}

#[test]
fn test_new_rejects_bad_threshold() {
    let config = FusionConfig {
        threshold: 1.2,
        ..FusionConfig::default()
    };
    assert!(ScoreFusion::new(&config).is_err());
}
