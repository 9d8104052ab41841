use crate::{config::ClassifierConfig, result::AttackType, signals::SignalScores};

type Predicate = Box<dyn Fn(&SignalScores) -> bool + Send + Sync>;

/// One `(predicate, label)` pair.
pub struct AttackRule {
    pub label: AttackType,
    predicate: Predicate,
}

impl AttackRule {
    pub fn new(
        label: AttackType,
        predicate: impl Fn(&SignalScores) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            label,
            predicate: Box::new(predicate),
        }
    }

    pub fn matches(&self, scores: &SignalScores) -> bool {
        (self.predicate)(scores)
    }
}

/// Labels a spoof by the first matching rule, `Unknown` if none match.
pub struct AttackClassifier {
    rules: Vec<AttackRule>,
}

impl AttackClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        let c = config.clone();
        let rules = vec![
            AttackRule::new(AttackType::ScreenAttack, {
                let c = c.clone();
                move |s| {
                    s.color_variance < c.screen_color_max
                        && (s.consistency >= c.screen_consistency_min
                            || s.pattern_detection < c.screen_pattern_max)
                }
            }),
            AttackRule::new(AttackType::PhotoAttack, {
                let c = c.clone();
                move |s| s.motion < c.photo_motion_max && s.texture < c.photo_texture_max
            }),
            AttackRule::new(AttackType::VideoReplay, {
                let c = c.clone();
                move |s| s.consistency < c.replay_consistency_max
            }),
            AttackRule::new(AttackType::FakeFinger, move |s| {
                s.edge_density < c.fake_edge_max || s.texture < c.fake_texture_max
            }),
        ];
        Self { rules }
    }

    /// Replace the rule list; order is evaluation order.
    pub fn with_rules(rules: Vec<AttackRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> impl Iterator<Item = AttackType> + '_ {
        self.rules.iter().map(|r| r.label)
    }

    pub fn classify(&self, scores: &SignalScores) -> AttackType {
        self.rules
            .iter()
            .find(|rule| rule.matches(scores))
            .map(|rule| rule.label)
            .unwrap_or(AttackType::Unknown)
    }
}

impl Default for AttackClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}
