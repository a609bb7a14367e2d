//! Word-list classifier used when no toxicity model is configured.

use std::collections::BTreeMap;

use super::ToxicityClassifier;
use super::detoxify::DEFAULT_LABELS;
use super::error::ClassifierError;
use crate::embedding::stub::content_tokens;

const INSULT: &[&str] = &[
    "idiot", "idiots", "stupid", "moron", "morons", "dumb", "loser", "losers", "pathetic",
    "worthless", "clown", "imbecile",
];
const OBSCENE: &[&str] = &["crap", "damn", "wtf", "screw", "bullshit"];
const THREAT: &[&str] = &["murder", "stab", "punch", "strangle"];
const IDENTITY_ATTACK: &[&str] = &["subhuman", "vermin"];
const GENERAL: &[&str] = &["scum", "disgusting", "repulsive"];

/// Per-hit decay: one hit scores 0.6, two 0.84, three 0.94.
const DECAY: f32 = 0.4;

fn saturating_score(hits: usize) -> f32 {
    1.0 - DECAY.powi(hits as i32)
}

/// Keyword classifier emitting the same six labels as the Detoxify model.
///
/// Deterministic and crude. It only exists so the service runs end to end
/// without model files.
#[derive(Debug, Default, Clone)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl ToxicityClassifier for LexiconClassifier {
    fn predict(&self, text: &str) -> Result<BTreeMap<String, f32>, ClassifierError> {
        let tokens = content_tokens(text);
        let count = |list: &[&str]| tokens.iter().filter(|t| list.contains(&t.as_str())).count();

        let insult = count(INSULT);
        let obscene = count(OBSCENE);
        let threat = count(THREAT);
        let identity_attack = count(IDENTITY_ATTACK);
        let total = insult + obscene + threat + identity_attack + count(GENERAL);

        let toxicity = saturating_score(total);
        let severe_toxicity = if total >= 3 { toxicity } else { toxicity * 0.25 };

        let scores = [
            toxicity,
            severe_toxicity,
            saturating_score(obscene),
            saturating_score(threat),
            saturating_score(insult),
            saturating_score(identity_attack),
        ];

        Ok(DEFAULT_LABELS
            .iter()
            .map(|l| l.to_string())
            .zip(scores)
            .collect())
    }

    fn is_stub(&self) -> bool {
        true
    }
}
