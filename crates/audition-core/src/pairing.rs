//! Model pair enumeration and blind presentation order for the A/B
//! comparison variant.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// An unordered model pair, kept in manifest column order. The first
/// column is called the baseline purely for logging; the evaluator
/// never sees which is which.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPair {
    pub baseline: String,
    pub experimental: String,
}

/// All unordered pairs, in stable manifest column order.
pub fn all_pairs(models: &[String]) -> Vec<ModelPair> {
    let mut pairs = Vec::new();
    for (i, baseline) in models.iter().enumerate() {
        for experimental in &models[i + 1..] {
            pairs.push(ModelPair {
                baseline: baseline.clone(),
                experimental: experimental.clone(),
            });
        }
    }
    pairs
}

/// Which clip is played as "A". Drawn once per sample and kept in the
/// session so a page refresh cannot reshuffle the blind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationOrder {
    BaselineFirst,
    ExperimentalFirst,
}

impl PresentationOrder {
    pub fn draw<R: Rng>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            PresentationOrder::BaselineFirst
        } else {
            PresentationOrder::ExperimentalFirst
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PresentationOrder::BaselineFirst => "baseline_first",
            PresentationOrder::ExperimentalFirst => "experimental_first",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "baseline_first" => Some(PresentationOrder::BaselineFirst),
            "experimental_first" => Some(PresentationOrder::ExperimentalFirst),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn all_pairs_enumerates_combinations() {
        let pairs = all_pairs(&models(&["a", "b", "c"]));
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].baseline, "a");
        assert_eq!(pairs[0].experimental, "b");
        assert_eq!(pairs[1].experimental, "c");
        assert_eq!(pairs[2].baseline, "b");
    }

    #[test]
    fn one_model_yields_no_pairs() {
        assert!(all_pairs(&models(&["solo"])).is_empty());
        assert!(all_pairs(&[]).is_empty());
    }

    #[test]
    fn draw_is_deterministic_under_a_seed() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..32 {
            assert_eq!(PresentationOrder::draw(&mut a), PresentationOrder::draw(&mut b));
        }
    }

    #[test]
    fn draw_hits_both_orders() {
        let mut rng = StdRng::seed_from_u64(1);
        let draws: Vec<_> = (0..64).map(|_| PresentationOrder::draw(&mut rng)).collect();
        assert!(draws.contains(&PresentationOrder::BaselineFirst));
        assert!(draws.contains(&PresentationOrder::ExperimentalFirst));
    }
}
