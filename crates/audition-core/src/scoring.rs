//! Score types, the rating criteria table, and the preference
//! consistency rule.

use serde::{Deserialize, Serialize};

/// A naturalness rating on the 0–100 scale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 100;
    /// Default slider position for an unscored sample.
    pub const MIDPOINT: Score = Score(50);

    /// Clamps to 0–100.
    pub fn new(value: u8) -> Self {
        Score(value.min(Self::MAX))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse::<u16>().ok().map(|v| {
            Score(u8::try_from(v.min(u16::from(Self::MAX))).unwrap_or(Self::MAX))
        })
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of an A/B pair the evaluator preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    Baseline,
    Experimental,
}

impl Preference {
    pub fn as_str(self) -> &'static str {
        match self {
            Preference::Baseline => "baseline",
            Preference::Experimental => "experimental",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "baseline" => Some(Preference::Baseline),
            "experimental" => Some(Preference::Experimental),
            _ => None,
        }
    }
}

/// Whether a blind preference agrees with the numeric ratings: the
/// preferred side's score must not be lower than the other side's.
/// Ties are consistent with either choice.
pub fn consistency(preference: Preference, baseline: Score, experimental: Score) -> bool {
    match preference {
        Preference::Baseline => baseline >= experimental,
        Preference::Experimental => experimental >= baseline,
    }
}

/// One band of the rating rubric shown next to every slider.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CriteriaBand {
    /// Score range on the 0–100 scale.
    pub range: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

/// The eleven-band rubric. Index doubles as the 0–10 coarse score used
/// by the calibration test.
pub const CRITERIA: [CriteriaBand; 11] = [
    CriteriaBand {
        range: "0–9",
        label: "Not speech",
        description: "Just noise or broken sound.",
    },
    CriteriaBand {
        range: "10–19",
        label: "Very hard to hear",
        description: "Almost nothing is clear.",
    },
    CriteriaBand {
        range: "20–29",
        label: "Very bad",
        description: "Many word errors.",
    },
    CriteriaBand {
        range: "30–39",
        label: "Bad",
        description: "Robotic or awkward.",
    },
    CriteriaBand {
        range: "40–49",
        label: "Not natural",
        description: "Flat or unnatural.",
    },
    CriteriaBand {
        range: "50–59",
        label: "Clear but robotic",
        description: "No emotion.",
    },
    CriteriaBand {
        range: "60–69",
        label: "Mostly accurate",
        description: "Some pitch/emotion.",
    },
    CriteriaBand {
        range: "70–79",
        label: "Natural feel",
        description: "Minor issues.",
    },
    CriteriaBand {
        range: "80–89",
        label: "Very natural",
        description: "Almost no errors.",
    },
    CriteriaBand {
        range: "90–99",
        label: "Extremely natural",
        description: "Feels human.",
    },
    CriteriaBand {
        range: "100",
        label: "Perfect",
        description: "Indistinguishable from real.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_clamps_to_100() {
        assert_eq!(Score::new(250).value(), 100);
        assert_eq!(Score::new(42).value(), 42);
    }

    #[test]
    fn score_parse_clamps_and_rejects_junk() {
        assert_eq!(Score::parse("73"), Some(Score::new(73)));
        assert_eq!(Score::parse(" 100 "), Some(Score::new(100)));
        assert_eq!(Score::parse("9001"), Some(Score::new(100)));
        assert_eq!(Score::parse("-1"), None);
        assert_eq!(Score::parse("eleven"), None);
    }

    #[test]
    fn consistency_follows_the_preferred_side() {
        let lo = Score::new(30);
        let hi = Score::new(70);
        assert!(consistency(Preference::Experimental, lo, hi));
        assert!(!consistency(Preference::Experimental, hi, lo));
        assert!(consistency(Preference::Baseline, hi, lo));
        assert!(!consistency(Preference::Baseline, lo, hi));
    }

    #[test]
    fn ties_are_consistent_either_way() {
        let s = Score::new(55);
        assert!(consistency(Preference::Baseline, s, s));
        assert!(consistency(Preference::Experimental, s, s));
    }

    #[test]
    fn preference_round_trips_through_str() {
        for p in [Preference::Baseline, Preference::Experimental] {
            assert_eq!(Preference::parse(p.as_str()), Some(p));
        }
        assert_eq!(Preference::parse("neither"), None);
    }
}
