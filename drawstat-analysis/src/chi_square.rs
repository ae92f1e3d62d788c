use serde::Serialize;

use crate::frequency::{DigitPosition, FrequencyResult};

/// En dessous de cet effectif attendu par case, l'approximation du χ² n'est pas fiable.
pub const MIN_EXPECTED: f64 = 5.0;

const Z_95: f64 = 1.644_853_6;
const Z_99: f64 = 2.326_347_9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomnessVerdict {
    InsufficientData,
    ConsistentWithRandom,
    Marginal,
    Significant,
}

impl std::fmt::Display for RandomnessVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RandomnessVerdict::InsufficientData => write!(f, "données insuffisantes"),
            RandomnessVerdict::ConsistentWithRandom => write!(f, "compatible avec le hasard"),
            RandomnessVerdict::Marginal => write!(f, "écart marginal (p < 0.05)"),
            RandomnessVerdict::Significant => write!(f, "écart significatif (p < 0.01)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquareTest {
    /// `None` pour le Toto, la position testée pour le 4D.
    pub position: Option<DigitPosition>,
    pub statistic: f64,
    pub degrees_of_freedom: usize,
    pub critical_95: f64,
    pub critical_99: f64,
    pub verdict: RandomnessVerdict,
}

/// Quantile approché du χ² (Wilson-Hilferty).
fn chi_square_quantile(df: usize, z: f64) -> f64 {
    let k = df as f64;
    let a = 2.0 / (9.0 * k);
    k * (1.0 - a + z * a.sqrt()).powi(3)
}

fn test_counts(position: Option<DigitPosition>, counts: &[u32], expected: f64) -> ChiSquareTest {
    let df = counts.len().saturating_sub(1).max(1);
    let statistic = if expected > 0.0 {
        counts
            .iter()
            .map(|&c| (c as f64 - expected).powi(2) / expected)
            .sum()
    } else {
        0.0
    };
    let critical_95 = chi_square_quantile(df, Z_95);
    let critical_99 = chi_square_quantile(df, Z_99);

    let verdict = if expected < MIN_EXPECTED {
        RandomnessVerdict::InsufficientData
    } else if statistic > critical_99 {
        RandomnessVerdict::Significant
    } else if statistic > critical_95 {
        RandomnessVerdict::Marginal
    } else {
        RandomnessVerdict::ConsistentWithRandom
    };

    ChiSquareTest {
        position,
        statistic,
        degrees_of_freedom: df,
        critical_95,
        critical_99,
        verdict,
    }
}

/// Un test pour le Toto (49 numéros), un par position pour le 4D (10 chiffres).
pub fn chi_square(frequency: &FrequencyResult) -> Vec<ChiSquareTest> {
    let has_positions = frequency.candidates.iter().any(|c| c.position.is_some());
    if !has_positions {
        let counts: Vec<u32> = frequency.candidates.iter().map(|c| c.count).collect();
        return vec![test_counts(None, &counts, frequency.expected)];
    }

    DigitPosition::ALL
        .iter()
        .map(|&pos| {
            let counts: Vec<u32> = frequency.position(pos).map(|c| c.count).collect();
            test_counts(Some(pos), &counts, frequency.expected)
        })
        .collect()
}
