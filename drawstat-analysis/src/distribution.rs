use std::collections::BTreeMap;

use serde::Serialize;

use drawstat_db::models::{DrawHistory, TotoDraw, TOTO_PICKS};

/// Un numéro Toto est « bas » jusqu'à 25 inclus, « haut » au-delà.
pub const HIGH_LOW_MIDPOINT: u8 = 25;
const MOST_COMMON_SUMS: usize = 10;

/// Distribution des sommes : six numéros gagnants par tirage Toto,
/// chiffres de chaque prix classé en 4D.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SumDistribution {
    pub samples: usize,
    pub mean: f64,
    /// Écart type de population.
    pub std_dev: f64,
    pub min: u32,
    pub max: u32,
    pub median: u32,
    /// (somme, effectif), effectif décroissant puis somme croissante ; 10 au plus.
    pub most_common: Vec<(u32, u32)>,
}

impl SumDistribution {
    /// Plage moyenne ± un écart type, bornes tronquées.
    pub fn typical_range(&self) -> (u32, u32) {
        let low = (self.mean - self.std_dev).max(0.0);
        (low as u32, (self.mean + self.std_dev) as u32)
    }
}

/// `None` pour un historique vide.
pub fn sum_distribution(history: &DrawHistory) -> Option<SumDistribution> {
    let mut sums: Vec<u32> = match history {
        DrawHistory::Toto(draws) => draws
            .iter()
            .map(|d| d.winning.iter().map(|&n| u32::from(n)).sum())
            .collect(),
        DrawHistory::FourD(draws) => draws
            .iter()
            .flat_map(|d| d.prizes())
            .map(|p| p.digits().iter().map(|&d| u32::from(d)).sum())
            .collect(),
    };
    if sums.is_empty() {
        return None;
    }
    sums.sort_unstable();

    let n = sums.len() as f64;
    let mean = sums.iter().map(|&s| s as f64).sum::<f64>() / n;
    let variance = sums.iter().map(|&s| (s as f64 - mean).powi(2)).sum::<f64>() / n;
    let mid = sums.len() / 2;
    let median = if sums.len() % 2 == 0 {
        (sums[mid - 1] + sums[mid]) / 2
    } else {
        sums[mid]
    };

    let mut counts: BTreeMap<u32, u32> = BTreeMap::new();
    for &s in &sums {
        *counts.entry(s).or_default() += 1;
    }
    let mut most_common: Vec<(u32, u32)> = counts.into_iter().collect();
    most_common.sort_by(|a, b| b.1.cmp(&a.1));
    most_common.truncate(MOST_COMMON_SUMS);

    Some(SumDistribution {
        samples: sums.len(),
        mean,
        std_dev: variance.sqrt(),
        min: sums[0],
        max: sums[sums.len() - 1],
        median,
        most_common,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    /// `first` = impairs, `second` = pairs.
    OddEven,
    /// `first` = bas (≤ point médian), `second` = hauts.
    LowHigh,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitCount {
    pub first: u8,
    pub second: u8,
    pub count: u32,
    pub percentage: f64,
}

/// Répartition des six numéros gagnants en deux classes, tirage par tirage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitDistribution {
    pub kind: SplitKind,
    pub draws: usize,
    /// Effectif décroissant ; à égalité, `first` croissant.
    pub splits: Vec<SplitCount>,
}

impl SplitDistribution {
    pub fn most_common(&self) -> Option<&SplitCount> {
        self.splits.first()
    }

    /// `3I-3P` (impairs/pairs) ou `4B-2H` (bas/hauts).
    pub fn label(&self, split: &SplitCount) -> String {
        let (a, b) = match self.kind {
            SplitKind::OddEven => ("I", "P"),
            SplitKind::LowHigh => ("B", "H"),
        };
        format!("{}{}-{}{}", split.first, a, split.second, b)
    }
}

fn split_distribution(draws: &[TotoDraw], kind: SplitKind, is_first: impl Fn(u8) -> bool) -> SplitDistribution {
    let mut counts: BTreeMap<u8, u32> = BTreeMap::new();
    for draw in draws {
        let first = draw.winning.iter().filter(|&&n| is_first(n)).count() as u8;
        *counts.entry(first).or_default() += 1;
    }

    let total = draws.len();
    let mut splits: Vec<SplitCount> = counts
        .into_iter()
        .map(|(first, count)| SplitCount {
            first,
            second: TOTO_PICKS as u8 - first,
            count,
            percentage: count as f64 * 100.0 / total as f64,
        })
        .collect();
    splits.sort_by(|a, b| b.count.cmp(&a.count));

    SplitDistribution {
        kind,
        draws: total,
        splits,
    }
}

pub fn odd_even_distribution(draws: &[TotoDraw]) -> SplitDistribution {
    split_distribution(draws, SplitKind::OddEven, |n| n % 2 == 1)
}

pub fn high_low_distribution(draws: &[TotoDraw], midpoint: u8) -> SplitDistribution {
    split_distribution(draws, SplitKind::LowHigh, |n| n <= midpoint)
}
