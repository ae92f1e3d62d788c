use std::collections::BTreeMap;

use serde::Serialize;

use drawstat_db::models::{FourDDraw, FourDNumber, TotoDraw};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FourDPattern {
    /// 0000, 1111, ...
    AllSame,
    /// Quatre chiffres consécutifs, dans n'importe quel ordre (ex : 3142).
    Sequential,
    AllDifferent,
    /// 1112
    ThreeSame,
    /// 1221
    Palindrome,
    /// 1122
    TwoPairs,
    /// 1123
    TwoSame,
}

impl FourDPattern {
    pub const ALL: [FourDPattern; 7] = [
        FourDPattern::AllSame,
        FourDPattern::Sequential,
        FourDPattern::AllDifferent,
        FourDPattern::ThreeSame,
        FourDPattern::Palindrome,
        FourDPattern::TwoPairs,
        FourDPattern::TwoSame,
    ];

    pub fn of(number: FourDNumber) -> Self {
        let digits = number.digits();
        let mut counts = [0u8; 10];
        for &d in &digits {
            counts[d as usize] += 1;
        }
        let mut profile: Vec<u8> = counts.iter().copied().filter(|&c| c > 0).collect();
        profile.sort_unstable_by(|a, b| b.cmp(a));

        match profile.as_slice() {
            [4] => FourDPattern::AllSame,
            [3, 1] => FourDPattern::ThreeSame,
            [2, 2] if digits[0] == digits[3] && digits[1] == digits[2] => FourDPattern::Palindrome,
            [2, 2] => FourDPattern::TwoPairs,
            [2, 1, 1] => FourDPattern::TwoSame,
            _ => {
                let mut sorted = digits;
                sorted.sort_unstable();
                if sorted.windows(2).all(|w| w[1] == w[0] + 1) {
                    FourDPattern::Sequential
                } else {
                    FourDPattern::AllDifferent
                }
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FourDPattern::AllSame => "quatre chiffres identiques",
            FourDPattern::Sequential => "chiffres consécutifs",
            FourDPattern::AllDifferent => "quatre chiffres différents",
            FourDPattern::ThreeSame => "trois chiffres identiques",
            FourDPattern::Palindrome => "palindrome",
            FourDPattern::TwoPairs => "deux paires",
            FourDPattern::TwoSame => "une paire",
        }
    }
}

impl std::fmt::Display for FourDPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Répartition des motifs sur les trois prix classés de chaque tirage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FourDPatternSummary {
    pub total_numbers: usize,
    /// Dans l'ordre de [`FourDPattern::ALL`].
    pub counts: Vec<(FourDPattern, u32)>,
    /// Somme des chiffres la plus fréquente, avec son effectif.
    pub most_common_sum: Option<(u8, u32)>,
    pub first_last_same: u32,
}

impl FourDPatternSummary {
    pub fn percentage(&self, count: u32) -> f64 {
        if self.total_numbers == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.total_numbers as f64
        }
    }
}

pub fn four_d_patterns(draws: &[FourDDraw]) -> FourDPatternSummary {
    let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
    let mut sums: BTreeMap<u8, u32> = BTreeMap::new();
    let mut first_last_same = 0;
    let mut total = 0;

    for number in draws.iter().flat_map(|d| d.prizes()) {
        total += 1;
        let pattern = FourDPattern::of(number);
        let idx = FourDPattern::ALL.iter().position(|p| *p == pattern).unwrap_or(0);
        *counts.entry(idx).or_default() += 1;

        let digits = number.digits();
        *sums.entry(digits.iter().sum()).or_default() += 1;
        if digits[0] == digits[3] {
            first_last_same += 1;
        }
    }

    // À égalité, la plus petite somme l'emporte
    let most_common_sum = sums
        .iter()
        .fold(None, |best: Option<(u8, u32)>, (&sum, &count)| match best {
            Some((_, c)) if c >= count => best,
            _ => Some((sum, count)),
        });

    FourDPatternSummary {
        total_numbers: total,
        counts: FourDPattern::ALL
            .iter()
            .enumerate()
            .map(|(i, &p)| (p, counts.get(&i).copied().unwrap_or(0)))
            .collect(),
        most_common_sum,
        first_last_same,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotoPatternSummary {
    pub draws: usize,
    /// Tirages contenant au moins deux numéros consécutifs.
    pub with_consecutive: usize,
    /// Numéros gagnants par dizaine : 0 = 1..9, 1 = 10..19, ..., 4 = 40..49.
    pub decades: [u32; 5],
    pub average_sum: f64,
}

pub fn toto_patterns(draws: &[TotoDraw]) -> TotoPatternSummary {
    let mut with_consecutive = 0;
    let mut decades = [0u32; 5];
    let mut total_sum = 0u64;

    for draw in draws {
        let mut sorted = draw.winning;
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0].checked_add(1) == Some(w[1])) {
            with_consecutive += 1;
        }
        for &n in &sorted {
            if let Some(slot) = decades.get_mut((n / 10) as usize) {
                *slot += 1;
            }
            total_sum += n as u64;
        }
    }

    TotoPatternSummary {
        draws: draws.len(),
        with_consecutive,
        decades,
        average_sum: if draws.is_empty() { 0.0 } else { total_sum as f64 / draws.len() as f64 },
    }
}

/// Paires de numéros gagnants sorties ensemble au moins `min_occurrences` fois,
/// par effectif décroissant puis paire croissante.
pub fn frequent_pairs(draws: &[TotoDraw], min_occurrences: u32) -> Vec<((u8, u8), u32)> {
    let mut counts: BTreeMap<(u8, u8), u32> = BTreeMap::new();
    for draw in draws {
        let w = &draw.winning;
        for i in 0..w.len() {
            for j in i + 1..w.len() {
                let pair = (w[i].min(w[j]), w[i].max(w[j]));
                *counts.entry(pair).or_default() += 1;
            }
        }
    }
    let mut pairs: Vec<_> = counts.into_iter().filter(|&(_, c)| c >= min_occurrences).collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1));
    pairs
}
