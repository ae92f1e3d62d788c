use serde::Serialize;

use drawstat_db::models::{FourDDraw, TotoDraw, TOTO_PICKS, TOTO_POOL};

use crate::frequency::DigitPosition;

pub const MOST_OVERDUE_LEN: usize = 10;
pub const RECENTLY_APPEARED_LEN: usize = 10;
/// Un numéro est « en retard » au-delà de 1,5 fois l'écart attendu.
pub const OVERDUE_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberGap {
    pub number: u8,
    pub gap: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapResult {
    pub draws: usize,
    /// Numéros 1..=49 dans l'ordre.
    pub gaps: Vec<NumberGap>,
    /// Les 10 plus gros retards, décroissants ; à égalité, numéro croissant.
    pub most_overdue: Vec<NumberGap>,
    /// Les 10 plus petits retards, croissants ; à égalité, numéro croissant.
    pub recently_appeared: Vec<NumberGap>,
    pub expected_gap: f64,
}

impl GapResult {
    pub fn gap(&self, number: u8) -> u32 {
        self.gaps
            .iter()
            .find(|g| g.number == number)
            .map(|g| g.gap)
            .unwrap_or(self.draws as u32)
    }

    pub fn overdue_numbers(&self) -> Vec<u8> {
        let limit = self.expected_gap * OVERDUE_FACTOR;
        self.gaps
            .iter()
            .filter(|g| g.gap as f64 > limit)
            .map(|g| g.number)
            .collect()
    }
}

/// `draws[0]` = tirage le plus récent. Le retard d'un numéro est l'indice de sa dernière
/// apparition ; un numéro jamais tiré a un retard égal à la longueur de l'historique.
pub fn analyze_gaps(draws: &[TotoDraw]) -> GapResult {
    let size = TOTO_POOL as usize;
    let mut last_seen = vec![draws.len(); size];

    for (t, draw) in draws.iter().enumerate() {
        for &n in &draw.winning {
            let Some(idx) = n.checked_sub(1).map(usize::from) else {
                continue;
            };
            if idx < size && last_seen[idx] == draws.len() {
                last_seen[idx] = t;
            }
        }
    }

    let gaps: Vec<NumberGap> = last_seen
        .iter()
        .enumerate()
        .map(|(i, &gap)| NumberGap {
            number: (i + 1) as u8,
            gap: gap as u32,
        })
        .collect();

    // Tri stable : les égalités gardent l'ordre croissant des numéros
    let mut most_overdue = gaps.clone();
    most_overdue.sort_by(|a, b| b.gap.cmp(&a.gap));
    most_overdue.truncate(MOST_OVERDUE_LEN);

    let mut recently_appeared = gaps.clone();
    recently_appeared.sort_by_key(|g| g.gap);
    recently_appeared.truncate(RECENTLY_APPEARED_LEN);

    GapResult {
        draws: draws.len(),
        gaps,
        most_overdue,
        recently_appeared,
        expected_gap: TOTO_POOL as f64 / TOTO_PICKS as f64,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionGaps {
    pub position: DigitPosition,
    /// Retard de chaque chiffre 0..=9 à cette position.
    pub gaps: [u32; 10],
    /// Chiffres dont le retard dépasse 1,5 fois l'écart attendu, croissants.
    pub overdue: Vec<u8>,
}

/// Retards des chiffres 4D, position par position, sur les trois prix classés.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigitGapResult {
    pub draws: usize,
    /// Tirages / 10 : un chiffre sort en moyenne une fois tous les dix tirages et par prix.
    pub expected_gap: f64,
    /// Milliers d'abord.
    pub positions: Vec<PositionGaps>,
}

impl DigitGapResult {
    pub fn gap(&self, position: DigitPosition, digit: u8) -> u32 {
        self.positions
            .get(position.index())
            .and_then(|p| p.gaps.get(usize::from(digit)))
            .copied()
            .unwrap_or(self.draws as u32)
    }

    pub fn overdue_digits(&self, position: DigitPosition) -> &[u8] {
        self.positions
            .get(position.index())
            .map(|p| p.overdue.as_slice())
            .unwrap_or(&[])
    }
}

/// `draws[0]` = tirage le plus récent, comme pour [`analyze_gaps`].
pub fn analyze_four_d_gaps(draws: &[FourDDraw]) -> DigitGapResult {
    let mut last_seen = [[draws.len(); 10]; 4];
    for (t, draw) in draws.iter().enumerate() {
        for prize in draw.prizes() {
            for (pos, &digit) in prize.digits().iter().enumerate() {
                let slot = &mut last_seen[pos][usize::from(digit)];
                if *slot == draws.len() {
                    *slot = t;
                }
            }
        }
    }

    let expected_gap = draws.len() as f64 / 10.0;
    let limit = expected_gap * OVERDUE_FACTOR;
    let positions = DigitPosition::ALL
        .iter()
        .map(|&position| {
            let gaps = last_seen[position.index()].map(|g| g as u32);
            let overdue = (0..10u8)
                .filter(|&d| gaps[usize::from(d)] as f64 > limit)
                .collect();
            PositionGaps {
                position,
                gaps,
                overdue,
            }
        })
        .collect();

    DigitGapResult {
        draws: draws.len(),
        expected_gap,
        positions,
    }
}
