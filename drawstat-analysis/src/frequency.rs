use serde::Serialize;

use drawstat_db::models::{Domain, DrawHistory, FourDDraw, TotoDraw, FOUR_D_PRIZES, TOTO_PICKS, TOTO_POOL};

/// Écart relatif brut au-delà duquel un candidat est chaud (ou froid, en négatif).
pub const HOT_COLD_THRESHOLD: f64 = 0.2;
/// Décroissance par tirage de la fréquence pondérée dans le temps.
pub const TIME_DECAY: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyTag {
    Hot,
    Cold,
    Normal,
}

impl FrequencyTag {
    pub fn classify(raw_deviation: f64) -> Self {
        if raw_deviation > HOT_COLD_THRESHOLD {
            FrequencyTag::Hot
        } else if raw_deviation < -HOT_COLD_THRESHOLD {
            FrequencyTag::Cold
        } else {
            FrequencyTag::Normal
        }
    }
}

impl std::fmt::Display for FrequencyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrequencyTag::Hot => write!(f, "HOT"),
            FrequencyTag::Cold => write!(f, "COLD"),
            FrequencyTag::Normal => write!(f, "-"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DigitPosition {
    Thousands,
    Hundreds,
    Tens,
    Units,
}

impl DigitPosition {
    pub const ALL: [DigitPosition; 4] = [
        DigitPosition::Thousands,
        DigitPosition::Hundreds,
        DigitPosition::Tens,
        DigitPosition::Units,
    ];

    pub fn index(&self) -> usize {
        match self {
            DigitPosition::Thousands => 0,
            DigitPosition::Hundreds => 1,
            DigitPosition::Tens => 2,
            DigitPosition::Units => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DigitPosition::Thousands => "milliers",
            DigitPosition::Hundreds => "centaines",
            DigitPosition::Tens => "dizaines",
            DigitPosition::Units => "unités",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateFrequency {
    /// `None` pour le Toto, la position du chiffre pour le 4D.
    pub position: Option<DigitPosition>,
    pub candidate: u8,
    pub count: u32,
    /// (count - expected) / expected
    pub raw_deviation: f64,
    /// Écart brut ramené dans [-1, 1] par le plus grand écart absolu.
    pub deviation: f64,
    pub tag: FrequencyTag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyResult {
    pub domain: Domain,
    pub draws: usize,
    /// Occurrences attendues par candidat sous une loi uniforme.
    pub expected: f64,
    /// Toto : numéros 1..=49. 4D : chiffres 0..=9 pour chaque position, milliers d'abord.
    pub candidates: Vec<CandidateFrequency>,
}

impl FrequencyResult {
    pub fn entry(&self, position: Option<DigitPosition>, candidate: u8) -> Option<&CandidateFrequency> {
        self.candidates
            .iter()
            .find(|c| c.position == position && c.candidate == candidate)
    }

    pub fn count(&self, number: u8) -> u32 {
        self.entry(None, number).map(|c| c.count).unwrap_or(0)
    }

    pub fn deviation(&self, number: u8) -> f64 {
        self.entry(None, number).map(|c| c.deviation).unwrap_or(0.0)
    }

    pub fn tag(&self, number: u8) -> FrequencyTag {
        self.entry(None, number).map(|c| c.tag).unwrap_or(FrequencyTag::Normal)
    }

    /// Numéros Toto chauds, par ordre croissant.
    pub fn hot_numbers(&self) -> Vec<u8> {
        self.tagged(None, FrequencyTag::Hot)
    }

    pub fn cold_numbers(&self) -> Vec<u8> {
        self.tagged(None, FrequencyTag::Cold)
    }

    pub fn position(&self, position: DigitPosition) -> impl Iterator<Item = &CandidateFrequency> + '_ {
        self.candidates.iter().filter(move |c| c.position == Some(position))
    }

    pub fn hot_digits(&self, position: DigitPosition) -> Vec<u8> {
        self.tagged(Some(position), FrequencyTag::Hot)
    }

    pub fn cold_digits(&self, position: DigitPosition) -> Vec<u8> {
        self.tagged(Some(position), FrequencyTag::Cold)
    }

    fn tagged(&self, position: Option<DigitPosition>, tag: FrequencyTag) -> Vec<u8> {
        self.candidates
            .iter()
            .filter(|c| c.position == position && c.tag == tag)
            .map(|c| c.candidate)
            .collect()
    }
}

pub fn analyze_frequency(history: &DrawHistory) -> FrequencyResult {
    match history {
        DrawHistory::Toto(draws) => toto_frequency(draws),
        DrawHistory::FourD(draws) => four_d_frequency(draws),
    }
}

/// Seuls les 6 numéros gagnants comptent ; le numéro additionnel est exclu.
fn toto_frequency(draws: &[TotoDraw]) -> FrequencyResult {
    let mut counts = vec![0u32; TOTO_POOL as usize];
    for draw in draws {
        for &n in &draw.winning {
            // Numéros hors 1..=49 (ligne de base non validée) ignorés
            if let Some(idx) = n.checked_sub(1).map(usize::from) {
                if idx < counts.len() {
                    counts[idx] += 1;
                }
            }
        }
    }

    let expected = (draws.len() * TOTO_PICKS) as f64 / TOTO_POOL as f64;
    let keyed = counts
        .iter()
        .enumerate()
        .map(|(i, &count)| (None, (i + 1) as u8, count))
        .collect::<Vec<_>>();

    build_result(Domain::Toto, draws.len(), expected, keyed)
}

/// Seuls les trois prix classés comptent ; starters et consolations sont exclus.
fn four_d_frequency(draws: &[FourDDraw]) -> FrequencyResult {
    let mut counts = [[0u32; 10]; 4];
    for draw in draws {
        for prize in draw.prizes() {
            for (pos, digit) in prize.digits().iter().enumerate() {
                counts[pos][*digit as usize] += 1;
            }
        }
    }

    let expected = (draws.len() * FOUR_D_PRIZES) as f64 / 10.0;
    let keyed = DigitPosition::ALL
        .iter()
        .flat_map(|&pos| {
            counts[pos.index()]
                .iter()
                .enumerate()
                .map(move |(digit, &count)| (Some(pos), digit as u8, count))
        })
        .collect::<Vec<_>>();

    build_result(Domain::FourD, draws.len(), expected, keyed)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightedCount {
    pub number: u8,
    pub score: f64,
}

/// Fréquence Toto où le tirage d'indice `i` (0 = plus récent) pèse `decay^i`.
/// Scores décroissants, à égalité numéro croissant ; les numéros jamais tirés sont absents.
pub fn time_weighted_frequency(draws: &[TotoDraw], decay: f64) -> Vec<WeightedCount> {
    let mut scores = vec![0.0f64; TOTO_POOL as usize];
    let mut weight = 1.0;
    for draw in draws {
        for &n in &draw.winning {
            if let Some(score) = n.checked_sub(1).and_then(|idx| scores.get_mut(usize::from(idx))) {
                *score += weight;
            }
        }
        weight *= decay;
    }

    let mut weighted: Vec<WeightedCount> = scores
        .iter()
        .enumerate()
        .filter(|(_, &score)| score > 0.0)
        .map(|(i, &score)| WeightedCount {
            number: (i + 1) as u8,
            score,
        })
        .collect();
    weighted.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.number.cmp(&b.number)));
    weighted
}

fn build_result(
    domain: Domain,
    draws: usize,
    expected: f64,
    keyed: Vec<(Option<DigitPosition>, u8, u32)>,
) -> FrequencyResult {
    let raw: Vec<f64> = keyed
        .iter()
        .map(|&(_, _, count)| {
            if expected > 0.0 {
                (count as f64 - expected) / expected
            } else {
                0.0
            }
        })
        .collect();

    let max_abs = raw.iter().fold(0.0f64, |acc, d| acc.max(d.abs()));

    let candidates = keyed
        .into_iter()
        .zip(raw)
        .map(|((position, candidate, count), raw_deviation)| CandidateFrequency {
            position,
            candidate,
            count,
            raw_deviation,
            deviation: if max_abs > 0.0 { raw_deviation / max_abs } else { 0.0 },
            tag: FrequencyTag::classify(raw_deviation),
        })
        .collect();

    FrequencyResult {
        domain,
        draws,
        expected,
        candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{four_d_draw, toto_draw};

    #[test]
    fn test_toto_counts_sum() {
        let history = DrawHistory::Toto(vec![
            toto_draw([1, 2, 3, 4, 5, 6], 7),
            toto_draw([1, 8, 9, 10, 11, 12], 2),
        ]);
        let freq = analyze_frequency(&history);
        assert_eq!(freq.candidates.len(), 49);
        assert_eq!(freq.candidates.iter().map(|c| c.count).sum::<u32>(), 12);
        assert_eq!(freq.count(1), 2);
        // Le numéro additionnel n'est pas compté
        assert_eq!(freq.count(7), 0);
        assert!((freq.expected - 12.0 / 49.0).abs() < 1e-12);
    }

    #[test]
    fn test_always_drawn_number_is_hottest() {
        let draws = (0..10u8)
            .map(|i| {
                let base = 8 + i * 4;
                toto_draw([7, base, base + 1, base + 2, base + 3, 1 + (i % 6)], 49)
            })
            .collect();
        let freq = analyze_frequency(&DrawHistory::Toto(draws));
        assert_eq!(freq.count(7), 10);
        assert_eq!(freq.deviation(7), 1.0);
        assert!(freq.hot_numbers().contains(&7));
        assert_eq!(freq.tag(7), FrequencyTag::Hot);
    }

    #[test]
    fn test_normalized_deviation_bounds() {
        let history = DrawHistory::Toto(vec![
            toto_draw([1, 2, 3, 4, 5, 6], 7),
            toto_draw([1, 2, 3, 10, 11, 12], 7),
            toto_draw([1, 20, 30, 40, 41, 42], 7),
        ]);
        let freq = analyze_frequency(&history);
        assert!(freq.candidates.iter().all(|c| (-1.0..=1.0).contains(&c.deviation)));
        assert!(freq.candidates.iter().any(|c| c.deviation.abs() == 1.0));
    }

    #[test]
    fn test_threshold_uses_raw_deviation() {
        // 49 tirages : attendu = 6 par numéro
        let draws: Vec<TotoDraw> = (0..49u8)
            .map(|i| {
                let n = |k: u8| (i + k * 8) % 49 + 1;
                toto_draw([n(0), n(1), n(2), n(3), n(4), n(5)], n(6))
            })
            .collect();
        let freq = analyze_frequency(&DrawHistory::Toto(draws));
        assert!((freq.expected - 6.0).abs() < 1e-12);
        // Distribution parfaitement uniforme : aucun écart, rien de chaud ni de froid
        assert!(freq.candidates.iter().all(|c| c.count == 6));
        assert!(freq.hot_numbers().is_empty());
        assert!(freq.cold_numbers().is_empty());
        assert!(freq.candidates.iter().all(|c| c.deviation == 0.0));
    }

    #[test]
    fn test_hot_cold_ascending() {
        let history = DrawHistory::Toto(vec![
            toto_draw([40, 30, 20, 10, 5, 1], 2),
            toto_draw([40, 30, 20, 10, 5, 1], 2),
        ]);
        let freq = analyze_frequency(&history);
        assert_eq!(freq.hot_numbers(), vec![1, 5, 10, 20, 30, 40]);
        assert_eq!(freq.cold_numbers().len(), 43);
        assert!(freq.cold_numbers().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_history_is_neutral() {
        let freq = analyze_frequency(&DrawHistory::Toto(vec![]));
        assert_eq!(freq.expected, 0.0);
        assert!(freq.candidates.iter().all(|c| c.count == 0 && c.deviation == 0.0));
        assert!(freq.candidates.iter().all(|c| c.tag == FrequencyTag::Normal));

        let freq = analyze_frequency(&DrawHistory::FourD(vec![]));
        assert_eq!(freq.candidates.len(), 40);
        assert!(freq.candidates.iter().all(|c| c.tag == FrequencyTag::Normal));
    }

    #[test]
    fn test_out_of_range_numbers_are_skipped() {
        // Ligne lue en base sans validation : 0 et 50 ne doivent ni paniquer ni compter
        let history = DrawHistory::Toto(vec![toto_draw([0, 2, 3, 4, 5, 6], 7), toto_draw([50, 2, 3, 4, 5, 6], 7)]);
        let freq = analyze_frequency(&history);
        assert_eq!(freq.candidates.iter().map(|c| c.count).sum::<u32>(), 10);
        assert_eq!(freq.count(2), 2);

        let DrawHistory::Toto(draws) = &history else { unreachable!() };
        assert_eq!(time_weighted_frequency(draws, TIME_DECAY).len(), 5);
    }

    #[test]
    fn test_time_weighted_favors_recent_draws() {
        let draws = vec![
            toto_draw([1, 2, 3, 4, 5, 6], 49),
            toto_draw([1, 7, 8, 9, 10, 11], 49),
            toto_draw([12, 13, 14, 15, 16, 17], 49),
        ];
        let weighted = time_weighted_frequency(&draws, TIME_DECAY);
        assert_eq!(weighted.len(), 17);
        assert_eq!(weighted[0].number, 1);
        assert!((weighted[0].score - 1.95).abs() < 1e-12);
        // À égalité (poids 1), numéro croissant
        assert_eq!(weighted[1].number, 2);
        let twelve = weighted.iter().find(|w| w.number == 12).unwrap();
        assert!((twelve.score - 0.9025).abs() < 1e-12);
        assert_eq!(weighted.last().map(|w| w.number), Some(17));
        assert!(time_weighted_frequency(&[], TIME_DECAY).is_empty());
    }

    #[test]
    fn test_four_d_positional_counts() {
        let history = DrawHistory::FourD(vec![
            four_d_draw("0123", "0456", "0789"),
            four_d_draw("1123", "0000", "9999"),
        ]);
        let freq = analyze_frequency(&history);
        assert!((freq.expected - 0.6).abs() < 1e-12);

        let thousands_zero = freq.entry(Some(DigitPosition::Thousands), 0).unwrap();
        assert_eq!(thousands_zero.count, 4);

        let per_position: Vec<u32> = DigitPosition::ALL
            .iter()
            .map(|&p| freq.position(p).map(|c| c.count).sum())
            .collect();
        assert_eq!(per_position, vec![6, 6, 6, 6]);

        assert!(freq.hot_digits(DigitPosition::Thousands).contains(&0));
        assert!(freq.cold_digits(DigitPosition::Units).contains(&5));
        // Normalisation commune aux quatre positions
        assert_eq!(thousands_zero.deviation, 1.0);
    }

    #[test]
    fn test_four_d_secondary_prizes_ignored() {
        let mut draw = four_d_draw("1111", "2222", "3333");
        draw.starters = vec!["9999".parse().unwrap(); 10];
        let freq = analyze_frequency(&DrawHistory::FourD(vec![draw]));
        assert_eq!(freq.entry(Some(DigitPosition::Units), 9).unwrap().count, 0);
    }
}
