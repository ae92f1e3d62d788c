use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use drawstat_db::models::{Domain, FourDNumber, FourDNumberError, TOTO_PICKS, TOTO_POOL};

use crate::context::AnalysisContext;
use crate::frequency::{DigitPosition, FrequencyResult, FrequencyTag};
use crate::gap::GapResult;
use crate::patterns::FourDPattern;
use crate::rng::{sample_distinct, shuffle, RandomSource};
use crate::sampler::{weighted_pick, SamplerError};

pub const HOT_MULTIPLIER: f64 = 1.5;
pub const COLD_MULTIPLIER: f64 = 0.7;
/// Bonus de retard : poids × (1 + (retard / retard attendu − 1) × 0.2).
pub const GAP_BONUS: f64 = 0.2;

const BALANCED_HOT: usize = 2;
const BALANCED_OVERDUE: usize = 2;
/// Tirages tentés par `pattern` avant d'abandonner (une source dégénérée peut ne rendre que 0000).
pub const PATTERN_MAX_ATTEMPTS: usize = 1_000;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrategyError {
    #[error("la stratégie {strategy} ({strategy_domain}) ne s'applique pas à un contexte {context}")]
    DomainMismatch {
        strategy: &'static str,
        strategy_domain: Domain,
        context: Domain,
    },
    #[error(transparent)]
    Sampler(#[from] SamplerError),
    #[error(transparent)]
    Number(#[from] FourDNumberError),
    #[error("aucun numéro non uniforme après {attempts} tirages : source d'aléa dégénérée")]
    PatternExhausted { attempts: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stratégie inconnue pour le jeu {domain} : '{name}'")]
pub struct ParseStrategyError {
    pub domain: Domain,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TotoStrategy {
    Random,
    Hot,
    Cold,
    Overdue,
    Balanced,
    #[default]
    Weighted,
}

impl TotoStrategy {
    pub const ALL: [TotoStrategy; 6] = [
        TotoStrategy::Random,
        TotoStrategy::Hot,
        TotoStrategy::Cold,
        TotoStrategy::Overdue,
        TotoStrategy::Balanced,
        TotoStrategy::Weighted,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TotoStrategy::Random => "random",
            TotoStrategy::Hot => "hot",
            TotoStrategy::Cold => "cold",
            TotoStrategy::Overdue => "overdue",
            TotoStrategy::Balanced => "balanced",
            TotoStrategy::Weighted => "weighted",
        }
    }
}

impl FromStr for TotoStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TotoStrategy::ALL
            .into_iter()
            .find(|st| st.name() == wanted)
            .ok_or_else(|| ParseStrategyError {
                domain: Domain::Toto,
                name: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FourDStrategy {
    Random,
    HotPosition,
    Pattern,
    #[default]
    Weighted,
}

impl FourDStrategy {
    pub const ALL: [FourDStrategy; 4] = [
        FourDStrategy::Random,
        FourDStrategy::HotPosition,
        FourDStrategy::Pattern,
        FourDStrategy::Weighted,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FourDStrategy::Random => "random",
            FourDStrategy::HotPosition => "hot_position",
            FourDStrategy::Pattern => "pattern",
            FourDStrategy::Weighted => "weighted",
        }
    }
}

impl FromStr for FourDStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        FourDStrategy::ALL
            .into_iter()
            .find(|st| st.name() == wanted)
            .ok_or_else(|| ParseStrategyError {
                domain: Domain::FourD,
                name: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Strategy {
    Toto(TotoStrategy),
    FourD(FourDStrategy),
}

impl Strategy {
    pub fn parse(domain: Domain, name: &str) -> Result<Self, ParseStrategyError> {
        Ok(match domain {
            Domain::Toto => Strategy::Toto(name.parse()?),
            Domain::FourD => Strategy::FourD(name.parse()?),
        })
    }

    pub fn default_for(domain: Domain) -> Self {
        match domain {
            Domain::Toto => Strategy::Toto(TotoStrategy::default()),
            Domain::FourD => Strategy::FourD(FourDStrategy::default()),
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            Strategy::Toto(_) => Domain::Toto,
            Strategy::FourD(_) => Domain::FourD,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Toto(s) => s.name(),
            Strategy::FourD(s) => s.name(),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Picks {
    /// Toujours triés par ordre croissant.
    Toto([u8; 6]),
    FourD(FourDNumber),
}

impl fmt::Display for Picks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Picks::Toto(numbers) => {
                let joined = numbers
                    .iter()
                    .map(|n| format!("{:2}", n))
                    .collect::<Vec<_>>()
                    .join(" - ");
                f.write_str(&joined)
            }
            Picks::FourD(number) => write!(f, "{}", number),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyOutput {
    pub picks: Picks,
    /// Stratégie demandée, même en cas de repli sur le hasard.
    pub strategy: Strategy,
    pub explanation: String,
    pub fallback: bool,
}

pub fn generate_selection(
    strategy: Strategy,
    ctx: &AnalysisContext,
    rng: &mut dyn RandomSource,
) -> Result<StrategyOutput, StrategyError> {
    match (strategy, ctx) {
        (Strategy::Toto(s), AnalysisContext::Toto { frequency, gaps }) => {
            generate_toto(s, frequency, gaps, rng)
        }
        (Strategy::FourD(s), AnalysisContext::FourD { frequency }) => {
            generate_four_d(s, frequency, rng)
        }
        _ => Err(StrategyError::DomainMismatch {
            strategy: strategy.name(),
            strategy_domain: strategy.domain(),
            context: ctx.domain(),
        }),
    }
}

// ════════════════════════════════════════════════════════════════
// Toto
// ════════════════════════════════════════════════════════════════

struct Drawn {
    numbers: Vec<u8>,
    explanation: String,
    fallback: bool,
}

impl Drawn {
    fn new(numbers: Vec<u8>, explanation: &str) -> Self {
        Self {
            numbers,
            explanation: explanation.to_string(),
            fallback: false,
        }
    }
}

fn all_numbers() -> Vec<u8> {
    (1..=TOTO_POOL).collect()
}

fn toto_random(rng: &mut dyn RandomSource) -> Vec<u8> {
    sample_distinct(&all_numbers(), TOTO_PICKS, rng)
}

/// Mélange `pool` et garde les 6 premiers, ou `None` s'il y en a moins de 6.
fn pick_from_pool(pool: &[u8], rng: &mut dyn RandomSource) -> Option<Vec<u8>> {
    if pool.len() < TOTO_PICKS {
        return None;
    }
    let mut shuffled = pool.to_vec();
    shuffle(&mut shuffled, rng);
    shuffled.truncate(TOTO_PICKS);
    Some(shuffled)
}

fn fallback_to_random(strategy: TotoStrategy, available: usize, rng: &mut dyn RandomSource) -> Drawn {
    tracing::info!(
        strategy = strategy.name(),
        available,
        "pas assez de candidats, repli sur le tirage aléatoire"
    );
    Drawn {
        numbers: toto_random(rng),
        explanation: format!(
            "Stratégie {} : données insuffisantes ({} candidats), repli sur un tirage aléatoire",
            strategy.name(),
            available
        ),
        fallback: true,
    }
}

fn toto_balanced(frequency: &FrequencyResult, gaps: &GapResult, rng: &mut dyn RandomSource) -> Vec<u8> {
    let mut hot = frequency.hot_numbers();
    shuffle(&mut hot, rng);
    let mut numbers: Vec<u8> = hot.into_iter().take(BALANCED_HOT).collect();

    let overdue: Vec<u8> = gaps
        .most_overdue
        .iter()
        .map(|g| g.number)
        .filter(|n| !numbers.contains(n))
        .take(BALANCED_OVERDUE)
        .collect();
    numbers.extend(overdue);

    let remaining: Vec<u8> = all_numbers()
        .into_iter()
        .filter(|n| !numbers.contains(n))
        .collect();
    let missing = TOTO_PICKS - numbers.len();
    numbers.extend(sample_distinct(&remaining, missing, rng));
    numbers
}

/// Poids de la stratégie pondérée : 1, × 1.5 si chaud, × 0.7 si froid,
/// puis bonus proportionnel au dépassement du retard attendu.
pub fn toto_weights(frequency: &FrequencyResult, gaps: &GapResult) -> BTreeMap<u8, f64> {
    (1..=TOTO_POOL)
        .map(|n| {
            let mut weight = 1.0;
            match frequency.tag(n) {
                FrequencyTag::Hot => weight *= HOT_MULTIPLIER,
                FrequencyTag::Cold => weight *= COLD_MULTIPLIER,
                FrequencyTag::Normal => {}
            }
            let gap = gaps.gap(n) as f64;
            if gap > gaps.expected_gap {
                weight *= 1.0 + (gap / gaps.expected_gap - 1.0) * GAP_BONUS;
            }
            (n, weight)
        })
        .collect()
}

pub fn generate_toto(
    strategy: TotoStrategy,
    frequency: &FrequencyResult,
    gaps: &GapResult,
    rng: &mut dyn RandomSource,
) -> Result<StrategyOutput, StrategyError> {
    let drawn = match strategy {
        TotoStrategy::Random => Drawn::new(
            toto_random(rng),
            "Tirage purement aléatoire, sert de référence",
        ),
        TotoStrategy::Hot => {
            let hot = frequency.hot_numbers();
            match pick_from_pool(&hot, rng) {
                Some(numbers) => Drawn::new(numbers, "Numéros choisis parmi les plus fréquents"),
                None => fallback_to_random(strategy, hot.len(), rng),
            }
        }
        TotoStrategy::Cold => {
            let cold = frequency.cold_numbers();
            match pick_from_pool(&cold, rng) {
                Some(numbers) => Drawn::new(numbers, "Numéros choisis parmi les sous-représentés"),
                None => fallback_to_random(strategy, cold.len(), rng),
            }
        }
        TotoStrategy::Overdue => {
            if gaps.most_overdue.len() >= TOTO_PICKS {
                let numbers = gaps.most_overdue.iter().take(TOTO_PICKS).map(|g| g.number).collect();
                Drawn::new(numbers, "Numéros absents depuis le plus grand nombre de tirages")
            } else {
                fallback_to_random(strategy, gaps.most_overdue.len(), rng)
            }
        }
        TotoStrategy::Balanced => Drawn::new(
            toto_balanced(frequency, gaps, rng),
            "Mélange équilibré : 2 chauds, 2 en retard, le reste au hasard",
        ),
        TotoStrategy::Weighted => {
            let weights = toto_weights(frequency, gaps);
            Drawn::new(
                weighted_pick(&weights, TOTO_PICKS, rng)?,
                "Tirage pondéré combinant fréquence et retard",
            )
        }
    };

    let mut grid = [0u8; 6];
    for (slot, &n) in grid.iter_mut().zip(drawn.numbers.iter()) {
        *slot = n;
    }
    grid.sort();

    tracing::debug!(strategy = strategy.name(), numbers = ?grid, fallback = drawn.fallback, "grille générée");

    Ok(StrategyOutput {
        picks: Picks::Toto(grid),
        strategy: Strategy::Toto(strategy),
        explanation: drawn.explanation,
        fallback: drawn.fallback,
    })
}

// ════════════════════════════════════════════════════════════════
// 4D
// ════════════════════════════════════════════════════════════════

fn four_d_random(rng: &mut dyn RandomSource) -> Result<FourDNumber, FourDNumberError> {
    FourDNumber::from_value(rng.next_index(10_000) as u16)
}

/// Poids d'une position : 1, × 1.5 si le chiffre y est chaud, × 0.7 s'il y est froid.
pub fn position_weights(frequency: &FrequencyResult, position: DigitPosition) -> BTreeMap<u8, f64> {
    (0..10u8)
        .map(|digit| {
            let tag = frequency
                .entry(Some(position), digit)
                .map(|c| c.tag)
                .unwrap_or(FrequencyTag::Normal);
            let weight = match tag {
                FrequencyTag::Hot => HOT_MULTIPLIER,
                FrequencyTag::Cold => COLD_MULTIPLIER,
                FrequencyTag::Normal => 1.0,
            };
            (digit, weight)
        })
        .collect()
}

fn four_d_weighted(frequency: &FrequencyResult, rng: &mut dyn RandomSource) -> Result<FourDNumber, StrategyError> {
    let mut digits = [0u8; 4];
    for pos in DigitPosition::ALL {
        let weights = position_weights(frequency, pos);
        let picked = weighted_pick(&weights, 1, rng)?;
        digits[pos.index()] = picked.first().copied().ok_or(SamplerError::Exhausted {
            picked: 0,
            requested: 1,
        })?;
    }
    Ok(FourDNumber::from_digits(digits)?)
}

/// Chiffres chauds de la position, ou à défaut les plus fréquents (tous en cas d'historique vide).
fn hottest_digits(frequency: &FrequencyResult, position: DigitPosition) -> Vec<u8> {
    let hot = frequency.hot_digits(position);
    if !hot.is_empty() {
        return hot;
    }
    let max = frequency.position(position).map(|c| c.count).max().unwrap_or(0);
    let top: Vec<u8> = frequency
        .position(position)
        .filter(|c| c.count == max)
        .map(|c| c.candidate)
        .collect();
    if top.is_empty() {
        (0..10).collect()
    } else {
        top
    }
}

fn four_d_hot_position(frequency: &FrequencyResult, rng: &mut dyn RandomSource) -> Result<FourDNumber, FourDNumberError> {
    let mut digits = [0u8; 4];
    for pos in DigitPosition::ALL {
        let pool = hottest_digits(frequency, pos);
        digits[pos.index()] = pool[rng.next_index(pool.len())];
    }
    FourDNumber::from_digits(digits)
}

pub fn generate_four_d(
    strategy: FourDStrategy,
    frequency: &FrequencyResult,
    rng: &mut dyn RandomSource,
) -> Result<StrategyOutput, StrategyError> {
    let (number, explanation) = match strategy {
        FourDStrategy::Random => (four_d_random(rng)?, "Numéro 4D purement aléatoire".to_string()),
        FourDStrategy::HotPosition => (
            four_d_hot_position(frequency, rng)?,
            "Chaque chiffre pris parmi les plus chauds de sa position".to_string(),
        ),
        FourDStrategy::Pattern => {
            let mut accepted = None;
            for _ in 0..PATTERN_MAX_ATTEMPTS {
                let candidate = four_d_random(rng)?;
                if !candidate.is_uniform() {
                    accepted = Some(candidate);
                    break;
                }
            }
            let number = accepted.ok_or(StrategyError::PatternExhausted {
                attempts: PATTERN_MAX_ATTEMPTS,
            })?;
            let explanation = format!(
                "Motif varié ({}), jamais quatre chiffres identiques",
                FourDPattern::of(number)
            );
            (number, explanation)
        }
        FourDStrategy::Weighted => (
            four_d_weighted(frequency, rng)?,
            "Chiffres pondérés par leur fréquence à chaque position".to_string(),
        ),
    };

    tracing::debug!(strategy = strategy.name(), %number, "numéro 4D généré");

    Ok(StrategyOutput {
        picks: Picks::FourD(number),
        strategy: Strategy::FourD(strategy),
        explanation,
        fallback: false,
    })
}
