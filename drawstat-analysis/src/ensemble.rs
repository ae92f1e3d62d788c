use chrono::{DateTime, Utc};
use serde::Serialize;

use drawstat_db::models::{Domain, TOTO_POOL};

use crate::context::AnalysisContext;
use crate::rng::{sample_distinct, RandomSource};
use crate::strategy::{generate_selection, FourDStrategy, Picks, Strategy, StrategyError, StrategyOutput, TotoStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
    Speculative,
}

impl ConfidenceTier {
    pub const ALL: [ConfidenceTier; 4] = [
        ConfidenceTier::High,
        ConfidenceTier::Medium,
        ConfidenceTier::Low,
        ConfidenceTier::Speculative,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
            ConfidenceTier::Speculative => "speculative",
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const TOTO_TIERS: [TotoStrategy; 4] = [
    TotoStrategy::Weighted,
    TotoStrategy::Hot,
    TotoStrategy::Cold,
    TotoStrategy::Random,
];

const FOUR_D_TIERS: [FourDStrategy; 4] = [
    FourDStrategy::Weighted,
    FourDStrategy::HotPosition,
    FourDStrategy::Pattern,
    FourDStrategy::Random,
];

const TOTO_REASONS: [&str; 4] = [
    "Pondération combinée des fréquences et des retards, en pariant sur un retour à la moyenne.",
    "Suit la grappe de numéros actuellement les plus sortis.",
    "Mise sur les numéros sous-représentés dans l'historique.",
    "Grille de contrôle tirée au hasard, sans aucune hypothèse.",
];

const FOUR_D_REASONS: [&str; 4] = [
    "Chiffres pondérés selon leur fréquence propre à chaque position.",
    "Reprend les chiffres les plus présents à chaque position.",
    "Évite les motifs dégénérés à quatre chiffres identiques.",
    "Numéro de contrôle uniforme sur 0000-9999.",
];

const TOTO_SUMMARY: &str = "Ensemble combinant probabilités pondérées et analyse des retards.";
const FOUR_D_SUMMARY: &str = "Suivi des fréquences par position sur tout l'historique.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleEntry {
    pub confidence: ConfidenceTier,
    #[serde(flatten)]
    pub output: StrategyOutput,
    /// Toto uniquement : numéro additionnel hors des 6 numéros de la grille.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional: Option<u8>,
    pub reasoning: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleReport {
    pub domain: Domain,
    pub predictions: Vec<EnsembleEntry>,
    pub analysis_summary: &'static str,
    pub generated_at: DateTime<Utc>,
}

/// Numéro additionnel uniforme parmi les 43 numéros absents de la grille.
fn additional_number(numbers: &[u8; 6], rng: &mut dyn RandomSource) -> Option<u8> {
    let pool: Vec<u8> = (1..=TOTO_POOL).filter(|n| !numbers.contains(n)).collect();
    sample_distinct(&pool, 1, rng).first().copied()
}

pub fn build_ensemble_report(
    ctx: &AnalysisContext,
    rng: &mut dyn RandomSource,
) -> Result<EnsembleReport, StrategyError> {
    build_ensemble_report_at(ctx, rng, Utc::now())
}

/// Comme [`build_ensemble_report`], avec un horodatage fourni.
pub fn build_ensemble_report_at(
    ctx: &AnalysisContext,
    rng: &mut dyn RandomSource,
    now: DateTime<Utc>,
) -> Result<EnsembleReport, StrategyError> {
    let domain = ctx.domain();
    let (strategies, reasons, summary): ([Strategy; 4], [&'static str; 4], &'static str) = match domain {
        Domain::Toto => (TOTO_TIERS.map(Strategy::Toto), TOTO_REASONS, TOTO_SUMMARY),
        Domain::FourD => (FOUR_D_TIERS.map(Strategy::FourD), FOUR_D_REASONS, FOUR_D_SUMMARY),
    };

    let mut predictions = Vec::with_capacity(ConfidenceTier::ALL.len());
    for ((confidence, strategy), reasoning) in ConfidenceTier::ALL.into_iter().zip(strategies).zip(reasons) {
        let output = generate_selection(strategy, ctx, rng)?;
        let additional = match &output.picks {
            Picks::Toto(numbers) => additional_number(numbers, rng),
            Picks::FourD(_) => None,
        };
        predictions.push(EnsembleEntry {
            confidence,
            output,
            additional,
            reasoning,
        });
    }

    tracing::debug!(%domain, entries = predictions.len(), "rapport d'ensemble construit");

    Ok(EnsembleReport {
        domain,
        predictions,
        analysis_summary: summary,
        generated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded;
    use chrono::TimeZone;

    #[test]
    fn test_toto_report_tiers_and_strategies() {
        let ctx = AnalysisContext::empty(Domain::Toto);
        let report = build_ensemble_report(&ctx, &mut seeded(1)).unwrap();
        assert_eq!(report.domain, Domain::Toto);
        assert_eq!(report.predictions.len(), 4);

        let tiers: Vec<_> = report.predictions.iter().map(|e| e.confidence).collect();
        assert_eq!(tiers, ConfidenceTier::ALL.to_vec());
        let names: Vec<_> = report.predictions.iter().map(|e| e.output.strategy.name()).collect();
        assert_eq!(names, vec!["weighted", "hot", "cold", "random"]);
    }

    #[test]
    fn test_toto_additional_not_in_grid() {
        let ctx = AnalysisContext::empty(Domain::Toto);
        let mut rng = seeded(17);
        for _ in 0..50 {
            let report = build_ensemble_report(&ctx, &mut rng).unwrap();
            for entry in &report.predictions {
                let additional = entry.additional.unwrap();
                assert!((1..=49).contains(&additional));
                match entry.output.picks {
                    Picks::Toto(numbers) => assert!(!numbers.contains(&additional)),
                    Picks::FourD(_) => panic!("attendu une grille Toto"),
                }
            }
        }
    }

    #[test]
    fn test_four_d_report() {
        let ctx = AnalysisContext::empty(Domain::FourD);
        let report = build_ensemble_report(&ctx, &mut seeded(2)).unwrap();
        let names: Vec<_> = report.predictions.iter().map(|e| e.output.strategy.name()).collect();
        assert_eq!(names, vec!["weighted", "hot_position", "pattern", "random"]);
        assert!(report.predictions.iter().all(|e| e.additional.is_none()));
    }

    #[test]
    fn test_reasons_are_distinct() {
        for reasons in [TOTO_REASONS, FOUR_D_REASONS] {
            for (i, a) in reasons.iter().enumerate() {
                assert!(reasons[i + 1..].iter().all(|b| a != b));
            }
        }
    }

    #[test]
    fn test_generated_at_is_injected() {
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        let ctx = AnalysisContext::empty(Domain::FourD);
        let report = build_ensemble_report_at(&ctx, &mut seeded(3), now).unwrap();
        assert_eq!(report.generated_at, now);
    }

    #[test]
    fn test_report_serializes_flat_entries() {
        let ctx = AnalysisContext::empty(Domain::Toto);
        let report = build_ensemble_report(&ctx, &mut seeded(4)).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        let first = &json["predictions"][0];
        assert_eq!(first["confidence"], "high");
        assert_eq!(first["strategy"], "weighted");
        assert!(first["picks"].is_array());
        assert!(first["additional"].is_u64());
        assert_eq!(json["domain"], "toto");
    }
}
