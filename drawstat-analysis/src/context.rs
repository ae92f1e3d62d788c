use serde::Serialize;

use drawstat_db::models::{Domain, DrawHistory};

use crate::frequency::{analyze_frequency, FrequencyResult};
use crate::gap::{analyze_gaps, GapResult};

/// Résultats d'analyse d'un historique, passés explicitement au moteur de stratégies.
/// Recalculés en entier à chaque changement d'historique ou de jeu, jamais modifiés ensuite.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "domain")]
pub enum AnalysisContext {
    #[serde(rename = "toto")]
    Toto {
        frequency: FrequencyResult,
        gaps: GapResult,
    },
    #[serde(rename = "4d")]
    FourD { frequency: FrequencyResult },
}

impl AnalysisContext {
    pub fn from_history(history: &DrawHistory) -> Self {
        tracing::debug!(
            domain = %history.domain(),
            draws = history.len(),
            demo = history.is_demo(),
            "recalcul de l'analyse"
        );
        let frequency = analyze_frequency(history);
        match history {
            DrawHistory::Toto(draws) => AnalysisContext::Toto {
                frequency,
                gaps: analyze_gaps(draws),
            },
            DrawHistory::FourD(_) => AnalysisContext::FourD { frequency },
        }
    }

    /// Contexte neutre : tous les candidats « normaux » et également en retard.
    pub fn empty(domain: Domain) -> Self {
        Self::from_history(&DrawHistory::empty(domain))
    }

    pub fn domain(&self) -> Domain {
        match self {
            AnalysisContext::Toto { .. } => Domain::Toto,
            AnalysisContext::FourD { .. } => Domain::FourD,
        }
    }

    pub fn frequency(&self) -> &FrequencyResult {
        match self {
            AnalysisContext::Toto { frequency, .. } => frequency,
            AnalysisContext::FourD { frequency } => frequency,
        }
    }

    pub fn gaps(&self) -> Option<&GapResult> {
        match self {
            AnalysisContext::Toto { gaps, .. } => Some(gaps),
            AnalysisContext::FourD { .. } => None,
        }
    }
}
