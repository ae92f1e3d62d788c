use anyhow::{Context, Result};

use drawstat_db::models::{Domain, DrawHistory};
use drawstat_db::source::HistorySource;

use crate::context::AnalysisContext;
use crate::ensemble::{build_ensemble_report, EnsembleReport};
use crate::frequency::FrequencyResult;
use crate::gap::GapResult;
use crate::rng::RandomSource;
use crate::strategy::{generate_selection, Strategy, StrategyError, StrategyOutput};

/// Historique actif et son analyse. Tout changement d'historique ou de jeu
/// recalcule l'analyse en entier.
#[derive(Debug, Clone)]
pub struct Session {
    history: DrawHistory,
    context: AnalysisContext,
}

impl Session {
    pub fn new(history: DrawHistory) -> Self {
        let context = AnalysisContext::from_history(&history);
        Self { history, context }
    }

    pub fn load(source: &dyn HistorySource, domain: Domain) -> Result<Self> {
        let history = source
            .load_history(domain)
            .with_context(|| format!("Échec du chargement de l'historique {}", domain))?;
        Ok(Self::new(history))
    }

    pub fn switch_domain(&mut self, source: &dyn HistorySource, domain: Domain) -> Result<()> {
        let history = source
            .load_history(domain)
            .with_context(|| format!("Échec du chargement de l'historique {}", domain))?;
        tracing::info!(from = %self.domain(), to = %domain, draws = history.len(), "changement de jeu");
        self.set_history(history);
        Ok(())
    }

    pub fn set_history(&mut self, history: DrawHistory) {
        self.context = AnalysisContext::from_history(&history);
        self.history = history;
    }

    pub fn domain(&self) -> Domain {
        self.history.domain()
    }

    pub fn history(&self) -> &DrawHistory {
        &self.history
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }

    pub fn frequency(&self) -> &FrequencyResult {
        self.context.frequency()
    }

    pub fn gaps(&self) -> Option<&GapResult> {
        self.context.gaps()
    }

    pub fn generate(&self, strategy: Strategy, rng: &mut dyn RandomSource) -> Result<StrategyOutput, StrategyError> {
        generate_selection(strategy, &self.context, rng)
    }

    pub fn ensemble_report(&self, rng: &mut dyn RandomSource) -> Result<EnsembleReport, StrategyError> {
        build_ensemble_report(&self.context, rng)
    }
}
