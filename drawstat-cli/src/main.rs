mod config;
mod display;
mod import;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use serde::Serialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{resolve_settings, Settings};
use crate::display::{
    display_chi_square, display_digit_gaps, display_draws, display_four_d_patterns, display_frequency,
    display_gaps, display_import_summary, display_report, display_selections, display_splits,
    display_sums, display_time_weighted, display_toto_patterns,
};
use drawstat_analysis::chi_square::{chi_square, ChiSquareTest};
use drawstat_analysis::context::AnalysisContext;
use drawstat_analysis::distribution::{
    high_low_distribution, odd_even_distribution, sum_distribution, SplitDistribution, SumDistribution,
    HIGH_LOW_MIDPOINT,
};
use drawstat_analysis::frequency::{time_weighted_frequency, WeightedCount, TIME_DECAY};
use drawstat_analysis::gap::{analyze_four_d_gaps, DigitGapResult};
use drawstat_analysis::patterns::{four_d_patterns, frequent_pairs, toto_patterns, FourDPatternSummary, TotoPatternSummary};
use drawstat_analysis::rng::{date_seed, from_entropy, seeded};
use drawstat_analysis::session::Session;
use drawstat_analysis::strategy::Strategy;
use drawstat_db::db::{count_draws, db_path, fetch_last_four_d_draws, fetch_last_toto_draws, insert_history, migrate, open_db};
use drawstat_db::models::{Domain, DrawHistory};
use drawstat_db::rusqlite::Connection;
use drawstat_db::source::{DemoSource, FallbackSource, HistorySource, SqliteSource};

/// Paires affichées par `stats` : sorties ensemble au moins ce nombre de fois.
const PAIR_THRESHOLD: u32 = 5;
const PAIR_LIMIT: usize = 20;
const TIME_WEIGHTED_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum Game {
    #[default]
    Toto,
    #[value(name = "4d")]
    FourD,
}

impl From<Game> for Domain {
    fn from(game: Game) -> Self {
        match game {
            Game::Toto => Domain::Toto,
            Game::FourD => Domain::FourD,
        }
    }
}

#[derive(Parser)]
#[command(name = "drawstat", about = "Analyseur statistique des tirages Toto et 4D")]
struct Cli {
    /// Fichier de configuration JSON (défaut : ./drawstat.json s'il existe)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Chemin de la base SQLite
    #[arg(long, global = true, env = "DRAWSTAT_DB")]
    db: Option<PathBuf>,

    /// Analyser des données synthétiques sans toucher à la base
    #[arg(long, global = true)]
    demo: bool,

    /// Logs détaillés
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis un fichier CSV
    Import {
        #[arg(short, long, value_enum, default_value = "toto")]
        domain: Game,

        /// Chemin vers le fichier CSV
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Enregistrer un historique synthétique dans la base
    SeedDemo {
        #[arg(short, long, value_enum, default_value = "toto")]
        domain: Game,

        /// Nombre de tirages (défaut : configuration, sinon 150)
        #[arg(short, long)]
        count: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        #[arg(short, long, value_enum, default_value = "toto")]
        domain: Game,

        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Statistiques : fréquences, retards, χ², motifs
    Stats {
        #[arg(short, long, value_enum, default_value = "toto")]
        domain: Game,

        /// Sortie JSON
        #[arg(long)]
        json: bool,
    },

    /// Générer des sélections avec une stratégie
    Generate {
        #[arg(short, long, value_enum, default_value = "toto")]
        domain: Game,

        /// Toto : random, hot, cold, overdue, balanced, weighted. 4D : random, hot_position, pattern, weighted
        #[arg(short, long)]
        strategy: Option<String>,

        /// Nombre de sélections
        #[arg(short, long, default_value = "1")]
        count: usize,

        /// Seed pour la reproductibilité (défaut : date du jour)
        #[arg(long, conflicts_with = "fresh")]
        seed: Option<u64>,

        /// Aléa du système plutôt qu'un seed
        #[arg(long)]
        fresh: bool,

        #[arg(long)]
        json: bool,
    },

    /// Prédiction d'ensemble : quatre stratégies, quatre niveaux de confiance
    Predict {
        #[arg(short, long, value_enum, default_value = "toto")]
        domain: Game,

        #[arg(long, conflicts_with = "fresh")]
        seed: Option<u64>,

        #[arg(long)]
        fresh: bool,

        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr).without_time())
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let settings = resolve_settings(cli.config.as_deref())?;
    let path = cli
        .db
        .clone()
        .or_else(|| settings.db_path.clone())
        .unwrap_or_else(db_path);

    if let Command::DbPath = cli.command {
        println!("{}", path.display());
        return Ok(());
    }

    let demo = demo_source(&settings, None);
    let conn = if cli.demo {
        None
    } else {
        let conn = open_db(&path)?;
        migrate(&conn)?;
        Some(conn)
    };

    match cli.command {
        Command::Import { domain, file } => cmd_import(require_db(&conn)?, domain.into(), &file),
        Command::SeedDemo { domain, count, seed } => {
            let source = DemoSource {
                count: count.unwrap_or(settings.demo_draws),
                ..demo_source(&settings, seed)
            };
            cmd_seed_demo(require_db(&conn)?, &source, domain.into())
        }
        Command::DbPath => Ok(()),
        Command::List { domain, last } => cmd_list(conn.as_ref(), &demo, domain.into(), last),
        Command::Stats { domain, json } => {
            let session = load_session(conn.as_ref(), &demo, domain.into())?;
            cmd_stats(&session, json, &mut std::io::stdout())
        }
        Command::Generate { domain, strategy, count, seed, fresh, json } => {
            let domain: Domain = domain.into();
            let strategy = resolve_strategy(domain, strategy.as_deref(), &settings)?;
            let session = load_session(conn.as_ref(), &demo, domain)?;
            let mut rng = make_rng(seed, fresh, &settings);
            cmd_generate(&session, strategy, count, &mut rng, json, &mut std::io::stdout())
        }
        Command::Predict { domain, seed, fresh, json } => {
            let session = load_session(conn.as_ref(), &demo, domain.into())?;
            let mut rng = make_rng(seed, fresh, &settings);
            cmd_predict(&session, &mut rng, json, &mut std::io::stdout())
        }
    }
}

fn require_db(conn: &Option<Connection>) -> Result<&Connection> {
    conn.as_ref()
        .context("Cette commande écrit dans la base : retirez --demo")
}

fn demo_source(settings: &Settings, seed: Option<u64>) -> DemoSource {
    let seed = seed.or(settings.seed).unwrap_or_else(date_seed);
    DemoSource::new(settings.demo_draws, seed, chrono::Local::now().date_naive())
}

fn make_rng(seed: Option<u64>, fresh: bool, settings: &Settings) -> StdRng {
    if fresh {
        tracing::debug!("aléa du système");
        return from_entropy();
    }
    let seed = seed.or(settings.seed).unwrap_or_else(date_seed);
    tracing::debug!(seed, "générateur initialisé");
    seeded(seed)
}

/// Stratégie demandée, sinon celle de la configuration, sinon la stratégie pondérée.
fn resolve_strategy(domain: Domain, requested: Option<&str>, settings: &Settings) -> Result<Strategy> {
    let configured = match domain {
        Domain::Toto => settings.default_toto_strategy.as_deref(),
        Domain::FourD => settings.default_four_d_strategy.as_deref(),
    };
    match requested.or(configured) {
        Some(name) => Ok(Strategy::parse(domain, name)?),
        None => Ok(Strategy::default_for(domain)),
    }
}

fn load_session(conn: Option<&Connection>, demo: &DemoSource, domain: Domain) -> Result<Session> {
    let session = match conn {
        Some(conn) => Session::load(&FallbackSource::new(SqliteSource::new(conn), demo.clone()), domain)?,
        None => Session::load(demo, domain)?,
    };
    // Sur stderr via tracing : la sortie --json reste un document JSON seul
    if session.history().is_demo() {
        tracing::warn!(draws = session.history().len(), "⚠ données de démonstration (tirages synthétiques)");
    }
    Ok(session)
}

fn cmd_import(conn: &Connection, domain: Domain, file: &Path) -> Result<()> {
    let result = import::import_csv(conn, domain, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_seed_demo(conn: &Connection, source: &DemoSource, domain: Domain) -> Result<()> {
    let history = source.load_history(domain)?;
    let inserted = insert_history(conn, &history)?;
    println!(
        "{} tirages de démonstration {} insérés ({} déjà présents).",
        inserted,
        domain,
        history.len() as u32 - inserted
    );
    Ok(())
}

fn cmd_list(conn: Option<&Connection>, demo: &DemoSource, domain: Domain, last: u32) -> Result<()> {
    let history = match conn {
        Some(conn) => {
            if count_draws(conn, domain)? == 0 {
                println!("Base vide. Lancez d'abord : drawstat import --domain {}", domain);
                return Ok(());
            }
            match domain {
                Domain::Toto => DrawHistory::Toto(fetch_last_toto_draws(conn, last)?),
                Domain::FourD => DrawHistory::FourD(fetch_last_four_d_draws(conn, last)?),
            }
        }
        None => {
            let source = DemoSource { count: last as usize, ..demo.clone() };
            source.load_history(domain)?
        }
    };
    display_draws(&history);
    Ok(())
}

#[derive(Serialize)]
struct StatsReport<'a> {
    analysis: &'a AnalysisContext,
    chi_square: Vec<ChiSquareTest>,
    is_demo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    toto_patterns: Option<TotoPatternSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    frequent_pairs: Vec<((u8, u8), u32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    four_d_patterns: Option<FourDPatternSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    digit_gaps: Option<DigitGapResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sums: Option<SumDistribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    odd_even: Option<SplitDistribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    high_low: Option<SplitDistribution>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    time_weighted: Vec<WeightedCount>,
}

fn stats_report(session: &Session) -> StatsReport<'_> {
    let mut report = StatsReport {
        analysis: session.context(),
        chi_square: chi_square(session.frequency()),
        is_demo: session.history().is_demo(),
        toto_patterns: None,
        frequent_pairs: Vec::new(),
        four_d_patterns: None,
        digit_gaps: None,
        sums: sum_distribution(session.history()),
        odd_even: None,
        high_low: None,
        time_weighted: Vec::new(),
    };
    match session.history() {
        DrawHistory::Toto(draws) => {
            report.toto_patterns = Some(toto_patterns(draws));
            report.frequent_pairs = frequent_pairs(draws, PAIR_THRESHOLD);
            report.frequent_pairs.truncate(PAIR_LIMIT);
            report.odd_even = Some(odd_even_distribution(draws));
            report.high_low = Some(high_low_distribution(draws, HIGH_LOW_MIDPOINT));
            report.time_weighted = time_weighted_frequency(draws, TIME_DECAY);
            report.time_weighted.truncate(TIME_WEIGHTED_LIMIT);
        }
        DrawHistory::FourD(draws) => {
            report.four_d_patterns = Some(four_d_patterns(draws));
            report.digit_gaps = Some(analyze_four_d_gaps(draws));
        }
    }
    report
}

fn write_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn cmd_stats(session: &Session, json: bool, out: &mut dyn Write) -> Result<()> {
    let report = stats_report(session);
    if json {
        return write_json(out, &report);
    }

    display_frequency(session.frequency());
    if !report.time_weighted.is_empty() {
        display_time_weighted(&report.time_weighted, TIME_DECAY);
    }
    if let Some(gaps) = session.gaps() {
        display_gaps(gaps);
    }
    if let Some(gaps) = &report.digit_gaps {
        display_digit_gaps(gaps);
    }
    display_chi_square(&report.chi_square);
    if let Some(sums) = &report.sums {
        display_sums(sums);
    }
    for split in [&report.odd_even, &report.high_low].into_iter().flatten() {
        display_splits(split);
    }
    if let Some(summary) = &report.toto_patterns {
        display_toto_patterns(summary, &report.frequent_pairs);
    }
    if let Some(summary) = &report.four_d_patterns {
        display_four_d_patterns(summary);
    }
    Ok(())
}

fn cmd_generate(
    session: &Session,
    strategy: Strategy,
    count: usize,
    rng: &mut StdRng,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let outputs = (0..count)
        .map(|_| session.generate(strategy, rng))
        .collect::<Result<Vec<_>, _>>()?;
    if json {
        write_json(out, &outputs)?;
    } else {
        display_selections(&outputs);
    }
    Ok(())
}

fn cmd_predict(session: &Session, rng: &mut StdRng, json: bool, out: &mut dyn Write) -> Result<()> {
    let report = session.ensemble_report(rng)?;
    if json {
        write_json(out, &report)?;
    } else {
        display_report(&report);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clap::CommandFactory;
    use drawstat_analysis::strategy::{FourDStrategy, TotoStrategy};

    fn demo() -> DemoSource {
        DemoSource::new(40, 3, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_game_and_flags() {
        let cli = Cli::try_parse_from(["drawstat", "--demo", "generate", "-d", "4d", "-s", "pattern", "--seed", "9"]).unwrap();
        assert!(cli.demo);
        match cli.command {
            Command::Generate { domain, strategy, seed, .. } => {
                assert_eq!(domain, Game::FourD);
                assert_eq!(strategy.as_deref(), Some("pattern"));
                assert_eq!(seed, Some(9));
            }
            _ => panic!("commande inattendue"),
        }
        assert!(Cli::try_parse_from(["drawstat", "predict", "--seed", "1", "--fresh"]).is_err());
    }

    #[test]
    fn test_resolve_strategy_precedence() {
        let mut settings = Settings::default();
        assert_eq!(
            resolve_strategy(Domain::Toto, None, &settings).unwrap(),
            Strategy::Toto(TotoStrategy::Weighted)
        );
        settings.default_four_d_strategy = Some("pattern".to_string());
        assert_eq!(
            resolve_strategy(Domain::FourD, None, &settings).unwrap(),
            Strategy::FourD(FourDStrategy::Pattern)
        );
        assert_eq!(
            resolve_strategy(Domain::FourD, Some("random"), &settings).unwrap(),
            Strategy::FourD(FourDStrategy::Random)
        );
        assert!(resolve_strategy(Domain::Toto, Some("pattern"), &settings).is_err());
    }

    #[test]
    fn test_stats_report_per_game() {
        let session = Session::load(&demo(), Domain::Toto).unwrap();
        let report = stats_report(&session);
        assert_eq!(report.chi_square.len(), 1);
        assert!(report.toto_patterns.is_some());
        assert!(report.four_d_patterns.is_none());
        assert!(report.frequent_pairs.len() <= PAIR_LIMIT);
        assert!(report.digit_gaps.is_none());
        assert_eq!(report.sums.as_ref().map(|s| s.samples), Some(40));
        assert_eq!(report.odd_even.as_ref().map(|d| d.draws), Some(40));
        assert!(report.high_low.is_some());
        assert_eq!(report.time_weighted.len(), TIME_WEIGHTED_LIMIT);

        let session = Session::load(&demo(), Domain::FourD).unwrap();
        let report = stats_report(&session);
        assert_eq!(report.chi_square.len(), 4);
        assert_eq!(report.digit_gaps.as_ref().map(|g| g.positions.len()), Some(4));
        assert_eq!(report.sums.as_ref().map(|s| s.samples), Some(120));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["analysis"]["domain"], "4d");
        assert!(json.get("toto_patterns").is_none());
        assert!(json.get("odd_even").is_none());
        assert!(json.get("time_weighted").is_none());
    }

    fn parse_json_output(buf: Vec<u8>) -> serde_json::Value {
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with(['{', '[']), "texte avant le JSON : {text:?}");
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_demo_json_output_is_pure_json() {
        let session = load_session(None, &demo(), Domain::FourD).unwrap();
        assert!(session.history().is_demo());

        let mut out = Vec::new();
        cmd_stats(&session, true, &mut out).unwrap();
        assert_eq!(parse_json_output(out)["is_demo"], true);

        let mut out = Vec::new();
        let strategy = Strategy::default_for(Domain::FourD);
        cmd_generate(&session, strategy, 2, &mut seeded(5), true, &mut out).unwrap();
        assert_eq!(parse_json_output(out).as_array().map(Vec::len), Some(2));

        let mut out = Vec::new();
        cmd_predict(&session, &mut seeded(5), true, &mut out).unwrap();
        assert_eq!(parse_json_output(out)["domain"], "4d");
    }

    #[test]
    fn test_seed_demo_then_load_from_db() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        cmd_seed_demo(&conn, &demo(), Domain::Toto).unwrap();
        assert_eq!(count_draws(&conn, Domain::Toto).unwrap(), 40);

        let session = load_session(Some(&conn), &demo(), Domain::Toto).unwrap();
        assert_eq!(session.history().len(), 40);
        // Rien en base pour le 4D : repli sur la démo
        let session = load_session(Some(&conn), &demo(), Domain::FourD).unwrap();
        assert!(session.history().is_demo());
    }
}
