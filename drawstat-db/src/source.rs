use anyhow::Result;
use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rusqlite::Connection;

use crate::db::fetch_history;
use crate::demo::demo_history;
use crate::models::{Domain, DrawHistory};

/// Fournisseur d'historique. `draws[0]` doit être le tirage le plus récent.
pub trait HistorySource {
    fn load_history(&self, domain: Domain) -> Result<DrawHistory>;
}

pub struct SqliteSource<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSource<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl HistorySource for SqliteSource<'_> {
    fn load_history(&self, domain: Domain) -> Result<DrawHistory> {
        let history = fetch_history(self.conn, domain)?;
        tracing::debug!(%domain, draws = history.len(), "historique chargé depuis SQLite");
        Ok(history)
    }
}

/// Données synthétiques, reproductibles pour un même seed.
#[derive(Debug, Clone)]
pub struct DemoSource {
    pub count: usize,
    pub seed: u64,
    pub start: NaiveDate,
}

impl DemoSource {
    pub fn new(count: usize, seed: u64, start: NaiveDate) -> Self {
        Self { count, seed, start }
    }
}

impl HistorySource for DemoSource {
    fn load_history(&self, domain: Domain) -> Result<DrawHistory> {
        // Flux distincts par jeu pour un même seed
        let salt = match domain {
            Domain::Toto => 0x70_70,
            Domain::FourD => 0x4d_4d,
        };
        let mut rng = StdRng::seed_from_u64(self.seed ^ salt);
        let history = demo_history(domain, self.count, self.start, &mut rng);
        tracing::debug!(%domain, draws = history.len(), seed = self.seed, "historique de démonstration généré");
        Ok(history)
    }
}

/// Source principale, avec repli sur les données de démonstration si elle échoue ou est vide.
pub struct FallbackSource<P> {
    primary: P,
    demo: DemoSource,
}

impl<P: HistorySource> FallbackSource<P> {
    pub fn new(primary: P, demo: DemoSource) -> Self {
        Self { primary, demo }
    }
}

impl<P: HistorySource> HistorySource for FallbackSource<P> {
    fn load_history(&self, domain: Domain) -> Result<DrawHistory> {
        match self.primary.load_history(domain) {
            Ok(history) if !history.is_empty() => Ok(history),
            Ok(_) => {
                tracing::warn!(%domain, "aucun tirage enregistré, utilisation des données de démonstration");
                self.demo.load_history(domain)
            }
            Err(e) => {
                tracing::warn!(%domain, error = %e, "échec du chargement, utilisation des données de démonstration");
                self.demo.load_history(domain)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{insert_toto_draw, migrate};
    use crate::models::TotoDraw;

    struct Broken;

    impl HistorySource for Broken {
        fn load_history(&self, _domain: Domain) -> Result<DrawHistory> {
            anyhow::bail!("source indisponible")
        }
    }

    fn demo() -> DemoSource {
        DemoSource::new(12, 42, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    #[test]
    fn test_demo_source_domains() {
        let toto = demo().load_history(Domain::Toto).unwrap();
        let four_d = demo().load_history(Domain::FourD).unwrap();
        assert_eq!(toto.domain(), Domain::Toto);
        assert_eq!(four_d.domain(), Domain::FourD);
        assert_eq!(toto.len(), 12);
        assert!(toto.is_demo());
    }

    #[test]
    fn test_fallback_on_error() {
        let source = FallbackSource::new(Broken, demo());
        let history = source.load_history(Domain::Toto).unwrap();
        assert_eq!(history.len(), 12);
        assert!(history.is_demo());
    }

    #[test]
    fn test_fallback_on_empty_database() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let source = FallbackSource::new(SqliteSource::new(&conn), demo());
        assert!(source.load_history(Domain::FourD).unwrap().is_demo());
    }

    #[test]
    fn test_sqlite_source_preferred_when_filled() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let draw = TotoDraw::new("1", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), [1, 2, 3, 4, 5, 6], 7, false).unwrap();
        insert_toto_draw(&conn, &draw).unwrap();

        let source = FallbackSource::new(SqliteSource::new(&conn), demo());
        let history = source.load_history(Domain::Toto).unwrap();
        assert_eq!(history, DrawHistory::Toto(vec![draw]));
    }
}
