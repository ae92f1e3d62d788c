use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use drawstat_db::rusqlite::Connection;
use std::path::Path;

use drawstat_db::db::{insert_four_d_draw, insert_toto_draw};
use drawstat_db::models::{Domain, FourDDraw, FourDNumber, TotoDraw, FOUR_D_SECONDARY};

/// Accepte `AAAA-MM-JJ` ou `JJ/MM/AAAA`.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .with_context(|| format!("Format de date invalide: '{}'", raw))
}

fn field(record: &csv::StringRecord, idx: usize) -> Result<&str> {
    record
        .get(idx)
        .map(str::trim)
        .with_context(|| format!("Champ manquant à l'index {}", idx))
}

fn field_u8(record: &csv::StringRecord, idx: usize) -> Result<u8> {
    let s = field(record, idx)?;
    s.parse::<u8>()
        .with_context(|| format!("Impossible de parser '{}' (index {})", s, idx))
}

fn field_four_d(record: &csv::StringRecord, idx: usize) -> Result<FourDNumber> {
    let s = field(record, idx)?;
    Ok(s.parse::<FourDNumber>()?)
}

/// `draw_id,date,n1,n2,n3,n4,n5,n6,additional`
fn parse_toto_record(record: &csv::StringRecord) -> Result<TotoDraw> {
    let draw_id = field(record, 0)?;
    let date = parse_date(field(record, 1)?)?;
    let mut winning = [0u8; 6];
    for (i, slot) in winning.iter_mut().enumerate() {
        *slot = field_u8(record, 2 + i)?;
    }
    winning.sort();
    let additional = field_u8(record, 8)?;
    TotoDraw::new(draw_id, date, winning, additional, false)
}

/// `draw_id,date,first,second,third,starter1..starter10,consolation1..consolation10`
fn parse_four_d_record(record: &csv::StringRecord) -> Result<FourDDraw> {
    let expected = 5 + 2 * FOUR_D_SECONDARY;
    if record.len() < expected {
        bail!("{} colonnes attendues, {} trouvées", expected, record.len());
    }
    let draw_id = field(record, 0)?;
    let date = parse_date(field(record, 1)?)?;
    let first = field_four_d(record, 2)?;
    let second = field_four_d(record, 3)?;
    let third = field_four_d(record, 4)?;
    let starters = (5..5 + FOUR_D_SECONDARY)
        .map(|idx| field_four_d(record, idx))
        .collect::<Result<Vec<_>>>()?;
    let consolation = (5 + FOUR_D_SECONDARY..expected)
        .map(|idx| field_four_d(record, idx))
        .collect::<Result<Vec<_>>>()?;
    FourDDraw::new(draw_id, date, first, second, third, starters, consolation, false)
}

fn insert_record(conn: &Connection, domain: Domain, record: &csv::StringRecord) -> Result<bool> {
    match domain {
        Domain::Toto => insert_toto_draw(conn, &parse_toto_record(record)?),
        Domain::FourD => insert_four_d_draw(conn, &parse_four_d_record(record)?),
    }
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, domain: Domain, path: &Path) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();

    for record_result in reader.records() {
        result.total_records += 1;
        let line = result.total_records;
        match record_result {
            Ok(record) => match insert_record(&tx, domain, &record) {
                Ok(true) => result.inserted += 1,
                Ok(false) => result.skipped += 1,
                Err(e) => {
                    tracing::warn!(line, error = %e, "ligne ignorée");
                    result.errors += 1;
                }
            },
            Err(e) => {
                tracing::warn!(line, error = %e, "erreur de lecture");
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    tracing::info!(%domain, inserted = result.inserted, skipped = result.skipped, errors = result.errors, "import terminé");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawstat_db::db::{count_draws, fetch_history, migrate};
    use drawstat_db::models::DrawHistory;
    use std::io::Write;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-02-17").unwrap(), NaiveDate::from_ymd_opt(2024, 2, 17).unwrap());
        assert_eq!(parse_date("17/02/2024").unwrap(), NaiveDate::from_ymd_opt(2024, 2, 17).unwrap());
        assert!(parse_date("2024/17/02").is_err());
    }

    #[test]
    fn test_import_toto_counts_errors_and_duplicates() {
        let file = csv_file(
            "draw_id,date,n1,n2,n3,n4,n5,n6,additional\n\
             3900,2024-01-04,12,3,45,7,22,31,9\n\
             3901,08/01/2024,1,2,3,4,5,6,7\n\
             3901,08/01/2024,1,2,3,4,5,6,7\n\
             3902,2024-01-11,1,1,3,4,5,6,7\n",
        );
        let conn = memory_db();
        let result = import_csv(&conn, Domain::Toto, file.path()).unwrap();
        assert_eq!(result.total_records, 4);
        assert_eq!(result.inserted, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors, 1);

        match fetch_history(&conn, Domain::Toto).unwrap() {
            DrawHistory::Toto(draws) => {
                assert_eq!(draws[0].draw_id, "3901");
                assert_eq!(draws[1].winning, [3, 7, 12, 22, 31, 45]);
            }
            DrawHistory::FourD(_) => panic!("mauvais domaine"),
        }
    }

    #[test]
    fn test_import_four_d_keeps_leading_zeros() {
        let secondary: Vec<String> = (0..20).map(|i| format!("{:04}", i * 7)).collect();
        let header: Vec<String> = (1..=10)
            .map(|i| format!("starter{}", i))
            .chain((1..=10).map(|i| format!("consolation{}", i)))
            .collect();
        let content = format!(
            "draw_id,date,first,second,third,{}\n5100,2024-03-02,0042,1234,9000,{}\n5101,2024-03-03,0042,1234\n",
            header.join(","),
            secondary.join(",")
        );
        let file = csv_file(&content);
        let conn = memory_db();
        let result = import_csv(&conn, Domain::FourD, file.path()).unwrap();
        assert_eq!(result.inserted, 1);
        assert_eq!(result.errors, 1);
        assert_eq!(count_draws(&conn, Domain::FourD).unwrap(), 1);

        match fetch_history(&conn, Domain::FourD).unwrap() {
            DrawHistory::FourD(draws) => {
                assert_eq!(draws[0].first.to_string(), "0042");
                assert_eq!(draws[0].starters[0].to_string(), "0000");
            }
            DrawHistory::Toto(_) => panic!("mauvais domaine"),
        }
    }
}
