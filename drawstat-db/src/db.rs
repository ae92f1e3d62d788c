use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, Row};
use std::path::Path;

use crate::models::{Domain, DrawHistory, FourDDraw, FourDNumber, TotoDraw};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS toto_draws (
    draw_id       TEXT PRIMARY KEY,
    date          TEXT NOT NULL,
    n_1           INTEGER NOT NULL,
    n_2           INTEGER NOT NULL,
    n_3           INTEGER NOT NULL,
    n_4           INTEGER NOT NULL,
    n_5           INTEGER NOT NULL,
    n_6           INTEGER NOT NULL,
    additional    INTEGER NOT NULL,
    is_demo       INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS four_d_draws (
    draw_id       TEXT PRIMARY KEY,
    date          TEXT NOT NULL,
    first_prize   TEXT NOT NULL,
    second_prize  TEXT NOT NULL,
    third_prize   TEXT NOT NULL,
    starters      TEXT NOT NULL,
    consolation   TEXT NOT NULL,
    is_demo       INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_toto_date ON toto_draws(date);
CREATE INDEX IF NOT EXISTS idx_four_d_date ON four_d_draws(date);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("drawstat.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

pub fn insert_toto_draw(conn: &Connection, draw: &TotoDraw) -> Result<bool> {
    let w = &draw.winning;
    let changed = conn.execute(
        "INSERT OR IGNORE INTO toto_draws (draw_id, date, n_1, n_2, n_3, n_4, n_5, n_6, additional, is_demo)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        rusqlite::params![
            draw.draw_id,
            draw.date,
            w[0],
            w[1],
            w[2],
            w[3],
            w[4],
            w[5],
            draw.additional,
            draw.is_demo,
        ],
    ).with_context(|| format!("Échec de l'insertion du tirage Toto {}", draw.draw_id))?;
    Ok(changed > 0)
}

pub fn insert_four_d_draw(conn: &Connection, draw: &FourDDraw) -> Result<bool> {
    let starters = serde_json::to_string(&draw.starters)?;
    let consolation = serde_json::to_string(&draw.consolation)?;
    let changed = conn.execute(
        "INSERT OR IGNORE INTO four_d_draws (draw_id, date, first_prize, second_prize, third_prize, starters, consolation, is_demo)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            draw.draw_id,
            draw.date,
            draw.first.to_string(),
            draw.second.to_string(),
            draw.third.to_string(),
            starters,
            consolation,
            draw.is_demo,
        ],
    ).with_context(|| format!("Échec de l'insertion du tirage 4D {}", draw.draw_id))?;
    Ok(changed > 0)
}

/// Insère tout un historique ; retourne le nombre de tirages réellement ajoutés.
pub fn insert_history(conn: &Connection, history: &DrawHistory) -> Result<u32> {
    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;
    let mut inserted = 0u32;
    match history {
        DrawHistory::Toto(draws) => {
            for draw in draws {
                if insert_toto_draw(&tx, draw)? {
                    inserted += 1;
                }
            }
        }
        DrawHistory::FourD(draws) => {
            for draw in draws {
                if insert_four_d_draw(&tx, draw)? {
                    inserted += 1;
                }
            }
        }
    }
    tx.commit().context("Échec du commit")?;
    Ok(inserted)
}

fn toto_from_row(row: &Row<'_>) -> rusqlite::Result<TotoDraw> {
    Ok(TotoDraw {
        draw_id: row.get(0)?,
        date: row.get::<_, NaiveDate>(1)?,
        winning: [
            row.get::<_, u8>(2)?,
            row.get::<_, u8>(3)?,
            row.get::<_, u8>(4)?,
            row.get::<_, u8>(5)?,
            row.get::<_, u8>(6)?,
            row.get::<_, u8>(7)?,
        ],
        additional: row.get(8)?,
        is_demo: row.get(9)?,
    })
}

fn four_d_from_row(row: &Row<'_>) -> rusqlite::Result<FourDDraw> {
    fn number(row: &Row<'_>, idx: usize) -> rusqlite::Result<FourDNumber> {
        let raw: String = row.get(idx)?;
        raw.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    }
    fn numbers(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<FourDNumber>> {
        let raw: String = row.get(idx)?;
        serde_json::from_str(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    }

    Ok(FourDDraw {
        draw_id: row.get(0)?,
        date: row.get::<_, NaiveDate>(1)?,
        first: number(row, 2)?,
        second: number(row, 3)?,
        third: number(row, 4)?,
        starters: numbers(row, 5)?,
        consolation: numbers(row, 6)?,
        is_demo: row.get(7)?,
    })
}

pub fn fetch_last_toto_draws(conn: &Connection, limit: u32) -> Result<Vec<TotoDraw>> {
    let mut stmt = conn.prepare(
        "SELECT draw_id, date, n_1, n_2, n_3, n_4, n_5, n_6, additional, is_demo
         FROM toto_draws ORDER BY date DESC, CAST(draw_id AS INTEGER) DESC, draw_id DESC LIMIT ?1"
    )?;
    let draws = stmt.query_map([limit], toto_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn fetch_last_four_d_draws(conn: &Connection, limit: u32) -> Result<Vec<FourDDraw>> {
    let mut stmt = conn.prepare(
        "SELECT draw_id, date, first_prize, second_prize, third_prize, starters, consolation, is_demo
         FROM four_d_draws ORDER BY date DESC, CAST(draw_id AS INTEGER) DESC, draw_id DESC LIMIT ?1"
    )?;
    let draws = stmt.query_map([limit], four_d_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

/// Historique complet du jeu, du plus récent au plus ancien.
pub fn fetch_history(conn: &Connection, domain: Domain) -> Result<DrawHistory> {
    let n = count_draws(conn, domain)?;
    let history = match domain {
        Domain::Toto => DrawHistory::Toto(fetch_last_toto_draws(conn, n)?),
        Domain::FourD => DrawHistory::FourD(fetch_last_four_d_draws(conn, n)?),
    };
    Ok(history)
}

pub fn count_draws(conn: &Connection, domain: Domain) -> Result<u32> {
    let sql = match domain {
        Domain::Toto => "SELECT COUNT(*) FROM toto_draws",
        Domain::FourD => "SELECT COUNT(*) FROM four_d_draws",
    };
    let count: u32 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
