//! Constructeurs de tirages pour les tests (unitaires et d'intégration).

use chrono::NaiveDate;

use drawstat_db::models::{FourDDraw, FourDNumber, TotoDraw};

fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// Tirage Toto non validé : au test de fournir des numéros cohérents.
pub fn toto_draw(winning: [u8; 6], additional: u8) -> TotoDraw {
    TotoDraw {
        draw_id: String::new(),
        date: test_date(),
        winning,
        additional,
        is_demo: false,
    }
}

/// Tirage 4D à partir des trois prix classés ; les prix secondaires valent 0000.
pub fn four_d_draw(first: &str, second: &str, third: &str) -> FourDDraw {
    let parse = |s: &str| s.parse::<FourDNumber>().unwrap_or_default();
    FourDDraw {
        draw_id: String::new(),
        date: test_date(),
        first: parse(first),
        second: parse(second),
        third: parse(third),
        starters: vec![FourDNumber::default(); 10],
        consolation: vec![FourDNumber::default(); 10],
        is_demo: false,
    }
}
