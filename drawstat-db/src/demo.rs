use chrono::{Days, NaiveDate};
use rand::Rng;
use rand::seq::index;

use crate::models::{Domain, DrawHistory, FourDDraw, FourDNumber, TotoDraw, FOUR_D_SECONDARY, TOTO_POOL};

/// Un tirage tous les 3 jours en remontant depuis `start`.
const DAYS_BETWEEN_DRAWS: u64 = 3;
const TOTO_FIRST_ID: usize = 4200;
const FOUR_D_FIRST_ID: usize = 3700;

fn draw_date(start: NaiveDate, i: usize) -> NaiveDate {
    start
        .checked_sub_days(Days::new(i as u64 * DAYS_BETWEEN_DRAWS))
        .unwrap_or(NaiveDate::MIN)
}

fn random_four_d<R: Rng + ?Sized>(rng: &mut R) -> FourDNumber {
    let digits = [
        rng.random_range(0..10u8),
        rng.random_range(0..10u8),
        rng.random_range(0..10u8),
        rng.random_range(0..10u8),
    ];
    FourDNumber::from_digits(digits).unwrap_or_default()
}

pub fn demo_toto_draws<R: Rng + ?Sized>(count: usize, start: NaiveDate, rng: &mut R) -> Vec<TotoDraw> {
    (0..count)
        .map(|i| {
            let mut winning = [0u8; 6];
            for (slot, idx) in winning.iter_mut().zip(index::sample(rng, TOTO_POOL as usize, 6)) {
                *slot = idx as u8 + 1;
            }
            winning.sort();

            let additional = loop {
                let n = rng.random_range(1..=TOTO_POOL);
                if !winning.contains(&n) {
                    break n;
                }
            };

            TotoDraw {
                draw_id: (TOTO_FIRST_ID + count - i).to_string(),
                date: draw_date(start, i),
                winning,
                additional,
                is_demo: true,
            }
        })
        .collect()
}

pub fn demo_four_d_draws<R: Rng + ?Sized>(count: usize, start: NaiveDate, rng: &mut R) -> Vec<FourDDraw> {
    (0..count)
        .map(|i| FourDDraw {
            draw_id: (FOUR_D_FIRST_ID + count - i).to_string(),
            date: draw_date(start, i),
            first: random_four_d(rng),
            second: random_four_d(rng),
            third: random_four_d(rng),
            starters: (0..FOUR_D_SECONDARY).map(|_| random_four_d(rng)).collect(),
            consolation: (0..FOUR_D_SECONDARY).map(|_| random_four_d(rng)).collect(),
            is_demo: true,
        })
        .collect()
}

pub fn demo_history<R: Rng + ?Sized>(domain: Domain, count: usize, start: NaiveDate, rng: &mut R) -> DrawHistory {
    match domain {
        Domain::Toto => DrawHistory::Toto(demo_toto_draws(count, start, rng)),
        Domain::FourD => DrawHistory::FourD(demo_four_d_draws(count, start, rng)),
    }
}
