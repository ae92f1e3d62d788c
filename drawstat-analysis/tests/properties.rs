use std::collections::BTreeMap;

use proptest::prelude::*;

use drawstat_analysis::context::AnalysisContext;
use drawstat_analysis::frequency::analyze_frequency;
use drawstat_analysis::gap::analyze_gaps;
use drawstat_analysis::rng::seeded;
use drawstat_analysis::sampler::weighted_pick;
use drawstat_analysis::strategy::{
    generate_selection, FourDStrategy, Picks, Strategy as Selection, TotoStrategy,
};
use drawstat_analysis::testing::toto_draw;
use drawstat_db::models::{DrawHistory, TotoDraw};

fn arb_toto_draw() -> impl Strategy<Value = TotoDraw> {
    proptest::sample::subsequence((1u8..=49).collect::<Vec<_>>(), 7).prop_map(|mut numbers| {
        let additional = numbers.pop().unwrap_or(49);
        let mut winning = [0u8; 6];
        winning.copy_from_slice(&numbers[..6]);
        toto_draw(winning, additional)
    })
}

fn arb_toto_history() -> impl Strategy<Value = Vec<TotoDraw>> {
    proptest::collection::vec(arb_toto_draw(), 0..40)
}

proptest! {
    #[test]
    fn prop_counts_sum_to_six_per_draw(draws in arb_toto_history()) {
        let n = draws.len();
        let freq = analyze_frequency(&DrawHistory::Toto(draws));
        let total: u32 = freq.candidates.iter().map(|c| c.count).sum();
        prop_assert_eq!(total as usize, 6 * n);
    }

    #[test]
    fn prop_deviations_normalized(draws in arb_toto_history()) {
        let freq = analyze_frequency(&DrawHistory::Toto(draws));
        prop_assert!(freq.candidates.iter().all(|c| (-1.0..=1.0).contains(&c.deviation)));
        if freq.candidates.iter().any(|c| c.deviation != 0.0) {
            prop_assert!(freq.candidates.iter().any(|c| (c.deviation.abs() - 1.0).abs() < 1e-12));
        }
    }

    #[test]
    fn prop_gap_is_first_appearance_index(draws in arb_toto_history()) {
        let gaps = analyze_gaps(&draws);
        for n in 1u8..=49 {
            let expected = draws
                .iter()
                .position(|d| d.winning.contains(&n))
                .unwrap_or(draws.len());
            prop_assert_eq!(gaps.gap(n) as usize, expected);
        }
    }

    #[test]
    fn prop_most_overdue_sorted(draws in arb_toto_history()) {
        let gaps = analyze_gaps(&draws);
        for pair in gaps.most_overdue.windows(2) {
            prop_assert!(pair[0].gap >= pair[1].gap);
            if pair[0].gap == pair[1].gap {
                prop_assert!(pair[0].number < pair[1].number);
            }
        }
    }

    #[test]
    fn prop_weighted_pick_distinct_positive(
        weights in proptest::collection::btree_map(0u8..60, 0.0f64..10.0, 1..40),
        seed in any::<u64>(),
    ) {
        let positive = weights.values().filter(|&&w| w > 0.0).count();
        let k = positive.min(6);
        let picked = weighted_pick(&weights, k, &mut seeded(seed)).unwrap();
        prop_assert_eq!(picked.len(), k);
        let mut unique = picked.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), k);
        prop_assert!(picked.iter().all(|p| weights[p] > 0.0));
    }

    #[test]
    fn prop_every_toto_strategy_valid(draws in arb_toto_history(), seed in any::<u64>()) {
        let ctx = AnalysisContext::from_history(&DrawHistory::Toto(draws));
        let mut rng = seeded(seed);
        for strategy in TotoStrategy::ALL {
            let out = generate_selection(Selection::Toto(strategy), &ctx, &mut rng).unwrap();
            match out.picks {
                Picks::Toto(numbers) => {
                    prop_assert!(numbers.windows(2).all(|w| w[0] < w[1]));
                    prop_assert!(numbers.iter().all(|n| (1..=49).contains(n)));
                }
                Picks::FourD(_) => prop_assert!(false, "grille Toto attendue"),
            }
        }
    }

    #[test]
    fn prop_pattern_never_uniform(seed in any::<u64>()) {
        let ctx = AnalysisContext::empty(drawstat_db::models::Domain::FourD);
        let out = generate_selection(Selection::FourD(FourDStrategy::Pattern), &ctx, &mut seeded(seed)).unwrap();
        match out.picks {
            Picks::FourD(number) => prop_assert!(!number.is_uniform()),
            Picks::Toto(_) => prop_assert!(false, "numéro 4D attendu"),
        }
    }
}

#[test]
fn test_nine_to_one_ratio() {
    let weights = BTreeMap::from([(1u8, 9.0), (2u8, 1.0)]);
    let mut rng = seeded(2024);
    let trials = 10_000;
    let heavy = (0..trials)
        .filter(|_| weighted_pick(&weights, 1, &mut rng).unwrap() == vec![1])
        .count();
    let share = heavy as f64 / trials as f64;
    assert!((share - 0.9).abs() < 0.02, "part observée {}", share);
}

#[test]
fn test_hot_fallback_still_valid_grid() {
    // Seuls 1..=5 dépassent le seuil « chaud »
    let draws: Vec<TotoDraw> = (0..12u8).map(|i| toto_draw([1, 2, 3, 4, 5, 10 + i], 49)).collect();
    let ctx = AnalysisContext::from_history(&DrawHistory::Toto(draws));
    let out = generate_selection(Selection::Toto(TotoStrategy::Hot), &ctx, &mut seeded(1)).unwrap();
    assert!(out.fallback);
    match out.picks {
        Picks::Toto(numbers) => assert!(numbers.windows(2).all(|w| w[0] < w[1])),
        Picks::FourD(_) => panic!("grille Toto attendue"),
    }
}

#[test]
fn test_seven_in_every_draw() {
    let pool: Vec<u8> = (1..=49).filter(|&n| n != 7).collect();
    let draws: Vec<TotoDraw> = (0..10usize)
        .map(|i| {
            let mut winning = [7u8; 6];
            for (k, slot) in winning.iter_mut().skip(1).enumerate() {
                *slot = pool[(i * 5 + k) % pool.len()];
            }
            winning.sort();
            toto_draw(winning, pool[(i * 5 + 5) % pool.len()])
        })
        .collect();
    let freq = analyze_frequency(&DrawHistory::Toto(draws));
    assert_eq!(freq.count(7), 10);
    assert!(freq.hot_numbers().contains(&7));
    assert_eq!(freq.deviation(7), 1.0);
}

#[test]
fn test_absent_forty_two_ranked() {
    let pool: Vec<u8> = (1..=49).filter(|&n| n != 42).collect();
    let draws: Vec<TotoDraw> = (0..20usize)
        .map(|i| {
            let mut winning = [0u8; 6];
            for (k, slot) in winning.iter_mut().enumerate() {
                *slot = pool[(i * 6 + k) % pool.len()];
            }
            toto_draw(winning, 42)
        })
        .collect();
    let gaps = analyze_gaps(&draws);
    assert_eq!(gaps.gap(42), 20);
    let pos = gaps.most_overdue.iter().position(|g| g.number == 42).unwrap();
    assert!(gaps.most_overdue[..pos].iter().all(|g| g.gap >= 20));
}
