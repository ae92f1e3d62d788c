use std::collections::BTreeMap;

use crate::rng::RandomSource;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplerError {
    #[error("{requested} candidats demandés mais seulement {available} ont un poids positif")]
    Unattainable { requested: usize, available: usize },
    #[error("poids invalide : {weight}")]
    InvalidWeight { weight: f64 },
    #[error("poids total épuisé après {picked} tirages sur {requested}")]
    Exhausted { picked: usize, requested: usize },
}

/// Tire `count` candidats distincts sans remise.
///
/// À chaque tirage, la probabilité d'un candidat est proportionnelle à son poids
/// parmi ceux qui restent. Les candidats sont parcourus dans l'ordre croissant des clés.
/// La carte de l'appelant n'est jamais modifiée : on travaille sur une copie locale.
pub fn weighted_pick<K: Copy + Ord>(
    weights: &BTreeMap<K, f64>,
    count: usize,
    rng: &mut dyn RandomSource,
) -> Result<Vec<K>, SamplerError> {
    if let Some(&weight) = weights.values().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(SamplerError::InvalidWeight { weight });
    }

    // Les poids nuls ne peuvent jamais être tirés
    let mut available: Vec<(K, f64)> = weights
        .iter()
        .filter(|(_, &w)| w > 0.0)
        .map(|(&k, &w)| (k, w))
        .collect();

    if count > available.len() {
        return Err(SamplerError::Unattainable {
            requested: count,
            available: available.len(),
        });
    }

    let mut selected = Vec::with_capacity(count);

    while selected.len() < count {
        let total: f64 = available.iter().map(|(_, w)| w).sum();
        if !(total > 0.0) {
            return Err(SamplerError::Exhausted {
                picked: selected.len(),
                requested: count,
            });
        }

        let mut remainder = rng.next_f64() * total;
        // Arrondi flottant : si on dépasse la fin, on prend le dernier
        let mut idx = available.len() - 1;
        for (i, (_, w)) in available.iter().enumerate() {
            remainder -= w;
            if remainder <= 0.0 {
                idx = i;
                break;
            }
        }

        let (candidate, _) = available.remove(idx);
        selected.push(candidate);
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{seeded, ScriptedSource};

    fn uniform(n: u8) -> BTreeMap<u8, f64> {
        (1..=n).map(|k| (k, 1.0)).collect()
    }

    #[test]
    fn test_exact_count_distinct() {
        let weights = uniform(49);
        let mut rng = seeded(42);
        for count in [1, 6, 20, 49] {
            let picks = weighted_pick(&weights, count, &mut rng).unwrap();
            assert_eq!(picks.len(), count);
            let mut sorted = picks.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), count, "doublons dans {:?}", picks);
        }
    }

    #[test]
    fn test_zero_weights_never_picked() {
        let mut weights = uniform(10);
        weights.insert(3, 0.0);
        weights.insert(7, 0.0);
        let mut rng = seeded(1);
        for _ in 0..200 {
            let picks = weighted_pick(&weights, 8, &mut rng).unwrap();
            assert!(!picks.contains(&3) && !picks.contains(&7));
        }
    }

    #[test]
    fn test_zero_draw_skips_leading_zero_weight() {
        let weights: BTreeMap<u8, f64> = [(1, 0.0), (2, 5.0), (3, 1.0)].into_iter().collect();
        let mut rng = ScriptedSource::new(vec![0.0]);
        assert_eq!(weighted_pick(&weights, 1, &mut rng).unwrap(), vec![2]);
    }

    #[test]
    fn test_walk_follows_key_order() {
        let weights: BTreeMap<u8, f64> = [(1, 1.0), (2, 1.0), (3, 2.0)].into_iter().collect();
        // total = 4 ; r = 0.6 * 4 = 2.4 → 1 (1.4), 2 (0.4), 3 (-1.6)
        let mut rng = ScriptedSource::new(vec![0.6]);
        assert_eq!(weighted_pick(&weights, 1, &mut rng).unwrap(), vec![3]);
        // r = 0.25 * 4 = 1.0 → 1 (0.0) : la frontière appartient au premier
        let mut rng = ScriptedSource::new(vec![0.25]);
        assert_eq!(weighted_pick(&weights, 1, &mut rng).unwrap(), vec![1]);
    }

    #[test]
    fn test_removal_renormalizes() {
        let weights: BTreeMap<u8, f64> = [(1, 3.0), (2, 1.0)].into_iter().collect();
        // 1er tirage : r = 0.1 * 4 → 1 ; 2e tirage : seul 2 reste
        let mut rng = ScriptedSource::new(vec![0.1, 0.99]);
        assert_eq!(weighted_pick(&weights, 2, &mut rng).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_caller_weights_untouched() {
        let weights = uniform(6);
        let before = weights.clone();
        weighted_pick(&weights, 6, &mut seeded(5)).unwrap();
        assert_eq!(weights, before);
    }

    #[test]
    fn test_unattainable_count() {
        let mut weights = uniform(5);
        weights.insert(6, 0.0);
        let err = weighted_pick(&weights, 6, &mut seeded(0)).unwrap_err();
        assert_eq!(err, SamplerError::Unattainable { requested: 6, available: 5 });
    }

    #[test]
    fn test_invalid_weights() {
        let weights: BTreeMap<u8, f64> = [(1, 1.0), (2, -0.5)].into_iter().collect();
        assert!(matches!(
            weighted_pick(&weights, 1, &mut seeded(0)),
            Err(SamplerError::InvalidWeight { .. })
        ));
        let weights: BTreeMap<u8, f64> = [(1, f64::NAN)].into_iter().collect();
        assert!(matches!(
            weighted_pick(&weights, 1, &mut seeded(0)),
            Err(SamplerError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_nine_to_one_ratio() {
        let weights: BTreeMap<u8, f64> = [(1, 9.0), (2, 1.0)].into_iter().collect();
        let mut rng = seeded(2024);
        let trials = 10_000;
        let wins = (0..trials)
            .filter(|_| weighted_pick(&weights, 1, &mut rng).unwrap() == vec![1])
            .count();
        let share = wins as f64 / trials as f64;
        assert!((share - 0.9).abs() < 0.02, "part observée : {share}");
    }
}
