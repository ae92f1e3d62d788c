use chrono::Datelike;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source d'aléa injectée dans l'échantillonneur et les stratégies.
pub trait RandomSource {
    /// Flottant uniforme dans [0, 1).
    fn next_f64(&mut self) -> f64;

    /// Indice uniforme dans [0, n). `n` doit être > 0.
    fn next_index(&mut self, n: usize) -> usize {
        let idx = (self.next_f64() * n as f64) as usize;
        idx.min(n.saturating_sub(1))
    }
}

impl RandomSource for StdRng {
    fn next_f64(&mut self) -> f64 {
        self.random::<f64>()
    }
}

/// Rejoue une suite fixe de valeurs, en boucle. Vide, elle rend toujours 0.0 :
/// une stratégie qui rejette certains tirages (`pattern`) finit alors en erreur.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<f64>,
    pos: usize,
}

impl ScriptedSource {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, pos: 0 }
    }
}

impl RandomSource for ScriptedSource {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn from_entropy() -> StdRng {
    StdRng::from_rng(&mut rand::rng())
}

/// Seed déterministe basé sur la date du jour (YYYYMMDD).
pub fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    let y = today.year() as u64;
    let m = today.month() as u64;
    let d = today.day() as u64;
    y * 10_000 + m * 100 + d
}

/// Mélange de Fisher-Yates piloté par `next_index`. `SliceRandom::shuffle` de `rand`
/// exige un `Rng` complet ; ici l'aléa passe par la seule interface [0, 1) injectée,
/// ce qui rend les tests rejouables avec `ScriptedSource`.
pub fn shuffle<T>(items: &mut [T], rng: &mut dyn RandomSource) {
    for i in (1..items.len()).rev() {
        let j = rng.next_index(i + 1);
        items.swap(i, j);
    }
}

/// `count` éléments distincts tirés uniformément dans `pool`, dans l'ordre du tirage.
pub fn sample_distinct<T: Copy>(pool: &[T], count: usize, rng: &mut dyn RandomSource) -> Vec<T> {
    let mut items = pool.to_vec();
    let count = count.min(items.len());
    // Fisher-Yates partiel : seules les `count` premières positions sont fixées
    for i in 0..count {
        let j = i + rng.next_index(items.len() - i);
        items.swap(i, j);
    }
    items.truncate(count);
    items
}
