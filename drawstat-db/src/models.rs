use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const TOTO_POOL: u8 = 49;
pub const TOTO_PICKS: usize = 6;
pub const FOUR_D_PRIZES: usize = 3;
pub const FOUR_D_SECONDARY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Toto,
    #[serde(rename = "4d")]
    FourD,
}

impl Domain {
    pub fn name(&self) -> &'static str {
        match self {
            Domain::Toto => "toto",
            Domain::FourD => "4d",
        }
    }

    /// Nombre de candidats par tirage : 49 numéros, ou 10 chiffres par position.
    pub fn pool_size(&self) -> usize {
        match self {
            Domain::Toto => TOTO_POOL as usize,
            Domain::FourD => 10,
        }
    }

    /// Numéros comptés par tirage : 6 boules, ou les 3 prix principaux.
    pub fn picks_per_draw(&self) -> usize {
        match self {
            Domain::Toto => TOTO_PICKS,
            Domain::FourD => FOUR_D_PRIZES,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Domain {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "toto" => Ok(Domain::Toto),
            "4d" | "fourd" | "four-d" => Ok(Domain::FourD),
            other => bail!("Jeu inconnu : '{}' (attendu : toto, 4d)", other),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("'{0}' n'est pas un numéro 4D (4 chiffres attendus)")]
pub struct FourDNumberError(pub String);

/// Numéro 4D : toujours quatre chiffres, zéros de tête conservés.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FourDNumber([u8; 4]);

impl FourDNumber {
    pub fn from_digits(digits: [u8; 4]) -> Result<Self, FourDNumberError> {
        if digits.iter().any(|&d| d > 9) {
            return Err(FourDNumberError(format!("{:?}", digits)));
        }
        Ok(Self(digits))
    }

    /// `value` doit être < 10000.
    pub fn from_value(value: u16) -> Result<Self, FourDNumberError> {
        if value > 9999 {
            return Err(FourDNumberError(value.to_string()));
        }
        Ok(Self([
            (value / 1000) as u8,
            (value / 100 % 10) as u8,
            (value / 10 % 10) as u8,
            (value % 10) as u8,
        ]))
    }

    pub fn digits(&self) -> [u8; 4] {
        self.0
    }

    pub fn value(&self) -> u16 {
        self.0.iter().fold(0u16, |acc, &d| acc * 10 + d as u16)
    }

    /// Vrai pour 0000, 1111, ..., 9999.
    pub fn is_uniform(&self) -> bool {
        self.0.iter().all(|&d| d == self.0[0])
    }
}

impl fmt::Display for FourDNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in self.0 {
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

impl FromStr for FourDNumber {
    type Err = FourDNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 4 || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(FourDNumberError(s.to_string()));
        }
        Ok(Self([
            bytes[0] - b'0',
            bytes[1] - b'0',
            bytes[2] - b'0',
            bytes[3] - b'0',
        ]))
    }
}

impl TryFrom<String> for FourDNumber {
    type Error = FourDNumberError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FourDNumber> for String {
    fn from(n: FourDNumber) -> Self {
        n.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotoDraw {
    pub draw_id: String,
    pub date: NaiveDate,
    pub winning: [u8; 6],
    pub additional: u8,
    pub is_demo: bool,
}

impl TotoDraw {
    pub fn new(
        draw_id: impl Into<String>,
        date: NaiveDate,
        winning: [u8; 6],
        additional: u8,
        is_demo: bool,
    ) -> Result<Self> {
        validate_toto(&winning, additional)?;
        Ok(Self {
            draw_id: draw_id.into(),
            date,
            winning,
            additional,
            is_demo,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FourDDraw {
    pub draw_id: String,
    pub date: NaiveDate,
    pub first: FourDNumber,
    pub second: FourDNumber,
    pub third: FourDNumber,
    pub starters: Vec<FourDNumber>,
    pub consolation: Vec<FourDNumber>,
    pub is_demo: bool,
}

impl FourDDraw {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        draw_id: impl Into<String>,
        date: NaiveDate,
        first: FourDNumber,
        second: FourDNumber,
        third: FourDNumber,
        starters: Vec<FourDNumber>,
        consolation: Vec<FourDNumber>,
        is_demo: bool,
    ) -> Result<Self> {
        validate_four_d(&starters, &consolation)?;
        Ok(Self {
            draw_id: draw_id.into(),
            date,
            first,
            second,
            third,
            starters,
            consolation,
            is_demo,
        })
    }

    /// Les trois prix classés, dans l'ordre 1er, 2e, 3e.
    pub fn prizes(&self) -> [FourDNumber; 3] {
        [self.first, self.second, self.third]
    }
}

/// Historique d'un seul jeu. Index 0 = tirage le plus récent.
/// L'ordre fourni par l'appelant est conservé tel quel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "domain", content = "draws")]
pub enum DrawHistory {
    #[serde(rename = "toto")]
    Toto(Vec<TotoDraw>),
    #[serde(rename = "4d")]
    FourD(Vec<FourDDraw>),
}

impl DrawHistory {
    pub fn empty(domain: Domain) -> Self {
        match domain {
            Domain::Toto => DrawHistory::Toto(Vec::new()),
            Domain::FourD => DrawHistory::FourD(Vec::new()),
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            DrawHistory::Toto(_) => Domain::Toto,
            DrawHistory::FourD(_) => Domain::FourD,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DrawHistory::Toto(draws) => draws.len(),
            DrawHistory::FourD(draws) => draws.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_demo(&self) -> bool {
        match self {
            DrawHistory::Toto(draws) => draws.iter().any(|d| d.is_demo),
            DrawHistory::FourD(draws) => draws.iter().any(|d| d.is_demo),
        }
    }
}

pub fn validate_toto(winning: &[u8; 6], additional: u8) -> Result<()> {
    for &n in winning {
        if !(1..=TOTO_POOL).contains(&n) {
            bail!("Numéro {} hors limites (1-{})", n, TOTO_POOL);
        }
    }
    if !(1..=TOTO_POOL).contains(&additional) {
        bail!("Numéro additionnel {} hors limites (1-{})", additional, TOTO_POOL);
    }
    for i in 0..winning.len() {
        for j in (i + 1)..winning.len() {
            if winning[i] == winning[j] {
                bail!("Numéro en double : {}", winning[i]);
            }
        }
    }
    if winning.contains(&additional) {
        bail!("Le numéro additionnel {} figure déjà parmi les gagnants", additional);
    }
    Ok(())
}

pub fn validate_four_d(starters: &[FourDNumber], consolation: &[FourDNumber]) -> Result<()> {
    if starters.len() != FOUR_D_SECONDARY {
        bail!("{} prix starter attendus, {} reçus", FOUR_D_SECONDARY, starters.len());
    }
    if consolation.len() != FOUR_D_SECONDARY {
        bail!("{} prix de consolation attendus, {} reçus", FOUR_D_SECONDARY, consolation.len());
    }
    Ok(())
}
