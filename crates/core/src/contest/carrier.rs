use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Slot = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BibColor {
    Red,
    Blue,
    Green,
    Orange,
    Purple,
}

impl BibColor {
    pub const ALL: [BibColor; 5] = [
        BibColor::Red,
        BibColor::Blue,
        BibColor::Green,
        BibColor::Orange,
        BibColor::Purple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BibColor::Red => "red",
            BibColor::Blue => "blue",
            BibColor::Green => "green",
            BibColor::Orange => "orange",
            BibColor::Purple => "purple",
        }
    }
}

impl fmt::Display for BibColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BibColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BibColor::ALL
            .into_iter()
            .find(|color| color.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown bib color '{}'", s))
    }
}

/// Scopes every scorecard to one occupancy of a carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    pub number: Slot,
    #[serde(default)]
    pub rider_id: Option<String>,
    #[serde(default)]
    pub bib_color: Option<BibColor>,
    pub session: SessionToken,
}

impl Carrier {
    pub fn new(number: Slot) -> Self {
        Self {
            number,
            rider_id: None,
            bib_color: None,
            session: SessionToken::generate(),
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.rider_id.is_some()
    }

    pub fn carries(&self, rider_id: &str) -> bool {
        self.rider_id.as_deref() == Some(rider_id)
    }
}
