use std::fmt;
use std::str::FromStr;

use super::scorecard::{Approach, Section, normalize};

pub const RAIL_TRICKS: &[&str] = &[
    "Ride On",
    "Ollie On",
    "Transfer",
    "Box 2 Rail",
    "Hip Transfer",
    "Wall-Ride",
];

pub const HEELSIDE_AIR_TRICKS: &[&str] = &["Raley", "Backroll", "Frontflip", "Bel-Air"];
pub const TOESIDE_AIR_TRICKS: &[&str] = &["Raley", "Frontroll", "Backroll", "Egg-Roll"];

pub const HEELSIDE_FLIPS: &[&str] = &["Tantrum", "Backroll", "Frontflip"];
pub const TOESIDE_FLIPS: &[&str] = &["Frontroll", "Backroll", "Frontflip"];

pub const SPIN_DEGREES: &[u16] = &[0, 180, 360, 540, 720, 900, 1080, 1260, 1440];
pub const RAIL_SPIN_DEGREES: &[u16] = &[0, 90, 180, 270, 360, 450, 540, 630, 720];

pub const RED_MODIFIERS: &[&str] = &[
    "Repeat",
    "Sketchy",
    "Lazy",
    "Zeached",
    "Over/Under Rotated",
    "Wild",
    "Bailed",
    "Rushed",
    "911",
];
pub const BLUE_MODIFIERS: &[&str] = &[
    "Grabbed",
    "Ole",
    "Wrapped",
    "Boosted",
    "Stomped",
    "Tweaked",
    "High-Stakes",
    "Technical",
    "Innovative",
];
pub const RAIL_RED_MODIFIERS: &[&str] = &[
    "Repeat", "Sketchy", "Lazy", "Zeached", "Off-Early", "Wild", "Bailed", "Rushed", "911",
];
pub const RAIL_BLUE_MODIFIERS: &[&str] = &[
    "Pressed",
    "Switch-Up",
    "MJ'd",
    "HandDrag",
    "Stomped",
    "Tweaked",
    "High-Stakes",
    "Technical",
    "Innovative",
];

pub const DOUBLE_FLIP_TAG: &str = "Double Flip";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KickerTrick {
    Flip,
    Spin,
    DoubleFlip,
    Raley,
}

impl KickerTrick {
    pub const ALL: [KickerTrick; 4] = [
        KickerTrick::Flip,
        KickerTrick::Spin,
        KickerTrick::DoubleFlip,
        KickerTrick::Raley,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KickerTrick::Flip => "Flip",
            KickerTrick::Spin => "Spin",
            KickerTrick::DoubleFlip => DOUBLE_FLIP_TAG,
            KickerTrick::Raley => "Raley",
        }
    }
}

impl fmt::Display for KickerTrick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KickerTrick {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        KickerTrick::ALL
            .into_iter()
            .find(|t| normalize(t.as_str()) == wanted)
            .ok_or_else(|| format!("unknown kicker trick '{}'", s))
    }
}

pub fn air_tricks(approach: Approach) -> &'static [&'static str] {
    if approach.is_toeside() {
        TOESIDE_AIR_TRICKS
    } else {
        HEELSIDE_AIR_TRICKS
    }
}

pub fn flips(approach: Approach) -> &'static [&'static str] {
    if approach.is_toeside() {
        TOESIDE_FLIPS
    } else {
        HEELSIDE_FLIPS
    }
}

/// Penalty (red) and bonus (blue) tags offered for a section.
pub fn modifiers(section: Option<Section>) -> (&'static [&'static str], &'static [&'static str]) {
    match section {
        Some(Section::Rail) => (RAIL_RED_MODIFIERS, RAIL_BLUE_MODIFIERS),
        _ => (RED_MODIFIERS, BLUE_MODIFIERS),
    }
}

/// Case- and punctuation-insensitive lookup returning the canonical spelling.
pub fn lookup(options: &[&'static str], wanted: &str) -> Option<&'static str> {
    let wanted = normalize(wanted);
    options.iter().copied().find(|o| normalize(o) == wanted)
}
