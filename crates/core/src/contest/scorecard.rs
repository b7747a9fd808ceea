use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::carrier::SessionToken;
use crate::api::timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    Kicker,
    Rail,
    #[serde(rename = "Air Trick")]
    AirTrick,
    Pass,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Kicker,
        Section::Rail,
        Section::AirTrick,
        Section::Pass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Kicker => "Kicker",
            Section::Rail => "Rail",
            Section::AirTrick => "Air Trick",
            Section::Pass => "Pass",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Approach {
    Heelside,
    Toeside,
    #[serde(rename = "Switch Toeside")]
    SwitchToeside,
    #[serde(rename = "Switch Heelside")]
    SwitchHeelside,
}

impl Approach {
    pub const REGULAR: [Approach; 4] = [
        Approach::Heelside,
        Approach::Toeside,
        Approach::SwitchToeside,
        Approach::SwitchHeelside,
    ];

    pub const GOOFY: [Approach; 4] = [
        Approach::Toeside,
        Approach::Heelside,
        Approach::SwitchHeelside,
        Approach::SwitchToeside,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Approach::Heelside => "Heelside",
            Approach::Toeside => "Toeside",
            Approach::SwitchToeside => "Switch Toeside",
            Approach::SwitchHeelside => "Switch Heelside",
        }
    }

    pub fn is_toeside(&self) -> bool {
        matches!(self, Approach::Toeside | Approach::SwitchToeside)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpinDirection {
    Backside,
    Frontside,
}

impl SpinDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpinDirection::Backside => "Backside",
            SpinDirection::Frontside => "Frontside",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Landed,
    Fell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreField {
    Division,
    Creativity,
    Execution,
    Difficulty,
}

impl ScoreField {
    pub const ALL: [ScoreField; 4] = [
        ScoreField::Division,
        ScoreField::Execution,
        ScoreField::Creativity,
        ScoreField::Difficulty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreField::Division => "Division",
            ScoreField::Creativity => "Creativity",
            ScoreField::Execution => "Execution",
            ScoreField::Difficulty => "Difficulty",
        }
    }
}

macro_rules! display_and_parse {
    ($ty:ty, $all:expr, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize(s);
                $all.into_iter()
                    .find(|v| normalize(v.as_str()) == wanted)
                    .ok_or_else(|| format!("unknown {} '{}'", $what, s))
            }
        }
    };
}

display_and_parse!(Section, Section::ALL, "section");
display_and_parse!(Approach, Approach::REGULAR, "approach");
display_and_parse!(ScoreField, ScoreField::ALL, "score field");
display_and_parse!(
    SpinDirection,
    [SpinDirection::Backside, SpinDirection::Frontside],
    "spin direction"
);

pub(crate) fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A finished, submittable judgement of one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(with = "timestamp")]
    pub date: DateTime<Utc>,
    pub section: Section,
    pub division: f64,
    pub execution: f64,
    pub creativity: f64,
    pub difficulty: f64,
    pub score: f64,
    pub landed: bool,
    pub approach: Approach,
    #[serde(rename = "trickType")]
    pub trick_type: String,
    pub spin: String,
    #[serde(rename = "spinDirection")]
    pub spin_direction: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub park: Option<String>,
    #[serde(default)]
    pub rider: Option<String>,
    #[serde(default)]
    pub session: Option<SessionToken>,
    #[serde(default)]
    pub judge: Option<String>,
}

/// Page of scorecards as served by `/scorecards`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScorecardPage {
    pub data: Vec<Scorecard>,
    #[serde(default)]
    pub cursor: String,
}

/// In-progress judgement. Sub-scores stay on the judge-facing 0–10 scale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScorecardDraft {
    pub section: Option<Section>,
    pub approach: Option<Approach>,
    pub trick_type: String,
    pub spin: String,
    pub spin_direction: String,
    pub modifiers: Vec<String>,
    pub division: f64,
    pub creativity: f64,
    pub execution: f64,
    pub difficulty: f64,
}

impl ScorecardDraft {
    pub fn set_score(&mut self, field: ScoreField, value: f64) {
        if value.is_nan() {
            return;
        }
        let value = value.clamp(0.0, 10.0);
        match field {
            ScoreField::Division => self.division = value,
            ScoreField::Creativity => self.creativity = value,
            ScoreField::Execution => self.execution = value,
            ScoreField::Difficulty => self.difficulty = value,
        }
    }

    pub fn score(&self, field: ScoreField) -> f64 {
        match field {
            ScoreField::Division => self.division,
            ScoreField::Creativity => self.creativity,
            ScoreField::Execution => self.execution,
            ScoreField::Difficulty => self.difficulty,
        }
    }

    /// Returns whether the tag is present after toggling.
    pub fn toggle_modifier(&mut self, tag: &str) -> bool {
        if let Some(pos) = self.modifiers.iter().position(|m| m == tag) {
            self.modifiers.remove(pos);
            false
        } else {
            self.modifiers.push(tag.to_string());
            true
        }
    }

    pub fn set_spin(&mut self, degrees: u16, direction: SpinDirection) {
        self.spin = degrees.to_string();
        self.spin_direction = direction.as_str().to_string();
    }

    pub fn append_spin(&mut self, degrees: u16, direction: SpinDirection) {
        if self.spin.is_empty() {
            self.spin = degrees.to_string();
        } else {
            self.spin = format!("{}, {}", self.spin, degrees);
        }
        if self.spin_direction.is_empty() {
            self.spin_direction = direction.as_str().to_string();
        } else {
            self.spin_direction = format!("{}, {}", self.spin_direction, direction.as_str());
        }
    }
}

/// Sub-scores after scaling to the stored 0–100 range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledScores {
    pub division: f64,
    pub execution: f64,
    pub creativity: f64,
    pub difficulty: f64,
    pub score: f64,
}

impl ScaledScores {
    pub fn compute(draft: &ScorecardDraft, outcome: Outcome) -> Self {
        let scale = |v: f64| round2(v * 10.0);
        let division = scale(draft.division);
        let creativity = scale(draft.creativity);
        let difficulty = scale(draft.difficulty);
        let execution = match outcome {
            Outcome::Landed => scale(draft.execution),
            Outcome::Fell => 0.0,
        };
        let score = round2((execution + creativity + difficulty) / 3.0);
        Self {
            division,
            execution,
            creativity,
            difficulty,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(creativity: f64, execution: f64, difficulty: f64) -> ScorecardDraft {
        let mut d = ScorecardDraft::default();
        d.set_score(ScoreField::Creativity, creativity);
        d.set_score(ScoreField::Execution, execution);
        d.set_score(ScoreField::Difficulty, difficulty);
        d
    }

    #[test]
    fn landed_scores_scale_and_average() {
        let scores = ScaledScores::compute(&draft(5.0, 7.0, 6.0), Outcome::Landed);
        assert_eq!(scores.creativity, 50.0);
        assert_eq!(scores.execution, 70.0);
        assert_eq!(scores.difficulty, 60.0);
        assert_eq!(scores.score, 60.0);
    }

    #[test]
    fn fell_zeroes_execution_before_averaging() {
        let scores = ScaledScores::compute(&draft(5.0, 7.0, 6.0), Outcome::Fell);
        assert_eq!(scores.execution, 0.0);
        assert_eq!(scores.score, 36.67);
    }

    #[test]
    fn scores_clamp_and_ignore_nan() {
        let mut d = draft(12.0, -3.0, 4.25);
        assert_eq!(d.creativity, 10.0);
        assert_eq!(d.execution, 0.0);
        d.set_score(ScoreField::Difficulty, f64::NAN);
        assert_eq!(d.difficulty, 4.25);
    }

    #[test]
    fn scaled_values_round_to_two_places() {
        let scores = ScaledScores::compute(&draft(3.3333, 6.6666, 1.0), Outcome::Landed);
        assert_eq!(scores.creativity, 33.33);
        assert_eq!(scores.execution, 66.67);
        assert_eq!(scores.score, round2((33.33 + 66.67 + 10.0) / 3.0));
    }

    #[test]
    fn rail_spin_accumulates_in_entry_order() {
        let mut d = ScorecardDraft::default();
        d.set_spin(180, SpinDirection::Backside);
        d.append_spin(360, SpinDirection::Frontside);
        assert_eq!(d.spin, "180, 360");
        assert_eq!(d.spin_direction, "Backside, Frontside");
    }

    #[test]
    fn toggling_twice_removes_tag() {
        let mut d = ScorecardDraft::default();
        assert!(d.toggle_modifier("Grabbed"));
        assert!(!d.toggle_modifier("Grabbed"));
        assert!(d.modifiers.is_empty());
    }

    #[test]
    fn parses_wire_names_loosely() {
        assert_eq!("air trick".parse::<Section>(), Ok(Section::AirTrick));
        assert_eq!("AirTrick".parse::<Section>(), Ok(Section::AirTrick));
        assert_eq!(
            "switch-heelside".parse::<Approach>(),
            Ok(Approach::SwitchHeelside)
        );
        assert_eq!(
            serde_json::to_string(&Approach::SwitchToeside).unwrap(),
            "\"Switch Toeside\""
        );
    }
}
