use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::timestamp;

pub const DEFAULT_PROFILE_IMAGE: &str = "https://firebasestorage.googleapis.com/v0/b/the-cwa.appspot.com/o/default-avatar.png?alt=media&token=c069e515-fb20-48eb-847b-b3ef48f58c7e";

const GOOFY: &str = "Goofy";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rider {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(with = "timestamp")]
    pub date_of_birth: DateTime<Utc>,
    #[serde(default)]
    pub gender: String,
    #[serde(with = "timestamp")]
    pub date_created: DateTime<Utc>,
    #[serde(default = "default_profile_image")]
    pub profile_image: String,
    #[serde(default)]
    pub stance: String,
    #[serde(default)]
    pub year_started: i32,
    #[serde(default)]
    pub division: Option<f64>,
    #[serde(default)]
    pub home_park: String,
    #[serde(default)]
    pub statistics: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub waiver_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub waiver_url: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub is_registered: Option<bool>,
}

fn default_profile_image() -> String {
    DEFAULT_PROFILE_IMAGE.to_string()
}

impl Default for Rider {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: None,
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            date_of_birth: now,
            gender: String::new(),
            date_created: now,
            profile_image: default_profile_image(),
            stance: String::new(),
            year_started: 0,
            division: None,
            home_park: String::new(),
            statistics: None,
            waiver_date: None,
            waiver_url: None,
            score: None,
            is_registered: Some(false),
        }
    }
}

impl Rider {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn display_name(&self) -> String {
        match self.first_name.chars().next() {
            Some(initial) => format!("{}. {}", initial, self.last_name),
            None => self.last_name.clone(),
        }
    }

    pub fn is_goofy(&self) -> bool {
        self.stance.eq_ignore_ascii_case(GOOFY)
    }

    pub fn is_registered(&self) -> bool {
        self.is_registered.unwrap_or(false)
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id)
    }

    pub fn division_label(&self) -> &'static str {
        division_label(self.division.unwrap_or(0.0) as i64)
    }

    pub fn age_on(&self, today: NaiveDate) -> i32 {
        let born = self.date_of_birth.date_naive();
        let mut age = today.year() - born.year();
        if (today.month(), today.day()) < (born.month(), born.day()) {
            age -= 1;
        }
        age
    }

    pub fn age_group(&self, today: NaiveDate) -> &'static str {
        match self.age_on(today) {
            ..=10 => "Grom",
            11..=16 => "Juniors",
            17..=29 => "Adults",
            30..=39 => "Masters",
            _ => "Veterans",
        }
    }
}

/// Label for a stored (0–100) division score.
pub fn division_label(score: i64) -> &'static str {
    match score {
        -1..=20 => "Beginner",
        21..=40 => "Novice",
        41..=60 => "Intermediate",
        61..=80 => "Advanced",
        81..=100 => "Pro",
        _ => "Unknown",
    }
}
