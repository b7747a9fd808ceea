use std::fmt;

use chrono::{SubsecRound, Utc};

use super::board::CarrierBoard;
use super::carrier::BibColor;
use super::rider::Rider;
use super::scorecard::{
    Approach, Outcome, ScaledScores, ScoreField, Scorecard, ScorecardDraft, Section, SpinDirection,
};
use super::vocabulary::{self, DOUBLE_FLIP_TAG, KickerTrick};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JudgingStep {
    Section,
    Approach,
    Kicker,
    Rail,
    AirTrick,
    Flip,
    Spin,
    SpinOn,
    SpinOff,
    Score,
}

impl JudgingStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            JudgingStep::Section => "section",
            JudgingStep::Approach => "approach",
            JudgingStep::Kicker => "kicker",
            JudgingStep::Rail => "rail",
            JudgingStep::AirTrick => "air trick",
            JudgingStep::Flip => "flip",
            JudgingStep::Spin => "spin",
            JudgingStep::SpinOn => "spin on",
            JudgingStep::SpinOff => "spin off",
            JudgingStep::Score => "score",
        }
    }
}

impl fmt::Display for JudgingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JudgingError {
    #[error("select a rider first")]
    NoRiderSelected,
    #[error("rider {0} is not on a carrier")]
    RiderNotOnCarrier(String),
    #[error("not available at the {actual} step")]
    WrongStep { actual: JudgingStep },
    #[error("'{0}' is not an option here")]
    UnknownOption(String),
}

/// What the judge is currently working on.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRider {
    pub rider: Rider,
    pub rider_id: String,
    pub bib_color: Option<BibColor>,
}

/// The judge's walk through one pass: section, approach, trick, spin, score.
#[derive(Debug, Clone)]
pub struct JudgingSession {
    step: JudgingStep,
    draft: ScorecardDraft,
    active: Option<ActiveRider>,
    judge: Option<String>,
    park: Option<String>,
}

impl Default for JudgingSession {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl JudgingSession {
    pub fn new(judge: Option<String>, park: Option<String>) -> Self {
        Self {
            step: JudgingStep::Section,
            draft: ScorecardDraft::default(),
            active: None,
            judge,
            park,
        }
    }

    pub fn step(&self) -> JudgingStep {
        self.step
    }

    pub fn draft(&self) -> &ScorecardDraft {
        &self.draft
    }

    pub fn active(&self) -> Option<&ActiveRider> {
        self.active.as_ref()
    }

    pub fn rider_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.rider_id.as_str())
    }

    fn expect_step(&self, wanted: &[JudgingStep]) -> Result<(), JudgingError> {
        if wanted.contains(&self.step) {
            Ok(())
        } else {
            Err(JudgingError::WrongStep { actual: self.step })
        }
    }

    /// Starts over on the current rider with a fresh draft.
    pub fn reset(&mut self) {
        self.draft = ScorecardDraft::default();
        self.step = JudgingStep::Section;
    }

    pub fn select_rider(
        &mut self,
        rider_id: &str,
        board: &CarrierBoard,
    ) -> Result<(), JudgingError> {
        let carrier = board
            .carrier_of(rider_id)
            .ok_or_else(|| JudgingError::RiderNotOnCarrier(rider_id.to_string()))?;
        let rider = board
            .rider(rider_id)
            .ok_or_else(|| JudgingError::UnknownOption(rider_id.to_string()))?;
        self.active = Some(ActiveRider {
            rider: rider.clone(),
            rider_id: rider_id.to_string(),
            bib_color: carrier.bib_color,
        });
        self.reset();
        Ok(())
    }

    /// Moves on to the next occupied carrier. Returns whether the rider changed.
    pub fn skip(&mut self, board: &CarrierBoard) -> bool {
        let next = board.next_rider(self.rider_id()).and_then(|(rider, carrier)| {
            let rider_id = carrier.rider_id.clone()?;
            Some(ActiveRider {
                rider: rider.clone(),
                rider_id,
                bib_color: carrier.bib_color,
            })
        });

        match next {
            Some(active) => {
                log::info!("Next rider: {}", active.rider.full_name());
                self.active = Some(active);
                self.reset();
                true
            }
            None => {
                log::debug!("No other rider on the water");
                false
            }
        }
    }

    /// Drops the active rider once they no longer occupy any carrier, and follows bib colour
    /// changes otherwise.
    pub fn reconcile(&mut self, board: &CarrierBoard) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        match board.carrier_of(&active.rider_id) {
            Some(carrier) => active.bib_color = carrier.bib_color,
            None => {
                log::info!(
                    "Rider {} left the carriers, discarding scorecard",
                    active.rider_id
                );
                self.active = None;
                self.reset();
            }
        }
    }

    pub fn approach_options(&self) -> [Approach; 4] {
        match &self.active {
            Some(active) if active.rider.is_goofy() => Approach::GOOFY,
            _ => Approach::REGULAR,
        }
    }

    pub fn choose_section(
        &mut self,
        section: Section,
        board: &CarrierBoard,
    ) -> Result<(), JudgingError> {
        self.expect_step(&[JudgingStep::Section])?;
        if self.active.is_none() {
            return Err(JudgingError::NoRiderSelected);
        }

        if section == Section::Pass {
            if !self.skip(board) {
                self.reset();
            }
            return Ok(());
        }

        self.draft.section = Some(section);
        self.step = JudgingStep::Approach;
        Ok(())
    }

    pub fn choose_approach(&mut self, approach: Approach) -> Result<(), JudgingError> {
        self.expect_step(&[JudgingStep::Approach])?;
        let next = match self.draft.section {
            Some(Section::Kicker) => JudgingStep::Kicker,
            Some(Section::Rail) => JudgingStep::Rail,
            Some(Section::AirTrick) => JudgingStep::AirTrick,
            Some(Section::Pass) | None => return Err(JudgingError::WrongStep { actual: self.step }),
        };
        self.draft.approach = Some(approach);
        self.step = next;
        Ok(())
    }

    pub fn choose_kicker(&mut self, trick: KickerTrick) -> Result<(), JudgingError> {
        self.expect_step(&[JudgingStep::Kicker])?;
        self.step = match trick {
            KickerTrick::Flip => JudgingStep::Flip,
            KickerTrick::DoubleFlip => {
                self.draft.modifiers.push(DOUBLE_FLIP_TAG.to_string());
                JudgingStep::Flip
            }
            KickerTrick::Spin | KickerTrick::Raley => {
                self.draft.trick_type = trick.as_str().to_string();
                JudgingStep::Spin
            }
        };
        Ok(())
    }

    /// Named tricks offered at the current step; empty where the step takes no trick name.
    pub fn trick_options(&self) -> &'static [&'static str] {
        let approach = self.draft.approach.unwrap_or(Approach::Heelside);
        match self.step {
            JudgingStep::Rail => vocabulary::RAIL_TRICKS,
            JudgingStep::AirTrick => vocabulary::air_tricks(approach),
            JudgingStep::Flip => vocabulary::flips(approach),
            _ => &[],
        }
    }

    pub fn choose_trick(&mut self, name: &str) -> Result<(), JudgingError> {
        self.expect_step(&[JudgingStep::Rail, JudgingStep::AirTrick, JudgingStep::Flip])?;
        let trick = vocabulary::lookup(self.trick_options(), name)
            .ok_or_else(|| JudgingError::UnknownOption(name.to_string()))?;
        self.draft.trick_type = trick.to_string();
        self.step = match self.step {
            JudgingStep::Rail => JudgingStep::SpinOn,
            _ => JudgingStep::Spin,
        };
        Ok(())
    }

    pub fn spin_options(&self) -> &'static [u16] {
        match self.step {
            JudgingStep::SpinOn | JudgingStep::SpinOff => vocabulary::RAIL_SPIN_DEGREES,
            JudgingStep::Spin => vocabulary::SPIN_DEGREES,
            _ => &[],
        }
    }

    pub fn choose_spin(
        &mut self,
        degrees: u16,
        direction: SpinDirection,
    ) -> Result<(), JudgingError> {
        self.expect_step(&[JudgingStep::Spin, JudgingStep::SpinOn, JudgingStep::SpinOff])?;
        if !self.spin_options().contains(&degrees) {
            return Err(JudgingError::UnknownOption(degrees.to_string()));
        }
        self.step = match self.step {
            JudgingStep::SpinOn => {
                self.draft.set_spin(degrees, direction);
                JudgingStep::SpinOff
            }
            JudgingStep::SpinOff => {
                self.draft.append_spin(degrees, direction);
                JudgingStep::Score
            }
            _ => {
                self.draft.set_spin(degrees, direction);
                JudgingStep::Score
            }
        };
        Ok(())
    }

    pub fn set_score(&mut self, field: ScoreField, value: f64) -> Result<(), JudgingError> {
        self.expect_step(&[JudgingStep::Score])?;
        self.draft.set_score(field, value);
        Ok(())
    }

    pub fn modifier_options(&self) -> (&'static [&'static str], &'static [&'static str]) {
        vocabulary::modifiers(self.draft.section)
    }

    /// Returns whether the tag is set after toggling.
    pub fn toggle_modifier(&mut self, tag: &str) -> Result<bool, JudgingError> {
        self.expect_step(&[JudgingStep::Score])?;
        let (red, blue) = self.modifier_options();
        let tag = vocabulary::lookup(red, tag)
            .or_else(|| vocabulary::lookup(blue, tag))
            .ok_or_else(|| JudgingError::UnknownOption(tag.to_string()))?;
        Ok(self.draft.toggle_modifier(tag))
    }

    /// Closes the pass and moves on to the next rider. The session is read from the carrier
    /// at this moment so a swapped-out rider never receives the score.
    pub fn finish(
        &mut self,
        outcome: Outcome,
        board: &CarrierBoard,
    ) -> Result<Scorecard, JudgingError> {
        self.expect_step(&[JudgingStep::Score])?;
        let active = self.active.as_ref().ok_or(JudgingError::NoRiderSelected)?;
        let session = board
            .session_for(&active.rider_id)
            .ok_or_else(|| JudgingError::RiderNotOnCarrier(active.rider_id.clone()))?;
        let (Some(section), Some(approach)) = (self.draft.section, self.draft.approach) else {
            return Err(JudgingError::WrongStep { actual: self.step });
        };

        let scores = ScaledScores::compute(&self.draft, outcome);
        let scorecard = Scorecard {
            id: None,
            // The wire format keeps microseconds.
            date: Utc::now().trunc_subsecs(6),
            section,
            division: scores.division,
            execution: scores.execution,
            creativity: scores.creativity,
            difficulty: scores.difficulty,
            score: scores.score,
            landed: outcome == Outcome::Landed,
            approach,
            trick_type: self.draft.trick_type.clone(),
            spin: self.draft.spin.clone(),
            spin_direction: self.draft.spin_direction.clone(),
            modifiers: self.draft.modifiers.clone(),
            park: self.park.clone(),
            rider: Some(active.rider_id.clone()),
            session: Some(session),
            judge: self.judge.clone(),
        };

        log::info!(
            "Scored {} {:?}: {:.2}",
            active.rider.full_name(),
            outcome,
            scorecard.score
        );

        if !self.skip(board) {
            self.reset();
        }
        Ok(scorecard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contest::carrier::BibColor;

    fn rider(id: &str, stance: &str) -> Rider {
        Rider {
            id: Some(id.to_string()),
            first_name: id.to_uppercase(),
            last_name: "Test".to_string(),
            stance: stance.to_string(),
            is_registered: Some(true),
            ..Rider::default()
        }
    }

    fn board() -> CarrierBoard {
        let mut board = CarrierBoard::with_slots(4);
        board.set_riders(vec![rider("a", "Regular"), rider("b", "Goofy")]);
        board.assign("a", 1, BibColor::Red);
        board.assign("b", 3, BibColor::Blue);
        board
    }

    fn session(board: &CarrierBoard) -> JudgingSession {
        let mut session = JudgingSession::new(Some("judge-1".into()), Some("Lake Park".into()));
        session.select_rider("a", board).unwrap();
        session
    }

    #[test]
    fn section_requires_rider() {
        let board = board();
        let mut session = JudgingSession::default();
        assert_eq!(
            session.choose_section(Section::Kicker, &board),
            Err(JudgingError::NoRiderSelected)
        );
        assert_eq!(session.step(), JudgingStep::Section);
        assert_eq!(session.draft(), &ScorecardDraft::default());
    }

    #[test]
    fn pass_rotates_without_scoring() {
        let board = board();
        let mut session = session(&board);
        session.choose_section(Section::Pass, &board).unwrap();
        assert_eq!(session.rider_id(), Some("b"));
        assert_eq!(session.active().unwrap().bib_color, Some(BibColor::Blue));
        assert_eq!(session.step(), JudgingStep::Section);
        assert_eq!(session.draft().section, None);
    }

    #[test]
    fn approach_branches_on_section() {
        let board = board();
        for (section, step) in [
            (Section::Kicker, JudgingStep::Kicker),
            (Section::Rail, JudgingStep::Rail),
            (Section::AirTrick, JudgingStep::AirTrick),
        ] {
            let mut session = session(&board);
            session.choose_section(section, &board).unwrap();
            session.choose_approach(Approach::Heelside).unwrap();
            assert_eq!(session.step(), step);
        }
    }

    #[test]
    fn goofy_riders_see_mirrored_approaches() {
        let board = board();
        let mut session = session(&board);
        assert_eq!(session.approach_options(), Approach::REGULAR);
        session.select_rider("b", &board).unwrap();
        assert_eq!(session.approach_options(), Approach::GOOFY);
    }

    #[test]
    fn kicker_double_flip_tags_and_goes_to_flip() {
        let board = board();
        let mut session = session(&board);
        session.choose_section(Section::Kicker, &board).unwrap();
        session.choose_approach(Approach::Toeside).unwrap();
        session.choose_kicker(KickerTrick::DoubleFlip).unwrap();
        assert_eq!(session.step(), JudgingStep::Flip);
        assert_eq!(session.draft().modifiers, vec![DOUBLE_FLIP_TAG.to_string()]);
        assert_eq!(session.trick_options(), vocabulary::TOESIDE_FLIPS);

        assert!(session.choose_trick("Tantrum").is_err());
        session.choose_trick("frontroll").unwrap();
        assert_eq!(session.draft().trick_type, "Frontroll");
        assert_eq!(session.step(), JudgingStep::Spin);
    }

    #[test]
    fn air_trick_vocabulary_follows_approach() {
        let board = board();
        let mut session = session(&board);
        session.choose_section(Section::AirTrick, &board).unwrap();
        session.choose_approach(Approach::SwitchHeelside).unwrap();
        assert_eq!(session.trick_options(), vocabulary::HEELSIDE_AIR_TRICKS);
    }

    #[test]
    fn rail_takes_two_spin_steps() {
        let board = board();
        let mut session = session(&board);
        session.choose_section(Section::Rail, &board).unwrap();
        session.choose_approach(Approach::Heelside).unwrap();
        session.choose_trick("Ollie On").unwrap();
        assert_eq!(session.step(), JudgingStep::SpinOn);

        assert!(session.choose_spin(1440, SpinDirection::Backside).is_err());
        session.choose_spin(180, SpinDirection::Backside).unwrap();
        assert_eq!(session.step(), JudgingStep::SpinOff);
        session.choose_spin(360, SpinDirection::Frontside).unwrap();
        assert_eq!(session.step(), JudgingStep::Score);
        assert_eq!(session.draft().spin, "180, 360");
        assert_eq!(session.draft().spin_direction, "Backside, Frontside");
    }

    #[test]
    fn rail_uses_rail_modifiers() {
        let board = board();
        let mut session = session(&board);
        session.choose_section(Section::Rail, &board).unwrap();
        session.choose_approach(Approach::Heelside).unwrap();
        session.choose_trick("Transfer").unwrap();
        session.choose_spin(0, SpinDirection::Backside).unwrap();
        session.choose_spin(90, SpinDirection::Frontside).unwrap();
        assert_eq!(session.toggle_modifier("pressed"), Ok(true));
        assert!(session.toggle_modifier("Grabbed").is_err());
    }

    #[test]
    fn steps_reject_out_of_order_actions() {
        let board = board();
        let mut session = session(&board);
        assert_eq!(
            session.choose_approach(Approach::Toeside),
            Err(JudgingError::WrongStep {
                actual: JudgingStep::Section
            })
        );
        assert!(session.finish(Outcome::Landed, &board).is_err());
    }

    fn score_kicker_spin(session: &mut JudgingSession, board: &CarrierBoard) {
        session.choose_section(Section::Kicker, board).unwrap();
        session.choose_approach(Approach::Heelside).unwrap();
        session.choose_kicker(KickerTrick::Spin).unwrap();
        session.choose_spin(540, SpinDirection::Frontside).unwrap();
        session.set_score(ScoreField::Creativity, 5.0).unwrap();
        session.set_score(ScoreField::Execution, 7.0).unwrap();
        session.set_score(ScoreField::Difficulty, 6.0).unwrap();
        session.set_score(ScoreField::Division, 4.5).unwrap();
        session.toggle_modifier("Grabbed").unwrap();
    }

    #[test]
    fn landed_submission_captures_session_and_rotates() {
        let board = board();
        let mut session = session(&board);
        score_kicker_spin(&mut session, &board);

        let card = session.finish(Outcome::Landed, &board).unwrap();
        assert_eq!(card.rider.as_deref(), Some("a"));
        assert_eq!(card.session, board.session_for("a"));
        assert_eq!(card.section, Section::Kicker);
        assert_eq!(card.trick_type, "Spin");
        assert_eq!(card.spin, "540");
        assert_eq!(card.spin_direction, "Frontside");
        assert_eq!(card.division, 45.0);
        assert_eq!(card.score, 60.0);
        assert!(card.landed);
        assert_eq!(card.modifiers, vec!["Grabbed".to_string()]);
        assert_eq!(card.judge.as_deref(), Some("judge-1"));
        assert_eq!(card.park.as_deref(), Some("Lake Park"));

        assert_eq!(session.rider_id(), Some("b"));
        assert_eq!(session.step(), JudgingStep::Section);
        assert!(session.draft().modifiers.is_empty());
    }

    #[test]
    fn fell_submission_zeroes_execution() {
        let board = board();
        let mut session = session(&board);
        score_kicker_spin(&mut session, &board);
        let card = session.finish(Outcome::Fell, &board).unwrap();
        assert_eq!(card.execution, 0.0);
        assert_eq!(card.score, 36.67);
        assert!(!card.landed);
    }

    #[test]
    fn swapped_rider_cannot_be_scored() {
        let mut board = board();
        let mut session = session(&board);
        score_kicker_spin(&mut session, &board);
        board.unassign(1);
        assert_eq!(
            session.finish(Outcome::Landed, &board),
            Err(JudgingError::RiderNotOnCarrier("a".into()))
        );
    }

    #[test]
    fn reconcile_drops_departed_rider() {
        let mut board = board();
        let mut session = session(&board);
        session.choose_section(Section::Kicker, &board).unwrap();

        board.set_bib_color(1, BibColor::Orange);
        session.reconcile(&board);
        assert_eq!(session.active().unwrap().bib_color, Some(BibColor::Orange));
        assert_eq!(session.step(), JudgingStep::Approach);

        board.unassign(1);
        session.reconcile(&board);
        assert!(session.active().is_none());
        assert_eq!(session.step(), JudgingStep::Section);
    }

    #[test]
    fn skip_with_single_rider_stays_put() {
        let mut board = board();
        board.unassign(3);
        let mut session = session(&board);
        assert!(!session.skip(&board));
        assert_eq!(session.rider_id(), Some("a"));
    }
}
