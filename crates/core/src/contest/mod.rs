mod board;
mod carrier;
mod judging;
mod rider;
mod scorecard;
pub mod vocabulary;

pub use board::{CarrierBoard, DEFAULT_CARRIER_COUNT};
pub use carrier::{BibColor, Carrier, SessionToken, Slot};
pub use judging::{ActiveRider, JudgingError, JudgingSession, JudgingStep};
pub use rider::{Rider, division_label};
pub use scorecard::{
    Approach, Outcome, ScaledScores, ScoreField, Scorecard, ScorecardDraft, ScorecardPage,
    Section, SpinDirection, round2,
};
pub use vocabulary::KickerTrick;
