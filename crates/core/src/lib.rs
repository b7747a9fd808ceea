pub mod api;
pub mod contest;
pub mod event;
pub mod hub;
pub mod net;

pub use api::{ApiError, ContestApi, DEFAULT_BASE_URL, Park};
pub use contest::{
    Approach, BibColor, Carrier, CarrierBoard, JudgingError, JudgingSession, JudgingStep,
    KickerTrick, Outcome, Rider, ScoreField, Scorecard, ScorecardDraft, Section, SessionToken,
    Slot, SpinDirection,
};
pub use event::{EventBus, Observer, Subscription};
pub use hub::{ContestHub, DockDesk, JudgeDesk, Outbox, SharedBoard};
pub use net::{
    CodecError, Connection, ConnectionConfig, ConnectionError, ConnectionState, ConnectionStats,
    DEFAULT_ENDPOINT, DisconnectReason, Envelope, Inbound, Message, ReconnectPolicy,
};
