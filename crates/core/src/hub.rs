//! Root composition: the connection, the event bus and the two desks that share the board.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::contest::{
    Approach, BibColor, Carrier, CarrierBoard, JudgingError, JudgingSession, KickerTrick,
    Outcome, ScoreField, Scorecard, Section, Slot, SpinDirection,
};
use crate::event::{EventBus, Observer, Subscription};
use crate::net::{
    Connection, ConnectionError, Envelope, KIND_CARRIER, KIND_CONNECT, KIND_SCORECARD, Message,
};

pub type SharedBoard = Arc<Mutex<CarrierBoard>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Where locally produced messages go.
pub trait Outbox: Send + Sync {
    fn post(&self, message: Message);
}

impl Outbox for Connection {
    fn post(&self, message: Message) {
        self.send(&message);
    }
}

/// Carrier dock: puts riders on carriers and mirrors everyone else's changes.
pub struct DockDesk {
    board: SharedBoard,
    outbox: Arc<dyn Outbox>,
}

impl DockDesk {
    pub fn new(board: SharedBoard, outbox: Arc<dyn Outbox>) -> Self {
        Self { board, outbox }
    }

    fn publish(&self, updated: Option<Carrier>) -> Option<Carrier> {
        if let Some(carrier) = &updated {
            self.outbox.post(Message::Carrier(carrier.clone()));
        }
        updated
    }

    pub fn assign(&self, rider_id: &str, slot: Slot, bib_color: BibColor) -> Option<Carrier> {
        let updated = lock(&self.board).assign(rider_id, slot, bib_color);
        self.publish(updated)
    }

    pub fn unassign(&self, slot: Slot) -> Option<Carrier> {
        let updated = lock(&self.board).unassign(slot);
        self.publish(updated)
    }

    pub fn set_bib_color(&self, slot: Slot, bib_color: BibColor) -> Option<Carrier> {
        let updated = lock(&self.board).set_bib_color(slot, bib_color);
        self.publish(updated)
    }
}

impl Observer for DockDesk {
    fn notify(&self, envelope: &Envelope) {
        if !envelope.is(KIND_CARRIER) {
            return;
        }
        match envelope.decode_payload::<Carrier>() {
            Ok(carrier) => {
                log::debug!("Remote update for carrier {}", carrier.number);
                lock(&self.board).apply_remote_update(carrier);
            }
            Err(e) => log::warn!("Ignoring carrier update: {}", e),
        }
    }
}

/// Judge tower: one judging session over the shared board.
pub struct JudgeDesk {
    board: SharedBoard,
    session: Mutex<JudgingSession>,
    outbox: Arc<dyn Outbox>,
}

impl JudgeDesk {
    pub fn new(board: SharedBoard, session: JudgingSession, outbox: Arc<dyn Outbox>) -> Self {
        Self {
            board,
            session: Mutex::new(session),
            outbox,
        }
    }

    // Lock order is always session, then board.
    fn run<R>(&self, action: impl FnOnce(&mut JudgingSession, &CarrierBoard) -> R) -> R {
        let mut session = lock(&self.session);
        let board = lock(&self.board);
        action(&mut session, &board)
    }

    pub fn session(&self) -> JudgingSession {
        lock(&self.session).clone()
    }

    pub fn select_rider(&self, rider_id: &str) -> Result<(), JudgingError> {
        self.run(|session, board| session.select_rider(rider_id, board))
    }

    pub fn skip(&self) -> bool {
        self.run(|session, board| session.skip(board))
    }

    pub fn reconcile(&self) {
        self.run(|session, board| session.reconcile(board));
    }

    pub fn choose_section(&self, section: Section) -> Result<(), JudgingError> {
        self.run(|session, board| session.choose_section(section, board))
    }

    pub fn choose_approach(&self, approach: Approach) -> Result<(), JudgingError> {
        lock(&self.session).choose_approach(approach)
    }

    pub fn choose_kicker(&self, trick: KickerTrick) -> Result<(), JudgingError> {
        lock(&self.session).choose_kicker(trick)
    }

    pub fn choose_trick(&self, name: &str) -> Result<(), JudgingError> {
        lock(&self.session).choose_trick(name)
    }

    pub fn choose_spin(&self, degrees: u16, direction: SpinDirection) -> Result<(), JudgingError> {
        lock(&self.session).choose_spin(degrees, direction)
    }

    pub fn set_score(&self, field: ScoreField, value: f64) -> Result<(), JudgingError> {
        lock(&self.session).set_score(field, value)
    }

    pub fn toggle_modifier(&self, tag: &str) -> Result<bool, JudgingError> {
        lock(&self.session).toggle_modifier(tag)
    }

    /// Completes the pass and posts the scorecard.
    pub fn finish(&self, outcome: Outcome) -> Result<Scorecard, JudgingError> {
        let scorecard = self.run(|session, board| session.finish(outcome, board))?;
        self.outbox
            .post(Message::Scorecard(Box::new(scorecard.clone())));
        Ok(scorecard)
    }
}

impl Observer for JudgeDesk {
    fn notify(&self, envelope: &Envelope) {
        match envelope.kind.as_str() {
            KIND_CARRIER => self.reconcile(),
            KIND_SCORECARD | KIND_CONNECT => {
                log::debug!("Ignoring {} message", envelope.kind);
            }
            other => log::debug!("Unhandled message type '{}'", other),
        }
    }
}

/// Everything the judging app needs, wired together once at startup. The dock is notified
/// before the judge so reconciliation sees the updated board.
pub struct ContestHub<O: Outbox + 'static = Connection> {
    outbox: Arc<O>,
    bus: EventBus,
    board: SharedBoard,
    dock: Arc<DockDesk>,
    judge: Arc<JudgeDesk>,
    _subscriptions: Vec<Subscription>,
}

impl<O: Outbox + 'static> ContestHub<O> {
    pub fn new(outbox: O, board: CarrierBoard, session: JudgingSession) -> Self {
        let outbox = Arc::new(outbox);
        let board: SharedBoard = Arc::new(Mutex::new(board));
        let sink: Arc<dyn Outbox> = outbox.clone();

        let dock = Arc::new(DockDesk::new(board.clone(), sink.clone()));
        let judge = Arc::new(JudgeDesk::new(board.clone(), session, sink));

        let bus = EventBus::new();
        let subscriptions = vec![bus.subscribe(dock.clone()), bus.subscribe(judge.clone())];

        Self {
            outbox,
            bus,
            board,
            dock,
            judge,
            _subscriptions: subscriptions,
        }
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn board(&self) -> MutexGuard<'_, CarrierBoard> {
        lock(&self.board)
    }

    pub fn dock(&self) -> &DockDesk {
        &self.dock
    }

    pub fn judge(&self) -> &JudgeDesk {
        &self.judge
    }

    /// Delivers one inbound envelope to every observer on the calling task.
    pub fn dispatch(&self, envelope: &Envelope) {
        self.bus.publish(envelope);
    }

    /// Local carrier changes also affect who the judge may score.
    pub fn assign(&self, rider_id: &str, slot: Slot, bib_color: BibColor) -> Option<Carrier> {
        let updated = self.dock.assign(rider_id, slot, bib_color);
        self.judge.reconcile();
        updated
    }

    pub fn unassign(&self, slot: Slot) -> Option<Carrier> {
        let updated = self.dock.unassign(slot);
        self.judge.reconcile();
        updated
    }

    pub fn set_bib_color(&self, slot: Slot, bib_color: BibColor) -> Option<Carrier> {
        let updated = self.dock.set_bib_color(slot, bib_color);
        self.judge.reconcile();
        updated
    }
}

impl ContestHub<Connection> {
    pub fn connection(&self) -> &Connection {
        &self.outbox
    }

    pub fn connect(&self, endpoint: &str) -> Result<(), ConnectionError> {
        self.outbox.connect(endpoint)
    }

    pub fn foreground(&self) {
        self.outbox.foreground();
    }

    pub fn background(&self) {
        self.outbox.background();
    }

    pub fn shutdown(&self) {
        self.outbox.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contest::{JudgingStep, Rider};

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<Message>>,
    }

    impl Recording {
        fn sent(&self) -> Vec<Message> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Outbox for Recording {
        fn post(&self, message: Message) {
            self.sent.lock().unwrap().push(message);
        }
    }

    fn rider(id: &str, first: &str) -> Rider {
        Rider {
            id: Some(id.to_string()),
            first_name: first.to_string(),
            last_name: "Wake".to_string(),
            is_registered: Some(true),
            ..Rider::default()
        }
    }

    fn hub() -> ContestHub<Recording> {
        let mut board = CarrierBoard::with_slots(4);
        board.set_riders(vec![rider("a", "Ana"), rider("b", "Ben")]);
        ContestHub::new(
            Recording::default(),
            board,
            JudgingSession::new(Some("judge-1".into()), Some("park-1".into())),
        )
    }

    fn remote(carrier: &Carrier) -> Envelope {
        Message::Carrier(carrier.clone()).to_envelope().unwrap()
    }

    #[test]
    fn local_assignment_is_posted() {
        let hub = hub();
        let carrier = hub.dock().assign("a", 2, BibColor::Blue).unwrap();

        assert_eq!(hub.outbox().sent(), vec![Message::Carrier(carrier.clone())]);
        assert_eq!(hub.board().carrier(2), Some(&carrier));
    }

    #[test]
    fn unknown_slot_posts_nothing() {
        let hub = hub();
        assert!(hub.dock().assign("a", 7, BibColor::Red).is_none());
        assert!(hub.outbox().sent().is_empty());
    }

    #[test]
    fn remote_update_applies_without_echo() {
        let hub = hub();
        let mut carrier = Carrier::new(3);
        carrier.rider_id = Some("b".into());
        carrier.bib_color = Some(BibColor::Green);

        hub.dispatch(&remote(&carrier));

        assert_eq!(hub.board().carrier(3), Some(&carrier));
        assert!(hub.outbox().sent().is_empty());
    }

    #[test]
    fn malformed_and_foreign_messages_are_ignored() {
        let hub = hub();
        let before = hub.board().carriers().to_vec();

        hub.dispatch(&Envelope {
            kind: KIND_CARRIER.into(),
            item_type: None,
            data: Some("{\"number\":".into()),
        });
        hub.dispatch(&Envelope {
            kind: "heat".into(),
            item_type: None,
            data: None,
        });

        assert_eq!(hub.board().carriers(), before.as_slice());
    }

    #[test]
    fn remote_removal_discards_active_draft() {
        let hub = hub();
        hub.dock().assign("a", 1, BibColor::Red).unwrap();
        hub.judge().select_rider("a").unwrap();
        hub.judge().choose_section(Section::Kicker).unwrap();

        let mut emptied = hub.board().carrier(1).cloned().unwrap();
        emptied.rider_id = None;
        hub.dispatch(&remote(&emptied));

        let session = hub.judge().session();
        assert!(session.active().is_none());
        assert_eq!(session.step(), JudgingStep::Section);
    }

    #[test]
    fn finished_scorecard_is_posted_with_current_session() {
        let hub = hub();
        let carrier = hub.dock().assign("a", 1, BibColor::Red).unwrap();
        hub.dock().assign("b", 2, BibColor::Blue).unwrap();

        let judge = hub.judge();
        judge.select_rider("a").unwrap();
        judge.choose_section(Section::AirTrick).unwrap();
        judge.choose_approach(Approach::Heelside).unwrap();
        judge.choose_trick("Backroll").unwrap();
        judge.choose_spin(180, SpinDirection::Frontside).unwrap();
        judge.set_score(ScoreField::Execution, 6.0).unwrap();
        judge.set_score(ScoreField::Creativity, 5.0).unwrap();
        judge.set_score(ScoreField::Difficulty, 7.0).unwrap();

        let scorecard = judge.finish(Outcome::Landed).unwrap();
        assert_eq!(scorecard.score, 60.0);
        assert_eq!(scorecard.session, Some(carrier.session));
        assert_eq!(scorecard.judge.as_deref(), Some("judge-1"));
        assert_eq!(judge.session().rider_id(), Some("b"));

        let sent = hub.outbox().sent();
        assert_eq!(
            sent.last(),
            Some(&Message::Scorecard(Box::new(scorecard)))
        );
    }

    #[test]
    fn local_reassignment_drops_replaced_rider() {
        let hub = hub();
        hub.assign("a", 1, BibColor::Red).unwrap();
        hub.judge().select_rider("a").unwrap();
        hub.judge().choose_section(Section::Kicker).unwrap();

        hub.assign("b", 1, BibColor::Red).unwrap();

        let session = hub.judge().session();
        assert!(session.active().is_none());
        assert_eq!(session.step(), JudgingStep::Section);
        assert!(matches!(
            hub.judge().choose_section(Section::Kicker),
            Err(JudgingError::NoRiderSelected)
        ));
    }

    #[test]
    fn local_color_change_follows_active_rider() {
        let hub = hub();
        hub.assign("a", 1, BibColor::Red).unwrap();
        hub.judge().select_rider("a").unwrap();

        hub.set_bib_color(1, BibColor::Orange).unwrap();
        let session = hub.judge().session();
        assert_eq!(session.active().unwrap().bib_color, Some(BibColor::Orange));
    }

    #[test]
    fn local_unassign_reconciles_judge() {
        let hub = hub();
        hub.dock().assign("a", 1, BibColor::Red).unwrap();
        hub.judge().select_rider("a").unwrap();

        hub.unassign(1).unwrap();
        assert!(hub.judge().session().active().is_none());
        assert_eq!(hub.outbox().sent().len(), 2);
    }
}
