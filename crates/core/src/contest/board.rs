use super::carrier::{BibColor, Carrier, SessionToken, Slot};
use super::rider::Rider;

pub const DEFAULT_CARRIER_COUNT: u32 = 4;

/// Riders and the fixed set of carriers they are towed on.
#[derive(Debug, Clone, Default)]
pub struct CarrierBoard {
    carriers: Vec<Carrier>,
    riders: Vec<Rider>,
}

impl CarrierBoard {
    pub fn with_slots(count: u32) -> Self {
        Self {
            carriers: (1..=count).map(Carrier::new).collect(),
            riders: Vec::new(),
        }
    }

    pub fn from_carriers(mut carriers: Vec<Carrier>) -> Self {
        carriers.sort_by_key(|c| c.number);
        Self {
            carriers,
            riders: Vec::new(),
        }
    }

    pub fn set_riders(&mut self, mut riders: Vec<Rider>) {
        riders.sort_by_key(|r| r.full_name());
        self.riders = riders;
    }

    pub fn carriers(&self) -> &[Carrier] {
        &self.carriers
    }

    pub fn riders(&self) -> &[Rider] {
        &self.riders
    }

    pub fn carrier(&self, slot: Slot) -> Option<&Carrier> {
        self.carriers.iter().find(|c| c.number == slot)
    }

    pub fn rider(&self, id: &str) -> Option<&Rider> {
        self.riders.iter().find(|r| r.has_id(id))
    }

    pub fn carrier_of(&self, rider_id: &str) -> Option<&Carrier> {
        self.carriers.iter().find(|c| c.carries(rider_id))
    }

    pub fn session_for(&self, rider_id: &str) -> Option<SessionToken> {
        self.carrier_of(rider_id).map(|c| c.session)
    }

    fn carrier_mut(&mut self, slot: Slot) -> Option<&mut Carrier> {
        let found = self.carriers.iter_mut().find(|c| c.number == slot);
        if found.is_none() {
            log::warn!("Carrier {} not found", slot);
        }
        found
    }

    /// Places a rider on a carrier under a fresh session. Returns the updated carrier.
    pub fn assign(&mut self, rider_id: &str, slot: Slot, bib_color: BibColor) -> Option<Carrier> {
        let carrier = self.carrier_mut(slot)?;
        carrier.rider_id = Some(rider_id.to_string());
        carrier.bib_color = Some(bib_color);
        carrier.session = SessionToken::generate();
        log::info!("Rider {} placed on carrier {} ({})", rider_id, slot, bib_color);
        Some(carrier.clone())
    }

    /// Clears the rider but keeps the configured bib colour. The session is rotated so
    /// scores for the departed rider can no longer be attributed to this carrier.
    pub fn unassign(&mut self, slot: Slot) -> Option<Carrier> {
        let carrier = self.carrier_mut(slot)?;
        if let Some(rider_id) = carrier.rider_id.take() {
            log::info!("Rider {} removed from carrier {}", rider_id, slot);
        }
        carrier.session = SessionToken::generate();
        Some(carrier.clone())
    }

    pub fn set_bib_color(&mut self, slot: Slot, bib_color: BibColor) -> Option<Carrier> {
        let carrier = self.carrier_mut(slot)?;
        carrier.bib_color = Some(bib_color);
        Some(carrier.clone())
    }

    pub fn apply_remote_update(&mut self, update: Carrier) {
        match self.carriers.iter_mut().find(|c| c.number == update.number) {
            Some(existing) => *existing = update,
            None => {
                log::warn!("Carrier {} unknown locally, adding it", update.number);
                let pos = self
                    .carriers
                    .iter()
                    .position(|c| c.number > update.number)
                    .unwrap_or(self.carriers.len());
                self.carriers.insert(pos, update);
            }
        }
    }

    pub fn unassigned_riders(&self) -> Vec<&Rider> {
        self.riders
            .iter()
            .filter(|r| r.is_registered())
            .filter(|r| match r.id.as_deref() {
                Some(id) => self.carrier_of(id).is_none(),
                None => true,
            })
            .collect()
    }

    /// Next carrier after the one holding `current` whose rider is someone else and known
    /// locally, scanning circularly. Without a current rider the scan starts at the first slot.
    pub fn next_rider(&self, current: Option<&str>) -> Option<(&Rider, &Carrier)> {
        let count = self.carriers.len();
        if count == 0 {
            return None;
        }

        let start = match current {
            Some(id) => self.carriers.iter().position(|c| c.carries(id))? + 1,
            None => 0,
        };

        (0..count)
            .map(|offset| &self.carriers[(start + offset) % count])
            .filter(|c| match (c.rider_id.as_deref(), current) {
                (Some(id), Some(cur)) => id != cur,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .find_map(|c| {
                let rider = self.rider(c.rider_id.as_deref()?)?;
                Some((rider, c))
            })
    }
}
