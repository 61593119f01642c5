use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// Number of random bytes behind a ticket.
pub const TICKET_SIZE: usize = 32;

/// One participant's reserved contribution window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub index: u64,
    pub start: i64,
    pub deadline: i64,
    pub ticket: String,
    pub submitted: bool,
    pub aborted: bool,
}

impl Slot {
    pub fn new(index: u64, start: i64, deadline: i64, ticket: String) -> Self {
        Self {
            index,
            start,
            deadline,
            ticket,
            submitted: false,
            aborted: false,
        }
    }

    /// Returns `true` if the window closed without a submission.
    #[inline]
    pub fn is_expired(&self, now: i64) -> bool {
        !self.submitted && self.deadline < now
    }

    /// Returns `true` if the scheduler may move past this slot.
    #[inline]
    pub fn is_reclaimable(&self, now: i64) -> bool {
        self.aborted || self.is_expired(now)
    }

    /// Returns `true` if the participant is still expected to show up.
    #[inline]
    pub fn is_waiting(&self) -> bool {
        !self.submitted && !self.aborted
    }

    /// Defers the window by `delay` seconds.
    #[inline]
    pub fn push_back(&mut self, delay: i64) {
        self.start += delay;
        self.deadline += delay;
    }
}

/// Returns a fresh unguessable ticket, hex encoded.
pub fn generate_ticket<R: RngCore + CryptoRng>(rng: &mut R) -> String {
    let mut bytes = [0u8; TICKET_SIZE];
    rng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
