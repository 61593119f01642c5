use serde::{Deserialize, Serialize};

/// Answer to a registration: the reserved window and the ticket naming it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub start: i64,
    pub deadline: i64,
    pub ticket: String,
}

///
/// Answer to a retrieval.
///
/// `ceremony` holds the canonical ceremony JSON when the caller's slot is
/// current. The HTTP layer answers with that document verbatim, and with the
/// serialized window otherwise.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub start: i64,
    pub deadline: i64,
    #[serde(skip)]
    pub ceremony: Option<String>,
}

impl FetchResponse {
    /// Returns `true` if the caller may contribute now.
    #[inline]
    pub fn is_current(&self) -> bool {
        self.ceremony.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeremonyStatus {
    pub lobby_size: usize,
    pub num_contributions: usize,
    pub current_slot: u64,
}
