use crate::{
    clock::{Clock, SystemClock},
    environment::Environment,
    logger::initialize_logger,
    objects::{generate_ticket, CeremonyStatus, FetchResponse, RegistrationResponse, Slot},
    storage::Storage,
};
use ceremony::{verify_ceremony, verify_submission, Ceremony, CeremonyError, VerificationError};

use http::StatusCode;
use rand::rngs::OsRng;
use std::{
    cmp,
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

/// Reasons a ticket may not act on its slot right now.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotStateError {
    #[error("unknown ticket")]
    UnknownTicket,
    #[error("slot {index} is over")]
    SlotOver { index: u64 },
    #[error("slot {index} is not current, slot {current} is")]
    NotCurrent { index: u64, current: u64 },
    #[error("slot {index} already submitted")]
    AlreadySubmitted { index: u64 },
    #[error("slot {index} passed its deadline")]
    DeadlineExpired { index: u64 },
    #[error("slot {index} was aborted")]
    Aborted { index: u64 },
}

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Slot state error: {0}")]
    SlotState(#[from] SlotStateError),
    #[error("Malformed submission: {0}")]
    MalformedInput(String),
    #[error("Verification failed: {0}")]
    VerificationFailed(#[from] VerificationError),
    #[error("History entry {0} is missing")]
    HistoryMissing(u64),
    #[error("Stored ceremony has transcript sizes {found:?}, the environment expects {expected:?}")]
    EnvironmentMismatch {
        expected: Vec<(usize, usize)>,
        found: Vec<(usize, usize)>,
    },
    #[error("Ceremony error: {0}")]
    Ceremony(#[from] CeremonyError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("The {0} lock is poisoned")]
    LockPoisoned(&'static str),
}

impl CoordinatorError {
    /// Returns the HTTP status the error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CoordinatorError::SlotState(_) => StatusCode::FORBIDDEN,
            CoordinatorError::MalformedInput(_) | CoordinatorError::VerificationFailed(_) => StatusCode::BAD_REQUEST,
            CoordinatorError::HistoryMissing(_) => StatusCode::NOT_FOUND,
            CoordinatorError::EnvironmentMismatch { .. }
            | CoordinatorError::Ceremony(_)
            | CoordinatorError::Io(_)
            | CoordinatorError::LockPoisoned(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Slots handed out so far and the cursor over them.
///
/// Slot `first_index + i` lives at `slots[i]`. The cursor never moves
/// backwards and never passes `first_index + slots.len()`.
#[derive(Debug)]
struct Schedule {
    first_index: u64,
    slots: Vec<Slot>,
    tickets: HashMap<String, u64>,
    current_slot: u64,
}

impl Schedule {
    fn new(first_index: u64) -> Self {
        Self {
            first_index,
            slots: vec![],
            tickets: HashMap::new(),
            current_slot: first_index,
        }
    }

    /// Returns the index the next registration receives.
    #[inline]
    fn end(&self) -> u64 {
        self.first_index + self.slots.len() as u64
    }

    #[inline]
    fn slot(&self, index: u64) -> Option<&Slot> {
        index
            .checked_sub(self.first_index)
            .and_then(|position| self.slots.get(position as usize))
    }

    #[inline]
    fn slot_mut(&mut self, index: u64) -> Option<&mut Slot> {
        let position = index.checked_sub(self.first_index)?;
        self.slots.get_mut(position as usize)
    }

    fn index_of(&self, ticket: &str) -> Result<u64, SlotStateError> {
        self.tickets.get(ticket).copied().ok_or(SlotStateError::UnknownTicket)
    }

    /// Moves the cursor past aborted or expired slots, stopping at `bound`.
    fn reclaim(&mut self, now: i64, bound: u64) {
        let bound = cmp::min(bound, self.end());
        while self.current_slot < bound {
            match self.slot(self.current_slot) {
                Some(slot) if slot.is_reclaimable(now) => {
                    warn!("Reclaiming slot {} (aborted: {})", slot.index, slot.aborted);
                    self.current_slot += 1;
                }
                _ => break,
            }
        }
    }

    /// Moves the cursor just past `index` unless it already is.
    #[inline]
    fn advance_past(&mut self, index: u64) {
        self.current_slot = cmp::max(self.current_slot, index + 1);
    }

    fn lobby_size(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.index >= self.current_slot && slot.is_waiting())
            .count()
    }
}

/// The canonical ceremony and the history backing it.
struct CeremonyState {
    ceremony: Arc<Ceremony>,
    storage: Box<dyn Storage>,
}

///
/// Hands out contribution slots and keeps the canonical ceremony.
///
/// The schedule lock covers slots, tickets and the cursor, and is only ever
/// held for bookkeeping. The ceremony lock covers the canonical state and
/// is held across verification. The schedule lock is never acquired while
/// the ceremony lock is held, so registration and status never wait on a
/// verification.
///
pub struct Coordinator {
    environment: Environment,
    clock: Arc<dyn Clock>,
    schedule: Mutex<Schedule>,
    state: Mutex<CeremonyState>,
}

impl Coordinator {
    /// Creates a coordinator over the environment's disk storage and the wall clock.
    pub fn new(environment: Environment) -> Result<Self, CoordinatorError> {
        initialize_logger(&environment);

        let storage = environment.storage()?;
        Self::with_storage(environment, storage, Arc::new(SystemClock))
    }

    ///
    /// Creates a coordinator over the given storage and clock.
    ///
    /// Resumes from the most recently accepted ceremony in storage, which must
    /// carry the transcript sizes of the environment, and starts from the
    /// genesis ceremony of the environment otherwise. Slot
    /// numbering continues after the last accepted slot so that history is
    /// never overwritten.
    ///
    pub fn with_storage(
        environment: Environment,
        storage: Box<dyn Storage>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CoordinatorError> {
        let (ceremony, first_index) = match storage.latest()? {
            Some((index, body)) => {
                info!("Resuming from accepted slot {}", index);
                let ceremony = Ceremony::decode(&body)?;

                let expected = environment.ceremony_sizes();
                let found = ceremony
                    .transcripts
                    .iter()
                    .map(|transcript| (transcript.num_g1_powers, transcript.num_g2_powers))
                    .collect::<Vec<_>>();
                if found != expected {
                    error!("Accepted slot {} does not match the environment sizes", index);
                    return Err(CoordinatorError::EnvironmentMismatch {
                        expected: expected.to_vec(),
                        found,
                    });
                }

                verify_ceremony(&ceremony)?;
                (ceremony, index + 1)
            }
            None => {
                info!("Starting from the genesis ceremony");
                (Ceremony::new(environment.ceremony_sizes())?, 0)
            }
        };

        info!(
            "Coordinator is ready with {} contributions, next slot is {}",
            ceremony.num_contributions(),
            first_index
        );

        Ok(Self {
            environment,
            clock,
            schedule: Mutex::new(Schedule::new(first_index)),
            state: Mutex::new(CeremonyState {
                ceremony: Arc::new(ceremony),
                storage,
            }),
        })
    }

    #[inline]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    ///
    /// Reserves the next slot and returns its window and ticket.
    ///
    /// A slot that is current on registration opens after the immediate start
    /// delay. Any other slot opens once the previous slot's deadline and the
    /// verification allowance have passed, and never in the past.
    ///
    pub fn register_participant(&self) -> Result<RegistrationResponse, CoordinatorError> {
        let now = self.clock.now();
        let mut schedule = self.schedule()?;

        let end = schedule.end();
        schedule.reclaim(now, end);

        let index = schedule.end();
        let start = match index.checked_sub(1).and_then(|previous| schedule.slot(previous)) {
            Some(previous) if index != schedule.current_slot => {
                cmp::max(previous.deadline + self.environment.coordinator_time(), now)
            }
            _ => now + self.environment.immediate_start_delay(),
        };
        let deadline = start + self.environment.participant_time();

        let ticket = loop {
            let ticket = generate_ticket(&mut OsRng);
            if !schedule.tickets.contains_key(&ticket) {
                break ticket;
            }
        };

        schedule.tickets.insert(ticket.clone(), index);
        schedule.slots.push(Slot::new(index, start, deadline, ticket.clone()));

        debug!("Registered slot {} from {} to {}", index, start, deadline);

        Ok(RegistrationResponse { start, deadline, ticket })
    }

    ///
    /// Returns the caller's window, with the canonical ceremony attached if
    /// the caller's slot is current.
    ///
    /// A current slot whose deadline has passed is given up and reported as
    /// expired. If a waiting caller's start has already passed, every waiting
    /// slot is pushed back.
    ///
    pub fn retrieve_participant(&self, ticket: &str) -> Result<FetchResponse, CoordinatorError> {
        let now = self.clock.now();

        let (start, deadline) = {
            let mut schedule = self.schedule()?;
            let index = schedule.index_of(ticket)?;
            if index < schedule.current_slot {
                return Err(SlotStateError::SlotOver { index }.into());
            }

            schedule.reclaim(now, index);

            let (start, deadline, aborted) = match schedule.slot(index) {
                Some(slot) => (slot.start, slot.deadline, slot.aborted),
                None => return Err(SlotStateError::UnknownTicket.into()),
            };

            if aborted {
                return Err(SlotStateError::Aborted { index }.into());
            }

            if index != schedule.current_slot {
                if start <= now {
                    let delay = self.environment.pushback_delay();
                    let current_slot = schedule.current_slot;
                    warn!("Slot {} missed its start, pushing waiting slots back by {}s", index, delay);
                    schedule
                        .slots
                        .iter_mut()
                        .filter(|slot| slot.index > current_slot)
                        .for_each(|slot| slot.push_back(delay));
                }

                let (start, deadline) = match schedule.slot(index) {
                    Some(slot) => (slot.start, slot.deadline),
                    None => (start, deadline),
                };
                return Ok(FetchResponse {
                    start,
                    deadline,
                    ceremony: None,
                });
            }

            if deadline < now {
                warn!("Slot {} expired before retrieval", index);
                schedule.advance_past(index);
                return Err(SlotStateError::DeadlineExpired { index }.into());
            }

            (start, deadline)
        };

        let ceremony = self.state()?.ceremony.clone();
        let json = ceremony.to_json()?;

        Ok(FetchResponse {
            start,
            deadline,
            ceremony: Some(json),
        })
    }

    ///
    /// Accepts the contributed ceremony of the current slot.
    ///
    /// The body is decoded, verified against the canonical ceremony, stored
    /// under the slot index and only then made canonical. The cursor moves
    /// past the slot whatever the outcome, so a participant gets one attempt.
    ///
    pub fn submit_ceremony(&self, ticket: &str, body: &[u8]) -> Result<(), CoordinatorError> {
        let now = self.clock.now();

        let index = {
            let mut schedule = self.schedule()?;
            let index = schedule.index_of(ticket)?;

            schedule.reclaim(now, index);

            let current = schedule.current_slot;
            if index != current {
                warn!("Rejecting submission of slot {} while slot {} is current", index, current);
                return Err(SlotStateError::NotCurrent { index, current }.into());
            }

            let slot = match schedule.slot_mut(index) {
                Some(slot) => slot,
                None => return Err(SlotStateError::UnknownTicket.into()),
            };
            if slot.submitted {
                return Err(SlotStateError::AlreadySubmitted { index }.into());
            }
            if slot.aborted {
                return Err(SlotStateError::Aborted { index }.into());
            }
            if slot.deadline < now {
                warn!("Slot {} submitted after its deadline", index);
                schedule.advance_past(index);
                return Err(SlotStateError::DeadlineExpired { index }.into());
            }

            slot.submitted = true;
            index
        };

        let result = self.accept(index, body);
        self.conclude(index, result)
    }

    /// Logs the outcome of the submission of slot `index` and moves the
    /// cursor past it, even if the schedule lock was poisoned meanwhile.
    fn conclude(&self, index: u64, result: Result<(), CoordinatorError>) -> Result<(), CoordinatorError> {
        match &result {
            Ok(()) => info!("Accepted the contribution of slot {}", index),
            Err(error) => error!("Rejected the contribution of slot {}: {}", index, error),
        }

        match self.schedule.lock() {
            Ok(mut schedule) => schedule.advance_past(index),
            Err(poisoned) => {
                warn!("Moving past slot {} under a poisoned schedule lock", index);
                poisoned.into_inner().advance_past(index);
            }
        }
        result
    }

    /// Verifies `body` against the canonical ceremony and makes it canonical.
    fn accept(&self, index: u64, body: &[u8]) -> Result<(), CoordinatorError> {
        let candidate = Ceremony::decode(body).map_err(|error| CoordinatorError::MalformedInput(error.to_string()))?;

        let mut state = self.state()?;
        verify_submission(&state.ceremony, &candidate)?;

        state.storage.insert(index, body)?;
        state.ceremony = Arc::new(candidate);

        trace!("Slot {} is now canonical", index);
        Ok(())
    }

    ///
    /// Gives up a slot that has not been submitted.
    ///
    /// An aborted current slot releases the cursor right away. A waiting slot
    /// is skipped when the cursor reaches it.
    ///
    pub fn abort_contribution(&self, ticket: &str) -> Result<(), CoordinatorError> {
        let now = self.clock.now();
        let mut schedule = self.schedule()?;
        let index = schedule.index_of(ticket)?;

        if index < schedule.current_slot {
            return Err(SlotStateError::SlotOver { index }.into());
        }

        match schedule.slot_mut(index) {
            Some(slot) if slot.submitted => return Err(SlotStateError::AlreadySubmitted { index }.into()),
            Some(slot) => slot.aborted = true,
            None => return Err(SlotStateError::UnknownTicket.into()),
        }

        info!("Slot {} was aborted", index);

        let end = schedule.end();
        schedule.reclaim(now, end);
        Ok(())
    }

    /// Returns a snapshot of the lobby and the canonical ceremony.
    pub fn status(&self) -> Result<CeremonyStatus, CoordinatorError> {
        let now = self.clock.now();
        let (lobby_size, current_slot) = {
            let mut schedule = self.schedule()?;
            let end = schedule.end();
            schedule.reclaim(now, end);
            (schedule.lobby_size(), schedule.current_slot)
        };

        let num_contributions = self.state()?.ceremony.num_contributions();

        Ok(CeremonyStatus {
            lobby_size,
            num_contributions,
            current_slot,
        })
    }

    /// Returns the canonical ceremony as JSON.
    pub fn current_state(&self) -> Result<String, CoordinatorError> {
        let ceremony = self.state()?.ceremony.clone();
        Ok(ceremony.to_json()?)
    }

    /// Returns the body accepted for the given slot.
    pub fn history(&self, index: u64) -> Result<Vec<u8>, CoordinatorError> {
        self.state()?
            .storage
            .get(index)?
            .ok_or(CoordinatorError::HistoryMissing(index))
    }

    /// Returns the index of the slot that may currently contribute.
    pub fn current_slot(&self) -> Result<u64, CoordinatorError> {
        Ok(self.schedule()?.current_slot)
    }

    /// Attempts to acquire the schedule lock.
    #[inline]
    fn schedule(&self) -> Result<MutexGuard<Schedule>, CoordinatorError> {
        match self.schedule.lock() {
            Ok(schedule) => Ok(schedule),
            _ => Err(CoordinatorError::LockPoisoned("schedule")),
        }
    }

    /// Attempts to acquire the ceremony lock.
    #[inline]
    fn state(&self) -> Result<MutexGuard<CeremonyState>, CoordinatorError> {
        match self.state.lock() {
            Ok(state) => Ok(state),
            _ => Err(CoordinatorError::LockPoisoned("ceremony")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{storage::InMemory, testing::prelude::*};

    use std::sync::PoisonError;

    const NOW: i64 = 1_700_000_000;

    fn schedule_with(deadlines: &[i64]) -> Schedule {
        let mut schedule = Schedule::new(10);
        for (i, deadline) in deadlines.iter().enumerate() {
            let index = 10 + i as u64;
            let ticket = format!("ticket-{}", index);
            schedule.tickets.insert(ticket.clone(), index);
            schedule.slots.push(Slot::new(index, deadline - 20, *deadline, ticket));
        }
        schedule
    }

    #[test]
    fn test_reclaim_stops_at_live_slot() {
        let mut schedule = schedule_with(&[NOW - 5, NOW - 1, NOW + 20, NOW - 3]);

        schedule.reclaim(NOW, 100);

        assert_eq!(12, schedule.current_slot);
        assert_eq!(2, schedule.lobby_size());
    }

    #[test]
    fn test_reclaim_respects_bound() {
        let mut schedule = schedule_with(&[NOW - 5, NOW - 1, NOW - 1]);

        schedule.reclaim(NOW, 11);
        assert_eq!(11, schedule.current_slot);

        schedule.reclaim(NOW, 100);
        assert_eq!(13, schedule.current_slot);
        assert_eq!(schedule.end(), schedule.current_slot);
    }

    #[test]
    fn test_reclaim_keeps_submitted_slot() {
        let mut schedule = schedule_with(&[NOW - 5, NOW - 1]);
        schedule.slot_mut(10).unwrap().submitted = true;

        schedule.reclaim(NOW, 100);

        assert_eq!(10, schedule.current_slot);
    }

    #[test]
    fn test_advance_past_is_monotonic() {
        let mut schedule = schedule_with(&[NOW, NOW, NOW]);
        schedule.advance_past(11);
        assert_eq!(12, schedule.current_slot);
        schedule.advance_past(10);
        assert_eq!(12, schedule.current_slot);
    }

    #[test]
    fn test_slot_lookup_before_first_index() {
        let schedule = schedule_with(&[NOW]);
        assert!(schedule.slot(9).is_none());
        assert!(schedule.slot(10).is_some());
        assert!(schedule.slot(11).is_none());
        assert_eq!(Err(SlotStateError::UnknownTicket), schedule.index_of("missing"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            StatusCode::FORBIDDEN,
            CoordinatorError::from(SlotStateError::UnknownTicket).status_code()
        );
        assert_eq!(
            StatusCode::BAD_REQUEST,
            CoordinatorError::MalformedInput("bad".to_string()).status_code()
        );
        assert_eq!(
            StatusCode::BAD_REQUEST,
            CoordinatorError::from(VerificationError::TranscriptCountMismatch { expected: 4, found: 3 }).status_code()
        );
        assert_eq!(
            StatusCode::INTERNAL_SERVER_ERROR,
            CoordinatorError::LockPoisoned("schedule").status_code()
        );
        assert_eq!(StatusCode::NOT_FOUND, CoordinatorError::HistoryMissing(3).status_code());
        assert_eq!(
            StatusCode::INTERNAL_SERVER_ERROR,
            CoordinatorError::EnvironmentMismatch {
                expected: vec![(4, 2)],
                found: vec![(8, 2)],
            }
            .status_code()
        );
    }

    #[test]
    fn test_registration_windows() {
        test_logger();

        let clock = Arc::new(ManualClock::new(NOW));
        let coordinator = test_coordinator(clock.clone()).unwrap();
        let environment = Environment::Test;

        // The first slot is current on registration.
        let first = coordinator.register_participant().unwrap();
        assert_eq!(NOW + environment.immediate_start_delay(), first.start);
        assert_eq!(first.start + environment.participant_time(), first.deadline);

        // Later slots queue behind the previous deadline and verification time.
        let second = coordinator.register_participant().unwrap();
        assert_eq!(first.deadline + environment.coordinator_time(), second.start);
        assert_ne!(first.ticket, second.ticket);

        let status = coordinator.status().unwrap();
        assert_eq!(2, status.lobby_size);
        assert_eq!(0, status.current_slot);
        assert_eq!(0, status.num_contributions);
    }

    #[test]
    fn test_registration_after_idle_period() {
        test_logger();

        let clock = Arc::new(ManualClock::new(NOW));
        let coordinator = test_coordinator(clock.clone()).unwrap();

        let first = coordinator.register_participant().unwrap();

        // Every earlier slot expired, so the new one is current at once.
        clock.set(first.deadline + 1_000);
        let second = coordinator.register_participant().unwrap();
        assert_eq!(clock.now() + Environment::Test.immediate_start_delay(), second.start);
        assert_eq!(1, coordinator.current_slot().unwrap());
    }

    #[test]
    fn test_retrieval_of_current_slot() {
        test_logger();

        let clock = Arc::new(ManualClock::new(NOW));
        let coordinator = test_coordinator(clock.clone()).unwrap();

        let first = coordinator.register_participant().unwrap();
        let second = coordinator.register_participant().unwrap();

        let fetched = coordinator.retrieve_participant(&first.ticket).unwrap();
        assert!(fetched.is_current());
        assert_eq!(coordinator.current_state().unwrap(), fetched.ceremony.unwrap());

        let waiting = coordinator.retrieve_participant(&second.ticket).unwrap();
        assert!(!waiting.is_current());
        assert_eq!(second.start, waiting.start);
    }

    #[test]
    fn test_retrieval_pushes_back_waiting_slots() {
        test_logger();

        let clock = Arc::new(ManualClock::new(NOW));
        let coordinator = test_coordinator(clock.clone()).unwrap();

        let first = coordinator.register_participant().unwrap();
        let second = coordinator.register_participant().unwrap();

        // The first participant submitted and is being verified past the second's start.
        coordinator.schedule().unwrap().slot_mut(0).unwrap().submitted = true;
        clock.set(second.start);

        let waiting = coordinator.retrieve_participant(&second.ticket).unwrap();
        let delay = Environment::Test.pushback_delay();
        assert_eq!(second.start + delay, waiting.start);
        assert_eq!(second.deadline + delay, waiting.deadline);
        assert!(first.deadline < waiting.start);
    }

    #[test]
    fn test_retrieval_after_deadline() {
        test_logger();

        let clock = Arc::new(ManualClock::new(NOW));
        let coordinator = test_coordinator(clock.clone()).unwrap();

        let first = coordinator.register_participant().unwrap();
        clock.set(first.deadline + 1);

        // The first retrieval past the deadline reclaims nothing since the
        // slot is the caller's own, then gives it up.
        let error = coordinator.retrieve_participant(&first.ticket).unwrap_err();
        assert!(matches!(
            error,
            CoordinatorError::SlotState(SlotStateError::DeadlineExpired { index: 0 })
        ));
        assert_eq!(1, coordinator.current_slot().unwrap());

        let error = coordinator.retrieve_participant(&first.ticket).unwrap_err();
        assert!(matches!(error, CoordinatorError::SlotState(SlotStateError::SlotOver { index: 0 })));
        assert_eq!(StatusCode::FORBIDDEN, error.status_code());
    }

    #[test]
    fn test_unknown_ticket() {
        test_logger();

        let coordinator = test_coordinator(Arc::new(ManualClock::new(NOW))).unwrap();
        for error in [
            coordinator.retrieve_participant("nope").unwrap_err(),
            coordinator.submit_ceremony("nope", b"{}").unwrap_err(),
            coordinator.abort_contribution("nope").unwrap_err(),
        ] {
            assert!(matches!(error, CoordinatorError::SlotState(SlotStateError::UnknownTicket)));
        }
    }

    #[test]
    fn test_honest_submission() {
        test_logger();

        let clock = Arc::new(ManualClock::new(NOW));
        let coordinator = test_coordinator(clock.clone()).unwrap();

        let first = coordinator.register_participant().unwrap();
        let body = honest_submission(&coordinator, &first.ticket).unwrap();
        coordinator.submit_ceremony(&first.ticket, &body).unwrap();

        let status = coordinator.status().unwrap();
        assert_eq!(1, status.num_contributions);
        assert_eq!(1, status.current_slot);
        assert_eq!(0, status.lobby_size);
        assert_eq!(body, coordinator.history(0).unwrap());

        // The same ticket gets a single attempt.
        let error = coordinator.submit_ceremony(&first.ticket, &body).unwrap_err();
        assert!(matches!(error, CoordinatorError::SlotState(_)));
        assert!(matches!(coordinator.history(1), Err(CoordinatorError::HistoryMissing(1))));
    }

    #[test]
    fn test_waiting_slot_cannot_submit() {
        test_logger();

        let clock = Arc::new(ManualClock::new(NOW));
        let coordinator = test_coordinator(clock.clone()).unwrap();

        let first = coordinator.register_participant().unwrap();
        let second = coordinator.register_participant().unwrap();

        let body = honest_submission(&coordinator, &first.ticket).unwrap();
        let error = coordinator.submit_ceremony(&second.ticket, &body).unwrap_err();
        assert!(matches!(
            error,
            CoordinatorError::SlotState(SlotStateError::NotCurrent { index: 1, current: 0 })
        ));

        // The rejection leaves the first participant's slot intact.
        coordinator.submit_ceremony(&first.ticket, &body).unwrap();
        assert_eq!(1, coordinator.status().unwrap().num_contributions);
    }

    #[test]
    fn test_malformed_submission_advances() {
        test_logger();

        let clock = Arc::new(ManualClock::new(NOW));
        let coordinator = test_coordinator(clock.clone()).unwrap();

        let first = coordinator.register_participant().unwrap();
        let second = coordinator.register_participant().unwrap();

        let error = coordinator.submit_ceremony(&first.ticket, b"not json").unwrap_err();
        assert!(matches!(error, CoordinatorError::MalformedInput(_)));
        assert_eq!(StatusCode::BAD_REQUEST, error.status_code());

        assert_eq!(1, coordinator.current_slot().unwrap());
        assert_eq!(0, coordinator.status().unwrap().num_contributions);
        assert!(coordinator.retrieve_participant(&second.ticket).unwrap().is_current());
    }

    #[test]
    fn test_unverifiable_submission_is_rejected() {
        test_logger();

        let clock = Arc::new(ManualClock::new(NOW));
        let coordinator = test_coordinator(clock.clone()).unwrap();
        let before = coordinator.current_state().unwrap();

        let first = coordinator.register_participant().unwrap();

        // Resubmitting the canonical state adds no contribution.
        let error = coordinator.submit_ceremony(&first.ticket, before.as_bytes()).unwrap_err();
        assert!(matches!(error, CoordinatorError::VerificationFailed(_)));
        assert_eq!(before, coordinator.current_state().unwrap());
        assert!(matches!(coordinator.history(0), Err(CoordinatorError::HistoryMissing(0))));
    }

    #[test]
    fn test_late_submission() {
        test_logger();

        let clock = Arc::new(ManualClock::new(NOW));
        let coordinator = test_coordinator(clock.clone()).unwrap();

        let first = coordinator.register_participant().unwrap();
        let body = honest_submission(&coordinator, &first.ticket).unwrap();

        clock.set(first.deadline + 1);
        let error = coordinator.submit_ceremony(&first.ticket, &body).unwrap_err();
        assert!(matches!(
            error,
            CoordinatorError::SlotState(SlotStateError::DeadlineExpired { index: 0 })
        ));
        assert_eq!(0, coordinator.status().unwrap().num_contributions);
    }

    #[test]
    fn test_abort_releases_cursor() {
        test_logger();

        let clock = Arc::new(ManualClock::new(NOW));
        let coordinator = test_coordinator(clock.clone()).unwrap();

        let first = coordinator.register_participant().unwrap();
        let second = coordinator.register_participant().unwrap();
        let third = coordinator.register_participant().unwrap();

        // A waiting slot is skipped once the cursor reaches it.
        coordinator.abort_contribution(&second.ticket).unwrap();
        assert_eq!(0, coordinator.current_slot().unwrap());
        assert_eq!(2, coordinator.status().unwrap().lobby_size);

        coordinator.abort_contribution(&first.ticket).unwrap();
        assert_eq!(2, coordinator.current_slot().unwrap());
        assert!(coordinator.retrieve_participant(&third.ticket).unwrap().is_current());

        let error = coordinator.abort_contribution(&first.ticket).unwrap_err();
        assert!(matches!(error, CoordinatorError::SlotState(SlotStateError::SlotOver { index: 0 })));
    }

    #[test]
    fn test_resume_from_history() {
        test_logger();

        let clock = Arc::new(ManualClock::new(NOW));
        let mut storage = InMemory::default();
        {
            let coordinator = test_coordinator(clock.clone()).unwrap();
            let first = coordinator.register_participant().unwrap();
            let body = honest_submission(&coordinator, &first.ticket).unwrap();
            coordinator.submit_ceremony(&first.ticket, &body).unwrap();
            storage.insert(0, &coordinator.history(0).unwrap()).unwrap();
        }

        let coordinator = Coordinator::with_storage(Environment::Test, Box::new(storage), clock.clone()).unwrap();
        assert_eq!(1, coordinator.current_slot().unwrap());
        assert_eq!(1, coordinator.status().unwrap().num_contributions);

        // Slot numbering continues after the accepted history.
        let next = coordinator.register_participant().unwrap();
        let body = honest_submission(&coordinator, &next.ticket).unwrap();
        coordinator.submit_ceremony(&next.ticket, &body).unwrap();
        assert_eq!(body, coordinator.history(1).unwrap());
        assert_eq!(2, coordinator.status().unwrap().num_contributions);
    }

    #[test]
    fn test_resume_rejects_corrupt_history() {
        test_logger();

        let mut storage = InMemory::default();
        storage.insert(0, b"{\"transcripts\": 3}").unwrap();

        let result = Coordinator::with_storage(Environment::Test, Box::new(storage), Arc::new(ManualClock::new(NOW)));
        assert!(matches!(result, Err(CoordinatorError::Ceremony(_))));
    }

    #[test]
    fn test_resume_rejects_foreign_sizes() {
        test_logger();

        let expected = Environment::Test.ceremony_sizes().to_vec();
        for sizes in [vec![(8, 2)], vec![(4, 2), (8, 3), (16, 4)], vec![(4, 2), (8, 4)]] {
            // Initialize a new storage holding a valid ceremony of other sizes.
            let mut storage = InMemory::default();
            let ceremony = Ceremony::new(&sizes).unwrap();
            assert_eq!(Ok(()), verify_ceremony(&ceremony));
            storage.insert(0, &ceremony.encode().unwrap()).unwrap();

            let result = Coordinator::with_storage(Environment::Test, Box::new(storage), Arc::new(ManualClock::new(NOW)));
            match result {
                Err(CoordinatorError::EnvironmentMismatch { expected: e, found }) => {
                    assert_eq!(expected, e);
                    assert_eq!(sizes, found);
                }
                _ => panic!("resumed from a ceremony with sizes {:?}", sizes),
            }
        }
    }

    #[test]
    fn test_cursor_moves_past_a_poisoned_schedule() {
        test_logger();

        let coordinator = test_coordinator(Arc::new(ManualClock::new(NOW))).unwrap();
        coordinator.register_participant().unwrap();
        coordinator.register_participant().unwrap();

        // Poison the schedule lock from another thread.
        std::thread::scope(|s| {
            let poisoner = s.spawn(|| {
                let _schedule = coordinator.schedule.lock();
                panic!("schedule poisoned");
            });
            assert!(poisoner.join().is_err());
        });
        assert!(matches!(
            coordinator.current_slot(),
            Err(CoordinatorError::LockPoisoned("schedule"))
        ));

        let result = coordinator.conclude(0, Err(CoordinatorError::MalformedInput("bad".to_string())));
        assert!(matches!(result, Err(CoordinatorError::MalformedInput(_))));

        let schedule = coordinator.schedule.lock().unwrap_or_else(PoisonError::into_inner);
        assert_eq!(1, schedule.current_slot);
    }
}
