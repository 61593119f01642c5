use crate::{testing::prelude::*, Coordinator, CoordinatorError};

use anyhow::{ensure, Context};
use proptest::prelude::{any, ProptestConfig};
use proptest_derive::Arbitrary;
use std::{collections::HashSet, sync::Arc};
use tracing::debug;

const NOW: i64 = 1_700_000_000;

/// One request against the coordinator. Participants are picked by position
/// among the registered tickets, modulo their number.
#[derive(Debug, Clone, Arbitrary)]
enum Action {
    Register,
    Retrieve(u8),
    Contribute(u8),
    SubmitGarbage(u8),
    Abort(u8),
    Wait(u8),
}

fn pick(tickets: &[String], participant: u8) -> Option<&String> {
    match tickets.len() {
        0 => None,
        len => tickets.get(participant as usize % len),
    }
}

fn schedule_proptest_impl(actions: Vec<Action>) -> anyhow::Result<()> {
    let clock = Arc::new(ManualClock::new(NOW));
    let coordinator = test_coordinator(clock.clone())?;

    let mut tickets: Vec<String> = vec![];
    let mut accepted = HashSet::new();
    let mut current_slot = coordinator.current_slot()?;
    let mut num_contributions = 0;

    for action in actions {
        debug!("Applying {:?}", action);

        let mut succeeded_with: Option<String> = None;
        match &action {
            Action::Register => tickets.push(coordinator.register_participant()?.ticket),
            Action::Retrieve(participant) => {
                if let Some(ticket) = pick(&tickets, *participant) {
                    let _ = coordinator.retrieve_participant(ticket);
                }
            }
            Action::Contribute(participant) => {
                if let Some(ticket) = pick(&tickets, *participant) {
                    match coordinator.retrieve_participant(ticket) {
                        Ok(response) if response.is_current() => {
                            // A current participant contributing in time is accepted.
                            let body = honest_submission(&coordinator, ticket)?;
                            coordinator
                                .submit_ceremony(ticket, &body)
                                .context("honest submission of the current slot was rejected")?;
                            succeeded_with = Some(ticket.clone());
                        }
                        _ => {
                            let body = coordinator.current_state()?.into_bytes();
                            ensure!(
                                coordinator.submit_ceremony(ticket, &body).is_err(),
                                "a slot that could not retrieve was allowed to submit"
                            );
                        }
                    }
                }
            }
            Action::SubmitGarbage(participant) => {
                if let Some(ticket) = pick(&tickets, *participant) {
                    let result = coordinator.submit_ceremony(ticket, b"{\"transcripts\":[]}");
                    ensure!(
                        matches!(
                            result,
                            Err(CoordinatorError::SlotState(_))
                                | Err(CoordinatorError::MalformedInput(_))
                                | Err(CoordinatorError::VerificationFailed(_))
                        ),
                        "garbage was not rejected: {:?}",
                        result
                    );
                }
            }
            Action::Abort(participant) => {
                if let Some(ticket) = pick(&tickets, *participant) {
                    let _ = coordinator.abort_contribution(ticket);
                }
            }
            Action::Wait(seconds) => clock.advance(*seconds as i64),
        }

        if let Some(ticket) = succeeded_with {
            ensure!(accepted.insert(ticket), "a ticket contributed twice");
            num_contributions += 1;
        }

        let status = coordinator.status()?;
        ensure!(
            status.current_slot >= current_slot,
            "the cursor moved back from {} to {}",
            current_slot,
            status.current_slot
        );
        ensure!(
            status.current_slot <= tickets.len() as u64,
            "the cursor passed the last registered slot"
        );
        ensure!(
            status.num_contributions == num_contributions,
            "expected {} contributions, found {}",
            num_contributions,
            status.num_contributions
        );
        ensure!(status.lobby_size <= tickets.len(), "the lobby outgrew the registrations");

        current_slot = status.current_slot;
    }

    Ok(())
}

fn coordinator_is_consistent(coordinator: &Coordinator) -> anyhow::Result<()> {
    let ceremony = ceremony::Ceremony::from_json(&coordinator.current_state()?)?;
    ceremony::verify_ceremony(&ceremony)?;
    Ok(())
}

proptest::proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// Contributions are verified with pairings, so the number of cases is
    /// kept low. A failure leaves a persistence file worth keeping.
    #[test]
    fn schedule_proptest(actions in proptest::collection::vec(any::<Action>(), 1..24)) {
        test_logger();
        schedule_proptest_impl(actions).context("Error during proptest").unwrap();
    }
}

#[test]
fn test_scripted_schedule() {
    test_logger();

    schedule_proptest_impl(vec![
        Action::Register,
        Action::Register,
        Action::Register,
        Action::Contribute(1),
        Action::Contribute(0),
        Action::Wait(200),
        Action::Retrieve(2),
        Action::Abort(2),
        Action::Register,
        Action::SubmitGarbage(3),
        Action::Register,
        Action::Contribute(4),
    ])
    .unwrap();

    let clock = Arc::new(ManualClock::new(NOW));
    let coordinator = test_coordinator(clock).unwrap();
    let ticket = coordinator.register_participant().unwrap().ticket;
    let body = honest_submission(&coordinator, &ticket).unwrap();
    coordinator.submit_ceremony(&ticket, &body).unwrap();
    coordinator_is_consistent(&coordinator).unwrap();
}
