mod common;

use std::collections::HashSet;

use proptest::prelude::*;
use seating_server::services::SwapRequest;
use seating_server::utils::error::AppError;

use common::*;

const SEATS: [&str; 6] = ["D1", "D2", "D3", "D4", "D5", "D6"];

fn run_swaps(ops: Vec<(usize, usize)>) -> Result<(), TestCaseError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .map_err(|e| TestCaseError::fail(e.to_string()))?;

    runtime.block_on(async move {
        let h = harness();
        let tickets: Vec<_> = SEATS[..4]
            .iter()
            .map(|seat| booked_ticket(&h.store, seat, &zone1()))
            .collect();

        let handles: Vec<_> = ops
            .into_iter()
            .map(|(ticket, seat)| {
                let engine = h.state.allocation.clone();
                let request = SwapRequest {
                    ticket_id: tickets[ticket].id,
                    seat: SEATS[seat].to_string(),
                    event_id: event_id(),
                    schedule_id: "S1".to_string(),
                    price_category_id: ZONE1_ID,
                };
                tokio::spawn(async move { engine.swap_seat(request).await })
            })
            .collect();

        for handle in handles {
            let outcome = handle
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert!(
                matches!(outcome, Ok(_) | Err(AppError::SeatConflict(_))),
                "unexpected outcome: {:?}",
                outcome
            );
        }

        let mut taken = HashSet::new();
        for ticket in h.store.tickets() {
            if let Some(seat) = ticket.occupied_seat() {
                prop_assert!(
                    taken.insert((ticket.event_schedule_id.clone(), seat.to_string())),
                    "seat {} is held by two live tickets",
                    seat
                );
            }
        }
        prop_assert_eq!(taken.len(), 4);
        Ok(())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn concurrent_swaps_never_double_book(
        ops in prop::collection::vec((0usize..4, 0usize..SEATS.len()), 1..16)
    ) {
        run_swaps(ops)?;
    }
}
