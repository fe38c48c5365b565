//! Property-based tests for the session state machine
//!
//! These verify the protocol invariants hold across arbitrary event sequences:
//! - Every function call received while a session exists is answered exactly once
//! - Acknowledgements keep wire order and reference the call they answer
//! - Gesture notices are never reordered or coalesced
//! - Teardown always lands in `Disconnected`

use super::*;
use crate::gesture::GestureSignal;
use crate::live::protocol::FunctionCall;
use crate::live::tool::SET_HAND_GESTURE;
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_call() -> impl Strategy<Value = FunctionCall> {
    (
        "[a-z0-9]{4,12}",
        prop_oneof![
            4 => Just(SET_HAND_GESTURE.to_string()),
            1 => "[a-zA-Z]{3,10}",
        ],
        prop_oneof![
            Just(json!({ "gesture": "OPEN" })),
            Just(json!({ "gesture": "CLOSED" })),
            Just(json!({})),
        ],
    )
        .prop_map(|(id, name, args)| FunctionCall::new(id, name, args))
}

fn arb_event() -> impl Strategy<Value = SessionEvent> {
    prop_oneof![
        Just(SessionEvent::ConnectRequested),
        Just(SessionEvent::DisconnectRequested),
        Just(SessionEvent::Opened),
        proptest::collection::vec(arb_call(), 1..4)
            .prop_map(|calls| SessionEvent::ToolCall { calls }),
        proptest::collection::vec("[a-z]{4}", 0..3)
            .prop_map(|ids| SessionEvent::ToolCallCancelled { ids }),
        Just(SessionEvent::GoAway { time_left: None }),
        Just(SessionEvent::Closed { reason: None }),
        "[a-z ]{1,20}".prop_map(|message| SessionEvent::TransportError { message }),
    ]
}

fn expected_gesture(call: &FunctionCall) -> GestureSignal {
    if call.args.get("gesture").and_then(|g| g.as_str()) == Some("OPEN") {
        GestureSignal::Open
    } else {
        GestureSignal::Closed
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_every_call_answered_once_in_order(
        events in proptest::collection::vec(arb_event(), 1..30),
    ) {
        let mut state = SessionState::Disconnected;

        for event in events {
            let calls = match &event {
                SessionEvent::ToolCall { calls } => Some(calls.clone()),
                _ => None,
            };
            let was_active = state.is_active();

            let Ok(result) = transition(&state, event) else {
                // Only a duplicate connect is rejected, and it changes nothing
                prop_assert!(state.is_active());
                continue;
            };

            if let Some(calls) = calls {
                let acks: Vec<_> = result
                    .effects
                    .iter()
                    .filter_map(|e| match e {
                        Effect::SendToolResponse { response } => Some(response.id.clone()),
                        _ => None,
                    })
                    .collect();
                let gestures: Vec<_> = result
                    .effects
                    .iter()
                    .filter_map(|e| match e {
                        Effect::NotifyGesture { gesture } => Some(*gesture),
                        _ => None,
                    })
                    .collect();

                if was_active {
                    let ids: Vec<_> = calls.iter().map(|c| c.id.clone()).collect();
                    prop_assert_eq!(acks, ids);
                    let wanted: Vec<_> = calls
                        .iter()
                        .filter(|c| c.name == SET_HAND_GESTURE)
                        .map(expected_gesture)
                        .collect();
                    prop_assert_eq!(gestures, wanted);
                } else {
                    prop_assert!(acks.is_empty());
                    prop_assert!(gestures.is_empty());
                }
            }

            state = result.new_state;
        }
    }

    #[test]
    fn prop_gesture_notice_precedes_its_ack(
        calls in proptest::collection::vec(arb_call(), 1..6),
    ) {
        let result = transition(&SessionState::Connected, SessionEvent::ToolCall { calls }).unwrap();
        let mut pending_gesture = false;
        for effect in &result.effects {
            match effect {
                Effect::NotifyGesture { .. } => {
                    prop_assert!(!pending_gesture, "two notices without an ack between");
                    pending_gesture = true;
                }
                Effect::SendToolResponse { .. } => pending_gesture = false,
                other => prop_assert!(false, "unexpected effect {:?}", other),
            }
        }
        prop_assert!(!pending_gesture);
    }

    #[test]
    fn prop_teardown_always_disconnects(
        prefix in proptest::collection::vec(arb_event(), 0..15),
        teardown in prop_oneof![
            Just(SessionEvent::DisconnectRequested),
            Just(SessionEvent::Closed { reason: None }),
            Just(SessionEvent::TransportError { message: "boom".to_string() }),
        ],
    ) {
        let mut state = SessionState::Disconnected;
        for event in prefix {
            if let Ok(result) = transition(&state, event) {
                state = result.new_state;
            }
        }
        let result = transition(&state, teardown).unwrap();
        prop_assert_eq!(result.new_state, SessionState::Disconnected);
        prop_assert!(!result.effects.contains(&Effect::StartFrameStream));
        prop_assert!(!result.effects.contains(&Effect::status(true)));
    }

    #[test]
    fn prop_connected_status_only_on_open(
        events in proptest::collection::vec(arb_event(), 1..30),
    ) {
        let mut state = SessionState::Disconnected;
        for event in events {
            let is_open = matches!(event, SessionEvent::Opened);
            let before = state;
            if let Ok(result) = transition(&state, event) {
                if result.effects.contains(&Effect::status(true)) {
                    prop_assert!(is_open);
                    prop_assert_eq!(before, SessionState::Connecting);
                    prop_assert_eq!(result.new_state, SessionState::Connected);
                }
                state = result.new_state;
            }
        }
    }
}
