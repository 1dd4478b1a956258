// tests/property/gate_test.rs

//! Property-based tests for the authorization gate.

use crate::test_helpers::{PRINCIPAL, TestContext};
use opsrelay::core::handler::{DispatchOutcome, GateDecision, authorize};
use opsrelay::core::protocol::{InboundMessage, Principal};
use proptest::prelude::*;

fn stranger_id() -> impl Strategy<Value = String> {
    "[0-9]{1,12}".prop_filter("must not be the principal", |id| id != PRINCIPAL)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_chatter_is_ignored_for_any_sender(
        sender in "[0-9]{1,12}",
        text in "[a-zA-Z0-9 .,!?]{0,60}",
    ) {
        let principal = Principal::new(PRINCIPAL);
        let message = InboundMessage::new(sender, text, 0);
        prop_assert_eq!(authorize(&principal, &message), GateDecision::Ignored);
    }

    #[test]
    fn test_stranger_commands_are_always_denied(
        sender in stranger_id(),
        body in "[a-z_@ ]{0,30}",
    ) {
        let principal = Principal::new(PRINCIPAL);
        let message = InboundMessage::new(sender, format!("/{body}"), 0);
        prop_assert_eq!(authorize(&principal, &message), GateDecision::Denied);
    }

    #[test]
    fn test_stranger_chatter_never_reaches_the_transport(
        sender in stranger_id(),
        text in "[a-zA-Z0-9 .,!?]{0,60}",
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new();
            let outcome = ctx.send(&sender, &text).await;
            assert_eq!(outcome, DispatchOutcome::Ignored);
            assert!(ctx.sent().is_empty());
        });
    }

    #[test]
    fn test_stranger_command_gets_exactly_one_denial(
        sender in stranger_id(),
        keyword in "(status|backup|update|logs|[a-z]{1,10})",
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new();
            let outcome = ctx.send(&sender, &format!("/{keyword}")).await;
            assert_eq!(outcome, DispatchOutcome::Denied);
            let response = ctx.single_response();
            assert!(response.text().contains("Access denied"));
            assert!(ctx.runner.invocations().is_empty());
        });
    }
}
