// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// startPay contract, exercised end to end against the desktop stub platform.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use redotpay_bridge::RedotPayBridge;
use redotpay_bridge::stub::StubPlatform;
use redotpay_bridge::traits::PaymentPlatform;
use redotpay_core::error::{PayBridgeError, REQUIRED_FIELDS};
use redotpay_core::types::{
    DismissReason, ErrorClass, PaymentOutcome, PaymentRequestConfig, RejectCode, SessionState,
};
use redotpay_core::{BridgeConfig, EnvironmentSnapshot};

fn bag() -> Value {
    json!({
        "preOrderId": "PO1",
        "jwtToken": "t",
        "publicKey": "pk",
        "language": "en",
        "isTest": true,
    })
}

fn simulated() -> (Arc<StubPlatform>, RedotPayBridge) {
    let platform = Arc::new(StubPlatform::simulated().unwrap());
    let bridge = RedotPayBridge::new(platform.clone(), BridgeConfig::default());
    (platform, bridge)
}

fn rejection_code(outcome: &PaymentOutcome) -> Option<RejectCode> {
    outcome.rejection().map(|r| r.code)
}

async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

#[tokio::test]
async fn launch_with_host_resolves_success_once() {
    let (platform, bridge) = simulated();

    let outcome = bridge.start_pay(&bag()).await;

    assert_eq!(outcome, PaymentOutcome::Success);
    assert_eq!(outcome.to_json(), json!({ "success": true }));
    assert_eq!(platform.presentation_count(), 1);
    assert_eq!(platform.presented_orders(), vec!["PO1".to_owned()]);
    assert!(bridge.environment().is_test());
    assert_eq!(bridge.environment().language(), "en");
    assert_eq!(
        platform.applied_environments(),
        vec![EnvironmentSnapshot {
            is_test: true,
            language: "en".into(),
        }]
    );
    assert_eq!(bridge.state(), SessionState::Active);
}

#[tokio::test]
async fn missing_field_never_reaches_orchestration() {
    for field in REQUIRED_FIELDS {
        let (platform, bridge) = simulated();
        let mut params = bag();
        params.as_object_mut().unwrap().remove(field);

        let outcome = bridge.start_pay(&params).await;

        assert_eq!(rejection_code(&outcome), Some(RejectCode::InvalidParams), "{field}");
        let message = &outcome.rejection().unwrap().message;
        assert!(message.starts_with(
            "Missing required parameters: preOrderId, jwtToken, publicKey, language, isTest"
        ));
        assert!(message.contains(&format!("{field}: missing")));
        assert_eq!(platform.host_lookup_count(), 0);
        assert_eq!(platform.presentation_count(), 0);
        assert_eq!(platform.preload_count(), 0);
        assert!(platform.applied_environments().is_empty());
        assert_eq!(bridge.state(), SessionState::Idle);
    }
}

#[tokio::test]
async fn mistyped_test_flag_is_invalid() {
    let (platform, bridge) = simulated();
    let mut params = bag();
    params["isTest"] = json!("true");

    let outcome = bridge.start_pay(&params).await;

    assert_eq!(rejection_code(&outcome), Some(RejectCode::InvalidParams));
    assert!(outcome
        .rejection()
        .unwrap()
        .message
        .contains("isTest: expected boolean, found string"));
    assert_eq!(platform.presentation_count(), 0);
}

#[tokio::test]
async fn absent_module_fails_before_validation() {
    let platform = Arc::new(StubPlatform::unavailable().unwrap());
    let bridge = RedotPayBridge::new(platform.clone(), BridgeConfig::default());

    // Even a malformed bag reports the missing module, not the bad input.
    assert!(matches!(
        bridge.begin_pay(&json!({ "preOrderId": 1 })),
        Err(PayBridgeError::ModuleNotLoaded)
    ));

    let outcome = bridge.start_pay(&bag()).await;
    assert_eq!(rejection_code(&outcome), Some(RejectCode::ModuleNotLoaded));
    assert_eq!(platform.host_lookup_count(), 0);
    assert!(platform.applied_environments().is_empty());
    assert!(!bridge.environment().is_test());
}

#[tokio::test]
async fn no_host_rejects_with_start_pay_failed() {
    let (platform, bridge) = simulated();
    platform.set_host_available(false);

    let outcome = bridge.start_pay(&bag()).await;

    assert_eq!(rejection_code(&outcome), Some(RejectCode::StartPayFailed));
    assert!(outcome
        .rejection()
        .unwrap()
        .message
        .contains("no presentation host"));
    assert_eq!(platform.host_lookup_count(), 1);
    assert_eq!(platform.presentation_count(), 0);
    assert_eq!(bridge.state(), SessionState::Idle);

    // Host shows up later; the caller may simply try again.
    platform.set_host_available(true);
    assert_eq!(bridge.start_pay(&bag()).await, PaymentOutcome::Success);
}

#[tokio::test]
async fn sdk_refusal_rejects_and_frees_the_slot() {
    let (platform, bridge) = simulated();
    platform.set_presentation_refused(true);

    let outcome = bridge.start_pay(&bag()).await;

    assert_eq!(rejection_code(&outcome), Some(RejectCode::StartPayFailed));
    let rejection = outcome.rejection().unwrap();
    assert!(rejection.message.contains("payment controller refused"));
    assert_eq!(rejection.class, ErrorClass::Permanent);
    assert_eq!(platform.presentation_count(), 0);
    assert_eq!(bridge.state(), SessionState::Idle);

    platform.set_presentation_refused(false);
    assert_eq!(bridge.start_pay(&bag()).await, PaymentOutcome::Success);
    assert_eq!(platform.presentation_count(), 1);
}

#[tokio::test]
async fn platform_error_during_launch_is_start_pay_failed() {
    let (platform, bridge) = simulated();
    platform.set_environment_fails(true);

    let outcome = bridge.start_pay(&bag()).await;

    assert_eq!(rejection_code(&outcome), Some(RejectCode::StartPayFailed));
    assert_eq!(outcome.to_json()["code"], "START_PAY_FAILED");
    assert!(outcome
        .rejection()
        .unwrap()
        .message
        .contains("stub could not set SDK environment"));
    assert_eq!(platform.host_lookup_count(), 0);
    assert_eq!(bridge.state(), SessionState::Idle);

    // The boolean form agrees: no sheet, so `false`.
    let request = PaymentRequestConfig::new("PO1", "t", "pk", "en", true);
    assert!(!bridge.orchestrator().start_pay(&request, bridge.environment()));
}

#[tokio::test]
async fn accepted_call_reads_as_validating_until_launched() {
    let (platform, bridge) = simulated();

    // Hold the main context so the launch cannot run yet.
    let (release, gate) = std::sync::mpsc::channel::<()>();
    platform.main_context().run_on_main(Box::new(move || {
        let _ = gate.recv();
    }));

    let pending = bridge.begin_pay(&bag()).unwrap();
    assert_eq!(bridge.state(), SessionState::Validating);
    assert_eq!(platform.host_lookup_count(), 0);

    release.send(()).unwrap();
    assert_eq!(pending.await, PaymentOutcome::Success);
    assert_eq!(bridge.state(), SessionState::Active);
}

#[tokio::test]
async fn empty_pre_order_id_is_not_rejected() {
    let (platform, bridge) = simulated();
    let mut params = bag();
    params["preOrderId"] = json!("");
    params["isTest"] = json!(false);

    let outcome = bridge.start_pay(&params).await;

    assert_eq!(outcome, PaymentOutcome::Success);
    assert_eq!(platform.presented_orders(), vec![String::new()]);
    assert!(!bridge.environment().is_test());
}

#[tokio::test]
async fn double_dismissal_closes_the_sheet_once() {
    let (platform, bridge) = simulated();
    assert!(bridge.start_pay(&bag()).await.is_success());

    assert!(platform.dismiss_sheet(DismissReason::UserClosed));
    assert!(!platform.dismiss_sheet(DismissReason::UserClosed));

    let sessions = bridge.orchestrator().sessions();
    assert!(wait_until(|| sessions.state() == SessionState::Dismissed).await);
    assert_eq!(platform.dismissal_count(), 1);
    assert_eq!(
        sessions.last_closed().map(|c| c.reason),
        Some(DismissReason::UserClosed)
    );
}

#[tokio::test]
async fn second_call_rejected_while_sheet_is_open() {
    let (platform, bridge) = simulated();
    assert!(bridge.start_pay(&bag()).await.is_success());

    let mut other = bag();
    other["preOrderId"] = json!("PO2");
    other["language"] = json!("zh");
    let outcome = bridge.start_pay(&other).await;

    assert_eq!(rejection_code(&outcome), Some(RejectCode::PaymentInProgress));
    assert_eq!(platform.presentation_count(), 1);
    assert_eq!(bridge.environment().language(), "en");

    platform.dismiss_sheet(DismissReason::FlowCompleted);
    let sessions = bridge.orchestrator().sessions();
    assert!(wait_until(|| !sessions.is_busy()).await);

    assert!(bridge.start_pay(&other).await.is_success());
    assert_eq!(platform.presented_orders(), vec!["PO1".to_owned(), "PO2".to_owned()]);
    assert_eq!(bridge.environment().language(), "zh");
}

#[tokio::test]
async fn overlapping_calls_settle_one_success() {
    let (platform, bridge) = simulated();

    let first = bridge.begin_pay(&bag()).unwrap();
    let second = bridge.begin_pay(&bag()).unwrap();

    assert_eq!(rejection_code(&second.await), Some(RejectCode::PaymentInProgress));
    assert_eq!(first.await, PaymentOutcome::Success);
    assert_eq!(platform.presentation_count(), 1);
}

#[tokio::test]
async fn preload_failure_does_not_block_launch() {
    let (platform, bridge) = simulated();
    platform.set_preload_fails(true);

    assert!(bridge.start_pay(&bag()).await.is_success());
    assert!(wait_until(|| platform.preload_count() == 1).await);
}

#[tokio::test]
async fn desktop_platform_has_no_module() {
    let bridge = redotpay_bridge::bridge(BridgeConfig::default()).unwrap();
    let outcome = bridge.start_pay(&bag()).await;
    assert_eq!(rejection_code(&outcome), Some(RejectCode::ModuleNotLoaded));
}

#[test]
fn module_registration_metadata() {
    let platform = Arc::new(StubPlatform::simulated().unwrap());
    let config = BridgeConfig {
        module_name: "PayBridge".into(),
        ..Default::default()
    };
    let bridge = RedotPayBridge::new(platform, config);
    assert_eq!(bridge.module_name(), "PayBridge");
    assert!(RedotPayBridge::requires_main_queue_setup());
}
