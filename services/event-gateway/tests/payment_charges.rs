mod support;

use event_gateway::payment::{CHARGE_CURRENCY, CHARGE_DESCRIPTION};
use event_gateway::{ChargeError, ChargeOrder, PaymentGateway, PaymentProcessor, StripeProcessor};
use httpmock::prelude::*;
use serde_json::json;
use support::{client, config_for, metrics, RecordingProcessor, STRIPE_KEY};

fn order(source: &str, amount: i64, idempotency_key: Option<&str>) -> ChargeOrder {
    ChargeOrder {
        source: source.to_string(),
        amount,
        currency: CHARGE_CURRENCY,
        description: CHARGE_DESCRIPTION,
        idempotency_key: idempotency_key.map(str::to_string),
    }
}

#[tokio::test]
async fn accepted_charge_returns_confirmation_after_one_call() {
    let processor = RecordingProcessor::approving();
    let gateway = PaymentGateway::new(processor.clone(), metrics());

    for amount in [1_i64, 1500, 250_000] {
        let result = gateway.charge_payment("tok_visa", amount).await;
        assert!(result.success);
        assert_eq!(result.next_step.as_deref(), Some("confirmation"));
        assert!(result.message.is_none());
    }

    let orders = processor.orders();
    assert_eq!(orders.len(), 3);
    assert_eq!(orders[1], order("tok_visa", 1500, None));
    assert!(orders.iter().all(|o| o.currency == "cad" && o.description == "Test charge"));
}

#[tokio::test]
async fn rejected_charge_returns_processor_message_without_retry() {
    let processor = RecordingProcessor::declining("Your card was declined.");
    let gateway_metrics = metrics();
    let gateway = PaymentGateway::new(processor.clone(), gateway_metrics.clone());

    let result = gateway.charge_payment("tok_chargeDeclined", 2000).await;
    assert!(!result.success);
    assert_eq!(result.message.as_deref(), Some("Your card was declined."));
    assert!(result.next_step.is_none());
    assert_eq!(processor.orders().len(), 1);
    assert_eq!(gateway_metrics.upstream_count("charge", "declined"), 1);
}

#[tokio::test]
async fn idempotency_key_is_only_attached_when_supplied() {
    let processor = RecordingProcessor::approving();
    let gateway = PaymentGateway::new(processor.clone(), metrics());

    gateway.charge_payment("tok_visa", 900).await;
    gateway
        .charge_payment_with_key("tok_visa", 900, Some("order-77"))
        .await;

    let orders = processor.orders();
    assert_eq!(orders[0].idempotency_key, None);
    assert_eq!(orders[1].idempotency_key.as_deref(), Some("order-77"));
}

#[tokio::test]
async fn stripe_processor_posts_form_encoded_charge() {
    let server = MockServer::start_async().await;
    let charges = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/charges")
                .header("authorization", format!("Bearer {STRIPE_KEY}"))
                .header("content-type", "application/x-www-form-urlencoded")
                .body("amount=1500&currency=cad&source=tok_visa&description=Test+charge");
            then.status(200).json_body(json!({
                "id": "ch_123",
                "object": "charge",
                "amount": 1500,
                "currency": "cad",
                "status": "succeeded"
            }));
        })
        .await;

    let config = config_for(&server.base_url(), &server.base_url());
    let processor = StripeProcessor::new(client(), &config.stripe);
    let receipt = processor
        .create_charge(&order("tok_visa", 1500, None))
        .await
        .expect("charge");
    assert_eq!(receipt.id, "ch_123");
    assert_eq!(receipt.status, "succeeded");
    charges.assert_async().await;
}

#[tokio::test]
async fn stripe_processor_forwards_idempotency_key() {
    let server = MockServer::start_async().await;
    let charges = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/charges")
                .header("idempotency-key", "order-77");
            then.status(200).json_body(json!({ "id": "ch_9", "amount": 10, "status": "pending" }));
        })
        .await;

    let config = config_for(&server.base_url(), &server.base_url());
    let processor = StripeProcessor::new(client(), &config.stripe);
    processor
        .create_charge(&order("tok_visa", 10, Some("order-77")))
        .await
        .expect("charge");
    charges.assert_async().await;
}

#[tokio::test]
async fn stripe_decline_surfaces_error_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/charges");
            then.status(402).json_body(json!({
                "error": {
                    "type": "card_error",
                    "code": "card_declined",
                    "decline_code": "insufficient_funds",
                    "message": "Your card has insufficient funds."
                }
            }));
        })
        .await;

    let config = config_for(&server.base_url(), &server.base_url());
    let processor = StripeProcessor::new(client(), &config.stripe);
    let err = processor
        .create_charge(&order("tok_chargeDeclinedInsufficientFunds", 5000, None))
        .await
        .expect_err("decline");
    match &err {
        ChargeError::Declined { status, code, message } => {
            assert_eq!(status.as_u16(), 402);
            assert_eq!(code.as_deref(), Some("insufficient_funds"));
            assert_eq!(message, "Your card has insufficient funds.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.public_message(), "Your card has insufficient funds.");
}

#[tokio::test]
async fn stripe_gateway_failure_reports_generic_message() {
    let server = MockServer::start_async().await;
    let charges = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/charges");
            then.status(502).body("bad gateway");
        })
        .await;

    let config = config_for(&server.base_url(), &server.base_url());
    let processor = std::sync::Arc::new(StripeProcessor::new(client(), &config.stripe));
    let gateway = PaymentGateway::new(processor, metrics());
    let result = gateway.charge_payment("tok_visa", 100).await;
    assert!(!result.success);
    assert_eq!(
        result.message.as_deref(),
        Some("Unexpected response from the payment processor.")
    );
    charges.assert_hits_async(1).await;
}

#[tokio::test]
async fn unreachable_processor_reports_connection_message() {
    // Nothing listens on port 9 of the loopback interface.
    let config = config_for("http://127.0.0.1:9", "http://127.0.0.1:9");
    let processor = std::sync::Arc::new(StripeProcessor::new(client(), &config.stripe));
    let metrics = metrics();
    let gateway = PaymentGateway::new(processor, metrics.clone());
    let result = gateway.charge_payment("tok_visa", 100).await;
    assert!(!result.success);
    assert_eq!(result.next_step, None);
    assert_eq!(
        result.message.as_deref(),
        Some("An error occurred with our connection to the payment processor.")
    );
    assert_eq!(metrics.upstream_count("charge", "transport"), 1);
}

