mod support;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use domestic_connect::marketplace::accounts::{
    EmployerDetails, IdentitySource, RoleProfile, User, UserId,
};
use domestic_connect::marketplace::directory::fallback_agencies;
use domestic_connect::marketplace::payments::{
    find_package, Checkout, ConfirmationPolicy, HttpPaymentGateway, PaymentError,
    PaymentFlowController, PaymentStep,
};
use domestic_connect::notifications::NotificationCenter;
use serde_json::{json, Value};
use support::backend_stub;

fn employer() -> User {
    let now = Utc::now();
    User {
        id: UserId("user_42".to_string()),
        email: "mama.wanjiru@example.com".to_string(),
        first_name: "Mama".to_string(),
        last_name: "Wanjiru".to_string(),
        phone_number: None,
        created_at: now,
        updated_at: now,
        identity: IdentitySource::Password,
        profile: RoleProfile::Employer(EmployerDetails::default()),
    }
}

#[tokio::test]
async fn declined_prompt_returns_to_details_without_continuation() {
    let purchases = Arc::new(Mutex::new(Vec::<Value>::new()));
    let recorded = purchases.clone();
    let router = Router::new()
        .route(
            "/api/mpesa/stkpush",
            post(|| async {
                Json(json!({
                    "success": true,
                    "data": { "CheckoutRequestID": "ws_CO_1", "MerchantRequestID": "m_1" }
                }))
            }),
        )
        .route(
            "/api/mpesa/transaction-status",
            post(|| async {
                Json(json!({
                    "success": true,
                    "data": { "ResultCode": "1", "ResultDesc": "The balance is insufficient" }
                }))
            }),
        )
        .route(
            "/api/payments/purchase",
            post(move |Json(body): Json<Value>| async move {
                recorded.lock().expect("purchases lock").push(body);
                Json(json!({ "success": true }))
            }),
        );
    let client = backend_stub(router).await;
    let notifications = Arc::new(NotificationCenter::default());
    let flow = PaymentFlowController::new(
        Arc::new(HttpPaymentGateway::new(client)),
        notifications.clone(),
        ConfirmationPolicy::immediate(),
    );

    let agency = &fallback_agencies()[0];
    let checkout = Checkout::new(
        &employer(),
        agency,
        find_package("basic").expect("basic package"),
        "0712345678",
    );
    let continued = AtomicBool::new(false);

    let outcome = flow
        .submit(&checkout, |_| continued.store(true, Ordering::SeqCst))
        .await;

    match outcome {
        Err(PaymentError::NotCompleted { result_code, .. }) => assert_eq!(result_code, "1"),
        other => panic!("expected NotCompleted, got {other:?}"),
    }
    assert_eq!(flow.step(), PaymentStep::Details);
    assert!(!continued.load(Ordering::SeqCst));
    assert!(purchases.lock().expect("purchases lock").is_empty());
    assert_eq!(
        notifications.last().map(|toast| toast.title),
        Some("Payment Failed".to_string())
    );
}
