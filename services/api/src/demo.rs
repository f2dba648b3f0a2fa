use crate::directory::{agency_line, housegirl_line};
use crate::infra::{InMemoryCredentialRepository, OfflineDirectory, SandboxPaymentGateway};
use clap::Args;
use domestic_connect::backend::BackendClient;
use domestic_connect::config::{AppConfig, PaymentConfig};
use domestic_connect::error::AppError;
use domestic_connect::marketplace::accounts::{
    AccountService, AuthBackend, AuthStore, Credentials, PasswordPolicy, ProfileFields,
    RemoteAuthBackend, SignUpRequest, UserType,
};
use domestic_connect::marketplace::directory::{
    filter, AgencyCriteria, AgencyFilterParams, DirectoryLoader, DirectorySource,
    HousegirlCriteria, HousegirlFilterParams, HttpDirectorySource,
};
use domestic_connect::marketplace::payments::{
    find_package, standard_packages, Checkout, ConfirmationPolicy, HttpPaymentGateway,
    PaymentFlowController, PaymentGateway,
};
use domestic_connect::notifications::{Notification, NotificationCenter};
use std::sync::Arc;

const DEMO_PASSWORD: &str = "karibu-sana";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Location used to narrow both agencies and housegirls
    #[arg(long, default_value = "Nairobi")]
    pub(crate) location: String,
    /// Package to purchase: basic, premium, or international
    #[arg(long, default_value = "premium")]
    pub(crate) package: String,
    /// M-Pesa number used for the sandbox STK push
    #[arg(long, default_value = "0712345678")]
    pub(crate) phone: String,
    /// Pending status checks before the sandbox confirms the payment
    #[arg(long, default_value_t = 2)]
    pub(crate) pending_polls: u32,
    /// Run against the configured backend instead of in-memory collaborators
    #[arg(long)]
    pub(crate) backend: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            location: "Nairobi".to_string(),
            package: "premium".to_string(),
            phone: "0712345678".to_string(),
            pending_polls: 2,
            backend: false,
        }
    }
}

/// Everything the walkthrough talks to.
pub(crate) struct Collaborators {
    pub(crate) auth: Arc<dyn AuthBackend>,
    pub(crate) policy: PasswordPolicy,
    pub(crate) directory: Arc<dyn DirectorySource>,
    pub(crate) gateway: Arc<dyn PaymentGateway>,
    pub(crate) confirmation: ConfirmationPolicy,
    sandbox: Option<Arc<SandboxPaymentGateway>>,
}

impl Collaborators {
    /// In-process accounts, built-in listings, and a sandbox gateway that
    /// confirms without waiting.
    pub(crate) fn offline(policy: PasswordPolicy, pending_polls: u32) -> Self {
        let accounts = AccountService::new(
            Arc::new(InMemoryCredentialRepository::default()),
            policy,
        );
        let sandbox = Arc::new(SandboxPaymentGateway::new(pending_polls));
        Self {
            auth: Arc::new(accounts),
            policy,
            directory: Arc::new(OfflineDirectory),
            gateway: sandbox.clone(),
            confirmation: ConfirmationPolicy::immediate(),
            sandbox: Some(sandbox),
        }
    }

    /// The marketplace backend for accounts, listings, and M-Pesa, with
    /// polling timed by the payment configuration.
    pub(crate) fn remote(
        client: BackendClient,
        policy: PasswordPolicy,
        payments: &PaymentConfig,
    ) -> Self {
        Self {
            auth: Arc::new(RemoteAuthBackend::new(client.clone())),
            policy,
            directory: Arc::new(HttpDirectorySource::new(client.clone())),
            gateway: Arc::new(HttpPaymentGateway::new(client)),
            confirmation: ConfirmationPolicy::from(payments),
            sandbox: None,
        }
    }
}

/// What the walkthrough did, for rendering and assertions.
#[derive(Debug, Default)]
pub(crate) struct DemoSummary {
    pub(crate) signed_up: Vec<String>,
    pub(crate) agencies_shown: usize,
    pub(crate) housegirls_shown: usize,
    pub(crate) payment_id: Option<String>,
    pub(crate) toasts: Vec<Notification>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let policy = PasswordPolicy::new(config.auth.min_password_length);
    let collaborators = if args.backend {
        println!("Domestic Connect demo (backend {})", config.backend.base_url);
        Collaborators::remote(BackendClient::new(&config.backend)?, policy, &config.payments)
    } else {
        println!("Domestic Connect demo (offline)");
        Collaborators::offline(policy, args.pending_polls)
    };
    let summary = walkthrough(&args, &collaborators).await;

    println!("\nNotifications");
    for toast in &summary.toasts {
        println!("  [{:?}] {}: {}", toast.variant, toast.title, toast.description);
    }
    match &summary.payment_id {
        Some(id) => println!("\nPayment {id} recorded"),
        None => println!("\nNo payment was completed"),
    }
    if let Some(sandbox) = &collaborators.sandbox {
        println!(
            "Sandbox ledger: {} purchase(s), {} agency client(s)",
            sandbox.purchases().len(),
            sandbox.clients().len()
        );
    }
    Ok(())
}

pub(crate) async fn walkthrough(args: &DemoArgs, with: &Collaborators) -> DemoSummary {
    let notifications = Arc::new(NotificationCenter::default());
    let store = AuthStore::new(with.auth.clone(), notifications.clone())
        .with_policy(with.policy);
    let mut summary = DemoSummary::default();

    println!("\n1. Accounts");
    let worker = store
        .sign_up(SignUpRequest::new(
            "wanjiru@example.com",
            DEMO_PASSWORD,
            UserType::Housegirl,
            ProfileFields {
                first_name: Some("Wanjiru".to_string()),
                last_name: Some("Kamau".to_string()),
                ..ProfileFields::default()
            },
        ))
        .await;
    if let Some(user) = &worker.user {
        if let Some(details) = user.housegirl() {
            println!(
                "  housegirl {} signed up with defaults: {} | {} | KES {}",
                user.display_name(),
                details.location,
                details.education,
                details.expected_salary
            );
        }
        summary.signed_up.push(user.email.clone());
    }
    store.sign_out().await;

    let employer = store
        .sign_up(SignUpRequest::new(
            "peter.otieno@example.com",
            DEMO_PASSWORD,
            UserType::Employer,
            ProfileFields {
                first_name: Some("Peter".to_string()),
                last_name: Some("Otieno".to_string()),
                location: Some(args.location.clone()),
                ..ProfileFields::default()
            },
        ))
        .await;
    if let Some(user) = &employer.user {
        summary.signed_up.push(user.email.clone());
    }
    store.sign_out().await;

    let signed_in = store
        .sign_in(Credentials::new("peter.otieno@example.com", DEMO_PASSWORD))
        .await;
    let Some(client) = signed_in.user else {
        println!("  sign-in failed: {}", signed_in.error.unwrap_or_default());
        summary.toasts = notifications.drain();
        return summary;
    };
    println!("  employer {} signed in", client.display_name());

    println!("\n2. Directory");
    let loader = DirectoryLoader::new(with.directory.clone(), notifications.clone());
    let loaded = loader.agencies().await;
    println!("  listings from {:?}", loaded.source);
    let agencies = loaded.entities;
    let agency_criteria = AgencyCriteria::from(&AgencyFilterParams {
        location: Some(args.location.clone()),
        ..AgencyFilterParams::default()
    });
    let nearby = filter(&agencies, &agency_criteria);
    summary.agencies_shown = nearby.len();
    for agency in &nearby {
        println!("  {}", agency_line(agency));
    }

    let housegirls = loader.housegirls().await.entities;
    let housegirl_criteria = HousegirlCriteria::from(&HousegirlFilterParams {
        search: Some(args.location.clone()),
        living_arrangement: Some("Live-in".to_string()),
        ..HousegirlFilterParams::default()
    });
    let candidates = filter(&housegirls, &housegirl_criteria);
    summary.housegirls_shown = candidates.len();
    for housegirl in &candidates {
        println!("  {}", housegirl_line(housegirl));
    }

    println!("\n3. Payment");
    let package = find_package(&args.package).or_else(|| standard_packages().into_iter().next());
    match (nearby.first(), package) {
        (Some(agency), Some(package)) => {
            let flow = PaymentFlowController::new(
                with.gateway.clone(),
                notifications.clone(),
                with.confirmation.clone(),
            );
            let checkout = Checkout::new(&client, agency, package, args.phone.clone());
            println!("  {} for KES {}", checkout.description(), checkout.package.price);
            let outcome = flow
                .submit(&checkout, |record| {
                    println!("  confirmed: {}", record.transaction_id.as_deref().unwrap_or("-"));
                })
                .await;
            if let Ok(record) = outcome {
                summary.payment_id = Some(record.id);
            }
        }
        _ => println!("  no agency in {} to pay", args.location),
    }

    store.sign_out().await;
    summary.toasts = notifications.drain();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use domestic_connect::config::BackendConfig;
    use domestic_connect::marketplace::accounts::{account_router, CredentialRepository};
    use domestic_connect::marketplace::directory::{fallback_agencies, fallback_housegirls};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn offline() -> Collaborators {
        Collaborators::offline(PasswordPolicy::new(8), DemoArgs::default().pending_polls)
    }

    #[tokio::test]
    async fn walkthrough_completes_payment_offline() {
        let with = offline();
        let summary = walkthrough(&DemoArgs::default(), &with).await;

        assert_eq!(
            summary.signed_up,
            vec!["wanjiru@example.com", "peter.otieno@example.com"]
        );
        assert_eq!(summary.agencies_shown, 2);
        assert!(summary.housegirls_shown > 0);
        assert!(summary.payment_id.is_some());
        let sandbox = with.sandbox.as_ref().expect("offline sandbox");
        assert_eq!(sandbox.purchases().len(), 1);
        assert_eq!(sandbox.clients().len(), 1);
        assert!(summary
            .toasts
            .iter()
            .any(|toast| toast.title == "Payment Successful!"));
    }

    #[tokio::test]
    async fn invalid_phone_leaves_no_payment() {
        let args = DemoArgs {
            phone: "0712".to_string(),
            ..DemoArgs::default()
        };
        let with = offline();
        let summary = walkthrough(&args, &with).await;

        assert!(summary.payment_id.is_none());
        let sandbox = with.sandbox.as_ref().expect("offline sandbox");
        assert!(sandbox.purchases().is_empty());
        assert!(sandbox.clients().is_empty());
        assert!(summary
            .toasts
            .iter()
            .any(|toast| toast.title == "Invalid Phone Number"));
    }

    #[tokio::test]
    async fn password_policy_applies_to_every_sign_up() {
        let with = Collaborators::offline(PasswordPolicy::new(20), 0);
        let summary = walkthrough(&DemoArgs::default(), &with).await;

        assert!(summary.signed_up.is_empty());
        assert!(summary.payment_id.is_none());
    }

    #[derive(Default)]
    struct Ledger {
        purchases: AtomicUsize,
        clients: AtomicUsize,
    }

    async fn record_purchase(State(ledger): State<Arc<Ledger>>) -> Json<Value> {
        ledger.purchases.fetch_add(1, Ordering::SeqCst);
        Json(json!({ "success": true }))
    }

    async fn record_client(State(ledger): State<Arc<Ledger>>) -> Json<Value> {
        ledger.clients.fetch_add(1, Ordering::SeqCst);
        Json(json!({ "success": true }))
    }

    #[tokio::test]
    async fn walkthrough_runs_against_the_backend() {
        let repository = Arc::new(InMemoryCredentialRepository::default());
        let accounts = Arc::new(AccountService::new(repository.clone(), PasswordPolicy::new(8)));
        let ledger = Arc::new(Ledger::default());
        let marketplace = Router::new()
            .route("/agencies", get(|| async { Json(fallback_agencies()) }))
            .route(
                "/housegirl_profiles",
                get(|| async { Json(fallback_housegirls()) }),
            )
            .route(
                "/api/mpesa/stkpush",
                post(|| async {
                    Json(json!({ "success": true, "data": { "CheckoutRequestID": "ws_CO_demo" } }))
                }),
            )
            .route(
                "/api/mpesa/transaction-status",
                post(|| async {
                    Json(json!({
                        "success": true,
                        "data": { "ResultCode": 0, "TransactionID": "QKDEMO1" }
                    }))
                }),
            )
            .route("/api/payments/purchase", post(record_purchase))
            .route("/api/agencies/clients", post(record_client))
            .with_state(ledger.clone())
            .merge(account_router(accounts));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, marketplace).await.expect("stub server");
        });
        let client = BackendClient::new(&BackendConfig {
            base_url: format!("http://{addr}").parse().expect("stub url"),
            timeout: Duration::from_secs(5),
        })
        .expect("client builds");
        let payments = PaymentConfig {
            initial_poll_delay: Duration::ZERO,
            max_poll_attempts: 3,
            max_poll_delay: Duration::ZERO,
            success_display_delay: Duration::ZERO,
            success_result_code: "0".to_string(),
        };

        let with = Collaborators::remote(client, PasswordPolicy::new(8), &payments);
        let summary = walkthrough(&DemoArgs::default(), &with).await;

        assert_eq!(summary.agencies_shown, 2);
        assert!(summary.payment_id.is_some());
        assert_eq!(ledger.purchases.load(Ordering::SeqCst), 1);
        assert_eq!(ledger.clients.load(Ordering::SeqCst), 1);
        assert!(repository
            .fetch("peter.otieno@example.com")
            .expect("repository readable")
            .is_some());
        assert!(with.sandbox.is_none());
    }
}
