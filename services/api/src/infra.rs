use async_trait::async_trait;
use domestic_connect::backend::ApiError;
use domestic_connect::marketplace::accounts::{
    CredentialRecord, CredentialRepository, RepositoryError,
};
use domestic_connect::marketplace::directory::{AgencyProfile, DirectorySource, HousegirlProfile};
use domestic_connect::marketplace::payments::{
    AgencyClientRecord, PaymentError, PaymentGateway, PaymentRecord, StatusReport,
    StkPushAccepted, StkPushRequest,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn locked<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
}

/// Process-local credential store keyed by normalized email.
#[derive(Default, Clone)]
pub(crate) struct InMemoryCredentialRepository {
    records: Arc<Mutex<HashMap<String, CredentialRecord>>>,
}

impl CredentialRepository for InMemoryCredentialRepository {
    fn insert(&self, record: CredentialRecord) -> Result<CredentialRecord, RepositoryError> {
        let mut guard = locked(&self.records)?;
        if guard.contains_key(&record.email) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.email.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: CredentialRecord) -> Result<(), RepositoryError> {
        let mut guard = locked(&self.records)?;
        if guard.contains_key(&record.email) {
            guard.insert(record.email.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, email: &str) -> Result<Option<CredentialRecord>, RepositoryError> {
        let guard = locked(&self.records)?;
        Ok(guard.get(email).cloned())
    }
}

/// Directory source for runs without a backend; every load falls back.
pub(crate) struct OfflineDirectory;

#[async_trait]
impl DirectorySource for OfflineDirectory {
    async fn agencies(&self) -> Result<Vec<AgencyProfile>, ApiError> {
        Err(ApiError::Transport("offline mode".to_string()))
    }

    async fn housegirls(&self) -> Result<Vec<HousegirlProfile>, ApiError> {
        Err(ApiError::Transport("offline mode".to_string()))
    }
}

/// Gateway that approves every push after a configurable number of pending polls.
#[derive(Default)]
pub(crate) struct SandboxPaymentGateway {
    pending_polls: u32,
    polls: AtomicU32,
    purchases: Mutex<Vec<PaymentRecord>>,
    clients: Mutex<Vec<AgencyClientRecord>>,
}

impl SandboxPaymentGateway {
    pub(crate) fn new(pending_polls: u32) -> Self {
        Self {
            pending_polls,
            ..Self::default()
        }
    }

    pub(crate) fn purchases(&self) -> Vec<PaymentRecord> {
        self.purchases
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub(crate) fn clients(&self) -> Vec<AgencyClientRecord> {
        self.clients
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for SandboxPaymentGateway {
    async fn initiate_stk_push(
        &self,
        request: &StkPushRequest,
    ) -> Result<StkPushAccepted, PaymentError> {
        if request.amount == 0 {
            return Err(PaymentError::Rejected("Amount must be positive".to_string()));
        }
        self.polls.store(0, Ordering::SeqCst);
        Ok(StkPushAccepted {
            checkout_request_id: format!("ws_CO_sandbox_{}", request.reference),
            merchant_request_id: Some("sandbox".to_string()),
        })
    }

    async fn transaction_status(
        &self,
        checkout_request_id: &str,
    ) -> Result<StatusReport, PaymentError> {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst);
        if poll < self.pending_polls {
            return Ok(StatusReport {
                result_desc: Some("The transaction is being processed".to_string()),
                ..StatusReport::default()
            });
        }
        Ok(StatusReport {
            result_code: Some("0".to_string()),
            result_desc: Some("The service request is processed successfully.".to_string()),
            transaction_id: Some(format!("SBX{}", checkout_request_id.len() + poll as usize)),
        })
    }

    async fn record_purchase(&self, record: &PaymentRecord) -> Result<(), PaymentError> {
        self.purchases
            .lock()
            .map_err(|_| PaymentError::Rejected("sandbox ledger unavailable".to_string()))?
            .push(record.clone());
        Ok(())
    }

    async fn register_agency_client(
        &self,
        record: &AgencyClientRecord,
    ) -> Result<(), PaymentError> {
        self.clients
            .lock()
            .map_err(|_| PaymentError::Rejected("sandbox ledger unavailable".to_string()))?
            .push(record.clone());
        Ok(())
    }
}
