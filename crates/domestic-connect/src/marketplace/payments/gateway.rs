use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{AgencyClientRecord, PaymentRecord};
use crate::backend::{ApiError, BackendClient};

pub const STK_PUSH_PATH: &str = "/api/mpesa/stkpush";
pub const TRANSACTION_STATUS_PATH: &str = "/api/mpesa/transaction-status";
pub const PURCHASE_PATH: &str = "/api/payments/purchase";
pub const AGENCY_CLIENTS_PATH: &str = "/api/agencies/clients";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    #[error("Please enter a valid phone number")]
    InvalidPhone,
    #[error("A payment is already being processed")]
    InProgress,
    #[error("{0}")]
    Rejected(String),
    #[error("Payment was not completed successfully")]
    NotCompleted {
        result_code: String,
        description: Option<String>,
    },
    #[error("Payment confirmation timed out after {attempts} status checks")]
    ConfirmationTimedOut { attempts: u32 },
    #[error(transparent)]
    Network(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StkPushRequest {
    pub phone_number: String,
    pub amount: u32,
    pub reference: String,
    pub description: String,
}

/// Gateway acknowledgement that the prompt reached the customer's phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StkPushAccepted {
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: Option<String>,
}

/// Raw status query result; no `result_code` yet means still processing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(rename = "ResultCode", default, deserialize_with = "code_as_string")]
    pub result_code: Option<String>,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: Option<String>,
    #[serde(rename = "TransactionID", default)]
    pub transaction_id: Option<String>,
}

/// External payment processor plus the backend's payment bookkeeping.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initiate_stk_push(
        &self,
        request: &StkPushRequest,
    ) -> Result<StkPushAccepted, PaymentError>;

    async fn transaction_status(&self, checkout_request_id: &str)
        -> Result<StatusReport, PaymentError>;

    async fn record_purchase(&self, record: &PaymentRecord) -> Result<(), PaymentError>;

    async fn register_agency_client(&self, record: &AgencyClientRecord)
        -> Result<(), PaymentError>;
}

/// Daraja sends `ResultCode` as a string; some proxies forward it as a number.
fn code_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Code>::deserialize(deserializer)?.map(|code| match code {
        Code::Text(text) => text,
        Code::Number(number) => number.to_string(),
    }))
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    error: Option<String>,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self, fallback: &str) -> Result<T, PaymentError> {
        let reason = self.message.or(self.error);
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(PaymentError::Rejected(
                reason.unwrap_or_else(|| fallback.to_string()),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusQuery<'a> {
    checkout_request_id: &'a str,
}

/// [`PaymentGateway`] over the backend's M-Pesa and payment endpoints.
pub struct HttpPaymentGateway {
    client: BackendClient,
}

impl HttpPaymentGateway {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn initiate_stk_push(
        &self,
        request: &StkPushRequest,
    ) -> Result<StkPushAccepted, PaymentError> {
        let envelope: Envelope<StkPushAccepted> =
            self.client.post_json(STK_PUSH_PATH, request).await?;
        envelope.into_data("STK Push failed")
    }

    async fn transaction_status(
        &self,
        checkout_request_id: &str,
    ) -> Result<StatusReport, PaymentError> {
        let envelope: Envelope<StatusReport> = self
            .client
            .post_json(
                TRANSACTION_STATUS_PATH,
                &StatusQuery {
                    checkout_request_id,
                },
            )
            .await?;
        envelope.into_data("Transaction status check failed")
    }

    async fn record_purchase(&self, record: &PaymentRecord) -> Result<(), PaymentError> {
        let _: IgnoredAny = self.client.post_json(PURCHASE_PATH, record).await?;
        Ok(())
    }

    async fn register_agency_client(
        &self,
        record: &AgencyClientRecord,
    ) -> Result<(), PaymentError> {
        let _: IgnoredAny = self.client.post_json(AGENCY_CLIENTS_PATH, record).await?;
        Ok(())
    }
}
