//! Three-step purchase flow: `Details -> Processing -> Success`.
//!
//! Failures never leave the flow stuck; any error after validation reports a
//! toast and returns to `Details` so the user can retry.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::domain::{AgencyClientRecord, Checkout, PaymentMethod, PaymentRecord, PaymentStatus};
use super::gateway::{PaymentError, PaymentGateway, StatusReport, StkPushRequest};
use super::phone::{normalize_phone, MIN_PHONE_LENGTH};
use crate::config::PaymentConfig;
use crate::notifications::{Notification, Notifier, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStep {
    Details,
    Processing,
    Success,
}

/// Interpreted status of an in-flight STK push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Completed { transaction_id: Option<String> },
    Pending,
    Failed {
        result_code: String,
        description: Option<String>,
    },
}

/// How long to wait for the customer to approve the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub initial_delay: Duration,
    pub max_attempts: u32,
    pub max_delay: Duration,
    pub success_display_delay: Duration,
    pub success_result_code: String,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_attempts: 6,
            max_delay: Duration::from_secs(30),
            success_display_delay: Duration::from_secs(2),
            success_result_code: "0".to_string(),
        }
    }
}

impl From<&PaymentConfig> for ConfirmationPolicy {
    fn from(config: &PaymentConfig) -> Self {
        Self {
            initial_delay: config.initial_poll_delay,
            max_attempts: config.max_poll_attempts,
            max_delay: config.max_poll_delay,
            success_display_delay: config.success_display_delay,
            success_result_code: config.success_result_code.clone(),
        }
    }
}

impl ConfirmationPolicy {
    /// Immediate polling and no success pause; for sandboxes and tests.
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            success_display_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Wait before status check `attempt` (zero-based), doubling up to `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub fn classify(&self, report: &StatusReport) -> TransactionStatus {
        match report.result_code.as_deref().map(str::trim) {
            None | Some("") => TransactionStatus::Pending,
            Some(code) if code == self.success_result_code => TransactionStatus::Completed {
                transaction_id: report.transaction_id.clone(),
            },
            Some(code) => TransactionStatus::Failed {
                result_code: code.to_string(),
                description: report.result_desc.clone(),
            },
        }
    }
}

/// Drives one checkout modal against a [`PaymentGateway`].
pub struct PaymentFlowController {
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    policy: ConfirmationPolicy,
    step: Mutex<PaymentStep>,
}

impl PaymentFlowController {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        policy: ConfirmationPolicy,
    ) -> Self {
        Self {
            gateway,
            notifier,
            policy,
            step: Mutex::new(PaymentStep::Details),
        }
    }

    pub fn step(&self) -> PaymentStep {
        *self.step.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Back to `Details`, e.g. when the modal is reopened after a success.
    pub fn reset(&self) {
        self.set_step(PaymentStep::Details);
    }

    /// Run the purchase; `on_success` runs once, after the success display delay.
    pub async fn submit<F>(
        &self,
        checkout: &Checkout,
        on_success: F,
    ) -> Result<PaymentRecord, PaymentError>
    where
        F: FnOnce(&PaymentRecord) + Send,
    {
        let msisdn = match validate_phone(&checkout.phone_number) {
            Ok(msisdn) => msisdn,
            Err(err) => {
                self.notifier.notify(Notification::failure(
                    "Invalid Phone Number",
                    "Please enter a valid phone number",
                ));
                return Err(err);
            }
        };

        let Some(run) = self.begin_processing() else {
            return Err(PaymentError::InProgress);
        };
        tracing::info!(
            agency_id = %checkout.agency_id,
            package = %checkout.package.id,
            amount = checkout.package.price,
            "payment processing"
        );

        match self.process(checkout, msisdn).await {
            Ok(record) => {
                run.settle(PaymentStep::Success);
                tracing::info!(payment_id = %record.id, "payment completed");
                self.notifier.notify(Notification::success(
                    "Payment Successful!",
                    format!(
                        "You've successfully registered with {}. They will contact you within 24 hours.",
                        checkout.agency_name
                    ),
                ));
                tokio::time::sleep(self.policy.success_display_delay).await;
                on_success(&record);
                Ok(record)
            }
            Err(err) => {
                tracing::warn!(agency_id = %checkout.agency_id, error = %err, "payment failed");
                self.notifier
                    .record_error(&err.to_string(), "payment flow", Severity::Medium);
                self.notifier.notify(Notification::failure(
                    "Payment Failed",
                    "Please try again or contact support",
                ));
                run.settle(PaymentStep::Details);
                Err(err)
            }
        }
    }

    async fn process(
        &self,
        checkout: &Checkout,
        msisdn: String,
    ) -> Result<PaymentRecord, PaymentError> {
        let started = Utc::now();
        let accepted = self
            .gateway
            .initiate_stk_push(&StkPushRequest {
                phone_number: msisdn.clone(),
                amount: checkout.package.price,
                reference: checkout.reference(started),
                description: checkout.description(),
            })
            .await?;
        tracing::debug!(checkout_request_id = %accepted.checkout_request_id, "stk push accepted");

        let transaction_id = self.await_confirmation(&accepted.checkout_request_id).await?;

        let now = Utc::now();
        let stamp = now.timestamp_millis();
        let record = PaymentRecord {
            id: format!("payment_{stamp}"),
            client_id: checkout.client_id.clone(),
            agency_id: checkout.agency_id.clone(),
            package_id: checkout.package.id.clone(),
            amount: checkout.package.price,
            agency_fee: checkout.package.agency_fee,
            platform_fee: checkout.package.platform_fee,
            phone_number: msisdn,
            status: PaymentStatus::Completed,
            payment_method: PaymentMethod::Mpesa,
            created_at: now,
            agency_client_id: format!("ac_{stamp}"),
            terms_accepted: true,
            mpesa_checkout_request_id: Some(accepted.checkout_request_id),
            mpesa_merchant_request_id: accepted.merchant_request_id,
            transaction_id: Some(transaction_id.unwrap_or_else(|| format!("TXN_{stamp}"))),
        };
        self.gateway.record_purchase(&record).await?;

        if let Err(err) = self
            .gateway
            .register_agency_client(&AgencyClientRecord::for_payment(&record))
            .await
        {
            tracing::warn!(payment_id = %record.id, error = %err, "agency client registration failed");
        }

        Ok(record)
    }

    async fn await_confirmation(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<String>, PaymentError> {
        for attempt in 0..self.policy.max_attempts {
            tokio::time::sleep(self.policy.delay_for(attempt)).await;
            let report = self.gateway.transaction_status(checkout_request_id).await?;
            match self.policy.classify(&report) {
                TransactionStatus::Completed { transaction_id } => return Ok(transaction_id),
                TransactionStatus::Pending => {
                    tracing::debug!(attempt, checkout_request_id, "payment still pending");
                }
                TransactionStatus::Failed {
                    result_code,
                    description,
                } => {
                    return Err(PaymentError::NotCompleted {
                        result_code,
                        description,
                    })
                }
            }
        }

        Err(PaymentError::ConfirmationTimedOut {
            attempts: self.policy.max_attempts,
        })
    }

    fn begin_processing(&self) -> Option<ProcessingRun<'_>> {
        let mut guard = self.step.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *guard == PaymentStep::Processing {
            return None;
        }
        *guard = PaymentStep::Processing;
        Some(ProcessingRun {
            step: &self.step,
            settled: false,
        })
    }

    fn set_step(&self, step: PaymentStep) {
        *self.step.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = step;
    }
}

/// Marks one submit as `Processing`. Dropped without [`ProcessingRun::settle`]
/// (the submit future was cancelled), it puts the step back to `Details`.
struct ProcessingRun<'a> {
    step: &'a Mutex<PaymentStep>,
    settled: bool,
}

impl ProcessingRun<'_> {
    fn settle(mut self, step: PaymentStep) {
        *self.step.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = step;
        self.settled = true;
    }
}

impl Drop for ProcessingRun<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::warn!("payment abandoned while processing");
        *self.step.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = PaymentStep::Details;
    }
}

fn validate_phone(raw: &str) -> Result<String, PaymentError> {
    if raw.trim().len() < MIN_PHONE_LENGTH {
        return Err(PaymentError::InvalidPhone);
    }
    normalize_phone(raw).ok_or(PaymentError::InvalidPhone)
}
