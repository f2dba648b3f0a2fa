use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::marketplace::accounts::User;
use crate::marketplace::directory::AgencyProfile;

/// Hiring package an employer buys through an agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPackage {
    pub id: String,
    pub name: String,
    /// Total charged in KES; `agency_fee + platform_fee`.
    pub price: u32,
    pub agency_fee: u32,
    pub platform_fee: u32,
    #[serde(default)]
    pub features: Vec<String>,
}

impl PaymentPackage {
    fn new(id: &str, name: &str, agency_fee: u32, platform_fee: u32, features: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            price: agency_fee + platform_fee,
            agency_fee,
            platform_fee,
            features: features.iter().map(|feature| feature.to_string()).collect(),
        }
    }
}

/// The three packages offered on the agency marketplace.
pub fn standard_packages() -> Vec<PaymentPackage> {
    vec![
        PaymentPackage::new(
            "basic",
            "Basic",
            1000,
            200,
            &["Verified worker", "Basic training", "30-day replacement", "Agency support"],
        ),
        PaymentPackage::new(
            "premium",
            "Premium",
            1000,
            500,
            &[
                "Verified worker",
                "Professional training",
                "Background check",
                "60-day replacement",
                "Dispute resolution",
            ],
        ),
        PaymentPackage::new(
            "international",
            "International",
            1000,
            1000,
            &[
                "Verified worker",
                "International training",
                "Comprehensive background check",
                "90-day replacement",
                "Legal compliance",
            ],
        ),
    ]
}

pub fn find_package(id: &str) -> Option<PaymentPackage> {
    standard_packages()
        .into_iter()
        .find(|package| package.id.eq_ignore_ascii_case(id.trim()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Mpesa,
    Card,
}

/// One purchase as the employer submitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub client_id: String,
    pub agency_id: String,
    pub agency_name: String,
    pub package: PaymentPackage,
    pub phone_number: String,
}

impl Checkout {
    pub fn new(
        client: &User,
        agency: &AgencyProfile,
        package: PaymentPackage,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client.id.to_string(),
            agency_id: agency.id.clone(),
            agency_name: agency.name.clone(),
            package,
            phone_number: phone_number.into(),
        }
    }

    /// Account reference shown on the M-Pesa prompt.
    pub fn reference(&self, at: DateTime<Utc>) -> String {
        format!("DC_{}_{}", self.client_id, at.timestamp_millis())
    }

    pub fn description(&self) -> String {
        format!("{} Package - {}", self.package.name, self.agency_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,
    pub client_id: String,
    pub agency_id: String,
    pub package_id: String,
    pub amount: u32,
    pub agency_fee: u32,
    pub platform_fee: u32,
    pub phone_number: String,
    pub status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub agency_client_id: String,
    pub terms_accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpesa_checkout_request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpesa_merchant_request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStatus {
    Registered,
    Placed,
    Completed,
}

/// Employer registered as an agency client after a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyClientRecord {
    pub id: String,
    pub agency_id: String,
    pub client_id: String,
    pub hiring_fee: u32,
    pub placement_status: PlacementStatus,
    pub hire_date: DateTime<Utc>,
    pub package_type: String,
    pub commission_paid: u32,
    pub platform_fee_paid: u32,
    pub dispute_resolution: Option<String>,
    pub terms_accepted: bool,
}

impl AgencyClientRecord {
    pub fn for_payment(record: &PaymentRecord) -> Self {
        Self {
            id: record.agency_client_id.clone(),
            agency_id: record.agency_id.clone(),
            client_id: record.client_id.clone(),
            hiring_fee: record.amount,
            placement_status: PlacementStatus::Registered,
            hire_date: record.created_at,
            package_type: record.package_id.clone(),
            commission_paid: record.agency_fee,
            platform_fee_paid: record.platform_fee,
            dispute_resolution: None,
            terms_accepted: record.terms_accepted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_prices_are_fee_sums() {
        let packages = standard_packages();
        let prices: Vec<_> = packages.iter().map(|package| package.price).collect();
        assert_eq!(prices, vec![1200, 1500, 2000]);
        assert_eq!(find_package(" Premium ").map(|package| package.platform_fee), Some(500));
        assert!(find_package("gold").is_none());
    }
}
