use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    Pending,
    Unverified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Basic,
    Premium,
    International,
}

impl SubscriptionTier {
    pub const fn label(self) -> &'static str {
        match self {
            SubscriptionTier::Basic => "basic",
            SubscriptionTier::Premium => "premium",
            SubscriptionTier::International => "international",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "basic" => Some(Self::Basic),
            "premium" => Some(Self::Premium),
            "international" => Some(Self::International),
            _ => None,
        }
    }
}

/// Placement agency listed in the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgencyProfile {
    pub id: String,
    pub name: String,
    pub license_number: String,
    pub verification_status: VerificationStatus,
    pub subscription_tier: SubscriptionTier,
    pub rating: f32,
    #[serde(default)]
    pub services: Vec<String>,
    pub location: String,
    pub monthly_fee: u32,
    pub commission_rate: f32,
    #[serde(default)]
    pub verified_workers: u32,
    #[serde(default)]
    pub successful_placements: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub website: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgencyProfile {
    pub fn offers(&self, service: &str) -> bool {
        self.services.iter().any(|offered| offered == service)
    }

    pub fn is_verified(&self) -> bool {
        self.verification_status == VerificationStatus::Verified
    }
}

/// Monthly salary in KES, shown as `KES 18,000`.
///
/// Accepts either a bare number or any label whose digits form the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct Salary(pub u32);

#[derive(Deserialize)]
#[serde(untagged)]
enum SalaryRepr {
    Amount(u32),
    Label(String),
}

impl Salary {
    pub fn parse(raw: &str) -> Option<Self> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        digits.parse().ok().map(Self)
    }

    pub fn amount(self) -> u32 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Salary {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match SalaryRepr::deserialize(deserializer)? {
            SalaryRepr::Amount(amount) => Ok(Self(amount)),
            SalaryRepr::Label(label) => Self::parse(&label).ok_or_else(|| {
                serde::de::Error::custom(format!("invalid salary '{label}'"))
            }),
        }
    }
}

impl From<Salary> for String {
    fn from(value: Salary) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Salary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KES {}", group_thousands(self.0))
    }
}

fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Experience as displayed (`"5 years"`) with the leading year count parsed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Experience {
    label: String,
    years: Option<u8>,
}

impl Experience {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let years = label
            .split_whitespace()
            .next()
            .and_then(|token| token.trim_end_matches('+').parse().ok());
        Self { label, years }
    }

    pub fn years(&self) -> Option<u8> {
        self.years
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl From<String> for Experience {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Experience> for String {
    fn from(value: Experience) -> Self {
        value.label
    }
}

/// Domestic worker card as listed for employers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HousegirlProfile {
    pub id: u64,
    pub name: String,
    pub age: u8,
    pub location: String,
    pub experience: Experience,
    pub salary: Salary,
    pub status: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub reviews: Option<u32>,
    #[serde(default)]
    pub contact_unlocked: bool,
    #[serde(default)]
    pub unlock_count: u32,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub nationality: String,
    pub community: String,
    pub education: String,
    pub work_type: String,
    pub living_arrangement: String,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl HousegirlProfile {
    /// Reveal contact details. Every reveal counts; returns the new total.
    pub fn unlock_contact(&mut self) -> u32 {
        self.contact_unlocked = true;
        self.unlock_count = self.unlock_count.saturating_add(1);
        self.unlock_count
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|owned| owned == skill)
    }
}
