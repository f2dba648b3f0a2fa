//! Agency seeding from CSV exports.
//!
//! Header names match the JSON field names; `services` is `;`-separated and
//! timestamps accept RFC 3339 or plain `YYYY-MM-DD`.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{AgencyProfile, SubscriptionTier, VerificationStatus};

#[derive(Debug)]
pub enum DirectoryImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, reason: String },
}

impl std::fmt::Display for DirectoryImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryImportError::Io(err) => write!(f, "failed to read agency export: {}", err),
            DirectoryImportError::Csv(err) => write!(f, "invalid agency CSV data: {}", err),
            DirectoryImportError::InvalidRow { line, reason } => {
                write!(f, "agency row on line {} rejected: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for DirectoryImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DirectoryImportError::Io(err) => Some(err),
            DirectoryImportError::Csv(err) => Some(err),
            DirectoryImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for DirectoryImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for DirectoryImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct AgencyCsvImporter;

impl AgencyCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<AgencyProfile>, DirectoryImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Rows keep file order; a repeated `id` keeps the first occurrence.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<AgencyProfile>, DirectoryImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let imported_at = Utc::now();
        let mut seen = HashSet::new();
        let mut agencies = Vec::new();

        for (index, row) in csv_reader.deserialize::<AgencyRow>().enumerate() {
            let row = row?;
            let line = index as u64 + 2;
            if !seen.insert(row.id.clone()) {
                tracing::debug!(line, id = %row.id, "duplicate agency row skipped");
                continue;
            }
            agencies.push(row.into_profile(line, imported_at)?);
        }

        tracing::info!(count = agencies.len(), "agencies imported from csv");
        Ok(agencies)
    }
}

#[derive(Debug, Deserialize)]
struct AgencyRow {
    id: String,
    name: String,
    #[serde(default)]
    license_number: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    verification_status: Option<String>,
    subscription_tier: String,
    #[serde(default)]
    rating: Option<f32>,
    #[serde(default)]
    services: String,
    location: String,
    #[serde(default)]
    monthly_fee: Option<u32>,
    #[serde(default)]
    commission_rate: Option<f32>,
    #[serde(default)]
    verified_workers: Option<u32>,
    #[serde(default)]
    successful_placements: Option<u32>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    contact_email: String,
    #[serde(default)]
    contact_phone: String,
    #[serde(default)]
    website: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    created_at: Option<String>,
}

impl AgencyRow {
    fn into_profile(
        self,
        line: u64,
        imported_at: DateTime<Utc>,
    ) -> Result<AgencyProfile, DirectoryImportError> {
        let invalid = |reason: String| DirectoryImportError::InvalidRow { line, reason };

        if self.id.is_empty() || self.name.is_empty() {
            return Err(invalid("id and name are required".to_string()));
        }
        let subscription_tier = SubscriptionTier::parse(&self.subscription_tier)
            .ok_or_else(|| invalid(format!("unknown tier '{}'", self.subscription_tier)))?;
        let verification_status = match self.verification_status.as_deref() {
            None => VerificationStatus::Pending,
            Some(raw) => parse_verification(raw)
                .ok_or_else(|| invalid(format!("unknown verification status '{raw}'")))?,
        };
        let created_at = match self.created_at.as_deref() {
            None => imported_at,
            Some(raw) => {
                parse_timestamp(raw).ok_or_else(|| invalid(format!("invalid timestamp '{raw}'")))?
            }
        };

        Ok(AgencyProfile {
            id: self.id,
            name: self.name,
            license_number: self.license_number,
            verification_status,
            subscription_tier,
            rating: self.rating.unwrap_or_default(),
            services: self
                .services
                .split(';')
                .map(str::trim)
                .filter(|service| !service.is_empty())
                .map(str::to_string)
                .collect(),
            location: self.location,
            monthly_fee: self.monthly_fee.unwrap_or_default(),
            commission_rate: self.commission_rate.unwrap_or_default(),
            verified_workers: self.verified_workers.unwrap_or_default(),
            successful_placements: self.successful_placements.unwrap_or_default(),
            description: self.description,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            website: self.website,
            created_at,
            updated_at: created_at,
        })
    }
}

fn parse_verification(raw: &str) -> Option<VerificationStatus> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "verified" => Some(VerificationStatus::Verified),
        "pending" => Some(VerificationStatus::Pending),
        "unverified" => Some(VerificationStatus::Unverified),
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
