use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for marketplace accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three marketplace roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Employer,
    Housegirl,
    Agency,
}

impl UserType {
    pub const fn label(self) -> &'static str {
        match self {
            UserType::Employer => "employer",
            UserType::Housegirl => "housegirl",
            UserType::Agency => "agency",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "employer" => Some(Self::Employer),
            "housegirl" => Some(Self::Housegirl),
            "agency" => Some(Self::Agency),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccommodationType {
    LiveIn,
    LiveOut,
    Both,
}

impl AccommodationType {
    pub const fn label(self) -> &'static str {
        match self {
            AccommodationType::LiveIn => "live_in",
            AccommodationType::LiveOut => "live_out",
            AccommodationType::Both => "both",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployerDetails {
    pub location: Option<String>,
}

/// Recruiting profile for a domestic worker; every field is required once completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousegirlDetails {
    pub age: u8,
    pub location: String,
    pub experience: String,
    pub education: String,
    pub expected_salary: u32,
    pub accommodation_type: AccommodationType,
    pub community: String,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    pub bio: String,
    pub agency_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyDetails {
    pub agency_name: String,
    pub license_number: Option<String>,
    pub location: Option<String>,
}

/// Role-specific profile; the variant decides the account's `user_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "user_type", rename_all = "snake_case")]
pub enum RoleProfile {
    Employer(EmployerDetails),
    Housegirl(HousegirlDetails),
    Agency(AgencyDetails),
}

impl RoleProfile {
    pub const fn user_type(&self) -> UserType {
        match self {
            RoleProfile::Employer(_) => UserType::Employer,
            RoleProfile::Housegirl(_) => UserType::Housegirl,
            RoleProfile::Agency(_) => UserType::Agency,
        }
    }
}

/// Where the account's credentials live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentitySource {
    Password,
    Provider { uid: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub identity: IdentitySource,
    #[serde(flatten)]
    pub profile: RoleProfile,
}

impl User {
    pub const fn user_type(&self) -> UserType {
        self.profile.user_type()
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn housegirl(&self) -> Option<&HousegirlDetails> {
        match &self.profile {
            RoleProfile::Housegirl(details) => Some(details),
            _ => None,
        }
    }

    pub fn is_provider_user(&self) -> bool {
        matches!(self.identity, IdentitySource::Provider { .. })
    }

    /// Overwrite the fields present in `edits`. Fields that do not belong to
    /// this account's role are ignored; the role itself never changes.
    pub fn apply_edits(&mut self, edits: ProfileFields) {
        let ProfileFields {
            first_name,
            last_name,
            phone_number,
            age,
            location,
            experience,
            education,
            expected_salary,
            accommodation_type,
            community,
            skills,
            languages,
            bio,
            agency_id,
            agency_name,
            license_number,
        } = edits;
        replace(&mut self.first_name, first_name);
        replace(&mut self.last_name, last_name);
        if phone_number.is_some() {
            self.phone_number = phone_number;
        }

        match &mut self.profile {
            RoleProfile::Employer(details) => {
                if location.is_some() {
                    details.location = location;
                }
            }
            RoleProfile::Housegirl(details) => {
                replace(&mut details.age, age);
                replace(&mut details.location, location);
                replace(&mut details.experience, experience);
                replace(&mut details.education, education);
                replace(&mut details.expected_salary, expected_salary);
                replace(&mut details.accommodation_type, accommodation_type);
                replace(&mut details.community, community);
                replace(&mut details.skills, skills);
                replace(&mut details.languages, languages);
                replace(&mut details.bio, bio);
                if agency_id.is_some() {
                    details.agency_id = agency_id;
                }
            }
            RoleProfile::Agency(details) => {
                replace(&mut details.agency_name, agency_name);
                if license_number.is_some() {
                    details.license_number = license_number;
                }
                if location.is_some() {
                    details.location = location;
                }
            }
        }
    }
}

fn replace<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Loosely shaped sign-up form; [`super::defaults::complete_profile`] turns it into a [`RoleProfile`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub age: Option<u8>,
    pub location: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub expected_salary: Option<u32>,
    pub accommodation_type: Option<AccommodationType>,
    pub community: Option<String>,
    pub skills: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub bio: Option<String>,
    pub agency_id: Option<String>,
    pub agency_name: Option<String>,
    pub license_number: Option<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub user_type: UserType,
    #[serde(flatten)]
    pub fields: ProfileFields,
}

impl SignUpRequest {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        user_type: UserType,
        fields: ProfileFields,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            user_type,
            fields,
        }
    }
}

impl fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("user_type", &self.user_type)
            .field("fields", &self.fields)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Canonical key for credential lookups: trimmed, lowercase.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}
