//! Agency and housegirl listings: typed profiles, the filter engine, and a
//! backend loader that degrades to built-in fixtures.

pub mod catalog;
pub mod domain;
pub mod filter;
pub mod fixtures;
pub mod import;
pub mod router;
pub mod source;

pub use catalog::{DirectoryCatalog, ListingSummary, RefreshSummary};
pub use domain::{
    AgencyProfile, Experience, HousegirlProfile, Salary, SubscriptionTier, VerificationStatus,
};
pub use filter::{
    filter, AgencyCriteria, AgencyFilterParams, Criteria, Criterion, HousegirlCriteria,
    HousegirlFilterParams, NumericRange,
};
pub use fixtures::{fallback_agencies, fallback_housegirls};
pub use import::{AgencyCsvImporter, DirectoryImportError};
pub use router::directory_router;
pub use source::{DataSource, DirectoryLoader, DirectorySource, HttpDirectorySource, Loaded};
