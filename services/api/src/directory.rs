use crate::infra::OfflineDirectory;
use clap::Args;
use domestic_connect::backend::BackendClient;
use domestic_connect::config::AppConfig;
use domestic_connect::error::AppError;
use domestic_connect::marketplace::directory::{
    filter, AgencyCriteria, AgencyCsvImporter, AgencyFilterParams, AgencyProfile, DataSource,
    DirectoryLoader, HousegirlCriteria, HousegirlFilterParams, HousegirlProfile,
    HttpDirectorySource,
};
use domestic_connect::notifications::NotificationCenter;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct AgencyListArgs {
    /// Read agencies from a CSV export instead of the backend
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Skip the backend and use the built-in listings
    #[arg(long)]
    pub(crate) offline: bool,
    #[command(flatten)]
    pub(crate) filters: AgencyFilterArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct AgencyFilterArgs {
    /// Case-insensitive match on name or description
    #[arg(long)]
    pub(crate) search: Option<String>,
    #[arg(long)]
    pub(crate) location: Option<String>,
    /// Offered service, e.g. `background_checks`
    #[arg(long)]
    pub(crate) service: Option<String>,
    /// basic, premium, or international
    #[arg(long)]
    pub(crate) tier: Option<String>,
}

impl AgencyFilterArgs {
    fn params(&self) -> AgencyFilterParams {
        AgencyFilterParams {
            search: self.search.clone(),
            location: self.location.clone(),
            service: self.service.clone(),
            tier: self.tier.clone(),
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct HousegirlListArgs {
    /// Skip the backend and use the built-in listings
    #[arg(long)]
    pub(crate) offline: bool,
    #[command(flatten)]
    pub(crate) filters: HousegirlFilterArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct HousegirlFilterArgs {
    /// Case-insensitive match on name, location, or bio
    #[arg(long)]
    pub(crate) search: Option<String>,
    #[arg(long)]
    pub(crate) community: Option<String>,
    /// e.g. `18-25` or `50+`
    #[arg(long)]
    pub(crate) age_range: Option<String>,
    /// e.g. `KES 10,000 - 15,000` or `KES 35,000+`
    #[arg(long)]
    pub(crate) salary_range: Option<String>,
    #[arg(long)]
    pub(crate) education: Option<String>,
    #[arg(long)]
    pub(crate) work_type: Option<String>,
    /// e.g. `3-5 years` or `12+ years`
    #[arg(long)]
    pub(crate) experience: Option<String>,
    #[arg(long)]
    pub(crate) living_arrangement: Option<String>,
    #[arg(long)]
    pub(crate) location: Option<String>,
    #[arg(long)]
    pub(crate) skill: Option<String>,
}

impl HousegirlFilterArgs {
    fn params(&self) -> HousegirlFilterParams {
        HousegirlFilterParams {
            search: self.search.clone(),
            community: self.community.clone(),
            age_range: self.age_range.clone(),
            salary_range: self.salary_range.clone(),
            education: self.education.clone(),
            work_type: self.work_type.clone(),
            experience: self.experience.clone(),
            living_arrangement: self.living_arrangement.clone(),
            location: self.location.clone(),
            skill: self.skill.clone(),
        }
    }
}

fn loader(offline: bool) -> Result<DirectoryLoader, AppError> {
    let notifier = Arc::new(NotificationCenter::default());
    if offline {
        return Ok(DirectoryLoader::new(Arc::new(OfflineDirectory), notifier));
    }
    let config = AppConfig::load()?;
    let client = BackendClient::new(&config.backend)?;
    Ok(DirectoryLoader::new(
        Arc::new(HttpDirectorySource::new(client)),
        notifier,
    ))
}

fn source_label(source: DataSource) -> &'static str {
    match source {
        DataSource::Backend => "backend",
        DataSource::Fallback => "built-in listings (backend unavailable)",
        DataSource::Import => "csv import",
    }
}

pub(crate) async fn list_agencies(args: AgencyListArgs) -> Result<(), AppError> {
    let (agencies, label) = match &args.csv {
        Some(path) => (AgencyCsvImporter::from_path(path)?, "csv import"),
        None => {
            let loaded = loader(args.offline)?.agencies().await;
            (loaded.entities, source_label(loaded.source))
        }
    };

    let criteria = AgencyCriteria::from(&args.filters.params());
    let matches = filter(&agencies, &criteria);
    println!(
        "Agencies ({} of {}, source: {label})",
        matches.len(),
        agencies.len()
    );
    for agency in matches {
        println!("  {}", agency_line(agency));
    }
    Ok(())
}

pub(crate) async fn list_housegirls(args: HousegirlListArgs) -> Result<(), AppError> {
    let loaded = loader(args.offline)?.housegirls().await;
    let criteria = HousegirlCriteria::from(&args.filters.params());
    let matches = filter(&loaded.entities, &criteria);
    println!(
        "Housegirls ({} of {}, source: {})",
        matches.len(),
        loaded.entities.len(),
        source_label(loaded.source)
    );
    for housegirl in matches {
        println!("  {}", housegirl_line(housegirl));
    }
    Ok(())
}

pub(crate) fn agency_line(agency: &AgencyProfile) -> String {
    format!(
        "{} [{}] {} | rating {:.1} | KES {}/month, {}% commission | {}",
        agency.name,
        agency.subscription_tier.label(),
        agency.location,
        agency.rating,
        agency.monthly_fee,
        agency.commission_rate,
        agency.services.join(", ")
    )
}

pub(crate) fn housegirl_line(housegirl: &HousegirlProfile) -> String {
    format!(
        "{}, {} | {} | {} | {} | {} | {}",
        housegirl.name,
        housegirl.age,
        housegirl.location,
        housegirl.experience.label(),
        housegirl.salary,
        housegirl.community,
        housegirl.living_arrangement
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use domestic_connect::marketplace::directory::{fallback_agencies, fallback_housegirls};

    #[test]
    fn listing_lines_show_key_terms() {
        let agency = &fallback_agencies()[0];
        assert_eq!(
            agency_line(agency),
            "Demo Agency Service [premium] Nairobi | rating 4.9 | KES 5000/month, 15% commission | local, international, training, background_checks"
        );

        let housegirl = &fallback_housegirls()[0];
        assert_eq!(
            housegirl_line(housegirl),
            "Sarah Wanjiku, 28 | Westlands, Nairobi | 5 years | KES 18,000 | Kikuyu | Live-in"
        );
    }

    #[test]
    fn cli_filters_map_to_params() {
        let args = HousegirlFilterArgs {
            community: Some("Luo".to_string()),
            ..HousegirlFilterArgs::default()
        };
        let params = args.params();
        assert_eq!(params.community.as_deref(), Some("Luo"));
        assert!(params.search.is_none());
    }

    #[tokio::test]
    async fn offline_loader_serves_fixtures() {
        let loaded = loader(true).expect("offline loader").agencies().await;
        assert_eq!(loaded.source, DataSource::Fallback);
        assert_eq!(loaded.entities.len(), 3);
    }
}
