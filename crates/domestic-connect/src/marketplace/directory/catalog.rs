use std::sync::RwLock;

use serde::Serialize;

use super::domain::{AgencyProfile, HousegirlProfile};
use super::filter::{filter, AgencyCriteria, HousegirlCriteria};
use super::source::{DataSource, DirectoryLoader, Loaded};

/// Entity count and origin of one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListingSummary {
    pub source: DataSource,
    pub count: usize,
}

impl<T> From<&Loaded<T>> for ListingSummary {
    fn from(loaded: &Loaded<T>) -> Self {
        Self {
            source: loaded.source,
            count: loaded.entities.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub agencies: ListingSummary,
    pub housegirls: ListingSummary,
}

/// Cached directory listings shared by request handlers.
pub struct DirectoryCatalog {
    loader: DirectoryLoader,
    agencies: RwLock<Loaded<AgencyProfile>>,
    housegirls: RwLock<Loaded<HousegirlProfile>>,
}

impl DirectoryCatalog {
    pub async fn load(loader: DirectoryLoader) -> Self {
        let agencies = loader.agencies().await;
        let housegirls = loader.housegirls().await;
        Self {
            loader,
            agencies: RwLock::new(agencies),
            housegirls: RwLock::new(housegirls),
        }
    }

    /// Replace the agency listing with rows imported from CSV. The import
    /// stays in place across [`refresh`](Self::refresh).
    pub fn seed_agencies(&self, agencies: Vec<AgencyProfile>) {
        *self
            .agencies
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Loaded {
            entities: agencies,
            source: DataSource::Import,
        };
    }

    pub async fn refresh(&self) -> RefreshSummary {
        let imported = self.agency_source() == DataSource::Import;
        let agencies = if imported {
            None
        } else {
            Some(self.loader.agencies().await)
        };
        let housegirls = self.loader.housegirls().await;
        let housegirl_summary = ListingSummary::from(&housegirls);
        *self
            .housegirls
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = housegirls;

        let mut listing = self
            .agencies
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(agencies) = agencies {
            *listing = agencies;
        } else {
            tracing::info!(
                agencies = listing.entities.len(),
                "agency listing kept from csv import"
            );
        }
        let summary = RefreshSummary {
            agencies: ListingSummary::from(&*listing),
            housegirls: housegirl_summary,
        };
        drop(listing);

        tracing::info!(
            agencies = summary.agencies.count,
            housegirls = summary.housegirls.count,
            "directory refreshed"
        );
        summary
    }

    fn agency_source(&self) -> DataSource {
        self.agencies
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .source
    }

    pub fn agencies(&self, criteria: &AgencyCriteria) -> Loaded<AgencyProfile> {
        let guard = self
            .agencies
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Loaded {
            entities: filter(&guard.entities, criteria).into_iter().cloned().collect(),
            source: guard.source,
        }
    }

    pub fn housegirls(&self, criteria: &HousegirlCriteria) -> Loaded<HousegirlProfile> {
        let guard = self
            .housegirls
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Loaded {
            entities: filter(&guard.entities, criteria).into_iter().cloned().collect(),
            source: guard.source,
        }
    }

    /// Reveal a worker's contact details; `None` when no such id is listed.
    pub fn unlock_contact(&self, id: u64) -> Option<HousegirlProfile> {
        let mut guard = self
            .housegirls
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let housegirl = guard.entities.iter_mut().find(|entry| entry.id == id)?;
        let unlock_count = housegirl.unlock_contact();
        tracing::debug!(id, unlock_count, "contact unlocked");
        Some(housegirl.clone())
    }
}
