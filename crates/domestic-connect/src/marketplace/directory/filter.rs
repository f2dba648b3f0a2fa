//! Order-preserving, non-mutating directory filters.
//!
//! Every criterion is either inactive (blank or the `"all"` sentinel) and
//! skipped, or active and required; an entity survives only when it
//! satisfies every active criterion.

use serde::{Deserialize, Serialize};

use super::domain::{AgencyProfile, HousegirlProfile};

/// Predicate set over one entity type.
pub trait Criteria<T> {
    fn matches(&self, entity: &T) -> bool;
}

/// Entities satisfying `criteria`, in source order.
pub fn filter<'a, T, C>(entities: &'a [T], criteria: &C) -> Vec<&'a T>
where
    C: Criteria<T> + ?Sized,
{
    entities
        .iter()
        .filter(|entity| criteria.matches(entity))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Criterion<T> {
    #[default]
    Inactive,
    Active(T),
}

impl<T> Criterion<T> {
    /// Inactive criteria accept everything.
    pub fn accepts(&self, test: impl FnOnce(&T) -> bool) -> bool {
        match self {
            Criterion::Inactive => true,
            Criterion::Active(value) => test(value),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Criterion::Active(_))
    }
}

impl Criterion<String> {
    /// Blank and `"all"` (any case) mean "no filter".
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Criterion::Inactive,
            Some(value) if value.eq_ignore_ascii_case("all") => Criterion::Inactive,
            Some(value) => Criterion::Active(value.to_string()),
        }
    }
}

/// Inclusive numeric range; `max == None` is open-ended (`"50+"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericRange {
    pub min: u32,
    pub max: Option<u32>,
}

impl NumericRange {
    /// Parses `"18-25"`, `"50+"`, `"KES 10,000 - 15,000"`, `"12+ years"`, ...
    pub fn parse(raw: &str) -> Option<Self> {
        let compact: String = raw
            .chars()
            .filter(|ch| ch.is_ascii_digit() || *ch == '-' || *ch == '+')
            .collect();

        if let Some(min) = compact.strip_suffix('+') {
            return min.parse().ok().map(|min| Self { min, max: None });
        }

        let (min, max) = compact.split_once('-')?;
        let min: u32 = min.parse().ok()?;
        let max: u32 = max.parse().ok()?;
        (min <= max).then_some(Self {
            min,
            max: Some(max),
        })
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && self.max.map_or(true, |max| value <= max)
    }
}

/// Active range criterion whose raw value may not have parsed; unparsed ranges match nothing.
pub type RangeCriterion = Criterion<Option<NumericRange>>;

fn range_from_raw(raw: Option<&str>) -> RangeCriterion {
    match Criterion::from_raw(raw) {
        Criterion::Inactive => Criterion::Inactive,
        Criterion::Active(value) => Criterion::Active(NumericRange::parse(&value)),
    }
}

fn in_range(range: &Option<NumericRange>, value: Option<u32>) -> bool {
    match (range, value) {
        (Some(range), Some(value)) => range.contains(value),
        _ => false,
    }
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Raw agency filter inputs as they arrive from query strings or the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgencyFilterParams {
    pub search: Option<String>,
    pub location: Option<String>,
    pub service: Option<String>,
    pub tier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgencyCriteria {
    /// Lowercased; matched against name and description.
    pub search: Criterion<String>,
    pub location: Criterion<String>,
    pub service: Criterion<String>,
    pub tier: Criterion<String>,
}

impl From<&AgencyFilterParams> for AgencyCriteria {
    fn from(params: &AgencyFilterParams) -> Self {
        let search = match Criterion::from_raw(params.search.as_deref()) {
            Criterion::Active(term) => Criterion::Active(term.to_lowercase()),
            Criterion::Inactive => Criterion::Inactive,
        };
        Self {
            search,
            location: Criterion::from_raw(params.location.as_deref()),
            service: Criterion::from_raw(params.service.as_deref()),
            tier: Criterion::from_raw(params.tier.as_deref()),
        }
    }
}

impl Criteria<AgencyProfile> for AgencyCriteria {
    fn matches(&self, agency: &AgencyProfile) -> bool {
        self.search.accepts(|term| {
            contains_ignore_case(&agency.name, term) || contains_ignore_case(&agency.description, term)
        }) && self.location.accepts(|location| agency.location == *location)
            && self.service.accepts(|service| agency.offers(service))
            && self
                .tier
                .accepts(|tier| agency.subscription_tier.label() == tier.as_str())
    }
}

/// Raw housegirl filter inputs; range fields use the labels shown in the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HousegirlFilterParams {
    pub search: Option<String>,
    pub community: Option<String>,
    pub age_range: Option<String>,
    pub salary_range: Option<String>,
    pub education: Option<String>,
    pub work_type: Option<String>,
    pub experience: Option<String>,
    pub living_arrangement: Option<String>,
    pub location: Option<String>,
    pub skill: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HousegirlCriteria {
    /// Lowercased; matched against name, location, and bio.
    pub search: Criterion<String>,
    pub community: Criterion<String>,
    pub age: RangeCriterion,
    pub salary: RangeCriterion,
    pub education: Criterion<String>,
    pub work_type: Criterion<String>,
    pub experience: RangeCriterion,
    pub living_arrangement: Criterion<String>,
    pub location: Criterion<String>,
    pub skill: Criterion<String>,
}

impl From<&HousegirlFilterParams> for HousegirlCriteria {
    fn from(params: &HousegirlFilterParams) -> Self {
        let search = match Criterion::from_raw(params.search.as_deref()) {
            Criterion::Active(term) => Criterion::Active(term.to_lowercase()),
            Criterion::Inactive => Criterion::Inactive,
        };
        Self {
            search,
            community: Criterion::from_raw(params.community.as_deref()),
            age: range_from_raw(params.age_range.as_deref()),
            salary: range_from_raw(params.salary_range.as_deref()),
            education: Criterion::from_raw(params.education.as_deref()),
            work_type: Criterion::from_raw(params.work_type.as_deref()),
            experience: range_from_raw(params.experience.as_deref()),
            living_arrangement: Criterion::from_raw(params.living_arrangement.as_deref()),
            location: Criterion::from_raw(params.location.as_deref()),
            skill: Criterion::from_raw(params.skill.as_deref()),
        }
    }
}

impl Criteria<HousegirlProfile> for HousegirlCriteria {
    fn matches(&self, housegirl: &HousegirlProfile) -> bool {
        self.search.accepts(|term| {
            contains_ignore_case(&housegirl.name, term)
                || contains_ignore_case(&housegirl.location, term)
                || housegirl
                    .bio
                    .as_deref()
                    .is_some_and(|bio| contains_ignore_case(bio, term))
        }) && self
            .community
            .accepts(|community| housegirl.community == *community)
            && self
                .age
                .accepts(|range| in_range(range, Some(u32::from(housegirl.age))))
            && self
                .salary
                .accepts(|range| in_range(range, Some(housegirl.salary.amount())))
            && self
                .education
                .accepts(|education| housegirl.education == *education)
            && self
                .work_type
                .accepts(|work_type| housegirl.work_type == *work_type)
            && self.experience.accepts(|range| {
                in_range(range, housegirl.experience.years().map(u32::from))
            })
            && self
                .living_arrangement
                .accepts(|arrangement| housegirl.living_arrangement == *arrangement)
            && self
                .location
                .accepts(|location| housegirl.location == *location)
            && self.skill.accepts(|skill| housegirl.has_skill(skill))
    }
}
