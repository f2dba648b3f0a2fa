//! Completion policy for sign-up forms.
//!
//! Housegirl recruiting fields left blank are filled from fixed literals so
//! that every worker profile is searchable from the moment it is created.

use super::domain::{
    AccommodationType, AgencyDetails, EmployerDetails, HousegirlDetails, ProfileFields,
    RoleProfile, UserType,
};
use super::service::AuthError;

pub const DEFAULT_AGE: u8 = 25;
pub const DEFAULT_LOCATION: &str = "Nairobi";
pub const DEFAULT_EDUCATION: &str = "Form 4 and Above";
pub const DEFAULT_EXPERIENCE: &str = "2 Years";
pub const DEFAULT_EXPECTED_SALARY: u32 = 8000;
pub const DEFAULT_ACCOMMODATION: AccommodationType = AccommodationType::LiveIn;
pub const DEFAULT_COMMUNITY: &str = "Kikuyu";
pub const DEFAULT_SKILLS: [&str; 4] = ["Cooking", "Cleaning", "Laundry", "Childcare"];
pub const DEFAULT_LANGUAGES: [&str; 2] = ["English", "Swahili"];

pub fn complete_profile(
    user_type: UserType,
    fields: &ProfileFields,
) -> Result<RoleProfile, AuthError> {
    match user_type {
        UserType::Employer => Ok(RoleProfile::Employer(EmployerDetails {
            location: non_blank(&fields.location),
        })),
        UserType::Housegirl => Ok(RoleProfile::Housegirl(housegirl_details(fields))),
        UserType::Agency => {
            let agency_name = non_blank(&fields.agency_name)
                .ok_or(AuthError::MissingField("agency_name"))?;
            Ok(RoleProfile::Agency(AgencyDetails {
                agency_name,
                license_number: non_blank(&fields.license_number),
                location: non_blank(&fields.location),
            }))
        }
    }
}

fn housegirl_details(fields: &ProfileFields) -> HousegirlDetails {
    let age = fields.age.filter(|age| *age > 0).unwrap_or(DEFAULT_AGE);
    let location = non_blank(&fields.location).unwrap_or_else(|| DEFAULT_LOCATION.to_string());
    let experience =
        non_blank(&fields.experience).unwrap_or_else(|| DEFAULT_EXPERIENCE.to_string());
    let education = non_blank(&fields.education).unwrap_or_else(|| DEFAULT_EDUCATION.to_string());
    let expected_salary = fields
        .expected_salary
        .filter(|salary| *salary > 0)
        .unwrap_or(DEFAULT_EXPECTED_SALARY);
    let accommodation_type = fields.accommodation_type.unwrap_or(DEFAULT_ACCOMMODATION);
    let community = non_blank(&fields.community).unwrap_or_else(|| DEFAULT_COMMUNITY.to_string());
    let skills = non_empty_list(&fields.skills, &DEFAULT_SKILLS);
    let languages = non_empty_list(&fields.languages, &DEFAULT_LANGUAGES);

    let mut details = HousegirlDetails {
        age,
        location,
        experience,
        education,
        expected_salary,
        accommodation_type,
        community,
        skills,
        languages,
        bio: String::new(),
        agency_id: non_blank(&fields.agency_id),
    };
    details.bio = non_blank(&fields.bio).unwrap_or_else(|| generate_bio(&details));
    details
}

/// First-person summary used when a worker leaves the bio blank.
pub fn generate_bio(details: &HousegirlDetails) -> String {
    let mut bio = format!("I am a {}-year-old", details.age);

    let experience_note = match details.experience.as_str() {
        "No Experience" => " hardworking person looking for my first house help job. I am eager to learn and willing to work hard.",
        "1 Year" => " domestic worker with 1 year of experience. I am reliable and professional.",
        "2 Years" => " domestic worker with 2 years of experience. I am skilled and trustworthy.",
        "3+ Years" => " experienced domestic worker with 3+ years of experience. I am very professional and skilled.",
        _ => " domestic worker. I am hardworking and reliable.",
    };
    bio.push_str(experience_note);

    if !details.skills.is_empty() {
        bio.push_str(&format!(" I am skilled in {}.", details.skills.join(", ")));
    }
    if !details.languages.is_empty() {
        bio.push_str(&format!(" I speak {}.", details.languages.join(", ")));
    }

    bio.push_str(match details.accommodation_type {
        AccommodationType::LiveIn => " I prefer live-in arrangements.",
        AccommodationType::LiveOut => " I prefer live-out arrangements.",
        AccommodationType::Both => " I am flexible with accommodation arrangements.",
    });

    bio.push_str(&format!(" I am located in {}.", details.location));
    bio.push_str(&format!(" I have {} education.", details.education));
    if details.community != "Other" {
        bio.push_str(&format!(" I am from the {} community.", details.community));
    }
    bio
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn non_empty_list(values: &Option<Vec<String>>, fallback: &[&str]) -> Vec<String> {
    let provided: Vec<String> = values
        .iter()
        .flatten()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();

    if provided.is_empty() {
        fallback.iter().map(|value| value.to_string()).collect()
    } else {
        provided
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn housegirl_blank_form_gets_every_default() {
        let profile = complete_profile(UserType::Housegirl, &ProfileFields::default())
            .expect("housegirl profile completes");
        let RoleProfile::Housegirl(details) = profile else {
            panic!("expected housegirl profile");
        };

        assert_eq!(details.age, 25);
        assert_eq!(details.location, "Nairobi");
        assert_eq!(details.education, "Form 4 and Above");
        assert_eq!(details.experience, "2 Years");
        assert_eq!(details.expected_salary, 8000);
        assert_eq!(details.accommodation_type, AccommodationType::LiveIn);
        assert_eq!(details.community, "Kikuyu");
        assert_eq!(
            details.skills,
            vec!["Cooking", "Cleaning", "Laundry", "Childcare"]
        );
        assert_eq!(details.languages, vec!["English", "Swahili"]);
        assert!(details
            .bio
            .starts_with("I am a 25-year-old domestic worker with 2 years of experience."));
        assert!(details.bio.contains("I am from the Kikuyu community."));
    }

    #[test]
    fn provided_fields_win_over_defaults() {
        let fields = ProfileFields {
            age: Some(31),
            location: Some("Mombasa".to_string()),
            skills: Some(vec!["Gardening".to_string(), "  ".to_string()]),
            bio: Some("Reliable cook".to_string()),
            community: Some("  ".to_string()),
            ..ProfileFields::default()
        };
        let profile = complete_profile(UserType::Housegirl, &fields).expect("completes");
        let RoleProfile::Housegirl(details) = profile else {
            panic!("expected housegirl profile");
        };

        assert_eq!(details.age, 31);
        assert_eq!(details.location, "Mombasa");
        assert_eq!(details.skills, vec!["Gardening"]);
        assert_eq!(details.bio, "Reliable cook");
        assert_eq!(details.community, "Kikuyu");
    }

    #[test]
    fn agency_requires_a_name() {
        let err = complete_profile(UserType::Agency, &ProfileFields::default())
            .expect_err("agency name required");
        assert!(matches!(err, AuthError::MissingField("agency_name")));

        let fields = ProfileFields {
            agency_name: Some("Nairobi Placements".to_string()),
            ..ProfileFields::default()
        };
        let profile = complete_profile(UserType::Agency, &fields).expect("agency completes");
        assert_eq!(profile.user_type(), UserType::Agency);
    }

    #[test]
    fn bio_skips_other_community() {
        let fields = ProfileFields {
            community: Some("Other".to_string()),
            experience: Some("No Experience".to_string()),
            ..ProfileFields::default()
        };
        let RoleProfile::Housegirl(details) =
            complete_profile(UserType::Housegirl, &fields).expect("completes")
        else {
            panic!("expected housegirl profile");
        };
        assert!(details.bio.contains("looking for my first house help job"));
        assert!(!details.bio.contains("community"));
    }
}
