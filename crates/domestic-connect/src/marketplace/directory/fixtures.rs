//! Built-in listings served when the backend cannot be reached.

use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{
    AgencyProfile, Experience, HousegirlProfile, Salary, SubscriptionTier, VerificationStatus,
};

const WEBSITE: &str = "https://domesticconnect.ke";
const PORTRAIT_PARAMS: &str = "w=150&h=150&fit=crop&crop=face";

fn midnight(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

fn services(list: &[&str]) -> Vec<String> {
    list.iter().map(|service| service.to_string()).collect()
}

pub fn fallback_agencies() -> Vec<AgencyProfile> {
    vec![
        AgencyProfile {
            id: "demo_agency_1".to_string(),
            name: "Demo Agency Service".to_string(),
            license_number: "DEMO-2024-001".to_string(),
            verification_status: VerificationStatus::Verified,
            subscription_tier: SubscriptionTier::Premium,
            rating: 4.9,
            services: services(&["local", "international", "training", "background_checks"]),
            location: "Nairobi".to_string(),
            monthly_fee: 5000,
            commission_rate: 15.0,
            verified_workers: 50,
            successful_placements: 150,
            description: "Demo agency for testing our payment system. Experience our premium \
                          service with verified workers and guaranteed satisfaction."
                .to_string(),
            contact_email: "demo@domesticconnect.ke".to_string(),
            contact_phone: "+254700000000".to_string(),
            website: WEBSITE.to_string(),
            created_at: midnight(2024, 1, 15),
            updated_at: midnight(2024, 1, 15),
        },
        AgencyProfile {
            id: "demo_agency_2".to_string(),
            name: "Test Agency Solutions".to_string(),
            license_number: "DEMO-2024-002".to_string(),
            verification_status: VerificationStatus::Verified,
            subscription_tier: SubscriptionTier::Basic,
            rating: 4.7,
            services: services(&["local", "training"]),
            location: "Mombasa".to_string(),
            monthly_fee: 3000,
            commission_rate: 12.0,
            verified_workers: 35,
            successful_placements: 95,
            description: "Test agency for demonstrating our local placement services. Reliable \
                          and trusted for all your domestic needs."
                .to_string(),
            contact_email: "test@domesticconnect.ke".to_string(),
            contact_phone: "+254700000001".to_string(),
            website: WEBSITE.to_string(),
            created_at: midnight(2024, 1, 20),
            updated_at: midnight(2024, 1, 20),
        },
        AgencyProfile {
            id: "demo_agency_3".to_string(),
            name: "Sample International Agency".to_string(),
            license_number: "DEMO-2024-003".to_string(),
            verification_status: VerificationStatus::Verified,
            subscription_tier: SubscriptionTier::International,
            rating: 4.8,
            services: services(&["international", "local", "training", "background_checks"]),
            location: "Nairobi".to_string(),
            monthly_fee: 8000,
            commission_rate: 20.0,
            verified_workers: 75,
            successful_placements: 220,
            description: "Sample international agency for testing overseas placements. \
                          Comprehensive background checks and professional training."
                .to_string(),
            contact_email: "sample@domesticconnect.ke".to_string(),
            contact_phone: "+254700000002".to_string(),
            website: WEBSITE.to_string(),
            created_at: midnight(2024, 2, 1),
            updated_at: midnight(2024, 2, 1),
        },
    ]
}

struct Seed {
    id: u64,
    name: &'static str,
    age: u8,
    location: &'static str,
    experience: &'static str,
    salary: u32,
    bio: &'static str,
    skills: &'static [&'static str],
    rating: f32,
    reviews: u32,
    community: &'static str,
    education: &'static str,
    arrangement: (&'static str, &'static str),
    photo: &'static str,
}

impl Seed {
    fn to_profile(&self) -> HousegirlProfile {
        HousegirlProfile {
            id: self.id,
            name: self.name.to_string(),
            age: self.age,
            location: self.location.to_string(),
            experience: Experience::new(self.experience),
            salary: Salary(self.salary),
            status: "Available".to_string(),
            bio: Some(self.bio.to_string()),
            skills: services(self.skills),
            rating: Some(self.rating),
            reviews: Some(self.reviews),
            contact_unlocked: false,
            unlock_count: 0,
            phone: None,
            email: None,
            nationality: "Kenya".to_string(),
            community: self.community.to_string(),
            education: self.education.to_string(),
            work_type: self.arrangement.0.to_string(),
            living_arrangement: self.arrangement.1.to_string(),
            profile_image: Some(format!(
                "https://images.unsplash.com/{}?{PORTRAIT_PARAMS}",
                self.photo
            )),
        }
    }
}

/// Work type and living arrangement as shown on the card.
const LIVES_IN: (&str, &str) = ("Lives in", "Live-in");
const DAY_JOB: (&str, &str) = ("Day job", "Live-out");

const SEEDS: [Seed; 8] = [
    Seed {
        id: 1,
        name: "Sarah Wanjiku",
        age: 28,
        location: "Westlands, Nairobi",
        experience: "5 years",
        salary: 18_000,
        bio: "Experienced house help with excellent cooking skills.",
        skills: &["Cooking", "Cleaning", "Childcare"],
        rating: 4.8,
        reviews: 12,
        community: "Kikuyu",
        education: "Form 4 and Above",
        arrangement: LIVES_IN,
        photo: "photo-1494790108755-2616b612b786",
    },
    Seed {
        id: 2,
        name: "Grace Akinyi",
        age: 32,
        location: "Kilimani, Nairobi",
        experience: "8 years",
        salary: 22_000,
        bio: "Professional house manager with extensive experience.",
        skills: &["House Management", "Cooking", "Cleaning"],
        rating: 4.9,
        reviews: 18,
        community: "Luo",
        education: "Form 4 and Above",
        arrangement: DAY_JOB,
        photo: "photo-1438761681033-6461ffad8d80",
    },
    Seed {
        id: 3,
        name: "Mary Muthoni",
        age: 25,
        location: "Lavington, Nairobi",
        experience: "3 years",
        salary: 15_000,
        bio: "Young and energetic house help. Great with children.",
        skills: &["Cleaning", "Childcare", "Pet Care"],
        rating: 4.5,
        reviews: 8,
        community: "Kikuyu",
        education: "Class 8 and Above",
        arrangement: LIVES_IN,
        photo: "photo-1544005313-94ddf0286df2",
    },
    Seed {
        id: 4,
        name: "Jane Njeri",
        age: 35,
        location: "Karen, Nairobi",
        experience: "10 years",
        salary: 25_000,
        bio: "Senior house manager with excellent organizational skills.",
        skills: &["House Management", "Cooking", "Childcare", "Gardening"],
        rating: 4.9,
        reviews: 25,
        community: "Kikuyu",
        education: "Form 4 and Above",
        arrangement: LIVES_IN,
        photo: "photo-1507003211169-0a1dd7228f2d",
    },
    Seed {
        id: 5,
        name: "Faith Wambui",
        age: 27,
        location: "Muthaiga, Nairobi",
        experience: "4 years",
        salary: 20_000,
        bio: "Reliable and hardworking house help with cooking expertise.",
        skills: &["Cooking", "Cleaning", "Laundry"],
        rating: 4.7,
        reviews: 15,
        community: "Kamba",
        education: "Form 4 and Above",
        arrangement: DAY_JOB,
        photo: "photo-1534528741775-53994a69daeb",
    },
    Seed {
        id: 6,
        name: "Lucy Wangari",
        age: 30,
        location: "Runda, Nairobi",
        experience: "6 years",
        salary: 21_000,
        bio: "Experienced house help specializing in childcare and cooking.",
        skills: &["Childcare", "Cooking", "Cleaning"],
        rating: 4.6,
        reviews: 20,
        community: "Kikuyu",
        education: "Form 4 and Above",
        arrangement: LIVES_IN,
        photo: "photo-1508214751196-bcfd4ca60f91",
    },
    Seed {
        id: 7,
        name: "Esther Achieng",
        age: 29,
        location: "Kilimani, Nairobi",
        experience: "7 years",
        salary: 23_000,
        bio: "Professional house manager with excellent communication skills.",
        skills: &["House Management", "Cooking", "Childcare", "Pet Care"],
        rating: 4.8,
        reviews: 16,
        community: "Luo",
        education: "College/University",
        arrangement: LIVES_IN,
        photo: "photo-1494790108755-2616b612b786",
    },
    Seed {
        id: 8,
        name: "Ruth Mwikali",
        age: 26,
        location: "Westlands, Nairobi",
        experience: "4 years",
        salary: 19_000,
        bio: "Young and energetic house help with great cooking skills.",
        skills: &["Cooking", "Cleaning", "Laundry"],
        rating: 4.4,
        reviews: 10,
        community: "Kamba",
        education: "Form 4 and Above",
        arrangement: DAY_JOB,
        photo: "photo-1438761681033-6461ffad8d80",
    },
];

pub fn fallback_housegirls() -> Vec<HousegirlProfile> {
    SEEDS.iter().map(Seed::to_profile).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_sets_are_stable() {
        let agencies = fallback_agencies();
        assert_eq!(agencies.len(), 3);
        assert!(agencies.iter().all(AgencyProfile::is_verified));
        assert_eq!(agencies[2].created_at.to_rfc3339(), "2024-02-01T00:00:00+00:00");

        let housegirls = fallback_housegirls();
        assert_eq!(housegirls.len(), 8);
        assert_eq!(housegirls[0].salary.to_string(), "KES 18,000");
        assert_eq!(housegirls[3].experience.years(), Some(10));
        assert!(housegirls.iter().all(|housegirl| !housegirl.contact_unlocked));
    }
}
