//! Persona-aware default builders.
//!
//! Pure functions that turn one raw input bag into the persona-shaped
//! [`Profile`], [`Preferences`], and [`Stats`] records created together at
//! user creation. Each builder fills every field with either the supplied
//! value or a persona-appropriate zero/empty default; the tagged unions make
//! cross-persona field leakage unrepresentable.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::model::{
    AcademyProfile, AppPrefs, Child, CoachProfile, GeneralStats, MedicalInfo, NotificationPrefs,
    ParentProfile, Persona, PersonaPrefs, PersonaStats, PlayerProfile, Preferences, PrivacyPrefs,
    Profile, ProfileCommon, SkillLevel, Stats,
};

/// Raw attribute bag for user creation. The persona arrives as an untyped tag
/// from the consuming layer and is validated by the store; persona-specific
/// fields not carried by the requested persona's variant are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub phone: Option<String>,
    pub persona: String,
    pub first_name: String,
    pub last_name: String,
    pub location: String,
    pub bio: String,
    pub avatar: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub languages: Vec<String>,
    pub timezone: Option<String>,
    pub sports: Vec<String>,
    pub specializations: Vec<String>,
    pub experience_years: Option<u32>,
    pub hourly_rate: Option<f64>,
    pub skill_level: Option<SkillLevel>,
    pub position: Option<String>,
    pub guardian_id: Option<String>,
    pub children: Vec<Child>,
    pub academy_name: Option<String>,
    pub founded_year: Option<u16>,
}

/// Generates a fresh user id: UUID v7, time-ordered with a random suffix.
pub(crate) fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

fn build_common(input: &NewUser) -> ProfileCommon {
    ProfileCommon {
        first_name: input.first_name.clone(),
        last_name: input.last_name.clone(),
        avatar: input.avatar.clone(),
        location: input.location.clone(),
        bio: input.bio.clone(),
        date_of_birth: input.date_of_birth,
        gender: input.gender.clone(),
        languages: input.languages.clone(),
        timezone: input
            .timezone
            .clone()
            .unwrap_or_else(|| "UTC".to_string()),
    }
}

/// Builds the profile variant matching `persona` from the raw input.
pub fn build_profile(persona: Persona, input: &NewUser) -> Profile {
    let common = build_common(input);
    match persona {
        Persona::Coach => Profile::Coach(CoachProfile {
            common,
            specializations: input.specializations.clone(),
            sports: input.sports.clone(),
            experience_years: input.experience_years.unwrap_or(0),
            hourly_rate: input.hourly_rate.unwrap_or(0.0),
            ..Default::default()
        }),
        Persona::Player => Profile::Player(PlayerProfile {
            common,
            sports: input.sports.clone(),
            skill_level: input.skill_level.unwrap_or_default(),
            position: input.position.clone(),
            medical: MedicalInfo::default(),
            guardian_id: input.guardian_id.clone(),
            ..Default::default()
        }),
        Persona::Parent => Profile::Parent(ParentProfile {
            common,
            children: input.children.clone(),
            ..Default::default()
        }),
        Persona::Academy => Profile::Academy(AcademyProfile {
            common,
            academy_name: input
                .academy_name
                .clone()
                .unwrap_or_else(|| input.first_name.clone()),
            founded_year: input.founded_year,
            sports_offered: input.sports.clone(),
            ..Default::default()
        }),
    }
}

/// Builds the default preferences record paired with a new user.
pub fn default_preferences(user_id: &str, persona: Persona, now: DateTime<Utc>) -> Preferences {
    Preferences {
        user_id: user_id.to_string(),
        notifications: NotificationPrefs::default(),
        privacy: PrivacyPrefs::default(),
        app: AppPrefs::default(),
        persona_prefs: default_persona_prefs(persona),
        updated_at: now,
    }
}

fn default_persona_prefs(persona: Persona) -> PersonaPrefs {
    match persona {
        Persona::Coach => PersonaPrefs::Coach {
            auto_accept_bookings: false,
            session_reminders: true,
            new_student_alerts: true,
        },
        Persona::Player => PersonaPrefs::Player {
            goal_tracking: true,
            progress_sharing: false,
            session_reminders: true,
        },
        Persona::Parent => PersonaPrefs::Parent {
            weekly_digest: true,
            child_activity_alerts: true,
        },
        Persona::Academy => PersonaPrefs::Academy {
            roster_alerts: true,
            enrollment_digest: false,
        },
    }
}

/// Builds the default stats record paired with a new user.
pub fn default_stats(user_id: &str, persona: Persona, now: DateTime<Utc>) -> Stats {
    Stats {
        user_id: user_id.to_string(),
        general: GeneralStats {
            joined_at: now,
            last_login: None,
            login_streak: 0,
            total_logins: 0,
            profile_views: 0,
            connection_count: 0,
        },
        persona_stats: default_persona_stats(persona),
        updated_at: now,
    }
}

fn default_persona_stats(persona: Persona) -> PersonaStats {
    match persona {
        Persona::Coach => PersonaStats::Coach {
            sessions_completed: 0,
            total_revenue: 0.0,
            active_students: 0,
            average_rating: 0.0,
        },
        Persona::Player => PersonaStats::Player {
            sessions_attended: 0,
            badges: 0,
            goals_completed: 0,
            hours_trained: 0.0,
        },
        Persona::Parent => PersonaStats::Parent {
            children_enrolled: 0,
            sessions_booked: 0,
        },
        Persona::Academy => PersonaStats::Academy {
            programs_run: 0,
            total_enrollments: 0,
            events_hosted: 0,
        },
    }
}
