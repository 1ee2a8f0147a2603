//! Entity schema for the Roster Store.
//!
//! Four persona variants share a common identity and lifecycle through
//! [`User`]; the persona-shaped payloads ([`Profile`], the persona sub-records
//! of [`Preferences`] and [`Stats`]) are tagged unions keyed on the same
//! persona tag, so handling every persona is exhaustiveness-checked at
//! compile time.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The fixed role tag that determines a user's profile, preferences, and
/// stats shape. Immutable once set at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Coach,
    Player,
    Parent,
    Academy,
}

impl Persona {
    /// Parses a raw persona tag as supplied by the consuming layer.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "coach" => Ok(Self::Coach),
            "player" => Ok(Self::Player),
            "parent" => Ok(Self::Parent),
            "academy" => Ok(Self::Academy),
            other => Err(Error::InvalidPersona(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coach => "coach",
            Self::Player => "player",
            Self::Parent => "parent",
            Self::Academy => "academy",
        }
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account lifecycle state, independent of the `is_verified` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Pending,
    Active,
    Inactive,
    Suspended,
    Verified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Professional,
}

/// The root entity. One record per user id; always paired with exactly one
/// [`Preferences`], [`Stats`], and [`ConnectionList`] record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Time-ordered unique id (UUID v7), generated at creation. Immutable.
    pub id: String,
    pub email: String,
    pub phone: Option<String>,
    pub persona: Persona,
    pub status: UserStatus,
    pub profile: Profile,
    pub settings: UserSettings,
    pub privacy: PrivacySettings,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    /// Advances on every mutation; never regresses below `created_at`.
    pub updated_at: DateTime<Utc>,
    /// Refreshed when the user becomes the current user.
    pub last_active: DateTime<Utc>,
}

/// Small flat per-user settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub notifications: bool,
    pub email_updates: bool,
    pub sms_alerts: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            notifications: true,
            email_updates: true,
            sms_alerts: false,
        }
    }
}

/// Small flat per-user privacy record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivacySettings {
    pub profile_visible: bool,
    pub show_contact_info: bool,
    pub searchable: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            profile_visible: true,
            show_contact_info: false,
            searchable: true,
        }
    }
}

/// Fields every persona's profile carries, flattened into each variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileCommon {
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub location: String,
    pub bio: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub languages: Vec<String>,
    pub timezone: String,
}

impl Default for ProfileCommon {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            avatar: None,
            location: String::new(),
            bio: String::new(),
            date_of_birth: None,
            gender: None,
            languages: Vec::new(),
            timezone: "UTC".to_string(),
        }
    }
}

impl ProfileCommon {
    /// "First Last" display form, used by free-text search.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Persona-shaped profile payload. The serialized form carries the persona
/// tag inline, so a stored profile can only ever deserialize back into the
/// variant it was created as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "persona", rename_all = "lowercase")]
pub enum Profile {
    Coach(CoachProfile),
    Player(PlayerProfile),
    Parent(ParentProfile),
    Academy(AcademyProfile),
}

impl Profile {
    pub fn persona(&self) -> Persona {
        match self {
            Self::Coach(_) => Persona::Coach,
            Self::Player(_) => Persona::Player,
            Self::Parent(_) => Persona::Parent,
            Self::Academy(_) => Persona::Academy,
        }
    }

    pub fn common(&self) -> &ProfileCommon {
        match self {
            Self::Coach(p) => &p.common,
            Self::Player(p) => &p.common,
            Self::Parent(p) => &p.common,
            Self::Academy(p) => &p.common,
        }
    }

    /// The sport list this variant carries: `sports` for coaches and players,
    /// `sports_offered` for academies. Parents carry neither.
    pub fn sports(&self) -> &[String] {
        match self {
            Self::Coach(p) => &p.sports,
            Self::Player(p) => &p.sports,
            Self::Parent(_) => &[],
            Self::Academy(p) => &p.sports_offered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoachProfile {
    #[serde(flatten)]
    pub common: ProfileCommon,
    pub specializations: Vec<String>,
    pub sports: Vec<String>,
    pub experience_years: u32,
    pub certifications: Vec<String>,
    pub education: Vec<String>,
    pub achievements: Vec<String>,
    pub hourly_rate: f64,
    pub session_types: Vec<String>,
    /// Weekly availability grid: day name to open slots.
    pub availability: BTreeMap<String, Vec<String>>,
    pub business_name: Option<String>,
    pub total_students: u32,
    pub success_rate: f64,
    pub testimonial_count: u32,
    pub rating: f64,
    pub rating_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerProfile {
    #[serde(flatten)]
    pub common: ProfileCommon,
    pub sports: Vec<String>,
    pub skill_level: SkillLevel,
    pub position: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub goals: Vec<String>,
    pub medical: MedicalInfo,
    /// Linked guardian user id when the player is a minor.
    pub guardian_id: Option<String>,
    pub school: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MedicalInfo {
    pub allergies: Vec<String>,
    pub medications: Vec<String>,
    pub injuries: Vec<String>,
    pub emergency_contact: Option<EmergencyContact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    pub relationship: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParentProfile {
    #[serde(flatten)]
    pub common: ProfileCommon,
    pub children: Vec<Child>,
    pub interests: Vec<String>,
    pub budget: BudgetRange,
    pub has_transportation: bool,
    pub preferred_locations: Vec<String>,
    pub communication_preferences: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub name: String,
    pub age: u8,
    pub sports: Vec<String>,
    pub skill_level: SkillLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AcademyProfile {
    #[serde(flatten)]
    pub common: ProfileCommon,
    pub academy_name: String,
    pub founded_year: Option<u16>,
    pub sports_offered: Vec<String>,
    pub age_groups: Vec<String>,
    pub facilities: Vec<String>,
    pub programs: Vec<String>,
    pub staff_count: u32,
    pub capacity: u32,
    pub price_range: BudgetRange,
    /// Weekly operating hours: day name to an "open-close" span.
    pub operating_hours: BTreeMap<String, String>,
    pub amenities: Vec<String>,
    pub accreditations: Vec<String>,
}

/// Shallow patch for [`User`]. Every supplied field replaces the stored field
/// wholesale; nested records in the patch are not merged into their stored
/// counterparts. `id`, `persona`, and `created_at` are not patchable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<UserStatus>,
    pub profile: Option<Profile>,
    pub settings: Option<UserSettings>,
    pub privacy: Option<PrivacySettings>,
    pub is_verified: Option<bool>,
}

impl UserPatch {
    /// Applies the patch in place. Rejects a replacement profile whose
    /// persona differs from the user's immutable persona.
    pub fn apply(self, user: &mut User) -> Result<()> {
        if let Some(profile) = &self.profile {
            if profile.persona() != user.persona {
                return Err(Error::InvalidPersona(profile.persona().to_string()));
            }
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(phone) = self.phone {
            user.phone = Some(phone);
        }
        if let Some(status) = self.status {
            user.status = status;
        }
        if let Some(profile) = self.profile {
            user.profile = profile;
        }
        if let Some(settings) = self.settings {
            user.settings = settings;
        }
        if let Some(privacy) = self.privacy {
            user.privacy = privacy;
        }
        if let Some(is_verified) = self.is_verified {
            user.is_verified = is_verified;
        }
        Ok(())
    }
}

/// One preferences record per user. Created at user creation with
/// persona-appropriate defaults; updated by shallow merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub user_id: String,
    pub notifications: NotificationPrefs,
    pub privacy: PrivacyPrefs,
    pub app: AppPrefs,
    pub persona_prefs: PersonaPrefs,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPrefs {
    pub email: bool,
    pub push: bool,
    pub sms: bool,
    pub session_reminders: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            sms: false,
            session_reminders: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivacyPrefs {
    pub show_profile: bool,
    pub show_activity: bool,
    pub allow_messages: bool,
}

impl Default for PrivacyPrefs {
    fn default() -> Self {
        Self {
            show_profile: true,
            show_activity: true,
            allow_messages: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPrefs {
    pub theme: String,
    pub language: String,
    pub units: Units,
    pub auto_sync: bool,
}

impl Default for AppPrefs {
    fn default() -> Self {
        Self {
            theme: "system".to_string(),
            language: "en".to_string(),
            units: Units::Metric,
            auto_sync: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

/// Persona-specific preference toggles, tagged with the owning persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "persona", rename_all = "lowercase")]
pub enum PersonaPrefs {
    Coach {
        auto_accept_bookings: bool,
        session_reminders: bool,
        new_student_alerts: bool,
    },
    Player {
        goal_tracking: bool,
        progress_sharing: bool,
        session_reminders: bool,
    },
    Parent {
        weekly_digest: bool,
        child_activity_alerts: bool,
    },
    Academy {
        roster_alerts: bool,
        enrollment_digest: bool,
    },
}

impl PersonaPrefs {
    pub fn persona(&self) -> Persona {
        match self {
            Self::Coach { .. } => Persona::Coach,
            Self::Player { .. } => Persona::Player,
            Self::Parent { .. } => Persona::Parent,
            Self::Academy { .. } => Persona::Academy,
        }
    }
}

/// One stats record per user: a persona-independent general block plus
/// persona-specific counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub user_id: String,
    pub general: GeneralStats,
    pub persona_stats: PersonaStats,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralStats {
    pub joined_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub login_streak: u32,
    pub total_logins: u64,
    pub profile_views: u64,
    pub connection_count: u32,
}

/// Persona-specific counters, tagged with the owning persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "persona", rename_all = "lowercase")]
pub enum PersonaStats {
    Coach {
        sessions_completed: u64,
        total_revenue: f64,
        active_students: u32,
        average_rating: f64,
    },
    Player {
        sessions_attended: u64,
        badges: u32,
        goals_completed: u32,
        hours_trained: f64,
    },
    Parent {
        children_enrolled: u32,
        sessions_booked: u64,
    },
    Academy {
        programs_run: u32,
        total_enrollments: u64,
        events_hosted: u32,
    },
}

impl PersonaStats {
    pub fn persona(&self) -> Persona {
        match self {
            Self::Coach { .. } => Persona::Coach,
            Self::Player { .. } => Persona::Player,
            Self::Parent { .. } => Persona::Parent,
            Self::Academy { .. } => Persona::Academy,
        }
    }
}

/// The directed connection edges owned by one user.
///
/// Edges are intentionally not mirrored onto the target's own record, and
/// target ids are not checked for existence; consumers that need a mutual
/// view must add the reverse edge themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionList {
    pub user_id: String,
    pub edges: Vec<Connection>,
}

impl ConnectionList {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            edges: Vec::new(),
        }
    }
}

/// A single directed edge to another user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// The target user id.
    pub user_id: String,
    /// Free-form edge kind ("friend", "coach", "teammate", ...); last write wins.
    pub kind: String,
    pub status: ConnectionStatus,
    pub connected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Active,
    Pending,
    Blocked,
}

/// Shallow-merges the object keys of `patch` onto the serialized form of
/// `record` and deserializes the result back. Keys named in `pinned` keep
/// their stored value regardless of the patch (used to pin persona tags).
pub(crate) fn merge_record<T>(record: &T, patch: &serde_json::Value, pinned: &[&str]) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut doc = serde_json::to_value(record)?;
    let base = doc.as_object_mut().ok_or_else(|| {
        Error::Serialization(serde::de::Error::custom("record is not a JSON object"))
    })?;
    if let Some(patch_obj) = patch.as_object() {
        for (key, value) in patch_obj {
            if pinned.contains(&key.as_str()) {
                continue;
            }
            base.insert(key.clone(), value.clone());
        }
    }
    Ok(serde_json::from_value(doc)?)
}

/// One-level merge into a profile. The persona tag is pinned to the stored
/// variant, so the merged document always deserializes back into the same
/// variant; fields belonging to other personas are ignored by deserialization.
pub fn merge_profile(profile: &Profile, patch: &serde_json::Value) -> Result<Profile> {
    merge_record(profile, patch, &["persona"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn player_profile() -> Profile {
        Profile::Player(PlayerProfile {
            common: ProfileCommon {
                first_name: "Ana".to_string(),
                last_name: "Lee".to_string(),
                location: "Lisbon".to_string(),
                bio: "Weekend tennis player".to_string(),
                ..Default::default()
            },
            sports: vec!["Tennis".to_string()],
            skill_level: SkillLevel::Intermediate,
            position: Some("Baseline".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn profile_round_trips_with_persona_tag() {
        let profile = player_profile();
        let doc = serde_json::to_value(&profile).unwrap();
        assert_eq!(doc["persona"], json!("player"));
        assert_eq!(doc["first_name"], json!("Ana"));

        let back: Profile = serde_json::from_value(doc).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn merge_profile_preserves_unnamed_fields() {
        let profile = player_profile();
        let merged = merge_profile(&profile, &json!({ "bio": "Now training daily" })).unwrap();

        let Profile::Player(p) = merged else {
            panic!("variant changed");
        };
        assert_eq!(p.common.bio, "Now training daily");
        assert_eq!(p.common.first_name, "Ana");
        assert_eq!(p.sports, vec!["Tennis".to_string()]);
        assert_eq!(p.position.as_deref(), Some("Baseline"));
    }

    #[test]
    fn merge_profile_pins_persona_tag() {
        let profile = player_profile();
        let merged = merge_profile(&profile, &json!({ "persona": "coach" })).unwrap();
        assert_eq!(merged.persona(), Persona::Player);
    }

    #[test]
    fn user_patch_replaces_profile_wholesale() {
        let mut user = User {
            id: "u1".to_string(),
            email: "ana@example.com".to_string(),
            phone: None,
            persona: Persona::Player,
            status: UserStatus::Pending,
            profile: player_profile(),
            settings: UserSettings::default(),
            privacy: PrivacySettings::default(),
            is_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_active: Utc::now(),
        };

        let replacement = Profile::Player(PlayerProfile {
            common: ProfileCommon {
                bio: "x".to_string(),
                ..Default::default()
            },
            ..Default::default()
        });
        UserPatch {
            profile: Some(replacement),
            ..Default::default()
        }
        .apply(&mut user)
        .unwrap();

        // Shallow merge: the whole profile is replaced, not merged.
        assert_eq!(user.profile.common().bio, "x");
        assert_eq!(user.profile.common().first_name, "");
        assert!(user.profile.sports().is_empty());
    }

    #[test]
    fn user_patch_rejects_persona_swap() {
        let mut user = User {
            id: "u1".to_string(),
            email: "ana@example.com".to_string(),
            phone: None,
            persona: Persona::Player,
            status: UserStatus::Pending,
            profile: player_profile(),
            settings: UserSettings::default(),
            privacy: PrivacySettings::default(),
            is_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_active: Utc::now(),
        };

        let res = UserPatch {
            profile: Some(Profile::Coach(CoachProfile::default())),
            ..Default::default()
        }
        .apply(&mut user);
        assert!(matches!(res, Err(Error::InvalidPersona(_))));
        assert_eq!(user.persona, Persona::Player);
    }

    #[test]
    fn persona_parse_rejects_unknown_tags() {
        assert!(matches!(
            Persona::parse("referee"),
            Err(Error::InvalidPersona(_))
        ));
        assert_eq!(Persona::parse("Coach").unwrap(), Persona::Coach);
    }
}
