//! Predicate-based search over the in-memory user collection.
//!
//! A [`SearchFilters`] is a conjunction of independent predicates; omitted
//! filters are not applied. Matching is a full scan with no index, which is
//! fine at the intended scale of hundreds of users.

use crate::model::{Persona, User, UserStatus};

/// Optional filters combined with logical AND.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub persona: Option<Persona>,
    /// Case-insensitive substring match on the profile location.
    pub location: Option<String>,
    /// Case-insensitive substring match against the variant's sport list
    /// (`sports` or `sports_offered`; parents carry neither and never match).
    pub sport: Option<String>,
    pub status: Option<UserStatus>,
    pub verified: Option<bool>,
    /// Case-insensitive substring match over "first last" plus bio.
    pub query: Option<String>,
}

impl SearchFilters {
    /// Evaluates the conjunction against one user. Predicates run in a fixed
    /// order (persona, location, sport, status, verified, free text); the
    /// order does not change the result.
    pub fn matches(&self, user: &User) -> bool {
        if let Some(persona) = self.persona {
            if user.persona != persona {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !contains_ci(&user.profile.common().location, location) {
                return false;
            }
        }
        if let Some(sport) = &self.sport {
            if !user.profile.sports().iter().any(|s| contains_ci(s, sport)) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if user.status != status {
                return false;
            }
        }
        if let Some(verified) = self.verified {
            if user.is_verified != verified {
                return false;
            }
        }
        if let Some(query) = &self.query {
            let common = user.profile.common();
            let haystack = format!("{} {}", common.full_name(), common.bio);
            if !contains_ci(&haystack, query) {
                return false;
            }
        }
        true
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{self, NewUser};
    use crate::model::{PrivacySettings, UserSettings};
    use chrono::Utc;

    fn make_user(persona: Persona, first: &str, location: &str, sports: &[&str]) -> User {
        let input = NewUser {
            email: format!("{}@example.com", first.to_lowercase()),
            persona: persona.to_string(),
            first_name: first.to_string(),
            last_name: "Tester".to_string(),
            location: location.to_string(),
            bio: "Loves early morning drills".to_string(),
            sports: sports.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        let now = Utc::now();
        User {
            id: format!("u-{first}"),
            email: input.email.clone(),
            phone: None,
            persona,
            status: UserStatus::Pending,
            profile: factory::build_profile(persona, &input),
            settings: UserSettings::default(),
            privacy: PrivacySettings::default(),
            is_verified: false,
            created_at: now,
            updated_at: now,
            last_active: now,
        }
    }

    #[test]
    fn empty_filters_match_everyone() {
        let user = make_user(Persona::Coach, "Maya", "New York", &["Tennis"]);
        assert!(SearchFilters::default().matches(&user));
    }

    #[test]
    fn persona_and_location_compose_as_conjunction() {
        let coach = make_user(Persona::Coach, "Maya", "New York", &["Tennis"]);
        let player = make_user(Persona::Player, "Iker", "Newcastle", &["Soccer"]);

        let filters = SearchFilters {
            persona: Some(Persona::Coach),
            location: Some("new".to_string()),
            ..Default::default()
        };
        assert!(filters.matches(&coach));
        assert!(!filters.matches(&player));

        let persona_only = SearchFilters {
            persona: Some(Persona::Coach),
            ..Default::default()
        };
        assert!(persona_only.matches(&coach));
    }

    #[test]
    fn sport_filter_reads_sports_offered_for_academies() {
        let academy = make_user(Persona::Academy, "Summit", "Denver", &["Basketball"]);
        let filters = SearchFilters {
            sport: Some("basket".to_string()),
            ..Default::default()
        };
        assert!(filters.matches(&academy));
    }

    #[test]
    fn parents_never_match_a_sport_filter() {
        let parent = make_user(Persona::Parent, "Rosa", "Austin", &["Tennis"]);
        let filters = SearchFilters {
            sport: Some("tennis".to_string()),
            ..Default::default()
        };
        assert!(!filters.matches(&parent));
    }

    #[test]
    fn free_text_searches_name_and_bio() {
        let user = make_user(Persona::Player, "Iker", "Bilbao", &["Soccer"]);

        let by_name = SearchFilters {
            query: Some("iker".to_string()),
            ..Default::default()
        };
        assert!(by_name.matches(&user));

        let by_bio = SearchFilters {
            query: Some("MORNING DRILLS".to_string()),
            ..Default::default()
        };
        assert!(by_bio.matches(&user));

        let miss = SearchFilters {
            query: Some("goalkeeper".to_string()),
            ..Default::default()
        };
        assert!(!miss.matches(&user));
    }

    #[test]
    fn status_and_verified_filters_apply() {
        let mut user = make_user(Persona::Coach, "Maya", "New York", &["Tennis"]);
        user.status = UserStatus::Active;
        user.is_verified = true;

        let filters = SearchFilters {
            status: Some(UserStatus::Active),
            verified: Some(true),
            ..Default::default()
        };
        assert!(filters.matches(&user));

        let wrong_status = SearchFilters {
            status: Some(UserStatus::Suspended),
            ..Default::default()
        };
        assert!(!wrong_status.matches(&user));
    }
}
