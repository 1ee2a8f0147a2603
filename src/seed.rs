//! First-run population bootstrapping.
//!
//! Runs only when the store initializes against absent or unreadable storage.
//! Produces a fixed-proportion population with randomized-but-plausible
//! attributes drawn from small reference lists, so a freshly installed client
//! has non-empty, explorable data. Every seeded user goes through the same
//! creation routine as a caller-driven `create_user`, so the four-record
//! pairing and persona-shape invariants hold for seeds too.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::engine::Store;
use crate::factory::NewUser;
use crate::model::{Child, SkillLevel};
use crate::Result;

pub const COACHES: usize = 8;
pub const PLAYERS: usize = 12;
pub const PARENTS: usize = 5;
pub const ACADEMIES: usize = 2;
/// Total size of the seeded population.
pub const POPULATION: usize = COACHES + PLAYERS + PARENTS + ACADEMIES;

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Diego", "Elena", "Felix", "Grace", "Hugo", "Ines", "Jonas", "Karim",
    "Lucia", "Marco", "Nadia", "Omar", "Priya",
];

const LAST_NAMES: &[&str] = &[
    "Almeida", "Berg", "Costa", "Dubois", "Edwards", "Fischer", "Garcia", "Haddad", "Ivanov",
    "Jensen", "Kim", "Lopez", "Moreau", "Nakamura", "Ortega", "Patel",
];

const CITIES: &[&str] = &[
    "New York",
    "Lisbon",
    "Barcelona",
    "Austin",
    "Denver",
    "Toronto",
    "Manchester",
    "Melbourne",
    "Cape Town",
    "Singapore",
];

const SPORTS: &[&str] = &[
    "Tennis",
    "Soccer",
    "Basketball",
    "Swimming",
    "Volleyball",
    "Track",
    "Golf",
    "Baseball",
];

const SPECIALIZATIONS: &[&str] = &[
    "Youth development",
    "Strength and conditioning",
    "Technique analysis",
    "Match strategy",
    "Injury recovery",
];

const BIOS: &[&str] = &[
    "Focused on fundamentals and steady progress.",
    "Believes every session should end with a smile.",
    "Competitive background, patient teaching style.",
    "Data-driven training plans, old-school work ethic.",
];

fn pick<'a>(rng: &mut impl Rng, items: &'a [&'a str]) -> &'a str {
    items[rng.gen_range(0..items.len())]
}

fn pick_many(rng: &mut impl Rng, items: &[&str], n: usize) -> Vec<String> {
    items
        .choose_multiple(rng, n)
        .map(|s| s.to_string())
        .collect()
}

fn base_input(rng: &mut impl Rng, persona: &str, index: usize) -> NewUser {
    let first = pick(rng, FIRST_NAMES);
    let last = pick(rng, LAST_NAMES);
    NewUser {
        email: format!(
            "{}.{}{}@rosterapp.dev",
            first.to_lowercase(),
            last.to_lowercase(),
            index
        ),
        persona: persona.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        location: pick(rng, CITIES).to_string(),
        bio: pick(rng, BIOS).to_string(),
        ..Default::default()
    }
}

fn coach_input(rng: &mut impl Rng, index: usize) -> NewUser {
    let sport_count = rng.gen_range(1..=2);
    let spec_count = rng.gen_range(1..=2);
    NewUser {
        sports: pick_many(rng, SPORTS, sport_count),
        specializations: pick_many(rng, SPECIALIZATIONS, spec_count),
        experience_years: Some(rng.gen_range(1..=20)),
        hourly_rate: Some(rng.gen_range(25..=120) as f64),
        ..base_input(rng, "coach", index)
    }
}

fn player_input(rng: &mut impl Rng, index: usize) -> NewUser {
    let skill = match rng.gen_range(0..3) {
        0 => SkillLevel::Beginner,
        1 => SkillLevel::Intermediate,
        _ => SkillLevel::Advanced,
    };
    let sport_count = rng.gen_range(1..=2);
    NewUser {
        sports: pick_many(rng, SPORTS, sport_count),
        skill_level: Some(skill),
        ..base_input(rng, "player", index)
    }
}

fn parent_input(rng: &mut impl Rng, index: usize) -> NewUser {
    let children = (0..rng.gen_range(1..=2))
        .map(|_| Child {
            name: pick(rng, FIRST_NAMES).to_string(),
            age: rng.gen_range(6..=15),
            sports: pick_many(rng, SPORTS, 1),
            skill_level: SkillLevel::Beginner,
        })
        .collect();
    NewUser {
        children,
        ..base_input(rng, "parent", index)
    }
}

fn academy_input(rng: &mut impl Rng, index: usize) -> NewUser {
    let base = base_input(rng, "academy", index);
    let sport_count = rng.gen_range(2..=3);
    NewUser {
        academy_name: Some(format!("{} {} Academy", base.location, pick(rng, SPORTS))),
        founded_year: Some(rng.gen_range(1985..=2020)),
        sports: pick_many(rng, SPORTS, sport_count),
        ..base
    }
}

/// Inserts the full starting population through the store's shared creation
/// routine. The caller persists afterwards.
pub(crate) fn populate(store: &Store) -> Result<usize> {
    let mut rng = rand::thread_rng();
    for i in 0..COACHES {
        store.insert_new_user(coach_input(&mut rng, i))?;
    }
    for i in 0..PLAYERS {
        store.insert_new_user(player_input(&mut rng, COACHES + i))?;
    }
    for i in 0..PARENTS {
        store.insert_new_user(parent_input(&mut rng, COACHES + PLAYERS + i))?;
    }
    for i in 0..ACADEMIES {
        store.insert_new_user(academy_input(&mut rng, COACHES + PLAYERS + PARENTS + i))?;
    }
    Ok(POPULATION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Persona;

    #[test]
    fn inputs_carry_valid_persona_tags() {
        let mut rng = rand::thread_rng();
        assert_eq!(
            Persona::parse(&coach_input(&mut rng, 0).persona).unwrap(),
            Persona::Coach
        );
        assert_eq!(
            Persona::parse(&academy_input(&mut rng, 0).persona).unwrap(),
            Persona::Academy
        );
    }

    #[test]
    fn parent_inputs_always_have_children() {
        let mut rng = rand::thread_rng();
        for i in 0..20 {
            let input = parent_input(&mut rng, i);
            assert!(!input.children.is_empty());
            assert!(input.children.iter().all(|c| (6..=15).contains(&c.age)));
        }
    }

    #[test]
    fn sport_lists_stay_within_the_drawn_counts() {
        let mut rng = rand::thread_rng();
        for i in 0..20 {
            assert!((1..=2).contains(&coach_input(&mut rng, i).sports.len()));
            assert!((1..=2).contains(&player_input(&mut rng, i).sports.len()));
            assert!((2..=3).contains(&academy_input(&mut rng, i).sports.len()));
        }
    }

    #[test]
    fn proportions_favor_players_then_coaches() {
        assert!(PLAYERS > COACHES);
        assert!(COACHES > PARENTS);
        assert!(PARENTS > ACADEMIES);
        assert_eq!(POPULATION, COACHES + PLAYERS + PARENTS + ACADEMIES);
    }
}
