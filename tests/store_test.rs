use std::sync::Arc;

use roster_store::{
    EngagementStore, FileAdapter, MemoryAdapter, NewUser, Persona, RosterStore, SearchFilters,
    Session, Store, UserAccounts, UserDirectory,
};
use serde_json::json;

fn player(first: &str, last: &str, location: &str, sports: &[&str]) -> NewUser {
    NewUser {
        email: format!(
            "{}.{}@example.com",
            first.to_lowercase(),
            last.to_lowercase()
        ),
        persona: "player".to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        location: location.to_string(),
        sports: sports.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn restart_round_trips_every_collection() {
    let adapter = Arc::new(MemoryAdapter::new());

    let (user, prefs, stats, edges) = {
        let store = Store::new(adapter.clone());
        store.initialize().await.unwrap();

        let ana = store
            .create_user(player("Ana", "Lee", "Lisbon", &["Tennis"]))
            .await
            .unwrap();
        let bruno = store
            .create_user(player("Bruno", "Costa", "Porto", &["Soccer"]))
            .await
            .unwrap();

        store
            .update_user_profile(&ana.id, json!({ "bio": "Hits a mean backhand" }))
            .await
            .unwrap();
        store
            .update_user_preferences(
                &ana.id,
                json!({ "app": { "theme": "dark", "language": "pt", "units": "metric", "auto_sync": true } }),
            )
            .await
            .unwrap();
        store.record_login(&ana.id).await.unwrap();
        store
            .add_connection(&ana.id, &bruno.id, "teammate")
            .await
            .unwrap();
        store.set_current_user(&ana.id).await.unwrap();

        let user = store.get_user_by_id(&ana.id).await.unwrap().unwrap();
        let prefs = store.get_preferences(&ana.id).await.unwrap().unwrap();
        let stats = store.get_stats(&ana.id).await.unwrap().unwrap();
        let edges = store.get_connections(&ana.id).await.unwrap();

        // Simulated process exit: drop the in-memory state.
        (user, prefs, stats, edges)
    };

    let store = Store::new(adapter);
    store.initialize().await.unwrap();

    assert_eq!(store.get_user_by_id(&user.id).await.unwrap().unwrap(), user);
    assert_eq!(
        store.get_preferences(&user.id).await.unwrap().unwrap(),
        prefs
    );
    assert_eq!(store.get_stats(&user.id).await.unwrap().unwrap(), stats);
    assert_eq!(store.get_connections(&user.id).await.unwrap(), edges);
    assert_eq!(
        store.current_user().await.unwrap().map(|u| u.id),
        Some(user.id)
    );
}

#[tokio::test]
async fn restart_round_trips_through_the_file_adapter() {
    let dir = tempfile::tempdir().unwrap();

    let ana = {
        let store = Store::new(Arc::new(FileAdapter::new(dir.path()).unwrap()));
        store
            .create_user(player("Ana", "Lee", "Lisbon", &["Tennis"]))
            .await
            .unwrap()
    };

    let store = Store::new(Arc::new(FileAdapter::new(dir.path()).unwrap()));
    let reloaded = store.get_user_by_id(&ana.id).await.unwrap().unwrap();
    assert_eq!(reloaded, ana);
}

#[tokio::test]
async fn concurrent_initialization_runs_one_seed_sequence() {
    let store = Arc::new(Store::new(Arc::new(MemoryAdapter::new())));

    let callers: Vec<_> = (0..16)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.initialize().await })
        })
        .collect();
    for caller in futures::future::join_all(callers).await {
        caller.unwrap().unwrap();
    }

    // One seed sequence: the population is present exactly once, and every
    // caller observed the same initialized store.
    assert_eq!(
        store.user_count().await.unwrap(),
        roster_store::seed::POPULATION
    );
}

#[tokio::test]
async fn repeated_initialization_does_not_reseed() {
    let store = Store::new(Arc::new(MemoryAdapter::new()));
    store.initialize().await.unwrap();

    let ana = store
        .create_user(player("Ana", "Lee", "Lisbon", &["Tennis"]))
        .await
        .unwrap();
    store.initialize().await.unwrap();

    assert_eq!(
        store.user_count().await.unwrap(),
        roster_store::seed::POPULATION + 1
    );
    assert!(store.get_user_by_id(&ana.id).await.unwrap().is_some());
}

#[tokio::test]
async fn search_composes_filters_over_seeded_and_created_users() {
    let store = Store::new(Arc::new(MemoryAdapter::new()));
    store.initialize().await.unwrap();

    store
        .create_user(NewUser {
            email: "maya.k@example.com".to_string(),
            persona: "coach".to_string(),
            first_name: "Maya".to_string(),
            last_name: "Khan".to_string(),
            location: "Newcastle".to_string(),
            sports: vec!["Tennis".to_string()],
            ..Default::default()
        })
        .await
        .unwrap();

    let coaches_in_new = store
        .search_users(&SearchFilters {
            persona: Some(Persona::Coach),
            location: Some("newcastle".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!coaches_in_new.is_empty());
    assert!(coaches_in_new
        .iter()
        .all(|u| u.persona == Persona::Coach
            && u.profile.common().location.to_lowercase().contains("newcastle")));

    // Omitting location widens the result to every coach.
    let all_coaches = store
        .search_users(&SearchFilters {
            persona: Some(Persona::Coach),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(all_coaches.len() >= coaches_in_new.len());
    assert_eq!(all_coaches.len(), roster_store::seed::COACHES + 1);
}
