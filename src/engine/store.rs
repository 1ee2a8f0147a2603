//! The store core: four in-memory collections plus the current-user
//! reference, written through to a [`PersistenceAdapter`] after every
//! mutation.
//!
//! Write-through is best-effort: a failed durable write is logged and the
//! in-memory mutation stands, trading strict durability for responsiveness.
//! Only the initial load treats the adapter as authoritative, and even there
//! an unreadable users slot falls back to seeding rather than failing.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::engine::{FileAdapter, PersistenceAdapter};
use crate::model::{self, Connection, ConnectionList, Preferences, Stats, User, UserStatus};
use crate::query::SearchFilters;
use crate::{
    factory, seed, EngagementStore, Error, NewUser, Persona, Result, RosterStore, Session,
    UserAccounts, UserDirectory, UserPatch,
};

const USERS: &str = "users";
const PREFERENCES: &str = "preferences";
const STATS: &str = "stats";
const CONNECTIONS: &str = "connections";
const CURRENT_USER: &str = "current_user";

const ALL_SLOTS: [&str; 5] = [USERS, PREFERENCES, STATS, CONNECTIONS, CURRENT_USER];

#[derive(Default)]
struct State {
    users: HashMap<String, User>,
    preferences: HashMap<String, Preferences>,
    stats: HashMap<String, Stats>,
    connections: HashMap<String, ConnectionList>,
    current_user: Option<String>,
}

/// The single-writer profile store. Construct one instance at the
/// application's composition root and share it by reference; nothing outside
/// this type mutates the collections.
pub struct Store {
    state: RwLock<State>,
    adapter: Arc<dyn PersistenceAdapter>,
    initialized: AtomicBool,
    init_lock: tokio::sync::Mutex<()>,
}

impl Store {
    pub fn new(adapter: Arc<dyn PersistenceAdapter>) -> Self {
        Self {
            state: RwLock::new(State::default()),
            adapter,
            initialized: AtomicBool::new(false),
            init_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Convenience constructor over a [`FileAdapter`] rooted at `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Ok(Self::new(Arc::new(FileAdapter::new(dir)?)))
    }

    /// Double-checked init guard: the atomic fast path skips the mutex once
    /// initialization has completed; concurrent first callers serialize on
    /// the mutex so exactly one load-or-seed sequence runs.
    async fn ensure_init(&self) {
        if self.initialized.load(Ordering::Acquire) {
            return;
        }
        let _guard = self.init_lock.lock().await;
        if self.initialized.load(Ordering::Acquire) {
            return;
        }
        self.load_or_seed().await;
        self.initialized.store(true, Ordering::Release);
    }

    async fn load_or_seed(&self) {
        let loaded_users: Option<HashMap<String, User>> = match self.adapter.load(USERS).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(users) => Some(users),
                Err(e) => {
                    log::warn!("users slot is unreadable, reseeding: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log::warn!("could not load users slot, reseeding: {e}");
                None
            }
        };

        match loaded_users {
            Some(users) => {
                // A corrupt secondary slot degrades that one collection to
                // empty instead of making the whole store unavailable.
                let preferences: HashMap<String, Preferences> = self.load_slot(PREFERENCES).await;
                let stats: HashMap<String, Stats> = self.load_slot(STATS).await;
                let connections: HashMap<String, ConnectionList> =
                    self.load_slot(CONNECTIONS).await;
                let current: Option<String> = self.load_slot(CURRENT_USER).await;

                let mut state = self.state.write().expect("store lock poisoned");
                state.users = users;
                state.preferences = preferences;
                state.stats = stats;
                state.connections = connections;
                state.current_user = match current {
                    Some(id) if state.users.contains_key(&id) => Some(id),
                    Some(id) => {
                        log::warn!("persisted current user {id} no longer exists, dropping");
                        None
                    }
                    None => None,
                };
            }
            None => {
                match seed::populate(self) {
                    Ok(count) => log::info!("seeded {count} starting users"),
                    Err(e) => log::error!("seed generation failed: {e}"),
                }
                self.persist_all().await;
            }
        }
    }

    async fn load_slot<T: DeserializeOwned + Default>(&self, slot: &str) -> T {
        match self.adapter.load(slot).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("{slot} slot is corrupt, starting empty: {e}");
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(e) => {
                log::warn!("could not load {slot} slot, starting empty: {e}");
                T::default()
            }
        }
    }

    /// Serializes one collection in full and writes it back through the
    /// adapter. A failed write is logged; the in-memory mutation has already
    /// succeeded and is not rolled back.
    async fn persist(&self, slot: &'static str) {
        let bytes = {
            let state = self.state.read().expect("store lock poisoned");
            let serialized = match slot {
                USERS => serde_json::to_vec(&state.users),
                PREFERENCES => serde_json::to_vec(&state.preferences),
                STATS => serde_json::to_vec(&state.stats),
                CONNECTIONS => serde_json::to_vec(&state.connections),
                CURRENT_USER => serde_json::to_vec(&state.current_user),
                _ => return,
            };
            match serialized {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::error!("failed to serialize {slot} collection: {e}");
                    return;
                }
            }
        };

        if let Err(e) = self.adapter.store(slot, bytes).await {
            log::error!("write-through for {slot} failed, in-memory state stands: {e}");
        }
    }

    async fn persist_all(&self) {
        for slot in ALL_SLOTS {
            self.persist(slot).await;
        }
    }

    /// The shared creation routine behind both `create_user` and the seed
    /// generator: builds all four records from one input and inserts them
    /// together. Email and phone uniqueness is by convention only and
    /// intentionally not enforced by an index.
    pub(crate) fn insert_new_user(&self, input: NewUser) -> Result<User> {
        let persona = Persona::parse(&input.persona)?;
        let id = factory::generate_id();
        let now = Utc::now();

        let user = User {
            id: id.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            persona,
            status: UserStatus::Pending,
            profile: factory::build_profile(persona, &input),
            settings: Default::default(),
            privacy: Default::default(),
            is_verified: false,
            created_at: now,
            updated_at: now,
            last_active: now,
        };
        let preferences = factory::default_preferences(&id, persona, now);
        let stats = factory::default_stats(&id, persona, now);
        let connections = ConnectionList::new(&id);

        let mut state = self.state.write().expect("store lock poisoned");
        state.users.insert(id.clone(), user.clone());
        state.preferences.insert(id.clone(), preferences);
        state.stats.insert(id.clone(), stats);
        state.connections.insert(id, connections);
        Ok(user)
    }

    fn touch(user: &mut User, now: DateTime<Utc>) {
        // Advances but never regresses, even if the clock steps backwards.
        user.updated_at = now.max(user.updated_at);
    }
}

#[async_trait]
impl UserAccounts for Store {
    async fn create_user(&self, input: NewUser) -> Result<User> {
        self.ensure_init().await;
        let user = self.insert_new_user(input)?;
        // The four inserts are not atomic as a unit against storage; a crash
        // between writes can leave a partial user. Accepted at this scale.
        self.persist(USERS).await;
        self.persist(PREFERENCES).await;
        self.persist(STATS).await;
        self.persist(CONNECTIONS).await;
        Ok(user)
    }

    async fn update_user(&self, id: &str, patch: UserPatch) -> Result<User> {
        self.ensure_init().await;
        let updated = {
            let mut state = self.state.write().expect("store lock poisoned");
            let user = state
                .users
                .get_mut(id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            patch.apply(user)?;
            Self::touch(user, Utc::now());
            user.clone()
        };
        self.persist(USERS).await;
        Ok(updated)
    }

    async fn update_user_profile(&self, id: &str, patch: serde_json::Value) -> Result<User> {
        self.ensure_init().await;
        let updated = {
            let mut state = self.state.write().expect("store lock poisoned");
            let user = state
                .users
                .get_mut(id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            user.profile = model::merge_profile(&user.profile, &patch)?;
            Self::touch(user, Utc::now());
            user.clone()
        };
        self.persist(USERS).await;
        Ok(updated)
    }
}

#[async_trait]
impl UserDirectory for Store {
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        self.ensure_init().await;
        let state = self.state.read().expect("store lock poisoned");
        Ok(state.users.get(id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.ensure_init().await;
        let state = self.state.read().expect("store lock poisoned");
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn search_users(&self, filters: &SearchFilters) -> Result<Vec<User>> {
        self.ensure_init().await;
        let state = self.state.read().expect("store lock poisoned");
        Ok(state
            .users
            .values()
            .filter(|u| filters.matches(u))
            .cloned()
            .collect())
    }

    async fn get_users_by_persona(&self, persona: Persona) -> Result<Vec<User>> {
        self.ensure_init().await;
        let state = self.state.read().expect("store lock poisoned");
        Ok(state
            .users
            .values()
            .filter(|u| u.persona == persona)
            .cloned()
            .collect())
    }

    async fn all_users(&self) -> Result<Vec<User>> {
        self.ensure_init().await;
        let state = self.state.read().expect("store lock poisoned");
        Ok(state.users.values().cloned().collect())
    }

    async fn user_count(&self) -> Result<usize> {
        self.ensure_init().await;
        let state = self.state.read().expect("store lock poisoned");
        Ok(state.users.len())
    }
}

#[async_trait]
impl EngagementStore for Store {
    async fn get_preferences(&self, id: &str) -> Result<Option<Preferences>> {
        self.ensure_init().await;
        let state = self.state.read().expect("store lock poisoned");
        Ok(state.preferences.get(id).cloned())
    }

    async fn update_user_preferences(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Preferences> {
        self.ensure_init().await;
        let updated = {
            let mut state = self.state.write().expect("store lock poisoned");
            let persona = state
                .users
                .get(id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?
                .persona;
            let now = Utc::now();
            // Always present per the creation invariant; rebuilt from the
            // persona defaults if the record is somehow missing.
            let current = state
                .preferences
                .get(id)
                .cloned()
                .unwrap_or_else(|| factory::default_preferences(id, persona, now));
            let mut merged: Preferences = model::merge_record(&current, &patch, &["user_id"])?;
            if merged.persona_prefs.persona() != persona {
                return Err(Error::InvalidPersona(
                    merged.persona_prefs.persona().to_string(),
                ));
            }
            merged.updated_at = now;
            state.preferences.insert(id.to_string(), merged.clone());
            merged
        };
        self.persist(PREFERENCES).await;
        Ok(updated)
    }

    async fn get_stats(&self, id: &str) -> Result<Option<Stats>> {
        self.ensure_init().await;
        let state = self.state.read().expect("store lock poisoned");
        Ok(state.stats.get(id).cloned())
    }

    async fn update_user_stats(&self, id: &str, patch: serde_json::Value) -> Result<Stats> {
        self.ensure_init().await;
        let updated = {
            let mut state = self.state.write().expect("store lock poisoned");
            let persona = state
                .users
                .get(id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?
                .persona;
            let now = Utc::now();
            let current = state
                .stats
                .get(id)
                .cloned()
                .unwrap_or_else(|| factory::default_stats(id, persona, now));
            let mut merged: Stats = model::merge_record(&current, &patch, &["user_id"])?;
            if merged.persona_stats.persona() != persona {
                return Err(Error::InvalidPersona(
                    merged.persona_stats.persona().to_string(),
                ));
            }
            merged.updated_at = now;
            state.stats.insert(id.to_string(), merged.clone());
            merged
        };
        self.persist(STATS).await;
        Ok(updated)
    }

    async fn record_login(&self, id: &str) -> Result<Stats> {
        self.ensure_init().await;
        let updated = {
            let mut state = self.state.write().expect("store lock poisoned");
            let persona = state
                .users
                .get(id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?
                .persona;
            let now = Utc::now();
            let stats = state
                .stats
                .entry(id.to_string())
                .or_insert_with(|| factory::default_stats(id, persona, now));
            let today = now.date_naive();
            stats.general.login_streak = match stats.general.last_login {
                Some(prev) if prev.date_naive() == today => stats.general.login_streak.max(1),
                Some(prev) if (today - prev.date_naive()).num_days() == 1 => {
                    stats.general.login_streak + 1
                }
                _ => 1,
            };
            stats.general.last_login = Some(now);
            stats.general.total_logins += 1;
            stats.updated_at = now;
            stats.clone()
        };
        self.persist(STATS).await;
        Ok(updated)
    }

    async fn get_connections(&self, id: &str) -> Result<Vec<Connection>> {
        self.ensure_init().await;
        let state = self.state.read().expect("store lock poisoned");
        Ok(state
            .connections
            .get(id)
            .map(|list| list.edges.clone())
            .unwrap_or_default())
    }

    async fn add_connection(&self, user_id: &str, target_id: &str, kind: &str) -> Result<()> {
        self.ensure_init().await;
        let appended = {
            let mut state = self.state.write().expect("store lock poisoned");
            if !state.users.contains_key(user_id) {
                return Err(Error::NotFound(user_id.to_string()));
            }
            let now = Utc::now();
            let list = state
                .connections
                .entry(user_id.to_string())
                .or_insert_with(|| ConnectionList::new(user_id));
            let appended = match list.edges.iter_mut().find(|e| e.user_id == target_id) {
                Some(edge) => {
                    // Last write wins on the edge kind; no duplicate is added.
                    edge.kind = kind.to_string();
                    edge.updated_at = now;
                    false
                }
                None => {
                    list.edges.push(Connection {
                        user_id: target_id.to_string(),
                        kind: kind.to_string(),
                        status: Default::default(),
                        connected_at: now,
                        updated_at: now,
                    });
                    true
                }
            };
            if appended {
                if let Some(stats) = state.stats.get_mut(user_id) {
                    stats.general.connection_count += 1;
                    stats.updated_at = now;
                }
            }
            appended
        };
        self.persist(CONNECTIONS).await;
        if appended {
            self.persist(STATS).await;
        }
        Ok(())
    }
}

#[async_trait]
impl Session for Store {
    async fn set_current_user(&self, id: &str) -> Result<User> {
        self.ensure_init().await;
        let user = {
            let mut state = self.state.write().expect("store lock poisoned");
            let now = Utc::now();
            let user = state
                .users
                .get_mut(id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            user.last_active = now;
            Self::touch(user, now);
            let user = user.clone();
            state.current_user = Some(id.to_string());
            user
        };
        self.persist(USERS).await;
        self.persist(CURRENT_USER).await;
        Ok(user)
    }

    async fn current_user(&self) -> Result<Option<User>> {
        self.ensure_init().await;
        let state = self.state.read().expect("store lock poisoned");
        Ok(state
            .current_user
            .as_ref()
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn logout(&self) -> Result<()> {
        self.ensure_init().await;
        {
            let mut state = self.state.write().expect("store lock poisoned");
            state.current_user = None;
        }
        self.persist(CURRENT_USER).await;
        Ok(())
    }
}

#[async_trait]
impl RosterStore for Store {
    async fn initialize(&self) -> Result<()> {
        self.ensure_init().await;
        Ok(())
    }

    async fn clear_all_data(&self) -> Result<()> {
        self.ensure_init().await;
        {
            let mut state = self.state.write().expect("store lock poisoned");
            *state = State::default();
        }
        if let Err(e) = self.adapter.remove(&ALL_SLOTS).await {
            log::warn!("bulk delete incomplete, will retry on next clear: {e}");
        }
        self.initialized.store(false, Ordering::Release);
        Ok(())
    }
}
