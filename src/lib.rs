//! Roster Store is a lightweight, single-writer profile data store.
//!
//! It holds four mutually consistent collections (users, preferences, stats,
//! connections) plus a single current-user reference, all keyed by user id,
//! and writes each collection through to an opaque [`PersistenceAdapter`]
//! after every mutation. On first run against empty storage, the store seeds
//! itself with a plausible starting population so consumers always see a
//! non-empty, explorable data set.
//!
//! ## Core Components
//! - [`engine`]: The storage backend (in-memory collections with write-through persistence).
//! - [`model`]: The entity schema — `User`, persona-shaped `Profile` variants,
//!   `Preferences`, `Stats`, `ConnectionList`.
//! - [`factory`]: Persona-aware default builders used at user creation.
//! - [`query`]: Predicate-based search over the user collection.
//! - [`seed`]: First-run population bootstrapping.

pub mod engine;
pub mod factory;
pub mod model;
pub mod query;
pub mod seed;

use async_trait::async_trait;
use thiserror::Error;

pub use engine::{FileAdapter, MemoryAdapter, PersistenceAdapter, Store};
pub use factory::NewUser;
pub use model::{
    Connection, ConnectionList, Persona, Preferences, Profile, Stats, User, UserPatch, UserStatus,
};
pub use query::SearchFilters;

/// Errors returned by the Roster Store.
#[derive(Error, Debug)]
pub enum Error {
    /// The referenced user id does not exist in the store.
    #[error("user not found: {0}")]
    NotFound(String),
    /// An unrecognized persona tag was supplied at creation, or a patch tried
    /// to swap a record to a different persona's shape.
    #[error("unknown persona: {0}")]
    InvalidPersona(String),
    /// The persistence adapter's read or write failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    /// Error during JSON serialization or deserialization.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::StorageUnavailable(e.to_string())
    }
}

/// A specialized Result type for Roster Store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Account lifecycle: creation and mutation of [`User`] records.
#[async_trait]
pub trait UserAccounts: Send + Sync {
    /// Creates a user together with its paired preferences, stats, and
    /// connections records. This is the only place all four are created;
    /// callers must never create one without the others.
    async fn create_user(&self, input: NewUser) -> Result<User>;
    /// Shallow-merges `patch` onto the stored user: every supplied field
    /// replaces the stored field wholesale, including `profile`.
    async fn update_user(&self, id: &str, patch: UserPatch) -> Result<User>;
    /// Merges `patch` one level into the stored profile, preserving fields
    /// not named in the patch. The persona tag is pinned and cannot change.
    async fn update_user_profile(&self, id: &str, patch: serde_json::Value) -> Result<User>;
}

/// Lookups and search over the user collection.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>>;
    /// Linear scan; email uniqueness is by convention only, the first match wins.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Conjunction of the supplied filters over the full user collection.
    async fn search_users(&self, filters: &SearchFilters) -> Result<Vec<User>>;
    async fn get_users_by_persona(&self, persona: Persona) -> Result<Vec<User>>;
    /// Snapshot of every user in the store.
    async fn all_users(&self) -> Result<Vec<User>>;
    async fn user_count(&self) -> Result<usize>;
}

/// Preferences, stats, and connection edges for a user.
#[async_trait]
pub trait EngagementStore: Send + Sync {
    async fn get_preferences(&self, id: &str) -> Result<Option<Preferences>>;
    /// Shallow-merges `patch` onto the stored preferences record, creating a
    /// persona-appropriate default record first if none exists.
    async fn update_user_preferences(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Preferences>;
    async fn get_stats(&self, id: &str) -> Result<Option<Stats>>;
    /// Shallow-merges `patch` onto the stored stats record, creating a
    /// persona-appropriate default record first if none exists.
    async fn update_user_stats(&self, id: &str, patch: serde_json::Value) -> Result<Stats>;
    /// Bumps total logins and the daily login streak.
    async fn record_login(&self, id: &str) -> Result<Stats>;
    async fn get_connections(&self, id: &str) -> Result<Vec<Connection>>;
    /// Adds a directed edge from `user_id` to `target_id`. Re-adding an
    /// existing target updates its kind in place (last-write-wins) rather
    /// than appending a duplicate. The reverse edge is not created.
    async fn add_connection(&self, user_id: &str, target_id: &str, kind: &str) -> Result<()>;
}

/// The single "logged in" user reference.
#[async_trait]
pub trait Session: Send + Sync {
    /// Marks `id` as the current user and touches its `last_active` timestamp.
    /// Fails with [`Error::NotFound`] if the id is absent.
    async fn set_current_user(&self, id: &str) -> Result<User>;
    async fn current_user(&self) -> Result<Option<User>>;
    async fn logout(&self) -> Result<()>;
}

/// The primary interface for interacting with the Roster Store.
///
/// It combines all functional traits for the complete facade consumed by the
/// application's state layer.
#[async_trait]
pub trait RosterStore: UserAccounts + UserDirectory + EngagementStore + Session {
    /// Loads the collections from storage, seeding a starting population when
    /// the users slot is absent or unreadable. Idempotent and safe to call
    /// concurrently; exactly one load-or-seed sequence runs and every caller
    /// resolves only after it completes.
    async fn initialize(&self) -> Result<()>;
    /// Wipes all in-memory collections, the current-user reference, and the
    /// persisted slots. The next `initialize` call reseeds.
    async fn clear_all_data(&self) -> Result<()>;
}
