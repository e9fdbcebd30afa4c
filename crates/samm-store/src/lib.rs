//! Session storage for the SAMM SDK.
//!
//! Defines the `SessionStorage` trait that persistence backends implement,
//! and the `Session` context built on top of it.
//! Provides a `MemoryStorage` for testing and a JSON-file `FileStorage`.

use async_trait::async_trait;
use samm_types::Result;

pub mod file;
pub mod memory;
pub mod session;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use session::{AuthRedirect, Session};

/// Storage keys used by the session.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const IS_AUTHENTICATED: &str = "isAuthenticated";
    pub const CURRENT_SAMM: &str = "currentSamm";
    pub const USER_SAMMS: &str = "userSamms";
    pub const DISABLED_SAMMS: &str = "disabledSAMMs";

    pub const ALL: [&str; 5] = [ACCESS_TOKEN, IS_AUTHENTICATED, CURRENT_SAMM, USER_SAMMS, DISABLED_SAMMS];
}

/// String key/value store surviving between runs.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    // --- Lifecycle ---
    async fn init(&self) -> Result<()> { Ok(()) }
    async fn close(&self) -> Result<()> { Ok(()) }

    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}
