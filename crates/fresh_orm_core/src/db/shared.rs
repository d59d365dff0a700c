//! Process-wide shared database handle.
//!
//! # Responsibility
//! - Lazily open one `Database` on first use and hand out clones of it.
//! - Allow explicit reconfiguration and reset, mainly for test isolation.
//!
//! # Invariants
//! - At most one shared handle is live per process.
//! - Reset only drops the registry's reference; callers still holding an
//!   `Arc<Database>` keep a working connection until they drop it.

use super::{open_db, DbError, DbResult, Database};
use crate::config::DbConfig;
use log::info;
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct SharedState {
    config: Option<DbConfig>,
    handle: Option<Arc<Database>>,
}

static SHARED: Lazy<Mutex<SharedState>> = Lazy::new(|| Mutex::new(SharedState::default()));

/// Returns the shared handle, opening it on first use.
///
/// Without a prior `configure_shared` call the config comes from
/// `DbConfig::from_env()`.
pub fn shared_database() -> DbResult<Arc<Database>> {
    let mut state = lock_state()?;
    if let Some(handle) = &state.handle {
        return Ok(Arc::clone(handle));
    }

    let config = match &state.config {
        Some(config) => config.clone(),
        None => DbConfig::from_env()?,
    };
    let handle = Arc::new(open_db(&config)?);
    state.config = Some(config);
    state.handle = Some(Arc::clone(&handle));
    Ok(handle)
}

/// Replaces the shared config and drops the current handle.
pub fn configure_shared(config: DbConfig) -> DbResult<()> {
    let mut state = lock_state()?;
    info!(
        "event=db_shared_configure module=db status=ok mode={}",
        config.location.mode()
    );
    state.config = Some(config);
    state.handle = None;
    Ok(())
}

/// Drops the shared handle so the next `shared_database` call reopens it.
pub fn reset_shared_database() -> DbResult<()> {
    let mut state = lock_state()?;
    let was_open = state.handle.take().is_some();
    info!("event=db_shared_reset module=db status=ok was_open={was_open}");
    Ok(())
}

fn lock_state() -> DbResult<MutexGuard<'static, SharedState>> {
    SHARED.lock().map_err(|_| DbError::LockPoisoned)
}
