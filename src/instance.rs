//! Process-wide [`DataAccess`] instance.
//!
//! The instance is created lazily on first use with the configured target and options.
//! Asking for it with different credentials retires and closes the current instance and
//! replaces it.

use std::sync::{Arc, LazyLock};

use tokio::sync::Mutex;

use crate::config::{Credentials, SessionOptions, StoreTarget};
use crate::session::DataAccess;

struct Current {
    access: Arc<DataAccess>,
    credentials: Credentials,
}

#[derive(Default)]
struct InstanceSlot {
    target: StoreTarget,
    options: SessionOptions,
    current: Option<Current>,
}

impl InstanceSlot {
    /// Install a fresh instance for `credentials`, returning the one it replaces.
    ///
    /// Runs without awaiting, so the slot is never observed half-swapped.
    fn install(&mut self, credentials: Credentials) -> (Arc<DataAccess>, Option<Arc<DataAccess>>) {
        let access = Arc::new(DataAccess::new(
            self.target.clone(),
            credentials.clone(),
            self.options,
        ));
        let replaced = self.current.replace(Current {
            access: Arc::clone(&access),
            credentials,
        });
        (access, replaced.map(|old| old.access))
    }
}

static INSTANCE: LazyLock<Mutex<InstanceSlot>> =
    LazyLock::new(|| Mutex::new(InstanceSlot::default()));

/// Retire `old` and close its connection.
///
/// The close runs on its own task, so it completes even if the caller stops waiting.
async fn retire_and_close(old: Arc<DataAccess>) {
    old.retire();
    let closing = tokio::spawn(async move { old.close().await });
    if let Err(e) = closing.await {
        tracing::warn!(error = %e, "closing the replaced instance failed");
    }
}

impl DataAccess {
    /// The process-wide instance, created with default credentials on first call.
    ///
    /// If an instance already exists it is returned as is, whatever its credentials.
    pub async fn instance() -> Arc<DataAccess> {
        let mut slot = INSTANCE.lock().await;
        if let Some(current) = &slot.current {
            return Arc::clone(&current.access);
        }
        slot.install(Credentials::default()).0
    }

    /// The process-wide instance for `credentials`.
    ///
    /// When the current instance was built with other credentials it is retired and
    /// closed, and a new, disconnected instance replaces it. Holders of the old `Arc`
    /// get `NotConnectedError` from CRUD calls and `RetiredError` from `connect()`.
    pub async fn instance_with(credentials: Credentials) -> Arc<DataAccess> {
        let mut slot = INSTANCE.lock().await;
        if let Some(current) = &slot.current
            && current.credentials == credentials
        {
            return Arc::clone(&current.access);
        }
        tracing::info!(user = credentials.user(), "credentials changed, replacing instance");
        let (access, replaced) = slot.install(credentials);
        if let Some(old) = replaced {
            retire_and_close(old).await;
        }
        access
    }

    /// Set the target and options used for instances created from now on.
    ///
    /// An existing instance is retired, closed and dropped from the registry.
    pub async fn configure_instance(target: StoreTarget, options: SessionOptions) {
        let mut slot = INSTANCE.lock().await;
        slot.target = target;
        slot.options = options;
        if let Some(old) = slot.current.take() {
            retire_and_close(old.access).await;
        }
    }
}
