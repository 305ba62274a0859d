//! Device registration for push delivery.
//!
//! Notification delivery itself lives outside this crate. The registrar
//! trait is the seam: callers record a delivery token against an identity
//! and move on. Failures are logged and never propagated, so a broken
//! push backend cannot fail a registration.

use tracing::{info, warn};

use crate::error::Result;

/// Associates delivery tokens with volunteer or admin identities.
pub trait NotificationRegistrar: Send + Sync {
    /// Register a delivery token for the given identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing service rejects the registration.
    fn register_device(&self, identity: &str, token: &str) -> Result<()>;
}

/// Registrar that only logs registrations. Default when no push backend
/// is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRegistrar;

impl NotificationRegistrar for LogRegistrar {
    fn register_device(&self, identity: &str, token: &str) -> Result<()> {
        info!(
            "Registered device token ({} chars) for {}",
            token.len(),
            identity
        );
        Ok(())
    }
}

/// Register a device, logging failure instead of returning it.
///
/// The side-effect contract for registration flows: callers never block
/// on or propagate registrar errors.
pub fn register_best_effort(registrar: &dyn NotificationRegistrar, identity: &str, token: &str) {
    if let Err(err) = registrar.register_device(identity, token) {
        warn!("Device registration failed for {}: {}", identity, err);
    }
}
