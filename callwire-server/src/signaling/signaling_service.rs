use crate::config::RelayConfig;
use crate::room::Registry;
use crate::signaling::{AllowAll, RoomAccess};
use std::sync::Arc;

struct SignalingInner {
    registry: Registry,
    config: RelayConfig,
    room_access: Arc<dyn RoomAccess>,
}

/// Shared state behind the signaling routes.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(config: RelayConfig) -> Self {
        Self::with_registry(Registry::new(), config)
    }

    pub fn with_registry(registry: Registry, config: RelayConfig) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                registry,
                config,
                room_access: Arc::new(AllowAll),
            }),
        }
    }

    /// Replaces the default allow-all room policy. Call before handing the
    /// service to a router.
    pub fn with_room_access(self, room_access: Arc<dyn RoomAccess>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                registry: self.inner.registry.clone(),
                config: self.inner.config.clone(),
                room_access,
            }),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }

    pub fn room_access(&self) -> &dyn RoomAccess {
        self.inner.room_access.as_ref()
    }
}

impl std::fmt::Debug for SignalingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalingService")
            .field("rooms", &self.inner.registry.room_count())
            .field("config", &self.inner.config)
            .finish()
    }
}
