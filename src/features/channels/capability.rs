//! # Platform Capabilities
//!
//! What the hosting platform offers for push delivery. The scheduler branches on
//! [`PlatformSupport`] once instead of probing features throughout the code.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use async_trait::async_trait;

/// Push and background-execution support offered by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformSupport {
    /// Push delivery plus a periodic background task registration
    FullySupported,
    /// Push delivery, but wake-ups must be chained one at a time
    PushOnlyNoPeriodicSync,
    /// No push at all; only email can run
    Unsupported,
}

impl PlatformSupport {
    pub fn push_supported(&self) -> bool {
        !matches!(self, PlatformSupport::Unsupported)
    }

    pub fn periodic_sync(&self) -> bool {
        matches!(self, PlatformSupport::FullySupported)
    }
}

impl std::fmt::Display for PlatformSupport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformSupport::FullySupported => write!(f, "push + periodic sync"),
            PlatformSupport::PushOnlyNoPeriodicSync => write!(f, "push only"),
            PlatformSupport::Unsupported => write!(f, "unsupported"),
        }
    }
}

#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    fn support(&self) -> PlatformSupport;

    /// Whether the user granted notification permission
    async fn push_permission_granted(&self, user_id: &str) -> bool;

    /// Push can actually be delivered to this user
    async fn push_available(&self, user_id: &str) -> bool {
        self.support().push_supported() && self.push_permission_granted(user_id).await
    }
}

/// Fixed capabilities read from configuration
#[derive(Debug, Clone, Copy)]
pub struct StaticCapabilities {
    support: PlatformSupport,
    permission_granted: bool,
}

impl StaticCapabilities {
    pub fn new(support: PlatformSupport, permission_granted: bool) -> Self {
        Self {
            support,
            permission_granted,
        }
    }
}

#[async_trait]
impl CapabilityProvider for StaticCapabilities {
    fn support(&self) -> PlatformSupport {
        self.support
    }

    async fn push_permission_granted(&self, _user_id: &str) -> bool {
        self.permission_granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_support_flags() {
        assert!(PlatformSupport::FullySupported.push_supported());
        assert!(PlatformSupport::FullySupported.periodic_sync());
        assert!(PlatformSupport::PushOnlyNoPeriodicSync.push_supported());
        assert!(!PlatformSupport::PushOnlyNoPeriodicSync.periodic_sync());
        assert!(!PlatformSupport::Unsupported.push_supported());
        assert!(!PlatformSupport::Unsupported.periodic_sync());
    }

    #[tokio::test]
    async fn test_push_unavailable_without_support_even_if_granted() {
        let caps = StaticCapabilities::new(PlatformSupport::Unsupported, true);
        assert!(caps.push_permission_granted("u1").await);
        assert!(!caps.push_available("u1").await);

        let caps = StaticCapabilities::new(PlatformSupport::PushOnlyNoPeriodicSync, false);
        assert!(!caps.push_available("u1").await);

        let caps = StaticCapabilities::new(PlatformSupport::PushOnlyNoPeriodicSync, true);
        assert!(caps.push_available("u1").await);
    }
}
