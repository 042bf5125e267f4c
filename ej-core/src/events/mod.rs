//! Upgrade events.
//!
//! The engine emits an [`UpgradeTriggered`] event whenever a blocked
//! decision should nudge a tenant toward the next tier. Delivery (modal,
//! email, webhook) is entirely the consumer's responsibility: implement
//! [`UpgradeSink`] and hand it to the gate. Sinks must be fast and must not
//! fail — they are called inline on the authorization path.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Emitted on every blocked decision that carries an upgrade path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeTriggered {
    pub tenant_id: String,
    pub vertical_id: String,
    pub tier_key: String,
    pub feature_key: String,
    /// Fully substituted, user-facing message.
    pub message: String,
    /// Advisory conversion probability from the matching rule or the
    /// per-trigger-kind default.
    pub expected_conversion: f64,
}

/// Receiver for upgrade events.
pub trait UpgradeSink: Send + Sync {
    fn upgrade_triggered(&self, event: UpgradeTriggered);
}

/// Discards every event. The default when no consumer is wired up.
#[derive(Debug, Default)]
pub struct NullSink;

impl UpgradeSink for NullSink {
    fn upgrade_triggered(&self, _event: UpgradeTriggered) {}
}

/// Logs every event with structured fields, so conversion analytics can be
/// scraped from the log stream before a real delivery pipeline exists.
#[derive(Debug, Default)]
pub struct TracingSink;

impl UpgradeSink for TracingSink {
    fn upgrade_triggered(&self, event: UpgradeTriggered) {
        tracing::info!(
            tenant_id = event.tenant_id.as_str(),
            vertical_id = event.vertical_id.as_str(),
            tier_key = event.tier_key.as_str(),
            feature_key = event.feature_key.as_str(),
            expected_conversion = event.expected_conversion,
            "upgrade triggered"
        );
    }
}

/// Collects events in memory. Test double.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<UpgradeTriggered>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UpgradeTriggered> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

impl UpgradeSink for CollectingSink {
    fn upgrade_triggered(&self, event: UpgradeTriggered) {
        self.events.lock().unwrap().push(event);
    }
}
