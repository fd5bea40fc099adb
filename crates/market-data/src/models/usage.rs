use serde::{Deserialize, Serialize};

/// Request usage against the provider plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    /// Requests issued so far
    pub used: u64,

    /// Requests allowed by the plan
    pub limit: u64,

    /// `used / limit` as a percentage (0.0 when the limit is zero)
    pub utilization: f64,

    /// Plan name (e.g., "Free")
    pub plan_name: String,
}

impl UsageSnapshot {
    pub fn new(used: u64, limit: u64, plan_name: impl Into<String>) -> Self {
        let utilization = if limit == 0 {
            0.0
        } else {
            used as f64 / limit as f64 * 100.0
        };

        Self {
            used,
            limit,
            utilization,
            plan_name: plan_name.into(),
        }
    }

    /// Requests left before the plan limit is reached.
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }
}
