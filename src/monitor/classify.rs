//! Threshold classification of node and cluster metrics

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::HealthColor;

/// Heap usage above this percentage is dangerous
pub const HEAP_DANGER_PERCENT: i64 = 80;

/// GC deltas below this are healthy
pub const GC_WARNING_MS: i64 = 20;

/// GC deltas above this are dangerous
pub const GC_DANGER_MS: i64 = 500;

/// Classification token attached to a rendered metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Success,
    Warning,
    Danger,
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
            Severity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Danger strictly above 80%
pub fn classify_heap(heap_used_percent: i64) -> Severity {
    if heap_used_percent > HEAP_DANGER_PERCENT {
        Severity::Danger
    } else {
        Severity::Normal
    }
}

/// Success below 20ms, warning up to and including 500ms, danger beyond
pub fn classify_gc(gc_delta_ms: i64) -> Severity {
    if gc_delta_ms < GC_WARNING_MS {
        Severity::Success
    } else if gc_delta_ms <= GC_DANGER_MS {
        Severity::Warning
    } else {
        Severity::Danger
    }
}

/// Map the upstream health status string to a severity
pub fn classify_health(status: &str) -> Severity {
    health_severity(HealthColor::parse(status))
}

pub fn health_severity(color: HealthColor) -> Severity {
    match color {
        HealthColor::Green => Severity::Success,
        HealthColor::Yellow => Severity::Warning,
        HealthColor::Red => Severity::Danger,
        HealthColor::Unknown => Severity::Unknown,
    }
}
