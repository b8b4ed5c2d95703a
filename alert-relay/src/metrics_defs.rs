//! Metrics definitions for the client service.

use shared::metrics_defs::{MetricDef, MetricType};

pub const RUN_REQUESTS: MetricDef = MetricDef {
    name: "run.requests",
    metric_type: MetricType::Counter,
    description: "Requests to /run. Tagged with outcome.",
};

pub const ALERTS_TRIGGERED: MetricDef = MetricDef {
    name: "alerts.triggered",
    metric_type: MetricType::Counter,
    description: "Payloads that matched a sensitive data pattern. Tagged with type.",
};

pub const TASK_DURATION: MetricDef = MetricDef {
    name: "task.duration",
    metric_type: MetricType::Histogram,
    description: "Time from task submission to result or give-up, in seconds",
};

pub const SAVE_DURATION: MetricDef = MetricDef {
    name: "save.duration",
    metric_type: MetricType::Histogram,
    description: "Duration of the downstream save call in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[
    RUN_REQUESTS,
    ALERTS_TRIGGERED,
    TASK_DURATION,
    SAVE_DURATION,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_are_unique() {
        let names: HashSet<&str> = ALL_METRICS.iter().map(|def| def.name).collect();
        assert_eq!(names.len(), ALL_METRICS.len());
    }
}
