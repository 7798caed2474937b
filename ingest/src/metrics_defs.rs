use shared::metrics_defs::{MetricDef, MetricType};

pub const REPORTS_RECEIVED: MetricDef = MetricDef {
    name: "webhook.reports.received",
    metric_type: MetricType::Counter,
    description: "Webhook requests that reached the report pipeline",
};

pub const REPORTS_IGNORED: MetricDef = MetricDef {
    name: "webhook.reports.ignored",
    metric_type: MetricType::Counter,
    description: "Envelopes skipped because they are not end-of-call reports",
};

pub const REPORTS_REJECTED: MetricDef = MetricDef {
    name: "webhook.reports.rejected",
    metric_type: MetricType::Counter,
    description: "Bodies rejected as structurally invalid",
};

pub const REPORTS_DELIVERED: MetricDef = MetricDef {
    name: "webhook.reports.delivered",
    metric_type: MetricType::Counter,
    description: "Reports appended to the spreadsheet",
};

pub const REPORTS_RECOVERED: MetricDef = MetricDef {
    name: "webhook.reports.recovered",
    metric_type: MetricType::Counter,
    description: "Reports written to the overflow store after a failed append",
};

pub const REPORTS_LOST: MetricDef = MetricDef {
    name: "webhook.reports.lost",
    metric_type: MetricType::Counter,
    description: "Reports that failed both delivery and local recovery",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REPORTS_RECEIVED,
    REPORTS_IGNORED,
    REPORTS_REJECTED,
    REPORTS_DELIVERED,
    REPORTS_RECOVERED,
    REPORTS_LOST,
];
