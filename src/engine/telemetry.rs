//! Resolution-path telemetry instruments and recording helpers.

use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::KeyValue;
use std::sync::OnceLock;

struct EngineInstruments {
    resolutions: Counter<u64>,
    resolution_duration_seconds: Histogram<f64>,
    batch_size: Histogram<u64>,
}

fn instruments() -> &'static EngineInstruments {
    static INSTRUMENTS: OnceLock<EngineInstruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("sqlmetrics.engine");
        EngineInstruments {
            resolutions: meter
                .u64_counter("sqlmetrics.metric.resolutions")
                .with_description("Metric resolutions by outcome")
                .init(),
            resolution_duration_seconds: meter
                .f64_histogram("sqlmetrics.metric.duration")
                .with_description("Metric resolution latency including parameter conversion")
                .with_unit("s")
                .init(),
            batch_size: meter
                .u64_histogram("sqlmetrics.batch.size")
                .with_description("Metrics requested per batch")
                .init(),
        }
    })
}

pub fn record_resolution(
    metric: &str,
    tabular: Option<bool>,
    error_class: Option<&'static str>,
    duration_seconds: f64,
) {
    let i = instruments();
    let mut attrs = vec![
        KeyValue::new("metric", metric.to_string()),
        KeyValue::new("outcome", if error_class.is_some() { "error" } else { "success" }),
    ];
    if let Some(tabular) = tabular {
        attrs.push(KeyValue::new("shape", if tabular { "tabular" } else { "scalar" }));
    }
    if let Some(error_class) = error_class {
        attrs.push(KeyValue::new("error.class", error_class));
    }

    i.resolutions.add(1, &attrs);
    i.resolution_duration_seconds.record(duration_seconds, &attrs);
}

pub fn record_batch(size: usize) {
    instruments().batch_size.record(size as u64, &[]);
}
