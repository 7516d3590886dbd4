// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const QUIET_MODULES: &str =
    "h2=info,hyper=info,hyper_util=info,reqwest=info,alloy_transport_http=info,sqlx=warn";

/// Bare levels ("debug") get quiet transport overrides appended; directive
/// strings containing ',' or '=' are used verbatim.
pub fn filter_spec(log_level: &str) -> String {
    let normalized = log_level.trim();
    if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!("{normalized},{QUIET_MODULES}")
    }
}

pub fn setup_logging(log_level: &str, json_format: bool) {
    let filter_spec = filter_spec(log_level);
    let filter = EnvFilter::from_str(&filter_spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);
        subscriber.with(json_layer).try_init()
    } else {
        let fmt_layer = fmt::layer().with_target(true).compact();
        subscriber.with(fmt_layer).try_init()
    };

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed; keeping it");
        return;
    }

    tracing::info!(
        filter = %filter_spec,
        format = if json_format { "json" } else { "compact" },
        "Logging initialized"
    );
}
