//! Stderr appender with an env-driven filter. No OpenTelemetry export.

use std::str::FromStr;

use logforth::filter::EnvFilter;

pub fn init(filter: &str) {
    let filter = filter.to_owned();

    logforth::builder()
        .dispatch(move |dispatch| {
            let filter = EnvFilter::from_str(&filter).unwrap_or_else(|_| EnvFilter::from_str("info").expect("default filter should be valid"));

            dispatch.filter(filter).append(logforth::append::Stderr::default())
        })
        .apply();
}
