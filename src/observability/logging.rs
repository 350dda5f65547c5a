//! Structured logging.
//!
//! # Responsibilities
//! - Initialise the global tracing subscriber
//! - Format the per-request summary line
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - The request line is word-wrapped to a configurable width so long
//!   parameter lists stay readable in a terminal

use std::time::Duration;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.log_level)));

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();

    if result.is_err() {
        tracing::debug!("Logging already initialised");
    }
}

/// `GET /posts/show/7 12.50 ms (DB=2.00 [16%]) PARAMS={id=>7}`, wrapped at `width`.
pub fn request_line(
    method: &str,
    uri: &str,
    total: Duration,
    db: Duration,
    params: &str,
    width: usize,
) -> String {
    let total_ms = total.as_secs_f64() * 1000.0;
    let db_ms = db.as_secs_f64() * 1000.0;
    let percent = if total_ms > 0.0 {
        (db_ms / total_ms * 100.0).round() as u64
    } else {
        0
    };
    let line = format!(
        "{} {} {:.2} ms (DB={:.2} [{}%]) PARAMS={}",
        method, uri, total_ms, db_ms, percent, params
    );
    // First fit keeps the leading fields together on the first line.
    let options = textwrap::Options::new(width).wrap_algorithm(textwrap::WrapAlgorithm::FirstFit);
    textwrap::fill(&line, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_line() {
        let line = request_line(
            "GET",
            "/unit_test/test_action/7",
            Duration::from_millis(20),
            Duration::from_millis(5),
            "{id=>7}",
            200,
        );
        assert_eq!(
            line,
            "GET /unit_test/test_action/7 20.00 ms (DB=5.00 [25%]) PARAMS={id=>7}"
        );
    }

    #[test]
    fn test_request_line_wraps() {
        let line = request_line(
            "POST",
            "/posts/create",
            Duration::from_millis(3),
            Duration::ZERO,
            "{title=>a rather long title, body=>some text}",
            30,
        );
        assert!(line.lines().count() > 1);
        assert!(line.lines().all(|l| l.len() <= 30));
        assert_eq!(line.lines().next(), Some("POST /posts/create 3.00 ms"));
        assert_eq!(
            line.replace('\n', " "),
            "POST /posts/create 3.00 ms (DB=0.00 [0%]) \
             PARAMS={title=>a rather long title, body=>some text}"
        );
    }

    #[test]
    fn test_zero_duration() {
        let line = request_line("GET", "/", Duration::ZERO, Duration::ZERO, "{}", 80);
        assert_eq!(line, "GET / 0.00 ms (DB=0.00 [0%]) PARAMS={}");
    }
}
