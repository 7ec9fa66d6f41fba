//! Structured logging.
//!
//! # Responsibilities
//! - Choose the log output format for the environment
//! - Build the level filter and formatting layer for the subscriber
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production and Lambda, pretty format for development
//! - Log level configurable via config; `RUST_LOG` wins when set
//! - JSON lines always carry `service` and `environment`, and lift the
//!   request context (`aws_request_id`, `group_id`) out of the span list to
//!   the top level; the full span list is kept as well
//!
//! # JSON line shape
//! ```text
//! {"timestamp": "...", "level": "INFO", "service": "todo-api",
//!  "environment": "production", "aws_request_id": "...", "group_id": "...",
//!  "fields": {"message": "..."}, "span": {...}, "spans": [{...}, ...]}
//! ```

use std::fmt::{self as stdfmt, Write as _};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{JsonFields, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::{LogFormat, ServiceConfig};
use crate::host::HostMode;
use crate::http::middleware::context::{GROUP_FIELD, INVOCATION_FIELD};

/// Span fields copied to the top level of each JSON line.
const LIFTED_FIELDS: [&str; 2] = [INVOCATION_FIELD, GROUP_FIELD];

/// Resolve `Auto` into a concrete format.
pub fn resolve_format(format: LogFormat, environment: &str, mode: HostMode) -> LogFormat {
    match format {
        LogFormat::Auto if mode == HostMode::Lambda => LogFormat::Json,
        LogFormat::Auto if environment.eq_ignore_ascii_case("development") => LogFormat::Pretty,
        LogFormat::Auto => LogFormat::Json,
        concrete => concrete,
    }
}

pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Formatting layer for a resolved format.
pub fn fmt_layer<S>(
    format: LogFormat,
    service: &ServiceConfig,
) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LogFormat::Json => json_layer(service, std::io::stdout).boxed(),
        _ => fmt::layer().with_target(false).boxed(),
    }
}

/// JSON formatting layer writing one [`JsonEventFormat`] line per event.
pub fn json_layer<S, W>(
    service: &ServiceConfig,
    make_writer: W,
) -> fmt::Layer<S, JsonFields, JsonEventFormat, W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fmt::layer()
        .with_ansi(false)
        .fmt_fields(JsonFields::new())
        .event_format(JsonEventFormat::new(service))
        .with_writer(make_writer)
}

/// Event formatter for JSON lines with service identity and request context
/// at the top level.
#[derive(Debug, Clone)]
pub struct JsonEventFormat {
    service: String,
    environment: String,
}

impl JsonEventFormat {
    pub fn new(service: &ServiceConfig) -> Self {
        Self {
            service: service.name.clone(),
            environment: service.environment.clone(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for JsonEventFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        let mut fields = FieldVisitor::default();
        event.record(&mut fields);

        let mut spans = Vec::new();
        let mut lifted = Map::new();
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                let mut entry = span
                    .extensions()
                    .get::<FormattedFields<N>>()
                    .and_then(|data| serde_json::from_str::<Map<String, Value>>(data).ok())
                    .unwrap_or_default();

                // Root to leaf, so the innermost span wins.
                for key in LIFTED_FIELDS {
                    if let Some(value) = entry.get(key) {
                        lifted.insert(key.to_string(), value.clone());
                    }
                }

                entry.insert("name".to_string(), Value::from(span.name()));
                spans.push(Value::Object(entry));
            }
        }

        let mut line = Map::new();
        line.insert(
            "timestamp".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        line.insert(
            "level".to_string(),
            Value::from(event.metadata().level().to_string()),
        );
        line.insert("service".to_string(), Value::from(self.service.as_str()));
        line.insert(
            "environment".to_string(),
            Value::from(self.environment.as_str()),
        );
        line.extend(lifted);
        line.insert("fields".to_string(), Value::Object(fields.0));
        if let Some(current) = spans.last() {
            line.insert("span".to_string(), current.clone());
        }
        line.insert("spans".to_string(), Value::Array(spans));

        let json = serde_json::to_string(&line).map_err(|_| stdfmt::Error)?;
        writeln!(writer, "{}", json)
    }
}

/// Collects event fields into a JSON object.
#[derive(Default)]
struct FieldVisitor(Map<String, Value>);

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.0.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn stdfmt::Debug) {
        self.insert(field, Value::from(format!("{:?}", value)));
    }
}
