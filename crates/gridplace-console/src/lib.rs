//! Colorful console output for grid moves.
//!
//! Provides a custom `tracing` layer that formats placement events with colors.
//!
//! ## Log Levels
//!
//! - **INFO**: Committed moves and swaps, server lifecycle
//! - **WARN**: Swap fallbacks and failures, cache invalidation failures
//! - **ERROR**: Compensation failures (an establishment may be left parked)
//! - **DEBUG**: Rejected requests and applied compensations

use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Package version for banner display.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initializes console output.
///
/// Safe to call multiple times - only the first call has effect.
/// Prints the GridPlace banner and sets up tracing. `RUST_LOG` overrides the
/// default `info` level for GridPlace crates.
pub fn init() {
    INIT.get_or_init(|| {
        EPOCH.get_or_init(Instant::now);
        print_banner();

        let filter = EnvFilter::builder()
            .with_default_directive(directive("gridplace_engine=info"))
            .from_env_lossy()
            .add_directive(directive("gridplace_server=info"));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(GridConsoleLayer)
            .try_init();
    });
}

fn directive(s: &str) -> Directive {
    s.parse().unwrap_or_else(|_| LevelFilter::INFO.into())
}

fn elapsed_secs() -> f64 {
    EPOCH
        .get()
        .map(|epoch| epoch.elapsed().as_secs_f64())
        .unwrap_or(0.0)
}

fn print_banner() {
    let banner = r#"
  ____      _     _ ____  _
 / ___|_ __(_) __| |  _ \| | __ _  ___ ___
| |  _| '__| |/ _` | |_) | |/ _` |/ __/ _ \
| |_| | |  | | (_| |  __/| | (_| | (_|  __/
 \____|_|  |_|\__,_|_|   |_|\__,_|\___\___|
"#;

    let version_line = format!("           v{} - Grid Placement Service\n", VERSION);

    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", banner.bright_cyan());
    let _ = writeln!(stdout, "{}", version_line.bright_white().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats placement events with colors.
pub struct GridConsoleLayer;

impl<S: Subscriber> Layer<S> for GridConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("gridplace_") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor, *metadata.level());
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    establishment: Option<String>,
    zone: Option<String>,
    row: Option<u64>,
    col: Option<u64>,
    strategy: Option<String>,
    source: Option<String>,
    target: Option<String>,
    step: Option<String>,
    entry: Option<String>,
    user: Option<String>,
    error: Option<String>,
    compensated: Option<bool>,
    bind: Option<String>,
    zones: Option<u64>,
    establishments: Option<u64>,
    message: Option<String>,
}

impl EventVisitor {
    fn text_field(&mut self, name: &str, value: String) {
        let slot = match name {
            "event" => &mut self.event,
            "establishment" => &mut self.establishment,
            "zone" => &mut self.zone,
            "strategy" => &mut self.strategy,
            "source" => &mut self.source,
            "target" => &mut self.target,
            "step" => &mut self.step,
            "entry" => &mut self.entry,
            "user" => &mut self.user,
            "error" => &mut self.error,
            "bind" => &mut self.bind,
            "message" => &mut self.message,
            _ => return,
        };
        *slot = Some(value);
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        self.text_field(field.name(), s.trim_matches('"').to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "row" => self.row = Some(value),
            "col" => self.col = Some(value),
            "zones" => self.zones = Some(value),
            "establishments" => self.establishments = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "compensated" {
            self.compensated = Some(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.text_field(field.name(), value.to_string());
    }
}

fn format_event(v: &EventVisitor, level: Level) -> String {
    let event = v.event.as_deref().unwrap_or("");

    match event {
        "server_start" => format_server_start(v),
        "move_committed" => format_move(v),
        "swap_committed" => format_swap(v),
        "swap_fallback" => format_fallback(v),
        "swap_failed" => format_swap_failed(v),
        "compensation_failed" => format_compensation_failed(v),
        "cache_invalidation_failed" => format_cache_failure(v),
        "request_rejected" if level == Level::DEBUG => format_rejection(v),
        "" => v
            .message
            .as_deref()
            .map(|m| format!("{} {}", format_elapsed(), m))
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn format_elapsed() -> String {
    format!("{:>7.3}s", elapsed_secs())
        .bright_black()
        .to_string()
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("?")
}

fn format_server_start(v: &EventVisitor) -> String {
    format!(
        "{} {} Listening on {} │ {} zones │ {} establishments",
        format_elapsed(),
        "▶".bright_green().bold(),
        field(&v.bind).bright_white().bold(),
        v.zones.unwrap_or(0).bright_yellow(),
        v.establishments.unwrap_or(0).bright_yellow(),
    )
}

fn format_move(v: &EventVisitor) -> String {
    format!(
        "{} {} Moved {} │ {} ({}, {})",
        format_elapsed(),
        "→".bright_green(),
        field(&v.establishment).white(),
        field(&v.zone).bright_cyan(),
        v.row.unwrap_or(0),
        v.col.unwrap_or(0),
    )
}

fn format_swap(v: &EventVisitor) -> String {
    format!(
        "{} {} Swapped {} ⇄ {} │ {} │ {}",
        format_elapsed(),
        "⇄".bright_green().bold(),
        field(&v.source).white(),
        field(&v.target).white(),
        field(&v.zone).bright_cyan(),
        field(&v.strategy).bright_magenta(),
    )
}

fn format_fallback(v: &EventVisitor) -> String {
    format!(
        "{} {} Atomic swap unavailable, falling back to sequential │ {}",
        format_elapsed(),
        "↺".yellow(),
        field(&v.error).bright_black(),
    )
}

fn format_swap_failed(v: &EventVisitor) -> String {
    let stage = v.step.as_deref().unwrap_or("atomic swap");
    let mut output = format!(
        "{} {} Swap failed at {} │ {}",
        format_elapsed(),
        "✗".bright_red().bold(),
        stage.white().bold(),
        field(&v.error).bright_red(),
    );
    match v.compensated {
        Some(true) => output.push_str(&format!(" │ {}", "restored".bright_green())),
        Some(false) => output.push_str(&format!(" │ {}", "NOT restored".bright_red().bold())),
        None => {}
    }
    output
}

fn format_compensation_failed(v: &EventVisitor) -> String {
    format!(
        "{} {} Could not restore {} in {} │ {}",
        format_elapsed(),
        "‼".bright_red().bold(),
        field(&v.establishment).white().bold(),
        field(&v.zone).bright_cyan(),
        field(&v.error).bright_red(),
    )
}

fn format_cache_failure(v: &EventVisitor) -> String {
    format!(
        "{} {} Listing cache not invalidated │ {}",
        format_elapsed(),
        "!".yellow(),
        field(&v.error).bright_black(),
    )
}

fn format_rejection(v: &EventVisitor) -> String {
    format!(
        "{} {} Rejected {} from {} │ {}",
        format_elapsed(),
        "·".bright_black(),
        field(&v.entry).bright_black(),
        field(&v.user).bright_black(),
        field(&v.error).bright_black(),
    )
}
