//! Indexing progress on stderr.
//!
//! Each uncached manual waits on a network call, so a long `shelf index`
//! run reports where it is. Progress never touches stdout, which carries the
//! run summary.

use serde::Serialize;
use std::io::Write;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum IndexProgressEvent {
    /// Walking the library root; the number of manuals is not known yet.
    Scanning { root: String },
    /// Manual `n` of `total` is being processed.
    Indexing { n: u64, total: u64, path: String },
}

pub trait IndexProgressReporter: Send + Sync {
    fn report(&self, event: IndexProgressEvent);
}

/// "index   3 / 1,204 ( 0%)  kitchen/eq700.pdf"
pub struct HumanProgress;

impl IndexProgressReporter for HumanProgress {
    fn report(&self, event: IndexProgressEvent) {
        let line = match event {
            IndexProgressEvent::Scanning { root } => format!("index  scanning {}", root),
            IndexProgressEvent::Indexing { n, total, path } => {
                let width = format_number(total).len();
                format!(
                    "index  {:>width$} / {} ({:>3}%)  {}",
                    format_number(n),
                    format_number(total),
                    percent(n, total),
                    path,
                    width = width
                )
            }
        };
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", line);
    }
}

/// One `{"event":"progress","phase":...}` object per line.
pub struct JsonProgress;

#[derive(Serialize)]
struct JsonLine {
    event: &'static str,
    #[serde(flatten)]
    progress: IndexProgressEvent,
}

impl IndexProgressReporter for JsonProgress {
    fn report(&self, event: IndexProgressEvent) {
        let line = JsonLine {
            event: "progress",
            progress: event,
        };
        if let Ok(json) = serde_json::to_string(&line) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", json);
        }
    }
}

pub struct NoProgress;

impl IndexProgressReporter for NoProgress {
    fn report(&self, _event: IndexProgressEvent) {}
}

fn percent(n: u64, total: u64) -> u64 {
    if total == 0 {
        100
    } else {
        n.saturating_mul(100) / total
    }
}

fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `--progress` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Human progress when stderr is a terminal, otherwise none.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn IndexProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(HumanProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
