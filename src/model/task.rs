use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use egui::Color32;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::timeline::today;

/// Maps a task id to the ids of tasks that depend on it, in first-seen order.
pub type DependencyMap = HashMap<String, Vec<String>>;

/// Dependencies as they arrive from the outside: either a comma-separated
/// string of ids or an explicit list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dependencies {
    List(Vec<String>),
    Csv(String),
}

impl Dependencies {
    fn ids(&self) -> Vec<String> {
        match self {
            Dependencies::List(ids) => ids
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Dependencies::Csv(s) => s
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

/// A task record as supplied by the host application or a project file.
/// Everything except the name is optional; the resolver repairs the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTask {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub progress: f32,
    #[serde(default)]
    pub dependencies: Option<Dependencies>,
    /// Custom bar color as a hex tag like `#4285f4`.
    #[serde(default)]
    pub color: Option<String>,
}

/// A task after resolution: concrete dates, a unique id, and a row index.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub progress: f32,
    pub dependencies: Vec<String>,
    /// Row position; stable for the lifetime of one task array.
    pub index: usize,
    /// True when the original start or end did not yield a concrete point in
    /// time. Invalid tasks still render with a default span, but committed
    /// date changes are advisory only.
    pub invalid: bool,
    /// Custom color parsed from the raw tag; the theme palette fills in
    /// by row index when absent.
    pub color: Option<Color32>,
}

impl Task {
    pub fn duration_hours(&self) -> f64 {
        self.end.signed_duration_since(self.start).num_seconds() as f64 / 3600.0
    }
}

/// Try parsing a date or datetime string with several common formats.
pub fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Parse a `#rrggbb` color tag.
fn parse_color_tag(s: &str) -> Option<Color32> {
    let hex = s.trim().strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color32::from_rgb(r, g, b))
}

/// Generate an id for a task that arrived without one. Collision-tolerant
/// for practical input sizes; uniqueness is not guaranteed.
fn generate_id(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", slug, &suffix[..10])
}

/// Anything longer than this is assumed to be fat-fingered input and the
/// end date is discarded.
const MAX_DURATION_DAYS: i64 = 3650;

const DEFAULT_SPAN_DAYS: i64 = 2;

/// Resolve raw task records into validated tasks plus the dependency map.
///
/// Date repair, in precedence order:
/// 1. a duration over ten years discards the end, which then falls through
///    the missing-end rule,
/// 2. both bounds missing: today through today plus two days,
/// 3. end only: start is backed off two days,
/// 4. start only: end is pushed out two days,
/// 5. both present and the end has no time-of-day component: the end is an
///    all-day date and advances 24 hours.
///
/// After repair the end is always strictly after the start.
pub fn resolve_tasks(raw_tasks: &[RawTask]) -> (Vec<Task>, DependencyMap) {
    let today = today();
    let span = Duration::days(DEFAULT_SPAN_DAYS);

    let mut tasks: Vec<Task> = Vec::with_capacity(raw_tasks.len());
    for (index, raw) in raw_tasks.iter().enumerate() {
        let parsed_start = raw.start.as_deref().and_then(parse_date_time);
        let mut parsed_end = raw.end.as_deref().and_then(parse_date_time);

        if let (Some(s), Some(e)) = (parsed_start, parsed_end) {
            if e.signed_duration_since(s).num_days() > MAX_DURATION_DAYS {
                parsed_end = None;
            }
        }

        let invalid = parsed_start.is_none() || parsed_end.is_none();

        let (start, mut end) = match (parsed_start, parsed_end) {
            (None, None) => (today, today + span),
            (None, Some(e)) => (e - span, e),
            (Some(s), None) => (s, s + span),
            (Some(s), Some(e)) => {
                // All-day end: a bare date means "through the end of that day".
                let e = if e.time() == NaiveTime::MIN {
                    e + Duration::hours(24)
                } else {
                    e
                };
                (s, e)
            }
        };
        if end <= start {
            end = start + span;
        }

        let id = match &raw.id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => generate_id(&raw.name),
        };

        tasks.push(Task {
            id,
            name: raw.name.clone(),
            start,
            end,
            progress: raw.progress,
            dependencies: raw
                .dependencies
                .as_ref()
                .map(|d| d.ids())
                .unwrap_or_default(),
            index,
            invalid,
            color: raw.color.as_deref().and_then(parse_color_tag),
        });
    }

    let mut dependency_map: DependencyMap = HashMap::new();
    for task in &tasks {
        for dep in &task.dependencies {
            dependency_map
                .entry(dep.clone())
                .or_default()
                .push(task.id.clone());
        }
    }

    tracing::debug!(tasks = tasks.len(), "resolved task set");
    (tasks, dependency_map)
}
