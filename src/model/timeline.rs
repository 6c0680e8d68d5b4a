use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::GanttError;

use super::task::Task;

/// Granularity of the time axis. Each mode fixes the hours represented by
/// one grid column and that column's width in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    QuarterDay,
    HalfDay,
    Day,
    Week,
    Month,
    Year,
}

impl ViewMode {
    pub const ALL: [ViewMode; 6] = [
        ViewMode::QuarterDay,
        ViewMode::HalfDay,
        ViewMode::Day,
        ViewMode::Week,
        ViewMode::Month,
        ViewMode::Year,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::QuarterDay => "Quarter Day",
            ViewMode::HalfDay => "Half Day",
            ViewMode::Day => "Day",
            ViewMode::Week => "Week",
            ViewMode::Month => "Month",
            ViewMode::Year => "Year",
        }
    }

    /// Parse a mode from its display name. Unknown names are an error so the
    /// caller can fall back to the previously active mode.
    pub fn from_name(name: &str) -> Result<ViewMode, GanttError> {
        ViewMode::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| GanttError::UnknownViewMode(name.to_string()))
    }

    /// Hours represented by one grid column.
    pub fn step_hours(self) -> f64 {
        match self {
            ViewMode::QuarterDay => 6.0,
            ViewMode::HalfDay => 12.0,
            ViewMode::Day => 24.0,
            ViewMode::Week => 168.0,
            ViewMode::Month => 720.0,
            ViewMode::Year => 8760.0,
        }
    }

    /// Column width in pixels. Overrides any configured base width.
    pub fn column_width(self) -> f32 {
        match self {
            ViewMode::QuarterDay | ViewMode::HalfDay | ViewMode::Day => 38.0,
            ViewMode::Week => 140.0,
            ViewMode::Month | ViewMode::Year => 120.0,
        }
    }

    /// Drag quantization unit: a seventh of a column in Week mode, a
    /// thirtieth in Month mode (one day either way), a whole column
    /// otherwise.
    pub fn snap_unit(self, column_width: f32) -> f32 {
        match self {
            ViewMode::Week => column_width / 7.0,
            ViewMode::Month => column_width / 30.0,
            _ => column_width,
        }
    }

    /// Quantize a pixel delta to the nearest snap unit, ties away from zero.
    pub fn snap_px(self, dx: f32, column_width: f32) -> f32 {
        let unit = self.snap_unit(column_width);
        (dx / unit).round() * unit
    }
}

// ── Date helpers ─────────────────────────────────────────────────────────────

/// Today at midnight, local time.
pub fn today() -> NaiveDateTime {
    chrono::Local::now().date_naive().and_time(NaiveTime::MIN)
}

pub fn start_of_day(dt: NaiveDateTime) -> NaiveDateTime {
    dt.date().and_time(NaiveTime::MIN)
}

pub fn start_of_year(dt: NaiveDateTime) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(dt.year(), 1, 1)
        .unwrap_or_else(|| dt.date())
        .and_time(NaiveTime::MIN)
}

pub fn add_months(dt: NaiveDateTime, months: u32) -> NaiveDateTime {
    dt.checked_add_months(Months::new(months)).unwrap_or(dt)
}

pub fn sub_months(dt: NaiveDateTime, months: u32) -> NaiveDateTime {
    dt.checked_sub_months(Months::new(months)).unwrap_or(dt)
}

pub fn days_in_month(dt: NaiveDateTime) -> i64 {
    let first = NaiveDate::from_ymd_opt(dt.year(), dt.month(), 1).unwrap_or_else(|| dt.date());
    let next = first
        .checked_add_months(Months::new(1))
        .unwrap_or(first + Duration::days(30));
    (next - first).num_days()
}

pub fn hours_between(a: NaiveDateTime, b: NaiveDateTime) -> f64 {
    b.signed_duration_since(a).num_seconds() as f64 / 3600.0
}

// ── Time scale ───────────────────────────────────────────────────────────────

/// A grid line position with its visual weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTick {
    pub x: f32,
    pub thick: bool,
}

/// A date label in the two-row chart header.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLabel {
    pub text: String,
    pub x: f32,
    pub upper: bool,
}

/// The computed time axis: visible range, step, and the ordered column
/// boundaries. Recomputed wholesale whenever the task set or view mode
/// changes; deterministic for fixed inputs.
#[derive(Debug, Clone)]
pub struct TimeScale {
    pub mode: ViewMode,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub step_hours: f64,
    pub column_width: f32,
    pub dates: Vec<NaiveDateTime>,
}

impl TimeScale {
    pub fn compute(tasks: &[Task], mode: ViewMode) -> TimeScale {
        let mut start = tasks
            .iter()
            .map(|t| t.start)
            .min()
            .map(start_of_day)
            .unwrap_or_else(today);
        let mut end = tasks
            .iter()
            .map(|t| t.end)
            .max()
            .map(start_of_day)
            .unwrap_or_else(today);

        // Mode-dependent padding: wider context for coarse granularities.
        match mode {
            ViewMode::QuarterDay | ViewMode::HalfDay => {
                start -= Duration::days(7);
                end += Duration::days(7);
            }
            ViewMode::Month => {
                start = start_of_year(start);
                end = add_months(end, 12);
            }
            ViewMode::Year => {
                start = sub_months(start, 24);
                end = add_months(end, 24);
            }
            ViewMode::Day | ViewMode::Week => {
                start = sub_months(start, 1);
                end = add_months(end, 1);
            }
        }

        let mut dates = Vec::new();
        let mut current = start;
        while current < end {
            dates.push(current);
            current = match mode {
                ViewMode::Year => add_months(current, 12),
                ViewMode::Month => add_months(current, 1),
                _ => current + Duration::hours(mode.step_hours() as i64),
            };
        }

        TimeScale {
            mode,
            start,
            end,
            step_hours: mode.step_hours(),
            column_width: mode.column_width(),
            dates,
        }
    }

    pub fn grid_width(&self) -> f32 {
        self.dates.len() as f32 * self.column_width
    }

    /// Pixel offset of a point in time from the left edge of the grid.
    pub fn x_for(&self, t: NaiveDateTime) -> f32 {
        (hours_between(self.start, t) / self.step_hours) as f32 * self.column_width
    }

    /// Reverse mapping: the point in time a pixel offset corresponds to.
    pub fn date_at(&self, x: f32) -> NaiveDateTime {
        let hours = x as f64 / self.column_width as f64 * self.step_hours;
        self.start + Duration::seconds((hours * 3600.0).round() as i64)
    }

    /// Vertical grid line positions. Month columns are spaced by the actual
    /// day count of each month so boundaries stay aligned with the calendar;
    /// every other mode uses uniform columns.
    pub fn ticks(&self) -> Vec<GridTick> {
        let mut ticks = Vec::with_capacity(self.dates.len());
        let mut tick_x = 0.0_f32;
        for date in &self.dates {
            let thick = match self.mode {
                ViewMode::Day => date.day() == 1,
                ViewMode::Week => date.day() < 8,
                ViewMode::Month => date.month0() % 3 == 0,
                _ => false,
            };
            ticks.push(GridTick { x: tick_x, thick });
            tick_x += if self.mode == ViewMode::Month {
                self.column_width * days_in_month(*date) as f32 / 30.0
            } else {
                self.column_width
            };
        }
        ticks
    }

    /// The highlighted x-range for today's column, Day mode only.
    pub fn today_x(&self) -> Option<f32> {
        if self.mode != ViewMode::Day {
            return None;
        }
        Some((hours_between(self.start, today()) / self.step_hours) as f32 * self.column_width)
    }

    /// Upper and lower header labels. A label is emitted only when the
    /// relevant date component differs from the previous column's, so the
    /// same month or year is not repeated on every tick; the first column
    /// always labels.
    pub fn header_labels(&self) -> Vec<HeaderLabel> {
        let col = self.column_width;
        let mut labels = Vec::new();
        for (i, date) in self.dates.iter().enumerate() {
            let prev = if i == 0 { None } else { Some(self.dates[i - 1]) };
            let day_changed = prev.map_or(true, |p| p.day() != date.day());
            let month_changed = prev.map_or(true, |p| p.month() != date.month());
            let year_changed = prev.map_or(true, |p| p.year() != date.year());
            let base_x = i as f32 * col;

            let (lower, lower_dx) = match self.mode {
                ViewMode::QuarterDay => (Some(fmt(date, "%H")), col * 2.0),
                ViewMode::HalfDay => (Some(fmt(date, "%H")), col),
                ViewMode::Day => (day_changed.then(|| fmt(date, "%-d")), col / 2.0),
                ViewMode::Week => {
                    let text = if month_changed {
                        fmt(date, "%-d %b")
                    } else {
                        fmt(date, "%-d")
                    };
                    (Some(text), 0.0)
                }
                ViewMode::Month => (Some(fmt(date, "%B")), col / 2.0),
                ViewMode::Year => (Some(fmt(date, "%Y")), col / 2.0),
            };
            let (upper, upper_dx) = match self.mode {
                ViewMode::QuarterDay => (day_changed.then(|| fmt(date, "%-d %b")), 0.0),
                ViewMode::HalfDay => {
                    let text = if day_changed {
                        Some(if month_changed {
                            fmt(date, "%-d %b")
                        } else {
                            fmt(date, "%-d")
                        })
                    } else {
                        None
                    };
                    (text, 0.0)
                }
                ViewMode::Day => (month_changed.then(|| fmt(date, "%B")), col * 15.0),
                ViewMode::Week => (month_changed.then(|| fmt(date, "%B")), col * 2.0),
                ViewMode::Month => (year_changed.then(|| fmt(date, "%Y")), col * 6.0),
                ViewMode::Year => (year_changed.then(|| fmt(date, "%Y")), col * 15.0),
            };

            if let Some(text) = lower {
                labels.push(HeaderLabel {
                    text,
                    x: base_x + lower_dx,
                    upper: false,
                });
            }
            if let Some(text) = upper {
                labels.push(HeaderLabel {
                    text,
                    x: base_x + upper_dx,
                    upper: true,
                });
            }
        }
        labels
    }
}

fn fmt(date: &NaiveDateTime, pattern: &str) -> String {
    date.format(pattern).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{resolve_tasks, RawTask};

    fn tasks(rows: &[(&str, &str, &str)]) -> Vec<Task> {
        let raw: Vec<RawTask> = rows
            .iter()
            .map(|(id, s, e)| RawTask {
                id: Some(id.to_string()),
                name: id.to_string(),
                start: Some(s.to_string()),
                end: Some(e.to_string()),
                ..Default::default()
            })
            .collect();
        resolve_tasks(&raw).0
    }

    #[test]
    fn mode_table_is_closed() {
        assert_eq!(ViewMode::Day.step_hours(), 24.0);
        assert_eq!(ViewMode::Day.column_width(), 38.0);
        assert_eq!(ViewMode::Week.step_hours(), 168.0);
        assert_eq!(ViewMode::Week.column_width(), 140.0);
        assert_eq!(ViewMode::Month.step_hours(), 720.0);
        assert_eq!(ViewMode::Month.column_width(), 120.0);
        assert_eq!(ViewMode::Year.step_hours(), 8760.0);
        assert_eq!(ViewMode::QuarterDay.step_hours(), 6.0);
        assert_eq!(ViewMode::HalfDay.step_hours(), 12.0);
    }

    #[test]
    fn unknown_mode_name_is_an_error() {
        assert!(ViewMode::from_name("Day").is_ok());
        assert!(ViewMode::from_name("quarter day").is_ok());
        assert!(matches!(
            ViewMode::from_name("Fortnight"),
            Err(GanttError::UnknownViewMode(_))
        ));
    }

    #[test]
    fn day_scale_pads_one_month_each_side() {
        let ts = tasks(&[
            ("t1", "2024-01-01", "2024-01-03"),
            ("t2", "2024-01-05", "2024-01-06"),
        ]);
        let scale = TimeScale::compute(&ts, ViewMode::Day);
        assert_eq!(scale.start.date().to_string(), "2023-12-01");
        // max end is t2's all-day end bumped to 2024-01-07, plus one month
        assert_eq!(scale.end.date().to_string(), "2024-02-07");
    }

    #[test]
    fn dates_are_strictly_increasing_and_cover_the_range() {
        let ts = tasks(&[("t", "2024-01-10", "2024-03-20")]);
        for mode in ViewMode::ALL {
            let scale = TimeScale::compute(&ts, mode);
            assert!(!scale.dates.is_empty());
            assert_eq!(scale.dates[0], scale.start);
            for pair in scale.dates.windows(2) {
                assert!(pair[0] < pair[1], "{mode:?} not increasing");
                let gap = hours_between(pair[0], pair[1]);
                // year and month steps vary with the calendar but never
                // exceed one nominal step by more than a leap-ish margin
                assert!(gap <= scale.step_hours + 48.0, "{mode:?} gap {gap}");
            }
            let last = *scale.dates.last().unwrap();
            assert!(last < scale.end);
        }
    }

    #[test]
    fn month_mode_steps_by_calendar_month() {
        let ts = tasks(&[("t", "2024-01-10", "2024-02-20")]);
        let scale = TimeScale::compute(&ts, ViewMode::Month);
        assert_eq!(scale.start, start_of_year(scale.start));
        for d in &scale.dates {
            assert_eq!(d.day(), 1);
        }
        assert_eq!(scale.column_width, 120.0);
        assert_eq!(scale.step_hours, 720.0);
    }

    #[test]
    fn year_mode_pads_two_years_each_side() {
        let ts = tasks(&[("t", "2024-06-01", "2024-07-01")]);
        let scale = TimeScale::compute(&ts, ViewMode::Year);
        assert_eq!(scale.start.date().to_string(), "2022-06-01");
        assert_eq!(scale.end.date().to_string(), "2026-07-02");
    }

    #[test]
    fn quarter_day_pads_seven_days() {
        let ts = tasks(&[("t", "2024-06-10", "2024-06-12")]);
        let scale = TimeScale::compute(&ts, ViewMode::QuarterDay);
        assert_eq!(scale.start.date().to_string(), "2024-06-03");
        assert_eq!(scale.end.date().to_string(), "2024-06-20");
    }

    #[test]
    fn snap_rounds_to_nearest_with_ties_away_from_zero() {
        let col = ViewMode::Day.column_width();
        assert_eq!(ViewMode::Day.snap_px(18.0, col), 0.0);
        assert_eq!(ViewMode::Day.snap_px(19.0, col), 38.0);
        assert_eq!(ViewMode::Day.snap_px(-19.0, col), -38.0);
        assert_eq!(ViewMode::Day.snap_px(40.0, col), 38.0);

        let col = ViewMode::Week.column_width();
        assert_eq!(ViewMode::Week.snap_px(9.0, col), 0.0);
        assert_eq!(ViewMode::Week.snap_px(10.0, col), 20.0);
        assert_eq!(ViewMode::Week.snap_px(50.0, col), 60.0);

        let col = ViewMode::Month.column_width();
        assert_eq!(ViewMode::Month.snap_px(2.0, col), 4.0);
        assert_eq!(ViewMode::Month.snap_px(-2.0, col), -4.0);
        assert_eq!(ViewMode::Month.snap_px(1.9, col), 0.0);
    }

    #[test]
    fn day_ticks_are_thick_on_the_first_of_month() {
        let ts = tasks(&[("t", "2024-01-10", "2024-01-20")]);
        let scale = TimeScale::compute(&ts, ViewMode::Day);
        let ticks = scale.ticks();
        for (tick, date) in ticks.iter().zip(&scale.dates) {
            assert_eq!(tick.thick, date.day() == 1);
        }
        // uniform spacing outside month mode
        for pair in ticks.windows(2) {
            assert_eq!(pair[1].x - pair[0].x, 38.0);
        }
    }

    #[test]
    fn month_ticks_are_prorated_by_days_in_month() {
        let ts = tasks(&[("t", "2024-01-10", "2024-02-20")]);
        let scale = TimeScale::compute(&ts, ViewMode::Month);
        let ticks = scale.ticks();
        for (i, pair) in ticks.windows(2).enumerate() {
            let expected = 120.0 * days_in_month(scale.dates[i]) as f32 / 30.0;
            assert!((pair[1].x - pair[0].x - expected).abs() < 0.001);
        }
        // quarters carry the thick weight
        for (tick, date) in ticks.iter().zip(&scale.dates) {
            assert_eq!(tick.thick, date.month0() % 3 == 0);
        }
    }

    #[test]
    fn today_highlight_only_in_day_mode() {
        let ts = tasks(&[("t", "2024-01-10", "2024-01-20")]);
        assert!(TimeScale::compute(&ts, ViewMode::Week).today_x().is_none());
        assert!(TimeScale::compute(&ts, ViewMode::Month).today_x().is_none());
        let day = TimeScale::compute(&ts, ViewMode::Day);
        let x = day.today_x().unwrap();
        assert_eq!(x, day.x_for(today()));
    }

    #[test]
    fn first_column_always_gets_a_lower_label() {
        let ts = tasks(&[("t", "2024-01-10", "2024-01-20")]);
        for mode in ViewMode::ALL {
            let scale = TimeScale::compute(&ts, mode);
            let labels = scale.header_labels();
            assert!(
                labels.iter().any(|l| !l.upper && l.x < scale.column_width * 2.5),
                "{mode:?} missing a leading lower label"
            );
        }
    }

    #[test]
    fn day_mode_upper_labels_mark_month_changes() {
        let ts = tasks(&[("t", "2024-01-10", "2024-01-20")]);
        let scale = TimeScale::compute(&ts, ViewMode::Day);
        let upper: Vec<_> = scale
            .header_labels()
            .into_iter()
            .filter(|l| l.upper)
            .collect();
        // December (first column), January, February
        assert_eq!(upper.len(), 3);
        assert_eq!(upper[0].text, "December");
        assert_eq!(upper[1].text, "January");
        assert_eq!(upper[2].text, "February");
    }

    #[test]
    fn date_round_trip_through_pixels() {
        let ts = tasks(&[("t", "2024-01-10", "2024-01-20")]);
        for mode in [ViewMode::Day, ViewMode::Week, ViewMode::Month] {
            let scale = TimeScale::compute(&ts, mode);
            let d = scale.start + Duration::days(10);
            assert_eq!(scale.date_at(scale.x_for(d)), d, "{mode:?}");
        }
    }

    #[test]
    fn empty_task_list_still_produces_a_scale() {
        let scale = TimeScale::compute(&[], ViewMode::Day);
        assert!(!scale.dates.is_empty());
        assert!(scale.start < scale.end);
    }
}
