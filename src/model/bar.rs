use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::config::GanttConfig;

use super::task::Task;
use super::timeline::TimeScale;

/// Render-time geometry for one task: current x/width in grid pixels plus
/// the transient state a gesture mutates. References its task by index.
#[derive(Debug, Clone)]
pub struct Bar {
    pub task_index: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub progress_width: f32,
    pub invalid: bool,
    /// Indices into the arrow list of every arrow touching this bar.
    pub arrows: Vec<usize>,
}

impl Bar {
    /// The point in time the bar's left edge currently sits at.
    pub fn start_date(&self, scale: &TimeScale) -> NaiveDateTime {
        scale.date_at(self.x)
    }

    /// The point in time the bar's right edge currently sits at.
    pub fn end_date(&self, scale: &TimeScale) -> NaiveDateTime {
        scale.date_at(self.x + self.width)
    }

    /// Progress as a whole percentage of the bar width.
    pub fn progress_percent(&self) -> f32 {
        if self.width <= 0.0 {
            return 0.0;
        }
        (self.progress_width / self.width * 100.0).round().clamp(0.0, 100.0)
    }
}

/// Lay out one bar per task from the active scale.
pub fn layout_bars(tasks: &[Task], scale: &TimeScale, cfg: &GanttConfig) -> Vec<Bar> {
    tasks
        .iter()
        .map(|task| {
            let x = scale.x_for(task.start);
            let width = scale.x_for(task.end) - x;
            let y = cfg.header_height + cfg.padding + task.index as f32 * cfg.row_height();
            Bar {
                task_index: task.index,
                x,
                y,
                width,
                height: cfg.bar_height,
                progress_width: width * (task.progress / 100.0).clamp(0.0, 1.0),
                invalid: task.invalid,
                arrows: Vec::new(),
            }
        })
        .collect()
}

/// A directed dependency edge between two rendered bars, by bar index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrow {
    pub from: usize,
    pub to: usize,
}

/// Materialize dependency edges as arrows: one per declared dependency whose
/// id has a rendered bar. Dangling ids are skipped silently; partial task
/// sets are common. Each bar is then annotated with the arrows touching it
/// in a single linear scan.
pub fn map_arrows(
    tasks: &[Task],
    bars: &mut [Bar],
    index_of: &HashMap<String, usize>,
) -> Vec<Arrow> {
    let mut arrows = Vec::new();
    for task in tasks {
        for dep in &task.dependencies {
            if let Some(&from) = index_of.get(dep.as_str()) {
                arrows.push(Arrow {
                    from,
                    to: task.index,
                });
            }
        }
    }
    for bar in bars.iter_mut() {
        bar.arrows.clear();
    }
    for (i, arrow) in arrows.iter().enumerate() {
        bars[arrow.from].arrows.push(i);
        if arrow.to != arrow.from {
            bars[arrow.to].arrows.push(i);
        }
    }
    arrows
}
