use std::collections::{HashMap, HashSet, VecDeque};

use chrono::NaiveDateTime;

use super::bar::Bar;
use super::task::{DependencyMap, Task};
use super::timeline::{TimeScale, ViewMode};

/// A change committed by a finished gesture or a view switch, surfaced to
/// the host application.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartEvent {
    ViewModeChanged(ViewMode),
    DateChanged {
        id: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    ProgressChanged {
        id: String,
        progress: f32,
    },
}

/// What the pointer grabbed when the gesture began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Move,
    ResizeLeft,
    ResizeRight,
    Progress,
}

#[derive(Debug, Clone, Copy)]
struct BarSnapshot {
    x: f32,
    width: f32,
    progress_width: f32,
}

/// Every task transitively depending on `start_id`, breadth-first over the
/// dependency map. Visited-set traversal: cycles terminate and a task
/// reachable by multiple paths appears exactly once. The start id itself is
/// not included.
pub fn dependent_closure(start_id: &str, dependency_map: &DependencyMap) -> Vec<String> {
    let mut out = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(start_id);
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(start_id);
    while let Some(id) = queue.pop_front() {
        if let Some(dependents) = dependency_map.get(id) {
            for dep in dependents {
                if visited.insert(dep.as_str()) {
                    out.push(dep.clone());
                    queue.push_back(dep.as_str());
                }
            }
        }
    }
    out
}

/// One active pointer gesture over a bar. Holds the start snapshot of every
/// affected bar; each move re-derives geometry from that snapshot plus the
/// current cumulative delta, so rounding never accumulates across frames.
#[derive(Debug, Clone)]
pub struct Gesture {
    kind: GestureKind,
    grabbed: usize,
    anchor_x: f32,
    /// Affected bar indices, grabbed first, then its dependent closure.
    affected: Vec<usize>,
    snapshots: Vec<BarSnapshot>,
    /// For each affected bar, the bar indices of its own dependencies.
    dependency_bars: Vec<Vec<usize>>,
}

impl Gesture {
    pub fn begin(
        kind: GestureKind,
        grabbed: usize,
        pointer_x: f32,
        tasks: &[Task],
        bars: &[Bar],
        dependency_map: &DependencyMap,
        index_of: &HashMap<String, usize>,
    ) -> Gesture {
        let mut affected = vec![grabbed];
        // Progress edits never cascade; moves and left-resizes drag the
        // whole dependent closure along.
        if matches!(kind, GestureKind::Move | GestureKind::ResizeLeft) {
            for id in dependent_closure(&tasks[grabbed].id, dependency_map) {
                if let Some(&idx) = index_of.get(&id) {
                    if idx != grabbed {
                        affected.push(idx);
                    }
                }
            }
        }
        let snapshots = affected
            .iter()
            .map(|&i| BarSnapshot {
                x: bars[i].x,
                width: bars[i].width,
                progress_width: bars[i].progress_width,
            })
            .collect();
        let dependency_bars = affected
            .iter()
            .map(|&i| {
                tasks[i]
                    .dependencies
                    .iter()
                    .filter_map(|d| index_of.get(d).copied())
                    .filter(|&d| d != i)
                    .collect()
            })
            .collect();
        Gesture {
            kind,
            grabbed,
            anchor_x: pointer_x,
            affected,
            snapshots,
            dependency_bars,
        }
    }

    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    pub fn grabbed(&self) -> usize {
        self.grabbed
    }

    /// Re-derive every affected bar from its snapshot and the pointer's
    /// current position. Applied on each pointer move while active.
    pub fn update(&self, pointer_x: f32, scale: &TimeScale, bars: &mut [Bar]) {
        let raw_dx = pointer_x - self.anchor_x;
        let dx = scale.mode.snap_px(raw_dx, scale.column_width);
        let min_width = scale.mode.snap_unit(scale.column_width);

        for (slot, (&idx, snap)) in self.affected.iter().zip(&self.snapshots).enumerate() {
            let is_grabbed = idx == self.grabbed;
            match self.kind {
                GestureKind::Move => {
                    self.apply_x(bars, slot, idx, snap.x + dx);
                }
                GestureKind::ResizeLeft => {
                    if is_grabbed {
                        // left edge moves, right edge fixed
                        if snap.width - dx >= min_width {
                            self.apply_x(bars, slot, idx, snap.x + dx);
                            bars[idx].width = snap.width - dx;
                        }
                    } else {
                        self.apply_x(bars, slot, idx, snap.x + dx);
                    }
                }
                GestureKind::ResizeRight => {
                    if is_grabbed && snap.width + dx >= min_width {
                        bars[idx].width = snap.width + dx;
                    }
                }
                GestureKind::Progress => {
                    // unsnapped, clamped live to the bar bounds
                    let min_dx = -snap.progress_width;
                    let max_dx = bars[idx].width - snap.progress_width;
                    bars[idx].progress_width = snap.progress_width + raw_dx.clamp(min_dx, max_dx);
                }
            }
        }
    }

    /// A bar may not slide left of any bar it depends on.
    fn apply_x(&self, bars: &mut [Bar], slot: usize, idx: usize, new_x: f32) {
        let valid = self.dependency_bars[slot]
            .iter()
            .all(|&dep| new_x >= bars[dep].x);
        if valid {
            bars[idx].x = new_x;
        }
    }

    /// Commit on pointer-up: bars whose geometry moved get their task dates
    /// (or progress) re-derived from pixels through the scale, and emit one
    /// event each. A zero-delta gesture commits and emits nothing. Invalid
    /// tasks keep their repaired dates; their bars move only as blocks.
    pub fn finish(
        self,
        scale: &TimeScale,
        tasks: &mut [Task],
        bars: &[Bar],
    ) -> Vec<ChartEvent> {
        let mut events = Vec::new();
        if self.kind == GestureKind::Progress {
            let idx = self.grabbed;
            let bar = &bars[idx];
            let progress = bar.progress_percent();
            if (progress - tasks[idx].progress).abs() > f32::EPSILON {
                tasks[idx].progress = progress;
                events.push(ChartEvent::ProgressChanged {
                    id: tasks[idx].id.clone(),
                    progress,
                });
            }
            return events;
        }

        for (&idx, snap) in self.affected.iter().zip(&self.snapshots) {
            let bar = &bars[idx];
            if bar.x == snap.x && bar.width == snap.width {
                continue;
            }
            if tasks[idx].invalid {
                continue;
            }
            let start = bar.start_date(scale);
            let end = bar.end_date(scale);
            tasks[idx].start = start;
            tasks[idx].end = end;
            tracing::debug!(id = %tasks[idx].id, %start, %end, "task dates committed");
            events.push(ChartEvent::DateChanged {
                id: tasks[idx].id.clone(),
                start,
                end,
            });
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GanttConfig;
    use crate::model::bar::layout_bars;
    use crate::model::task::{resolve_tasks, Dependencies, RawTask};
    use chrono::Duration;

    struct Rig {
        tasks: Vec<Task>,
        map: DependencyMap,
        scale: TimeScale,
        bars: Vec<Bar>,
        index_of: HashMap<String, usize>,
    }

    fn rig(rows: &[(&str, &str, &str, &str)], mode: ViewMode) -> Rig {
        let raw: Vec<RawTask> = rows
            .iter()
            .map(|(id, start, end, deps)| RawTask {
                id: Some(id.to_string()),
                name: id.to_string(),
                start: (!start.is_empty()).then(|| start.to_string()),
                end: (!end.is_empty()).then(|| end.to_string()),
                progress: 50.0,
                dependencies: (!deps.is_empty())
                    .then(|| Dependencies::Csv(deps.to_string())),
                ..Default::default()
            })
            .collect();
        let (tasks, map) = resolve_tasks(&raw);
        let scale = TimeScale::compute(&tasks, mode);
        let bars = layout_bars(&tasks, &scale, &GanttConfig::default());
        let index_of = tasks.iter().map(|t| (t.id.clone(), t.index)).collect();
        Rig {
            tasks,
            map,
            scale,
            bars,
            index_of,
        }
    }

    fn chain() -> Rig {
        rig(
            &[
                ("t1", "2024-01-01", "2024-01-03", ""),
                ("t2", "2024-01-05", "2024-01-06", "t1"),
                ("t3", "2024-01-08", "2024-01-10", "t2"),
            ],
            ViewMode::Day,
        )
    }

    fn begin(r: &Rig, kind: GestureKind, grabbed: usize, pointer_x: f32) -> Gesture {
        Gesture::begin(
            kind,
            grabbed,
            pointer_x,
            &r.tasks,
            &r.bars,
            &r.map,
            &r.index_of,
        )
    }

    #[test]
    fn closure_walks_transitive_dependents_once() {
        let r = chain();
        assert_eq!(dependent_closure("t1", &r.map), vec!["t2", "t3"]);
        assert_eq!(dependent_closure("t2", &r.map), vec!["t3"]);
        assert!(dependent_closure("t3", &r.map).is_empty());
    }

    #[test]
    fn closure_terminates_on_cycles() {
        let r = rig(
            &[
                ("a", "2024-01-01", "2024-01-03", "b"),
                ("b", "2024-01-05", "2024-01-06", "a"),
            ],
            ViewMode::Day,
        );
        assert_eq!(dependent_closure("a", &r.map), vec!["b"]);
        assert_eq!(dependent_closure("b", &r.map), vec!["a"]);
    }

    #[test]
    fn closure_visits_diamond_paths_once() {
        let r = rig(
            &[
                ("a", "2024-01-01", "2024-01-02", ""),
                ("b", "2024-01-03", "2024-01-04", "a"),
                ("c", "2024-01-03", "2024-01-04", "a"),
                ("d", "2024-01-05", "2024-01-06", "b, c"),
            ],
            ViewMode::Day,
        );
        let closure = dependent_closure("a", &r.map);
        assert_eq!(closure.len(), 3);
        assert_eq!(
            closure.iter().collect::<HashSet<_>>().len(),
            3,
            "no id may appear twice"
        );
    }

    #[test]
    fn dragging_moves_the_dependent_closure_in_lockstep() {
        let mut r = chain();
        let before: Vec<(f32, f32)> = r.bars.iter().map(|b| (b.x, b.width)).collect();
        let g = begin(&r, GestureKind::Move, 0, 100.0);
        g.update(100.0 + 38.0, &r.scale, &mut r.bars);
        for (bar, (x0, w0)) in r.bars.iter().zip(&before) {
            assert_eq!(bar.x, x0 + 38.0);
            assert_eq!(bar.width, *w0);
        }
    }

    #[test]
    fn drag_commit_shifts_every_affected_task_by_one_day() {
        let mut r = chain();
        let starts: Vec<_> = r.tasks.iter().map(|t| t.start).collect();
        let g = begin(&r, GestureKind::Move, 0, 100.0);
        g.update(100.0 + 38.0, &r.scale, &mut r.bars);
        let events = g.finish(&r.scale, &mut r.tasks, &r.bars);
        assert_eq!(events.len(), 3);
        for (task, start0) in r.tasks.iter().zip(&starts) {
            assert_eq!(task.start, *start0 + Duration::days(1));
        }
    }

    #[test]
    fn sub_threshold_drag_snaps_back_and_commits_nothing() {
        let mut r = chain();
        let x0 = r.bars[0].x;
        let g = begin(&r, GestureKind::Move, 0, 100.0);
        g.update(100.0 + 10.0, &r.scale, &mut r.bars);
        assert_eq!(r.bars[0].x, x0, "10 px is under half a day column");
        let events = g.finish(&r.scale, &mut r.tasks, &r.bars);
        assert!(events.is_empty());
    }

    #[test]
    fn resize_right_changes_only_the_grabbed_width() {
        let mut r = chain();
        let before: Vec<(f32, f32)> = r.bars.iter().map(|b| (b.x, b.width)).collect();
        let g = begin(&r, GestureKind::ResizeRight, 0, 100.0);
        g.update(100.0 + 38.0, &r.scale, &mut r.bars);
        assert_eq!(r.bars[0].x, before[0].0);
        assert_eq!(r.bars[0].width, before[0].1 + 38.0);
        for (bar, (x0, w0)) in r.bars.iter().zip(&before).skip(1) {
            assert_eq!((bar.x, bar.width), (*x0, *w0));
        }
        let events = g.finish(&r.scale, &mut r.tasks, &r.bars);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ChartEvent::DateChanged { id, end, .. } => {
                assert_eq!(id, "t1");
                assert_eq!(end.date().to_string(), "2024-01-05");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn resize_left_moves_the_edge_and_slides_dependents() {
        let mut r = chain();
        let before: Vec<(f32, f32)> = r.bars.iter().map(|b| (b.x, b.width)).collect();
        let g = begin(&r, GestureKind::ResizeLeft, 0, 100.0);
        g.update(100.0 - 38.0, &r.scale, &mut r.bars);
        assert_eq!(r.bars[0].x, before[0].0 - 38.0);
        assert_eq!(r.bars[0].width, before[0].1 + 38.0);
        // dependents slide, widths unchanged
        assert_eq!(r.bars[1].x, before[1].0 - 38.0);
        assert_eq!(r.bars[1].width, before[1].1);
        assert_eq!(r.bars[2].x, before[2].0 - 38.0);
    }

    #[test]
    fn resize_past_the_opposite_edge_is_ignored() {
        let mut r = chain();
        let w0 = r.bars[0].width;
        let g = begin(&r, GestureKind::ResizeRight, 0, 100.0);
        g.update(100.0 - w0 - 38.0, &r.scale, &mut r.bars);
        assert_eq!(r.bars[0].width, w0);
        let events = g.finish(&r.scale, &mut r.tasks, &r.bars);
        assert!(events.is_empty());
    }

    #[test]
    fn progress_is_clamped_to_the_bar() {
        let mut r = chain();
        let g = begin(&r, GestureKind::Progress, 0, 100.0);
        g.update(100.0 + 10_000.0, &r.scale, &mut r.bars);
        assert_eq!(r.bars[0].progress_width, r.bars[0].width);
        g.update(100.0 - 10_000.0, &r.scale, &mut r.bars);
        assert_eq!(r.bars[0].progress_width, 0.0);
        let events = g.finish(&r.scale, &mut r.tasks, &r.bars);
        assert_eq!(
            events,
            vec![ChartEvent::ProgressChanged {
                id: "t1".to_string(),
                progress: 0.0
            }]
        );
        assert_eq!(r.tasks[0].progress, 0.0);
    }

    #[test]
    fn progress_gesture_never_cascades() {
        let mut r = chain();
        let before: Vec<f32> = r.bars.iter().map(|b| b.progress_width).collect();
        let g = begin(&r, GestureKind::Progress, 0, 100.0);
        g.update(130.0, &r.scale, &mut r.bars);
        for (bar, pw0) in r.bars.iter().zip(&before).skip(1) {
            assert_eq!(bar.progress_width, *pw0);
        }
    }

    #[test]
    fn invalid_tasks_move_but_commit_no_dates() {
        let mut r = rig(&[("a", "", "", "")], ViewMode::Day);
        let start0 = r.tasks[0].start;
        let x0 = r.bars[0].x;
        let g = begin(&r, GestureKind::Move, 0, 100.0);
        g.update(100.0 + 38.0, &r.scale, &mut r.bars);
        assert_eq!(r.bars[0].x, x0 + 38.0, "still draggable as a plain block");
        let events = g.finish(&r.scale, &mut r.tasks, &r.bars);
        assert!(events.is_empty());
        assert_eq!(r.tasks[0].start, start0);
    }

    #[test]
    fn a_bar_cannot_slide_left_of_its_dependency() {
        let mut r = chain();
        let x1 = r.bars[1].x;
        let g = begin(&r, GestureKind::Move, 1, 100.0);
        // try to drag t2 far left of t1
        g.update(100.0 - 38.0 * 20.0, &r.scale, &mut r.bars);
        assert_eq!(r.bars[1].x, x1, "blocked by the upstream bar");
        let events = g.finish(&r.scale, &mut r.tasks, &r.bars);
        assert!(events.iter().all(|e| !matches!(
            e,
            ChartEvent::DateChanged { id, .. } if id == "t2"
        )));
    }

    #[test]
    fn week_view_snaps_in_day_sized_steps() {
        let mut r = rig(
            &[
                ("t1", "2024-01-01", "2024-01-03", ""),
                ("t2", "2024-01-05", "2024-01-06", "t1"),
            ],
            ViewMode::Week,
        );
        let x0 = r.bars[0].x;
        let g = begin(&r, GestureKind::Move, 0, 100.0);
        // 25 px in week view snaps to one 20 px day
        g.update(125.0, &r.scale, &mut r.bars);
        assert_eq!(r.bars[0].x, x0 + 20.0);
        let events = g.finish(&r.scale, &mut r.tasks, &r.bars);
        match &events[0] {
            ChartEvent::DateChanged { start, .. } => {
                assert_eq!(*start, r.tasks[0].start);
                assert_eq!(start.date().to_string(), "2024-01-02");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
