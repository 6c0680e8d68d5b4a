use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate};

use crate::config::GanttConfig;
use crate::io;
use crate::model::{
    layout_bars, map_arrows, resolve_tasks, Arrow, Bar, ChartEvent, DependencyMap, Gesture,
    RawTask, Task, TimeScale, ViewMode,
};
use crate::ui;

/// Everything the layout and interaction engine owns. Rebuilt wholesale on
/// every refresh or view-mode change; the gesture mutates bar geometry in
/// between.
pub struct ChartState {
    pub tasks: Vec<Task>,
    pub dependency_map: DependencyMap,
    pub index_of: HashMap<String, usize>,
    pub scale: TimeScale,
    pub bars: Vec<Bar>,
    pub arrows: Vec<Arrow>,
    pub gesture: Option<Gesture>,
    pub selected: Option<String>,
}

impl ChartState {
    pub fn new(raw_tasks: &[RawTask], cfg: &GanttConfig) -> Self {
        let (tasks, dependency_map) = resolve_tasks(raw_tasks);
        let index_of = tasks.iter().map(|t| (t.id.clone(), t.index)).collect();
        let scale = TimeScale::compute(&tasks, cfg.view_mode);
        let mut state = ChartState {
            tasks,
            dependency_map,
            index_of,
            scale,
            bars: Vec::new(),
            arrows: Vec::new(),
            gesture: None,
            selected: None,
        };
        state.relayout(cfg);
        state
    }

    /// Full re-resolution and re-layout from a new raw task array. The
    /// selection survives when the id still exists.
    pub fn refresh(&mut self, raw_tasks: &[RawTask], cfg: &GanttConfig) {
        let selected = self.selected.take();
        *self = ChartState::new(raw_tasks, cfg);
        self.selected = selected.filter(|id| self.index_of.contains_key(id));
    }

    /// Re-derive the scale and geometry for a new granularity without
    /// touching task data.
    pub fn set_view_mode(&mut self, mode: ViewMode, cfg: &GanttConfig) {
        self.gesture = None;
        self.scale = TimeScale::compute(&self.tasks, mode);
        self.relayout(cfg);
    }

    /// Recompute bars and arrows from the current tasks and scale.
    pub fn relayout(&mut self, cfg: &GanttConfig) {
        self.bars = layout_bars(&self.tasks, &self.scale, cfg);
        self.arrows = map_arrows(&self.tasks, &mut self.bars, &self.index_of);
    }
}

/// Main application state.
pub struct GanttApp {
    pub raw_tasks: Vec<RawTask>,
    pub config: GanttConfig,
    pub chart: ChartState,
    pub file_path: Option<PathBuf>,

    // Dialog state
    pub show_add_task: bool,
    pub show_about: bool,
    pub show_csv_help: bool,
    pub new_task_name: String,
    pub new_task_start: NaiveDate,
    pub new_task_end: NaiveDate,
    pub new_task_progress: f32,
    pub new_task_dependencies: String,

    pub status_message: String,
}

impl GanttApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        let mut config = GanttConfig::default();
        let prefs = io::prefs::load();
        if let Some(name) = prefs.view_mode.as_deref() {
            match ViewMode::from_name(name) {
                Ok(mode) => config.view_mode = mode,
                Err(e) => {
                    tracing::warn!(%e, "ignoring preferred view mode");
                }
            }
        }

        let raw_tasks = Self::sample_tasks();
        let chart = ChartState::new(&raw_tasks, &config);
        let today = chrono::Local::now().date_naive();

        Self {
            raw_tasks,
            config,
            chart,
            file_path: None,
            show_add_task: false,
            show_about: false,
            show_csv_help: false,
            new_task_name: String::new(),
            new_task_start: today,
            new_task_end: today + Duration::days(7),
            new_task_progress: 0.0,
            new_task_dependencies: String::new(),
            status_message: "Ready".to_string(),
        }
    }

    /// A demonstration project exercising dependencies, partial dates, and
    /// custom colors.
    fn sample_tasks() -> Vec<RawTask> {
        let today = chrono::Local::now().date_naive();
        let day = |offset: i64| (today + Duration::days(offset)).format("%Y-%m-%d").to_string();
        let task = |id: &str, name: &str, start: i64, end: i64, progress: f32, deps: &str| {
            RawTask {
                id: Some(id.to_string()),
                name: name.to_string(),
                start: Some(day(start)),
                end: Some(day(end)),
                progress,
                dependencies: (!deps.is_empty())
                    .then(|| crate::model::Dependencies::Csv(deps.to_string())),
                color: None,
            }
        };

        let mut tasks = vec![
            task("kickoff", "Project Kickoff", -5, -3, 100.0, ""),
            task("requirements", "Requirements Gathering", -2, 5, 60.0, "kickoff"),
            task("design", "UI Design", 6, 18, 10.0, "requirements"),
            task("backend", "Backend Development", 6, 28, 0.0, "requirements"),
            task("integration", "Integration", 29, 34, 0.0, "design, backend"),
            task("qa", "Testing & QA", 35, 42, 0.0, "integration"),
        ];
        tasks[2].color = Some("#ab47bc".to_string());
        // start-only: the resolver gives it a default two-day span
        tasks.push(RawTask {
            id: Some("launch-prep".to_string()),
            name: "Launch Prep".to_string(),
            start: Some(day(43)),
            end: None,
            progress: 0.0,
            dependencies: Some(crate::model::Dependencies::Csv("qa".to_string())),
            color: None,
        });
        tasks.push(RawTask {
            id: Some("retro".to_string()),
            name: "Retrospective".to_string(),
            start: Some("sometime next quarter".to_string()),
            end: None,
            progress: 0.0,
            dependencies: None,
            color: None,
        });
        tasks
    }

    // --- Public operations ---

    /// Full re-resolution and re-render from a new task array.
    pub fn refresh(&mut self, new_tasks: Vec<RawTask>) {
        self.raw_tasks = new_tasks;
        self.chart.refresh(&self.raw_tasks, &self.config);
    }

    /// Switch granularity without discarding task data. Modes outside the
    /// allowed set are ignored with a warning; layout never crashes.
    pub fn change_view_mode(&mut self, mode: ViewMode) {
        if !self.config.view_modes.contains(&mode) {
            tracing::warn!(mode = mode.label(), "view mode not in the allowed set");
            self.status_message = format!("View mode '{}' is not enabled", mode.label());
            return;
        }
        self.config.view_mode = mode;
        self.chart.set_view_mode(mode, &self.config);
        io::prefs::save(&io::prefs::UiPrefs {
            view_mode: Some(mode.label().to_string()),
        });
        self.handle_events(vec![ChartEvent::ViewModeChanged(mode)]);
    }

    /// Surface committed chart changes in the status bar and the log, and
    /// write them back into the raw task list so saves reflect them.
    fn handle_events(&mut self, events: Vec<ChartEvent>) {
        let fmt = self.config.date_format.clone();
        for event in events {
            match event {
                ChartEvent::ViewModeChanged(mode) => {
                    tracing::info!(mode = mode.label(), "view mode changed");
                    self.status_message = format!("View: {}", mode.label());
                }
                ChartEvent::DateChanged { id, start, end } => {
                    if let Some(&i) = self.chart.index_of.get(&id) {
                        self.raw_tasks[i].start =
                            Some(start.format("%Y-%m-%d %H:%M:%S").to_string());
                        self.raw_tasks[i].end =
                            Some(end.format("%Y-%m-%d %H:%M:%S").to_string());
                    }
                    let name = self.task_name(&id);
                    self.status_message = format!(
                        "Updated '{}' ({} → {})",
                        name,
                        start.format(&fmt),
                        end.format(&fmt)
                    );
                }
                ChartEvent::ProgressChanged { id, progress } => {
                    if let Some(&i) = self.chart.index_of.get(&id) {
                        self.raw_tasks[i].progress = progress;
                    }
                    let name = self.task_name(&id);
                    self.status_message =
                        format!("Progress of '{}' set to {}%", name, progress.round() as i32);
                }
            }
        }
    }

    fn task_name(&self, id: &str) -> String {
        self.chart
            .index_of
            .get(id)
            .map(|&i| self.chart.tasks[i].name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    // --- File operations ---

    pub fn new_project(&mut self) {
        self.refresh(Vec::new());
        self.file_path = None;
        self.status_message = "New project created".to_string();
    }

    pub fn open_project(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Gantt Project", &["gantt.json", "json"])
            .pick_file()
        {
            match io::load_project(&path) {
                Ok(tasks) => {
                    self.refresh(tasks);
                    self.file_path = Some(path);
                    self.status_message = "Project loaded".to_string();
                }
                Err(e) => {
                    self.status_message = format!("Error loading: {}", e);
                }
            }
        }
    }

    pub fn save_project(&mut self) {
        if let Some(path) = self.file_path.clone() {
            match io::save_project(&self.raw_tasks, &path) {
                Ok(()) => self.status_message = "Project saved".to_string(),
                Err(e) => self.status_message = format!("Error saving: {}", e),
            }
        } else {
            self.save_project_as();
        }
    }

    pub fn save_project_as(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Gantt Project", &["gantt.json", "json"])
            .set_file_name("project.gantt.json")
            .save_file()
        {
            self.file_path = Some(path.clone());
            match io::save_project(&self.raw_tasks, &path) {
                Ok(()) => self.status_message = "Project saved".to_string(),
                Err(e) => self.status_message = format!("Error saving: {}", e),
            }
        }
    }

    pub fn import_csv(&mut self) {
        if !self.raw_tasks.is_empty() {
            let confirm = rfd::MessageDialog::new()
                .set_title("Import CSV")
                .set_description("This will replace the current project. Continue?")
                .set_buttons(rfd::MessageButtons::YesNo)
                .show();
            if confirm != rfd::MessageDialogResult::Yes {
                return;
            }
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv", "txt"])
            .pick_file()
        {
            match io::csv_import::import_csv(&path) {
                Ok((tasks, skipped)) => {
                    let count = tasks.len();
                    self.refresh(tasks);
                    self.file_path = None;
                    self.status_message = if skipped > 0 {
                        format!("Imported {} tasks ({} rows skipped)", count, skipped)
                    } else {
                        format!("Imported {} tasks", count)
                    };
                }
                Err(e) => {
                    self.status_message = format!("CSV import failed: {}", e);
                }
            }
        }
    }

    pub fn export_csv(&mut self) {
        if self.chart.tasks.is_empty() {
            self.status_message = "Nothing to export — project has no tasks".to_string();
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name("project.csv")
            .save_file()
        {
            match io::csv_export::export_csv(&self.chart.tasks, &path) {
                Ok(count) => {
                    self.status_message = format!("Exported {} tasks to CSV", count);
                }
                Err(e) => {
                    self.status_message = format!("CSV export failed: {}", e);
                }
            }
        }
    }

    // --- Task operations ---

    pub fn create_task_from_dialog(&mut self) {
        let name = if self.new_task_name.is_empty() {
            "New Task".to_string()
        } else {
            self.new_task_name.clone()
        };
        let end = self.new_task_end.max(self.new_task_start);

        let task = RawTask {
            id: None,
            name,
            start: Some(self.new_task_start.format("%Y-%m-%d").to_string()),
            end: Some(end.format("%Y-%m-%d").to_string()),
            progress: self.new_task_progress,
            dependencies: (!self.new_task_dependencies.trim().is_empty())
                .then(|| crate::model::Dependencies::Csv(self.new_task_dependencies.clone())),
            color: None,
        };

        let mut tasks = self.raw_tasks.clone();
        tasks.push(task);
        self.refresh(tasks);
        self.reset_dialog_fields();
        self.status_message = "Task added".to_string();
    }

    pub fn delete_task(&mut self, id: &str) {
        let Some(&index) = self.chart.index_of.get(id) else {
            return;
        };
        let mut tasks = self.raw_tasks.clone();
        tasks.remove(index);
        self.refresh(tasks);
        self.status_message = "Task deleted".to_string();
    }

    fn reset_dialog_fields(&mut self) {
        let today = chrono::Local::now().date_naive();
        self.new_task_name = String::new();
        self.new_task_start = today;
        self.new_task_end = today + Duration::days(7);
        self.new_task_progress = 0.0;
        self.new_task_dependencies = String::new();
    }
}


impl eframe::App for GanttApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::theme::apply_theme(ctx);

        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::S)) {
            self.save_project();
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .font(ui::theme::font_status())
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!("Tasks: {}", self.chart.tasks.len()))
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                        ui.label(
                            egui::RichText::new(" · ")
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                        ui.label(
                            egui::RichText::new(self.config.view_mode.label())
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        let mut task_action = ui::task_table::TaskTableAction::None;
        egui::SidePanel::left("task_panel")
            .default_width(ui::theme::SIDE_PANEL_WIDTH)
            .min_width(220.0)
            .resizable(true)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_PANEL)
                    .inner_margin(egui::Margin::same(8.0))
                    .stroke(egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE)),
            )
            .show(ctx, |ui| {
                task_action = ui::task_table::show_task_table(
                    &self.chart.tasks,
                    self.chart.selected.as_deref(),
                    &self.config,
                    ui,
                );
            });

        match task_action {
            ui::task_table::TaskTableAction::Select(id) => {
                self.chart.selected = Some(id);
            }
            ui::task_table::TaskTableAction::Delete(id) => {
                self.delete_task(&id);
            }
            ui::task_table::TaskTableAction::Add => {
                self.show_add_task = true;
            }
            ui::task_table::TaskTableAction::None => {}
        }

        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        egui::CentralPanel::default().frame(chart_frame).show(ctx, |ui| {
            let interaction =
                ui::gantt_chart::show_gantt_chart(&mut self.chart, &self.config, ui);
            if !interaction.events.is_empty() {
                self.handle_events(interaction.events);
            }
        });

        if self.show_add_task {
            ui::dialogs::show_add_task_dialog(self, ctx);
        }
        if self.show_about {
            ui::dialogs::show_about_dialog(self, ctx);
        }
        if self.show_csv_help {
            ui::dialogs::show_csv_help_dialog(self, ctx);
        }
    }
}
