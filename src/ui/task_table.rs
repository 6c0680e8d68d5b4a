use egui::{Color32, RichText, Ui};

use crate::config::GanttConfig;
use crate::model::Task;
use crate::ui::theme;

/// Actions that the task table can request.
pub enum TaskTableAction {
    None,
    Select(String),
    Delete(String),
    Add,
}

/// Render the left-side task list panel.
pub fn show_task_table(
    tasks: &[Task],
    selected: Option<&str>,
    cfg: &GanttConfig,
    ui: &mut Ui,
) -> TaskTableAction {
    let mut action = TaskTableAction::None;

    ui.add_space(2.0);
    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Tasks")
                .strong()
                .size(15.0)
                .color(theme::TEXT_PRIMARY),
        );
        ui.add_space(4.0);
        ui.label(
            RichText::new(format!("({})", tasks.len()))
                .size(11.0)
                .color(theme::TEXT_DIM),
        );
    });
    ui.add_space(4.0);

    let btn = egui::Button::new(
        RichText::new(format!("{}  Add Task", egui_phosphor::regular::PLUS))
            .color(Color32::WHITE)
            .size(12.0),
    )
    .fill(theme::ACCENT)
    .rounding(egui::Rounding::same(5.0));
    if ui.add_sized([ui.available_width(), 30.0], btn).clicked() {
        action = TaskTableAction::Add;
    }

    ui.add_space(6.0);
    ui.separator();
    ui.add_space(2.0);

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for (i, task) in tasks.iter().enumerate() {
                let is_selected = selected == Some(task.id.as_str());
                let row_bg = if is_selected {
                    theme::BG_SELECTED
                } else if i % 2 == 0 {
                    theme::BG_PANEL
                } else {
                    theme::BG_DARK
                };

                let frame = egui::Frame {
                    fill: row_bg,
                    rounding: egui::Rounding::same(4.0),
                    inner_margin: egui::Margin::symmetric(6.0, 4.0),
                    outer_margin: egui::Margin::ZERO,
                    stroke: egui::Stroke::NONE,
                    shadow: egui::epaint::Shadow::NONE,
                };

                let frame_resp = frame.show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.spacing_mut().item_spacing.x = 6.0;

                        let (dot_rect, _) =
                            ui.allocate_exact_size(egui::vec2(6.0, 6.0), egui::Sense::hover());
                        let color = task.color.unwrap_or_else(|| theme::task_color(i));
                        ui.painter().circle_filled(dot_rect.center(), 3.0, color);

                        let name_text =
                            RichText::new(&task.name).size(12.0).color(if is_selected {
                                Color32::WHITE
                            } else {
                                theme::TEXT_PRIMARY
                            });
                        ui.add(egui::Label::new(name_text).truncate());
                        if task.invalid {
                            ui.label(
                                RichText::new(egui_phosphor::regular::WARNING)
                                    .size(10.0)
                                    .color(theme::TEXT_DIM),
                            )
                            .on_hover_text("Dates could not be parsed");
                        }

                        ui.with_layout(
                            egui::Layout::right_to_left(egui::Align::Center),
                            |ui| {
                                ui.spacing_mut().item_spacing.x = 4.0;

                                let del_btn = ui.add(
                                    egui::Button::new(
                                        RichText::new(egui_phosphor::regular::X)
                                            .size(10.0)
                                            .color(theme::TEXT_DIM),
                                    )
                                    .frame(false),
                                );
                                if del_btn.on_hover_text("Delete task").clicked() {
                                    action = TaskTableAction::Delete(task.id.clone());
                                }

                                let pbar = egui::ProgressBar::new(
                                    (task.progress / 100.0).clamp(0.0, 1.0),
                                )
                                .desired_width(48.0)
                                .fill(color)
                                .rounding(egui::Rounding::same(3.0));
                                ui.add(pbar);

                                ui.label(
                                    RichText::new(
                                        task.end.format(&cfg.date_format).to_string(),
                                    )
                                    .size(10.0)
                                    .color(theme::TEXT_SECONDARY),
                                );
                                ui.label(
                                    RichText::new("→").size(9.0).color(theme::TEXT_DIM),
                                );
                                ui.label(
                                    RichText::new(
                                        task.start.format(&cfg.date_format).to_string(),
                                    )
                                    .size(10.0)
                                    .color(theme::TEXT_SECONDARY),
                                );
                            },
                        );
                    });
                });

                let row_rect = frame_resp.response.rect;
                let row_click = ui.interact(
                    row_rect,
                    egui::Id::new(("task-row", &task.id)),
                    egui::Sense::click(),
                );
                if row_click.clicked() {
                    action = TaskTableAction::Select(task.id.clone());
                }

                ui.add_space(1.0);
            }
        });

    action
}
