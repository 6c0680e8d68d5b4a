use chrono::Duration;
use egui::{Color32, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};

use crate::app::ChartState;
use crate::config::{GanttConfig, PopupTrigger};
use crate::model::{Bar, ChartEvent, Gesture, GestureKind};
use crate::ui::theme;

/// Result details from interactions in the Gantt chart.
#[derive(Debug, Clone, Default)]
pub struct ChartInteraction {
    pub events: Vec<ChartEvent>,
}

/// Render the Gantt chart area (central panel) and feed pointer input into
/// the gesture engine.
pub fn show_gantt_chart(
    state: &mut ChartState,
    cfg: &GanttConfig,
    ui: &mut Ui,
) -> ChartInteraction {
    let mut interaction = ChartInteraction::default();
    let available = ui.available_size();
    let grid_width = state.scale.grid_width().max(available.x);
    let grid_height = cfg.grid_height(state.tasks.len()).max(available.y);

    egui::ScrollArea::both()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let (response, painter) = ui.allocate_painter(
                Vec2::new(grid_width, grid_height),
                Sense::click(),
            );
            let origin = response.rect.min;
            let mut consumed_click = false;

            painter.rect_filled(response.rect, 0.0, theme::BG_DARK);

            draw_rows(&painter, origin, state, cfg, grid_width);
            draw_today_highlight(&painter, origin, state, cfg, grid_height);
            draw_grid_lines(&painter, origin, state, cfg, grid_height);
            draw_header(&painter, origin, state, cfg, grid_width);

            // Arrows sit under the bars. The connections of the selected or
            // actively dragged bar are emphasized via its arrow annotations.
            let selected_index = state
                .gesture
                .as_ref()
                .map(|g| g.grabbed())
                .or_else(|| {
                    state
                        .selected
                        .as_ref()
                        .and_then(|id| state.index_of.get(id))
                        .copied()
                });
            let active_arrows: Vec<usize> = selected_index
                .map(|i| state.bars[i].arrows.clone())
                .unwrap_or_default();
            for (ai, arrow) in state.arrows.iter().enumerate() {
                let color = if active_arrows.contains(&ai) {
                    theme::ARROW_ACTIVE
                } else {
                    theme::ARROW
                };
                draw_arrow(
                    &painter,
                    origin,
                    &state.bars[arrow.from],
                    &state.bars[arrow.to],
                    cfg,
                    color,
                );
            }

            // Pointer actions are collected during the bar pass and applied
            // afterwards, so bar geometry is only mutated once per frame.
            let mut pending_begin: Option<(GestureKind, usize, f32)> = None;
            let mut drag_pointer_x: Option<f32> = None;
            let mut pointer_released = false;

            for index in 0..state.bars.len() {
                let bar = state.bars[index].clone();
                let task = &state.tasks[index];
                let is_selected = state.selected.as_deref() == Some(task.id.as_str());
                let color = task
                    .color
                    .unwrap_or_else(|| theme::task_color(index));

                let bar_rect = Rect::from_min_size(
                    Pos2::new(origin.x + bar.x, origin.y + bar.y),
                    Vec2::new(bar.width.max(2.0), bar.height),
                );
                draw_task_bar(&painter, &bar, bar_rect, task.name.as_str(), color, is_selected, cfg);

                let bar_response = ui.interact(
                    bar_rect,
                    ui.make_persistent_id(("task-bar", &task.id)),
                    Sense::click_and_drag(),
                );

                if bar_response.clicked() {
                    state.selected = Some(task.id.clone());
                    consumed_click = true;
                }
                if bar_response.drag_started() {
                    let px = pointer_x(&bar_response);
                    pending_begin = Some((GestureKind::Move, index, px));
                    state.selected = Some(task.id.clone());
                }
                if bar_response.dragged() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
                    drag_pointer_x = Some(pointer_x(&bar_response));
                }
                if bar_response.drag_stopped() {
                    pointer_released = true;
                }

                // Resize and progress handles; invalid tasks only move as
                // plain blocks.
                if !bar.invalid {
                    let left_rect = Rect::from_min_max(
                        Pos2::new(bar_rect.left() - theme::HANDLE_WIDTH * 0.5, bar_rect.top()),
                        Pos2::new(bar_rect.left() + theme::HANDLE_WIDTH * 0.5, bar_rect.bottom()),
                    );
                    let right_rect = Rect::from_min_max(
                        Pos2::new(bar_rect.right() - theme::HANDLE_WIDTH * 0.5, bar_rect.top()),
                        Pos2::new(bar_rect.right() + theme::HANDLE_WIDTH * 0.5, bar_rect.bottom()),
                    );
                    let progress_pos = Pos2::new(
                        bar_rect.left() + bar.progress_width,
                        bar_rect.bottom(),
                    );
                    let progress_rect = Rect::from_center_size(progress_pos, Vec2::splat(12.0));

                    let left_response = ui.interact(
                        left_rect.expand(4.0),
                        ui.make_persistent_id(("resize-left", &task.id)),
                        Sense::drag(),
                    );
                    let right_response = ui.interact(
                        right_rect.expand(4.0),
                        ui.make_persistent_id(("resize-right", &task.id)),
                        Sense::drag(),
                    );
                    let progress_response = ui.interact(
                        progress_rect,
                        ui.make_persistent_id(("progress", &task.id)),
                        Sense::drag(),
                    );

                    for (resp, kind) in [
                        (&left_response, GestureKind::ResizeLeft),
                        (&right_response, GestureKind::ResizeRight),
                        (&progress_response, GestureKind::Progress),
                    ] {
                        if resp.drag_started() {
                            pending_begin = Some((kind, index, pointer_x(resp)));
                            state.selected = Some(task.id.clone());
                        }
                        if resp.dragged() {
                            drag_pointer_x = Some(pointer_x(resp));
                        }
                        if resp.drag_stopped() {
                            pointer_released = true;
                        }
                    }

                    if left_response.hovered()
                        || right_response.hovered()
                        || left_response.dragged()
                        || right_response.dragged()
                    {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
                    }

                    if is_selected || bar_response.hovered() {
                        draw_handles(&painter, bar_rect, progress_pos);
                    }
                }

                let show_popup = match cfg.popup_trigger {
                    PopupTrigger::Hover => bar_response.hovered(),
                    PopupTrigger::Click => is_selected && !bar_response.dragged(),
                };
                if show_popup {
                    show_task_popup(ui, &bar_rect, state, index, cfg);
                }
            }

            // One gesture at a time: a pointer-down while another gesture is
            // active is ignored.
            if let Some((kind, index, px)) = pending_begin {
                if state.gesture.is_none() {
                    state.gesture = Some(Gesture::begin(
                        kind,
                        index,
                        px,
                        &state.tasks,
                        &state.bars,
                        &state.dependency_map,
                        &state.index_of,
                    ));
                }
            }
            if let Some(px) = drag_pointer_x {
                if let Some(gesture) = &state.gesture {
                    gesture.update(px, &state.scale, &mut state.bars);
                    ui.ctx().set_cursor_icon(match gesture.kind() {
                        GestureKind::Move => egui::CursorIcon::Grabbing,
                        _ => egui::CursorIcon::ResizeHorizontal,
                    });
                }
            }
            if pointer_released {
                if let Some(gesture) = state.gesture.take() {
                    let events =
                        gesture.finish(&state.scale, &mut state.tasks, &state.bars);
                    if !events.is_empty() {
                        state.relayout(cfg);
                    }
                    interaction.events.extend(events);
                }
            }

            if response.clicked() && !consumed_click {
                state.selected = None;
            }
        });

    interaction
}

fn pointer_x(response: &egui::Response) -> f32 {
    response
        .interact_pointer_pos()
        .map(|p| p.x)
        .unwrap_or(0.0)
}

fn draw_rows(
    painter: &egui::Painter,
    origin: Pos2,
    state: &ChartState,
    cfg: &GanttConfig,
    width: f32,
) {
    for i in 0..state.tasks.len() {
        let y = origin.y + cfg.header_height + cfg.padding / 2.0 + i as f32 * cfg.row_height();
        if i % 2 == 0 {
            painter.rect_filled(
                Rect::from_min_size(
                    Pos2::new(origin.x, y),
                    Vec2::new(width, cfg.row_height()),
                ),
                0.0,
                theme::BG_ROW_EVEN,
            );
        }
    }
}

fn draw_today_highlight(
    painter: &egui::Painter,
    origin: Pos2,
    state: &ChartState,
    cfg: &GanttConfig,
    height: f32,
) {
    if let Some(x) = state.scale.today_x() {
        painter.rect_filled(
            Rect::from_min_size(
                Pos2::new(origin.x + x, origin.y + cfg.header_height),
                Vec2::new(state.scale.column_width, height - cfg.header_height),
            ),
            0.0,
            theme::TODAY_HIGHLIGHT,
        );
    }
}

fn draw_grid_lines(
    painter: &egui::Painter,
    origin: Pos2,
    state: &ChartState,
    cfg: &GanttConfig,
    height: f32,
) {
    for tick in state.scale.ticks() {
        let x = origin.x + tick.x;
        let (stroke_width, color) = if tick.thick {
            (1.2, theme::GRID_LINE_THICK)
        } else {
            (0.5, theme::GRID_LINE)
        };
        painter.line_segment(
            [
                Pos2::new(x, origin.y + cfg.header_height),
                Pos2::new(x, origin.y + height),
            ],
            Stroke::new(stroke_width, color),
        );
    }
}

fn draw_header(
    painter: &egui::Painter,
    origin: Pos2,
    state: &ChartState,
    cfg: &GanttConfig,
    width: f32,
) {
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, cfg.header_height)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + cfg.header_height),
            Pos2::new(origin.x + width, origin.y + cfg.header_height),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    for label in state.scale.header_labels() {
        let (y, font, color) = if label.upper {
            (origin.y + 14.0, theme::font_header(), theme::TEXT_PRIMARY)
        } else {
            (
                origin.y + cfg.header_height - 14.0,
                theme::font_sub(),
                theme::TEXT_SECONDARY,
            )
        };
        painter.text(
            Pos2::new(origin.x + label.x, y),
            egui::Align2::CENTER_CENTER,
            label.text,
            font,
            color,
        );
    }
}

fn draw_task_bar(
    painter: &egui::Painter,
    bar: &Bar,
    bar_rect: Rect,
    name: &str,
    color: Color32,
    is_selected: bool,
    cfg: &GanttConfig,
) {
    let rounding = Rounding::same(cfg.bar_corner_radius);

    if bar.invalid {
        painter.rect_filled(bar_rect, rounding, theme::INVALID_BAR);
        painter.rect_stroke(
            bar_rect,
            rounding,
            Stroke::new(1.0, theme::INVALID_BAR_STROKE),
        );
    } else {
        painter.rect_filled(bar_rect, rounding, color);
        if bar.progress_width > 0.0 {
            let progress_rect = Rect::from_min_size(
                bar_rect.min,
                Vec2::new(bar.progress_width.min(bar.width), bar_rect.height()),
            );
            painter.rect_filled(progress_rect, rounding, theme::PROGRESS_OVERLAY);
            if bar.progress_width < bar.width - 1.0 {
                let tick_x = bar_rect.left() + bar.progress_width;
                painter.line_segment(
                    [
                        Pos2::new(tick_x, bar_rect.top() + 2.0),
                        Pos2::new(tick_x, bar_rect.bottom() - 2.0),
                    ],
                    Stroke::new(1.0, Color32::from_white_alpha(60)),
                );
            }
        }
    }

    if is_selected {
        painter.rect_stroke(
            bar_rect.expand(1.5),
            Rounding::same(cfg.bar_corner_radius + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    if bar_rect.width() > 30.0 {
        let galley = painter.layout_no_wrap(
            name.to_string(),
            theme::font_bar(),
            theme::TEXT_ON_BAR,
        );
        let clipped = painter.with_clip_rect(bar_rect);
        clipped.galley(
            Pos2::new(
                bar_rect.left() + 6.0,
                bar_rect.center().y - galley.size().y / 2.0,
            ),
            galley,
            Color32::TRANSPARENT,
        );
    }
}

fn draw_handles(painter: &egui::Painter, bar_rect: Rect, progress_pos: Pos2) {
    let handle_h = bar_rect.height() * 0.55;
    let handle_y = bar_rect.center().y - handle_h / 2.0;
    let lh = Rect::from_min_size(
        Pos2::new(bar_rect.left() - 1.5, handle_y),
        Vec2::new(4.0, handle_h),
    );
    let rh = Rect::from_min_size(
        Pos2::new(bar_rect.right() - 2.5, handle_y),
        Vec2::new(4.0, handle_h),
    );
    painter.rect_filled(lh, Rounding::same(2.0), theme::HANDLE_COLOR);
    painter.rect_filled(rh, Rounding::same(2.0), theme::HANDLE_COLOR);

    // progress grip: a small triangle hanging off the fill edge
    let tip = progress_pos;
    painter.add(egui::Shape::convex_polygon(
        vec![
            Pos2::new(tip.x - 4.0, tip.y + 6.0),
            Pos2::new(tip.x + 4.0, tip.y + 6.0),
            Pos2::new(tip.x, tip.y),
        ],
        theme::HANDLE_COLOR,
        Stroke::NONE,
    ));
}

/// Route an arrow from the upstream bar down (or up) and across to the left
/// edge of the dependent bar.
fn draw_arrow(
    painter: &egui::Painter,
    origin: Pos2,
    from: &Bar,
    to: &Bar,
    cfg: &GanttConfig,
    color: Color32,
) {
    let mut start_x = from.x + from.width / 2.0;
    // walk the exit point left until the dependent bar is clear of it
    while to.x < start_x + cfg.padding && start_x > from.x + cfg.padding {
        start_x -= 10.0;
    }
    let from_is_below = from.y > to.y;
    let start_y = if from_is_below { from.y } else { from.y + from.height };
    let end_x = to.x - cfg.padding / 2.0;
    let end_y = to.y + to.height / 2.0;

    let curve = cfg.arrow_curve;
    let dir = if from_is_below { -1.0 } else { 1.0 };
    let mut points = vec![
        Pos2::new(origin.x + start_x, origin.y + start_y),
        Pos2::new(origin.x + start_x, origin.y + end_y - dir * curve),
        Pos2::new(origin.x + start_x + curve, origin.y + end_y),
    ];
    if end_x > start_x + curve {
        points.push(Pos2::new(origin.x + end_x, origin.y + end_y));
    }
    painter.add(egui::Shape::line(points, Stroke::new(1.4, color)));

    let tip = Pos2::new(origin.x + end_x + 1.0, origin.y + end_y);
    painter.add(egui::Shape::convex_polygon(
        vec![
            tip,
            Pos2::new(tip.x - 6.0, tip.y - 4.0),
            Pos2::new(tip.x - 6.0, tip.y + 4.0),
        ],
        color,
        Stroke::NONE,
    ));
}

fn show_task_popup(
    ui: &Ui,
    bar_rect: &Rect,
    state: &ChartState,
    index: usize,
    cfg: &GanttConfig,
) {
    let task = &state.tasks[index];
    let fmt = cfg.date_format.as_str();
    // resolved ends are exclusive; show the last covered instant
    let display_end = task.end - Duration::seconds(1);
    egui::show_tooltip_at(
        ui.ctx(),
        ui.layer_id(),
        egui::Id::new(("task-popup", &task.id)),
        Pos2::new(bar_rect.left(), bar_rect.bottom() + 8.0),
        |ui| {
            ui.strong(&task.name);
            ui.label(format!(
                "{} — {}",
                task.start.format(fmt),
                display_end.format(fmt),
            ));
            ui.label(format!(
                "{:.0} days · {}% done",
                task.duration_hours() / 24.0,
                task.progress.round() as i32
            ));
            if task.invalid {
                ui.label(
                    egui::RichText::new("Dates could not be parsed")
                        .color(theme::TEXT_DIM)
                        .italics(),
                );
            }
            if !task.dependencies.is_empty() {
                ui.label(
                    egui::RichText::new(format!(
                        "After: {}",
                        task.dependencies.join(", ")
                    ))
                    .color(theme::TEXT_SECONDARY)
                    .font(theme::font_small()),
                );
            }
        },
    );
}
