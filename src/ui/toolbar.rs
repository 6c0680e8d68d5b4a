use egui::{menu, RichText, Ui};

use crate::app::GanttApp;
use crate::ui::theme;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut GanttApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_menu()), |ui| {
            if ui.button("  New Project").clicked() {
                app.new_project();
                ui.close_menu();
            }
            if ui.button("  Open...").clicked() {
                app.open_project();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Save          Ctrl+S").clicked() {
                app.save_project();
                ui.close_menu();
            }
            if ui.button("  Save As...").clicked() {
                app.save_project_as();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Import CSV...").clicked() {
                app.import_csv();
                ui.close_menu();
            }
            if ui.button("  Export CSV...").clicked() {
                app.export_csv();
                ui.close_menu();
            }
            if ui.button("  CSV Format Help").clicked() {
                app.show_csv_help = true;
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            ui.label(RichText::new("Timeline Scale").small().weak());
            let active = app.config.view_mode;
            for mode in app.config.view_modes.clone() {
                if ui.radio(active == mode, mode.label()).clicked() {
                    app.change_view_mode(mode);
                    ui.close_menu();
                }
            }
            ui.separator();
            ui.label(RichText::new("Popup").small().weak());
            let mut trigger = app.config.popup_trigger;
            if ui
                .radio_value(&mut trigger, crate::config::PopupTrigger::Click, "On click")
                .clicked()
                || ui
                    .radio_value(&mut trigger, crate::config::PopupTrigger::Hover, "On hover")
                    .clicked()
            {
                app.config.popup_trigger = trigger;
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  Help  ").font(theme::font_menu()), |ui| {
            if ui.button("About").clicked() {
                app.show_about = true;
                ui.close_menu();
            }
            if ui.button("Open Config Folder").clicked() {
                if let Some(dir) = crate::io::prefs::config_dir() {
                    let _ = open::that(&dir);
                }
                ui.close_menu();
            }
        });

        // Right-aligned project name and active scale
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let name = app
                .file_path
                .as_ref()
                .and_then(|p| p.file_name())
                .and_then(|s| s.to_str())
                .unwrap_or("Untitled (unsaved)");
            ui.label(RichText::new(name).size(11.0).weak());
            ui.label(
                RichText::new(format!("{} · ", app.config.view_mode.label()))
                    .size(11.0)
                    .weak(),
            );
        });
    });
}
