use crate::model::ViewMode;

/// What opens a task's detail popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupTrigger {
    Click,
    Hover,
}

/// Chart configuration. Defaults match the classic rendering; column width
/// and step are owned by the active view mode's closed table.
#[derive(Debug, Clone)]
pub struct GanttConfig {
    pub header_height: f32,
    pub bar_height: f32,
    pub bar_corner_radius: f32,
    pub arrow_curve: f32,
    pub padding: f32,
    pub view_mode: ViewMode,
    pub view_modes: Vec<ViewMode>,
    /// chrono pattern used for dates in popups and the status bar.
    pub date_format: String,
    pub popup_trigger: PopupTrigger,
}

impl Default for GanttConfig {
    fn default() -> Self {
        Self {
            header_height: 50.0,
            bar_height: 20.0,
            bar_corner_radius: 3.0,
            arrow_curve: 5.0,
            padding: 18.0,
            view_mode: ViewMode::Day,
            view_modes: ViewMode::ALL.to_vec(),
            date_format: "%Y-%m-%d".to_string(),
            popup_trigger: PopupTrigger::Click,
        }
    }
}

impl GanttConfig {
    /// Vertical extent of one task row.
    pub fn row_height(&self) -> f32 {
        self.bar_height + self.padding
    }

    /// Total grid height for a number of task rows.
    pub fn grid_height(&self, rows: usize) -> f32 {
        self.header_height + self.padding + rows as f32 * self.row_height()
    }
}
