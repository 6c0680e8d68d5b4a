pub mod bar;
pub mod gesture;
pub mod task;
pub mod timeline;

pub use bar::{layout_bars, map_arrows, Arrow, Bar};
pub use gesture::{dependent_closure, ChartEvent, Gesture, GestureKind};
pub use task::{resolve_tasks, Dependencies, DependencyMap, RawTask, Task};
pub use timeline::{GridTick, HeaderLabel, TimeScale, ViewMode};
