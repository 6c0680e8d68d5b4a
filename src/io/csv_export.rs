use std::path::Path;

use crate::error::Result;
use crate::model::Task;

/// Export resolved tasks to a semicolon-delimited CSV file matching the
/// import format. Returns the number of tasks written.
pub fn export_csv(tasks: &[Task], path: &Path) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)?;

    wtr.write_record(["Id", "Name", "Start", "End", "Progress", "Dependencies"])?;

    for task in tasks {
        wtr.write_record([
            task.id.clone(),
            task.name.clone(),
            task.start.format("%Y-%m-%d %H:%M:%S").to_string(),
            task.end.format("%Y-%m-%d %H:%M:%S").to_string(),
            (task.progress.round() as i32).to_string(),
            task.dependencies.join(", "),
        ])?;
    }

    wtr.flush()?;
    Ok(tasks.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{resolve_tasks, RawTask};

    #[test]
    fn export_round_trips_through_import() {
        let raw = vec![
            RawTask {
                id: Some("a".into()),
                name: "Design".into(),
                start: Some("2025-01-06".into()),
                end: Some("2025-01-17".into()),
                progress: 80.0,
                ..Default::default()
            },
            RawTask {
                id: Some("b".into()),
                name: "Build".into(),
                start: Some("2025-01-20".into()),
                end: Some("2025-02-14".into()),
                dependencies: Some(crate::model::Dependencies::Csv("a".into())),
                ..Default::default()
            },
        ];
        let (tasks, _) = resolve_tasks(&raw);

        let path = std::env::temp_dir().join(format!(
            "ganttboard-export-test-{}.csv",
            uuid::Uuid::new_v4().simple()
        ));
        assert_eq!(export_csv(&tasks, &path).unwrap(), 2);

        let (reimported, skipped) = crate::io::csv_import::import_csv(&path).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(reimported.len(), 2);
        assert_eq!(reimported[0].id.as_deref(), Some("a"));
        assert_eq!(reimported[1].name, "Build");
        let (resolved, map) = resolve_tasks(&reimported);
        assert_eq!(resolved[1].dependencies, vec!["a"]);
        assert_eq!(map["a"], vec!["b"]);
    }
}
