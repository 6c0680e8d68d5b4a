use std::path::Path;

use crate::error::{GanttError, Result};
use crate::model::{Dependencies, RawTask};

/// Detect delimiter by checking the first line for common separators.
fn detect_delimiter(first_line: &str) -> u8 {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    let tabs = first_line.matches('\t').count();

    if semicolons >= commas && semicolons >= tabs {
        b';'
    } else if tabs >= commas {
        b'\t'
    } else {
        b','
    }
}

/// Normalize a header string to a canonical column key.
fn normalize_header(h: &str) -> String {
    h.trim().to_lowercase().replace([' ', '-', '_'], "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Id,
    Name,
    Start,
    End,
    Progress,
    Dependencies,
    Color,
}

fn header_to_col(normalized: &str) -> Option<Column> {
    match normalized {
        "id" | "taskid" | "key" => Some(Column::Id),

        "name" | "task" | "taskname" | "label" | "title" => Some(Column::Name),

        "start" | "startdate" | "from" | "begin" => Some(Column::Start),

        "end" | "enddate" | "to" | "finish" | "due" => Some(Column::End),

        "progress" | "done" | "percent" => Some(Column::Progress),

        "dependencies" | "dependson" | "after" => Some(Column::Dependencies),

        "color" | "colour" => Some(Column::Color),

        _ => None,
    }
}

/// Import raw tasks from a CSV file.
///
/// Auto-detects delimiter (comma, semicolon, tab) and matches column headers
/// flexibly. Dates are kept as raw strings; the resolver repairs missing or
/// unparseable values, so only rows without a name are skipped.
/// Returns `(tasks, skipped_count)`.
pub fn import_csv(path: &Path) -> Result<(Vec<RawTask>, usize)> {
    let content = std::fs::read_to_string(path)?;

    let first_line = content.lines().next().unwrap_or("");
    let delimiter = detect_delimiter(first_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let col_map: Vec<Option<Column>> = headers
        .iter()
        .map(|h| header_to_col(&normalize_header(h)))
        .collect();

    if !col_map.contains(&Some(Column::Name)) {
        let found: Vec<&str> = headers.iter().collect();
        return Err(GanttError::Import(format!(
            "CSV is missing a task name column. Found headers: {:?}",
            found
        )));
    }

    let mut tasks: Vec<RawTask> = Vec::new();
    let mut skipped = 0usize;

    for (i, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(row = i + 2, error = %e, "skipping malformed CSV row");
                skipped += 1;
                continue;
            }
        };

        let mut task = RawTask::default();
        for (col_idx, field) in record.iter().enumerate() {
            let field = field.trim();
            if field.is_empty() {
                continue;
            }
            match col_map.get(col_idx).copied().flatten() {
                Some(Column::Id) => task.id = Some(field.to_string()),
                Some(Column::Name) => task.name = field.to_string(),
                Some(Column::Start) => task.start = Some(field.to_string()),
                Some(Column::End) => task.end = Some(field.to_string()),
                Some(Column::Progress) => {
                    task.progress = field.trim_end_matches('%').parse().unwrap_or(0.0);
                }
                Some(Column::Dependencies) => {
                    task.dependencies = Some(Dependencies::Csv(field.to_string()));
                }
                Some(Column::Color) => task.color = Some(field.to_string()),
                None => {}
            }
        }

        if task.name.is_empty() {
            skipped += 1;
            continue;
        }
        tasks.push(task);
    }

    if tasks.is_empty() {
        return Err(GanttError::Import(if skipped > 0 {
            format!("No valid tasks found in CSV ({} rows skipped)", skipped)
        } else {
            "CSV file is empty or has no data rows".to_string()
        }));
    }

    Ok((tasks, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn import_str(content: &str) -> Result<(Vec<RawTask>, usize)> {
        let mut file = tempfile_path();
        write!(file.1, "{content}").unwrap();
        import_csv(&file.0)
    }

    fn tempfile_path() -> (std::path::PathBuf, std::fs::File) {
        let dir = std::env::temp_dir();
        let path = dir.join(format!(
            "ganttboard-csv-test-{}.csv",
            uuid::Uuid::new_v4().simple()
        ));
        let file = std::fs::File::create(&path).unwrap();
        (path, file)
    }

    #[test]
    fn imports_raw_tasks_with_dependencies() {
        let (tasks, skipped) = import_str(
            "Id;Name;Start;End;Progress;Dependencies\n\
             a;Design;2025-01-06;2025-01-17;80;\n\
             b;Build;2025-01-20;2025-02-14;30%;a\n",
        )
        .unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id.as_deref(), Some("a"));
        assert_eq!(tasks[1].progress, 30.0);
        assert!(matches!(
            tasks[1].dependencies,
            Some(Dependencies::Csv(ref s)) if s == "a"
        ));
    }

    #[test]
    fn rows_with_bad_dates_are_kept_for_repair() {
        let (tasks, skipped) = import_str(
            "Name,Start,End\n\
             Ok task,2025-01-06,2025-01-17\n\
             Broken dates,not a date,\n",
        )
        .unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].start.as_deref(), Some("not a date"));
        assert_eq!(tasks[1].end, None);
    }

    #[test]
    fn rows_without_a_name_are_skipped() {
        let (tasks, skipped) = import_str(
            "Name,Start\n\
             ,2025-01-06\n\
             Real,2025-01-06\n",
        )
        .unwrap();
        assert_eq!(skipped, 1);
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn missing_name_column_is_an_error() {
        let err = import_str("Start,End\n2025-01-06,2025-01-17\n").unwrap_err();
        assert!(matches!(err, GanttError::Import(_)));
    }

    #[test]
    fn tab_delimiter_is_detected() {
        let (tasks, _) = import_str("Name\tStart\nAlpha\t2025-01-06\n").unwrap();
        assert_eq!(tasks[0].name, "Alpha");
        assert_eq!(tasks[0].start.as_deref(), Some("2025-01-06"));
    }
}
