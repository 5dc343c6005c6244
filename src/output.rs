use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

use crate::error::{PipelineError, PipelineResult};

fn ensure_parent(path: &Path) -> PipelineResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|e| PipelineError::write(dir, e))
        }
        _ => Ok(()),
    }
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> PipelineResult<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path).map_err(|e| PipelineError::write(path, e))?;
    for r in rows {
        wtr.serialize(r).map_err(|e| PipelineError::write(path, e))?;
    }
    wtr.flush().map_err(|e| PipelineError::write(path, e))?;
    Ok(())
}

/// Pretty-printed JSON, two-space indented like the site's checked-in data.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> PipelineResult<()> {
    ensure_parent(path)?;
    let s = serde_json::to_string_pretty(value).map_err(|e| PipelineError::write(path, e))?;
    std::fs::write(path, s).map_err(|e| PipelineError::write(path, e))?;
    Ok(())
}

/// Markdown table of the first `max_rows` rows, for console previews.
pub fn render_preview<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", render_preview(rows, max_rows));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MlaSummaryRow;
    use tempfile::tempdir;

    fn row(name: &str, total: f64) -> MlaSummaryRow {
        MlaSummaryRow {
            id: format!("KOLLAM/{name}_projects.json"),
            name: name.to_string(),
            constituency: "Kundara".to_string(),
            district: "Kollam".to_string(),
            total_expenditure: total,
            project_count: 2,
            image: None,
        }
    }

    #[test]
    fn preview_is_a_markdown_table_without_skipped_columns() {
        let out = render_preview(&[row("a", 1234.5), row("b", 1.0), row("c", 0.0)], 2);
        assert!(out.contains("| MLA"));
        assert!(out.contains("1,234.50"));
        assert!(!out.contains("| c "));
        assert!(!out.contains("projects.json"));
        assert_eq!(render_preview::<MlaSummaryRow>(&[], 2), "(no rows)");
    }

    #[test]
    fn writers_create_parent_directories() {
        let dir = tempdir().expect("tmp");
        let json = dir.path().join("nested/out.json");
        let csv = dir.path().join("nested/out.csv");
        write_json(&json, &vec![row("a", 1.0)]).expect("json");
        write_csv(&csv, &[row("a", 1.0)]).expect("csv");

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json).expect("read")).expect("valid json");
        assert_eq!(parsed[0]["totalExpenditure"], 1.0);
        let text = std::fs::read_to_string(&csv).expect("read");
        assert!(text.starts_with("id,name,constituency,district,totalExpenditure,projectCount,image"));
    }
}
