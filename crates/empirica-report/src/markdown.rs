use empirica_stats::DatasetOverview;

use crate::table::{Cell, TableDoc, format_fixed};

/// Render a table as a GitHub-flavoured pipe table for console output.
pub fn render_markdown(doc: &TableDoc) -> String {
    let mut lines = Vec::new();

    if !doc.caption.is_empty() {
        lines.push(format!("**{}**", doc.caption));
        lines.push(String::new());
    }
    lines.push(pipe_row(doc.header.iter().map(String::as_str)));
    lines.push(pipe_row(doc.header.iter().map(|_| "---")));
    for row in doc.rows.iter().chain(&doc.footer) {
        lines.push(pipe_row(expand(row).iter().map(String::as_str)));
    }
    if !doc.notes.is_empty() {
        lines.push(String::new());
        for note in &doc.notes {
            lines.push(format!("_{note}_"));
        }
    }
    lines.join("\n")
}

/// Render a dataset overview as a short markdown report.
pub fn render_overview(overview: &DatasetOverview) -> String {
    let mut lines = Vec::new();

    lines.push("# Dataset overview".to_string());
    lines.push(String::new());
    lines.push(format!("- rows: {}", overview.rows));
    lines.push(format!("- columns: {}", overview.columns.len()));
    lines.push(format!("- missing cells: {}", overview.total_missing()));
    lines.push(String::new());

    lines.push("## Columns".to_string());
    lines.push("| column | type | missing |".to_string());
    lines.push("| --- | --- | --- |".to_string());
    for column in &overview.columns {
        lines.push(format!(
            "| {} | {} | {} |",
            column.name,
            column.kind.as_str(),
            column.missing
        ));
    }
    lines.push(String::new());

    if !overview.summary.rows.is_empty() {
        lines.push("## Numeric columns".to_string());
        lines.push("| column | count | mean | median | std | min | max |".to_string());
        lines.push("| --- | --- | --- | --- | --- | --- | --- |".to_string());
        for row in &overview.summary.rows {
            let std_dev = row
                .std_dev
                .map(|value| format_fixed(value, 2))
                .unwrap_or_else(|| "-".to_string());
            lines.push(format!(
                "| {} | {} | {} | {} | {} | {} | {} |",
                row.column,
                row.count,
                format_fixed(row.mean, 2),
                format_fixed(row.median, 2),
                std_dev,
                format_fixed(row.min, 2),
                format_fixed(row.max, 2)
            ));
        }
        lines.push(String::new());
    }

    if let Some(group_column) = &overview.group_column {
        lines.push(format!("## Groups by {group_column}"));
        match &overview.outcome_column {
            Some(outcome) => {
                lines.push(format!("| {group_column} | count | mean {outcome} |"));
                lines.push("| --- | --- | --- |".to_string());
            }
            None => {
                lines.push(format!("| {group_column} | count |"));
                lines.push("| --- | --- |".to_string());
            }
        }
        for group in &overview.groups {
            match (&overview.outcome_column, group.mean_outcome) {
                (Some(_), Some(mean)) => lines.push(format!(
                    "| {} | {} | {} |",
                    group.value,
                    group.count,
                    format_fixed(mean, 2)
                )),
                (Some(_), None) => {
                    lines.push(format!("| {} | {} | - |", group.value, group.count))
                }
                (None, _) => lines.push(format!("| {} | {} |", group.value, group.count)),
            }
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn expand(row: &[Cell]) -> Vec<String> {
    let mut cells = Vec::new();
    for cell in row {
        cells.push(cell.text.clone());
        cells.extend(std::iter::repeat_n(String::new(), cell.span - 1));
    }
    cells
}

fn pipe_row<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    let cells: Vec<&str> = cells.collect();
    format!("| {} |", cells.join(" | "))
}
