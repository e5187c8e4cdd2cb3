use crate::table::{Cell, TableDoc};

/// Render a booktabs table wrapped in a floating `table` environment.
pub fn render_latex(doc: &TableDoc) -> String {
    let mut lines = Vec::new();

    lines.push("\\begin{table}[htbp]".to_string());
    lines.push("\\centering".to_string());
    lines.push(format!("\\caption{{{}}}", escape_latex(&doc.caption)));
    if !doc.label.is_empty() {
        lines.push(format!("\\label{{{}}}", doc.label));
    }
    lines.push(format!(
        "\\begin{{tabular}}{{{}}}",
        doc.effective_column_format()
    ));
    lines.push("\\toprule".to_string());
    if !doc.header.is_empty() {
        let header: Vec<String> = doc.header.iter().map(|h| escape_latex(h)).collect();
        lines.push(format!("{} \\\\", header.join(" & ")));
        lines.push("\\midrule".to_string());
    }
    for row in &doc.rows {
        lines.push(render_row(row));
    }
    if !doc.footer.is_empty() {
        lines.push("\\midrule".to_string());
        for row in &doc.footer {
            lines.push(render_row(row));
        }
    }
    lines.push("\\bottomrule".to_string());
    lines.push("\\end{tabular}".to_string());

    if !doc.notes.is_empty() {
        lines.push("\\begin{tablenotes}".to_string());
        lines.push("\\small".to_string());
        for note in &doc.notes {
            lines.push(format!("\\item {}", escape_latex(note)));
        }
        lines.push("\\end{tablenotes}".to_string());
    }
    lines.push("\\end{table}".to_string());

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn render_row(row: &[Cell]) -> String {
    let cells: Vec<String> = row
        .iter()
        .map(|cell| {
            let text = escape_latex(&cell.text);
            if cell.span > 1 {
                format!("\\multicolumn{{{}}}{{c}}{{{}}}", cell.span, text)
            } else {
                text
            }
        })
        .collect();
    format!("{} \\\\", cells.join(" & "))
}

/// Escape characters with special meaning in LaTeX text mode.
pub fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '~' => escaped.push_str("\\textasciitilde{}"),
            '^' => escaped.push_str("\\textasciicircum{}"),
            '<' => escaped.push_str("\\textless{}"),
            '>' => escaped.push_str("\\textgreater{}"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_specials() {
        assert_eq!(escape_latex("education_years"), "education\\_years");
        assert_eq!(escape_latex("50% & $5"), "50\\% \\& \\$5");
        assert_eq!(escape_latex("a\\b"), "a\\textbackslash{}b");
        assert_eq!(escape_latex("p<0.01"), "p\\textless{}0.01");
        assert_eq!(escape_latex("8.123***"), "8.123***");
    }

    #[test]
    fn renders_booktabs_layout() {
        let mut doc = TableDoc::new("Balance", "tab:balance")
            .header(["", "Control Mean", "Difference"])
            .note("Notes: Standard errors in parentheses.");
        doc.push_row(["income_k", "1.000", "(0.500)"]);
        doc.push_footer([Cell::new("N"), Cell::spanning("12", 2)]);

        let text = render_latex(&doc);
        let expected = "\
\\begin{table}[htbp]
\\centering
\\caption{Balance}
\\label{tab:balance}
\\begin{tabular}{lrr}
\\toprule
 & Control Mean & Difference \\\\
\\midrule
income\\_k & 1.000 & (0.500) \\\\
\\midrule
N & \\multicolumn{2}{c}{12} \\\\
\\bottomrule
\\end{tabular}
\\begin{tablenotes}
\\small
\\item Notes: Standard errors in parentheses.
\\end{tablenotes}
\\end{table}
";
        assert_eq!(text, expected);
    }

    #[test]
    fn omits_empty_sections() {
        let mut doc = TableDoc::new("Plain", "").header(["a", "b"]);
        doc.push_row(["1", "2"]);
        let text = render_latex(&doc);
        assert!(!text.contains("\\label"));
        assert!(!text.contains("tablenotes"));
        assert_eq!(text.matches("\\midrule").count(), 1);
    }
}
