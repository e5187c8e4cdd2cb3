//! Format-neutral table model and the builders for the analysis tables.
//!
//! A [`TableDoc`] holds already formatted cell text; serializers in
//! [`crate::latex`] and [`crate::markdown`] only decide layout and escaping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use empirica_stats::{BalanceTable, INTERCEPT, RegressionResult, SummaryTable};

/// Placeholder for a statistic that is undefined (e.g. a single-observation spread).
pub const UNDEFINED: &str = "--";
/// Placeholder for a predictor absent from a model.
pub const ABSENT: &str = "-";

const SIGNIFICANCE_NOTE: &str = "Significance: *** p<0.01, ** p<0.05, * p<0.1";

/// One table cell, optionally spanning several columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub span: usize,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            span: 1,
        }
    }

    pub fn spanning(text: impl Into<String>, span: usize) -> Self {
        Self {
            text: text.into(),
            span: span.max(1),
        }
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::new(text)
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::new(text)
    }
}

/// Captioned table with a header, body rows, footer rows and notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDoc {
    pub caption: String,
    pub label: String,
    pub column_format: Option<String>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub footer: Vec<Vec<Cell>>,
    pub notes: Vec<String>,
}

impl TableDoc {
    pub fn new(caption: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            label: label.into(),
            ..Self::default()
        }
    }

    /// LaTeX `tabular` column specification, e.g. `lrrrr`.
    pub fn column_format(mut self, format: impl Into<String>) -> Self {
        self.column_format = Some(format.into());
        self
    }

    pub fn header<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn push_row<I, C>(&mut self, cells: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    /// Footer rows follow the body after a rule.
    pub fn push_footer<I, C>(&mut self, cells: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        self.footer.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn note(mut self, text: impl Into<String>) -> Self {
        self.notes.push(text.into());
        self
    }

    /// Number of columns, taken from the header.
    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Column specification to use: the explicit one, or a left-aligned
    /// label column followed by right-aligned value columns.
    pub fn effective_column_format(&self) -> String {
        self.column_format.clone().unwrap_or_else(|| {
            let mut format = String::from("l");
            format.push_str(&"r".repeat(self.width().saturating_sub(1)));
            format
        })
    }
}

/// Decimal places per table, with per-variable overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Precision {
    pub default: u32,
    pub overrides: BTreeMap<String, u32>,
}

impl Default for Precision {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Precision {
    pub fn new(default: u32) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, variable: impl Into<String>, decimals: u32) -> Self {
        self.overrides.insert(variable.into(), decimals);
        self
    }

    pub fn for_variable(&self, variable: &str) -> u32 {
        self.overrides.get(variable).copied().unwrap_or(self.default)
    }

    pub fn format(&self, variable: &str, value: f64) -> String {
        format_fixed(value, self.for_variable(variable))
    }
}

/// Fixed-point rendering without a negative sign on values that round to zero.
pub fn format_fixed(value: f64, decimals: u32) -> String {
    let text = format!("{:.*}", decimals as usize, value);
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => text,
    }
}

/// Conventional significance markers for a two-sided p-value.
pub fn significance_stars(p_value: f64) -> &'static str {
    if p_value < 0.01 {
        "***"
    } else if p_value < 0.05 {
        "**"
    } else if p_value < 0.1 {
        "*"
    } else {
        ""
    }
}

/// Human label for a model term: `education_years` becomes `Education Years`.
pub fn display_name(variable: &str) -> String {
    if variable == INTERCEPT {
        return "Constant".to_string();
    }
    variable
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Descriptive statistics: one row per variable.
pub fn summary_doc(summary: &SummaryTable, precision: &Precision) -> TableDoc {
    let mut doc = TableDoc::new("Summary Statistics", "tab:summary")
        .column_format("lrrrrr")
        .header(["", "Mean", "Median", "Std Dev", "Min", "Max"]);

    for row in &summary.rows {
        let decimals = precision.for_variable(&row.column);
        doc.push_row([
            row.column.clone(),
            format_fixed(row.mean, decimals),
            format_fixed(row.median, decimals),
            row.std_dev
                .map(|v| format_fixed(v, decimals))
                .unwrap_or_else(|| UNDEFINED.to_string()),
            format_fixed(row.min, decimals),
            format_fixed(row.max, decimals),
        ]);
    }

    let observations = summary.rows.iter().map(|row| row.count).max().unwrap_or(0);
    doc.note(format!("Notes: Sample includes {observations} observations."))
}

/// Treatment/control comparison with standard errors in parentheses.
pub fn balance_doc(balance: &BalanceTable, precision: &Precision) -> TableDoc {
    let mut doc = TableDoc::new("Balance Table: Treatment vs Control", "tab:balance")
        .column_format("lrrrr")
        .header(["", "Control Mean", "Treatment Mean", "Difference", "Std. Error"]);

    for row in &balance.rows {
        let decimals = precision.for_variable(&row.variable);
        doc.push_row([
            row.variable.clone(),
            format_fixed(row.control_mean, decimals),
            format_fixed(row.treatment_mean, decimals),
            format_fixed(row.difference, decimals),
            row.std_error
                .map(|v| format!("({})", format_fixed(v, decimals)))
                .unwrap_or_else(|| UNDEFINED.to_string()),
        ]);
    }

    doc.note("Notes: Standard errors in parentheses.")
}

/// Side-by-side comparison of several models.
///
/// Terms appear in order of first use across models with the intercept last
/// as `Constant`. Each model contributes an estimate column (with stars) and a
/// standard error column; footer rows carry N and R-squared across both.
pub fn regression_comparison_doc(
    models: &[RegressionResult],
    precision: &Precision,
    fit_decimals: u32,
) -> TableDoc {
    let mut header = vec!["Variable".to_string()];
    for index in 1..=models.len() {
        header.push(format!("Model {index}"));
        header.push("(SE)".to_string());
    }
    let mut doc = TableDoc::new("Regression Results: Treatment Effects", "tab:regression")
        .column_format(format!("l{}", "cc".repeat(models.len())))
        .header(header);

    let mut terms: Vec<&str> = Vec::new();
    for model in models {
        for coefficient in &model.coefficients {
            if coefficient.name != INTERCEPT && !terms.contains(&coefficient.name.as_str()) {
                terms.push(&coefficient.name);
            }
        }
    }
    terms.push(INTERCEPT);

    for term in terms {
        let mut cells = vec![display_name(term)];
        for model in models {
            match model.coefficient(term) {
                Some(coefficient) => {
                    cells.push(format!(
                        "{}{}",
                        precision.format(term, coefficient.estimate),
                        significance_stars(coefficient.p_value)
                    ));
                    cells.push(format!("({})", precision.format(term, coefficient.std_error)));
                }
                None => {
                    cells.push(ABSENT.to_string());
                    cells.push(ABSENT.to_string());
                }
            }
        }
        doc.push_row(cells);
    }

    let mut observations = vec![Cell::new("N")];
    let mut fit = vec![Cell::new("R-squared")];
    for model in models {
        observations.push(Cell::spanning(model.n_obs.to_string(), 2));
        fit.push(Cell::spanning(format_fixed(model.r_squared, fit_decimals), 2));
    }
    doc.push_footer(observations);
    doc.push_footer(fit);

    doc.note(format!("Notes: Standard errors in parentheses. {SIGNIFICANCE_NOTE}"))
}

/// Coefficient table for a single model, with N and R-squared in the notes.
pub fn coefficient_doc(
    result: &RegressionResult,
    caption: &str,
    label: &str,
    decimals: u32,
    fit_decimals: u32,
) -> TableDoc {
    let mut doc = TableDoc::new(caption, label)
        .column_format("lcc")
        .header(["", "Coefficient", "Std. Error"]);

    for coefficient in &result.coefficients {
        doc.push_row([
            coefficient.name.clone(),
            format!(
                "{}{}",
                format_fixed(coefficient.estimate, decimals),
                significance_stars(coefficient.p_value)
            ),
            format!("({})", format_fixed(coefficient.std_error, decimals)),
        ]);
    }

    doc.note(format!("Notes: {SIGNIFICANCE_NOTE}")).note(format!(
        "N = {}, R-squared = {}",
        result.n_obs,
        format_fixed(result.r_squared, fit_decimals)
    ))
}
