use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use empirica_core::Dataset;

use crate::distribution::two_sided_p_value;
use crate::errors::StatsError;

/// Name of the implicit constant term.
pub const INTERCEPT: &str = "Intercept";

/// Relative pivot below which the equilibrated design counts as singular.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Additive linear model `response ~ a + b + ...` with an implicit intercept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Formula {
    pub response: String,
    pub predictors: Vec<String>,
}

impl Formula {
    pub fn new(response: impl Into<String>, predictors: Vec<String>) -> Self {
        Self {
            response: response.into(),
            predictors,
        }
    }

    pub fn parse(text: &str) -> Result<Self, StatsError> {
        let (response, rhs) = text
            .split_once('~')
            .ok_or_else(|| StatsError::InvalidFormula(format!("missing '~' in '{text}'")))?;

        let response = response.trim();
        if !is_identifier(response) {
            return Err(StatsError::InvalidFormula(format!(
                "invalid response '{response}'"
            )));
        }

        let mut predictors = Vec::new();
        for term in rhs.split('+').map(str::trim) {
            if !is_identifier(term) {
                return Err(StatsError::InvalidFormula(format!("invalid term '{term}'")));
            }
            if term == response {
                return Err(StatsError::InvalidFormula(format!(
                    "response '{term}' cannot be a predictor"
                )));
            }
            if predictors.iter().any(|p| p == term) {
                return Err(StatsError::InvalidFormula(format!("duplicate term '{term}'")));
            }
            predictors.push(term.to_string());
        }

        Ok(Self::new(response, predictors))
    }
}

impl FromStr for Formula {
    type Err = StatsError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.response, self.predictors.join(" + "))
    }
}

fn is_identifier(term: &str) -> bool {
    !term.is_empty()
        && !term.starts_with(|c: char| c.is_ascii_digit())
        && term.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

/// Estimate and inference for one model term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_stat: f64,
    pub p_value: f64,
}

/// Fitted OLS model. The intercept is always the first coefficient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionResult {
    pub formula: Formula,
    pub coefficients: Vec<Coefficient>,
    pub n_obs: usize,
    pub df_resid: usize,
    pub r_squared: f64,
    pub adj_r_squared: f64,
}

impl RegressionResult {
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|coef| coef.name == name)
    }
}

/// Fit `formula` by ordinary least squares.
///
/// Rows with a missing response or predictor are dropped. Fails with
/// [`StatsError::SingularDesign`] when the predictors are collinear or there
/// are not more observations than parameters.
pub fn ols(dataset: &Dataset, formula: &Formula) -> Result<RegressionResult, StatsError> {
    let response = dataset.numeric(&formula.response)?;
    let predictors = formula
        .predictors
        .iter()
        .map(|name| dataset.numeric(name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut design: Vec<Vec<f64>> = Vec::with_capacity(response.len());
    let mut y: Vec<f64> = Vec::with_capacity(response.len());
    for (row, target) in response.iter().enumerate() {
        let Some(target) = target else { continue };
        let values: Option<Vec<f64>> = predictors.iter().map(|column| column[row]).collect();
        let Some(values) = values else { continue };

        let mut x = Vec::with_capacity(values.len() + 1);
        x.push(1.0);
        x.extend(values);
        design.push(x);
        y.push(*target);
    }

    let n = y.len();
    let p = formula.predictors.len() + 1;
    if n <= p {
        return Err(StatsError::SingularDesign(format!(
            "{n} observations for {p} parameters"
        )));
    }

    // Equilibrate columns so the pivot tolerance is scale free.
    let scales: Vec<f64> = (0..p)
        .map(|j| design.iter().map(|row| row[j] * row[j]).sum::<f64>().sqrt())
        .collect();
    if let Some(j) = scales.iter().position(|s| *s == 0.0 || !s.is_finite()) {
        return Err(StatsError::SingularDesign(format!(
            "term '{}' has no variation",
            term_name(formula, j)
        )));
    }

    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for (row, target) in design.iter().zip(&y) {
        for i in 0..p {
            let zi = row[i] / scales[i];
            xty[i] += zi * target;
            for j in i..p {
                xtx[i][j] += zi * row[j] / scales[j];
            }
        }
    }
    for i in 0..p {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }

    let inverse = invert(xtx).ok_or_else(|| {
        StatsError::SingularDesign(format!("collinear predictors in '{formula}'"))
    })?;

    let beta: Vec<f64> = (0..p)
        .map(|i| (0..p).map(|j| inverse[i][j] * xty[j]).sum::<f64>() / scales[i])
        .collect();

    let mean_y = y.iter().sum::<f64>() / n as f64;
    let mut ssr = 0.0;
    let mut sst = 0.0;
    for (row, target) in design.iter().zip(&y) {
        let fitted: f64 = row.iter().zip(&beta).map(|(x, b)| x * b).sum();
        ssr += (target - fitted).powi(2);
        sst += (target - mean_y).powi(2);
    }

    let df_resid = n - p;
    let sigma2 = ssr / df_resid as f64;
    let r_squared = if sst > 0.0 { 1.0 - ssr / sst } else { 0.0 };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n - 1) as f64 / df_resid as f64;

    let coefficients = (0..p)
        .map(|i| {
            let std_error = (sigma2 * inverse[i][i]).sqrt() / scales[i];
            let t_stat = beta[i] / std_error;
            Coefficient {
                name: term_name(formula, i).to_string(),
                estimate: beta[i],
                std_error,
                t_stat,
                p_value: two_sided_p_value(t_stat, df_resid as f64),
            }
        })
        .collect();

    debug!(formula = %formula, n_obs = n, r_squared, "ols fitted");
    Ok(RegressionResult {
        formula: formula.clone(),
        coefficients,
        n_obs: n,
        df_resid,
        r_squared,
        adj_r_squared,
    })
}

fn term_name(formula: &Formula, index: usize) -> &str {
    if index == 0 {
        INTERCEPT
    } else {
        &formula.predictors[index - 1]
    }
}

/// Gauss-Jordan inverse with partial pivoting; `None` when singular.
fn invert(mut matrix: Vec<Vec<f64>>) -> Option<Vec<Vec<f64>>> {
    let n = matrix.len();
    let mut inverse: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for col in 0..n {
        let pivot_row =
            (col..n).max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))?;
        if matrix[pivot_row][col].abs() < PIVOT_TOLERANCE {
            return None;
        }
        matrix.swap(col, pivot_row);
        inverse.swap(col, pivot_row);

        let pivot = matrix[col][col];
        for j in 0..n {
            matrix[col][j] /= pivot;
            inverse[col][j] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = matrix[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                matrix[row][j] -= factor * matrix[col][j];
                inverse[row][j] -= factor * inverse[col][j];
            }
        }
    }

    Some(inverse)
}

/// Least-squares line through paired observations as `(intercept, slope)`.
///
/// `None` with fewer than two points or no spread in `xs`.
pub fn simple_fit(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        sxy += (x - mean_x) * (y - mean_y);
        sxx += (x - mean_x).powi(2);
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((mean_y - slope * mean_x, slope))
}
