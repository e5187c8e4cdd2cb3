//! Analysis figures rendered with [`plotters`].
//!
//! Figure data is extracted from a [`Dataset`] first and drawn afterwards, so
//! the same [`Figure`] can be written once per [`FigureFormat`]. Drawing code
//! is generic over the backend; PNG goes through the bitmap backend and SVG
//! through the SVG backend.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use empirica_core::{ColumnData, Dataset};
use empirica_stats::simple_fit;

const HISTOGRAM_BINS: usize = 30;
const FIT_POINTS: usize = 100;
const GROUP_LABELS: [&str; 2] = ["Control", "Treatment"];
const GROUP_COLORS: [RGBColor; 2] = [RGBColor(31, 119, 180), RGBColor(214, 39, 40)];
const CAPTION_FONT: (&str, u32) = ("sans-serif", 30);
const PANEL_FONT: (&str, u32) = ("sans-serif", 22);

/// Errors that can occur during figure generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to save figure: {0}")]
    FileSave(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Data(#[from] empirica_core::Error),
}

type Result<T> = core::result::Result<T, PlotError>;

/// Output encoding of a figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FigureFormat {
    Png,
    Svg,
}

impl FigureFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FigureFormat::Png => "png",
            FigureFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for FigureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FigureFormat {
    type Err = String;

    fn from_str(value: &str) -> core::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "png" => Ok(FigureFormat::Png),
            "svg" => Ok(FigureFormat::Svg),
            other => Err(format!("unsupported figure format '{other}' (expected png or svg)")),
        }
    }
}

/// Columns the figures are drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureColumns {
    pub group: String,
    pub outcome: String,
    pub age: String,
    pub income: String,
    pub education: String,
}

impl Default for FigureColumns {
    fn default() -> Self {
        Self {
            group: "treatment".to_string(),
            outcome: "outcome".to_string(),
            age: "age".to_string(),
            income: "income".to_string(),
            education: "education_years".to_string(),
        }
    }
}

/// One equal-width histogram bin; `count` covers `[lower, upper)`, the last
/// bin also includes its upper edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Data behind one figure, ready to draw on any backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Figure {
    /// Outcome box plot per treatment group.
    OutcomeByTreatment { groups: [Vec<f64>; 2] },
    /// Income/outcome scatter per group with a fitted line each.
    ScatterIncomeOutcome { groups: [Vec<(f64, f64)>; 2] },
    /// 2x2 grid of variable distributions.
    Distributions {
        age: Vec<f64>,
        income: Vec<f64>,
        education: Vec<(String, usize)>,
        education_label: String,
        outcome: Vec<f64>,
    },
}

impl Figure {
    /// File stem the figure is saved under.
    pub fn name(&self) -> &'static str {
        match self {
            Figure::OutcomeByTreatment { .. } => "outcome_by_treatment",
            Figure::ScatterIncomeOutcome { .. } => "scatter_income_outcome",
            Figure::Distributions { .. } => "distributions",
        }
    }

    pub fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        area.fill(&WHITE)
            .map_err(|e| PlotError::DrawingArea(e.to_string()))?;
        match self {
            Figure::OutcomeByTreatment { groups } => draw_box_plot(area, groups),
            Figure::ScatterIncomeOutcome { groups } => draw_scatter(area, groups),
            Figure::Distributions {
                age,
                income,
                education,
                education_label,
                outcome,
            } => {
                let panels = area.split_evenly((2, 2));
                draw_histogram(&panels[0], age, "Age Distribution", "Age", &GROUP_COLORS[0])?;
                draw_histogram(&panels[1], income, "Income Distribution", "Income ($)", &GREEN)?;
                draw_bars(
                    &panels[2],
                    education,
                    "Education Distribution",
                    education_label,
                )?;
                draw_histogram(&panels[3], outcome, "Outcome Distribution", "Outcome", &RED)
            }
        }
    }
}

/// Outcome values split by treatment group.
pub fn outcome_by_treatment(dataset: &Dataset, columns: &FigureColumns) -> Result<Figure> {
    let group = dataset.numeric(&columns.group)?;
    let outcome = dataset.numeric(&columns.outcome)?;

    let mut groups: [Vec<f64>; 2] = [Vec::new(), Vec::new()];
    for (label, value) in group.iter().zip(&outcome) {
        if let (Some(index), Some(value)) = (group_index(*label), value) {
            groups[index].push(*value);
        }
    }
    require_groups(&groups, &columns.outcome)?;
    Ok(Figure::OutcomeByTreatment { groups })
}

/// Income/outcome pairs split by treatment group.
pub fn scatter_income_outcome(dataset: &Dataset, columns: &FigureColumns) -> Result<Figure> {
    let group = dataset.numeric(&columns.group)?;
    let income = dataset.numeric(&columns.income)?;
    let outcome = dataset.numeric(&columns.outcome)?;

    let mut groups: [Vec<(f64, f64)>; 2] = [Vec::new(), Vec::new()];
    for ((label, x), y) in group.iter().zip(&income).zip(&outcome) {
        if let (Some(index), Some(x), Some(y)) = (group_index(*label), x, y) {
            groups[index].push((*x, *y));
        }
    }
    require_groups(&groups, &columns.income)?;
    Ok(Figure::ScatterIncomeOutcome { groups })
}

/// Age, income and outcome histograms with an education bar chart.
pub fn distributions(dataset: &Dataset, columns: &FigureColumns) -> Result<Figure> {
    let observed = |name: &str| -> Result<Vec<f64>> {
        let values: Vec<f64> = dataset.numeric(name)?.into_iter().flatten().collect();
        if values.is_empty() {
            return Err(PlotError::InvalidData(format!(
                "column '{name}' has no observed values"
            )));
        }
        Ok(values)
    };

    let education = value_counts(&dataset.column(&columns.education)?.data);
    if education.is_empty() {
        return Err(PlotError::InvalidData(format!(
            "column '{}' has no observed values",
            columns.education
        )));
    }

    Ok(Figure::Distributions {
        age: observed(&columns.age)?,
        income: observed(&columns.income)?,
        education,
        education_label: education_label(&columns.education),
        outcome: observed(&columns.outcome)?,
    })
}

/// Write `figure` once per format into `dir`, returning the written paths.
pub fn render_figure(
    figure: &Figure,
    dir: &Path,
    formats: &[FigureFormat],
    size: (u32, u32),
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(formats.len());
    for format in formats {
        let path = dir.join(format!("{}.{}", figure.name(), format.extension()));
        match format {
            FigureFormat::Png => {
                let area = BitMapBackend::new(&path, size).into_drawing_area();
                figure.draw(&area)?;
                area.present()
                    .map_err(|e| PlotError::Drawing(e.to_string()))?;
            }
            FigureFormat::Svg => {
                let area = SVGBackend::new(&path, size).into_drawing_area();
                figure.draw(&area)?;
                area.present()
                    .map_err(|e| PlotError::Drawing(e.to_string()))?;
            }
        }
        debug!(path = %path.display(), "figure written");
        written.push(path);
    }

    info!(figure = figure.name(), files = written.len(), "saved figure");
    Ok(written)
}

/// Split observed values into `bins` equal-width bins between min and max.
///
/// A constant column yields a single unit-width bin centred on the value.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<Bin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return vec![Bin {
            lower: min - 0.5,
            upper: max + 0.5,
            count: finite.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in &finite {
        let index = (((value - min) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| Bin {
            lower: min + width * index as f64,
            upper: if index + 1 == bins {
                max
            } else {
                min + width * (index + 1) as f64
            },
            count,
        })
        .collect()
}

/// Frequency of each observed value, ordered by value.
///
/// Numeric columns sort numerically, text columns lexicographically.
pub fn value_counts(data: &ColumnData) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for row in 0..data.len() {
        let Some(text) = data.cell_text(row) else {
            continue;
        };
        match positions.get(&text) {
            Some(&position) => counts[position].1 += 1,
            None => {
                positions.insert(text.clone(), counts.len());
                counts.push((text, 1));
            }
        }
    }

    if data.kind().is_numeric() {
        let key = |text: &str| text.parse::<f64>().unwrap_or(f64::NAN);
        counts.sort_by(|a, b| key(&a.0).total_cmp(&key(&b.0)));
    } else {
        counts.sort_by(|a, b| a.0.cmp(&b.0));
    }
    counts
}

fn group_index(label: Option<f64>) -> Option<usize> {
    match label {
        Some(value) if value == 0.0 => Some(0),
        Some(value) if value == 1.0 => Some(1),
        _ => None,
    }
}

fn require_groups<T>(groups: &[Vec<T>; 2], variable: &str) -> Result<()> {
    for (group, label) in groups.iter().zip(GROUP_LABELS) {
        if group.is_empty() {
            return Err(PlotError::InvalidData(format!(
                "{label} group has no observations of '{variable}'"
            )));
        }
    }
    Ok(())
}

fn education_label(column: &str) -> String {
    if column.ends_with("_years") {
        "Years of Education".to_string()
    } else {
        "Education".to_string()
    }
}

/// Value range padded by 5 % on each side; constant data gets a unit pad.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    (min - pad, max + pad)
}

fn draw_box_plot<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    groups: &[Vec<f64>; 2],
) -> Result<()> {
    let (y_min, y_max) = padded_range(groups.iter().flatten().copied());
    let labels: Vec<String> = GROUP_LABELS.iter().map(|l| l.to_string()).collect();

    let mut chart = ChartBuilder::on(area)
        .caption("Distribution of Outcome by Treatment Status", CAPTION_FONT)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(labels[..].into_segmented(), y_min as f32..y_max as f32)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Treatment Group")
        .y_desc("Outcome")
        .x_label_formatter(&|value| match value {
            SegmentValue::Exact(label) | SegmentValue::CenterOf(label) => label.to_string(),
            SegmentValue::Last => String::new(),
        })
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    for ((values, label), color) in groups.iter().zip(&labels).zip(GROUP_COLORS) {
        let quartiles = Quartiles::new(values);
        chart
            .draw_series(std::iter::once(
                Boxplot::new_vertical(SegmentValue::CenterOf(label), &quartiles)
                    .width(80)
                    .whisker_width(0.5)
                    .style(color.stroke_width(2)),
            ))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }
    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    groups: &[Vec<(f64, f64)>; 2],
) -> Result<()> {
    let (x_min, x_max) = padded_range(groups.iter().flatten().map(|(x, _)| *x));
    let (y_min, y_max) = padded_range(groups.iter().flatten().map(|(_, y)| *y));

    let mut chart = ChartBuilder::on(area)
        .caption("Outcome vs Income by Treatment Status", CAPTION_FONT)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Income ($)")
        .y_desc("Outcome")
        .x_label_formatter(&|x| format!("{x:.0}"))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    for ((points, label), color) in groups.iter().zip(GROUP_LABELS).zip(GROUP_COLORS) {
        chart
            .draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, color.mix(0.6).filled())),
            )
            .map_err(|e| PlotError::Drawing(e.to_string()))?
            .label(label)
            .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));

        let xs: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
        let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
        match simple_fit(&xs, &ys) {
            Some((intercept, slope)) => {
                let (lo, hi) = padded_range(xs.iter().copied());
                let (lo, hi) = (lo.max(x_min), hi.min(x_max));
                let step = (hi - lo) / (FIT_POINTS - 1) as f64;
                let line = (0..FIT_POINTS).map(|i| {
                    let x = lo + step * i as f64;
                    (x, intercept + slope * x)
                });
                chart
                    .draw_series(LineSeries::new(line, color.stroke_width(2)))
                    .map_err(|e| PlotError::Drawing(e.to_string()))?;
            }
            None => debug!(group = label, "no fit line for a degenerate group"),
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

fn draw_histogram<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    values: &[f64],
    title: &str,
    x_label: &str,
    color: &RGBColor,
) -> Result<()> {
    let bins = histogram_bins(values, HISTOGRAM_BINS);
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Err(PlotError::InvalidData(format!("{title}: no finite values")));
    };
    let max_count = bins.iter().map(|bin| bin.count).max().unwrap_or(0);

    let mut chart = ChartBuilder::on(area)
        .caption(title, PANEL_FONT)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(first.lower..last.upper, 0.0..(max_count as f64 * 1.1).max(1.0))
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc("Frequency")
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart
        .draw_series(bins.iter().map(|bin| {
            Rectangle::new(
                [(bin.lower, 0.0), (bin.upper, bin.count as f64)],
                color.mix(0.7).filled(),
            )
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    chart
        .draw_series(bins.iter().map(|bin| {
            Rectangle::new([(bin.lower, 0.0), (bin.upper, bin.count as f64)], BLACK)
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

fn draw_bars<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    counts: &[(String, usize)],
    title: &str,
    x_label: &str,
) -> Result<()> {
    let max_count = counts.iter().map(|(_, count)| *count).max().unwrap_or(0);

    let mut chart = ChartBuilder::on(area)
        .caption(title, PANEL_FONT)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(
            -0.5..counts.len() as f64 - 0.5,
            0.0..(max_count as f64 * 1.1).max(1.0),
        )
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(counts.len())
        .x_label_formatter(&|x| {
            let index = x.round();
            if (x - index).abs() > 1e-6 || index < 0.0 {
                return String::new();
            }
            counts
                .get(index as usize)
                .map(|(label, _)| label.clone())
                .unwrap_or_default()
        })
        .x_desc(x_label)
        .y_desc("Frequency")
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let orange = RGBColor(255, 165, 0);
    chart
        .draw_series(counts.iter().enumerate().map(|(index, (_, count))| {
            let center = index as f64;
            Rectangle::new(
                [(center - 0.4, 0.0), (center + 0.4, *count as f64)],
                orange.mix(0.7).filled(),
            )
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use empirica_core::Column;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column::int("treatment", [0, 0, 1, 1, 1]),
            Column::int("age", [20, 30, 40, 50, 60]),
            Column::float("income", [1000.0, 2000.0, 3000.0, 4000.0, 5000.0]),
            Column::int("education_years", [16, 12, 16, 20, 12]),
            Column::float("outcome", [90.0, 95.0, 105.0, 110.0, 108.0]),
        ])
        .expect("dataset")
    }

    #[test]
    fn histogram_bins_cover_all_values() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let bins = histogram_bins(&values, 30);
        assert_eq!(bins.len(), 30);
        assert_eq!(bins.iter().map(|bin| bin.count).sum::<usize>(), 100);
        assert_eq!(bins[0].lower, 0.0);
        assert_eq!(bins[29].upper, 99.0);
        for pair in bins.windows(2) {
            assert!((pair[0].upper - pair[1].lower).abs() < 1e-9);
        }
    }

    #[test]
    fn histogram_edge_cases() {
        assert!(histogram_bins(&[], 10).is_empty());
        assert!(histogram_bins(&[1.0], 0).is_empty());
        let constant = histogram_bins(&[3.0, 3.0, 3.0], 10);
        assert_eq!(constant.len(), 1);
        assert_eq!(constant[0].count, 3);
        let with_inf = histogram_bins(&[1.0, f64::INFINITY, 2.0], 2);
        assert_eq!(with_inf.iter().map(|bin| bin.count).sum::<usize>(), 2);
    }

    #[test]
    fn value_counts_sort_numbers_numerically() {
        let data = ColumnData::Int(vec![Some(20), Some(8), None, Some(20), Some(12)]);
        assert_eq!(
            value_counts(&data),
            vec![
                ("8".to_string(), 1),
                ("12".to_string(), 1),
                ("20".to_string(), 2)
            ]
        );

        let text = ColumnData::Text(vec![
            Some("PhD".into()),
            Some("Bachelor".into()),
            Some("PhD".into()),
        ]);
        assert_eq!(
            value_counts(&text),
            vec![("Bachelor".to_string(), 1), ("PhD".to_string(), 2)]
        );
    }

    #[test]
    fn figures_split_groups() {
        let columns = FigureColumns::default();
        let figure = outcome_by_treatment(&dataset(), &columns).expect("box plot data");
        assert_eq!(figure.name(), "outcome_by_treatment");
        let Figure::OutcomeByTreatment { groups } = figure else {
            panic!("unexpected figure");
        };
        assert_eq!(groups[0], vec![90.0, 95.0]);
        assert_eq!(groups[1].len(), 3);

        let scatter = scatter_income_outcome(&dataset(), &columns).expect("scatter data");
        let Figure::ScatterIncomeOutcome { groups } = scatter else {
            panic!("unexpected figure");
        };
        assert_eq!(groups[0][1], (2000.0, 95.0));

        let grid = distributions(&dataset(), &columns).expect("distribution data");
        let Figure::Distributions {
            education,
            education_label,
            ..
        } = grid
        else {
            panic!("unexpected figure");
        };
        assert_eq!(education[0], ("12".to_string(), 2));
        assert_eq!(education_label, "Years of Education");
    }

    #[test]
    fn empty_group_is_invalid() {
        let dataset = Dataset::new(vec![
            Column::int("treatment", [1, 1]),
            Column::float("outcome", [1.0, 2.0]),
        ])
        .expect("dataset");
        let result = outcome_by_treatment(&dataset, &FigureColumns::default());
        assert!(matches!(result, Err(PlotError::InvalidData(_))));
    }

    #[test]
    fn formats_parse() {
        assert_eq!("PNG".parse::<FigureFormat>(), Ok(FigureFormat::Png));
        assert_eq!("svg".parse::<FigureFormat>(), Ok(FigureFormat::Svg));
        assert!("pdf".parse::<FigureFormat>().is_err());
    }

    #[test]
    #[ignore = "Font rendering not available in test environment"]
    fn renders_every_figure() {
        let dir = std::env::temp_dir().join(format!("empirica_plots_{}", uuid::Uuid::new_v4()));
        let columns = FigureColumns::default();
        let figures = [
            outcome_by_treatment(&dataset(), &columns).expect("box"),
            scatter_income_outcome(&dataset(), &columns).expect("scatter"),
            distributions(&dataset(), &columns).expect("grid"),
        ];
        for figure in &figures {
            let formats = [FigureFormat::Png, FigureFormat::Svg];
            let written = render_figure(figure, &dir, &formats, (800, 600)).expect("render");
            assert_eq!(written.len(), 2);
            assert!(written.iter().all(|path| path.exists()));
        }
        let _ = fs::remove_dir_all(&dir);
    }
}
