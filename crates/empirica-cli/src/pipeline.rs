use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};

use empirica_core::{Dataset, Error as CoreError, ValidationReport, load_csv, validate_dataset, write_csv};
use empirica_generate::{GenerateOptions, GenerationEngine, Variant};
use empirica_report::{
    Figure, Precision, TableDoc, balance_doc, coefficient_doc, distributions,
    outcome_by_treatment, regression_comparison_doc, render_figure, render_latex,
    render_markdown, render_overview, scatter_income_outcome, summary_doc, write_table,
};
use empirica_stats::{
    DeriveOptions, Formula, balance_table, dataset_overview, derive_variables, ols,
    summary_statistics,
};

use crate::CliError;
use crate::workspace::{AnalysisConfig, RunManifest, save_config};

pub const PROCESSED_FILE: &str = "processed_data.csv";

/// Load, describe, plot and model the raw dataset, writing four LaTeX tables.
pub fn analyze(config: &AnalysisConfig, manifest: &mut RunManifest) -> Result<(), CliError> {
    let timer = Instant::now();
    let paths = &config.paths;
    let analysis = &config.analysis;
    let tables = &config.tables;

    info!(step = 1, "loading data");
    let dataset = load_input(&paths.raw_data, manifest)?;
    report_validation(&validate_dataset(&dataset), manifest);

    info!(step = 2, "summary statistics");
    let summary = summary_statistics(&dataset, Some(analysis.summary_columns.as_slice()))?;
    let doc = summary_doc(&summary, &Precision::new(tables.summary_decimals));
    save_table(&paths.tables_dir.join("summary_statistics.tex"), &doc, manifest)?;

    info!(step = 3, "balance table");
    let balance = balance_table(
        &dataset,
        &analysis.treatment_column,
        &analysis.balance_columns,
    )?;
    let doc = balance_doc(&balance, &Precision::new(tables.balance_decimals));
    save_table(&paths.tables_dir.join("balance_table.tex"), &doc, manifest)?;

    if config.figures.enabled {
        info!(step = 4, "figures");
        let columns = analysis.figure_columns();
        let figures: [Figure; 3] = [
            outcome_by_treatment(&dataset, &columns)?,
            scatter_income_outcome(&dataset, &columns)?,
            distributions(&dataset, &columns)?,
        ];
        let size = (config.figures.width, config.figures.height);
        for figure in &figures {
            for path in render_figure(figure, &paths.figures_dir, &config.figures.formats, size)? {
                manifest.record_output(&path);
            }
        }
    } else {
        info!(step = 4, "figures disabled");
    }

    info!(step = 5, "regressions");
    let simple = Formula::new(
        analysis.outcome_column.clone(),
        vec![analysis.treatment_column.clone()],
    );
    let mut predictors = vec![analysis.treatment_column.clone()];
    predictors.extend(analysis.controls.iter().cloned());
    let controlled = Formula::new(analysis.outcome_column.clone(), predictors);

    let simple = ols(&dataset, &simple)?;
    let controlled = ols(&dataset, &controlled)?;
    for model in [&simple, &controlled] {
        if let Some(effect) = model.coefficient(&analysis.treatment_column) {
            info!(
                formula = %model.formula,
                estimate = effect.estimate,
                std_error = effect.std_error,
                p_value = effect.p_value,
                r_squared = model.r_squared,
                "model fitted"
            );
        }
    }

    let comparison = regression_comparison_doc(
        &[simple, controlled.clone()],
        &tables.regression_precision(),
        tables.fit_decimals,
    );
    save_table(&paths.tables_dir.join("regression_results.tex"), &comparison, manifest)?;

    let effect = coefficient_doc(
        &controlled,
        "Treatment Effect with Controls",
        "tab:treatment_effect",
        tables.coefficient_decimals,
        tables.fit_decimals,
    );
    save_table(&paths.tables_dir.join("treatment_effect.tex"), &effect, manifest)?;

    info!(
        duration_ms = timer.elapsed().as_millis() as u64,
        outputs = manifest.outputs.len(),
        "analysis complete"
    );
    Ok(())
}

/// Load the raw dataset (or generate fake data when it is missing), validate
/// it and write it with derived variables appended.
pub fn process(config: &AnalysisConfig, manifest: &mut RunManifest) -> Result<(), CliError> {
    let paths = &config.paths;
    let analysis = &config.analysis;

    let dataset = match load_input(&paths.raw_data, manifest) {
        Ok(dataset) => dataset,
        Err(CliError::Core(CoreError::NotFound(path))) => {
            warn!(
                path = %path.display(),
                "sample data not found, generating fake data instead"
            );
            let options = GenerateOptions {
                rows: config.generate.fallback_rows,
                seed: config.generate.seed,
                variant: Variant::Fake,
            };
            let dataset = GenerationEngine::new(options).run()?;
            write_csv(&paths.generated_data, &dataset)?;
            info!(path = %paths.generated_data.display(), "saved generated data");
            manifest.record_output(&paths.generated_data);
            manifest.rows = Some(dataset.row_count());
            dataset
        }
        Err(err) => return Err(err),
    };

    let overview = dataset_overview(
        &dataset,
        &analysis.treatment_column,
        &analysis.outcome_column,
    )?;
    println!("{}", render_overview(&overview));
    report_validation(&validate_dataset(&dataset), manifest);

    let options = DeriveOptions {
        age_column: analysis.age_column.clone(),
        income_column: analysis.income_column.clone(),
    };
    let processed = derive_variables(&dataset, &options)?;
    let out = paths.processed_dir.join(PROCESSED_FILE);
    let bytes = write_csv(&out, &processed)?;
    info!(
        path = %out.display(),
        rows = processed.row_count(),
        added = processed.column_count() - dataset.column_count(),
        bytes,
        "saved processed data"
    );
    manifest.record_output(&out);
    Ok(())
}

/// Generate a synthetic dataset from the `[generate]` settings.
pub fn generate(config: &AnalysisConfig, out: &Path, manifest: &mut RunManifest) -> Result<(), CliError> {
    let options = GenerateOptions {
        rows: config.generate.rows,
        seed: config.generate.seed,
        variant: config.generate.variant,
    };
    let dataset = GenerationEngine::new(options).run()?;
    let bytes = write_csv(out, &dataset)?;
    info!(path = %out.display(), rows = dataset.row_count(), bytes, "saved generated data");
    manifest.rows = Some(dataset.row_count());
    manifest.record_output(out);
    Ok(())
}

pub fn init_config(path: &Path, force: bool, manifest: &mut RunManifest) -> Result<(), CliError> {
    save_config(path, &AnalysisConfig::default(), force)?;
    info!(path = %path.display(), "wrote default configuration");
    manifest.record_output(path);
    Ok(())
}

fn load_input(path: &Path, manifest: &mut RunManifest) -> Result<Dataset, CliError> {
    manifest.input = Some(path.to_path_buf());
    let dataset = load_csv(path)?;
    manifest.rows = Some(dataset.row_count());
    Ok(dataset)
}

/// Validation findings are warnings: they are logged and recorded, never fatal.
fn report_validation(report: &ValidationReport, manifest: &mut RunManifest) {
    if report.passed() {
        info!("data validation passed");
        return;
    }
    for message in report.messages() {
        warn!(issue = %message, "validation warning");
    }
    manifest.validation_issues = report.messages();
}

fn save_table(path: &Path, doc: &TableDoc, manifest: &mut RunManifest) -> Result<(), CliError> {
    println!("{}\n", render_markdown(doc));
    write_table(path, &render_latex(doc))?;
    manifest.record_output(path);
    Ok(())
}
