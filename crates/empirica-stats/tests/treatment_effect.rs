use empirica_generate::{GenerateOptions, GenerationEngine, Variant};
use empirica_stats::{
    DeriveOptions, Formula, INTERCEPT, balance_table, dataset_overview, derive_variables, ols,
    summary_statistics,
};

fn generate(rows: usize, variant: Variant) -> empirica_core::Dataset {
    GenerationEngine::new(GenerateOptions {
        rows,
        seed: 42,
        variant,
    })
    .run()
    .expect("generate dataset")
}

#[test]
fn recovers_sample_treatment_effect() {
    let dataset = generate(20_000, Variant::Sample);
    let formula: Formula = "outcome ~ treatment".parse().expect("formula");
    let result = ols(&dataset, &formula).expect("ols");

    let effect = result.coefficient("treatment").expect("treatment coefficient");
    assert!(
        (effect.estimate - Variant::Sample.treatment_effect()).abs() < 1.0,
        "estimate {} too far from {}",
        effect.estimate,
        Variant::Sample.treatment_effect()
    );
    assert!(effect.p_value < 0.01);

    let intercept = result.coefficient(INTERCEPT).expect("intercept");
    assert!((intercept.estimate - Variant::Sample.outcome_baseline()).abs() < 1.0);
    assert_eq!(result.n_obs, 20_000);
    assert_eq!(result.df_resid, 19_998);
}

#[test]
fn recovers_fake_treatment_effect_with_controls() {
    let dataset = generate(20_000, Variant::Fake);
    let formula = Formula::parse("outcome ~ treatment + age + income").expect("formula");
    let result = ols(&dataset, &formula).expect("ols");

    let effect = result.coefficient("treatment").expect("treatment coefficient");
    assert!((effect.estimate - Variant::Fake.treatment_effect()).abs() < 0.75);
    let age = result.coefficient("age").expect("age coefficient");
    assert!((age.estimate - 0.2).abs() < 0.05, "age slope {}", age.estimate);
    assert!(result.r_squared > 0.0 && result.r_squared < 1.0);
    assert!(result.adj_r_squared <= result.r_squared);
}

#[test]
fn engines_agree_on_generated_data() {
    let dataset = generate(500, Variant::Sample);

    let summary = summary_statistics(&dataset, None).expect("summary");
    assert_eq!(summary.rows.len(), 6);
    for row in &summary.rows {
        assert_eq!(row.count, 500);
        assert!(row.min <= row.mean && row.mean <= row.max);
        assert!(row.min <= row.median && row.median <= row.max);
    }
    let age = summary.row("age").expect("age");
    assert!(age.min >= 18.0 && age.max <= 80.0);

    let covariates: Vec<String> = ["age", "income", "education_years"]
        .iter()
        .map(|v| v.to_string())
        .collect();
    let balance = balance_table(&dataset, "treatment", &covariates).expect("balance");
    for row in &balance.rows {
        assert_eq!(row.n_control + row.n_treatment, 500);
        assert!(row.std_error.expect("both groups are large") > 0.0);
    }

    let overview = dataset_overview(&dataset, "treatment", "outcome").expect("overview");
    assert_eq!(overview.groups.len(), 2);
    assert_eq!(overview.total_missing(), 0);
    let treated = overview
        .groups
        .iter()
        .find(|group| group.value == "1")
        .expect("treated group");
    let control = overview
        .groups
        .iter()
        .find(|group| group.value == "0")
        .expect("control group");
    let treated_mean = treated.mean_outcome.expect("treated mean");
    let control_mean = control.mean_outcome.expect("control mean");
    let outcome_row = balance_table(&dataset, "treatment", &["outcome".to_string()])
        .expect("outcome balance");
    assert!((outcome_row.rows[0].difference - (treated_mean - control_mean)).abs() < 1e-9);
}

#[test]
fn derived_variables_cover_generated_rows() {
    let dataset = generate(500, Variant::Fake);
    let derived = derive_variables(&dataset, &DeriveOptions::default()).expect("derive");
    assert_eq!(derived.row_count(), dataset.row_count());
    for name in ["age_group", "log_income", "income_quartile"] {
        let column = derived.column(name).expect("derived column");
        assert_eq!(column.data.missing_count(), 0, "{name} has gaps");
    }
}
