use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use empirica_core::{ColumnData, validate_dataset, write_csv};
use empirica_generate::{GenerateOptions, GenerationEngine, Variant};

fn temp_out_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("empirica_generate_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp out dir");
    dir
}

fn hash_file(path: &Path) -> String {
    let bytes = fs::read(path).expect("read generated csv");
    hex::encode(Sha256::digest(&bytes))
}

fn options(rows: usize, seed: u64, variant: Variant) -> GenerateOptions {
    GenerateOptions {
        rows,
        seed,
        variant,
    }
}

#[test]
fn generate_is_deterministic() {
    for variant in [Variant::Sample, Variant::Fake] {
        let engine = GenerationEngine::new(options(500, 42, variant));
        let first = engine.run().expect("first run");
        let second = engine.run().expect("second run");
        assert_eq!(first, second, "{variant} should be deterministic");

        let dir = temp_out_dir(variant.as_str());
        let path_a = dir.join("a.csv");
        let path_b = dir.join("b.csv");
        write_csv(&path_a, &first).expect("write a");
        write_csv(&path_b, &second).expect("write b");
        assert_eq!(hash_file(&path_a), hash_file(&path_b));
    }
}

#[test]
fn first_row_is_stable_across_engines() {
    let first = GenerationEngine::new(options(500, 42, Variant::Sample))
        .run()
        .expect("first engine");
    // Interleave an unrelated run to prove there is no shared random state.
    GenerationEngine::new(options(10, 7, Variant::Fake))
        .run()
        .expect("unrelated run");
    let second = GenerationEngine::new(options(500, 42, Variant::Sample))
        .run()
        .expect("second engine");

    for name in ["id", "treatment", "age", "income"] {
        let a = first.numeric(name).expect("numeric column");
        let b = second.numeric(name).expect("numeric column");
        assert_eq!(a[0].map(f64::to_bits), b[0].map(f64::to_bits), "{name}");
    }
}

#[test]
fn first_row_matches_reference_run() {
    let sample = GenerationEngine::new(options(500, 42, Variant::Sample))
        .run()
        .expect("sample");
    let first = |name: &str| sample.numeric(name).expect("numeric column")[0];
    assert_eq!(first("id"), Some(1.0));
    assert_eq!(first("treatment"), Some(1.0));
    assert_eq!(first("age"), Some(38.0));
    assert_eq!(first("income"), Some(30772.78));
    assert_eq!(first("education_years"), Some(12.0));
    assert_eq!(first("outcome"), Some(130.5));

    let fake = GenerationEngine::new(options(500, 42, Variant::Fake))
        .run()
        .expect("fake");
    let first = |name: &str| fake.numeric(name).expect("numeric column")[0];
    assert_eq!(first("treatment"), Some(1.0));
    assert_eq!(first("age"), Some(37.0));
    assert_eq!(first("income"), Some(30772.78212363344));
    assert_eq!(first("satisfaction"), Some(7.0));
    assert_eq!(first("outcome"), Some(72.08929429893678));
    assert_eq!(
        fake.column("education").expect("education").data.cell_text(0),
        Some("Master".to_string())
    );
}

#[test]
fn golden_files_are_stable() {
    let out_dir = temp_out_dir("golden");
    let sample_csv = out_dir.join("sample_data.csv");
    let fake_csv = out_dir.join("generated_fake_data.csv");

    let sample = GenerationEngine::new(options(500, 42, Variant::Sample))
        .run()
        .expect("sample");
    let fake = GenerationEngine::new(options(500, 42, Variant::Fake))
        .run()
        .expect("fake");
    write_csv(&sample_csv, &sample).expect("write sample");
    write_csv(&fake_csv, &fake).expect("write fake");

    let expected_sample = "6c7a61ad706b889eaa0b229f4028851e99f9981199527d2b1f4395fa22315e71";
    let expected_fake = "9c36fe9b7c6621c97d87259644567edd73b4f25035374f363d6ff0dff93cd63b";

    assert_eq!(hash_file(&sample_csv), expected_sample, "sample hash mismatch");
    assert_eq!(hash_file(&fake_csv), expected_fake, "fake hash mismatch");
    let _ = fs::remove_dir_all(&out_dir);
}

#[test]
fn seeds_produce_different_data() {
    let a = GenerationEngine::new(options(100, 1, Variant::Sample))
        .run()
        .expect("seed 1");
    let b = GenerationEngine::new(options(100, 2, Variant::Sample))
        .run()
        .expect("seed 2");
    assert_ne!(a.numeric("income").expect("a"), b.numeric("income").expect("b"));
}

#[test]
fn sample_variant_follows_column_rules() {
    let dataset = GenerationEngine::new(options(500, 42, Variant::Sample))
        .run()
        .expect("generate");

    assert_eq!(dataset.row_count(), 500);
    assert_eq!(dataset.column_names(), Variant::Sample.columns().to_vec());

    let ids: Vec<f64> = dataset.numeric("id").expect("id").into_iter().flatten().collect();
    assert_eq!(ids.first(), Some(&1.0));
    assert_eq!(ids.last(), Some(&500.0));

    for value in dataset.numeric("treatment").expect("treatment").into_iter().flatten() {
        assert!(value == 0.0 || value == 1.0);
    }
    for value in dataset.numeric("age").expect("age").into_iter().flatten() {
        assert!((18.0..=80.0).contains(&value));
    }
    for value in dataset.numeric("income").expect("income").into_iter().flatten() {
        assert!(value >= 5000.0);
    }
    for value in dataset
        .numeric("education_years")
        .expect("education_years")
        .into_iter()
        .flatten()
    {
        assert!([12.0, 14.0, 16.0, 18.0, 20.0].contains(&value));
    }
}

#[test]
fn fake_variant_follows_column_rules() {
    let dataset = GenerationEngine::new(options(1000, 42, Variant::Fake))
        .run()
        .expect("generate");

    assert_eq!(dataset.column_names(), Variant::Fake.columns().to_vec());

    let education = &dataset.column("education").expect("education").data;
    let ColumnData::Text(levels) = education else {
        panic!("education should be text");
    };
    for level in levels.iter().flatten() {
        assert!(["High School", "Bachelor", "Master", "PhD"].contains(&level.as_str()));
    }

    for value in dataset
        .numeric("satisfaction")
        .expect("satisfaction")
        .into_iter()
        .flatten()
    {
        assert!((1.0..=10.0).contains(&value));
    }
    for value in dataset.numeric("age").expect("age").into_iter().flatten() {
        assert!((18.0..=80.0).contains(&value));
    }
}

#[test]
fn generated_sample_validates_clean() {
    let dataset = GenerationEngine::new(options(500, 42, Variant::Sample))
        .run()
        .expect("generate");
    let report = validate_dataset(&dataset);
    assert!(report.passed(), "unexpected issues: {report}");
}
