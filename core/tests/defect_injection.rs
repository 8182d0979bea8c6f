//! Defect injection: targeted columns leave their clean domain in
//! roughly three 2% samples' worth of rows, and nothing else changes.

use merchant_sim_core::{
    config::GeneratorConfig,
    dataset::{CostCell, Dataset},
    event::PipelineEvent,
    pipeline::DatasetPipeline,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

const GOVERNORATES: [&str; 5] = ["Amman", "Zarqa", "Irbid", "Aqaba", "Other"];

fn pipeline(seed: u64) -> DatasetPipeline {
    DatasetPipeline::build(format!("defects-{seed}"), seed, GeneratorConfig::standard()).unwrap()
}

/// Clean and dirty tables for the same seed.
fn clean_and_dirty(seed: u64) -> (Dataset, Dataset, DatasetPipeline) {
    let clean = pipeline(seed).run(false).unwrap();
    let mut p = pipeline(seed);
    let dirty = p.run(true).unwrap();
    (clean, dirty, p)
}

fn is_canonical_month(month: &str) -> bool {
    let b = month.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter().enumerate().all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
}

fn share(count: usize, dataset: &Dataset) -> f64 {
    count as f64 / dataset.len() as f64
}

fn assert_roughly_six_percent(column: &str, count: usize, dataset: &Dataset) {
    let s = share(count, dataset);
    assert!(
        (0.03..=0.065).contains(&s),
        "{column}: {count} of {} rows dirty ({:.2}%)",
        dataset.len(),
        s * 100.0
    );
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn clean_export_has_no_defects() {
    let clean = pipeline(42).run(false).unwrap();
    let config = GeneratorConfig::standard();
    for (r, m) in clean.rows.iter().map(|r| {
        let m = clean.merchants.iter().find(|m| m.merchant_id == r.merchant_id).unwrap();
        (r, m)
    }) {
        assert!(GOVERNORATES.contains(&r.merchant_governorate.as_str()));
        assert!(is_canonical_month(&r.month), "{}", r.month);
        let range = config.channel(m.channel).unwrap().acquisition_cost;
        let cost = r.customer_acquisition_cost.as_amount().expect("numeric cost");
        // Rounded to cents, so the upper bound is inclusive.
        assert!(cost >= range.low && cost <= range.high, "{cost}");
        assert!(r.transaction_count >= 0);
    }
}

#[test]
fn governorate_defects() {
    let (_, dirty, _) = clean_and_dirty(42);
    let bad: Vec<&str> = dirty
        .rows
        .iter()
        .map(|r| r.merchant_governorate.as_str())
        .filter(|g| !GOVERNORATES.contains(g))
        .collect();
    assert!(bad.iter().all(|g| ["amman", "Zaqra", " Amman "].contains(g)));
    assert!(bad.contains(&"amman"));
    assert!(bad.contains(&"Zaqra"));
    assert!(bad.contains(&" Amman "));
    assert_roughly_six_percent("merchant_governorate", bad.len(), &dirty);
}

#[test]
fn acquisition_cost_defects() {
    let (clean, dirty, _) = clean_and_dirty(42);
    let mut outliers = 0;
    let mut negatives = 0;
    let mut texts = 0;
    for (c, d) in clean.rows.iter().zip(dirty.rows.iter()) {
        match (&c.customer_acquisition_cost, &d.customer_acquisition_cost) {
            (CostCell::Amount(_), CostCell::Text(t)) => {
                assert_eq!(t, "50JOD");
                texts += 1;
            }
            (CostCell::Amount(_), CostCell::Amount(v)) if *v == -20.0 => negatives += 1,
            (CostCell::Amount(a), CostCell::Amount(v)) if v != a => {
                assert!((v - a * 100.0).abs() < 1e-6, "unexpected cost {v} from {a}");
                outliers += 1;
            }
            (CostCell::Amount(_), CostCell::Amount(_)) => {}
            (CostCell::Text(_), _) => panic!("clean table holds a text cost"),
        }
    }
    assert!(outliers > 0 && negatives > 0 && texts > 0);
    assert_roughly_six_percent("customer_acquisition_cost", outliers + negatives + texts, &dirty);
}

#[test]
fn month_defects() {
    let (clean, dirty, _) = clean_and_dirty(42);
    let mut bad = 0;
    for (c, d) in clean.rows.iter().zip(dirty.rows.iter()) {
        if d.month != c.month {
            let digits: String = d.month.chars().filter(char::is_ascii_digit).collect();
            assert_eq!(digits, c.month.replace('-', ""), "date value changed, not just format");
            assert!(!is_canonical_month(&d.month));
            bad += 1;
        }
    }
    assert!(dirty.rows.iter().any(|r| r.month.contains('/')));
    assert_roughly_six_percent("month", bad, &dirty);
}

#[test]
fn transaction_count_defects() {
    let (clean, dirty, _) = clean_and_dirty(42);
    let changed = clean
        .rows
        .iter()
        .zip(dirty.rows.iter())
        .filter(|(c, d)| c.transaction_count != d.transaction_count)
        .count();
    assert!(dirty.rows.iter().any(|r| r.transaction_count == -1));
    assert!(dirty.rows.iter().any(|r| r.transaction_count == -999));
    // Scaling a churned row's zero count is a no-op, so allow a little slack.
    assert_roughly_six_percent("transaction_count", changed, &dirty);
}

#[test]
fn untargeted_columns_are_untouched() {
    let (clean, dirty, _) = clean_and_dirty(42);
    assert_eq!(clean.len(), dirty.len());
    for (c, d) in clean.rows.iter().zip(dirty.rows.iter()) {
        assert_eq!(c.merchant_id, d.merchant_id);
        assert_eq!(c.merchant_industry, d.merchant_industry);
        assert_eq!(c.subscription_plan, d.subscription_plan);
        assert_eq!(c.acquisition_channel, d.acquisition_channel);
        assert_eq!(c.mrr, d.mrr);
        assert_eq!(c.new_mrr, d.new_mrr);
        assert_eq!(c.expansion_mrr, d.expansion_mrr);
        assert_eq!(c.churned_mrr, d.churned_mrr);
        assert_eq!(c.active_status, d.active_status);
        assert_eq!(c.total_payment_volume, d.total_payment_volume);
    }
}

#[test]
fn each_pass_samples_two_percent_of_rows() {
    let (_, dirty, p) = clean_and_dirty(42);
    let expected = (0.02 * dirty.len() as f64).round() as usize;

    let passes: Vec<(usize, &Vec<usize>)> = p
        .events()
        .iter()
        .filter_map(|e| match &e.event {
            PipelineEvent::DefectPassApplied { pass_index, rows, .. } => Some((*pass_index, rows)),
            _ => None,
        })
        .collect();

    assert_eq!(passes.len(), 12);
    for (i, rows) in &passes {
        assert_eq!(rows.len(), expected, "pass {i}");
    }

    // The last governorate pass is never overwritten.
    for &row in passes[2].1 {
        assert_eq!(dirty.rows[row].merchant_governorate, " Amman ");
    }
    // Nor is the last cost pass.
    for &row in passes[5].1 {
        assert_eq!(dirty.rows[row].customer_acquisition_cost, CostCell::Text("50JOD".into()));
    }
}
