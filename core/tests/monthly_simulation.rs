//! Revenue and churn invariants over a full clean table.

use merchant_sim_core::{
    config::GeneratorConfig,
    dataset::{Dataset, DatasetRow},
    pipeline::DatasetPipeline,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn clean_dataset(seed: u64) -> Dataset {
    DatasetPipeline::build(format!("sim-{seed}"), seed, GeneratorConfig::standard())
        .unwrap()
        .run(false)
        .unwrap()
}

fn per_merchant(dataset: &Dataset) -> Vec<Vec<&DatasetRow>> {
    dataset
        .merchants
        .iter()
        .map(|m| dataset.rows_for(&m.merchant_id).collect())
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn every_merchant_has_between_one_and_twelve_rows() {
    let dataset = clean_dataset(42);
    for rows in per_merchant(&dataset) {
        assert!((1..=12).contains(&rows.len()), "got {} rows", rows.len());
    }
    let total: usize = per_merchant(&dataset).iter().map(Vec::len).sum();
    assert_eq!(total, dataset.len(), "rows must be grouped by merchant");
}

#[test]
fn new_mrr_only_in_first_month() {
    let dataset = clean_dataset(42);
    for rows in per_merchant(&dataset) {
        assert!(rows[0].new_mrr >= 15.0, "first row: {:?}", rows[0]);
        for r in &rows[1..] {
            assert_eq!(r.new_mrr, 0.0, "later row carries new MRR: {r:?}");
        }
    }
}

#[test]
fn first_month_new_mrr_equals_mrr_without_expansion_or_churn() {
    let dataset = clean_dataset(7);
    let mut checked = 0;
    for rows in per_merchant(&dataset) {
        let first = rows[0];
        if first.active_status && first.expansion_mrr == 0.0 {
            assert_eq!(first.new_mrr, first.mrr, "{first:?}");
            checked += 1;
        }
    }
    assert!(checked > 100, "only {checked} plain first months checked");
}

#[test]
fn churn_row_is_unique_and_last() {
    let dataset = clean_dataset(42);
    for rows in per_merchant(&dataset) {
        let inactive: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.active_status)
            .map(|(i, _)| i)
            .collect();
        assert!(inactive.len() <= 1, "{} churn rows for {}", inactive.len(), rows[0].merchant_id);
        if let Some(&i) = inactive.first() {
            assert_eq!(i, rows.len() - 1, "rows follow a churn for {}", rows[0].merchant_id);
        } else {
            assert_eq!(rows.len(), 12, "surviving merchant must run the full calendar");
        }
    }
}

#[test]
fn usage_metrics_follow_active_flag() {
    let dataset = clean_dataset(42);
    for r in &dataset.rows {
        assert!(r.mrr >= 0.0);
        if r.active_status {
            assert!(r.transaction_count >= 20, "{r:?}");
            assert!(r.total_payment_volume >= 2.0 * r.transaction_count as f64 - 0.01);
        } else {
            assert_eq!(r.transaction_count, 0);
            assert_eq!(r.total_payment_volume, 0.0);
            assert!((r.mrr - r.expansion_mrr).abs() <= 0.01, "churn wipes the opening MRR: {r:?}");
        }
    }
}

#[test]
fn mrr_carries_forward_month_to_month() {
    let dataset = clean_dataset(11);
    for rows in per_merchant(&dataset) {
        for pair in rows.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            let expected = (prev.mrr + cur.expansion_mrr - cur.churned_mrr).max(0.0);
            // Each column is rounded to cents on its own.
            assert!(
                (cur.mrr - expected).abs() <= 0.02,
                "{} {}: mrr {} expected {}",
                cur.merchant_id, cur.month, cur.mrr, expected
            );
            if !cur.active_status {
                assert!((cur.churned_mrr - prev.mrr).abs() <= 0.01);
            }
        }
    }
}

#[test]
fn months_are_consecutive_from_window_start() {
    let dataset = clean_dataset(42);
    let expected = [
        "2024-02-01", "2024-03-01", "2024-04-01", "2024-05-01", "2024-06-01", "2024-07-01",
        "2024-08-01", "2024-09-01", "2024-10-01", "2024-11-01", "2024-12-01", "2025-01-01",
    ];
    for rows in per_merchant(&dataset) {
        for (r, month) in rows.iter().zip(expected.iter()) {
            assert_eq!(&r.month, month);
        }
    }
}

#[test]
fn basic_plan_churns_more_than_enterprise() {
    let mut config = GeneratorConfig::standard();
    config.merchant_count = 5_000;
    let dataset = DatasetPipeline::build("churn-mix".into(), 2024, config)
        .unwrap()
        .run(false)
        .unwrap();

    let churn_share = |plan: &str| {
        let merchants = dataset
            .rows
            .iter()
            .filter(|r| r.subscription_plan == plan && r.month == "2024-02-01")
            .count() as f64;
        let churned = dataset
            .rows
            .iter()
            .filter(|r| r.subscription_plan == plan && !r.active_status)
            .count() as f64;
        churned / merchants
    };

    assert!(churn_share("Basic") > churn_share("Enterprise"));
}

#[test]
fn summary_counts_match_table() {
    let dataset = clean_dataset(42);
    let summary = dataset.summary();
    assert_eq!(summary.merchants, 500);
    assert_eq!(summary.rows, dataset.len());
    assert_eq!(summary.active_rows + summary.churned_merchants, summary.rows);
    assert!(summary.closing_mrr > 0.0);
}
