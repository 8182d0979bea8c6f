//! Data-quality defect injection.
//!
//! Every pass draws its own row sample, independent of earlier passes,
//! so a row can collect several defects and later passes overwrite
//! earlier ones on the same column.

use crate::{
    dataset::{CostCell, Dataset, DatasetRow},
    rng::SimRng,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    SetGovernorate { value: String },
    /// Scales numeric cells; text cells are left alone.
    ScaleAcquisitionCost { factor: f64 },
    SetAcquisitionCost { value: f64 },
    SetAcquisitionCostText { value: String },
    ReplaceMonthSeparator { from: String, to: String },
    SetTransactionCount { value: i64 },
    ScaleTransactionCount { factor: i64 },
}

impl Mutation {
    /// The output column this mutation writes.
    pub fn column(&self) -> &'static str {
        match self {
            Self::SetGovernorate { .. } => "merchant_governorate",
            Self::ScaleAcquisitionCost { .. }
            | Self::SetAcquisitionCost { .. }
            | Self::SetAcquisitionCostText { .. } => "customer_acquisition_cost",
            Self::ReplaceMonthSeparator { .. } => "month",
            Self::SetTransactionCount { .. } | Self::ScaleTransactionCount { .. } => {
                "transaction_count"
            }
        }
    }

    pub fn apply(&self, row: &mut DatasetRow) {
        match self {
            Self::SetGovernorate { value } => row.merchant_governorate = value.clone(),
            Self::ScaleAcquisitionCost { factor } => {
                if let CostCell::Amount(v) = &mut row.customer_acquisition_cost {
                    *v *= factor;
                }
            }
            Self::SetAcquisitionCost { value } => {
                row.customer_acquisition_cost = CostCell::Amount(*value)
            }
            Self::SetAcquisitionCostText { value } => {
                row.customer_acquisition_cost = CostCell::Text(value.clone())
            }
            Self::ReplaceMonthSeparator { from, to } => row.month = row.month.replace(from, to),
            Self::SetTransactionCount { value } => row.transaction_count = *value,
            Self::ScaleTransactionCount { factor } => {
                row.transaction_count = row.transaction_count.saturating_mul(*factor)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefectPass {
    /// Share of rows sampled for this pass, rounded to the nearest row.
    pub fraction: f64,
    #[serde(flatten)]
    pub mutation: Mutation,
}

impl DefectPass {
    pub fn sample_size(&self, rows: usize) -> usize {
        ((self.fraction * rows as f64).round() as usize).min(rows)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PassOutcome {
    pub pass_index: usize,
    pub column: &'static str,
    pub rows: Vec<usize>,
}

pub struct DefectInjector<'a> {
    passes: &'a [DefectPass],
}

impl<'a> DefectInjector<'a> {
    pub fn new(passes: &'a [DefectPass]) -> Self {
        Self { passes }
    }

    /// Apply every pass in order, mutating the table in place.
    /// Returns which rows each pass touched.
    pub fn inject(&self, dataset: &mut Dataset, rng: &mut SimRng) -> Vec<PassOutcome> {
        let n = dataset.rows.len();
        let mut outcomes = Vec::with_capacity(self.passes.len());

        for (pass_index, pass) in self.passes.iter().enumerate() {
            let mut rows = rng.sample_indices(n, pass.sample_size(n));
            rows.sort_unstable();
            for &i in &rows {
                pass.mutation.apply(&mut dataset.rows[i]);
            }
            log::debug!(
                "defect_injector: pass {pass_index} ({}) hit {} rows",
                pass.mutation.column(),
                rows.len()
            );
            outcomes.push(PassOutcome {
                pass_index,
                column: pass.mutation.column(),
                rows,
            });
        }

        log::info!(
            "defect_injector: applied {} passes over {n} rows",
            self.passes.len()
        );
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> DatasetRow {
        DatasetRow {
            merchant_id: "M10000".into(),
            month: "2024-02-01".into(),
            merchant_industry: "Retail".into(),
            merchant_governorate: "Irbid".into(),
            subscription_plan: "Pro".into(),
            acquisition_channel: "Online".into(),
            customer_acquisition_cost: CostCell::Amount(25.5),
            mrr: 80.0,
            new_mrr: 80.0,
            expansion_mrr: 0.0,
            churned_mrr: 0.0,
            active_status: true,
            total_payment_volume: 4000.0,
            transaction_count: 700,
        }
    }

    #[test]
    fn month_separator_replaced_everywhere() {
        let mut r = row();
        Mutation::ReplaceMonthSeparator { from: "-".into(), to: "/".into() }.apply(&mut r);
        assert_eq!(r.month, "2024/02/01");
    }

    #[test]
    fn scaling_skips_text_cost() {
        let mut r = row();
        Mutation::SetAcquisitionCostText { value: "50JOD".into() }.apply(&mut r);
        Mutation::ScaleAcquisitionCost { factor: 100.0 }.apply(&mut r);
        assert_eq!(r.customer_acquisition_cost, CostCell::Text("50JOD".into()));

        let mut r = row();
        Mutation::ScaleAcquisitionCost { factor: 100.0 }.apply(&mut r);
        assert_eq!(r.customer_acquisition_cost, CostCell::Amount(2550.0));
    }

    #[test]
    fn sample_size_rounds_to_nearest_row() {
        let pass = DefectPass {
            fraction: 0.02,
            mutation: Mutation::SetTransactionCount { value: -1 },
        };
        assert_eq!(pass.sample_size(0), 0);
        assert_eq!(pass.sample_size(24), 0);
        assert_eq!(pass.sample_size(25), 1);
        assert_eq!(pass.sample_size(3000), 60);
    }

    #[test]
    fn pass_json_is_flat() {
        let pass = DefectPass {
            fraction: 0.02,
            mutation: Mutation::SetGovernorate { value: "amman".into() },
        };
        let json = serde_json::to_value(&pass).unwrap();
        assert_eq!(json["kind"], "set_governorate");
        assert_eq!(json["value"], "amman");
        assert_eq!(json["fraction"], 0.02);
    }
}
