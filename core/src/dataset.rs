//! The exported table: one flat row per merchant-month.

use crate::{
    calendar::format_month,
    merchant::Merchant,
    simulator::MonthlyRecord,
    types::MerchantId,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Round to cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Output column order. Must match the field order of DatasetRow.
pub const COLUMNS: [&str; 14] = [
    "merchant_id",
    "month",
    "merchant_industry",
    "merchant_governorate",
    "subscription_plan",
    "acquisition_channel",
    "customer_acquisition_cost",
    "mrr",
    "new_mrr",
    "expansion_mrr",
    "churned_mrr",
    "active_status",
    "total_payment_volume",
    "transaction_count",
];

/// Acquisition cost as it appears in the table. Clean rows are always
/// `Amount`; `Text` only arrives through defect injection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CostCell {
    Amount(f64),
    Text(String),
}

impl CostCell {
    pub fn as_amount(&self) -> Option<f64> {
        match self {
            Self::Amount(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for CostCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Text columns are free-form so injected defects can be represented.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetRow {
    pub merchant_id: MerchantId,
    pub month: String,
    pub merchant_industry: String,
    pub merchant_governorate: String,
    pub subscription_plan: String,
    pub acquisition_channel: String,
    pub customer_acquisition_cost: CostCell,
    pub mrr: f64,
    pub new_mrr: f64,
    pub expansion_mrr: f64,
    pub churned_mrr: f64,
    pub active_status: bool,
    pub total_payment_volume: f64,
    pub transaction_count: i64,
}

impl From<&MonthlyRecord> for DatasetRow {
    fn from(r: &MonthlyRecord) -> Self {
        Self {
            merchant_id: r.merchant_id.clone(),
            month: format_month(r.month),
            merchant_industry: r.industry.label().into(),
            merchant_governorate: r.governorate.label().into(),
            subscription_plan: r.plan.label().into(),
            acquisition_channel: r.channel.label().into(),
            customer_acquisition_cost: CostCell::Amount(round2(r.acquisition_cost)),
            mrr: round2(r.mrr),
            new_mrr: round2(r.new_mrr),
            expansion_mrr: round2(r.expansion_mrr),
            churned_mrr: round2(r.churned_mrr),
            active_status: r.active,
            total_payment_volume: r.total_payment_volume,
            transaction_count: r.transaction_count,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub merchants: Vec<Merchant>,
    pub rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows belonging to one merchant, in month order.
    pub fn rows_for<'a>(&'a self, merchant_id: &'a str) -> impl Iterator<Item = &'a DatasetRow> + 'a {
        self.rows.iter().filter(move |r| r.merchant_id == merchant_id)
    }

    pub fn summary(&self) -> DatasetSummary {
        let mut summary = DatasetSummary {
            merchants: self.merchants.len(),
            rows: self.rows.len(),
            ..DatasetSummary::default()
        };
        for (i, row) in self.rows.iter().enumerate() {
            if row.active_status {
                summary.active_rows += 1;
            } else {
                summary.churned_merchants += 1;
            }
            let last_for_merchant = self
                .rows
                .get(i + 1)
                .map_or(true, |next| next.merchant_id != row.merchant_id);
            if last_for_merchant {
                summary.closing_mrr += row.mrr;
            }
        }
        summary.closing_mrr = round2(summary.closing_mrr);
        summary
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub merchants: usize,
    pub rows: usize,
    pub active_rows: usize,
    pub churned_merchants: usize,
    /// Sum of every merchant's MRR in its last emitted month.
    pub closing_mrr: f64,
}
