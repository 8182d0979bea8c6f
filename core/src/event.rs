//! Pipeline event log.
//!
//! RULE: every state change a reader might want to audit (a merchant
//! appearing, a merchant churning, a defect pass landing) is recorded
//! as a PipelineEvent. The log is part of the determinism contract:
//! same seed and config, same log.

use crate::types::{MerchantId, RowIndex, RunId};
use serde::{Deserialize, Serialize};

/// Variants are appended over time, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    RunInitialized {
        run_id: RunId,
        seed: u64,
    },
    MerchantOnboarded {
        merchant_id: MerchantId,
        month: String,
        plan: String,
        new_mrr: f64,
    },
    MerchantChurned {
        merchant_id: MerchantId,
        month: String,
        churned_mrr: f64,
        months_active: usize,
    },
    DefectPassApplied {
        pass_index: usize,
        column: String,
        rows: Vec<RowIndex>,
    },
    DatasetCompleted {
        merchants: usize,
        rows: usize,
    },
}

impl PipelineEvent {
    /// Stable name for the event_type column in event_log.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunInitialized { .. }    => "run_initialized",
            Self::MerchantOnboarded { .. } => "merchant_onboarded",
            Self::MerchantChurned { .. }   => "merchant_churned",
            Self::DefectPassApplied { .. } => "defect_pass_applied",
            Self::DatasetCompleted { .. }  => "dataset_completed",
        }
    }
}

/// A persisted event. `seq` orders entries within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub seq:        u64,
    pub stage:      String,
    pub event_type: String,
    pub payload:    String,
}
