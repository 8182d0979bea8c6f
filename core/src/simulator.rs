//! Monthly revenue simulation for a single merchant.
//!
//! Each merchant moves through an explicit lifecycle:
//!
//!   Onboarding ──first month──▶ Active { mrr } ──churn──▶ Churned
//!
//! Churned is terminal. The simulation is an Iterator that yields one
//! MonthlyRecord per calendar month and stops for good after the churn
//! month or at the end of the calendar, whichever comes first.

use crate::{
    calendar::MonthCalendar,
    config::{ExpansionConfig, GeneratorConfig, UniformRange, UsageConfig},
    dataset::round2,
    error::GenResult,
    merchant::{Channel, Governorate, Industry, Merchant, Plan},
    rng::SimRng,
    types::MerchantId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::slice;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MerchantLifecycle {
    /// No month simulated yet; the opening MRR is still undrawn.
    Onboarding,
    Active { mrr: f64 },
    Churned,
}

impl MerchantLifecycle {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Churned)
    }
}

/// One simulated merchant-month, before rounding and defect injection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyRecord {
    pub merchant_id: MerchantId,
    pub month: NaiveDate,
    pub industry: Industry,
    pub governorate: Governorate,
    pub plan: Plan,
    pub channel: Channel,
    pub acquisition_cost: f64,
    pub mrr: f64,
    pub new_mrr: f64,
    pub expansion_mrr: f64,
    pub churned_mrr: f64,
    pub active: bool,
    pub transaction_count: i64,
    pub total_payment_volume: f64,
}

/// Parameters resolved once per merchant so the per-month loop never
/// has to look anything up.
#[derive(Debug, Clone, Copy)]
struct MerchantTerms {
    initial_mrr: UniformRange,
    churn_probability: f64,
    txn_mean: f64,
}

pub struct MonthlySimulation<'a> {
    merchant: &'a Merchant,
    months: slice::Iter<'a, NaiveDate>,
    rng: &'a mut SimRng,
    terms: MerchantTerms,
    expansion: &'a ExpansionConfig,
    usage: &'a UsageConfig,
    lifecycle: MerchantLifecycle,
}

impl<'a> MonthlySimulation<'a> {
    pub fn new(
        merchant: &'a Merchant,
        calendar: &'a MonthCalendar,
        config: &'a GeneratorConfig,
        rng: &'a mut SimRng,
    ) -> GenResult<Self> {
        let plan = config.plan(merchant.plan)?;
        let industry = config.industry(merchant.industry)?;
        Ok(Self {
            merchant,
            months: calendar.months().iter(),
            rng,
            terms: MerchantTerms {
                initial_mrr: plan.initial_mrr,
                churn_probability: plan.churn_probability,
                txn_mean: industry.txn_mean,
            },
            expansion: &config.expansion,
            usage: &config.usage,
            lifecycle: MerchantLifecycle::Onboarding,
        })
    }

    pub fn lifecycle(&self) -> MerchantLifecycle {
        self.lifecycle
    }

    fn simulate_month(&mut self, month: NaiveDate) -> MonthlyRecord {
        let (opening_mrr, new_mrr) = match self.lifecycle {
            MerchantLifecycle::Onboarding => {
                let initial = self
                    .rng
                    .uniform(self.terms.initial_mrr.low, self.terms.initial_mrr.high);
                (initial, initial)
            }
            MerchantLifecycle::Active { mrr } => (mrr, 0.0),
            // next() never calls us once churned.
            MerchantLifecycle::Churned => (0.0, 0.0),
        };

        let expansion_mrr = if self.rng.chance(self.expansion.probability) {
            self.rng
                .uniform(self.expansion.amount.low, self.expansion.amount.high)
        } else {
            0.0
        };

        let churned = self.rng.chance(self.terms.churn_probability);
        let churned_mrr = if churned { opening_mrr } else { 0.0 };
        let mrr = (opening_mrr + expansion_mrr - churned_mrr).max(0.0);
        let active = !churned;

        let (transaction_count, total_payment_volume) = if active {
            let raw = self.rng.normal(self.terms.txn_mean, self.usage.txn_std_dev);
            // Truncate toward zero, then clamp to the floor.
            let count = (raw.trunc() as i64).max(self.usage.txn_floor);
            let ticket = self
                .rng
                .uniform(self.usage.avg_ticket.low, self.usage.avg_ticket.high);
            (count, round2(count as f64 * ticket))
        } else {
            (0, 0.0)
        };

        self.lifecycle = if active {
            MerchantLifecycle::Active { mrr }
        } else {
            log::debug!(
                "monthly_simulator: {} churned in {month} (lost {churned_mrr:.2} MRR)",
                self.merchant.merchant_id
            );
            MerchantLifecycle::Churned
        };

        MonthlyRecord {
            merchant_id: self.merchant.merchant_id.clone(),
            month,
            industry: self.merchant.industry,
            governorate: self.merchant.governorate,
            plan: self.merchant.plan,
            channel: self.merchant.channel,
            acquisition_cost: self.merchant.acquisition_cost,
            mrr,
            new_mrr,
            expansion_mrr,
            churned_mrr,
            active,
            transaction_count,
            total_payment_volume,
        }
    }
}

impl Iterator for MonthlySimulation<'_> {
    type Item = MonthlyRecord;

    fn next(&mut self) -> Option<MonthlyRecord> {
        if self.lifecycle.is_terminal() {
            return None;
        }
        let month = *self.months.next()?;
        Some(self.simulate_month(month))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.lifecycle.is_terminal() {
            (0, Some(0))
        } else {
            (0, Some(self.months.len()))
        }
    }
}
