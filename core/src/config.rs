use crate::{
    defects::{DefectPass, Mutation},
    error::{GenError, GenResult},
    merchant::{Channel, Governorate, Industry, Plan},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Tolerance for "weights sum to 1". Anything further off is rejected,
/// never renormalized.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Half-open uniform range [low, high).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct UniformRange {
    pub low: f64,
    pub high: f64,
}

impl UniformRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value < self.high
    }

    fn validate(&self, field: &str) -> GenResult<()> {
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err(GenError::invalid_config(field, "range bounds must be finite"));
        }
        if self.low >= self.high {
            return Err(GenError::invalid_config(
                field,
                format!("empty range [{}, {})", self.low, self.high),
            ));
        }
        Ok(())
    }
}

// ── Categorical options ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndustryOption {
    pub industry: Industry,
    pub weight: f64,
    /// Mean of the monthly transaction count draw.
    pub txn_mean: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernorateOption {
    pub governorate: Governorate,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOption {
    pub plan: Plan,
    pub weight: f64,
    pub initial_mrr: UniformRange,
    pub churn_probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelOption {
    pub channel: Channel,
    pub weight: f64,
    pub acquisition_cost: UniformRange,
}

// ── Simulation parameters ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Last month of the window (inclusive), a month-start date.
    pub end: NaiveDate,
    pub periods: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionConfig {
    pub probability: f64,
    pub amount: UniformRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    pub txn_std_dev: f64,
    pub txn_floor: i64,
    pub avg_ticket: UniformRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub merchant_count: usize,
    pub merchant_id_prefix: String,
    pub merchant_id_offset: usize,
    pub calendar: CalendarConfig,
    pub industries: Vec<IndustryOption>,
    pub governorates: Vec<GovernorateOption>,
    pub plans: Vec<PlanOption>,
    pub channels: Vec<ChannelOption>,
    pub expansion: ExpansionConfig,
    pub usage: UsageConfig,
    pub defects: Vec<DefectPass>,
}

impl GeneratorConfig {
    /// Load a JSON config file. The result is validated before it is returned.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: GeneratorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// The stock dataset: 500 merchants over the 12 months ending 2025-01-01.
    pub fn standard() -> Self {
        Self {
            merchant_count: 500,
            merchant_id_prefix: "M".into(),
            merchant_id_offset: 10_000,
            calendar: CalendarConfig {
                end: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
                periods: 12,
            },
            industries: vec![
                IndustryOption { industry: Industry::FoodAndBeverage, weight: 0.40, txn_mean: 900.0 },
                IndustryOption { industry: Industry::Retail,          weight: 0.35, txn_mean: 700.0 },
                IndustryOption { industry: Industry::Hospitality,     weight: 0.15, txn_mean: 250.0 },
                IndustryOption { industry: Industry::Pharmacy,        weight: 0.10, txn_mean: 300.0 },
            ],
            governorates: vec![
                GovernorateOption { governorate: Governorate::Amman, weight: 0.50 },
                GovernorateOption { governorate: Governorate::Zarqa, weight: 0.15 },
                GovernorateOption { governorate: Governorate::Irbid, weight: 0.15 },
                GovernorateOption { governorate: Governorate::Aqaba, weight: 0.10 },
                GovernorateOption { governorate: Governorate::Other, weight: 0.10 },
            ],
            plans: vec![
                PlanOption {
                    plan: Plan::Basic,
                    weight: 0.55,
                    initial_mrr: UniformRange::new(15.0, 40.0),
                    churn_probability: 0.10,
                },
                PlanOption {
                    plan: Plan::Pro,
                    weight: 0.35,
                    initial_mrr: UniformRange::new(50.0, 120.0),
                    churn_probability: 0.05,
                },
                PlanOption {
                    plan: Plan::Enterprise,
                    weight: 0.10,
                    initial_mrr: UniformRange::new(200.0, 600.0),
                    churn_probability: 0.02,
                },
            ],
            channels: vec![
                ChannelOption {
                    channel: Channel::BankPartner,
                    weight: 0.45,
                    acquisition_cost: UniformRange::new(15.0, 40.0),
                },
                ChannelOption {
                    channel: Channel::SalesAgent,
                    weight: 0.35,
                    acquisition_cost: UniformRange::new(40.0, 100.0),
                },
                ChannelOption {
                    channel: Channel::Online,
                    weight: 0.20,
                    acquisition_cost: UniformRange::new(20.0, 60.0),
                },
            ],
            expansion: ExpansionConfig {
                probability: 0.10,
                amount: UniformRange::new(5.0, 80.0),
            },
            usage: UsageConfig {
                txn_std_dev: 120.0,
                txn_floor: 20,
                avg_ticket: UniformRange::new(2.0, 15.0),
            },
            defects: standard_defect_plan(),
        }
    }

    /// Small population for tests. Same distributions as standard().
    pub fn default_test() -> Self {
        Self {
            merchant_count: 50,
            ..Self::standard()
        }
    }

    /// Reject anything the generator cannot sample from faithfully.
    pub fn validate(&self) -> GenResult<()> {
        if self.calendar.periods == 0 {
            return Err(GenError::invalid_config("calendar.periods", "must be > 0"));
        }

        check_weights("industries", self.industries.iter().map(|o| o.weight))?;
        check_weights("governorates", self.governorates.iter().map(|o| o.weight))?;
        check_weights("plans", self.plans.iter().map(|o| o.weight))?;
        check_weights("channels", self.channels.iter().map(|o| o.weight))?;

        check_unique("industries", self.industries.iter().map(|o| o.industry))?;
        check_unique("governorates", self.governorates.iter().map(|o| o.governorate))?;
        check_unique("plans", self.plans.iter().map(|o| o.plan))?;
        check_unique("channels", self.channels.iter().map(|o| o.channel))?;

        for o in &self.industries {
            if !o.txn_mean.is_finite() {
                return Err(GenError::invalid_config(
                    format!("industries.{}.txn_mean", o.industry),
                    "must be finite",
                ));
            }
        }
        for o in &self.plans {
            o.initial_mrr.validate(&format!("plans.{}.initial_mrr", o.plan))?;
            if o.initial_mrr.low < 0.0 {
                return Err(GenError::invalid_config(
                    format!("plans.{}.initial_mrr", o.plan),
                    "initial MRR must be non-negative",
                ));
            }
            check_probability(&format!("plans.{}.churn_probability", o.plan), o.churn_probability)?;
        }
        for o in &self.channels {
            o.acquisition_cost
                .validate(&format!("channels.{}.acquisition_cost", o.channel))?;
        }

        check_probability("expansion.probability", self.expansion.probability)?;
        self.expansion.amount.validate("expansion.amount")?;

        if !self.usage.txn_std_dev.is_finite() || self.usage.txn_std_dev < 0.0 {
            return Err(GenError::invalid_config(
                "usage.txn_std_dev",
                "must be finite and non-negative",
            ));
        }
        self.usage.avg_ticket.validate("usage.avg_ticket")?;

        for (i, pass) in self.defects.iter().enumerate() {
            if !(pass.fraction.is_finite() && (0.0..=1.0).contains(&pass.fraction)) {
                return Err(GenError::invalid_config(
                    format!("defects[{i}].fraction"),
                    format!("{} is outside [0, 1]", pass.fraction),
                ));
            }
            if let Mutation::ReplaceMonthSeparator { from, .. } = &pass.mutation {
                if from.is_empty() {
                    return Err(GenError::invalid_config(
                        format!("defects[{i}].from"),
                        "separator to replace must not be empty",
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn industry(&self, industry: Industry) -> GenResult<&IndustryOption> {
        self.industries
            .iter()
            .find(|o| o.industry == industry)
            .ok_or_else(|| GenError::invalid_config("industries", format!("no entry for {industry}")))
    }

    pub fn plan(&self, plan: Plan) -> GenResult<&PlanOption> {
        self.plans
            .iter()
            .find(|o| o.plan == plan)
            .ok_or_else(|| GenError::invalid_config("plans", format!("no entry for {plan}")))
    }

    pub fn channel(&self, channel: Channel) -> GenResult<&ChannelOption> {
        self.channels
            .iter()
            .find(|o| o.channel == channel)
            .ok_or_else(|| GenError::invalid_config("channels", format!("no entry for {channel}")))
    }
}

/// Twelve passes, three per targeted column, each over 2% of rows.
pub fn standard_defect_plan() -> Vec<DefectPass> {
    const FRACTION: f64 = 0.02;
    let pass = |mutation| DefectPass { fraction: FRACTION, mutation };
    vec![
        // Text: merchant_governorate
        pass(Mutation::SetGovernorate { value: "amman".into() }),
        pass(Mutation::SetGovernorate { value: "Zaqra".into() }),
        pass(Mutation::SetGovernorate { value: " Amman ".into() }),
        // Numeric: customer_acquisition_cost
        pass(Mutation::ScaleAcquisitionCost { factor: 100.0 }),
        pass(Mutation::SetAcquisitionCost { value: -20.0 }),
        pass(Mutation::SetAcquisitionCostText { value: "50JOD".into() }),
        // Date: month
        pass(Mutation::ReplaceMonthSeparator { from: "-".into(), to: "/".into() }),
        pass(Mutation::ReplaceMonthSeparator { from: "-".into(), to: ".".into() }),
        pass(Mutation::ReplaceMonthSeparator { from: "-".into(), to: "".into() }),
        // Logical: transaction_count
        pass(Mutation::SetTransactionCount { value: -1 }),
        pass(Mutation::SetTransactionCount { value: -999 }),
        pass(Mutation::ScaleTransactionCount { factor: 100 }),
    ]
}

fn check_weights(field: &str, weights: impl Iterator<Item = f64>) -> GenResult<()> {
    let weights: Vec<f64> = weights.collect();
    if weights.is_empty() {
        return Err(GenError::invalid_config(field, "no categories configured"));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(GenError::invalid_config(field, "weights must be finite and non-negative"));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(GenError::invalid_config(
            field,
            format!("weights sum to {sum}, expected 1"),
        ));
    }
    Ok(())
}

fn check_unique<T: PartialEq + std::fmt::Display>(
    field: &str,
    values: impl Iterator<Item = T>,
) -> GenResult<()> {
    let values: Vec<T> = values.collect();
    for (i, v) in values.iter().enumerate() {
        if values[..i].contains(v) {
            return Err(GenError::invalid_config(field, format!("duplicate category {v}")));
        }
    }
    Ok(())
}

fn check_probability(field: &str, p: f64) -> GenResult<()> {
    if !(p.is_finite() && (0.0..=1.0).contains(&p)) {
        return Err(GenError::invalid_config(field, format!("{p} is not a probability")));
    }
    Ok(())
}
