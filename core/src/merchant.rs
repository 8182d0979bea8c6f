//! Merchant generation: static per-merchant attributes.

use crate::{
    config::GeneratorConfig,
    error::GenResult,
    rng::SimRng,
    types::MerchantId,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Industry {
    #[serde(rename = "F&B")]
    FoodAndBeverage,
    Retail,
    Hospitality,
    Pharmacy,
}

impl Industry {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FoodAndBeverage => "F&B",
            Self::Retail          => "Retail",
            Self::Hospitality     => "Hospitality",
            Self::Pharmacy        => "Pharmacy",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Governorate {
    Amman,
    Zarqa,
    Irbid,
    Aqaba,
    Other,
}

impl Governorate {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Amman => "Amman",
            Self::Zarqa => "Zarqa",
            Self::Irbid => "Irbid",
            Self::Aqaba => "Aqaba",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Plan {
    Basic,
    Pro,
    Enterprise,
}

impl Plan {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Basic      => "Basic",
            Self::Pro        => "Pro",
            Self::Enterprise => "Enterprise",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Channel {
    #[serde(rename = "Bank Partner")]
    BankPartner,
    #[serde(rename = "Sales Agent")]
    SalesAgent,
    Online,
}

impl Channel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BankPartner => "Bank Partner",
            Self::SalesAgent  => "Sales Agent",
            Self::Online      => "Online",
        }
    }
}

macro_rules! display_via_label {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    )*};
}

display_via_label!(Industry, Governorate, Plan, Channel);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Merchant {
    pub merchant_id: MerchantId,
    pub industry: Industry,
    pub governorate: Governorate,
    pub plan: Plan,
    pub channel: Channel,
    /// Unrounded; rounding happens when the row is flattened for export.
    pub acquisition_cost: f64,
}

pub struct MerchantGenerator<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> MerchantGenerator<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// Draw `merchant_count` merchants with sequential ids.
    ///
    /// Each categorical column is drawn for the whole population before the
    /// next one, then acquisition cost is drawn per merchant from its
    /// channel's range.
    pub fn generate(&self, rng: &mut SimRng) -> GenResult<Vec<Merchant>> {
        let n = self.config.merchant_count;

        let industries: Vec<Industry> = self.draw_column(rng, n, &self.config.industries, |o| {
            (o.weight, o.industry)
        });
        let governorates: Vec<Governorate> =
            self.draw_column(rng, n, &self.config.governorates, |o| (o.weight, o.governorate));
        let plans: Vec<Plan> = self.draw_column(rng, n, &self.config.plans, |o| (o.weight, o.plan));
        let channels: Vec<Channel> =
            self.draw_column(rng, n, &self.config.channels, |o| (o.weight, o.channel));

        let mut merchants = Vec::with_capacity(n);
        for i in 0..n {
            let channel = channels[i];
            let range = self.config.channel(channel)?.acquisition_cost;
            merchants.push(Merchant {
                merchant_id: format!(
                    "{}{}",
                    self.config.merchant_id_prefix,
                    self.config.merchant_id_offset + i
                ),
                industry: industries[i],
                governorate: governorates[i],
                plan: plans[i],
                channel,
                acquisition_cost: rng.uniform(range.low, range.high),
            });
        }

        log::info!("merchant_generator: generated {n} merchants");
        Ok(merchants)
    }

    fn draw_column<O, T: Copy>(
        &self,
        rng: &mut SimRng,
        n: usize,
        options: &[O],
        split: impl Fn(&O) -> (f64, T),
    ) -> Vec<T> {
        let (weights, values): (Vec<f64>, Vec<T>) = options.iter().map(split).unzip();
        (0..n).map(|_| values[rng.weighted_index(&weights)]).collect()
    }
}
