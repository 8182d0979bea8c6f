//! The dataset pipeline.
//!
//! STAGE ORDER (fixed, documented, never reordered):
//!   1. Merchant generator
//!   2. Monthly simulator
//!   3. Defect injector   (skipped for clean exports)
//!
//! RULES:
//!   - Data flows strictly forward; no stage reads a later stage's output.
//!   - Each stage draws from its own RngBank slot.
//!   - Every state change is recorded in the event log.
//!
//! Exporters run after the pipeline and only see the finished Dataset.

use crate::{
    calendar::{format_month, MonthCalendar},
    config::GeneratorConfig,
    dataset::{round2, Dataset, DatasetRow},
    defects::DefectInjector,
    error::GenResult,
    event::{EventLogEntry, PipelineEvent},
    merchant::MerchantGenerator,
    rng::{RngBank, StageSlot},
    simulator::MonthlySimulation,
    types::RunId,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub stage: &'static str,
    pub event: PipelineEvent,
}

pub struct DatasetPipeline {
    pub run_id:   RunId,
    pub config:   GeneratorConfig,
    pub rng_bank: RngBank,
    calendar:     MonthCalendar,
    events:       Vec<RecordedEvent>,
}

impl DatasetPipeline {
    /// Validate the config and wire the pipeline. Fails fast on any
    /// inconsistency in the configuration.
    pub fn build(run_id: RunId, seed: u64, config: GeneratorConfig) -> GenResult<Self> {
        config.validate()?;
        let calendar = MonthCalendar::from_config(&config.calendar)?;
        Ok(Self {
            run_id,
            config,
            rng_bank: RngBank::new(seed),
            calendar,
            events: Vec::new(),
        })
    }

    /// Pipeline over GeneratorConfig::default_test().
    pub fn build_test(run_id: RunId, seed: u64) -> GenResult<Self> {
        Self::build(run_id, seed, GeneratorConfig::default_test())
    }

    pub fn seed(&self) -> u64 {
        self.rng_bank.master_seed()
    }

    pub fn calendar(&self) -> &MonthCalendar {
        &self.calendar
    }

    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Run every stage and return the finished table.
    /// Re-running starts over with fresh streams and a fresh event log.
    pub fn run(&mut self, inject_defects: bool) -> GenResult<Dataset> {
        let mut dataset = self.generate_clean()?;
        if inject_defects {
            self.inject_defects(&mut dataset);
        } else {
            log::info!("defect_injector: skipped, exporting clean data");
        }
        self.record(
            "pipeline",
            PipelineEvent::DatasetCompleted {
                merchants: dataset.merchants.len(),
                rows: dataset.rows.len(),
            },
        );
        Ok(dataset)
    }

    /// Stages 1 and 2 only.
    pub fn generate_clean(&mut self) -> GenResult<Dataset> {
        self.events.clear();
        self.record(
            "pipeline",
            PipelineEvent::RunInitialized {
                run_id: self.run_id.clone(),
                seed: self.seed(),
            },
        );

        let mut merchant_rng = self.rng_bank.for_stage(StageSlot::MerchantGenerator);
        let merchants = MerchantGenerator::new(&self.config).generate(&mut merchant_rng)?;

        let mut sim_rng = self.rng_bank.for_stage(StageSlot::MonthlySimulator);
        let mut rows = Vec::with_capacity(merchants.len() * self.calendar.len());
        let mut stage_events = Vec::new();

        for merchant in &merchants {
            let simulation =
                MonthlySimulation::new(merchant, &self.calendar, &self.config, &mut sim_rng)?;
            for (months_active, record) in simulation.enumerate() {
                if months_active == 0 {
                    stage_events.push(PipelineEvent::MerchantOnboarded {
                        merchant_id: record.merchant_id.clone(),
                        month: format_month(record.month),
                        plan: record.plan.label().into(),
                        new_mrr: round2(record.new_mrr),
                    });
                }
                if !record.active {
                    stage_events.push(PipelineEvent::MerchantChurned {
                        merchant_id: record.merchant_id.clone(),
                        month: format_month(record.month),
                        churned_mrr: round2(record.churned_mrr),
                        months_active,
                    });
                }
                rows.push(DatasetRow::from(&record));
            }
        }
        for event in stage_events {
            self.record(sim_rng.name, event);
        }

        log::info!(
            "monthly_simulator: {} rows over {} months for {} merchants",
            rows.len(),
            self.calendar.len(),
            merchants.len()
        );
        Ok(Dataset { merchants, rows })
    }

    /// Stage 3 over an already generated table.
    pub fn inject_defects(&mut self, dataset: &mut Dataset) {
        let mut rng = self.rng_bank.for_stage(StageSlot::DefectInjector);
        let outcomes = DefectInjector::new(&self.config.defects).inject(dataset, &mut rng);
        for outcome in outcomes {
            self.record(
                rng.name,
                PipelineEvent::DefectPassApplied {
                    pass_index: outcome.pass_index,
                    column: outcome.column.into(),
                    rows: outcome.rows,
                },
            );
        }
    }

    /// The event log in persistable form, payloads as JSON.
    pub fn event_log(&self) -> GenResult<Vec<EventLogEntry>> {
        self.events
            .iter()
            .enumerate()
            .map(|(seq, e)| {
                Ok(EventLogEntry {
                    id:         None,
                    run_id:     self.run_id.clone(),
                    seq:        seq as u64,
                    stage:      e.stage.to_string(),
                    event_type: e.event.event_type().to_string(),
                    payload:    serde_json::to_string(&e.event)?,
                })
            })
            .collect()
    }

    fn record(&mut self, stage: &'static str, event: PipelineEvent) {
        self.events.push(RecordedEvent { stage, event });
    }
}
