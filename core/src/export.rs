//! Exporters: the last step, run once the pipeline has produced its table.

use crate::{
    dataset::{Dataset, COLUMNS},
    error::GenResult,
    pipeline::DatasetPipeline,
    store::DatasetStore,
};
use std::io::Write;

/// Anything that can persist a finished dataset.
pub trait Exporter {
    /// Stable name for logs.
    fn name(&self) -> &'static str;

    /// Persist the dataset. Returns the number of rows written.
    fn export(&mut self, pipeline: &DatasetPipeline, dataset: &Dataset) -> GenResult<usize>;
}

/// Delimited text with a header row and no index column.
pub struct CsvExporter {
    path: String,
}

impl CsvExporter {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Write the header and every row to any sink.
    /// The header is written even when the table is empty.
    pub fn write_to<W: Write>(writer: W, dataset: &Dataset) -> GenResult<usize> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        wtr.write_record(COLUMNS)?;
        for row in &dataset.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(dataset.rows.len())
    }
}

impl Exporter for CsvExporter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn export(&mut self, _pipeline: &DatasetPipeline, dataset: &Dataset) -> GenResult<usize> {
        let file = std::fs::File::create(&self.path)?;
        let written = Self::write_to(std::io::BufWriter::new(file), dataset)?;
        log::info!("export: wrote {written} rows to {}", self.path);
        Ok(written)
    }
}

/// Run record, rows and event log into a SQLite database.
pub struct SqliteExporter {
    store: DatasetStore,
}

impl SqliteExporter {
    /// Takes an opened store; migrations are applied here.
    pub fn new(store: DatasetStore) -> GenResult<Self> {
        store.migrate()?;
        Ok(Self { store })
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }
}

impl Exporter for SqliteExporter {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn export(&mut self, pipeline: &DatasetPipeline, dataset: &Dataset) -> GenResult<usize> {
        let run_id = &pipeline.run_id;
        self.store.insert_run(
            run_id,
            pipeline.seed(),
            env!("CARGO_PKG_VERSION"),
            dataset.merchants.len(),
            &serde_json::to_string(&pipeline.config)?,
        )?;
        let written = self.store.insert_rows(run_id, &dataset.rows)?;
        let events = pipeline.event_log()?;
        self.store.append_events(&events)?;
        log::info!(
            "export: stored {written} rows and {} events for run {run_id}",
            events.len()
        );
        Ok(written)
    }
}
