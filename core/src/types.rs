//! Shared primitive types used across the generator.

/// A stable merchant identifier, e.g. `M10000`.
pub type MerchantId = String;

/// The canonical run identifier.
pub type RunId = String;

/// Zero-based position of a row in the dataset table.
pub type RowIndex = usize;
