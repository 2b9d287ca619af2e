//! Advisory-text classification and report rendering for oyster-farm predictions.
//!
//! Raw model output flows one way: [`classifier::classify`] partitions it into
//! categories, and the export surfaces in [`surface`] turn the result into cards,
//! clipboard text, or a paginated PDF.
pub mod classifier;
pub mod error;
pub mod extract;
pub mod heading;
pub mod pdf;
pub mod plain_text;
pub mod prediction;
pub mod registry;
pub mod report;
pub mod surface;
pub mod view;
