//! # kp-transit core
//!
//! Pure logic over KP ascendant sweeps: data models, rulership transition
//! detection, substring filtering, the paginated query engine, tabular
//! export, and a bounded result history.
//!
//! No async runtime, network, or filesystem I/O lives here; the `kp-transit`
//! application crate supplies those.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | `Sample`, `AnnotatedSample`, `ResultDocument`, search criteria |
//! | [`transition`] | Per-layer change detection between adjacent samples |
//! | [`filter`] | Free-text and structured substring predicates |
//! | [`query`] | Free-text pages, structured lookup, `QuerySession` |
//! | [`export`] | CSV rendering, parsing, size estimate, file naming |
//! | [`history`] | Bounded FIFO of recent results |
//! | [`request`] | Locations, dates, and calculation requests |
//! | [`error`] | `KpError` |

pub mod error;
pub mod export;
pub mod filter;
pub mod history;
pub mod models;
pub mod query;
pub mod request;
pub mod transition;

pub use error::KpError;
pub use models::{AnnotatedSample, ResultDocument, RulerLayer, Sample, SearchCriteria, SearchField, SearchOutcome};
