//! # kp-transit
//!
//! Browse, search, and export KP ascendant rulership transitions.
//!
//! An external computation service turns a date and location into a sweep
//! of 720 half-degree buckets, each carrying its sign, nakshatra, and
//! sub / sub-sub lords. This crate fetches those sweeps (one date or a
//! whole date range), and works on them locally through the pure engine
//! in [`kp_transit_core`]: transition detection, free-text and structured
//! search, pagination, and CSV export.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌─────────────────────┐
//! │ computation  │◀──│ client/range │──▶│ ResultDocument JSON │
//! │   service    │   │  (tokio)     │   └─────────┬───────────┘
//! └──────────────┘   └──────────────┘             │
//!                                                 ▼
//!                    ┌──────────────────────────────────────┐
//!                    │ kp-transit-core: annotate / search / │
//!                    │ lookup / export                      │
//!                    └──────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! kpt health
//! kpt calculate --lat 19.076 --lon 72.8777 --date 2025-08-20 --out-dir ./out
//! kpt range --lat 19.076 --lon 72.8777 --start 2025-01-01 --end 2025-01-31
//! kpt browse ./out/ascendant_changes_2025-08-20_19.076_72.8777.json --query venus
//! kpt lookup ./out/ascendant_changes_2025-08-20_19.076_72.8777.json --nakshatra rohini --sub-lord saturn
//! kpt export ./out/ascendant_changes_2025-08-20_19.076_72.8777.json --query mercury
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`client`] | Computation service trait and HTTP client |
//! | [`range`] | Date-range orchestration with bounded concurrency |
//! | [`progress`] | Range progress reporting on stderr |
//! | [`load`] | Reading JSON / CSV sample tables |
//! | [`browse`] | Paginated free-text view |
//! | [`lookup`] | Structured search, local or remote |
//! | [`export`] | CSV export command |
//! | [`fetch`] | `health`, `calculate`, and `range` commands |

pub mod browse;
pub mod client;
pub mod config;
pub mod export;
pub mod fetch;
pub mod load;
pub mod lookup;
pub mod progress;
pub mod range;
