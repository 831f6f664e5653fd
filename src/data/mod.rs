//! Data layer: table model, loading, and the filter/aggregate pipeline.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Table, schema check, cache
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  coerce   │  text → numbers, drop incomplete rows, size column
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  constraint set → narrowed Table
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate │  group + reduce, top entity, sort/head, melt
//!   └───────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ classify  │  quantile thresholds → market signal
//!   └──────────┘
//! ```
//!
//! `streaming` and `campaign` compose these steps into the dashboard views.
//! Nothing here keeps state between calls.

pub mod aggregate;
pub mod campaign;
pub mod classify;
pub mod coerce;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod streaming;
