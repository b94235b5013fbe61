/// Data layer: core types, loading, enrichment, classification and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<RawParticle>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐     ┌─────────┐
///   │  enrich   │ ◄── │ species │  speed, radius, energies, vr, tag
///   └──────────┘     └─────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Particle>, immutable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  energy window → DatasetView (row indices)
///   └──────────┘
/// ```

pub mod enrich;
pub mod filter;
pub mod loader;
pub mod model;
pub mod species;
