/// Data layer: core types, the extractor boundary, and dataset loading.
///
/// Architecture:
/// ```text
///  vision-service JSON        .json / .csv file
///        │                          │
///        ▼                          ▼
///   ┌───────────┐             ┌──────────┐
///   │ extractor  │             │  loader   │
///   └───────────┘             └──────────┘
///        │                          │
///        └──────────┬───────────────┘
///                   ▼
///             ┌──────────┐
///             │ Spectrum  │  ordered peak set + upload metadata
///             └──────────┘
/// ```
pub mod extractor;
pub mod loader;
pub mod model;
