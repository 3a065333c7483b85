//! Peak-based IR spectrum comparison.
//!
//! The pipeline, end to end:
//!
//! ```text
//!  vision-service JSON / .json / .csv
//!           │
//!           ▼
//!     ┌───────────┐
//!     │   data     │  extractor boundary + loaders → Spectrum
//!     └───────────┘
//!           │
//!           ▼
//!     ┌───────────┐
//!     │  compare   │  greedy peak matching → ComparisonResult
//!     └───────────┘
//!           │
//!           ▼
//!     ┌───────────┐
//!     │   batch    │  pair planning, rayon fan-out, failure isolation
//!     └───────────┘
//!           │
//!           ▼
//!     ┌───────────┐
//!     │   export   │  CSV history append / tail / full serialization
//!     └───────────┘
//! ```
//!
//! Comparisons are pure functions of their inputs: tolerances are passed
//! explicitly per call, and no module holds process-wide state.

pub mod batch;
pub mod compare;
pub mod data;
pub mod export;
