/// Data layer: naming, storage formats, the repository, and the session.
///
/// Architecture:
/// ```text
///  <root>/raw_data/[bad_]..._<night>_p<k>.{parquet,json,csv}
///  <root>/annotations/<same name>
///        │
///        ▼
///   ┌────────────┐
///   │ repository │  list / load / save / rename_pair
///   └────────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ DatasetSession │  current file, pointing scope, navigation, counts
///   └────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  labels  │  apply_label / validate_complete
///   └──────────┘
/// ```

pub mod error;
pub mod labels;
pub mod loader;
pub mod model;
pub mod naming;
pub mod repository;
pub mod session;

pub use error::{Error, Result};
pub use session::{Bounds, Counts, DatasetSession, Direction, SessionConfig};
