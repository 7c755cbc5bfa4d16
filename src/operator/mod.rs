pub mod csv;
pub mod locator;
pub mod manifest;
pub mod related;

pub use csv::{OperatorCsv, Replacement};
pub use locator::{PullspecCategory, PullspecOccurrence};
pub use manifest::OperatorManifest;
pub use related::{RelatedImageConflict, RelatedImageEntry};
