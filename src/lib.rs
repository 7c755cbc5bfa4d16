//! Locate, pin and inventory container image pullspecs in Operator bundle
//! manifests (ClusterServiceVersion documents).

pub mod config;
pub mod constants;
pub mod document;
pub mod error;
pub mod logging;
pub mod operator;
pub mod pullspec;

pub use config::{CsvConfig, EnvNameStyle};
pub use error::{ManifestError, Result};
pub use operator::{OperatorCsv, OperatorManifest, RelatedImageEntry, Replacement};
pub use pullspec::Pullspec;
