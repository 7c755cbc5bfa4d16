// Centralized constants for bundlepin to avoid magic strings

/// Required value of the top-level `kind` field
pub const CLUSTER_SERVICE_VERSION_KIND: &str = "ClusterServiceVersion";

/// Env var name prefix marking the variable's value as a pullspec
pub const RELATED_IMAGE_ENV_PREFIX: &str = "RELATED_IMAGE_";

/// Annotation key under `metadata.annotations` holding the operator image
pub const CONTAINER_IMAGE_ANNOTATION: &str = "containerImage";

/// Appended to the repository name to form the relatedImage name of the annotation
pub const ANNOTATION_NAME_SUFFIX: &str = "-annotation";

/// Env var key carrying an indirect (unsupported) value
pub const ENV_VALUE_FROM_KEY: &str = "valueFrom";

/// Environment variable selecting how env-sourced relatedImage names are derived
pub const ENV_NAME_STYLE_VAR: &str = "BUNDLEPIN_ENV_NAME_STYLE";

/// Default tracing filter when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "bundlepin=info";
