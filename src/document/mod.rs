pub mod path;
pub mod preserve;
mod spans;

pub use path::{get, get_mut, get_or, set, PathLocation, PathSegment};
pub use preserve::YamlDocument;

/// Builds a [`PathLocation`] from keys and indices: `location!["spec", "relatedImages", 0usize]`.
#[macro_export]
macro_rules! location {
    ($($segment:expr),* $(,)?) => {
        $crate::document::PathLocation::from(vec![
            $($crate::document::PathSegment::from($segment)),*
        ])
    };
}
