use crate::error::{ManifestError, Result};
use serde_yaml::Value;
use std::fmt;

/// One step into a YAML tree: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Location of a single node inside a document tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathLocation(Vec<PathSegment>);

impl PathLocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    /// Returns a new location one step deeper.
    pub fn join(&self, segment: impl Into<PathSegment>) -> Self {
        let mut joined = self.clone();
        joined.push(segment);
        joined
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<PathSegment>> for PathLocation {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl AsRef<[PathSegment]> for PathLocation {
    fn as_ref(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for PathLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

fn child<'a>(node: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match (node, segment) {
        (Value::Mapping(map), PathSegment::Key(key)) => map.get(&Value::String(key.clone())),
        (Value::Sequence(seq), PathSegment::Index(index)) => seq.get(*index),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Value, segment: &PathSegment) -> Option<&'a mut Value> {
    match (node, segment) {
        (Value::Mapping(map), PathSegment::Key(key)) => map.get_mut(&Value::String(key.clone())),
        (Value::Sequence(seq), PathSegment::Index(index)) => seq.get_mut(*index),
        _ => None,
    }
}

/// Walks `path` through nested mappings and sequences.
///
/// Returns `None` as soon as a key or index is missing or a node has the wrong
/// shape for the next segment.
pub fn get<'a>(tree: &'a Value, path: impl AsRef<[PathSegment]>) -> Option<&'a Value> {
    path.as_ref()
        .iter()
        .try_fold(tree, |node, segment| child(node, segment))
}

pub fn get_or<'a>(tree: &'a Value, path: impl AsRef<[PathSegment]>, default: &'a Value) -> &'a Value {
    get(tree, path).unwrap_or(default)
}

pub fn get_mut<'a>(tree: &'a mut Value, path: impl AsRef<[PathSegment]>) -> Option<&'a mut Value> {
    path.as_ref()
        .iter()
        .try_fold(tree, |node, segment| child_mut(node, segment))
}

/// Writes `value` at `path`.
///
/// Every intermediate node must already exist. The last segment may add a new
/// key to a mapping but never grows a sequence.
pub fn set(tree: &mut Value, path: impl AsRef<[PathSegment]>, value: Value) -> Result<()> {
    let path = path.as_ref();
    let not_found = || ManifestError::PathNotFound {
        path: PathLocation::from(path.to_vec()).to_string(),
    };

    let Some((last, parents)) = path.split_last() else {
        *tree = value;
        return Ok(());
    };

    match (get_mut(tree, parents).ok_or_else(not_found)?, last) {
        (Value::Mapping(map), PathSegment::Key(key)) => {
            let key = Value::String(key.clone());
            // overwrite in place so the key keeps its position
            match map.get_mut(&key) {
                Some(slot) => *slot = value,
                None => {
                    map.insert(key, value);
                }
            }
            Ok(())
        }
        (Value::Sequence(seq), PathSegment::Index(index)) => match seq.get_mut(*index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(not_found()),
        },
        _ => Err(not_found()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location;

    fn tree() -> Value {
        serde_yaml::from_str(
            r#"
spec:
  relatedImages:
  - name: foo
    image: foo:1
  count: 3
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_get_existing_scalar() {
        let tree = tree();
        let value = get(&tree, location!["spec", "relatedImages", 0usize, "image"]);
        assert_eq!(value, Some(&Value::String("foo:1".to_string())));
    }

    #[test]
    fn test_get_missing_is_absent() {
        let tree = tree();
        assert!(get(&tree, location!["spec", "relatedImages", 5usize, "image"]).is_none());
        assert!(get(&tree, location!["metadata", "annotations"]).is_none());
        // wrong shape: indexing into a mapping, keying into a scalar
        assert!(get(&tree, location!["spec", 0usize]).is_none());
        assert!(get(&tree, location!["spec", "count", "x"]).is_none());
    }

    #[test]
    fn test_get_or_default() {
        let tree = tree();
        let default = Value::Sequence(Vec::new());
        let value = get_or(&tree, location!["spec", "deployments"], &default);
        assert_eq!(value, &default);
    }

    #[test]
    fn test_set_overwrites_and_inserts() {
        let mut tree = tree();
        let path = location!["spec", "relatedImages", 0usize, "image"];
        set(&mut tree, &path, Value::String("bar:2".to_string())).unwrap();
        assert_eq!(get(&tree, &path), Some(&Value::String("bar:2".to_string())));

        set(&mut tree, location!["spec", "new"], Value::Bool(true)).unwrap();
        assert_eq!(get(&tree, location!["spec", "new"]), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_set_missing_path_fails() {
        let mut tree = tree();
        let err = set(
            &mut tree,
            location!["metadata", "annotations", "containerImage"],
            Value::Null,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Path not found in document: metadata.annotations.containerImage"
        );

        let err = set(&mut tree, location!["spec", "relatedImages", 1usize], Value::Null).unwrap_err();
        assert!(matches!(err, ManifestError::PathNotFound { .. }));
    }

    #[test]
    fn test_location_display() {
        let path = location!["spec", "install", "spec", "deployments", 0usize, "spec"];
        assert_eq!(path.to_string(), "spec.install.spec.deployments[0].spec");
        assert_eq!(path.len(), 6);
        assert!(PathLocation::new().is_empty());
        assert_eq!(PathLocation::new().to_string(), "");
    }

    #[test]
    fn test_set_keeps_key_position() {
        let mut tree = tree();
        set(&mut tree, location!["spec", "relatedImages"], Value::Null).unwrap();
        let Some(Value::Mapping(spec)) = get(&tree, location!["spec"]) else {
            panic!("spec is not a mapping");
        };
        let keys: Vec<&Value> = spec.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec![&Value::from("relatedImages"), &Value::from("count")]);
    }
}
