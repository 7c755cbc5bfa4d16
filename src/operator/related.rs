use crate::pullspec::Pullspec;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::fmt;

/// One `{name, image}` item of `spec.relatedImages`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelatedImageEntry {
    pub name: String,
    pub image: Pullspec,
}

impl RelatedImageEntry {
    /// YAML form with `name` before `image`.
    pub fn to_yaml(&self) -> Value {
        let mut entry = Mapping::new();
        entry.insert(
            Value::String("name".to_string()),
            Value::String(self.name.clone()),
        );
        entry.insert(
            Value::String("image".to_string()),
            Value::String(self.image.to_string()),
        );
        Value::Mapping(entry)
    }
}

/// A relatedImage entry together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedImageCandidate {
    pub source: String,
    pub entry: RelatedImageEntry,
}

impl fmt::Display for RelatedImageCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.entry.image)
    }
}

/// The first candidate seen for a name and a later one with a different image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedImageConflict {
    pub first: RelatedImageCandidate,
    pub conflicting: RelatedImageCandidate,
}

impl fmt::Display for RelatedImageConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} X {}", self.first, self.conflicting)
    }
}

/// Deduplicates candidates by name, first seen wins.
///
/// Repeats with the same image are dropped. Every repeat with a different image
/// is reported against the first-seen candidate, in discovery order.
pub fn merge_related_images<I>(
    candidates: I,
) -> Result<Vec<RelatedImageCandidate>, Vec<RelatedImageConflict>>
where
    I: IntoIterator<Item = RelatedImageCandidate>,
{
    let mut accepted: Vec<RelatedImageCandidate> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut conflicts = Vec::new();

    for candidate in candidates {
        match by_name.get(&candidate.entry.name) {
            Some(&index) => {
                let first = &accepted[index];
                if first.entry.image != candidate.entry.image {
                    conflicts.push(RelatedImageConflict {
                        first: first.clone(),
                        conflicting: candidate,
                    });
                }
            }
            None => {
                by_name.insert(candidate.entry.name.clone(), accepted.len());
                accepted.push(candidate);
            }
        }
    }

    if conflicts.is_empty() {
        Ok(accepted)
    } else {
        Err(conflicts)
    }
}
