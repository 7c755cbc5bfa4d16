use crate::config::CsvConfig;
use crate::constants::CLUSTER_SERVICE_VERSION_KIND;
use crate::document::{get, set, PathLocation, PathSegment, YamlDocument};
use crate::error::{ManifestError, Result};
use crate::location;
use crate::operator::locator::{self, PullspecOccurrence};
use crate::operator::related::{merge_related_images, RelatedImageCandidate, RelatedImageEntry};
use crate::pullspec::Pullspec;
use crate::{log_pullspec_found, log_pullspec_replaced, log_related_image_set};
use serde_yaml::{Mapping, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// One rewritten scalar node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub path: PathLocation,
    /// Origin of the pullspec when it sat at a recognized location
    pub source: Option<String>,
    pub old: Pullspec,
    pub new: Pullspec,
}

/// A loaded ClusterServiceVersion document and the file it belongs to.
///
/// All mutations happen in memory; nothing is written until [`OperatorCsv::dump`].
#[derive(Debug, Clone)]
pub struct OperatorCsv {
    path: PathBuf,
    document: YamlDocument,
    config: CsvConfig,
}

impl OperatorCsv {
    pub fn new(path: impl Into<PathBuf>, data: Value) -> Result<Self> {
        Self::from_document(path, YamlDocument::from_value(data))
    }

    /// Fails with `NotOperatorCsv` unless `kind` is `ClusterServiceVersion`.
    pub fn from_document(path: impl Into<PathBuf>, document: YamlDocument) -> Result<Self> {
        let is_csv = matches!(
            get(document.root(), location!["kind"]),
            Some(Value::String(kind)) if kind == CLUSTER_SERVICE_VERSION_KIND
        );
        if !is_csv {
            return Err(ManifestError::NotOperatorCsv);
        }
        Ok(Self {
            path: path.into(),
            document,
            config: CsvConfig::default(),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::from_document(path, YamlDocument::load(path)?)
    }

    pub fn with_config(mut self, config: CsvConfig) -> Self {
        self.config = config;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &Value {
        self.document.root()
    }

    pub fn document(&self) -> &YamlDocument {
        &self.document
    }

    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    /// Writes the document back to the file it was loaded from.
    pub fn dump(&self) -> Result<()> {
        self.document.save(&self.path)
    }

    /// Every pullspec at a recognized location, in scan order.
    pub fn occurrences(&self) -> Result<Vec<PullspecOccurrence>> {
        locator::locate_pullspecs(self.data())
    }

    pub fn get_pullspecs(&self) -> Result<HashSet<Pullspec>> {
        let mut pullspecs = HashSet::new();
        for occurrence in self.occurrences()? {
            log_pullspec_found!(
                self.path.display(),
                occurrence.description(),
                occurrence.value
            );
            pullspecs.insert(occurrence.value);
        }
        Ok(pullspecs)
    }

    /// Rewrites pullspecs at recognized locations only.
    ///
    /// An occurrence changes when the mapping has an entry for it that differs
    /// from the current value. Returns one record per rewritten node.
    pub fn replace_pullspecs(
        &mut self,
        replacements: &HashMap<Pullspec, Pullspec>,
    ) -> Result<Vec<Replacement>> {
        let mut replaced = Vec::new();
        for occurrence in self.occurrences()? {
            let Some(new) = replacements.get(&occurrence.value) else {
                continue;
            };
            if *new == occurrence.value {
                continue;
            }
            set(
                self.document.root_mut(),
                &occurrence.path,
                Value::String(new.to_string()),
            )?;
            let source = occurrence.description();
            log_pullspec_replaced!(self.path.display(), source, occurrence.value, new);
            replaced.push(Replacement {
                path: occurrence.path,
                source: Some(source),
                old: occurrence.value,
                new: new.clone(),
            });
        }
        Ok(replaced)
    }

    /// Rewrites every string value in the document that is a pullspec listed in
    /// `replacements`, wherever it is. Strings that are not pullspecs never match.
    pub fn replace_pullspecs_everywhere(
        &mut self,
        replacements: &HashMap<Pullspec, Pullspec>,
    ) -> Result<Vec<Replacement>> {
        let mut replaced = Vec::new();
        let mut location = PathLocation::new();
        replace_in_node(
            self.document.root_mut(),
            &mut location,
            replacements,
            &mut replaced,
        );
        for replacement in &replaced {
            log_pullspec_replaced!(
                self.path.display(),
                replacement.path,
                replacement.old,
                replacement.new
            );
        }
        Ok(replaced)
    }

    pub fn has_related_images(&self) -> bool {
        locator::has_related_images(self.data())
    }

    pub fn has_related_image_envs(&self) -> bool {
        locator::has_related_image_envs(self.data())
    }

    /// Rebuilds `spec.relatedImages` from every recognized pullspec.
    ///
    /// Fails with `RelatedImagesConflict`, leaving the document untouched, if a
    /// name would be bound to more than one image.
    pub fn set_related_images(&mut self) -> Result<Vec<RelatedImageEntry>> {
        let candidates: Vec<RelatedImageCandidate> = self
            .occurrences()?
            .into_iter()
            .map(|occurrence| RelatedImageCandidate {
                source: occurrence.description(),
                entry: RelatedImageEntry {
                    name: occurrence.related_image_name(&self.config),
                    image: occurrence.value,
                },
            })
            .collect();

        let accepted = merge_related_images(candidates).map_err(|conflicts| {
            ManifestError::RelatedImagesConflict {
                path: self.path.display().to_string(),
                conflicts,
            }
        })?;

        let root = self.document.root_mut();
        if !matches!(get(root, location!["spec"]), Some(Value::Mapping(_))) {
            set(root, location!["spec"], Value::Mapping(Mapping::new()))?;
        }
        let related_images = accepted
            .iter()
            .map(|candidate| candidate.entry.to_yaml())
            .collect();
        set(
            root,
            location!["spec", "relatedImages"],
            Value::Sequence(related_images),
        )?;

        for candidate in &accepted {
            log_related_image_set!(
                self.path.display(),
                candidate.entry.name,
                candidate.source,
                candidate.entry.image
            );
        }
        Ok(accepted.into_iter().map(|candidate| candidate.entry).collect())
    }
}

fn replace_in_node(
    node: &mut Value,
    location: &mut PathLocation,
    replacements: &HashMap<Pullspec, Pullspec>,
    replaced: &mut Vec<Replacement>,
) {
    match node {
        Value::Mapping(map) => {
            for (key, value) in map.iter_mut() {
                location.push(key_segment(key));
                replace_in_node(value, location, replacements, replaced);
                location.pop();
            }
        }
        Value::Sequence(seq) => {
            for (i, item) in seq.iter_mut().enumerate() {
                location.push(i);
                replace_in_node(item, location, replacements, replaced);
                location.pop();
            }
        }
        Value::String(text) => {
            let Ok(old) = Pullspec::parse(text) else {
                return;
            };
            if let Some(new) = replacements.get(&old).filter(|new| **new != old) {
                *text = new.to_string();
                replaced.push(Replacement {
                    path: location.clone(),
                    source: None,
                    old,
                    new: new.clone(),
                });
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn key_segment(key: &Value) -> PathSegment {
    match key {
        Value::String(s) => PathSegment::Key(s.clone()),
        other => PathSegment::Key(
            serde_yaml::to_string(other)
                .map(|s| s.trim_start_matches("---").trim().to_string())
                .unwrap_or_default(),
        ),
    }
}
