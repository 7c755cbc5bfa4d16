use crate::config::CsvConfig;
use crate::constants::{
    ANNOTATION_NAME_SUFFIX, CONTAINER_IMAGE_ANNOTATION, ENV_VALUE_FROM_KEY,
    RELATED_IMAGE_ENV_PREFIX,
};
use crate::document::{get, PathLocation};
use crate::error::{ManifestError, Result};
use crate::location;
use crate::pullspec::Pullspec;
use serde_yaml::Value;

/// Kind of location a pullspec was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PullspecCategory {
    RelatedImage,
    Annotation,
    Container,
    InitContainer,
    ContainerEnv,
    InitContainerEnv,
}

/// A pullspec found at a recognized location of a CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullspecOccurrence {
    pub category: PullspecCategory,
    /// relatedImage, container or initContainer name; env var name for env sources
    pub name: String,
    pub path: PathLocation,
    pub value: Pullspec,
}

impl PullspecOccurrence {
    /// Human-readable origin, e.g. "container c1" or "RELATED_IMAGE_FOO var"
    pub fn description(&self) -> String {
        match self.category {
            PullspecCategory::RelatedImage => format!("relatedImage {}", self.name),
            PullspecCategory::Annotation => format!("{} annotation", CONTAINER_IMAGE_ANNOTATION),
            PullspecCategory::Container => format!("container {}", self.name),
            PullspecCategory::InitContainer => format!("initContainer {}", self.name),
            PullspecCategory::ContainerEnv | PullspecCategory::InitContainerEnv => {
                format!("{} var", self.name)
            }
        }
    }

    /// Name this pullspec gets when listed under `spec.relatedImages`.
    pub fn related_image_name(&self, config: &CsvConfig) -> String {
        match self.category {
            PullspecCategory::Annotation => {
                format!("{}{}", self.value.repo(), ANNOTATION_NAME_SUFFIX)
            }
            PullspecCategory::ContainerEnv | PullspecCategory::InitContainerEnv => {
                let suffix = self
                    .name
                    .strip_prefix(RELATED_IMAGE_ENV_PREFIX)
                    .unwrap_or(&self.name);
                config.env_name_style.derive(suffix)
            }
            PullspecCategory::RelatedImage
            | PullspecCategory::Container
            | PullspecCategory::InitContainer => self.name.clone(),
        }
    }
}

fn related_images_path() -> PathLocation {
    location!["spec", "relatedImages"]
}

fn deployments_path() -> PathLocation {
    location!["spec", "install", "spec", "deployments"]
}

fn sequence_at<'a>(data: &'a Value, path: &PathLocation) -> &'a [Value] {
    match get(data, path) {
        Some(Value::Sequence(seq)) => seq,
        _ => &[],
    }
}

fn string_field<'a>(node: &'a Value, key: &str) -> Option<&'a str> {
    match node {
        Value::Mapping(map) => match map.get(&Value::String(key.to_string())) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}

fn has_field(node: &Value, key: &str) -> bool {
    match node {
        Value::Mapping(map) => map.contains_key(&Value::String(key.to_string())),
        _ => false,
    }
}

/// Paths of every deployment's pod template spec, in deployment order.
fn pod_spec_paths(data: &Value) -> Vec<PathLocation> {
    let deployments = deployments_path();
    (0..sequence_at(data, &deployments).len())
        .map(|i| {
            deployments
                .join(i)
                .join("spec")
                .join("template")
                .join("spec")
        })
        .collect()
}

/// Named entries with an image under `list_path` (relatedImages, containers, initContainers).
fn named_images(
    data: &Value,
    list_path: &PathLocation,
    image_key: &str,
    category: PullspecCategory,
    found: &mut Vec<PullspecOccurrence>,
) -> Result<()> {
    for (i, entry) in sequence_at(data, list_path).iter().enumerate() {
        let Some(image) = string_field(entry, image_key) else {
            continue;
        };
        found.push(PullspecOccurrence {
            category,
            name: string_field(entry, "name").unwrap_or_default().to_string(),
            path: list_path.join(i).join(image_key),
            value: Pullspec::parse(image)?,
        });
    }
    Ok(())
}

fn annotation(data: &Value, found: &mut Vec<PullspecOccurrence>) -> Result<()> {
    let path = location!["metadata", "annotations", CONTAINER_IMAGE_ANNOTATION];
    if let Some(Value::String(image)) = get(data, &path) {
        found.push(PullspecOccurrence {
            category: PullspecCategory::Annotation,
            name: CONTAINER_IMAGE_ANNOTATION.to_string(),
            value: Pullspec::parse(image)?,
            path,
        });
    }
    Ok(())
}

fn related_image_envs(
    data: &Value,
    containers_path: &PathLocation,
    category: PullspecCategory,
    found: &mut Vec<PullspecOccurrence>,
) -> Result<()> {
    for i in 0..sequence_at(data, containers_path).len() {
        let env_path = containers_path.join(i).join("env");
        for (j, var) in sequence_at(data, &env_path).iter().enumerate() {
            let Some(name) = string_field(var, "name") else {
                continue;
            };
            if !name.starts_with(RELATED_IMAGE_ENV_PREFIX) {
                continue;
            }
            if has_field(var, ENV_VALUE_FROM_KEY) {
                return Err(ManifestError::UnsupportedReference {
                    name: name.to_string(),
                });
            }
            let Some(value) = string_field(var, "value") else {
                continue;
            };
            found.push(PullspecOccurrence {
                category,
                name: name.to_string(),
                path: env_path.join(j).join("value"),
                value: Pullspec::parse(value)?,
            });
        }
    }
    Ok(())
}

/// Enumerates every pullspec at a recognized location of a CSV document.
///
/// Order: relatedImages, the containerImage annotation, containers of all
/// deployments, initContainers of all deployments, then `RELATED_IMAGE_*` env
/// vars of containers and of initContainers. Missing sections yield nothing.
pub fn locate_pullspecs(data: &Value) -> Result<Vec<PullspecOccurrence>> {
    let mut found = Vec::new();
    let pod_specs = pod_spec_paths(data);

    named_images(
        data,
        &related_images_path(),
        "image",
        PullspecCategory::RelatedImage,
        &mut found,
    )?;
    annotation(data, &mut found)?;
    for pod in &pod_specs {
        named_images(
            data,
            &pod.join("containers"),
            "image",
            PullspecCategory::Container,
            &mut found,
        )?;
    }
    for pod in &pod_specs {
        named_images(
            data,
            &pod.join("initContainers"),
            "image",
            PullspecCategory::InitContainer,
            &mut found,
        )?;
    }
    for pod in &pod_specs {
        related_image_envs(
            data,
            &pod.join("containers"),
            PullspecCategory::ContainerEnv,
            &mut found,
        )?;
    }
    for pod in &pod_specs {
        related_image_envs(
            data,
            &pod.join("initContainers"),
            PullspecCategory::InitContainerEnv,
            &mut found,
        )?;
    }

    Ok(found)
}

/// True if any container or initContainer declares a `RELATED_IMAGE_*` env var.
///
/// Checks names only, so unlike [`locate_pullspecs`] it never fails.
pub fn has_related_image_envs(data: &Value) -> bool {
    pod_spec_paths(data).iter().any(|pod| {
        ["containers", "initContainers"].iter().any(|list| {
            let containers = pod.join(*list);
            (0..sequence_at(data, &containers).len()).any(|i| {
                sequence_at(data, &containers.join(i).join("env"))
                    .iter()
                    .filter_map(|var| string_field(var, "name"))
                    .any(|name| name.starts_with(RELATED_IMAGE_ENV_PREFIX))
            })
        })
    })
}

/// True if `spec.relatedImages` is a non-empty list.
pub fn has_related_images(data: &Value) -> bool {
    !sequence_at(data, &related_images_path()).is_empty()
}
