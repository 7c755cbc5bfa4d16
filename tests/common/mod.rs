//! Shared CSV fixtures for integration tests
#![allow(dead_code)]

use bundlepin::document::PathLocation;
use bundlepin::location;
use bundlepin::Pullspec;
use serde_yaml::Value;
use std::collections::HashMap;

/// A pullspec planted in the fixture, its replacement and where it lives.
pub struct Planted {
    pub name: &'static str,
    pub value: &'static str,
    pub replace: &'static str,
    pub path: PathLocation,
}

impl Planted {
    pub fn value(&self) -> Pullspec {
        Pullspec::parse(self.value).unwrap()
    }

    pub fn replace(&self) -> Pullspec {
        Pullspec::parse(self.replace).unwrap()
    }
}

// RI = relatedImages, C = containers, CE = containers env,
// IC = initContainers, ICE = initContainers env, AN = annotations
pub fn planted() -> Vec<Planted> {
    vec![
        Planted {
            name: "ri1",
            value: "foo:1",
            replace: "r-foo:2",
            path: location!["spec", "relatedImages", 0usize, "image"],
        },
        Planted {
            name: "ri2",
            value: "registry/bar:1",
            replace: "r-registry/r-bar:2",
            path: location!["spec", "relatedImages", 1usize, "image"],
        },
        Planted {
            name: "c1",
            value: "registry/namespace/spam:1",
            replace: "r-registry/r-namespace/r-spam:2",
            path: location![
                "spec", "install", "spec", "deployments", 0usize,
                "spec", "template", "spec", "containers", 0usize, "image"
            ],
        },
        Planted {
            name: "ce1",
            value: "eggs:1",
            replace: "r-eggs:2",
            path: location![
                "spec", "install", "spec", "deployments", 0usize,
                "spec", "template", "spec", "containers", 0usize, "env", 0usize, "value"
            ],
        },
        Planted {
            name: "c2",
            value: "ham:1",
            replace: "r-ham:2",
            path: location![
                "spec", "install", "spec", "deployments", 0usize,
                "spec", "template", "spec", "containers", 1usize, "image"
            ],
        },
        Planted {
            name: "c3",
            value: "jam:1",
            replace: "r-jam:2",
            path: location![
                "spec", "install", "spec", "deployments", 1usize,
                "spec", "template", "spec", "containers", 0usize, "image"
            ],
        },
        Planted {
            name: "an1",
            value: "registry/namespace/baz:latest",
            replace: "r-registry/r-namespace/r-baz:latest",
            path: location!["metadata", "annotations", "containerImage"],
        },
        Planted {
            name: "ic1",
            value: "pullspec:1",
            replace: "r-pullspec:1",
            path: location![
                "spec", "install", "spec", "deployments", 1usize,
                "spec", "template", "spec", "initContainers", 0usize, "image"
            ],
        },
        Planted {
            name: "ice1",
            value: "pullspec:2",
            replace: "r-pullspec:2",
            path: location![
                "spec", "install", "spec", "deployments", 1usize,
                "spec", "template", "spec", "initContainers", 0usize, "env", 0usize, "value"
            ],
        },
    ]
}

pub fn planted_by_name(name: &str) -> Planted {
    planted().into_iter().find(|p| p.name == name).unwrap()
}

pub fn original_pullspecs() -> std::collections::HashSet<Pullspec> {
    planted().iter().map(Planted::value).collect()
}

pub fn replacement_pullspecs() -> HashMap<Pullspec, Pullspec> {
    planted().iter().map(|p| (p.value(), p.replace())).collect()
}

const TEMPLATE_HEAD: &str = "\
# A meaningful comment
kind: ClusterServiceVersion
metadata:
  annotations:
    containerImage: {an1}
spec:
  relatedImages:
  - name: ri1
    image: {ri1}
  - name: ri2
    image: {ri2}
  install:
    spec:
      deployments:
      - spec:
          template:
            spec:
              containers:
              - name: c1
                image: {c1}
                env:
                - name: RELATED_IMAGE_CE1
                  value: {ce1}
                - name: UNRELATED_IMAGE
                  value: {unrelated}
              - name: c2
                image: {c2}
      - spec:
          template:
            spec:
              containers:
              - name: c3
                image: {c3}
              initContainers:
              - name: ic1
                image: {ic1}
                env:
                - name: RELATED_IMAGE_ICE1
                  value: {ice1}
";

const TEMPLATE_RANDOM: &str = "\
random:
  nested:
    dict:
      a: {ri1}
      b: {ri2}
      c: {c1}
      d: {ce1}
      e: {c2}
      f: {c3}
      g: {an1}
      h: {ic1}
      i: {ice1}
    list:
    - {ri1}
    - {ri2}
    - {c1}
    - {ce1}
    - {c2}
    - {c3}
    - {an1}
    - {ic1}
    - {ice1}
";

fn render(template: &str, replaced: bool, unrelated: &str) -> String {
    let mut out = template.replace("{unrelated}", unrelated);
    for p in planted() {
        let value = if replaced { p.replace } else { p.value };
        out = out.replace(&format!("{{{}}}", p.name), value);
    }
    out
}

/// The untouched fixture
pub fn original_content() -> String {
    let ce1 = planted_by_name("ce1");
    render(TEMPLATE_HEAD, false, ce1.value) + &render(TEMPLATE_RANDOM, false, "")
}

/// Fixture after replacing only recognized locations
pub fn replaced_content() -> String {
    let ce1 = planted_by_name("ce1");
    render(TEMPLATE_HEAD, true, ce1.value) + &render(TEMPLATE_RANDOM, false, "")
}

/// Fixture after replacing every matching string
pub fn replaced_everywhere_content() -> String {
    let ce1 = planted_by_name("ce1");
    render(TEMPLATE_HEAD, true, ce1.replace) + &render(TEMPLATE_RANDOM, true, "")
}

pub fn load(content: &str) -> Value {
    serde_yaml::from_str(content).unwrap()
}
