use crate::error::{ManifestError, Result};
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Container image reference (e.g. "registry.example.com/namespace/repo:tag").
///
/// Only constructible through [`Pullspec::parse`], so two pullspecs are equal
/// exactly when their canonical strings are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pullspec {
    registry: Option<String>,
    namespace: Option<String>,
    repo: String,
    tag: Option<String>,
    digest: Option<String>,
}

fn path_component_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap())
}

fn registry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9.-]*(:[0-9]+)?$").unwrap())
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}$").unwrap())
}

fn digest_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9]*(?:[-_+.][A-Za-z][A-Za-z0-9]*)*:[A-Za-z0-9=_-]{32,}$")
            .unwrap()
    })
}

fn invalid(reference: &str, reason: &str) -> ManifestError {
    ManifestError::InvalidReference {
        reference: reference.to_string(),
        reason: reason.to_string(),
    }
}

impl Pullspec {
    /// Parses an image reference string.
    ///
    /// With two '/'-separated parts the first is a registry only if it looks like
    /// a host (contains '.' or ':'); with three or more, the first two are
    /// registry and namespace and the rest is the repository.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(invalid(text, "empty reference"));
        }
        if text.chars().any(char::is_whitespace) {
            return Err(invalid(text, "contains whitespace"));
        }

        let parts: Vec<&str> = text.splitn(3, '/').collect();
        let (registry, namespace, rest) = match parts.as_slice() {
            [rest] => (None, None, *rest),
            [first, rest] if first.contains('.') || first.contains(':') => {
                (Some(*first), None, *rest)
            }
            [first, rest] => (None, Some(*first), *rest),
            [registry, namespace, rest] => (Some(*registry), Some(*namespace), *rest),
            _ => unreachable!("splitn(3) yields between one and three parts"),
        };

        let (name, digest) = match rest.rsplit_once('@') {
            Some((name, digest)) => (name, Some(digest)),
            None => (rest, None),
        };
        let (repo, tag) = match name.rsplit_once(':') {
            Some((repo, tag)) => (repo, Some(tag)),
            None => (name, None),
        };

        if let Some(registry) = registry {
            if !registry_re().is_match(registry) {
                return Err(invalid(text, "malformed registry"));
            }
        }
        if let Some(namespace) = namespace {
            if !path_component_re().is_match(namespace) {
                return Err(invalid(text, "malformed namespace"));
            }
        }
        if repo.is_empty() {
            return Err(invalid(text, "no image repository specified"));
        }
        if !repo.split('/').all(|part| path_component_re().is_match(part)) {
            return Err(invalid(text, "malformed repository"));
        }
        if let Some(tag) = tag {
            if !tag_re().is_match(tag) {
                return Err(invalid(text, "malformed tag"));
            }
        }
        if let Some(digest) = digest {
            if !digest_re().is_match(digest) {
                return Err(invalid(text, "malformed digest"));
            }
        }

        Ok(Self {
            registry: registry.map(str::to_string),
            namespace: namespace.map(str::to_string),
            repo: repo.to_string(),
            tag: tag.map(str::to_string),
            digest: digest.map(str::to_string),
        })
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Repository name without registry or namespace.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Digest such as `sha256:...`; a reference may carry one next to a tag.
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    pub fn is_digest(&self) -> bool {
        self.digest.is_some()
    }

    /// `namespace/repo`, or just `repo` without a namespace.
    pub fn repository(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{}/{}", namespace, self.repo),
            None => self.repo.clone(),
        }
    }
}

impl fmt::Display for Pullspec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}", self.repository())?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

impl FromStr for Pullspec {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Pullspec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pullspec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(de::Error::custom)
    }
}
