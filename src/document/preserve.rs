use crate::document::spans::SourceMap;
use crate::error::{ManifestError, Result};
use serde_yaml::Value;
use std::fs;
use std::path::Path;

/// YAML document that survives a load/dump round trip with its comments and
/// formatting intact.
///
/// The tree is a plain `serde_yaml::Value`. A parsed document also keeps its
/// source text; on dump only the nodes that changed since parsing are
/// rewritten in that text. When a change has no place in the source the whole
/// tree is serialized again and only the leading comment block survives.
#[derive(Debug, Clone)]
pub struct YamlDocument {
    leading_comments: String,
    source: Option<Source>,
    root: Value,
}

#[derive(Debug, Clone)]
struct Source {
    text: String,
    original: Value,
    map: SourceMap,
}

impl YamlDocument {
    pub fn parse(content: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(content)?;
        let source = SourceMap::build(content).map(|map| Source {
            text: content.to_string(),
            original: root.clone(),
            map,
        });
        Ok(Self {
            leading_comments: leading_comment_block(content),
            source,
            root,
        })
    }

    pub fn from_value(root: Value) -> Self {
        Self {
            leading_comments: String::new(),
            source: None,
            root,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_yaml_string()?;
        fs::write(path, content).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        if let Some(source) = &self.source {
            if let Some(text) = source.map.render(&source.text, &source.original, &self.root)? {
                return Ok(text);
            }
            tracing::debug!("Changes do not fit the source layout, serializing whole document");
        }

        let body = serde_yaml::to_string(&self.root)?;
        let body = body.strip_prefix("---\n").unwrap_or(&body);
        let mut out = String::with_capacity(self.leading_comments.len() + body.len() + 1);
        out.push_str(&self.leading_comments);
        out.push_str(body);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }

    /// Comment lines (and blank lines between them) that precede the content.
    pub fn leading_comments(&self) -> &str {
        &self.leading_comments
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }
}

impl PartialEq for YamlDocument {
    fn eq(&self, other: &Self) -> bool {
        self.leading_comments == other.leading_comments && self.root == other.root
    }
}

fn leading_comment_block(content: &str) -> String {
    let mut block = String::new();
    let mut pending_blank = String::new();
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            block.push_str(&pending_blank);
            pending_blank.clear();
            block.push_str(line);
            block.push('\n');
        } else if trimmed.is_empty() {
            pending_blank.push('\n');
        } else {
            break;
        }
    }
    block
}
