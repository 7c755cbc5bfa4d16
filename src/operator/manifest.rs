use crate::config::CsvConfig;
use crate::error::{is_skippable, ManifestError, Result};
use crate::operator::csv::OperatorCsv;
use crate::pullspec::Pullspec;
use std::collections::HashSet;
use std::path::Path;
use walkdir::WalkDir;

/// All ClusterServiceVersion documents found under an operator bundle directory
#[derive(Debug, Clone, Default)]
pub struct OperatorManifest {
    files: Vec<OperatorCsv>,
}

impl OperatorManifest {
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_directory_with_config(path, CsvConfig::default())
    }

    /// Loads every CSV under `path`, silently skipping other files.
    ///
    /// Within each directory files come first, in name order, then
    /// subdirectories, also in name order, so the result is deterministic.
    pub fn from_directory_with_config(path: impl AsRef<Path>, config: CsvConfig) -> Result<Self> {
        let root = path.as_ref();
        if !root.is_dir() {
            return Err(ManifestError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by(|a, b| {
                a.file_type()
                    .is_dir()
                    .cmp(&b.file_type().is_dir())
                    .then_with(|| a.file_name().cmp(b.file_name()))
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry?;
            // symlinks are not followed while walking, but linked files still count
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }
            match OperatorCsv::from_file(entry.path()) {
                Ok(csv) => files.push(csv.with_config(config.clone())),
                Err(err) if is_skippable(&err) => {
                    tracing::debug!(file = %entry.path().display(), reason = %err, "Skipping file");
                }
                Err(err) => return Err(err),
            }
        }

        tracing::info!(
            directory = %root.display(),
            csv_count = files.len(),
            "Loaded operator manifest"
        );
        Ok(Self { files })
    }

    pub fn files(&self) -> &[OperatorCsv] {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut [OperatorCsv] {
        &mut self.files
    }

    pub fn into_files(self) -> Vec<OperatorCsv> {
        self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Union of the pullspecs of every CSV in the manifest.
    pub fn get_pullspecs(&self) -> Result<HashSet<Pullspec>> {
        let mut pullspecs = HashSet::new();
        for csv in &self.files {
            pullspecs.extend(csv.get_pullspecs()?);
        }
        Ok(pullspecs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CSV: &str = "kind: ClusterServiceVersion\nspec:\n  relatedImages:\n  - name: a\n    image: a:1\n";

    #[test]
    fn test_files_before_subdirectories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("a-nested")).unwrap();
        fs::write(dir.path().join("a-nested").join("inner.yaml"), CSV).unwrap();
        fs::write(dir.path().join("z-top.yaml"), CSV).unwrap();
        fs::write(dir.path().join("b-top.yaml"), CSV).unwrap();

        let manifest = OperatorManifest::from_directory(dir.path()).unwrap();
        let names: Vec<String> = manifest
            .files()
            .iter()
            .map(|csv| csv.path().strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "b-top.yaml".to_string(),
                "z-top.yaml".to_string(),
                Path::new("a-nested").join("inner.yaml").display().to_string(),
            ]
        );
    }

    #[test]
    fn test_non_yaml_files_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README.md"), "# Bundle\n\n: not: yaml: [").unwrap();
        fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00, 0x81]).unwrap();
        fs::write(dir.path().join("csv.yaml"), CSV).unwrap();

        let manifest = OperatorManifest::from_directory(dir.path()).unwrap();
        assert_eq!(manifest.files().len(), 1);
        assert_eq!(manifest.get_pullspecs().unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_csv_loaded() {
        let target = TempDir::new().unwrap();
        fs::write(target.path().join("csv.yaml"), CSV).unwrap();
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(target.path().join("csv.yaml"), dir.path().join("link.yaml"))
            .unwrap();

        let manifest = OperatorManifest::from_directory(dir.path()).unwrap();
        assert_eq!(manifest.files().len(), 1);
        assert_eq!(manifest.files()[0].path(), dir.path().join("link.yaml"));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_ignored() {
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(dir.path().join("missing.yaml"), dir.path().join("link.yaml"))
            .unwrap();
        let manifest = OperatorManifest::from_directory(dir.path()).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let manifest = OperatorManifest::from_directory(dir.path()).unwrap();
        assert!(manifest.is_empty());
    }
}
