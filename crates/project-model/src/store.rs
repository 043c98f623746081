//! On-disk project store.
//!
//! Layout:
//! ```text
//! <root>/<id>/project.json
//! <root>/<id>/assets/
//! <root>/<id>/renders/
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::project::{new_id, timestamp_now, Project, ProjectError};

const PROJECT_FILE: &str = "project.json";

/// Short listing entry returned by [`ProjectStore::list`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub updated_at: String,
}

/// One JSON document per project id under a root directory.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one project. Does not create it.
    pub fn project_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    pub fn assets_dir(&self, id: &str) -> PathBuf {
        self.project_dir(id).join("assets")
    }

    pub fn renders_dir(&self, id: &str) -> PathBuf {
        self.project_dir(id).join("renders")
    }

    /// Create and persist a new project with the default tracks.
    pub fn create(
        &self,
        name: impl Into<String>,
        width: u32,
        height: u32,
        fps: u32,
        duration: f64,
    ) -> Result<Project, ProjectError> {
        let mut project = Project::new(name, width, height, fps, duration);
        self.save(&mut project)?;
        tracing::info!(id = %project.id, name = %project.name, "Created project");
        Ok(project)
    }

    /// Load a project by id.
    pub fn load(&self, id: &str) -> Result<Project, ProjectError> {
        if !is_valid_id(id) {
            return Err(ProjectError::NotFound { id: id.to_string() });
        }
        let path = self.project_dir(id).join(PROJECT_FILE);
        if !path.exists() {
            return Err(ProjectError::NotFound { id: id.to_string() });
        }

        let json = std::fs::read_to_string(&path).map_err(|e| ProjectError::IoError {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ProjectError::ParseError { path, source: e })
    }

    /// Persist the whole document, replacing any previous version.
    pub fn save(&self, project: &mut Project) -> Result<(), ProjectError> {
        if !is_valid_id(&project.id) {
            return Err(ProjectError::ValidationError {
                message: format!("invalid project id: {:?}", project.id),
            });
        }
        project.updated_at = timestamp_now();

        let dir = self.project_dir(&project.id);
        for sub in [dir.clone(), dir.join("assets"), dir.join("renders")] {
            std::fs::create_dir_all(&sub).map_err(|e| ProjectError::IoError {
                path: sub.clone(),
                source: e,
            })?;
        }

        let path = dir.join(PROJECT_FILE);
        let json =
            serde_json::to_string_pretty(project).map_err(|e| ProjectError::ParseError {
                path: path.clone(),
                source: e,
            })?;
        std::fs::write(&path, json).map_err(|e| ProjectError::IoError { path, source: e })?;

        tracing::debug!(id = %project.id, "Saved project");
        Ok(())
    }

    /// All loadable projects, most recently updated first.
    pub fn list(&self) -> Result<Vec<ProjectSummary>, ProjectError> {
        if !self.root.exists() {
            return Ok(vec![]);
        }
        let entries = std::fs::read_dir(&self.root).map_err(|e| ProjectError::IoError {
            path: self.root.clone(),
            source: e,
        })?;

        let mut out = vec![];
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let Some(id) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            match self.load(&id) {
                Ok(project) => out.push(ProjectSummary {
                    id: project.id,
                    name: project.name,
                    updated_at: project.updated_at,
                }),
                Err(ProjectError::NotFound { .. }) => {}
                Err(e) => tracing::warn!(id = %id, error = %e, "Skipping unreadable project"),
            }
        }

        // RFC 3339 timestamps from the same clock sort lexicographically.
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(out)
    }

    /// Copy a file into the project's assets directory and register it.
    ///
    /// Returns the new asset id. The project document is saved.
    pub fn import_asset(
        &self,
        project: &mut Project,
        file: impl AsRef<Path>,
    ) -> Result<String, ProjectError> {
        let file = file.as_ref();
        let asset_id = new_id();
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "asset".to_string());

        let assets = self.assets_dir(&project.id);
        std::fs::create_dir_all(&assets).map_err(|e| ProjectError::IoError {
            path: assets.clone(),
            source: e,
        })?;
        let dest = assets.join(format!("{asset_id}_{file_name}"));
        std::fs::copy(file, &dest).map_err(|e| ProjectError::IoError {
            path: file.to_path_buf(),
            source: e,
        })?;

        project.assets.insert(asset_id.clone(), dest);
        self.save(project)?;
        tracing::info!(project = %project.id, asset = %asset_id, "Imported asset");
        Ok(asset_id)
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_validation() {
        assert!(is_valid_id("a1b2c3d4e5f6"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("../etc"));
        assert!(!is_valid_id("a/b"));
    }

    #[test]
    fn test_load_rejects_traversal_as_not_found() {
        let store = ProjectStore::new(std::env::temp_dir().join("reelforge_store_unit"));
        assert!(matches!(
            store.load("../x"),
            Err(ProjectError::NotFound { .. })
        ));
    }
}
