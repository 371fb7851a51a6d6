use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thermcore::annotation::{MarkerRepository, PersistedMarker};
use thermcore::prelude::{PersistenceError, PersistenceResult};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarkerFile {
    measurement_id: String,
    markers: Vec<PersistedMarker>,
}

/// One JSON document per measurement under `root`.
///
/// Replacement writes a sibling temp file and renames it over the old one, so
/// a failed save never leaves an empty or partial marker list behind.
#[derive(Debug, Clone)]
pub struct FileMarkerRepository {
    root: PathBuf,
}

impl FileMarkerRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, measurement_id: &str) -> PersistenceResult<PathBuf> {
        let valid = !measurement_id.is_empty()
            && !measurement_id.starts_with('.')
            && measurement_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(PersistenceError::Rejected(format!(
                "invalid measurement id '{}'",
                measurement_id
            )));
        }
        Ok(self.root.join(format!("{}.json", measurement_id)))
    }
}

fn io_error(context: &str, err: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::Io(format!("{}: {}", context, err))
}

fn read_markers(path: &Path) -> PersistenceResult<Vec<PersistedMarker>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(io_error(&path.display().to_string(), err)),
    };
    let file: MarkerFile = serde_json::from_str(&contents)
        .map_err(|err| PersistenceError::Serialization(err.to_string()))?;
    Ok(file.markers)
}

fn write_markers(root: &Path, path: &Path, file: &MarkerFile) -> PersistenceResult<()> {
    fs::create_dir_all(root).map_err(|err| io_error("creating marker store", err))?;
    let payload = serde_json::to_vec_pretty(file)
        .map_err(|err| PersistenceError::Serialization(err.to_string()))?;
    let mut temp =
        NamedTempFile::new_in(root).map_err(|err| io_error("creating temp file", err))?;
    temp.write_all(&payload)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|err| io_error("writing temp file", err))?;
    temp.persist(path)
        .map_err(|err| io_error(&path.display().to_string(), err.error))?;
    Ok(())
}

#[async_trait]
impl MarkerRepository for FileMarkerRepository {
    async fn load(&self, measurement_id: &str) -> PersistenceResult<Vec<PersistedMarker>> {
        let path = self.path_for(measurement_id)?;
        tokio::task::spawn_blocking(move || read_markers(&path))
            .await
            .map_err(|err| io_error("marker load task", err))?
    }

    async fn replace_all(
        &self,
        measurement_id: &str,
        markers: &[PersistedMarker],
    ) -> PersistenceResult<()> {
        let path = self.path_for(measurement_id)?;
        let root = self.root.clone();
        let file = MarkerFile {
            measurement_id: measurement_id.to_string(),
            markers: markers.to_vec(),
        };
        tokio::task::spawn_blocking(move || write_markers(&root, &path, &file))
            .await
            .map_err(|err| io_error("marker save task", err))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(index: u32, x: u32) -> PersistedMarker {
        PersistedMarker {
            index,
            x,
            y: 2,
            temperature: 48.5,
            element_type: "Electrical Asset".into(),
            final_action: "Monitor".into(),
        }
    }

    #[tokio::test]
    async fn missing_measurement_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileMarkerRepository::new(dir.path());
        assert!(repo.load("panel-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_all_overwrites_previous_list() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileMarkerRepository::new(dir.path().join("nested"));
        repo.replace_all("panel-1", &[marker(1, 1), marker(2, 2), marker(3, 3)])
            .await
            .unwrap();
        repo.replace_all("panel-1", &[marker(1, 9)]).await.unwrap();

        let loaded = repo.load("panel-1").await.unwrap();
        assert_eq!(loaded, vec![marker(1, 9)]);
        let leftovers = fs::read_dir(dir.path().join("nested")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn path_traversal_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileMarkerRepository::new(dir.path());
        for id in ["../escape", "", ".hidden", "a/b"] {
            assert!(matches!(
                repo.load(id).await.unwrap_err(),
                PersistenceError::Rejected(_)
            ));
        }
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("panel-2.json"), b"{oops").unwrap();
        let repo = FileMarkerRepository::new(dir.path());
        assert!(matches!(
            repo.load("panel-2").await.unwrap_err(),
            PersistenceError::Serialization(_)
        ));
    }
}
