use {
    crate::{LivenessError, SaveRequest, result::DetectionResult},
    base::DateTime,
    serde::Serialize,
    std::path::{Path, PathBuf},
};

/// Files written for one saved result.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedArtifact {
    pub image_path: PathBuf,
    pub metadata_path: PathBuf,
    pub save_count: u32,
}

#[derive(Serialize)]
struct MetadataRecord<'a> {
    #[serde(flatten)]
    result: &'a DetectionResult,
    artifact: String,
    save_count: u32,
    image_width: usize,
    image_height: usize,
}

/// Writes a PNG of the captured frame plus a JSON metadata record.
#[derive(Debug, Clone)]
pub struct ResultPersister {
    dir: PathBuf,
}

impl ResultPersister {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<session>_<counter>_<YYYYMMDD_HHMMSS>`
    pub fn base_name(session_id: &str, counter: u32, now: &DateTime) -> String {
        format!("{}_{:04}_{}", session_id, counter, now.to_compact())
    }

    /// Persist on the blocking pool.
    pub async fn save(&self, request: SaveRequest) -> Result<SavedArtifact, LivenessError> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || write_artifact(&dir, &request, &DateTime::now()))
            .await
            .map_err(|e| LivenessError::Persist(e.to_string()))?
    }
}

fn write_artifact(
    dir: &Path,
    request: &SaveRequest,
    now: &DateTime,
) -> Result<SavedArtifact, LivenessError> {
    let io_error = |what: &str, e: std::io::Error| LivenessError::Persist(format!("{what}: {e}"));

    std::fs::create_dir_all(dir).map_err(|e| io_error("cannot create output directory", e))?;

    let base = ResultPersister::base_name(&request.session_id, request.counter, now);
    let image_path = dir.join(format!("{base}.png"));
    let metadata_path = dir.join(format!("{base}.json"));

    let png = image::encode_png(&request.image).map_err(|e| LivenessError::Persist(e.to_string()))?;
    std::fs::write(&image_path, png).map_err(|e| io_error("cannot write image", e))?;

    let record = MetadataRecord {
        result: &request.result,
        artifact: format!("{base}.png"),
        save_count: request.counter,
        image_width: request.image.width(),
        image_height: request.image.height(),
    };
    let written = serde_json::to_string_pretty(&record)
        .map_err(|e| LivenessError::Persist(e.to_string()))
        .and_then(|json| {
            std::fs::write(&metadata_path, json).map_err(|e| io_error("cannot write metadata", e))
        });
    if let Err(e) = written {
        // an image without its metadata is not a saved result
        if let Err(remove) = std::fs::remove_file(&image_path) {
            log::warn!("cannot remove {}: {}", image_path.display(), remove);
        }
        return Err(e);
    }

    log::info!(
        "[{}] saved result {} to {}",
        request.session_id,
        request.counter,
        image_path.display()
    );
    Ok(SavedArtifact {
        image_path,
        metadata_path,
        save_count: request.counter,
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{ConfidenceBand, Decision, SignalScores},
        image::Image,
    };

    fn request() -> SaveRequest {
        SaveRequest {
            session_id: "unit".to_string(),
            counter: 3,
            result: DetectionResult {
                session_id: "unit".to_string(),
                timestamp: "2023-11-14T22:13:20.000Z".to_string(),
                overall: 0.9,
                scores: SignalScores::uniform(0.9),
                decision: Decision::Live,
                attack_type: None,
                frames_analyzed: 15,
                confidence: 0.9,
                confidence_band: ConfidenceBand::from_confidence(0.9),
                vetoed: false,
            },
            image: Image::from_fn(4, 4, |_, _| [200, 140, 110]),
        }
    }

    #[test]
    fn test_failed_metadata_leaves_no_image() {
        let dir = std::env::temp_dir().join(format!("liveness-persist-unit-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let now = DateTime::from_unix_millis(1_700_000_000_000);
        let base = ResultPersister::base_name("unit", 3, &now);

        // a directory where the metadata file should go makes that write fail
        std::fs::create_dir_all(dir.join(format!("{base}.json"))).expect("setup failed");

        let err = write_artifact(&dir, &request(), &now).unwrap_err();
        assert_eq!(err.code(), "persist_failed");
        assert!(!dir.join(format!("{base}.png")).exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
