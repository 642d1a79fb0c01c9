use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Writes a trained artifact (model or scaling range) as JSON, creating parent directories.
pub fn save_json<T: Serialize>(path: &Path, artifact: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, artifact)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    writer.flush()?;
    info!("Saved artifact to {}", path.display());
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| {
        format!(
            "Failed to open {} (run the training jobs first)",
            path.display()
        )
    })?;
    let artifact = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to deserialize {}", path.display()))?;
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::ScalingRange;

    #[test]
    fn test_save_and_load_scaler() {
        let dir = std::env::temp_dir().join(format!("pricecast-store-{}", std::process::id()));
        let path = dir.join("nested").join("scaler.json");

        let range = ScalingRange::new(22.5, 199.9).unwrap();
        save_json(&path, &range).unwrap();
        let loaded: ScalingRange = load_json(&path).unwrap();
        assert_eq!(loaded, range);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_artifact_mentions_path() {
        let err = load_json::<ScalingRange>(Path::new("does/not/exist.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("does/not/exist.json"));
    }
}
