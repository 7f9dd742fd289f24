use crate::domain::model::ParticipantRecord;
use crate::utils::error::{MatchError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 本機檔案讀寫，路徑相對於 `base_path`
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.base_path.join(candidate)
        }
    }

    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = fs::read(self.resolve(path)).await?;
        Ok(data)
    }

    pub async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(full_path, data).await?;
        Ok(())
    }

    /// 讀取參與者 JSON：陣列或單一物件皆可
    pub async fn load_participants(&self, path: &str) -> Result<Vec<ParticipantRecord>> {
        let bytes = self.read_file(path).await?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)?;

        let records: Vec<ParticipantRecord> = match value {
            serde_json::Value::Array(_) => serde_json::from_value(value)?,
            serde_json::Value::Object(_) => vec![serde_json::from_value(value)?],
            other => {
                return Err(MatchError::InvalidProfile {
                    field: path.to_string(),
                    reason: format!("expected participant object or array, got {}", other),
                })
            }
        };

        tracing::debug!("Loaded {} participant record(s) from {}", records.len(), path);
        Ok(records)
    }

    /// 配對檔：恰好兩位參與者
    pub async fn load_pair(&self, path: &str) -> Result<(ParticipantRecord, ParticipantRecord)> {
        let mut records = self.load_participants(path).await?;
        if records.len() != 2 {
            return Err(MatchError::InvalidProfile {
                field: path.to_string(),
                reason: format!("expected exactly 2 participants, found {}", records.len()),
            });
        }
        let second = records.remove(1);
        let first = records.remove(0);
        Ok((first, second))
    }
}
