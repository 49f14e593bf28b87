use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub log_dir: PathBuf,
    pub state_file: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        PersistenceConfig {
            log_dir: PathBuf::from("logs"),
            state_file: "session-state.json".to_string(),
        }
    }
}

impl PersistenceConfig {
    pub fn state_path(&self) -> PathBuf {
        self.log_dir.join(&self.state_file)
    }
}
