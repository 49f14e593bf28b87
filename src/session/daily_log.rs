use chrono::{DateTime, Local, NaiveDate};
use std::path::{Path, PathBuf};
use tokio::fs::{self as async_fs, OpenOptions};
use tokio::io::AsyncWriteExt;
use crate::error::{Error, Result};
use crate::types::RateSample;
use crate::variation::format_change;

const SEPARATOR: &str = "----------------------------------------";

/// Append-only plain-text log, one file per local calendar day.
///
/// ```text
/// [AwesomeAPI] Session #3 | Update #12
/// ----------------------------------------
/// Date: 18/10/2026 14:05:31
/// Rate: R$ 5.25
/// ▲ +0.29% (+0.0150)
///
/// ```
#[derive(Clone, Debug)]
pub struct DailyLog {
    dir: PathBuf,
}

impl DailyLog {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        DailyLog {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("usd-brl-{}.log", date.format("%Y-%m-%d")))
    }

    pub async fn append(&self, session_number: u64, update_number: u64, sample: &RateSample) -> Result<()> {
        let local = sample.captured_at.with_timezone(&Local);
        let block = format_block(session_number, update_number, sample, &local);

        async_fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(local.date_naive());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| Error::PersistenceError(format!("{}: {}", path.display(), e)))?;

        file.write_all(block.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

pub fn format_block(
    session_number: u64,
    update_number: u64,
    sample: &RateSample,
    local_time: &DateTime<Local>,
) -> String {
    format!(
        "[{}] Session #{} | Update #{}\n{}\nDate: {}\nRate: R$ {:.2}\n{} {} ({})\n\n",
        sample.source,
        session_number,
        update_number,
        SEPARATOR,
        local_time.format("%d/%m/%Y %H:%M:%S"),
        sample.rate,
        sample.variation.direction.symbol(),
        sample.variation.percent,
        format_change(sample.variation.absolute_change),
    )
}
