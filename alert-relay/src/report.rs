use crate::scanner::AlertType;
use chrono::{Local, NaiveDateTime};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Second resolution, also used in the report file name.
pub const REPORT_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

// Reports raised within the same second get a numeric suffix.
const MAX_NAME_ATTEMPTS: u32 = 100;

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("no free report file name for {0}")]
    NameExhausted(String),
}

/// Writes one text report per alert. Reports are only ever created, never
/// rewritten.
#[derive(Clone, Debug)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ReportWriter { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), ReportError> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Writes a report stamped with the current local time and returns its path.
    pub async fn write(
        &self,
        alert_type: AlertType,
        payload_text: &str,
    ) -> Result<PathBuf, ReportError> {
        self.write_at(alert_type, payload_text, Local::now().naive_local())
            .await
    }

    async fn write_at(
        &self,
        alert_type: AlertType,
        payload_text: &str,
        time: NaiveDateTime,
    ) -> Result<PathBuf, ReportError> {
        self.ensure_dir().await?;

        let stamp = time.format(REPORT_TIME_FORMAT).to_string();
        let contents = render(alert_type, &stamp, payload_text);

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.dir.join(report_file_name(&stamp, attempt));
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(contents.as_bytes()).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(ReportError::NameExhausted(stamp))
    }
}

fn report_file_name(stamp: &str, attempt: u32) -> String {
    match attempt {
        0 => format!("alert_{stamp}.txt"),
        n => format!("alert_{stamp}_{n}.txt"),
    }
}

pub fn render(alert_type: AlertType, stamp: &str, payload_text: &str) -> String {
    format!("ALERT TYPE: {alert_type}\nTIME: {stamp}\nDATA: {payload_text}\n")
}
