//! Notification source: a local text file or a document fetched over HTTP.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationSource {
    Local(PathBuf),
    Remote(String),
}

impl NotificationSource {
    /// `http://` and `https://` locations are fetched; anything else is a path.
    pub fn from_location(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            NotificationSource::Remote(location.to_string())
        } else {
            NotificationSource::Local(PathBuf::from(location))
        }
    }

    pub async fn read(&self) -> Result<String> {
        match self {
            NotificationSource::Local(path) => {
                debug!(path = %path.display(), "reading notification file");
                tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("read {}", path.display()))
            }
            NotificationSource::Remote(url) => {
                debug!(%url, "downloading notification file");
                let resp = reqwest::get(url)
                    .await
                    .with_context(|| format!("download {url}"))?
                    .error_for_status()
                    .with_context(|| format!("download {url}"))?;
                resp.text()
                    .await
                    .with_context(|| format!("read body of {url}"))
            }
        }
    }
}

/// Split source content into record lines, oldest first, dropping blanks.
pub fn split_records(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_location_kinds() {
        assert_eq!(
            NotificationSource::from_location("https://example.com/meta.txt"),
            NotificationSource::Remote("https://example.com/meta.txt".to_string())
        );
        assert_eq!(
            NotificationSource::from_location("./httpdump.txt"),
            NotificationSource::Local(PathBuf::from("./httpdump.txt"))
        );
    }

    #[test]
    fn test_split_records() {
        let content = "a=1;txref=T1\r\n\r\n   \nb=2;txref=T2\n";
        assert_eq!(split_records(content), vec!["a=1;txref=T1", "b=2;txref=T2"]);
    }

    #[tokio::test]
    async fn test_read_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "to=Jane;txref=T1").unwrap();

        let source = NotificationSource::Local(file.path().to_path_buf());
        let content = source.read().await.unwrap();
        assert_eq!(split_records(&content), vec!["to=Jane;txref=T1"]);
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let source = NotificationSource::from_location("/nonexistent/slipsync/meta.txt");
        let err = source.read().await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/slipsync/meta.txt"));
    }
}
