use crate::domain::model::Attendee;
use crate::domain::ports::AttendeeSource;
use crate::utils::error::{GroupsError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Reads attendee names from the CSV exports in a directory.
#[derive(Debug, Clone)]
pub struct RosterSource {
    directory: PathBuf,
}

enum NameColumns {
    Split { first: usize, last: usize },
    Single(usize),
}

impl NameColumns {
    fn detect(headers: &csv::StringRecord) -> Option<Self> {
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted))
        };

        match (find("First Name"), find("Last Name")) {
            (Some(first), Some(last)) => Some(NameColumns::Split { first, last }),
            _ => find("Name").map(NameColumns::Single),
        }
    }

    fn name(&self, record: &csv::StringRecord) -> String {
        match self {
            NameColumns::Split { first, last } => format!(
                "{} {}",
                record.get(*first).unwrap_or("").trim(),
                record.get(*last).unwrap_or("").trim()
            )
            .trim()
            .to_string(),
            NameColumns::Single(idx) => record.get(*idx).unwrap_or("").trim().to_string(),
        }
    }
}

impl RosterSource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn csv_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.directory)
            .map_err(|e| {
                GroupsError::source_unavailable(format!(
                    "roster directory {} unreadable: {}",
                    self.directory.display(),
                    e
                ))
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn read_file(path: &Path) -> Result<Vec<Attendee>> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let Some(columns) = NameColumns::detect(reader.headers()?) else {
            tracing::warn!("⚠️ Skipping {}: no name columns", path.display());
            return Ok(Vec::new());
        };

        let mut attendees = Vec::new();
        for record in reader.records() {
            let name = columns.name(&record?);
            if !name.is_empty() {
                attendees.push(Attendee::Name(name));
            }
        }
        tracing::debug!("Read {} names from {}", attendees.len(), path.display());
        Ok(attendees)
    }

    fn read_all(&self) -> Result<Vec<Attendee>> {
        let mut attendees = Vec::new();
        for path in self.csv_files()? {
            attendees.extend(Self::read_file(&path)?);
        }
        if attendees.is_empty() {
            return Err(GroupsError::not_found(format!(
                "no attendees in roster directory {}",
                self.directory.display()
            )));
        }
        Ok(attendees)
    }
}

#[async_trait]
impl AttendeeSource for RosterSource {
    async fn fetch_next_session_attendees(&self) -> Result<Vec<Attendee>> {
        let source = self.clone();
        tokio::task::spawn_blocking(move || source.read_all())
            .await
            .map_err(|e| GroupsError::source_unavailable(format!("roster reader failed: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "roster"
    }
}
