//! Conflict-safe save
//!
//! Writing a document whose name already exists in the folder either
//! overwrites that file in place or first renames it to a dated backup.
//!
//! ## Naming
//!
//! Backups are named `<base>_<YYYY-MM-DD>.json`, where `<base>` is the
//! document name without a trailing `.json` (any case) and the date is the
//! UTC date the old file was last modified.
//!
//! ```
//! use chrono::NaiveDate;
//! use core_sync::save::backup_name;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
//! assert_eq!(backup_name("data.json", date), "data_2024-01-02.json");
//! assert_eq!(backup_name("Ledger.JSON", date), "Ledger_2024-01-02.json");
//! ```

use chrono::NaiveDate;
use provider_google_drive::GoogleDrive;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::Result;

/// How a save was carried out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveOutcome {
    /// No file had the name; a new one was created
    Created { file_id: String },

    /// The same-named file's content was replaced; its id is unchanged
    Overwritten { file_id: String },

    /// The same-named file was renamed and a new file holds the content
    BackedUp {
        file_id: String,
        /// Id of the renamed file (the old id)
        backup_id: String,
        backup_name: String,
    },
}

impl SaveOutcome {
    /// Id of the file now holding the saved content
    pub fn file_id(&self) -> &str {
        match self {
            SaveOutcome::Created { file_id }
            | SaveOutcome::Overwritten { file_id }
            | SaveOutcome::BackedUp { file_id, .. } => file_id,
        }
    }

    pub fn backup_name(&self) -> Option<&str> {
        match self {
            SaveOutcome::BackedUp { backup_name, .. } => Some(backup_name),
            _ => None,
        }
    }
}

/// `name` without a trailing `.json`, compared case-insensitively.
pub fn base_name(name: &str) -> &str {
    const SUFFIX: &str = ".json";
    match name
        .len()
        .checked_sub(SUFFIX.len())
        .and_then(|split| name.get(split..).map(|tail| (split, tail)))
    {
        Some((split, tail)) if tail.eq_ignore_ascii_case(SUFFIX) => &name[..split],
        _ => name,
    }
}

/// Name a file called `name` is renamed to when backed up on `date`.
pub fn backup_name(name: &str, date: NaiveDate) -> String {
    format!("{}_{}.json", base_name(name), date.format("%Y-%m-%d"))
}

/// Preview line shown while the user picks a save name.
///
/// ```
/// use chrono::NaiveDate;
/// use core_sync::save::rename_preview;
///
/// let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// assert_eq!(
///     rename_preview("data.json", false, today),
///     "Existing \"data.json\" will be overwritten without backup."
/// );
/// ```
pub fn rename_preview(name: &str, rename_existing: bool, today: NaiveDate) -> String {
    if rename_existing {
        format!(
            "Existing \"{}\" will be renamed to {}",
            name,
            backup_name(name, today)
        )
    } else {
        format!("Existing \"{}\" will be overwritten without backup.", name)
    }
}

/// Saves documents without losing a same-named file unless asked to.
pub struct SaveConflictResolver {
    drive: GoogleDrive,
}

impl SaveConflictResolver {
    pub fn new(drive: GoogleDrive) -> Self {
        Self { drive }
    }

    /// Store `content` as the document `name` in the application folder.
    ///
    /// Afterwards exactly one file in the folder is named `name` and it holds
    /// `content`. With `rename_existing`, a file already carrying the name is
    /// first renamed to its dated backup name and keeps its id and content.
    ///
    /// A failure after the rename leaves the backup in place and no file
    /// under `name`.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn save(&self, name: &str, content: &str, rename_existing: bool) -> Result<SaveOutcome> {
        self.drive.folders.ensure_folder().await?;
        let existing = self.drive.catalog.find_by_name(name).await?;

        let outcome = match existing {
            None => SaveOutcome::Created {
                file_id: self.drive.transfer.upload(name, content, None).await?,
            },
            Some(file) if !rename_existing => SaveOutcome::Overwritten {
                file_id: self
                    .drive
                    .transfer
                    .upload(name, content, Some(&file.id))
                    .await?,
            },
            Some(file) => {
                let modified = self.drive.transfer.modified_time(&file.id).await?;
                let backup = backup_name(name, modified.date_naive());
                self.drive.transfer.rename(&file.id, &backup).await?;
                info!(backup_id = %file.id, backup_name = %backup, "Backed up existing document");

                SaveOutcome::BackedUp {
                    file_id: self.drive.transfer.upload(name, content, None).await?,
                    backup_id: file.id,
                    backup_name: backup,
                }
            }
        };

        info!(file_id = %outcome.file_id(), "Saved document");
        Ok(outcome)
    }
}
