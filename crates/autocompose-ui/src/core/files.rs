//! Job input assembly from the generated-files list.
//!
//! # Design
//! - Each generated file row carries `data-subdir-name` and `data-filename`.
//! - Incomplete rows are skipped, duplicates collapse, page order is preserved.
//! - An empty result is a local error; no job is started for zero files.

use std::collections::HashSet;

use autocompose_api_models::JobFile;
use tracing::warn;

use crate::core::error::JobInputError;

/// Marker attribute on each generated file row.
pub const ATTR_GENERATED_FILE: &str = "data-generated-file";
/// Attribute holding the output subdirectory.
pub const ATTR_SUBDIR_NAME: &str = "data-subdir-name";
/// Attribute holding the file name.
pub const ATTR_FILENAME: &str = "data-filename";

/// Build the job file list from raw `(subdir_name, filename)` attribute pairs.
///
/// # Errors
/// Returns [`JobInputError::NoFiles`] when no complete entry remains.
pub fn collect_job_files<I>(entries: I) -> Result<Vec<JobFile>, JobInputError>
where
    I: IntoIterator<Item = (Option<String>, Option<String>)>,
{
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for (index, (subdir, filename)) in entries.into_iter().enumerate() {
        let (Some(subdir_name), Some(filename)) = (non_blank(subdir), non_blank(filename)) else {
            warn!(index, "skipping generated file entry without subdir or filename");
            continue;
        };
        let file = JobFile {
            subdir_name,
            filename,
        };
        if seen.insert(file.clone()) {
            files.push(file);
        }
    }
    if files.is_empty() {
        return Err(JobInputError::NoFiles);
    }
    Ok(files)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(subdir: &str, filename: &str) -> (Option<String>, Option<String>) {
        (Some(subdir.to_string()), Some(filename.to_string()))
    }

    #[test]
    fn keeps_page_order_and_drops_duplicates() {
        let files = collect_job_files(vec![
            entry("batch_1", "web.yml"),
            entry("batch_1", "db.yml"),
            entry("batch_1", "web.yml"),
        ])
        .unwrap();
        let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["web.yml", "db.yml"]);
    }

    #[test]
    fn incomplete_rows_are_skipped() {
        let files = collect_job_files(vec![
            (None, Some("orphan.yml".into())),
            (Some("batch_1".into()), Some("  ".into())),
            entry(" batch_2 ", "stack.yml"),
        ])
        .unwrap();
        assert_eq!(
            files,
            vec![JobFile {
                subdir_name: "batch_2".into(),
                filename: "stack.yml".into(),
            }]
        );
    }

    #[test]
    fn empty_page_is_an_error() {
        assert_eq!(collect_job_files(Vec::new()), Err(JobInputError::NoFiles));
    }
}
