//! Page-at-a-time CSV output that a later run can pick up from
//!
//! Every row ends with the number of the catalog page it came from. Pages are
//! written whole, so the highest page number in an existing file is the last
//! page that finished, and the next run starts right after it.

use crate::output::prompt::{Choice, ConflictResolver};
use crate::record::{Record, PAGE_COLUMN};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while preparing or writing the output file
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{path} has a different header than this version writes, refusing to append")]
    HeaderMismatch { path: String },

    #[error("Aborted by operator")]
    Aborted,
}

/// What to do when the output file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Truncate and start over from page 1
    Overwrite,
    /// Keep the rows and resume after the last written page
    Continue,
    /// Ask the operator
    #[default]
    Prompt,
}

/// Output file opened for appending whole pages
pub struct ResumableSink {
    path: PathBuf,
    file: File,
    resume_point: u32,
    rows_written: usize,
}

impl ResumableSink {
    /// Opens `path` for writing according to `policy`
    ///
    /// A missing (or empty) file is created with a header row. An existing
    /// file is truncated, resumed or handed to `resolver`, which may also
    /// redirect output to another path.
    ///
    /// # Errors
    ///
    /// * `SinkError::HeaderMismatch` - Resuming a file written with other columns
    /// * `SinkError::Aborted` - The operator chose to abort
    pub fn open(
        path: impl Into<PathBuf>,
        policy: ConflictPolicy,
        resolver: &mut dyn ConflictResolver,
    ) -> Result<Self, SinkError> {
        let mut path = path.into();

        loop {
            if !has_content(&path)? {
                return Self::create(path);
            }

            let choice = match policy {
                ConflictPolicy::Overwrite => Choice::Overwrite,
                ConflictPolicy::Continue => Choice::Continue,
                ConflictPolicy::Prompt => resolver.resolve(&path)?,
            };

            match choice {
                Choice::Overwrite => return Self::create(path),
                Choice::Continue => return Self::resume(path),
                Choice::NewPath(new_path) => path = new_path,
                Choice::Abort => return Err(SinkError::Aborted),
            }
        }
    }

    fn create(path: PathBuf) -> Result<Self, SinkError> {
        tracing::info!("Writing fresh output to {}", path.display());
        let mut file = File::create(&path)?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(Record::header())?;
        file.write_all(&finish(writer)?)?;
        file.sync_data()?;

        Ok(Self {
            path,
            file,
            resume_point: 1,
            rows_written: 0,
        })
    }

    fn resume(path: PathBuf) -> Result<Self, SinkError> {
        let resume_point = read_resume_point(&path)?;
        tracing::info!(
            "Continuing {} from page {}",
            path.display(),
            resume_point
        );
        let file = OpenOptions::new().append(true).open(&path)?;

        Ok(Self {
            path,
            file,
            resume_point,
            rows_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First page that still has to be crawled
    pub fn resume_point(&self) -> u32 {
        self.resume_point
    }

    /// Rows appended by this sink since it was opened
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Appends one complete page in a single write
    ///
    /// Returns once the page is on disk, so a crash afterwards still resumes
    /// after `page`.
    ///
    /// # Arguments
    ///
    /// * `page` - Catalog page the records came from
    /// * `records` - The page's records, in page order
    pub fn append_page(&mut self, page: u32, records: &[Record]) -> Result<(), SinkError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in records {
            writer.write_record(record.to_row(page))?;
        }
        let buffer = finish(writer)?;

        self.file.write_all(&buffer)?;
        self.file.sync_data()?;

        self.rows_written += records.len();
        self.resume_point = self.resume_point.max(page + 1);
        tracing::debug!("Appended {} rows for page {}", records.len(), page);
        Ok(())
    }
}

fn has_content(path: &Path) -> io::Result<bool> {
    match path.metadata() {
        Ok(metadata) => Ok(metadata.len() > 0),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, SinkError> {
    writer
        .into_inner()
        .map_err(|e| SinkError::Io(e.into_error()))
}

/// `1 + ` the highest page number in an existing output file, 1 when it has no rows
///
/// Rows whose page column does not hold a number are skipped.
pub fn read_resume_point(path: &Path) -> Result<u32, SinkError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let expected = Record::header();
    let found = reader.headers()?;
    if found.iter().ne(expected.iter().map(String::as_str)) {
        return Err(SinkError::HeaderMismatch {
            path: path.display().to_string(),
        });
    }

    let mut last_page = 0;
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        match row.get(expected.len() - 1).map(|page| page.trim().parse::<u32>()) {
            Some(Ok(page)) => last_page = last_page.max(page),
            _ => tracing::warn!(
                "Row {} of {} has no usable '{}' value, skipping it",
                line + 2,
                path.display(),
                PAGE_COLUMN
            ),
        }
    }

    Ok(last_page + 1)
}
