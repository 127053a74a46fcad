//! # positive-pay
//!
//! Positive-pay check issue files: the fixed-width format a company sends its
//! bank listing the checks it has written, so the bank can refuse any check
//! that is not on the list.
//!
//! The record layouts live in [`model`] and are read and written with
//! `fixedwidth-rs`. This crate adds file I/O, the trailer checks the codec
//! leaves to its callers, and the `ppay` command-line tool.

pub mod date;
pub mod model;
pub mod verify;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fixedwidth_rs::{EncodeOptions, FormatError, ParseError};
use thiserror::Error;
use tracing::debug;

pub use date::IssueDateFormat;
pub use model::{CheckGroup, CheckGroupTrailer, CheckRecord, FileHeader, PositivePayFile};
pub use verify::{Discrepancy, recompute_trailers, verify};

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("{}: {source}", .path.display())]
    Parse { path: PathBuf, source: ParseError },

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Parse a positive-pay file from text.
pub fn parse(text: &str) -> Result<PositivePayFile, ParseError> {
    fixedwidth_rs::decode(text)
}

/// Render a positive-pay file as text.
pub fn render(file: &PositivePayFile, options: &EncodeOptions) -> Result<String, FormatError> {
    fixedwidth_rs::encode_with(file, options)
}

/// Read and decode the file at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<PositivePayFile, Error> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file = parse(&text).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        groups = file.check_groups.len(),
        "loaded positive-pay file"
    );
    Ok(file)
}

/// Encode `file` with LF line endings and write it to `path`.
pub fn store(path: impl AsRef<Path>, file: &PositivePayFile) -> Result<(), Error> {
    store_with(path, file, &EncodeOptions::default())
}

pub fn store_with(
    path: impl AsRef<Path>,
    file: &PositivePayFile,
    options: &EncodeOptions,
) -> Result<(), Error> {
    let path = path.as_ref();
    let text = render(file, options)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| Error::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "stored positive-pay file");
    Ok(())
}
