use std::io;

use thiserror::Error;

/// Failures surfaced by saving or loading a skill tree. Malformed field data
/// is never reported here; the loader recovers from it.
#[derive(Error, Debug)]
pub enum SkillTreeError {
	/// Reading or writing the file failed.
	#[error("IO error: {0}")]
	Io(#[from] io::Error),

	/// The CSV layer could not read or write a record.
	#[error("CSV error: {0}")]
	Csv(#[from] csv::Error),

	/// Written text was not valid UTF-8.
	#[error("Encoding error: {0}")]
	Encoding(#[from] std::string::FromUtf8Error),
}

/// Result alias for saving and loading.
pub type Result<T> = std::result::Result<T, SkillTreeError>;
