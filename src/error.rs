//! Error type shared by the board store, persistence, export and suggestion code.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Everything that can go wrong while editing, saving or exporting the board.
///
/// None of these are fatal: callers log them and keep the last good state.
#[derive(Debug, Error)]
pub enum BoardError {
	/// A connection from a course to itself was requested.
	#[error("a course cannot be its own prerequisite: {0}")]
	SelfLoop(String),

	/// The directed pair already has a connection.
	#[error("connection {from} -> {to} already exists")]
	DuplicateConnection {
		/// Source course id.
		from: String,
		/// Target course id.
		to: String,
	},

	/// No course with this id is on the board.
	#[error("unknown course: {0}")]
	UnknownCourse(String),

	/// No semester column with this id exists.
	#[error("unknown semester: {0}")]
	UnknownSemester(String),

	/// No connection with this id exists.
	#[error("unknown connection: {0}")]
	UnknownConnection(String),

	/// A control point index past the end of the connection's list.
	#[error("connection {connection} has no control point {index}")]
	ControlPointOutOfRange {
		/// Connection id.
		connection: String,
		/// Requested index.
		index: usize,
	},

	/// A course record failed validation.
	#[error("invalid course: {0}")]
	InvalidCourse(&'static str),

	/// Reading or writing local storage failed.
	#[error("storage error: {0}")]
	Storage(String),

	/// Rasterizing or saving an export failed.
	#[error("export failed: {0}")]
	Export(String),

	/// The curriculum suggestion request failed or returned garbage.
	#[error("suggestion failed: {0}")]
	Suggestion(String),

	/// JSON (de)serialization error.
	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),
}

impl BoardError {
	/// Wraps a JavaScript exception raised by a storage call.
	pub fn storage(context: &str, err: JsValue) -> Self {
		Self::Storage(format!("{context}: {err:?}"))
	}

	/// Wraps a JavaScript exception raised while exporting.
	pub fn export(context: &str, err: JsValue) -> Self {
		Self::Export(format!("{context}: {err:?}"))
	}

	/// Wraps a JavaScript exception raised while talking to the suggestion service.
	pub fn suggestion(context: &str, err: JsValue) -> Self {
		Self::Suggestion(format!("{context}: {err:?}"))
	}
}
