//! Local-storage persistence of the semester and connection lists.

use std::cell::RefCell;
use std::collections::HashMap;

use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::components::board::{BoardState, Connection, Semester, default_semesters};
use crate::config::StorageKeys;
use crate::error::BoardError;

/// String key-value storage.
pub trait KeyValueStore {
	/// Returns the stored value, or `None` when absent or unreadable.
	fn get(&self, key: &str) -> Option<String>;
	/// Stores a value under `key`.
	fn set(&self, key: &str, value: &str) -> Result<(), BoardError>;
	/// Deletes `key`.
	fn remove(&self, key: &str) -> Result<(), BoardError>;
}

/// The browser's `window.localStorage`.
pub struct BrowserStorage(web_sys::Storage);

impl BrowserStorage {
	/// `None` when storage is disabled (private mode, sandboxed iframes).
	pub fn open() -> Option<Self> {
		web_sys::window()?.local_storage().ok().flatten().map(Self)
	}
}

impl KeyValueStore for BrowserStorage {
	fn get(&self, key: &str) -> Option<String> {
		self.0.get_item(key).ok().flatten()
	}

	fn set(&self, key: &str, value: &str) -> Result<(), BoardError> {
		self.0
			.set_item(key, value)
			.map_err(|e| BoardError::storage(key, e))
	}

	fn remove(&self, key: &str) -> Result<(), BoardError> {
		self.0
			.remove_item(key)
			.map_err(|e| BoardError::storage(key, e))
	}
}

/// In-memory store used when local storage is unavailable.
#[derive(Default)]
pub struct MemoryStore {
	entries: RefCell<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.borrow().get(key).cloned()
	}

	fn set(&self, key: &str, value: &str) -> Result<(), BoardError> {
		self.entries.borrow_mut().insert(key.into(), value.into());
		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), BoardError> {
		self.entries.borrow_mut().remove(key);
		Ok(())
	}
}

/// Browser storage if available, memory otherwise.
pub fn open_store() -> Box<dyn KeyValueStore> {
	match BrowserStorage::open() {
		Some(storage) => Box::new(storage),
		None => {
			warn!("localStorage unavailable; changes will not survive a reload");
			Box::new(MemoryStore::default())
		}
	}
}

fn load_entry<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
	let raw = store.get(key)?;
	match serde_json::from_str(&raw) {
		Ok(value) => Some(value),
		Err(err) => {
			debug!("discarding unreadable {key}: {err}");
			None
		}
	}
}

/// Loads the board; each entry that is missing or corrupt falls back to its default.
pub fn load_board(store: &dyn KeyValueStore, keys: &StorageKeys) -> BoardState {
	let semesters: Vec<Semester> =
		load_entry(store, &keys.semesters).unwrap_or_else(default_semesters);
	let connections: Vec<Connection> = load_entry(store, &keys.connections).unwrap_or_default();
	BoardState::new(semesters, connections)
}

/// Writes both entries.
pub fn save_board(
	store: &dyn KeyValueStore,
	keys: &StorageKeys,
	board: &BoardState,
) -> Result<(), BoardError> {
	store.set(&keys.semesters, &serde_json::to_string(board.semesters())?)?;
	store.set(
		&keys.connections,
		&serde_json::to_string(board.connections())?,
	)?;
	Ok(())
}

/// Removes both entries so the next load starts from defaults.
pub fn clear_board(store: &dyn KeyValueStore, keys: &StorageKeys) -> Result<(), BoardError> {
	store.remove(&keys.semesters)?;
	store.remove(&keys.connections)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::board::{BoardCommand, Course, CourseColor, PathType, Point};

	fn populated() -> BoardState {
		let mut board = BoardState::default();
		for (semester, id) in [("semester-1", "c1"), ("semester-2", "c2")] {
			board
				.apply(BoardCommand::UpsertCourse {
					semester_id: semester.into(),
					course: Course {
						id: id.into(),
						name: id.to_uppercase(),
						sks: 3,
						color: CourseColor::Purple,
						description: Some("lab".into()),
					},
				})
				.unwrap();
		}
		board
			.apply(BoardCommand::Connect {
				from_id: "c1".into(),
				to_id: "c2".into(),
			})
			.unwrap();
		board
	}

	#[test]
	fn empty_store_loads_default_board() {
		let board = load_board(&MemoryStore::default(), &StorageKeys::default());
		assert_eq!(board.semesters().len(), 9);
		assert!(board.connections().is_empty());
	}

	#[test]
	fn corrupt_semesters_fall_back_to_empty_layout() {
		let store = MemoryStore::default();
		let keys = StorageKeys::default();
		store.set(&keys.semesters, "[{\"id\": oops").unwrap();
		let board = load_board(&store, &keys);
		assert_eq!(board.semesters().len(), 9);
		assert!(board.semesters().iter().all(|s| s.courses.is_empty()));
		assert!(board.connections().is_empty());
	}

	#[test]
	fn saved_board_reloads_identically() {
		let store = MemoryStore::default();
		let keys = StorageKeys::default();
		let board = populated();
		save_board(&store, &keys, &board).unwrap();
		let reloaded = load_board(&store, &keys);
		assert_eq!(reloaded.semesters(), board.semesters());
		assert_eq!(reloaded.connections(), board.connections());
	}

	#[test]
	fn connection_wire_format_uses_camel_case_and_omits_empty_points() {
		let store = MemoryStore::default();
		let keys = StorageKeys::default();
		save_board(&store, &keys, &populated()).unwrap();
		let raw = store.get(&keys.connections).unwrap();
		assert!(raw.contains("\"fromId\":\"c1\""));
		assert!(raw.contains("\"pathType\":\"smooth\""));
		assert!(!raw.contains("controlPoints"));
	}

	#[test]
	fn reads_entries_written_without_optional_fields() {
		let store = MemoryStore::default();
		let keys = StorageKeys::default();
		store
			.set(
				&keys.semesters,
				r#"[{"id":"semester-1","title":"Semester 1","courses":[
					{"id":"a","name":"A","sks":2,"color":"blue"},
					{"id":"b","name":"B","sks":3,"color":"teal"}]}]"#,
			)
			.unwrap();
		store
			.set(
				&keys.connections,
				r#"[{"id":"x","fromId":"a","toId":"b","controlPoints":[{"x":1,"y":2}]}]"#,
			)
			.unwrap();
		let board = load_board(&store, &keys);
		assert_eq!(board.semesters()[0].courses[1].color, CourseColor::Gray);
		let conn = &board.connections()[0];
		assert_eq!(conn.path_type, PathType::Smooth);
		assert_eq!(conn.control_points, vec![Point::new(1.0, 2.0)]);
	}

	#[test]
	fn clear_removes_both_entries() {
		let store = MemoryStore::default();
		let keys = StorageKeys::default();
		save_board(&store, &keys, &populated()).unwrap();
		clear_board(&store, &keys).unwrap();
		assert!(store.get(&keys.semesters).is_none());
		assert!(store.get(&keys.connections).is_none());
	}
}
