use log::{debug, info};

use super::geometry::Point;
use super::types::{Connection, Course, Semester, default_semesters};
use crate::error::BoardError;

/// Every mutation the board accepts. The UI never touches [`BoardState`]
/// fields directly; it builds one of these and hands it to [`BoardState::apply`].
#[derive(Clone, Debug, PartialEq)]
pub enum BoardCommand {
	UpsertCourse {
		semester_id: String,
		course: Course,
	},
	DeleteCourse {
		course_id: String,
	},
	MoveCourse {
		course_id: String,
		to_semester: String,
		to_index: usize,
	},
	Connect {
		from_id: String,
		to_id: String,
	},
	CyclePathType {
		connection_id: String,
	},
	AddControlPoint {
		connection_id: String,
		point: Point,
	},
	MoveControlPoint {
		connection_id: String,
		index: usize,
		point: Point,
	},
	RemoveControlPoint {
		connection_id: String,
		index: usize,
	},
	ResetPath {
		connection_id: String,
	},
	DeleteConnection {
		connection_id: String,
	},
	ClearConnections,
	ResetBoard,
	ApplySuggestion {
		semesters: Vec<Vec<Course>>,
	},
}

/// Semesters, connections and a revision counter bumped on every change.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardState {
	semesters: Vec<Semester>,
	connections: Vec<Connection>,
	revision: u64,
}

impl Default for BoardState {
	fn default() -> Self {
		Self::new(default_semesters(), Vec::new())
	}
}

impl BoardState {
	/// Builds a board, dropping connections that point at missing courses.
	pub fn new(semesters: Vec<Semester>, connections: Vec<Connection>) -> Self {
		let mut state = Self {
			semesters,
			connections,
			revision: 0,
		};
		let before = state.connections.len();
		let semesters = &state.semesters;
		state.connections.retain(|c| {
			c.from_id != c.to_id
				&& Self::has_course_in(semesters, &c.from_id)
				&& Self::has_course_in(semesters, &c.to_id)
		});
		if state.connections.len() != before {
			debug!(
				"dropped {} dangling connection(s) on load",
				before - state.connections.len()
			);
		}
		state
	}

	pub fn semesters(&self) -> &[Semester] {
		&self.semesters
	}

	pub fn connections(&self) -> &[Connection] {
		&self.connections
	}

	pub fn revision(&self) -> u64 {
		self.revision
	}

	pub fn connection(&self, id: &str) -> Option<&Connection> {
		self.connections.iter().find(|c| c.id == id)
	}

	pub fn has_course(&self, id: &str) -> bool {
		Self::has_course_in(&self.semesters, id)
	}

	fn has_course_in(semesters: &[Semester], id: &str) -> bool {
		semesters.iter().any(|s| s.courses.iter().any(|c| c.id == id))
	}

	/// (column index, row index) of a course.
	pub fn locate(&self, course_id: &str) -> Option<(usize, usize)> {
		self.semesters.iter().enumerate().find_map(|(si, s)| {
			s.courses
				.iter()
				.position(|c| c.id == course_id)
				.map(|ci| (si, ci))
		})
	}

	pub fn is_connected(&self, from_id: &str, to_id: &str) -> bool {
		self.connections
			.iter()
			.any(|c| c.from_id == from_id && c.to_id == to_id)
	}

	/// Applies one command. On error the board is left exactly as it was.
	pub fn apply(&mut self, command: BoardCommand) -> Result<(), BoardError> {
		let changed = match command {
			BoardCommand::UpsertCourse {
				semester_id,
				course,
			} => self.upsert_course(&semester_id, course)?,
			BoardCommand::DeleteCourse { course_id } => self.delete_course(&course_id)?,
			BoardCommand::MoveCourse {
				course_id,
				to_semester,
				to_index,
			} => self.move_course(&course_id, &to_semester, to_index)?,
			BoardCommand::Connect { from_id, to_id } => self.connect(&from_id, &to_id)?,
			BoardCommand::CyclePathType { connection_id } => {
				let conn = self.connection_mut(&connection_id)?;
				conn.path_type = conn.path_type.next();
				true
			}
			BoardCommand::AddControlPoint {
				connection_id,
				point,
			} => {
				self.connection_mut(&connection_id)?
					.control_points
					.push(point);
				true
			}
			BoardCommand::MoveControlPoint {
				connection_id,
				index,
				point,
			} => {
				let conn = self.connection_mut(&connection_id)?;
				let slot = conn.control_points.get_mut(index).ok_or_else(|| {
					BoardError::ControlPointOutOfRange {
						connection: connection_id.clone(),
						index,
					}
				})?;
				*slot = point;
				true
			}
			BoardCommand::RemoveControlPoint {
				connection_id,
				index,
			} => {
				let conn = self.connection_mut(&connection_id)?;
				if index >= conn.control_points.len() {
					return Err(BoardError::ControlPointOutOfRange {
						connection: connection_id,
						index,
					});
				}
				conn.control_points.remove(index);
				true
			}
			BoardCommand::ResetPath { connection_id } => {
				let conn = self.connection_mut(&connection_id)?;
				!std::mem::take(&mut conn.control_points).is_empty()
			}
			BoardCommand::DeleteConnection { connection_id } => {
				let before = self.connections.len();
				self.connections.retain(|c| c.id != connection_id);
				if self.connections.len() == before {
					return Err(BoardError::UnknownConnection(connection_id));
				}
				true
			}
			BoardCommand::ClearConnections => !std::mem::take(&mut self.connections).is_empty(),
			BoardCommand::ResetBoard => {
				self.semesters = default_semesters();
				self.connections.clear();
				info!("board reset to defaults");
				true
			}
			BoardCommand::ApplySuggestion { semesters } => {
				self.apply_suggestion(semesters);
				true
			}
		};
		if changed {
			self.revision += 1;
		}
		Ok(())
	}

	fn connection_mut(&mut self, id: &str) -> Result<&mut Connection, BoardError> {
		self.connections
			.iter_mut()
			.find(|c| c.id == id)
			.ok_or_else(|| BoardError::UnknownConnection(id.into()))
	}

	fn upsert_course(&mut self, semester_id: &str, course: Course) -> Result<bool, BoardError> {
		if course.name.trim().is_empty() {
			return Err(BoardError::InvalidCourse("name must not be empty"));
		}
		if course.sks == 0 {
			return Err(BoardError::InvalidCourse("sks must be positive"));
		}
		let si = self
			.semesters
			.iter()
			.position(|s| s.id == semester_id)
			.ok_or_else(|| BoardError::UnknownSemester(semester_id.into()))?;
		if self.locate(&course.id).is_some_and(|(owner, _)| owner != si) {
			return Err(BoardError::InvalidCourse("id already used in another semester"));
		}
		let semester = &mut self.semesters[si];
		match semester.courses.iter_mut().find(|c| c.id == course.id) {
			Some(existing) => {
				if *existing == course {
					return Ok(false);
				}
				*existing = course;
			}
			None => semester.courses.push(course),
		}
		Ok(true)
	}

	fn delete_course(&mut self, course_id: &str) -> Result<bool, BoardError> {
		let (si, ci) = self
			.locate(course_id)
			.ok_or_else(|| BoardError::UnknownCourse(course_id.into()))?;
		self.semesters[si].courses.remove(ci);
		let before = self.connections.len();
		self.connections.retain(|c| !c.involves(course_id));
		debug!(
			"deleted course {course_id} and {} connection(s)",
			before - self.connections.len()
		);
		Ok(true)
	}

	fn move_course(
		&mut self,
		course_id: &str,
		to_semester: &str,
		to_index: usize,
	) -> Result<bool, BoardError> {
		let (si, ci) = self
			.locate(course_id)
			.ok_or_else(|| BoardError::UnknownCourse(course_id.into()))?;
		let di = self
			.semesters
			.iter()
			.position(|s| s.id == to_semester)
			.ok_or_else(|| BoardError::UnknownSemester(to_semester.into()))?;
		if si == di && ci == to_index.min(self.semesters[si].courses.len() - 1) {
			return Ok(false);
		}
		let course = self.semesters[si].courses.remove(ci);
		let dest = &mut self.semesters[di].courses;
		dest.insert(to_index.min(dest.len()), course);
		Ok(true)
	}

	fn connect(&mut self, from_id: &str, to_id: &str) -> Result<bool, BoardError> {
		if from_id == to_id {
			return Err(BoardError::SelfLoop(from_id.into()));
		}
		for id in [from_id, to_id] {
			if !self.has_course(id) {
				return Err(BoardError::UnknownCourse(id.into()));
			}
		}
		if self.is_connected(from_id, to_id) {
			return Err(BoardError::DuplicateConnection {
				from: from_id.into(),
				to: to_id.into(),
			});
		}
		let conn = Connection::new(from_id, to_id);
		info!("connection {from_id} -> {to_id} created ({})", conn.id);
		self.connections.push(conn);
		Ok(true)
	}

	fn apply_suggestion(&mut self, suggested: Vec<Vec<Course>>) {
		let mut suggested = suggested.into_iter();
		for semester in self.semesters.iter_mut().filter(|s| !s.is_elective()) {
			semester.courses = suggested.next().unwrap_or_default();
		}
		let semesters = &self.semesters;
		self.connections.retain(|c| {
			Self::has_course_in(semesters, &c.from_id) && Self::has_course_in(semesters, &c.to_id)
		});
	}
}
