//! Connection editor: drawing arrows between cards and reshaping them.
//!
//! Pure state; the board component feeds it clicks and pointer moves and
//! dispatches whatever [`BoardCommand`] it hands back.

use log::{debug, info};

use super::geometry::{LayoutOracle, Point, handle_at, next_control_point};
use super::state::{BoardCommand, BoardState};
use crate::config::ReclickPolicy;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ConnectState {
	#[default]
	Idle,
	Armed {
		source: String,
	},
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandleDrag {
	pub connection_id: String,
	pub index: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionEditor {
	design_mode: bool,
	connect: ConnectState,
	selected: Option<String>,
	drag: Option<HandleDrag>,
	reclick: ReclickPolicy,
}

impl ConnectionEditor {
	pub fn new(reclick: ReclickPolicy) -> Self {
		Self {
			reclick,
			..Self::default()
		}
	}

	pub fn design_mode(&self) -> bool {
		self.design_mode
	}

	pub fn connect_state(&self) -> &ConnectState {
		&self.connect
	}

	/// Armed source course, if any.
	pub fn source(&self) -> Option<&str> {
		match &self.connect {
			ConnectState::Armed { source } => Some(source),
			ConnectState::Idle => None,
		}
	}

	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	pub fn drag(&self) -> Option<&HandleDrag> {
		self.drag.as_ref()
	}

	/// Either direction resets arming, selection and any drag.
	pub fn toggle_design_mode(&mut self) {
		self.design_mode = !self.design_mode;
		self.connect = ConnectState::Idle;
		self.selected = None;
		self.drag = None;
		info!(
			"design mode {}",
			if self.design_mode { "on" } else { "off" }
		);
	}

	/// A card was clicked in design mode. Returns the connect command once a
	/// source and a distinct target have been picked.
	pub fn click_course(&mut self, board: &BoardState, course_id: &str) -> Option<BoardCommand> {
		if !self.design_mode {
			return None;
		}
		self.selected = None;
		match std::mem::take(&mut self.connect) {
			ConnectState::Idle => {
				debug!("connection source armed: {course_id}");
				self.connect = ConnectState::Armed {
					source: course_id.into(),
				};
				None
			}
			ConnectState::Armed { source } if source == course_id => {
				if self.reclick == ReclickPolicy::StayArmed {
					self.connect = ConnectState::Armed { source };
				} else {
					debug!("connection source {source} released");
				}
				None
			}
			ConnectState::Armed { source } => {
				if board.is_connected(&source, course_id) {
					debug!("{source} -> {course_id} already connected");
					return None;
				}
				Some(BoardCommand::Connect {
					from_id: source,
					to_id: course_id.into(),
				})
			}
		}
	}

	/// A card click at board position `at`. Presses on a control-point handle
	/// drawn over the card belong to the handle.
	pub fn click_course_at(
		&mut self,
		board: &BoardState,
		course_id: &str,
		at: Point,
	) -> Option<BoardCommand> {
		if self.drag.is_some() || handle_at(board.connections(), at).is_some() {
			return None;
		}
		self.click_course(board, course_id)
	}

	/// A rendered connection line was clicked.
	pub fn click_connection(&mut self, connection_id: &str) {
		if self.design_mode {
			self.selected = Some(connection_id.into());
		}
	}

	/// Empty board space was clicked: drop the selection, keep arming.
	pub fn click_background(&mut self) {
		self.selected = None;
	}

	/// Forgets an armed source, selection or drag whose target no longer exists.
	pub fn sync(&mut self, board: &BoardState) {
		if let ConnectState::Armed { source } = &self.connect
			&& !board.has_course(source)
		{
			self.connect = ConnectState::Idle;
		}
		if let Some(id) = &self.selected
			&& board.connection(id).is_none()
		{
			self.selected = None;
		}
		if let Some(drag) = &self.drag
			&& board
				.connection(&drag.connection_id)
				.is_none_or(|c| drag.index >= c.control_points.len())
		{
			self.drag = None;
		}
	}

	fn selected_command(&self, make: impl FnOnce(String) -> BoardCommand) -> Option<BoardCommand> {
		if !self.design_mode {
			return None;
		}
		self.selected.clone().map(make)
	}

	pub fn cycle_path_type(&self) -> Option<BoardCommand> {
		self.selected_command(|connection_id| BoardCommand::CyclePathType { connection_id })
	}

	pub fn reset_path(&self) -> Option<BoardCommand> {
		self.selected_command(|connection_id| BoardCommand::ResetPath { connection_id })
	}

	/// Deletes the selected connection and clears the selection.
	pub fn delete_selected(&mut self) -> Option<BoardCommand> {
		let command =
			self.selected_command(|connection_id| BoardCommand::DeleteConnection { connection_id });
		if command.is_some() {
			self.selected = None;
		}
		command
	}

	/// Appends a control point to the selected connection, placed from the
	/// anchors as laid out right now.
	pub fn add_control_point(
		&self,
		board: &BoardState,
		layout: &dyn LayoutOracle,
	) -> Option<BoardCommand> {
		let conn = board.connection(self.selected.as_deref()?)?;
		let point = next_control_point(layout, conn)?;
		self.selected_command(|connection_id| BoardCommand::AddControlPoint {
			connection_id,
			point,
		})
	}

	/// Pointer pressed on a control-point handle.
	pub fn begin_drag(&mut self, connection_id: &str, index: usize) {
		if self.design_mode {
			self.selected = Some(connection_id.into());
			self.drag = Some(HandleDrag {
				connection_id: connection_id.into(),
				index,
			});
		}
	}

	/// Pointer moved; every move is stored, there is no separate commit.
	pub fn drag_to(&self, point: Point) -> Option<BoardCommand> {
		let drag = self.drag.as_ref()?;
		Some(BoardCommand::MoveControlPoint {
			connection_id: drag.connection_id.clone(),
			index: drag.index,
			point,
		})
	}

	pub fn end_drag(&mut self) {
		self.drag = None;
	}

	/// Handle double-clicked: remove that single point.
	pub fn remove_point(&mut self, connection_id: &str, index: usize) -> Option<BoardCommand> {
		if !self.design_mode {
			return None;
		}
		self.drag = None;
		Some(BoardCommand::RemoveControlPoint {
			connection_id: connection_id.into(),
			index,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::board::geometry::{ConnectionGeometry, FixedLayout, Rect};
	use crate::components::board::types::{Course, CourseColor};

	fn board() -> BoardState {
		let mut board = BoardState::default();
		for (semester, id) in [("semester-1", "c1"), ("semester-2", "c2")] {
			board
				.apply(BoardCommand::UpsertCourse {
					semester_id: semester.into(),
					course: Course {
						id: id.into(),
						name: id.into(),
						sks: 2,
						color: CourseColor::Blue,
						description: None,
					},
				})
				.unwrap();
		}
		board
	}

	fn designing(reclick: ReclickPolicy) -> ConnectionEditor {
		let mut editor = ConnectionEditor::new(reclick);
		editor.toggle_design_mode();
		editor
	}

	/// Runs the two-click gesture and applies whatever it yields.
	fn draw(editor: &mut ConnectionEditor, board: &mut BoardState, from: &str, to: &str) {
		assert!(editor.click_course(board, from).is_none());
		if let Some(cmd) = editor.click_course(board, to) {
			board.apply(cmd).unwrap();
		}
	}

	#[test]
	fn clicks_outside_design_mode_do_nothing() {
		let board = board();
		let mut editor = ConnectionEditor::default();
		assert!(editor.click_course(&board, "c1").is_none());
		assert_eq!(editor.connect_state(), &ConnectState::Idle);
		editor.click_connection("x");
		assert!(editor.selected().is_none());
	}

	#[test]
	fn two_clicks_create_a_connection_and_return_to_idle() {
		let mut board = board();
		let mut editor = designing(ReclickPolicy::StayArmed);
		assert!(editor.click_course(&board, "c1").is_none());
		assert_eq!(editor.source(), Some("c1"));
		let cmd = editor.click_course(&board, "c2").unwrap();
		assert_eq!(
			cmd,
			BoardCommand::Connect {
				from_id: "c1".into(),
				to_id: "c2".into()
			}
		);
		board.apply(cmd).unwrap();
		assert_eq!(editor.connect_state(), &ConnectState::Idle);
		assert!(editor.design_mode());
	}

	#[test]
	fn reclicking_source_follows_policy() {
		let board = board();
		let mut stay = designing(ReclickPolicy::StayArmed);
		stay.click_course(&board, "c1");
		assert!(stay.click_course(&board, "c1").is_none());
		assert_eq!(stay.source(), Some("c1"));

		let mut cancel = designing(ReclickPolicy::Cancel);
		cancel.click_course(&board, "c1");
		assert!(cancel.click_course(&board, "c1").is_none());
		assert_eq!(cancel.connect_state(), &ConnectState::Idle);
	}

	#[test]
	fn duplicate_gesture_yields_nothing_and_resets() {
		let mut board = board();
		let mut editor = designing(ReclickPolicy::StayArmed);
		draw(&mut editor, &mut board, "c1", "c2");
		editor.click_course(&board, "c1");
		assert!(editor.click_course(&board, "c2").is_none());
		assert_eq!(editor.connect_state(), &ConnectState::Idle);
		draw(&mut editor, &mut board, "c2", "c1");
		assert_eq!(board.connections().len(), 2);
	}

	#[test]
	fn background_click_keeps_arming_but_clears_selection() {
		let mut board = board();
		let mut editor = designing(ReclickPolicy::StayArmed);
		draw(&mut editor, &mut board, "c1", "c2");
		editor.click_connection(&board.connections()[0].id);
		editor.click_course(&board, "c2");
		editor.click_background();
		assert_eq!(editor.source(), Some("c2"));
		assert!(editor.selected().is_none());
	}

	#[test]
	fn toggling_design_mode_resets_everything() {
		let mut board = board();
		let mut editor = designing(ReclickPolicy::StayArmed);
		draw(&mut editor, &mut board, "c1", "c2");
		let id = board.connections()[0].id.clone();
		editor.click_connection(&id);
		editor.click_course(&board, "c1");
		editor.toggle_design_mode();
		assert!(!editor.design_mode());
		assert!(editor.selected().is_none());
		assert_eq!(editor.connect_state(), &ConnectState::Idle);
		assert!(editor.cycle_path_type().is_none());
	}

	#[test]
	fn add_control_point_uses_live_anchor_midpoint() {
		let mut board = board();
		let mut editor = designing(ReclickPolicy::StayArmed);
		draw(&mut editor, &mut board, "c1", "c2");
		let id = board.connections()[0].id.clone();
		editor.click_connection(&id);

		let layout = FixedLayout::new()
			.with("c1", Rect::new(20.0, 40.0, 200.0, 60.0))
			.with("c2", Rect::new(300.0, 140.0, 200.0, 60.0));
		let cmd = editor.add_control_point(&board, &layout).unwrap();
		board.apply(cmd).unwrap();
		assert_eq!(
			board.connection(&id).unwrap().control_points,
			vec![Point::new(260.0, 120.0)]
		);
	}

	#[test]
	fn drag_updates_point_on_every_move_until_release() {
		let mut board = board();
		let mut editor = designing(ReclickPolicy::StayArmed);
		draw(&mut editor, &mut board, "c1", "c2");
		let id = board.connections()[0].id.clone();
		board
			.apply(BoardCommand::AddControlPoint {
				connection_id: id.clone(),
				point: Point::new(0.0, 0.0),
			})
			.unwrap();

		editor.begin_drag(&id, 0);
		assert_eq!(editor.selected(), Some(id.as_str()));
		for p in [Point::new(5.0, 5.0), Point::new(9.0, 12.0)] {
			board.apply(editor.drag_to(p).unwrap()).unwrap();
		}
		editor.end_drag();
		assert!(editor.drag_to(Point::new(50.0, 50.0)).is_none());
		assert_eq!(
			board.connection(&id).unwrap().control_points,
			vec![Point::new(9.0, 12.0)]
		);
	}

	#[test]
	fn releasing_a_handle_over_a_card_does_not_arm_it() {
		let mut board = board();
		let mut editor = designing(ReclickPolicy::StayArmed);
		draw(&mut editor, &mut board, "c1", "c2");
		let id = board.connections()[0].id.clone();
		board
			.apply(BoardCommand::AddControlPoint {
				connection_id: id.clone(),
				point: Point::new(20.0, 20.0),
			})
			.unwrap();

		editor.begin_drag(&id, 0);
		assert!(editor.click_course_at(&board, "c1", Point::new(90.0, 90.0)).is_none());
		editor.end_drag();
		assert!(editor.click_course_at(&board, "c1", Point::new(22.0, 21.0)).is_none());
		assert_eq!(editor.connect_state(), &ConnectState::Idle);

		assert!(editor.click_course_at(&board, "c1", Point::new(90.0, 90.0)).is_none());
		assert_eq!(editor.source(), Some("c1"));
	}

	#[test]
	fn removing_last_point_degrades_to_direct_line() {
		let mut board = board();
		let mut editor = designing(ReclickPolicy::StayArmed);
		draw(&mut editor, &mut board, "c1", "c2");
		let id = board.connections()[0].id.clone();
		board
			.apply(BoardCommand::AddControlPoint {
				connection_id: id.clone(),
				point: Point::new(1.0, 1.0),
			})
			.unwrap();
		board.apply(editor.remove_point(&id, 0).unwrap()).unwrap();

		let layout = FixedLayout::new()
			.with("c1", Rect::new(0.0, 0.0, 10.0, 10.0))
			.with("c2", Rect::new(50.0, 0.0, 10.0, 10.0));
		let conn = board.connection(&id).unwrap();
		assert!(conn.control_points.is_empty());
		let geometry = ConnectionGeometry::build(&layout, conn).unwrap();
		assert_eq!(geometry.segments.len(), 1);
	}

	#[test]
	fn delete_selected_clears_selection() {
		let mut board = board();
		let mut editor = designing(ReclickPolicy::StayArmed);
		draw(&mut editor, &mut board, "c1", "c2");
		editor.click_connection(&board.connections()[0].id);
		board.apply(editor.delete_selected().unwrap()).unwrap();
		assert!(board.connections().is_empty());
		assert!(editor.selected().is_none());
		assert!(editor.delete_selected().is_none());
	}

	#[test]
	fn sync_drops_stale_selection() {
		let mut board = board();
		let mut editor = designing(ReclickPolicy::StayArmed);
		draw(&mut editor, &mut board, "c1", "c2");
		editor.click_connection(&board.connections()[0].id);
		board
			.apply(BoardCommand::DeleteCourse {
				course_id: "c1".into(),
			})
			.unwrap();
		editor.sync(&board);
		assert!(editor.selected().is_none());
	}

	#[test]
	fn sync_releases_source_that_was_deleted() {
		let mut board = board();
		let mut editor = designing(ReclickPolicy::StayArmed);
		assert!(editor.click_course(&board, "c2").is_none());
		board
			.apply(BoardCommand::DeleteCourse {
				course_id: "c2".into(),
			})
			.unwrap();
		editor.sync(&board);
		assert_eq!(editor.connect_state(), &ConnectState::Idle);
	}
}
