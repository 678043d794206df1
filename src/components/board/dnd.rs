use super::geometry::LayoutOracle;
use super::state::BoardCommand;
use super::types::Semester;

/// Insertion index for a drop at `pointer_y`, given the vertical centers of
/// the cards already in the column (dragged card excluded), top to bottom.
pub fn drop_index(card_centers: &[f64], pointer_y: f64) -> usize {
	card_centers
		.iter()
		.position(|center| pointer_y < *center)
		.unwrap_or(card_centers.len())
}

/// Move command for dropping `course_id` onto `semester` at `pointer_y`
/// (board-local).
pub fn drop_command(
	layout: &dyn LayoutOracle,
	semester: &Semester,
	course_id: &str,
	pointer_y: f64,
) -> BoardCommand {
	let centers: Vec<f64> = semester
		.courses
		.iter()
		.filter(|c| c.id != course_id)
		.filter_map(|c| layout.element_rect(&c.id))
		.map(|r| r.center_y())
		.collect();
	BoardCommand::MoveCourse {
		course_id: course_id.into(),
		to_semester: semester.id.clone(),
		to_index: drop_index(&centers, pointer_y),
	}
}
