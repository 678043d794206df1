use super::types::{CourseColor, Semester};

/// Credit totals for semesters 1-8; the elective column is not counted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SksRecap {
	per_category: [u32; CourseColor::LEGEND.len()],
}

impl SksRecap {
	pub fn compute(semesters: &[Semester]) -> Self {
		let mut recap = Self::default();
		for course in semesters
			.iter()
			.filter(|s| !s.is_elective())
			.flat_map(|s| &s.courses)
		{
			// categories outside the legend (legacy red) are not recapped
			if let Some(slot) = CourseColor::LEGEND.iter().position(|c| *c == course.color) {
				recap.per_category[slot] = recap.per_category[slot].saturating_add(course.sks);
			}
		}
		recap
	}

	pub fn category(&self, color: CourseColor) -> u32 {
		CourseColor::LEGEND
			.iter()
			.position(|c| *c == color)
			.map_or(0, |i| self.per_category[i])
	}

	/// Mandatory load: every legend category except electives.
	pub fn core(&self) -> u32 {
		CourseColor::LEGEND
			.iter()
			.filter(|c| **c != CourseColor::Yellow)
			.fold(0, |sum, c| sum.saturating_add(self.category(*c)))
	}

	pub fn total(&self) -> u32 {
		self.per_category.iter().fold(0, |sum, n| sum.saturating_add(*n))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::board::state::{BoardCommand, BoardState};
	use crate::components::board::types::Course;

	fn put(board: &mut BoardState, semester: &str, id: &str, sks: u32, color: CourseColor) {
		board
			.apply(BoardCommand::UpsertCourse {
				semester_id: semester.into(),
				course: Course {
					id: id.into(),
					name: id.into(),
					sks,
					color,
					description: None,
				},
			})
			.unwrap();
	}

	#[test]
	fn totals_sum_semesters_one_to_eight_only() {
		let mut board = BoardState::default();
		put(&mut board, "semester-1", "a", 3, CourseColor::Blue);
		put(&mut board, "semester-8", "b", 2, CourseColor::Blue);
		put(&mut board, "semester-3", "c", 4, CourseColor::Yellow);
		put(&mut board, "semester-4", "d", 2, CourseColor::White);
		put(&mut board, "semester-elective", "e", 6, CourseColor::Blue);
		put(&mut board, "semester-2", "f", 5, CourseColor::Red);

		let recap = SksRecap::compute(board.semesters());
		assert_eq!(recap.category(CourseColor::Blue), 5);
		assert_eq!(recap.category(CourseColor::Yellow), 4);
		assert_eq!(recap.category(CourseColor::Red), 0);
		assert_eq!(recap.core(), 7);
		assert_eq!(recap.total(), 11);
	}

	#[test]
	fn huge_credit_loads_saturate() {
		let mut board = BoardState::default();
		put(&mut board, "semester-1", "a", u32::MAX, CourseColor::Blue);
		put(&mut board, "semester-1", "b", u32::MAX, CourseColor::Blue);
		put(&mut board, "semester-2", "c", 3, CourseColor::Green);

		let recap = SksRecap::compute(board.semesters());
		assert_eq!(recap.category(CourseColor::Blue), u32::MAX);
		assert_eq!(recap.core(), u32::MAX);
		assert_eq!(recap.total(), u32::MAX);
		assert_eq!(board.semesters()[0].total_sks(), u32::MAX);
	}
}
