//! Curriculum board: semesters of course cards joined by prerequisite arrows.

mod component;
mod dnd;
mod editor;
mod geometry;
mod modal;
mod overlay;
mod recap;
pub mod render;
mod state;
mod toolbar;
mod types;

pub use component::CurriculumBoard;
pub use geometry::{ConnectionGeometry, LayoutOracle, Point, Rect, build_all};
pub use overlay::DomLayout;
pub use state::{BoardCommand, BoardState};
pub use types::{
	Connection, Course, CourseColor, PathType, REGULAR_SEMESTERS, Semester, default_semesters,
};

#[cfg(test)]
pub use geometry::FixedLayout;
