use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geometry::Point;

/// Id of the elective column; it is excluded from the credit recap.
pub const ELECTIVE_SEMESTER_ID: &str = "semester-elective";
pub const REGULAR_SEMESTERS: usize = 8;
pub const DEFAULT_SKS: u32 = 2;

/// Course category, rendered as the card color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum CourseColor {
	Blue,
	Green,
	Yellow,
	Red,
	Purple,
	Gray,
	White,
}

impl CourseColor {
	pub const ALL: [CourseColor; 7] = [
		Self::Blue,
		Self::Green,
		Self::Yellow,
		Self::Red,
		Self::Purple,
		Self::Gray,
		Self::White,
	];

	/// Categories shown in the legend and recapped in the footer, in display order.
	pub const LEGEND: [CourseColor; 6] = [
		Self::Blue,
		Self::Green,
		Self::White,
		Self::Purple,
		Self::Gray,
		Self::Yellow,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Blue => "blue",
			Self::Green => "green",
			Self::Yellow => "yellow",
			Self::Red => "red",
			Self::Purple => "purple",
			Self::Gray => "gray",
			Self::White => "white",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL
			.into_iter()
			.find(|c| c.as_str().eq_ignore_ascii_case(name.trim()))
	}

	/// Long label used in the legend and the category picker.
	pub fn label(self) -> &'static str {
		match self {
			Self::Blue => "Mata Kuliah Umum (MKU)",
			Self::Green => "Mata Kuliah Dasar Kependidikan (MKDK)",
			Self::White => "Mata Kuliah Bidang Keahlian (MKBK)",
			Self::Purple => "Mata Kuliah Keterampilan Proses Pembelajaran (MKKPB)",
			Self::Gray => "Mata Kuliah Pengembangan Pendidikan (MKPP)",
			Self::Yellow => "Mata Kuliah Pilihan",
			Self::Red => "Lainnya",
		}
	}

	pub fn short_label(self) -> &'static str {
		match self {
			Self::Blue => "MKU",
			Self::Green => "MKDK",
			Self::White => "MKBK",
			Self::Purple => "MKKPB",
			Self::Gray => "MKPP",
			Self::Yellow => "Pilihan",
			Self::Red => "Lain",
		}
	}

	/// (background, text, border) colors for card drawing.
	pub fn palette(self) -> (&'static str, &'static str, &'static str) {
		match self {
			Self::Blue => ("#eff6ff", "#1d4ed8", "#bfdbfe"),
			Self::Green => ("#ecfdf5", "#047857", "#a7f3d0"),
			Self::White => ("#ffffff", "#334155", "#cbd5e1"),
			Self::Purple => ("#fdf4ff", "#a21caf", "#f5d0fe"),
			Self::Gray => ("#fff7ed", "#c2410c", "#fed7aa"),
			Self::Yellow => ("#fefce8", "#a16207", "#fef08a"),
			Self::Red => ("#fff1f2", "#be123c", "#fecdd3"),
		}
	}
}

// Unknown names in stored data degrade to the default category instead of
// failing the whole board load.
impl From<String> for CourseColor {
	fn from(name: String) -> Self {
		Self::from_name(&name).unwrap_or(Self::Gray)
	}
}

impl From<CourseColor> for &'static str {
	fn from(color: CourseColor) -> Self {
		color.as_str()
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Course {
	pub id: String,
	pub name: String,
	pub sks: u32,
	pub color: CourseColor,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

impl Course {
	/// A blank course as offered by "add course", not yet on the board.
	pub fn draft() -> Self {
		Self {
			id: format!("course-{}", Uuid::new_v4().simple()),
			name: String::new(),
			sks: DEFAULT_SKS,
			color: CourseColor::Gray,
			description: None,
		}
	}

	pub fn note(&self) -> Option<&str> {
		self.description
			.as_deref()
			.map(str::trim)
			.filter(|d| !d.is_empty())
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semester {
	pub id: String,
	pub title: String,
	#[serde(default)]
	pub courses: Vec<Course>,
}

impl Semester {
	pub fn is_elective(&self) -> bool {
		self.id == ELECTIVE_SEMESTER_ID
	}

	pub fn total_sks(&self) -> u32 {
		self.courses.iter().fold(0, |sum, c| sum.saturating_add(c.sks))
	}
}

/// The nine fixed, empty columns of a fresh board.
pub fn default_semesters() -> Vec<Semester> {
	let mut semesters: Vec<Semester> = (1..=REGULAR_SEMESTERS)
		.map(|i| Semester {
			id: format!("semester-{i}"),
			title: format!("Semester {i}"),
			courses: Vec::new(),
		})
		.collect();
	semesters.push(Semester {
		id: ELECTIVE_SEMESTER_ID.into(),
		title: "MK Pilihan".into(),
		courses: Vec::new(),
	});
	semesters
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathType {
	#[default]
	Smooth,
	Grid,
	Straight,
}

impl PathType {
	/// smooth -> grid -> straight -> smooth
	pub fn next(self) -> Self {
		match self {
			Self::Smooth => Self::Grid,
			Self::Grid => Self::Straight,
			Self::Straight => Self::Smooth,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::Smooth => "Smooth",
			Self::Grid => "Grid",
			Self::Straight => "Straight",
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
	pub id: String,
	pub from_id: String,
	pub to_id: String,
	#[serde(default)]
	pub path_type: PathType,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub control_points: Vec<Point>,
}

impl Connection {
	pub fn new(from_id: &str, to_id: &str) -> Self {
		Self {
			id: format!("conn-{}", Uuid::new_v4().simple()),
			from_id: from_id.into(),
			to_id: to_id.into(),
			path_type: PathType::default(),
			control_points: Vec::new(),
		}
	}

	pub fn involves(&self, course_id: &str) -> bool {
		self.from_id == course_id || self.to_id == course_id
	}
}
