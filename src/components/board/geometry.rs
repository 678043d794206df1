//! Board-local geometry: anchors, connection paths and hit testing.
//!
//! All coordinates are relative to the top-left corner of the board content
//! element, so they stay valid while the viewport scrolls.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{Connection, PathType};

/// How strongly smooth segments bow away from a straight line.
pub const CURVENESS: f64 = 0.8;
pub const MIN_CURVE_OFFSET: f64 = 24.0;
pub const ARROW_SIZE: f64 = 8.0;
pub const HANDLE_RADIUS: f64 = 7.0;
pub const LINE_HIT_TOLERANCE: f64 = 6.0;
const CUBIC_SAMPLES: usize = 24;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn midpoint(self, other: Point) -> Point {
		Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
	}

	pub fn distance(self, other: Point) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	pub left: f64,
	pub top: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
		Self {
			left,
			top,
			width,
			height,
		}
	}

	pub fn right(&self) -> f64 {
		self.left + self.width
	}

	pub fn bottom(&self) -> f64 {
		self.top + self.height
	}

	pub fn center_y(&self) -> f64 {
		self.top + self.height / 2.0
	}

	/// Anchor where outgoing arrows start.
	pub fn right_anchor(&self) -> Point {
		Point::new(self.right(), self.center_y())
	}

	/// Anchor where incoming arrows end.
	pub fn left_anchor(&self) -> Point {
		Point::new(self.left, self.center_y())
	}
}

/// Answers "where is this element right now", in board-local coordinates.
///
/// The browser implementation measures live bounding boxes; tests use
/// [`FixedLayout`].
pub trait LayoutOracle {
	fn element_rect(&self, element_id: &str) -> Option<Rect>;
}

/// A layout snapshot keyed by element id.
#[derive(Clone, Debug, Default)]
pub struct FixedLayout {
	rects: HashMap<String, Rect>,
}

impl FixedLayout {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, element_id: &str, rect: Rect) -> Self {
		self.rects.insert(element_id.into(), rect);
		self
	}
}

impl LayoutOracle for FixedLayout {
	fn element_rect(&self, element_id: &str) -> Option<Rect> {
		self.rects.get(element_id).copied()
	}
}

/// Start and end anchors of a connection, sampled from the oracle.
pub fn connection_anchors(layout: &dyn LayoutOracle, conn: &Connection) -> Option<(Point, Point)> {
	let from = layout.element_rect(&conn.from_id)?;
	let to = layout.element_rect(&conn.to_id)?;
	Some((from.right_anchor(), to.left_anchor()))
}

/// Where "add control point" puts the next point: halfway between the last
/// existing point (or the start anchor) and the end anchor.
pub fn next_control_point(layout: &dyn LayoutOracle, conn: &Connection) -> Option<Point> {
	let (start, end) = connection_anchors(layout, conn)?;
	let from = conn.control_points.last().copied().unwrap_or(start);
	Some(from.midpoint(end))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathPiece {
	Line(Point, Point),
	Cubic(Point, Point, Point, Point),
}

impl PathPiece {
	pub fn start(&self) -> Point {
		match *self {
			Self::Line(a, _) | Self::Cubic(a, _, _, _) => a,
		}
	}

	pub fn end(&self) -> Point {
		match *self {
			Self::Line(_, b) | Self::Cubic(_, _, _, b) => b,
		}
	}

	fn point_at(&self, t: f64) -> Point {
		match *self {
			Self::Line(a, b) => Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t),
			Self::Cubic(p0, p1, p2, p3) => {
				let u = 1.0 - t;
				let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
				Point::new(
					a * p0.x + b * p1.x + c * p2.x + d * p3.x,
					a * p0.y + b * p1.y + c * p2.y + d * p3.y,
				)
			}
		}
	}

	/// Unit direction of travel at the end of the piece.
	pub fn end_direction(&self) -> (f64, f64) {
		let (from, to) = match *self {
			Self::Line(a, b) => (a, b),
			Self::Cubic(p0, p1, p2, p3) => {
				if p2.distance(p3) > 1e-6 {
					(p2, p3)
				} else if p1.distance(p3) > 1e-6 {
					(p1, p3)
				} else {
					(p0, p3)
				}
			}
		};
		let len = from.distance(to);
		if len < 1e-6 {
			(1.0, 0.0)
		} else {
			((to.x - from.x) / len, (to.y - from.y) / len)
		}
	}

	fn distance_to(&self, p: Point) -> f64 {
		match *self {
			Self::Line(a, b) => distance_to_line(p, a, b),
			Self::Cubic(..) => {
				let mut best = f64::INFINITY;
				let mut prev = self.start();
				for i in 1..=CUBIC_SAMPLES {
					let next = self.point_at(i as f64 / CUBIC_SAMPLES as f64);
					best = best.min(distance_to_line(p, prev, next));
					prev = next;
				}
				best
			}
		}
	}
}

fn distance_to_line(p: Point, a: Point, b: Point) -> f64 {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let len_sq = dx * dx + dy * dy;
	if len_sq < 1e-12 {
		return p.distance(a);
	}
	let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
	p.distance(Point::new(a.x + dx * t, a.y + dy * t))
}

/// One segment between two consecutive waypoints, shaped by the path type.
pub fn segment(from: Point, to: Point, path_type: PathType) -> Vec<PathPiece> {
	match path_type {
		PathType::Straight => vec![PathPiece::Line(from, to)],
		PathType::Smooth => {
			let offset = (CURVENESS * (to.x - from.x).abs()).max(MIN_CURVE_OFFSET);
			vec![PathPiece::Cubic(
				from,
				Point::new(from.x + offset, from.y),
				Point::new(to.x - offset, to.y),
				to,
			)]
		}
		PathType::Grid => {
			let mid_x = (from.x + to.x) / 2.0;
			let (a, b) = (Point::new(mid_x, from.y), Point::new(mid_x, to.y));
			vec![
				PathPiece::Line(from, a),
				PathPiece::Line(a, b),
				PathPiece::Line(b, to),
			]
		}
	}
}

/// Rendered shape of one connection: N control points give N+1 segments.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionGeometry {
	pub connection_id: String,
	pub segments: Vec<Vec<PathPiece>>,
	pub handles: Vec<Point>,
}

impl ConnectionGeometry {
	pub fn build(layout: &dyn LayoutOracle, conn: &Connection) -> Option<Self> {
		let (start, end) = connection_anchors(layout, conn)?;
		let mut waypoints = Vec::with_capacity(conn.control_points.len() + 2);
		waypoints.push(start);
		waypoints.extend(conn.control_points.iter().copied());
		waypoints.push(end);

		let segments = waypoints
			.windows(2)
			.map(|w| segment(w[0], w[1], conn.path_type))
			.collect();
		Some(Self {
			connection_id: conn.id.clone(),
			segments,
			handles: conn.control_points.clone(),
		})
	}

	pub fn pieces(&self) -> impl Iterator<Item = &PathPiece> {
		self.segments.iter().flatten()
	}

	pub fn last_piece(&self) -> Option<&PathPiece> {
		self.segments.last().and_then(|s| s.last())
	}

	pub fn distance_to(&self, p: Point) -> f64 {
		self.pieces()
			.map(|piece| piece.distance_to(p))
			.fold(f64::INFINITY, f64::min)
	}

	/// Roughly the visual middle of the path; used to float the toolbar.
	pub fn midpoint(&self) -> Option<Point> {
		let pieces: Vec<&PathPiece> = self.pieces().collect();
		let piece = pieces.get(pieces.len() / 2)?;
		Some(if pieces.len() % 2 == 0 {
			piece.start()
		} else {
			piece.point_at(0.5)
		})
	}
}

/// Geometry for every connection whose endpoints are currently laid out.
pub fn build_all(layout: &dyn LayoutOracle, connections: &[Connection]) -> Vec<ConnectionGeometry> {
	connections
		.iter()
		.filter_map(|c| ConnectionGeometry::build(layout, c))
		.collect()
}

/// Nearest connection within the click tolerance.
pub fn connection_at(geometries: &[ConnectionGeometry], p: Point) -> Option<&str> {
	geometries
		.iter()
		.map(|g| (g, g.distance_to(p)))
		.filter(|(_, d)| *d <= LINE_HIT_TOLERANCE)
		.min_by(|a, b| a.1.total_cmp(&b.1))
		.map(|(g, _)| g.connection_id.as_str())
}

/// Control-point handle under the pointer, as (connection id, point index).
pub fn handle_at(connections: &[Connection], p: Point) -> Option<(String, usize)> {
	connections.iter().find_map(|c| {
		c.control_points
			.iter()
			.position(|cp| cp.distance(p) <= HANDLE_RADIUS)
			.map(|i| (c.id.clone(), i))
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn layout() -> FixedLayout {
		FixedLayout::new()
			.with("c1", Rect::new(0.0, 0.0, 100.0, 40.0))
			.with("c2", Rect::new(300.0, 100.0, 100.0, 40.0))
	}

	fn conn() -> Connection {
		Connection::new("c1", "c2")
	}

	#[test]
	fn anchors_use_right_and_left_edges() {
		let (start, end) = connection_anchors(&layout(), &conn()).unwrap();
		assert_eq!(start, Point::new(100.0, 20.0));
		assert_eq!(end, Point::new(300.0, 120.0));
	}

	#[test]
	fn first_control_point_is_anchor_midpoint() {
		assert_eq!(
			next_control_point(&layout(), &conn()),
			Some(Point::new(200.0, 70.0))
		);
	}

	#[test]
	fn next_control_point_bisects_last_point_and_end() {
		let mut c = conn();
		c.control_points.push(Point::new(200.0, 70.0));
		assert_eq!(
			next_control_point(&layout(), &c),
			Some(Point::new(250.0, 95.0))
		);
	}

	#[test]
	fn missing_element_yields_no_geometry() {
		let c = Connection::new("c1", "gone");
		assert!(ConnectionGeometry::build(&layout(), &c).is_none());
		assert!(next_control_point(&layout(), &c).is_none());
	}

	#[test]
	fn control_points_split_path_into_chained_segments() {
		let mut c = conn();
		c.path_type = PathType::Straight;
		c.control_points = vec![Point::new(150.0, 200.0), Point::new(250.0, 200.0)];
		let g = ConnectionGeometry::build(&layout(), &c).unwrap();
		assert_eq!(g.segments.len(), 3);
		assert_eq!(g.segments[0][0].start(), Point::new(100.0, 20.0));
		assert_eq!(g.segments[1][0], PathPiece::Line(Point::new(150.0, 200.0), Point::new(250.0, 200.0)));
		assert_eq!(g.last_piece().unwrap().end(), Point::new(300.0, 120.0));
	}

	#[test]
	fn grid_segment_is_an_orthogonal_elbow() {
		let pieces = segment(Point::new(0.0, 0.0), Point::new(100.0, 50.0), PathType::Grid);
		assert_eq!(pieces.len(), 3);
		assert_eq!(pieces[0].end(), Point::new(50.0, 0.0));
		assert_eq!(pieces[1].end(), Point::new(50.0, 50.0));
		assert_eq!(pieces[2].end_direction(), (1.0, 0.0));
	}

	#[test]
	fn smooth_segment_leaves_and_enters_horizontally() {
		let pieces = segment(Point::new(0.0, 0.0), Point::new(100.0, 80.0), PathType::Smooth);
		let PathPiece::Cubic(p0, p1, p2, p3) = pieces[0] else {
			panic!("expected a cubic");
		};
		assert_eq!(p0.y, p1.y);
		assert_eq!(p2.y, p3.y);
		assert_eq!(pieces[0].end_direction(), (1.0, 0.0));
	}

	#[test]
	fn clicks_near_a_path_hit_it() {
		let mut c = conn();
		c.path_type = PathType::Straight;
		let geoms = build_all(&layout(), std::slice::from_ref(&c));
		assert_eq!(connection_at(&geoms, Point::new(200.0, 72.0)), Some(c.id.as_str()));
		assert_eq!(connection_at(&geoms, Point::new(200.0, 10.0)), None);
	}

	#[test]
	fn handles_are_hit_within_radius() {
		let mut c = conn();
		c.control_points = vec![Point::new(10.0, 10.0), Point::new(50.0, 50.0)];
		assert_eq!(handle_at(std::slice::from_ref(&c), Point::new(52.0, 47.0)), Some((c.id.clone(), 1)));
		assert_eq!(handle_at(&[c], Point::new(30.0, 30.0)), None);
	}
}
