//! Keeping the arrow overlay in step with the DOM.
//!
//! Redraws are deferred to the next animation frame so card layout has
//! settled before anchors are measured. Requests that arrive before the frame
//! fires share one redraw.

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element};

use super::geometry::{LayoutOracle, Point, Rect};

/// Why the overlay needs redrawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedrawTrigger {
	Mount,
	BoardChanged,
	ConnectionsChanged,
	DesignModeToggled,
	SelectionChanged,
	PointsEdited,
	DropCompleted,
	Scrolled,
	Resized,
}

impl RedrawTrigger {
	/// Extra wait before the frame is requested. Only drops wait, so the card
	/// transition finishes before anchors are sampled.
	pub fn delay(self, settle_ms: i32) -> Option<i32> {
		match self {
			Self::DropCompleted if settle_ms > 0 => Some(settle_ms),
			_ => None,
		}
	}
}

#[derive(Default)]
struct Pending {
	frame: Option<i32>,
	timeout: Option<i32>,
}

/// Coalescing redraw scheduler around `requestAnimationFrame`.
#[derive(Clone)]
pub struct OverlayScheduler {
	pending: Rc<RefCell<Pending>>,
	draw: Rc<dyn Fn()>,
	settle_ms: i32,
}

impl OverlayScheduler {
	pub fn new(settle_ms: i32, draw: impl Fn() + 'static) -> Self {
		Self {
			pending: Rc::default(),
			draw: Rc::new(draw),
			settle_ms,
		}
	}

	pub fn request(&self, trigger: RedrawTrigger) {
		let Some(window) = web_sys::window() else {
			return;
		};
		let Some(ms) = trigger.delay(self.settle_ms) else {
			self.schedule_frame(&window);
			return;
		};

		// a newer drop supersedes a pending one
		if let Some(handle) = self.pending.borrow_mut().timeout.take() {
			window.clear_timeout_with_handle(handle);
		}
		let this = self.clone();
		let cb = Closure::once_into_js(move || {
			this.pending.borrow_mut().timeout = None;
			if let Some(window) = web_sys::window() {
				this.schedule_frame(&window);
			}
		});
		match window.set_timeout_with_callback_and_timeout_and_arguments_0(cb.unchecked_ref(), ms)
		{
			Ok(handle) => self.pending.borrow_mut().timeout = Some(handle),
			Err(err) => warn!("could not defer overlay redraw: {err:?}"),
		}
	}

	fn schedule_frame(&self, window: &web_sys::Window) {
		if self.pending.borrow().frame.is_some() {
			return;
		}
		let this = self.clone();
		let cb = Closure::once_into_js(move || {
			this.pending.borrow_mut().frame = None;
			(this.draw)();
		});
		match window.request_animation_frame(cb.unchecked_ref()) {
			Ok(handle) => self.pending.borrow_mut().frame = Some(handle),
			Err(err) => warn!("requestAnimationFrame failed: {err:?}"),
		}
	}

	/// Drops any queued redraw; called when the board unmounts.
	pub fn cancel(&self) {
		let Some(window) = web_sys::window() else {
			return;
		};
		let mut pending = self.pending.borrow_mut();
		if let Some(handle) = pending.frame.take() {
			let _ = window.cancel_animation_frame(handle);
		}
		if let Some(handle) = pending.timeout.take() {
			window.clear_timeout_with_handle(handle);
		}
	}
}

/// Layout oracle backed by live bounding boxes, relative to the board element.
pub struct DomLayout {
	document: Document,
	origin: Point,
}

impl DomLayout {
	pub fn new(board: &Element) -> Option<Self> {
		let document = web_sys::window()?.document()?;
		let rect = board.get_bounding_client_rect();
		Some(Self {
			document,
			origin: Point::new(rect.left(), rect.top()),
		})
	}

	/// Converts viewport (client) coordinates into board coordinates.
	pub fn to_board(&self, client_x: f64, client_y: f64) -> Point {
		Point::new(client_x - self.origin.x, client_y - self.origin.y)
	}
}

impl LayoutOracle for DomLayout {
	fn element_rect(&self, element_id: &str) -> Option<Rect> {
		let rect = self
			.document
			.get_element_by_id(element_id)?
			.get_bounding_client_rect();
		Some(Rect::new(
			rect.left() - self.origin.x,
			rect.top() - self.origin.y,
			rect.width(),
			rect.height(),
		))
	}
}

/// Backing-store size for a canvas shown at `width` x `height` CSS pixels.
pub fn backing_size(width: f64, height: f64, pixel_ratio: f64) -> (u32, u32) {
	let ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 { pixel_ratio } else { 1.0 };
	(
		(width * ratio).ceil().max(1.0) as u32,
		(height * ratio).ceil().max(1.0) as u32,
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_drops_wait_for_settle_delay() {
		assert_eq!(RedrawTrigger::DropCompleted.delay(120), Some(120));
		assert_eq!(RedrawTrigger::DropCompleted.delay(0), None);
		for trigger in [
			RedrawTrigger::Mount,
			RedrawTrigger::BoardChanged,
			RedrawTrigger::ConnectionsChanged,
			RedrawTrigger::DesignModeToggled,
			RedrawTrigger::SelectionChanged,
			RedrawTrigger::PointsEdited,
			RedrawTrigger::Scrolled,
			RedrawTrigger::Resized,
		] {
			assert_eq!(trigger.delay(120), None);
		}
	}

	#[test]
	fn backing_store_follows_pixel_ratio() {
		assert_eq!(backing_size(400.0, 300.0, 2.0), (800, 600));
		assert_eq!(backing_size(401.0, 10.0, 1.5), (602, 15));
		assert_eq!(backing_size(400.0, 300.0, 0.0), (400, 300));
		assert_eq!(backing_size(0.0, 0.0, 1.0), (1, 1));
	}
}
