//! PNG and PDF export of the board.
//!
//! The board is measured, redrawn onto an offscreen canvas without any
//! selection chrome, and the raster is handed to the browser as a download.

pub mod pdf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::info;
use wasm_bindgen::JsCast;
use web_sys::{
	Blob, BlobPropertyBag, CanvasRenderingContext2d, Document, Element, HtmlAnchorElement,
	HtmlCanvasElement, Url,
};

use crate::components::board::{
	BoardState, ConnectionGeometry, CourseColor, DomLayout, LayoutOracle, Rect, build_all,
	render,
};
use crate::config::ExportConfig;
use crate::error::BoardError;

/// Element id of the legend block inside the board.
pub const LEGEND_ID: &str = "board-legend";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
	Png,
	Pdf,
}

impl ExportFormat {
	pub fn extension(self) -> &'static str {
		match self {
			Self::Png => "png",
			Self::Pdf => "pdf",
		}
	}
}

/// `<prefix>-<YYYY-MM-DD>.<ext>` from an ISO-8601 timestamp.
pub fn export_file_name(prefix: &str, iso_timestamp: &str, format: ExportFormat) -> String {
	let date = iso_timestamp.get(..10).unwrap_or(iso_timestamp);
	format!("{prefix}-{date}.{}", format.extension())
}

pub struct ColumnBox {
	pub title: String,
	pub total_sks: u32,
	pub rect: Rect,
}

pub struct CardBox {
	pub name: String,
	pub sks: u32,
	pub color: CourseColor,
	pub rect: Rect,
}

/// Everything needed to redraw the board, in board coordinates.
pub struct BoardSnapshot {
	pub width: f64,
	pub height: f64,
	pub columns: Vec<ColumnBox>,
	pub cards: Vec<CardBox>,
	pub connections: Vec<ConnectionGeometry>,
	pub legend: Option<Rect>,
}

impl BoardSnapshot {
	/// Measures every column and card; anything not laid out is skipped.
	pub fn capture(board: &BoardState, layout: &dyn LayoutOracle, width: f64, height: f64) -> Self {
		let mut columns = Vec::new();
		let mut cards = Vec::new();
		for semester in board.semesters() {
			if let Some(rect) = layout.element_rect(&semester.id) {
				columns.push(ColumnBox {
					title: semester.title.clone(),
					total_sks: semester.total_sks(),
					rect,
				});
			}
			cards.extend(semester.courses.iter().filter_map(|course| {
				Some(CardBox {
					name: course.name.clone(),
					sks: course.sks,
					color: course.color,
					rect: layout.element_rect(&course.id)?,
				})
			}));
		}
		Self {
			width,
			height,
			columns,
			cards,
			connections: build_all(layout, board.connections()),
			legend: layout.element_rect(LEGEND_ID),
		}
	}

	/// Raster size including padding on every side.
	pub fn raster_size(&self, padding: f64) -> (u32, u32) {
		(
			(self.width + 2.0 * padding).ceil() as u32,
			(self.height + 2.0 * padding).ceil() as u32,
		)
	}
}

fn document() -> Result<Document, BoardError> {
	web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| BoardError::Export("no document".into()))
}

fn rasterize(snapshot: &BoardSnapshot, config: &ExportConfig) -> Result<HtmlCanvasElement, BoardError> {
	let canvas: HtmlCanvasElement = document()?
		.create_element("canvas")
		.and_then(|el| el.dyn_into::<HtmlCanvasElement>().map_err(Into::into))
		.map_err(|e| BoardError::export("canvas", e))?;
	let (w, h) = snapshot.raster_size(config.padding);
	canvas.set_width(w);
	canvas.set_height(h);
	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")
		.map_err(|e| BoardError::export("2d context", e))?
		.ok_or_else(|| BoardError::Export("2d context unavailable".into()))?
		.dyn_into()
		.map_err(|e| BoardError::export("2d context", e.into()))?;

	ctx.set_fill_style_str(&config.background);
	ctx.fill_rect(0.0, 0.0, w as f64, h as f64);
	ctx.save();
	ctx.translate(config.padding, config.padding)
		.map_err(|e| BoardError::export("translate", e))?;
	render::draw_snapshot(snapshot, &ctx);
	ctx.restore();
	Ok(canvas)
}

fn decode_data_url(url: &str) -> Result<Vec<u8>, BoardError> {
	let (_, payload) = url
		.split_once(";base64,")
		.ok_or_else(|| BoardError::Export("unexpected data URL".into()))?;
	STANDARD
		.decode(payload)
		.map_err(|e| BoardError::Export(format!("data URL: {e}")))
}

fn click_download(href: &str, file_name: &str) -> Result<(), BoardError> {
	let a: HtmlAnchorElement = document()?
		.create_element("a")
		.and_then(|el| el.dyn_into::<HtmlAnchorElement>().map_err(Into::into))
		.map_err(|e| BoardError::export("anchor", e))?;
	a.set_href(href);
	a.set_download(file_name);
	a.click();
	Ok(())
}

fn download_bytes(bytes: &[u8], mime: &str, file_name: &str) -> Result<(), BoardError> {
	let parts = js_sys::Array::new();
	parts.push(&js_sys::Uint8Array::from(bytes));
	let bag = BlobPropertyBag::new();
	bag.set_type(mime);
	let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &bag)
		.map_err(|e| BoardError::export("blob", e))?;
	let url = Url::create_object_url_with_blob(&blob).map_err(|e| BoardError::export("object URL", e))?;
	let result = click_download(&url, file_name);
	let _ = Url::revoke_object_url(&url);
	result
}

/// Renders `board` as laid out under `board_el` and downloads it.
pub fn export_board(
	board_el: &Element,
	board: &BoardState,
	config: &ExportConfig,
	format: ExportFormat,
) -> Result<(), BoardError> {
	let layout =
		DomLayout::new(board_el).ok_or_else(|| BoardError::Export("board not mounted".into()))?;
	let snapshot = BoardSnapshot::capture(
		board,
		&layout,
		board_el.scroll_width() as f64,
		board_el.scroll_height() as f64,
	);
	let canvas = rasterize(&snapshot, config)?;
	let now = String::from(js_sys::Date::new_0().to_iso_string());
	let file_name = export_file_name(&config.file_prefix, &now, format);

	match format {
		ExportFormat::Png => {
			let url = canvas
				.to_data_url()
				.map_err(|e| BoardError::export("png encode", e))?;
			click_download(&url, &file_name)?;
		}
		ExportFormat::Pdf => {
			let url = canvas
				.to_data_url_with_type("image/jpeg")
				.map_err(|e| BoardError::export("jpeg encode", e))?;
			let jpeg = decode_data_url(&url)?;
			let doc = pdf::single_page_jpeg(canvas.width(), canvas.height(), &jpeg);
			download_bytes(&doc, "application/pdf", &file_name)?;
		}
	}
	info!("exported {file_name}");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::board::{BoardCommand, Course, FixedLayout};

	#[test]
	fn file_name_uses_date_part_only() {
		assert_eq!(
			export_file_name("kurikulum-pti-2026", "2026-10-18T07:51:00.000Z", ExportFormat::Pdf),
			"kurikulum-pti-2026-2026-10-18.pdf"
		);
		assert_eq!(export_file_name("x", "bad", ExportFormat::Png), "x-bad.png");
	}

	#[test]
	fn data_url_payload_is_decoded() {
		assert_eq!(
			decode_data_url("data:image/jpeg;base64,/9j/2Q==").unwrap(),
			vec![0xFF, 0xD8, 0xFF, 0xD9]
		);
		assert!(decode_data_url("data:,plain").is_err());
	}

	#[test]
	fn snapshot_measures_laid_out_elements() {
		let mut board = BoardState::default();
		for (semester, id) in [("semester-1", "c1"), ("semester-2", "c2")] {
			board
				.apply(BoardCommand::UpsertCourse {
					semester_id: semester.into(),
					course: Course {
						id: id.into(),
						name: id.into(),
						sks: 3,
						color: CourseColor::Blue,
						description: None,
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
		let layout = FixedLayout::new()
			.with("semester-1", Rect::new(0.0, 0.0, 256.0, 400.0))
			.with("semester-2", Rect::new(272.0, 0.0, 256.0, 400.0))
			.with("c1", Rect::new(12.0, 60.0, 232.0, 50.0))
			.with("c2", Rect::new(284.0, 60.0, 232.0, 50.0));

		let snapshot = BoardSnapshot::capture(&board, &layout, 2400.0, 700.0);
		assert_eq!(snapshot.columns.len(), 2);
		assert_eq!(snapshot.columns[0].total_sks, 3);
		assert_eq!(snapshot.cards.len(), 2);
		assert_eq!(snapshot.connections.len(), 1);
		assert!(snapshot.legend.is_none());
		assert_eq!(snapshot.raster_size(40.0), (2480, 780));
	}
}
