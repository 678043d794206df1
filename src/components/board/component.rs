use std::time::Duration;

use leptos::html::{Canvas, Div};
use leptos::prelude::*;
use log::{error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CanvasRenderingContext2d, DragEvent, HtmlCanvasElement, MouseEvent};

use super::dnd::drop_command;
use super::editor::ConnectionEditor;
use super::geometry::{Point, build_all, connection_at, handle_at};
use super::modal::{CourseDraft, CourseModal};
use super::overlay::{DomLayout, OverlayScheduler, RedrawTrigger, backing_size};
use super::recap::SksRecap;
use super::render;
use super::state::{BoardCommand, BoardState};
use super::toolbar::{ConnectionToolbar, ToolbarAction};
use super::types::{Course, CourseColor, PathType, Semester};
use crate::config::BoardConfig;
use crate::error::BoardError;
use crate::export::{ExportFormat, LEGEND_ID, export_board};
use crate::persistence::{clear_board, load_board, open_store, save_board};
use crate::suggest::fetch_suggestion;

/// Where the toolbar floats and what it shows.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ToolbarState {
	at: Point,
	path_type: PathType,
	has_points: bool,
}

/// Copyable handles shared by the board's child components.
#[derive(Clone, Copy)]
struct BoardHandle {
	board: RwSignal<BoardState>,
	editor: RwSignal<ConnectionEditor>,
	editing: RwSignal<Option<CourseDraft>>,
	dragging: RwSignal<Option<String>>,
	board_ref: NodeRef<Div>,
	scheduler: StoredValue<OverlayScheduler, LocalStorage>,
}

impl BoardHandle {
	/// Runs `command` through the store. Subscribers are only notified when
	/// the board actually changed; rejections are logged and return false.
	fn dispatch(self, command: BoardCommand) -> bool {
		let mut outcome = Ok(false);
		self.board.maybe_update(|board| {
			let before = board.revision();
			outcome = board.apply(command).map(|()| board.revision() != before);
			matches!(outcome, Ok(true))
		});
		match outcome {
			Ok(changed) => {
				if changed {
					self.board.with_untracked(|board| {
						self.editor.maybe_update(|editor| {
							let before = editor.clone();
							editor.sync(board);
							*editor != before
						})
					});
				}
				true
			}
			Err(err) => {
				warn!("command rejected: {err}");
				false
			}
		}
	}

	fn redraw(self, trigger: RedrawTrigger) {
		self.scheduler.try_with_value(|s| s.request(trigger));
	}

	fn layout(self) -> Option<DomLayout> {
		let board_el = self.board_ref.get_untracked()?;
		DomLayout::new(&board_el)
	}

	/// Live layout plus the pointer position in board coordinates.
	fn pointer(self, ev: &MouseEvent) -> Option<(DomLayout, Point)> {
		let layout = self.layout()?;
		let point = layout.to_board(ev.client_x() as f64, ev.client_y() as f64);
		Some((layout, point))
	}
}

fn confirm(message: &str) -> bool {
	web_sys::window()
		.and_then(|w| w.confirm_with_message(message).ok())
		.unwrap_or(false)
}

fn alert(message: &str) {
	if let Some(window) = web_sys::window() {
		let _ = window.alert_with_message(message);
	}
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok().flatten()?.dyn_into().ok()
}

fn draw_overlay(
	board: RwSignal<BoardState>,
	editor: RwSignal<ConnectionEditor>,
	board_ref: NodeRef<Div>,
	canvas_ref: NodeRef<Canvas>,
	toolbar: RwSignal<Option<ToolbarState>>,
) {
	let (Some(board_el), Some(canvas)) = (board_ref.get_untracked(), canvas_ref.get_untracked())
	else {
		return;
	};
	let Some(layout) = DomLayout::new(&board_el) else {
		return;
	};
	let (w, h) = (
		board_el.offset_width().max(1) as f64,
		board_el.offset_height().max(1) as f64,
	);
	let ratio = web_sys::window().map_or(1.0, |win| win.device_pixel_ratio());
	let (bw, bh) = backing_size(w, h, ratio);
	if canvas.width() != bw || canvas.height() != bh {
		canvas.set_width(bw);
		canvas.set_height(bh);
	}
	let Some(ctx) = context_2d(&canvas) else {
		warn!("overlay canvas has no 2d context");
		return;
	};
	// draw in CSS pixels
	let _ = ctx.set_transform(bw as f64 / w, 0.0, 0.0, bh as f64 / h, 0.0, 0.0);

	let geometries = board.with_untracked(|b| build_all(&layout, b.connections()));
	let next = editor.with_untracked(|editor| {
		render::render_overlay(
			&ctx,
			w,
			h,
			&geometries,
			editor.selected(),
			editor.design_mode(),
		);
		let id = editor.selected()?;
		let at = geometries
			.iter()
			.find(|g| g.connection_id == id)?
			.midpoint()?;
		board.with_untracked(|b| {
			let connection = b.connection(id)?;
			Some(ToolbarState {
				at,
				path_type: connection.path_type,
				has_points: !connection.control_points.is_empty(),
			})
		})
	});
	if toolbar.get_untracked() != next {
		toolbar.set(next);
	}
}

/// The curriculum board: semester columns, prerequisite arrows, and the
/// header and footer around them.
#[component]
pub fn CurriculumBoard() -> impl IntoView {
	let store = open_store();
	let config = BoardConfig::load(store.as_ref());
	let initial = load_board(store.as_ref(), &config.storage);
	info!(
		"board loaded: {} semesters, {} connections",
		initial.semesters().len(),
		initial.connections().len()
	);

	let board = RwSignal::new(initial);
	let editor = RwSignal::new(ConnectionEditor::new(config.reclick));
	let editing = RwSignal::new(None::<CourseDraft>);
	let dragging = RwSignal::new(None::<String>);
	let toolbar = RwSignal::new(None::<ToolbarState>);
	let exporting = RwSignal::new(false);
	let suggesting = RwSignal::new(false);
	let major = RwSignal::new(String::new());
	let board_ref = NodeRef::<Div>::new();
	let canvas_ref = NodeRef::<Canvas>::new();

	let scheduler = StoredValue::new_local(OverlayScheduler::new(config.drop_settle_ms, move || {
		draw_overlay(board, editor, board_ref, canvas_ref, toolbar)
	}));
	let store = StoredValue::new_local(store);
	let config = StoredValue::new(config);
	let handle = BoardHandle {
		board,
		editor,
		editing,
		dragging,
		board_ref,
		scheduler,
	};

	let semesters = Memo::new(move |_| board.with(|b| b.semesters().to_vec()));
	let connections = Memo::new(move |_| board.with(|b| b.connections().to_vec()));
	let recap = Memo::new(move |_| board.with(|b| SksRecap::compute(b.semesters())));
	let design_mode = Memo::new(move |_| editor.with(ConnectionEditor::design_mode));
	let selected = Memo::new(move |_| editor.with(|e| e.selected().map(str::to_owned)));
	let armed = Memo::new(move |_| editor.with(|e| e.source().is_some()));

	// Persist after every change
	Effect::new(move |_| {
		board.with(|b| {
			let saved =
				store.try_with_value(|s| config.with_value(|c| save_board(s.as_ref(), &c.storage, b)));
			if let Some(Err(err)) = saved {
				error!("could not save board: {err}");
			}
		});
	});

	Effect::new(move |_| {
		if board_ref.get().is_some() {
			handle.redraw(RedrawTrigger::Mount);
		}
	});
	Effect::new(move |_| {
		semesters.track();
		handle.redraw(RedrawTrigger::BoardChanged);
	});
	Effect::new(move |_| {
		connections.track();
		handle.redraw(RedrawTrigger::ConnectionsChanged);
	});
	Effect::new(move |_| {
		design_mode.track();
		handle.redraw(RedrawTrigger::DesignModeToggled);
	});
	Effect::new(move |_| {
		selected.track();
		handle.redraw(RedrawTrigger::SelectionChanged);
	});

	let on_resize =
		Closure::<dyn FnMut()>::new(move || handle.redraw(RedrawTrigger::Resized));
	if let Some(window) = web_sys::window() {
		let _ = window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref());
	}
	let on_resize = StoredValue::new_local(on_resize);
	on_cleanup(move || {
		scheduler.try_with_value(OverlayScheduler::cancel);
		on_resize.try_with_value(|cb| {
			if let Some(window) = web_sys::window() {
				let _ = window
					.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		});
	});

	let on_mousedown = move |ev: MouseEvent| {
		if !editor.with_untracked(ConnectionEditor::design_mode) {
			return;
		}
		let Some((_, p)) = handle.pointer(&ev) else {
			return;
		};
		if let Some((connection_id, index)) = board.with_untracked(|b| handle_at(b.connections(), p)) {
			ev.prevent_default();
			editor.update(|e| e.begin_drag(&connection_id, index));
		}
	};

	let on_mousemove = move |ev: MouseEvent| {
		if editor.with_untracked(|e| e.drag().is_none()) {
			return;
		}
		let Some((_, p)) = handle.pointer(&ev) else {
			return;
		};
		if let Some(command) = editor.with_untracked(|e| e.drag_to(p))
			&& handle.dispatch(command)
		{
			handle.redraw(RedrawTrigger::PointsEdited);
		}
	};

	let end_drag = move |_: MouseEvent| {
		if editor.with_untracked(|e| e.drag().is_some()) {
			editor.update(ConnectionEditor::end_drag);
		}
	};

	let on_click = move |ev: MouseEvent| {
		let Some((layout, p)) = handle.pointer(&ev) else {
			return;
		};
		let design = editor.with_untracked(ConnectionEditor::design_mode);
		if design && board.with_untracked(|b| handle_at(b.connections(), p)).is_some() {
			return;
		}
		let hit = board.with_untracked(|b| {
			connection_at(&build_all(&layout, b.connections()), p).map(str::to_owned)
		});
		editor.update(|e| match hit {
			Some(id) => e.click_connection(&id),
			None => e.click_background(),
		});
	};

	let on_dblclick = move |ev: MouseEvent| {
		let Some((_, p)) = handle.pointer(&ev) else {
			return;
		};
		let Some((connection_id, index)) = board.with_untracked(|b| handle_at(b.connections(), p))
		else {
			return;
		};
		if let Some(command) = editor
			.try_update(|e| e.remove_point(&connection_id, index))
			.flatten() && handle.dispatch(command)
		{
			handle.redraw(RedrawTrigger::PointsEdited);
		}
	};

	let on_toolbar = Callback::new(move |action: ToolbarAction| {
		let command = match action {
			ToolbarAction::CyclePath => editor.with_untracked(ConnectionEditor::cycle_path_type),
			ToolbarAction::AddPoint => {
				let Some(layout) = handle.layout() else {
					return;
				};
				board.with_untracked(|b| editor.with_untracked(|e| e.add_control_point(b, &layout)))
			}
			ToolbarAction::ResetPath => editor.with_untracked(ConnectionEditor::reset_path),
			ToolbarAction::Delete => editor.try_update(ConnectionEditor::delete_selected).flatten(),
		};
		if let Some(command) = command
			&& handle.dispatch(command)
		{
			handle.redraw(RedrawTrigger::PointsEdited);
		}
	});

	let on_save = Callback::new(move |draft: CourseDraft| {
		if handle.dispatch(BoardCommand::UpsertCourse {
			semester_id: draft.semester_id,
			course: draft.course,
		}) {
			editing.set(None);
		}
	});

	let on_delete = Callback::new(move |course_id: String| {
		if confirm("Hapus mata kuliah ini beserta koneksinya?")
			&& handle.dispatch(BoardCommand::DeleteCourse { course_id })
		{
			editing.set(None);
		}
	});

	let toggle_design = move |_: MouseEvent| editor.update(ConnectionEditor::toggle_design_mode);

	let clear_connections = move |_: MouseEvent| {
		if confirm("Hapus semua koneksi prasyarat?") {
			handle.dispatch(BoardCommand::ClearConnections);
		}
	};

	let reset_board = move |_: MouseEvent| {
		if !confirm("Reset papan ke kondisi awal? Semua mata kuliah dan koneksi akan dihapus.") {
			return;
		}
		let cleared =
			store.try_with_value(|s| config.with_value(|c| clear_board(s.as_ref(), &c.storage)));
		if let Some(Err(err)) = cleared {
			warn!("could not clear saved board: {err}");
		}
		handle.dispatch(BoardCommand::ResetBoard);
	};

	let run_export = move |format: ExportFormat| {
		if exporting.get_untracked() {
			return;
		}
		exporting.set(true);
		editor.update(ConnectionEditor::click_background);
		// let the busy label paint before the synchronous raster work
		set_timeout(
			move || {
				let result = match board_ref.get_untracked() {
					Some(el) => board.with_untracked(|b| {
						config.with_value(|c| export_board(&el, b, &c.export, format))
					}),
					None => Err(BoardError::Export("board not mounted".into())),
				};
				if let Err(err) = result {
					error!("export failed: {err}");
					alert("Gagal mengekspor papan kurikulum.");
				}
				exporting.set(false);
			},
			Duration::ZERO,
		);
	};

	let on_suggest = move |_: MouseEvent| {
		let name = major.get_untracked().trim().to_owned();
		if name.is_empty() || suggesting.get_untracked() {
			return;
		}
		suggesting.set(true);
		let (settings, vocabulary) =
			config.with_value(|c| (c.suggestion.clone(), c.color_vocabulary));
		spawn_local(async move {
			let result = fetch_suggestion(&settings, &name, vocabulary).await;
			suggesting.set(false);
			match result {
				Some(semesters) => {
					if confirm(&format!(
						"Terapkan saran kurikulum untuk {name}? Mata kuliah semester 1-8 akan diganti."
					)) {
						handle.dispatch(BoardCommand::ApplySuggestion { semesters });
					}
				}
				None => alert("Saran kurikulum tidak tersedia saat ini."),
			}
		});
	};

	view! {
		<div class="curriculum-board">
			<header class="board-header">
				<h1>"Kurikulum PTI 2026"</h1>
				<div class="board-actions">
					<input
						type="text"
						class="major-input"
						placeholder="Nama program studi"
						prop:value=move || major.get()
						on:input=move |ev| major.set(event_target_value(&ev))
					/>
					<button
						disabled=move || suggesting.get() || major.with(|m| m.trim().is_empty())
						on:click=on_suggest
					>
						{move || if suggesting.get() { "Memproses…" } else { "Saran AI" }}
					</button>
					<button class:active=move || design_mode.get() on:click=toggle_design>
						{move || if design_mode.get() { "Selesai Desain" } else { "Mode Desain" }}
					</button>
					<button on:click=clear_connections>"Hapus Koneksi"</button>
					<button class="danger" on:click=reset_board>
						"Reset"
					</button>
					<button disabled=move || exporting.get() on:click=move |_| run_export(ExportFormat::Png)>
						{move || if exporting.get() { "Mengekspor…" } else { "Ekspor PNG" }}
					</button>
					<button disabled=move || exporting.get() on:click=move |_| run_export(ExportFormat::Pdf)>
						{move || if exporting.get() { "Mengekspor…" } else { "Ekspor PDF" }}
					</button>
				</div>
			</header>

			<Show when=move || design_mode.get()>
				<p class="design-hint">
					{move || {
						if armed.get() {
							"Pilih mata kuliah tujuan."
						} else {
							"Klik mata kuliah asal lalu tujuan untuk membuat prasyarat. Klik garis untuk mengeditnya."
						}
					}}
				</p>
			</Show>

			<div class="board-scroll" on:scroll=move |_| handle.redraw(RedrawTrigger::Scrolled)>
				<div
					node_ref=board_ref
					class="board"
					class:design=move || design_mode.get()
					on:mousedown=on_mousedown
					on:mousemove=on_mousemove
					on:mouseup=end_drag
					on:mouseleave=end_drag
					on:click=on_click
					on:dblclick=on_dblclick
				>
					<div class="semester-row">
						{move || {
							semesters
								.get()
								.into_iter()
								.map(|semester| view! { <SemesterColumn semester=semester handle=handle /> })
								.collect_view()
						}}
					</div>
					<Legend />
					<canvas node_ref=canvas_ref class="board-overlay" />
					{move || {
						toolbar
							.get()
							.map(|t| {
								view! {
									<ConnectionToolbar
										at=t.at
										path_type=t.path_type
										has_points=t.has_points
										on_action=on_toolbar
									/>
								}
							})
					}}
				</div>
			</div>

			<RecapFooter recap=recap />

			{move || {
				editing
					.get()
					.map(|draft| {
						view! {
							<CourseModal
								draft=draft
								on_save=on_save
								on_delete=on_delete
								on_close=move |_| editing.set(None)
							/>
						}
					})
			}}
		</div>
	}
}

#[component]
fn SemesterColumn(semester: Semester, handle: BoardHandle) -> impl IntoView {
	let semester_id = semester.id.clone();

	let on_drop = {
		let semester_id = semester_id.clone();
		move |ev: DragEvent| {
			ev.prevent_default();
			let Some(course_id) = handle.dragging.get_untracked().or_else(|| {
				ev.data_transfer()
					.and_then(|dt| dt.get_data("text/plain").ok())
					.filter(|id| !id.is_empty())
			}) else {
				return;
			};
			handle.dragging.set(None);
			let Some((layout, p)) = handle.pointer(&ev) else {
				return;
			};
			let command = handle.board.with_untracked(|b| {
				b.semesters()
					.iter()
					.find(|s| s.id == semester_id)
					.map(|s| drop_command(&layout, s, &course_id, p.y))
			});
			if let Some(command) = command
				&& handle.dispatch(command)
			{
				handle.redraw(RedrawTrigger::DropCompleted);
			}
		}
	};

	let on_add = {
		let semester_id = semester_id.clone();
		move |ev: MouseEvent| {
			ev.stop_propagation();
			handle.editing.set(Some(CourseDraft::create(&semester_id)));
		}
	};

	let cards = semester
		.courses
		.iter()
		.cloned()
		.map(|course| {
			view! { <CourseCard semester_id=semester_id.clone() course=course handle=handle /> }
		})
		.collect_view();

	view! {
		<section
			id=semester_id.clone()
			class="semester-column"
			class:elective=semester.is_elective()
			on:dragover=|ev: DragEvent| ev.prevent_default()
			on:drop=on_drop
		>
			<header class="semester-header">
				<h3>{semester.title.clone()}</h3>
				<span class="semester-sks">{format!("{} SKS", semester.total_sks())}</span>
			</header>
			<div class="course-list">{cards}</div>
			<button class="add-course" on:click=on_add>
				"+ Tambah Mata Kuliah"
			</button>
		</section>
	}
}

#[component]
fn CourseCard(semester_id: String, course: Course, handle: BoardHandle) -> impl IntoView {
	let (bg, fg, border) = course.color.palette();
	let style = format!("background: {bg}; color: {fg}; border-color: {border};");
	let note = course.note().map(str::to_owned);
	let is_source = {
		let id = course.id.clone();
		Memo::new(move |_| handle.editor.with(|e| e.source() == Some(id.as_str())))
	};

	let on_click = {
		let course = course.clone();
		move |ev: MouseEvent| {
			ev.stop_propagation();
			if !handle.editor.with_untracked(ConnectionEditor::design_mode) {
				handle
					.editing
					.set(Some(CourseDraft::edit(&semester_id, course.clone())));
				return;
			}
			let Some((_, at)) = handle.pointer(&ev) else {
				return;
			};
			let command = handle.board.with_untracked(|b| {
				handle
					.editor
					.try_update(|e| e.click_course_at(b, &course.id, at))
					.flatten()
			});
			if let Some(command) = command {
				handle.dispatch(command);
			}
		}
	};

	let on_dragstart = {
		let id = course.id.clone();
		move |ev: DragEvent| {
			if let Some(dt) = ev.data_transfer() {
				let _ = dt.set_data("text/plain", &id);
				dt.set_effect_allowed("move");
			}
			handle.dragging.set(Some(id.clone()));
		}
	};

	view! {
		<div
			id=course.id.clone()
			class="course-card"
			class:armed=move || is_source.get()
			style=style
			title=note.clone()
			draggable=move || {
				if handle.editor.with(ConnectionEditor::design_mode) { "false" } else { "true" }
			}
			on:click=on_click
			on:dragstart=on_dragstart
			on:dragend=move |_| handle.dragging.set(None)
		>
			<span class="course-name">{course.name.clone()}</span>
			<span class="course-meta">
				{note.is_some().then(|| view! { <span class="course-note">"✎"</span> })}
				<span class="course-sks">{format!("{} SKS", course.sks)}</span>
			</span>
		</div>
	}
}

#[component]
fn Legend() -> impl IntoView {
	view! {
		<div id=LEGEND_ID class="board-legend">
			{CourseColor::LEGEND
				.into_iter()
				.map(|color| {
					let (bg, fg, border) = color.palette();
					view! {
						<span class="legend-item" style=format!("color: {fg};")>
							<span
								class="legend-swatch"
								style=format!("background: {bg}; border-color: {border};")
							></span>
							{format!("{} ({})", color.label(), color.short_label())}
						</span>
					}
				})
				.collect_view()}
		</div>
	}
}

#[component]
fn RecapFooter(recap: Memo<SksRecap>) -> impl IntoView {
	view! {
		<footer class="board-recap">
			{CourseColor::LEGEND
				.into_iter()
				.map(|color| {
					view! {
						<div class="recap-item">
							<span>{color.short_label()}</span>
							<strong>{move || recap.with(|r| r.category(color))}</strong>
						</div>
					}
				})
				.collect_view()}
			<div class="recap-item core">
				<span>"Beban Wajib"</span>
				<strong>{move || recap.with(SksRecap::core)}</strong>
			</div>
			<div class="recap-item total">
				<span>"Total SKS"</span>
				<strong>{move || recap.with(SksRecap::total)}</strong>
			</div>
		</footer>
	}
}
