use leptos::prelude::*;

use super::geometry::Point;
use super::types::PathType;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolbarAction {
	CyclePath,
	AddPoint,
	ResetPath,
	Delete,
}

/// Floating toolbar for the selected connection, centered on `at`.
#[component]
pub fn ConnectionToolbar(
	at: Point,
	path_type: PathType,
	has_points: bool,
	#[prop(into)] on_action: Callback<ToolbarAction>,
) -> impl IntoView {
	let style = format!(
		"left: {}px; top: {}px; transform: translate(-50%, -130%);",
		at.x, at.y
	);
	let button = move |action: ToolbarAction, label: String, title: &'static str| {
		view! {
			<button
				title=title
				on:click=move |ev| {
					ev.stop_propagation();
					on_action.run(action);
				}
			>
				{label}
			</button>
		}
	};

	view! {
		// keep presses off the board's handle/drag handlers
		<div
			class="connection-toolbar"
			style=style
			on:mousedown=|ev| ev.stop_propagation()
			on:click=|ev| ev.stop_propagation()
		>
			{button(
				ToolbarAction::CyclePath,
				format!("Garis: {}", path_type.label()),
				"Ganti bentuk garis",
			)}
			{button(ToolbarAction::AddPoint, "+ Titik".into(), "Tambah titik kontrol")}
			{has_points
				.then(|| button(ToolbarAction::ResetPath, "Reset".into(), "Hapus semua titik"))}
			<button
				class="danger"
				title="Hapus koneksi"
				on:click=move |ev| {
					ev.stop_propagation();
					on_action.run(ToolbarAction::Delete);
				}
			>
				"Hapus"
			</button>
		</div>
	}
}
