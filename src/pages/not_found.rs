use leptos::prelude::*;
use leptos_router::components::A;

/// 404 Not Found Page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div class="not-found">
			<h1>"Halaman tidak ditemukan"</h1>
			<A href="/">"Kembali ke papan kurikulum"</A>
		</div>
	}
}
