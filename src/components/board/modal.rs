use leptos::ev::MouseEvent;
use leptos::prelude::*;

use super::types::{Course, CourseColor};
use crate::error::BoardError;

/// A course being added or edited, with the column it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct CourseDraft {
	pub semester_id: String,
	pub course: Course,
	pub is_new: bool,
}

impl CourseDraft {
	pub fn create(semester_id: &str) -> Self {
		Self {
			semester_id: semester_id.into(),
			course: Course::draft(),
			is_new: true,
		}
	}

	pub fn edit(semester_id: &str, course: Course) -> Self {
		Self {
			semester_id: semester_id.into(),
			course,
			is_new: false,
		}
	}

	/// Trims the text fields and checks what the store would reject anyway,
	/// so the modal can stay open with a message.
	pub fn validate(mut self) -> Result<Self, BoardError> {
		self.course.name = self.course.name.trim().to_owned();
		self.course.description = self
			.course
			.description
			.map(|d| d.trim().to_owned())
			.filter(|d| !d.is_empty());
		if self.course.name.is_empty() {
			return Err(BoardError::InvalidCourse("name must not be empty"));
		}
		if self.course.sks == 0 {
			return Err(BoardError::InvalidCourse("sks must be positive"));
		}
		Ok(self)
	}
}

/// Parses the SKS field; blanks and non-numbers give 0 so validation catches them.
pub fn parse_sks(raw: &str) -> u32 {
	raw.trim().parse().unwrap_or(0)
}

#[component]
pub fn CourseModal(
	draft: CourseDraft,
	#[prop(into)] on_save: Callback<CourseDraft>,
	#[prop(into)] on_delete: Callback<String>,
	#[prop(into)] on_close: Callback<()>,
) -> impl IntoView {
	let is_new = draft.is_new;
	let course_id = draft.course.id.clone();
	let name = RwSignal::new(draft.course.name.clone());
	let sks = RwSignal::new(draft.course.sks.to_string());
	let color = RwSignal::new(draft.course.color);
	let description = RwSignal::new(draft.course.description.clone().unwrap_or_default());
	let problem = RwSignal::new(None::<String>);
	let base = StoredValue::new(draft);

	let save = move |_: MouseEvent| {
		let mut next = base.get_value();
		next.course.name = name.get_untracked();
		next.course.sks = parse_sks(&sks.get_untracked());
		next.course.color = color.get_untracked();
		next.course.description = Some(description.get_untracked());
		match next.validate() {
			Ok(valid) => on_save.run(valid),
			Err(err) => problem.set(Some(err.to_string())),
		}
	};

	view! {
		<div class="modal-backdrop" on:click=move |_| on_close.run(())>
			<div class="modal" on:click=|ev| ev.stop_propagation()>
				<h2>{if is_new { "Tambah Mata Kuliah" } else { "Edit Mata Kuliah" }}</h2>
				<label>
					"Nama"
					<input
						type="text"
						prop:value=move || name.get()
						on:input=move |ev| name.set(event_target_value(&ev))
					/>
				</label>
				<label>
					"SKS"
					<input
						type="number"
						min="1"
						prop:value=move || sks.get()
						on:input=move |ev| sks.set(event_target_value(&ev))
					/>
				</label>
				<label>
					"Kategori"
					<select
						prop:value=move || color.get().as_str()
						on:change=move |ev| color.set(CourseColor::from(event_target_value(&ev)))
					>
						{CourseColor::ALL
							.into_iter()
							.map(|c| {
								view! {
									<option value=c.as_str() selected=move || color.get() == c>
										{c.label()}
									</option>
								}
							})
							.collect_view()}
					</select>
				</label>
				<label>
					"Catatan"
					<textarea
						rows="3"
						prop:value=move || description.get()
						on:input=move |ev| description.set(event_target_value(&ev))
					/>
				</label>
				{move || problem.get().map(|msg| view! { <p class="modal-error">{msg}</p> })}
				<div class="modal-actions">
					{(!is_new)
						.then(|| {
							view! {
								<button
									class="danger"
									on:click=move |_| on_delete.run(course_id.clone())
								>
									"Hapus"
								</button>
							}
						})}
					<button on:click=move |_| on_close.run(())>"Batal"</button>
					<button class="primary" on:click=save>"Simpan"</button>
				</div>
			</div>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn validate_trims_and_drops_blank_note() {
		let mut draft = CourseDraft::create("semester-1");
		draft.course.name = "  Algoritma  ".into();
		draft.course.description = Some("   ".into());
		let valid = draft.validate().unwrap();
		assert_eq!(valid.course.name, "Algoritma");
		assert_eq!(valid.course.description, None);
		assert!(valid.is_new);
	}

	#[test]
	fn validate_rejects_blank_name_and_zero_sks() {
		let draft = CourseDraft::create("semester-1");
		assert!(matches!(draft.clone().validate(), Err(BoardError::InvalidCourse(_))));

		let mut zero = draft;
		zero.course.name = "Fisika".into();
		zero.course.sks = parse_sks("abc");
		assert!(matches!(zero.validate(), Err(BoardError::InvalidCourse(_))));
	}

	#[test]
	fn sks_field_parsing() {
		assert_eq!(parse_sks(" 3 "), 3);
		assert_eq!(parse_sks(""), 0);
		assert_eq!(parse_sks("-2"), 0);
	}
}
