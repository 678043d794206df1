//! Curriculum suggestions from the generative-language REST API.
//!
//! Every failure collapses into `None`; callers only learn whether a usable
//! suggestion came back.

use log::{error, info};
use serde::Deserialize;
use serde_json::{Value, json};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

use crate::components::board::{Course, CourseColor, REGULAR_SEMESTERS};
use crate::config::{ColorVocabulary, SuggestionConfig};
use crate::error::BoardError;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SuggestedCourse {
	pub name: String,
	pub sks: f64,
	pub color: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SuggestedSemester {
	#[serde(default)]
	pub title: String,
	pub courses: Vec<SuggestedCourse>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CurriculumSuggestion {
	pub semesters: Vec<SuggestedSemester>,
}

fn color_hint(vocabulary: ColorVocabulary) -> &'static str {
	match vocabulary {
		ColorVocabulary::Named => "choose from: blue, green, yellow, purple, gray, red",
		ColorVocabulary::ClassNames => {
			"choose from: bg-blue-100, bg-emerald-100, bg-amber-100, bg-fuchsia-100, bg-orange-100, bg-rose-100"
		}
	}
}

/// JSON body for `models/<model>:generateContent`.
pub fn request_body(major: &str, vocabulary: ColorVocabulary) -> Value {
	let prompt = format!(
		"Generate a sample 8-semester curriculum for a {major} major. Return exactly 8 semesters \
		 with 3-5 courses each. Each course needs a name, SKS (credits, usually 2-4), and a \
		 suggested color category ({}).",
		color_hint(vocabulary)
	);
	json!({
		"contents": [{ "parts": [{ "text": prompt }] }],
		"generationConfig": {
			"responseMimeType": "application/json",
			"responseSchema": {
				"type": "OBJECT",
				"properties": {
					"semesters": {
						"type": "ARRAY",
						"items": {
							"type": "OBJECT",
							"properties": {
								"title": { "type": "STRING" },
								"courses": {
									"type": "ARRAY",
									"items": {
										"type": "OBJECT",
										"properties": {
											"name": { "type": "STRING" },
											"sks": { "type": "NUMBER" },
											"color": { "type": "STRING" }
										},
										"required": ["name", "sks", "color"]
									}
								}
							},
							"required": ["title", "courses"]
						}
					}
				},
				"required": ["semesters"]
			}
		}
	})
}

/// Pulls the suggestion out of a `generateContent` response.
pub fn parse_generate_response(body: &str) -> Result<CurriculumSuggestion, BoardError> {
	let response: Value = serde_json::from_str(body)?;
	let text = response
		.pointer("/candidates/0/content/parts/0/text")
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|t| !t.is_empty())
		.ok_or_else(|| BoardError::Suggestion("response carried no text".into()))?;
	Ok(serde_json::from_str(text)?)
}

/// Largest credit load accepted for a single suggested course.
const MAX_COURSE_SKS: u32 = 24;

fn credits(sks: f64) -> u32 {
	(sks.round() as i64).clamp(1, i64::from(MAX_COURSE_SKS)) as u32
}

/// Converts a suggestion into course lists for semesters 1..=8. Blank names
/// are dropped, unknown colors become gray.
pub fn into_courses(suggestion: CurriculumSuggestion, vocabulary: ColorVocabulary) -> Vec<Vec<Course>> {
	suggestion
		.semesters
		.into_iter()
		.take(REGULAR_SEMESTERS)
		.map(|semester| {
			semester
				.courses
				.into_iter()
				.filter(|c| !c.name.trim().is_empty())
				.map(|c| Course {
					name: c.name.trim().to_owned(),
					sks: credits(c.sks),
					color: vocabulary.parse(&c.color).unwrap_or(CourseColor::Gray),
					..Course::draft()
				})
				.collect()
		})
		.collect()
}

async fn request(
	config: &SuggestionConfig,
	api_key: &str,
	major: &str,
	vocabulary: ColorVocabulary,
) -> Result<CurriculumSuggestion, BoardError> {
	let window = web_sys::window().ok_or_else(|| BoardError::Suggestion("no window".into()))?;
	let url = format!("{}/{}:generateContent", config.endpoint, config.model);

	let headers = Headers::new().map_err(|e| BoardError::suggestion("headers", e))?;
	headers
		.set("Content-Type", "application/json")
		.map_err(|e| BoardError::suggestion("headers", e))?;
	headers
		.set("x-goog-api-key", api_key)
		.map_err(|e| BoardError::suggestion("headers", e))?;
	let init = RequestInit::new();
	init.set_method("POST");
	init.set_headers(&headers);
	init.set_body(&request_body(major, vocabulary).to_string().into());
	let req = Request::new_with_str_and_init(&url, &init)
		.map_err(|e| BoardError::suggestion("request", e))?;

	let resp: Response = JsFuture::from(window.fetch_with_request(&req))
		.await
		.map_err(|e| BoardError::suggestion("fetch", e))?
		.dyn_into()
		.map_err(|e| BoardError::suggestion("fetch", e))?;
	if !resp.ok() {
		return Err(BoardError::Suggestion(format!("HTTP {}", resp.status())));
	}
	let text = JsFuture::from(resp.text().map_err(|e| BoardError::suggestion("body", e))?)
		.await
		.map_err(|e| BoardError::suggestion("body", e))?
		.as_string()
		.ok_or_else(|| BoardError::Suggestion("body is not text".into()))?;
	parse_generate_response(&text)
}

/// Asks for a curriculum for `major`. `None` on any failure, including a
/// missing API key.
pub async fn fetch_suggestion(
	config: &SuggestionConfig,
	major: &str,
	vocabulary: ColorVocabulary,
) -> Option<Vec<Vec<Course>>> {
	let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) else {
		error!("suggestion service has no API key configured");
		return None;
	};
	match request(config, api_key, major, vocabulary).await {
		Ok(suggestion) => {
			let semesters = into_courses(suggestion, vocabulary);
			info!("received suggestion for {major}: {} semesters", semesters.len());
			Some(semesters).filter(|s| s.iter().any(|courses| !courses.is_empty()))
		}
		Err(err) => {
			error!("suggestion request failed: {err}");
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn wrap(text: &str) -> String {
		json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string()
	}

	#[test]
	fn parses_candidate_text() {
		let body = wrap(
			r#"{"semesters":[{"title":"Semester 1","courses":[{"name":"Kalkulus","sks":3,"color":"blue"}]}]}"#,
		);
		let suggestion = parse_generate_response(&body).unwrap();
		assert_eq!(suggestion.semesters.len(), 1);
		assert_eq!(suggestion.semesters[0].courses[0].name, "Kalkulus");
	}

	#[test]
	fn empty_or_malformed_responses_are_errors() {
		assert!(parse_generate_response("{}").is_err());
		assert!(parse_generate_response(&wrap("   ")).is_err());
		assert!(parse_generate_response(&wrap("not json")).is_err());
		assert!(parse_generate_response("<html>").is_err());
	}

	#[test]
	fn courses_are_normalized() {
		let course = |name: &str, sks: f64, color: &str| SuggestedCourse {
			name: name.into(),
			sks,
			color: color.into(),
		};
		let suggestion = CurriculumSuggestion {
			semesters: vec![SuggestedSemester {
				title: "Semester 1".into(),
				courses: vec![
					course("Kalkulus", 2.6, "BLUE"),
					course("Etika", -1.0, "orange"),
					course("  ", 3.0, "green"),
					course("Statistika", 0.2, "red"),
				],
			}],
		};
		let semesters = into_courses(suggestion, ColorVocabulary::Named);
		let courses = &semesters[0];
		assert_eq!(courses.len(), 3);
		assert_eq!((courses[0].sks, courses[0].color), (3, CourseColor::Blue));
		assert_eq!((courses[1].sks, courses[1].color), (1, CourseColor::Gray));
		assert_eq!((courses[2].sks, courses[2].color), (1, CourseColor::Red));
		assert_ne!(courses[0].id, courses[1].id);
	}

	#[test]
	fn oversized_credits_are_capped() {
		let huge = |name: &str| SuggestedCourse {
			name: name.into(),
			sks: 1e12,
			color: "blue".into(),
		};
		let suggestion = CurriculumSuggestion {
			semesters: vec![SuggestedSemester {
				title: String::new(),
				courses: vec![huge("Skripsi"), huge("Magang")],
			}],
		};
		let semesters = into_courses(suggestion, ColorVocabulary::Named);
		assert!(semesters[0].iter().all(|c| c.sks == MAX_COURSE_SKS));
		assert_eq!(credits(f64::NAN), 1);
	}

	#[test]
	fn class_name_vocabulary_maps_by_hue() {
		let suggestion = CurriculumSuggestion {
			semesters: vec![SuggestedSemester {
				title: String::new(),
				courses: vec![SuggestedCourse {
					name: "Basis Data".into(),
					sks: 3.0,
					color: "bg-emerald-100 text-emerald-800".into(),
				}],
			}],
		};
		let semesters = into_courses(suggestion, ColorVocabulary::ClassNames);
		assert_eq!(semesters[0][0].color, CourseColor::Green);
	}

	#[test]
	fn only_eight_semesters_are_kept() {
		let suggestion = CurriculumSuggestion {
			semesters: vec![
				SuggestedSemester {
					title: String::new(),
					courses: Vec::new(),
				};
				10
			],
		};
		assert_eq!(into_courses(suggestion, ColorVocabulary::Named).len(), 8);
	}

	#[test]
	fn body_requests_json_schema() {
		let body = request_body("Informatika", ColorVocabulary::Named);
		assert_eq!(
			body.pointer("/generationConfig/responseMimeType"),
			Some(&json!("application/json"))
		);
		let prompt = body
			.pointer("/contents/0/parts/0/text")
			.and_then(Value::as_str)
			.unwrap();
		assert!(prompt.contains("Informatika major"));
	}
}
