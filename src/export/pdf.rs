//! Minimal single-page PDF writer that embeds one JPEG.

use std::fmt::Write as _;

fn pt(v: f64) -> f64 {
	(v * 100.0).round() / 100.0
}

/// Builds a one-page landscape PDF showing `jpeg` (width x height pixels).
/// Landscape images are placed at 1 px = 1 pt; portrait ones are scaled down
/// to the page height and centered horizontally.
pub fn single_page_jpeg(width: u32, height: u32, jpeg: &[u8]) -> Vec<u8> {
	let (page_w, page_h) = (width.max(height), width.min(height));
	let scale = (f64::from(page_w) / f64::from(width.max(1)))
		.min(f64::from(page_h) / f64::from(height.max(1)))
		.min(1.0);
	let (draw_w, draw_h) = (f64::from(width) * scale, f64::from(height) * scale);
	let content = format!(
		"q {} 0 0 {} {} {} cm /Im0 Do Q\n",
		pt(draw_w),
		pt(draw_h),
		pt((f64::from(page_w) - draw_w) / 2.0),
		pt(f64::from(page_h) - draw_h),
	);

	let mut out: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
	let mut offsets = Vec::with_capacity(5);
	let mut object = |out: &mut Vec<u8>, body: &[u8]| {
		offsets.push(out.len());
		out.extend_from_slice(format!("{} 0 obj\n", offsets.len()).as_bytes());
		out.extend_from_slice(body);
		out.extend_from_slice(b"\nendobj\n");
	};

	object(&mut out, b"<< /Type /Catalog /Pages 2 0 R >>");
	object(&mut out, b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
	object(
		&mut out,
		format!(
			"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {page_w} {page_h}] \
			 /Resources << /XObject << /Im0 4 0 R >> >> /Contents 5 0 R >>"
		)
		.as_bytes(),
	);

	let mut image = format!(
		"<< /Type /XObject /Subtype /Image /Width {width} /Height {height} \
		 /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
		jpeg.len()
	)
	.into_bytes();
	image.extend_from_slice(jpeg);
	image.extend_from_slice(b"\nendstream");
	object(&mut out, &image);

	let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
	stream.extend_from_slice(content.as_bytes());
	stream.extend_from_slice(b"endstream");
	object(&mut out, &stream);

	let xref_at = out.len();
	let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1);
	for offset in &offsets {
		let _ = write!(xref, "{offset:010} 00000 n \n");
	}
	let _ = write!(
		xref,
		"trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
		offsets.len() + 1
	);
	out.extend_from_slice(xref.as_bytes());
	out
}
