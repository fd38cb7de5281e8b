//! HTML for the upload page.

use std::fmt::Write;

use nutriscan_core::{Grade, NutrientField};
use nutriscan_ocr::LabelAnalysis;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 46rem; margin: 2rem auto; padding: 0 1rem; color: #1f2937; }
h1 { margin-bottom: .25rem; }
form { margin: 1.5rem 0; padding: 1rem; border: 2px dashed #cbd5e1; border-radius: .5rem; }
.error-message { padding: .75rem 1rem; background: #fef2f2; color: #b91c1c; border-radius: .5rem; }
.nutriscore-badge { display: flex; gap: .25rem; margin: 1rem 0; }
.score-box { width: 2.5rem; height: 2.5rem; display: flex; align-items: center; justify-content: center; font-weight: 700; color: #fff; opacity: .35; border-radius: .25rem; }
.score-box.active { opacity: 1; transform: scale(1.2); }
.score-box.A { background: #038141; } .score-box.B { background: #85bb2f; } .score-box.C { background: #fecb02; }
.score-box.D { background: #ee8100; } .score-box.E { background: #e63e11; }
table { border-collapse: collapse; width: 100%; }
td, th { text-align: left; padding: .35rem .5rem; border-bottom: 1px solid #e5e7eb; }
td.missing { color: #9ca3af; font-style: italic; }
pre { white-space: pre-wrap; background: #f8fafc; padding: 1rem; border-radius: .5rem; }
"#;

/// Escape text for use in HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render the page: the upload form, then either an error, the analysis
/// of the last upload, or nothing.
pub fn page(analysis: Option<&LabelAnalysis>, error: Option<&str>) -> String {
    let mut body = String::new();

    if let Some(error) = error {
        let _ = write!(
            body,
            r#"<div class="error-message">&#9888; {}</div>"#,
            escape(error)
        );
    }

    if let Some(a) = analysis {
        match a.score {
            Some(score) => {
                body.push_str("<h2>Nutri-Score Analysis</h2>");
                body.push_str(&grade_badge(score.grade));
                let _ = write!(
                    body,
                    r#"<p class="score-label">Nutri-Score: {grade} (score {score})</p><p class="score-meaning">{meaning}</p>"#,
                    grade = score.grade,
                    score = score.score,
                    meaning = escape(score.grade.description()),
                );
            }
            None => match &a.score_error {
                Some(e) => {
                    let _ = write!(
                        body,
                        r#"<div class="error-message">Could not score the values read from this image: {}</div>"#,
                        escape(&e.to_string())
                    );
                }
                None => body.push_str(
                    r#"<div class="error-message">No nutrition values could be read from this image.</div>"#,
                ),
            },
        }
        body.push_str(&nutrient_table(a));
        let _ = write!(body, "<h2>OCR Text</h2><pre>{}</pre>", escape(&a.ocr_text));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>NutriScan</title>
<style>{STYLE}</style>
</head>
<body>
<h1>NutriScan</h1>
<p>Upload a photo of a nutrition label to get its Nutri-Score.</p>
<form method="post" action="/" enctype="multipart/form-data">
<input type="file" name="file" accept="image/*">
<button type="submit">Analyze Package</button>
</form>
{body}
</body>
</html>
"#
    )
}

fn grade_badge(active: Grade) -> String {
    let boxes: String = Grade::ALL
        .iter()
        .map(|g| {
            let class = if *g == active { " active" } else { "" };
            format!(r#"<div class="score-box {g}{class}">{g}</div>"#)
        })
        .collect();
    format!(r#"<div class="nutriscore-badge">{boxes}</div>"#)
}

fn nutrient_table(a: &LabelAnalysis) -> String {
    let mut rows = String::new();
    for field in NutrientField::ALL {
        match a.nutrients.get(field) {
            Some(v) => {
                let _ = write!(rows, "<tr><th>{}</th><td>{v}</td></tr>", field.label());
            }
            None => {
                let _ = write!(
                    rows,
                    r#"<tr><th>{}</th><td class="missing">not found</td></tr>"#,
                    field.label()
                );
            }
        }
    }
    format!("<h2>Nutritional Information</h2><table>{rows}</table>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_specials() {
        assert_eq!(escape(r#"<b>"Fat" & 'Salt'</b>"#), "&lt;b&gt;&quot;Fat&quot; &amp; &#39;Salt&#39;&lt;/b&gt;");
    }

    #[test]
    fn empty_page_has_form_only() {
        let html = page(None, None);
        assert!(html.contains(r#"enctype="multipart/form-data""#));
        assert!(!html.contains("error-message\">"));
        assert!(!html.contains("Nutri-Score:"));
    }

    #[test]
    fn error_is_escaped() {
        let html = page(None, Some("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert"));
    }

    #[test]
    fn analysis_marks_active_grade_and_missing_fields() {
        let a = LabelAnalysis::from_text("Saturated Fat 11\n<Protein> 2".into());
        let html = page(Some(&a), None);
        assert!(html.contains(r#"<div class="score-box D active">D</div>"#));
        assert!(html.contains("Nutri-Score: D"));
        assert!(html.contains(Grade::D.description()));
        assert!(html.contains(r#"<tr><th>Saturated Fat (g)</th><td>11</td></tr>"#));
        assert!(html.contains(r#"<tr><th>Sugar (g)</th><td class="missing">not found</td></tr>"#));
        assert!(html.contains("&lt;Protein&gt; 2"));
    }

    #[test]
    fn analysis_without_values_says_so() {
        let a = LabelAnalysis::from_text("blurry".into());
        let html = page(Some(&a), None);
        assert!(html.contains("No nutrition values could be read"));
        assert!(!html.contains(r#"class="nutriscore-badge""#));
    }

    #[test]
    fn rejected_values_still_show_table_and_text() {
        let a = LabelAnalysis::from_text("Sugar 12g\nSodium 2000000mg".into());
        let html = page(Some(&a), None);
        assert!(html.contains("Could not score the values read from this image"));
        assert!(html.contains("sodium_mg"));
        assert!(html.contains(r#"<tr><th>Sugar (g)</th><td>12</td></tr>"#));
        assert!(html.contains("Sodium 2000000mg"));
        assert!(!html.contains(r#"class="nutriscore-badge""#));
    }
}
