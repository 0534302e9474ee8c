//! HTML pages, rendered from embedded templates. Placeholders use
//! `{{name}}` so the markup's own braces stay out of the way.

use audition_core::calibration::{CalibrationSummary, ReferenceClip, MAX_COARSE_SCORE};
use audition_core::pairing::PresentationOrder;
use audition_core::scoring::{Score, CRITERIA};
use audition_core::session::{ComparePosition, SinglePosition};

const SHELL: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{title}}</title>
<style>
body { font-family: sans-serif; margin: 0; display: flex; }
main { flex: 1; padding: 2rem; max-width: 46rem; }
aside { width: 20rem; padding: 1.5rem; background: #f5f5f5; font-size: 0.85rem; }
aside table { border-collapse: collapse; width: 100%; }
aside td, aside th { border: 1px solid #ccc; padding: 0.25rem 0.4rem; text-align: left; }
audio { width: 100%; margin: 0.75rem 0; }
input[type=range] { width: 100%; }
.warning { color: #b00; }
.progress { color: #666; }
.columns { display: flex; gap: 1.5rem; }
.columns > div { flex: 1; }
button { padding: 0.5rem 1.25rem; margin-top: 1rem; }
</style>
</head>
<body>
<main>
{{body}}
</main>
<aside>
<h3>Rating criteria</h3>
<table>
<tr><th>Range</th><th>Label</th><th>Description</th></tr>
{{criteria}}
</table>
</aside>
</body>
</html>
"#;

fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{}}}}}", key), value);
    }
    out
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn criteria_rows() -> String {
    CRITERIA
        .iter()
        .map(|band| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                band.range, band.label, band.description
            )
        })
        .collect()
}

fn shell(title: &str, body: &str) -> String {
    render(
        SHELL,
        &[
            ("title", title),
            ("body", body),
            ("criteria", &criteria_rows()),
        ],
    )
}

const NAME_FORM: &str = r#"<h1>{{heading}}</h1>
{{warning}}
<form method="post" action="/session">
<label>Enter your name:
<input type="text" name="user_name" autofocus>
</label>
<button type="submit">Start</button>
</form>
"#;

pub fn name_page(heading: &str, warning: Option<&str>) -> String {
    let warning = warning
        .map(|w| format!("<p class=\"warning\">{}</p>", escape_html(w)))
        .unwrap_or_default();
    shell(
        heading,
        &render(NAME_FORM, &[("heading", heading), ("warning", &warning)]),
    )
}

const SINGLE_BODY: &str = r#"<h1>Model {{model_n}} of {{model_total}}: {{model}}</h1>
<p class="progress">Sample {{sample_n}} of {{sample_total}}</p>
<audio controls src="/audio/{{audio_src}}"></audio>
<p><strong>Transcript:</strong> {{transcription}}</p>
<form method="post" action="/score">
<label>Score (0&ndash;100):
<input type="range" name="score" min="0" max="100" value="{{score}}"
 oninput="this.nextElementSibling.textContent = this.value">
<output>{{score}}</output>
</label>
<button type="submit">Save &amp; Next</button>
</form>
<form method="post" action="/back"><button type="submit">Back</button></form>
"#;

pub fn single_page(p: &SinglePosition) -> String {
    let score = p.previous.unwrap_or(Score::MIDPOINT).to_string();
    shell(
        "TTS Evaluation",
        &render(
            SINGLE_BODY,
            &[
                ("model_n", &(p.model_index + 1).to_string()),
                ("model_total", &p.model_total.to_string()),
                ("model", &escape_html(&p.model)),
                ("sample_n", &(p.sample_index + 1).to_string()),
                ("sample_total", &p.sample_total.to_string()),
                (
                    "audio_src",
                    &format!("{}/{}", escape_html(&p.model), escape_html(&p.audio_file)),
                ),
                ("transcription", &escape_html(&p.transcription)),
                ("score", &score),
            ],
        ),
    )
}

const COMPARE_BODY: &str = r#"<h1>Pair {{pair_n}} of {{pair_total}}</h1>
<p class="progress">Sample {{sample_n}} of {{sample_total}}</p>
<p><strong>Transcript:</strong> {{transcription}}</p>
<form method="post" action="/compare/score">
<div class="columns">
<div>
<h2>Clip A</h2>
<audio controls src="/audio/{{src_a}}"></audio>
<label>Score A (0&ndash;100):
<input type="range" name="score_a" min="0" max="100" value="50"
 oninput="this.nextElementSibling.textContent = this.value">
<output>50</output>
</label>
</div>
<div>
<h2>Clip B</h2>
<audio controls src="/audio/{{src_b}}"></audio>
<label>Score B (0&ndash;100):
<input type="range" name="score_b" min="0" max="100" value="50"
 oninput="this.nextElementSibling.textContent = this.value">
<output>50</output>
</label>
</div>
</div>
<p>Which clip do you prefer?</p>
<label><input type="radio" name="preference" value="a" required> Clip A</label>
<label><input type="radio" name="preference" value="b"> Clip B</label>
<br>
<button type="submit">Submit &amp; Next</button>
</form>
<form method="post" action="/back"><button type="submit">Back</button></form>
"#;

/// The evaluator sees anonymous clips A and B; which model plays as A
/// comes from the presentation order drawn for this sample.
pub fn compare_page(p: &ComparePosition) -> String {
    let baseline_src = format!(
        "{}/{}",
        escape_html(&p.baseline_model),
        escape_html(&p.baseline_file)
    );
    let experimental_src = format!(
        "{}/{}",
        escape_html(&p.experimental_model),
        escape_html(&p.experimental_file)
    );
    let (src_a, src_b) = match p.order {
        PresentationOrder::BaselineFirst => (baseline_src, experimental_src),
        PresentationOrder::ExperimentalFirst => (experimental_src, baseline_src),
    };
    shell(
        "TTS Comparison",
        &render(
            COMPARE_BODY,
            &[
                ("pair_n", &(p.pair_index + 1).to_string()),
                ("pair_total", &p.pair_total.to_string()),
                ("sample_n", &(p.sample_index + 1).to_string()),
                ("sample_total", &p.sample_total.to_string()),
                ("transcription", &escape_html(&p.transcription)),
                ("src_a", &src_a),
                ("src_b", &src_b),
            ],
        ),
    )
}

const CALIBRATE_BODY: &str = r#"<h1>Hello {{user_name}}! Rate the following audio.</h1>
<p class="progress">Progress: {{done}}/{{total}} clips rated</p>
<audio controls src="/audio/test/{{file}}"></audio>
<p><strong>Transcript:</strong> {{transcription}}</p>
<form method="post" action="/calibrate/score">
<label>Rate from 0 (worst) to {{max}} (best):
<input type="range" name="score" min="0" max="{{max}}" value="5"
 oninput="this.nextElementSibling.textContent = this.value">
<output>5</output>
</label>
<button type="submit">Submit score</button>
</form>
"#;

pub fn calibrate_page(user_name: &str, clip: &ReferenceClip, done: usize, total: usize) -> String {
    shell(
        "Criteria Understanding Test",
        &render(
            CALIBRATE_BODY,
            &[
                ("user_name", &escape_html(user_name)),
                ("done", &done.to_string()),
                ("total", &total.to_string()),
                ("file", clip.file),
                ("transcription", &escape_html(clip.transcription)),
                ("max", &MAX_COARSE_SCORE.to_string()),
            ],
        ),
    )
}

const CALIBRATE_RESULTS_BODY: &str = r#"<h1>All clips rated. Thank you!</h1>
<ul>
<li>Accuracy (&plusmn;1 tolerance): {{accuracy}}%</li>
<li>Average error: {{mean_error}}</li>
<li>Min error: {{min_error}}</li>
<li>Max error: {{max_error}}</li>
</ul>
<p><strong>{{verdict}}</strong></p>
"#;

pub fn calibrate_results_page(summary: &CalibrationSummary) -> String {
    let verdict = if summary.passed {
        "Status: PASSED".to_string()
    } else {
        format!("Status: FAILED (accuracy below {:.0}%)", audition_core::calibration::PASS_ACCURACY)
    };
    shell(
        "Criteria Understanding Test",
        &render(
            CALIBRATE_RESULTS_BODY,
            &[
                ("accuracy", &format!("{:.1}", summary.accuracy)),
                ("mean_error", &format!("{:.2}", summary.mean_error)),
                ("min_error", &summary.min_error.to_string()),
                ("max_error", &summary.max_error.to_string()),
                ("verdict", &verdict),
            ],
        ),
    )
}

pub fn done_page(message: &str) -> String {
    shell("Done", &format!("<h1>{}</h1>", escape_html(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_the_five_entities() {
        assert_eq!(
            escape_html("<a href=\"x\">&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn name_page_shows_warning_when_given() {
        let page = name_page("TTS Evaluation", Some("Please enter your name to start."));
        assert!(page.contains("class=\"warning\""));
        assert!(page.contains("Please enter your name"));
        assert!(name_page("TTS Evaluation", None).contains("Enter your name"));
    }

    #[test]
    fn single_page_embeds_audio_and_previous_score() {
        let p = SinglePosition {
            model: "base_v1".into(),
            model_index: 0,
            model_total: 2,
            sample_index: 1,
            sample_total: 4,
            transcription: "a <b> transcript".into(),
            audio_file: "clip.wav".into(),
            previous: Some(Score::new(72)),
        };
        let page = single_page(&p);
        assert!(page.contains("/audio/base_v1/clip.wav"));
        assert!(page.contains("value=\"72\""));
        assert!(page.contains("a &lt;b&gt; transcript"));
        assert!(page.contains("Sample 2 of 4"));
    }

    #[test]
    fn compare_page_orders_clips_blind() {
        let p = ComparePosition {
            pair_index: 0,
            pair_total: 1,
            sample_index: 0,
            sample_total: 1,
            baseline_model: "base".into(),
            experimental_model: "exp".into(),
            transcription: "t".into(),
            baseline_file: "b.wav".into(),
            experimental_file: "e.wav".into(),
            order: PresentationOrder::ExperimentalFirst,
        };
        let page = compare_page(&p);
        let a = page.find("/audio/exp/e.wav").unwrap();
        let b = page.find("/audio/base/b.wav").unwrap();
        assert!(a < b, "experimental clip should render as clip A");
        // Model names never appear as labels.
        assert!(!page.contains("<h2>base</h2>"));
        assert!(!page.contains("<h2>exp</h2>"));
    }

    #[test]
    fn criteria_sidebar_lists_all_bands() {
        let page = done_page("All models evaluated!");
        for band in CRITERIA {
            assert!(page.contains(band.label));
        }
    }
}
