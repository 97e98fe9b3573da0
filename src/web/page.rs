use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

use crate::model::{DietaryPreference, RecipeForm};
use crate::presenter::Presentation;
use crate::validation::TimePolicy;

const TITLE: &str = "Recipe Recommendation";

const STYLE: &str = "body{font-family:sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin-top:1rem}input,select{width:100%;padding:.4rem}\
button{margin-top:1.2rem;padding:.5rem 1.2rem}pre.recipe{white-space:pre-wrap;background:#f6f6f6;padding:1rem}\
.success{color:#1a7f37}.warning{color:#9a6700}.error{color:#cf222e}";

/// The full page: title, outcome of the last submission (if any), and the form
pub fn render(policy: &TimePolicy, form: &RecipeForm, outcome: Option<&Presentation>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{TITLE}</h1>\n"
    );

    if let Some(presentation) = outcome {
        let _ = writeln!(html, "<section id=\"outcome\">\n{}\n</section>", presentation.to_html());
    }

    html.push_str(&form_html(policy, form));
    html.push_str("</body>\n</html>\n");
    html
}

fn form_html(policy: &TimePolicy, form: &RecipeForm) -> String {
    let ingredients = form.ingredients.as_deref().unwrap_or_default();
    let time = form
        .time
        .clone()
        .unwrap_or_else(|| policy.default.to_string());
    let max = policy
        .max
        .map(|max| format!(" max=\"{}\"", max))
        .unwrap_or_default();

    let mut html = String::from("<form method=\"post\" action=\"/recipe\">\n");
    let _ = writeln!(
        html,
        "<label for=\"ingredients\">Ingredients you have (comma separated):</label>\n\
         <input id=\"ingredients\" name=\"ingredients\" type=\"text\" value=\"{}\" placeholder=\"eggs, bread, butter\">",
        encode_double_quoted_attribute(ingredients)
    );
    let _ = writeln!(
        html,
        "<label for=\"time\">Time available (in minutes):</label>\n\
         <input id=\"time\" name=\"time\" type=\"number\" min=\"{}\"{} step=\"1\" value=\"{}\">",
        policy.min,
        max,
        encode_double_quoted_attribute(&time)
    );

    let selected = form
        .preference
        .as_deref()
        .and_then(|raw| raw.parse::<DietaryPreference>().ok())
        .unwrap_or_default();
    html.push_str("<label for=\"preference\">Dietary preference:</label>\n<select id=\"preference\" name=\"preference\">\n");
    for preference in DietaryPreference::ALL {
        let _ = writeln!(
            html,
            "<option value=\"{label}\"{selected}>{label}</option>",
            label = encode_text(preference.label()),
            selected = if preference == selected { " selected" } else { "" }
        );
    }
    html.push_str("</select>\n<button type=\"submit\">Get Recommendation</button>\n</form>\n");
    html
}
