//! HTML rendering for the single form page

use crate::config::FormConfig;
use crate::format;
use crate::types::prediction::Prediction;
use crate::types::record::Record;
use std::fmt::Write;

/// What the result area shows below the input echo.
#[derive(Debug, Clone)]
pub enum Outcome {
    Prediction(Prediction),
    Error(String),
}

/// Everything that varies between renders of the page.
pub struct PageView<'a> {
    /// Raw value per field, as shown in the input controls
    pub inputs: Vec<String>,
    /// Record echoed back, when the inputs formed one
    pub record: Option<&'a Record>,
    pub outcome: Option<Outcome>,
}

impl<'a> PageView<'a> {
    /// Initial page: defaults in the controls, default record echoed.
    pub fn initial(form: &FormConfig, record: &'a Record) -> Self {
        Self {
            inputs: form
                .fields
                .fields()
                .iter()
                .map(|f| f.default.to_string())
                .collect(),
            record: Some(record),
            outcome: None,
        }
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

const STYLE: &str = "body{font-family:sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin-top:.6rem}\
input{width:100%;padding:.3rem}\
button{margin-top:1rem;padding:.5rem 1rem}\
table{border-collapse:collapse}td,th{border:1px solid #ccc;padding:.3rem .6rem}\
.success{background:#e6f4ea;padding:.6rem}.error{background:#fce8e6;padding:.6rem}\
footer{margin-top:2rem;font-size:.85rem;color:#555}";

fn open_document(html: &mut String, title: &str) {
    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>{STYLE}</style></head><body><h1>{title}</h1>",
        title = escape(title),
    );
}

/// The interactive form page. Only served once the model is loaded.
pub fn form_page(form: &FormConfig, view: &PageView<'_>) -> String {
    let mut html = String::with_capacity(4096);
    open_document(&mut html, &form.title);
    let _ = write!(html, "<p>{}</p>", escape(&form.description));
    html.push_str("<p class=\"success\" id=\"model-status\">Model loaded</p><hr>");

    html.push_str("<form method=\"post\" action=\"/\">");
    for (field, raw) in form.fields.fields().iter().zip(&view.inputs) {
        let _ = write!(
            html,
            "<label for=\"{name}\">{label}</label>\
             <input type=\"number\" id=\"{name}\" name=\"{name}\" value=\"{value}\" step=\"{step}\"",
            name = escape(&field.name),
            label = escape(&field.label),
            value = escape(raw),
            step = field.step,
        );
        if let Some(min) = field.min {
            let _ = write!(html, " min=\"{}\"", min);
        }
        if let Some(max) = field.max {
            let _ = write!(html, " max=\"{}\"", max);
        }
        html.push('>');
    }
    let _ = write!(
        html,
        "<button type=\"submit\">{}</button></form>",
        escape(&form.submit_label)
    );

    if let Some(record) = view.record {
        html.push_str("<h2>Input record</h2><table id=\"record\"><tr>");
        for name in record.names() {
            let _ = write!(html, "<th>{}</th>", escape(name));
        }
        html.push_str("</tr><tr>");
        for value in record.values() {
            let _ = write!(html, "<td>{}</td>", value);
        }
        html.push_str("</tr></table>");
    }

    match &view.outcome {
        Some(Outcome::Prediction(prediction)) => {
            let _ = write!(
                html,
                "<h2>Prediction</h2><p class=\"success\" id=\"prediction\">{}: <strong>{}</strong></p>",
                escape(&form.result_label),
                escape(&form.display.render(prediction.value)),
            );
            if let Some(probabilities) = &prediction.probabilities {
                html.push_str("<ul id=\"probabilities\">");
                for (index, p) in probabilities.indexed() {
                    let _ = write!(
                        html,
                        "<li>Probability of class {}: {}</li>",
                        index,
                        format::probability(p)
                    );
                }
                html.push_str("</ul>");
            }
        }
        Some(Outcome::Error(message)) => {
            let _ = write!(
                html,
                "<h2>Prediction</h2><p class=\"error\" id=\"error\">Prediction failed: {}</p>",
                escape(message)
            );
        }
        None => {}
    }

    if !form.disclaimer.is_empty() {
        let _ = write!(html, "<hr><footer>{}</footer>", escape(&form.disclaimer));
    }
    html.push_str("</body></html>");
    html
}

/// Shown instead of the form when the model could not be loaded.
pub fn fatal_page(title: &str, message: &str) -> String {
    let mut html = String::with_capacity(1024);
    open_document(&mut html, title);
    let _ = write!(
        html,
        "<p class=\"error\" id=\"fatal\">Error: {}</p></body></html>",
        escape(message)
    );
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::prediction::ClassProbabilities;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<b>\"O'Neil\" & co</b>"),
            "&lt;b&gt;&quot;O&#39;Neil&quot; &amp; co&lt;/b&gt;"
        );
    }

    #[test]
    fn test_initial_page_has_form_and_echo() {
        let form = FormConfig::stock_close();
        let record = Record::from_defaults(&form.fields);
        let html = form_page(&form, &PageView::initial(&form, &record));

        assert!(html.contains("<form method=\"post\""));
        assert!(html.contains("name=\"Volume\" value=\"1000000\""));
        assert!(html.contains("<th>Open</th><th>High</th><th>Low</th><th>Volume</th>"));
        assert!(html.contains("id=\"model-status\">Model loaded</p>"));
        assert!(!html.contains("id=\"prediction\""));
    }

    #[test]
    fn test_prediction_with_probabilities() {
        let form = FormConfig::price_signal();
        let record = Record::from_defaults(&form.fields);
        let view = PageView {
            outcome: Some(Outcome::Prediction(Prediction {
                value: 1234.5,
                probabilities: Some(ClassProbabilities {
                    negative: 0.25,
                    positive: 0.75,
                }),
            })),
            ..PageView::initial(&form, &record)
        };
        let html = form_page(&form, &view);

        assert!(html.contains("<strong>$1,234.50</strong>"));
        assert!(html.contains("Probability of class 0: 0.25"));
        assert!(html.contains("Probability of class 1: 0.75"));
        assert!(html.contains("max=\"100\""));
    }

    #[test]
    fn test_error_message_is_escaped() {
        let form = FormConfig::stock_close();
        let view = PageView {
            inputs: vec!["1".to_string(); 4],
            record: None,
            outcome: Some(Outcome::Error("<script>".to_string())),
        };
        let html = form_page(&form, &view);

        assert!(html.contains("Prediction failed: &lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_fatal_page_has_no_form() {
        let html = fatal_page("Stocks", "model file 'model_saham.onnx' not found");

        assert!(html.contains("id=\"fatal\""));
        assert!(html.contains("model_saham.onnx"));
        assert!(!html.contains("<form"));
    }
}
