use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::models::search::SearchResult;
use crate::state::PopupView;

const UNTITLED: &str = "Untitled";

fn display_title(result: &SearchResult) -> &str {
    if result.title.trim().is_empty() {
        UNTITLED
    } else {
        &result.title
    }
}

/// Popup results panel as an HTML fragment. Every piece of result text is escaped.
pub fn render_html(view: &PopupView) -> String {
    match view {
        PopupView::Idle => String::new(),
        PopupView::Loading { .. } => r#"<div class="loading">Searching...</div>"#.to_string(),
        PopupView::NoResults => r#"<div class="no-results">No results found</div>"#.to_string(),
        PopupView::Error { message } => {
            format!(r#"<div class="error">Error: {}</div>"#, encode_text(message))
        }
        PopupView::Results { results } => results
            .iter()
            .enumerate()
            .map(|(index, result)| render_result_html(index, result))
            .collect(),
    }
}

fn render_result_html(index: usize, result: &SearchResult) -> String {
    format!(
        concat!(
            r#"<div class="result-item" data-index="{index}" data-url="{url_attr}">"#,
            r#"<div class="result-title">{title}</div>"#,
            r#"<div class="result-url">{url}</div>"#,
            r#"<div class="result-snippet">{snippet}</div>"#,
            "</div>"
        ),
        index = index,
        url_attr = encode_double_quoted_attribute(&result.url),
        title = encode_text(display_title(result)),
        url = encode_text(&result.url),
        snippet = encode_text(&result.snippet),
    )
}

pub fn render_text(view: &PopupView) -> String {
    match view {
        PopupView::Idle => String::new(),
        PopupView::Loading { query } => format!("Searching for \"{query}\"..."),
        PopupView::NoResults => "No results found".to_string(),
        PopupView::Error { message } => format!("Error: {message}"),
        PopupView::Results { results } => {
            let mut out = String::new();
            for (index, result) in results.iter().enumerate() {
                if index > 0 {
                    out.push('\n');
                }
                out.push_str(&format!("{}. {}\n", index + 1, display_title(result)));
                out.push_str(&format!("   {}\n", result.url));
                if let Some(score) = result.score {
                    out.push_str(&format!("   score: {score:.3}\n"));
                }
                out.push_str(&format!("   {}\n", result.snippet));
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str, title: &str, snippet: &str) -> SearchResult {
        SearchResult {
            url: url.to_string(),
            title: title.to_string(),
            snippet: snippet.to_string(),
            score: None,
        }
    }

    #[test]
    fn result_markup_escapes_untrusted_text() {
        let view = PopupView::Results {
            results: vec![result(
                "https://evil.example/?q=\" onmouseover=\"alert(1)",
                "<img src=x onerror=alert(1)>",
                "<script>alert(1)</script>",
            )],
        };
        let html = render_html(&view);
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<img"));
        assert!(!html.contains(r#"data-url="https://evil.example/?q=" "#));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn results_keep_received_order() {
        let view = PopupView::Results {
            results: vec![
                result("https://b.example", "B", "second"),
                result("https://a.example", "A", "first"),
            ],
        };
        let html = render_html(&view);
        let b = html.find("https://b.example").unwrap();
        let a = html.find("https://a.example").unwrap();
        assert!(b < a);
        assert_eq!(html.matches("class=\"result-item\"").count(), 2);
    }

    #[test]
    fn empty_title_renders_as_untitled() {
        let view = PopupView::Results {
            results: vec![result("https://a.example", "", "x")],
        };
        assert!(render_html(&view).contains(">Untitled<"));
        assert!(render_text(&view).starts_with("1. Untitled"));
    }

    #[test]
    fn status_views() {
        assert!(render_html(&PopupView::Loading {
            query: "q".to_string()
        })
        .contains("Searching..."));
        assert!(render_html(&PopupView::NoResults).contains("No results found"));

        let error = render_html(&PopupView::Error {
            message: "Search request failed (HTTP 500)".to_string(),
        });
        assert!(error.contains("class=\"error\""));
        assert!(error.contains("HTTP 500"));
        assert!(!error.contains("result-item"));
        assert_eq!(render_html(&PopupView::Idle), "");
    }

    #[test]
    fn text_rendering_numbers_results() {
        let view = PopupView::Results {
            results: vec![result(
                "https://shop.example/help",
                "shop.example",
                "Refunds within 30 days",
            )],
        };
        let text = render_text(&view);
        assert!(text.starts_with("1. shop.example\n"));
        assert!(text.contains("Refunds within 30 days"));
    }
}
