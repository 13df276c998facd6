//! Minimal server-side HTML rendering: a page shell plus form widgets.
//! Every user-supplied value passes through [`escape`] before it lands in markup.

use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};

use crate::forms::FormErrors;

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}\n</body></html>",
        escape(title),
        body
    ))
}

/// A 302 with a Location header. `axum::response::Redirect` only offers
/// 303/307/308, and browser form flows here expect a plain Found.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub fn errors_block(errors: &FormErrors) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ul class=\"errorlist\">");
    for (field, message) in errors.iter() {
        out.push_str(&format!(
            "<li>{}: {}</li>",
            escape(field),
            escape(message)
        ));
    }
    out.push_str("</ul>");
    out
}

pub fn form(action: &str, multipart: bool, inner: &str) -> String {
    let enctype = if multipart {
        " enctype=\"multipart/form-data\""
    } else {
        ""
    };
    format!(
        "<form method=\"post\" action=\"{}\"{}>\n{}<button type=\"submit\">Submit</button>\n</form>",
        escape(action),
        enctype,
        inner
    )
}

pub fn text_input(label: &str, name: &str, value: &str) -> String {
    format!(
        "<p><label>{label}: <input type=\"text\" name=\"{name}\" value=\"{value}\"></label></p>\n",
        label = escape(label),
        name = name,
        value = escape(value)
    )
}

pub fn password_input(label: &str, name: &str) -> String {
    format!(
        "<p><label>{}: <input type=\"password\" name=\"{}\"></label></p>\n",
        escape(label),
        name
    )
}

pub fn textarea(label: &str, name: &str, value: &str) -> String {
    format!(
        "<p><label>{}: <textarea name=\"{}\">{}</textarea></label></p>\n",
        escape(label),
        name,
        escape(value)
    )
}

pub fn file_input(label: &str, name: &str, multiple: bool) -> String {
    format!(
        "<p><label>{}: <input type=\"file\" name=\"{}\"{}></label></p>\n",
        escape(label),
        name,
        if multiple { " multiple" } else { "" }
    )
}

pub fn hidden_input(name: &str, value: &str) -> String {
    format!(
        "<input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
        name,
        escape(value)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape("<b>\"it's\" & more</b>"),
            "&lt;b&gt;&quot;it&#x27;s&quot; &amp; more&lt;/b&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn errors_block_lists_every_field() {
        let mut errors = FormErrors::default();
        errors.add("name", "This field is required.");
        errors.add("tags", "This field is required.");
        let html = errors_block(&errors);
        assert!(html.contains("name: This field is required."));
        assert!(html.contains("tags: This field is required."));
    }

    #[test]
    fn errors_block_empty_for_no_errors() {
        assert_eq!(errors_block(&FormErrors::default()), "");
    }

    #[test]
    fn text_input_escapes_value() {
        let html = text_input("Name", "name", "\"><script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&quot;&gt;&lt;script&gt;"));
    }
}
