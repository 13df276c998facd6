//! Shared form plumbing: field-level error collection and a multipart reader
//! that splits a submission into text fields and uploaded files.

use axum::extract::Multipart;
use bytes::Bytes;

/// Field errors collected during validation, rendered back into the form.
#[derive(Debug, Default)]
pub struct FormErrors(Vec<(&'static str, String)>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub body: Bytes,
}

/// A fully buffered multipart submission. Parts with a filename become
/// [`UploadedFile`]s; everything else is kept as a text field. Browsers send
/// an empty filename for a file input left blank, so those parts are dropped.
#[derive(Debug, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
    files: Vec<(String, UploadedFile)>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> anyhow::Result<Self> {
        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name() {
                Some(filename) if !filename.is_empty() => {
                    let filename = filename.to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let body = field.bytes().await?;
                    form.files.push((
                        name,
                        UploadedFile {
                            filename,
                            content_type,
                            body,
                        },
                    ));
                }
                _ => {
                    let value = field.text().await?;
                    form.fields.push((name, value));
                }
            }
        }
        Ok(form)
    }

    /// The first value submitted under `name`, or the empty string.
    pub fn text(&self, name: &str) -> &str {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    /// Every file submitted under `name`, in submission order.
    pub fn files<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a UploadedFile> + 'a {
        self.files
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, f)| f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_form() -> FormData {
        FormData {
            fields: vec![
                ("title".into(), "hello".into()),
                ("body_text".into(), "world".into()),
            ],
            files: vec![
                (
                    "file".into(),
                    UploadedFile {
                        filename: "a.png".into(),
                        content_type: "image/png".into(),
                        body: Bytes::from_static(b"a"),
                    },
                ),
                (
                    "file".into(),
                    UploadedFile {
                        filename: "b.png".into(),
                        content_type: "image/png".into(),
                        body: Bytes::from_static(b"b"),
                    },
                ),
            ],
        }
    }

    #[test]
    fn text_returns_value_or_empty() {
        let form = sample_form();
        assert_eq!(form.text("title"), "hello");
        assert_eq!(form.text("missing"), "");
    }

    #[test]
    fn files_filters_by_field_name() {
        let form = sample_form();
        let names: Vec<_> = form.files("file").map(|f| f.filename.clone()).collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
        assert_eq!(form.files("other").count(), 0);
    }

    #[test]
    fn form_errors_accumulate_in_order() {
        let mut errors = FormErrors::default();
        assert!(errors.is_empty());
        errors.add("title", "This field is required.");
        errors.add("body_text", "This field is required.");
        let collected: Vec<_> = errors.iter().collect();
        assert_eq!(collected[0].0, "title");
        assert_eq!(collected[1].0, "body_text");
    }
}
