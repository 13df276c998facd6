use axum::extract::Multipart;
use serde::Deserialize;

use crate::forms::{FormData, FormErrors, UploadedFile};

#[derive(Debug, Deserialize)]
pub struct BlogForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: String,
}

impl BlogForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        if self.name.trim().is_empty() {
            errors.add("name", "This field is required.");
        }
        if self.tags.trim().is_empty() {
            errors.add("tags", "This field is required.");
        }
        errors
    }
}

/// Entry create/edit submission: title and body plus any number of image
/// uploads sharing one description.
#[derive(Debug)]
pub struct EntryForm {
    pub title: String,
    pub body_text: String,
    pub description: String,
    pub files: Vec<UploadedFile>,
}

impl EntryForm {
    pub async fn read(multipart: Multipart) -> anyhow::Result<Self> {
        let data = FormData::read(multipart).await?;
        Ok(Self {
            title: data.text("title").to_string(),
            body_text: data.text("body_text").to_string(),
            description: data.text("description").to_string(),
            files: data.files("file").cloned().collect(),
        })
    }

    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        if self.title.trim().is_empty() {
            errors.add("title", "This field is required.");
        }
        if self.body_text.trim().is_empty() {
            errors.add("body_text", "This field is required.");
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blog_form_requires_name_and_tags() {
        let form = BlogForm {
            name: "blog_name".into(),
            tags: "tag1, tag2".into(),
        };
        assert!(form.validate().is_empty());

        let form = BlogForm {
            name: "incorrect_blog".into(),
            tags: String::new(),
        };
        let errors = form.validate();
        let fields: Vec<_> = errors.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["tags"]);
    }

    #[test]
    fn blog_form_rejects_whitespace_only() {
        let form = BlogForm {
            name: "   ".into(),
            tags: "\t".into(),
        };
        let errors = form.validate();
        assert_eq!(errors.iter().count(), 2);
    }

    #[test]
    fn entry_form_requires_title_and_body() {
        let form = EntryForm {
            title: String::new(),
            body_text: String::new(),
            description: String::new(),
            files: Vec::new(),
        };
        let errors = form.validate();
        let fields: Vec<_> = errors.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["title", "body_text"]);
    }

    #[test]
    fn entry_form_files_and_description_are_optional() {
        let form = EntryForm {
            title: "title1".into(),
            body_text: "text1".into(),
            description: String::new(),
            files: Vec::new(),
        };
        assert!(form.validate().is_empty());
    }
}
