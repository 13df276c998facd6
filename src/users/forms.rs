use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::forms::FormErrors;

pub const NAME_MAX_LEN: usize = 24;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[\w.@+-]+$").unwrap();
    }
    username.len() <= 150 && USERNAME_RE.is_match(username)
}

fn name_errors(errors: &mut FormErrors, field: &'static str, value: &str) {
    if value.chars().count() > NAME_MAX_LEN {
        errors.add(field, format!("Ensure this value has at most {} characters.", NAME_MAX_LEN));
    }
}

/// Profile edits arrive as multipart (the avatar is a file input), so the
/// name fields are validated separately from a deserialized struct.
pub fn validate_profile(first_name: &str, last_name: &str) -> FormErrors {
    let mut errors = FormErrors::default();
    name_errors(&mut errors, "first_name", first_name);
    name_errors(&mut errors, "last_name", last_name);
    errors
}

impl RegisterForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        let username = self.username.trim();

        if username.is_empty() {
            errors.add("username", "This field is required.");
        } else if !is_valid_username(username) {
            errors.add(
                "username",
                "Enter a valid username: letters, digits and @/./+/-/_ only.",
            );
        }

        if self.password1.is_empty() {
            errors.add("password1", "This field is required.");
        } else {
            if self.password1.len() < 8 {
                errors.add("password1", "Password must contain at least 8 characters.");
            }
            if self.password1.chars().all(|c| c.is_ascii_digit()) {
                errors.add("password1", "Password cannot be entirely numeric.");
            }
        }

        if self.password2 != self.password1 {
            errors.add("password2", "The two password fields didn't match.");
        }

        name_errors(&mut errors, "first_name", self.first_name.trim());
        name_errors(&mut errors, "last_name", self.last_name.trim());

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> RegisterForm {
        RegisterForm {
            username: "testUser_4".into(),
            password1: "1X<ISRUkw+tuK".into(),
            password2: "1X<ISRUkw+tuK".into(),
            first_name: "Name".into(),
            last_name: "Surname".into(),
        }
    }

    fn messages_for(errors: &FormErrors, field: &str) -> Vec<String> {
        errors
            .iter()
            .filter(|(f, _)| *f == field)
            .map(|(_, m)| m.to_string())
            .collect()
    }

    #[test]
    fn valid_registration_passes() {
        assert!(valid_form().validate().is_empty());
    }

    #[test]
    fn username_is_required() {
        let mut form = valid_form();
        form.username = "  ".into();
        let errors = form.validate();
        assert!(!messages_for(&errors, "username").is_empty());
    }

    #[test]
    fn username_rejects_invalid_characters() {
        let mut form = valid_form();
        form.username = "bad name!".into();
        let errors = form.validate();
        assert!(messages_for(&errors, "username")[0].contains("valid username"));
    }

    #[test]
    fn password_confirmation_must_match() {
        let mut form = valid_form();
        form.password2 = "different-password".into();
        let errors = form.validate();
        assert!(messages_for(&errors, "password2")[0].contains("didn't match"));
    }

    #[test]
    fn short_password_rejected() {
        let mut form = valid_form();
        form.password1 = "abc1".into();
        form.password2 = "abc1".into();
        let errors = form.validate();
        assert!(messages_for(&errors, "password1")[0].contains("at least 8"));
    }

    #[test]
    fn numeric_password_rejected() {
        let mut form = valid_form();
        form.password1 = "1234567890".into();
        form.password2 = "1234567890".into();
        let errors = form.validate();
        assert!(messages_for(&errors, "password1")[0].contains("entirely numeric"));
    }

    #[test]
    fn names_are_optional_but_bounded() {
        let mut form = valid_form();
        form.first_name = String::new();
        form.last_name = String::new();
        assert!(form.validate().is_empty());

        form.first_name = "x".repeat(NAME_MAX_LEN + 1);
        let errors = form.validate();
        assert!(!messages_for(&errors, "first_name").is_empty());
    }
}
