//! Bulk entry import from an uploaded text file: one comma-separated row per
//! line, `title,body`. Rows whose title already exists in the target blog are
//! skipped, so re-running the same file is a no-op. Inserts are per-row with
//! no surrounding transaction; a malformed row aborts the remainder and
//! everything before it stays committed.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::repo::Entry;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("line {line}: {reason}")]
    BadRow { line: usize, reason: &'static str },
    #[error(transparent)]
    Db(#[from] anyhow::Error),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub created: usize,
    pub skipped: usize,
}

/// Split one line into comma-separated fields. Double quotes group a field
/// that contains commas; a doubled quote inside a quoted field is a literal
/// quote.
pub fn parse_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
    }
    fields.push(current);
    fields
}

pub async fn import_entries(
    db: &PgPool,
    blog_id: Uuid,
    text: &str,
) -> Result<ImportOutcome, ImportError> {
    let mut outcome = ImportOutcome::default();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = parse_row(line);
        let title = row[0].as_str();
        let body = row.get(1).ok_or(ImportError::BadRow {
            line: idx + 1,
            reason: "missing body column",
        })?;

        if Entry::find_by_blog_and_title(db, blog_id, title).await?.is_some() {
            outcome.skipped += 1;
            continue;
        }
        Entry::create(db, blog_id, title, body).await?;
        outcome.created += 1;
    }

    info!(
        %blog_id,
        created = outcome.created,
        skipped = outcome.skipped,
        "bulk import finished"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_row_plain_fields() {
        assert_eq!(parse_row("title1,text1"), vec!["title1", "text1"]);
    }

    #[test]
    fn parse_row_quoted_comma() {
        assert_eq!(
            parse_row("\"a, title\",body text"),
            vec!["a, title", "body text"]
        );
    }

    #[test]
    fn parse_row_doubled_quote_is_literal() {
        assert_eq!(
            parse_row("\"she said \"\"hi\"\"\",body"),
            vec!["she said \"hi\"", "body"]
        );
    }

    #[test]
    fn parse_row_single_field() {
        assert_eq!(parse_row("only-title"), vec!["only-title"]);
    }

    #[test]
    fn parse_row_keeps_empty_trailing_field() {
        assert_eq!(parse_row("title,"), vec!["title", ""]);
    }

    #[test]
    fn bad_row_error_names_the_line() {
        let err = ImportError::BadRow {
            line: 3,
            reason: "missing body column",
        };
        assert_eq!(err.to_string(), "line 3: missing body column");
    }
}
