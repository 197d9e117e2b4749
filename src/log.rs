//! The branch overview printed when no edit is requested.

use crate::git::{FIELD_SEPARATOR, RECORD_SEPARATOR};
use crate::style::{Paint, Role};

/// Body line that links a commit to its code review.
const REVISION_PREFIX: &str = "Differential Revision: ";

/// One commit as shown in the overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub short_id: String,
    pub author: String,
    pub subject: String,

    /// Message body with the review line removed.
    pub body: String,

    /// Value of the `Differential Revision:` line, if present.
    pub revision: Option<String>,
}

impl LogEntry {
    /// The first word of the author's name.
    pub fn first_name(&self) -> &str {
        self.author.split_whitespace().next().unwrap_or("")
    }
}

/// Parse the output of [`crate::git::Git::log`]. Order is preserved.
pub fn parse(raw: &str) -> Vec<LogEntry> {
    raw.split(RECORD_SEPARATOR)
        .filter_map(|record| {
            let mut fields = record.trim_start_matches('\n').split(FIELD_SEPARATOR);
            let short_id = fields.next()?.trim();
            let author = fields.next()?;
            let subject = fields.next()?.trim_end_matches('\n');
            let (revision, body) = split_revision(fields.next().unwrap_or(""));
            if short_id.is_empty() {
                return None;
            }
            Some(LogEntry {
                short_id: short_id.to_string(),
                author: author.to_string(),
                subject: subject.to_string(),
                body,
                revision,
            })
        })
        .collect()
}

/// Pull the review line out of a message body.
fn split_revision(body: &str) -> (Option<String>, String) {
    let mut revision = None;
    let mut rest = Vec::new();
    for line in body.lines() {
        match line.strip_prefix(REVISION_PREFIX) {
            Some(url) if revision.is_none() && !url.trim().is_empty() => {
                revision = Some(url.trim().to_string());
            }
            _ => rest.push(line),
        }
    }
    (revision, rest.join("\n").trim().to_string())
}

/// Render newest-first entries, numbering each by its distance from the tip.
pub fn render(entries: &[LogEntry], paint: &dyn Paint) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(offset, entry)| {
            let mut number = paint.paint(Role::Offset, &offset.to_string());
            if offset <= 9 {
                number.insert(0, ' ');
            }
            let fields = [
                format!("{number} "),
                paint.paint(Role::Hash, &entry.short_id),
                paint.paint(Role::Revision, entry.revision.as_deref().unwrap_or("")),
                paint.paint(Role::Author, entry.first_name()),
                entry.subject.clone(),
            ];
            fields
                .into_iter()
                .filter(|field| !field.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
