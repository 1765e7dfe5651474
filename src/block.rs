//! Marker-delimited blocks inside user-owned text files.
//!
//! git-shadow only ever edits text between its own markers, so inserting
//! and then removing a block restores the file byte for byte.

/// Start marker prefix.
pub const BLOCK_START: &str = "# BEGIN git-shadow";
/// End marker.
pub const BLOCK_END: &str = "# END git-shadow";
/// Suffix on the start marker of a block whose file git-shadow created.
const OWNED_TAG: &str = " (owned)";

/// Location of a block inside a file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    /// Byte offset of the start marker line.
    start: usize,
    /// Byte offset just past the end marker text, before its newline.
    end: usize,
    owned: bool,
}

/// Result of stripping a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stripped {
    pub content: String,
    /// The block was written into a file git-shadow created.
    pub owned: bool,
}

fn render(body: &str, owned: bool) -> String {
    let tag = if owned { OWNED_TAG } else { "" };
    format!("{}{}\n{}\n{}", BLOCK_START, tag, body.trim_end_matches('\n'), BLOCK_END)
}

fn find(content: &str) -> Option<Span> {
    let mut offset = 0;
    let mut open: Option<(usize, bool)> = None;

    for line in content.split_inclusive('\n') {
        let text = line.trim_end_matches(['\n', '\r']);
        match open {
            None if text.starts_with(BLOCK_START) => {
                open = Some((offset, text.ends_with(OWNED_TAG)));
            }
            Some((start, owned)) if text == BLOCK_END => {
                return Some(Span {
                    start,
                    end: offset + BLOCK_END.len(),
                    owned,
                });
            }
            _ => {}
        }
        offset += line.len();
    }
    None
}

/// Whether `content` carries a complete block.
pub fn contains(content: &str) -> bool {
    find(content).is_some()
}

/// Body text of the block in `content`, if any.
#[cfg(test)]
fn body(content: &str) -> Option<&str> {
    let span = find(content)?;
    let inner = &content[span.start..span.end];
    let first_newline = inner.find('\n')?;
    let body = &inner[first_newline + 1..inner.len() - BLOCK_END.len()];
    Some(body.trim_end_matches('\n'))
}

/// Insert or refresh the block.
///
/// - `None` (no file): `header` followed by an owned block.
/// - Existing block: replaced in place, keeping its ownership.
/// - Otherwise: appended, starting on a fresh line.
pub fn upsert(existing: Option<&str>, header: &str, body: &str) -> String {
    let Some(content) = existing else {
        return format!("{}{}\n", header, render(body, true));
    };

    if let Some(span) = find(content) {
        return format!(
            "{}{}{}",
            &content[..span.start],
            render(body, span.owned),
            &content[span.end..]
        );
    }

    if content.is_empty() || content.ends_with('\n') {
        format!("{}{}\n", content, render(body, false))
    } else {
        format!("{}\n{}", content, render(body, false))
    }
}

/// Remove the block, undoing exactly what `upsert` appended.
///
/// Returns `None` when there is no block.
pub fn strip(content: &str) -> Option<Stripped> {
    let span = find(content)?;
    let after = &content[span.end..];

    let stripped = if let Some(rest) = after.strip_prefix('\n') {
        format!("{}{}", &content[..span.start], rest)
    } else {
        // Block at EOF without a newline: it was appended to a file that
        // had none, so the separator before it is ours too.
        let before = &content[..span.start];
        let before = before.strip_suffix('\n').unwrap_or(before);
        format!("{}{}", before, after)
    };

    Some(Stripped {
        content: stripped,
        owned: span.owned,
    })
}

/// Whether a file holds nothing beyond an interpreter line and blanks.
pub fn is_vacant(content: &str) -> bool {
    content
        .lines()
        .enumerate()
        .all(|(i, line)| line.trim().is_empty() || (i == 0 && line.starts_with("#!")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEBANG: &str = "#!/bin/sh\n";

    #[test]
    fn test_new_file_is_owned() {
        let content = upsert(None, SHEBANG, "git shadow pre-commit");
        assert_eq!(
            content,
            "#!/bin/sh\n# BEGIN git-shadow (owned)\ngit shadow pre-commit\n# END git-shadow\n"
        );

        let stripped = strip(&content).unwrap();
        assert!(stripped.owned);
        assert_eq!(stripped.content, SHEBANG);
        assert!(is_vacant(&stripped.content));
    }

    #[test]
    fn test_append_preserves_existing_lines() {
        let existing = "#!/bin/sh\necho test\n";
        let content = upsert(Some(existing), SHEBANG, "git shadow post-commit");
        assert!(content.starts_with(existing));
        assert!(content.ends_with("git shadow post-commit\n# END git-shadow\n"));

        let stripped = strip(&content).unwrap();
        assert!(!stripped.owned);
        assert_eq!(stripped.content, existing);
    }

    #[test]
    fn test_round_trip_without_trailing_newline() {
        let existing = "foobaz";
        let content = upsert(Some(existing), SHEBANG, "git shadow post-commit");
        assert_eq!(
            content,
            "foobaz\n# BEGIN git-shadow\ngit shadow post-commit\n# END git-shadow"
        );
        assert_eq!(strip(&content).unwrap().content, existing);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let once = upsert(Some("echo a\n"), SHEBANG, "git shadow pre-commit");
        let twice = upsert(Some(&once), SHEBANG, "git shadow pre-commit");
        assert_eq!(once, twice);
        assert_eq!(twice.matches(BLOCK_START).count(), 1);
    }

    #[test]
    fn test_upsert_replaces_body_in_place() {
        let content = "echo a\n# BEGIN git-shadow\nold\n# END git-shadow\necho b\n";
        let updated = upsert(Some(content), SHEBANG, "new");
        assert_eq!(updated, "echo a\n# BEGIN git-shadow\nnew\n# END git-shadow\necho b\n");
        assert_eq!(body(&updated), Some("new"));
    }

    #[test]
    fn test_strip_keeps_lines_after_block() {
        let content = "echo a\n# BEGIN git-shadow\nx\n# END git-shadow\necho b\n";
        assert_eq!(strip(content).unwrap().content, "echo a\necho b\n");
    }

    #[test]
    fn test_strip_without_block() {
        assert!(strip("#!/bin/sh\ngit shadow pre-commit\n").is_none());
        assert!(strip("# BEGIN git-shadow\nunterminated\n").is_none());
    }

    #[test]
    fn test_is_vacant() {
        assert!(is_vacant(""));
        assert!(is_vacant("#!/bin/sh\n\n"));
        assert!(!is_vacant("#!/bin/sh\necho hi\n"));
        assert!(!is_vacant("echo hi"));
    }
}
