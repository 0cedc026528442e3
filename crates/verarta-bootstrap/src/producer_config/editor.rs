//! Line-preserving editor for `key = value` node config files
//!
//! The document keeps the file as raw line segments so that rendering an
//! unmodified document reproduces the input byte for byte, line endings and
//! a missing final newline included.

use std::fmt;

/// Result of [`ConfigDocument::set_first`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    /// The first matching line was rewritten
    Replaced { line: usize, duplicates: usize },
    /// The first matching line already held the canonical text
    Unchanged { line: usize, duplicates: usize },
    /// No line carries the key
    Missing,
}

impl SetOutcome {
    /// Matching lines after the first, which are left alone
    pub fn duplicates(&self) -> usize {
        match self {
            Self::Replaced { duplicates, .. } | Self::Unchanged { duplicates, .. } => *duplicates,
            Self::Missing => 0,
        }
    }
}

/// A config file split into its lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    segments: Vec<String>,
}

impl ConfigDocument {
    pub fn parse(content: &str) -> Self {
        Self {
            segments: content.split('\n').map(str::to_string).collect(),
        }
    }

    /// The key a line assigns, if it is an assignment
    ///
    /// Comments (`#` or `;`) and blank lines assign nothing. A line with no
    /// `=` is a bare key waiting for its value.
    pub fn line_key(line: &str) -> Option<&str> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            return None;
        }
        match trimmed.split_once('=') {
            Some((key, _)) => Some(key.trim()),
            None => Some(trimmed),
        }
    }

    /// Zero-based indices of every line assigning `key`
    pub fn lines_with_key(&self, key: &str) -> Vec<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, line)| Self::line_key(line) == Some(key))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.segments
            .get(index)
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
    }

    /// Rewrite the first line assigning `key` as `key = value`
    ///
    /// Later lines with the same key and all other lines are untouched. A
    /// CRLF line keeps its carriage return.
    pub fn set_first(&mut self, key: &str, value: &str) -> SetOutcome {
        let matches = self.lines_with_key(key);
        let Some(&line) = matches.first() else {
            return SetOutcome::Missing;
        };
        let duplicates = matches.len() - 1;

        let segment = &mut self.segments[line];
        let ending = if segment.ends_with('\r') { "\r" } else { "" };
        let canonical = format!("{key} = {value}{ending}");

        if *segment == canonical {
            SetOutcome::Unchanged { line, duplicates }
        } else {
            *segment = canonical;
            SetOutcome::Replaced { line, duplicates }
        }
    }
}

impl fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const KEY: &str = "signature-provider";

    #[test]
    fn replaces_only_the_first_assignment() {
        let mut doc = ConfigDocument::parse(
            "a = 1\nsignature-provider = OLD\nb = 2\nsignature-provider = OTHER\n",
        );
        let outcome = doc.set_first(KEY, "PUB=KEY:PVT");

        assert_eq!(outcome, SetOutcome::Replaced { line: 1, duplicates: 1 });
        assert_eq!(
            doc.to_string(),
            "a = 1\nsignature-provider = PUB=KEY:PVT\nb = 2\nsignature-provider = OTHER\n"
        );
    }

    #[test]
    fn canonical_line_is_left_alone() {
        let mut doc = ConfigDocument::parse("signature-provider = PUB=KEY:PVT");
        assert_eq!(
            doc.set_first(KEY, "PUB=KEY:PVT"),
            SetOutcome::Unchanged { line: 0, duplicates: 0 }
        );
    }

    #[test]
    fn bare_key_placeholder_is_filled_in() {
        let mut doc =
            ConfigDocument::parse("http-server-address = 0.0.0.0:8888\nsignature-provider\r\n");
        assert_eq!(
            doc.set_first(KEY, "PUB=KEY:PVT"),
            SetOutcome::Replaced { line: 1, duplicates: 0 }
        );
        assert_eq!(
            doc.to_string(),
            "http-server-address = 0.0.0.0:8888\nsignature-provider = PUB=KEY:PVT\r\n"
        );
        assert_eq!(ConfigDocument::line_key("   "), None);
        assert_eq!(ConfigDocument::line_key("# signature-provider"), None);
    }

    #[test]
    fn spacing_variants_are_normalized() {
        let mut doc = ConfigDocument::parse("  signature-provider=PUB=KEY:PVT\n");
        assert_eq!(
            doc.set_first(KEY, "PUB=KEY:PVT"),
            SetOutcome::Replaced { line: 0, duplicates: 0 }
        );
        assert_eq!(doc.to_string(), "signature-provider = PUB=KEY:PVT\n");
    }

    #[test]
    fn comments_and_longer_keys_do_not_match() {
        let mut doc = ConfigDocument::parse(
            "# signature-provider = commented\nsignature-provider-threads = 4\n",
        );
        assert_eq!(doc.set_first(KEY, "X"), SetOutcome::Missing);
    }

    #[test]
    fn crlf_endings_survive() {
        let mut doc = ConfigDocument::parse("a = 1\r\nsignature-provider = OLD\r\n");
        doc.set_first(KEY, "NEW");
        assert_eq!(doc.to_string(), "a = 1\r\nsignature-provider = NEW\r\n");
        assert_eq!(doc.line(1), Some("signature-provider = NEW"));
    }

    #[test]
    fn missing_final_newline_is_kept() {
        let doc = ConfigDocument::parse("a = 1\nb = 2");
        assert_eq!(doc.to_string(), "a = 1\nb = 2");
    }

    fn other_line() -> impl Strategy<Value = String> {
        "[a-z# ;=.:0-9-]{0,30}".prop_filter("must not assign the edited key", |line| {
            ConfigDocument::line_key(line) != Some(KEY)
        })
    }

    proptest! {
        #[test]
        fn other_lines_keep_content_and_order(
            before in prop::collection::vec(other_line(), 0..8),
            after in prop::collection::vec(other_line(), 0..8),
            value in "[A-Za-z0-9=:_]{1,40}",
        ) {
            let mut lines = before.clone();
            lines.push("signature-provider = OLD".to_string());
            lines.extend(after.iter().cloned());
            let mut doc = ConfigDocument::parse(&lines.join("\n"));

            doc.set_first(KEY, &value);
            let rendered = doc.to_string();
            let mut expected = before;
            expected.push(format!("signature-provider = {value}"));
            expected.extend(after);
            prop_assert_eq!(rendered, expected.join("\n"));
        }

        #[test]
        fn setting_twice_is_a_no_op(value in "[A-Za-z0-9=:_]{1,40}") {
            let mut doc = ConfigDocument::parse("x = 1\nsignature-provider = OLD\n");
            doc.set_first(KEY, &value);
            let once = doc.to_string();
            prop_assert_eq!(doc.set_first(KEY, &value).duplicates(), 0);
            prop_assert_eq!(doc.to_string(), once);
        }
    }
}
