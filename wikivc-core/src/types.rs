//! Domain types for the wikivc working copy.
//!
//! All persisted types are serializable/deserializable via serde; filesystem
//! paths never appear here, only name/id newtypes and their transforms.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed remote page name, exactly as the service spells it
/// (spaces and slashes included, e.g. `Talk:Main Page` or `Project/Notes`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageName(pub String);

impl PageName {
    /// Working-file stem for this page: `' '` becomes `'_'`, `'/'` becomes `'!'`.
    ///
    /// The `.wiki` extension is not part of the transform; callers append it.
    pub fn to_filename(&self) -> String {
        self.0.replace(' ', "_").replace('/', "!")
    }

    /// Inverse of [`PageName::to_filename`]: `'!'` becomes `'/'`, then `'_'`
    /// becomes `' '`.
    ///
    /// Page names containing a literal `'_'` or `'!'` do not round-trip; this
    /// matches the service's own title conventions and is a known limitation.
    pub fn from_filename(stem: &str) -> Self {
        Self(stem.replace('!', "/").replace('_', " "))
    }
}

impl fmt::Display for PageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PageName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PageName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed remote page id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PageId(pub u64);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for PageId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// A strongly-typed revision id. Ids are service-assigned and increase
/// monotonically per page, so `Ord` gives chronological order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RevisionId(pub u64);

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for RevisionId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

// ---------------------------------------------------------------------------
// Persisted records
// ---------------------------------------------------------------------------

/// Index entry for one tracked page: its remote id and the last revision
/// the working copy was synchronized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: PageId,
    pub last_revision: RevisionId,
}

/// One cached revision of a page.
///
/// `content` is `None` for metadata-only entries, recorded when a revision is
/// known to exist but its text has not round-tripped through the service yet.
/// Callers must re-fetch before treating such an entry as a baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub author: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

// ---------------------------------------------------------------------------
// Text normalization
// ---------------------------------------------------------------------------

/// Canonical form of page text: LF line endings, no trailing newline.
///
/// Both sides of every content comparison go through this, as does text sent
/// to the service. Working files get a single trailing newline appended back
/// on write.
pub fn normalize_text(text: &str) -> String {
    let unix = text.replace("\r\n", "\n");
    match unix.strip_suffix('\n') {
        Some(stripped) => stripped.to_owned(),
        None => unix,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn newtype_display() {
        assert_eq!(PageName::from("Main Page").to_string(), "Main Page");
        assert_eq!(PageId(7).to_string(), "7");
        assert_eq!(RevisionId(12).to_string(), "12");
    }

    #[rstest]
    #[case("Main Page", "Main_Page")]
    #[case("Talk:Main Page", "Talk:Main_Page")]
    #[case("Project/Notes", "Project!Notes")]
    #[case("A b/C d", "A_b!C_d")]
    #[case("Plain", "Plain")]
    fn pagename_to_filename(#[case] name: &str, #[case] stem: &str) {
        assert_eq!(PageName::from(name).to_filename(), stem);
    }

    #[rstest]
    #[case("Main_Page")]
    #[case("Talk:Main_Page")]
    #[case("Project!Notes")]
    #[case("A_b!C_d")]
    #[case("Plain")]
    fn filename_roundtrips(#[case] stem: &str) {
        let name = PageName::from_filename(stem);
        assert_eq!(name.to_filename(), stem);
    }

    #[rstest]
    #[case("Main Page")]
    #[case("Project/Notes")]
    #[case("Talk:Main Page/Archive 1")]
    fn pagename_roundtrips_without_literal_specials(#[case] name: &str) {
        let n = PageName::from(name);
        assert_eq!(PageName::from_filename(&n.to_filename()), n);
    }

    #[test]
    fn revision_ids_order_numerically() {
        let mut ids = vec![RevisionId(10), RevisionId(2), RevisionId(1)];
        ids.sort();
        assert_eq!(ids, vec![RevisionId(1), RevisionId(2), RevisionId(10)]);
    }

    #[rstest]
    #[case("Hello\n", "Hello")]
    #[case("Hello", "Hello")]
    #[case("Hello\r\nWorld\r\n", "Hello\nWorld")]
    #[case("Hello\n\n", "Hello\n")]
    #[case("", "")]
    fn normalize_text_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_text(input), expected);
    }

    #[test]
    fn revision_record_serde_roundtrip() {
        let rec = RevisionRecord {
            author: "Alice".to_owned(),
            timestamp: Utc::now(),
            content: Some("Hello".to_owned()),
        };
        let json = serde_json::to_string(&rec).expect("serialize");
        let back: RevisionRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, rec);
    }

    #[test]
    fn metadata_only_record_omits_content_key() {
        let rec = RevisionRecord {
            author: "Alice".to_owned(),
            timestamp: Utc::now(),
            content: None,
        };
        let json = serde_json::to_string(&rec).expect("serialize");
        assert!(!json.contains("content"));
    }
}
