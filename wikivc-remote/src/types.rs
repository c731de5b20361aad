//! Wire shapes of the service API and their domain-level views.
//!
//! The service wraps everything in one JSON envelope per action. Page query
//! results arrive as a `pages` object keyed by page id, with missing titles
//! under negative keys carrying a `missing` flag, title renames listed
//! under `normalized`, and revision text under the `"*"` key. Raw structs
//! mirror that; conversion functions turn them into the typed views the
//! sync engine consumes, erroring on structurally valid JSON that lacks a
//! required piece.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use wikivc_core::{PageId, PageName, RevisionId, RevisionRecord};

use crate::error::RemoteError;

// ---------------------------------------------------------------------------
// Raw wire structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: Option<ApiErrorPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorPayload {
    pub code: String,
    pub info: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryEnvelope {
    pub query: QueryBody,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueryBody {
    #[serde(default)]
    pub pages: BTreeMap<String, RawPage>,
    #[serde(default)]
    pub normalized: Vec<RawNormalization>,
    #[serde(default)]
    pub categorymembers: Vec<RawCategoryMember>,
    pub userinfo: Option<RawUserInfo>,
}

/// One title rename the service applied to the request.
#[derive(Debug, Deserialize)]
pub(crate) struct RawNormalization {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPage {
    pub pageid: Option<u64>,
    pub title: String,
    pub missing: Option<String>,
    pub edittoken: Option<String>,
    #[serde(default)]
    pub revisions: Vec<RawRevision>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRevision {
    pub revid: u64,
    #[serde(default)]
    pub user: String,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "*")]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCategoryMember {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawUserInfo {
    #[serde(default)]
    pub rights: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EditEnvelope {
    pub edit: RawEdit,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEdit {
    pub result: String,
    pub oldrevid: Option<u64>,
    pub newrevid: Option<u64>,
    pub nochange: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginEnvelope {
    pub login: RawLogin,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawLogin {
    pub result: String,
    pub token: Option<String>,
    pub lgusername: Option<String>,
}

// ---------------------------------------------------------------------------
// Domain views
// ---------------------------------------------------------------------------

/// Snapshot of a remote page at its newest revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBundle {
    pub id: PageId,
    pub name: PageName,
    pub latest: RevisionId,
    /// Full record for `latest`; `content` is always `Some` here.
    pub record: RevisionRecord,
}

/// One entry of a page query: the page, or the fact that the service does
/// not have it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLookup {
    Found(PageBundle),
    Missing { name: PageName },
}

/// Everything a commit needs before submitting: the page's id, an edit
/// token, and the revision the service currently considers newest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditContext {
    pub id: PageId,
    pub token: String,
    pub head: RevisionId,
}

/// One edit submission.
#[derive(Debug, Clone)]
pub struct EditRequest {
    pub name: PageName,
    /// Normalized text (LF, no trailing newline).
    pub text: String,
    pub token: String,
    pub summary: String,
    pub bot: bool,
}

/// What the service did with a submitted edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// A new revision was created on top of `base`.
    Saved { base: RevisionId, new: RevisionId },
    /// The text matched the current revision; nothing was saved.
    NoChange,
}

// ---------------------------------------------------------------------------
// Raw → domain conversions
// ---------------------------------------------------------------------------

impl QueryBody {
    /// Re-key pages under the titles the request used. The service
    /// normalizes titles (capitalization, underscores) and lists the
    /// renames under `normalized`; callers track pages by the name they
    /// asked for.
    pub(crate) fn restore_requested_titles(&mut self) {
        for rename in &self.normalized {
            for page in self.pages.values_mut() {
                if page.title == rename.to {
                    page.title = rename.from.clone();
                }
            }
        }
    }
}

impl RawPage {
    pub(crate) fn into_lookup(self) -> Result<PageLookup, RemoteError> {
        let name = PageName::from(self.title);
        if self.missing.is_some() {
            return Ok(PageLookup::Missing { name });
        }
        let id = self
            .pageid
            .ok_or_else(|| RemoteError::malformed(format!("page {name} has no pageid")))?;
        let rev = self
            .revisions
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::malformed(format!("page {name} has no revisions")))?;
        let timestamp = rev
            .timestamp
            .ok_or_else(|| RemoteError::malformed(format!("revision {} has no timestamp", rev.revid)))?;
        let content = rev
            .content
            .ok_or_else(|| RemoteError::malformed(format!("revision {} has no content", rev.revid)))?;
        Ok(PageLookup::Found(PageBundle {
            id: PageId(id),
            name,
            latest: RevisionId(rev.revid),
            record: RevisionRecord {
                author: rev.user,
                timestamp,
                content: Some(content),
            },
        }))
    }

    pub(crate) fn into_edit_context(self) -> Result<EditContext, RemoteError> {
        let name = PageName::from(self.title);
        if self.missing.is_some() {
            return Err(RemoteError::malformed(format!(
                "page {name} does not exist on the service"
            )));
        }
        let id = self
            .pageid
            .ok_or_else(|| RemoteError::malformed(format!("page {name} has no pageid")))?;
        let token = self
            .edittoken
            .ok_or_else(|| RemoteError::malformed(format!("page {name} has no edit token")))?;
        let head = self
            .revisions
            .first()
            .map(|rev| RevisionId(rev.revid))
            .ok_or_else(|| RemoteError::malformed(format!("page {name} has no head revision")))?;
        Ok(EditContext {
            id: PageId(id),
            token,
            head,
        })
    }
}

impl RawEdit {
    pub(crate) fn into_outcome(self) -> Result<EditOutcome, RemoteError> {
        if self.result != "Success" {
            return Err(RemoteError::Api {
                code: self.result,
                info: "edit was not saved".to_owned(),
            });
        }
        if self.nochange.is_some() {
            return Ok(EditOutcome::NoChange);
        }
        let base = self
            .oldrevid
            .ok_or_else(|| RemoteError::malformed("edit result has no oldrevid"))?;
        let new = self
            .newrevid
            .ok_or_else(|| RemoteError::malformed("edit result has no newrevid"))?;
        Ok(EditOutcome::Saved {
            base: RevisionId(base),
            new: RevisionId(new),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests — fixtures mirror live service payloads
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const QUERY_FIXTURE: &str = r#"{
        "query": {
            "pages": {
                "7": {
                    "pageid": 7,
                    "ns": 0,
                    "title": "Main Page",
                    "touched": "2010-07-09T21:18:23Z",
                    "lastrevid": 12,
                    "counter": 123,
                    "length": 5,
                    "revisions": [
                        {
                            "revid": 12,
                            "parentid": 11,
                            "user": "Alice",
                            "timestamp": "2010-07-09T21:18:23Z",
                            "comment": "tweak",
                            "*": "Hello"
                        }
                    ]
                },
                "-1": {
                    "ns": 0,
                    "title": "No Such Page",
                    "missing": ""
                }
            }
        }
    }"#;

    #[test]
    fn query_fixture_parses_found_and_missing() {
        let envelope: QueryEnvelope = serde_json::from_str(QUERY_FIXTURE).expect("parse");
        let mut lookups: Vec<PageLookup> = envelope
            .query
            .pages
            .into_values()
            .map(|p| p.into_lookup().expect("convert"))
            .collect();
        lookups.sort_by_key(|l| match l {
            PageLookup::Found(b) => b.name.0.clone(),
            PageLookup::Missing { name } => name.0.clone(),
        });

        match &lookups[0] {
            PageLookup::Found(bundle) => {
                assert_eq!(bundle.id, PageId(7));
                assert_eq!(bundle.name, PageName::from("Main Page"));
                assert_eq!(bundle.latest, RevisionId(12));
                assert_eq!(bundle.record.author, "Alice");
                assert_eq!(bundle.record.content.as_deref(), Some("Hello"));
            }
            other => panic!("expected Found, got {other:?}"),
        }
        assert_eq!(
            lookups[1],
            PageLookup::Missing {
                name: PageName::from("No Such Page")
            }
        );
    }

    #[test]
    fn normalized_titles_restore_the_requested_name() {
        let body = r#"{
            "query": {
                "normalized": [
                    {"from": "main page", "to": "Main Page"},
                    {"from": "no such page", "to": "No Such Page"}
                ],
                "pages": {
                    "7": {
                        "pageid": 7,
                        "title": "Main Page",
                        "revisions": [
                            {
                                "revid": 12,
                                "user": "Alice",
                                "timestamp": "2010-07-09T21:18:23Z",
                                "*": "Hello"
                            }
                        ]
                    },
                    "-1": {
                        "ns": 0,
                        "title": "No Such Page",
                        "missing": ""
                    }
                }
            }
        }"#;
        let envelope: QueryEnvelope = serde_json::from_str(body).expect("parse");
        let mut query = envelope.query;
        query.restore_requested_titles();

        let mut lookups: Vec<PageLookup> = query
            .pages
            .into_values()
            .map(|p| p.into_lookup().expect("convert"))
            .collect();
        lookups.sort_by_key(|l| match l {
            PageLookup::Found(b) => b.name.0.clone(),
            PageLookup::Missing { name } => name.0.clone(),
        });

        match &lookups[0] {
            PageLookup::Found(bundle) => assert_eq!(bundle.name, PageName::from("main page")),
            other => panic!("expected Found, got {other:?}"),
        }
        assert_eq!(
            lookups[1],
            PageLookup::Missing {
                name: PageName::from("no such page")
            }
        );
    }

    #[test]
    fn token_fixture_parses_edit_context() {
        let body = r#"{
            "query": {
                "pages": {
                    "7": {
                        "pageid": 7,
                        "title": "Main Page",
                        "lastrevid": 12,
                        "edittoken": "abc123+\\",
                        "revisions": [{"revid": 12}]
                    }
                }
            }
        }"#;
        let envelope: QueryEnvelope = serde_json::from_str(body).expect("parse");
        let page = envelope.query.pages.into_values().next().expect("one page");
        let ctx = page.into_edit_context().expect("convert");
        assert_eq!(ctx.id, PageId(7));
        assert_eq!(ctx.token, "abc123+\\");
        assert_eq!(ctx.head, RevisionId(12));
    }

    #[test]
    fn page_without_content_is_malformed_for_pull() {
        let body = r#"{
            "query": {
                "pages": {
                    "7": {
                        "pageid": 7,
                        "title": "Main Page",
                        "revisions": [{"revid": 12, "timestamp": "2010-07-09T21:18:23Z"}]
                    }
                }
            }
        }"#;
        let envelope: QueryEnvelope = serde_json::from_str(body).expect("parse");
        let page = envelope.query.pages.into_values().next().expect("one page");
        let err = page.into_lookup().unwrap_err();
        assert!(matches!(err, RemoteError::Malformed { .. }), "got: {err}");
    }

    #[test]
    fn edit_saved_outcome() {
        let body = r#"{"edit":{"result":"Success","pageid":7,"title":"Main Page","oldrevid":12,"newrevid":13}}"#;
        let envelope: EditEnvelope = serde_json::from_str(body).expect("parse");
        assert_eq!(
            envelope.edit.into_outcome().expect("outcome"),
            EditOutcome::Saved {
                base: RevisionId(12),
                new: RevisionId(13)
            }
        );
    }

    #[test]
    fn edit_nochange_outcome() {
        let body = r#"{"edit":{"result":"Success","pageid":7,"title":"Main Page","nochange":""}}"#;
        let envelope: EditEnvelope = serde_json::from_str(body).expect("parse");
        assert_eq!(envelope.edit.into_outcome().expect("outcome"), EditOutcome::NoChange);
    }

    #[test]
    fn edit_failure_result_is_api_error() {
        let body = r#"{"edit":{"result":"Failure"}}"#;
        let envelope: EditEnvelope = serde_json::from_str(body).expect("parse");
        let err = envelope.edit.into_outcome().unwrap_err();
        assert!(matches!(err, RemoteError::Api { .. }), "got: {err}");
    }

    #[test]
    fn error_envelope_detects_service_errors() {
        let body = r#"{"error":{"code":"badtoken","info":"Invalid token","*":"docs"}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(body).expect("parse");
        let payload = envelope.error.expect("error present");
        assert_eq!(payload.code, "badtoken");
        assert_eq!(payload.info, "Invalid token");
    }

    #[test]
    fn category_members_parse() {
        let body = r#"{
            "query": {
                "categorymembers": [
                    {"pageid": 1, "ns": 0, "title": "Alpha"},
                    {"pageid": 2, "ns": 0, "title": "Beta"}
                ]
            }
        }"#;
        let envelope: QueryEnvelope = serde_json::from_str(body).expect("parse");
        let titles: Vec<String> = envelope
            .query
            .categorymembers
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn userinfo_rights_parse() {
        let body = r#"{"query":{"userinfo":{"id":5,"name":"Alice","rights":["read","edit","apihighlimits"]}}}"#;
        let envelope: QueryEnvelope = serde_json::from_str(body).expect("parse");
        let info = envelope.query.userinfo.expect("userinfo");
        assert!(info.rights.iter().any(|r| r == "apihighlimits"));
    }

    #[test]
    fn need_token_login_parses() {
        let body = r#"{"login":{"result":"NeedToken","token":"t0k3n","cookieprefix":"wiki","sessionid":"s"}}"#;
        let envelope: LoginEnvelope = serde_json::from_str(body).expect("parse");
        assert_eq!(envelope.login.result, "NeedToken");
        assert_eq!(envelope.login.token.as_deref(), Some("t0k3n"));
    }
}
