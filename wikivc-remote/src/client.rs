//! Blocking HTTP client for the service API.
//!
//! Every action is one `POST` of an url-encoded form to the single
//! configured `api.php` endpoint, with `format=json` appended. Calls are
//! strictly sequential; the client carries the persisted cookie session and
//! a lazily probed rate-limit tier, nothing else.

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::DeserializeOwned;

use wikivc_core::{PageName, RevisionId};

use crate::error::RemoteError;
use crate::session::SessionStore;
use crate::types::{
    EditContext, EditEnvelope, EditOutcome, EditRequest, ErrorEnvelope, LoginEnvelope, PageBundle,
    PageLookup, QueryEnvelope, RawPage,
};

/// Most titles one page query may carry; callers chunk longer lists.
pub const TITLE_BATCH: usize = 25;

const USER_AGENT: &str = concat!("wikivc/", env!("CARGO_PKG_VERSION"));
const TIMEOUT: Duration = Duration::from_secs(30);
const RVPROP: &str = "ids|flags|timestamp|user|comment|content";

// ---------------------------------------------------------------------------
// Service trait
// ---------------------------------------------------------------------------

/// The operations the sync engine needs from the content service.
///
/// Implemented by [`Client`] over HTTP, and by in-memory fakes in engine
/// tests.
pub trait ContentService {
    /// Look up at most [`TITLE_BATCH`] pages by name. Each requested title
    /// comes back as exactly one [`PageLookup`], found or missing, keyed by
    /// the requested name even when the service normalizes the title.
    fn page_bundles(&mut self, names: &[PageName]) -> Result<Vec<PageLookup>, RemoteError>;

    /// Fetch one revision by id, with full content.
    fn revision_bundle(&mut self, revision: RevisionId) -> Result<PageBundle, RemoteError>;

    /// Fetch an edit token together with the service's current head revision
    /// for the page, in one query.
    fn edit_context(&mut self, name: &PageName) -> Result<EditContext, RemoteError>;

    /// Submit an edit. The service validates the token and an md5 checksum
    /// of the text.
    fn submit_edit(&mut self, request: &EditRequest) -> Result<EditOutcome, RemoteError>;

    /// Titles of all pages in a category.
    fn category_members(&mut self, category: &str) -> Result<Vec<PageName>, RemoteError>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// HTTP implementation of [`ContentService`].
pub struct Client {
    agent: ureq::Agent,
    api_url: String,
    session: SessionStore,
    high_limits: Option<bool>,
}

impl Client {
    /// Build a client for `api_url`, loading the cookie session stored at
    /// `session_path` (an absent file means an anonymous session).
    pub fn new(api_url: impl Into<String>, session_path: PathBuf) -> Result<Client, RemoteError> {
        Ok(Client {
            agent: ureq::AgentBuilder::new().timeout(TIMEOUT).build(),
            api_url: api_url.into(),
            session: SessionStore::load(session_path)?,
            high_limits: None,
        })
    }

    /// Log in, following the service's token handshake: a first attempt
    /// answered with `NeedToken` is repeated once carrying the token. The
    /// session cookies land in the store as a side effect.
    pub fn log_in(&mut self, username: &str, password: &str) -> Result<String, RemoteError> {
        let first: LoginEnvelope = self.call(&[
            ("action", "login"),
            ("lgname", username),
            ("lgpassword", password),
        ])?;
        let login = if first.login.result == "NeedToken" {
            let token = first
                .login
                .token
                .ok_or_else(|| RemoteError::malformed("NeedToken response without token"))?;
            let second: LoginEnvelope = self.call(&[
                ("action", "login"),
                ("lgname", username),
                ("lgpassword", password),
                ("lgtoken", &token),
            ])?;
            second.login
        } else {
            first.login
        };
        if login.result != "Success" {
            return Err(RemoteError::Login {
                result: login.result,
            });
        }
        Ok(login.lgusername.unwrap_or_else(|| username.to_owned()))
    }

    /// `high` when the session holds the `apihighlimits` right, else `low`.
    /// Probed once per client and remembered.
    fn query_limit(&mut self, low: u32, high: u32) -> Result<u32, RemoteError> {
        if self.high_limits.is_none() {
            let envelope: QueryEnvelope =
                self.call(&[("action", "query"), ("meta", "userinfo"), ("uiprop", "rights")])?;
            let rights = envelope
                .query
                .userinfo
                .map(|info| info.rights)
                .unwrap_or_default();
            self.high_limits = Some(rights.iter().any(|r| r == "apihighlimits"));
        }
        Ok(if self.high_limits == Some(true) {
            high
        } else {
            low
        })
    }

    /// POST one action and parse the response as `T`.
    ///
    /// Error payloads take precedence over the typed parse, and any cookies
    /// the response sets are persisted before returning.
    fn call<T: DeserializeOwned>(&mut self, params: &[(&str, &str)]) -> Result<T, RemoteError> {
        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("format", "json"));

        let cookies = self.session.cookie_header();
        let mut request = self
            .agent
            .post(&self.api_url)
            .set("User-Agent", USER_AGENT);
        if let Some(header) = &cookies {
            request = request.set("Cookie", header);
        }

        let action = params.first().map(|(_, value)| *value).unwrap_or("?");
        tracing::debug!("api call: action={action}");

        let response = request.send_form(&form).map_err(|e| RemoteError::Transport {
            source: Box::new(e),
        })?;
        if self.session.absorb(&response) {
            self.session.save()?;
        }

        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(RemoteError::Body)?;

        let envelope: ErrorEnvelope = serde_json::from_str(&body)?;
        if let Some(payload) = envelope.error {
            tracing::debug!("service error: {} ({})", payload.info, payload.code);
            if is_permission_code(&payload.code) {
                return Err(RemoteError::PermissionDenied {
                    code: payload.code,
                    info: payload.info,
                });
            }
            return Err(RemoteError::Api {
                code: payload.code,
                info: payload.info,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl ContentService for Client {
    fn page_bundles(&mut self, names: &[PageName]) -> Result<Vec<PageLookup>, RemoteError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let titles: Vec<&str> = names.iter().map(|n| n.0.as_str()).collect();
        let joined = titles.join("|");
        let envelope: QueryEnvelope = self.call(&[
            ("action", "query"),
            ("titles", &joined),
            ("prop", "info|revisions"),
            ("rvprop", RVPROP),
        ])?;
        let mut query = envelope.query;
        query.restore_requested_titles();
        query
            .pages
            .into_values()
            .map(RawPage::into_lookup)
            .collect()
    }

    fn revision_bundle(&mut self, revision: RevisionId) -> Result<PageBundle, RemoteError> {
        let revids = revision.to_string();
        let envelope: QueryEnvelope = self.call(&[
            ("action", "query"),
            ("revids", &revids),
            ("prop", "info|revisions"),
            ("rvprop", RVPROP),
        ])?;
        let page = envelope
            .query
            .pages
            .into_values()
            .next()
            .ok_or_else(|| RemoteError::malformed(format!("revision {revision} not found")))?;
        match page.into_lookup()? {
            PageLookup::Found(bundle) => Ok(bundle),
            PageLookup::Missing { name } => Err(RemoteError::malformed(format!(
                "page {name} reported missing for revision {revision}"
            ))),
        }
    }

    fn edit_context(&mut self, name: &PageName) -> Result<EditContext, RemoteError> {
        let envelope: QueryEnvelope = self.call(&[
            ("action", "query"),
            ("titles", &name.0),
            ("prop", "info|revisions"),
            ("intoken", "edit"),
            ("rvprop", "ids"),
        ])?;
        let page = envelope
            .query
            .pages
            .into_values()
            .next()
            .ok_or_else(|| RemoteError::malformed(format!("no result for page {name}")))?;
        page.into_edit_context()
    }

    fn submit_edit(&mut self, request: &EditRequest) -> Result<EditOutcome, RemoteError> {
        let checksum = format!("{:x}", md5::compute(request.text.as_bytes()));
        let mut params: Vec<(&str, &str)> = vec![
            ("action", "edit"),
            ("title", &request.name.0),
            ("text", &request.text),
            ("token", &request.token),
            ("md5", &checksum),
            ("summary", &request.summary),
        ];
        if request.bot {
            params.push(("bot", "1"));
        }
        let envelope: EditEnvelope = self.call(&params)?;
        envelope.edit.into_outcome()
    }

    fn category_members(&mut self, category: &str) -> Result<Vec<PageName>, RemoteError> {
        let limit = self.query_limit(500, 5000)?.to_string();
        let cmtitle = category_title(category);
        let envelope: QueryEnvelope = self.call(&[
            ("action", "query"),
            ("list", "categorymembers"),
            ("cmtitle", &cmtitle),
            ("cmlimit", &limit),
        ])?;
        Ok(envelope
            .query
            .categorymembers
            .into_iter()
            .map(|member| PageName::from(member.title))
            .collect())
    }
}

/// `Foo` → `Category:Foo`; an already qualified name passes through.
fn category_title(category: &str) -> String {
    if category.starts_with("Category:") {
        category.to_owned()
    } else {
        format!("Category:{category}")
    }
}

fn is_permission_code(code: &str) -> bool {
    matches!(
        code,
        "permissiondenied"
            | "protectedpage"
            | "protectednamespace"
            | "protectednamespace-interface"
            | "cascadeprotected"
            | "noedit"
            | "noedit-anon"
            | "writeapidenied"
            | "blocked"
    )
}
