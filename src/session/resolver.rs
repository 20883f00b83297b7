//! Decides which session a launch uses.
//!
//! Link parameters always win over the stored session and replace it. If the link does not carry
//! both parameters the stored session is used, and if there is none the session is absent.

use crate::session::{Session, SessionStore, User};
use crate::Result;
use anyhow::Context;
use tracing::{debug, info, warn};
use url::Url;

/// The navigation parameter carrying the URL-encoded API endpoint.
pub const API_PARAM: &str = "api";

/// The navigation parameter carrying the sheet identifier.
pub const SHEET_ID_PARAM: &str = "sheetId";

/// Connection parameters taken from a navigation link, already percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkParams {
    api: String,
    sheet_id: String,
}

impl LinkParams {
    /// Extracts `api` and `sheetId` from the query of `url`. Returns `None` unless both are present
    /// and non-empty. When a parameter repeats, the first occurrence is used.
    pub fn from_url(url: &Url) -> Option<Self> {
        let mut api = None;
        let mut sheet_id = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                API_PARAM if api.is_none() => api = Some(value.into_owned()),
                SHEET_ID_PARAM if sheet_id.is_none() => sheet_id = Some(value.into_owned()),
                _ => {}
            }
        }
        match (api, sheet_id) {
            (Some(api), Some(sheet_id)) if !api.is_empty() && !sheet_id.is_empty() => {
                Some(Self { api, sheet_id })
            }
            _ => None,
        }
    }

    /// Parses a link as typed by a user. Accepts a full URL or a bare query such as
    /// `?api=...&sheetId=...`.
    pub fn parse_link(link: &str) -> Result<Url> {
        let link = link.trim();
        match Url::parse(link) {
            Ok(url) => Ok(url),
            Err(_) => {
                let base = Url::parse("http://localhost/").context("Invalid base URL")?;
                let query = link.trim_start_matches('?');
                base.join(&format!("?{query}"))
                    .with_context(|| format!("Unable to parse the link '{link}'"))
            }
        }
    }

    pub fn api(&self) -> &str {
        &self.api
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }
}

/// Resolves the session for this launch.
///
/// # Arguments
/// - `link` - The navigation URL the app was opened with, if any.
/// - `store` - Where a previously resolved session was kept. Written when the link is used.
/// - `default_user` - The display identity given to sessions created from a link.
///
/// # Errors
/// - Returns an error only if persisting a link-supplied session fails. An unreadable store is
///   logged and treated as empty.
pub fn resolve(
    link: Option<&Url>,
    store: &dyn SessionStore,
    default_user: &User,
) -> Result<Option<Session>> {
    if let Some(params) = link.and_then(LinkParams::from_url) {
        match Session::parse(default_user.clone(), params.api(), params.sheet_id()) {
            Ok(session) => {
                store
                    .put(&session)
                    .context("Unable to persist the session from the link")?;
                info!(
                    "Connected to sheet {} at {}",
                    session.sheet_id(),
                    session.endpoint()
                );
                return Ok(Some(session));
            }
            Err(e) => warn!("Ignoring the connection parameters in the link: {e:#}"),
        }
    }

    match store.get() {
        Ok(Some(session)) => {
            debug!("Using the stored session for sheet {}", session.sheet_id());
            Ok(Some(session))
        }
        Ok(None) => {
            debug!("No session in the link or the store");
            Ok(None)
        }
        Err(e) => {
            warn!("Unable to read the stored session: {e:#}");
            Ok(None)
        }
    }
}
