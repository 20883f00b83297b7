//! The resolved connection to a finance sheet, and where it is kept between launches.

mod resolver;
mod store;

pub use resolver::{resolve, LinkParams, API_PARAM, SHEET_ID_PARAM};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};

use crate::Result;
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use url::Url;

/// The display identity attached to a session. It is not used for authorization; the remote side
/// trusts whoever holds the endpoint and sheet id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Which remote sheet the client talks to. A `Session` can only be constructed complete: a non-empty
/// user name, an absolute endpoint URL and a non-empty sheet id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: User,
    endpoint: Url,
    /// The endpoint exactly as it was supplied, before URL normalization.
    api_url: String,
    sheet_id: String,
}

impl Session {
    /// # Errors
    /// - Returns an error if the user name or `sheet_id` is blank, or if `endpoint` cannot be a
    ///   base URL (e.g. `mailto:`).
    pub fn new(user: User, endpoint: Url, sheet_id: impl Into<String>) -> Result<Self> {
        let sheet_id = sheet_id.into();
        ensure!(!user.name.trim().is_empty(), "The session user name is empty");
        ensure!(!sheet_id.trim().is_empty(), "The session sheet id is empty");
        ensure!(
            !endpoint.cannot_be_a_base(),
            "The session endpoint '{endpoint}' is not an absolute URL"
        );
        Ok(Self {
            user,
            api_url: endpoint.to_string(),
            endpoint,
            sheet_id,
        })
    }

    /// Like `new` but parses `endpoint`. The string is kept as given for `api_url`.
    pub fn parse(user: User, endpoint: &str, sheet_id: impl Into<String>) -> Result<Self> {
        let url = Url::parse(endpoint)
            .with_context(|| format!("Unable to parse the endpoint '{endpoint}'"))?;
        let mut session = Self::new(user, url, sheet_id)?;
        session.api_url = endpoint.to_string();
        Ok(session)
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// The label shown next to the dashboard, i.e. the user's name.
    pub fn user_label(&self) -> &str {
        &self.user.name
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The endpoint as it was supplied, e.g. `https://example.org` where `endpoint()` gives
    /// `https://example.org/`. This is what gets persisted.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }
}
