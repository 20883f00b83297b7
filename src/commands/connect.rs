use crate::commands::{Out, SessionInfo, MISSING_SESSION_HELP};
use crate::session::{self, LinkParams, Session, SessionStore};
use crate::{Config, Result};
use anyhow::{bail, Context};
use tracing::debug;

/// Resolves the connection carried by `link` and saves it, replacing any saved connection.
///
/// # Errors
/// - When `link` does not parse, or does not carry both `api` and `sheetId`.
/// - When the connection cannot be saved.
pub async fn connect(config: &Config, link: &str) -> Result<Out<SessionInfo>> {
    let url = LinkParams::parse_link(link)?;
    let Some(params) = LinkParams::from_url(&url) else {
        bail!(
            "The link must carry both '{}' and '{}' query parameters",
            session::API_PARAM,
            session::SHEET_ID_PARAM
        );
    };
    Session::parse(config.default_user(), params.api(), params.sheet_id())
        .context("The 'api' parameter in the link is not a usable endpoint")?;

    let store = config.session_store();
    let Some(session) = session::resolve(Some(&url), &store, &config.default_user())? else {
        bail!("{MISSING_SESSION_HELP}");
    };

    debug!("Saved the connection to {}", store.path().display());
    let info = SessionInfo::from(&session);
    Ok(Out::new(
        format!(
            "Connected as {} to sheet {} at {}",
            info.user, info.sheet_id, info.endpoint
        ),
        info,
    ))
}

/// Shows the saved connection, if any.
pub async fn show_session(config: &Config) -> Result<Out<SessionInfo>> {
    let store = config.session_store();
    match store.get()? {
        Some(session) => {
            let info = SessionInfo::from(&session);
            Ok(Out::new(
                format!(
                    "{} <{}>\n  Sheet:    {}\n  Endpoint: {}",
                    info.user, info.email, info.sheet_id, info.endpoint
                ),
                info,
            ))
        }
        None => Ok(Out::new_message(MISSING_SESSION_HELP)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_connect_then_show() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).await.unwrap();

        let out = connect(
            &config,
            "https://miniappshare.netlify.app/?api=https%3A%2F%2Fexample.org%2Fexec&sheetId=S1",
        )
        .await
        .unwrap();
        let info = out.structure().unwrap();
        assert_eq!(info.sheet_id, "S1");
        assert_eq!(info.endpoint, "https://example.org/exec");
        assert_eq!(info.user, "Quản trị viên");
        assert!(config.session_path().is_file());

        let shown = show_session(&config).await.unwrap();
        assert_eq!(shown.structure().unwrap().sheet_id, "S1");
    }

    #[tokio::test]
    async fn test_connect_bare_query() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).await.unwrap();
        let out = connect(&config, "?api=https://example.org/exec&sheetId=S2")
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().sheet_id, "S2");
    }

    #[tokio::test]
    async fn test_connect_missing_param() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).await.unwrap();
        let result = connect(&config, "https://miniappshare.netlify.app/?sheetId=S1").await;
        assert!(result.is_err());
        assert!(!config.session_path().exists());
    }

    #[tokio::test]
    async fn test_connect_unusable_endpoint_keeps_saved() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).await.unwrap();
        connect(&config, "?api=https://example.org/exec&sheetId=S1")
            .await
            .unwrap();
        let result = connect(&config, "?api=not-a-url&sheetId=S9").await;
        assert!(result.is_err());
        let shown = show_session(&config).await.unwrap();
        assert_eq!(shown.structure().unwrap().sheet_id, "S1");
    }

    #[tokio::test]
    async fn test_show_without_session() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).await.unwrap();
        let out = show_session(&config).await.unwrap();
        assert!(out.structure().is_none());
        assert!(out.message().starts_with("Missing connection information"));
    }
}
