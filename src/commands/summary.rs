use crate::api::Mode;
use crate::commands::{next_summary, render, Out, SummaryView, MISSING_SESSION_HELP};
use crate::dashboard::Dashboard;
use crate::session::LinkParams;
use crate::{Config, Result};
use anyhow::bail;
use std::time::Duration;
use url::Url;

/// Opens the dashboard, waits for the first fetch of the month-to-date summary and prints it.
///
/// # Errors
/// - When there is no connection, either from `link` or saved.
/// - When the first fetch does not succeed in time.
pub async fn summary(config: Config, link: Option<&str>, mode: Mode) -> Result<Out<SummaryView>> {
    let mut dashboard = open(&config, link, mode)?;
    let mut updates = dashboard.subscribe();
    let Some(summary) = next_summary(&mut updates, wait(&config)).await else {
        dashboard.close();
        bail!("Unable to fetch the summary, see the log for the reason");
    };
    let view = SummaryView {
        sheet_id: dashboard.session().sheet_id().to_string(),
        chart: dashboard.chart(&summary),
        summary,
    };
    dashboard.close();
    Ok(Out::new(render(&view), view))
}

/// Resolves the session and starts the engine, or explains how to connect.
pub(super) fn open(config: &Config, link: Option<&str>, mode: Mode) -> Result<Dashboard> {
    let url: Option<Url> = link.map(LinkParams::parse_link).transpose()?;
    match Dashboard::launch(config, url.as_ref(), mode)? {
        Some(dashboard) => Ok(dashboard),
        None => bail!("{MISSING_SESSION_HELP}"),
    }
}

/// How long to wait for a fetch: the request timeout plus a little slack.
pub(super) fn wait(config: &Config) -> Duration {
    config.request_timeout() + Duration::from_secs(1)
}
