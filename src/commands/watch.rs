use crate::api::Mode;
use crate::commands::summary::open;
use crate::commands::{render, Out, SummaryView};
use crate::{Config, Result};
use std::future::Future;
use tracing::{info, warn};

/// Keeps the dashboard running and prints the summary every time it is replaced, until Ctrl-C.
pub async fn watch(config: Config, link: Option<&str>, mode: Mode) -> Result<Out<usize>> {
    let stop = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await
        }
    };
    watch_until(&config, link, mode, stop).await
}

/// Runs until `stop` completes. The structured output is the number of summaries printed.
pub(super) async fn watch_until(
    config: &Config,
    link: Option<&str>,
    mode: Mode,
    stop: impl Future<Output = ()>,
) -> Result<Out<usize>> {
    let mut dashboard = open(config, link, mode)?;
    let mut updates = dashboard.subscribe();
    info!(
        "Watching sheet {}, press Ctrl-C to stop",
        dashboard.session().sheet_id()
    );

    tokio::pin!(stop);
    let mut printed = 0;
    loop {
        tokio::select! {
            _ = &mut stop => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let summary = updates.borrow_and_update().clone();
                let view = SummaryView {
                    sheet_id: dashboard.session().sheet_id().to_string(),
                    chart: dashboard.chart(&summary),
                    summary,
                };
                info!("{}", render(&view));
                printed += 1;
            }
        }
    }

    dashboard.close();
    Ok(Out::new("Stopped watching", printed))
}
