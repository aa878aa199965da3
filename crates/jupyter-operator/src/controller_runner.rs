//! Controller runner - builds the JupyterNotebook controller future

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::StreamExt;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client};

use jupyter_common::crd::JupyterNotebook;
use jupyter_notebook::{error_policy, reconcile, Context};

/// Watcher timeout (seconds) - must be less than client read_timeout (30s)
/// This forces the API server to close the watch before the client times out,
/// preventing "body read timed out" errors on idle watches.
pub const WATCH_TIMEOUT_SECS: u32 = 25;

/// Build the JupyterNotebook controller, watching every namespace
pub fn build_notebook_controller(
    client: Client,
    ctx: Arc<Context>,
) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    let notebooks: Api<JupyterNotebook> = Api::all(client);

    tracing::info!("- JupyterNotebook controller");

    Box::pin(
        Controller::new(
            notebooks,
            WatcherConfig::default().timeout(WATCH_TIMEOUT_SECS),
        )
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(log_reconcile_result("JupyterNotebook")),
    )
}

fn log_reconcile_result<T: std::fmt::Debug, E: std::fmt::Debug>(
    controller_name: &'static str,
) -> impl Fn(Result<T, E>) -> std::future::Ready<()> {
    move |result| {
        match result {
            Ok(action) => tracing::debug!(?action, "{} reconciliation completed", controller_name),
            Err(e) => tracing::warn!(error = ?e, "{} reconciliation error", controller_name),
        }
        std::future::ready(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jupyter_common::kube_utils::DEFAULT_READ_TIMEOUT;

    #[test]
    fn watch_closes_before_client_read_timeout() {
        assert!(u64::from(WATCH_TIMEOUT_SECS) < DEFAULT_READ_TIMEOUT.as_secs());
    }
}
