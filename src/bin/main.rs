//! kubectl-reach CLI

use kubectl_reach::cli::Cli;
use kubectl_reach::{Error, Orchestrator, ProbeReport, Result};
use tokio_util::compat::TokioAsyncWriteCompatExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries only the probe output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kubectl_reach=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse_from_env();

    let code = match run(cli).await {
        Ok(report) => {
            tracing::debug!(container = %report.container, "Done");
            0
        }
        Err(err) => {
            report_error(&err);
            err.exit_code()
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<ProbeReport> {
    let target = cli.target()?;
    let (client, namespace) = cli.cluster_options().connect().await?;
    let request = cli.probe_request(&namespace, target)?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, canceling probe");
            trigger.cancel();
        }
    });

    let mut stdout = tokio::io::stdout().compat_write();
    Orchestrator::new(client)
        .run(&request, &mut stdout, &cancel)
        .await
}

fn report_error(err: &Error) {
    eprintln!("Error: {err}");

    if let Error::ProbeIncomplete { container, .. } = err {
        eprintln!(
            "Note: ephemeral container {container:?} remains on the pod; \
             ephemeral containers cannot be removed without recreating the pod."
        );
    }
}
