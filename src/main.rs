use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use topicbus::{config::Settings, logging::init_logging, orchestrator::run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let settings = Settings::load()?;
    let options = settings.run_options();

    println!("Press Enter to begin. Once running, press Enter again to stop.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    lines.next_line().await?;

    let shutdown = CancellationToken::new();
    let runner = tokio::spawn(run(options, shutdown.clone()));

    lines.next_line().await?;
    shutdown.cancel();

    let report = runner.await??;
    tracing::info!(
        published = report.published,
        dropped = report.dropped,
        received = ?report.received,
        "run complete"
    );
    Ok(())
}
