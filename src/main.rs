// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap (usage/--version exit here)
// 2. Validate them into Settings; bad exclusion URLs or selectors are fatal
// 3. Wire up the collaborators: renderer, snapshot store, contactor channel
// 4. Hand everything to the scheduler and scan until done or Ctrl-C
// 5. Exit with proper code (0 = success, 2 = error)
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;       // src/cli.rs - command-line parsing
mod config;    // src/config.rs - validated settings and exclusions
mod crawl;     // src/crawl/ - website traversal
mod diff;      // src/diff/ - change detection
mod notify;    // src/notify/ - change alerts
mod render;    // src/render/ - page loading
mod schedule;  // src/schedule.rs - repeating scans
mod store;     // src/store/ - snapshots on disk
mod telemetry; // src/telemetry.rs - logging setup

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use cli::{Cli, RendererKind};
use config::Settings;
use crawl::Crawler;
use notify::{ContactorChannel, LogNotifier, Notifier};
use render::{HttpRenderer, Renderer};
use schedule::Scheduler;
use std::sync::Arc;
use store::FsSnapshotStore;

#[tokio::main]
async fn main() {
    // clap prints usage and exits by itself on bad arguments, --help, --version
    let cli = Cli::parse_args();
    telemetry::init_telemetry();

    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_cli(cli).context("invalid configuration")?;
    settings.log_effective();

    let notifier: Arc<dyn Notifier> = match &settings.contactor {
        Some(address) => Arc::new(ContactorChannel::spawn(address.clone())),
        None => Arc::new(LogNotifier),
    };

    let store = Arc::new(FsSnapshotStore::new(&settings.save_dir));
    tracing::debug!("snapshots are kept under {}", store.root().display());

    let renderer = open_renderer(&settings).await?;

    let crawler = Crawler::new(
        store,
        notifier,
        Arc::new(settings.exclusions),
        settings.hostname,
        settings.navigation_timeout,
    );
    let scheduler = Scheduler::new(renderer.clone(), crawler, settings.target, settings.interval);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let scans = scheduler.run_forever(shutdown).await;
    tracing::debug!("{} scan(s) completed", scans);

    renderer.shutdown().await;
    Ok(())
}

// The browser (or HTTP client) lives for the whole process
async fn open_renderer(settings: &Settings) -> Result<Arc<dyn Renderer>> {
    match settings.renderer {
        RendererKind::Http => {
            let renderer = HttpRenderer::new(settings.navigation_timeout)?;
            Ok(Arc::new(renderer))
        }
        #[cfg(feature = "headless")]
        RendererKind::Headless => {
            let renderer =
                render::HeadlessRenderer::launch(&settings.user_data_dir, settings.navigation_timeout)
                    .await
                    .context("cannot launch the headless browser")?;
            Ok(Arc::new(renderer))
        }
        #[cfg(not(feature = "headless"))]
        RendererKind::Headless => {
            anyhow::bail!("this build has no headless renderer, rebuild with --features headless")
        }
    }
}
