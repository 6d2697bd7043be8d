//! Anim'Média - command line front-end for the site's offline core.
//!
//! Runs the resource cache controller against the configured origin and
//! exposes the site's data, agenda and local analytics from a terminal.
//! Local storage and cached responses live under
//! `~/.cache/anim-media`.

mod config;

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, Offset, Utc};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use animmedia_core::agenda::{
    category_icon, category_name, create_ics_content, ics_file_name, recurrence_text, Agenda,
};
use animmedia_core::models::{Event, RegistrationStatus};
use animmedia_core::utils::{format_date_fr, truncate_string};
use animmedia_core::worker::{ClickOutcome, DiskCacheStorage, HttpFetcher, Request, WorkerHandle};
use animmedia_core::{
    spawn_worker, Analytics, Clock, DataService, FileStorage, LocalStorage,
    ResourceCacheController, SmartCache, SystemClock,
};

use config::Config;

// ============================================================================
// Constants
// ============================================================================

/// Subdirectory of the cache directory holding cached responses
const RESPONSES_DIR: &str = "responses";

/// Events listed by `upcoming` when no limit is given
const DEFAULT_UPCOMING_LIMIT: usize = 5;

/// Width of event titles in listings
const TITLE_WIDTH: usize = 40;

const USAGE: &str = "\
Usage: animmedia <command> [args]

Commands:
  init-config          Write the default configuration file
  install              Install and activate the offline cache
  fetch <path>         Fetch a page or asset through the worker
  agenda [category]    List the agenda, optionally for one category
  upcoming [limit]     List upcoming events from the site content
  export-ics <id>      Write an event to an .ics file
  stats                Show analytics for the last 7 days
  clear-cache          Remove the data cache entries
  push [text]          Show the notification a push would display
  click [action]       Resolve a notification click

Set RUST_LOG (e.g. RUST_LOG=debug) for logs on stderr.";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes buffered log lines on drop.
fn init_tracing() -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    match command {
        "-h" | "--help" | "help" => {
            println!("{}", USAGE);
            return Ok(());
        }
        "init-config" => return init_config(),
        _ => {}
    }

    let config = Config::load()?;
    let site = Site::start(config).await?;
    let result = site.run(command, &args[1..]).await;
    site.stop().await;
    result
}

fn init_config() -> Result<()> {
    let config = Config::load()?;
    config.save()?;
    println!("Configuration written for {}", config.origin);
    Ok(())
}

// ============================================================================
// Site session
// ============================================================================

/// Everything one page load has access to: the worker, local storage and
/// the components built on it.
struct Site {
    config: Config,
    worker: WorkerHandle,
    worker_task: JoinHandle<()>,
    clock: Arc<dyn Clock>,
    cache: Arc<SmartCache>,
    analytics: Analytics,
}

impl Site {
    async fn start(config: Config) -> Result<Self> {
        let dir = config.cache_dir()?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let storage: Arc<dyn LocalStorage> = Arc::new(
            FileStorage::open(&dir).context("Failed to open local storage")?,
        );
        let caches = DiskCacheStorage::new(dir.join(RESPONSES_DIR))
            .context("Failed to open response cache")?;
        let fetcher = HttpFetcher::new(config.origin.clone(), config.request_timeout())
            .with_context(|| format!("Invalid origin {}", config.origin))?;

        let controller = ResourceCacheController::new(
            config.worker_settings(),
            Arc::new(fetcher),
            Arc::new(caches),
            Arc::clone(&clock),
        );
        let (worker, worker_task) = spawn_worker(controller);

        let cache = Arc::new(SmartCache::with_name(
            config.cache_name.clone(),
            Arc::clone(&storage),
            Arc::clone(&clock),
        ));
        let analytics = Analytics::new(storage, Arc::clone(&clock), config.page_path.clone());

        info!(origin = %config.origin, "Site session started");
        Ok(Self {
            config,
            worker,
            worker_task,
            clock,
            cache,
            analytics,
        })
    }

    async fn stop(self) {
        if let Err(e) = self.worker.shutdown().await {
            warn!(error = %e, "Worker shutdown failed");
        }
        if let Err(e) = self.worker_task.await {
            warn!(error = %e, "Worker task failed");
        }
    }

    async fn run(&self, command: &str, args: &[String]) -> Result<()> {
        if command != "install" {
            match self.worker.resume().await {
                Ok(true) => {}
                Ok(false) => info!("Offline cache not installed, using the network only"),
                Err(e) => warn!(error = %e, "Could not resume the worker"),
            }
        }

        match command {
            "install" => self.install().await,
            "fetch" => {
                let path = args.first().context("fetch needs a path")?;
                self.fetch(path).await
            }
            "agenda" => self.agenda(args.first().map(String::as_str)).await,
            "upcoming" => {
                let limit = match args.first() {
                    Some(arg) => arg.parse::<usize>().context("limit must be a number")?,
                    None => DEFAULT_UPCOMING_LIMIT,
                };
                self.upcoming(limit).await
            }
            "export-ics" => {
                let id = args
                    .first()
                    .context("export-ics needs an event id")?
                    .parse::<i64>()
                    .context("event id must be a number")?;
                self.export_ics(id).await
            }
            "stats" => self.stats(),
            "clear-cache" => {
                let removed = self.cache.clear();
                println!("Removed {} cache entries", removed);
                Ok(())
            }
            "push" => self.push(args.first().cloned()).await,
            "click" => self.click(args.first().cloned()).await,
            other => anyhow::bail!("Unknown command '{}'\n\n{}", other, USAGE),
        }
    }

    // ===== Worker =====

    async fn install(&self) -> Result<()> {
        let count = self.worker.install().await.context("Install failed")?;
        let deleted = self.worker.activate().await.context("Activation failed")?;

        println!(
            "Installed {} resources in {}",
            count, self.config.cache_version
        );
        for name in deleted {
            println!("Deleted old cache {}", name);
        }
        Ok(())
    }

    async fn fetch(&self, path: &str) -> Result<()> {
        let request = Request::get(path);
        self.analytics.set_page(path);
        self.analytics.track_page_view(path, &format!("{}{}", self.config.origin, path));

        let response = self.worker.fetch(request).await?;
        self.analytics.track_page_leave();

        let response =
            response.with_context(|| format!("{} is unavailable offline", path))?;
        eprintln!(
            "{} {} ({} bytes)",
            response.status,
            response.header("content-type").unwrap_or("-"),
            response.body.len()
        );
        println!("{}", response.text());
        Ok(())
    }

    async fn push(&self, payload: Option<String>) -> Result<()> {
        let notification = self.worker.push(payload).await?;
        println!("{}", serde_json::to_string_pretty(&notification)?);
        Ok(())
    }

    async fn click(&self, action: Option<String>) -> Result<()> {
        match self.worker.notification_click(action).await? {
            ClickOutcome::OpenWindow(url) => println!("Open {}{}", self.config.origin, url),
            ClickOutcome::Dismiss => println!("Dismissed"),
        }
        Ok(())
    }

    // ===== Data =====

    async fn agenda(&self, category: Option<&str>) -> Result<()> {
        let mut agenda = Agenda::load(&self.worker).await?;
        let events = agenda.filter(category.unwrap_or("all"));
        if events.is_empty() {
            println!("No events");
        }
        for event in events {
            print_event(event);
        }
        Ok(())
    }

    async fn upcoming(&self, limit: usize) -> Result<()> {
        let mut service = DataService::new(
            Arc::new(self.worker.clone()),
            Arc::clone(&self.cache),
            Arc::clone(&self.clock),
        );
        if let Err(e) = service.load_all().await {
            warn!(error = %e, "Showing fallback content");
        }

        if let Some(age) = service.content_age() {
            eprintln!("Content fetched {}", age);
        }

        let today = service.today();
        for event in service.upcoming_events(today, Some(limit)) {
            print_event(event);
        }
        Ok(())
    }

    async fn export_ics(&self, id: i64) -> Result<()> {
        let agenda = Agenda::load(&self.worker).await?;
        let event = agenda
            .event(id)
            .with_context(|| format!("No event with id {}", id))?;

        let offset = Local::now().offset().fix();
        let ics = create_ics_content(event, offset, Utc::now())
            .with_context(|| format!("Event {} has no date", id))?;
        let file_name = ics_file_name(event);
        std::fs::write(Path::new(&file_name), ics)
            .with_context(|| format!("Failed to write {}", file_name))?;

        println!("Wrote {}", file_name);
        Ok(())
    }

    fn stats(&self) -> Result<()> {
        match self.analytics.stats() {
            Some(stats) => println!("{}", serde_json::to_string_pretty(&stats)?),
            None => println!("No analytics available"),
        }
        Ok(())
    }
}

fn print_event(event: &Event) {
    let date = event
        .date()
        .map(format_date_fr)
        .unwrap_or_else(|| "Date à définir".to_string());
    let date = match event.recurrence() {
        Some(_) => format!("{} ({})", date, recurrence_text(event)),
        None => date,
    };
    let places = match event.registration_status() {
        RegistrationStatus::Full => "🚫 Complet".to_string(),
        RegistrationStatus::Limited(n) => format!("⚠️ {} places restantes", n),
        RegistrationStatus::Available if event.registration_required => {
            "✅ Places disponibles".to_string()
        }
        RegistrationStatus::Available => "Accès libre".to_string(),
    };
    println!(
        "{:>4}  {:<28} {} {:<width$} [{}] {}",
        event.id,
        date,
        category_icon(&event.category),
        truncate_string(&event.title, TITLE_WIDTH),
        category_name(&event.category),
        places,
        width = TITLE_WIDTH
    );
}
