use clap::Parser;
use color_eyre::Result;
use gymcrm::api::ApiClient;
use gymcrm::app::App;
use gymcrm::config::Config;
use gymcrm::query::{MemoryCache, QueryClient};
use gymcrm::resources::Gym;
use gymcrm::storage::{CredentialStore, LocalStorage, MemoryCredentials};
use gymcrm::toast::Toasts;
use gymcrm::ui::views::Screen;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Log filter, in `RUST_LOG` syntax
const LOG_ENV: &str = "GYMCRM_LOG";

#[derive(Parser, Debug)]
#[command(name = "gymcrm")]
#[command(about = "A terminal console for the GymCRM academy backend")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./gymcrm.yaml, then $XDG_CONFIG_HOME/gymcrm/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Backend base URL, including the /api prefix
  #[arg(short, long)]
  backend_url: Option<String>,

  /// Use this token for the session instead of the stored one
  #[arg(long)]
  token: Option<String>,

  /// Write diagnostics to this file
  #[arg(long)]
  log_file: Option<PathBuf>,

  /// Screen to open first
  #[arg(short, long, value_enum, default_value_t = Screen::Dashboard)]
  screen: Screen,
}

/// The terminal owns stdout, so logs only go to a file.
fn init_logging(path: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
  let Some(path) = path else {
    return Ok(None);
  };

  let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
  if let Some(dir) = dir {
    std::fs::create_dir_all(dir)?;
  }
  let file_name = path
    .file_name()
    .map(|n| n.to_os_string())
    .unwrap_or_else(|| "gymcrm.log".into());
  let appender = tracing_appender::rolling::never(dir.unwrap_or(std::path::Path::new(".")), file_name);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  let log_file = args.log_file.as_ref().or(config.log_file.as_ref());
  let _log_guard = init_logging(log_file)?;

  let backend_url = config.resolve_backend_url(args.backend_url.as_deref());
  info!(backend = %backend_url, "starting gymcrm");

  let credentials: Arc<dyn CredentialStore> = match args.token {
    Some(token) => Arc::new(MemoryCredentials::new(Some(token))),
    None => Arc::new(LocalStorage::open()?),
  };

  let api = ApiClient::new(&backend_url, credentials)?;
  let queries = QueryClient::new(Arc::new(MemoryCache::new()), config.gc_time());
  let (toasts, toast_queue) = Toasts::channel();
  let gym = Gym::new(api, queries, toasts);

  // Initialize and run the app
  let mut app = App::new(gym, toast_queue, &config, args.screen.into());
  app.run().await?;

  Ok(())
}
