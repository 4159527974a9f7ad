use autodash::{DashError, DashboardConfig, Session, Value, render_tui};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Filter, summarize and page through used-car listings.", long_about = None)]
struct Args {
    #[arg(short = 'p', long = "path", required = true)]
    path: PathBuf,

    /// JSON file overriding column names, extraction rules and page size.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Only listings whose name starts with this brand.
    #[arg(long)]
    brand: Option<String>,

    /// Fuel types to keep (repeatable). Defaults to all.
    #[arg(long = "fuel")]
    fuels: Vec<String>,

    /// Transmissions to keep (repeatable). Defaults to all.
    #[arg(long = "transmission")]
    transmissions: Vec<String>,

    /// Print the summary of the filtered listings as JSON and exit.
    #[arg(long)]
    json: bool,

    /// Write the filtered listings to this CSV file and exit.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print this page of the filtered listings as CSV and exit.
    #[arg(long)]
    page: Option<usize>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn interactive(&self) -> bool {
        !self.json && self.export.is_none() && self.page.is_none()
    }
}

/// Logs go to stderr. Nothing is installed for the interactive dashboard,
/// which owns the terminal.
fn init_logging(level: &str, enabled: bool) {
    if !enabled {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), DashError> {
    let args = Args::parse();
    init_logging(&args.log_level, !args.interactive());

    let config = match &args.config {
        Some(path) => DashboardConfig::from_path(path)?,
        None => DashboardConfig::default(),
    };
    let mut session = Session::open(&args.path, config)?;

    session.selection.brand = args.brand.clone();
    if !args.fuels.is_empty() {
        session.selection.fuels = args.fuels.iter().map(|f| Value::text(f.as_str())).collect();
    }
    if !args.transmissions.is_empty() {
        session.selection.transmissions = args
            .transmissions
            .iter()
            .map(|t| Value::text(t.as_str()))
            .collect();
    }

    if args.interactive() {
        return render_tui(&mut session);
    }

    if let Some(path) = &args.export {
        let rows = session.export_csv(path)?;
        tracing::info!("Wrote {} filtered listings to {}", rows, path.display());
    }
    if let Some(page) = args.page {
        session.page(page)?.write_csv(std::io::stdout())?;
    }
    if args.json {
        let summary = session.summary()?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
