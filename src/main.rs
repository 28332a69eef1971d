use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod classify;
mod config;
mod dashboard;
mod format;
mod ingest;
mod location;
mod models;
mod page;
mod report;
mod reset;
mod sample;
mod selection;
mod suggestions;

use config::DashboardConfig;
use location::Route;
use models::{Category, Recommendation, Report, Timeframe};
use page::OutputFormat;
use reset::{FormEvent, ResetBackend, ResetError, ResetPage, ResetSession, SimulatedBackend};
use selection::{
    ReportEvent, ReportViewState, StatsEvent, StatsViewState, SuggestionsEvent,
    SuggestionsViewState,
};

#[derive(Parser)]
#[command(name = "visibility-dashboard")]
#[command(about = "AI visibility dashboard: stats, weekly reports, recommendations", long_about = None)]
struct Cli {
    /// Output format for the rendered page
    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown, global = true)]
    format: OutputFormat,
    /// Write the page to a file instead of stdout
    #[arg(long, global = true)]
    out: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the stats dashboard
    Stats {
        #[arg(long, value_enum)]
        timeframe: Option<Timeframe>,
    },
    /// Show a weekly report (0 is the most recent)
    Report {
        #[arg(long)]
        index: Option<usize>,
        /// JSON file with reports; defaults to VISIBILITY_REPORTS_JSON or built-in samples
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Show recommendations by category
    Suggestions {
        #[arg(long, value_enum)]
        tab: Option<Category>,
        #[arg(long)]
        id: Option<String>,
        /// CSV file with recommendations; defaults to VISIBILITY_RECOMMENDATIONS_CSV or built-in samples
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Complete a password reset from an emailed link
    ResetPassword {
        /// Link location, e.g. /reset-password?token=...
        #[arg(long)]
        location: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
        #[arg(long)]
        show_password: bool,
        #[arg(long)]
        show_confirm: bool,
    },
    /// Open a dashboard location such as /suggestions?id=3
    Open { location: String },
}

struct Output<'a> {
    format: OutputFormat,
    out: Option<&'a Path>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_reports(data: Option<PathBuf>, config: &DashboardConfig) -> anyhow::Result<Vec<Report>> {
    match data.or_else(|| config.reports_path.clone()) {
        Some(path) => ingest::load_reports(&path)
            .with_context(|| format!("failed to load reports from {}", path.display())),
        None => Ok(sample::reports()),
    }
}

fn load_recommendations(
    data: Option<PathBuf>,
    config: &DashboardConfig,
) -> anyhow::Result<Vec<Recommendation>> {
    match data.or_else(|| config.recommendations_path.clone()) {
        Some(path) => ingest::load_recommendations(&path)
            .with_context(|| format!("failed to load recommendations from {}", path.display())),
        None => Ok(sample::recommendations()),
    }
}

fn show_stats(timeframe: Option<Timeframe>, output: &Output) -> anyhow::Result<()> {
    let mut state = StatsViewState::new();
    if let Some(timeframe) = timeframe {
        state.apply(StatsEvent::SelectTimeframe(timeframe));
    }
    let page = dashboard::build_stats_page(&state, &sample::stats(state.timeframe));
    page::emit(&page, output.format, output.out)
}

fn show_report(index: Option<usize>, reports: &[Report], output: &Output) -> anyhow::Result<()> {
    let mut state = ReportViewState::new(reports.len())?;
    if let Some(index) = index {
        state.apply(ReportEvent::SelectReport(index))?;
    }
    let page = report::build_report_page(&state, reports)?;
    page::emit(&page, output.format, output.out)
}

fn show_suggestions(
    tab: Option<Category>,
    id: Option<&str>,
    catalog: &[Recommendation],
    output: &Output,
) -> anyhow::Result<()> {
    let mut state = SuggestionsViewState::new();
    if let Some(tab) = tab {
        state.apply(SuggestionsEvent::SelectTab(tab), catalog)?;
    }
    if let Some(id) = id {
        state.focus_param(id, catalog)?;
    }
    let page = suggestions::build_suggestions_page(&state, catalog);
    page::emit(&page, output.format, output.out)
}

enum ResetView {
    Open(ResetSession),
    Rejected(ResetPage),
}

fn open_reset(token: Option<&str>, config: &DashboardConfig) -> anyhow::Result<ResetView> {
    let backend: Arc<dyn ResetBackend> = Arc::new(SimulatedBackend::new(config.reset_delay));
    match ResetSession::open(token, backend, config.reset_timeout) {
        Ok(session) => Ok(ResetView::Open(session)),
        Err(ResetError::LinkRejected(gate)) => {
            info!(?gate, "reset link rejected");
            Ok(ResetView::Rejected(ResetPage::InvalidLink { gate }))
        }
        Err(err) => Err(err.into()),
    }
}

struct ResetInput {
    password: String,
    confirm: String,
    show_password: bool,
    show_confirm: bool,
}

async fn run_reset(
    token: Option<&str>,
    input: ResetInput,
    config: &DashboardConfig,
    output: &Output<'_>,
) -> anyhow::Result<()> {
    let mut session = match open_reset(token, config)? {
        ResetView::Open(session) => session,
        ResetView::Rejected(page) => return page::emit(&page, output.format, output.out),
    };

    session.dispatch(FormEvent::EditPassword(input.password))?;
    session.dispatch(FormEvent::EditConfirm(input.confirm))?;
    if input.show_password {
        session.dispatch(FormEvent::TogglePasswordVisibility)?;
    }
    if input.show_confirm {
        session.dispatch(FormEvent::ToggleConfirmVisibility)?;
    }
    session.dispatch(FormEvent::Submit)?;
    session.settle().await?;

    page::emit(&reset::build_reset_page(&session), output.format, output.out)
}

fn open_location(location: &str, config: &DashboardConfig, output: &Output) -> anyhow::Result<()> {
    let route = location::parse_location(location)?;
    info!(location, ?route, "opening location");

    match route {
        Route::Stats { timeframe } => show_stats(timeframe, output),
        Route::Reports { index } => show_report(index, &load_reports(None, config)?, output),
        Route::Suggestions { tab, id } => show_suggestions(
            tab,
            id.as_deref(),
            &load_recommendations(None, config)?,
            output,
        ),
        Route::ResetPassword { token } => match open_reset(token.as_deref(), config)? {
            ResetView::Open(session) => {
                page::emit(&reset::build_reset_page(&session), output.format, output.out)
            }
            ResetView::Rejected(page) => page::emit(&page, output.format, output.out),
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = DashboardConfig::from_env().context("invalid dashboard configuration")?;
    let output = Output {
        format: cli.format,
        out: cli.out.as_deref(),
    };

    match cli.command {
        Commands::Stats { timeframe } => show_stats(timeframe, &output)?,
        Commands::Report { index, data } => {
            let reports = load_reports(data, &config)?;
            show_report(index, &reports, &output)?;
        }
        Commands::Suggestions { tab, id, data } => {
            let catalog = load_recommendations(data, &config)?;
            show_suggestions(tab, id.as_deref(), &catalog, &output)?;
        }
        Commands::ResetPassword {
            location,
            password,
            confirm,
            show_password,
            show_confirm,
        } => {
            let token = match location::parse_location(&location)? {
                Route::ResetPassword { token } => token,
                _ => anyhow::bail!("{location} is not a password reset link"),
            };
            let input = ResetInput {
                password,
                confirm,
                show_password,
                show_confirm,
            };
            run_reset(token.as_deref(), input, &config, &output).await?;
        }
        Commands::Open { location } => open_location(&location, &config, &output)?,
    }

    Ok(())
}
