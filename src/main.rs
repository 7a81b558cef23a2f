use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use repoinsight::export::render_markdown;
use repoinsight::export::render_text;
use repoinsight::models::{AnalysisRecord, AnalysisStatus, ExportFormat};
use repoinsight::{
    AnalysisOrchestrator, Config, ExportService, GeminiProvider, GitHubClient, InsightGenerator,
    Store,
};

#[derive(Parser, Debug)]
#[command(name = "repoinsight")]
#[command(version = "0.1.0")]
#[command(about = "Analyze GitHub repositories with AI-generated insights")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a GitHub repository URL
    Analyze {
        /// Repository URL, e.g. https://github.com/octocat/Hello-World
        url: String,
    },

    /// Re-run analysis for an existing record (by id) or URL
    Reanalyze {
        /// Analysis id or repository URL
        target: String,
    },

    /// Show a stored analysis
    Show {
        id: Uuid,

        /// Output format (text, json, markdown)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List stored analyses, newest first
    List {
        /// Filter by status (pending, analyzing, completed, failed)
        #[arg(long)]
        status: Option<String>,

        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Export a completed analysis to a document format (md, txt, pdf, docx)
    Export {
        id: Uuid,

        #[arg(short, long)]
        format: String,
    },

    /// Fetch an exported document, regenerating it if the file is missing
    Download {
        id: Uuid,

        #[arg(short, long)]
        format: String,

        /// Destination path (defaults to a name derived from the repository)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("repoinsight=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = Config::from_env()?;
    let store = Arc::new(Store::new(&config.database_path)?);

    match args.command {
        Command::Analyze { url } => {
            let orchestrator = build_orchestrator(&config, store)?;
            let record = with_spinner("Analyzing repository...", orchestrator.submit(&url)).await?;
            print_outcome(&record);
        }

        Command::Reanalyze { target } => {
            let orchestrator = build_orchestrator(&config, store)?;
            let future = async {
                match Uuid::parse_str(&target) {
                    Ok(id) => orchestrator.reanalyze(id).await,
                    Err(_) => orchestrator.reanalyze_url(&target).await,
                }
            };
            let record = with_spinner("Re-analyzing repository...", future).await?;
            print_outcome(&record);
        }

        Command::Show { id, format } => {
            let record = store
                .get_analysis(&id)?
                .ok_or_else(|| anyhow::anyhow!("No analysis with id {}", id))?;
            let output = match format.as_str() {
                "json" => serde_json::to_string_pretty(&record)?,
                "markdown" => render_markdown(&record),
                _ => render_text(&record),
            };
            println!("{}", output);
        }

        Command::List { status, limit } => {
            let status = match status.as_deref() {
                Some(s) => Some(
                    AnalysisStatus::parse(s)
                        .ok_or_else(|| anyhow::anyhow!("Unknown status filter: {}", s))?,
                ),
                None => None,
            };
            let records = store.list_analyses(status, limit)?;
            if records.is_empty() {
                println!("No analyses stored.");
            }
            for record in records {
                println!(
                    "{}  {:<10} {}  ({})",
                    record.id,
                    record.status,
                    record.full_name(),
                    record.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
        }

        Command::Export { id, format } => {
            let service = ExportService::new(store, &config.export_dir);
            let export = service.export_as(id, &format)?;
            println!(
                "Exported to {} ({} bytes)",
                export.file_path, export.file_size
            );
        }

        Command::Download { id, format, output } => {
            let format = ExportFormat::parse(&format)?;
            let record = store
                .get_analysis(&id)?
                .ok_or_else(|| anyhow::anyhow!("No analysis with id {}", id))?;
            let service = ExportService::new(store, &config.export_dir);
            let (_, bytes) = service.download(id, format)?;

            let path = output.unwrap_or_else(|| ExportService::download_filename(&record, format));
            std::fs::write(&path, &bytes)?;
            println!("Saved {} ({} bytes)", path, bytes.len());
        }
    }

    Ok(())
}

fn build_orchestrator(config: &Config, store: Arc<Store>) -> anyhow::Result<AnalysisOrchestrator> {
    let github = GitHubClient::new(config.github_token.as_deref())?;
    let provider = GeminiProvider::new(
        config.gemini_api_key.clone(),
        Some(config.gemini_model.clone()),
    )?;
    let generator = InsightGenerator::new(Arc::new(provider));
    Ok(AnalysisOrchestrator::new(
        Arc::new(github),
        generator,
        store,
    ))
}

async fn with_spinner<F, T>(message: &str, future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid spinner template"),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));

    let result = future.await;
    spinner.finish_and_clear();
    result
}

fn print_outcome(record: &AnalysisRecord) {
    match record.status {
        AnalysisStatus::Completed => println!("{}", render_text(record)),
        AnalysisStatus::Failed => {
            println!(
                "Analysis {} for {} failed: {}",
                record.id,
                record.full_name(),
                record
                    .error_message
                    .as_deref()
                    .unwrap_or("no error recorded")
            );
        }
        _ => println!(
            "Analysis {} for {} is {}",
            record.id,
            record.full_name(),
            record.status
        ),
    }
}
