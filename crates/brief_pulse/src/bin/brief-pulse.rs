use std::path::PathBuf;

use brief_datastore::{JobStore, SqliteJobStore};
use brief_pulse::{
    acquire::ytdlp::{FfmpegCli, YtDlp},
    openai::OpenAIClient,
    tracing::init_tracing_subscriber,
    JobProcessorBuilder,
};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "brief-pulse", about = "Checkpointed video briefing pipeline")]
struct Cli {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://brief-pulse.db")]
    database_url: String,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY")]
    openai_key: String,

    /// Path to a cookies file passed through to yt-dlp
    #[arg(long, env = "YTDLP_COOKIES_PATH")]
    cookies_path: Option<PathBuf>,

    /// Audio chunk duration for transcription in seconds
    #[arg(long, default_value = "900")]
    chunk_duration: u16,

    /// Working directory for audio, transcript and report artifacts
    #[arg(long, env = "BRIEF_PULSE_WORKDIR", default_value = "/var/tmp/brief-pulse")]
    workdir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a video URL and process it to completion
    Process { url: String },
    /// Resume an existing job at its first incomplete stage
    Resume { job_id: i64 },
    /// List all jobs and their status
    List,
}

async fn process_job(cli: &Cli, store: SqliteJobStore, job_id: i64) -> anyhow::Result<()> {
    let ytdlp = YtDlp::new_with_cookies(cli.cookies_path.clone());
    let openai = OpenAIClient::new(&cli.openai_key, FfmpegCli::new());

    let processor = JobProcessorBuilder::new(&cli.workdir)
        .store(store.clone())
        .fetcher(ytdlp)
        .transcriber(openai.clone())
        .summarizer(openai)
        .with_chunking(cli.chunk_duration)
        .build();

    processor.process(job_id).await?;

    if let Some(job) = store.get_job(job_id).await? {
        if let Some(report) = job.report_filename {
            println!("Report: {report}");
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let store = SqliteJobStore::init(&cli.database_url).await?;

    match &cli.command {
        Command::Process { url } => {
            let job = store.insert_job(url).await?;
            tracing::info!(job_id = job.id, %url, "Processing job...");
            process_job(&cli, store, job.id).await?;
        }
        Command::Resume { job_id } => {
            tracing::info!(job_id, "Resuming job...");
            process_job(&cli, store, *job_id).await?;
        }
        Command::List => {
            for job in store.list_jobs().await? {
                println!(
                    "#{}\t{}\t{}\t{}",
                    job.id,
                    job.status,
                    job.title.as_deref().unwrap_or("<untitled>"),
                    job.source_url,
                );
                if let Some(error) = job.error_message {
                    println!("\terror: {error}");
                }
            }
        }
    }

    Ok(())
}
