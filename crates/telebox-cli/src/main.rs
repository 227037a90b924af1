use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use telebox_api_client::{ApiClient, HistoryStore, SelectedFile, SubmitError, UploadForm};
use telebox_cli::{format_history_line, format_outcome, init_tracing};

#[derive(Parser)]
#[command(name = "telebox")]
#[command(about = "Send photos to Telegram through a TeleBox relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload images in one batch
    Upload {
        /// Image files to send
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Caption attached to the first image
        #[arg(short, long)]
        caption: Option<String>,
    },
    /// Show or edit the local upload history
    History {
        #[command(subcommand)]
        command: Option<HistoryCommands>,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// Delete one entry by its number in the listing
    Delete { number: usize },
    /// Delete every entry
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let history = HistoryStore::open_default()?;

    match cli.command {
        Commands::Upload { files, caption } => upload(files, caption, history).await?,
        Commands::History { command } => match command {
            None => list_history(&history).await?,
            Some(HistoryCommands::Delete { number }) => {
                let removed = match number.checked_sub(1) {
                    Some(index) => history.delete(index).await?,
                    None => None,
                };
                if removed.is_none() {
                    bail!("No history entry #{}", number);
                }
                println!("Deleted entry #{}", number);
            }
            Some(HistoryCommands::Clear) => {
                history.clear().await?;
                println!("History cleared");
            }
        },
    }

    Ok(())
}

async fn upload(paths: Vec<PathBuf>, caption: Option<String>, history: HistoryStore) -> Result<()> {
    let mut candidates = Vec::with_capacity(paths.len());
    for path in &paths {
        candidates.push(SelectedFile::from_path(path).await?);
    }

    let mut form = UploadForm::new(ApiClient::from_env()?, history);
    form.add_files(candidates).await?;
    if !form.error().is_empty() {
        eprintln!("Skipped: {}", form.error());
    }
    if let Some(caption) = caption {
        form.set_caption(&caption);
    }

    let mut progress = form.subscribe_progress();
    let printer = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let percent = *progress.borrow_and_update();
            eprint!("\rUploading... {:>3}%", percent);
            std::io::stderr().flush().ok();
        }
    });

    let result = form.submit().await;
    printer.abort();
    eprintln!();

    match result {
        Ok(confirmation) => {
            println!("Sent {} file(s) to Telegram", confirmation.file_count);
            Ok(())
        }
        Err(SubmitError::NoFiles) => bail!("{}", SubmitError::NoFiles),
        Err(SubmitError::Failed {
            message,
            remaining,
            source,
        }) => {
            for outcome in source.results() {
                eprintln!("{}", format_outcome(outcome));
            }
            Err(source).context(format!("{} ({} file(s) not sent)", message, remaining))
        }
    }
}

async fn list_history(history: &HistoryStore) -> Result<()> {
    let entries = history.load().await?;
    if entries.is_empty() {
        println!("No uploads yet");
        return Ok(());
    }

    let now = Utc::now();
    for (i, entry) in entries.iter().enumerate() {
        println!("{}", format_history_line(i + 1, entry, now));
    }
    Ok(())
}
