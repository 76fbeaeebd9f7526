use chrono::Utc;
use clap::{Parser, Subcommand};
use pdf_chat_core::{
    assemble, build_vector_store, rag_prompt, Attachment, CompletionClient, IngestionOptions,
    OllamaEmbedder, Retriever, SessionStore, VectorStore,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-chat", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the local model server
    #[arg(long, default_value = "http://localhost:11434")]
    ollama_url: String,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a PDF folder into a persisted vector store.
    Ingest {
        /// Folder that contains PDFs recursively.
        #[arg(long, default_value = "Data")]
        folder: PathBuf,
        /// Directory the index and chunk texts are persisted to.
        #[arg(long, default_value = "trained_model")]
        out_dir: PathBuf,
        /// Embedding model identifier.
        #[arg(long, default_value = "nomic-embed-text")]
        embed_model: String,
    },
    /// Interactive chat with sessions and file attachments.
    Chat {
        /// Generation model identifier.
        #[arg(long, default_value = "tinyllama:latest")]
        model: String,
        /// Persisted vector store to answer from; plain chat when omitted.
        #[arg(long)]
        index_dir: Option<PathBuf>,
        /// Embedding model identifier (must match the one used at ingestion).
        #[arg(long, default_value = "nomic-embed-text")]
        embed_model: String,
    },
    /// One-shot retrieval-augmented answer from the persisted store.
    Ask {
        /// Question to answer.
        #[arg(long)]
        query: String,
        #[arg(long, default_value = "trained_model")]
        index_dir: PathBuf,
        #[arg(long, default_value = "tinyllama:latest")]
        model: String,
        #[arg(long, default_value = "nomic-embed-text")]
        embed_model: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "pdf-chat boot"
    );

    match cli.command {
        Command::Ingest {
            folder,
            out_dir,
            embed_model,
        } => {
            let embedder = OllamaEmbedder::new(&cli.ollama_url, &embed_model);
            info!(folder = %folder.display(), embed_model = %embedder.model(), "ingesting");

            let report =
                build_vector_store(&folder, IngestionOptions::default(), &embedder, &out_dir)
                    .await
                    .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            info!(
                documents = report.documents,
                chunks = report.chunks,
                dimensions = report.dimensions,
                "store built"
            );
            println!(
                "{} chunks from {} documents ingested into {} at {}",
                report.chunks,
                report.documents,
                out_dir.display(),
                Utc::now().to_rfc3339()
            );
        }
        Command::Ask {
            query,
            index_dir,
            model,
            embed_model,
        } => {
            let store = VectorStore::load(&index_dir)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            info!(index_dir = %index_dir.display(), chunks = store.len(), "store loaded");

            let retriever = Retriever::new(store, OllamaEmbedder::new(&cli.ollama_url, &embed_model));
            let context = retriever
                .context_for(&query)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            let client = CompletionClient::new(&cli.ollama_url);
            let outcome = client
                .complete(&model, &rag_prompt(&context, &query))
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            if outcome.is_degraded() {
                warn!("generation endpoint returned a non-success status");
            }
            println!("{}", outcome.text());
        }
        Command::Chat {
            model,
            index_dir,
            embed_model,
        } => {
            run_chat(&cli.ollama_url, &model, index_dir, &embed_model).await?;
        }
    }

    Ok(())
}

async fn run_chat(
    base_url: &str,
    model: &str,
    index_dir: Option<PathBuf>,
    embed_model: &str,
) -> anyhow::Result<()> {
    let client = CompletionClient::new(base_url);

    let retriever = match index_dir {
        Some(dir) => {
            let store =
                VectorStore::load(&dir).map_err(|error| anyhow::anyhow!(error.to_string()))?;
            info!(index_dir = %dir.display(), chunks = store.len(), "retrieval enabled");
            Some(Retriever::new(store, OllamaEmbedder::new(base_url, embed_model)))
        }
        None => None,
    };

    let mut sessions = SessionStore::new();
    sessions.create("Chat 1", model);

    println!("Chatting with {model}. Type /help for commands, /quit to leave.");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(command, &mut sessions) {
                break;
            }
            continue;
        }

        let session = sessions
            .active_mut()
            .ok_or_else(|| anyhow::anyhow!("no active session"))?;
        session.push_user(line);

        let context = match &retriever {
            Some(retriever) => retriever
                .context_for(line)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?,
            None => session.attachment_context().to_string(),
        };

        let prompt = assemble(&session.transcript, &context);
        let outcome = client
            .complete(&session.model, &prompt)
            .await
            .map_err(|error| anyhow::anyhow!(error.to_string()))?;

        if outcome.is_degraded() {
            warn!("generation endpoint returned a non-success status");
        }
        println!("{}", outcome.text());
        session.push_assistant(outcome.text());
    }

    Ok(())
}

/// Returns false when the loop should end.
fn handle_command(command: &str, sessions: &mut SessionStore) -> bool {
    let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
    let rest = rest.trim();

    match name {
        "quit" | "exit" => return false,
        "help" => {
            println!("/new [title]   start a fresh session");
            println!("/sessions      list sessions");
            println!("/switch <n>    activate session n");
            println!("/model <name>  change the generation model");
            println!("/attach <path> attach a file to the active session");
            println!("/clear         empty the active session");
            println!("/quit          leave");
        }
        "new" => {
            let title = if rest.is_empty() {
                format!("Chat {}", sessions.len() + 1)
            } else {
                rest.to_string()
            };
            let model = sessions
                .active()
                .map(|session| session.model.clone())
                .unwrap_or_default();
            sessions.create(&title, model);
            println!("started {title}");
        }
        "sessions" => {
            let active_id = sessions.active().map(|session| session.id);
            for (position, session) in sessions.sessions().enumerate() {
                let marker = if Some(session.id) == active_id { "*" } else { " " };
                println!(
                    "{marker} {position}: {} ({} messages)",
                    session.title,
                    session.transcript.len()
                );
            }
        }
        "switch" => {
            let target = rest
                .parse::<usize>()
                .ok()
                .and_then(|position| sessions.sessions().nth(position).map(|session| session.id));
            match target {
                Some(id) => {
                    sessions.select(id);
                    println!("switched");
                }
                None => println!("no such session: {rest}"),
            }
        }
        "model" => {
            if rest.is_empty() {
                println!("usage: /model <name>");
            } else if let Some(session) = sessions.active_mut() {
                session.model = rest.to_string();
                println!("model set to {rest}");
            }
        }
        "attach" => match Attachment::load(Path::new(rest)) {
            Ok(attachment) => {
                if let Some(session) = sessions.active_mut() {
                    let notice = attachment.notice();
                    session.set_attachment(attachment.context_text());
                    session.push_user(notice.as_str());
                    println!("{notice}");
                }
            }
            Err(error) => println!("attach failed: {error}"),
        },
        other => println!("unknown command: /{other}"),
    }

    true
}
