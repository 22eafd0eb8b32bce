use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use llm_relay::{
    ChatCompletionRequest, ChatMessage, ClientConfig, OpenAI, StreamCallbacks, StreamOutcome,
};

const SAMPLE_FILE_NAME: &str = "example.txt";
const SAMPLE_FILE_CONTENTS: &str = "Hello, world!";

/// Command line arguments for the relay demo
#[derive(Parser)]
#[clap(name = "llm-relay", about = "Stream chat completions and upload files")]
struct CliArgs {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// API key, overrides the config file and OPENAI_API_KEY
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL for the API
    #[arg(long)]
    base_url: Option<String>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream a chat completion to stdout
    Chat {
        prompt: String,
        #[arg(long, default_value = "gpt-4o-mini")]
        model: String,
    },
    /// Upload a local file
    Upload {
        path: PathBuf,
        #[arg(long, default_value = "fine-tune")]
        purpose: String,
    },
    /// Write a sample file, upload it and list all files
    SampleUpload,
    /// List available models
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = CliArgs::parse();
    let client = build_client(&args)?;

    match args.command {
        Commands::Chat { prompt, model } => stream_chat(&client, model, prompt).await,
        Commands::Upload { path, purpose } => {
            let file = client.files().create(&path, &purpose).await?;
            println!("{}", serde_json::to_string_pretty(&file)?);
            Ok(())
        }
        Commands::SampleUpload => sample_upload(&client).await,
        Commands::Models => {
            for model in client.models().list().await?.data {
                println!("{}", model.id);
            }
            Ok(())
        }
    }
}

fn build_client(args: &CliArgs) -> Result<OpenAI> {
    let file_config = match &args.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::load_default()?,
    };
    let mut builder = OpenAI::builder()
        .config(file_config)
        .config(ClientConfig::from_env());
    if let Some(key) = &args.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(url) = &args.base_url {
        builder = builder.base_url(url.clone());
    }
    builder.build().context("failed to configure client")
}

async fn stream_chat(client: &OpenAI, model: String, prompt: String) -> Result<()> {
    let request = ChatCompletionRequest::new(model, vec![ChatMessage::user(prompt)]);
    let handle = client.chat().completions().stream(
        &request,
        |chunk| {
            if let Some(content) = chunk.content() {
                print!("{content}");
                let _ = std::io::stdout().flush();
            }
        },
        StreamCallbacks::new()
            .on_open(|| log::info!("SSE connection for completion opened"))
            .on_done(|| println!()),
    );

    match handle.wait().await {
        StreamOutcome::Failed(message) => anyhow::bail!("stream failed: {message}"),
        StreamOutcome::Done | StreamOutcome::Closed => Ok(()),
    }
}

async fn sample_upload(client: &OpenAI) -> Result<()> {
    let dir = std::env::temp_dir().join("llm-relay");
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join(SAMPLE_FILE_NAME);
    client
        .file_system()
        .write_text(&path, SAMPLE_FILE_CONTENTS)
        .await?;

    let file = client.files().create(&path, "fine-tune").await?;
    println!("uploaded file object:\n{}", serde_json::to_string_pretty(&file)?);

    let files = client.files().list().await?;
    println!("all files:\n{}", serde_json::to_string_pretty(&files)?);
    Ok(())
}
