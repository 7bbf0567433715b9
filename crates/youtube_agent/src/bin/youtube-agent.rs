use std::time::Duration;

use clap::{Parser, Subcommand};
use step_store::{Environment, NvmStepStore};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use youtube_agent::{
    config::{AgentConfig, Mode},
    dispatch::Dispatcher,
    openai::OpenAIClient,
    subscription::PollingSubscriber,
    tracing::init_tracing_subscriber,
    yt::transcript::YoutubeTranscripts,
    AgentBuilder,
};

#[derive(Parser)]
#[command(name = "youtube-agent", about = "YouTube transcript summarizing agent")]
struct Cli {
    /// Coordination backend API key
    #[arg(long, env = "NVM_API_KEY")]
    nvm_api_key: String,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY")]
    openai_api_key: String,

    /// Backend environment name or base url
    #[arg(long, env = "ENVIRONMENT", default_value = "staging")]
    environment: Environment,

    /// Agent DID to listen under (staged mode)
    #[arg(long, env = "DID")]
    did: Option<String>,

    /// Preferred transcript languages, comma separated
    #[arg(long, env = "TRANSCRIPT_LANGUAGES", value_delimiter = ',', default_value = "en")]
    languages: Vec<String>,

    /// Seconds between polls for pending steps
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "5")]
    poll_interval_secs: u64,

    /// Chat model used for summarization
    #[arg(long, env = "SUMMARIZER_MODEL")]
    summarizer_model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch, summarize and report each job in a single step
    Single,
    /// Split each job into init, transcript and summarize steps
    Staged,
}

async fn run_agent(config: AgentConfig, mode: Mode) -> anyhow::Result<()> {
    let options = config.subscribe_options(mode)?;

    let store = NvmStepStore::new(&config.nvm_api_key, &config.environment);
    let mut openai = OpenAIClient::new(&config.openai_api_key);
    if let Some(model) = &config.summarizer_model {
        openai = openai.with_model(model);
    }

    let builder = AgentBuilder::from_config(&config)
        .store(store.clone())
        .fetcher(YoutubeTranscripts::new()?)
        .summarizer(openai);

    let cancel = CancellationToken::new();
    let (tx, rx) = mpsc::channel(64);

    let subscriber = PollingSubscriber::new(store, options);
    let redelivery = subscriber.redelivery();
    let subscription = tokio::spawn(subscriber.run(tx, cancel.clone()));

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested");
                cancel.cancel();
            }
        }
    });

    let handled = match mode {
        Mode::Single => {
            Dispatcher::new(builder.build_single())
                .with_redelivery(redelivery)
                .run(rx, cancel.clone())
                .await
        }
        Mode::Staged => {
            Dispatcher::new(builder.build_router())
                .with_redelivery(redelivery)
                .run(rx, cancel.clone())
                .await
        }
    };

    cancel.cancel();
    subscription.await?;

    tracing::info!(handled, "Agent stopped");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let config = AgentConfig {
        nvm_api_key: cli.nvm_api_key,
        openai_api_key: cli.openai_api_key,
        environment: cli.environment,
        did: cli.did,
        languages: cli.languages,
        poll_interval: Duration::from_secs(cli.poll_interval_secs.max(1)),
        summarizer_model: cli.summarizer_model,
    };

    let mode = match cli.command {
        Command::Single => Mode::Single,
        Command::Staged => Mode::Staged,
    };

    tracing::info!(?mode, environment = %config.environment, "Starting agent");
    run_agent(config, mode).await
}
