use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use agentmind::client::{ChatRequest, ClientConfig, LlmConfig, StreamClient, DEFAULT_PAGE_SIZE, DEFAULT_STREAM_PATH};
use agentmind::preferences::{FilePreferenceStore, PersistedPreferences};
use agentmind::session::{ChatSession, SessionState, StreamStatus};
use agentmind::ChatError;

/// Terminal client for the AgentMind streaming chat backend.
#[derive(Parser, Debug)]
#[command(name = "agentmind-chat", version, about)]
struct Cli {
    /// Backend base URL [default: $AGENTMIND_BASE_URL or http://127.0.0.1:8000]
    #[arg(long)]
    base_url: Option<String>,

    /// REST request timeout in seconds [default: $AGENTMIND_TIMEOUT_SECS or 60]
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Preferences file
    #[arg(long, env = "AGENTMIND_PREFERENCES")]
    preferences: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a message and stream the answer
    Send {
        /// The message to send
        message: String,

        /// Continue an existing conversation
        #[arg(long)]
        conversation: Option<i64>,

        /// Override the saved plan mode for this request
        #[arg(long)]
        plan_mode: Option<bool>,

        /// Role preset
        #[arg(long)]
        role: Option<String>,

        /// Web search provider
        #[arg(long)]
        search_provider: Option<String>,

        /// LLM provider, requires --model
        #[arg(long, requires = "model")]
        provider: Option<String>,

        /// LLM model
        #[arg(long)]
        model: Option<String>,

        /// Enable deep reasoning
        #[arg(long)]
        deep_reasoning: bool,

        /// Streaming endpoint path
        #[arg(long, default_value = DEFAULT_STREAM_PATH)]
        stream_path: String,

        /// Hide the reasoning trace
        #[arg(long)]
        no_thinking: bool,
    },

    /// List stored conversations
    List {
        #[arg(long, default_value_t = 0)]
        skip: u32,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: u32,
    },

    /// Print a stored conversation
    Show { id: i64 },

    /// Delete a stored conversation
    Delete { id: i64 },

    /// Change the saved plan mode
    PlanMode { mode: PlanModeArg },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PlanModeArg {
    On,
    Off,
    Toggle,
}

#[tokio::main]
async fn main() -> Result<(), ChatError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = cli
        .preferences
        .clone()
        .map(FilePreferenceStore::new)
        .unwrap_or_else(FilePreferenceStore::at_default_location);
    let mut preferences = PersistedPreferences::load(store);

    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.base_url {
        config = config.base_url(url);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.timeout(Duration::from_secs(secs));
    }

    match cli.command {
        Commands::Send {
            message,
            conversation,
            plan_mode,
            role,
            search_provider,
            provider,
            model,
            deep_reasoning,
            stream_path,
            no_thinking,
        } => {
            let mut request = ChatRequest::new(message);
            request.conversation_id = conversation;
            request.plan_mode = plan_mode;
            request.role_id = role;
            request.search_provider = search_provider;
            if deep_reasoning {
                request.deep_reasoning = Some(true);
            }
            if let (Some(provider), Some(model)) = (provider, model) {
                request.llm_config = Some(LlmConfig::new(provider, model));
            }
            let request = preferences.get().apply_to(request);

            let client = StreamClient::new(config.stream_path(stream_path))?;
            send(client, &request, !no_thinking).await
        }
        Commands::List { skip, limit } => {
            let client = StreamClient::new(config)?;
            for conversation in client.conversations().list(skip, limit).await? {
                println!("{:>6}  {}  {}", conversation.id, conversation.updated_at, conversation.title);
            }
            Ok(())
        }
        Commands::Show { id } => {
            let client = StreamClient::new(config)?;
            let detail = client.conversations().get(id).await?;
            println!("# {}", detail.conversation.title);
            for message in detail.messages {
                println!("\n[{}] {}", message.role, message.content);
                for step in message.intermediate_steps {
                    println!("  - {}({})", step.tool, step.input);
                }
            }
            Ok(())
        }
        Commands::Delete { id } => {
            let client = StreamClient::new(config)?;
            client.conversations().delete(id).await?;
            println!("deleted conversation {id}");
            Ok(())
        }
        Commands::PlanMode { mode } => {
            match mode {
                PlanModeArg::On => preferences.set_plan_mode(true)?,
                PlanModeArg::Off => preferences.set_plan_mode(false)?,
                PlanModeArg::Toggle => preferences.toggle_plan_mode()?,
            }
            let enabled = preferences.get().plan_mode_enabled;
            println!("plan mode {}", if enabled { "on" } else { "off" });
            Ok(())
        }
    }
}

async fn send(client: StreamClient, request: &ChatRequest, show_thinking: bool) -> Result<(), ChatError> {
    let session = ChatSession::new(client);
    let mut updates = session.subscribe();

    let printer = tokio::spawn(async move {
        let mut printer = Printer::new(show_thinking);
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            printer.render(&state);
        }
        printer.render(&updates.borrow());
        printer.finish();
    });

    let result = session.send(request).await;
    // Closing the channel ends the printer.
    drop(session);
    if let Err(err) = printer.await {
        tracing::warn!(error = %err, "printer task failed");
    }

    let message = result?;
    if let Some(id) = message.conversation_id {
        eprintln!("conversation {id}");
    }
    if !message.is_complete {
        eprintln!("(incomplete response)");
    }
    Ok(())
}

/// Prints the growth of each snapshot since the previous one
struct Printer {
    show_thinking: bool,
    thinking_len: usize,
    content_len: usize,
    steps: usize,
    error_shown: bool,
}

impl Printer {
    fn new(show_thinking: bool) -> Self {
        Self {
            show_thinking,
            thinking_len: 0,
            content_len: 0,
            steps: 0,
            error_shown: false,
        }
    }

    fn render(&mut self, state: &SessionState) {
        if let (StreamStatus::Error, Some(failure)) = (state.status, &state.error) {
            if !self.error_shown {
                eprintln!("\nerror [{}]: {}", failure.code, failure.message);
                self.error_shown = true;
            }
        }
        let Some(message) = &state.streaming_message else {
            return;
        };

        let mut stdout = std::io::stdout().lock();
        if self.show_thinking {
            if let Some(delta) = message.thinking.get(self.thinking_len..) {
                let _ = write!(stdout, "{delta}");
            }
        }
        self.thinking_len = message.thinking.len();

        for step in message.tool_steps.iter().skip(self.steps) {
            let _ = writeln!(stdout, "\n[tool] {} {}", step.tool, step.input);
        }
        self.steps = message.tool_steps.len();

        if let Some(delta) = message.content.get(self.content_len..) {
            let _ = write!(stdout, "{delta}");
        }
        self.content_len = message.content.len();
        let _ = stdout.flush();
    }

    fn finish(&self) {
        if self.content_len > 0 || self.thinking_len > 0 {
            println!();
        }
    }
}
