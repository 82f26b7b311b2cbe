//! depot-scout CLI
//!
//! Answers product questions about homedepot.com with a tool-using LLM agent.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use scout_agents::{
    create_anthropic_backend, create_backend, Agent, AgentSettings, AnthropicConfig,
    OpenAIBackendConfig, PromptTemplate, SharedBackend, ToolConfig, Toolbox,
};
use scout_core::{CategoryCode, HOME_DEPOT};
use scout_runtime::{Session, SessionConfig, SlackConfig, SlackState};
use scout_web::{create_fetcher, find_links, FetchConfig, SharedFetcher};

#[derive(Parser)]
#[command(name = "depot-scout")]
#[command(author, version, about = "Answer product questions from the Home Depot website", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1", global = true)]
    verbose: u8,

    /// Request timeout for site pages in seconds (none by default)
    #[arg(long, global = true)]
    fetch_timeout: Option<u64>,
}

/// Model, prompt and loop options for commands that run the agent
#[derive(Args)]
struct AgentArgs {
    /// LLM model to use
    #[arg(short, long, default_value = "claude-sonnet-4-20250514")]
    model: String,

    /// Anthropic API key (or set ANTHROPIC_API_KEY env var)
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_key: Option<String>,

    /// OpenAI API key (or set OPENAI_API_KEY env var)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OpenRouter API key (or set OPENROUTER_API_KEY env var)
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    openrouter_key: Option<String>,

    /// Use OpenAI instead of Anthropic
    #[arg(long)]
    openai: bool,

    /// Use OpenRouter instead of Anthropic
    #[arg(long)]
    openrouter: bool,

    /// Maximum model calls per question
    #[arg(long, default_value = "5")]
    max_steps: usize,

    /// Past exchanges kept in the prompt
    #[arg(long, default_value = "2")]
    history: usize,

    /// Leave star ratings and review counts out of product descriptions
    #[arg(long)]
    no_reviews: bool,

    /// Prompt TOML file to use instead of the built-in one
    #[arg(long)]
    prompt: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Ask {
        /// The question, e.g. "How much is a 4 burner propane grill?"
        question: String,

        #[command(flatten)]
        agent: AgentArgs,
    },

    /// Interactive chat on the terminal
    Chat {
        #[command(flatten)]
        agent: AgentArgs,
    },

    /// Serve the Slack Events API endpoint
    Serve {
        #[command(flatten)]
        agent: AgentArgs,

        /// Slack bot token (or set SLACK_BOT_TOKEN env var)
        #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
        bot_token: String,

        /// Slack signing secret (or set SLACK_SIGNING_SECRET env var)
        #[arg(long, env = "SLACK_SIGNING_SECRET", hide_env_values = true)]
        signing_secret: String,

        /// Port to listen on
        #[arg(long, env = "PORT", default_value = "3000")]
        port: u16,
    },

    /// List search-result links for a query
    Links {
        /// Search text
        query: String,

        /// Link category: 'p' for product pages, 'b' for category pages
        #[arg(short, long, default_value = "p")]
        category: CategoryCode,
    },

    /// Describe the product at a product-page URL
    Describe {
        /// URL like https://homedepot.com/p/...
        url: String,

        /// Leave star ratings and review counts out
        #[arg(long)]
        no_reviews: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let fetcher = create_fetcher(&FetchConfig {
        timeout_secs: cli.fetch_timeout,
    })?;

    match cli.command {
        Commands::Ask { question, agent } => {
            let session = Session::new(Arc::new(build_agent(&agent, fetcher)?), &session_config(&agent));
            println!("{}", session.ask(&question).await?);
        }
        Commands::Chat { agent } => {
            let session = Session::new(Arc::new(build_agent(&agent, fetcher)?), &session_config(&agent));
            run_chat(&session).await?;
        }
        Commands::Serve {
            agent,
            bot_token,
            signing_secret,
            port,
        } => {
            let state = SlackState::new(
                Arc::new(build_agent(&agent, fetcher)?),
                session_config(&agent),
                SlackConfig {
                    bot_token,
                    signing_secret,
                    port,
                },
            );
            scout_runtime::serve(Arc::new(state)).await?;
        }
        Commands::Links { query, category } => {
            let links = find_links(fetcher.as_ref(), &HOME_DEPOT, &query, category).await?;
            if links.is_empty() {
                println!("No /{}/ links found for '{}'", category, query);
            }
            for link in links {
                println!("{}", link);
            }
        }
        Commands::Describe { url, no_reviews } => {
            let toolbox = Toolbox::new(
                fetcher,
                ToolConfig {
                    include_reviews: !no_reviews,
                },
            );
            println!("{}", toolbox.describe_product(&url).await?);
        }
    }

    Ok(())
}

fn build_backend(args: &AgentArgs) -> Result<SharedBackend> {
    // Anthropic is the default provider
    let backend = if args.openrouter {
        let key = args.openrouter_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!("OpenRouter API key required. Set OPENROUTER_API_KEY or use --openrouter-key")
        })?;
        create_backend(OpenAIBackendConfig::openrouter(key, &args.model))?
    } else if args.openai {
        let key = args.api_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!("OpenAI API key required. Set OPENAI_API_KEY or use --api-key")
        })?;
        create_backend(OpenAIBackendConfig::openai(key, &args.model))?
    } else {
        let key = args.anthropic_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!("Anthropic API key required. Set ANTHROPIC_API_KEY or use --anthropic-key")
        })?;
        create_anthropic_backend(AnthropicConfig::new(key, &args.model))?
    };

    let provider = if args.openrouter { "OpenRouter" } else if args.openai { "OpenAI" } else { "Anthropic" };
    tracing::info!("Provider: {} | Model: {}", provider, backend.model_name());

    Ok(backend)
}

fn build_agent(args: &AgentArgs, fetcher: SharedFetcher) -> Result<Agent> {
    let prompt = match &args.prompt {
        Some(path) => PromptTemplate::load_from_file(path)?,
        None => PromptTemplate::load_embedded()?,
    };

    let toolbox = Toolbox::new(
        fetcher,
        ToolConfig {
            include_reviews: !args.no_reviews,
        },
    );

    Ok(Agent::new(
        build_backend(args)?,
        toolbox,
        prompt,
        AgentSettings::default().with_max_steps(args.max_steps),
    ))
}

fn session_config(args: &AgentArgs) -> SessionConfig {
    SessionConfig {
        history_window: args.history,
    }
}

async fn run_chat(session: &Session) -> Result<()> {
    println!("Ask about any product on homedepot.com. Type 'exit' to quit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();

        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        println!("\n{}\n", session.reply(question).await);
    }

    Ok(())
}
