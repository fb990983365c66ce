//! CLI entrypoint and subcommand orchestration.

mod config;
mod output;
#[cfg(test)]
mod test_support;

use agent::QuickAction;
use clap::{Parser, Subcommand};
use proto::MessageStatus;
use std::process::ExitCode;

#[cfg(not(test))]
use agent::{Conversation, HttpChatTransport, WalletContext};
#[cfg(not(test))]
use config::Config;
#[cfg(not(test))]
use gateway::GatewayServer;
#[cfg(not(test))]
use output::{TurnPrinter, format_run_header};
#[cfg(not(test))]
use tracing::{info, warn};
#[cfg(not(test))]
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Top-level command-line arguments for the polypuff application.
#[derive(Parser)]
#[command(name = "polypuff")]
#[command(about = "Polygon DeFi copilot gateway and chat client", version = "0.1.0")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug logging to ~/.polypuff/logs/debug.log
    #[arg(long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// CLI subcommands available in the application.
#[derive(Subcommand)]
enum Commands {
    /// Start the proxy gateway (chat + SideShift routes)
    Start,

    /// Send one chat turn and stream the reply
    Run {
        /// Message to send to the copilot
        #[arg(short = 'e', long, required_unless_present = "action", conflicts_with = "action")]
        exec: Option<String>,

        /// Send a quick-action prompt instead (see `polypuff actions`)
        #[arg(short, long)]
        action: Option<QuickAction>,

        /// Chat endpoint (defaults to the local gateway)
        #[arg(long)]
        endpoint: Option<String>,

        /// Connected wallet address
        #[arg(long)]
        from: Option<String>,

        /// Active chain id
        #[arg(long)]
        chain_id: Option<u64>,
    },

    /// List copilot quick actions
    Actions,
}

fn command_label(command: &Commands) -> &'static str {
    match command {
        Commands::Start => "start",
        Commands::Run { .. } => "run",
        Commands::Actions => "actions",
    }
}

/// Prompt for `run`: the explicit message, else the quick action's prompt.
fn resolve_prompt(exec: Option<String>, action: Option<QuickAction>) -> Option<String> {
    exec.or_else(|| action.map(|a| a.prompt().to_string()))
}

/// Process exit code for a finished turn.
fn exit_code(status: MessageStatus) -> ExitCode {
    if status == MessageStatus::Error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn format_actions() -> String {
    QuickAction::all()
        .iter()
        .map(|a| format!("{:<24}{}\n", a.id(), a.label()))
        .collect()
}

#[cfg(not(test))]
#[tokio::main]
/// Program entrypoint.
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // When --debug is passed, write debug-level logs to ~/.polypuff/logs/debug.YYYY-MM-DD.log.
    // Console logs go to stderr so `run` output stays clean on stdout.
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // WorkerGuard must outlive main() so buffered file writes are flushed on exit.
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>;

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    if cli.debug {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let log_dir = std::path::PathBuf::from(home).join(".polypuff").join("logs");
        std::fs::create_dir_all(&log_dir).ok();
        let appender = tracing_appender::rolling::daily(&log_dir, "debug.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        _file_guard = Some(guard);
        let file = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .with_filter(EnvFilter::new("debug,hyper_util=info,rustls=info,reqwest=info"));
        tracing_subscriber::registry()
            .with(console)
            .with(file)
            .init();
        info!(
            version = env!("CARGO_PKG_VERSION"),
            command = command_label(&cli.command),
            log_level = %cli.log_level,
            "========== polypuff session start =========="
        );
    } else {
        _file_guard = None;
        tracing_subscriber::registry().with(console).init();
    }

    let config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!("Failed to load config ({e}), using defaults");
        Config::default()
    });

    match cli.command {
        Commands::Start => cmd_start(config).await.map(|()| ExitCode::SUCCESS),
        Commands::Run {
            exec,
            action,
            endpoint,
            from,
            chain_id,
        } => {
            let wallet = WalletContext::new(
                from.or_else(|| config.client.from.clone()),
                chain_id.or(config.client.chain_id),
            );
            let endpoint = endpoint.unwrap_or_else(|| config.chat_endpoint());
            cmd_run(endpoint, wallet, exec, action).await
        }
        Commands::Actions => {
            print!("{}", format_actions());
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(not(test))]
async fn cmd_start(config: Config) -> anyhow::Result<()> {
    let gateway_config = config.gateway_config();
    for warning in gateway_config.validate()? {
        warn!("{warning}");
    }
    info!(
        port = gateway_config.port,
        chat_url = %gateway_config.chat_url,
        sideshift_url = %gateway_config.sideshift_url,
        "Starting polypuff gateway"
    );
    GatewayServer::new(gateway_config).run().await?;
    Ok(())
}

#[cfg(not(test))]
async fn cmd_run(
    endpoint: String,
    wallet: WalletContext,
    exec: Option<String>,
    action: Option<QuickAction>,
) -> anyhow::Result<ExitCode> {
    let Some(prompt) = resolve_prompt(exec, action) else {
        anyhow::bail!("either --exec or --action is required");
    };
    let mut conversation = Conversation::new();

    print!("{}", format_run_header(&prompt));
    info!(endpoint = %endpoint, "Sending chat turn");

    let transport = HttpChatTransport::new(endpoint);
    let mut printer = TurnPrinter::new(std::io::stdout().lock());
    let mut write_error = None;
    let outcome = conversation
        .send(&transport, &prompt, &wallet, |event, state| {
            if let Err(e) = printer.on_event(event, state)
                && write_error.is_none()
            {
                write_error = Some(e);
            }
        })
        .await?;
    if let Some(e) = write_error {
        return Err(e.into());
    }
    printer.finish(&outcome, conversation.state())?;
    Ok(exit_code(outcome.status))
}
