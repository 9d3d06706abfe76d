use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use whatsapp_harness::api::client::BridgeClient;
use whatsapp_harness::api::whatsapp::WhatsApp;
use whatsapp_harness::config::Config;
use whatsapp_harness::harness::Harness;
use whatsapp_harness::harness::command::{Command, Exit, usage_report};
use whatsapp_harness::storage::MessageStore;

#[derive(Debug, Parser)]
#[command(name = "whatsapp-harness", version, about = "Exercise WhatsApp bridge tools from the command line")]
struct Cli {
    /// TOML config file (defaults to whatsapp-harness.toml in the user config dir)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
    /// Path to the bridge's messages.db
    #[arg(long)]
    db: Option<PathBuf>,
    /// Base URL of the bridge REST API
    #[arg(long)]
    bridge_url: Option<String>,
    /// Command to run; runs every command with sample values when omitted
    command: Option<String>,
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("failed to build tokio runtime: {}", err);
            return Exit::Failed.into();
        }
    };
    runtime.block_on(run(cli)).into()
}

async fn run(cli: Cli) -> Exit {
    // Usage errors are reported before any config is read.
    let command = match cli.command.as_deref().map(|name| Command::parse(name, &cli.args)).transpose() {
        Ok(command) => command,
        Err(usage) => {
            for line in usage_report(&usage) {
                println!("{}", line);
            }
            return Exit::Usage;
        }
    };

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            return Exit::Failed;
        }
    };
    if let Some(db) = cli.db {
        config.messages_db = db;
    }
    if let Some(url) = cli.bridge_url {
        config.bridge_url = url;
    }

    let bridge = match BridgeClient::new(&config.bridge_url) {
        Ok(bridge) => bridge,
        Err(err) => {
            eprintln!("error: {}", err);
            return Exit::Failed;
        }
    };
    let api = WhatsApp::new(MessageStore::new(config.messages_db), bridge);
    let mut harness = Harness::new(api, config.harness, io::stdout());

    let Some(command) = command else {
        info!("no command given, running all operations");
        harness.run_all().await;
        return Exit::Success;
    };
    Exit::of(&harness.execute(command).await)
}
