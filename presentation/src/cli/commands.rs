//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for chatrelay
#[derive(Parser, Debug)]
#[command(name = "chatrelay")]
#[command(author, version, about = "Multi-provider chat gateway with streaming relay")]
#[command(long_about = r#"
chatrelay routes chat requests to OpenAI, Gemini and DeepSeek behind one
HTTP API, and relays streamed replies to clients as server-sent events.

API keys are read from OPENAI_API_KEY, GEMINI_API_KEY and DEEPSEEK_API_KEY
(or the variables named in the [providers] config sections). Models whose
provider has no key are listed as unavailable.

Configuration files are loaded from (in priority order):
1. CHATRELAY_* environment variables, e.g. CHATRELAY_SERVER__PORT=8080
2. --config <path>     Explicit config file
3. ./chatrelay.toml    Project-level config
4. ~/.config/chatrelay/config.toml   Global config

Example:
  chatrelay --port 8080
  chatrelay -vv --config ./dev.toml
"#)]
pub struct Cli {
    /// Interface to bind (overrides [server].host)
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on (overrides [server].port)
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Write the JSONL exchange transcript to this file
    #[arg(long, value_name = "PATH")]
    pub conversation_log: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
