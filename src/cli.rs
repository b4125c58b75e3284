use clap::{Parser, Subcommand};
use ideaflow_themes::algo::lexicon::{load_model, shared_model, SharedModel};
use ideaflow_themes::config::{resolve_config, ThemeConfig};
use ideaflow_themes::ops;
use serde_json::Value;
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "themes",
    version,
    about = "Cluster brainstorming ideas into named themes"
)]
struct Cli {
    /// Path to a JSON config file (defaults to $THEMES_CONFIG, then built-ins)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Skip the linguistic model and run in degraded mode
    #[arg(long, global = true)]
    no_nlp: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Group a JSON array of ideas from stdin into themes
    Generate {
        /// JSON field holding the idea id
        #[arg(long, default_value = "id")]
        id_field: String,
        /// JSON field holding the idea text
        #[arg(short, long, default_value = "content")]
        field: String,
    },
    /// Normalize one piece of text
    Normalize {
        /// Text to normalize
        text: String,
    },
    /// Name and describe a JSON array of strings from stdin as one theme
    Label,
    /// Print the active concept table
    Concepts,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ideaflow_themes=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref()).unwrap_or_else(|e| fail(&e.to_string()));
    let model = if cli.no_nlp {
        load_model(true, None)
    } else {
        shared_model()
    };

    match cli.command {
        Commands::Generate { id_field, field } => cmd_generate(&id_field, &field, &config, model),
        Commands::Normalize { text } => print_json(&ops::op_normalize(Some(&text), model)),
        Commands::Label => cmd_label(&config, model),
        Commands::Concepts => print_json(&ops::op_concepts().unwrap_or_else(|e| fail(&e))),
    }
}

fn fail(msg: &str) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

fn read_stdin_json() -> Vec<Value> {
    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        fail(&format!("failed to read stdin: {e}"));
    }
    let parsed: Value =
        serde_json::from_str(&buf).unwrap_or_else(|e| fail(&format!("invalid JSON on stdin: {e}")));
    match parsed {
        Value::Array(arr) => arr,
        single => vec![single],
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => fail(&e.to_string()),
    }
}

fn cmd_generate(id_field: &str, field: &str, config: &ThemeConfig, model: SharedModel) {
    let rows = read_stdin_json();
    let output = ops::op_themes(&rows, id_field, field, config, model).unwrap_or_else(|e| fail(&e));
    print_json(&output);
}

fn cmd_label(config: &ThemeConfig, model: SharedModel) {
    let texts = read_stdin_json();
    let output = ops::op_label(&texts, config, model).unwrap_or_else(|e| fail(&e));
    print_json(&output);
}
