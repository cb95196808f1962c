use clap::{Parser, Subcommand};
use pressroom::EditorConfig;
use pressroom::richtext::markup_converter::{deserialize, serialize};
use pressroom::richtext::paste::normalize_paste;
use pressroom::richtext::render::render_html;
use pressroom::richtext::structured_document::StructuredDocument;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pressroom")]
#[command(about = "Inspect and convert rich-text editor values", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the canonical form of a value
    Normalize {
        /// File holding the value (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Render a value as the editor's HTML
    Render {
        /// File holding the value (stdin when omitted)
        file: Option<PathBuf>,
        /// Placeholder shown for an empty value
        #[arg(short, long)]
        placeholder: Option<String>,
    },
    /// Convert clipboard plain text to a value
    Paste {
        /// File holding the text (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Check that a value is canonical and survives a round trip
    Check {
        /// File holding the value (stdin when omitted)
        file: Option<PathBuf>,
    },
}

fn read_input(file: Option<PathBuf>) -> Result<String, String> {
    match file {
        Some(path) => fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read '{}': {}", path.display(), e)),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            Ok(input)
        }
    }
}

fn load_config() -> EditorConfig {
    EditorConfig::load().unwrap_or_else(|e| {
        log::warn!("{}; using defaults", e);
        EditorConfig::default()
    })
}

fn cmd_normalize(file: Option<PathBuf>) -> Result<(), String> {
    let value = read_input(file)?;
    println!("{}", serialize(&deserialize(&value)));
    Ok(())
}

fn cmd_render(
    file: Option<PathBuf>,
    placeholder: Option<String>,
    config: &EditorConfig,
) -> Result<(), String> {
    let value = read_input(file)?;
    let placeholder = placeholder.unwrap_or_else(|| config.placeholder.clone());
    print!("{}", render_html(&deserialize(&value), &placeholder));
    Ok(())
}

fn cmd_paste(file: Option<PathBuf>, config: &EditorConfig) -> Result<(), String> {
    let text = read_input(file)?;
    let blocks = normalize_paste(&text, config.paste_options());
    println!("{}", serialize(&StructuredDocument::from_blocks(blocks)));
    Ok(())
}

fn cmd_check(file: Option<PathBuf>) -> Result<(), String> {
    let value = read_input(file)?;
    let doc = deserialize(&value);
    let canonical = serialize(&doc);

    if deserialize(&canonical) != doc {
        return Err("value does not survive a round trip".to_string());
    }
    if canonical != value.trim_end_matches('\n') {
        return Err(format!(
            "value is not canonical; normalized form:\n{}",
            canonical
        ));
    }

    println!("ok: {} blocks", doc.block_count());
    Ok(())
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let config = load_config();

    let result = match args.command {
        Commands::Normalize { file } => cmd_normalize(file),
        Commands::Render { file, placeholder } => cmd_render(file, placeholder, &config),
        Commands::Paste { file } => cmd_paste(file, &config),
        Commands::Check { file } => cmd_check(file),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
