//! delivery-note CLI
//!
//! Renders 出库单 (delivery notes) from JSON form files and manages the
//! stored settings, export counter and templates.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Delivery note (出库单) generator
#[derive(Parser)]
#[command(name = "delivery-note")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding settings and the export counter
    #[arg(long, global = true, env = "DELIVERY_NOTE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a note to an A4 PDF
    Render {
        /// Note file (JSON: settings, formData, items, noteNumber)
        note: PathBuf,

        /// TTF/OTF font with CJK glyphs
        #[arg(long, env = "DELIVERY_NOTE_FONT")]
        font: PathBuf,

        /// Optional bold face; synthesized from the regular font otherwise
        #[arg(long, env = "DELIVERY_NOTE_BOLD_FONT")]
        bold_font: Option<PathBuf>,

        /// Output file (default: 出库单_{noteNumber}.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a print-ready HTML page
    Print {
        /// Note file (JSON)
        note: PathBuf,

        /// Output file (default: 出库单_{noteNumber}.html)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export or import form templates
    Template {
        #[command(subcommand)]
        action: TemplateCommands,
    },

    /// Show or change stored settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommands,
    },

    /// Print the totals of a note
    Total {
        /// Note file (JSON)
        note: PathBuf,
    },

    /// Print an amount as capitalized RMB numerals
    Numeral {
        /// Amount in yuan
        #[arg(allow_hyphen_values = true)]
        amount: f64,
    },
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// Save the note's form state as a template
    Export {
        /// Note file (JSON)
        note: PathBuf,

        /// Output file (default: 出库单模板_YYYY-MM-DD.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load a template, store its settings and write the resulting note
    Import {
        /// Template file (.json)
        file: PathBuf,

        /// Output note file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print stored settings
    Show,

    /// Update stored settings
    Set {
        /// Company name
        #[arg(long)]
        company: Option<String>,

        /// Tax rate in percent
        #[arg(long)]
        tax_rate: Option<String>,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        /// Logo image (JPEG or PNG)
        #[arg(long, conflicts_with = "clear_logo")]
        logo: Option<PathBuf>,

        /// Remove the stored logo
        #[arg(long)]
        clear_logo: bool,
    },

    /// Remove settings and the export counter
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let data_dir = cli.data_dir;
    match cli.command {
        Commands::Render {
            note,
            font,
            bold_font,
            output,
        } => commands::render::run(note, font, bold_font, output, data_dir),
        Commands::Print { note, output } => commands::print::run(note, output, data_dir),
        Commands::Template { action } => match action {
            TemplateCommands::Export { note, output } => {
                commands::template::export(note, output, data_dir)
            }
            TemplateCommands::Import { file, output } => {
                commands::template::import(file, output, data_dir)
            }
        },
        Commands::Settings { action } => match action {
            SettingsCommands::Show => commands::settings::show(data_dir),
            SettingsCommands::Set {
                company,
                tax_rate,
                title,
                logo,
                clear_logo,
            } => commands::settings::set(
                commands::settings::SettingsUpdate {
                    company,
                    tax_rate,
                    title,
                    logo,
                    clear_logo,
                },
                data_dir,
            ),
            SettingsCommands::Clear => commands::settings::clear(data_dir),
        },
        Commands::Total { note } => commands::total::run(note, data_dir),
        Commands::Numeral { amount } => commands::total::numeral(amount),
    }
}
