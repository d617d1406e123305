use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use shmigrate::indent::{BlockIndenter, Reindent};
use shmigrate::{edit, EditOptions, Keywords};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ChangelogMode {
    /// Splice the report into the output script
    Embed,
    /// Write the report to stdout
    Print,
    Off,
}

#[derive(Parser)]
#[command(
    name = "shmigrate",
    version,
    about = "Comment out keyword lines in a structured job script, collapse emptied blocks and renumber sections"
)]
struct Cli {
    /// Shell script to edit
    script: PathBuf,

    /// Keywords file (comma- and/or newline-separated)
    keywords: PathBuf,

    /// Output file
    #[arg(short = 'o', long = "output", default_value = "modified.sh")]
    output: PathBuf,

    /// Note appended to every commented line as ` -> <NOTE>`
    #[arg(long)]
    note: Option<String>,

    /// Match keywords as whole words inside case branches
    #[arg(long)]
    whole_word_branches: bool,

    /// What to do with the changelog report
    #[arg(long, value_enum, default_value_t = ChangelogMode::Embed)]
    changelog: ChangelogMode,

    /// Normalise indentation inside blocks
    #[arg(long)]
    reindent: bool,

    /// Spaces per indentation level used by --reindent
    #[arg(long, default_value_t = 4)]
    indent_width: usize,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("shmigrate={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = fs::read_to_string(&cli.script)
        .with_context(|| format!("Failed to read {}", cli.script.display()))?;
    let keywords_text = fs::read_to_string(&cli.keywords)
        .with_context(|| format!("Failed to read {}", cli.keywords.display()))?;
    let keywords = Keywords::parse(&keywords_text)
        .with_context(|| format!("Failed to load keywords from {}", cli.keywords.display()))?;

    let options = EditOptions {
        note: cli.note.clone(),
        whole_word_branches: cli.whole_word_branches,
        ..Default::default()
    };
    let result = edit(&source, &keywords, &options)
        .with_context(|| format!("Failed to edit {}", cli.script.display()))?;

    let block = BlockIndenter {
        unit: cli.indent_width,
    };
    let indenter: Option<&dyn Reindent> = if cli.reindent { Some(&block) } else { None };
    let output = result.render(cli.changelog == ChangelogMode::Embed, indenter);
    fs::write(&cli.output, &output)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    if cli.changelog == ChangelogMode::Print {
        for line in &result.changelog {
            println!("{line}");
        }
    }
    if cli.json {
        let json = serde_json::to_string_pretty(&result.summary)
            .context("Failed to serialize summary")?;
        println!("{json}");
    }
    if cli.verbose > 0 {
        let s = &result.summary;
        eprintln!(
            "{}: {} line(s) commented, {} block(s) collapsed, {} section(s) renumbered, {} replacement(s)",
            cli.output.display(),
            s.lines_modified,
            s.units_collapsed,
            s.sections_renumbered,
            s.substitutions
        );
    }

    Ok(())
}
