mod notebook_file;
mod runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use notebook::{BlockType, Dispatcher, Notebook, NotebookSession};
use search::{DEFAULT_COUNT, FsSearch};

use crate::notebook_file::{Format, NotebookFile};

#[derive(Parser)]
#[command(name = "nb", version, about = "Search notebook runner")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG applies otherwise.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every block of a notebook and print the output
    Run(RunArgs),

    /// Validate a notebook file and the syntax of its query blocks
    Check(FileArgs),

    /// List the blocks of a notebook
    Blocks(FileArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Notebook file (.toml or .json)
    file: PathBuf,

    /// Directory searched by query blocks
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Match limit for queries without `count:`
    #[arg(long, default_value_t = DEFAULT_COUNT)]
    count: usize,

    /// Print blocks as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Suppress block output (exit status still reports failures)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct FileArgs {
    /// Notebook file (.toml or .json)
    file: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    match cli.command {
        Command::Run(args) => do_run(args, color_choice),
        Command::Check(args) => do_check(&args.file, color_choice),
        Command::Blocks(args) => do_blocks(&args.file, color_choice),
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read and deserialize a notebook file, reporting errors and exiting on failure.
fn load(path: &Path, color_choice: ColorChoice) -> NotebookFile {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", path.display(), e);
            process::exit(1);
        }
    };

    match notebook_file::parse(&source, Format::from_path(path)) {
        Ok(file) => file,
        Err(error) => {
            match error.span {
                Some(span) => {
                    let mut files = SimpleFiles::new();
                    let file_id = files.add(path.display().to_string(), source);
                    let diagnostic = Diagnostic::error()
                        .with_message("invalid notebook file")
                        .with_labels(vec![
                            Label::primary(file_id, span).with_message(error.message),
                        ]);
                    emit(color_choice, &files, &[diagnostic]);
                }
                None => eprintln!("error: invalid notebook file: {}", error.message),
            }
            process::exit(1);
        }
    }
}

fn do_run(args: RunArgs, color_choice: ColorChoice) {
    let file = load(&args.file, color_choice);

    let search = FsSearch::new(args.root).with_default_count(args.count);
    tracing::debug!(root = %search.root().display(), count = args.count, "running notebook");
    let notebook = Notebook::with_dispatcher(file.blocks, Dispatcher::with_search(search));
    let mut session = NotebookSession::new(notebook);

    runner::run_all(&mut session);

    if args.json {
        match serde_json::to_string_pretty(session.blocks()) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: cannot serialize blocks: {}", e);
                process::exit(1);
            }
        }
    } else if !args.quiet {
        runner::print_blocks(session.blocks());
    }

    let failures = runner::failure_count(session.blocks());
    if failures > 0 {
        eprintln!("{} of {} blocks failed", failures, session.blocks().len());
        process::exit(1);
    }
}

fn do_check(path: &Path, color_choice: ColorChoice) {
    let file = load(path, color_choice);

    let mut files = SimpleFiles::new();
    let mut diagnostics = Vec::new();
    for (index, block) in file.blocks.iter().enumerate() {
        if block.block_type != BlockType::Query {
            continue;
        }
        if let Err(errors) = search::parse(&block.input) {
            let file_id = files.add(
                format!("{}#block-{}", path.display(), index + 1),
                block.input.clone(),
            );
            diagnostics.extend(errors.iter().map(|e| e.to_diagnostic(file_id)));
        }
    }

    if !diagnostics.is_empty() {
        emit(color_choice, &files, &diagnostics);
        process::exit(1);
    }
    eprintln!(
        "ok: {} blocks in {} checked",
        file.blocks.len(),
        path.display()
    );
}

fn do_blocks(path: &Path, color_choice: ColorChoice) {
    let file = load(path, color_choice);
    if let Some(title) = &file.title {
        println!("{}", title);
    }
    for (index, block) in file.blocks.iter().enumerate() {
        let summary = block.input.lines().next().unwrap_or("");
        println!("{:>3}. {:<5} {}", index + 1, block.block_type.as_str(), summary);
    }
}

fn emit(
    color_choice: ColorChoice,
    files: &SimpleFiles<String, String>,
    diagnostics: &[Diagnostic<usize>],
) {
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for diagnostic in diagnostics {
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, diagnostic);
    }
}
