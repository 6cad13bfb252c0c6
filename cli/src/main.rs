//! pdfsplit CLI - split PDF documents into per-section Markdown files

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfsplit::{SectionScope, SectionSelection, SplitOptions, Splitter};

#[derive(Parser)]
#[command(name = "pdfsplit")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Split PDF documents into per-section Markdown files", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sections found in the bookmark outline
    #[command(alias = "ls")]
    List {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Write one Markdown file per section
    Split(SplitArgs),

    /// Show version information
    Version,
}

#[derive(Args, Default)]
struct SplitArgs {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output directory (defaults to <FILE>_sections)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Section numbers as shown by `list` (e.g., "1,3,5-7")
    #[arg(short, long)]
    sections: Option<String>,

    /// Select a section by title (repeatable)
    #[arg(long = "title", value_name = "TITLE")]
    titles: Vec<String>,

    /// Merge sections deeper than this level into their parent's file
    #[arg(short = 'l', long)]
    split_level: Option<usize>,

    /// What a section covers
    #[arg(long, value_enum)]
    scope: Option<ScopeArg>,

    /// Do not prefix file names with section numbers
    #[arg(long)]
    no_number: bool,

    /// Drop running headers and footers near the page edges
    #[arg(long)]
    strip_margins: bool,

    /// Treat a document without bookmarks as a single section
    #[arg(long)]
    whole_document: bool,

    /// Extract sections one at a time
    #[arg(long)]
    sequential: bool,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE", env = "PDFSPLIT_CONFIG")]
    config: Option<PathBuf>,

    /// Write a JSON run summary to this file
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ScopeArg {
    /// Only the text before the first subsection (default)
    Own,
    /// The section and all of its subsections
    Subtree,
}

impl From<ScopeArg> for SectionScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Subtree => SectionScope::Subtree,
            ScopeArg::Own => SectionScope::OwnContent,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Some(Commands::List { input }) => cmd_list(&input),
        Some(Commands::Split(args)) => cmd_split(args),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: split if input is provided
            if let Some(input) = cli.input {
                cmd_split(SplitArgs {
                    input,
                    output: cli.output,
                    ..Default::default()
                })
            } else {
                println!("{}", "Usage: pdfsplit <FILE> [OUTPUT]".yellow());
                println!("       pdfsplit --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_list(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let session = Splitter::new().open(input)?;

    println!("{}", "Sections".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let page_count = session.page_count();
    for spec in session.sections() {
        let (first, last) = spec.page_span(page_count);
        let pages = if first == last {
            format!("p.{}", first + 1)
        } else {
            format!("p.{}-{}", first + 1, last + 1)
        };
        println!(
            "{:>4}. {}{}  {}",
            spec.index + 1,
            "  ".repeat(spec.depth),
            spec.title,
            pages.dimmed()
        );
    }

    println!("{}", "─".repeat(40).dimmed());
    println!(
        "{}: PDF {}  {}: {}  {}: {}  {}: {}",
        "Format".bold(),
        session.backend().version(),
        "Sections".bold(),
        session.sections().len(),
        "Pages".bold(),
        page_count,
        "Max level".bold(),
        session.max_level()
    );

    Ok(())
}

fn build_options(args: &SplitArgs) -> Result<SplitOptions, Box<dyn std::error::Error>> {
    let mut options = match &args.config {
        Some(path) => SplitOptions::from_json_file(path)?,
        None => SplitOptions::default(),
    };

    if let Some(level) = args.split_level {
        options = options.with_split_level(level);
    }
    if let Some(scope) = args.scope {
        options = options.with_scope(scope.into());
    }
    if args.no_number {
        options = options.with_numbered_files(false);
    }
    if args.strip_margins {
        options.extract = options.extract.strip_margins();
    }
    if args.whole_document {
        options = options.whole_document_fallback();
    }
    if args.sequential {
        options = options.sequential();
    }

    Ok(options)
}

fn build_selection(args: &SplitArgs) -> Result<SectionSelection, Box<dyn std::error::Error>> {
    match (&args.sections, args.titles.is_empty()) {
        (Some(_), false) => Err("use either --sections or --title, not both".into()),
        (Some(list), true) => Ok(SectionSelection::parse(list)?),
        (None, false) => Ok(SectionSelection::titles(args.titles.iter().cloned())),
        (None, true) => Ok(SectionSelection::All),
    }
}

fn cmd_split(args: SplitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let options = build_options(&args)?;
    let selection = build_selection(&args)?;

    let output_dir = args.output.clone().unwrap_or_else(|| {
        let stem = args.input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_sections", stem))
    });

    let session = Splitter::with_options(options).open(&args.input)?;
    if session.is_whole_document() {
        println!("{}", "No bookmarks found; writing the whole document as one file".yellow());
    }

    let (groups, mut failures) = session.selected_groups(&selection);
    let pb = ProgressBar::new(groups.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut run = session.render_groups_with(&groups, |spec| {
        pb.set_message(spec.title.clone());
        pb.inc(1);
    });
    pb.finish_and_clear();
    failures.append(&mut run.failures);
    run.failures = failures;

    run.write_to(&output_dir)?;
    log::info!("Wrote {} file(s) to {}", run.sections.len(), output_dir.display());

    if !run.sections.is_empty() {
        println!("\n{} {}", "Output files:".green().bold(), output_dir.display());
        let last = run.sections.len() - 1;
        for (i, section) in run.sections.iter().enumerate() {
            let branch = if i == last { "└─" } else { "├─" };
            let tables = match section.table_count {
                0 => String::new(),
                1 => " (1 table)".to_string(),
                n => format!(" ({} tables)", n),
            };
            println!("  {} {}{}", branch.dimmed(), section.file_name, tables.dimmed());
        }
    }

    if !run.failures.is_empty() {
        println!("\n{}", "Failed sections:".red().bold());
        for failure in &run.failures {
            let reason = if failure.fatal {
                failure.reason.red().to_string()
            } else {
                failure.reason.clone()
            };
            match failure.index {
                Some(i) => println!("  {:>4}. {}: {}", i + 1, failure.title, reason),
                None => println!("  {}", reason),
            }
        }
    }

    if let Some(path) = &args.summary {
        fs::write(path, serde_json::to_string_pretty(&run)?)?;
        println!("{} {}", "Summary saved to".green(), path.display());
    }

    println!(
        "\n{} {} file(s), {} table(s), {} failure(s)",
        "Done:".bold(),
        run.sections.len(),
        run.table_count(),
        run.failures.len()
    );

    if run.is_complete() {
        Ok(())
    } else {
        Err(format!("{} section(s) could not be written", run.failures.len()).into())
    }
}

fn cmd_version() {
    println!("{} {}", "pdfsplit".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Split PDF documents into per-section Markdown files");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/pdfsplit".dimmed());
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfsplit::OutlinePolicy;

    fn split_args(argv: &[&str]) -> SplitArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Some(Commands::Split(args)) => args,
            _ => panic!("expected split subcommand"),
        }
    }

    #[test]
    fn test_split_flags_map_to_options() {
        let args = split_args(&[
            "pdfsplit",
            "split",
            "manual.pdf",
            "-l",
            "2",
            "--scope",
            "subtree",
            "--no-number",
            "--whole-document",
            "--sequential",
            "--strip-margins",
        ]);
        let options = build_options(&args).unwrap();
        assert_eq!(options.split_level, Some(2));
        assert_eq!(options.extract.scope, SectionScope::Subtree);
        assert!(!options.numbered_files);
        assert!(!options.parallel);
        assert_eq!(options.outline_policy, OutlinePolicy::WholeDocument);
        assert!(options.extract.header_margin > 0.0);
    }

    #[test]
    fn test_config_file_with_flag_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("split.json");
        fs::write(&path, r#"{ "parallel": false, "split_level": 3 }"#).unwrap();

        let mut args = split_args(&["pdfsplit", "split", "manual.pdf", "-l", "1"]);
        args.config = Some(path);
        let options = build_options(&args).unwrap();
        assert!(!options.parallel);
        assert_eq!(options.split_level, Some(1));
    }

    #[test]
    fn test_selection_arguments() {
        let args = split_args(&["pdfsplit", "split", "manual.pdf", "-s", "1,3-4"]);
        assert_eq!(
            build_selection(&args).unwrap(),
            SectionSelection::Ranges(vec![0..1, 2..4])
        );

        let args = split_args(&["pdfsplit", "split", "manual.pdf", "--title", "Timing"]);
        assert_eq!(
            build_selection(&args).unwrap(),
            SectionSelection::Titles(vec!["Timing".into()])
        );

        let args = split_args(&["pdfsplit", "split", "manual.pdf", "-s", "1", "--title", "Timing"]);
        assert!(build_selection(&args).is_err());

        let args = split_args(&["pdfsplit", "split", "manual.pdf"]);
        assert_eq!(build_selection(&args).unwrap(), SectionSelection::All);
    }
}
