use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, ArgGroup, Parser};
use tracing::Level;

use histedit::style::{ColorMode, Paint};
use histedit::{CommitGraph, Config, Git, ReplayOptions, Request, log};

#[derive(Parser)]
#[command(name = "histedit")]
#[command(about = "Reorder, squash, and delete commits on the current branch")]
#[command(group(ArgGroup::new("action").args(["relocate", "delete", "squash", "is_clean"])))]
struct Cli {
    /// Move COMMIT (or COMMIT through LAST) to directly follow ROOT
    #[arg(short = 'm', long = "move", num_args = 2..=3, value_names = ["ROOT", "COMMIT", "LAST"])]
    relocate: Option<Vec<String>>,

    /// Delete a commit and replay everything after it
    #[arg(short = 'd', long, value_name = "COMMIT")]
    delete: Option<String>,

    /// Squash COMMIT into its parent, or squash START..END into START
    #[arg(short = 's', long, num_args = 1..=2, value_names = ["START", "END"])]
    squash: Option<Vec<String>>,

    /// Report whether the working tree is clean
    #[arg(long = "is-clean", alias = "isClean")]
    is_clean: bool,

    /// Baseline for the branch overview (default: origin/master)
    #[arg(long)]
    upstream: Option<String>,

    /// When to color the branch overview
    #[arg(long, value_enum)]
    color: Option<ColorMode>,

    /// Configuration file (default: .histedit.toml in the repository root)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip checking the replayed tree against the expected result
    #[arg(long)]
    no_verify: bool,

    /// Print the replay plan without touching the repository
    #[arg(long)]
    dry_run: bool,

    /// Log more detail to stderr (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

enum Action {
    Log,
    IsClean,
    Edit(Request),
}

impl Cli {
    fn action(&self) -> Action {
        if let Some(args) = &self.relocate {
            return Action::Edit(Request::Move {
                root: args[0].clone(),
                first: args[1].clone(),
                last: args.get(2).cloned(),
            });
        }
        if let Some(target) = &self.delete {
            return Action::Edit(Request::Delete {
                target: target.clone(),
            });
        }
        if let Some(args) = &self.squash {
            return Action::Edit(Request::Squash {
                first: args[0].clone(),
                last: args.get(1).cloned(),
            });
        }
        if self.is_clean {
            return Action::IsClean;
        }
        Action::Log
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();

    let mut git = Git::discover(Path::new(".")).context("histedit must run inside a git repository")?;
    let config = match &cli.config {
        Some(path) => Config::load(path),
        None => Config::discover(git.root()),
    };

    match cli.action() {
        Action::Log => {
            let config = config.unwrap_or_else(|e| {
                tracing::warn!("{e}; using default settings");
                Config::default()
            });
            let upstream = cli.upstream.as_deref().unwrap_or(&config.upstream);
            let painter = cli.color.unwrap_or(config.color).painter();
            print_log(&git, upstream, painter.as_ref())?;
        }
        Action::IsClean => {
            if git.is_clean()? {
                println!("status is clean");
            } else {
                println!("status is not clean");
            }
        }
        Action::Edit(request) => {
            let config = config?;
            let options = ReplayOptions {
                verify: config.verify && !cli.no_verify,
            };
            rewrite(&mut git, &request, &options, cli.dry_run)?;
        }
    }

    Ok(())
}

fn print_log(git: &Git, upstream: &str, painter: &dyn Paint) -> anyhow::Result<()> {
    if !git.ref_exists(upstream) {
        tracing::warn!("upstream '{upstream}' does not exist; nothing to list");
        return Ok(());
    }
    let raw = git
        .log(upstream)
        .with_context(|| format!("failed to list commits since {upstream}"))?;
    for line in log::render(&log::parse(&raw), painter) {
        println!("{line}");
    }
    Ok(())
}

fn rewrite(
    git: &mut Git,
    request: &Request,
    options: &ReplayOptions,
    dry_run: bool,
) -> anyhow::Result<()> {
    let edit = request.resolve(&*git).context("failed to resolve commits")?;
    let tip = git.head().context("failed to resolve HEAD")?;
    let plan = edit
        .plan(&*git, &tip)
        .with_context(|| format!("cannot {edit}"))?;

    if dry_run {
        println!("{edit}");
        print!("{plan}");
        return Ok(());
    }

    let outcome = histedit::apply(git, &plan, options).with_context(|| format!("failed to {edit}"))?;
    println!(
        "{edit}: rewrote {} commit(s), branch now at {}",
        outcome.rewritten.len(),
        outcome.tip
    );
    Ok(())
}
