//! Operator-facing entry point. Thin consumer of `litter-core`; none of
//! the interposition logic lives here — this binary only assembles the
//! environment and `exec`s the target command, or inspects an artifact.
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use litter_core::DistributionArtifact;

#[derive(Parser, Debug)]
#[command(name = "litter-cli", version, about = "Heap-fragmentation profiling and littering")]
struct Args {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Record an allocation-size distribution for a command.
    Profile {
        /// Where to write (or, with --append, continue) the distribution artifact.
        #[arg(long)]
        data_filename: Option<PathBuf>,
        /// Continue an existing artifact instead of starting fresh.
        #[arg(long)]
        append: bool,
        /// Command to run under the profiler, e.g. `-- ./a.out --flag`.
        #[arg(trailing_var_arg = true, required = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Pre-age a command's heap from a recorded distribution.
    Litter {
        #[arg(long)]
        occupancy: Option<f64>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, conflicts_with = "sort")]
        shuffle: bool,
        #[arg(long, conflicts_with = "shuffle")]
        sort: bool,
        #[arg(long)]
        multiplier: Option<u64>,
        #[arg(long)]
        sleep: Option<u64>,
        /// Command to run after littering, e.g. `-- ./a.out --flag`.
        #[arg(trailing_var_arg = true, required = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Print a summary of a recorded distribution artifact.
    Inspect { artifact: PathBuf },
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt().with_writer(std::io::stderr).try_init();
    let args = Args::parse();
    match args.command {
        Cmd::Profile { data_filename, append, command } => run_profile(data_filename, append, &command),
        Cmd::Litter { occupancy, seed, shuffle, sort, multiplier, sleep, command } => {
            run_litter(occupancy, seed, shuffle, sort, multiplier, sleep, &command)
        }
        Cmd::Inspect { artifact } => run_inspect(&artifact),
    }
}

fn run_profile(data_filename: Option<PathBuf>, append: bool, command: &[String]) -> Result<()> {
    let mut cmd = exec_command(&cdylib_path("litter_profiler")?, command)?;
    if let Some(path) = data_filename {
        cmd.env("LITTER_DATA_FILENAME", path);
    }
    if append {
        cmd.env("LITTER_DETECTOR_APPEND", "1");
    }
    tracing::debug!(target: "litter_cli", command = ?command, append, "launching profiled command");
    Err(cmd.exec().into())
}

#[allow(clippy::too_many_arguments)]
fn run_litter(
    occupancy: Option<f64>,
    seed: Option<u64>,
    shuffle: bool,
    sort: bool,
    multiplier: Option<u64>,
    sleep: Option<u64>,
    command: &[String],
) -> Result<()> {
    let mut cmd = exec_command(&cdylib_path("litter_litterer")?, command)?;
    if let Some(occupancy) = occupancy {
        cmd.env("LITTER_OCCUPANCY", occupancy.to_string());
    }
    if let Some(seed) = seed {
        cmd.env("LITTER_SEED", seed.to_string());
    }
    if shuffle {
        cmd.env("LITTER_SHUFFLE", "1").env("LITTER_SORT", "0");
    }
    if sort {
        cmd.env("LITTER_SORT", "1").env("LITTER_SHUFFLE", "0");
    }
    if let Some(multiplier) = multiplier {
        cmd.env("LITTER_MULTIPLIER", multiplier.to_string());
    }
    if let Some(sleep) = sleep {
        cmd.env("LITTER_SLEEP", sleep.to_string());
    }
    tracing::debug!(target: "litter_cli", command = ?command, shuffle, sort, "launching littered command");
    Err(cmd.exec().into())
}

fn run_inspect(artifact_path: &Path) -> Result<()> {
    let artifact = DistributionArtifact::load(artifact_path)?;
    println!("size classes        : {}", artifact.size_classes.len());
    println!("total allocations    : {}", artifact.total_allocations());
    println!("max live allocations : {}", artifact.max_live_allocations);
    println!("ignored              : {}", artifact.ignored.unwrap_or(0));
    Ok(())
}

/// Builds a `Command` that preloads `library_path` ahead of `command[0]`,
/// replacing the CLI process on `exec` so the target's PID and standard
/// streams are unchanged — the only place this workspace shells out.
fn exec_command(library_path: &Path, command: &[String]) -> Result<Command> {
    let [program, rest @ ..] = command else {
        bail!("no command given to run under the preloaded library");
    };
    let mut cmd = Command::new(program);
    cmd.args(rest);
    cmd.env("LD_PRELOAD", library_path);
    Ok(cmd)
}

/// Locates the sibling `cdylib` artifact next to this binary, following
/// the platform's shared-library naming convention.
fn cdylib_path(crate_name: &str) -> Result<PathBuf> {
    let exe = std::env::current_exe().context("could not determine this binary's own path")?;
    let dir = exe.parent().context("executable path has no parent directory")?;
    let path = dir.join(cdylib_filename(crate_name));
    if !path.exists() {
        bail!(
            "{} not found next to {} — build it first with `cargo build -p {}`",
            path.display(),
            exe.display(),
            crate_name.replace('_', "-")
        );
    }
    Ok(path)
}

#[cfg(target_os = "macos")]
fn cdylib_filename(crate_name: &str) -> String {
    format!("lib{crate_name}.dylib")
}

#[cfg(all(unix, not(target_os = "macos")))]
fn cdylib_filename(crate_name: &str) -> String {
    format!("lib{crate_name}.so")
}
