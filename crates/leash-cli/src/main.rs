//! Leash CLI
//!
//! A command-line tool for running programs under resource limits.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use leash::{Config, EXAMPLE_CONFIG, ExitReason, ResourceLimits, Runner};
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "leash")]
#[command(about = "Run a command under CPU, memory, wall clock and output limits")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init {
        /// Output path (default: leash.toml)
        #[arg(short, long, default_value = "leash.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Run a program under limits
    Run {
        /// Limit profile from the configuration file
        #[arg(short, long)]
        profile: Option<String>,

        /// Address space limit in bytes
        #[arg(short, long)]
        memory: Option<u64>,

        /// CPU time limit in seconds
        #[arg(short = 't', long)]
        cputime: Option<f64>,

        /// Wall clock limit in seconds
        #[arg(short, long)]
        walltime: Option<f64>,

        /// Combined stdout + stderr limit in bytes
        #[arg(short, long)]
        output: Option<u64>,

        /// Captured stdout limit in bytes
        #[arg(long)]
        stdout_limit: Option<u64>,

        /// Captured stderr limit in bytes
        #[arg(long)]
        stderr_limit: Option<u64>,

        /// Environment override (KEY=VALUE), may be repeated
        #[arg(short, long = "env", value_name = "KEY=VALUE", value_parser = parse_env)]
        env: Vec<(String, String)>,

        /// Program to run
        #[arg(value_name = "PROGRAM")]
        program: String,

        /// Arguments passed to the program
        #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// List configured limit profiles
    Profiles,

    /// Show default configuration
    ShowConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
        Config::from_file(path).context("failed to load configuration")?
    } else {
        debug!("using default configuration");
        Config::default()
    };

    match cli.command {
        Commands::Init { output, force } => init_config(&output, force).await,
        Commands::Run {
            profile,
            memory,
            cputime,
            walltime,
            output,
            stdout_limit,
            stderr_limit,
            env,
            program,
            args,
        } => {
            let limits = ResourceLimits {
                memory,
                cputime,
                walltime,
                output,
                stdout: stdout_limit,
                stderr: stderr_limit,
            };
            run_program(config, profile.as_deref(), &limits, env, &program, args).await
        }
        Commands::Profiles => {
            list_profiles(&config);
            Ok(())
        }
        Commands::ShowConfig => {
            show_config(&config);
            Ok(())
        }
    }
}

fn parse_env(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

async fn run_program(
    config: Config,
    profile: Option<&str>,
    limits: &ResourceLimits,
    env: Vec<(String, String)>,
    program: &str,
    args: Vec<String>,
) -> Result<()> {
    let runner = Runner::new(config);

    // Only explicitly-specified values override the profile and defaults
    let mut command = runner
        .command(program, profile)
        .context("invalid profile")?
        .args(args)
        .limits(limits)
        .context("invalid limits")?;
    for (key, value) in env {
        command = command.env(key, value);
    }

    info!(program, ?profile, "running program");
    let result = runner.run(&command).await.context("execution failed")?;

    // Pass captured output through, keeping stdout clean for piping
    std::io::stdout()
        .write_all(result.stdout())
        .context("failed to write stdout")?;
    std::io::stderr()
        .write_all(result.stderr())
        .context("failed to write stderr")?;

    info!(
        reason = %result.exit_reason(),
        exit_code = result.exit_code(),
        signal = result.signal(),
        walltime = format_args!("{:.3}s", result.walltime()),
        stdout_bytes = result.stdout().len(),
        stderr_bytes = result.stderr().len(),
        "execution result"
    );

    // Exit with appropriate code
    if result.is_success() {
        Ok(())
    } else {
        std::process::exit(exit_status(
            result.exit_reason(),
            result.exit_code(),
            result.signal(),
        ));
    }
}

/// Shell-style exit status for a finished run. A limit hit is never reported
/// as success, even if the child itself exited 0.
fn exit_status(reason: ExitReason, code: Option<i32>, signal: Option<i32>) -> i32 {
    match (code, signal) {
        (Some(0), _) if reason.is_limit() => 1,
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}

fn list_profiles(config: &Config) {
    println!("Available profiles:\n");

    let mut profiles: Vec<_> = config.profiles.iter().collect();
    profiles.sort_by_key(|(name, _)| *name);

    for (name, limits) in profiles {
        println!("  {:<15} {}", name, describe_limits(limits));
    }
}

fn describe_limits(limits: &ResourceLimits) -> String {
    let mut parts = Vec::new();
    if let Some(v) = limits.memory {
        parts.push(format!("memory={v}B"));
    }
    if let Some(v) = limits.cputime {
        parts.push(format!("cputime={v}s"));
    }
    if let Some(v) = limits.walltime {
        parts.push(format!("walltime={v}s"));
    }
    if let Some(v) = limits.output {
        parts.push(format!("output={v}B"));
    }
    if let Some(v) = limits.stdout {
        parts.push(format!("stdout={v}B"));
    }
    if let Some(v) = limits.stderr {
        parts.push(format!("stderr={v}B"));
    }
    if parts.is_empty() {
        "(no limits)".to_string()
    } else {
        parts.join(" ")
    }
}

fn show_config(config: &Config) {
    println!("Default resource limits:");
    println!("  Memory: {:?} bytes", config.default_limits.memory);
    println!("  CPU time: {:?} s", config.default_limits.cputime);
    println!(
        "  Wall time: {:?} s (default {} s)",
        config.default_limits.walltime,
        leash::DEFAULT_WALLTIME
    );
    println!("  Output: {:?} bytes", config.default_limits.output);
    println!("  Stdout: {:?} bytes", config.default_limits.stdout);
    println!("  Stderr: {:?} bytes", config.default_limits.stderr);
    println!();
    println!("Environment overrides: {}", config.env.len());
    println!("Profiles configured: {}", config.profiles.len());
}

async fn init_config(output: &PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at '{}'. Use --force to overwrite.",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .context("failed to write configuration file")?;

    println!("Created configuration file at '{}'", output.display());
    Ok(())
}
