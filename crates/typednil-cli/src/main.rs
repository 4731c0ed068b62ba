use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use typednil_core::config::{self, Config};
use typednil_core::driver::{self, AnalysisOutput, DriverOptions};
use typednil_diagnostics::human::format_human;

/// Build a long version string: "0.1.0 (abc12345)"
fn long_version() -> &'static str {
    // Leaked once at startup to get a 'static str
    let s = format!("{} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));
    Box::leak(s.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "typednil")]
#[command(about = "Finds Go comparisons between a typed nil and an untyped nil")]
#[command(version, long_version = long_version())]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an IR file and report typed-nil comparisons
    Check {
        /// IR JSON produced by the Go front-end
        input: PathBuf,
        /// Output format: human, json
        #[arg(long, default_value = "human")]
        format: String,
        /// Severity threshold: info, warning, error, critical
        #[arg(long)]
        severity: Option<String>,
        /// Max diagnostics to report (0 = unlimited)
        #[arg(long)]
        max_diagnostics: Option<usize>,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Print the facts exported for every analyzed function
    Facts {
        /// IR JSON produced by the Go front-end
        input: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Explain a rule in detail
    Explain {
        /// Rule code (e.g., TNIL001)
        rule: String,
    },
    /// Write a default typednil.toml in the current directory
    Init,
}

/// Settings shared by every command that runs the analysis.
#[derive(Args)]
struct RunArgs {
    /// Override the facts directory
    #[arg(long)]
    facts_dir: Option<String>,
    /// Do not read or write persisted facts
    #[arg(long)]
    no_persist: bool,
    /// Raw flag string forwarded to the analyzer
    #[arg(long)]
    flags: Option<String>,
}

impl RunArgs {
    fn apply(self, config: &mut Config) {
        if let Some(dir) = self.facts_dir {
            config.typednil.facts_dir = Some(dir);
        }
        if self.no_persist {
            config.typednil.no_persist = true;
        }
        if let Some(flags) = self.flags {
            config.typednil.flags = flags;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Log to stderr so stdout stays clean for machine output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    match cli.command {
        Commands::Check {
            input,
            format,
            severity,
            max_diagnostics,
            no_color,
            run,
        } => run_check(CheckArgs {
            input,
            format,
            severity_override: severity,
            max_diagnostics,
            no_color,
            run,
        }),
        Commands::Facts { input, run } => run_facts(&input, run),
        Commands::Explain { rule } => run_explain(&rule),
        Commands::Init => run_init(),
    }
}

struct CheckArgs {
    input: PathBuf,
    format: String,
    severity_override: Option<String>,
    max_diagnostics: Option<usize>,
    no_color: bool,
    run: RunArgs,
}

/// Load config from the working directory, apply overrides, and run the driver.
fn analyze(
    input: &Path,
    run: RunArgs,
    overrides: impl FnOnce(&mut Config),
) -> Result<AnalysisOutput, String> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut config = config::load_config(&cwd).map_err(|e| e.to_string())?;
    run.apply(&mut config);
    overrides(&mut config);

    let options = DriverOptions::from_config(&config.typednil).map_err(|e| e.to_string())?;
    tracing::debug!(?options, "driver options");
    driver::analyze_file(input, &options).map_err(|e| e.to_string())
}

fn run_check(args: CheckArgs) -> ExitCode {
    let CheckArgs {
        input,
        format,
        severity_override,
        max_diagnostics,
        no_color,
        run,
    } = args;

    let output = analyze(&input, run, |config| {
        if let Some(sev) = severity_override {
            config.typednil.severity_threshold = sev;
        }
        if let Some(max) = max_diagnostics {
            config.typednil.max_diagnostics = max;
        }
    });

    match output {
        Ok(output) => {
            match format.as_str() {
                "json" => {
                    let report = serde_json::json!({
                        "diagnostics": output.diagnostics,
                        "summary": output.summary,
                    });
                    let json = serde_json::to_string_pretty(&report)
                        .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"));
                    println!("{json}");
                }
                _ => print!("{}", format_human(&output.diagnostics, !no_color)),
            }

            // Exit code: 0 clean, 1 issues found
            if output.diagnostics.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run_facts(input: &Path, run: RunArgs) -> ExitCode {
    match analyze(input, run, |_| {}) {
        Ok(output) => {
            for fact in &output.facts {
                println!("{}: {fact}", fact.function);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run_explain(rule: &str) -> ExitCode {
    let explanation = match rule.to_uppercase().as_str() {
        "TNIL001" => concat!(
            "TNIL001: Comparison between a typed nil and an untyped nil\n\n",
            "An interface value holding a nil pointer is not itself nil: it\n",
            "carries a type. Comparing it against the bare `nil` literal is\n",
            "therefore always unequal, even though the pointer inside is nil.\n\n",
            "Example:\n",
            "  func E() error { var p *MyError; return p }\n\n",
            "  err := E()\n",
            "  if err != nil { // always true\n",
            "  }\n\n",
            "The same happens when a nil pointer result is assigned to a\n",
            "variable of interface type:\n",
            "  var err error\n",
            "  _, err = CE1() // CE1 returns (int, *MyError)\n",
            "  if err == nil { // always false\n",
            "  }\n\n",
            "Fix: return the untyped `nil` from functions declared to return an\n",
            "interface, and keep concrete pointer results in variables of the\n",
            "concrete type until they are known to be non-nil.",
        ),
        _ => {
            eprintln!("Unknown rule: {rule}. Available rules: TNIL001.");
            return ExitCode::from(2);
        }
    };
    println!("{explanation}");
    ExitCode::SUCCESS
}

fn run_init() -> ExitCode {
    let config_path = config::CONFIG_FILE_NAME;
    if Path::new(config_path).exists() {
        eprintln!("{config_path} already exists");
        return ExitCode::from(2);
    }

    match std::fs::write(config_path, config::DEFAULT_CONFIG_TOML) {
        Ok(()) => {
            println!("Created {config_path}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
