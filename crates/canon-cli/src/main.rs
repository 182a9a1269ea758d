use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use canon_contracts::CANON_TOOL_REPORT_SCHEMA_VERSION;
use canon_core::autocorrect::autocorrect;
use canon_core::config::CanonConfig;
use canon_core::diagnostics::{Diagnostic, Location, Report, Stage};
use canon_core::lint::{lint_ast, LintOptions};
use canon_core::rules::RULES;
use canon_reader::read_source;

#[derive(Parser)]
#[command(name = "canon")]
#[command(about = "Canonical ordering checks for Ruby sources.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Report offenses without changing the file.
    Check {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        report_json: bool,
    },
    /// Apply every correction until the file is stable.
    Fix {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        write: bool,
        #[arg(long)]
        report_json: bool,
    },
    /// List the rules and their messages.
    Rules,
}

#[derive(Debug, Serialize)]
struct CanonToolReport {
    schema_version: &'static str,
    command: &'static str,
    ok: bool,
    r#in: String,
    diagnostics_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    passes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<usize>,
    exit_code: u8,
}

impl CanonToolReport {
    fn new(
        command: &'static str,
        input: &Path,
        diagnostics: Vec<Diagnostic>,
        exit_code: u8,
    ) -> Self {
        Self {
            schema_version: CANON_TOOL_REPORT_SCHEMA_VERSION,
            command,
            ok: exit_code == 0,
            r#in: input.display().to_string(),
            diagnostics_count: diagnostics.len(),
            diagnostics,
            passes: None,
            applied: None,
            exit_code,
        }
    }
}

/// A failure that ends the command with exit code 2.
struct Failure {
    code: &'static str,
    stage: Stage,
    message: String,
}

fn main() -> std::process::ExitCode {
    init_tracing();
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            std::process::ExitCode::from(2)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CANON_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn try_main() -> Result<std::process::ExitCode> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Check {
            input,
            config,
            report_json,
        } => cmd_check(&input, config.as_deref(), report_json),
        Cmd::Fix {
            input,
            config,
            write,
            report_json,
        } => cmd_fix(&input, config.as_deref(), write, report_json),
        Cmd::Rules => {
            for (name, message) in RULES {
                println!("{name}: {message}");
            }
            Ok(std::process::ExitCode::SUCCESS)
        }
    }
}

fn cmd_check(
    input: &Path,
    config: Option<&Path>,
    report_json: bool,
) -> Result<std::process::ExitCode> {
    let loaded = load_config(config).and_then(|cfg| Ok((cfg, read_input(input)?)));
    let (cfg, text) = match loaded {
        Ok(v) => v,
        Err(failure) => return fail("check", input, failure, report_json),
    };
    let report = match lint_text(&text, &cfg) {
        Ok(report) => report,
        Err(failure) => return fail("check", input, failure, report_json),
    };
    info!(
        input = %input.display(),
        offenses = report.diagnostics.len(),
        "checked"
    );

    let exit_code = if report.ok { 0 } else { 1 };
    if report_json {
        print_json(&CanonToolReport::new(
            "check",
            input,
            report.diagnostics,
            exit_code,
        ))?;
    } else {
        for d in &report.diagnostics {
            println!("{}", offense_line(input, d));
        }
    }
    Ok(std::process::ExitCode::from(exit_code))
}

fn cmd_fix(
    input: &Path,
    config: Option<&Path>,
    write: bool,
    report_json: bool,
) -> Result<std::process::ExitCode> {
    if report_json && !write {
        return fail(
            "fix",
            input,
            Failure {
                code: "CANON-CLI-ARGS-0001",
                stage: Stage::Config,
                message: "--report-json requires --write (otherwise stdout would be the corrected source)"
                    .to_string(),
            },
            true,
        );
    }

    let loaded = load_config(config).and_then(|cfg| Ok((cfg, read_input(input)?)));
    let (cfg, text) = match loaded {
        Ok(v) => v,
        Err(failure) => return fail("fix", input, failure, report_json),
    };

    let corrected = match autocorrect(&text, &cfg, read_source) {
        Ok(corrected) => corrected,
        Err(err) => {
            let failure = Failure {
                code: "CANON-FIX-0001",
                stage: Stage::Rewrite,
                message: err.to_string(),
            };
            return fail("fix", input, failure, report_json);
        }
    };
    let remaining = match lint_text(&corrected.text, &cfg) {
        Ok(report) => report,
        Err(failure) => return fail("fix", input, failure, report_json),
    };
    info!(
        input = %input.display(),
        passes = corrected.passes,
        applied = corrected.applied,
        remaining = remaining.diagnostics.len(),
        "fixed"
    );

    if write {
        if corrected.applied > 0 {
            if let Err(err) = std::fs::write(input, corrected.text.as_bytes()) {
                let failure = Failure {
                    code: "CANON-IO-WRITE-0001",
                    stage: Stage::Rewrite,
                    message: format!("write {}: {err}", input.display()),
                };
                return fail("fix", input, failure, report_json);
            }
        }
    } else {
        print!("{}", corrected.text);
    }

    let exit_code = if remaining.ok { 0 } else { 1 };
    if report_json {
        let mut report = CanonToolReport::new("fix", input, remaining.diagnostics, exit_code);
        report.passes = Some(corrected.passes);
        report.applied = Some(corrected.applied);
        print_json(&report)?;
    } else {
        for d in &remaining.diagnostics {
            eprintln!("{}", offense_line(input, d));
        }
    }
    Ok(std::process::ExitCode::from(exit_code))
}

fn load_config(path: Option<&Path>) -> Result<CanonConfig, Failure> {
    let Some(path) = path else {
        return Ok(CanonConfig::default());
    };
    let bytes = std::fs::read(path).map_err(|err| Failure {
        code: "CANON-IO-READ-0002",
        stage: Stage::Config,
        message: format!("read config {}: {err}", path.display()),
    })?;
    CanonConfig::from_json_bytes(&bytes).map_err(|err| Failure {
        code: "CANON-CONFIG-0001",
        stage: Stage::Config,
        message: format!("{}: {err}", path.display()),
    })
}

fn read_input(input: &Path) -> Result<String, Failure> {
    std::fs::read_to_string(input).map_err(|err| Failure {
        code: "CANON-IO-READ-0001",
        stage: Stage::Read,
        message: format!("read input {}: {err}", input.display()),
    })
}

fn lint_text(text: &str, cfg: &CanonConfig) -> Result<Report, Failure> {
    let ast = read_source(text).map_err(|err| Failure {
        code: "CANON-READ-0001",
        stage: Stage::Read,
        message: err.to_string(),
    })?;
    Ok(lint_ast(&ast, cfg, LintOptions { autocorrect: true }))
}

fn fail(
    command: &'static str,
    input: &Path,
    failure: Failure,
    report_json: bool,
) -> Result<std::process::ExitCode> {
    if report_json {
        let diagnostic = Diagnostic::error(failure.code, failure.stage, failure.message);
        print_json(&CanonToolReport::new(command, input, vec![diagnostic], 2))?;
        return Ok(std::process::ExitCode::from(2));
    }
    Err(anyhow::anyhow!("{}: {}", failure.code, failure.message))
        .with_context(|| format!("canon {command}: {}", input.display()))
}

/// `file:line:col: code: message`
fn offense_line(input: &Path, d: &Diagnostic) -> String {
    let (line, col) = match &d.loc {
        Some(Location::Text { span, .. }) => (span.start.line, span.start.col),
        None => (0, 0),
    };
    format!(
        "{}:{line}:{col}: {}: {}",
        input.display(),
        d.code,
        d.message
    )
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
