use crate::cli::LintArgs;
use color_eyre::eyre::{eyre, Result};
use duct::cmd;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Pure planning: which commands to run, and how to report them
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Fmt,
    Check,
    Clippy,
    Test,
}

const PIPELINE: [Step; 4] = [Step::Fmt, Step::Check, Step::Clippy, Step::Test];

/// A fully resolved `cargo` invocation.
#[derive(Debug, PartialEq, Eq)]
struct Invocation {
    step: Step,
    args: Vec<String>,
}

impl Invocation {
    fn display(&self) -> String {
        format!("cargo {}", self.args.join(" "))
    }
}

fn is_skipped(step: Step, args: &LintArgs) -> bool {
    match step {
        Step::Fmt => args.no_fmt,
        Step::Check => args.no_check,
        Step::Clippy => args.no_clippy,
        Step::Test => args.no_test,
    }
}

/// Arguments for one step. `--fix` makes fmt write and clippy apply
/// suggestions; `--package` scopes every step but fmt.
fn step_args(step: Step, args: &LintArgs) -> Vec<String> {
    let scope: Vec<String> = match &args.package {
        Some(package) => vec!["--package".into(), package.clone()],
        None => vec!["--workspace".into()],
    };

    let mut out: Vec<String> = Vec::new();
    match step {
        Step::Fmt => {
            out.push("fmt".into());
            out.push("--all".into());
            if !args.fix {
                out.push("--check".into());
            }
        }
        Step::Check => {
            out.push("check".into());
            out.extend(scope);
            out.push("--all-targets".into());
        }
        Step::Clippy => {
            out.push("clippy".into());
            out.extend(scope);
            out.push("--all-targets".into());
            if args.fix {
                out.push("--fix".into());
                out.push("--allow-dirty".into());
            }
            out.extend(["--", "-D", "warnings"].map(String::from));
        }
        Step::Test => {
            out.push("test".into());
            out.extend(scope);
        }
    }
    out
}

fn plan(args: &LintArgs) -> Vec<Invocation> {
    PIPELINE
        .into_iter()
        .filter(|step| !is_skipped(*step, args))
        .map(|step| Invocation {
            step,
            args: step_args(step, args),
        })
        .collect()
}

fn log_entry(invocation: &Invocation, success: bool, output: &str) -> String {
    let status = if success { "ok" } else { "FAILED" };
    format!("=== {} [{status}] ===\n{output}\n", invocation.display())
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

pub fn run(args: &LintArgs) -> Result<()> {
    let log_path = log_path()?;
    let mut log = fs::File::create(&log_path)?;

    for invocation in plan(args) {
        println!("> {}", invocation.display());

        let output = cmd("cargo", &invocation.args)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()?;
        let text = String::from_utf8_lossy(&output.stdout);
        let success = output.status.success();

        write!(log, "{}", log_entry(&invocation, success, &text))?;

        if !success {
            print!("{text}");
            println!("log: {}", log_path.display());
            return Err(eyre!("lint failed at: {}", invocation.display()));
        }
        if args.verbose {
            print!("{text}");
        }
    }

    println!("log: {}", log_path.display());
    Ok(())
}

fn log_path() -> Result<PathBuf> {
    let target_dir = std::env::current_dir()?.join("target");
    fs::create_dir_all(&target_dir)?;
    Ok(target_dir.join("xtask-lint.log"))
}
