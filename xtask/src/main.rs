// Licensed under the Apache-2.0 license

use anyhow::{bail, Context, Result};
use std::process::Command;

const PACKAGE: &str = "mssp-i2c";
const DEFAULT_EMBEDDED_TARGET: &str = "thumbv7em-none-eabihf";

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (task, rest) = match args.split_first() {
        Some((task, rest)) => (task.as_str(), rest),
        None => {
            print_usage();
            return Ok(());
        }
    };

    match task {
        "test" => test(),
        "clippy" => clippy(),
        "check-no-std" => check_no_std(target_arg(rest)?),
        "ci" => {
            test()?;
            clippy()?;
            check_no_std(DEFAULT_EMBEDDED_TARGET)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            print_usage();
            bail!("unknown task `{other}`")
        }
    }
}

fn print_usage() {
    println!(
        "Usage: cargo xtask <task>

Tasks:
  test                        host tests, simulated peripheral included
  clippy                      lints for the library and its tests
  check-no-std [--target T]   build the library for a bare-metal target
                              (default: {DEFAULT_EMBEDDED_TARGET})
  ci                          all of the above"
    );
}

fn target_arg(rest: &[String]) -> Result<&str> {
    match rest {
        [] => Ok(DEFAULT_EMBEDDED_TARGET),
        [flag, target] if flag == "--target" => Ok(target.as_str()),
        _ => bail!("expected `--target <triple>`"),
    }
}

/// Host tests run with `std` so the simulated MSSP is compiled in.
fn test() -> Result<()> {
    cargo(&["test", "-p", PACKAGE, "--features", "std"])
}

fn clippy() -> Result<()> {
    cargo(&[
        "clippy",
        "-p",
        PACKAGE,
        "--all-targets",
        "--features",
        "std",
        "--",
        "-D",
        "warnings",
    ])
}

fn check_no_std(target: &str) -> Result<()> {
    cargo(&["build", "-p", PACKAGE, "--release", "--target", target])
}

fn cargo(args: &[&str]) -> Result<()> {
    println!("Running cargo {}", args.join(" "));

    let status = Command::new(std::env::var("CARGO").unwrap_or_else(|_| "cargo".into()))
        .args(args)
        .status()
        .with_context(|| format!("Failed to run cargo {}", args.join(" ")))?;

    if !status.success() {
        bail!("cargo {} failed: {}", args.join(" "), status);
    }
    Ok(())
}
