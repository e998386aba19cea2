// Copyright (c) Catalogue Tools Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! The normative CLI surface of §6.4: convert a v1 ledger stream into a v2
//! catalogue file, or inspect an existing one (`--get-key`, `--walk-state`,
//! ...). Everything here is glue: the actual conversion and lookup logic
//! lives in [`convert`] and [`inspect`], built entirely on `catl-ledger`,
//! `catl-shamap` and `catl-v2`'s public APIs.

mod convert;
mod fixture;
mod inspect;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// Converts a v1 CATL stream into a v2 catalogue file, or inspects an
/// existing v2 file.
///
/// Conversion mode: pass `--input`/`--output` alone. Inspection mode: pass
/// any of `--get-key`, `--get-key-tx`, `--walk-state`, `--walk-txns`
/// alongside `--input` (read as an existing v2 file; `--output` is
/// ignored).
#[derive(Parser, Debug)]
#[command(name = "catl-convert", version)]
struct Cli {
    /// v1 source in convert mode, v2 catalogue file in inspect mode.
    #[arg(long)]
    input: PathBuf,

    /// Destination v2 catalogue file (convert mode only).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Stop after this many ledgers. `0` means "all" (default).
    #[arg(long, default_value_t = 0)]
    max_ledgers: u64,

    #[arg(long, overrides_with = "no_verify_and_test")]
    verify_and_test: bool,

    #[arg(long, overrides_with = "verify_and_test")]
    no_verify_and_test: bool,

    #[arg(long, default_value = "info")]
    log_level: String,

    /// Look up a key (hex) in the given ledger's state tree.
    #[arg(long, value_name = "HEX")]
    get_key: Option<String>,

    /// Look up a key (hex) in the given ledger's transaction tree.
    #[arg(long, value_name = "HEX")]
    get_key_tx: Option<String>,

    #[arg(long)]
    get_ledger: Option<u32>,

    /// Walk every item in the current ledger's state tree.
    #[arg(long)]
    walk_state: bool,

    /// Walk every item in the current ledger's transaction tree.
    #[arg(long)]
    walk_txns: bool,

    #[arg(long)]
    parallel: bool,

    #[arg(long)]
    prefetch: bool,

    #[arg(long, default_value_t = 0)]
    threads: usize,
}

impl Cli {
    fn verify_and_test(&self) -> bool {
        self.verify_and_test || !self.no_verify_and_test
    }

    fn is_inspect_mode(&self) -> bool {
        self.get_key.is_some()
            || self.get_key_tx.is_some()
            || self.walk_state
            || self.walk_txns
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    catl_types::logging::init(&cli.log_level);

    match run(&cli) {
        Ok(()) => ExitCode::from(0),
        Err(err) => {
            tracing::error!(error = %err, "catl-convert failed");
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if cli.is_inspect_mode() {
        inspect::run(&cli_to_inspect_args(cli))
    } else {
        let output = cli
            .output
            .clone()
            .ok_or_else(|| anyhow::anyhow!("--output is required in convert mode"))?;
        convert::run(&convert::ConvertArgs {
            input: cli.input.clone(),
            output,
            max_ledgers: cli.max_ledgers,
            verify_and_test: cli.verify_and_test(),
        })
    }
}

fn cli_to_inspect_args(cli: &Cli) -> inspect::InspectArgs {
    inspect::InspectArgs {
        input: cli.input.clone(),
        get_key: cli.get_key.clone(),
        get_key_tx: cli.get_key_tx.clone(),
        get_ledger: cli.get_ledger,
        walk_state: cli.walk_state,
        walk_txns: cli.walk_txns,
        walk_options: catl_v2::WalkOptions {
            parallel: cli.parallel,
            prefetch: cli.prefetch,
            num_threads: cli.threads,
        },
    }
}

#[cfg(test)]
mod main_test;
