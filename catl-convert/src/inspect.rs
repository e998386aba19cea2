//! The read-only half of the CLI (§6.4): `--get-key`/`--get-key-tx` single
//! lookups and `--walk-state`/`--walk-txns` full traversals over an
//! existing v2 catalogue file, built entirely on [`CatalogueReader`].

use anyhow::{Context, Result};
use catl_types::Key256;
use catl_v2::{CatalogueReader, WalkOptions};
use std::path::PathBuf;

pub struct InspectArgs {
    pub input: PathBuf,
    pub get_key: Option<String>,
    pub get_key_tx: Option<String>,
    pub get_ledger: Option<u32>,
    pub walk_state: bool,
    pub walk_txns: bool,
    pub walk_options: WalkOptions,
}

fn parse_key(hex_str: &str) -> Result<Key256> {
    let bytes = hex::decode(hex_str).with_context(|| format!("invalid hex key {hex_str:?}"))?;
    Key256::from_slice(&bytes).with_context(|| format!("key {hex_str:?} is not 32 bytes"))
}

pub fn run(args: &InspectArgs) -> Result<()> {
    let mut reader = CatalogueReader::open(&args.input)
        .with_context(|| format!("opening v2 catalogue {}", args.input.display()))?;

    let seq = args
        .get_ledger
        .context("--get-ledger is required alongside --get-key/--get-key-tx/--walk-state/--walk-txns")?;
    if !reader.seek_to_ledger(seq) {
        anyhow::bail!("ledger {seq} not present in {}", args.input.display());
    }

    if let Some(hex_key) = &args.get_key {
        let key = parse_key(hex_key)?;
        match reader.lookup_key_in_state(&key)? {
            Some(data) => println!("{}", hex::encode_upper(data)),
            None => println!("not found"),
        }
    }

    if let Some(hex_key) = &args.get_key_tx {
        let key = parse_key(hex_key)?;
        match reader.lookup_key_in_tx(&key)? {
            Some(data) => println!("{}", hex::encode_upper(data)),
            None => println!("not found"),
        }
    }

    if args.walk_state {
        walk(&reader, args.walk_options, true)?;
    }
    if args.walk_txns {
        walk(&reader, args.walk_options, false)?;
    }

    Ok(())
}

fn walk(reader: &CatalogueReader, opts: WalkOptions, state: bool) -> Result<()> {
    if opts.parallel {
        let counter = std::sync::atomic::AtomicU64::new(0);
        let sync_emit = |key: Key256, data: &[u8]| -> bool {
            counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            println!("{} {}", key.hex(), hex::encode_upper(data));
            true
        };
        if state {
            reader.walk_state_items_parallel(opts, sync_emit)?;
        } else {
            reader.walk_tx_items_parallel(opts, sync_emit)?;
        }
        tracing::info!(
            items = counter.load(std::sync::atomic::Ordering::Relaxed),
            "walk complete"
        );
    } else {
        let mut count = 0u64;
        let emit = |key: Key256, data: &[u8]| -> bool {
            count += 1;
            println!("{} {}", key.hex(), hex::encode_upper(data));
            true
        };
        if state {
            reader.walk_state_items(emit)?;
        } else {
            reader.walk_tx_items(emit)?;
        }
        tracing::info!(items = count, "walk complete");
    }
    Ok(())
}

#[cfg(test)]
mod inspect_test;
