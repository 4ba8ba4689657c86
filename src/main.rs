//! gf2code: command-line front end for the gf2code library.
//!
//! Builds a code from a JSON configuration and encodes, decodes or describes
//! it. Bits are given and printed as strings of `0` and `1`.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use gf2code::prelude::*;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

fn parse_bits(text: &str) -> Result<Vec<u8>> {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '0' => Ok(0),
            '1' => Ok(1),
            other => bail!("invalid bit character {:?}", other),
        })
        .collect()
}

fn format_bits(bits: &[u8]) -> String {
    bits.iter().map(|&b| if b == 0 { '0' } else { '1' }).collect()
}

fn load_config(matches: &ArgMatches) -> Result<CodeConfig> {
    let source = matches
        .get_one::<String>("config")
        .context("missing --config")?;
    let json = if source.trim_start().starts_with('{') {
        source.clone()
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read configuration file {}", source))?
    };
    CodeConfig::from_json(&json).context("Failed to parse configuration")
}

fn bits_arg(matches: &ArgMatches) -> Result<Vec<u8>> {
    let text = matches.get_one::<String>("bits").context("missing --bits")?;
    parse_bits(text)
}

fn run_encode<C: LinearCode>(code: Arc<C>, padding: Padding, bits: &[u8]) -> Result<()> {
    let encoder = BlockEncoder::new(code).with_padding(padding);
    let encoded = encoder.encode(bits).context("Encoding failed")?;
    println!("{}", format_bits(&encoded));
    Ok(())
}

fn run_decode<C: LinearCode>(code: Arc<C>, method: Option<DecodingMethod>, bits: &[u8]) -> Result<()> {
    let mut decoder = BlockDecoder::new(code);
    if let Some(method) = method {
        decoder = decoder.with_method(method);
    }
    let decoded = decoder.decode(bits).context("Decoding failed")?;
    println!("{}", format_bits(&decoded.message));
    let flags: String = decoded
        .uncorrectable
        .iter()
        .map(|&flag| if flag { 'x' } else { '.' })
        .collect();
    println!("{}", flags);
    if decoded.any_uncorrectable() {
        warn!(
            "{} of {} blocks flagged uncorrectable",
            decoded.uncorrectable.iter().filter(|&&flag| flag).count(),
            decoded.blocks()
        );
    }
    Ok(())
}

fn run_info(config: &CodeConfig) -> Result<()> {
    if config.is_convolutional() {
        let code = config.build_terminated()?;
        let inner = code.convolutional_code();
        println!("family: terminated convolutional ({:?})", code.mode());
        println!("length: {}", code.length());
        println!("dimension: {}", code.dimension());
        println!("rate: {:.4}", LinearCode::rate(&code));
        println!("overall constraint length: {}", inner.overall_constraint_length());
        println!("memory order: {}", inner.memory_order());
        println!("minimum distance: {}", code.minimum_distance());
        return Ok(());
    }
    let code = config.build()?;
    println!("family: {:?}", code.family());
    println!("length: {}", code.length());
    println!("dimension: {}", code.dimension());
    println!("rate: {:.4}", code.rate());
    if code.dimension() <= gf2code::block::MAX_ENUMERATION_DIMENSION {
        println!("minimum distance: {}", code.minimum_distance());
        println!("packing radius: {}", code.packing_radius());
    }
    println!("default decoder: {:?}", code.default_method());
    Ok(())
}

fn main() -> Result<()> {
    let config_arg = Arg::new("config")
        .short('c')
        .long("config")
        .help("JSON configuration, inline or as a file path")
        .required(true)
        .value_name("JSON");
    let bits_arg_def = Arg::new("bits")
        .short('b')
        .long("bits")
        .help("Bit string of 0s and 1s")
        .required(true)
        .value_name("BITS");

    let matches = Command::new("gf2code")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Error-control coding over GF(2)")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("info")
                .about("Print the parameters of the configured code")
                .arg(config_arg.clone()),
        )
        .subcommand(
            Command::new("encode")
                .about("Encode a bit string block by block")
                .arg(config_arg.clone())
                .arg(bits_arg_def.clone()),
        )
        .subcommand(
            Command::new("decode")
                .about("Decode a bit string block by block")
                .arg(config_arg)
                .arg(bits_arg_def),
        )
        .get_matches();

    let level = if matches.get_flag("verbose") { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default subscriber")?;

    match matches.subcommand() {
        Some(("info", sub)) => run_info(&load_config(sub)?),
        Some(("encode", sub)) => {
            let config = load_config(sub)?;
            let bits = bits_arg(sub)?;
            info!("Encoding {} bits", bits.len());
            if config.is_convolutional() {
                run_encode(Arc::new(config.build_terminated()?), config.padding(), &bits)
            } else {
                run_encode(Arc::new(config.build()?), config.padding(), &bits)
            }
        }
        Some(("decode", sub)) => {
            let config = load_config(sub)?;
            let bits = bits_arg(sub)?;
            info!("Decoding {} bits", bits.len());
            if config.is_convolutional() {
                run_decode(Arc::new(config.build_terminated()?), config.decoding_method(), &bits)
            } else {
                run_decode(Arc::new(config.build()?), config.decoding_method(), &bits)
            }
        }
        _ => bail!("no subcommand given"),
    }
}
