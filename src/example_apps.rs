use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, error::ErrorKind};
use serde::Serialize;

use crate::config::ScaffoldSplitConfig;
use crate::metrics::{SplitBalance, split_balance, straddling_groups};
use crate::rng::resolve_seed;
use crate::scaffold_split::assign_groups;
use crate::splits::SplitRatios;
use crate::types::RecordIndex;

#[derive(Debug, Parser)]
#[command(
    name = "scaffold_split_demo",
    disable_help_subcommand = true,
    about = "Split a SMILES list by Murcko scaffold",
    long_about = "Group molecules by Murcko scaffold, shuffle the groups with a seeded generator, and fill validation, test, then train with whole groups. Prints the resulting index sets as JSON.",
    after_help = "Input lines are read as SMILES: only the first whitespace-separated token is used; blank lines and lines starting with '#' are skipped."
)]
struct ScaffoldSplitDemoCli {
    #[arg(long, value_name = "PATH", help = "File with one SMILES per line")]
    input: PathBuf,
    #[arg(
        long = "split-ratios",
        value_name = "TRAIN,VALIDATION,TEST",
        value_parser = parse_split_ratios_arg,
        help = "Comma-separated split ratios that must sum to 1.0 [default: 0.8,0.1,0.1, or 0.9,0.1,0 with --train-valid]"
    )]
    split: Option<SplitRatios>,
    #[arg(long, help = "Optional deterministic seed; one is drawn at random when omitted")]
    seed: Option<u64>,
    #[arg(
        long = "include-chirality",
        help = "Let tetrahedral stereo distinguish scaffolds"
    )]
    include_chirality: bool,
    #[arg(
        long = "train-valid",
        help = "Two-way split with no test bucket (the test ratio must be 0)"
    )]
    train_valid: bool,
}

#[derive(Debug, Serialize)]
struct SplitReport {
    records: usize,
    scaffolds: usize,
    seed: u64,
    seed_drawn: bool,
    include_chirality: bool,
    straddling_groups: usize,
    train: Vec<RecordIndex>,
    validation: Vec<RecordIndex>,
    test: Vec<RecordIndex>,
    balance: SplitBalance,
}

/// Run the scaffold split demo and print its JSON report to stdout.
///
/// `args_iter` excludes the program name.
pub fn run_scaffold_split_demo<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    if let Some(report) = scaffold_split_report(args_iter)? {
        println!("{report}");
    }
    Ok(())
}

/// Parse demo arguments, run the split, and return the pretty-printed JSON
/// report. Returns `Ok(None)` when clap handled `--help`/`--version`.
pub fn scaffold_split_report<I>(args_iter: I) -> Result<Option<String>, Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let Some(cli) = parse_cli::<ScaffoldSplitDemoCli, _>(
        std::iter::once("scaffold_split_demo".to_string()).chain(args_iter),
    )?
    else {
        return Ok(None);
    };

    let ratios = cli
        .split
        .unwrap_or_else(|| {
            if cli.train_valid {
                SplitRatios::default_train_valid()
            } else {
                SplitRatios::default()
            }
        })
        .normalized()?;
    if cli.train_valid && ratios.test != 0.0 {
        return Err(format!(
            "--train-valid requires a zero test ratio, got {}",
            ratios.test
        )
        .into());
    }
    let seed = resolve_seed(cli.seed);
    let config = ScaffoldSplitConfig {
        ratios,
        seed: Some(seed),
        include_chirality: cli.include_chirality,
    };

    let smiles = read_smiles(&cli.input)?;
    let groups = config.splitter(&smiles).scaffold_groups()?;
    // a zero test ratio leaves the test bucket empty, which is the two-way split
    let split = assign_groups(
        groups.values().cloned().collect(),
        smiles.len(),
        ratios,
        Some(seed),
    );

    let report = SplitReport {
        records: smiles.len(),
        scaffolds: groups.len(),
        seed,
        seed_drawn: cli.seed.is_none(),
        include_chirality: config.include_chirality,
        straddling_groups: straddling_groups(groups.values(), &split),
        balance: split_balance(&split, ratios),
        train: split.train,
        validation: split.validation,
        test: split.test,
    };
    Ok(Some(serde_json::to_string_pretty(&report)?))
}

fn read_smiles(path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("failed to read SMILES list {}: {err}", path.display()))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect())
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn parse_split_ratios_arg(raw: &str) -> Result<SplitRatios, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [train, validation, test] = parts[..] else {
        return Err("--split-ratios expects exactly 3 comma-separated values".to_string());
    };
    let parse = |label: &str, value: &str| {
        value
            .parse::<f64>()
            .map_err(|_| format!("invalid {label} ratio '{value}': must be a float"))
    };
    SplitRatios::new(
        parse("train", train)?,
        parse("validation", validation)?,
        parse("test", test)?,
    )
    .normalized()
    .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_ratio_arg_parses_and_validates() {
        let ratios = parse_split_ratios_arg("0.7, 0.2, 0.1").unwrap();
        assert_eq!(ratios, SplitRatios::new(0.7, 0.2, 0.1));

        assert!(
            parse_split_ratios_arg("0.7,0.3")
                .unwrap_err()
                .contains("exactly 3")
        );
        assert!(
            parse_split_ratios_arg("0.7,abc,0.1")
                .unwrap_err()
                .contains("invalid validation ratio")
        );
        assert!(
            parse_split_ratios_arg("0.7,0.2,0.2")
                .unwrap_err()
                .contains("must sum to 1.0")
        );
        assert!(
            parse_split_ratios_arg("x,0.2,0.1")
                .unwrap_err()
                .contains("invalid train ratio 'x'")
        );
        assert!(
            parse_split_ratios_arg("0.5,0.25,0.25,0")
                .unwrap_err()
                .contains("exactly 3")
        );
    }

    #[test]
    fn help_short_circuits_without_reading_input() {
        let report = scaffold_split_report(["--help".to_string()].into_iter()).unwrap();
        assert!(report.is_none());
    }

    #[test]
    fn missing_input_flag_is_an_error() {
        assert!(scaffold_split_report(std::iter::empty()).is_err());
    }
}
