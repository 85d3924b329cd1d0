//! # Ringfold CLI - Partition Functions from the Command Line
//!
//! A command-line interface for the ringfold partition function engine.
//!
//! ## Usage
//!
//! ```bash
//! # Partition function of a single strand
//! ringfold -s GGGGAAAACCCC
//!
//! # A covalently closed circle
//! ringfold -s GGGGAAAACCCC --circle
//!
//! # A two-strand complex with base-pair probabilities
//! ringfold -s GGGGCC GGCCCC --bpp
//!
//! # Log-derivatives with respect to every model parameter
//! ringfold -s GGGGAAAACCCC --calc-deriv
//! ```
//!
//! ## Options
//!
//! - `-s, --sequences <SEQ>...`: input strands (required)
//! - `-c, --circle`: treat the single input strand as circularized
//! - `--params <FILE>`: JSON parameter bundle overriding the defaults
//! - `--bpp`: print the base-pair probability matrix
//! - `--calc-deriv`: report d(log Z)/d(log p) for all parameter families
//! - `--deriv-params <NAME>...`: report derivatives for named parameters
//! - `--no-coax`: switch coaxial stacking off
//! - `-v, --verbose`: dump the dynamic programming matrices
//! - `-q, --quiet`: suppress progress messages

use std::error::Error;
use std::fs;
use std::io::{self, Write};

use clap::{Arg, ArgAction, Command};
use ringfold_core::config::RingfoldConfig;
use ringfold_core::constraints::Constraints;
use ringfold_core::derivs::DerivParameter;
use ringfold_core::output::write_all_matrices;
use ringfold_core::pairs::BasePairRegistry;
use ringfold_core::params::ModelParams;
use ringfold_core::topology::Topology;
use ringfold_core::PartitionCalculation;

fn main() -> Result<(), Box<dyn Error>> {
    let matches = Command::new("ringfold")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Nearest-neighbor partition functions for circular and multi-strand nucleic acids")
        .arg(
            Arg::new("sequences")
                .short('s')
                .long("sequences")
                .value_name("SEQ")
                .num_args(1..)
                .required(true)
                .help("Input strands, one argument per strand"),
        )
        .arg(
            Arg::new("circle")
                .short('c')
                .long("circle")
                .action(ArgAction::SetTrue)
                .help("Treat the single input strand as a covalently closed circle"),
        )
        .arg(
            Arg::new("params")
                .long("params")
                .value_name("FILE")
                .help("JSON parameter bundle overriding the defaults"),
        )
        .arg(
            Arg::new("bpp")
                .long("bpp")
                .action(ArgAction::SetTrue)
                .help("Print the base-pair probability matrix"),
        )
        .arg(
            Arg::new("calc-deriv")
                .long("calc-deriv")
                .action(ArgAction::SetTrue)
                .help("Report d(log Z)/d(log p) for every parameter family"),
        )
        .arg(
            Arg::new("deriv-params")
                .long("deriv-params")
                .value_name("NAME")
                .num_args(1..)
                .help("Report derivatives for the named parameters only"),
        )
        .arg(
            Arg::new("no-coax")
                .long("no-coax")
                .action(ArgAction::SetTrue)
                .help("Switch coaxial stacking off"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Dump the dynamic programming matrices"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Suppress progress messages"),
        )
        .get_matches();

    let mut params = if let Some(path) = matches.get_one::<String>("params") {
        let text = fs::read_to_string(path)?;
        serde_json::from_str::<ModelParams>(&text)?
    } else {
        ModelParams::default()
    };
    if matches.get_flag("no-coax") {
        params.k_coax = 0.0;
    }

    let mut registry = BasePairRegistry::with_wobble()?;
    registry.register_default_lowercase()?;

    let mut deriv_parameters = Vec::new();
    if matches.get_flag("calc-deriv") {
        deriv_parameters = vec![
            DerivParameter::LoopClosure,
            DerivParameter::BasePairLength,
            DerivParameter::LoopInitiation,
        ];
        // One Kd per chemistry; the flipped orientation shares it.
        for (type_id, pair_type) in registry.iter() {
            if type_id <= pair_type.flipped {
                deriv_parameters.push(DerivParameter::Dissociation(Some(type_id)));
            }
        }
        deriv_parameters.extend([
            DerivParameter::StackedPair(None),
            DerivParameter::CoaxialStack,
            DerivParameter::CoaxialLoopClosure,
        ]);
    } else if let Some(names) = matches.get_many::<String>("deriv-params") {
        for name in names {
            match DerivParameter::parse(name, &registry) {
                Some(parameter) => deriv_parameters.push(parameter),
                None => eprintln!("Did not recognize parameter '{name}', skipping"),
            }
        }
    }

    let strands: Vec<&str> = matches
        .get_many::<String>("sequences")
        .unwrap()
        .map(String::as_str)
        .collect();
    let topology = Topology::from_strands(&strands, matches.get_flag("circle"))?;

    let mut calculation = PartitionCalculation::new(
        topology,
        registry.clone(),
        params,
        Constraints::none(),
        RingfoldConfig {
            quiet: matches.get_flag("quiet"),
            ..Default::default()
        },
    )?;
    calculation.execute()?;

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    writeln!(writer, "N = {}", calculation.topology().len())?;
    writeln!(writer, "Z = {:e}", calculation.z())?;

    if !deriv_parameters.is_empty() {
        let values = calculation.log_derivatives(&deriv_parameters)?;
        for (parameter, value) in deriv_parameters.iter().zip(values) {
            writeln!(
                writer,
                "dlogZ/dlog{} = {:.6}",
                parameter.label(&registry),
                value
            )?;
        }
    }

    if matches.get_flag("bpp") {
        let probabilities = calculation.base_pair_probabilities();
        writeln!(writer)?;
        writeln!(writer, "----- base pair probabilities -----")?;
        for row in &probabilities {
            let mut line = String::new();
            for &probability in row {
                line.push_str(&format!(" {probability:8.4}"));
            }
            writeln!(writer, "{line}")?;
        }
    }

    if matches.get_flag("verbose") {
        write_all_matrices(&mut writer, &calculation)?;
    }

    Ok(())
}
