//! # Ringfold - Partition Functions on Circular Coordinates
//!
//! A Rust engine for the equilibrium partition function of nucleic-acid
//! secondary structure over one or more strands, linear or circularized,
//! under a nearest-neighbor model extended with coaxial helix stacking and
//! configurable base-pair chemistries.
//!
//! ## Overview
//!
//! Every calculation runs on a single circular coordinate system: strand
//! breaks are just open bonds in a ligation vector, so the same recursions
//! serve linear strands, covalent circles, and non-covalent multi-strand
//! complexes. The engine fills a family of interdependent tables in strictly
//! increasing span order, then reads the total partition function from every
//! root position and cross-checks that all readings agree.
//!
//! ## Features
//!
//! - **Arbitrary topology**: linear, circular, and multi-strand inputs
//! - **Per-chemistry pair types**: Watson-Crick, wobble, and designed
//!   lowercase-wildcard pairs, each with its own dissociation constant
//! - **Derivative shadow**: per-entry d/dKd propagated with the fill
//! - **Decomposition records**: per-entry weighted decompositions for
//!   downstream backtracking and sampling layers
//! - **Closed-form gradients**: `d(log Z)/d(log p)` for every model
//!   parameter in O(N^2) after the fill
//!
//! ## Quick Start
//!
//! ```rust
//! use ringfold_core::{PartitionAnalyzer, config::RingfoldConfig};
//!
//! let analyzer = PartitionAnalyzer::new(RingfoldConfig {
//!     quiet: true,
//!     ..Default::default()
//! })?;
//!
//! let results = analyzer.analyze_strands(&["GGGGAAAACCCC"], false)?;
//! println!("Z = {:e}", results.z);
//! println!("p(0, 11) = {:.4}", results.base_pair_probabilities[0][11]);
//! # Ok::<(), ringfold_core::types::RingfoldError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`config`]: engine configuration (shadow computations, verbosity)
//! - [`constraints`]: externally forced base pairs
//! - [`engine`]: calculation driver, fill order, and cross-checks
//! - [`matrix`]: DP table abstraction with derivative and decomposition
//!   shadows
//! - `recursion`: the nine recurrences (crate-internal)
//! - [`derivs`]: closed-form log-derivative post-processor
//! - [`pairs`]: base-pair-type registry
//! - [`params`]: thermodynamic parameter bundle
//! - [`topology`]: sequence, ligation vector, and circular indexing
//! - [`results`]: analysis outputs
//! - [`output`]: plain-text table dumps
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, RingfoldError>`](types::RingfoldError).
//! Structural impossibilities inside the recursions are not errors; they
//! contribute zero. Errors are reserved for invalid inputs and numerically
//! degenerate outcomes.

pub mod config;
pub mod constants;
pub mod constraints;
pub mod derivs;
pub mod engine;
pub mod matrix;
pub mod output;
pub mod pairs;
pub mod params;
pub mod results;
pub mod topology;
pub mod types;

mod recursion;

pub use engine::{PartitionAnalyzer, PartitionCalculation};
pub use results::PartitionResults;
