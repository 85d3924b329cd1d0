use crate::derivs::DerivParameter;

/// Outputs of one partition function analysis.
///
/// # Examples
///
/// ```rust,no_run
/// use ringfold_core::PartitionAnalyzer;
/// use ringfold_core::config::RingfoldConfig;
///
/// let analyzer = PartitionAnalyzer::new(RingfoldConfig::default())?;
/// let results = analyzer.analyze_strands(&["GGGGAAAACCCC"], false)?;
///
/// println!("N = {}", results.sequence_length);
/// println!("Z = {:e}", results.z);
/// println!("p(0, 11) = {:.4}", results.base_pair_probabilities[0][11]);
/// # Ok::<(), ringfold_core::types::RingfoldError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PartitionResults {
    /// Number of positions on the circular coordinate system.
    pub sequence_length: usize,

    /// Number of physical strands in the input.
    pub num_strands: usize,

    /// Whether the input was treated as a covalently closed circle.
    pub circularized: bool,

    /// Total partition function (the root-0 reading).
    pub z: f64,

    /// The total re-derived from every root; all entries agree within the
    /// cross-check tolerance, and their spread is a numerical health signal.
    pub z_final: Vec<f64>,

    /// `probabilities[i][j]`: probability that positions `i` and `j` pair.
    pub base_pair_probabilities: Vec<Vec<f64>>,

    /// Requested `d(log Z)/d(log parameter)` values, in request order.
    /// Empty when no derivatives were requested.
    pub log_derivatives: Vec<(DerivParameter, f64)>,
}
