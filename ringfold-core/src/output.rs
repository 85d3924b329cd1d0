//! Plain-text rendering of the filled DP tables.
//!
//! Diagnostic output for humans: each two-index table prints as a staircase
//! with row `i` shifted right by `i` columns, so entries line up by span
//! rather than by absolute column, and the per-root totals can be appended
//! to the rows of the table that feeds them.

use std::io::{self, Write};

use crate::engine::PartitionCalculation;
use crate::matrix::{DpMatrix, DpVector};
use crate::types::Pos;

/// Writes one table in staircase layout; row `i`, column `k` holds the
/// entry at `(i, i + k)`.
///
/// # Errors
///
/// Propagates write failures from the underlying writer.
pub fn write_staircase<W: Write>(
    writer: &mut W,
    tag: &str,
    matrix: &DpMatrix,
    finals: Option<&DpVector>,
) -> io::Result<()> {
    let n = matrix.len();
    writeln!(writer)?;
    writeln!(writer, "----- {tag} -----")?;
    for i in 0..n {
        let mut line = String::new();
        for _ in 0..i {
            line.push_str(&" ".repeat(10));
        }
        for k in 0..n {
            line.push_str(&format!(" {:9.3}", matrix.q(i as Pos, (i + k) as Pos)));
        }
        if let Some(finals) = finals {
            line.push_str(&format!(" ==> {:9.3}", finals.q(i as Pos)));
        }
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

/// Writes one table in plain row-by-column layout.
///
/// # Errors
///
/// Propagates write failures from the underlying writer.
pub fn write_square<W: Write>(writer: &mut W, tag: &str, matrix: &DpMatrix) -> io::Result<()> {
    let n = matrix.len();
    writeln!(writer)?;
    writeln!(writer, "----- {tag} -----")?;
    for i in 0..n {
        let mut line = String::new();
        for j in 0..n {
            line.push_str(&format!(" {:9.3}", matrix.q(i as Pos, j as Pos)));
        }
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

/// Dumps every table of a finished calculation, appending the per-root
/// totals to the final-feeding table.
///
/// # Errors
///
/// Propagates write failures from the underlying writer.
pub fn write_all_matrices<W: Write>(
    writer: &mut W,
    calculation: &PartitionCalculation,
) -> io::Result<()> {
    let matrices = calculation.matrices();
    for (tag, matrix) in matrices.named() {
        let finals = (tag == "Z_linear").then_some(&matrices.z_final);
        write_staircase(writer, &tag, matrix, finals)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{DpMatrix, MatrixId};

    fn filled_matrix() -> DpMatrix {
        let mut matrix = DpMatrix::new(MatrixId::ZLinear, 3, false, false);
        for i in 0..3 {
            for j in 0..3 {
                let mut acc = matrix.accumulator();
                acc.add_term((i * 3 + j) as f64, &[]);
                matrix.add(i as Pos, j as Pos, acc);
            }
        }
        matrix
    }

    #[test]
    fn test_staircase_layout() {
        let mut buffer = Vec::new();
        write_staircase(&mut buffer, "Z_linear", &filled_matrix(), None).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("----- Z_linear -----"));
        let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        // Header plus one row per index, each later row indented further.
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with(' '));
        assert!(lines[3].len() >= lines[2].len());
    }

    #[test]
    fn test_square_contains_all_entries() {
        let mut buffer = Vec::new();
        write_square(&mut buffer, "Z_linear", &filled_matrix()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("8.000"));
        assert!(text.contains("0.000"));
    }
}
