//! Pearson correlation between market columns.

use crate::record::Record;
use rayon::prelude::*;
use serde::Serialize;

/// Markets shown in the correlation matrix by default.
pub const DEFAULT_MARKETS: [&str; 6] = [
    "ICE",
    "CZCE cotton usc/lb",
    "MCX usc/lb",
    "AWP",
    "CEPEA",
    "A-Index",
];

/// Pearson correlation of two columns over records where both are numeric.
///
/// Returns 0 when fewer than two pairs exist or either column is constant.
pub fn pearson_correlation(records: &[Record], field_a: &str, field_b: &str) -> f64 {
    let pairs: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|record| Some((record.number(field_a)?, record.number(field_b)?)))
        .collect();

    if pairs.len() < 2 {
        return 0.0;
    }

    let n = pairs.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_x2, sum_y2) = pairs.iter().fold(
        (0.0, 0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sx2, sy2), &(x, y)| (sx + x, sy + y, sxy + x * y, sx2 + x * x, sy2 + y * y),
    );

    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y)).sqrt();

    if denominator == 0.0 || denominator.is_nan() {
        0.0
    } else {
        numerator / denominator
    }
}

/// Qualitative bucket for a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    StrongPositive,
    Positive,
    Weak,
    Negative,
    StrongNegative,
}

impl CorrelationStrength {
    pub fn classify(value: f64) -> Self {
        if value > 0.7 {
            CorrelationStrength::StrongPositive
        } else if value > 0.3 {
            CorrelationStrength::Positive
        } else if value < -0.7 {
            CorrelationStrength::StrongNegative
        } else if value < -0.3 {
            CorrelationStrength::Negative
        } else {
            CorrelationStrength::Weak
        }
    }
}

/// One cell of the matrix, flattened for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationCell {
    pub row: String,
    pub column: String,
    pub value: f64,
    pub strength: CorrelationStrength,
}

/// Symmetric correlation matrix with a unit diagonal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub markets: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Computes every pair in parallel. Rows follow the order of `markets`.
    pub fn compute<S: AsRef<str> + Sync>(records: &[Record], markets: &[S]) -> Self {
        let values: Vec<Vec<f64>> = (0..markets.len())
            .into_par_iter()
            .map(|i| {
                (0..markets.len())
                    .map(|j| {
                        if i == j {
                            1.0
                        } else {
                            pearson_correlation(records, markets[i].as_ref(), markets[j].as_ref())
                        }
                    })
                    .collect()
            })
            .collect();

        tracing::debug!(markets = markets.len(), records = records.len(), "Computed correlation matrix");

        CorrelationMatrix {
            markets: markets.iter().map(|m| m.as_ref().to_string()).collect(),
            values,
        }
    }

    pub fn with_default_markets(records: &[Record]) -> Self {
        CorrelationMatrix::compute(records, &DEFAULT_MARKETS)
    }

    /// Coefficient for a pair of markets, if both are in the matrix.
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let i = self.markets.iter().position(|m| m == row)?;
        let j = self.markets.iter().position(|m| m == column)?;
        Some(self.values[i][j])
    }

    pub fn cells(&self) -> Vec<CorrelationCell> {
        self.markets
            .iter()
            .enumerate()
            .flat_map(|(i, row)| {
                self.markets.iter().enumerate().map(move |(j, column)| {
                    let value = self.values[i][j];
                    CorrelationCell {
                        row: row.clone(),
                        column: column.clone(),
                        value,
                        strength: CorrelationStrength::classify(value),
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<Record> {
        (0..6)
            .map(|i| {
                let x = i as f64;
                Record::dated(format!("2024-01-{:02}", 10 - i))
                    .with("ICE", 70.0 + x)
                    .with("AWP", 60.0 + 2.0 * x)
                    .with("CEPEA", 90.0 - x)
                    .with("Flat", 5.0)
            })
            .collect()
    }

    #[test]
    fn perfectly_linear_columns() {
        let records = records();
        assert!((pearson_correlation(&records, "ICE", "AWP") - 1.0).abs() < 1e-12);
        assert!((pearson_correlation(&records, "ICE", "CEPEA") + 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_are_zero() {
        let records = records();
        assert_eq!(pearson_correlation(&records, "ICE", "Flat"), 0.0);
        assert_eq!(pearson_correlation(&records, "ICE", "Missing"), 0.0);
        assert_eq!(pearson_correlation(&records[..1], "ICE", "AWP"), 0.0);
    }

    #[test]
    fn only_complete_pairs_are_used() {
        let mut records = records();
        records.push(Record::dated("2024-01-01").with("ICE", 1000.0));
        assert!((pearson_correlation(&records, "ICE", "AWP") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let matrix = CorrelationMatrix::compute(&records(), &["ICE", "AWP", "CEPEA"]);
        assert_eq!(matrix.values.len(), 3);
        for i in 0..3 {
            assert_eq!(matrix.values[i][i], 1.0);
            for j in 0..3 {
                assert!((matrix.values[i][j] - matrix.values[j][i]).abs() < 1e-12);
            }
        }
        assert!((matrix.get("AWP", "CEPEA").unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(matrix.get("ICE", "MCX usc/lb"), None);
        assert_eq!(matrix.cells().len(), 9);
    }

    #[test]
    fn default_matrix_covers_all_markets() {
        let matrix = CorrelationMatrix::with_default_markets(&records());
        assert_eq!(matrix.markets.len(), DEFAULT_MARKETS.len());
        assert_eq!(matrix.get("MCX usc/lb", "ICE"), Some(0.0));
    }

    #[test]
    fn strength_buckets() {
        assert_eq!(CorrelationStrength::classify(0.9), CorrelationStrength::StrongPositive);
        assert_eq!(CorrelationStrength::classify(0.5), CorrelationStrength::Positive);
        assert_eq!(CorrelationStrength::classify(0.3), CorrelationStrength::Weak);
        assert_eq!(CorrelationStrength::classify(-0.5), CorrelationStrength::Negative);
        assert_eq!(CorrelationStrength::classify(-0.71), CorrelationStrength::StrongNegative);
    }
}
