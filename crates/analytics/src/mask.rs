use crate::aggregate::mean;
use crate::combine::{ColumnKey, ComparativeMatrix};
use crate::error::AnalyticsError;
use core_types::{Highlight, MaskPolicy, Window};
use rust_decimal::Decimal;
use serde::Serialize;

/// Highlight overlay with the same shape as the matrix it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mask {
    rows: Vec<String>,
    columns: Vec<ColumnKey>,
    cells: Vec<Vec<Highlight>>,
}

impl Mask {
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    pub fn cells(&self) -> &[Vec<Highlight>] {
        &self.cells
    }

    pub fn get(&self, row: usize, column: usize) -> Highlight {
        self.cells
            .get(row)
            .and_then(|r| r.get(column))
            .copied()
            .unwrap_or_default()
    }

    pub fn count(&self, highlight: Highlight) -> usize {
        self.cells.iter().flatten().filter(|h| **h == highlight).count()
    }
}

/// What a policy hands back besides the mask itself.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskOutcome {
    pub mask: Mask,
    /// The single baseline used by the global policy.
    pub global_threshold: Option<Decimal>,
    /// A trailing column left out of pairing because the column count was odd.
    pub unpaired_column: Option<ColumnKey>,
}

/// A rule for deciding which matrix cells are worth highlighting.
///
/// Implementations must be pure: the same matrix always yields the same mask,
/// and a missing value always maps to `Highlight::Unmarked`.
pub trait SignificancePolicy: Send + Sync {
    fn kind(&self) -> MaskPolicy;

    fn apply(&self, matrix: &ComparativeMatrix) -> Result<MaskOutcome, AnalyticsError>;
}

/// Creates the policy implementation for the given selector.
pub fn create_policy(kind: MaskPolicy) -> Box<dyn SignificancePolicy> {
    match kind {
        MaskPolicy::ColumnMean => Box::new(ColumnMeanPolicy),
        MaskPolicy::GlobalSynergy => Box::new(GlobalSynergyPolicy),
    }
}

fn above(value: Option<Decimal>, threshold: Option<Decimal>) -> Highlight {
    match (value, threshold) {
        (Some(v), Some(t)) if v > t => Highlight::AboveAverage,
        _ => Highlight::Unmarked,
    }
}

/// Binary highlighting against each column's own mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnMeanPolicy;

impl SignificancePolicy for ColumnMeanPolicy {
    fn kind(&self) -> MaskPolicy {
        MaskPolicy::ColumnMean
    }

    fn apply(&self, matrix: &ComparativeMatrix) -> Result<MaskOutcome, AnalyticsError> {
        let column_means = (0..matrix.columns().len())
            .map(|j| mean(matrix.column_values(j)))
            .collect::<Result<Vec<_>, _>>()?;

        let cells = matrix
            .cells()
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&column_means)
                    .map(|(value, threshold)| above(*value, *threshold))
                    .collect()
            })
            .collect();

        Ok(MaskOutcome {
            mask: Mask {
                rows: matrix.rows().to_vec(),
                columns: matrix.columns().to_vec(),
                cells,
            },
            global_threshold: None,
            unpaired_column: None,
        })
    }
}

/// Tri-level highlighting against one baseline drawn from the Overall columns.
///
/// Cells above the baseline are `AboveAverage`. Where a row clears it in both
/// columns of an Overall/Recent pair, both cells become `AboveAverageBoth`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalSynergyPolicy;

impl GlobalSynergyPolicy {
    /// Mean of every non-missing Overall cell. Recent cells are not part of the baseline.
    pub fn baseline(matrix: &ComparativeMatrix) -> Result<Option<Decimal>, AnalyticsError> {
        mean(
            matrix
                .columns()
                .iter()
                .enumerate()
                .filter(|(_, column)| column.window == Window::Overall)
                .flat_map(|(j, _)| matrix.column_values(j)),
        )
    }
}

impl SignificancePolicy for GlobalSynergyPolicy {
    fn kind(&self) -> MaskPolicy {
        MaskPolicy::GlobalSynergy
    }

    fn apply(&self, matrix: &ComparativeMatrix) -> Result<MaskOutcome, AnalyticsError> {
        let threshold = Self::baseline(matrix)?;
        let width = matrix.columns().len();

        let mut cells: Vec<Vec<Highlight>> = matrix
            .cells()
            .iter()
            .map(|row| row.iter().map(|value| above(*value, threshold)).collect())
            .collect();

        // Pairs are positional: columns (0,1), (2,3), ... A trailing odd column is skipped.
        let paired_width = width - width % 2;
        for (row, highlights) in cells.iter_mut().enumerate() {
            for left in (0..paired_width).step_by(2) {
                let right = left + 1;
                let both_above = matches!(
                    (matrix.get(row, left), matrix.get(row, right), threshold),
                    (Some(a), Some(b), Some(t)) if a > t && b > t
                );
                if both_above {
                    highlights[left] = Highlight::AboveAverageBoth;
                    highlights[right] = Highlight::AboveAverageBoth;
                }
            }
        }

        let unpaired_column = (width % 2 == 1).then(|| matrix.columns()[width - 1]);
        if let Some(column) = unpaired_column {
            tracing::warn!(
                column = %column,
                "Odd column count; trailing column excluded from pair upgrade."
            );
        }

        Ok(MaskOutcome {
            mask: Mask {
                rows: matrix.rows().to_vec(),
                columns: matrix.columns().to_vec(),
                cells,
            },
            global_threshold: threshold,
            unpaired_column,
        })
    }
}
