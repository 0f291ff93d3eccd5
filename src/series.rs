//! In-memory time-ordered sample series.
//!
//! A series has one timestamp column and any number of named sample
//! columns. Every entry of a sample column is a `channels x pixels` matrix,
//! optionally paired with a boolean validity mask of the same shape
//! (`true` = usable).

use std::collections::BTreeMap;
use std::ops::Range;

use chrono::{DateTime, Utc};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

#[derive(Debug, Clone, PartialEq)]
struct SampleColumn {
    values: Vec<DMatrix<f64>>,
    masks: Option<Vec<DMatrix<bool>>>,
}

/// Borrowed view of a sample column, or of a window of one.
#[derive(Debug, Clone, Copy)]
pub struct ColumnView<'a> {
    pub values: &'a [DMatrix<f64>],
    pub masks: Option<&'a [DMatrix<bool>]>,
}

impl<'a> ColumnView<'a> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(channels, pixels)` of the entries, `None` for an empty view.
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.values.first().map(|m| m.shape())
    }

    pub fn window(&self, range: Range<usize>) -> ColumnView<'a> {
        ColumnView {
            values: &self.values[range.clone()],
            masks: self.masks.map(|m| &m[range]),
        }
    }

    /// Whether entry `sample` is usable at `(channel, pixel)`.
    ///
    /// Non-finite readings never count as usable.
    pub fn is_usable(&self, sample: usize, channel: usize, pixel: usize) -> bool {
        let value = self.values[sample][(channel, pixel)];
        value.is_finite()
            && self
                .masks
                .map_or(true, |masks| masks[sample][(channel, pixel)])
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleSeries {
    timestamps: Vec<DateTime<Utc>>,
    columns: BTreeMap<String, SampleColumn>,
}

impl SampleSeries {
    /// Create a series with the given timestamps and no sample columns.
    pub fn new(timestamps: Vec<DateTime<Utc>>) -> Result<Self, SeriesError> {
        if let Some(index) = timestamps
            .windows(2)
            .position(|pair| pair[1] <= pair[0])
        {
            return Err(SeriesError::NonIncreasingTimestamp { index: index + 1 });
        }
        Ok(Self {
            timestamps,
            columns: BTreeMap::new(),
        })
    }

    /// Add (or replace) a sample column. Any mask on a replaced column is dropped.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<DMatrix<f64>>,
    ) -> Result<Self, SeriesError> {
        let name = name.into();
        self.check_entries(&name, &values, values.first().map(|m| m.shape()))?;
        self.columns
            .insert(name, SampleColumn { values, masks: None });
        Ok(self)
    }

    /// Attach a validity mask to an existing column.
    pub fn with_mask(
        mut self,
        name: &str,
        masks: Vec<DMatrix<bool>>,
    ) -> Result<Self, SeriesError> {
        let expected = match self.columns.get(name) {
            Some(column) => column.values.first().map(|m| m.shape()),
            None => return Err(SeriesError::MaskWithoutColumn(name.to_string())),
        };
        self.check_entries(name, &masks, expected)?;
        if let Some(column) = self.columns.get_mut(name) {
            column.masks = Some(masks);
        }
        Ok(self)
    }

    fn check_entries<T: nalgebra::Scalar>(
        &self,
        name: &str,
        entries: &[DMatrix<T>],
        expected: Option<(usize, usize)>,
    ) -> Result<(), SeriesError> {
        if entries.len() != self.timestamps.len() {
            return Err(SeriesError::LengthMismatch {
                column: name.to_string(),
                expected: self.timestamps.len(),
                found: entries.len(),
            });
        }
        if let Some(expected) = expected {
            for (index, entry) in entries.iter().enumerate() {
                if entry.shape() != expected {
                    return Err(SeriesError::ShapeMismatch {
                        column: name.to_string(),
                        index,
                        expected,
                        found: entry.shape(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, name: &str) -> Option<ColumnView<'_>> {
        self.columns.get(name).map(|column| ColumnView {
            values: &column.values,
            masks: column.masks.as_deref(),
        })
    }

    /// Copy of the rows in `range`, with every column and mask.
    ///
    /// Panics if `range` is out of bounds, like slice indexing.
    pub fn slice(&self, range: Range<usize>) -> SampleSeries {
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| {
                let sliced = SampleColumn {
                    values: column.values[range.clone()].to_vec(),
                    masks: column.masks.as_ref().map(|m| m[range.clone()].to_vec()),
                };
                (name.clone(), sliced)
            })
            .collect();
        SampleSeries {
            timestamps: self.timestamps[range].to_vec(),
            columns,
        }
    }
}

/// JSON representation of a [`SampleSeries`].
///
/// Readings are nested `[sample][channel][pixel]`; `null` readings load as NaN
/// and are therefore treated as invalid during extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesFile {
    pub timestamps: Vec<DateTime<Utc>>,
    pub columns: BTreeMap<String, Vec<Vec<Vec<Option<f64>>>>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub masks: BTreeMap<String, Vec<Vec<Vec<bool>>>>,
}

impl SeriesFile {
    pub fn into_series(self) -> Result<SampleSeries, SeriesError> {
        let mut series = SampleSeries::new(self.timestamps)?;
        for (name, entries) in self.columns {
            let values = entries
                .iter()
                .enumerate()
                .map(|(index, rows)| {
                    nested_to_matrix(&name, index, rows, |v: &Option<f64>| {
                        v.unwrap_or(f64::NAN)
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            series = series.with_column(name, values)?;
        }
        for (name, entries) in self.masks {
            let masks = entries
                .iter()
                .enumerate()
                .map(|(index, rows)| nested_to_matrix(&name, index, rows, |v: &bool| *v))
                .collect::<Result<Vec<_>, _>>()?;
            series = series.with_mask(&name, masks)?;
        }
        Ok(series)
    }
}

impl From<&SampleSeries> for SeriesFile {
    fn from(series: &SampleSeries) -> Self {
        let mut columns = BTreeMap::new();
        let mut masks = BTreeMap::new();
        for (name, column) in &series.columns {
            let values = column
                .values
                .iter()
                .map(|m| matrix_to_nested(m, |v| v.is_finite().then_some(v)))
                .collect();
            columns.insert(name.clone(), values);
            if let Some(column_masks) = &column.masks {
                let nested = column_masks
                    .iter()
                    .map(|m| matrix_to_nested(m, |v| v))
                    .collect();
                masks.insert(name.clone(), nested);
            }
        }
        SeriesFile {
            timestamps: series.timestamps.clone(),
            columns,
            masks,
        }
    }
}

fn nested_to_matrix<S, T: nalgebra::Scalar>(
    column: &str,
    index: usize,
    rows: &[Vec<S>],
    convert: impl Fn(&S) -> T,
) -> Result<DMatrix<T>, SeriesError> {
    let ncols = rows.first().map_or(0, Vec::len);
    if let Some(row) = rows.iter().find(|row| row.len() != ncols) {
        return Err(SeriesError::ShapeMismatch {
            column: column.to_string(),
            index,
            expected: (rows.len(), ncols),
            found: (rows.len(), row.len()),
        });
    }
    Ok(DMatrix::from_fn(rows.len(), ncols, |r, c| convert(&rows[r][c])))
}

fn matrix_to_nested<T: nalgebra::Scalar + Copy, S>(
    matrix: &DMatrix<T>,
    convert: impl Fn(T) -> S,
) -> Vec<Vec<S>> {
    matrix
        .row_iter()
        .map(|row| row.iter().map(|&v| convert(v)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn timestamps(n: usize) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2023, 6, 26, 21, 51, 50).unwrap();
        (0..n)
            .map(|i| start + Duration::milliseconds(i as i64))
            .collect()
    }

    #[test]
    fn test_rejects_non_increasing_timestamps() {
        let mut ts = timestamps(4);
        ts[2] = ts[1];
        assert_eq!(
            SampleSeries::new(ts),
            Err(SeriesError::NonIncreasingTimestamp { index: 2 })
        );
    }

    #[test]
    fn test_column_length_and_shape_checked() {
        let series = SampleSeries::new(timestamps(3)).unwrap();
        let err = series
            .clone()
            .with_column("image", vec![DMatrix::zeros(2, 4); 2])
            .unwrap_err();
        assert!(matches!(err, SeriesError::LengthMismatch { found: 2, .. }));

        let values = vec![DMatrix::zeros(2, 4), DMatrix::zeros(2, 4), DMatrix::zeros(2, 3)];
        let err = series.with_column("image", values).unwrap_err();
        assert!(matches!(err, SeriesError::ShapeMismatch { index: 2, .. }));
    }

    #[test]
    fn test_mask_requires_column_and_shape() {
        let series = SampleSeries::new(timestamps(2))
            .unwrap()
            .with_column("image", vec![DMatrix::zeros(2, 4); 2])
            .unwrap();
        assert_eq!(
            series.clone().with_mask("peak_time", vec![DMatrix::from_element(2, 4, true); 2]),
            Err(SeriesError::MaskWithoutColumn("peak_time".into()))
        );
        let err = series
            .with_mask("image", vec![DMatrix::from_element(2, 3, true); 2])
            .unwrap_err();
        assert!(matches!(err, SeriesError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_usable_respects_mask_and_finiteness() {
        let mut values = vec![DMatrix::from_element(1, 2, 1.0); 2];
        values[1][(0, 1)] = f64::NAN;
        let mut masks = vec![DMatrix::from_element(1, 2, true); 2];
        masks[0][(0, 0)] = false;
        let series = SampleSeries::new(timestamps(2))
            .unwrap()
            .with_column("image", values)
            .unwrap()
            .with_mask("image", masks)
            .unwrap();

        let view = series.column("image").unwrap();
        assert!(!view.is_usable(0, 0, 0));
        assert!(view.is_usable(0, 0, 1));
        assert!(view.is_usable(1, 0, 0));
        assert!(!view.is_usable(1, 0, 1));
        assert_eq!(view.window(1..2).len(), 1);
        assert!(!view.window(1..2).is_usable(0, 0, 1));
    }

    #[test]
    fn test_slice_keeps_columns_and_masks() {
        let values = (0..5).map(|i| DMatrix::from_element(1, 1, i as f64)).collect();
        let series = SampleSeries::new(timestamps(5))
            .unwrap()
            .with_column("image", values)
            .unwrap()
            .with_mask("image", vec![DMatrix::from_element(1, 1, true); 5])
            .unwrap();

        let sliced = series.slice(1..3);
        assert_eq!(sliced.len(), 2);
        assert_eq!(sliced.timestamps()[0], series.timestamps()[1]);
        let view = sliced.column("image").unwrap();
        assert_eq!(view.values[1][(0, 0)], 2.0);
        assert_eq!(view.masks.map(|m| m.len()), Some(2));
    }

    #[test]
    fn test_series_file_json() {
        let json = r#"{
            "timestamps": ["2023-06-26T21:51:50Z", "2023-06-26T21:51:51Z"],
            "columns": {"image": [[[1.0, 2.0]], [[3.0, null]]]},
            "masks": {"image": [[[true, false]], [[true, true]]]}
        }"#;
        let file: SeriesFile = serde_json::from_str(json).unwrap();
        let series = file.into_series().unwrap();
        let view = series.column("image").unwrap();
        assert_eq!(view.shape(), Some((1, 2)));
        assert!(!view.is_usable(0, 0, 1));
        assert!(view.values[1][(0, 1)].is_nan());

        let back = SeriesFile::from(&series);
        assert_eq!(back.columns["image"][1][0], vec![Some(3.0), None]);
        assert_eq!(back.masks["image"][0][0], vec![true, false]);
    }

    #[test]
    fn test_series_file_ragged_rows() {
        let json = r#"{
            "timestamps": ["2023-06-26T21:51:50Z"],
            "columns": {"image": [[[1.0, 2.0], [3.0]]]}
        }"#;
        let file: SeriesFile = serde_json::from_str(json).unwrap();
        assert!(matches!(
            file.into_series(),
            Err(SeriesError::ShapeMismatch { index: 0, .. })
        ));
    }
}
