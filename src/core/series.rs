//! Daily demand series.

use crate::data::SalesRecord;
use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

/// An ordered sequence of (date, quantity) pairs.
///
/// Dates are strictly increasing with no duplicates and every quantity is
/// finite and non-negative. A series is never mutated in place; windows and
/// tails are borrowed slices or fresh series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemandSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl DemandSeries {
    /// Create a series, validating ordering and quantities.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: dates.len(),
                got: values.len(),
            });
        }

        for i in 1..dates.len() {
            if dates[i] <= dates[i - 1] {
                return Err(ForecastError::TimestampError(format!(
                    "dates must be strictly increasing ({} follows {})",
                    dates[i],
                    dates[i - 1]
                )));
            }
        }

        if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "quantities must be finite and non-negative, got {}",
                bad
            )));
        }

        Ok(Self { dates, values })
    }

    /// An empty series.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a series of consecutive days starting at `start`.
    pub fn daily(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        let dates = (0..values.len())
            .map(|i| start + Duration::days(i as i64))
            .collect();
        Self::new(dates, values)
    }

    /// Aggregate raw sales rows into one total per calendar date.
    ///
    /// Rows with a negative or non-finite quantity are skipped.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a SalesRecord>,
    {
        let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for record in records {
            if record.quantity.is_finite() && record.quantity >= 0.0 {
                *totals.entry(record.date).or_insert(0.0) += record.quantity;
            }
        }

        let (dates, values) = totals.into_iter().unzip();
        Self { dates, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// The most recent `n` quantities (all of them if the series is shorter).
    pub fn tail_values(&self, n: usize) -> &[f64] {
        let start = self.values.len().saturating_sub(n);
        &self.values[start..]
    }

    /// A new series holding the most recent `n` observations.
    pub fn tail(&self, n: usize) -> DemandSeries {
        let start = self.values.len().saturating_sub(n);
        Self {
            dates: self.dates[start..].to_vec(),
            values: self.values[start..].to_vec(),
        }
    }

    /// Sum of all quantities.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Date and quantity of the largest observation.
    pub fn peak(&self) -> Option<(NaiveDate, f64)> {
        self.dates
            .iter()
            .zip(self.values.iter())
            .fold(None, |best: Option<(NaiveDate, f64)>, (&d, &v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((d, v)),
            })
    }
}
