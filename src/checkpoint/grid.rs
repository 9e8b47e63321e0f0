//! Work grids: the Cartesian space of download units and the order in which it is walked.
//!
//! A [`WorkGrid`] is an ordered list of named [`Dimension`]s. Iterating it with
//! [`WorkGrid::units`] yields every [`Unit`] exactly once in row-major order: the
//! first dimension is the outermost loop and the last dimension changes fastest.
//! The order only depends on the dimension keys, so a rerun with the same
//! configuration visits the same coordinates in the same sequence.

use crate::checkpoint::error::CheckpointError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// One named axis of a [`WorkGrid`], e.g. `year` or `zone`, with its ordered keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    name: String,
    keys: Vec<String>,
}

impl Dimension {
    /// Creates a dimension from anything that renders to a key.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbc_download::Dimension;
    ///
    /// let years = Dimension::new("year", [2020, 2021]);
    /// assert_eq!(years.keys(), ["2020", "2021"]);
    /// ```
    pub fn new<I, K>(name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: ToString,
    {
        Self {
            name: name.into(),
            keys: keys.into_iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.keys.join(","))
    }
}

/// Formats a list of dimensions the way mismatch errors report them.
pub(crate) fn describe_dimensions(dimensions: &[Dimension]) -> String {
    if dimensions.is_empty() {
        return "()".to_string();
    }
    dimensions
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(" x ")
}

/// The ordered tuple of dimensions spanning all units of work of one downloader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkGrid {
    dimensions: Vec<Dimension>,
}

impl WorkGrid {
    /// Builds a grid, rejecting dimensions that list the same key twice.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::DuplicateKey`] when a key repeats within a dimension,
    /// since two coordinates would then describe the same unit.
    pub fn new(dimensions: Vec<Dimension>) -> Result<Self, CheckpointError> {
        for dimension in &dimensions {
            let mut seen = HashSet::with_capacity(dimension.len());
            for key in dimension.keys() {
                if !seen.insert(key.as_str()) {
                    return Err(CheckpointError::DuplicateKey {
                        dimension: dimension.name.clone(),
                        key: key.clone(),
                    });
                }
            }
        }
        Ok(Self { dimensions })
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Cardinality of every dimension, in declaration order.
    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(Dimension::len).collect()
    }

    /// Total number of units, zero as soon as one dimension is empty.
    pub fn len(&self) -> usize {
        self.dimensions.iter().map(Dimension::len).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn contains(&self, coord: &[usize]) -> bool {
        coord.len() == self.rank()
            && coord
                .iter()
                .zip(&self.dimensions)
                .all(|(&i, dimension)| i < dimension.len())
    }

    /// Describes the unit at `coord`, or `None` when the coordinate is outside the grid.
    pub fn unit_at(&self, coord: &[usize]) -> Option<Unit> {
        if !self.contains(coord) {
            return None;
        }
        let keys = coord
            .iter()
            .zip(&self.dimensions)
            .map(|(&i, dimension)| (dimension.name.clone(), dimension.keys[i].clone()))
            .collect();
        Some(Unit {
            coord: coord.to_vec(),
            keys,
        })
    }

    /// Iterates all units, outermost dimension first.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbc_download::{Dimension, WorkGrid};
    ///
    /// let grid = WorkGrid::new(vec![
    ///     Dimension::new("year", [2020, 2021]),
    ///     Dimension::new("zone", ["FR", "ES"]),
    /// ])
    /// .unwrap();
    ///
    /// let visited: Vec<String> = grid.units().map(|u| u.to_string()).collect();
    /// assert_eq!(
    ///     visited,
    ///     [
    ///         "year=2020, zone=FR",
    ///         "year=2020, zone=ES",
    ///         "year=2021, zone=FR",
    ///         "year=2021, zone=ES",
    ///     ]
    /// );
    /// ```
    pub fn units(&self) -> Units<'_> {
        let next = if self.is_empty() {
            None
        } else {
            Some(vec![0; self.rank()])
        };
        Units { grid: self, next }
    }
}

impl fmt::Display for WorkGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe_dimensions(&self.dimensions))
    }
}

/// Row-major iterator over the units of a [`WorkGrid`].
pub struct Units<'a> {
    grid: &'a WorkGrid,
    next: Option<Vec<usize>>,
}

impl Iterator for Units<'_> {
    type Item = Unit;

    fn next(&mut self) -> Option<Self::Item> {
        let coord = self.next.take()?;

        let mut successor = coord.clone();
        for (axis, dimension) in self.grid.dimensions.iter().enumerate().rev() {
            successor[axis] += 1;
            if successor[axis] < dimension.len() {
                self.next = Some(successor);
                break;
            }
            successor[axis] = 0;
        }

        self.grid.unit_at(&coord)
    }
}

/// One cell of the grid: its coordinate tuple and the key it denotes on every dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    coord: Vec<usize>,
    keys: Vec<(String, String)>,
}

impl Unit {
    pub fn coord(&self) -> &[usize] {
        &self.coord
    }

    /// Index of this unit along the named dimension.
    pub fn index(&self, dimension: &str) -> Option<usize> {
        self.keys
            .iter()
            .position(|(name, _)| name == dimension)
            .map(|axis| self.coord[axis])
    }

    /// Key of this unit along the named dimension.
    pub fn key(&self, dimension: &str) -> Option<&str> {
        self.keys
            .iter()
            .find(|(name, _)| name == dimension)
            .map(|(_, key)| key.as_str())
    }

    /// Like [`Unit::key`], but a missing dimension is an error.
    pub fn require_key(&self, dimension: &str) -> Result<&str, CheckpointError> {
        self.key(dimension)
            .ok_or_else(|| CheckpointError::MissingDimension {
                dimension: dimension.to_string(),
                unit: self.to_string(),
            })
    }

    /// Parses the key of `dimension`, e.g. a year back into an integer.
    pub fn parse_key<T: FromStr>(&self, dimension: &str) -> Result<T, CheckpointError> {
        let key = self.require_key(dimension)?;
        key.parse().map_err(|_| CheckpointError::InvalidKey {
            dimension: dimension.to_string(),
            key: key.to_string(),
        })
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .keys
            .iter()
            .map(|(name, key)| format!("{name}={key}"))
            .collect();
        f.write_str(&parts.join(", "))
    }
}
