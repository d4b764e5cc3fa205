//! Simulated path containers.

use risk_core::TimeGrid;

/// One simulated trajectory of a single risk factor.
///
/// Levels align 1:1 with the grid of the owning [`PathSet`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    levels: Vec<f64>,
}

impl Path {
    pub(crate) fn new(levels: Vec<f64>) -> Self {
        Self { levels }
    }

    /// Levels along the grid.
    #[inline]
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Level at grid index `index`, if in range.
    #[inline]
    pub fn level(&self, index: usize) -> Option<f64> {
        self.levels.get(index).copied()
    }

    /// Level at the final grid point.
    #[inline]
    pub fn terminal(&self) -> f64 {
        *self
            .levels
            .last()
            .expect("paths are non-empty: grids hold at least one point")
    }
}

/// A bundle of simulated paths sharing one grid and one base seed.
///
/// The grid and seed are carried so downstream consumers (scenario
/// builders, profile assembly) can check alignment and reproduce the run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathSet {
    grid: TimeGrid,
    seed: u64,
    paths: Vec<Path>,
}

impl PathSet {
    pub(crate) fn new(grid: TimeGrid, seed: u64, paths: Vec<Path>) -> Self {
        Self { grid, seed, paths }
    }

    /// The time grid the levels align with.
    #[inline]
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// The base seed of the run that produced this set.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of paths.
    #[inline]
    pub fn num_paths(&self) -> usize {
        self.paths.len()
    }

    /// All paths, in path-index order.
    #[inline]
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    /// Path at `index`, if in range.
    #[inline]
    pub fn path(&self, index: usize) -> Option<&Path> {
        self.paths.get(index)
    }

    /// Cross-section of levels at grid index `index` (one per path).
    ///
    /// Returns `None` when `index` is outside the grid.
    pub fn levels_at(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.grid.len() {
            return None;
        }
        Some(
            self.paths
                .iter()
                .map(|path| path.levels()[index])
                .collect(),
        )
    }

    /// Terminal level of every path.
    pub fn terminals(&self) -> Vec<f64> {
        self.paths.iter().map(Path::terminal).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> PathSet {
        let grid = TimeGrid::new(vec![0.5, 1.0]).unwrap();
        let paths = vec![
            Path::new(vec![101.0, 102.0]),
            Path::new(vec![99.0, 98.0]),
        ];
        PathSet::new(grid, 42, paths)
    }

    #[test]
    fn test_accessors() {
        let set = sample_set();
        assert_eq!(set.num_paths(), 2);
        assert_eq!(set.seed(), 42);
        assert_eq!(set.grid().len(), 2);
        assert_eq!(set.path(0).unwrap().level(1), Some(102.0));
        assert_eq!(set.path(2), None);
    }

    #[test]
    fn test_levels_at_cross_section() {
        let set = sample_set();
        assert_eq!(set.levels_at(0), Some(vec![101.0, 99.0]));
        assert_eq!(set.levels_at(1), Some(vec![102.0, 98.0]));
        assert_eq!(set.levels_at(2), None);
    }

    #[test]
    fn test_terminals() {
        let set = sample_set();
        assert_eq!(set.terminals(), vec![102.0, 98.0]);
    }
}
