//! Hyperparameter grid enumeration.
//!
//! The sweep is driven by an explicit grid value rather than nested loops:
//!
//! - the enumeration order is deterministic, so interrupted runs resume at
//!   the same sequence
//! - dimensions can be overridden from the CLI without touching the driver
//! - validation happens in one place, before anything touches the filesystem

use crate::domain::{DirichletPrior, HyperParams};
use crate::error::AppError;

/// The five named grid dimensions, enumerated outermost to innermost.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchGrid {
    pub topic_counts: Vec<usize>,
    pub dirichlet_priors: Vec<DirichletPrior>,
    pub random_states: Vec<u64>,
    pub pass_counts: Vec<usize>,
    pub iteration_counts: Vec<usize>,
}

impl SearchGrid {
    /// The standard sweep: 20 topic counts x 2 priors x 1 seed x 4 pass
    /// counts x 1 iteration cap = 160 combinations.
    ///
    /// The prior pair is odd on purpose: it sweeps a re-estimation strategy
    /// (`auto`) against a bare concentration (`42`), exactly as configured in
    /// the runs this layout has to stay compatible with.
    pub fn default_sweep() -> Self {
        Self {
            topic_counts: (1..=20).collect(),
            dirichlet_priors: vec![DirichletPrior::Auto, DirichletPrior::Concentration(42.0)],
            random_states: vec![99],
            pass_counts: vec![1, 10, 25, 200],
            iteration_counts: vec![400],
        }
    }

    /// Number of combinations in the grid.
    pub fn len(&self) -> usize {
        self.topic_counts.len()
            * self.dirichlet_priors.len()
            * self.random_states.len()
            * self.pass_counts.len()
            * self.iteration_counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check the grid before a run.
    ///
    /// The iteration cap is not a segment of the model directory layout, so a
    /// grid sweeping several caps would map distinct combinations onto the
    /// same directory. That is rejected here rather than silently collapsed.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.topic_counts.is_empty()
            || self.dirichlet_priors.is_empty()
            || self.random_states.is_empty()
            || self.pass_counts.is_empty()
            || self.iteration_counts.is_empty()
        {
            return Err(AppError::new(
                2,
                "Empty grid dimension: every dimension needs at least one value.",
            ));
        }
        if self.topic_counts.iter().any(|&k| k == 0) {
            return Err(AppError::new(2, "Topic counts must be >= 1."));
        }
        if self.pass_counts.iter().any(|&p| p == 0) {
            return Err(AppError::new(2, "Pass counts must be >= 1."));
        }
        if self.iteration_counts.iter().any(|&i| i == 0) {
            return Err(AppError::new(2, "Iteration counts must be >= 1."));
        }
        if self.iteration_counts.len() != 1 {
            return Err(AppError::new(
                2,
                "Exactly one iteration count is supported: iterations are not part of the model directory layout, so sweeping them would collide.",
            ));
        }
        Ok(())
    }

    /// Iterate the Cartesian product in the fixed dimension order
    /// (topics outermost, iterations innermost).
    pub fn combinations(&self) -> Combinations<'_> {
        Combinations {
            grid: self,
            index: if self.is_empty() { None } else { Some([0; 5]) },
        }
    }
}

/// Odometer walk over the grid's index space.
pub struct Combinations<'a> {
    grid: &'a SearchGrid,
    /// Current position per dimension; `None` once exhausted.
    index: Option<[usize; 5]>,
}

impl Iterator for Combinations<'_> {
    type Item = HyperParams;

    fn next(&mut self) -> Option<HyperParams> {
        let mut index = self.index?;
        let grid = self.grid;

        let item = HyperParams {
            num_topics: grid.topic_counts[index[0]],
            dir_prior: grid.dirichlet_priors[index[1]],
            random_state: grid.random_states[index[2]],
            num_passes: grid.pass_counts[index[3]],
            num_iterations: grid.iteration_counts[index[4]],
        };

        let sizes = [
            grid.topic_counts.len(),
            grid.dirichlet_priors.len(),
            grid.random_states.len(),
            grid.pass_counts.len(),
            grid.iteration_counts.len(),
        ];

        // Advance the innermost dimension first, carrying into the next one
        // when it wraps.
        self.index = None;
        let mut pos = sizes.len();
        while pos > 0 {
            pos -= 1;
            index[pos] += 1;
            if index[pos] < sizes[pos] {
                self.index = Some(index);
                break;
            }
            index[pos] = 0;
        }

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.index {
            Some(_) => (1, Some(self.grid.len())),
            None => (0, Some(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sweep_has_expected_shape() {
        let grid = SearchGrid::default_sweep();
        assert_eq!(grid.len(), 160);
        assert_eq!(grid.combinations().count(), 160);
        assert_eq!(grid.topic_counts.first(), Some(&1));
        assert_eq!(grid.topic_counts.last(), Some(&20));
        assert_eq!(
            grid.dirichlet_priors,
            vec![DirichletPrior::Auto, DirichletPrior::Concentration(42.0)]
        );
        assert_eq!(grid.random_states, vec![99]);
        assert_eq!(grid.pass_counts, vec![1, 10, 25, 200]);
        assert_eq!(grid.iteration_counts, vec![400]);
        grid.validate().unwrap();
    }

    #[test]
    fn combinations_follow_dimension_order() {
        let grid = SearchGrid {
            topic_counts: vec![1, 2],
            dirichlet_priors: vec![DirichletPrior::Auto],
            random_states: vec![99],
            pass_counts: vec![1, 10],
            iteration_counts: vec![400],
        };

        let order: Vec<(usize, usize)> = grid
            .combinations()
            .map(|p| (p.num_topics, p.num_passes))
            .collect();
        assert_eq!(order, vec![(1, 1), (1, 10), (2, 1), (2, 10)]);
    }

    #[test]
    fn default_sweep_starts_at_the_first_dimension_values() {
        let first = SearchGrid::default_sweep().combinations().next().unwrap();
        assert_eq!(first.num_topics, 1);
        assert_eq!(first.dir_prior, DirichletPrior::Auto);
        assert_eq!(first.random_state, 99);
        assert_eq!(first.num_passes, 1);
        assert_eq!(first.num_iterations, 400);
    }

    #[test]
    fn empty_dimension_yields_nothing_and_fails_validation() {
        let grid = SearchGrid {
            topic_counts: vec![],
            ..SearchGrid::default_sweep()
        };
        assert!(grid.is_empty());
        assert_eq!(grid.combinations().count(), 0);
        assert_eq!(grid.validate().unwrap_err().exit_code(), 2);
    }

    #[test]
    fn validate_rejects_zero_valued_dimensions() {
        let grid = SearchGrid {
            topic_counts: vec![0, 1],
            ..SearchGrid::default_sweep()
        };
        assert!(grid.validate().is_err());

        let grid = SearchGrid {
            pass_counts: vec![0],
            ..SearchGrid::default_sweep()
        };
        assert!(grid.validate().is_err());
    }

    #[test]
    fn validate_rejects_iteration_sweeps() {
        let grid = SearchGrid {
            iteration_counts: vec![200, 400],
            ..SearchGrid::default_sweep()
        };
        let err = grid.validate().unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
