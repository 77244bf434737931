//! CART (Classification and Regression Tree) builder
//!
//! Implements deterministic exact-greedy regression tree construction with
//! the squared-error criterion. Candidate thresholds sit halfway between
//! adjacent distinct feature values.

use hydroponics_core::forest::{Node, Tree};
use hydroponics_core::ForestConfig;

use crate::deterministic::{LcgRng, SplitTieBreaker};

/// Training parameters for a single tree
#[derive(Clone, Debug, PartialEq)]
pub struct TreeConfig {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

impl From<&ForestConfig> for TreeConfig {
    fn from(config: &ForestConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features: config.max_features,
        }
    }
}

/// A grown tree with the squared-error reduction credited to each feature
#[derive(Clone, Debug)]
pub struct GrownTree {
    pub tree: Tree,
    pub importances: Vec<f64>,
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn new(feature_idx: usize, threshold: f64, gain: f64) -> Self {
        Self {
            feature_idx,
            threshold,
            gain,
            tie_breaker: SplitTieBreaker::new(feature_idx, threshold),
        }
    }

    fn beats(&self, other: &SplitCandidate) -> bool {
        self.gain > other.gain
            || (self.gain == other.gain && self.tie_breaker.precedes(&other.tie_breaker))
    }
}

/// Build a regression tree using exact-greedy CART
pub struct CartBuilder<'a> {
    config: &'a TreeConfig,
    features: &'a [Vec<f64>],
    targets: &'a [f64],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    /// Rows must be rectangular and match `targets` in length
    pub fn new(features: &'a [Vec<f64>], targets: &'a [f64], config: &'a TreeConfig) -> Self {
        let feature_count = features.first().map_or(0, Vec::len);

        Self {
            config,
            features,
            targets,
            feature_count,
        }
    }

    /// Grow a tree over `sample` (row indices, repeats allowed).
    ///
    /// `rng` is only consulted when `max_features` restricts the split search.
    pub fn build(&self, sample: Vec<usize>, rng: &mut LcgRng) -> GrownTree {
        let mut nodes = Vec::new();
        let mut importances = vec![0.0; self.feature_count];

        if sample.is_empty() {
            nodes.push(Node::leaf(0, 0.0));
        } else {
            self.build_node(sample, 0, &mut nodes, &mut importances, rng);
        }

        GrownTree {
            tree: Tree::new(nodes),
            importances,
        }
    }

    /// Recursively build tree nodes, returning the index of the new node
    fn build_node(
        &self,
        indices: Vec<usize>,
        depth: usize,
        nodes: &mut Vec<Node>,
        importances: &mut [f64],
        rng: &mut LcgRng,
    ) -> i32 {
        let current_idx = nodes.len();
        nodes.push(Node::leaf(current_idx as i32, self.leaf_value(&indices)));

        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        if depth_reached
            || indices.len() < self.config.min_samples_split
            || indices.len() < 2 * self.config.min_samples_leaf
            || self.is_pure(&indices)
        {
            return current_idx as i32;
        }

        let Some(split) = self.find_best_split(&indices, rng) else {
            return current_idx as i32;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&idx| self.features[idx][split.feature_idx] <= split.threshold);

        importances[split.feature_idx] += split.gain.max(0.0);
        nodes[current_idx] = Node::internal(
            current_idx as i32,
            split.feature_idx as i32,
            split.threshold,
            -1,
            -1,
        );

        let left_idx = self.build_node(left_indices, depth + 1, nodes, importances, rng);
        let right_idx = self.build_node(right_indices, depth + 1, nodes, importances, rng);

        nodes[current_idx].left = left_idx;
        nodes[current_idx].right = right_idx;

        current_idx as i32
    }

    /// Features searched at this node, in ascending order
    fn candidate_features(&self, rng: &mut LcgRng) -> Vec<usize> {
        let mut features: Vec<usize> = (0..self.feature_count).collect();

        match self.config.max_features {
            Some(k) if k < self.feature_count => {
                // Partial Fisher-Yates: the first k slots become the draw
                for i in 0..k {
                    let j = i + rng.next_range(self.feature_count - i);
                    features.swap(i, j);
                }
                features.truncate(k);
                features.sort_unstable();
                features
            }
            _ => features,
        }
    }

    /// Find best split using the exact-greedy algorithm
    fn find_best_split(&self, indices: &[usize], rng: &mut LcgRng) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.config.min_samples_leaf;
        let total: f64 = indices.iter().map(|&idx| self.targets[idx]).sum();
        let parent_score = total * total / n as f64;

        let mut best_split: Option<SplitCandidate> = None;
        let mut column: Vec<(f64, f64)> = Vec::with_capacity(n);

        for feature_idx in self.candidate_features(rng) {
            column.clear();
            column.extend(
                indices
                    .iter()
                    .map(|&idx| (self.features[idx][feature_idx], self.targets[idx])),
            );
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            for i in 0..n - 1 {
                left_sum += column[i].1;

                let (value, next) = (column[i].0, column[i + 1].0);
                if value == next {
                    continue;
                }

                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let right_sum = total - left_sum;
                let gain = left_sum * left_sum / n_left as f64
                    + right_sum * right_sum / n_right as f64
                    - parent_score;

                let candidate =
                    SplitCandidate::new(feature_idx, split_threshold(value, next), gain);

                if best_split
                    .as_ref()
                    .map_or(true, |current| candidate.beats(current))
                {
                    best_split = Some(candidate);
                }
            }
        }

        best_split
    }

    fn is_pure(&self, indices: &[usize]) -> bool {
        let first = self.targets[indices[0]];
        indices.iter().all(|&idx| self.targets[idx] == first)
    }

    /// Mean target, centered on the first sample so pure nodes keep their exact value
    fn leaf_value(&self, indices: &[usize]) -> f64 {
        let first = self.targets[indices[0]];
        let offset: f64 = indices.iter().map(|&idx| self.targets[idx] - first).sum();
        first + offset / indices.len() as f64
    }
}

/// Midpoint of two adjacent distinct values, falling back to the lower one
/// when the midpoint rounds up to the upper value
fn split_threshold(lower: f64, upper: f64) -> f64 {
    let mid = lower + (upper - lower) / 2.0;
    if mid >= upper {
        lower
    } else {
        mid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grow(features: &[Vec<f64>], targets: &[f64], config: &TreeConfig) -> GrownTree {
        let builder = CartBuilder::new(features, targets, config);
        builder.build((0..targets.len()).collect(), &mut LcgRng::new(42))
    }

    #[test]
    fn test_simple_split() {
        let features = vec![vec![1.0, 7.0], vec![2.0, 3.0], vec![3.0, 9.0], vec![4.0, 1.0]];
        let targets = vec![10.0, 10.0, 20.0, 20.0];

        let grown = grow(&features, &targets, &TreeConfig::default());

        assert_eq!(grown.tree.nodes.len(), 3);
        assert_eq!(grown.tree.nodes[0].feature_idx, 0);
        assert_eq!(grown.tree.nodes[0].threshold, 2.5);
        assert_eq!(grown.tree.evaluate(&[1.5, 0.0]), 10.0);
        assert_eq!(grown.tree.evaluate(&[3.5, 0.0]), 20.0);
        assert_eq!(grown.importances[1], 0.0);
        assert!(grown.tree.validate(2).is_ok());
    }

    #[test]
    fn test_fully_grown_tree_fits_training_data() {
        let features: Vec<Vec<f64>> = (0..16).map(|i| vec![i as f64, (i * 7 % 5) as f64]).collect();
        let targets: Vec<f64> = (0..16).map(|i| ((i * 13) % 11) as f64 * 1.5).collect();

        let grown = grow(&features, &targets, &TreeConfig::default());

        for (row, &target) in features.iter().zip(&targets) {
            assert_eq!(grown.tree.evaluate(row), target);
        }
        assert!(grown.tree.validate(2).is_ok());
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let features: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let targets = vec![0.1; 10];

        let grown = grow(&features, &targets, &TreeConfig::default());

        assert_eq!(grown.tree.nodes.len(), 1);
        assert_eq!(grown.tree.nodes[0].leaf, Some(0.1));
        assert!(grown.importances.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_depth_and_leaf_limits() {
        let features: Vec<Vec<f64>> = (0..32).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..32).map(|i| i as f64).collect();

        let shallow = TreeConfig {
            max_depth: Some(2),
            ..TreeConfig::default()
        };
        assert_eq!(grow(&features, &targets, &shallow).tree.depth(), 2);

        let wide_leaves = TreeConfig {
            min_samples_leaf: 8,
            ..TreeConfig::default()
        };
        let grown = grow(&features, &targets, &wide_leaves);
        assert_eq!(grown.tree.n_leaves(), 4);
    }

    #[test]
    fn test_duplicate_feature_values_are_not_split() {
        let features = vec![vec![1.0], vec![1.0], vec![1.0]];
        let targets = vec![1.0, 2.0, 3.0];

        let grown = grow(&features, &targets, &TreeConfig::default());
        assert_eq!(grown.tree.nodes.len(), 1);
        assert_eq!(grown.tree.nodes[0].leaf, Some(2.0));
    }

    #[test]
    fn test_bootstrap_repeats_are_weighted() {
        let features = vec![vec![0.0], vec![1.0]];
        let targets = vec![0.0, 3.0];
        let config = TreeConfig {
            max_depth: Some(0),
            ..TreeConfig::default()
        };

        let builder = CartBuilder::new(&features, &targets, &config);
        let grown = builder.build(vec![1, 1, 0], &mut LcgRng::new(1));
        assert_eq!(grown.tree.nodes[0].leaf, Some(2.0));
    }

    #[test]
    fn test_threshold_falls_back_for_adjacent_floats() {
        let lower = 1.0_f64;
        let upper = f64::from_bits(lower.to_bits() + 1);
        assert_eq!(split_threshold(lower, upper), lower);
        assert_eq!(split_threshold(2.0, 4.0), 3.0);
    }
}
