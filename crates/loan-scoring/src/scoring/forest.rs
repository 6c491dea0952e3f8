//! Bagged CART classifier used once enough decided applications exist.
//!
//! Trees are grown on bootstrap samples with Gini splits and a random subset
//! of features per node. Leaves store the approved fraction of their samples,
//! and the forest probability is the mean leaf fraction across trees.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::features::{ApplicationFeatures, FEATURE_COUNT};
use super::model::ApprovalModel;

/// Feature row in training column order.
pub type FeatureRow = [f64; FEATURE_COUNT];

/// Hyperparameters for forest training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestSettings {
    pub n_estimators: usize,
    pub random_state: u64,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for ForestSettings {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            random_state: 42,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

impl ForestSettings {
    /// Trees actually grown. A forest is never empty, so it never scores every applicant 0.
    pub fn tree_count(&self) -> usize {
        self.n_estimators.max(1)
    }

    fn features_per_split(&self) -> usize {
        ((FEATURE_COUNT as f64).sqrt().floor() as usize).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fits the forest. `labels[i]` is true when `rows[i]` was approved.
    pub fn fit(rows: &[FeatureRow], labels: &[bool], settings: &ForestSettings) -> Self {
        debug_assert_eq!(rows.len(), labels.len());
        let n_samples = rows.len().min(labels.len());

        let trees = (0..settings.tree_count())
            .map(|tree_index| {
                let mut rng = StdRng::seed_from_u64(
                    settings.random_state.wrapping_add(tree_index as u64),
                );
                let bootstrap: Vec<usize> = if n_samples == 0 {
                    Vec::new()
                } else {
                    (0..n_samples)
                        .map(|_| rng.random_range(0..n_samples))
                        .collect()
                };

                let mut builder = TreeBuilder {
                    rows,
                    labels,
                    settings,
                    rng: &mut rng,
                    nodes: Vec::new(),
                };
                builder.grow(bootstrap, 0);
                DecisionTree {
                    nodes: builder.nodes,
                }
            })
            .collect();

        Self { trees }
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn predict_row(&self, row: &FeatureRow) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        total / self.trees.len() as f64
    }
}

impl ApprovalModel for RandomForest {
    fn approval_probability(&self, features: &ApplicationFeatures) -> f64 {
        self.predict_row(&features.as_vector()).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn predict(&self, row: &FeatureRow) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { approval }) => return *approval,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => return 0.0,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
enum Node {
    Leaf {
        approval: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

struct TreeBuilder<'a> {
    rows: &'a [FeatureRow],
    labels: &'a [bool],
    settings: &'a ForestSettings,
    rng: &'a mut StdRng,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Grows the subtree for `indices` and returns its node index.
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let node_index = self.nodes.len();
        let positives = indices.iter().filter(|&&i| self.labels[i]).count();
        let approval = if indices.is_empty() {
            0.0
        } else {
            positives as f64 / indices.len() as f64
        };
        self.nodes.push(Node::Leaf { approval });

        let pure = positives == 0 || positives == indices.len();
        let depth_reached = self
            .settings
            .max_depth
            .map(|max_depth| depth >= max_depth)
            .unwrap_or(false);
        if pure || depth_reached || indices.len() < self.settings.min_samples_split.max(2) {
            return node_index;
        }

        let sampled = rand::seq::index::sample(
            &mut *self.rng,
            FEATURE_COUNT,
            self.settings.features_per_split(),
        )
        .into_vec();
        let candidate = self
            .best_split(&indices, &sampled)
            .or_else(|| self.best_split(&indices, &(0..FEATURE_COUNT).collect::<Vec<_>>()));

        let Some(split) = candidate else {
            return node_index;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.rows[i][split.feature] <= split.threshold);

        let left = self.grow(left_indices, depth + 1);
        let right = self.grow(right_indices, depth + 1);
        self.nodes[node_index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_index
    }

    fn best_split(&self, indices: &[usize], features: &[usize]) -> Option<SplitCandidate> {
        let total = indices.len();
        let total_positive = indices.iter().filter(|&&i| self.labels[i]).count();
        let mut best: Option<SplitCandidate> = None;

        for &feature in features {
            let mut column: Vec<(f64, bool)> = indices
                .iter()
                .map(|&i| (self.rows[i][feature], self.labels[i]))
                .collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_count = 0;
            let mut left_positive = 0;
            for window in column.windows(2) {
                let (value, label) = window[0];
                let next = window[1].0;
                left_count += 1;
                if label {
                    left_positive += 1;
                }
                if value >= next {
                    continue;
                }

                let right_count = total - left_count;
                let right_positive = total_positive - left_positive;
                let impurity = (left_count as f64 * gini(left_positive, left_count)
                    + right_count as f64 * gini(right_positive, right_count))
                    / total as f64;

                if best
                    .as_ref()
                    .map_or(true, |current| impurity < current.impurity)
                {
                    let midpoint = value + (next - value) / 2.0;
                    let threshold = if midpoint < next { midpoint } else { value };
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }

        best
    }
}

fn gini(positive: usize, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let p = positive as f64 / count as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}
