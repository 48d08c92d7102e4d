//! Model scoring.
//!
//! The model artifact is a gradient-boosted tree ensemble exported to JSON:
//! a base score plus the sum of one leaf value per tree. Predictions are on
//! the log1p price scale; inverting that is the caller's job.

use crate::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Anything that maps a feature vector to a single log-scale score.
pub trait Regressor: Send + Sync + fmt::Debug {
    fn predict(&self, features: &[f64]) -> Result<f64, PipelineError>;
}

/// One node of a regression tree.
///
/// A split sends `x < threshold` to `left` and everything else to `right`;
/// a NaN input follows `default_left`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default)]
        default_left: bool,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walks from the root to a leaf.
    ///
    /// Malformed trees (a dangling or backward child, an unknown feature)
    /// are reported as errors, so an unvalidated model cannot panic or loop.
    fn leaf_value(&self, features: &[f64]) -> Result<f64, PipelineError> {
        let mut index = 0;
        loop {
            let node = self.nodes.get(index).ok_or_else(|| {
                PipelineError::failed(format!("tree has no node {}", index))
            })?;
            match node {
                Node::Leaf { value } => return Ok(*value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let x = *features.get(*feature).ok_or_else(|| {
                        PipelineError::failed(format!("split reads unknown feature {}", feature))
                    })?;
                    let next = if x.is_nan() {
                        if *default_left {
                            *left
                        } else {
                            *right
                        }
                    } else if x < *threshold {
                        *left
                    } else {
                        *right
                    };
                    if next <= index {
                        return Err(PipelineError::failed(format!(
                            "node {} points back to node {}",
                            index, next
                        )));
                    }
                    index = next;
                }
            }
        }
    }
}

/// The model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub n_features: usize,
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Checks that every tree terminates and only reads known features.
    ///
    /// Children must point forward in the node list, which rules out cycles.
    pub fn validate(&self) -> Result<(), String> {
        if !self.base_score.is_finite() {
            return Err("base_score is not finite".to_string());
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("tree {} has no nodes", t));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    Node::Leaf { value } if !value.is_finite() => {
                        return Err(format!("tree {} node {}: leaf value is not finite", t, i));
                    }
                    Node::Leaf { .. } => {}
                    Node::Split {
                        feature,
                        threshold,
                        left,
                        right,
                        ..
                    } => {
                        if *feature >= self.n_features {
                            return Err(format!(
                                "tree {} node {}: feature {} out of range (n_features = {})",
                                t, i, feature, self.n_features
                            ));
                        }
                        if threshold.is_nan() {
                            return Err(format!("tree {} node {}: threshold is NaN", t, i));
                        }
                        for child in [left, right] {
                            if *child <= i || *child >= tree.nodes.len() {
                                return Err(format!(
                                    "tree {} node {}: child index {} is invalid",
                                    t, i, child
                                ));
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

impl Regressor for TreeEnsemble {
    fn predict(&self, features: &[f64]) -> Result<f64, PipelineError> {
        if features.len() != self.n_features {
            return Err(PipelineError::failed(format!(
                "model expects {} features, got {}",
                self.n_features,
                features.len()
            )));
        }

        let mut margin = 0.0;
        for tree in &self.trees {
            margin += tree.leaf_value(features)?;
        }

        Ok(self.base_score + margin)
    }
}
