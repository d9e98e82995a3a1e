//! Harmonic-function label propagation
//!
//! Semi-supervised node classification over an undirected, weighted view.
//! Seeded nodes keep a one-hot distribution over the classes; every other
//! node receives the energy-minimizing (harmonic) extension, i.e. its
//! distribution equals the weighted average of its neighbors' distributions.
//!
//! Each connected component is solved independently. A component holding no
//! seed has no harmonic extension and is reported as unresolved instead of
//! defaulting to a class.
//!
//! Two solvers are provided:
//! - `Direct`: dense Gaussian elimination on `(D_uu - W_uu) F_u = W_ul Y_l`.
//! - `Iterative`: Jacobi relaxation until the largest change drops under the
//!   tolerance or the iteration cap is hit (results then flagged provisional).

use super::common::{GraphView, NodeId};
use super::community::component_indices;
use ndarray::{Array2, Axis};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors raised while propagating labels
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropagationError {
    /// A connected component without any seeded node
    #[error("no labeled neighbors reachable from {} node(s): {nodes:?}", nodes.len())]
    UnreachableComponent { nodes: Vec<NodeId> },

    /// The linear system of a component could not be solved
    #[error("harmonic system is singular for component of {size} node(s)")]
    SingularSystem { size: usize },

    /// A seed refers to a class outside `0..num_classes`
    #[error("seed class {class} is out of range for {num_classes} class(es)")]
    InvalidClass { class: usize, num_classes: usize },
}

pub type PropagationResult<T> = Result<T, PropagationError>;

/// Which solver to use per component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Solver {
    /// Direct solve for small components, relaxation above `direct_limit`
    #[default]
    Auto,
    Direct,
    Iterative,
}

/// Method actually applied to a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMethod {
    /// Every node of the component was seeded
    SeedsOnly,
    Direct,
    Iterative,
}

/// Harmonic propagation configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HarmonicConfig {
    pub solver: Solver,
    /// Iteration cap for the relaxation solver
    pub max_iterations: usize,
    /// Convergence tolerance (max absolute change per sweep)
    pub tolerance: f64,
    /// Largest number of unlabeled nodes `Auto` hands to the direct solver
    pub direct_limit: usize,
}

impl Default for HarmonicConfig {
    fn default() -> Self {
        Self {
            solver: Solver::Auto,
            max_iterations: 1000,
            tolerance: 1e-6,
            direct_limit: 2048,
        }
    }
}

/// Per-component solve summary
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSolve {
    pub nodes: usize,
    pub seeds: usize,
    pub method: SolveMethod,
    pub converged: bool,
    pub iterations: usize,
}

/// Result of harmonic propagation
#[derive(Debug, Default)]
pub struct HarmonicResult {
    /// Winning class per resolved node (seeds included)
    pub labels: HashMap<NodeId, usize>,
    /// Class distribution per resolved node
    pub distributions: HashMap<NodeId, Vec<f64>>,
    /// Nodes whose component hit the iteration cap before converging
    pub provisional: HashSet<NodeId>,
    /// Provisional nodes no class mass had reached when the cap was hit.
    /// They have a distribution but no entry in `labels`. Sorted.
    pub unreached: Vec<NodeId>,
    /// Components that could not be solved
    pub failures: Vec<PropagationError>,
    /// Summary of every solved component
    pub components: Vec<ComponentSolve>,
}

impl HarmonicResult {
    /// True when every solved component converged
    pub fn converged(&self) -> bool {
        self.components.iter().all(|c| c.converged)
    }

    /// Node ids of every component that failed with a reachability error
    pub fn unresolved_nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .failures
            .iter()
            .flat_map(|f| match f {
                PropagationError::UnreachableComponent { nodes } => nodes.clone(),
                _ => Vec::new(),
            })
            .collect();
        nodes.sort_unstable();
        nodes
    }
}

/// Run harmonic-function propagation.
///
/// `seeds` maps node ids to class indices in `0..num_classes`; ids missing
/// from the view are ignored. Ties between classes go to the lowest index.
pub fn harmonic_function(
    view: &GraphView,
    seeds: &HashMap<NodeId, usize>,
    num_classes: usize,
    config: &HarmonicConfig,
) -> PropagationResult<HarmonicResult> {
    if let Some(&class) = seeds.values().find(|&&c| c >= num_classes) {
        return Err(PropagationError::InvalidClass { class, num_classes });
    }

    // Dense seed lookup: index -> class
    let mut seed_of: Vec<Option<usize>> = vec![None; view.node_count];
    for (id, &class) in seeds {
        if let Some(&idx) = view.node_to_index.get(id) {
            seed_of[idx] = Some(class);
        }
    }

    let mut result = HarmonicResult::default();

    for members in component_indices(view) {
        let seeded = members.iter().filter(|&&i| seed_of[i].is_some()).count();
        if seeded == 0 {
            let mut nodes: Vec<NodeId> = members.iter().map(|&i| view.index_to_node[i]).collect();
            nodes.sort_unstable();
            result.failures.push(PropagationError::UnreachableComponent { nodes });
            continue;
        }

        for &i in &members {
            if let Some(class) = seed_of[i] {
                let id = view.index_to_node[i];
                result.labels.insert(id, class);
                result.distributions.insert(id, one_hot(class, num_classes));
            }
        }

        let unlabeled: Vec<usize> = members.iter().copied().filter(|&i| seed_of[i].is_none()).collect();
        if unlabeled.is_empty() {
            result.components.push(ComponentSolve {
                nodes: members.len(),
                seeds: seeded,
                method: SolveMethod::SeedsOnly,
                converged: true,
                iterations: 0,
            });
            continue;
        }

        let use_direct = match config.solver {
            Solver::Direct => true,
            Solver::Iterative => false,
            Solver::Auto => unlabeled.len() <= config.direct_limit,
        };

        let (solution, method, converged, iterations) = if use_direct {
            match solve_direct(view, &unlabeled, &seed_of, num_classes) {
                Some(f) => (f, SolveMethod::Direct, true, 0),
                None => {
                    result.failures.push(PropagationError::SingularSystem { size: members.len() });
                    continue;
                }
            }
        } else {
            let (f, converged, iterations) = solve_iterative(view, &unlabeled, &seed_of, num_classes, config);
            (f, SolveMethod::Iterative, converged, iterations)
        };

        for (row, &i) in unlabeled.iter().enumerate() {
            let id = view.index_to_node[i];
            let dist: Vec<f64> = solution.row(row).to_vec();
            if !converged {
                result.provisional.insert(id);
            }
            match argmax(&dist) {
                Some(class) => {
                    result.labels.insert(id, class);
                }
                None => {
                    result.provisional.insert(id);
                    result.unreached.push(id);
                }
            }
            result.distributions.insert(id, dist);
        }

        result.components.push(ComponentSolve {
            nodes: members.len(),
            seeds: seeded,
            method,
            converged,
            iterations,
        });
    }

    result.unreached.sort_unstable();
    Ok(result)
}

fn one_hot(class: usize, num_classes: usize) -> Vec<f64> {
    let mut v = vec![0.0; num_classes];
    v[class] = 1.0;
    v
}

/// Highest-probability class, lowest index on ties. `None` when no mass reached the node.
fn argmax(dist: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (class, &p) in dist.iter().enumerate() {
        match best {
            Some((_, bp)) if p <= bp => {}
            _ => best = Some((class, p)),
        }
    }
    best.filter(|&(_, p)| p > 0.0).map(|(class, _)| class)
}

/// Build `(D_uu - W_uu) F = W_ul Y_l` for one component and solve it.
fn solve_direct(
    view: &GraphView,
    unlabeled: &[usize],
    seed_of: &[Option<usize>],
    num_classes: usize,
) -> Option<Array2<f64>> {
    let m = unlabeled.len();
    let local: HashMap<usize, usize> = unlabeled.iter().enumerate().map(|(l, &g)| (g, l)).collect();

    let mut a = Array2::<f64>::zeros((m, m));
    let mut b = Array2::<f64>::zeros((m, num_classes));

    for (row, &u) in unlabeled.iter().enumerate() {
        for (v, w) in view.weighted_successors(u) {
            if v == u {
                continue;
            }
            a[[row, row]] += w;
            match seed_of[v] {
                Some(class) => b[[row, class]] += w,
                None => {
                    let col = local[&v];
                    a[[row, col]] -= w;
                }
            }
        }
    }

    gaussian_solve(a, b)
}

/// Gaussian elimination with partial pivoting, solving `A X = B` in place.
fn gaussian_solve(mut a: Array2<f64>, mut b: Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    const EPS: f64 = 1e-12;

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            a[[i, col]]
                .abs()
                .partial_cmp(&a[[j, col]].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[[pivot, col]].abs() < EPS {
            return None;
        }
        if pivot != col {
            swap_rows(&mut a, pivot, col);
            swap_rows(&mut b, pivot, col);
        }

        let diag = a[[col, col]];
        for row in (col + 1)..n {
            let factor = a[[row, col]] / diag;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            for k in 0..b.ncols() {
                b[[row, k]] -= factor * b[[col, k]];
            }
        }
    }

    // Back substitution
    let mut x = Array2::<f64>::zeros(b.raw_dim());
    for row in (0..n).rev() {
        for k in 0..b.ncols() {
            let mut sum = b[[row, k]];
            for j in (row + 1)..n {
                sum -= a[[row, j]] * x[[j, k]];
            }
            x[[row, k]] = sum / a[[row, row]];
        }
    }
    Some(x)
}

fn swap_rows(m: &mut Array2<f64>, i: usize, j: usize) {
    let (mut first, mut second) = m.multi_slice_mut((ndarray::s![i, ..], ndarray::s![j, ..]));
    ndarray::Zip::from(&mut first).and(&mut second).for_each(std::mem::swap);
}

/// Jacobi relaxation of the harmonic condition over one component.
fn solve_iterative(
    view: &GraphView,
    unlabeled: &[usize],
    seed_of: &[Option<usize>],
    num_classes: usize,
    config: &HarmonicConfig,
) -> (Array2<f64>, bool, usize) {
    let m = unlabeled.len();
    let local: HashMap<usize, usize> = unlabeled.iter().enumerate().map(|(l, &g)| (g, l)).collect();

    let mut current = Array2::<f64>::zeros((m, num_classes));
    let mut next = Array2::<f64>::zeros((m, num_classes));

    for iteration in 1..=config.max_iterations {
        let mut max_delta: f64 = 0.0;

        for (row, &u) in unlabeled.iter().enumerate() {
            let mut acc = vec![0.0; num_classes];
            let mut degree = 0.0;
            for (v, w) in view.weighted_successors(u) {
                if v == u {
                    continue;
                }
                degree += w;
                match seed_of[v] {
                    Some(class) => acc[class] += w,
                    None => {
                        let neighbor = current.index_axis(Axis(0), local[&v]);
                        for (k, value) in neighbor.iter().enumerate() {
                            acc[k] += w * value;
                        }
                    }
                }
            }
            for k in 0..num_classes {
                let value = if degree > 0.0 { acc[k] / degree } else { 0.0 };
                max_delta = max_delta.max((value - current[[row, k]]).abs());
                next[[row, k]] = value;
            }
        }

        std::mem::swap(&mut current, &mut next);
        if max_delta < config.tolerance {
            return (current, true, iteration);
        }
    }

    (current, false, config.max_iterations)
}
