//! Lloyd's k-means.
//!
//! 1. Pick k distinct dataset rows as the initial centers
//! 2. **Assign**: each point goes to its nearest center (lowest index on ties)
//! 3. **Update**: each center moves to the mean of its points
//! 4. Repeat until the assignment vector stops changing
//!
//! The loop has no iteration bound unless one is configured with
//! [`KMeans::with_max_iter`].

use crate::error::{KMeansError, Result};
use crate::geometry::{centroid, distance};
use log::{debug, info, warn};
use ndarray::{Array2, ArrayView2, Axis};
use rand::prelude::*;
use rand::seq::index;
use std::collections::BTreeMap;

/// What the update step does with a center that attracted no points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyClusterPolicy {
    /// Keep all k slots; an empty slot keeps its previous center.
    #[default]
    Keep,
    /// Compact the center set to the labels still in use, numbered in
    /// first-encounter order.
    Drop,
    /// Abort with [`KMeansError::EmptyCluster`].
    Fail,
}

/// K-means configuration.
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    max_iter: Option<usize>,
    seed: Option<u64>,
    empty_cluster: EmptyClusterPolicy,
}

/// Everything a finished run produces.
#[derive(Debug, Clone)]
pub struct KMeansResult {
    pub centers: Array2<f64>,
    pub assignments: Vec<usize>,
    pub clustering: Clustering,
    /// Number of update+reassign passes.
    pub iterations: usize,
    /// False only when the iteration cap stopped the loop.
    pub converged: bool,
    /// Sum of squared point-to-center distances: once for the initial
    /// assignment, then once per pass.
    pub inertia_history: Vec<f64>,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: None,
            seed: None,
            empty_cluster: EmptyClusterPolicy::default(),
        }
    }

    /// Cap the number of update+reassign passes. `None` runs to convergence.
    pub fn with_max_iter(mut self, max_iter: Option<usize>) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Seed the sampler used to pick the initial centers.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_empty_cluster_policy(mut self, policy: EmptyClusterPolicy) -> Self {
        self.empty_cluster = policy;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Cluster `data` (one point per row).
    pub fn fit(&self, data: ArrayView2<f64>) -> Result<KMeansResult> {
        match self.seed {
            Some(seed) => self.fit_with_rng(data, &mut StdRng::seed_from_u64(seed)),
            None => self.fit_with_rng(data, &mut thread_rng()),
        }
    }

    /// Cluster `data`, drawing the initial centers from `rng`.
    pub fn fit_with_rng<R: Rng + ?Sized>(
        &self,
        data: ArrayView2<f64>,
        rng: &mut R,
    ) -> Result<KMeansResult> {
        let initial = generate_k(data, self.k, rng)?;
        self.run(data, initial)
    }

    /// Cluster `data` starting from caller-supplied centers.
    pub fn fit_from_centers(
        &self,
        data: ArrayView2<f64>,
        centers: Array2<f64>,
    ) -> Result<KMeansResult> {
        validate(data, self.k)?;
        if centers.nrows() != self.k {
            return Err(KMeansError::invalid(format!(
                "expected {} initial centers, got {}",
                self.k,
                centers.nrows()
            )));
        }
        if centers.ncols() != data.ncols() {
            return Err(KMeansError::invalid(format!(
                "centers have dimension {}, data has {}",
                centers.ncols(),
                data.ncols()
            )));
        }
        self.run(data, centers)
    }

    fn run(&self, data: ArrayView2<f64>, mut centers: Array2<f64>) -> Result<KMeansResult> {
        let mut assignments = assign_points(data, centers.view());
        let mut inertia_history = vec![inertia(data, centers.view(), &assignments)];
        let mut iterations = 0;
        let mut converged = false;

        loop {
            if let Some(max_iter) = self.max_iter {
                if iterations >= max_iter {
                    warn!("k-means stopped after {} iterations without converging", iterations);
                    break;
                }
            }

            let previous = assignments;
            centers = match self.empty_cluster {
                EmptyClusterPolicy::Drop => update_centers(data, &previous)?,
                EmptyClusterPolicy::Keep => {
                    update_centers_stable(data, &previous, centers.view(), false)?
                }
                EmptyClusterPolicy::Fail => {
                    update_centers_stable(data, &previous, centers.view(), true)?
                }
            };
            assignments = assign_points(data, centers.view());
            iterations += 1;

            let cost = inertia(data, centers.view(), &assignments);
            inertia_history.push(cost);
            let changed = previous
                .iter()
                .zip(&assignments)
                .filter(|(a, b)| a != b)
                .count();
            debug!(
                "iteration {}: {} assignments changed, inertia {}",
                iterations, changed, cost
            );

            if assignments == previous {
                converged = true;
                info!("k-means converged after {} iterations", iterations);
                break;
            }
        }

        let clustering = Clustering::from_assignments(data, &assignments)?;
        Ok(KMeansResult {
            centers,
            assignments,
            clustering,
            iterations,
            converged,
            inertia_history,
        })
    }
}

/// Cluster `data` into `k` groups with an unseeded sampler.
pub fn cluster(data: ArrayView2<f64>, k: usize) -> Result<Clustering> {
    Ok(KMeans::new(k).fit(data)?.clustering)
}

/// Cluster `data` into `k` groups, drawing the initial centers from `rng`.
pub fn cluster_with_rng<R: Rng + ?Sized>(
    data: ArrayView2<f64>,
    k: usize,
    rng: &mut R,
) -> Result<Clustering> {
    Ok(KMeans::new(k).fit_with_rng(data, rng)?.clustering)
}

/// Total distance from every point to the centroid of its cluster.
pub fn cost(clustering: &Clustering) -> f64 {
    clustering.cost()
}

fn validate(data: ArrayView2<f64>, k: usize) -> Result<()> {
    if data.nrows() == 0 {
        return Err(KMeansError::invalid("dataset cannot be empty"));
    }
    if k == 0 || k > data.nrows() {
        return Err(KMeansError::invalid(format!(
            "k must be between 1 and the number of points ({}), got {}",
            data.nrows(),
            k
        )));
    }
    Ok(())
}

/// Sample `k` rows of `data` without replacement, uniformly over row indices.
pub fn generate_k<R: Rng + ?Sized>(
    data: ArrayView2<f64>,
    k: usize,
    rng: &mut R,
) -> Result<Array2<f64>> {
    validate(data, k)?;
    let picked = index::sample(rng, data.nrows(), k).into_vec();
    Ok(data.select(Axis(0), &picked))
}

/// Index of the nearest center for every row of `data`.
pub fn assign_points(data: ArrayView2<f64>, centers: ArrayView2<f64>) -> Vec<usize> {
    data.outer_iter()
        .map(|point| {
            let mut best_cluster = 0;
            let mut best_dist = f64::INFINITY;
            for (ci, center) in centers.outer_iter().enumerate() {
                let dist = distance(point, center);
                if dist < best_dist {
                    best_dist = dist;
                    best_cluster = ci;
                }
            }
            best_cluster
        })
        .collect()
}

/// One center per label present in `assignments`, ordered by first encounter.
pub fn update_centers(data: ArrayView2<f64>, assignments: &[usize]) -> Result<Array2<f64>> {
    check_parallel(data, assignments)?;

    let mut order: Vec<usize> = Vec::new();
    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in assignments.iter().enumerate() {
        members
            .entry(label)
            .or_insert_with(|| {
                order.push(label);
                Vec::new()
            })
            .push(i);
    }

    let mut centers = Array2::<f64>::zeros((order.len(), data.ncols()));
    for (ci, label) in order.iter().enumerate() {
        let points = data.select(Axis(0), &members[label]);
        centers.row_mut(ci).assign(&centroid(points.view())?);
    }
    Ok(centers)
}

/// One center per slot of `previous`; slot `c` becomes the mean of the points
/// labelled `c`. An empty slot keeps its previous center, or fails when
/// `fail_on_empty` is set.
pub fn update_centers_stable(
    data: ArrayView2<f64>,
    assignments: &[usize],
    previous: ArrayView2<f64>,
    fail_on_empty: bool,
) -> Result<Array2<f64>> {
    check_parallel(data, assignments)?;
    let k = previous.nrows();

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (i, &label) in assignments.iter().enumerate() {
        if label >= k {
            return Err(KMeansError::invalid(format!(
                "label {} out of range for {} centers",
                label, k
            )));
        }
        members[label].push(i);
    }

    let mut centers = previous.to_owned();
    for (label, idx) in members.iter().enumerate() {
        if idx.is_empty() {
            if fail_on_empty {
                return Err(KMeansError::EmptyCluster { label });
            }
            warn!("cluster {} is empty, keeping its previous center", label);
            continue;
        }
        let points = data.select(Axis(0), idx);
        centers.row_mut(label).assign(&centroid(points.view())?);
    }
    Ok(centers)
}

fn check_parallel(data: ArrayView2<f64>, assignments: &[usize]) -> Result<()> {
    if data.nrows() != assignments.len() {
        return Err(KMeansError::invalid(format!(
            "{} assignments for {} points",
            assignments.len(),
            data.nrows()
        )));
    }
    Ok(())
}

/// Sum of squared distances from each point to its assigned center.
pub fn inertia(data: ArrayView2<f64>, centers: ArrayView2<f64>, assignments: &[usize]) -> f64 {
    data.outer_iter()
        .zip(assignments)
        .map(|(point, &c)| distance(point, centers.row(c)).powi(2))
        .sum()
}

/// Points grouped by cluster label, in dataset order within each cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    clusters: BTreeMap<usize, Array2<f64>>,
}

impl Clustering {
    /// Group the rows of `data` under their labels.
    pub fn from_assignments(data: ArrayView2<f64>, assignments: &[usize]) -> Result<Self> {
        check_parallel(data, assignments)?;
        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &label) in assignments.iter().enumerate() {
            members.entry(label).or_default().push(i);
        }
        let clusters = members
            .into_iter()
            .map(|(label, idx)| (label, data.select(Axis(0), &idx)))
            .collect();
        Ok(Self { clusters })
    }

    /// Number of non-empty clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn get(&self, label: usize) -> Option<ArrayView2<'_, f64>> {
        self.clusters.get(&label).map(|points| points.view())
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, ArrayView2<'_, f64>)> + '_ {
        self.clusters
            .iter()
            .map(|(&label, points)| (label, points.view()))
    }

    /// `(label, number of points)` for every cluster.
    pub fn sizes(&self) -> Vec<(usize, usize)> {
        self.clusters
            .iter()
            .map(|(&label, points)| (label, points.nrows()))
            .collect()
    }

    /// Sum over clusters of the distance from each point to the cluster's
    /// centroid, recomputed from the cluster's points.
    pub fn cost(&self) -> f64 {
        self.clusters
            .values()
            .map(|points| {
                let Ok(center) = centroid(points.view()) else {
                    return 0.0;
                };
                points
                    .outer_iter()
                    .map(|p| distance(p, center.view()))
                    .sum::<f64>()
            })
            .sum()
    }
}
