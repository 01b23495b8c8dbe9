//! Edge weight distribution strategies
//!
//! Each strategy apportions a surface's load among its supported boundary
//! edges. Weights of one surface sum to 1; free edges always carry 0.

use crate::error::{AreaLoadError, Result};
use crate::loads::definition::{DistributionMethod, SpanAxis};
use crate::loads::diagnostics::Diagnostic;
use crate::mesh::geometry::{
    angle_between_lines, angle_between_vectors, project_onto_plane, LENGTH_EPSILON,
};
use crate::mesh::types::{EdgeId, Point, Surface, Vec3};
use serde::{Deserialize, Serialize};

/// Deviation differences below this (degrees) count as a tie
const ANGLE_TIE_DEGREES: f64 = 1e-6;

/// Relative tolerance for collinear edges and coincident support lines
const COLLINEAR_TOLERANCE: f64 = 1e-9;

/// How a two-way load is split between perpendicular edge groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TwoWayRule {
    /// Group share proportional to the edge length of the other groups
    ///
    /// Edges across a long span pick up the load of that span, so on a
    /// rectangle the short edges carry more.
    #[default]
    LengthProportional,
    /// Rankine-Grashof strip analogy: share proportional to span^-4
    SlabAnalogy,
}

/// Tolerances and policies for edge weight distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionSettings {
    /// Angular tolerance in degrees for perpendicularity and direction grouping
    pub angular_tolerance: f64,

    /// Allowed deviation of the raw weight sum from 1.0 before rescaling
    pub drift_tolerance: f64,

    /// Spread one-way load evenly when fewer than two edges qualify
    pub even_fallback: bool,

    /// Group share rule for two-way distribution
    pub two_way_rule: TwoWayRule,
}

impl Default for DistributionSettings {
    fn default() -> Self {
        Self {
            angular_tolerance: 10.0,
            drift_tolerance: 1e-6,
            even_fallback: false,
            two_way_rule: TwoWayRule::LengthProportional,
        }
    }
}

impl DistributionSettings {
    /// Create settings with the given angular tolerance
    pub fn new(angular_tolerance: f64) -> Self {
        Self {
            angular_tolerance,
            ..Self::default()
        }
    }

    /// Enable or disable the one-way even-distribution fallback
    pub fn with_even_fallback(mut self, enabled: bool) -> Self {
        self.even_fallback = enabled;
        self
    }

    /// Select the two-way group share rule
    pub fn with_two_way_rule(mut self, rule: TwoWayRule) -> Self {
        self.two_way_rule = rule;
        self
    }

    /// Check that tolerances are usable
    pub fn validate(&self) -> Result<()> {
        if !(self.angular_tolerance > 0.0 && self.angular_tolerance < 45.0) {
            return Err(AreaLoadError::ConfigError(format!(
                "angular_tolerance must be in (0, 45) degrees, got {}",
                self.angular_tolerance
            )));
        }
        if !(self.drift_tolerance > 0.0 && self.drift_tolerance.is_finite()) {
            return Err(AreaLoadError::ConfigError(format!(
                "drift_tolerance must be positive, got {}",
                self.drift_tolerance
            )));
        }
        Ok(())
    }
}

/// Weight per boundary edge, indexed by edge ID
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeWeights {
    weights: Vec<f64>,
}

impl EdgeWeights {
    /// Wrap raw weights (one per boundary edge, in edge order)
    pub fn from_raw(weights: Vec<f64>) -> Self {
        Self { weights }
    }

    /// Weight of an edge; unknown edges carry 0
    pub fn get(&self, edge_id: EdgeId) -> f64 {
        self.weights.get(edge_id).copied().unwrap_or(0.0)
    }

    /// Number of edges
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether there are no edges
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Sum of all weights
    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Number of edges carrying load
    pub fn nonzero_count(&self) -> usize {
        self.weights.iter().filter(|&&w| w != 0.0).count()
    }

    /// Weights in edge order
    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    /// Rescale to sum exactly to 1 if the raw sum drifted beyond `tolerance`
    ///
    /// Returns a drift diagnostic when a rescale happened.
    pub fn normalize(&mut self, tolerance: f64) -> Option<Diagnostic> {
        let raw_sum = self.sum();
        if (raw_sum - 1.0).abs() <= tolerance || raw_sum <= 0.0 {
            return None;
        }

        log::warn!(
            "Edge weights sum to {:.9}; rescaling to 1 (FactorNormalizationDrift)",
            raw_sum
        );

        for w in &mut self.weights {
            *w /= raw_sum;
        }

        Some(Diagnostic::FactorNormalizationDrift { raw_sum })
    }
}

/// Edge weights plus any diagnostics raised while computing them
#[derive(Debug, Clone)]
pub struct DistributionOutcome {
    pub weights: EdgeWeights,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compute edge weights for a surface using the given method
///
/// `load_direction` is only used by [`DistributionMethod::OpenStructure`].
pub fn distribute(
    surface: &Surface,
    method: &DistributionMethod,
    load_direction: &Vec3,
    settings: &DistributionSettings,
) -> Result<DistributionOutcome> {
    let mut diagnostics = Vec::new();

    let raw = match method {
        DistributionMethod::OneWay(axis) => {
            let (raw, fallback) = one_way_weights(surface, axis, settings)?;
            diagnostics.extend(fallback);
            raw
        }
        DistributionMethod::TwoWay => two_way_weights(surface, settings)?,
        DistributionMethod::OpenStructure => open_structure_weights(surface, load_direction)?,
    };

    let mut weights = EdgeWeights::from_raw(raw);
    diagnostics.extend(weights.normalize(settings.drift_tolerance));

    log::debug!(
        "{} weights for '{}': {:?}",
        method.name(),
        surface.name,
        weights.as_slice()
    );

    Ok(DistributionOutcome {
        weights,
        diagnostics,
    })
}

/// Consecutive supported boundary edges lying on one straight line
///
/// Element-derived boundaries split each side into one edge per element; the
/// one-way split works on whole lines so both halves never land on one side.
#[derive(Debug)]
struct SupportLine {
    edges: Vec<EdgeId>,
    length: f64,
    /// Deviation of the line from perpendicular to the axis, degrees
    deviation: f64,
    /// Midpoint position along the transfer axis
    offset: f64,
}

/// One-way: the two support lines most nearly perpendicular to the axis
///
/// Each chosen line carries 0.5, spread over its edges by length.
fn one_way_weights(
    surface: &Surface,
    axis: &SpanAxis,
    settings: &DistributionSettings,
) -> Result<(Vec<f64>, Option<Diagnostic>)> {
    let in_plane = project_onto_plane(&axis.unit(), &surface.normal);

    // An axis along the normal has no in-plane span, so no line qualifies
    let lines: Vec<SupportLine> = if in_plane.norm() < 1e-9 {
        log::warn!(
            "Transfer axis is normal to surface '{}' and spans no edges",
            surface.name
        );
        Vec::new()
    } else {
        let axis = in_plane.normalize();
        support_lines(surface, &axis)
            .into_iter()
            .filter(|line| line.deviation <= settings.angular_tolerance)
            .collect()
    };

    let offset_tolerance = COLLINEAR_TOLERANCE * surface.perimeter().max(1.0);
    let picked = pick_support_line(&lines, |_| true).and_then(|first| {
        let first_offset = lines[first].offset;
        pick_support_line(&lines, |line| {
            (line.offset - first_offset).abs() > offset_tolerance
        })
        .map(|second| (first, second))
    });

    let mut weights = vec![0.0; surface.num_edges()];

    let Some((first, second)) = picked else {
        if !settings.even_fallback {
            return Err(AreaLoadError::InsufficientEdges(format!(
                "Surface '{}' has {} support line(s) within {} degrees of perpendicular to the transfer axis, 2 on opposite sides required",
                surface.name,
                lines.len(),
                settings.angular_tolerance
            )));
        }

        let supported = surface.num_supported();
        if supported == 0 {
            return Err(AreaLoadError::InsufficientEdges(format!(
                "Surface '{}' has no supported edges",
                surface.name
            )));
        }

        log::warn!(
            "Surface '{}': {} qualifying support line(s) for one-way distribution, spreading evenly",
            surface.name,
            lines.len()
        );
        for edge in surface.supported_edges() {
            weights[edge.id] = 1.0 / supported as f64;
        }
        return Ok((
            weights,
            Some(Diagnostic::EvenDistributionFallback {
                qualifying_edges: lines.len(),
            }),
        ));
    };

    for line in [&lines[first], &lines[second]] {
        for &id in &line.edges {
            weights[id] = 0.5 * surface.edges[id].length / line.length;
        }
    }

    Ok((weights, None))
}

/// Merge runs of consecutive, collinear supported edges into lines
fn support_lines(surface: &Surface, axis: &Vec3) -> Vec<SupportLine> {
    let continues = |a: EdgeId, b: EdgeId| {
        let (ea, eb) = (&surface.edges[a], &surface.edges[b]);
        ea.supported
            && eb.supported
            && ea.direction().cross(&eb.direction()).norm() <= COLLINEAR_TOLERANCE
            && ea.direction().dot(&eb.direction()) > 0.0
    };

    let n = surface.num_edges();
    let mut runs: Vec<Vec<EdgeId>> = Vec::new();
    for edge in &surface.edges {
        if !edge.supported {
            continue;
        }
        let extends = runs
            .last()
            .and_then(|run| run.last())
            .is_some_and(|&last| last + 1 == edge.id && continues(last, edge.id));
        match runs.last_mut() {
            Some(run) if extends => run.push(edge.id),
            _ => runs.push(vec![edge.id]),
        }
    }

    // The loop may start part-way along a line
    if runs.len() > 1 {
        let wraps = match (runs.first(), runs.last()) {
            (Some(head), Some(tail)) => {
                head[0] == 0
                    && tail.last().is_some_and(|&last| last == n - 1 && continues(last, 0))
            }
            _ => false,
        };
        if wraps {
            if let Some(mut tail) = runs.pop() {
                tail.extend(runs[0].iter().copied());
                runs[0] = tail;
            }
        }
    }

    runs.into_iter()
        .map(|edges| {
            let start = surface.edges[edges[0]].start;
            let end = surface.edges[edges[edges.len() - 1]].end;
            let length: f64 = edges.iter().map(|&id| surface.edges[id].length).sum();
            let deviation = (angle_between_vectors(&(end - start), axis) - 90.0).abs();
            // Length-weighted edge midpoints give the line midpoint
            let offset = edges
                .iter()
                .map(|&id| {
                    let edge = &surface.edges[id];
                    edge.length * edge.midpoint().coords.dot(axis)
                })
                .sum::<f64>()
                / length;
            SupportLine {
                edges,
                length,
                deviation,
                offset,
            }
        })
        .collect()
}

/// Smallest deviation wins; near-ties go to the longer line, then the earlier one
fn pick_support_line<F>(lines: &[SupportLine], allowed: F) -> Option<usize>
where
    F: Fn(&SupportLine) -> bool,
{
    let best_deviation = lines
        .iter()
        .filter(|line| allowed(line))
        .map(|line| line.deviation)
        .fold(f64::INFINITY, f64::min);

    let mut chosen: Option<(usize, f64)> = None;
    for (index, line) in lines.iter().enumerate() {
        if !allowed(line) || line.deviation > best_deviation + ANGLE_TIE_DEGREES {
            continue;
        }
        match chosen {
            Some((_, best_length)) if line.length <= best_length => {}
            _ => chosen = Some((index, line.length)),
        }
    }

    chosen.map(|(index, _)| index)
}

/// Supported edges sharing a direction (up to orientation)
struct EdgeGroup {
    direction: Vec3,
    members: Vec<EdgeId>,
    total_length: f64,
}

/// Two-way: share between direction groups, split evenly inside a group
fn two_way_weights(surface: &Surface, settings: &DistributionSettings) -> Result<Vec<f64>> {
    let mut groups: Vec<EdgeGroup> = Vec::new();

    for edge in surface.supported_edges() {
        let direction = edge.direction();
        match groups
            .iter_mut()
            .find(|g| angle_between_lines(&g.direction, &direction) <= settings.angular_tolerance)
        {
            Some(group) => {
                group.members.push(edge.id);
                group.total_length += edge.length;
            }
            None => groups.push(EdgeGroup {
                direction,
                members: vec![edge.id],
                total_length: edge.length,
            }),
        }
    }

    if groups.is_empty() {
        return Err(AreaLoadError::InsufficientEdges(format!(
            "Surface '{}' has no supported edges",
            surface.name
        )));
    }

    if groups.len() != 2 {
        log::debug!(
            "Surface '{}' boundary forms {} direction groups",
            surface.name,
            groups.len()
        );
    }

    let shares: Vec<f64> = match settings.two_way_rule {
        TwoWayRule::LengthProportional => {
            let perimeter: f64 = groups.iter().map(|g| g.total_length).sum();
            let shares: Vec<f64> = groups.iter().map(|g| perimeter - g.total_length).collect();
            // A single group has no opposing span and takes everything
            if shares.iter().sum::<f64>() < LENGTH_EPSILON {
                vec![1.0; groups.len()]
            } else {
                shares
            }
        }
        TwoWayRule::SlabAnalogy => groups
            .iter()
            .map(|g| {
                let across = surface.normal.cross(&g.direction);
                let span = extent_along(&surface.vertices, &across);
                1.0 / span.max(LENGTH_EPSILON).powi(4)
            })
            .collect(),
    };
    let total: f64 = shares.iter().sum();

    let mut weights = vec![0.0; surface.num_edges()];
    for (group, share) in groups.iter().zip(&shares) {
        let per_edge = share / total / group.members.len() as f64;
        for &id in &group.members {
            weights[id] = per_edge;
        }
    }

    Ok(weights)
}

/// Open structure: projected length across the load direction
fn open_structure_weights(surface: &Surface, load_direction: &Vec3) -> Result<Vec<f64>> {
    let direction = load_direction.normalize();

    let raw: Vec<f64> = surface
        .edges
        .iter()
        .map(|e| {
            if e.supported {
                project_onto_plane(&e.vector(), &direction).norm()
            } else {
                0.0
            }
        })
        .collect();

    let total: f64 = raw.iter().sum();
    if total < LENGTH_EPSILON {
        return Err(AreaLoadError::InsufficientEdges(format!(
            "Surface '{}' has no supported edge length across the load direction",
            surface.name
        )));
    }

    Ok(raw.into_iter().map(|l| l / total).collect())
}

/// Width of a point set measured along an axis
fn extent_along(points: &[Point], axis: &Vec3) -> f64 {
    let (min, max) = points
        .iter()
        .map(|p| p.coords.dot(axis))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        });
    max - min
}
