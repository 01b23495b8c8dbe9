//! Load pipeline for single instances and independent batches

use crate::error::{AreaLoadError, Result};
use crate::loads::{
    distribute, effective_pressure, map_to_elements, total_force, CoordinateTransformer,
    Diagnostic, DistributionOutcome, DistributionSettings, ElementLoadRecord, LoadCategory,
    LoadDefinition, SolverVec3,
};
use crate::mesh::{extract_surface, EdgeId, ElementTopology, Point, Surface};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Where an instance's boundary comes from
#[derive(Debug, Clone)]
pub enum SurfaceSource {
    /// Explicit closed outline in winding order
    Outline(Vec<Point>),

    /// Outer boundary of the instance's own elements
    Elements,
}

/// One surface load to compute
#[derive(Debug, Clone)]
pub struct LoadInstance {
    pub name: String,
    pub source: SurfaceSource,

    /// Boundary edge indices that carry no load
    pub free_edges: Vec<EdgeId>,

    pub load: LoadDefinition,
    pub elements: Vec<ElementTopology>,
}

impl LoadInstance {
    pub fn new(
        name: &str,
        source: SurfaceSource,
        load: LoadDefinition,
        elements: Vec<ElementTopology>,
    ) -> Self {
        Self {
            name: name.to_string(),
            source,
            free_edges: Vec::new(),
            load,
            elements,
        }
    }

    pub fn with_free_edges(mut self, free_edges: Vec<EdgeId>) -> Self {
        self.free_edges = free_edges;
        self
    }

    /// Build and validate the loaded surface
    pub fn surface(&self) -> Result<Surface> {
        let surface = match &self.source {
            SurfaceSource::Outline(vertices) => Surface::from_outline(&self.name, vertices.clone())?,
            SurfaceSource::Elements => extract_surface(&self.name, &self.elements)?,
        };
        surface.with_free_edges(&self.free_edges)
    }
}

/// An instance whose load definition was rejected while reading a batch
#[derive(Debug)]
pub struct RejectedInstance {
    pub name: String,
    pub case_id: String,
    pub category: LoadCategory,
    pub error: AreaLoadError,
}

/// One batch slot: a ready instance or a rejected definition
pub type BatchEntry = std::result::Result<LoadInstance, RejectedInstance>;

/// Everything one instance produced
#[derive(Debug, Clone)]
pub struct InstanceReport {
    pub name: String,
    pub case_id: String,
    pub category: LoadCategory,

    /// Surface area, `None` if the surface could not be built
    pub area: Option<f64>,

    /// Effective pressure, `None` if the instance failed before projection
    pub effective_pressure: Option<f64>,

    /// Edge weights in boundary edge order
    pub weights: Vec<f64>,

    /// Solver-ready nodal forces
    pub records: Vec<ElementLoadRecord>,

    pub diagnostics: Vec<Diagnostic>,
}

impl InstanceReport {
    fn failed(name: &str, case_id: &str, category: LoadCategory, diagnostic: Diagnostic) -> Self {
        Self {
            name: name.to_string(),
            case_id: case_id.to_string(),
            category,
            area: None,
            effective_pressure: None,
            weights: Vec::new(),
            records: Vec::new(),
            diagnostics: vec![diagnostic],
        }
    }

    /// Whether the instance was aborted
    pub fn is_failed(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_failure)
    }

    /// Sum of record forces (solver convention)
    pub fn total_force(&self) -> SolverVec3 {
        total_force(&self.records)
    }
}

/// Run the full pipeline on an already built surface
///
/// Geometry, direction and edge errors abort the call. Elements with broken
/// topology are skipped and reported as diagnostics.
pub fn compute_loads(
    name: &str,
    surface: &Surface,
    load: &LoadDefinition,
    elements: &[ElementTopology],
    settings: &DistributionSettings,
) -> Result<InstanceReport> {
    settings.validate()?;

    let direction = load.direction();
    let pressure = effective_pressure(load.intensity(), &direction, &surface.normal)?;

    log::info!(
        "'{}': area {:.6}, effective pressure {:.6} ({} {})",
        name,
        surface.area,
        pressure,
        load.category().code(),
        load.method().name()
    );

    let DistributionOutcome {
        weights,
        mut diagnostics,
    } = distribute(surface, &load.method(), &direction, settings)?;

    let mapping = map_to_elements(pressure, &direction, &weights, surface, elements);
    diagnostics.extend(mapping.failures.iter().cloned());

    let resultant = mapping.resultant();
    log::debug!(
        "'{}': resultant {:.6} against expected {:.6}",
        name,
        resultant.norm(),
        (pressure * surface.area).abs()
    );

    let records =
        CoordinateTransformer::to_solver_records(mapping.forces, load.case_id(), load.category());

    Ok(InstanceReport {
        name: name.to_string(),
        case_id: load.case_id().to_string(),
        category: load.category(),
        area: Some(surface.area),
        effective_pressure: Some(pressure),
        weights: weights.as_slice().to_vec(),
        records,
        diagnostics,
    })
}

/// Build the instance's surface and run the pipeline on it
pub fn compute_instance(
    instance: &LoadInstance,
    settings: &DistributionSettings,
) -> Result<InstanceReport> {
    let surface = instance.surface()?;
    compute_loads(
        &instance.name,
        &surface,
        &instance.load,
        &instance.elements,
        settings,
    )
}

/// Compute independent instances, keeping input order
///
/// A failing instance gets an empty record list and an `InstanceFailed`
/// diagnostic; the others are unaffected.
pub fn compute_batch(
    instances: &[LoadInstance],
    settings: &DistributionSettings,
) -> Vec<InstanceReport> {
    compute_batch_with_progress(instances, settings, |_| {})
}

/// [`compute_batch`] with a callback after each finished instance
///
/// The callback may run on worker threads in any order.
pub fn compute_batch_with_progress<F>(
    instances: &[LoadInstance],
    settings: &DistributionSettings,
    on_done: F,
) -> Vec<InstanceReport>
where
    F: Fn(&InstanceReport) + Sync + Send,
{
    run_batch(instances, |instance| isolated(instance, settings), on_done)
}

/// Compute a batch as read from input, keeping entry order
///
/// Rejected entries produce an `InstanceFailed` report next to their
/// computed siblings.
pub fn compute_entries_with_progress<F>(
    entries: &[BatchEntry],
    settings: &DistributionSettings,
    on_done: F,
) -> Vec<InstanceReport>
where
    F: Fn(&InstanceReport) + Sync + Send,
{
    run_batch(
        entries,
        |entry| match entry {
            Ok(instance) => isolated(instance, settings),
            Err(rejected) => {
                log::warn!("Instance '{}' rejected: {}", rejected.name, rejected.error);
                InstanceReport::failed(
                    &rejected.name,
                    &rejected.case_id,
                    rejected.category,
                    Diagnostic::from_error(&rejected.error),
                )
            }
        },
        on_done,
    )
}

fn run_batch<T, C, F>(items: &[T], compute: C, on_done: F) -> Vec<InstanceReport>
where
    T: Sync,
    C: Fn(&T) -> InstanceReport + Sync + Send,
    F: Fn(&InstanceReport) + Sync + Send,
{
    log::info!("Computing {} load instance(s)", items.len());

    let run = |item: &T| {
        let report = compute(item);
        on_done(&report);
        report
    };

    // Below this, thread overhead outweighs the work
    const PARALLEL_THRESHOLD: usize = 8;

    #[cfg(feature = "parallel")]
    let reports: Vec<InstanceReport> = if items.len() >= PARALLEL_THRESHOLD {
        items.par_iter().map(run).collect()
    } else {
        items.iter().map(run).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let reports: Vec<InstanceReport> = items.iter().map(run).collect();

    let failed = reports.iter().filter(|r| r.is_failed()).count();
    log::info!(
        "Computed {} instance(s), {} failed",
        reports.len() - failed,
        failed
    );

    reports
}

fn isolated(instance: &LoadInstance, settings: &DistributionSettings) -> InstanceReport {
    compute_instance(instance, settings).unwrap_or_else(|e| {
        log::warn!("Instance '{}' failed: {}", instance.name, e);
        InstanceReport::failed(
            &instance.name,
            instance.load.case_id(),
            instance.load.category(),
            Diagnostic::from_error(&e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::{DistributionMethod, SpanAxis};
    use crate::mesh::Vec3;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y, 0.0)
    }

    fn square_outline() -> SurfaceSource {
        SurfaceSource::Outline(vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)])
    }

    /// 4x4 plate meshed as 2x2 quads, nodes numbered row by row
    fn plate_elements() -> Vec<ElementTopology> {
        let node = |i: usize, j: usize| (j * 3 + i, p(2.0 * i as f64, 2.0 * j as f64));
        let mut elements = Vec::new();
        for j in 0..2 {
            for i in 0..2 {
                let corners = [node(i, j), node(i + 1, j), node(i + 1, j + 1), node(i, j + 1)];
                elements.push(ElementTopology::new(
                    j * 2 + i,
                    corners.iter().map(|c| c.0).collect(),
                    corners.iter().map(|c| c.1).collect(),
                ));
            }
        }
        elements
    }

    fn load(direction: Vec3, method: DistributionMethod) -> LoadDefinition {
        LoadDefinition::new(5.0, direction, method, LoadCategory::Dead, "D1").unwrap()
    }

    #[test]
    fn test_two_way_square_plate() {
        let instance = LoadInstance::new(
            "slab",
            square_outline(),
            load(Vec3::new(0.0, 0.0, -1.0), DistributionMethod::TwoWay),
            plate_elements(),
        );

        let report = compute_instance(&instance, &DistributionSettings::default()).unwrap();

        assert_relative_eq!(report.effective_pressure.unwrap(), 5.0);
        for w in &report.weights {
            assert_relative_eq!(*w, 0.25, epsilon = 1e-12);
        }
        assert_eq!(report.records.len(), 8);
        assert!(report.diagnostics.is_empty());

        // Downward authoring Z becomes solver Y
        let total = report.total_force();
        assert_relative_eq!(total.y(), -80.0, epsilon = 1e-9);
        assert_relative_eq!(total.z(), 0.0, epsilon = 1e-12);
        assert!(report.records.iter().all(|r| r.case_id == "D1"));
    }

    #[test]
    fn test_one_way_x_square_plate() {
        let instance = LoadInstance::new(
            "slab",
            square_outline(),
            load(
                Vec3::new(0.0, 0.0, -1.0),
                DistributionMethod::OneWay(SpanAxis::X),
            ),
            plate_elements(),
        );

        let report = compute_instance(&instance, &DistributionSettings::default()).unwrap();

        assert_eq!(report.weights, vec![0.0, 0.5, 0.0, 0.5]);
        assert_relative_eq!(report.total_force().y(), -80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_in_plane_direction_gives_zero_records() {
        let instance = LoadInstance::new(
            "slab",
            square_outline(),
            load(Vec3::new(1.0, 0.0, 0.0), DistributionMethod::TwoWay),
            plate_elements(),
        );

        let report = compute_instance(&instance, &DistributionSettings::default()).unwrap();

        assert_eq!(report.effective_pressure, Some(0.0));
        assert_eq!(report.records.len(), 8);
        assert!(report.records.iter().all(|r| r.force.norm() == 0.0));
    }

    #[test]
    fn test_degenerate_instance_isolated_in_batch() {
        let degenerate = LoadInstance::new(
            "sliver",
            SurfaceSource::Outline(vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)]),
            load(Vec3::new(0.0, 0.0, -1.0), DistributionMethod::TwoWay),
            Vec::new(),
        );
        let healthy = LoadInstance::new(
            "slab",
            square_outline(),
            load(Vec3::new(0.0, 0.0, -1.0), DistributionMethod::TwoWay),
            plate_elements(),
        );

        assert!(matches!(
            compute_instance(&degenerate, &DistributionSettings::default()),
            Err(AreaLoadError::DegenerateGeometry(_))
        ));

        let reports = compute_batch(&[degenerate, healthy], &DistributionSettings::default());

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].name, "sliver");
        assert!(reports[0].is_failed());
        assert!(reports[0].records.is_empty());
        assert!(matches!(
            &reports[0].diagnostics[0],
            Diagnostic::InstanceFailed { error, .. } if error == "DegenerateGeometry"
        ));

        assert!(!reports[1].is_failed());
        assert_eq!(reports[1].records.len(), 8);
    }

    #[test]
    fn test_surface_from_elements() {
        let instance = LoadInstance::new(
            "skinned",
            SurfaceSource::Elements,
            load(Vec3::new(0.0, 0.0, -1.0), DistributionMethod::TwoWay),
            plate_elements(),
        );

        let report = compute_instance(&instance, &DistributionSettings::default()).unwrap();

        assert_relative_eq!(report.area.unwrap(), 16.0, epsilon = 1e-9);
        assert_eq!(report.weights.len(), 8);
        assert_relative_eq!(report.weights.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(report.total_force().y(), -80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_one_way_on_element_boundary() {
        // Loop 0-1-2-5-8-7-6-3: each plate side is split into two edges
        let instance = LoadInstance::new(
            "skinned",
            SurfaceSource::Elements,
            load(
                Vec3::new(0.0, 0.0, -1.0),
                DistributionMethod::OneWay(SpanAxis::X),
            ),
            plate_elements(),
        );

        let report = compute_instance(&instance, &DistributionSettings::default()).unwrap();

        let expected = [0.0, 0.0, 0.25, 0.25, 0.0, 0.0, 0.25, 0.25];
        for (w, e) in report.weights.iter().zip(expected) {
            assert_relative_eq!(*w, e, epsilon = 1e-12);
        }

        let force_y = |id: usize| {
            report
                .records
                .iter()
                .find(|r| r.node_id == id)
                .map(|r| r.force.y())
                .unwrap()
        };
        assert_relative_eq!(force_y(0), -10.0, epsilon = 1e-9);
        assert_relative_eq!(force_y(3), -20.0, epsilon = 1e-9);
        assert_relative_eq!(force_y(5), -20.0, epsilon = 1e-9);
        assert_relative_eq!(force_y(1), 0.0, epsilon = 1e-12);
        assert_relative_eq!(report.total_force().y(), -80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_free_edges_unloaded() {
        let instance = LoadInstance::new(
            "cantilever",
            square_outline(),
            load(Vec3::new(0.0, 0.0, -1.0), DistributionMethod::TwoWay),
            plate_elements(),
        )
        .with_free_edges(vec![2]);

        let report = compute_instance(&instance, &DistributionSettings::default()).unwrap();

        assert_eq!(report.weights[2], 0.0);
        assert_relative_eq!(report.weights.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_broken_element_reported() {
        let mut elements = plate_elements();
        elements[3].node_ids.pop();
        elements[3].positions.pop();
        elements[3].node_ids.pop();
        elements[3].positions.pop();

        let instance = LoadInstance::new(
            "slab",
            square_outline(),
            load(Vec3::new(0.0, 0.0, -1.0), DistributionMethod::TwoWay),
            elements,
        );

        let report = compute_instance(&instance, &DistributionSettings::default()).unwrap();

        assert!(!report.is_failed());
        assert!(report
            .diagnostics
            .contains(&Diagnostic::ElementSkipped {
                element_id: 3,
                reason: "expected 3 or 4 corner nodes, found 2".to_string()
            }));
    }

    #[test]
    fn test_batch_keeps_order() {
        let instances: Vec<LoadInstance> = (0..12)
            .map(|i| {
                let load = LoadDefinition::new(
                    i as f64,
                    Vec3::new(0.0, 0.0, -1.0),
                    DistributionMethod::TwoWay,
                    LoadCategory::Live,
                    &format!("L{}", i),
                )
                .unwrap();
                LoadInstance::new(&format!("slab-{}", i), square_outline(), load, plate_elements())
            })
            .collect();

        let reports = compute_batch(&instances, &DistributionSettings::default());

        assert_eq!(reports.len(), 12);
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.name, format!("slab-{}", i));
            assert_relative_eq!(report.total_force().y(), -16.0 * i as f64, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rejected_entry_keeps_slot() {
        let healthy = LoadInstance::new(
            "slab",
            square_outline(),
            load(Vec3::new(0.0, 0.0, -1.0), DistributionMethod::TwoWay),
            plate_elements(),
        );
        let rejected = RejectedInstance {
            name: "no-axis".to_string(),
            case_id: "L2".to_string(),
            category: LoadCategory::Live,
            error: AreaLoadError::ConfigError("OneWay distribution requires one_way_axis".into()),
        };
        let entries: Vec<BatchEntry> = vec![Err(rejected), Ok(healthy)];

        let reports =
            compute_entries_with_progress(&entries, &DistributionSettings::default(), |_| {});

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].name, "no-axis");
        assert_eq!(reports[0].case_id, "L2");
        assert!(reports[0].is_failed());
        assert!(reports[0].records.is_empty());
        assert!(matches!(
            &reports[0].diagnostics[0],
            Diagnostic::InstanceFailed { error, .. } if error == "ConfigError"
        ));

        assert!(!reports[1].is_failed());
        assert_relative_eq!(reports[1].total_force().y(), -80.0, epsilon = 1e-9);
    }
}
