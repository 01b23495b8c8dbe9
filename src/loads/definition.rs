//! Load definitions: intensity, direction, distribution method and tagging

use crate::error::{AreaLoadError, Result};
use crate::mesh::geometry::unit_vector;
use crate::mesh::types::Vec3;
use serde::{Deserialize, Serialize};

/// Load category tag carried through to the output records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadCategory {
    /// DL - Dead load
    #[serde(rename = "DL")]
    Dead,
    /// LL - Live load
    #[serde(rename = "LL")]
    Live,
    /// LL_Roof - Roof live load
    #[serde(rename = "LL_Roof")]
    LiveRoof,
    /// W - Wind load
    #[serde(rename = "W")]
    Wind,
    /// E - Seismic load
    #[serde(rename = "E")]
    Seismic,
    /// H - Lateral earth or groundwater pressure
    #[serde(rename = "H")]
    SoilLateral,
    /// F - Fluid pressure
    #[serde(rename = "F")]
    Fluid,
    /// T - Self-straining (temperature, shrinkage, creep)
    #[serde(rename = "T")]
    SelfStraining,
    /// CUSTOM - user-defined category
    #[serde(rename = "CUSTOM")]
    Custom,
}

impl LoadCategory {
    /// Standard abbreviation code
    pub fn code(&self) -> &'static str {
        match self {
            LoadCategory::Dead => "DL",
            LoadCategory::Live => "LL",
            LoadCategory::LiveRoof => "LL_Roof",
            LoadCategory::Wind => "W",
            LoadCategory::Seismic => "E",
            LoadCategory::SoilLateral => "H",
            LoadCategory::Fluid => "F",
            LoadCategory::SelfStraining => "T",
            LoadCategory::Custom => "CUSTOM",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            LoadCategory::Dead => "Dead load",
            LoadCategory::Live => "Live load",
            LoadCategory::LiveRoof => "Roof live load",
            LoadCategory::Wind => "Wind load",
            LoadCategory::Seismic => "Seismic load",
            LoadCategory::SoilLateral => "Lateral earth pressure",
            LoadCategory::Fluid => "Fluid pressure",
            LoadCategory::SelfStraining => "Self-straining forces",
            LoadCategory::Custom => "Custom load",
        }
    }

    /// Whether this category normally acts under gravity
    pub fn is_gravity(&self) -> bool {
        matches!(
            self,
            LoadCategory::Dead | LoadCategory::Live | LoadCategory::LiveRoof
        )
    }
}

impl std::fmt::Display for LoadCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Transfer axis for one-way distribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpanAxis {
    /// Global X
    X,
    /// Global Y
    Y,
    /// Normalized user vector
    Custom(Vec3),
}

impl SpanAxis {
    /// Custom axis from a raw vector, rejecting zero and non-finite input
    pub fn custom(vector: Vec3) -> Result<Self> {
        Ok(SpanAxis::Custom(unit_vector(&vector, "custom axis vector")?))
    }

    /// Unit vector of the axis in the global frame
    pub fn unit(&self) -> Vec3 {
        match self {
            SpanAxis::X => Vec3::x(),
            SpanAxis::Y => Vec3::y(),
            SpanAxis::Custom(v) => *v,
        }
    }
}

/// How a surface load is apportioned to its boundary edges
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistributionMethod {
    /// Carried by the two edges spanning across the transfer axis
    OneWay(SpanAxis),
    /// Shared between perpendicular edge groups
    TwoWay,
    /// Proportional to edge length projected across the load direction
    OpenStructure,
}

impl DistributionMethod {
    /// Method name as used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            DistributionMethod::OneWay(_) => "OneWay",
            DistributionMethod::TwoWay => "TwoWay",
            DistributionMethod::OpenStructure => "OpenStructure",
        }
    }
}

/// A validated area load definition
///
/// Built through [`LoadDefinition::new`] or from a [`LoadDefinitionConfig`];
/// both reject a zero direction or non-finite intensity up front, so every
/// value of this type is computable.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadDefinition {
    intensity: f64,
    direction: Vec3,
    method: DistributionMethod,
    category: LoadCategory,
    case_id: String,
}

impl LoadDefinition {
    /// Create a new load definition
    ///
    /// `direction` is in the global authoring frame and need not be
    /// normalized; it is stored as a unit vector.
    pub fn new(
        intensity: f64,
        direction: Vec3,
        method: DistributionMethod,
        category: LoadCategory,
        case_id: &str,
    ) -> Result<Self> {
        if !intensity.is_finite() {
            return Err(AreaLoadError::ConfigError(format!(
                "Load intensity must be finite, got {}",
                intensity
            )));
        }

        let direction = unit_vector(&direction, "load direction")?;

        let method = match method {
            DistributionMethod::OneWay(SpanAxis::Custom(axis)) => {
                DistributionMethod::OneWay(SpanAxis::custom(axis)?)
            }
            other => other,
        };

        Ok(Self {
            intensity,
            direction,
            method,
            category,
            case_id: case_id.to_string(),
        })
    }

    /// Signed pressure intensity
    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Unit load direction (authoring frame)
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Distribution method
    pub fn method(&self) -> DistributionMethod {
        self.method
    }

    /// Load category
    pub fn category(&self) -> LoadCategory {
        self.category
    }

    /// Load case identifier
    pub fn case_id(&self) -> &str {
        &self.case_id
    }
}

/// Distribution method names accepted in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodName {
    OneWay,
    TwoWay,
    OpenStructure,
}

/// Axis names accepted in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisName {
    X,
    Y,
    Custom,
}

/// Flat serialized form of a load definition
///
/// Converted into a [`LoadDefinition`] with `TryFrom`, which is where
/// inconsistent combinations are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadDefinitionConfig {
    /// Signed pressure intensity
    pub intensity: f64,

    /// Load direction in the authoring frame
    pub direction: [f64; 3],

    /// Distribution method
    pub distribution_method: MethodName,

    /// Transfer axis, required for OneWay
    #[serde(default)]
    pub one_way_axis: Option<AxisName>,

    /// Axis vector, required when `one_way_axis` is Custom
    #[serde(default)]
    pub custom_axis_vector: Option<[f64; 3]>,

    /// Load category
    pub category: LoadCategory,

    /// Load case identifier
    pub case_id: String,
}

impl TryFrom<LoadDefinitionConfig> for LoadDefinition {
    type Error = AreaLoadError;

    fn try_from(config: LoadDefinitionConfig) -> Result<Self> {
        let method = match config.distribution_method {
            MethodName::OneWay => {
                let axis = match (config.one_way_axis, config.custom_axis_vector) {
                    (None, _) => {
                        return Err(AreaLoadError::ConfigError(
                            "OneWay distribution requires one_way_axis".to_string(),
                        ))
                    }
                    (Some(AxisName::X), _) => SpanAxis::X,
                    (Some(AxisName::Y), _) => SpanAxis::Y,
                    (Some(AxisName::Custom), None) => {
                        return Err(AreaLoadError::ConfigError(
                            "Custom one_way_axis requires custom_axis_vector".to_string(),
                        ))
                    }
                    (Some(AxisName::Custom), Some([x, y, z])) => {
                        SpanAxis::custom(Vec3::new(x, y, z))?
                    }
                };
                DistributionMethod::OneWay(axis)
            }
            MethodName::TwoWay => DistributionMethod::TwoWay,
            MethodName::OpenStructure => DistributionMethod::OpenStructure,
        };

        let [x, y, z] = config.direction;
        LoadDefinition::new(
            config.intensity,
            Vec3::new(x, y, z),
            method,
            config.category,
            &config.case_id,
        )
    }
}

impl From<&LoadDefinition> for LoadDefinitionConfig {
    fn from(load: &LoadDefinition) -> Self {
        let (distribution_method, one_way_axis, custom_axis_vector) = match load.method {
            DistributionMethod::OneWay(SpanAxis::X) => (MethodName::OneWay, Some(AxisName::X), None),
            DistributionMethod::OneWay(SpanAxis::Y) => (MethodName::OneWay, Some(AxisName::Y), None),
            DistributionMethod::OneWay(SpanAxis::Custom(v)) => {
                (MethodName::OneWay, Some(AxisName::Custom), Some([v.x, v.y, v.z]))
            }
            DistributionMethod::TwoWay => (MethodName::TwoWay, None, None),
            DistributionMethod::OpenStructure => (MethodName::OpenStructure, None, None),
        };

        Self {
            intensity: load.intensity,
            direction: [load.direction.x, load.direction.y, load.direction.z],
            distribution_method,
            one_way_axis,
            custom_axis_vector,
            category: load.category,
            case_id: load.case_id.clone(),
        }
    }
}
