//! JSON report export for computed load batches

use crate::engine::InstanceReport;
use crate::error::{AreaLoadError, Result};
use crate::loads::{Diagnostic, DistributionSettings, ElementLoadRecord, LoadCategory};
use crate::mesh::NodeId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete output of one batch run
#[derive(Debug, Serialize, Deserialize)]
pub struct LoadReport {
    /// Source batch file
    pub input_file: String,

    /// Timestamp when the batch was computed
    pub timestamp: String,

    /// Settings the batch ran with
    pub settings: DistributionSettings,

    pub summary: ReportSummary,

    pub instances: Vec<InstanceEntry>,
}

/// Batch totals
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    pub num_instances: usize,
    pub num_failed: usize,
    pub num_records: usize,
    pub num_diagnostics: usize,
}

/// One instance in the report; vectors are in the solver convention
#[derive(Debug, Serialize, Deserialize)]
pub struct InstanceEntry {
    pub name: String,
    pub case_id: String,
    pub category: LoadCategory,
    pub area: Option<f64>,
    pub effective_pressure: Option<f64>,
    pub edge_weights: Vec<f64>,
    pub total_force: [f64; 3],
    pub records: Vec<RecordEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One nodal force
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordEntry {
    pub node_id: NodeId,
    pub position: [f64; 3],
    pub force: [f64; 3],
}

impl From<&ElementLoadRecord> for RecordEntry {
    fn from(record: &ElementLoadRecord) -> Self {
        Self {
            node_id: record.node_id,
            position: record.position.to_array(),
            force: record.force.to_array(),
        }
    }
}

impl LoadReport {
    pub fn new(input_file: String, settings: &DistributionSettings) -> Self {
        Self {
            input_file,
            timestamp: chrono::Utc::now().to_rfc3339(),
            settings: settings.clone(),
            summary: ReportSummary::default(),
            instances: Vec::new(),
        }
    }

    /// Append an instance and update the totals
    pub fn add_instance(&mut self, report: &InstanceReport) {
        self.summary.num_instances += 1;
        if report.is_failed() {
            self.summary.num_failed += 1;
        }
        self.summary.num_records += report.records.len();
        self.summary.num_diagnostics += report.diagnostics.len();

        self.instances.push(InstanceEntry {
            name: report.name.clone(),
            case_id: report.case_id.clone(),
            category: report.category,
            area: report.area,
            effective_pressure: report.effective_pressure,
            edge_weights: report.weights.clone(),
            total_force: report.total_force().to_array(),
            records: report.records.iter().map(RecordEntry::from).collect(),
            diagnostics: report.diagnostics.clone(),
        });
    }

    /// Export report to JSON file
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer_pretty(file, self).map_err(|e| {
            AreaLoadError::ConfigError(format!("Failed to write JSON report: {}", e))
        })?;
        Ok(())
    }

    /// Read a previously exported report
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&content).map_err(|e| {
            AreaLoadError::ConfigError(format!("Failed to parse JSON report: {}", e))
        })
    }
}
