//! Status Tool
//!
//! Provides runtime status information about the nutrition service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::nutrition::{EngineSettings, NutritionEngine};

/// Runtime status of the service
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Reference data
    pub reference_path: String,
    pub reference_records: usize,
    pub unit_count: usize,
    pub settings: EngineSettings,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    reference_path: PathBuf,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(reference_path: PathBuf, database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            reference_path,
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, engine: &NutritionEngine) -> ServiceStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        ServiceStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            reference_path: self.reference_path.display().to_string(),
            reference_records: engine.reference().len(),
            unit_count: engine.units().len(),
            settings: *engine.settings(),
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
