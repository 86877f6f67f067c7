use crate::collectors::{CounterSource, MemoryAndLoad};
use crate::sampler::{sample_cpu_usage, CpuTickState};
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSnapshot {
    #[serde(serialize_with = "serialize_rfc3339")]
    pub sampled_at: SystemTime,
    pub uptime_seconds: Option<u64>,
    pub load_avg: Option<[f64; 3]>,
    pub total_ram_bytes: Option<u64>,
    pub free_ram_bytes: Option<u64>,
    pub total_swap_bytes: Option<u64>,
    pub free_swap_bytes: Option<u64>,
    pub cpu_usage_percent: Option<f64>,
    pub disk_path: PathBuf,
    pub disk_usage_percent: Option<f64>,
}

impl SystemSnapshot {
    pub fn unavailable(sampled_at: SystemTime, disk_path: impl Into<PathBuf>) -> Self {
        Self {
            sampled_at,
            uptime_seconds: None,
            load_avg: None,
            total_ram_bytes: None,
            free_ram_bytes: None,
            total_swap_bytes: None,
            free_swap_bytes: None,
            cpu_usage_percent: None,
            disk_path: disk_path.into(),
            disk_usage_percent: None,
        }
    }

    fn apply_memory(&mut self, mem: MemoryAndLoad) {
        self.uptime_seconds = Some(mem.uptime_seconds);
        self.load_avg = Some(mem.load_avg);
        self.total_ram_bytes = Some(mem.total_ram_bytes);
        self.free_ram_bytes = Some(mem.free_ram_bytes);
        self.total_swap_bytes = Some(mem.total_swap_bytes);
        self.free_swap_bytes = Some(mem.free_swap_bytes);
    }

    pub fn ram_used_bytes(&self) -> Option<u64> {
        Some(self.total_ram_bytes?.saturating_sub(self.free_ram_bytes?))
    }

    pub fn ram_usage_percent(&self) -> Option<f64> {
        usage_percent(self.total_ram_bytes?, self.free_ram_bytes?)
    }

    pub fn swap_usage_percent(&self) -> Option<f64> {
        usage_percent(self.total_swap_bytes?, self.free_swap_bytes?)
    }
}

fn usage_percent(total: u64, free: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(((1.0 - free as f64 / total as f64) * 100.0).clamp(0.0, 100.0))
}

fn serialize_rfc3339<S: Serializer>(at: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&humantime::format_rfc3339_seconds(*at))
}

pub fn assemble_snapshot<S: CounterSource + ?Sized>(
    source: &mut S,
    cpu_state: &mut CpuTickState,
    disk_path: &Path,
    sampled_at: SystemTime,
) -> SystemSnapshot {
    let mut snapshot = SystemSnapshot::unavailable(sampled_at, disk_path);

    match source.read_memory_and_load() {
        Ok(mem) => snapshot.apply_memory(mem),
        Err(err) => debug!(error = %err, "память и нагрузка недоступны в этом такте"),
    }

    match source.read_cpu_ticks() {
        Ok(ticks) => {
            if cpu_state.is_bootstrap() {
                debug!(total = ticks.total, idle = ticks.idle, "записана базовая точка тиков CPU");
            }
            snapshot.cpu_usage_percent = Some(sample_cpu_usage(cpu_state, ticks));
        }
        Err(err) => debug!(error = %err, "тики CPU недоступны в этом такте"),
    }

    match source.read_filesystem_usage(disk_path) {
        Ok(pct) => snapshot.disk_usage_percent = Some(pct),
        Err(err) => debug!(
            error = %err,
            path = %disk_path.display(),
            "заполненность файловой системы недоступна в этом такте"
        ),
    }

    snapshot
}
