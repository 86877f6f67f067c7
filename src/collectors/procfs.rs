use crate::collectors::{
    filesystem_usage_percent, parse_cpu_ticks, CounterSource, CpuTicks, MemoryAndLoad,
    SourceError,
};
use nix::sys::statvfs::statvfs;
use nix::sys::sysinfo::sysinfo;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ProcfsSource {
    stat_path: PathBuf,
}

impl ProcfsSource {
    pub fn new() -> Self {
        Self::with_stat_path("/proc/stat")
    }

    pub fn with_stat_path(path: impl Into<PathBuf>) -> Self {
        Self {
            stat_path: path.into(),
        }
    }
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new()
    }
}

// Values as sysinfo(2) reports them once nix has applied mem_unit and the
// fixed-point load shift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelMemory {
    pub uptime: Duration,
    pub load_average: (f64, f64, f64),
    pub ram_total: u64,
    pub ram_unused: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

pub fn memory_and_load(kernel: KernelMemory) -> MemoryAndLoad {
    let (one, five, fifteen) = kernel.load_average;
    MemoryAndLoad {
        uptime_seconds: kernel.uptime.as_secs(),
        load_avg: [one, five, fifteen],
        total_ram_bytes: kernel.ram_total,
        free_ram_bytes: kernel.ram_unused.min(kernel.ram_total),
        total_swap_bytes: kernel.swap_total,
        free_swap_bytes: kernel.swap_free.min(kernel.swap_total),
    }
}

impl CounterSource for ProcfsSource {
    fn read_memory_and_load(&mut self) -> Result<MemoryAndLoad, SourceError> {
        let info = sysinfo().map_err(|errno| SourceError::Io {
            source_name: "sysinfo(2)".to_string(),
            source: errno.into(),
        })?;

        Ok(memory_and_load(KernelMemory {
            uptime: info.uptime(),
            load_average: info.load_average(),
            ram_total: info.ram_total(),
            ram_unused: info.ram_unused(),
            swap_total: info.swap_total(),
            swap_free: info.swap_free(),
        }))
    }

    fn read_cpu_ticks(&mut self) -> Result<CpuTicks, SourceError> {
        let source_name = self.stat_path.display().to_string();
        let text = fs::read_to_string(&self.stat_path).map_err(|source| SourceError::Io {
            source_name: source_name.clone(),
            source,
        })?;
        parse_cpu_ticks(&source_name, &text)
    }

    fn read_filesystem_usage(&mut self, path: &Path) -> Result<f64, SourceError> {
        let source_name = format!("statvfs({})", path.display());
        let stats = statvfs(path).map_err(|errno| SourceError::Io {
            source_name: source_name.clone(),
            source: errno.into(),
        })?;

        filesystem_usage_percent(stats.blocks() as u64, stats.blocks_free() as u64).ok_or(
            SourceError::Malformed {
                source_name,
                detail: "файловая система сообщает 0 блоков".to_string(),
            },
        )
    }
}
