use crate::collectors::{CounterSource, CpuTicks, MemoryAndLoad, SourceError};
use std::path::Path;
use sysinfo::{DiskExt, System, SystemExt};

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct HostIdentity {
    pub host_name: Option<String>,
    pub os_name: Option<String>,
    pub kernel_version: Option<String>,
}

pub fn host_identity() -> HostIdentity {
    let system = System::new();
    HostIdentity {
        host_name: system.host_name(),
        os_name: system.long_os_version().or_else(|| system.name()),
        kernel_version: system.kernel_version(),
    }
}

pub struct SysinfoSource {
    system: System,
}

impl SysinfoSource {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for SysinfoSource {
    fn read_memory_and_load(&mut self) -> Result<MemoryAndLoad, SourceError> {
        self.system.refresh_memory();
        let total_ram_bytes = self.system.total_memory();
        if total_ram_bytes == 0 {
            return Err(SourceError::Malformed {
                source_name: "sysinfo".to_string(),
                detail: "объём памяти равен нулю".to_string(),
            });
        }
        let load = self.system.load_average();

        Ok(MemoryAndLoad {
            uptime_seconds: self.system.uptime(),
            load_avg: [load.one, load.five, load.fifteen],
            total_ram_bytes,
            free_ram_bytes: self.system.free_memory().min(total_ram_bytes),
            total_swap_bytes: self.system.total_swap(),
            free_swap_bytes: self.system.free_swap().min(self.system.total_swap()),
        })
    }

    fn read_cpu_ticks(&mut self) -> Result<CpuTicks, SourceError> {
        Err(SourceError::Unsupported("чтение счётчиков тиков CPU"))
    }

    fn read_filesystem_usage(&mut self, path: &Path) -> Result<f64, SourceError> {
        self.system.refresh_disks_list();
        let disk = self
            .system
            .disks()
            .iter()
            .filter(|d| path.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len())
            .ok_or_else(|| SourceError::Malformed {
                source_name: "sysinfo".to_string(),
                detail: format!("не найден диск для пути {}", path.display()),
            })?;

        let total = disk.total_space();
        let available = disk.available_space();
        crate::collectors::filesystem_usage_percent(total, available).ok_or_else(|| {
            SourceError::Malformed {
                source_name: "sysinfo".to_string(),
                detail: format!("диск {} сообщает нулевой объём", disk.mount_point().display()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_counters_are_consistent() {
        let mut source = SysinfoSource::new();
        let mem = source.read_memory_and_load().expect("память должна читаться");
        assert!(mem.total_ram_bytes > 0);
        assert!(mem.free_ram_bytes <= mem.total_ram_bytes);
        assert!(mem.free_swap_bytes <= mem.total_swap_bytes);
    }

    #[test]
    fn cpu_ticks_are_unsupported() {
        let mut source = SysinfoSource::new();
        assert!(matches!(
            source.read_cpu_ticks(),
            Err(SourceError::Unsupported(_))
        ));
    }

    #[test]
    fn host_identity_does_not_panic() {
        let _ = host_identity();
    }
}
