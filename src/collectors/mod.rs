#[cfg(target_os = "linux")]
pub mod procfs;
pub mod system;

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryAndLoad {
    pub uptime_seconds: u64,
    pub load_avg: [f64; 3],
    pub total_ram_bytes: u64,
    pub free_ram_bytes: u64,
    pub total_swap_bytes: u64,
    pub free_swap_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTicks {
    pub total: u64,
    pub idle: u64,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("источник {source_name} недоступен: {source}")]
    Io {
        source_name: String,
        source: std::io::Error,
    },
    #[error("неожиданный формат данных в {source_name}: {detail}")]
    Malformed { source_name: String, detail: String },
    #[error("{0} не поддерживается на этой платформе")]
    Unsupported(&'static str),
}

pub trait CounterSource {
    fn read_memory_and_load(&mut self) -> Result<MemoryAndLoad, SourceError>;
    fn read_cpu_ticks(&mut self) -> Result<CpuTicks, SourceError>;
    fn read_filesystem_usage(&mut self, path: &Path) -> Result<f64, SourceError>;
}

pub fn parse_cpu_ticks(source_name: &str, text: &str) -> Result<CpuTicks, SourceError> {
    let malformed = |detail: &str| SourceError::Malformed {
        source_name: source_name.to_string(),
        detail: detail.to_string(),
    };

    let line = text.lines().next().ok_or_else(|| malformed("пустой файл"))?;
    let mut fields = line.split_whitespace();
    if fields.next() != Some("cpu") {
        return Err(malformed("первая строка не начинается с метки cpu"));
    }

    // user nice system idle iowait irq softirq
    let mut values = [0_u64; 7];
    for slot in values.iter_mut() {
        let raw = fields
            .next()
            .ok_or_else(|| malformed("в строке cpu меньше семи счётчиков"))?;
        *slot = raw
            .parse()
            .map_err(|_| malformed(&format!("некорректный счётчик '{raw}'")))?;
    }

    let [user, nice, system, idle, iowait, irq, softirq] = values;
    let idle_all = idle.saturating_add(iowait);
    let total = [user, nice, system, irq, softirq]
        .iter()
        .fold(idle_all, |acc, v| acc.saturating_add(*v));

    Ok(CpuTicks {
        total,
        idle: idle_all,
    })
}

pub fn filesystem_usage_percent(total_blocks: u64, free_blocks: u64) -> Option<f64> {
    if total_blocks == 0 {
        return None;
    }
    let used = total_blocks.saturating_sub(free_blocks);
    Some((used as f64 / total_blocks as f64 * 100.0).clamp(0.0, 100.0))
}

pub fn default_source() -> Box<dyn CounterSource> {
    #[cfg(target_os = "linux")]
    {
        if Path::new("/proc/stat").exists() {
            return Box::new(procfs::ProcfsSource::new());
        }
        tracing::warn!("/proc/stat не найден, используется переносимый источник sysinfo");
    }
    Box::new(system::SysinfoSource::new())
}
