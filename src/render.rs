use crate::collectors::system::HostIdentity;
use crate::snapshot::SystemSnapshot;
use serde::Serialize;
use std::fmt::Write as _;

const INNER_WIDTH: usize = 52;
const TITLE: &str = "EMBEDDED LINUX SYSTEM MONITOR";
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
pub const UNAVAILABLE: &str = "n/a";

pub fn render_banner() -> String {
    "Starting System Monitor...\nPress Ctrl+C to exit\n".to_string()
}

pub fn render_dashboard(snapshot: &SystemSnapshot, host: &HostIdentity) -> String {
    let mut out = String::new();
    let rule = "═".repeat(INNER_WIDTH);

    let _ = writeln!(out, "╔{rule}╗");
    let _ = writeln!(out, "║{TITLE:^INNER_WIDTH$}║");
    let _ = writeln!(out, "╠{rule}╣");
    for line in dashboard_lines(snapshot, host) {
        let _ = writeln!(out, "║{}║", fit_line(&line));
    }
    let _ = writeln!(out, "╚{rule}╝");
    out
}

fn dashboard_lines(snapshot: &SystemSnapshot, host: &HostIdentity) -> Vec<String> {
    let mut lines = Vec::with_capacity(8);

    lines.push(format!("Host: {}", host_line(host)));

    lines.push(match snapshot.uptime_seconds {
        Some(secs) => {
            let (hours, minutes) = uptime_hours_minutes(secs);
            format!("Uptime: {hours} hours, {minutes} minutes")
        }
        None => format!("Uptime: {UNAVAILABLE}"),
    });

    lines.push(match snapshot.load_avg {
        Some([one, five, fifteen]) => format!("Load Average: {one:.2}, {five:.2}, {fifteen:.2}"),
        None => format!("Load Average: {UNAVAILABLE}"),
    });

    lines.push(format!("CPU Usage: {}", percent(snapshot.cpu_usage_percent)));

    lines.push(
        match (
            snapshot.ram_usage_percent(),
            snapshot.ram_used_bytes(),
            snapshot.total_ram_bytes,
        ) {
            (Some(pct), Some(used), Some(total)) => format!(
                "RAM: {pct:.1}% ({:.1} MB / {:.1} MB)",
                to_mb(used),
                to_mb(total)
            ),
            _ => format!("RAM: {UNAVAILABLE}"),
        },
    );

    lines.push(match (snapshot.total_swap_bytes, snapshot.free_swap_bytes) {
        (Some(0), _) => "Swap: none".to_string(),
        (Some(total), Some(free)) => format!(
            "Swap: {} ({:.1} MB / {:.1} MB)",
            percent(snapshot.swap_usage_percent()),
            to_mb(total.saturating_sub(free)),
            to_mb(total)
        ),
        _ => format!("Swap: {UNAVAILABLE}"),
    });

    lines.push(format!(
        "Disk Usage ({}): {}",
        snapshot.disk_path.display(),
        percent(snapshot.disk_usage_percent)
    ));

    lines.push(format!(
        "Updated: {}",
        humantime::format_rfc3339_seconds(snapshot.sampled_at)
    ));

    lines
}

fn host_line(host: &HostIdentity) -> String {
    let name = host.host_name.as_deref().unwrap_or("unknown");
    match (&host.os_name, &host.kernel_version) {
        (Some(os), Some(kernel)) => format!("{name} ({os}, kernel {kernel})"),
        (Some(os), None) => format!("{name} ({os})"),
        (None, Some(kernel)) => format!("{name} (kernel {kernel})"),
        (None, None) => name.to_string(),
    }
}

fn fit_line(content: &str) -> String {
    let body: String = content.chars().take(INNER_WIDTH - 1).collect();
    let width = INNER_WIDTH - 1;
    format!(" {body:<width$}")
}

fn percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}%"),
        None => UNAVAILABLE.to_string(),
    }
}

fn to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

pub fn uptime_hours_minutes(secs: u64) -> (u64, u64) {
    (secs / 3600, (secs % 3600) / 60)
}

#[derive(Serialize)]
struct JsonFrame<'a> {
    host: &'a HostIdentity,
    #[serde(flatten)]
    snapshot: &'a SystemSnapshot,
}

pub fn render_json(snapshot: &SystemSnapshot, host: &HostIdentity) -> serde_json::Result<String> {
    serde_json::to_string(&JsonFrame { host, snapshot })
}
