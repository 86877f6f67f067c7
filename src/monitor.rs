use crate::collectors::system::HostIdentity;
use crate::collectors::CounterSource;
use crate::config::{Config, OutputFormat};
use crate::render::{render_banner, render_dashboard, render_json, CLEAR_SCREEN};
use crate::sampler::CpuTickState;
use crate::snapshot::assemble_snapshot;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::sync::watch;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info};

pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(5);
pub const DISK_PATH: &str = "/";
pub const STARTUP_PAUSE: Duration = Duration::from_secs(2);

pub trait Pacer {
    async fn tick(&mut self);
}

pub struct IntervalPacer {
    interval: Interval,
}

impl IntervalPacer {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }
}

impl Pacer for IntervalPacer {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub disk_path: PathBuf,
    pub output: OutputFormat,
    pub clear_screen: bool,
    pub startup_pause: Duration,
}

impl From<&Config> for MonitorOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            disk_path: PathBuf::from(DISK_PATH),
            output: cfg.output,
            clear_screen: cfg.clear_screen,
            startup_pause: STARTUP_PAUSE,
        }
    }
}

pub async fn run_monitor<S, P, W>(
    source: &mut S,
    pacer: &mut P,
    out: &mut W,
    options: &MonitorOptions,
    host: &HostIdentity,
    mut shutdown: watch::Receiver<bool>,
) -> io::Result<u64>
where
    S: CounterSource + ?Sized,
    P: Pacer,
    W: Write,
{
    let mut cpu_state = CpuTickState::default();
    let mut frames = 0_u64;

    if options.output == OutputFormat::Text {
        out.write_all(render_banner().as_bytes())?;
        out.flush()?;
        if !options.startup_pause.is_zero() {
            tokio::time::sleep(options.startup_pause).await;
        }
    }

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!(frames, "получен сигнал остановки цикла сбора");
                break;
            }
            _ = pacer.tick() => {
                let snapshot = assemble_snapshot(
                    source,
                    &mut cpu_state,
                    &options.disk_path,
                    SystemTime::now(),
                );
                let frame = match options.output {
                    OutputFormat::Text => {
                        let body = render_dashboard(&snapshot, host);
                        if options.clear_screen {
                            format!("{CLEAR_SCREEN}{body}")
                        } else {
                            body
                        }
                    }
                    OutputFormat::Json => {
                        let mut line = render_json(&snapshot, host).map_err(io::Error::from)?;
                        line.push('\n');
                        line
                    }
                };
                out.write_all(frame.as_bytes())?;
                out.flush()?;
                frames += 1;
                debug!(
                    frames,
                    cpu_usage_percent = ?snapshot.cpu_usage_percent,
                    disk_usage_percent = ?snapshot.disk_usage_percent,
                    "кадр записан"
                );
            }
        }
    }

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::CpuTicks;
    use crate::snapshot::tests::FakeSource;

    // Yields `remaining` ticks, then raises shutdown and never ticks again.
    struct StepPacer {
        remaining: usize,
        stop: watch::Sender<bool>,
    }

    impl Pacer for StepPacer {
        async fn tick(&mut self) {
            if self.remaining == 0 {
                let _ = self.stop.send(true);
                std::future::pending::<()>().await;
            }
            self.remaining -= 1;
        }
    }

    fn options(output: OutputFormat) -> MonitorOptions {
        MonitorOptions {
            disk_path: PathBuf::from("/"),
            output,
            clear_screen: false,
            startup_pause: Duration::ZERO,
        }
    }

    #[test]
    fn options_use_the_fixed_interval_and_disk_path() {
        let cfg = Config {
            output: OutputFormat::Json,
            clear_screen: false,
        };
        let opts = MonitorOptions::from(&cfg);
        assert_eq!(opts.disk_path, PathBuf::from("/"));
        assert_eq!(opts.output, OutputFormat::Json);
        assert!(!opts.clear_screen);
        assert_eq!(opts.startup_pause, Duration::from_secs(2));
        assert_eq!(SAMPLE_INTERVAL, Duration::from_secs(5));
    }

    fn stepping(ticks: usize) -> (StepPacer, watch::Receiver<bool>) {
        let (stop, rx) = watch::channel(false);
        (
            StepPacer {
                remaining: ticks,
                stop,
            },
            rx,
        )
    }

    fn advancing_ticks(n: u64) -> Vec<CpuTicks> {
        (0..n)
            .map(|i| CpuTicks {
                total: 100 * (i + 1),
                idle: 50 * (i + 1),
            })
            .collect()
    }

    #[tokio::test]
    async fn simulates_many_ticks_without_sleeping() {
        let mut source = FakeSource::healthy(advancing_ticks(100));
        let (mut pacer, rx) = stepping(100);
        let mut out = Vec::new();

        let frames = run_monitor(
            &mut source,
            &mut pacer,
            &mut out,
            &options(OutputFormat::Json),
            &HostIdentity::default(),
            rx,
        )
        .await
        .expect("запись в буфер не падает");

        assert_eq!(frames, 100);
        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .expect("utf-8")
            .lines()
            .map(|l| serde_json::from_str(l).expect("каждая строка это JSON"))
            .collect();
        assert_eq!(lines.len(), 100);
        assert_eq!(lines[0]["cpu_usage_percent"], 0.0);
        assert!(lines[1..].iter().all(|v| v["cpu_usage_percent"] == 50.0));
    }

    #[tokio::test]
    async fn loop_survives_ticks_with_unavailable_sources() {
        let mut source = FakeSource::healthy([]);
        source.memory = None;
        source.disk = None;
        let (mut pacer, rx) = stepping(5);
        let mut out = Vec::new();

        let frames = run_monitor(
            &mut source,
            &mut pacer,
            &mut out,
            &options(OutputFormat::Text),
            &HostIdentity::default(),
            rx,
        )
        .await
        .expect("цикл не должен падать");

        assert_eq!(frames, 5);
        let text = String::from_utf8(out).expect("utf-8");
        assert!(text.starts_with("Starting System Monitor..."));
        assert_eq!(text.matches("CPU Usage: n/a").count(), 5);
        assert_eq!(source.disk_reads.len(), 5);
    }

    #[tokio::test]
    async fn clear_screen_prefixes_each_frame() {
        let mut source = FakeSource::healthy(advancing_ticks(3));
        let (mut pacer, rx) = stepping(3);
        let mut out = Vec::new();
        let mut opts = options(OutputFormat::Text);
        opts.clear_screen = true;

        run_monitor(
            &mut source,
            &mut pacer,
            &mut out,
            &opts,
            &HostIdentity::default(),
            rx,
        )
        .await
        .expect("запись в буфер не падает");

        let text = String::from_utf8(out).expect("utf-8");
        assert_eq!(text.matches(CLEAR_SCREEN).count(), 3);
    }

    #[tokio::test]
    async fn dropped_shutdown_sender_stops_the_loop() {
        let mut source = FakeSource::healthy([]);
        let (stop, rx) = watch::channel(false);
        drop(stop);
        let mut pacer = IntervalPacer::new(Duration::from_secs(3600));
        let mut out = Vec::new();

        let frames = run_monitor(
            &mut source,
            &mut pacer,
            &mut out,
            &options(OutputFormat::Json),
            &HostIdentity::default(),
            rx,
        )
        .await
        .expect("остановка без ошибок");

        assert!(frames <= 1);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "закрыт"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn output_failure_ends_the_loop_with_an_error() {
        let mut source = FakeSource::healthy(advancing_ticks(1));
        let (mut pacer, rx) = stepping(10);

        let err = run_monitor(
            &mut source,
            &mut pacer,
            &mut BrokenPipe,
            &options(OutputFormat::Json),
            &HostIdentity::default(),
            rx,
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
