use crate::collectors::CpuTicks;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTickState {
    pub previous_total_ticks: u64,
    pub previous_idle_ticks: u64,
    pub initialized: bool,
}

impl CpuTickState {
    pub fn is_bootstrap(&self) -> bool {
        !self.initialized
    }
}

pub fn sample_cpu_usage(state: &mut CpuTickState, ticks: CpuTicks) -> f64 {
    let usage = if state.initialized {
        usage_between(
            state.previous_total_ticks,
            state.previous_idle_ticks,
            ticks,
        )
    } else {
        0.0
    };

    state.previous_total_ticks = ticks.total;
    state.previous_idle_ticks = ticks.idle;
    state.initialized = true;
    usage
}

fn usage_between(previous_total: u64, previous_idle: u64, ticks: CpuTicks) -> f64 {
    // A total that went backwards means the counters were reset.
    let Some(total_diff) = ticks.total.checked_sub(previous_total) else {
        return 0.0;
    };
    if total_diff == 0 {
        return 0.0;
    }
    let idle_diff = ticks.idle.saturating_sub(previous_idle);
    let usage = 100.0 * (1.0 - idle_diff as f64 / total_diff as f64);
    usage.clamp(0.0, 100.0)
}
