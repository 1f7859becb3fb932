use std::sync::Arc;
use std::time::Duration;

use domain::HalEvent;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{info, trace};

use super::HalContext;

/// Outcome of one poll sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    pub good: usize,
    pub bad: usize,
}

impl PollReport {
    /// At least one physical read failed
    pub fn degraded(&self) -> bool {
        self.bad > 0
    }
}

/// Read every tag bound to a readable device, then refresh the health tag.
pub(crate) async fn poll_once(ctx: &HalContext) -> PollReport {
    let mut report = PollReport::default();

    for tag in &ctx.tags {
        let Some(binding) = &tag.binding else {
            continue;
        };
        let Some(device) = ctx.devices.get(&binding.device) else {
            continue;
        };
        if !device.capabilities().readable {
            continue;
        }

        match device.read_channel(binding.read_channel()).await {
            Some(raw) => {
                ctx.store
                    .record_good(&tag.name, tag.scale.apply(f64::from(raw)));
                report.good += 1;
            }
            None => {
                ctx.store.record_bad(&tag.name);
                report.bad += 1;
                ctx.emit(HalEvent::read_failed(&tag.name, device.name()))
                    .await;
            }
        }
    }

    // The aggregate itself is always Good
    if let Some(health) = &ctx.health_tag {
        let flag = if report.degraded() { 1.0 } else { 0.0 };
        ctx.store.record_good(health, flag);
    }

    report
}

pub(crate) async fn run(ctx: Arc<HalContext>, period: Duration, cancel: CancellationToken) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(period_ms = period.as_millis() as u64, "Poll loop started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let report = poll_once(&ctx).await;
                trace!(good = report.good, bad = report.bad, "Poll sweep complete");
            }
        }
    }

    info!("Poll loop stopped");
}
