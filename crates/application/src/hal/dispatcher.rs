use std::sync::Arc;
use std::time::Duration;

use domain::tag::{WriteCommand, WriteMode};
use domain::{DropReason, HalEvent};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::HalContext;

/// What became of one dequeued write command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Applied,
    Failed,
    Dropped(DropReason),
}

/// Route one command to its device and record the outcome like a poll would.
pub(crate) async fn dispatch(ctx: &HalContext, command: WriteCommand) -> DispatchOutcome {
    let WriteCommand { tag: name, value } = command;

    let Some(tag) = ctx.tag(&name) else {
        return dropped(ctx, &name, value, DropReason::UnknownTag).await;
    };
    let Some(binding) = &tag.binding else {
        return dropped(ctx, &name, value, DropReason::Unbound).await;
    };
    let Some(device) = ctx.devices.get(&binding.device) else {
        return dropped(ctx, &name, value, DropReason::Unbound).await;
    };

    let capabilities = device.capabilities();
    let channel = binding.write_channel();
    let reg_scale = tag.write.reg_scale;

    let accepted = if capabilities.writable_voltage {
        match tag.write.mode {
            WriteMode::Voltage => device.write_voltage(channel, value, reg_scale).await,
            WriteMode::Percent => {
                device
                    .write_percent_as_voltage(channel, value, reg_scale)
                    .await
            }
        }
    } else if capabilities.writable_percent {
        device.write_percent(value).await
    } else {
        return dropped(ctx, &name, value, DropReason::NotWritable).await;
    };

    if accepted {
        ctx.store.record_good(&name, value);
        DispatchOutcome::Applied
    } else {
        ctx.store.record_bad(&name);
        ctx.emit(HalEvent::write_failed(&name, device.name(), value))
            .await;
        DispatchOutcome::Failed
    }
}

async fn dropped(ctx: &HalContext, tag: &str, value: f64, reason: DropReason) -> DispatchOutcome {
    warn!(tag = %tag, value, reason = reason.as_str(), "Dropping write");
    ctx.emit(HalEvent::write_dropped(tag, value, reason)).await;
    DispatchOutcome::Dropped(reason)
}

pub(crate) async fn run(
    ctx: Arc<HalContext>,
    mut commands: mpsc::UnboundedReceiver<WriteCommand>,
    wait: Duration,
    cancel: CancellationToken,
) {
    info!(wait_ms = wait.as_millis() as u64, "Write dispatch loop started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            received = timeout(wait, commands.recv()) => match received {
                Ok(Some(command)) => {
                    let tag = command.tag.clone();
                    let outcome = dispatch(&ctx, command).await;
                    debug!(tag = %tag, ?outcome, "Write dispatched");
                }
                // Every sender is gone
                Ok(None) => break,
                Err(_) => continue,
            }
        }
    }

    info!("Write dispatch loop stopped");
}
