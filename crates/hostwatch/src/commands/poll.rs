//! One-shot poll.

use hostwatch_core::{DeviceRecord, Monitor};

use crate::cli::GlobalOpts;
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::{devices, util};

pub async fn handle(
    monitor: &Monitor,
    settings: &Settings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let total = monitor.list_active().len();
    let bar = util::spinner(&format!("Probing {total} device(s)"), global.quiet);
    let polled = monitor.poll_now().await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let polled = polled?;

    devices::print_devices(&polled, settings, global)?;
    output::print_note(&summary(&polled), global.quiet);
    Ok(())
}

fn summary(devices: &[DeviceRecord]) -> String {
    let up = devices.iter().filter(|d| d.status.is_connected()).count();
    format!(
        "{} device(s): {up} connected, {} disconnected",
        devices.len(),
        devices.len() - up
    )
}

#[cfg(test)]
mod tests {
    use hostwatch_core::DeviceStatus;

    use super::*;

    #[test]
    fn summary_counts_connected() {
        let up = DeviceRecord {
            name: "a".into(),
            ip: "10.0.0.1".into(),
            site: None,
            location: None,
            device_type: None,
            status: DeviceStatus::Connected,
        };
        let down = up.with_status(DeviceStatus::Disconnected);

        assert_eq!(
            summary(&[up, down.clone(), down]),
            "3 device(s): 1 connected, 2 disconnected"
        );
    }
}
