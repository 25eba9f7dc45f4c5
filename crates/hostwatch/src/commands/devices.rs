//! Device command handlers.

use tabled::Tabled;

use hostwatch_core::{DeviceRecord, DeviceStatus, DeviceUpdate, Monitor, NewDevice};

use crate::cli::{DeviceMeta, DevicesArgs, DevicesCommand, GlobalOpts, StatusFilter};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(super) struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Type")]
    dtype: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl DeviceRow {
    pub(super) fn new(d: &DeviceRecord, color: bool) -> Self {
        Self {
            name: d.name.clone(),
            ip: d.ip.clone(),
            site: d.site.clone().unwrap_or_default(),
            location: d.location.clone().unwrap_or_default(),
            dtype: d.device_type.clone().unwrap_or_default(),
            status: output::paint_status(d.status, color),
        }
    }
}

pub(super) fn detail(d: &DeviceRecord, color: bool) -> String {
    [
        format!("Name:     {}", d.name),
        format!("IP:       {}", d.ip),
        format!("Site:     {}", util::or_dash(d.site.as_deref())),
        format!("Location: {}", util::or_dash(d.location.as_deref())),
        format!("Type:     {}", util::or_dash(d.device_type.as_deref())),
        format!("Status:   {}", output::paint_status(d.status, color)),
    ]
    .join("\n")
}

/// Render a device list in the selected format and print it.
pub(super) fn print_devices(
    devices: &[DeviceRecord],
    settings: &Settings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(settings.color);
    let out = output::render_list(
        settings.output,
        devices,
        |d| DeviceRow::new(d, color),
        |d| d.ip.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub(super) fn print_device(
    device: &DeviceRecord,
    settings: &Settings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(settings.color);
    let out = output::render_single(
        settings.output,
        device,
        |d| detail(d, color),
        |d| d.ip.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn matches(status: DeviceStatus, filter: StatusFilter) -> bool {
    matches!(
        (status, filter),
        (DeviceStatus::Pending, StatusFilter::Pending)
            | (DeviceStatus::Connected, StatusFilter::Connected)
            | (DeviceStatus::Disconnected, StatusFilter::Disconnected)
    )
}

fn new_device(name: String, ip: String, meta: DeviceMeta) -> NewDevice {
    NewDevice {
        name,
        ip,
        site: meta.site,
        location: meta.location,
        device_type: meta.device_type,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(
    monitor: &Monitor,
    args: DevicesArgs,
    settings: &Settings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List { status } => {
            let mut devices = monitor.list_active();
            if let Some(filter) = status {
                devices.retain(|d| matches(d.status, filter));
            }
            print_devices(&devices, settings, global)
        }

        DevicesCommand::Get { ip } => {
            let device = monitor.get(&ip)?;
            print_device(&device, settings, global)
        }

        DevicesCommand::Add { name, ip, meta } => {
            let device = monitor.add(new_device(name, ip, meta))?;
            output::print_note(
                &format!("Added {} ({})", device.name, device.ip),
                global.quiet,
            );
            print_device(&device, settings, global)
        }

        DevicesCommand::Edit {
            ip,
            name,
            meta,
            clear_site,
            clear_location,
            clear_type,
        } => {
            let current = monitor.get(&ip)?;
            let mut update = DeviceUpdate::from_record(&current);
            if let Some(name) = name {
                update.name = name;
            }
            if meta.site.is_some() || clear_site {
                update.site = meta.site;
            }
            if meta.location.is_some() || clear_location {
                update.location = meta.location;
            }
            if meta.device_type.is_some() || clear_type {
                update.device_type = meta.device_type;
            }

            let device = monitor.edit(&ip, update)?;
            output::print_note(&format!("Updated {}", device.ip), global.quiet);
            print_device(&device, settings, global)
        }

        DevicesCommand::Delete { ip } => {
            let device = monitor.soft_delete(&ip)?;
            output::print_note(
                &format!(
                    "Moved {} ({}) to the trash. Undo with: hostwatch trash restore {}",
                    device.name, device.ip, device.ip
                ),
                global.quiet,
            );
            Ok(())
        }
    }
}
