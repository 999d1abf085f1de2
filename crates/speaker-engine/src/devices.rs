use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait};

#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub is_default: bool,
    /// Default output config, if the device reports one.
    pub channels: Option<u16>,
    pub sample_rate: Option<u32>,
}

/// Output devices in the order `--device-index` refers to them.
pub fn list_devices() -> Result<Vec<DeviceInfo>> {
    let host = cpal::default_host();
    let default_out = host.default_output_device().map(|d| d.name().unwrap_or_default());

    let mut out = Vec::new();
    for dev in host.output_devices().context("Failed to enumerate output devices")? {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        let is_default = default_out.as_ref().map(|n| n == &name).unwrap_or(false);
        let cfg = dev.default_output_config().ok();
        out.push(DeviceInfo {
            name,
            is_default,
            channels: cfg.as_ref().map(|c| c.channels()),
            sample_rate: cfg.as_ref().map(|c| c.sample_rate().0),
        });
    }
    Ok(out)
}

/// Pretty-print for CLI
pub fn print_devices() -> Result<()> {
    let list = list_devices()?;
    if list.is_empty() {
        println!("(no output devices found)");
        return Ok(());
    }
    for (i, d) in list.iter().enumerate() {
        let mark = if d.is_default { "*" } else { " " };
        match (d.channels, d.sample_rate) {
            (Some(ch), Some(sr)) => println!("{mark}{i:>2}  {}  ({ch} ch, {sr} Hz)", d.name),
            _ => println!("{mark}{i:>2}  {}", d.name),
        }
    }
    Ok(())
}
