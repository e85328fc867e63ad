//! Audio Device Lookup

use cpal::traits::{DeviceTrait, HostTrait};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Type of audio device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    Input,
    Output,
}

/// Description of an audio device (input or output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Human-readable device name, also used for lookup
    pub name: String,

    pub device_type: DeviceType,

    /// Whether this is the system default device
    pub is_default: bool,

    /// Supported common sample rates (may be empty if querying failed)
    pub sample_rates: Vec<u32>,

    /// Maximum supported channels
    pub max_channels: u16,
}

/// Common sample rates reported in [`AudioDevice::sample_rates`]
const COMMON_RATES: [u32; 6] = [44100, 48000, 88200, 96000, 176400, 192000];

impl AudioDevice {
    /// Enumerate devices of one type on the default host
    pub fn enumerate(device_type: DeviceType) -> EngineResult<Vec<AudioDevice>> {
        let host = cpal::default_host();
        let default_name = default_device(&host, device_type).and_then(|d| d.name().ok());

        let devices: Vec<AudioDevice> = host_devices(&host, device_type)?
            .filter_map(|device| {
                let name = device.name().ok()?;
                let (sample_rates, max_channels) = supported_formats(&device, device_type);
                Some(AudioDevice {
                    is_default: default_name.as_deref() == Some(name.as_str()),
                    name,
                    device_type,
                    sample_rates,
                    max_channels,
                })
            })
            .collect();

        debug!("Found {} {:?} devices", devices.len(), device_type);
        Ok(devices)
    }

    /// Enumerate inputs and outputs together
    pub fn enumerate_all() -> EngineResult<Vec<AudioDevice>> {
        let mut devices = Self::enumerate(DeviceType::Input)?;
        devices.extend(Self::enumerate(DeviceType::Output)?);

        if devices.is_empty() {
            return Err(EngineError::NoDevicesFound);
        }
        Ok(devices)
    }
}

/// Resolve a device by exact name, or the host default when `name` is `None`
pub fn find_device(device_type: DeviceType, name: Option<&str>) -> EngineResult<cpal::Device> {
    let host = cpal::default_host();

    match name {
        None => default_device(&host, device_type).ok_or(EngineError::NoDevicesFound),
        Some(wanted) => host_devices(&host, device_type)?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| EngineError::DeviceNotFound(wanted.to_string())),
    }
}

fn default_device(host: &cpal::Host, device_type: DeviceType) -> Option<cpal::Device> {
    match device_type {
        DeviceType::Input => host.default_input_device(),
        DeviceType::Output => host.default_output_device(),
    }
}

fn host_devices(
    host: &cpal::Host,
    device_type: DeviceType,
) -> EngineResult<Box<dyn Iterator<Item = cpal::Device>>> {
    let devices: Box<dyn Iterator<Item = cpal::Device>> = match device_type {
        DeviceType::Input => Box::new(
            host.input_devices()
                .map_err(|e| EngineError::DeviceNotFound(e.to_string()))?,
        ),
        DeviceType::Output => Box::new(
            host.output_devices()
                .map_err(|e| EngineError::DeviceNotFound(e.to_string()))?,
        ),
    };
    Ok(devices)
}

fn supported_formats(device: &cpal::Device, device_type: DeviceType) -> (Vec<u32>, u16) {
    let ranges: Vec<cpal::SupportedStreamConfigRange> = match device_type {
        DeviceType::Input => device
            .supported_input_configs()
            .map(|c| c.collect())
            .unwrap_or_default(),
        DeviceType::Output => device
            .supported_output_configs()
            .map(|c| c.collect())
            .unwrap_or_default(),
    };
    rates_and_channels(&ranges)
}

/// Common rates covered by any range, plus the widest channel count
fn rates_and_channels(ranges: &[cpal::SupportedStreamConfigRange]) -> (Vec<u32>, u16) {
    let max_channels = ranges.iter().map(|r| r.channels()).max().unwrap_or(2);
    let sample_rates = COMMON_RATES
        .iter()
        .copied()
        .filter(|&rate| {
            ranges
                .iter()
                .any(|r| (r.min_sample_rate().0..=r.max_sample_rate().0).contains(&rate))
        })
        .collect();
    (sample_rates, max_channels)
}
