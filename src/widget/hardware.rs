// SPDX-License-Identifier: MPL-2.0

//! # Hardware Provider
//!
//! The overlay only needs a small slice of what a hardware monitoring
//! library offers: open once, refresh on every tick, walk the device tree
//! and read optional sensor values, close once. [`HardwareProvider`] is that
//! slice; [`SysinfoProvider`] implements it on top of `sysinfo::Components`.
//!
//! ## Device Tree
//!
//! ```text
//! Hardware (kind = Cpu, "coretemp")
//! ├── Sensor (Temperature, "Package id 0", Some(48.0))
//! ├── Sensor (Temperature, "Core 0",       Some(45.0))
//! └── sub_hardware: [...]
//! ```
//!
//! [`walk`] visits the tree depth-first and yields devices lazily.

use std::collections::BTreeMap;

use sysinfo::Components;

use crate::error::SensorError;

// ============================================================================
// Device Tree
// ============================================================================

/// Device class of a hardware node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HardwareKind {
    Cpu,
    Gpu,
    Motherboard,
    Storage,
    Other,
}

/// Measurement class of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Temperature,
    Load,
    Fan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pub kind: SensorKind,
    pub name: String,
    /// `None` when the sensor exists but did not report this refresh
    pub value: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hardware {
    pub kind: HardwareKind,
    pub name: String,
    pub sensors: Vec<Sensor>,
    pub sub_hardware: Vec<Hardware>,
}

impl Hardware {
    pub fn new(kind: HardwareKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            sensors: Vec::new(),
            sub_hardware: Vec::new(),
        }
    }
}

/// Depth-first, pre-order walk over a device forest.
pub fn walk<'a>(roots: &'a [Hardware]) -> impl Iterator<Item = &'a Hardware> + 'a {
    let mut stack: Vec<&'a Hardware> = roots.iter().rev().collect();
    std::iter::from_fn(move || {
        let node = stack.pop()?;
        stack.extend(node.sub_hardware.iter().rev());
        Some(node)
    })
}

// ============================================================================
// Provider Interface
// ============================================================================

/// External hardware monitoring backend.
///
/// Implementations are moved onto the blocking pool for every sample, so
/// they must be `Send`. Calls are never concurrent.
pub trait HardwareProvider: Send + 'static {
    /// Start sensor discovery. Called once before the first refresh.
    fn open(&mut self) -> Result<(), SensorError>;

    /// Re-read every sensor value. May block.
    fn refresh(&mut self) -> Result<(), SensorError>;

    /// Device tree as of the last refresh.
    fn hardware(&self) -> &[Hardware];

    /// Release the backend. Called at most once.
    fn close(&mut self);
}

// ============================================================================
// sysinfo Backend
// ============================================================================

/// Classify a sensor label into a device class.
///
/// Labels come from the Linux hwmon subsystem via sysinfo, prefixed with the
/// chip name:
/// - **Intel CPU**: "coretemp Package id 0", "coretemp Core 0"
/// - **AMD CPU**: "k10temp Tctl", "k10temp Tccd1"
/// - **AMD GPU**: "amdgpu edge", "amdgpu junction"
/// - **NVMe**: "nvme Composite"
pub fn categorize(label: &str) -> HardwareKind {
    let label = label.to_lowercase();
    let any = |patterns: &[&str]| patterns.iter().any(|p| label.contains(p));

    if any(&[
        "cpu", "package", "tctl", "tccd", "tdie", "core", "processor", "k10temp", "zenpower",
    ]) {
        HardwareKind::Cpu
    } else if any(&["gpu", "nvidia", "radeon", "edge", "junction"]) {
        HardwareKind::Gpu
    } else if any(&["nvme", "ssd", "hdd", "drive", "disk"]) {
        HardwareKind::Storage
    } else if any(&["motherboard", "acpi", "pch", "chipset", "ambient"]) {
        HardwareKind::Motherboard
    } else {
        HardwareKind::Other
    }
}

/// Group `(label, celsius)` readings into one device per chip and class.
///
/// The chip is the first word of the label; the remainder names the sensor.
/// Non-finite readings are reported as absent.
pub fn build_tree<'a, I>(readings: I) -> Vec<Hardware>
where
    I: IntoIterator<Item = (&'a str, f32)>,
{
    let mut devices: BTreeMap<(HardwareKind, String), Vec<Sensor>> = BTreeMap::new();

    for (label, celsius) in readings {
        let label = label.trim();
        let (chip, name) = match label.split_once(char::is_whitespace) {
            Some((chip, rest)) => (chip, rest.trim()),
            None => (label, label),
        };

        devices
            .entry((categorize(label), chip.to_string()))
            .or_default()
            .push(Sensor {
                kind: SensorKind::Temperature,
                name: name.to_string(),
                value: celsius.is_finite().then_some(celsius),
            });
    }

    devices
        .into_iter()
        .map(|((kind, chip), sensors)| Hardware {
            kind,
            name: chip,
            sensors,
            sub_hardware: Vec::new(),
        })
        .collect()
}

/// Temperature sensors read through `sysinfo::Components`.
#[derive(Default)]
pub struct SysinfoProvider {
    /// Discovered components, `None` while closed
    components: Option<Components>,
    tree: Vec<Hardware>,
}

impl SysinfoProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HardwareProvider for SysinfoProvider {
    fn open(&mut self) -> Result<(), SensorError> {
        let components = Components::new_with_refreshed_list();
        log::info!("Discovered {} temperature components", components.list().len());
        self.components = Some(components);
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), SensorError> {
        let components = self.components.as_mut().ok_or(SensorError::NotOpen)?;
        components.refresh();

        self.tree = build_tree(
            components
                .list()
                .iter()
                .map(|component| (component.label(), component.temperature())),
        );
        Ok(())
    }

    fn hardware(&self) -> &[Hardware] {
        &self.tree
    }

    fn close(&mut self) {
        self.components = None;
        self.tree.clear();
    }
}
