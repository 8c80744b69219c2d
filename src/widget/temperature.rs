// SPDX-License-Identifier: MPL-2.0

//! # Temperature Aggregation Module
//!
//! Reduces every CPU temperature sensor reported by a [`HardwareProvider`]
//! to a single average, once per sampling tick.
//!
//! ## Rules
//!
//! - Only `Temperature` sensors of `Cpu` devices count, including CPU
//!   devices nested as sub-hardware.
//! - Sensors without a value this refresh are skipped, they do not pull the
//!   average towards zero.
//! - No reporting sensors yields an average of 0, never NaN.
//!
//! ## Example
//!
//! ```text
//! coretemp: [40.0, 44.0, --]  ->  42°C
//! (nothing)                   ->  0°C
//! ```

use crate::error::SensorError;

use super::hardware::{walk, Hardware, HardwareKind, HardwareProvider, SensorKind};

// ============================================================================
// Aggregate Reading
// ============================================================================

/// One sampling tick's result. Replaced, never edited, by the next tick.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReading {
    /// Mean in Celsius, `None` when no sensor reported
    value: Option<f32>,
    /// Number of sensors that contributed
    sample_count: usize,
    text: String,
}

impl AggregateReading {
    /// Average a set of readings.
    pub fn from_values<I: IntoIterator<Item = f32>>(values: I) -> Self {
        let (total, count) = values
            .into_iter()
            .fold((0.0f32, 0usize), |(total, count), v| (total + v, count + 1));

        // An empty set divides by one so the overlay always has a number to show
        let average = total / count.max(1) as f32;

        Self {
            value: (count > 0).then_some(average),
            sample_count: count,
            text: format_celsius(average),
        }
    }

    /// The zero reading shown before the first sample.
    pub fn zero() -> Self {
        Self::from_values(std::iter::empty())
    }

    #[cfg(test)]
    pub fn value(&self) -> Option<f32> {
        self.value
    }

    /// Mean in Celsius, 0 when no sensor reported.
    pub fn average(&self) -> f32 {
        self.value.unwrap_or(0.0)
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Render a temperature at full `f32` precision: `42°C`, `41.666668°C`.
pub fn format_celsius(celsius: f32) -> String {
    // Adding 0.0 folds -0.0 into 0.0
    format!("{}°C", celsius + 0.0)
}

/// Present values of every CPU temperature sensor in a device forest.
pub fn cpu_temperatures(roots: &[Hardware]) -> impl Iterator<Item = f32> + '_ {
    walk(roots)
        .filter(|hardware| hardware.kind == HardwareKind::Cpu)
        .flat_map(|hardware| hardware.sensors.iter())
        .filter(|sensor| sensor.kind == SensorKind::Temperature)
        .filter_map(|sensor| sensor.value)
}

// ============================================================================
// Sensor Aggregator
// ============================================================================

/// Owns a hardware provider and samples it on demand.
///
/// The provider is opened on construction and closed exactly once, either
/// by [`SensorAggregator::close`] or when the aggregator is dropped.
pub struct SensorAggregator<P: HardwareProvider> {
    provider: P,
    open: bool,
}

impl<P: HardwareProvider> SensorAggregator<P> {
    /// Open the provider. A failure is logged and every later sample fails
    /// until the overlay is restarted.
    pub fn open(mut provider: P) -> Self {
        let open = match provider.open() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Hardware provider unavailable, temperature stays at 0: {}", e);
                false
            }
        };

        Self { provider, open }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Refresh the provider and average the CPU temperatures.
    ///
    /// Blocks for as long as the provider's refresh does.
    pub fn sample_once(&mut self) -> Result<AggregateReading, SensorError> {
        if !self.open {
            return Err(SensorError::NotOpen);
        }

        self.provider.refresh()?;
        let reading = AggregateReading::from_values(cpu_temperatures(self.provider.hardware()));
        log::debug!(
            "Sampled {} CPU temperature sensors: {}",
            reading.sample_count(),
            reading.text()
        );
        Ok(reading)
    }

    pub fn close(&mut self) {
        if self.open {
            self.open = false;
            self.provider.close();
            log::info!("Hardware provider closed");
        }
    }
}

impl<P: HardwareProvider> Drop for SensorAggregator<P> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::widget::hardware::Sensor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sensor(kind: SensorKind, value: Option<f32>) -> Sensor {
        Sensor {
            kind,
            name: String::from("sensor"),
            value,
        }
    }

    fn cpu(values: &[Option<f32>]) -> Hardware {
        let mut hardware = Hardware::new(HardwareKind::Cpu, "cpu");
        hardware.sensors = values
            .iter()
            .map(|v| sensor(SensorKind::Temperature, *v))
            .collect();
        hardware
    }

    /// Provider returning a fixed tree and counting lifecycle calls.
    pub(crate) struct StaticProvider {
        pub tree: Vec<Hardware>,
        pub fail_open: bool,
        pub fail_refresh: bool,
        pub closes: Arc<AtomicUsize>,
    }

    impl StaticProvider {
        pub(crate) fn new(tree: Vec<Hardware>) -> Self {
            Self {
                tree,
                fail_open: false,
                fail_refresh: false,
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl HardwareProvider for StaticProvider {
        fn open(&mut self) -> Result<(), SensorError> {
            if self.fail_open {
                Err(SensorError::Refresh(String::from("no driver")))
            } else {
                Ok(())
            }
        }

        fn refresh(&mut self) -> Result<(), SensorError> {
            if self.fail_refresh {
                Err(SensorError::Refresh(String::from("bus error")))
            } else {
                Ok(())
            }
        }

        fn hardware(&self) -> &[Hardware] {
            &self.tree
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn averages_present_values_only() {
        let mut aggregator =
            SensorAggregator::open(StaticProvider::new(vec![cpu(&[Some(40.0), Some(44.0), None])]));

        let reading = aggregator.sample_once().unwrap();
        assert_eq!(reading.value(), Some(42.0));
        assert_eq!(reading.sample_count(), 2);
        assert_eq!(reading.text(), "42°C");
    }

    #[test]
    fn no_cpu_sensors_reads_zero() {
        let mut aggregator = SensorAggregator::open(StaticProvider::new(Vec::new()));

        let reading = aggregator.sample_once().unwrap();
        assert_eq!(reading.value(), None);
        assert_eq!(reading.average(), 0.0);
        assert_eq!(reading.sample_count(), 0);
        assert_eq!(reading.text(), "0°C");
    }

    #[test]
    fn all_sensors_absent_reads_zero() {
        let mut aggregator = SensorAggregator::open(StaticProvider::new(vec![cpu(&[None, None])]));

        let reading = aggregator.sample_once().unwrap();
        assert!(!reading.average().is_nan());
        assert_eq!(reading.text(), "0°C");
    }

    #[test]
    fn ignores_other_devices_and_sensor_kinds() {
        let mut gpu = Hardware::new(HardwareKind::Gpu, "amdgpu");
        gpu.sensors.push(sensor(SensorKind::Temperature, Some(90.0)));

        let mut package = cpu(&[Some(50.0)]);
        package.sensors.push(sensor(SensorKind::Load, Some(100.0)));

        let mut aggregator = SensorAggregator::open(StaticProvider::new(vec![gpu, package]));
        let reading = aggregator.sample_once().unwrap();
        assert_eq!(reading.sample_count(), 1);
        assert_eq!(reading.text(), "50°C");
    }

    #[test]
    fn includes_nested_cpu_devices() {
        let mut board = Hardware::new(HardwareKind::Motherboard, "board");
        board.sub_hardware.push(cpu(&[Some(30.0)]));
        let roots = vec![board, cpu(&[Some(40.0)])];

        let values: Vec<f32> = cpu_temperatures(&roots).collect();
        assert_eq!(values, [30.0, 40.0]);
    }

    #[test]
    fn text_keeps_full_precision() {
        assert_eq!(AggregateReading::from_values([42.0, 43.0]).text(), "42.5°C");
        assert_eq!(AggregateReading::from_values([41.0, 42.0, 42.0]).text(), "41.666668°C");
        assert_eq!(format_celsius(-0.0), "0°C");
    }

    #[test]
    fn refresh_failure_is_an_error() {
        let mut provider = StaticProvider::new(vec![cpu(&[Some(40.0)])]);
        provider.fail_refresh = true;
        let mut aggregator = SensorAggregator::open(provider);

        assert!(matches!(aggregator.sample_once(), Err(SensorError::Refresh(_))));
    }

    #[test]
    fn open_failure_is_not_fatal() {
        let mut provider = StaticProvider::new(vec![cpu(&[Some(40.0)])]);
        provider.fail_open = true;
        let closes = Arc::clone(&provider.closes);
        let mut aggregator = SensorAggregator::open(provider);

        assert!(!aggregator.is_open());
        assert_eq!(aggregator.sample_once(), Err(SensorError::NotOpen));
        drop(aggregator);
        // Never opened, so never closed
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn closes_exactly_once() {
        let provider = StaticProvider::new(Vec::new());
        let closes = Arc::clone(&provider.closes);
        let mut aggregator = SensorAggregator::open(provider);

        aggregator.close();
        aggregator.close();
        drop(aggregator);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_closes_provider() {
        let provider = StaticProvider::new(Vec::new());
        let closes = Arc::clone(&provider.closes);
        drop(SensorAggregator::open(provider));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
