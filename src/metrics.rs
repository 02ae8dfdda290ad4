use prometheus::{Encoder, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::error::Result;
use crate::types::{ValidityCounts, Window};

const NAMESPACE: &str = "gpg";
const SUBSYSTEM: &str = "subkeys";
const FILE_LABEL: &str = "name";

/// Gauges holding the latest validity counts per key file.
///
/// Cloning is cheap and every clone shares the same registry, so one handle
/// can go to the scanner while another serves scrapes. Series are never
/// removed: a key file that disappears keeps reporting its last counts.
#[derive(Clone)]
pub struct SubkeyMetrics {
    registry: Registry,
    current: IntGaugeVec,
    one_week: IntGaugeVec,
    two_weeks: IntGaugeVec,
}

impl SubkeyMetrics {
    /// Creates a fresh registry with the three subkey gauge families.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let current = register_gauge(
            &registry,
            Window::Current,
            "Active GPG subkeys count: not expired at this time",
        )?;
        let one_week = register_gauge(
            &registry,
            Window::OneWeek,
            "Active GPG keys count: won't expire in a week",
        )?;
        let two_weeks = register_gauge(
            &registry,
            Window::TwoWeeks,
            "Active GPG keys count: won't expire in two weeks",
        )?;

        Ok(Self {
            registry,
            current,
            one_week,
            two_weeks,
        })
    }

    /// Sets the gauges of key file `name` to `counts`.
    pub fn publish(&self, name: &str, counts: &ValidityCounts) {
        for window in Window::ALL {
            let value = i64::try_from(counts.get(window)).unwrap_or(i64::MAX);
            self.gauge(window).with_label_values(&[name]).set(value);
        }
    }

    /// Returns the published value for key file `name`, if any.
    pub fn value(&self, window: Window, name: &str) -> Option<i64> {
        let family_name = format!("{NAMESPACE}_{SUBSYSTEM}_{window}");
        let families = self.registry.gather();
        let family = families.iter().find(|f| f.get_name() == family_name)?;

        family
            .get_metric()
            .iter()
            .find(|metric| {
                metric
                    .get_label()
                    .iter()
                    .any(|label| label.get_name() == FILE_LABEL && label.get_value() == name)
            })
            .map(|metric| metric.get_gauge().get_value() as i64)
    }

    /// Renders every registered family in the Prometheus text format.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = String::new();
        encoder.encode_utf8(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }

    /// Content type of the text produced by [`render`](Self::render).
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    fn gauge(&self, window: Window) -> &IntGaugeVec {
        match window {
            Window::Current => &self.current,
            Window::OneWeek => &self.one_week,
            Window::TwoWeeks => &self.two_weeks,
        }
    }
}

fn register_gauge(registry: &Registry, window: Window, help: &str) -> Result<IntGaugeVec> {
    let opts = Opts::new(window.to_string(), help)
        .namespace(NAMESPACE)
        .subsystem(SUBSYSTEM);
    let gauge = IntGaugeVec::new(opts, &[FILE_LABEL])?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(current: u64, one_week: u64, two_weeks: u64) -> ValidityCounts {
        ValidityCounts {
            current,
            one_week,
            two_weeks,
        }
    }

    #[test]
    fn test_publish_and_read_back() {
        let metrics = SubkeyMetrics::new().unwrap();
        metrics.publish("alice.asc", &counts(2, 1, 0));

        assert_eq!(metrics.value(Window::Current, "alice.asc"), Some(2));
        assert_eq!(metrics.value(Window::OneWeek, "alice.asc"), Some(1));
        assert_eq!(metrics.value(Window::TwoWeeks, "alice.asc"), Some(0));
        assert_eq!(metrics.value(Window::Current, "bob.asc"), None);
    }

    #[test]
    fn test_last_write_wins() {
        let metrics = SubkeyMetrics::new().unwrap();
        metrics.publish("alice.asc", &counts(3, 3, 3));
        metrics.publish("alice.asc", &counts(1, 0, 0));

        assert_eq!(metrics.value(Window::Current, "alice.asc"), Some(1));
        assert_eq!(metrics.value(Window::TwoWeeks, "alice.asc"), Some(0));
    }

    #[test]
    fn test_clones_share_registry() {
        let metrics = SubkeyMetrics::new().unwrap();
        let handle = metrics.clone();
        handle.publish("alice.asc", &counts(1, 1, 1));

        assert_eq!(metrics.value(Window::OneWeek, "alice.asc"), Some(1));
    }

    #[test]
    fn test_independent_registries() {
        let first = SubkeyMetrics::new().unwrap();
        let second = SubkeyMetrics::new().unwrap();
        first.publish("alice.asc", &counts(1, 1, 1));

        assert_eq!(second.value(Window::Current, "alice.asc"), None);
    }

    #[test]
    fn test_render_text_format() {
        let metrics = SubkeyMetrics::new().unwrap();
        metrics.publish("alice.asc", &counts(2, 1, 0));

        let text = metrics.render().unwrap();
        assert!(text.contains("# HELP gpg_subkeys_current Active GPG subkeys count"));
        assert!(text.contains("# TYPE gpg_subkeys_current gauge"));
        assert!(text.contains("gpg_subkeys_current{name=\"alice.asc\"} 2"));
        assert!(text.contains("gpg_subkeys_future_1week{name=\"alice.asc\"} 1"));
        assert!(text.contains("gpg_subkeys_future_2weeks{name=\"alice.asc\"} 0"));
    }

    #[test]
    fn test_render_escapes_label_values() {
        let metrics = SubkeyMetrics::new().unwrap();
        metrics.publish("we\"ird\\name.asc", &counts(1, 1, 1));

        let text = metrics.render().unwrap();
        assert!(text.contains(r#"gpg_subkeys_current{name="we\"ird\\name.asc"} 1"#));
    }

    #[test]
    fn test_render_empty_registry() {
        let metrics = SubkeyMetrics::new().unwrap();
        let text = metrics.render().unwrap();
        assert!(!text.contains("gpg_subkeys_current{"));
    }

    #[test]
    fn test_content_type() {
        let metrics = SubkeyMetrics::new().unwrap();
        assert!(metrics.content_type().starts_with("text/plain"));
    }
}
