//! Device classification from a `User-Agent` header
//!
//! This is a small marker-based classifier, good enough to label peers in a
//! session roster ("macOS Firefox", "iOS iPhone"). It does not try to be a
//! complete user-agent parser.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse device category shown to the other peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Tablet,
    Mobile,
    Unknown,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Desktop => "desktop",
            DeviceType::Tablet => "tablet",
            DeviceType::Mobile => "mobile",
            DeviceType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating system markers, checked in order.
///
/// iOS devices also carry "Mac OS X" and Android carries "Linux", so the more
/// specific markers come first.
const OS_MARKERS: &[(&str, &str)] = &[
    ("iPhone", "iOS"),
    ("iPad", "iOS"),
    ("iPod", "iOS"),
    ("Android", "Android"),
    ("CrOS", "ChromeOS"),
    ("Windows", "Windows"),
    ("Macintosh", "macOS"),
    ("Mac OS X", "macOS"),
    ("Linux", "Linux"),
];

/// Browser markers, checked in order. Chromium forks advertise "Chrome" and
/// "Safari" as well, so they are matched before the generic engines.
const BROWSER_MARKERS: &[(&str, &str)] = &[
    ("Edg/", "Edge"),
    ("OPR/", "Opera"),
    ("SamsungBrowser/", "Samsung Internet"),
    ("Firefox/", "Firefox"),
    ("FxiOS/", "Firefox"),
    ("CriOS/", "Chrome"),
    ("Chrome/", "Chrome"),
    ("Safari/", "Safari"),
];

/// Hardware markers that name the device better than the browser does
const DEVICE_MARKERS: &[&str] = &["iPhone", "iPad", "iPod"];

const DESKTOP_OSES: &[&str] = &["Windows", "macOS", "Linux", "ChromeOS"];

/// Classify a raw `User-Agent` header into a device type and display label
///
/// The label is the operating system followed by the device model when one is
/// known, otherwise the browser name. Unrecognized agents yield
/// [`DeviceType::Unknown`] and whatever parts could be identified.
pub fn classify(user_agent: &str) -> (DeviceType, String) {
    let os = find_marker(user_agent, OS_MARKERS);
    let browser = find_marker(user_agent, BROWSER_MARKERS);
    let device = DEVICE_MARKERS
        .iter()
        .find(|marker| user_agent.contains(*marker))
        .copied();

    let device_type = if is_tablet(user_agent) {
        DeviceType::Tablet
    } else if is_mobile(user_agent) {
        DeviceType::Mobile
    } else if os.is_some_and(|os| DESKTOP_OSES.contains(&os)) {
        DeviceType::Desktop
    } else {
        DeviceType::Unknown
    };

    let name = [os, device.or(browser)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    (device_type, name)
}

fn find_marker(user_agent: &str, markers: &[(&str, &'static str)]) -> Option<&'static str> {
    markers
        .iter()
        .find(|(marker, _)| user_agent.contains(marker))
        .map(|(_, name)| *name)
}

fn is_tablet(user_agent: &str) -> bool {
    user_agent.contains("iPad")
        || user_agent.contains("Tablet")
        || (user_agent.contains("Android") && !user_agent.contains("Mobile"))
}

fn is_mobile(user_agent: &str) -> bool {
    user_agent.contains("Mobi") || user_agent.contains("iPhone") || user_agent.contains("iPod")
}
