use lab::Lab;
use serde::{Deserialize, Serialize};

/// One entry of the reference color catalog, with its Lab value precomputed.
#[derive(Debug, Clone)]
pub struct ReferenceColor {
    pub name: String,
    pub hex: String,
    pub rgb: [u8; 3],
    pub lab: Lab,
}

/// Result of a nearest-color lookup.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct ColorMatch {
    pub name: String,
    pub hex: String,
}

/// A representative color of one foreground pixel cluster.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ColorSwatch {
    /// Cluster centroid on the 0-255 scale.
    pub rgb: [f64; 3],
    /// Literal hex of the centroid.
    pub hex: String,
    /// Degrees in [0, 360).
    pub hue: f64,
    /// Percent in [0, 100].
    pub saturation: f64,
    /// Percent in [0, 100].
    pub value: f64,
    /// Mean of the three channels.
    pub brightness: f64,
    /// Population standard deviation of the three channels.
    pub complexity: f64,
    /// Share of the image's sampled foreground pixels in this cluster.
    pub proportion: f64,
    pub reference_name: String,
    pub reference_hex: String,
}

/// Formats channels as `#RRGGBB`, truncating and clamping each to 0-255.
pub fn rgb_to_hex(rgb: [f64; 3]) -> String {
    let [r, g, b] = rgb_to_u8(rgb);
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// Truncates float channels to 8-bit integers, the way the Lab transform expects them.
pub fn rgb_to_u8(rgb: [f64; 3]) -> [u8; 3] {
    rgb.map(|c| c.clamp(0.0, 255.0) as u8)
}

/// Parses `#RRGGBB` or `RRGGBB`.
pub fn hex_to_rgb(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

/// HSV in the colorsys convention: hue in degrees, saturation and value in percent.
pub fn rgb_to_hsv(rgb: [f64; 3]) -> (f64, f64, f64) {
    let [r, g, b] = rgb.map(|c| c / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let value = max * 100.0;
    if max == min {
        return (0.0, 0.0, value);
    }
    let delta = max - min;
    let saturation = delta / max * 100.0;

    let rc = (max - r) / delta;
    let gc = (max - g) / delta;
    let bc = (max - b) / delta;
    let h = if r == max {
        bc - gc
    } else if g == max {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };
    let mut hue = (h / 6.0).rem_euclid(1.0) * 360.0;
    if hue >= 360.0 {
        hue = 0.0;
    }
    (hue, saturation, value)
}
