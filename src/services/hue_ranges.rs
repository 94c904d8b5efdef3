/// A named hue band with its canonical swatch and reference code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueRange {
    pub start: f64,
    pub end: f64,
    pub name: &'static str,
    pub hex: &'static str,
    pub reference_code: &'static str,
}

impl HueRange {
    const fn new(
        start: f64,
        end: f64,
        name: &'static str,
        hex: &'static str,
        reference_code: &'static str,
    ) -> Self {
        Self {
            start,
            end,
            name,
            hex,
            reference_code,
        }
    }

    /// Half-open membership; a band with `start > end` wraps through 0°.
    pub fn contains(&self, hue: f64) -> bool {
        if self.start > self.end {
            hue >= self.start || hue < self.end
        } else {
            self.start <= hue && hue < self.end
        }
    }
}

/// Contiguous bands covering [0, 360).
pub const HUE_RANGES: [HueRange; 18] = [
    HueRange::new(0.0, 15.0, "True Red", "#D12631", "Pantone 18-1662 TCX"),
    HueRange::new(15.0, 30.0, "Coral & Salmon", "#FF6F61", "Pantone 16-1546 TCX"),
    HueRange::new(30.0, 45.0, "Terracotta & Clay", "#BD4B37", "Pantone 18-1438 TCX"),
    HueRange::new(45.0, 60.0, "Amber & Caramel", "#D78A41", "Pantone 16-1342 TCX"),
    HueRange::new(60.0, 75.0, "Cognac & Rust", "#A5552A", "Pantone 18-1248 TCX"),
    HueRange::new(75.0, 90.0, "Mustard & Ochre", "#DBAF3A", "Pantone 15-0948 TCX"),
    HueRange::new(90.0, 105.0, "Canary & Lemon", "#F9E04C", "Pantone 12-0643 TCX"),
    HueRange::new(105.0, 135.0, "Olive & Moss", "#5E6738", "Pantone 18-0430 TCX"),
    HueRange::new(135.0, 165.0, "Sage & Mint", "#AABD8C", "Pantone 15-6316 TCX"),
    HueRange::new(165.0, 195.0, "Emerald & Jade", "#00A170", "Pantone 17-5641 TCX"),
    HueRange::new(195.0, 225.0, "Teal & Aqua", "#4799B7", "Pantone 16-4834 TCX"),
    HueRange::new(225.0, 255.0, "Cobalt & Denim", "#0047AB", "Pantone 19-4045 TCX"),
    HueRange::new(255.0, 270.0, "Navy & Indigo", "#1D334A", "Pantone 19-4027 TCX"),
    HueRange::new(270.0, 285.0, "Lavender & Lilac", "#B69FCB", "Pantone 16-3416 TCX"),
    HueRange::new(285.0, 315.0, "Violet & Amethyst", "#9678B6", "Pantone 17-3628 TCX"),
    HueRange::new(315.0, 330.0, "Mauve & Plum", "#8E4585", "Pantone 19-2428 TCX"),
    HueRange::new(330.0, 345.0, "Berry & Raspberry", "#C6174E", "Pantone 18-2140 TCX"),
    HueRange::new(345.0, 360.0, "Blush & Rose", "#E8B4B8", "Pantone 14-1511 TCX"),
];

pub fn hue_range_index(hue: f64) -> Option<usize> {
    HUE_RANGES.iter().position(|range| range.contains(hue))
}

pub fn hue_range_for(hue: f64) -> Option<&'static HueRange> {
    hue_range_index(hue).map(|i| &HUE_RANGES[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_hue_falls_in_exactly_one_range() {
        let mut hue = 0.0;
        while hue < 360.0 {
            let hits = HUE_RANGES.iter().filter(|r| r.contains(hue)).count();
            assert_eq!(hits, 1, "hue {} matched {} ranges", hue, hits);
            hue += 0.25;
        }
        assert_eq!(HUE_RANGES.iter().filter(|r| r.contains(359.9999)).count(), 1);
    }

    #[test]
    fn test_ranges_are_contiguous() {
        assert_eq!(HUE_RANGES[0].start, 0.0);
        assert_eq!(HUE_RANGES[HUE_RANGES.len() - 1].end, 360.0);
        for pair in HUE_RANGES.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_boundaries_are_half_open() {
        assert_eq!(hue_range_for(0.0).map(|r| r.name), Some("True Red"));
        assert_eq!(hue_range_for(15.0).map(|r| r.name), Some("Coral & Salmon"));
        assert_eq!(hue_range_for(240.0).map(|r| r.name), Some("Cobalt & Denim"));
        assert_eq!(hue_range_for(360.0), None);
    }

    #[test]
    fn test_wrapping_range_membership() {
        let wrap = HueRange::new(345.0, 15.0, "Red", "#FF0000", "x");
        assert!(wrap.contains(350.0));
        assert!(wrap.contains(3.0));
        assert!(!wrap.contains(15.0));
        assert!(!wrap.contains(200.0));
    }
}
