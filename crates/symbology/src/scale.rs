use foundation::color::interpolate_rainbow;

/// Start of the excluded near-cyan hue band, as a fraction of the hue cycle.
/// Generated palettes skip it so no category color collides with the
/// selection highlight.
const CYAN_BAND: (f64, f64) = (0.58, 0.63);

/// Fixed shuffle seed. Determinism is load-bearing: color-to-category
/// assignment must be stable across sessions without server-side persistence.
const SHUFFLE_SEED: u64 = 0x28;

/// Generates a deterministic categorical palette of roughly `3 * n` hex
/// colors (fewer when sampling runs into the excluded cyan band).
///
/// Each sampled hue contributes three variants at different saturation and
/// lightness so the usable palette stays large at small `n`.
pub fn generate(n: usize) -> Vec<String> {
    let mut colors = Vec::with_capacity(n * 3);
    for i in 0..n {
        let pos = i as f64 / n as f64;
        if pos > CYAN_BAND.0 && pos < CYAN_BAND.1 {
            break;
        }
        let mut hue = interpolate_rainbow(pos).to_hsl();
        hue.s = 1.0;
        hue.l = 0.5;
        colors.push(hue.to_rgb().to_hex());
        hue.s = 0.5;
        hue.l = 0.35;
        colors.push(hue.to_rgb().to_hex());
        hue.s = 1.0;
        hue.l = 0.75;
        colors.push(hue.to_rgb().to_hex());
    }
    shuffle(&mut colors);
    colors
}

/// Fixed-seed Fisher-Yates so repeated runs order the palette identically.
fn shuffle(colors: &mut [String]) {
    let mut state = SHUFFLE_SEED;
    let mut next = || {
        // Constants from Knuth's MMIX linear congruential generator.
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        state
    };
    for i in (1..colors.len()).rev() {
        let j = (next() % (i as u64 + 1)) as usize;
        colors.swap(i, j);
    }
}

/// Cyclic color lookup for assigning palette colors to category ordinals.
#[derive(Debug, Clone)]
pub struct ColorScale {
    colors: Vec<String>,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self {
            colors: generate(10),
        }
    }
}

impl ColorScale {
    pub fn new(colors: Vec<String>) -> Self {
        Self { colors }
    }

    pub fn color_for(&self, ordinal: usize) -> Option<&str> {
        if self.colors.is_empty() {
            return None;
        }
        Some(self.colors[ordinal % self.colors.len()].as_str())
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{ColorScale, generate};

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(generate(10), generate(10));
        assert_eq!(generate(25), generate(25));
    }

    #[test]
    fn sampling_stops_at_cyan_band() {
        // With n = 100, sampling halts at pos > 0.58, so fewer than 3n
        // colors come out.
        let colors = generate(100);
        assert!(colors.len() < 300);
        assert!(colors.len() >= 3 * 58);
    }

    #[test]
    fn emits_three_variants_per_hue() {
        // n = 2 samples pos 0.0 and 0.5, both outside the excluded band.
        let colors = generate(2);
        assert_eq!(colors.len(), 6);
        let distinct: BTreeSet<&String> = colors.iter().collect();
        assert_eq!(distinct.len(), 6);
    }

    #[test]
    fn all_colors_are_hex() {
        for color in generate(10) {
            assert!(color.starts_with('#'), "{color}");
            assert_eq!(color.len(), 7, "{color}");
        }
    }

    #[test]
    fn scale_wraps_around() {
        let scale = ColorScale::new(vec!["#a".to_string(), "#b".to_string()]);
        assert_eq!(scale.color_for(0), Some("#a"));
        assert_eq!(scale.color_for(3), Some("#b"));
        assert!(ColorScale::new(vec![]).color_for(0).is_none());
    }
}
