//! RGB to HSV and HLS conversion of single pixels.
//!
//! Hue is in degrees within `[0, 360)`, the other components in `[0, 1]`.

pub fn rgb_to_hsv(rgb: [u8; 3]) -> [f64; 3] {
    let Extrema { hue, max, delta, .. } = Extrema::new(rgb);
    let saturation = if max == 0.0 { 0.0 } else { delta / max };
    [hue, saturation, max]
}

pub fn hsv_to_rgb([hue, saturation, value]: [f64; 3]) -> [u8; 3] {
    let saturation = saturation.clamp(0.0, 1.0);
    let value = value.clamp(0.0, 1.0);
    let chroma = value * saturation;
    from_chroma(hue, chroma, value - chroma)
}

/// Hue, lightness and saturation in this order, as OpenCV lays out HLS.
pub fn rgb_to_hls(rgb: [u8; 3]) -> [f64; 3] {
    let Extrema {
        hue,
        max,
        min,
        delta,
    } = Extrema::new(rgb);
    let lightness = (max + min) / 2.0;
    let saturation = if delta == 0.0 {
        0.0
    } else {
        delta / (1.0 - (2.0 * lightness - 1.0).abs())
    };
    [hue, lightness, saturation.min(1.0)]
}

pub fn hls_to_rgb([hue, lightness, saturation]: [f64; 3]) -> [u8; 3] {
    let lightness = lightness.clamp(0.0, 1.0);
    let saturation = saturation.clamp(0.0, 1.0);
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    from_chroma(hue, chroma, lightness - chroma / 2.0)
}

struct Extrema {
    hue: f64,
    max: f64,
    min: f64,
    delta: f64,
}

impl Extrema {
    fn new([r, g, b]: [u8; 3]) -> Self {
        let r = r as f64 / 255.0;
        let g = g as f64 / 255.0;
        let b = b as f64 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let hue = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };

        Self {
            hue,
            max,
            min,
            delta,
        }
    }
}

/// Rebuild a pixel from its hue, chroma and the offset of the smallest
/// component.
fn from_chroma(hue: f64, chroma: f64, m: f64) -> [u8; 3] {
    let sector = hue.rem_euclid(360.0) / 60.0;
    let x = chroma * (1.0 - (sector.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let to_u8 = |c: f64| ((c + m) * 255.0).round().clamp(0.0, 255.0) as u8;

    [to_u8(r), to_u8(g), to_u8(b)]
}
