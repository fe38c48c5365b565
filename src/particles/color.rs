//! HSL colour helpers for particle colours

/// Linear RGB triple in `[0, 1]`
pub type Rgb = [f32; 3];

/// Convert hue/saturation/lightness to RGB.
///
/// Hue is taken modulo 1, so a hue of 1.03 is the same red as 0.03.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Rgb {
    let h = hue.rem_euclid(1.0);
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    if s <= 0.0 {
        return [l, l, l];
    }

    let high = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let low = 2.0 * l - high;

    [
        hue_channel(low, high, h + 1.0 / 3.0),
        hue_channel(low, high, h),
        hue_channel(low, high, h - 1.0 / 3.0),
    ]
}

fn hue_channel(low: f32, high: f32, t: f32) -> f32 {
    let t = if t < 0.0 {
        t + 1.0
    } else if t > 1.0 {
        t - 1.0
    } else {
        t
    };

    if t < 1.0 / 6.0 {
        low + (high - low) * 6.0 * t
    } else if t < 0.5 {
        high
    } else if t < 2.0 / 3.0 {
        low + (high - low) * 6.0 * (2.0 / 3.0 - t)
    } else {
        low
    }
}

/// Recover the hue in `[0, 1)` of an RGB colour. Greys report hue 0.
#[cfg(test)]
pub fn rgb_to_hue([r, g, b]: Rgb) -> f32 {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    if delta <= f32::EPSILON {
        return 0.0;
    }

    let sector = if (max - r).abs() <= f32::EPSILON {
        ((g - b) / delta).rem_euclid(6.0)
    } else if (max - g).abs() <= f32::EPSILON {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    (sector / 6.0).rem_euclid(1.0)
}
