use image::Rgb;

/// A color anchor on the normalized [0, 1] gradient axis.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: [u8; 3],
}

/// Plasma-style gradient used by the temperature heatmaps and their colorbars.
pub const PLASMA: [ColorStop; 7] = [
    ColorStop { t: 0.0, color: [13, 8, 135] },
    ColorStop { t: 1.0 / 6.0, color: [84, 2, 163] },
    ColorStop { t: 2.0 / 6.0, color: [139, 10, 165] },
    ColorStop { t: 0.5, color: [185, 50, 137] },
    ColorStop { t: 4.0 / 6.0, color: [219, 92, 104] },
    ColorStop { t: 5.0 / 6.0, color: [244, 136, 73] },
    ColorStop { t: 1.0, color: [240, 249, 33] },
];

/// Sample the gradient at `t`, clamped to [0, 1].
pub fn sample(t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    for pair in PLASMA.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.t {
            let span = hi.t - lo.t;
            let frac = if span > 0.0 { (t - lo.t) / span } else { 0.0 };
            return Rgb([
                lerp(lo.color[0], hi.color[0], frac),
                lerp(lo.color[1], hi.color[1], frac),
                lerp(lo.color[2], hi.color[2], frac),
            ]);
        }
    }
    Rgb(PLASMA[PLASMA.len() - 1].color)
}

/// Map a data value onto the gradient given fixed scale bounds.
/// Out-of-range values saturate at the ends, matching a fixed vmin/vmax scale.
pub fn map_value(value: f64, vmin: f64, vmax: f64) -> Rgb<u8> {
    let span = vmax - vmin;
    let t = if span > 0.0 { (value - vmin) / span } else { 0.0 };
    sample(t)
}

fn lerp(a: u8, b: u8, frac: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * frac).round() as u8
}
