//! Radial splat palettes
//!
//! Each heatmap point is drawn as a filled disc whose colour follows a radial
//! gradient from the centre (offset 0) to the rim (offset 1). Gaze points use
//! a warm red-to-yellow ramp, pointer points a cool blue-to-cyan one. Both
//! keep a visible rim instead of fading to nothing.

/// Splat radius for gaze points, in pixels
pub const GAZE_RADIUS: f64 = 60.0;

/// Splat radius for pointer points, in pixels
pub const MOUSE_RADIUS: f64 = 50.0;

/// Straight (non-premultiplied) RGBA, channels in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// From 8-bit colour channels and a 0..=1 alpha
    pub fn from_css(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a,
        }
    }

    fn lerp(self, other: Rgba, t: f32) -> Rgba {
        Rgba {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Premultiplied `[r, g, b, a]`
    pub fn premultiplied(self) -> [f32; 4] {
        [self.r * self.a, self.g * self.a, self.b * self.a, self.a]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub rgb: [u8; 3],
    pub alpha: f32,
}

impl ColorStop {
    pub fn color(&self) -> Rgba {
        Rgba::from_css(self.rgb[0], self.rgb[1], self.rgb[2], self.alpha)
    }
}

const fn stop(offset: f32, r: u8, g: u8, b: u8, alpha: f32) -> ColorStop {
    ColorStop {
        offset,
        rgb: [r, g, b],
        alpha,
    }
}

pub const GAZE_STOPS: [ColorStop; 5] = [
    stop(0.0, 255, 0, 0, 1.0),
    stop(0.2, 255, 50, 0, 0.95),
    stop(0.5, 255, 150, 0, 0.85),
    stop(0.8, 255, 255, 0, 0.7),
    stop(1.0, 255, 255, 0, 0.3),
];

pub const MOUSE_STOPS: [ColorStop; 5] = [
    stop(0.0, 59, 130, 246, 1.0),
    stop(0.2, 34, 211, 238, 0.9),
    stop(0.5, 100, 180, 255, 0.8),
    stop(0.8, 147, 197, 253, 0.65),
    stop(1.0, 200, 230, 255, 0.35),
];

/// Radial gradient with a fixed radius
#[derive(Debug, Clone, Copy)]
pub struct Gradient {
    pub radius: f64,
    stops: &'static [ColorStop],
}

impl Gradient {
    pub const fn gaze() -> Self {
        Self {
            radius: GAZE_RADIUS,
            stops: &GAZE_STOPS,
        }
    }

    pub const fn mouse() -> Self {
        Self {
            radius: MOUSE_RADIUS,
            stops: &MOUSE_STOPS,
        }
    }

    /// Colour at `offset` (0 = centre, 1 = rim); offsets outside are clamped
    pub fn sample(&self, offset: f32) -> Rgba {
        let t = offset.clamp(0.0, 1.0);
        let first = self.stops[0];
        let last = self.stops[self.stops.len() - 1];
        if t <= first.offset {
            return first.color();
        }
        if t >= last.offset {
            return last.color();
        }

        for pair in self.stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if t <= hi.offset {
                let span = hi.offset - lo.offset;
                let local = if span > 0.0 { (t - lo.offset) / span } else { 1.0 };
                return lo.color().lerp(hi.color(), local);
            }
        }

        last.color()
    }
}
