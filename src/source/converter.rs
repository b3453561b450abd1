use crate::foundation::core::Argb;

/// Color/contrast conversion from a source value to a display color.
pub trait Converter<T>: Send + Sync {
    /// Convert one sampled value.
    fn convert(&self, value: T) -> Argb;
}

/// Identity conversion for sources that already hold ARGB pixels.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArgbPassthrough;

impl Converter<Argb> for ArgbPassthrough {
    fn convert(&self, value: Argb) -> Argb {
        value
    }
}

/// Linear contrast stretch of a scalar value, tinted with a channel color.
///
/// Values at or below `min` map to black, at or above `max` to `color`; alpha is always the
/// alpha of `color`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RealArgbConverter {
    /// Display range lower bound.
    pub min: f64,
    /// Display range upper bound.
    pub max: f64,
    /// Channel tint.
    pub color: Argb,
}

impl RealArgbConverter {
    /// Grayscale converter over `[min, max]`.
    pub fn gray(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            color: Argb::WHITE,
        }
    }

    fn intensity(&self, v: f64) -> f64 {
        let range = self.max - self.min;
        if range <= 0.0 {
            return if v >= self.max { 1.0 } else { 0.0 };
        }
        ((v - self.min) / range).clamp(0.0, 1.0)
    }
}

impl<T: Into<f64>> Converter<T> for RealArgbConverter {
    fn convert(&self, value: T) -> Argb {
        let k = self.intensity(value.into());
        let scale = |c: u8| (f64::from(c) * k).round().clamp(0.0, 255.0) as u8;
        Argb::from_channels(
            self.color.a(),
            scale(self.color.r()),
            scale(self.color.g()),
            scale(self.color.b()),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/converter.rs"]
mod tests;
