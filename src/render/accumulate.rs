use crate::foundation::core::Argb;

/// Order-independent blend of several source colors for one pixel.
///
/// Color channels are alpha-weighted averages of the contributions; alpha is the mean alpha of
/// the non-transparent contributions. Integer sums keep the result exactly commutative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlphaAverage {
    sum_a: u64,
    sum_r: u64,
    sum_g: u64,
    sum_b: u64,
    count: u32,
}

impl AlphaAverage {
    /// Empty accumulator.
    pub const fn new() -> Self {
        Self {
            sum_a: 0,
            sum_r: 0,
            sum_g: 0,
            sum_b: 0,
            count: 0,
        }
    }

    /// Add one contribution; fully transparent colors are ignored.
    pub fn add(&mut self, c: Argb) {
        let [a, r, g, b] = c.channels();
        if a == 0 {
            return;
        }
        let a = u64::from(a);
        self.sum_a += a;
        self.sum_r += u64::from(r) * a;
        self.sum_g += u64::from(g) * a;
        self.sum_b += u64::from(b) * a;
        self.count += 1;
    }

    /// Normalized result; transparent when nothing contributed.
    pub fn finish(&self) -> Argb {
        if self.count == 0 || self.sum_a == 0 {
            return Argb::TRANSPARENT;
        }
        let div = |num: u64, den: u64| ((num + den / 2) / den).min(255) as u8;
        Argb::from_channels(
            div(self.sum_a, u64::from(self.count)),
            div(self.sum_r, self.sum_a),
            div(self.sum_g, self.sum_a),
            div(self.sum_b, self.sum_a),
        )
    }
}

/// Blend `colors` with [`AlphaAverage`].
pub fn blend(colors: impl IntoIterator<Item = Argb>) -> Argb {
    let mut acc = AlphaAverage::new();
    for c in colors {
        acc.add(c);
    }
    acc.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/render/accumulate.rs"]
mod tests;
