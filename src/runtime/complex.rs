use serde::{Deserialize, Serialize};

/// Double-precision complex number.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub fn is_zero(self) -> bool {
        self.re == 0.0 && self.im == 0.0
    }

    pub fn add(self, other: Self) -> Self {
        Self::new(self.re + other.re, self.im + other.im)
    }

    pub fn sub(self, other: Self) -> Self {
        Self::new(self.re - other.re, self.im - other.im)
    }

    pub fn mul(self, other: Self) -> Self {
        Self::new(
            self.re * other.re - self.im * other.im,
            self.re * other.im + self.im * other.re,
        )
    }

    /// Returns `None` when dividing by zero.
    pub fn div(self, other: Self) -> Option<Self> {
        if other.is_zero() {
            return None;
        }
        let denominator = other.re * other.re + other.im * other.im;
        Some(Self::new(
            (self.re * other.re + self.im * other.im) / denominator,
            (self.im * other.re - self.re * other.im) / denominator,
        ))
    }

    /// Principal value of `self ** exponent`; `None` when zero is raised to a
    /// negative or complex power.
    pub fn pow(self, exponent: Self) -> Option<Self> {
        if exponent.is_zero() {
            return Some(Self::new(1.0, 0.0));
        }
        if self.is_zero() {
            if exponent.im != 0.0 || exponent.re < 0.0 {
                return None;
            }
            return Some(Self::default());
        }
        let magnitude = self.re.hypot(self.im);
        let angle = self.im.atan2(self.re);
        let mut length = magnitude.powf(exponent.re);
        let mut phase = angle * exponent.re;
        if exponent.im != 0.0 {
            length /= (angle * exponent.im).exp();
            phase += exponent.im * magnitude.ln();
        }
        Some(Self::new(length * phase.cos(), length * phase.sin()))
    }

    pub fn neg(self) -> Self {
        Self::new(-self.re, -self.im)
    }

    pub fn repr(self) -> String {
        let imag = format!("{}j", component_repr(self.im));
        if self.re == 0.0 && self.re.is_sign_positive() {
            return imag;
        }
        let sign = if imag.starts_with('-') { "" } else { "+" };
        format!("({}{sign}{imag})", component_repr(self.re))
    }
}

fn component_repr(value: f64) -> String {
    let rendered = super::value::float_repr(value);
    match rendered.strip_suffix(".0") {
        Some(integral) => integral.to_string(),
        None => rendered,
    }
}
