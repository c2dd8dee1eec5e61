use fixed::types::I32F32;

/// Length in typographic points, stored as fixed-point to keep layout
/// deterministic across platforms.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Pt(I32F32);

impl Pt {
    pub const ZERO: Pt = Pt(I32F32::from_bits(0));

    pub fn from_f32(value: f32) -> Pt {
        if !value.is_finite() {
            return Pt::ZERO;
        }
        let milli = (value as f64 * 1000.0).round() as i64;
        Pt::from_milli(milli)
    }

    pub fn from_i32(value: i32) -> Pt {
        Pt::from_milli(value as i64 * 1000)
    }

    pub fn from_milli(milli: i64) -> Pt {
        let bits = (milli as i128 * (1i128 << 32) + if milli >= 0 { 500 } else { -500 }) / 1000;
        Pt(I32F32::from_bits(
            bits.clamp(i64::MIN as i128, i64::MAX as i128) as i64,
        ))
    }

    pub fn to_f32(self) -> f32 {
        self.0.to_num()
    }

    /// Rounded millipoints; the unit every serializer formats from.
    pub fn to_milli(self) -> i64 {
        let bits = self.0.to_bits() as i128;
        let denom = 1i128 << 32;
        let scaled = bits * 1000;
        let adj = if scaled >= 0 { denom / 2 } else { -denom / 2 };
        ((scaled + adj) / denom).clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    pub fn max(self, other: Pt) -> Pt {
        if self >= other { self } else { other }
    }

    pub fn min(self, other: Pt) -> Pt {
        if self <= other { self } else { other }
    }

    /// Twips (1/20 pt), the RTF goal-size unit.
    pub fn to_twips(self) -> i64 {
        (self.to_milli() * 20 + 500) / 1000
    }

    /// English Metric Units (1 pt = 12700 EMU), the OOXML drawing unit.
    pub fn to_emu(self) -> i64 {
        (self.to_milli() * 12_700 + 500) / 1000
    }
}

impl std::ops::Add for Pt {
    type Output = Pt;
    fn add(self, rhs: Pt) -> Pt {
        Pt(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for Pt {
    fn add_assign(&mut self, rhs: Pt) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Pt {
    type Output = Pt;
    fn sub(self, rhs: Pt) -> Pt {
        Pt(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::Mul<f32> for Pt {
    type Output = Pt;
    fn mul(self, rhs: f32) -> Pt {
        if !rhs.is_finite() {
            return Pt::ZERO;
        }
        Pt::from_f32(self.to_f32() * rhs)
    }
}

impl std::ops::Div<f32> for Pt {
    type Output = Pt;
    fn div(self, rhs: f32) -> Pt {
        if rhs == 0.0 || !rhs.is_finite() {
            Pt::ZERO
        } else {
            Pt::from_f32(self.to_f32() / rhs)
        }
    }
}

impl std::ops::Neg for Pt {
    type Output = Pt;
    fn neg(self) -> Pt {
        Pt::ZERO - self
    }
}

impl std::iter::Sum for Pt {
    fn sum<I: Iterator<Item = Pt>>(iter: I) -> Pt {
        iter.fold(Pt::ZERO, |acc, v| acc + v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: Pt,
    pub height: Pt,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: Pt::from_f32(width),
            height: Pt::from_f32(height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: Pt,
    pub y: Pt,
    pub width: Pt,
    pub height: Pt,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: Pt,
    pub right: Pt,
    pub bottom: Pt,
    pub left: Pt,
}

impl Margins {
    pub fn all(value: f32) -> Self {
        let v = Pt::from_f32(value);
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }
}

/// Fixed physical page geometry; one constant value threaded through the
/// engine so another paper size is a one-line swap at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_size: Size,
    pub inset: Margins,
}

impl PageGeometry {
    /// A4-class report page: 595 x 842 pt with a uniform 36 pt inset.
    pub fn report_default() -> Self {
        Self {
            page_size: Size::new(595.0, 842.0),
            inset: Margins::all(36.0),
        }
    }

    pub fn content_rect(&self) -> Rect {
        Rect {
            x: self.inset.left,
            y: self.inset.top,
            width: self.page_size.width - self.inset.left - self.inset.right,
            height: self.page_size.height - self.inset.top - self.inset.bottom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pt_roundtrips_millis() {
        let v = Pt::from_f32(12.345);
        assert_eq!(v.to_milli(), 12_345);
        assert_eq!(Pt::from_milli(12_345), v);
    }

    #[test]
    fn pt_unit_conversions() {
        let v = Pt::from_f32(10.0);
        assert_eq!(v.to_twips(), 200);
        assert_eq!(v.to_emu(), 127_000);
    }

    #[test]
    fn content_rect_applies_inset() {
        let geometry = PageGeometry::report_default();
        let rect = geometry.content_rect();
        assert_eq!(rect.x, Pt::from_f32(36.0));
        assert_eq!(rect.width, Pt::from_f32(523.0));
        assert_eq!(rect.height, Pt::from_f32(770.0));
    }
}
