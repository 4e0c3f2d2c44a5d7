use super::{Rect, HW};
use crate::{common::*, Transform};

/// Box in top-left-bottom-right format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TLBR<T> {
    pub(crate) t: T,
    pub(crate) l: T,
    pub(crate) b: T,
    pub(crate) r: T,
}

impl<T> TLBR<T> {
    pub fn try_cast<V>(self) -> Option<TLBR<V>>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        Some(TLBR {
            t: V::from(self.t)?,
            l: V::from(self.l)?,
            b: V::from(self.b)?,
            r: V::from(self.r)?,
        })
    }
}

impl<T> TLBR<T>
where
    T: Copy + Num,
{
    pub fn transform(&self, transform: &Transform<T>) -> Self {
        TLBR {
            t: self.t * transform.sy + transform.ty,
            l: self.l * transform.sx + transform.tx,
            b: self.b * transform.sy + transform.ty,
            r: self.r * transform.sx + transform.tx,
        }
    }
}

impl<T> TLBR<T>
where
    T: Copy + Num + PartialOrd,
{
    /// Restrict the box to the `[0, h] x [0, w]` frame.
    ///
    /// Returns `None` if the box lies entirely outside the frame.
    pub fn clip_to(&self, size: &HW<T>) -> Option<Self> {
        let zero = T::zero();
        let clamp = |val: T, max: T| {
            if val < zero {
                zero
            } else if val > max {
                max
            } else {
                val
            }
        };

        let t = clamp(self.t, size.h());
        let b = clamp(self.b, size.h());
        let l = clamp(self.l, size.w());
        let r = clamp(self.r, size.w());
        (b > t && r > l).then(|| Self { t, l, b, r })
    }
}

impl<T> TLBR<T>
where
    T: Float,
{
    /// Snap the corners to the pixel grid by truncating toward zero.
    pub fn trunc(&self) -> Self {
        Self {
            t: self.t.trunc(),
            l: self.l.trunc(),
            b: self.b.trunc(),
            r: self.r.trunc(),
        }
    }
}

impl<T> Rect for TLBR<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn t(&self) -> Self::Type {
        self.t
    }

    fn l(&self) -> Self::Type {
        self.l
    }

    fn b(&self) -> Self::Type {
        self.b
    }

    fn r(&self) -> Self::Type {
        self.r
    }

    fn h(&self) -> Self::Type {
        self.b - self.t
    }

    fn w(&self) -> Self::Type {
        self.r - self.l
    }

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self> {
        let [t, l, b, r] = tlbr;
        ensure!(b >= t && r >= l, "b >= t and r >= l must hold");

        Ok(Self { t, l, b, r })
    }

    fn try_from_tlhw(tlhw: [Self::Type; 4]) -> Result<Self> {
        let [t, l, h, w] = tlhw;
        let b = t + h;
        let r = l + w;
        Self::try_from_tlbr([t, l, b, r])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn clip_partially_outside_box() {
        let rect = TLBR::try_from_tlbr([-10.0, 20.0, 50.0, 120.0]).unwrap();
        let size = HW::try_from_hw([40.0, 100.0]).unwrap();
        let clipped = rect.clip_to(&size).unwrap();
        assert_eq!(clipped.tlbr(), [0.0, 20.0, 40.0, 100.0]);
    }

    #[test]
    fn clip_box_outside_frame() {
        let rect = TLBR::try_from_tlbr([50, 50, 60, 60]).unwrap();
        let size = HW::try_from_hw([40, 40]).unwrap();
        assert!(rect.clip_to(&size).is_none());
    }

    #[test]
    fn invalid_corners_are_rejected() {
        assert!(TLBR::try_from_tlbr([10.0, 0.0, 5.0, 3.0]).is_err());
    }
}
