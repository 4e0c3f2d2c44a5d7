use super::{Rect, HW, TLBR};
use crate::common::*;

/// Axis-aligned scale-then-translate transform between two frames.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transform<T> {
    pub sy: T,
    pub sx: T,
    pub ty: T,
    pub tx: T,
}

impl<T> Transform<T>
where
    T: Copy + Num + PartialOrd,
{
    pub fn from_rects<R>(src: &R, tgt: &R) -> Self
    where
        R: Rect<Type = T>,
    {
        let sy = tgt.h() / src.h();
        let sx = tgt.w() / src.w();
        let ty = tgt.t() - src.t() * sy;
        let tx = tgt.l() - src.l() * sx;

        Self { sy, sx, ty, tx }
    }

    /// Stretch the `src_size` frame onto the `tgt_size` frame.
    pub fn from_sizes_exact(src_size: &HW<T>, tgt_size: &HW<T>) -> Result<Self> {
        ensure!(
            src_size.h() > T::zero() && src_size.w() > T::zero(),
            "the source frame must not be empty"
        );
        let src = TLBR::try_from_tlhw([T::zero(), T::zero(), src_size.h(), src_size.w()])?;
        let tgt = TLBR::try_from_tlhw([T::zero(), T::zero(), tgt_size.h(), tgt_size.w()])?;
        Ok(Self::from_rects(&src, &tgt))
    }
}

impl<T> Mul<&TLBR<T>> for &Transform<T>
where
    T: Copy + Num,
{
    type Output = TLBR<T>;

    fn mul(self, rhs: &TLBR<T>) -> Self::Output {
        rhs.transform(self)
    }
}
