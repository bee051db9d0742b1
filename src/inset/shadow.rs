use crate::surface::RasterSurface;

/// Exchange the shadow state of two surfaces. Applying it twice restores both.
pub fn swap_shadows<A, B>(a: &mut A, b: &mut B)
where
    A: RasterSurface + ?Sized,
    B: RasterSurface + ?Sized,
{
    let from_a = a.shadow();
    let from_b = b.shadow();
    a.set_shadow(from_b);
    b.set_shadow(from_a);
}

#[cfg(test)]
#[path = "../../tests/unit/inset/shadow.rs"]
mod tests;
