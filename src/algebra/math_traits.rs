// Internal vector math for the solvers goes through this trait,
// which is implemented generically for slices of FloatT.

/// Vector operations on slices of [`FloatT`](crate::algebra::FloatT)
pub trait VectorMath {
    type T;

    /// set all elements to the same value
    fn set(&mut self, c: Self::T) -> &mut Self;

    /// Elementwise scaling.
    fn scale(&mut self, c: Self::T) -> &mut Self;

    /// Dot product
    fn dot(&self, y: &Self) -> Self::T;

    /// Infinity norm
    fn norm_inf(&self) -> Self::T;

    /// Infinity norm of the difference `self - y`
    fn dist_inf(&self, y: &Self) -> Self::T;

    /// BLAS-like shift and scale in place.  Produces `self = a*x+b*self`
    fn axpby(&mut self, a: Self::T, x: &Self, b: Self::T) -> &mut Self;

    /// Gather `self[i] = x[p[i]]`
    fn permute_from(&mut self, x: &Self, p: &[usize]) -> &mut Self;

    /// Scatter `self[p[i]] = x[i]`
    fn ipermute_from(&mut self, x: &Self, p: &[usize]) -> &mut Self;
}
