use super::{FloatT, VectorMath};
use itertools::izip;
use std::iter::zip;

impl<T: FloatT> VectorMath for [T] {
    type T = T;

    fn set(&mut self, c: T) -> &mut Self {
        self.fill(c);
        self
    }

    fn scale(&mut self, c: T) -> &mut Self {
        self.iter_mut().for_each(|x| *x *= c);
        self
    }

    fn dot(&self, y: &[T]) -> T {
        assert_eq!(self.len(), y.len());
        zip(self, y).fold(T::zero(), |acc, (&x, &y)| acc + x * y)
    }

    fn norm_inf(&self) -> T {
        let mut out = T::zero();
        for v in self.iter().map(|v| v.abs()) {
            // NaN propagates
            if v.is_nan() {
                return T::nan();
            }
            out = if v > out { v } else { out };
        }
        out
    }

    fn dist_inf(&self, y: &[T]) -> T {
        assert_eq!(self.len(), y.len());
        let mut out = T::zero();
        for (&x, &y) in zip(self, y) {
            let d = (x - y).abs();
            if d.is_nan() {
                return T::nan();
            }
            out = T::max(out, d);
        }
        out
    }

    fn axpby(&mut self, a: T, x: &[T], b: T) -> &mut Self {
        assert_eq!(self.len(), x.len());

        //handle b = 1 / b = 0 separately
        if b == T::zero() {
            zip(&mut *self, x).for_each(|(y, x)| *y = a * (*x));
        } else if b == T::one() {
            zip(&mut *self, x).for_each(|(y, x)| *y += a * (*x));
        } else {
            zip(&mut *self, x).for_each(|(y, x)| *y = a * (*x) + b * (*y));
        }
        self
    }

    fn permute_from(&mut self, x: &[T], p: &[usize]) -> &mut Self {
        assert_eq!(self.len(), x.len());
        assert_eq!(self.len(), p.len());
        for (y, &pi) in zip(&mut *self, p) {
            *y = x[pi];
        }
        self
    }

    fn ipermute_from(&mut self, x: &[T], p: &[usize]) -> &mut Self {
        assert_eq!(self.len(), x.len());
        assert_eq!(self.len(), p.len());
        for (&xi, &pi) in izip!(x, p) {
            self[pi] = xi;
        }
        self
    }
}

#[test]
fn test_vector_math() {
    let mut y = vec![1., -4., 2.];
    assert_eq!(y.norm_inf(), 4.);
    assert_eq!(y.dot(&[1., 1., 1.]), -1.);
    assert_eq!(y.dist_inf(&[1., -1., 2.]), 3.);

    y.axpby(2., &[1., 1., 1.], 1.);
    assert_eq!(y, vec![3., -2., 4.]);
    y.scale(0.5);
    assert_eq!(y, vec![1.5, -1., 2.]);

    let p = [2, 0, 1];
    let mut z = vec![0.; 3];
    z.permute_from(&y, &p);
    assert_eq!(z, vec![2., 1.5, -1.]);
    let mut w = vec![0.; 3];
    w.ipermute_from(&z, &p);
    assert_eq!(w, y);

    assert!([1., f64::NAN].norm_inf().is_nan());
}
