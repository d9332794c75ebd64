use std::ops::Index;

use nalgebra::convert;
use simba::scalar::SupersetOf;

use crate::misc::{default_tolerance, FloatingPoint};

use super::KnotMultiplicity;

/// Knot vector representation
/// A non-decreasing sequence of parameter values defining where and how
/// smoothly the polynomial pieces of a B-spline join.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnotVector<T>(Vec<T>);

impl<T: FloatingPoint> KnotVector<T> {
    pub fn new(knots: Vec<T>) -> Self {
        Self(knots)
    }

    /// Create an open uniform (clamped) knot vector for `n` control points:
    /// multiplicity `degree + 1` at both ends, integer interior knots.
    /// # Example
    /// ```
    /// use nurbs2d::prelude::KnotVector;
    /// let knots: KnotVector<f64> = KnotVector::open_uniform(5, 2);
    /// assert_eq!(knots.to_vec(), vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// ```
    pub fn open_uniform(n: usize, degree: usize) -> Self {
        let order = degree + 1;
        let mut knots = Vec::with_capacity(n + order);
        knots.extend(std::iter::repeat_n(T::zero(), order));
        for i in 1..=(n.saturating_sub(order)) {
            knots.push(T::from_usize(i).unwrap());
        }
        let end = T::from_usize(n.saturating_sub(order) + 1).unwrap();
        knots.extend(std::iter::repeat_n(end, order));
        Self(knots)
    }

    /// Create a periodic uniform knot vector for `n` control points:
    /// strictly increasing integers, multiplicity 1 everywhere.
    /// # Example
    /// ```
    /// use nurbs2d::prelude::KnotVector;
    /// let knots: KnotVector<f64> = KnotVector::periodic_uniform(4, 2);
    /// assert_eq!(knots.to_vec(), vec![0., 1., 2., 3., 4., 5., 6.]);
    /// ```
    pub fn periodic_uniform(n: usize, degree: usize) -> Self {
        Self((0..(n + degree + 1)).map(|i| T::from_usize(i).unwrap()).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.0.clone()
    }

    pub fn first(&self) -> T {
        self.0[0]
    }

    pub fn last(&self) -> T {
        self.0[self.0.len() - 1]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<T> {
        self.0.iter()
    }

    /// Get the parameter domain of the knot vector by degree
    pub fn domain(&self, degree: usize) -> (T, T) {
        (self.0[degree], self.0[self.0.len() - 1 - degree])
    }

    pub fn clamp_parameter(&self, degree: usize, u: T) -> T {
        let (min, max) = self.domain(degree);
        u.clamp(min, max)
    }

    /// Insert a knot value at the given position
    pub fn insert(&mut self, index: usize, knot: T) {
        self.0.insert(index, knot);
    }

    /// Overwrite a single knot value
    pub fn set(&mut self, index: usize, knot: T) {
        self.0[index] = knot;
    }

    /// Append one knot continuing the mean spacing of the vector
    pub fn extend_back(&mut self) {
        let step = if self.0.len() > 1 {
            let span = self.last() - self.first();
            let div = T::from_usize(self.0.len() - 1).unwrap();
            let mean = span / div;
            if mean > T::zero() {
                mean
            } else {
                T::one()
            }
        } else {
            T::one()
        };
        self.0.push(self.last() + step);
    }

    /// Force the sequence to be non-decreasing by raising any knot that
    /// falls below its predecessor
    pub fn make_monotonic(&mut self) {
        for i in 1..self.0.len() {
            if self.0[i] < self.0[i - 1] {
                self.0[i] = self.0[i - 1];
            }
        }
    }

    /// Get the multiplicity of each distinct knot value
    /// # Example
    /// ```
    /// use nurbs2d::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// let mult = knots.multiplicity();
    /// assert_eq!(mult[0].multiplicity(), 3);
    /// assert_eq!(mult[1].multiplicity(), 1);
    /// assert_eq!(mult[3].multiplicity(), 3);
    /// ```
    pub fn multiplicity(&self) -> Vec<KnotMultiplicity<T>> {
        let mut mult = vec![];

        let mut current = KnotMultiplicity::new(self.0[0], 0);
        self.0.iter().for_each(|knot| {
            if (*knot - *current.knot()).abs() > default_tolerance() {
                mult.push(current.clone());
                current = KnotMultiplicity::new(*knot, 0);
            }
            current.increment_multiplicity();
        });
        mult.push(current);

        mult
    }

    /// Multiplicity of the first knot value
    pub fn start_multiplicity(&self) -> usize {
        let tol = default_tolerance();
        self.0.iter().take_while(|k| (**k - self.first()).abs() < tol).count()
    }

    /// Multiplicity of the last knot value
    pub fn end_multiplicity(&self) -> usize {
        let tol = default_tolerance();
        self.0.iter().rev().take_while(|k| (**k - self.last()).abs() < tol).count()
    }

    /// Multiplicity of the value `u` in the vector, counted downward from
    /// the given span index
    pub fn multiplicity_at(&self, span: usize, u: T) -> usize {
        let tol = default_tolerance();
        let mut s = 0;
        let mut j = span as isize;
        while j >= 0 && (self.0[j as usize] - u).abs() <= tol {
            s += 1;
            j -= 1;
        }
        s
    }

    /// Check if the knot vector is clamped for the given degree:
    /// the first and last knot values each have multiplicity greater than
    /// the degree
    pub fn is_clamped(&self, degree: usize) -> bool {
        self.start_multiplicity() > degree && self.end_multiplicity() > degree
    }

    /// Find the knot span index by binary search, clamped to `[degree, n]`
    /// where `n` is the last valid control point index.
    ///
    /// # Example
    /// ```
    /// use nurbs2d::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// let idx = knots.find_knot_span_index(4, 2, 2.5);
    /// assert_eq!(idx, 4);
    /// ```
    pub fn find_knot_span_index(&self, n: usize, degree: usize, u: T) -> usize {
        if u > self[n + 1] - T::default_epsilon() {
            return n;
        }

        if u < self[degree] + T::default_epsilon() {
            return degree;
        }

        // binary search
        let mut low = degree;
        let mut high = n + 1;
        let mut mid = (low + high) / 2;
        while u < self[mid] || self[mid + 1] <= u {
            if u < self[mid] {
                high = mid;
            } else {
                low = mid;
            }
            let next = (low + high) / 2;
            if mid == next {
                break;
            }
            mid = next;
        }

        mid
    }

    /// Compute the `degree + 1` non-vanishing basis functions
    /// `N_{span-degree+j, degree}(u)` by the triangular Cox-de Boor
    /// recurrence (Piegl & Tiller A2.2). Each step divides only by the width
    /// of the covering knot interval; a degenerate interval contributes zero
    /// instead of propagating NaN.
    pub fn basis_functions(&self, knot_span_index: usize, u: T, degree: usize) -> Vec<T> {
        let mut basis = vec![T::zero(); degree + 1];
        let mut left = vec![T::zero(); degree + 1];
        let mut right = vec![T::zero(); degree + 1];

        basis[0] = T::one();

        for j in 1..=degree {
            left[j] = u - self[knot_span_index + 1 - j];
            right[j] = self[knot_span_index + j] - u;
            let mut saved = T::zero();

            for r in 0..j {
                let denom = right[r + 1] + left[j - r];
                let alpha = if denom.abs() > default_tolerance() {
                    basis[r] / denom
                } else {
                    T::zero()
                };
                basis[r] = saved + right[r + 1] * alpha;
                saved = left[j - r] * alpha;
            }

            basis[j] = saved;
        }

        basis
    }

    /// Compute the non-vanishing basis functions and their derivatives up to
    /// order `n` (n <= degree). Returns a 2d array of size (n+1, degree+1)
    /// whose first row holds the basis values and whose kth row holds the
    /// kth derivatives.
    pub fn derivative_basis_functions(
        &self,
        knot_span_index: usize,
        u: T,
        degree: usize,
        n: usize,
    ) -> Vec<Vec<T>> {
        let mut ndu = vec![vec![T::zero(); degree + 1]; degree + 1];
        let mut left = vec![T::zero(); degree + 1];
        let mut right = vec![T::zero(); degree + 1];

        ndu[0][0] = T::one();

        for j in 1..=degree {
            left[j] = u - self[knot_span_index + 1 - j];
            right[j] = self[knot_span_index + j] - u;

            let mut saved = T::zero();
            for r in 0..j {
                // lower triangle holds the interval widths
                ndu[j][r] = right[r + 1] + left[j - r];
                let temp = ndu[r][j - 1] / ndu[j][r];

                // upper triangle
                ndu[r][j] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            ndu[j][j] = saved;
        }

        let mut ders = vec![vec![T::zero(); degree + 1]; n + 1];
        let mut a = vec![vec![T::zero(); degree + 1]; 2];

        for j in 0..=degree {
            ders[0][j] = ndu[j][degree];
        }

        let idegree = degree as isize;
        let n = n as isize;

        for r in 0..=idegree {
            // alternate rows of a
            let mut s1 = 0;
            let mut s2 = 1;
            a[0][0] = T::one();

            for k in 1..=n {
                let mut d = T::zero();
                let rk = r - k;
                let pk = idegree - k;

                if r >= k {
                    a[s2][0] = a[s1][0] / ndu[(pk + 1) as usize][rk as usize];
                    d = a[s2][0] * ndu[rk as usize][pk as usize];
                }

                let j1 = if rk >= -1 { 1 } else { -rk };
                let j2 = if r - 1 <= pk { k - 1 } else { idegree - r };

                for j in j1..=j2 {
                    a[s2][j as usize] = (a[s1][j as usize] - a[s1][j as usize - 1])
                        / ndu[(pk + 1) as usize][(rk + j) as usize];
                    d += a[s2][j as usize] * ndu[(rk + j) as usize][pk as usize];
                }

                let uk = k as usize;
                let ur = r as usize;
                if r <= pk {
                    a[s2][uk] = -a[s1][(k - 1) as usize] / ndu[(pk + 1) as usize][ur];
                    d += a[s2][uk] * ndu[ur][pk as usize];
                }

                ders[uk][ur] = d;

                std::mem::swap(&mut s1, &mut s2);
            }
        }

        // multiply through by the degree factors p!/(p-k)!
        let mut acc = idegree;
        for k in 1..=n {
            for j in 0..=idegree {
                ders[k as usize][j as usize] *= T::from_isize(acc).unwrap();
            }
            acc *= idegree - k;
        }
        ders
    }

    /// Cast the knot vector to another floating point type
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> KnotVector<F> {
        KnotVector::new(self.0.iter().map(|v| convert(*v)).collect())
    }
}

impl<T> Index<usize> for KnotVector<T> {
    type Output = T;
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> FromIterator<T> for KnotVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::KnotVector;

    #[test]
    fn span_clamping() {
        let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
        assert_eq!(knots.find_knot_span_index(4, 2, -1.0), 2);
        assert_eq!(knots.find_knot_span_index(4, 2, 0.0), 2);
        assert_eq!(knots.find_knot_span_index(4, 2, 1.5), 3);
        assert_eq!(knots.find_knot_span_index(4, 2, 3.0), 4);
        assert_eq!(knots.find_knot_span_index(4, 2, 10.0), 4);
    }

    #[test]
    fn partition_of_unity() {
        let degree = 3;
        let knots: KnotVector<f64> =
            KnotVector::new(vec![0., 0., 0., 0., 0.5, 1., 1., 1., 1.]);
        let n = knots.len() - degree - 2;
        for i in 0..=100 {
            let u = i as f64 / 100.;
            let span = knots.find_knot_span_index(n, degree, u);
            let basis = knots.basis_functions(span, u, degree);
            assert_eq!(basis.len(), degree + 1);
            let sum: f64 = basis.iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn derivative_rows_sum_to_zero() {
        let degree = 3;
        let knots: KnotVector<f64> =
            KnotVector::new(vec![0., 0., 0., 0., 1., 2., 3., 3., 3., 3.]);
        let n = knots.len() - degree - 2;
        for i in 1..30 {
            let u = 3.0 * i as f64 / 30.;
            let span = knots.find_knot_span_index(n, degree, u);
            let ders = knots.derivative_basis_functions(span, u, degree, 2);
            let d1: f64 = ders[1].iter().sum();
            let d2: f64 = ders[2].iter().sum();
            assert_relative_eq!(d1, 0.0, epsilon = 1e-9);
            assert_relative_eq!(d2, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn uniform_constructors() {
        let open: KnotVector<f64> = KnotVector::open_uniform(4, 3);
        assert_eq!(open.to_vec(), vec![0., 0., 0., 0., 1., 1., 1., 1.]);
        assert!(open.is_clamped(3));

        let periodic: KnotVector<f64> = KnotVector::periodic_uniform(5, 3);
        assert_eq!(periodic.len(), 9);
        assert!(!periodic.is_clamped(3));
        assert_eq!(periodic.start_multiplicity(), 1);
    }

    #[test]
    fn monotonic_repair() {
        let mut knots = KnotVector::new(vec![0., 1., 0.5, 2.]);
        knots.make_monotonic();
        assert_eq!(knots.to_vec(), vec![0., 1., 1., 2.]);
    }
}
