use nalgebra::{Point2, Vector2};
use simba::scalar::SupersetOf;

use crate::misc::FloatingPoint;

/// An axis-aligned bounding box in the plane.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox<T: FloatingPoint> {
    min: Point2<T>,
    max: Point2<T>,
}

impl<T: FloatingPoint> BoundingBox<T> {
    /// Create a new bounding box from a minimum and maximum point.
    pub fn new(min: Point2<T>, max: Point2<T>) -> Self {
        Self {
            min: Point2::new(min.x.min(max.x), min.y.min(max.y)),
            max: Point2::new(min.x.max(max.x), min.y.max(max.y)),
        }
    }

    /// Create a new bounding box from a point iterator.
    pub fn new_with_points<I: IntoIterator<Item = Point2<T>>>(iter: I) -> Self {
        let huge = T::max_value().unwrap();
        let mut min = Point2::new(huge, huge);
        let mut max = Point2::new(-huge, -huge);
        for point in iter {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }
        Self { min, max }
    }

    pub fn min(&self) -> &Point2<T> {
        &self.min
    }

    pub fn max(&self) -> &Point2<T> {
        &self.max
    }

    pub fn center(&self) -> Point2<T> {
        Point2::from((self.min.coords + self.max.coords) / T::from_usize(2).unwrap())
    }

    pub fn size(&self) -> Vector2<T> {
        self.max - self.min
    }

    /// Grow the box to also cover another box.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Check if the bounding box contains a point.
    /// # Examples
    /// ```
    /// use nalgebra::Point2;
    /// use nurbs2d::prelude::BoundingBox;
    /// let bb = BoundingBox::new(Point2::new(0., 0.), Point2::new(1., 1.));
    /// assert!(bb.contains(&Point2::new(0.5, 0.5)));
    /// assert!(bb.contains(&Point2::new(0., 1.)));
    /// assert!(!bb.contains(&Point2::new(-1e-8, 0.5)));
    /// ```
    pub fn contains(&self, point: &Point2<T>) -> bool {
        self.min.x <= point.x
            && point.x <= self.max.x
            && self.min.y <= point.y
            && point.y <= self.max.y
    }

    /// Cast the bounding box to another floating point type.
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> BoundingBox<F> {
        BoundingBox {
            min: self.min.cast(),
            max: self.max.cast(),
        }
    }
}

impl<T: FloatingPoint> FromIterator<Point2<T>> for BoundingBox<T> {
    fn from_iter<I: IntoIterator<Item = Point2<T>>>(iter: I) -> Self {
        Self::new_with_points(iter)
    }
}
