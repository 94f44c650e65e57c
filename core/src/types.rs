use std::ops::Add;

use nalgebra::{SMatrix, Vector2, Vector3, Vector4};

pub type Mat4x4f = SMatrix<f32, 4, 4>;

pub type Vec2<T> = Vector2<T>;
pub type Vec3<T> = Vector3<T>;
pub type Vec4<T> = Vector4<T>;
pub type Vec2f = Vec2<f32>;
pub type Vec3f = Vec3<f32>;
pub type Vec4f = Vec4<f32>;

pub type Point3<T> = nalgebra::Point3<T>;
pub type Size = nalgebra::Point2<u32>;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct BoundBox {
    val: Option<(Vec3f, Vec3f)>,
}

impl BoundBox {
    pub fn new(min: Vec3f, max: Vec3f) -> Self {
        Self {
            val: Some((min.inf(&max), min.sup(&max))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.val.is_none()
    }

    pub fn min(&self) -> Option<&Vec3f> {
        self.val.as_ref().map(|v| &v.0)
    }

    pub fn max(&self) -> Option<&Vec3f> {
        self.val.as_ref().map(|v| &v.1)
    }

    pub fn size(&self) -> Vec3f {
        match &self.val {
            Some(v) => (v.1 - v.0).abs(),
            None => Vec3f::zeros(),
        }
    }
}

impl Add<&Vec3f> for &BoundBox {
    type Output = BoundBox;

    fn add(self, rhs: &Vec3f) -> Self::Output {
        if let Some(val) = self.val {
            let min = val.0.inf(rhs);
            let max = val.1.sup(rhs);

            BoundBox::new(min, max)
        } else {
            BoundBox::new(*rhs, *rhs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_box_grows_with_points() {
        let mut aabb = BoundBox::default();
        assert!(aabb.is_empty());
        assert_eq!(aabb.size(), Vec3f::zeros());

        for p in [
            Vec3f::new(1.0, -2.0, 0.5),
            Vec3f::new(-1.0, 3.0, 0.0),
            Vec3f::new(0.0, 0.0, -4.0),
        ] {
            aabb = &aabb + &p;
        }

        assert_eq!(aabb.min(), Some(&Vec3f::new(-1.0, -2.0, -4.0)));
        assert_eq!(aabb.max(), Some(&Vec3f::new(1.0, 3.0, 0.5)));
        assert_eq!(aabb.size(), Vec3f::new(2.0, 5.0, 4.5));
    }

    #[test]
    fn bound_box_orders_corners() {
        let aabb = BoundBox::new(Vec3f::new(1.0, 1.0, 1.0), Vec3f::new(-1.0, 2.0, 0.0));
        assert_eq!(aabb.min(), Some(&Vec3f::new(-1.0, 1.0, 0.0)));
        assert_eq!(aabb.max(), Some(&Vec3f::new(1.0, 2.0, 1.0)));
    }
}
