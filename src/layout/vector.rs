use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// A point or direction in scene space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
	/// Horizontal.
	pub x: f64,
	/// Vertical.
	pub y: f64,
	/// Depth.
	pub z: f64,
}

impl Vec3 {
	/// The origin.
	pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
	/// Unit +x.
	pub const X: Self = Self::new(1.0, 0.0, 0.0);

	/// Creates a vector.
	pub const fn new(x: f64, y: f64, z: f64) -> Self {
		Self { x, y, z }
	}

	/// Euclidean length.
	pub fn length(self) -> f64 {
		self.dot(self).sqrt()
	}

	/// Dot product.
	pub fn dot(self, other: Self) -> f64 {
		self.x * other.x + self.y * other.y + self.z * other.z
	}

	/// Clamps every component into `[-limit, limit]`.
	pub fn clamp_each(self, limit: f64) -> Self {
		Self::new(
			self.x.clamp(-limit, limit),
			self.y.clamp(-limit, limit),
			self.z.clamp(-limit, limit),
		)
	}
}

impl Add for Vec3 {
	type Output = Self;
	fn add(self, rhs: Self) -> Self {
		Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
	}
}

impl Sub for Vec3 {
	type Output = Self;
	fn sub(self, rhs: Self) -> Self {
		Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
	}
}

impl Mul<f64> for Vec3 {
	type Output = Self;
	fn mul(self, rhs: f64) -> Self {
		Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
	}
}

impl Div<f64> for Vec3 {
	type Output = Self;
	fn div(self, rhs: f64) -> Self {
		Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
	}
}

impl Neg for Vec3 {
	type Output = Self;
	fn neg(self) -> Self {
		Self::new(-self.x, -self.y, -self.z)
	}
}

impl AddAssign for Vec3 {
	fn add_assign(&mut self, rhs: Self) {
		*self = *self + rhs;
	}
}

impl SubAssign for Vec3 {
	fn sub_assign(&mut self, rhs: Self) {
		*self = *self - rhs;
	}
}

impl MulAssign<f64> for Vec3 {
	fn mul_assign(&mut self, rhs: f64) {
		*self = *self * rhs;
	}
}
