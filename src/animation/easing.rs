use std::f32::consts::{FRAC_PI_2, PI};

/// Timing curve mapping elapsed fraction to progress, both in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Easing {
	#[default]
	Linear,
	QuadIn,
	QuadOut,
	QuadInOut,
	CubicIn,
	CubicOut,
	CubicInOut,
	SinIn,
	SinOut,
	SinInOut,
	ExpIn,
	ExpOut,
	BounceOut,
}

impl Easing {
	/// Looks an easing up by name, with or without the `ease` prefix and ignoring case,
	/// so `"easeCubicInOut"` and `"cubicinout"` both name [`Easing::CubicInOut`].
	pub fn from_name(name: &str) -> Option<Self> {
		let name = name.to_ascii_lowercase();
		let name = name.strip_prefix("ease").unwrap_or(&name);
		Some(match name {
			"linear" => Easing::Linear,
			"quadin" => Easing::QuadIn,
			"quadout" => Easing::QuadOut,
			"quadinout" | "quad" => Easing::QuadInOut,
			"cubicin" => Easing::CubicIn,
			"cubicout" => Easing::CubicOut,
			"cubicinout" | "cubic" => Easing::CubicInOut,
			"sinin" => Easing::SinIn,
			"sinout" => Easing::SinOut,
			"sininout" | "sin" => Easing::SinInOut,
			"expin" => Easing::ExpIn,
			"expout" => Easing::ExpOut,
			"bounceout" | "bounce" => Easing::BounceOut,
			_ => return None,
		})
	}

	/// Evaluates the curve at `t`, clamped to `[0, 1]`.
	pub fn apply(self, t: f32) -> f32 {
		let t = t.clamp(0., 1.);
		match self {
			Easing::Linear => t,
			Easing::QuadIn => t * t,
			Easing::QuadOut => 1. - (1. - t) * (1. - t),
			Easing::QuadInOut => {
				if t < 0.5 {
					2. * t * t
				} else {
					1. - (-2. * t + 2.).powi(2) / 2.
				}
			}
			Easing::CubicIn => t * t * t,
			Easing::CubicOut => 1. - (1. - t).powi(3),
			Easing::CubicInOut => {
				if t < 0.5 {
					4. * t * t * t
				} else {
					1. - (-2. * t + 2.).powi(3) / 2.
				}
			}
			Easing::SinIn => 1. - (t * FRAC_PI_2).cos(),
			Easing::SinOut => (t * FRAC_PI_2).sin(),
			Easing::SinInOut => -(PI * t).cos() / 2. + 0.5,
			Easing::ExpIn => {
				if t == 0. {
					0.
				} else {
					2f32.powf(10. * t - 10.)
				}
			}
			Easing::ExpOut => {
				if t == 1. {
					1.
				} else {
					1. - 2f32.powf(-10. * t)
				}
			}
			Easing::BounceOut => bounce_out(t),
		}
	}
}

fn bounce_out(t: f32) -> f32 {
	const N: f32 = 7.5625;
	const D: f32 = 2.75;

	if t < 1. / D {
		N * t * t
	} else if t < 2. / D {
		let t = t - 1.5 / D;
		N * t * t + 0.75
	} else if t < 2.5 / D {
		let t = t - 2.25 / D;
		N * t * t + 0.9375
	} else {
		let t = t - 2.625 / D;
		N * t * t + 0.984375
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::math::assert_close;

	#[test]
	fn endpoints_are_fixed() {
		let all = [
			Easing::Linear,
			Easing::QuadIn,
			Easing::QuadOut,
			Easing::QuadInOut,
			Easing::CubicIn,
			Easing::CubicOut,
			Easing::CubicInOut,
			Easing::SinIn,
			Easing::SinOut,
			Easing::SinInOut,
			Easing::ExpIn,
			Easing::ExpOut,
			Easing::BounceOut,
		];
		for easing in all {
			assert_close(easing.apply(0.), 0.);
			assert_close(easing.apply(1.), 1.);
			assert_close(easing.apply(2.), 1.);
		}
	}

	#[test]
	fn names() {
		assert_eq!(Easing::from_name("easeCubicInOut"), Some(Easing::CubicInOut));
		assert_eq!(Easing::from_name("linear"), Some(Easing::Linear));
		assert_eq!(Easing::from_name("easeBounce"), Some(Easing::BounceOut));
		assert_eq!(Easing::from_name("wobble"), None);
	}

	#[test]
	fn midpoints() {
		assert_close(Easing::Linear.apply(0.25), 0.25);
		assert_close(Easing::QuadIn.apply(0.5), 0.25);
		assert_close(Easing::QuadInOut.apply(0.5), 0.5);
		assert_close(Easing::CubicOut.apply(0.5), 0.875);
	}
}
