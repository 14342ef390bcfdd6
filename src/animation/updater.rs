use glam::Vec2;

use crate::attrs::AttrValue;

/// Interpolates one attribute between its start and target value.
pub trait AttrUpdater {
	/// Whether this updater handles the attribute.
	fn matches(&self, name: &str, from: &AttrValue, to: &AttrValue) -> bool;

	/// Value at eased progress `ratio`. `ratio` reaches exactly `1.` only on completion.
	fn interpolate(&self, from: &AttrValue, to: &AttrValue, ratio: f32) -> AttrValue;
}

/// Consulted in order, the first match wins.
const UPDATERS: &[&dyn AttrUpdater] = &[&ColorUpdater, &NumericUpdater];

pub(crate) fn interpolate(name: &str, from: &AttrValue, to: &AttrValue, ratio: f32) -> AttrValue {
	UPDATERS
		.iter()
		.find(|updater| updater.matches(name, from, to))
		.map_or_else(|| step(from, to, ratio), |updater| updater.interpolate(from, to, ratio))
}

fn step(from: &AttrValue, to: &AttrValue, ratio: f32) -> AttrValue {
	if ratio >= 1. {
		to.clone()
	} else {
		from.clone()
	}
}

/// Blends `#rgb`/`#rrggbb` colors channel by channel. Gradient targets such as
/// `l(0) 0:#fff 1:#000` cannot be blended and switch over on completion.
pub struct ColorUpdater;

pub(crate) fn is_gradient(value: &str) -> bool {
	let value = value.trim_start();
	["l(", "r(", "p("].iter().any(|prefix| value.starts_with(prefix))
}

fn parse_hex(value: &str) -> Option<[u8; 3]> {
	let hex = value.trim().strip_prefix('#')?;
	if !hex.is_ascii() {
		return None;
	}
	let channel = |s: &str| u8::from_str_radix(s, 16).ok();
	match hex.len() {
		3 => {
			let mut rgb = [0; 3];
			for (out, i) in rgb.iter_mut().zip(0..3) {
				let c = channel(&hex[i..i + 1])?;
				*out = c * 17;
			}
			Some(rgb)
		}
		6 => Some([channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?]),
		_ => None,
	}
}

impl AttrUpdater for ColorUpdater {
	fn matches(&self, _name: &str, _from: &AttrValue, to: &AttrValue) -> bool {
		to.as_str().map_or(false, |to| is_gradient(to) || parse_hex(to).is_some())
	}

	fn interpolate(&self, from: &AttrValue, to: &AttrValue, ratio: f32) -> AttrValue {
		let from_rgb = from.as_str().and_then(parse_hex);
		let to_rgb = to.as_str().and_then(parse_hex);
		let (Some(from_rgb), Some(to_rgb)) = (from_rgb, to_rgb) else {
			return step(from, to, ratio);
		};

		let mut out = [0u8; 3];
		for ((out, a), b) in out.iter_mut().zip(from_rgb).zip(to_rgb) {
			*out = lerp(a as f32, b as f32, ratio).round().clamp(0., 255.) as u8;
		}
		AttrValue::String(format!("#{:02x}{:02x}{:02x}", out[0], out[1], out[2]))
	}
}

/// Linear interpolation of numbers, vectors and equally long point lists. Anything else
/// switches over on completion.
pub struct NumericUpdater;

impl AttrUpdater for NumericUpdater {
	fn matches(&self, _name: &str, _from: &AttrValue, _to: &AttrValue) -> bool {
		true
	}

	fn interpolate(&self, from: &AttrValue, to: &AttrValue, ratio: f32) -> AttrValue {
		match (from, to) {
			(AttrValue::Number(a), AttrValue::Number(b)) => AttrValue::Number(lerp(*a, *b, ratio)),
			(AttrValue::Vec2(a), AttrValue::Vec2(b)) => AttrValue::Vec2(a.lerp(*b, ratio)),
			(AttrValue::Points(a), AttrValue::Points(b)) if a.len() == b.len() => AttrValue::Points(
				a.iter()
					.zip(b)
					.map(|(a, b)| a.lerp(*b, ratio))
					.collect::<Vec<Vec2>>(),
			),
			_ => step(from, to, ratio),
		}
	}
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
	a + (b - a) * t
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn numbers_and_vectors() {
		assert_eq!(interpolate("r", &AttrValue::Number(10.), &AttrValue::Number(20.), 0.5), AttrValue::Number(15.));
		assert_eq!(
			interpolate("anchor", &[0., 0.].into(), &[1., 2.].into(), 0.5),
			AttrValue::Vec2(Vec2::new(0.5, 1.))
		);
		assert_eq!(
			interpolate("points", &vec![[0., 0.]].into(), &vec![[0., 0.], [1., 1.]].into(), 0.5),
			AttrValue::from(vec![[0., 0.]])
		);
	}

	#[test]
	fn hex_colors_blend() {
		assert_eq!(
			interpolate("fill", &"#000".into(), &"#ffffff".into(), 0.5),
			AttrValue::from("#808080")
		);
		assert_eq!(parse_hex("#1a2B3c"), Some([0x1a, 0x2b, 0x3c]));
		assert_eq!(parse_hex("red"), None);
	}

	#[test]
	fn gradients_switch_on_completion() {
		let from = AttrValue::from("#ff0000");
		let to = AttrValue::from("l(0) 0:#ffffff 1:#000000");
		assert!(ColorUpdater.matches("fill", &from, &to));
		assert_eq!(interpolate("fill", &from, &to, 0.9), from);
		assert_eq!(interpolate("fill", &from, &to, 1.), to);
	}
}
