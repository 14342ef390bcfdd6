//! Attribute animation. Each animating entity carries an [`Animator`] holding its queue of
//! [`Animation`] records, driven by `Scene::update_animations` once per frame.

mod easing;
mod timeline;
mod updater;

use crate::attrs::Attributes;

pub use easing::Easing;
pub use updater::{AttrUpdater, ColorUpdater, NumericUpdater};

/// Computes the attributes to write at an eased progress ratio.
pub type FrameFn = Box<dyn FnMut(f32) -> Attributes + Send + Sync>;
/// Run once when a non-repeating animation completes.
pub type Callback = Box<dyn FnOnce() + Send + Sync>;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AnimatorStatus {
	#[default]
	Running,
	Paused,
	/// No animation left. Entities in this state carry no [`Animator`].
	Stopped,
}

/// What an animation drives.
pub enum AnimationTarget {
	/// Interpolate from the values current at `animate` time to these.
	Attrs(Attributes),
	/// Ask a function for the attributes of every frame.
	Frame(FrameFn),
}

/// Parameters of one `animate` call. Times are in milliseconds.
pub struct AnimationConfig {
	pub(crate) target: AnimationTarget,
	pub(crate) duration: f64,
	pub(crate) easing: Easing,
	pub(crate) delay: f64,
	pub(crate) repeat: bool,
	pub(crate) callback: Option<Callback>,
}

impl AnimationConfig {
	pub const DEFAULT_DURATION: f64 = 500.;

	fn new(target: AnimationTarget) -> Self {
		Self {
			target,
			duration: Self::DEFAULT_DURATION,
			easing: Easing::default(),
			delay: 0.,
			repeat: false,
			callback: None,
		}
	}

	pub fn to(attrs: Attributes) -> Self {
		Self::new(AnimationTarget::Attrs(attrs))
	}

	pub fn on_frame(on_frame: impl FnMut(f32) -> Attributes + Send + Sync + 'static) -> Self {
		Self::new(AnimationTarget::Frame(Box::new(on_frame)))
	}

	pub fn duration(mut self, duration: f64) -> Self {
		self.duration = duration.max(0.);
		self
	}

	pub fn easing(mut self, easing: Easing) -> Self {
		self.easing = easing;
		self
	}

	pub fn delay(mut self, delay: f64) -> Self {
		self.delay = delay.max(0.);
		self
	}

	/// Loop forever. Repeating animations never complete on their own.
	pub fn repeat(mut self, repeat: bool) -> Self {
		self.repeat = repeat;
		self
	}

	pub fn callback(mut self, callback: impl FnOnce() + Send + Sync + 'static) -> Self {
		self.callback = Some(Box::new(callback));
		self
	}
}

/// One queued animation of an entity.
pub struct Animation {
	pub(crate) from_attrs: Attributes,
	pub(crate) to_attrs: Attributes,
	pub(crate) on_frame: Option<FrameFn>,
	pub(crate) duration: f64,
	pub(crate) easing: Easing,
	pub(crate) delay: f64,
	pub(crate) start_time: f64,
	pub(crate) pause_time: Option<f64>,
	pub(crate) repeat: bool,
	pub(crate) callback: Option<Callback>,
}

impl Animation {
	pub fn from_attrs(&self) -> &Attributes {
		&self.from_attrs
	}

	pub fn to_attrs(&self) -> &Attributes {
		&self.to_attrs
	}

	pub fn start_time(&self) -> f64 {
		self.start_time
	}

	/// Eased progress at `now`, and whether the animation is complete.
	/// `None` while the delay has not elapsed.
	pub(crate) fn progress(&self, now: f64) -> Option<(f32, bool)> {
		let start = self.start_time + self.delay;
		if now < start {
			return None;
		}
		if self.duration <= 0. {
			return Some((1., !self.repeat));
		}

		let elapsed = now - start;
		if self.repeat {
			let fraction = (elapsed % self.duration) / self.duration;
			return Some((self.easing.apply(fraction as f32), false));
		}
		let fraction = elapsed / self.duration;
		if fraction >= 1. {
			Some((1., true))
		} else {
			Some((self.easing.apply(fraction as f32), false))
		}
	}

	/// Attributes to write at eased progress `ratio`.
	pub(crate) fn frame(&mut self, ratio: f32) -> Attributes {
		if let Some(on_frame) = &mut self.on_frame {
			return on_frame(ratio);
		}
		if ratio >= 1. {
			return self.to_attrs.clone();
		}
		self.to_attrs
			.iter()
			.filter_map(|(name, to)| {
				let from = self.from_attrs.get(name)?;
				Some((name.clone(), updater::interpolate(name, from, to, ratio)))
			})
			.collect()
	}
}

/// Animation queue of one entity.
#[derive(Default)]
pub struct Animator {
	pub(crate) status: AnimatorStatus,
	pub(crate) animations: Vec<Animation>,
}

impl Animator {
	pub fn status(&self) -> AnimatorStatus {
		self.status
	}

	pub fn animations(&self) -> &[Animation] {
		&self.animations
	}

	/// Resolves conflicts with an animation about to be queued: where its time window overlaps
	/// an already queued one, the newer animation takes over the attributes they share.
	pub fn merge_animation_attrs(&mut self, animation: &Animation) {
		for item in &mut self.animations {
			let overlaps = animation.start_time + animation.delay < item.start_time + item.delay + item.duration
				&& animation.duration > item.delay;
			if !overlaps {
				continue;
			}
			for name in animation.to_attrs.keys() {
				item.to_attrs.remove(name);
				item.from_attrs.remove(name);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::attrs;
	use crate::math::assert_close;

	fn record(start_time: f64, delay: f64, duration: f64, to_attrs: Attributes) -> Animation {
		Animation {
			from_attrs: to_attrs.clone(),
			to_attrs,
			on_frame: None,
			duration,
			easing: Easing::Linear,
			delay,
			start_time,
			pause_time: None,
			repeat: false,
			callback: None,
		}
	}

	#[test]
	fn progress_respects_delay() {
		let animation = record(100., 50., 200., Attributes::new());
		assert_eq!(animation.progress(120.), None);

		let (ratio, done) = animation.progress(250.).unwrap();
		assert_close(ratio, 0.5);
		assert!(!done);
		assert_eq!(animation.progress(350.), Some((1., true)));
	}

	#[test]
	fn repeat_wraps() {
		let mut animation = record(0., 0., 100., Attributes::new());
		animation.repeat = true;
		let (ratio, done) = animation.progress(325.).unwrap();
		assert_close(ratio, 0.25);
		assert!(!done);
	}

	#[test]
	fn newer_animation_takes_shared_attrs() {
		let mut animator = Animator::default();
		animator
			.animations
			.push(record(0., 0., 500., attrs! { "x" => 10., "fill" => "#fff" }));
		animator.merge_animation_attrs(&record(100., 0., 500., attrs! { "x" => 20. }));

		let older = &animator.animations[0];
		assert!(!older.to_attrs().contains_key("x"));
		assert!(!older.from_attrs().contains_key("x"));
		assert!(older.to_attrs().contains_key("fill"));
	}

	#[test]
	fn later_animation_keeps_attrs_apart() {
		let mut animator = Animator::default();
		animator.animations.push(record(0., 0., 500., attrs! { "x" => 10. }));
		animator.merge_animation_attrs(&record(600., 0., 500., attrs! { "x" => 20. }));
		assert!(animator.animations[0].to_attrs().contains_key("x"));
	}
}
