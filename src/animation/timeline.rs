use tracing::warn;

use super::{Animation, AnimationConfig, AnimationTarget, Animator, AnimatorStatus};
use crate::attrs::Attributes;
use crate::ecs::Entity;
use crate::scene::{Scene, SceneError, SceneResult};

impl Scene {
	/// Queues an animation on `entity`, starting at the current scene clock.
	///
	/// Start values are captured now. Attributes without a current value jump to their
	/// target on completion. Groups can only animate `x`, `y` and `z`.
	pub fn animate(&mut self, entity: Entity, config: AnimationConfig) -> SceneResult<()> {
		self.ensure_alive(entity)?;

		let (to_attrs, on_frame) = match config.target {
			AnimationTarget::Attrs(attrs) => (attrs, None),
			AnimationTarget::Frame(on_frame) => (Attributes::new(), Some(on_frame)),
		};
		if self.renderable(entity).is_none() && to_attrs.keys().any(|name| !matches!(name.as_str(), "x" | "y" | "z")) {
			return Err(SceneError::NotAShape(entity));
		}

		let from_attrs = to_attrs
			.keys()
			.filter_map(|name| {
				let current = self
					.position_attribute(entity, name)
					.or_else(|| self.get_attribute(entity, name).cloned())?;
				Some((name.clone(), current))
			})
			.collect();

		let animation = Animation {
			from_attrs,
			to_attrs,
			on_frame,
			duration: config.duration,
			easing: config.easing,
			delay: config.delay,
			start_time: self.clock,
			pause_time: None,
			repeat: config.repeat,
			callback: config.callback,
		};

		if !self.world.has::<Animator>(entity) {
			self.world.add(entity, Animator::default());
		}
		let animator = self
			.world
			.get_mut::<Animator>(entity)
			.unwrap_or_else(|| panic!("Entity {entity} has no Animator."));
		animator.merge_animation_attrs(&animation);
		animator.animations.push(animation);
		if animator.status == AnimatorStatus::Stopped {
			animator.status = AnimatorStatus::Running;
		}
		Ok(())
	}

	pub fn animation_status(&self, entity: Entity) -> AnimatorStatus {
		self.world
			.get::<Animator>(entity)
			.map_or(AnimatorStatus::Stopped, Animator::status)
	}

	/// Freezes every animation of `entity` at the current clock.
	pub fn pause_animation(&mut self, entity: Entity) {
		let now = self.clock;
		let Some(animator) = self.world.get_mut::<Animator>(entity) else {
			return;
		};
		if animator.status != AnimatorStatus::Running {
			return;
		}
		animator.status = AnimatorStatus::Paused;
		for animation in &mut animator.animations {
			animation.pause_time = Some(now);
		}
	}

	/// Continues paused animations where they left off.
	pub fn resume_animation(&mut self, entity: Entity) {
		let now = self.clock;
		let Some(animator) = self.world.get_mut::<Animator>(entity) else {
			return;
		};
		if animator.status != AnimatorStatus::Paused {
			return;
		}
		animator.status = AnimatorStatus::Running;
		for animation in &mut animator.animations {
			if let Some(paused_at) = animation.pause_time.take() {
				animation.start_time += now - paused_at;
			}
		}
	}

	/// Drops every animation of `entity`. With `to_end`, each one first jumps to its final
	/// frame and runs its callback.
	pub fn stop_animation(&mut self, entity: Entity, to_end: bool) {
		let Some(animator) = self.world.remove::<Animator>(entity) else {
			return;
		};
		if !to_end {
			return;
		}
		for mut animation in animator.animations {
			let attrs = animation.frame(1.);
			self.apply_animated(entity, attrs);
			if let Some(callback) = animation.callback.take() {
				callback();
			}
		}
	}

	/// Advances every running animation to `now` (milliseconds) and sets the scene clock.
	///
	/// Completed animations write their exact target, run their callback and leave the queue.
	/// An entity whose queue empties loses its [`Animator`].
	pub fn update_animations(&mut self, now: f64) {
		self.clock = now;

		let animating: Vec<Entity> = self.world.entities_with::<Animator>().to_vec();
		for entity in animating {
			if self.animation_status(entity) != AnimatorStatus::Running {
				continue;
			}
			let Some(mut animator) = self.world.remove::<Animator>(entity) else {
				continue;
			};

			let mut remaining = Vec::with_capacity(animator.animations.len());
			for mut animation in animator.animations.drain(..) {
				let Some((ratio, done)) = animation.progress(now) else {
					remaining.push(animation);
					continue;
				};

				let attrs = animation.frame(ratio);
				self.apply_animated(entity, attrs);

				if done {
					if let Some(callback) = animation.callback.take() {
						callback();
					}
				} else {
					remaining.push(animation);
				}
			}

			if !remaining.is_empty() {
				animator.animations = remaining;
				self.world.add(entity, animator);
			}
		}
	}

	fn apply_animated(&mut self, entity: Entity, attrs: Attributes) {
		for (name, value) in attrs {
			if let Err(err) = self.set_attribute(entity, &name, value) {
				warn!("Animation of {entity} could not write {name:?}: {err}");
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;

	use super::*;
	use crate::animation::Easing;
	use crate::attrs;
	use crate::attrs::AttrValue;
	use crate::math::assert_close;
	use crate::scene::NodeConfig;

	fn circle(scene: &mut Scene) -> Entity {
		scene
			.spawn_shape(NodeConfig::shape("circle").attrs(attrs! { "r" => 10., "fill" => "#000000" }))
			.unwrap()
	}

	fn number(scene: &Scene, entity: Entity, name: &str) -> f32 {
		scene.get_attribute(entity, name).and_then(AttrValue::as_number).unwrap()
	}

	#[test]
	fn interpolates_then_completes() {
		let mut scene = Scene::new();
		let shape = circle(&mut scene);
		let done = Arc::new(AtomicUsize::new(0));
		let counter = done.clone();
		scene
			.animate(
				shape,
				AnimationConfig::to(attrs! { "r" => 20., "x" => 100., "fill" => "#ffffff" })
					.duration(1000.)
					.callback(move || {
						counter.fetch_add(1, Ordering::SeqCst);
					}),
			)
			.unwrap();
		assert_eq!(scene.animation_status(shape), AnimatorStatus::Running);

		scene.update_animations(500.);
		assert_close(number(&scene, shape, "r"), 15.);
		assert_close(scene.get_local_position(shape).x, 50.);
		assert_eq!(scene.get_attribute(shape, "fill"), Some(&AttrValue::from("#808080")));

		scene.update_animations(1200.);
		assert_close(number(&scene, shape, "r"), 20.);
		assert_close(scene.get_local_position(shape).x, 100.);
		assert_eq!(done.load(Ordering::SeqCst), 1);
		assert_eq!(scene.animation_status(shape), AnimatorStatus::Stopped);
		assert!(!scene.world.has::<Animator>(shape));
	}

	#[test]
	fn pause_shifts_the_timeline() {
		let mut scene = Scene::new();
		let shape = circle(&mut scene);
		scene
			.animate(shape, AnimationConfig::to(attrs! { "r" => 110. }).duration(100.))
			.unwrap();

		scene.update_animations(50.);
		scene.pause_animation(shape);
		assert_eq!(scene.animation_status(shape), AnimatorStatus::Paused);
		scene.update_animations(500.);
		assert_close(number(&scene, shape, "r"), 60.);

		scene.resume_animation(shape);
		scene.update_animations(525.);
		assert_close(number(&scene, shape, "r"), 85.);
	}

	#[test]
	fn delay_and_zero_duration() {
		let mut scene = Scene::new();
		let shape = circle(&mut scene);
		scene
			.animate(shape, AnimationConfig::to(attrs! { "r" => 30. }).duration(0.).delay(100.))
			.unwrap();

		scene.update_animations(50.);
		assert_close(number(&scene, shape, "r"), 10.);
		scene.update_animations(100.);
		assert_close(number(&scene, shape, "r"), 30.);
		assert_eq!(scene.animation_status(shape), AnimatorStatus::Stopped);
	}

	#[test]
	fn frame_function_and_stop_to_end() {
		let mut scene = Scene::new();
		let shape = circle(&mut scene);
		scene
			.animate(
				shape,
				AnimationConfig::on_frame(|ratio| attrs! { "opacity" => ratio })
					.duration(100.)
					.easing(Easing::QuadIn),
			)
			.unwrap();

		scene.update_animations(50.);
		assert_close(number(&scene, shape, "opacity"), 0.25);

		scene.stop_animation(shape, true);
		assert_close(number(&scene, shape, "opacity"), 1.);
		assert_eq!(scene.animation_status(shape), AnimatorStatus::Stopped);
	}

	#[test]
	fn repeat_never_finishes() {
		let mut scene = Scene::new();
		let shape = circle(&mut scene);
		scene
			.animate(shape, AnimationConfig::to(attrs! { "r" => 20. }).duration(100.).repeat(true))
			.unwrap();

		scene.update_animations(1050.);
		assert_close(number(&scene, shape, "r"), 15.);
		assert_eq!(scene.animation_status(shape), AnimatorStatus::Running);
	}

	#[test]
	fn groups_only_animate_position() {
		let mut scene = Scene::new();
		let group = scene.spawn_group(NodeConfig::group());
		assert_eq!(
			scene.animate(group, AnimationConfig::to(attrs! { "r" => 20. })),
			Err(SceneError::NotAShape(group))
		);

		scene
			.animate(group, AnimationConfig::to(attrs! { "y" => 40. }).duration(100.))
			.unwrap();
		scene.update_animations(100.);
		assert_close(scene.get_local_position(group).y, 40.);
	}
}
