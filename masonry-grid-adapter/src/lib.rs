//! Adapter utilities for the `masonry-grid` crate.
//!
//! The `masonry-grid` crate is UI-agnostic: it decides where every item view ends up and for
//! how long a view is in transition, but never interpolates. This crate provides small,
//! framework-neutral helpers commonly needed by adapters:
//!
//! - Rect tweens for animating views between layout positions
//! - A controller that tracks what was drawn and yields per-frame rects
//!
//! This crate is intentionally framework-agnostic (no DOM/egui bindings).
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod controller;
mod tween;

#[cfg(test)]
mod tests;

pub use controller::{Controller, DrawItem};
pub use tween::RectTween;
