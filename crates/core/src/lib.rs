//! Core crate for restitch: drivers that apply a fixed-shape image
//! restoration model to inputs larger than, or shaped differently from,
//! the model's native input contract.
//!
//! Two drivers share one abstract dependency, the [`restore::Restorer`]
//! capability: [`tile`] splits an oversized 2-D image into overlapping
//! tiles and blends the per-tile outputs back into a seamless canvas;
//! [`volume`] walks a 3-D volume depth-first and feeds each slice to the
//! model as a 3-channel pseudo-color window.

pub mod backend;
pub mod canvas;
pub mod degrade;
pub mod restore;
pub mod task;
pub mod tile;
pub mod volume;
