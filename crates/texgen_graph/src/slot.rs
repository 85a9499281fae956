// SPDX-License-Identifier: MIT OR Apache-2.0
//! Slot definitions for node inputs/outputs.

use crate::backend::RenderTarget;
use serde::{Deserialize, Serialize};

/// Slot direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotDirection {
    /// Input slot (consumer side)
    Input,
    /// Output slot (producer side)
    Output,
}

/// Category of value that flows through a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotCategory {
    /// GPU texture (a render target owned by the producer)
    Texture,
    /// Single float
    Scalar,
    /// 2D vector
    Vector2,
    /// 4D vector
    Vector4,
}

impl SlotCategory {
    /// Get the color for this category (for UI)
    pub fn color(&self) -> [u8; 3] {
        match self {
            Self::Texture => [100, 150, 200],
            Self::Scalar => [80, 200, 80],
            Self::Vector2 => [200, 200, 80],
            Self::Vector4 => [200, 100, 200],
        }
    }

    /// Human readable name
    pub fn label(&self) -> &'static str {
        match self {
            Self::Texture => "Texture",
            Self::Scalar => "Scalar",
            Self::Vector2 => "Vector2",
            Self::Vector4 => "Vector4",
        }
    }
}

/// A declared slot on a node.
///
/// Slot declarations are fixed when a node is constructed and never change
/// afterwards. Connections refer to slots by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Slot name, unique per direction on a node
    pub name: &'static str,
    /// Value category accepted (inputs) or produced (outputs)
    pub category: SlotCategory,
}

impl Slot {
    /// Declare a slot
    pub const fn new(name: &'static str, category: SlotCategory) -> Self {
        Self { name, category }
    }
}

/// A value read from a producer's output slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotValue {
    /// Texture view (shallow copy of the producer's render target)
    Texture(RenderTarget),
    /// Scalar
    Scalar(f32),
    /// 2D vector
    Vector2([f32; 2]),
    /// 4D vector
    Vector4([f32; 4]),
}

impl SlotValue {
    /// Get the slot category for this value
    pub fn category(&self) -> SlotCategory {
        match self {
            Self::Texture(_) => SlotCategory::Texture,
            Self::Scalar(_) => SlotCategory::Scalar,
            Self::Vector2(_) => SlotCategory::Vector2,
            Self::Vector4(_) => SlotCategory::Vector4,
        }
    }
}

/// A Rust type that can be pulled out of a [`SlotValue`].
///
/// This is what lets input resolution be written once and parameterized by
/// value category: a category mismatch simply yields `None`, which the caller
/// treats like an unbound input.
pub trait InputValue: Sized + Copy {
    /// Category this type corresponds to
    const CATEGORY: SlotCategory;

    /// Extract the value if the category matches
    fn from_slot_value(value: SlotValue) -> Option<Self>;
}

impl InputValue for f32 {
    const CATEGORY: SlotCategory = SlotCategory::Scalar;

    fn from_slot_value(value: SlotValue) -> Option<Self> {
        match value {
            SlotValue::Scalar(v) => Some(v),
            _ => None,
        }
    }
}

impl InputValue for [f32; 2] {
    const CATEGORY: SlotCategory = SlotCategory::Vector2;

    fn from_slot_value(value: SlotValue) -> Option<Self> {
        match value {
            SlotValue::Vector2(v) => Some(v),
            _ => None,
        }
    }
}

impl InputValue for [f32; 4] {
    const CATEGORY: SlotCategory = SlotCategory::Vector4;

    fn from_slot_value(value: SlotValue) -> Option<Self> {
        match value {
            SlotValue::Vector4(v) => Some(v),
            _ => None,
        }
    }
}

impl InputValue for RenderTarget {
    const CATEGORY: SlotCategory = SlotCategory::Texture;

    fn from_slot_value(value: SlotValue) -> Option<Self> {
        match value {
            SlotValue::Texture(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_matching_category() {
        assert_eq!(f32::from_slot_value(SlotValue::Scalar(2.5)), Some(2.5));
        assert_eq!(
            <[f32; 2]>::from_slot_value(SlotValue::Vector2([1.0, 2.0])),
            Some([1.0, 2.0])
        );
    }

    #[test]
    fn test_extract_mismatch_is_absent() {
        assert_eq!(f32::from_slot_value(SlotValue::Vector2([1.0, 2.0])), None);
        assert_eq!(
            RenderTarget::from_slot_value(SlotValue::Scalar(1.0)),
            None
        );
        assert_eq!(<[f32; 4]>::CATEGORY, SlotValue::Vector4([0.0; 4]).category());
    }
}
