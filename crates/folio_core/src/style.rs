//! Presentational style values mutated by animations
//!
//! Only transform and opacity are animated; layout never changes as a result
//! of scrolling.

use serde::{Deserialize, Serialize};

/// An animatable style property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    /// Horizontal translation in pixels
    X,
    /// Vertical translation in pixels
    Y,
    /// Horizontal translation as a percentage of the element width
    XPercent,
    /// Vertical translation as a percentage of the element height
    YPercent,
    Opacity,
    /// Uniform scale factor
    Scale,
    /// 2D rotation in degrees
    Rotation,
    /// 3D rotation around the X axis in degrees
    RotateX,
    /// 3D rotation around the Y axis in degrees
    RotateY,
}

impl Property {
    pub const ALL: [Property; 9] = [
        Property::X,
        Property::Y,
        Property::XPercent,
        Property::YPercent,
        Property::Opacity,
        Property::Scale,
        Property::Rotation,
        Property::RotateX,
        Property::RotateY,
    ];

    /// Everything except opacity is a transform
    pub fn is_transform(self) -> bool {
        !matches!(self, Property::Opacity)
    }

    /// Value of the property on an untouched element
    pub fn identity(self) -> f32 {
        match self {
            Property::Opacity | Property::Scale => 1.0,
            _ => 0.0,
        }
    }
}

/// Current presentational state of an element
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisualStyle {
    pub x: f32,
    pub y: f32,
    pub x_percent: f32,
    pub y_percent: f32,
    pub opacity: f32,
    pub scale: f32,
    pub rotation: f32,
    pub rotate_x: f32,
    pub rotate_y: f32,
}

impl Default for VisualStyle {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            x_percent: 0.0,
            y_percent: 0.0,
            opacity: 1.0,
            scale: 1.0,
            rotation: 0.0,
            rotate_x: 0.0,
            rotate_y: 0.0,
        }
    }
}

impl VisualStyle {
    pub fn get(&self, property: Property) -> f32 {
        match property {
            Property::X => self.x,
            Property::Y => self.y,
            Property::XPercent => self.x_percent,
            Property::YPercent => self.y_percent,
            Property::Opacity => self.opacity,
            Property::Scale => self.scale,
            Property::Rotation => self.rotation,
            Property::RotateX => self.rotate_x,
            Property::RotateY => self.rotate_y,
        }
    }

    pub fn set(&mut self, property: Property, value: f32) {
        let slot = match property {
            Property::X => &mut self.x,
            Property::Y => &mut self.y,
            Property::XPercent => &mut self.x_percent,
            Property::YPercent => &mut self.y_percent,
            Property::Opacity => &mut self.opacity,
            Property::Scale => &mut self.scale,
            Property::Rotation => &mut self.rotation,
            Property::RotateX => &mut self.rotate_x,
            Property::RotateY => &mut self.rotate_y,
        };
        *slot = value;
    }
}

/// A sparse set of property values, used for tween `from`/`to` states
///
/// Deserializes from a table such as `{ y = 50, opacity = 0 }`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Props {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_percent: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_percent: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate_y: Option<f32>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: Property) -> Option<f32> {
        match property {
            Property::X => self.x,
            Property::Y => self.y,
            Property::XPercent => self.x_percent,
            Property::YPercent => self.y_percent,
            Property::Opacity => self.opacity,
            Property::Scale => self.scale,
            Property::Rotation => self.rotation,
            Property::RotateX => self.rotate_x,
            Property::RotateY => self.rotate_y,
        }
    }

    pub fn set(&mut self, property: Property, value: Option<f32>) {
        let slot = match property {
            Property::X => &mut self.x,
            Property::Y => &mut self.y,
            Property::XPercent => &mut self.x_percent,
            Property::YPercent => &mut self.y_percent,
            Property::Opacity => &mut self.opacity,
            Property::Scale => &mut self.scale,
            Property::Rotation => &mut self.rotation,
            Property::RotateX => &mut self.rotate_x,
            Property::RotateY => &mut self.rotate_y,
        };
        *slot = value;
    }

    /// Builder-style setter
    pub fn with(mut self, property: Property, value: f32) -> Self {
        self.set(property, Some(value));
        self
    }

    pub fn x(self, v: f32) -> Self {
        self.with(Property::X, v)
    }

    pub fn y(self, v: f32) -> Self {
        self.with(Property::Y, v)
    }

    pub fn y_percent(self, v: f32) -> Self {
        self.with(Property::YPercent, v)
    }

    pub fn opacity(self, v: f32) -> Self {
        self.with(Property::Opacity, v)
    }

    pub fn scale(self, v: f32) -> Self {
        self.with(Property::Scale, v)
    }

    pub fn rotation(self, v: f32) -> Self {
        self.with(Property::Rotation, v)
    }

    pub fn rotate_x(self, v: f32) -> Self {
        self.with(Property::RotateX, v)
    }

    /// Iterate over the properties that are set, in [`Property::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (Property, f32)> + '_ {
        Property::ALL
            .iter()
            .filter_map(move |&p| self.get(p).map(|v| (p, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Copy with every transform property removed
    pub fn opacity_only(&self) -> Self {
        Self {
            opacity: self.opacity,
            ..Self::default()
        }
    }

    /// True if any property set here is a transform
    pub fn has_transform(&self) -> bool {
        self.iter().any(|(p, _)| p.is_transform())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_props_iter_in_declaration_order() {
        let props = Props::new().opacity(0.0).y(50.0);
        let got: Vec<_> = props.iter().collect();
        assert_eq!(got, vec![(Property::Y, 50.0), (Property::Opacity, 0.0)]);
    }

    #[test]
    fn test_opacity_only_strips_transforms() {
        let props = Props::new().y(100.0).rotate_x(-20.0).opacity(0.0);
        let stripped = props.opacity_only();
        assert!(!stripped.has_transform());
        assert_eq!(stripped.opacity, Some(0.0));
        assert!(props.has_transform());
    }

    #[test]
    fn test_identity_values() {
        let style = VisualStyle::default();
        for p in Property::ALL {
            assert_eq!(style.get(p), p.identity());
        }
    }

    #[test]
    fn test_props_from_toml() {
        let props: Props = toml::from_str("y = 50.0\nopacity = 0.0").unwrap();
        assert_eq!(props, Props::new().y(50.0).opacity(0.0));
        assert!(toml::from_str::<Props>("width = 3.0").is_err());
    }
}
