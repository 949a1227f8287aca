//! Typed property records for every component kind.
//!
//! Each kind carries its own record; `Properties` is the tagged union stored on
//! a node. Every record is `#[serde(default)]` and its `Default` is the
//! registry default, so absent keys in persisted data read back as defaults.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

/// The closed set of component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    Text,
    Heading,
    Button,
    Image,
    Divider,
    Spacer,
    Columns,
    Column,
}

impl NodeKind {
    pub const ALL: [NodeKind; 9] = [
        NodeKind::Root,
        NodeKind::Text,
        NodeKind::Heading,
        NodeKind::Button,
        NodeKind::Image,
        NodeKind::Divider,
        NodeKind::Spacer,
        NodeKind::Columns,
        NodeKind::Column,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Text => "text",
            NodeKind::Heading => "heading",
            NodeKind::Button => "button",
            NodeKind::Image => "image",
            NodeKind::Divider => "divider",
            NodeKind::Spacer => "spacer",
            NodeKind::Columns => "columns",
            NodeKind::Column => "column",
        }
    }

    /// Parse the persisted lowercase name of a kind.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Box padding in pixels, in CSS order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Padding {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Padding {
    pub const fn new(top: u32, right: u32, bottom: u32, left: u32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn uniform(value: u32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Total horizontal padding.
    pub fn horizontal(&self) -> u32 {
        self.left.saturating_add(self.right)
    }
}

impl fmt::Display for Padding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}px {}px {}px {}px",
            self.top, self.right, self.bottom, self.left
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

impl FontWeight {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontWeight::Normal => "normal",
            FontWeight::Bold => "bold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl BorderStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorderStyle::Solid => "solid",
            BorderStyle::Dashed => "dashed",
            BorderStyle::Dotted => "dotted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

impl VerticalAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerticalAlign::Top => "top",
            VerticalAlign::Middle => "middle",
            VerticalAlign::Bottom => "bottom",
        }
    }
}

/// Document-level settings carried by the root node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RootProps {
    /// Content width in pixels, kept within [320, 1200].
    pub max_width: u32,
    pub background_color: SmolStr,
    pub content_background_color: SmolStr,
    pub font_family: SmolStr,
}

impl Default for RootProps {
    fn default() -> Self {
        Self {
            max_width: 600,
            background_color: SmolStr::new_static("#f4f4f4"),
            content_background_color: SmolStr::new_static("#ffffff"),
            font_family: SmolStr::new_static("Arial, Helvetica, sans-serif"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextProps {
    pub text: String,
    pub font_size: u32,
    pub color: SmolStr,
    pub font_weight: FontWeight,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub padding: Padding,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            text: "Enter your text here".to_owned(),
            font_size: 16,
            color: SmolStr::new_static("#333333"),
            font_weight: FontWeight::Normal,
            text_align: TextAlign::Left,
            line_height: 1.5,
            padding: Padding::new(10, 20, 10, 20),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeadingProps {
    pub text: String,
    /// Semantic level, rendered as `<h1>`..`<h6>`.
    pub level: u8,
    pub font_size: u32,
    pub color: SmolStr,
    pub font_weight: FontWeight,
    pub text_align: TextAlign,
    pub padding: Padding,
}

impl Default for HeadingProps {
    fn default() -> Self {
        Self {
            text: "Heading".to_owned(),
            level: 1,
            font_size: 28,
            color: SmolStr::new_static("#111111"),
            font_weight: FontWeight::Bold,
            text_align: TextAlign::Left,
            padding: Padding::new(10, 20, 10, 20),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ButtonProps {
    pub text: String,
    pub url: String,
    pub background_color: SmolStr,
    pub text_color: SmolStr,
    pub border_radius: u32,
    pub font_size: u32,
    pub font_weight: FontWeight,
    pub align: TextAlign,
    pub padding: Padding,
    /// Padding inside the button face.
    pub inner_padding: Padding,
}

impl Default for ButtonProps {
    fn default() -> Self {
        Self {
            text: "Click me".to_owned(),
            url: "#".to_owned(),
            background_color: SmolStr::new_static("#007bff"),
            text_color: SmolStr::new_static("#ffffff"),
            border_radius: 4,
            font_size: 16,
            font_weight: FontWeight::Bold,
            align: TextAlign::Center,
            padding: Padding::new(10, 20, 10, 20),
            inner_padding: Padding::new(12, 24, 12, 24),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageProps {
    pub src: String,
    pub alt: String,
    /// Requested width in pixels. `None` fills the available width.
    pub width: Option<u32>,
    /// Clamp the requested width to the available width.
    pub fit_to_container: bool,
    pub link: Option<String>,
    pub align: TextAlign,
    pub padding: Padding,
}

impl Default for ImageProps {
    fn default() -> Self {
        Self {
            src: "https://via.placeholder.com/600x200".to_owned(),
            alt: String::new(),
            width: None,
            fit_to_container: true,
            link: None,
            align: TextAlign::Center,
            padding: Padding::new(10, 20, 10, 20),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DividerProps {
    pub color: SmolStr,
    pub thickness: u32,
    pub style: BorderStyle,
    pub width_percent: u32,
    pub padding: Padding,
}

impl Default for DividerProps {
    fn default() -> Self {
        Self {
            color: SmolStr::new_static("#dddddd"),
            thickness: 1,
            style: BorderStyle::Solid,
            width_percent: 100,
            padding: Padding::new(10, 20, 10, 20),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpacerProps {
    pub height: u32,
}

impl Default for SpacerProps {
    fn default() -> Self {
        Self { height: 20 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnsProps {
    /// Number of `column` children, kept within [2, 4].
    pub columns: u32,
    /// Horizontal gap between columns in pixels.
    pub gap: u32,
    pub padding: Padding,
    pub background_color: Option<SmolStr>,
}

impl Default for ColumnsProps {
    fn default() -> Self {
        Self {
            columns: 2,
            gap: 16,
            padding: Padding::uniform(10),
            background_color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnProps {
    pub background_color: Option<SmolStr>,
    pub padding: Padding,
    pub vertical_align: VerticalAlign,
}

/// Properties of a node, one typed record per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Properties {
    Root(RootProps),
    Text(TextProps),
    Heading(HeadingProps),
    Button(ButtonProps),
    Image(ImageProps),
    Divider(DividerProps),
    Spacer(SpacerProps),
    Columns(ColumnsProps),
    Column(ColumnProps),
}

impl Properties {
    pub fn kind(&self) -> NodeKind {
        match self {
            Properties::Root(_) => NodeKind::Root,
            Properties::Text(_) => NodeKind::Text,
            Properties::Heading(_) => NodeKind::Heading,
            Properties::Button(_) => NodeKind::Button,
            Properties::Image(_) => NodeKind::Image,
            Properties::Divider(_) => NodeKind::Divider,
            Properties::Spacer(_) => NodeKind::Spacer,
            Properties::Columns(_) => NodeKind::Columns,
            Properties::Column(_) => NodeKind::Column,
        }
    }

    /// Plain JSON object form, as persisted.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Properties::Root(p) => serde_json::to_value(p),
            Properties::Text(p) => serde_json::to_value(p),
            Properties::Heading(p) => serde_json::to_value(p),
            Properties::Button(p) => serde_json::to_value(p),
            Properties::Image(p) => serde_json::to_value(p),
            Properties::Divider(p) => serde_json::to_value(p),
            Properties::Spacer(p) => serde_json::to_value(p),
            Properties::Columns(p) => serde_json::to_value(p),
            Properties::Column(p) => serde_json::to_value(p),
        }
    }

    /// Read a JSON object as the record for `kind`. Absent keys take defaults.
    pub fn from_value(kind: NodeKind, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            NodeKind::Root => Properties::Root(serde_json::from_value(value)?),
            NodeKind::Text => Properties::Text(serde_json::from_value(value)?),
            NodeKind::Heading => Properties::Heading(serde_json::from_value(value)?),
            NodeKind::Button => Properties::Button(serde_json::from_value(value)?),
            NodeKind::Image => Properties::Image(serde_json::from_value(value)?),
            NodeKind::Divider => Properties::Divider(serde_json::from_value(value)?),
            NodeKind::Spacer => Properties::Spacer(serde_json::from_value(value)?),
            NodeKind::Columns => Properties::Columns(serde_json::from_value(value)?),
            NodeKind::Column => Properties::Column(serde_json::from_value(value)?),
        })
    }

    pub fn as_root(&self) -> Option<&RootProps> {
        match self {
            Properties::Root(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_columns(&self) -> Option<&ColumnsProps> {
        match self {
            Properties::Columns(p) => Some(p),
            _ => None,
        }
    }
}

/// Recursively merge `patch` into `target`.
///
/// Objects merge key by key; any other value in `patch` replaces the target
/// value outright.
pub fn deep_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value)
                    }
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_name(kind.as_str()), Some(kind));
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                Value::String(kind.to_string())
            );
        }
        assert_eq!(NodeKind::from_name("marquee"), None);
    }

    #[test]
    fn test_absent_keys_take_defaults() {
        let props = Properties::from_value(NodeKind::Text, json!({ "text": "hi" })).unwrap();
        let Properties::Text(text) = props else {
            panic!("expected text properties");
        };
        assert_eq!(text.text, "hi");
        assert_eq!(text.font_size, 16);
        assert_eq!(text.padding, Padding::new(10, 20, 10, 20));
    }

    #[test]
    fn test_camel_case_keys() {
        let value = Properties::Root(RootProps::default()).to_value().unwrap();
        assert_eq!(value["maxWidth"], json!(600));
        assert!(value.get("max_width").is_none());
    }

    #[test]
    fn test_wrong_value_type_is_rejected() {
        let err = Properties::from_value(NodeKind::Spacer, json!({ "height": "tall" }));
        assert!(err.is_err());
    }

    #[test]
    fn test_deep_merge_keeps_siblings() {
        let mut target = json!({ "color": "#000", "padding": { "top": 1, "left": 2 } });
        deep_merge(&mut target, &json!({ "padding": { "top": 9 } }));
        assert_eq!(
            target,
            json!({ "color": "#000", "padding": { "top": 9, "left": 2 } })
        );
    }

    #[test]
    fn test_deep_merge_replaces_scalars_and_nulls() {
        let mut target = json!({ "backgroundColor": "#fff", "gap": 16 });
        deep_merge(&mut target, &json!({ "backgroundColor": null, "gap": 4 }));
        assert_eq!(target, json!({ "backgroundColor": null, "gap": 4 }));
    }

    #[test]
    fn test_padding_css() {
        assert_eq!(Padding::new(1, 2, 3, 4).to_string(), "1px 2px 3px 4px");
        assert_eq!(Padding::new(1, 2, 3, 4).horizontal(), 6);
    }
}
