//! Property registry: default properties and containment rules per kind.

use crate::properties::{
    ButtonProps, ColumnProps, ColumnsProps, DividerProps, HeadingProps, ImageProps, NodeKind,
    Properties, RootProps, SpacerProps, TextProps,
};

/// Fewest `column` children a `columns` node may own.
pub const MIN_COLUMNS: usize = 2;
/// Most `column` children a `columns` node may own.
pub const MAX_COLUMNS: usize = 4;

pub const MIN_CONTENT_WIDTH: u32 = 320;
pub const MAX_CONTENT_WIDTH: u32 = 1200;
pub const DEFAULT_CONTENT_WIDTH: u32 = 600;

/// A fresh default property record for `kind`.
///
/// Every call returns a new value; callers may mutate it freely.
pub fn defaults_for(kind: NodeKind) -> Properties {
    match kind {
        NodeKind::Root => Properties::Root(RootProps::default()),
        NodeKind::Text => Properties::Text(TextProps::default()),
        NodeKind::Heading => Properties::Heading(HeadingProps::default()),
        NodeKind::Button => Properties::Button(ButtonProps::default()),
        NodeKind::Image => Properties::Image(ImageProps::default()),
        NodeKind::Divider => Properties::Divider(DividerProps::default()),
        NodeKind::Spacer => Properties::Spacer(SpacerProps::default()),
        NodeKind::Columns => Properties::Columns(ColumnsProps::default()),
        NodeKind::Column => Properties::Column(ColumnProps::default()),
    }
}

/// Whether nodes of `kind` own a children list.
pub fn can_contain_children(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::Root | NodeKind::Columns | NodeKind::Column)
}

/// Whether a `parent` node may hold a `child` node directly.
///
/// `columns` holds only `column`; `root` and `column` hold anything except
/// `root` and `column`. Leaves hold nothing.
pub fn accepts_child(parent: NodeKind, child: NodeKind) -> bool {
    match parent {
        NodeKind::Columns => child == NodeKind::Column,
        NodeKind::Root | NodeKind::Column => {
            !matches!(child, NodeKind::Root | NodeKind::Column)
        }
        _ => false,
    }
}

pub fn clamp_columns(count: usize) -> usize {
    count.clamp(MIN_COLUMNS, MAX_COLUMNS)
}

pub fn clamp_content_width(width: u32) -> u32 {
    width.clamp(MIN_CONTENT_WIDTH, MAX_CONTENT_WIDTH)
}

/// Pull bounded fields back into range: root width, heading level and text
/// line height.
pub fn clamp_properties(properties: &mut Properties) {
    match properties {
        Properties::Root(root) => root.max_width = clamp_content_width(root.max_width),
        Properties::Heading(heading) => heading.level = heading.level.clamp(1, 6),
        // JSON has no encoding for inf or NaN, so those would not survive a save.
        Properties::Text(text) if !text.line_height.is_finite() || text.line_height < 0.0 => {
            text.line_height = TextProps::default().line_height;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_kind() {
        for kind in NodeKind::ALL {
            assert_eq!(defaults_for(kind).kind(), kind);
        }
    }

    #[test]
    fn test_defaults_are_fresh_copies() {
        let mut first = defaults_for(NodeKind::Text);
        if let Properties::Text(text) = &mut first {
            text.font_size = 99;
        }
        assert_eq!(defaults_for(NodeKind::Text), Properties::Text(TextProps::default()));
    }

    #[test]
    fn test_documented_defaults() {
        let Properties::Columns(columns) = defaults_for(NodeKind::Columns) else {
            panic!("expected columns");
        };
        assert_eq!(columns.columns, 2);
        assert_eq!(columns.gap, 16);

        let Properties::Root(root) = defaults_for(NodeKind::Root) else {
            panic!("expected root");
        };
        assert_eq!(root.max_width, DEFAULT_CONTENT_WIDTH);

        let Properties::Text(text) = defaults_for(NodeKind::Text) else {
            panic!("expected text");
        };
        assert_eq!(text.color, "#333333");
    }

    #[test]
    fn test_containers() {
        let containers: Vec<_> = NodeKind::ALL
            .into_iter()
            .filter(|kind| can_contain_children(*kind))
            .collect();
        assert_eq!(
            containers,
            vec![NodeKind::Root, NodeKind::Columns, NodeKind::Column]
        );
    }

    #[test]
    fn test_containment_matrix() {
        assert!(accepts_child(NodeKind::Root, NodeKind::Columns));
        assert!(accepts_child(NodeKind::Column, NodeKind::Columns));
        assert!(accepts_child(NodeKind::Columns, NodeKind::Column));
        assert!(!accepts_child(NodeKind::Columns, NodeKind::Text));
        assert!(!accepts_child(NodeKind::Root, NodeKind::Column));
        assert!(!accepts_child(NodeKind::Root, NodeKind::Root));
        assert!(!accepts_child(NodeKind::Text, NodeKind::Spacer));
    }

    #[test]
    fn test_clamps() {
        assert_eq!(clamp_columns(0), 2);
        assert_eq!(clamp_columns(3), 3);
        assert_eq!(clamp_columns(17), 4);
        assert_eq!(clamp_content_width(100), 320);
        assert_eq!(clamp_content_width(5000), 1200);

        let mut heading = Properties::Heading(HeadingProps {
            level: 9,
            ..HeadingProps::default()
        });
        clamp_properties(&mut heading);
        let Properties::Heading(heading) = heading else {
            panic!("expected heading");
        };
        assert_eq!(heading.level, 6);

        for bad in [f32::INFINITY, f32::NAN, -2.0] {
            let mut text = Properties::Text(TextProps {
                line_height: bad,
                ..TextProps::default()
            });
            clamp_properties(&mut text);
            assert_eq!(text, Properties::Text(TextProps::default()));
        }
    }
}
