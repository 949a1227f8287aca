//! Per-kind fragment renderers.
//!
//! Every fragment is a self-contained `role="presentation"` table with
//! inline styles only. Each renderer receives the pixel width available to
//! it and passes the narrowed width on to its children.

use std::fmt::{self, Write};

use weaver_mail_core::{
    ButtonProps, ColumnProps, ColumnsProps, DividerProps, HeadingProps, ImageProps, NodeId,
    Properties, SpacerProps, TextAlign, TextProps, Tree,
};

use crate::escape::{Escaped, escape_html, escape_html_lines};
use crate::layout;

/// Deepest nesting rendered. Anything below renders as nothing.
pub const MAX_DEPTH: usize = 32;

const TABLE_OPEN: &str =
    r#"<table role="presentation" width="100%" cellpadding="0" cellspacing="0" border="0">"#;

pub struct EmailWriter<'t, W> {
    tree: &'t Tree,

    /// Writer to write to.
    writer: W,

    /// Current nesting depth of rendered nodes.
    depth: usize,
}

impl<'t, W: Write> EmailWriter<'t, W> {
    pub fn new(tree: &'t Tree, writer: W) -> Self {
        Self {
            tree,
            writer,
            depth: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub(crate) fn tree(&self) -> &'t Tree {
        self.tree
    }

    #[inline]
    pub(crate) fn write(&mut self, s: &str) -> fmt::Result {
        self.writer.write_str(s)
    }

    /// Write formatted output with every piece escaped.
    #[inline]
    pub(crate) fn write_attr(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        Escaped(&mut self.writer).write_fmt(args)
    }

    #[inline]
    pub(crate) fn write_text(&mut self, s: &str) -> fmt::Result {
        escape_html(&mut self.writer, s)
    }

    pub fn write_children(&mut self, children: &[NodeId], available: u32) -> fmt::Result {
        for child in children {
            self.write_node(child, available)?;
        }
        Ok(())
    }

    /// Render one node into `available` pixels. Missing ids and nodes past
    /// [`MAX_DEPTH`] render as nothing.
    pub fn write_node(&mut self, id: &str, available: u32) -> fmt::Result {
        let tree = self.tree;
        let Some(node) = tree.get(id) else {
            tracing::trace!(id, "skipping missing node");
            return Ok(());
        };
        if self.depth >= MAX_DEPTH {
            tracing::debug!(id, depth = self.depth, "nesting too deep, node not rendered");
            return Ok(());
        }
        tracing::trace!(id, kind = %node.kind(), available, "rendering node");

        self.depth += 1;
        let result = match node.properties() {
            Properties::Root(_) => self.write_children(node.children(), available),
            Properties::Text(text) => self.write_text_block(text),
            Properties::Heading(heading) => self.write_heading(heading),
            Properties::Button(button) => self.write_button(button),
            Properties::Image(image) => self.write_image(image, available),
            Properties::Divider(divider) => self.write_divider(divider),
            Properties::Spacer(spacer) => self.write_spacer(spacer),
            Properties::Columns(columns) => {
                self.write_columns(columns, node.children(), available)
            }
            Properties::Column(column) => {
                self.write_children(node.children(), layout::inner_width(available, &column.padding))
            }
        };
        self.depth -= 1;
        result
    }

    fn open_cell(&mut self) -> fmt::Result {
        self.write(TABLE_OPEN)?;
        self.write("\n<tr>\n")
    }

    fn close_cell(&mut self) -> fmt::Result {
        self.write("</td>\n</tr>\n</table>\n")
    }

    fn write_text_block(&mut self, text: &TextProps) -> fmt::Result {
        self.open_cell()?;
        self.write("<td style=\"")?;
        self.write_attr(format_args!(
            "padding: {}; font-size: {}px; color: {}; font-weight: {}; text-align: {}; line-height: {};",
            text.padding,
            text.font_size,
            text.color,
            text.font_weight.as_str(),
            text.text_align.as_str(),
            text.line_height,
        ))?;
        self.write("\">")?;
        escape_html_lines(&mut self.writer, &text.text)?;
        self.close_cell()
    }

    fn write_heading(&mut self, heading: &HeadingProps) -> fmt::Result {
        let level = heading.level.clamp(1, 6);
        self.open_cell()?;
        self.write("<td style=\"")?;
        self.write_attr(format_args!(
            "padding: {}; text-align: {};",
            heading.padding,
            heading.text_align.as_str(),
        ))?;
        write!(self.writer, "\"><h{level} style=\"")?;
        self.write_attr(format_args!(
            "margin: 0; font-size: {}px; color: {}; font-weight: {}; line-height: 1.2;",
            heading.font_size,
            heading.color,
            heading.font_weight.as_str(),
        ))?;
        self.write("\">")?;
        escape_html_lines(&mut self.writer, &heading.text)?;
        write!(self.writer, "</h{level}>")?;
        self.close_cell()
    }

    fn write_button(&mut self, button: &ButtonProps) -> fmt::Result {
        self.open_cell()?;
        self.write("<td align=\"")?;
        self.write(button.align.as_str())?;
        self.write("\" style=\"")?;
        self.write_attr(format_args!("padding: {};", button.padding))?;
        self.write("\">\n")?;
        self.write(
            r#"<table role="presentation" cellpadding="0" cellspacing="0" border="0">"#,
        )?;
        self.write("\n<tr>\n<td style=\"")?;
        self.write_attr(format_args!(
            "background-color: {}; border-radius: {}px;",
            button.background_color, button.border_radius,
        ))?;
        self.write("\"><a href=\"")?;
        self.write_text(&button.url)?;
        self.write("\" target=\"_blank\" style=\"")?;
        self.write_attr(format_args!(
            "display: inline-block; padding: {}; font-size: {}px; font-weight: {}; color: {}; text-decoration: none; border-radius: {}px;",
            button.inner_padding,
            button.font_size,
            button.font_weight.as_str(),
            button.text_color,
            button.border_radius,
        ))?;
        self.write("\">")?;
        self.write_text(&button.text)?;
        self.write("</a></td>\n</tr>\n</table>\n")?;
        self.close_cell()
    }

    fn write_image(&mut self, image: &ImageProps, available: u32) -> fmt::Result {
        let width = layout::image_width(image, available);
        let margin = match image.align {
            TextAlign::Left => "0",
            TextAlign::Center => "0 auto",
            TextAlign::Right => "0 0 0 auto",
        };

        self.open_cell()?;
        self.write("<td align=\"")?;
        self.write(image.align.as_str())?;
        self.write("\" style=\"")?;
        self.write_attr(format_args!("padding: {};", image.padding))?;
        self.write("\">")?;
        if let Some(link) = &image.link {
            self.write("<a href=\"")?;
            self.write_text(link)?;
            self.write("\" target=\"_blank\">")?;
        }
        self.write("<img src=\"")?;
        self.write_text(&image.src)?;
        self.write("\" alt=\"")?;
        self.write_text(&image.alt)?;
        write!(
            self.writer,
            "\" width=\"{width}\" style=\"display: block; width: {width}px; max-width: 100%; height: auto; margin: {margin}; border: 0;\" />"
        )?;
        if image.link.is_some() {
            self.write("</a>")?;
        }
        self.close_cell()
    }

    fn write_divider(&mut self, divider: &DividerProps) -> fmt::Result {
        let percent = divider.width_percent.min(100);
        self.open_cell()?;
        self.write("<td style=\"")?;
        self.write_attr(format_args!("padding: {};", divider.padding))?;
        self.write("\">\n")?;
        write!(
            self.writer,
            r#"<table role="presentation" width="{percent}%" cellpadding="0" cellspacing="0" border="0" align="center">"#
        )?;
        self.write("\n<tr>\n<td style=\"")?;
        self.write_attr(format_args!(
            "height: 0; line-height: 0; font-size: 0; border-top: {}px {} {};",
            divider.thickness,
            divider.style.as_str(),
            divider.color,
        ))?;
        self.write("\">&nbsp;</td>\n</tr>\n</table>\n")?;
        self.close_cell()
    }

    fn write_spacer(&mut self, spacer: &SpacerProps) -> fmt::Result {
        self.open_cell()?;
        write!(
            self.writer,
            "<td style=\"height: {h}px; line-height: {h}px; font-size: 0;\">&nbsp;",
            h = spacer.height
        )?;
        self.close_cell()
    }

    fn write_columns(
        &mut self,
        columns: &ColumnsProps,
        children: &[NodeId],
        available: u32,
    ) -> fmt::Result {
        let tree = self.tree;
        let cells: Vec<(&NodeId, &ColumnProps)> = children
            .iter()
            .filter_map(|id| match tree.get(id)?.properties() {
                Properties::Column(column) => Some((id, column)),
                _ => None,
            })
            .collect();
        let inner = layout::inner_width(available, &columns.padding);
        let count = u32::try_from(cells.len()).unwrap_or(u32::MAX);
        let width = layout::column_width(inner, columns.gap, count);

        self.write(TABLE_OPEN.trim_end_matches('>'))?;
        if let Some(background) = &columns.background_color {
            self.write(" style=\"")?;
            self.write_attr(format_args!("background-color: {background};"))?;
            self.write("\"")?;
        }
        self.write(">\n<tr>\n<td style=\"")?;
        self.write_attr(format_args!("padding: {};", columns.padding))?;
        self.write("\">\n")?;
        self.write(TABLE_OPEN)?;
        self.write("\n<tr>\n")?;

        for (index, (id, column)) in cells.iter().enumerate() {
            let last = index + 1 == cells.len();
            write!(
                self.writer,
                "<td width=\"{width}\" valign=\"{}\" style=\"width: {width}px;",
                column.vertical_align.as_str()
            )?;
            if !last {
                write!(self.writer, " padding-right: {}px;", columns.gap)?;
            }
            self.write("\">\n")?;
            self.write(TABLE_OPEN.trim_end_matches('>'))?;
            if let Some(background) = &column.background_color {
                self.write(" style=\"")?;
                self.write_attr(format_args!("background-color: {background};"))?;
                self.write("\"")?;
            }
            self.write(">\n<tr>\n")?;
            write!(
                self.writer,
                "<td valign=\"{}\" style=\"",
                column.vertical_align.as_str()
            )?;
            self.write_attr(format_args!("padding: {};", column.padding))?;
            self.write("\">\n")?;

            // The column cell is its own depth level.
            self.depth += 1;
            let children = tree.get(id).map_or(&[][..], |node| node.children());
            let result = self.write_children(children, layout::inner_width(width, &column.padding));
            self.depth -= 1;
            result?;

            self.write("</td>\n</tr>\n</table>\n</td>\n")?;
        }

        self.write("</tr>\n</table>\n")?;
        self.close_cell()
    }
}
