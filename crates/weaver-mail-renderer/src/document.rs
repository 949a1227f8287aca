//! The XHTML document shell around the rendered fragments.

use std::fmt::{self, Write};

use weaver_mail_core::RootProps;

use crate::layout;
use crate::options::CompileOptions;
use crate::writer::EmailWriter;

const DOCTYPE: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">"#;

impl<W: Write> EmailWriter<'_, W> {
    /// Write a complete document: head, the full-width background table and
    /// the centred content table holding every root child.
    pub fn write_document(&mut self, options: &CompileOptions) -> fmt::Result {
        let tree = self.tree();
        let fallback = RootProps::default();
        let root_props = tree.root_properties().unwrap_or(&fallback);
        let width = layout::container_width(root_props);

        self.write(DOCTYPE)?;
        self.write("\n<html xmlns=\"http://www.w3.org/1999/xhtml\">\n<head>\n")?;
        self.write(
            "<meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\" />\n",
        )?;
        self.write(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n",
        )?;
        if let Some(title) = &options.title {
            self.write("<title>")?;
            self.write_text(title)?;
            self.write("</title>\n")?;
        }
        self.write("</head>\n<body style=\"")?;
        self.write_attr(format_args!(
            "margin: 0; padding: 0; background-color: {};",
            root_props.background_color
        ))?;
        self.write("\">\n")?;

        self.write(r#"<table role="presentation" width="100%" cellpadding="0" cellspacing="0" border="0" style=""#)?;
        self.write_attr(format_args!(
            "background-color: {};",
            root_props.background_color
        ))?;
        self.write("\">\n<tr>\n<td align=\"center\" style=\"padding: 20px 0;\">\n")?;

        write!(
            self,
            r#"<table role="presentation" width="{width}" cellpadding="0" cellspacing="0" border="0" style=""#
        )?;
        self.write_attr(format_args!(
            "width: {width}px; max-width: {width}px; background-color: {}; font-family: {};",
            root_props.content_background_color, root_props.font_family,
        ))?;
        self.write("\">\n<tr>\n<td>\n")?;

        if let Some(root) = tree.root() {
            self.write_children(root.children(), width)?;
        }

        self.write("</td>\n</tr>\n</table>\n")?;
        self.write("</td>\n</tr>\n</table>\n</body>\n</html>\n")
    }
}

impl<W: Write> Write for EmailWriter<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s)
    }
}
