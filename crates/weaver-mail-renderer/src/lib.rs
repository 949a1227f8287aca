//! weaver-mail-renderer
//!
//! Compiles a component tree into a single email-safe HTML document:
//! nested presentation tables, inline styles only, every user string
//! escaped. Compilation is pure and total; missing nodes render as nothing.

use std::fmt;

use weaver_mail_core::Tree;

pub mod document;
pub mod escape;
pub mod layout;
pub mod options;
pub mod writer;

pub use escape::{escape_html, escaped};
pub use options::CompileOptions;
pub use writer::{EmailWriter, MAX_DEPTH};

/// Compile `tree` into an HTML document with default options.
pub fn compile(tree: &Tree) -> String {
    compile_with(tree, &CompileOptions::default())
}

#[tracing::instrument(level = "debug", skip_all, fields(nodes = tree.len()))]
pub fn compile_with(tree: &Tree, options: &CompileOptions) -> String {
    let mut out = String::with_capacity(2048 + tree.len() * 512);
    if let Err(err) = compile_into(tree, options, &mut out) {
        // Only reachable if a Display impl fails; String itself never does.
        tracing::warn!(error = %err, "compile stopped early");
    }
    tracing::trace!(bytes = out.len(), "compiled");
    out
}

/// Compile into any `fmt::Write` sink.
pub fn compile_into<W: fmt::Write>(tree: &Tree, options: &CompileOptions, writer: W) -> fmt::Result {
    EmailWriter::new(tree, writer).write_document(options)
}

/// Render a single node as a fragment, for previews.
///
/// `available` is the pixel width the fragment may occupy. Rendering the
/// root yields all of its children without the document shell.
pub fn render_node(tree: &Tree, id: &str, available: u32) -> String {
    let mut writer = EmailWriter::new(tree, String::new());
    if let Err(err) = writer.write_node(id, available) {
        tracing::warn!(id, error = %err, "render stopped early");
    }
    writer.into_inner()
}
