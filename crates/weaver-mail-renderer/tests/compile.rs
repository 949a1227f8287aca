use proptest::prelude::*;
use serde_json::{Map, Value, json};
use weaver_mail_core::{NodeId, NodeKind, Tree, add_component, update_component};
use weaver_mail_renderer::{CompileOptions, compile, compile_with, render_node};

fn patch(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn add(tree: &Tree, kind: NodeKind, parent: &str) -> (Tree, NodeId) {
    let (tree, id) = add_component(tree, kind, parent, None);
    (tree, id.expect("component added"))
}

fn line_with<'a>(html: &'a str, needle: &str) -> &'a str {
    html.lines()
        .find(|line| line.contains(needle))
        .unwrap_or_else(|| panic!("no line containing {needle:?} in\n{html}"))
}

fn img_widths(html: &str) -> Vec<u32> {
    html.match_indices("<img ")
        .filter_map(|(at, _)| {
            let rest = &html[at..];
            let start = rest.find(" width=\"")? + 8;
            let end = rest[start..].find('"')? + start;
            rest[start..end].parse().ok()
        })
        .collect()
}

#[test]
fn escapes_text_and_uses_root_width() {
    let tree = update_component(&Tree::new(), "root", &patch(json!({ "maxWidth": 700 })));
    let (tree, text) = add(&tree, NodeKind::Text, "root");
    let tree = update_component(&tree, &text, &patch(json!({ "text": "<b>Hi</b>" })));

    let html = compile(&tree);
    assert!(html.contains("&lt;b&gt;Hi&lt;/b&gt;"));
    assert!(!html.contains("<b>Hi"));
    assert!(html.contains(r#"<table role="presentation" width="700""#));
    assert!(html.contains("max-width: 700px;"));
}

#[test]
fn document_shell() {
    let html = compile(&Tree::new());
    assert!(html.starts_with(
        r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN""#
    ));
    assert!(html.contains(r#"<html xmlns="http://www.w3.org/1999/xhtml">"#));
    assert!(html.contains("charset=UTF-8"));
    assert!(html.contains(r#"<meta name="viewport""#));
    assert!(!html.contains("<title>"));
    assert!(html.trim_end().ends_with("</html>"));

    let titled = compile_with(&Tree::new(), &CompileOptions::with_title("News & <Deals>"));
    insta::assert_snapshot!(line_with(&titled, "<title>"), @"<title>News &amp; &lt;Deals&gt;</title>");
}

#[test]
fn text_fragment() {
    let (tree, text) = add(&Tree::new(), NodeKind::Text, "root");
    let tree = update_component(&tree, &text, &patch(json!({ "text": "Hello\n<world>" })));
    let html = render_node(&tree, &text, 600);
    insta::assert_snapshot!(line_with(&html, "<td"), @r#"<td style="padding: 10px 20px 10px 20px; font-size: 16px; color: #333333; font-weight: normal; text-align: left; line-height: 1.5;">Hello<br />&lt;world&gt;</td>"#);
}

#[test]
fn button_fragment() {
    let (tree, button) = add(&Tree::new(), NodeKind::Button, "root");
    let html = render_node(&tree, &button, 600);
    insta::assert_snapshot!(line_with(&html, "<a href"), @r##"<td style="background-color: #007bff; border-radius: 4px;"><a href="#" target="_blank" style="display: inline-block; padding: 12px 24px 12px 24px; font-size: 16px; font-weight: bold; color: #ffffff; text-decoration: none; border-radius: 4px;">Click me</a></td>"##);
    assert!(line_with(&html, "padding: 10px").starts_with(r#"<td align="center""#));
}

#[test]
fn divider_and_spacer_fragments() {
    let (tree, divider) = add(&Tree::new(), NodeKind::Divider, "root");
    let (tree, spacer) = add(&tree, NodeKind::Spacer, "root");

    let html = render_node(&tree, &divider, 600);
    insta::assert_snapshot!(line_with(&html, "border-top"), @r#"<td style="height: 0; line-height: 0; font-size: 0; border-top: 1px solid #dddddd;">&nbsp;</td>"#);

    let html = render_node(&tree, &spacer, 600);
    insta::assert_snapshot!(line_with(&html, "height"), @r#"<td style="height: 20px; line-height: 20px; font-size: 0;">&nbsp;</td>"#);
}

#[test]
fn heading_uses_level() {
    let (tree, heading) = add(&Tree::new(), NodeKind::Heading, "root");
    let tree = update_component(&tree, &heading, &patch(json!({ "level": 9, "text": "Sale" })));
    let html = render_node(&tree, &heading, 600);
    assert!(html.contains("<h6 style=\"margin: 0; font-size: 28px;"));
    assert!(html.contains(">Sale</h6>"));
}

#[test]
fn columns_split_width() {
    let (tree, columns) = add(&Tree::new(), NodeKind::Columns, "root");
    let html = compile(&tree);
    // 600 wide, 10px padding each side, 16px gap: (580 - 16) / 2.
    assert_eq!(html.matches(r#"<td width="282""#).count(), 2);
    assert_eq!(html.matches("padding-right: 16px;").count(), 1);

    let tree = update_component(&tree, &columns, &patch(json!({ "columns": 3 })));
    let html = compile(&tree);
    assert_eq!(html.matches(r#"<td width="182""#).count(), 3);
    assert_eq!(html.matches("padding-right: 16px;").count(), 2);
}

#[test]
fn image_in_column_fits() {
    let (tree, columns) = add(&Tree::new(), NodeKind::Columns, "root");
    let column = tree.get(&columns).unwrap().children()[0].clone();
    let (tree, image) = add(&tree, NodeKind::Image, &column);
    let tree = update_component(
        &tree,
        &image,
        &patch(json!({ "width": 900, "alt": "\"quoted\"", "link": "https://example.com/?a=1&b=2" })),
    );

    let html = compile(&tree);
    // 282 wide column, 20px image padding each side.
    assert_eq!(img_widths(&html), vec![242]);
    assert!(html.contains(r#"alt="&quot;quoted&quot;""#));
    assert!(html.contains(r#"<a href="https://example.com/?a=1&amp;b=2" target="_blank"><img "#));
}

#[test]
fn inline_styles_only() {
    let (tree, columns) = add(&Tree::new(), NodeKind::Columns, "root");
    let column = tree.get(&columns).unwrap().children()[1].clone();
    let (tree, _) = add(&tree, NodeKind::Button, &column);
    let (tree, _) = add(&tree, NodeKind::Image, "root");
    let (tree, _) = add(&tree, NodeKind::Heading, "root");
    let html = compile(&tree);
    assert!(!html.contains("class="));
    assert!(!html.contains("<style"));
    assert!(!html.contains("flex"));
    assert!(!html.contains("grid"));
}

#[test]
fn missing_nodes_render_nothing() {
    let tree = Tree::new();
    assert_eq!(render_node(&tree, "ghost", 600), "");
}

#[test]
fn deep_nesting_is_cut_off() {
    let mut tree = Tree::new();
    let mut parent = NodeId::root();
    for _ in 0..24 {
        let (next, columns) = add(&tree, NodeKind::Columns, &parent);
        parent = next.get(&columns).unwrap().children()[0].clone();
        tree = next;
    }
    let (tree, text) = add(&tree, NodeKind::Text, &parent);
    let tree = update_component(&tree, &text, &patch(json!({ "text": "bottom" })));
    let html = compile(&tree);
    assert!(!html.contains("bottom"));
    assert!(html.trim_end().ends_with("</html>"));
}

proptest! {
    #[test]
    fn image_width_never_exceeds_container(
        max_width in 0u32..3000,
        requested in 0u32..5000,
        left in 0u32..400,
        right in 0u32..400,
    ) {
        let tree = update_component(&Tree::new(), "root", &patch(json!({ "maxWidth": max_width })));
        let (tree, image) = add(&tree, NodeKind::Image, "root");
        let tree = update_component(
            &tree,
            &image,
            &patch(json!({ "width": requested, "padding": { "left": left, "right": right } })),
        );
        let container = max_width.clamp(320, 1200);
        let available = container.saturating_sub(left + right);
        for width in img_widths(&compile(&tree)) {
            prop_assert!(width <= available, "{} > {}", width, available);
        }
    }

    #[test]
    fn script_text_is_always_escaped(prefix in ".{0,20}", suffix in ".{0,20}") {
        let (tree, text) = add(&Tree::new(), NodeKind::Text, "root");
        let body = format!("{prefix}<script>alert(1)</script>{suffix}");
        let tree = update_component(&tree, &text, &patch(json!({ "text": body })));
        let html = compile(&tree);
        prop_assert!(!html.contains("<script>"));
        prop_assert!(html.contains("&lt;script&gt;"));
    }
}
