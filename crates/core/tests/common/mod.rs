//! SVG fixtures for integration tests, built from real QR matrices.
#![allow(dead_code)]

use qrcode::{Color, QrCode};

pub const MODULE_PX: u32 = 8;
pub const QUIET_ZONE_MODULES: u32 = 4;

/// `<rect>` elements for one symbol whose top-left quiet-zone corner is at
/// (`x`, `y`). Returns the markup and the symbol's edge length in px.
pub fn qr_rects(text: &str, x: u32, y: u32, with_backdrop: bool) -> (String, u32) {
    let code = QrCode::new(text.as_bytes()).expect("encode QR");
    let width = code.width() as u32;
    let colors = code.to_colors();
    let side = (width + 2 * QUIET_ZONE_MODULES) * MODULE_PX;

    let mut out = String::new();
    if with_backdrop {
        out.push_str(&format!(
            r##"<rect x="{x}" y="{y}" width="{side}" height="{side}" fill="#ffffff"/>"##
        ));
    }
    for (i, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let col = i as u32 % width;
        let row = i as u32 / width;
        let px = x + (col + QUIET_ZONE_MODULES) * MODULE_PX;
        let py = y + (row + QUIET_ZONE_MODULES) * MODULE_PX;
        out.push_str(&format!(
            r##"<rect x="{px}" y="{py}" width="{MODULE_PX}" height="{MODULE_PX}" fill="#000000"/>"##
        ));
    }
    (out, side)
}

fn wrap(body: &str, width: u32, height: u32, namespaced: bool) -> String {
    let ns = if namespaced { r#" xmlns="http://www.w3.org/2000/svg""# } else { "" };
    format!(
        r#"<svg{ns} width="{width}" height="{height}" viewBox="0 0 {width} {height}" shape-rendering="crispEdges">{body}</svg>"#
    )
}

/// Standalone SVG document encoding `text`.
pub fn qr_svg(text: &str) -> String {
    let (body, side) = qr_rects(text, 0, 0, true);
    wrap(&body, side, side, true)
}

/// Same symbol, but the root omits `xmlns`.
pub fn qr_svg_without_namespace(text: &str) -> String {
    let (body, side) = qr_rects(text, 0, 0, true);
    wrap(&body, side, side, false)
}

/// Same symbol with the root declaring an empty default namespace.
pub fn qr_svg_with_empty_namespace(text: &str) -> String {
    qr_svg_without_namespace(text).replacen("<svg ", r#"<svg xmlns="" "#, 1)
}

/// Symbol drawn inside an `<a>` hyperlink to `href`.
pub fn qr_svg_in_link(text: &str, href: &str) -> String {
    let (body, side) = qr_rects(text, 0, 0, true);
    wrap(&format!(r#"<a href="{href}">{body}</a>"#), side, side, true)
}

/// Same symbol with no background at all; only dark modules are drawn.
pub fn qr_svg_transparent(text: &str) -> String {
    let (body, side) = qr_rects(text, 0, 0, false);
    wrap(&body, side, side, true)
}

/// Two symbols stacked vertically: `top` above `bottom`.
pub fn stacked_qr_svg(top: &str, bottom: &str) -> String {
    let (upper, upper_side) = qr_rects(top, 0, 0, true);
    let (lower, lower_side) = qr_rects(bottom, 0, upper_side, true);
    let width = upper_side.max(lower_side);
    wrap(&format!("{upper}{lower}"), width, upper_side + lower_side, true)
}

pub const CIRCLE_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100"><circle cx="50" cy="50" r="40" fill="black"/></svg>"#;
