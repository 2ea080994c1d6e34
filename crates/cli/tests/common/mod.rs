#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use qrcode::{Color, QrCode};
use serde_json::json;

/// Standalone SVG document encoding `text`, 8 px per module with a 4-module quiet zone.
pub fn qr_svg(text: &str) -> String {
    let code = QrCode::new(text.as_bytes()).expect("encode QR");
    let width = code.width();
    let side = (width + 8) * 8;
    let mut body = format!(r##"<rect width="{side}" height="{side}" fill="#ffffff"/>"##);
    for (i, color) in code.to_colors().iter().enumerate() {
        if *color == Color::Dark {
            let x = (i % width + 4) * 8;
            let y = (i / width + 4) * 8;
            body.push_str(&format!(
                r##"<rect x="{x}" y="{y}" width="8" height="8" fill="#000000"/>"##
            ));
        }
    }
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{side}" height="{side}" shape-rendering="crispEdges">{body}</svg>"#
    )
}

/// A JSON samples file with one correct, one wrong, and one invalid output.
pub fn write_mixed_samples(dir: &Path) -> PathBuf {
    let samples = json!([
        { "target_text": "Hello World", "model_output": qr_svg("Hello World") },
        { "target_text": "12345", "model_output": qr_svg("54321") },
        { "target_text": "user@example.com", "model_output": "I cannot draw that." },
    ]);
    let path = dir.join("demo-model.json");
    fs::write(&path, serde_json::to_string_pretty(&samples).expect("json")).expect("write");
    path
}
