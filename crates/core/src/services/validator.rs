use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use roxmltree::{Document, ParsingOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::FailureKind;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

const SVG_OPEN_MARKER: &str = "<svg";
const SVG_CLOSE_MARKER: &str = "</svg>";

/// Elements whose `href` makes the renderer load another resource.
const LOADING_ELEMENTS: [&str; 3] = ["image", "use", "feImage"];

/// How much of the model output must be SVG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPolicy {
    /// Cut the span from the first `<svg` to the first `</svg>` after it and
    /// parse only that, ignoring surrounding prose or code fences.
    #[default]
    Permissive,
    /// The whole (trimmed) output must be one XML document with an `svg` root.
    Strict,
}

impl ExtractionPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionPolicy::Permissive => "permissive",
            ExtractionPolicy::Strict => "strict",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("model output is empty")]
    EmptyOutput,
    #[error("no <svg> document found in model output")]
    NoSvgFound,
    #[error("malformed SVG: {0}")]
    MalformedSvg(String),
}

impl ValidationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ValidationError::EmptyOutput => FailureKind::EmptyOutput,
            ValidationError::NoSvgFound => FailureKind::NoSvgFound,
            ValidationError::MalformedSvg(_) => FailureKind::MalformedSvg,
        }
    }
}

/// Content that parses fine but that the rasterizer refuses to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedFeature {
    Script,
    ForeignObject,
    ExternalReference(String),
}

impl fmt::Display for UnsupportedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsupportedFeature::Script => write!(f, "<script> element"),
            UnsupportedFeature::ForeignObject => write!(f, "<foreignObject> element"),
            UnsupportedFeature::ExternalReference(href) => {
                write!(f, "external reference '{href}'")
            }
        }
    }
}

/// A well-formed SVG document extracted from model output.
///
/// Owns the source text; the XML tree itself is not kept because rendering
/// reparses it. Facts the rasterizer needs are recorded during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSvg {
    source: String,
    root_start: usize,
    namespaced: bool,
    /// Byte range of an `xmlns=""` declaration on the root, if any.
    empty_default_ns: Option<Range<usize>>,
    element_count: usize,
    unsupported: Vec<UnsupportedFeature>,
}

impl ParsedSvg {
    /// The SVG text that was validated (the extracted fragment in permissive mode).
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn into_source(self) -> String {
        self.source
    }

    /// Whether the root element declared the SVG namespace.
    pub fn is_namespaced(&self) -> bool {
        self.namespaced
    }

    pub fn element_count(&self) -> usize {
        self.element_count
    }

    pub fn unsupported_features(&self) -> &[UnsupportedFeature] {
        &self.unsupported
    }

    /// Source suitable for an SVG renderer.
    ///
    /// Models frequently omit `xmlns`; renderers that match elements by
    /// namespace would then see an empty document, so the SVG namespace is
    /// declared on the root when it is missing.
    pub fn render_source(&self) -> Cow<'_, str> {
        if self.namespaced {
            return Cow::Borrowed(&self.source);
        }
        let declaration = format!("xmlns=\"{SVG_NAMESPACE}\"");
        let (cut, replacement) = match &self.empty_default_ns {
            // An explicit empty default namespace is overwritten; a second
            // `xmlns` on the same element would be rejected as a duplicate.
            Some(range) => (range.clone(), declaration),
            None => {
                let insert_at = self.root_start + SVG_OPEN_MARKER.len();
                (insert_at..insert_at, format!(" {declaration}"))
            }
        };
        let mut patched = String::with_capacity(self.source.len() + replacement.len());
        patched.push_str(&self.source[..cut.start]);
        patched.push_str(&replacement);
        patched.push_str(&self.source[cut.end..]);
        Cow::Owned(patched)
    }
}

/// Locates and parses the SVG document in raw model output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgValidator {
    policy: ExtractionPolicy,
}

impl SvgValidator {
    pub fn new(policy: ExtractionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ExtractionPolicy {
        self.policy
    }

    pub fn validate(&self, raw_text: &str) -> Result<ParsedSvg, ValidationError> {
        if raw_text.trim().is_empty() {
            return Err(ValidationError::EmptyOutput);
        }
        let candidate = match self.policy {
            ExtractionPolicy::Permissive => extract_svg_fragment(raw_text)?,
            ExtractionPolicy::Strict => raw_text.trim(),
        };
        let parsed = parse_svg(candidate)?;
        debug!(
            policy = self.policy.as_str(),
            elements = parsed.element_count,
            namespaced = parsed.namespaced,
            unsupported = parsed.unsupported.len(),
            "validated SVG"
        );
        Ok(parsed)
    }
}

/// Cut the first `<svg ... </svg>` span out of `raw_text`.
///
/// Only the first closing tag after the opening marker is honoured, so a
/// nested `<svg>` truncates the fragment and it then fails to parse.
pub fn extract_svg_fragment(raw_text: &str) -> Result<&str, ValidationError> {
    let start = raw_text.find(SVG_OPEN_MARKER).ok_or(ValidationError::NoSvgFound)?;
    let close = raw_text[start..].find(SVG_CLOSE_MARKER).ok_or_else(|| {
        ValidationError::MalformedSvg(format!("missing closing {SVG_CLOSE_MARKER} tag"))
    })?;
    Ok(&raw_text[start..start + close + SVG_CLOSE_MARKER.len()])
}

fn parse_svg(text: &str) -> Result<ParsedSvg, ValidationError> {
    let options = ParsingOptions { allow_dtd: true, ..ParsingOptions::default() };
    let doc = Document::parse_with_options(text, options).map_err(|e| {
        if text.contains(SVG_OPEN_MARKER) {
            ValidationError::MalformedSvg(e.to_string())
        } else {
            ValidationError::NoSvgFound
        }
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(ValidationError::NoSvgFound);
    }
    let namespaced = match root.tag_name().namespace() {
        None | Some("") => false,
        Some(SVG_NAMESPACE) => true,
        Some(_) => return Err(ValidationError::NoSvgFound),
    };
    let empty_default_ns =
        if namespaced { None } else { find_empty_default_namespace(text, root.range().start) };

    let mut element_count = 0;
    let mut unsupported = Vec::new();
    for node in root.descendants().filter(|n| n.is_element()) {
        element_count += 1;
        match node.tag_name().name() {
            "script" => unsupported.push(UnsupportedFeature::Script),
            "foreignObject" => unsupported.push(UnsupportedFeature::ForeignObject),
            _ => {}
        }
        // `<a href>` is a hyperlink, not a resource the renderer fetches.
        if !LOADING_ELEMENTS.contains(&node.tag_name().name()) {
            continue;
        }
        for attr in node.attributes() {
            let is_href = attr.name() == "href"
                && matches!(attr.namespace(), None | Some(XLINK_NAMESPACE));
            if is_href && !is_inline_reference(attr.value()) {
                unsupported.push(UnsupportedFeature::ExternalReference(attr.value().to_string()));
            }
        }
    }

    Ok(ParsedSvg {
        source: text.to_string(),
        root_start: root.range().start,
        namespaced,
        empty_default_ns,
        element_count,
        unsupported,
    })
}

fn is_inline_reference(href: &str) -> bool {
    let href = href.trim();
    href.starts_with('#') || href.starts_with("data:")
}

/// Locate `xmlns=""` (or `xmlns=''`) inside the root start tag at `root_start`.
fn find_empty_default_namespace(text: &str, root_start: usize) -> Option<Range<usize>> {
    let tag_end = root_start + text[root_start..].find('>')?;
    let tag = &text[root_start..tag_end];
    ["xmlns=\"\"", "xmlns=''"].iter().find_map(|needle| {
        tag.match_indices(needle)
            // Must start an attribute, not end one like `data-xmlns`.
            .find(|(at, _)| tag[..*at].ends_with(char::is_whitespace))
            .map(|(at, m)| root_start + at..root_start + at + m.len())
    })
}
