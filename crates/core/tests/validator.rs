mod common;

use qrbench_core::services::validator::{
    extract_svg_fragment, ExtractionPolicy, SvgValidator, UnsupportedFeature, ValidationError,
    SVG_NAMESPACE,
};

fn permissive() -> SvgValidator {
    SvgValidator::new(ExtractionPolicy::Permissive)
}

fn strict() -> SvgValidator {
    SvgValidator::new(ExtractionPolicy::Strict)
}

#[test]
fn default_policy_is_permissive() {
    assert_eq!(SvgValidator::default().policy(), ExtractionPolicy::Permissive);
}

#[test]
fn empty_and_whitespace_outputs_are_reported_as_empty() {
    for validator in [permissive(), strict()] {
        assert_eq!(validator.validate(""), Err(ValidationError::EmptyOutput));
        assert_eq!(validator.validate("  \n\t "), Err(ValidationError::EmptyOutput));
    }
}

#[test]
fn plain_prose_has_no_svg() {
    for validator in [permissive(), strict()] {
        assert_eq!(validator.validate("not xml at all"), Err(ValidationError::NoSvgFound));
    }
}

#[test]
fn permissive_extracts_fragment_from_fenced_prose() {
    let svg = common::qr_svg("fenced");
    let raw = format!("Here is your QR code:\n```svg\n{svg}\n```\nEnjoy!");

    let parsed = permissive().validate(&raw).expect("permissive accepts fenced SVG");
    assert_eq!(parsed.source(), svg);
    assert!(parsed.is_namespaced());

    let err = strict().validate(&raw).unwrap_err();
    assert!(matches!(err, ValidationError::MalformedSvg(_)), "got {err:?}");
}

#[test]
fn strict_accepts_document_with_prolog() {
    let raw = format!("\n<?xml version=\"1.0\"?>\n{}\n", common::CIRCLE_SVG);
    let parsed = strict().validate(&raw).expect("strict accepts a full document");
    assert!(parsed.source().starts_with("<?xml"));
    assert_eq!(parsed.element_count(), 2);
}

#[test]
fn missing_closing_tag_is_malformed() {
    let raw = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect/>"#;
    let err = permissive().validate(raw).unwrap_err();
    assert!(matches!(err, ValidationError::MalformedSvg(_)));
}

#[test]
fn unbalanced_markup_is_malformed() {
    let err = permissive().validate("<svg><g><rect></g></svg>").unwrap_err();
    assert!(matches!(err, ValidationError::MalformedSvg(_)));
}

#[test]
fn non_svg_root_is_rejected_in_strict_mode() {
    assert_eq!(strict().validate("<html><body/></html>"), Err(ValidationError::NoSvgFound));
}

#[test]
fn foreign_namespace_root_is_not_svg() {
    let raw = r#"<svg xmlns="http://example.com/not-svg"><rect/></svg>"#;
    assert_eq!(permissive().validate(raw), Err(ValidationError::NoSvgFound));
}

#[test]
fn nested_svg_truncates_at_first_close_tag() {
    let raw = r#"<svg xmlns="http://www.w3.org/2000/svg"><svg><rect/></svg><rect/></svg>"#;
    let fragment = extract_svg_fragment(raw).unwrap();
    assert!(fragment.ends_with("<rect/></svg>"));
    assert!(matches!(permissive().validate(raw), Err(ValidationError::MalformedSvg(_))));
}

#[test]
fn missing_namespace_is_injected_for_rendering() {
    let parsed = permissive().validate(&common::qr_svg_without_namespace("ns")).unwrap();
    assert!(!parsed.is_namespaced());
    let rendered = parsed.render_source();
    assert!(rendered.starts_with(&format!("<svg xmlns=\"{SVG_NAMESPACE}\"")));

    let namespaced = permissive().validate(common::CIRCLE_SVG).unwrap();
    assert_eq!(namespaced.render_source(), common::CIRCLE_SVG);
}

#[test]
fn unsupported_features_are_recorded() {
    let raw = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
        <script>alert(1)</script>
        <foreignObject width="10" height="10"/>
        <image xlink:href="https://example.com/qr.png" width="10" height="10"/>
        <use href="#local"/>
        <image href="data:image/png;base64,AAAA" width="1" height="1"/>
    </svg>"##;
    let parsed = permissive().validate(raw).expect("well-formed");
    assert_eq!(
        parsed.unsupported_features(),
        &[
            UnsupportedFeature::Script,
            UnsupportedFeature::ForeignObject,
            UnsupportedFeature::ExternalReference("https://example.com/qr.png".into()),
        ]
    );
}

#[test]
fn hyperlinks_are_not_external_resources() {
    let raw = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
        <a href="https://example.com"><rect width="5" height="5"/></a>
        <a xlink:href="https://example.org/page"><circle r="2"/></a>
        <use xlink:href="https://example.com/sprite.svg#qr"/>
    </svg>"##;
    let parsed = permissive().validate(raw).expect("well-formed");
    assert_eq!(
        parsed.unsupported_features(),
        &[UnsupportedFeature::ExternalReference("https://example.com/sprite.svg#qr".into())]
    );
}

#[test]
fn empty_default_namespace_is_treated_as_unqualified() {
    let parsed = permissive()
        .validate(&common::qr_svg_with_empty_namespace("ns"))
        .expect("empty xmlns is accepted");
    assert!(!parsed.is_namespaced());

    let rendered = parsed.render_source();
    assert_eq!(rendered.matches("xmlns=").count(), 1);
    assert!(rendered.starts_with(&format!("<svg xmlns=\"{SVG_NAMESPACE}\" ")));
}

#[test]
fn validation_errors_map_to_failure_kinds() {
    use qrbench_core::model::FailureKind;
    assert_eq!(ValidationError::EmptyOutput.kind(), FailureKind::EmptyOutput);
    assert_eq!(ValidationError::NoSvgFound.kind(), FailureKind::NoSvgFound);
    assert_eq!(ValidationError::MalformedSvg("x".into()).kind(), FailureKind::MalformedSvg);
}
