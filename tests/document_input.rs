mod common;

use bizdoc_pdf::{
    BusinessSettings, Currency, DocumentData, DocumentKind, Error, OutputMode, Rendered,
    render_file,
};
use common::{WIDGET_JSON, renderer_failing, widget_invoice};
use pretty_assertions::assert_eq;

#[test]
fn parses_camel_case_json() {
    let doc = DocumentData::from_json(WIDGET_JSON).unwrap();
    assert_eq!(doc, widget_invoice());
    assert_eq!(doc.file_stem(), "invoice_INV-001");
}

#[test]
fn missing_items_is_rejected() {
    let json = r#"{
        "type": "invoice", "number": "1", "date": "2024-01-01",
        "totals": { "subtotal": 0, "taxRate": 0, "taxAmount": 0, "grandTotal": 0 }
    }"#;
    let err = DocumentData::from_json(json).unwrap_err();
    assert!(matches!(err, Error::InvalidDocument(_)), "{err}");
    assert!(err.to_string().contains("items"), "{err}");
}

#[test]
fn non_numeric_price_is_rejected() {
    let json = WIDGET_JSON.replace(r#""price": 9.99"#, r#""price": "cheap""#);
    assert!(matches!(
        DocumentData::from_json(&json),
        Err(Error::InvalidDocument(_))
    ));
}

#[test]
fn negative_price_is_rejected() {
    let json = WIDGET_JSON.replace(r#""price": 9.99"#, r#""price": -1"#);
    let err = DocumentData::from_json(&json).unwrap_err();
    assert!(err.to_string().contains("price"), "{err}");
}

#[test]
fn empty_number_is_rejected() {
    let json = WIDGET_JSON.replace(r#""number": "INV-001""#, r#""number": "  ""#);
    assert!(matches!(
        DocumentData::from_json(&json),
        Err(Error::InvalidDocument(_))
    ));
}

#[test]
fn optional_sections_may_be_omitted() {
    let json = r#"{
        "type": "quotation", "number": "Q-7", "date": "2024-02-02",
        "items": [],
        "totals": { "subtotal": 0, "taxRate": 0, "taxAmount": 0, "grandTotal": 0 }
    }"#;
    let doc = DocumentData::from_json(json).unwrap();
    assert_eq!(doc.kind, DocumentKind::Quotation);
    assert_eq!(doc.currency, None);
    assert_eq!(doc.currency(), Currency::Usd);
    assert_eq!(doc.business.name(), None);
    assert_eq!(doc.client.email(), None);
}

#[test]
fn unknown_type_and_currency_are_kept_verbatim() {
    let json = WIDGET_JSON
        .replace(r#""type": "invoice""#, r#""type": "credit_note""#)
        .replace(r#""currency": "USD""#, r#""currency": "CHF""#);
    let doc = DocumentData::from_json(&json).unwrap();
    assert_eq!(doc.kind, DocumentKind::Other("credit_note".into()));
    assert_eq!(doc.title(), "DOCUMENT");
    assert_eq!(doc.currency(), Currency::Other("CHF".into()));
    assert_eq!(doc.file_stem(), "credit_note_INV-001");

    let back = serde_json::to_value(&doc).unwrap();
    assert_eq!(back["type"], "credit_note");
    assert_eq!(back["currency"], "CHF");
}

#[tokio::test]
async fn invalid_document_renders_nothing() {
    let mut doc = widget_invoice();
    doc.items[0].price = f64::NAN;
    let err = renderer_failing().compose(&doc).await.unwrap_err();
    assert!(matches!(err, Error::InvalidDocument(_)));
}

#[tokio::test]
async fn stated_totals_are_rendered_even_when_inconsistent() {
    let mut doc = widget_invoice();
    doc.items[0].total = 5.0;
    doc.totals.grand_total = 1000.0;
    let page = renderer_failing().compose(&doc).await.unwrap();
    assert!(page.find_text("$5.00").is_some());
    assert!(page.find_text("$1000.00").is_some());
}

#[test]
fn settings_fill_only_missing_fields() {
    let settings = BusinessSettings {
        business_name: "Settings Co".into(),
        business_phone: "555-0100".into(),
        signature_url: "https://example.test/sig.png".into(),
        currency: Currency::Eur,
        ..BusinessSettings::default()
    };

    let mut doc = widget_invoice();
    doc.business.business_phone = Some(String::new());
    doc.currency = None;
    settings.apply_to(&mut doc);

    assert_eq!(doc.business.name(), Some("Acme Supplies"));
    assert_eq!(doc.business.phone(), Some("555-0100"));
    assert_eq!(doc.business.signature_url(), Some("https://example.test/sig.png"));
    assert_eq!(doc.business.logo_url(), None);
    assert_eq!(doc.currency, Some(Currency::Eur));

    let mut explicit = widget_invoice();
    settings.apply_to(&mut explicit);
    assert_eq!(explicit.currency, Some(Currency::Usd));
}

#[test]
fn settings_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let settings = BusinessSettings {
        business_name: "Acme".into(),
        tax_rate: 7.5,
        currency: Currency::Gbp,
        ..BusinessSettings::default()
    };
    settings.save(&path).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["businessName"], "Acme");
    assert_eq!(raw["taxRate"], 7.5);
    assert_eq!(raw["currency"], "GBP");

    assert_eq!(BusinessSettings::load(&path).unwrap(), settings);
}

#[test]
fn settings_export_adds_timestamp() {
    use chrono::TimeZone;

    let now = chrono::Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
    let export = BusinessSettings::default().export(now);
    let json = serde_json::to_value(&export).unwrap();
    assert_eq!(json["exportDate"], "2024-06-01T08:30:00+00:00");
    assert_eq!(json["currency"], "USD");
    assert!(json.get("settings").is_none());
}

#[test]
fn malformed_settings_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        BusinessSettings::load(&path),
        Err(Error::Settings(_))
    ));
}

#[tokio::test]
async fn render_file_applies_settings_and_saves() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.json");
    let json = WIDGET_JSON.replace(r#""currency": "USD","#, "");
    std::fs::write(&input, json).unwrap();

    let settings = BusinessSettings {
        currency: Currency::Inr,
        ..BusinessSettings::default()
    };
    let rendered = render_file(
        &input,
        Some(&settings),
        OutputMode::Save {
            dir: dir.path().to_path_buf(),
        },
    )
    .await
    .unwrap();
    let Rendered::Saved(path) = rendered else {
        panic!("expected a saved file");
    };
    assert!(std::fs::read(path).unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn render_file_reports_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let err = render_file(&dir.path().join("nope.json"), None, OutputMode::Preview)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)), "{err}");
}
