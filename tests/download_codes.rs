use bizdoc_pdf::{BATCH_SIZE, CodeStore, Error, VALIDITY_HOURS};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn issued_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn rejection(err: Error) -> String {
    match err {
        Error::Code(msg) => msg,
        other => panic!("expected a code rejection, got {other}"),
    }
}

#[test]
fn code_is_consumed_once() {
    let mut store = CodeStore::default();
    let code = store.generate(1, issued_at()).remove(0);

    store.verify(&code, issued_at() + Duration::days(1)).unwrap();
    let used = &store.codes()[0];
    assert!(used.used);
    assert_eq!(used.used_at, Some(issued_at() + Duration::days(1)));

    let err = store.verify(&code, issued_at() + Duration::days(2)).unwrap_err();
    assert_eq!(rejection(err), "Invalid or already used code");
}

#[test]
fn lowercase_input_matches() {
    let mut store = CodeStore::default();
    let code = store.generate(1, issued_at()).remove(0);
    store
        .verify(&format!(" {} ", code.to_lowercase()), issued_at())
        .unwrap();
}

#[test]
fn expired_code_is_rejected_and_not_consumed() {
    let mut store = CodeStore::default();
    let code = store.generate(1, issued_at()).remove(0);
    let later = issued_at() + Duration::hours(VALIDITY_HOURS) + Duration::seconds(1);

    let err = store.verify(&code, later).unwrap_err();
    assert_eq!(rejection(err), "Code has expired");
    assert!(!store.codes()[0].used);

    // Still valid right at the expiry instant.
    store
        .verify(&code, issued_at() + Duration::hours(VALIDITY_HOURS))
        .unwrap();
}

#[test]
fn unknown_and_empty_codes_are_rejected() {
    let mut store = CodeStore::default();
    store.generate(3, issued_at());
    assert_eq!(
        rejection(store.verify("NOTACODE", issued_at()).unwrap_err()),
        "Invalid or already used code"
    );
    assert_eq!(
        rejection(store.verify("   ", issued_at()).unwrap_err()),
        "Code is required"
    );
}

#[test]
fn store_persists_consumption() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("codes.json");

    let mut store = CodeStore::load(&path).unwrap();
    assert!(store.codes().is_empty());
    let codes = store.generate(BATCH_SIZE, issued_at());
    store.save(&path).unwrap();

    let mut reopened = CodeStore::load(&path).unwrap();
    assert_eq!(reopened.codes().len(), BATCH_SIZE);
    reopened.verify(&codes[0], issued_at()).unwrap();
    reopened.save(&path).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["codes"][0]["code"], codes[0].as_str());
    assert_eq!(raw["codes"][0]["used"], true);
    assert!(raw["codes"][0]["expiresAt"].is_string());

    let mut third = CodeStore::load(&path).unwrap();
    assert!(third.verify(&codes[0], issued_at()).is_err());
    third.verify(&codes[1], issued_at()).unwrap();
}

#[test]
fn corrupt_store_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("codes.json");
    std::fs::write(&path, "[1, 2").unwrap();
    assert!(matches!(CodeStore::load(&path), Err(Error::Code(_))));
}
