#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bizdoc_pdf::{
    BusinessInfo, ClientInfo, Currency, DocumentData, DocumentKind, DocumentRenderer, Error,
    ImageSource, LayoutConfig, LineItem, RasterImage, Totals,
};

/// Every load fails, as if the URL were unreachable.
pub struct FailingImages {
    pub calls: AtomicUsize,
}

impl FailingImages {
    pub fn new() -> Self {
        FailingImages {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ImageSource for FailingImages {
    async fn load(&self, url: &str) -> Result<RasterImage, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Image(format!("Failed to download {url}: connection refused")))
    }
}

/// Every load succeeds with a small opaque image.
pub struct SolidImages;

#[async_trait]
impl ImageSource for SolidImages {
    async fn load(&self, _url: &str) -> Result<RasterImage, Error> {
        Ok(RasterImage::from_rgba(4, 2, [30u8, 60, 90, 255].repeat(8)))
    }
}

pub fn renderer_failing() -> DocumentRenderer {
    DocumentRenderer::with_images(LayoutConfig::default(), FailingImages::new())
}

pub fn renderer_solid() -> DocumentRenderer {
    DocumentRenderer::with_images(LayoutConfig::default(), SolidImages)
}

pub fn item(description: &str, quantity: u64, price: f64, discount: f64, total: f64) -> LineItem {
    LineItem {
        description: description.to_string(),
        quantity,
        price,
        discount,
        total,
    }
}

pub fn widget_invoice() -> DocumentData {
    DocumentData {
        kind: DocumentKind::Invoice,
        number: "INV-001".to_string(),
        date: "2024-05-01".to_string(),
        currency: Some(Currency::Usd),
        business: BusinessInfo {
            business_name: Some("Acme Supplies".to_string()),
            business_address: Some("12 Market Road\nLagos".to_string()),
            business_phone: Some("+234 800 000".to_string()),
            business_email: Some("billing@acme.test".to_string()),
            business_logo_url: None,
            signature_url: None,
        },
        client: ClientInfo {
            name: Some("Jane Doe".to_string()),
            address: Some("4 Harbour St".to_string()),
            email: Some("jane@example.test".to_string()),
        },
        items: vec![item("Widget", 2, 9.99, 0.0, 19.98)],
        totals: Totals {
            subtotal: 19.98,
            tax_rate: 7.5,
            tax_amount: 1.5,
            grand_total: 21.48,
        },
    }
}

pub fn with_items(n: usize) -> DocumentData {
    let mut doc = widget_invoice();
    doc.items = (0..n)
        .map(|i| item(&format!("Item {i}"), 1, 10.0, 0.0, 10.0))
        .collect();
    doc
}

pub const WIDGET_JSON: &str = r#"{
    "type": "invoice",
    "number": "INV-001",
    "date": "2024-05-01",
    "currency": "USD",
    "business": {
        "businessName": "Acme Supplies",
        "businessAddress": "12 Market Road\nLagos",
        "businessPhone": "+234 800 000",
        "businessEmail": "billing@acme.test"
    },
    "client": { "name": "Jane Doe", "address": "4 Harbour St", "email": "jane@example.test" },
    "items": [
        { "description": "Widget", "quantity": 2, "price": 9.99, "discount": 0, "total": 19.98 }
    ],
    "totals": { "subtotal": 19.98, "taxRate": 7.5, "taxAmount": 1.5, "grandTotal": 21.48 }
}"#;

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}
