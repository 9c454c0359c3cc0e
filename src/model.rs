use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Kind of business document. Unrecognised kinds are kept verbatim so they
/// still name the output file, and render under the generic "DOCUMENT" title.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentKind {
    Invoice,
    Quotation,
    PurchaseOrder,
    Receipt,
    Other(String),
}

impl DocumentKind {
    pub fn as_str(&self) -> &str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Quotation => "quotation",
            DocumentKind::PurchaseOrder => "purchase_order",
            DocumentKind::Receipt => "receipt",
            DocumentKind::Other(s) => s,
        }
    }

    /// Display heading for the title stage.
    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "INVOICE",
            DocumentKind::Quotation => "QUOTATION",
            DocumentKind::PurchaseOrder => "PURCHASE ORDER",
            DocumentKind::Receipt => "RECEIPT",
            DocumentKind::Other(_) => "DOCUMENT",
        }
    }
}

impl From<&str> for DocumentKind {
    fn from(s: &str) -> Self {
        match s {
            "invoice" => DocumentKind::Invoice,
            "quotation" => DocumentKind::Quotation,
            "purchase_order" => DocumentKind::PurchaseOrder,
            "receipt" => DocumentKind::Receipt,
            other => DocumentKind::Other(other.to_string()),
        }
    }
}

impl From<String> for DocumentKind {
    fn from(s: String) -> Self {
        DocumentKind::from(s.as_str())
    }
}

impl From<DocumentKind> for String {
    fn from(kind: DocumentKind) -> Self {
        kind.as_str().to_string()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Inr,
    Ngn,
    Other(String),
}

impl Currency {
    pub fn code(&self) -> &str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Inr => "INR",
            Currency::Ngn => "NGN",
            Currency::Other(s) => s,
        }
    }

    /// Unknown codes (including the empty string) fall back to `$`.
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "\u{20AC}",
            Currency::Gbp => "\u{00A3}",
            Currency::Inr => "\u{20B9}",
            Currency::Ngn => "\u{20A6}",
            Currency::Other(_) => "$",
        }
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        match s {
            "USD" => Currency::Usd,
            "EUR" => Currency::Eur,
            "GBP" => Currency::Gbp,
            "INR" => Currency::Inr,
            "NGN" => Currency::Ngn,
            other => Currency::Other(other.to_string()),
        }
    }
}

impl From<String> for Currency {
    fn from(s: String) -> Self {
        Currency::from(s.as_str())
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.code().to_string()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_url: Option<String>,
}

impl BusinessInfo {
    pub fn name(&self) -> Option<&str> {
        present(&self.business_name)
    }

    pub fn address(&self) -> Option<&str> {
        present(&self.business_address)
    }

    pub fn phone(&self) -> Option<&str> {
        present(&self.business_phone)
    }

    pub fn email(&self) -> Option<&str> {
        present(&self.business_email)
    }

    pub fn logo_url(&self) -> Option<&str> {
        present(&self.business_logo_url)
    }

    pub fn signature_url(&self) -> Option<&str> {
        present(&self.signature_url)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ClientInfo {
    pub fn name(&self) -> Option<&str> {
        present(&self.name)
    }

    pub fn address(&self) -> Option<&str> {
        present(&self.address)
    }

    pub fn email(&self) -> Option<&str> {
        present(&self.email)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: u64,
    pub price: f64,
    /// Percentage, e.g. `10.0` for 10 %.
    #[serde(default)]
    pub discount: f64,
    /// Precomputed by the caller.
    pub total: f64,
}

impl LineItem {
    /// `quantity × price × (1 − discount / 100)`. Only used to flag suspicious input.
    pub fn expected_total(&self) -> f64 {
        self.quantity as f64 * self.price * (1.0 - self.discount / 100.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub grand_total: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentData {
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    pub number: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub business: BusinessInfo,
    #[serde(default)]
    pub client: ClientInfo,
    pub items: Vec<LineItem>,
    pub totals: Totals,
}

impl DocumentData {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let data: DocumentData =
            serde_json::from_str(json).map_err(|e| Error::InvalidDocument(e.to_string()))?;
        data.validate()?;
        Ok(data)
    }

    pub fn load(path: &std::path::Path) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        Self::from_json(&json)
    }

    pub fn currency(&self) -> Currency {
        self.currency.clone().unwrap_or_default()
    }

    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    /// `<type>_<number>`, with path separators in the number replaced.
    pub fn file_stem(&self) -> String {
        let number: String = self
            .number
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        format!("{}_{}", self.kind.as_str(), number)
    }

    /// Structural checks run before any stage touches the canvas.
    pub fn validate(&self) -> Result<(), Error> {
        if self.number.trim().is_empty() {
            return Err(Error::InvalidDocument("document number is empty".into()));
        }
        for (i, item) in self.items.iter().enumerate() {
            if !item.price.is_finite() || item.price < 0.0 {
                return Err(Error::InvalidDocument(format!(
                    "item {i} ({:?}): price must be a non-negative number, got {}",
                    item.description, item.price
                )));
            }
            if !item.discount.is_finite() {
                return Err(Error::InvalidDocument(format!(
                    "item {i} ({:?}): discount is not a number",
                    item.description
                )));
            }
            if !item.total.is_finite() {
                return Err(Error::InvalidDocument(format!(
                    "item {i} ({:?}): total is not a number",
                    item.description
                )));
            }
        }
        let t = &self.totals;
        for (name, value) in [
            ("subtotal", t.subtotal),
            ("taxRate", t.tax_rate),
            ("taxAmount", t.tax_amount),
            ("grandTotal", t.grand_total),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidDocument(format!("totals.{name} is not a number")));
            }
        }
        Ok(())
    }

    /// Log line totals that disagree with quantity, price and discount.
    /// Values are never corrected; arithmetic is the caller's contract.
    pub(crate) fn audit_totals(&self) {
        for (i, item) in self.items.iter().enumerate() {
            let expected = item.expected_total();
            if (expected - item.total).abs() > 0.005 {
                log::debug!(
                    "item {i} ({:?}): total {:.2} differs from quantity x price x discount = {:.2}",
                    item.description,
                    item.total,
                    expected,
                );
            }
        }
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}
