//! Reusable business defaults: who is issuing documents, and with which
//! default currency and tax rate.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{Currency, DocumentData};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSettings {
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub business_address: String,
    #[serde(default)]
    pub business_phone: String,
    #[serde(default)]
    pub business_email: String,
    #[serde(default)]
    pub business_logo_url: String,
    #[serde(default)]
    pub signature_url: String,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub currency: Currency,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        BusinessSettings {
            business_name: String::new(),
            business_address: String::new(),
            business_phone: String::new(),
            business_email: String::new(),
            business_logo_url: String::new(),
            signature_url: String::new(),
            tax_rate: 0.0,
            currency: Currency::Usd,
        }
    }
}

/// Settings plus the moment they were exported.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsExport {
    #[serde(flatten)]
    pub settings: BusinessSettings,
    pub export_date: String,
}

impl BusinessSettings {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Settings(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| Error::Settings(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Fill business fields the document leaves empty, and the currency if
    /// the document did not name one. Values already in the document win.
    pub fn apply_to(&self, doc: &mut DocumentData) {
        let b = &mut doc.business;
        fill(&mut b.business_name, &self.business_name);
        fill(&mut b.business_address, &self.business_address);
        fill(&mut b.business_phone, &self.business_phone);
        fill(&mut b.business_email, &self.business_email);
        fill(&mut b.business_logo_url, &self.business_logo_url);
        fill(&mut b.signature_url, &self.signature_url);
        if doc.currency.is_none() {
            doc.currency = Some(self.currency.clone());
        }
    }

    pub fn export(&self, now: DateTime<Utc>) -> SettingsExport {
        SettingsExport {
            settings: self.clone(),
            export_date: now.to_rfc3339(),
        }
    }

    pub fn export_file_name(now: DateTime<Utc>) -> String {
        format!("business_settings_{}.json", now.format("%Y%m%d_%H%M%S"))
    }
}

fn fill(slot: &mut Option<String>, default: &str) {
    if slot.as_deref().is_none_or(str::is_empty) && !default.is_empty() {
        *slot = Some(default.to_string());
    }
}
