//! One-time download codes. A code is handed out once, and `verify`
//! consumes it before a document may be saved.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const CODE_LENGTH: usize = 8;
pub const BATCH_SIZE: usize = 100;
/// One year.
pub const VALIDITY_HOURS: i64 = 8760;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadCode {
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
}

/// Every code ever issued, persisted as one JSON file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CodeStore {
    #[serde(default)]
    codes: Vec<DownloadCode>,
}

impl CodeStore {
    /// A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("{}: {}", e, path.display()),
                )));
            }
        };
        serde_json::from_str(&text)
            .map_err(|e| Error::Code(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::Code(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn codes(&self) -> &[DownloadCode] {
        &self.codes
    }

    pub fn generate(&mut self, count: usize, now: DateTime<Utc>) -> Vec<String> {
        self.generate_with(&mut rand::rng(), count, now)
    }

    /// Issue `count` new codes valid for [`VALIDITY_HOURS`], none of which
    /// collide with each other or with codes already in the store.
    pub fn generate_with<R: Rng>(
        &mut self,
        rng: &mut R,
        count: usize,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let expires_at = now + Duration::hours(VALIDITY_HOURS);
        let mut taken: HashSet<String> = self.codes.iter().map(|c| c.code.clone()).collect();
        let mut issued = Vec::with_capacity(count);

        while issued.len() < count {
            let code: String = (0..CODE_LENGTH)
                .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
                .collect();
            if !taken.insert(code.clone()) {
                continue;
            }
            self.codes.push(DownloadCode {
                code: code.clone(),
                created_at: now,
                expires_at,
                used: false,
                used_at: None,
            });
            issued.push(code);
        }
        log::info!("Issued {count} download codes, valid until {expires_at}");
        issued
    }

    /// Consume `code`. Case does not matter; used and expired codes are
    /// rejected and left untouched.
    pub fn verify(&mut self, code: &str, now: DateTime<Utc>) -> Result<(), Error> {
        let code = code.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(Error::Code("Code is required".into()));
        }
        let entry = self
            .codes
            .iter_mut()
            .find(|c| c.code == code && !c.used)
            .ok_or_else(|| Error::Code("Invalid or already used code".into()))?;
        if entry.expires_at < now {
            return Err(Error::Code("Code has expired".into()));
        }
        entry.used = true;
        entry.used_at = Some(now);
        log::debug!("Download code {code} consumed");
        Ok(())
    }
}
