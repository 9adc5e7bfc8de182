//! Display names for the coded values in a certificate.
//!
//! The value sets are the JSON files published with the DCC schema, see
//! <https://github.com/ehn-dcc-development/ehn-dcc-schema/tree/release/1.3.0/valuesets>.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde_derive::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const MA_FILE_NAME: &str = "vaccine-mah-manf.json";
pub const MP_FILE_NAME: &str = "vaccine-medicinal-product.json";
pub const VP_FILE_NAME: &str = "vaccine-prophylaxis.json";

#[derive(Debug, Error)]
pub enum ValueSetError {
    #[error("error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("error parsing {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ValueSetValue {
    #[serde(default)]
    pub display: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ValueSet {
    #[serde(rename = "valueSetId", alias = "valueSetID", default)]
    pub id: String,
    #[serde(rename = "valueSetDate", default)]
    pub date: String,
    #[serde(rename = "valueSetValues", default)]
    pub values: BTreeMap<String, ValueSetValue>,
}

impl ValueSet {
    pub fn from_reader<R: Read>(reader: R) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }

    pub fn get(&self, code: &str) -> Option<&ValueSetValue> {
        self.values.get(code)
    }

    fn load(path: PathBuf) -> Result<Self, ValueSetError> {
        let file = File::open(&path).map_err(|source| ValueSetError::Io {
            path: path.clone(),
            source,
        })?;
        let set = Self::from_reader(BufReader::new(file))
            .map_err(|source| ValueSetError::Json { path: path.clone(), source })?;
        debug!(
            path = %path.display(),
            id = %set.id,
            values = set.values.len(),
            "loaded value set"
        );
        Ok(set)
    }
}

/// Maps vaccine codes to display names.
#[derive(Debug, Clone, Default)]
pub struct ValueSetMapper {
    ma: ValueSet,
    mp: ValueSet,
    vp: ValueSet,
}

impl ValueSetMapper {
    /// Loads the three vaccine value sets from `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ValueSetError> {
        let dir = dir.as_ref();
        Ok(ValueSetMapper {
            ma: ValueSet::load(dir.join(MA_FILE_NAME))?,
            mp: ValueSet::load(dir.join(MP_FILE_NAME))?,
            vp: ValueSet::load(dir.join(VP_FILE_NAME))?,
        })
    }

    pub fn new(ma: ValueSet, mp: ValueSet, vp: ValueSet) -> Self {
        ValueSetMapper { ma, mp, vp }
    }

    /// Marketing authorisation holder or manufacturer.
    pub fn marketing_auth_holder(&self, code: &str) -> Option<&ValueSetValue> {
        self.ma.get(code)
    }

    pub fn medicinal_product(&self, code: &str) -> Option<&ValueSetValue> {
        self.mp.get(code)
    }

    /// Type of vaccine or prophylaxis.
    pub fn vaccine_type(&self, code: &str) -> Option<&ValueSetValue> {
        self.vp.get(code)
    }
}
