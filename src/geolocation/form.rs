//! Form documents stored on disk as a flat YAML map of field id to value
use super::FormDocument;
use crate::Error;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// A set of named form fields, only fields already present can be written
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormFields {
    fields: BTreeMap<String, String>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field, replacing its value if it already exists
    pub fn insert(&mut self, id: &str, value: &str) {
        self.fields.insert(id.to_string(), value.to_string());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.fields.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn from_reader<R: Read>(source: R) -> Result<Self, Error> {
        Ok(serde_yaml::from_reader(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        debug!("Reading form fields from: {:?}", path);
        Self::from_reader(File::open(path)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let data = serde_yaml::to_string(self)?;
        let mut fp = File::create(path)?;
        fp.write_all(data.as_bytes())?;
        debug!("Saved {} form fields to: {:?}", self.len(), path);
        Ok(())
    }
}

impl FormDocument for FormFields {
    fn has_field(&self, id: &str) -> bool {
        self.fields.contains_key(id)
    }

    fn set_field(&mut self, id: &str, value: String) {
        if let Some(field) = self.fields.get_mut(id) {
            *field = value;
        }
    }
}
