use crate::io::atomic_write_str;
use crate::paths::ConfigError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item};

pub trait ConfigBackend {
  fn load_section<T: DeserializeOwned>(&self, section: &str) -> Result<T, ConfigError>;
  fn save_section<T: Serialize>(&self, section: &str, value: &T) -> Result<(), ConfigError>;
}

/// Un fichero TOML repartido en secciones `[nombre]`, cada una propiedad de un componente.
///
/// Guardar una sección reescribe solo esa tabla; el resto del fichero, comentarios
/// incluidos, se conserva.
pub struct TomlConfigBackend {
  file: PathBuf,
}

impl TomlConfigBackend {
  pub fn new(file: PathBuf) -> Self {
    Self { file }
  }

  pub fn file(&self) -> &Path {
    &self.file
  }

  /// Como [`ConfigBackend::load_section`], pero un fichero o una sección ausentes dan `T::default()`.
  pub fn load_section_with_default<T>(&self, section: &str) -> Result<T, ConfigError>
  where
    T: DeserializeOwned + Default,
  {
    match self.read_table()? {
      Some(root) => match root.get(section) {
        Some(table) => decode_section(section, table),
        None => Ok(T::default()),
      },
      None => Ok(T::default()),
    }
  }

  fn read_table(&self) -> Result<Option<toml::Table>, ConfigError> {
    match fs::read_to_string(&self.file) {
      Ok(content) => Ok(Some(toml::from_str(&content)?)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  /// Documento editable actual; vacío si el fichero aún no existe.
  fn read_document(&self) -> Result<DocumentMut, ConfigError> {
    match fs::read_to_string(&self.file) {
      Ok(content) => content.parse().map_err(|e| ConfigError::Other(format!("parse {:?}: {e}", self.file))),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(DocumentMut::new()),
      Err(e) => Err(e.into()),
    }
  }
}

impl ConfigBackend for TomlConfigBackend {
  fn load_section<T: DeserializeOwned>(&self, section: &str) -> Result<T, ConfigError> {
    let root = self.read_table()?.ok_or_else(|| ConfigError::Other(format!("{:?} does not exist", self.file)))?;
    let table = root
      .get(section)
      .ok_or_else(|| ConfigError::Other(format!("missing section [{section}] in {:?}", self.file)))?;
    decode_section(section, table)
  }

  fn save_section<T: Serialize>(&self, section: &str, value: &T) -> Result<(), ConfigError> {
    let mut doc = self.read_document()?;
    doc[section] = encode_section(section, value)?;
    atomic_write_str(&self.file, &doc.to_string())?;
    Ok(())
  }
}

fn decode_section<T: DeserializeOwned>(section: &str, table: &toml::Value) -> Result<T, ConfigError> {
  table.clone().try_into().map_err(|e| ConfigError::Other(format!("decode section [{section}]: {e}")))
}

fn encode_section<T: Serialize>(section: &str, value: &T) -> Result<Item, ConfigError> {
  let encoded = toml::to_string(value).map_err(|e| ConfigError::Other(format!("encode section [{section}]: {e}")))?;
  let doc: DocumentMut =
    encoded.parse().map_err(|e| ConfigError::Other(format!("reparse section [{section}]: {e}")))?;
  Ok(doc.into_item())
}
