use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Crédito de un colaborador en una pista.
///
/// `role` guarda el nombre del rol tal como lo envía el backend; la
/// interpretación (si exige subtipo o no) la hace [`RoleCatalog`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
  pub name: String,
  #[serde(default)]
  pub category: Option<String>,
  #[serde(default)]
  pub role: Option<String>,
  #[serde(default)]
  pub role_type: Option<String>,
}

/// Rol de colaborador.
///
/// Solo los roles `Typed` exigen elegir un subtipo (p. ej. el instrumento de
/// un músico) para que el crédito esté completo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
  Simple(String),
  Typed { name: String, subtypes: Vec<String> },
}

impl Role {
  pub fn name(&self) -> &str {
    match self {
      Role::Simple(name) | Role::Typed { name, .. } => name,
    }
  }

  pub fn requires_subtype(&self) -> bool {
    matches!(self, Role::Typed { .. })
  }
}

/// Lista de roles que exigen subtipo.
///
/// Cualquier rol que no esté aquí se resuelve como [`Role::Simple`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCatalog {
  typed: HashMap<String, Role>,
}

impl RoleCatalog {
  pub fn new<I, S>(typed: I) -> Self
  where
    I: IntoIterator<Item = (S, Vec<String>)>,
    S: Into<String>,
  {
    let typed = typed
      .into_iter()
      .map(|(name, subtypes)| {
        let name = name.into();
        (normalize(&name), Role::Typed { name, subtypes })
      })
      .collect();

    Self { typed }
  }

  pub fn resolve(&self, role: &str) -> Role {
    self.typed.get(&normalize(role)).cloned().unwrap_or_else(|| Role::Simple(role.trim().to_string()))
  }

  /// Roles con subtipo, ordenados por nombre.
  pub fn typed_roles(&self) -> Vec<&Role> {
    let mut roles: Vec<&Role> = self.typed.values().collect();
    roles.sort_by(|a, b| a.name().cmp(b.name()));
    roles
  }
}

impl Default for RoleCatalog {
  fn default() -> Self {
    let list = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    RoleCatalog::new([
      ("Producer", list(&["Producer", "Co-Producer", "Executive Producer", "Vocal Producer"])),
      ("Performer", list(&["Lead Vocals", "Background Vocals", "Rap", "Spoken Word"])),
      (
        "Musician",
        list(&["Guitar", "Bass", "Drums", "Keyboards", "Piano", "Strings", "Brass", "Percussion", "Synthesizer"]),
      ),
    ])
  }
}

fn normalize(role: &str) -> String {
  role.trim().to_lowercase()
}
