use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::fields::apply_field;
use crate::domain::{FieldEntity, FieldKey};
use crate::errors::FieldError;
use crate::ports::{FieldPatch, ReleaseRepository, RepoError};

/// Destino de las escrituras coalescidas.
#[async_trait]
pub trait FieldSink: Send + Sync + 'static {
  async fn commit(&self, key: &FieldKey, value: Value) -> Result<(), RepoError>;
}

/// Envía cada campo como una actualización parcial del repositorio.
pub struct RepositorySink<R>(pub Arc<R>);

#[async_trait]
impl<R> FieldSink for RepositorySink<R>
where
  R: ReleaseRepository + 'static,
{
  async fn commit(&self, key: &FieldKey, value: Value) -> Result<(), RepoError> {
    let mut patch = FieldPatch::new();
    patch.insert(key.field.clone(), value);

    match key.entity {
      FieldEntity::Release(id) => self.0.update_release(id, patch).await,
      FieldEntity::Track(id) => self.0.update_track(id, patch).await,
    }
  }
}

struct PendingWrite {
  generation: u64,
  value: Value,
  cancel: CancellationToken,
}

#[derive(Default)]
struct PendingTable {
  next_generation: u64,
  writes: HashMap<FieldKey, PendingWrite>,
}

/// Coalescedor de escrituras de campos.
///
/// Cada `(entidad, campo)` tiene como mucho un temporizador vivo; un valor
/// nuevo cancela el anterior y solo el último de la ventana se envía. El
/// estado local se actualiza en el acto y nunca se revierte.
///
/// Las tareas se lanzan con `tokio::spawn`, así que hace falta un runtime de
/// Tokio activo. Soltar el coalescedor no cancela las escrituras programadas.
pub struct FieldCoalescer<S> {
  sink: Arc<S>,
  quiet_period: Duration,
  table: Arc<Mutex<PendingTable>>,
}

impl<S> FieldCoalescer<S>
where
  S: FieldSink,
{
  pub fn new(sink: Arc<S>, quiet_period: Duration) -> Self {
    Self { sink, quiet_period, table: Arc::new(Mutex::new(PendingTable::default())) }
  }

  pub fn quiet_period(&self) -> Duration {
    self.quiet_period
  }

  /// Aplica el valor sobre `local` y programa su envío.
  pub fn set_field<T>(&self, local: &mut T, key: FieldKey, value: Value) -> Result<(), FieldError>
  where
    T: Serialize + DeserializeOwned,
  {
    if key.entity.is_read_only(&key.field) {
      return Err(FieldError::ReadOnly(key.field));
    }

    apply_field(local, &key.field, value.clone())?;
    self.schedule(key, value);
    Ok(())
  }

  /// Programa el envío de `value` tras el periodo de silencio.
  pub fn schedule(&self, key: FieldKey, value: Value) {
    let cancel = CancellationToken::new();
    let generation = {
      let mut table = lock(&self.table);
      table.next_generation += 1;
      let generation = table.next_generation;

      let write = PendingWrite { generation, value, cancel: cancel.clone() };
      if let Some(previous) = table.writes.insert(key.clone(), write) {
        previous.cancel.cancel();
      }
      generation
    };
    debug!(%key, generation, "field write scheduled");

    let table = Arc::clone(&self.table);
    let sink = Arc::clone(&self.sink);
    let quiet_period = self.quiet_period;

    tokio::spawn(async move {
      tokio::select! {
        _ = cancel.cancelled() => return,
        _ = tokio::time::sleep(quiet_period) => {}
      }

      let value = {
        let mut table = lock(&table);
        let current = table.writes.get(&key).is_some_and(|w| w.generation == generation);
        if current { table.writes.remove(&key).map(|w| w.value) } else { None }
      };

      if let Some(value) = value {
        commit(sink.as_ref(), &key, value).await;
      }
    });
  }

  /// Cancela las escrituras pendientes de una entidad (p. ej. pista borrada).
  pub fn evict(&self, entity: FieldEntity) -> usize {
    let mut table = lock(&self.table);
    let before = table.writes.len();

    table.writes.retain(|key, write| {
      let keep = key.entity != entity;
      if !keep {
        write.cancel.cancel();
      }
      keep
    });

    let evicted = before - table.writes.len();
    if evicted > 0 {
      debug!(%entity, evicted, "pending field writes evicted");
    }
    evicted
  }

  pub fn pending(&self) -> Vec<FieldKey> {
    lock(&self.table).writes.keys().cloned().collect()
  }

  pub fn pending_value(&self, key: &FieldKey) -> Option<Value> {
    lock(&self.table).writes.get(key).map(|w| w.value.clone())
  }

  /// Envía ya todo lo pendiente, sin esperar a los temporizadores.
  pub async fn flush(&self) -> usize {
    let drained: Vec<(FieldKey, Value)> = {
      let mut table = lock(&self.table);
      table
        .writes
        .drain()
        .map(|(key, write)| {
          write.cancel.cancel();
          (key, write.value)
        })
        .collect()
    };

    let count = drained.len();
    for (key, value) in drained {
      commit(self.sink.as_ref(), &key, value).await;
    }
    count
  }
}

async fn commit<S: FieldSink>(sink: &S, key: &FieldKey, value: Value) {
  match sink.commit(key, value).await {
    Ok(()) => debug!(%key, "field committed"),
    // Sin reintento: el valor local se queda como está.
    Err(e) => warn!(%key, error = %e, "field commit failed"),
  }
}

fn lock(table: &Mutex<PendingTable>) -> MutexGuard<'_, PendingTable> {
  table.lock().unwrap_or_else(PoisonError::into_inner)
}
