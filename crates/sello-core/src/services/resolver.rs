use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::{Release, ReleaseId};
use crate::errors::EditorError;
use crate::ports::{ReleaseRepository, SessionStore};

/// Una de las formas de direccionar un release, de mayor a menor prioridad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseAddress {
  Id(ReleaseId),
  PublicId(String),
  Slug(String),
  Remembered(ReleaseId),
}

impl ReleaseAddress {
  /// 0 es la prioridad más alta.
  pub fn rank(&self) -> u8 {
    match self {
      ReleaseAddress::Id(_) => 0,
      ReleaseAddress::PublicId(_) => 1,
      ReleaseAddress::Slug(_) => 2,
      ReleaseAddress::Remembered(_) => 3,
    }
  }
}

/// Direcciones disponibles en la navegación actual.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveRequest {
  pub id: Option<ReleaseId>,
  pub public_id: Option<String>,
  pub slug: Option<String>,
}

impl ResolveRequest {
  pub fn by_id(id: ReleaseId) -> Self {
    Self { id: Some(id), ..Self::default() }
  }

  pub fn by_public_id(public_id: impl Into<String>) -> Self {
    Self { public_id: Some(public_id.into()), ..Self::default() }
  }

  pub fn by_slug(slug: impl Into<String>) -> Self {
    Self { slug: Some(slug.into()), ..Self::default() }
  }

  /// Direcciones en orden de prioridad; el id recordado va al final.
  pub fn addresses(&self, remembered: Option<ReleaseId>) -> Vec<ReleaseAddress> {
    let mut out = Vec::with_capacity(4);
    if let Some(id) = self.id {
      out.push(ReleaseAddress::Id(id));
    }
    if let Some(public_id) = self.public_id.as_ref().filter(|s| !s.trim().is_empty()) {
      out.push(ReleaseAddress::PublicId(public_id.clone()));
    }
    if let Some(slug) = self.slug.as_ref().filter(|s| !s.trim().is_empty()) {
      out.push(ReleaseAddress::Slug(slug.clone()));
    }
    if let Some(id) = remembered {
      out.push(ReleaseAddress::Remembered(id));
    }
    out
  }
}

/// Contexto de la sesión del editor: sustituye al "último release" global.
#[derive(Default, Clone)]
pub struct SessionContext {
  remembered: Option<ReleaseId>,
  store: Option<Arc<dyn SessionStore>>,
}

impl SessionContext {
  pub fn new() -> Self {
    Self::default()
  }

  /// Contexto respaldado por un store; carga el id recordado al crearse.
  pub fn with_store(store: Arc<dyn SessionStore>) -> Self {
    let remembered = store.load_last_release();
    Self { remembered, store: Some(store) }
  }

  pub fn remembered(&self) -> Option<ReleaseId> {
    self.remembered
  }

  pub fn remember(&mut self, id: ReleaseId) {
    self.remembered = Some(id);
    if let Some(store) = &self.store {
      store.save_last_release(id);
    }
  }

  pub fn forget(&mut self) {
    self.remembered = None;
  }
}

impl std::fmt::Debug for SessionContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SessionContext")
      .field("remembered", &self.remembered)
      .field("persistent", &self.store.is_some())
      .finish()
  }
}

/// Token de una búsqueda en vuelo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
  pub token: u64,
  pub rank: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
  /// Esta respuesta (o una aparcada) gana; el resto queda obsoleto.
  Applied(Ticket, Release),
  /// Hay una búsqueda de mayor prioridad pendiente; se aparca la respuesta.
  Held,
  /// El token ya no es el último emitido o la resolución ya se aplicó.
  Discarded,
  /// La búsqueda falló y nada aparcado puede aplicarse todavía.
  Failed,
}

/// Máquina de estados que decide qué respuesta de búsqueda se aplica.
///
/// Solo se aplica la respuesta cuyo token sigue siendo el último emitido para
/// su dirección y que no tiene por delante ninguna dirección de mayor
/// prioridad pendiente. Una respuesta válida de menor prioridad espera
/// aparcada hasta que las de mayor prioridad fallan.
#[derive(Debug, Default)]
pub struct ResolutionGate {
  issued: u64,
  pending: Vec<Ticket>,
  parked: Vec<(Ticket, Release)>,
  /// Respuestas aplicadas que su llamada aún no ha recogido.
  unclaimed: Vec<(Ticket, Release)>,
  last_applied: Option<(Ticket, Release)>,
}

impl ResolutionGate {
  pub fn new() -> Self {
    Self::default()
  }

  /// Emite un token nuevo; invalida los anteriores de la misma prioridad.
  pub fn issue(&mut self, rank: u8) -> Ticket {
    self.issued += 1;
    let ticket = Ticket { token: self.issued, rank };

    self.pending.retain(|t| t.rank != rank);
    self.parked.retain(|(t, _)| t.rank != rank);
    self.pending.push(ticket);
    ticket
  }

  pub fn offer(&mut self, ticket: Ticket, outcome: Option<Release>) -> GateDecision {
    if !self.pending.contains(&ticket) {
      return GateDecision::Discarded;
    }

    match outcome {
      Some(release) if self.outranked(ticket) => {
        self.parked.push((ticket, release));
        GateDecision::Held
      }
      Some(release) => self.settle(ticket, release),
      None => {
        self.pending.retain(|t| *t != ticket);
        self.promote_parked()
      }
    }
  }

  pub fn last_applied(&self) -> Option<&(Ticket, Release)> {
    self.last_applied.as_ref()
  }

  pub fn is_idle(&self) -> bool {
    self.pending.is_empty()
  }

  /// El ticket sigue pendiente o aparcado: su resultado aún puede cambiar.
  pub fn is_open(&self, ticket: Ticket) -> bool {
    self.pending.contains(&ticket) || self.parked.iter().any(|(t, _)| *t == ticket)
  }

  /// Recoge la respuesta aplicada a alguno de `tickets`, si la hay.
  pub fn claim(&mut self, tickets: &HashSet<Ticket>) -> Option<Release> {
    let index = self.unclaimed.iter().position(|(t, _)| tickets.contains(t))?;
    Some(self.unclaimed.swap_remove(index).1)
  }

  /// Retira los tickets de una llamada que terminó o se abandonó.
  ///
  /// Si alguno bloqueaba respuestas aparcadas de otras llamadas, la mejor de
  /// ellas se aplica ahora.
  pub fn retire(&mut self, tickets: &HashSet<Ticket>) -> GateDecision {
    let before = self.pending.len();
    self.pending.retain(|t| !tickets.contains(t));
    self.parked.retain(|(t, _)| !tickets.contains(t));
    self.unclaimed.retain(|(t, _)| !tickets.contains(t));

    if self.pending.len() == before { GateDecision::Discarded } else { self.promote_parked() }
  }

  fn outranked(&self, ticket: Ticket) -> bool {
    self.pending.iter().any(|t| t.rank < ticket.rank)
  }

  fn promote_parked(&mut self) -> GateDecision {
    let best = self.parked.iter().enumerate().min_by_key(|(_, (t, _))| t.rank).map(|(i, (t, _))| (i, *t));

    match best {
      Some((index, ticket)) if !self.outranked(ticket) => {
        let (ticket, release) = self.parked.swap_remove(index);
        self.settle(ticket, release)
      }
      _ => GateDecision::Failed,
    }
  }

  fn settle(&mut self, ticket: Ticket, release: Release) -> GateDecision {
    self.pending.clear();
    self.parked.clear();
    self.unclaimed.push((ticket, release.clone()));
    self.last_applied = Some((ticket, release.clone()));
    GateDecision::Applied(ticket, release)
  }
}

/// Resuelve el release autoritativo a partir de las direcciones disponibles.
///
/// Todas las direcciones se consultan en paralelo; el [`ResolutionGate`]
/// compartido descarta las respuestas obsoletas o de menor prioridad, también
/// entre llamadas concurrentes a `resolve`. Una llamada no termina mientras
/// alguna de sus respuestas siga aparcada detrás de otra llamada.
pub struct ReleaseResolver<R> {
  repo: Arc<R>,
  gate: Mutex<ResolutionGate>,
  changes: watch::Sender<u64>,
}

impl<R> ReleaseResolver<R>
where
  R: ReleaseRepository,
{
  pub fn new(repo: Arc<R>) -> Self {
    Self { repo, gate: Mutex::new(ResolutionGate::new()), changes: watch::Sender::new(0) }
  }

  /// Devuelve `NotFound` si ninguna dirección propia encontró el release y
  /// `Superseded` si lo encontró pero ganó otra resolución.
  pub async fn resolve(&self, ctx: &mut SessionContext, request: &ResolveRequest) -> Result<Release, EditorError> {
    let addresses = request.addresses(ctx.remembered());
    if addresses.is_empty() {
      return Err(EditorError::NotFound);
    }

    let mut changes = self.changes.subscribe();
    let issued: Vec<(Ticket, ReleaseAddress)> = {
      let mut gate = self.gate();
      addresses.into_iter().map(|address| (gate.issue(address.rank()), address)).collect()
    };
    // Emitir puede invalidar tickets de otras llamadas.
    self.bump();

    let tickets = Tickets { resolver: self, mine: issued.iter().map(|(t, _)| *t).collect() };

    let mut lookups: FuturesUnordered<_> = issued
      .into_iter()
      .map(|(ticket, address)| async move { (ticket, self.lookup(&address).await) })
      .collect();

    let mut found = false;

    while let Some((ticket, outcome)) = lookups.next().await {
      found |= outcome.is_some();
      let decision = self.gate().offer(ticket, outcome);
      debug!(token = ticket.token, rank = ticket.rank, ?decision, "release lookup answered");

      if matches!(decision, GateDecision::Applied(..)) {
        self.bump();
      }
      let claimed = self.gate().claim(&tickets.mine);
      if let Some(release) = claimed {
        return Ok(self.accept(ctx, release));
      }
    }

    // Quedan respuestas aparcadas detrás de búsquedas de otras llamadas.
    loop {
      {
        let mut gate = self.gate();
        if let Some(release) = gate.claim(&tickets.mine) {
          drop(gate);
          return Ok(self.accept(ctx, release));
        }
        if !tickets.mine.iter().any(|t| gate.is_open(*t)) {
          break;
        }
      }
      if changes.changed().await.is_err() {
        break;
      }
    }

    if found {
      Err(EditorError::Superseded)
    } else {
      warn!("no address resolved to a release");
      Err(EditorError::NotFound)
    }
  }

  fn accept(&self, ctx: &mut SessionContext, release: Release) -> Release {
    info!(release_id = %release.id, "release resolved");
    ctx.remember(release.id);
    release
  }

  async fn lookup(&self, address: &ReleaseAddress) -> Option<Release> {
    let result = match address {
      ReleaseAddress::Id(id) | ReleaseAddress::Remembered(id) => self.repo.find_by_id(*id).await,
      ReleaseAddress::PublicId(public_id) => self.repo.find_by_public_id(public_id).await,
      ReleaseAddress::Slug(slug) => self.repo.find_by_slug(slug).await,
    };

    result.unwrap_or_else(|e| {
      warn!(?address, error = %e, "release lookup failed");
      None
    })
  }

  fn gate(&self) -> MutexGuard<'_, ResolutionGate> {
    self.gate.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn bump(&self) {
    self.changes.send_modify(|v| *v = v.wrapping_add(1));
  }
}

/// Tickets de una llamada a `resolve`; se retiran del gate al soltarse,
/// también si el futuro se cancela a medias.
struct Tickets<'a, R> {
  resolver: &'a ReleaseResolver<R>,
  mine: HashSet<Ticket>,
}

impl<R> Drop for Tickets<'_, R> {
  fn drop(&mut self) {
    let decision = self.resolver.gate.lock().unwrap_or_else(PoisonError::into_inner).retire(&self.mine);
    if matches!(decision, GateDecision::Applied(..)) {
      self.resolver.changes.send_modify(|v| *v = v.wrapping_add(1));
    }
  }
}
