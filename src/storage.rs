//! Fichier de session : historique des novedades d'une session de travail.
//!
//! Le fichier est nommé explicitement par l'appelant ; rien n'est partagé
//! entre sessions.

use crate::leave::{LeaveRegistry, LeaveSubmission};
use crate::model::Operator;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Contenu persistant d'une session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaveSession {
    pub operators: Vec<Operator>,
    #[serde(default)]
    pub history: Vec<LeaveSubmission>,
}

impl LeaveSession {
    pub fn from_registry(operators: &[Operator], registry: &LeaveRegistry) -> Self {
        Self {
            operators: operators.to_vec(),
            history: registry.history().to_vec(),
        }
    }

    /// Rejoue l'historique sur le roster courant.
    pub fn into_registry(self, roster: &[Operator]) -> anyhow::Result<LeaveRegistry> {
        LeaveRegistry::replay(roster, self.history).context("replaying leave history")
    }
}

pub trait SessionStore {
    /// Charge la session ; `None` si elle n'existe pas encore.
    fn load(&self) -> anyhow::Result<Option<LeaveSession>>;
    /// Sauvegarde de manière atomique.
    fn save(&self, session: &LeaveSession) -> anyhow::Result<()>;
}

pub struct JsonSessionStore {
    path: PathBuf,
}

impl JsonSessionStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonSessionStore {
    fn load(&self) -> anyhow::Result<Option<LeaveSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let session: LeaveSession = serde_json::from_slice(&data)
            .with_context(|| format!("parsing session {}", self.path.display()))?;
        Ok(Some(session))
    }

    fn save(&self, session: &LeaveSession) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(session)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        info!(
            path = %self.path.display(),
            submissions = session.history.len(),
            "leave session saved"
        );
        Ok(())
    }
}
