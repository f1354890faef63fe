use serde_json::Value;
use tracing::info;

use crate::columns::{derive_columns, ColumnDef};
use crate::config::AppConfig;
use crate::edits::EditBuffer;
use crate::error::{Result, VisitorError};
use crate::export::{self, ClientEnvironment};
use crate::record::VisitorRecord;
use crate::store::VisitorStore;
use crate::summary::{summarize, SummaryStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    View,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Session {
    Unauthenticated,
    Authenticated { mode: TableMode },
}

/// One admin table session: owns the fetched row set, the derived columns
/// and summary, the edit buffer, and the mode state machine
/// `Unauthenticated -> Authenticated{View | Edit}`. Views read from it;
/// nothing here is shared across sessions.
pub struct VisitorTable<S: VisitorStore> {
    store: S,
    config: AppConfig,
    session: Session,
    rows: Vec<VisitorRecord>,
    columns: Vec<ColumnDef>,
    buffer: EditBuffer,
    stats: SummaryStats,
}

impl<S: VisitorStore> VisitorTable<S> {
    pub fn new(store: S, config: AppConfig) -> VisitorTable<S> {
        VisitorTable {
            store,
            config,
            session: Session::Unauthenticated,
            rows: Vec::new(),
            columns: Vec::new(),
            buffer: EditBuffer::new(),
            stats: SummaryStats::default(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.session, Session::Authenticated { .. })
    }

    pub fn mode(&self) -> Option<TableMode> {
        match self.session {
            Session::Unauthenticated => None,
            Session::Authenticated { mode } => Some(mode),
        }
    }

    pub fn rows(&self) -> &[VisitorRecord] {
        &self.rows
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn stats(&self) -> SummaryStats {
        self.stats
    }

    /// Rows with unflushed edits.
    pub fn pending_edit_count(&self) -> usize {
        self.buffer.len()
    }

    /// Admin credential check; on success runs the initial fetch. A
    /// mismatch is reported generically with no lockout or throttling.
    pub async fn login(&mut self, password: &str) -> Result<()> {
        if !self.config.admin_secret.verify(password) {
            return Err(VisitorError::Credential);
        }
        self.session = Session::Authenticated {
            mode: TableMode::View,
        };
        self.refetch().await
    }

    /// View -> Edit enables cell editing and the actions column.
    /// Edit -> View discards any unflushed edits.
    pub fn toggle_edit_mode(&mut self) -> Result<TableMode> {
        let mode = match self.session {
            Session::Unauthenticated => return Err(VisitorError::NotAuthenticated),
            Session::Authenticated {
                mode: TableMode::View,
            } => TableMode::Edit,
            Session::Authenticated {
                mode: TableMode::Edit,
            } => {
                self.buffer.clear();
                TableMode::View
            }
        };
        self.session = Session::Authenticated { mode };
        self.rebuild_derived();
        Ok(mode)
    }

    /// Buffers one cell edit. Accepted only in edit mode; values are taken
    /// as the grid produced them, unvalidated.
    pub fn record_edit(&mut self, row_id: i64, field: &str, value: Value) -> Result<()> {
        match self.session {
            Session::Unauthenticated => Err(VisitorError::NotAuthenticated),
            Session::Authenticated {
                mode: TableMode::View,
            } => Err(VisitorError::EditModeInactive),
            Session::Authenticated {
                mode: TableMode::Edit,
            } => {
                self.buffer.record_edit(row_id, field, value);
                Ok(())
            }
        }
    }

    /// Sends all buffered edits, then refetches the authoritative row set.
    /// On failure the buffer survives for an explicit user retry; nothing
    /// is retried automatically.
    pub async fn flush_edits(&mut self) -> Result<usize> {
        if self.mode() != Some(TableMode::Edit) {
            return Err(VisitorError::EditModeInactive);
        }
        let flushed = self.buffer.flush(&self.store).await?;
        self.refetch().await?;
        Ok(flushed)
    }

    /// Deletes one row by id. The UI must have confirmed with the user
    /// before calling; on success the row set is refetched, on failure the
    /// remote state is untouched so local state is left as is.
    pub async fn delete_visitor(&mut self, row_id: i64) -> Result<()> {
        if self.mode() != Some(TableMode::Edit) {
            return Err(VisitorError::EditModeInactive);
        }
        self.store.delete(row_id).await?;
        info!(row_id, "deleted visitor");
        self.refetch().await
    }

    pub fn export_rows(&self, environment: &ClientEnvironment) -> Result<String> {
        if !self.is_authenticated() {
            return Err(VisitorError::NotAuthenticated);
        }
        export::export_rows(&self.rows, environment)
    }

    /// Full refetch: the remote row set becomes authoritative, superseding
    /// any buffered edits, and columns plus summary are rebuilt from it.
    async fn refetch(&mut self) -> Result<()> {
        let rows = self.store.select_all().await?;
        info!(rows = rows.len(), "fetched visitor rows");
        self.buffer.clear();
        self.rows = rows;
        self.rebuild_derived();
        Ok(())
    }

    fn rebuild_derived(&mut self) {
        let edit_mode = self.mode() == Some(TableMode::Edit);
        self.columns = derive_columns(&self.rows, edit_mode);
        self.stats = summarize(&self.rows);
    }
}
