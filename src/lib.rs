pub mod columns;
pub mod config;
pub mod controller;
pub mod edits;
pub mod error;
pub mod export;
pub mod record;
pub mod registration;
pub mod store;
pub mod summary;

pub use columns::{derive_columns, CellRenderer, ColumnDef};
pub use config::{AppConfig, SecretHash};
pub use controller::{TableMode, VisitorTable};
pub use edits::EditBuffer;
pub use error::{Result, VisitorError};
pub use export::ClientEnvironment;
pub use record::{NewVisitor, VisitorRecord};
pub use registration::{check_access, upload_visitor_data, Photo, RegistrationForm};
pub use store::{SupabaseStore, VisitorStore};
pub use summary::{summarize, SummaryStats};
