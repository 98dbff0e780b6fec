// Core models
pub mod document;
pub mod event;
pub mod primary;
pub mod report_row;

pub use document::{Collection, Document};
pub use event::{EventKind, EventStatus, RelationEvent};
pub use primary::{PrimaryRecord, ReceiptType};
pub use report_row::{sort_rows, ReportRow, RowOrder};
