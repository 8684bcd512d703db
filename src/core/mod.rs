pub mod error;
pub mod notice;
pub mod record;

pub use error::{ConsoleError, FieldError, Result, ValidationErrors};
pub use notice::{Notice, NoticeLevel, Notices};
pub use record::{FieldMap, ID_FIELD, LEGACY_ID_FIELD, Record, is_blank, record_id};
