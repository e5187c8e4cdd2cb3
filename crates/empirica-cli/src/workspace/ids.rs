use chrono::Utc;
use uuid::Uuid;

const SHORT_ID_LEN: usize = 8;

/// Sortable run identifier: `<date>__run_<first 8 hex digits of a v4 uuid>`.
pub fn new_run_id() -> String {
    let mut short = Uuid::new_v4().simple().to_string();
    short.truncate(SHORT_ID_LEN);
    format!("{}__run_{short}", Utc::now().format("%Y-%m-%d"))
}
