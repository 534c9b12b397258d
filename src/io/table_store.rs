//! CSV-backed subscription store
//!
//! Reads the three subscription tables from a data directory when opened and
//! rewrites `log_subscribed.csv` whenever a log row is saved. The rewrite goes
//! through a temporary file in the same directory that is then renamed over
//! the table, so readers never see a half-written file.
//!
//! Plan and log rows stay in their CSV form until a lookup asks for them. Only
//! the returned row's serialized columns are decoded, so a corrupt row fails
//! just the deliveries that target it. Rows that were never saved are written
//! back exactly as read.
//!
//! # Layout
//!
//! ```text
//! <data_dir>/subscriptions.csv   id_subscribe,name,cost,length
//! <data_dir>/members.csv         id_member,member_name,real_name,email_address
//! <data_dir>/log_subscribed.csv  id_sublog,id_subscribe,id_member,start_time,end_time,status,payments_pending,pending_details
//! ```

use crate::core::traits::SubscriptionStore;
use crate::io::csv_format::{
    log_from_row, log_to_row, member_from_row, plan_from_row, LogRow, MemberRow, PlanRow,
    LOGS_TABLE,
};
use crate::types::{
    Member, MemberId, StoreError, SubscriptionId, SubscriptionLog, SubscriptionPlan,
};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

pub const PLANS_FILE: &str = "subscriptions.csv";
pub const MEMBERS_FILE: &str = "members.csv";
pub const LOGS_FILE: &str = "log_subscribed.csv";

/// Subscription store over CSV tables in a data directory
#[derive(Debug, Clone)]
pub struct CsvTableStore {
    dir: PathBuf,
    members: HashMap<MemberId, Member>,
    plans: HashMap<SubscriptionId, PlanRow>,
    /// File order, which is also the order rows are written back in
    logs: Vec<LogRow>,
}

impl CsvTableStore {
    /// Open the tables in `dir`
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if a table file is missing or unreadable and
    /// `StoreError::Csv` if a row does not parse. Serialized columns are not
    /// decoded here.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();

        let members = read_table::<MemberRow>(&dir.join(MEMBERS_FILE))?
            .into_iter()
            .map(|row| {
                let member = member_from_row(row);
                (member.id, member)
            })
            .collect::<HashMap<_, _>>();

        let plans = read_table::<PlanRow>(&dir.join(PLANS_FILE))?
            .into_iter()
            .map(|row| (row.id_subscribe, row))
            .collect::<HashMap<_, _>>();

        let logs = read_table::<LogRow>(&dir.join(LOGS_FILE))?;

        debug!(
            data_dir = %dir.display(),
            members = members.len(),
            plans = plans.len(),
            logs = logs.len(),
            "Subscription tables loaded"
        );

        Ok(CsvTableStore {
            dir,
            members,
            plans,
            logs,
        })
    }

    /// Rewrite `log_subscribed.csv` from the in-memory rows
    fn write_logs(&self) -> Result<(), StoreError> {
        let path = self.dir.join(LOGS_FILE);

        let mut temp = NamedTempFile::new_in(&self.dir).map_err(|e| StoreError::io(&path, &e))?;
        {
            let mut writer = WriterBuilder::new().from_writer(temp.as_file_mut());
            for row in &self.logs {
                writer
                    .serialize(row)
                    .map_err(|e| StoreError::csv(&path, &e))?;
            }
            writer.flush().map_err(|e| StoreError::io(&path, &e))?;
        }
        temp.as_file().sync_all().map_err(|e| StoreError::io(&path, &e))?;
        temp.persist(&path)
            .map_err(|e| StoreError::io(&path, &e.error))?;

        Ok(())
    }
}

impl SubscriptionStore for CsvTableStore {
    fn member(&self, member_id: MemberId) -> Result<Option<Member>, StoreError> {
        Ok(self.members.get(&member_id).cloned())
    }

    fn plan(&self, subscription_id: SubscriptionId) -> Result<Option<SubscriptionPlan>, StoreError> {
        self.plans
            .get(&subscription_id)
            .cloned()
            .map(plan_from_row)
            .transpose()
    }

    fn subscription_log(
        &self,
        subscription_id: SubscriptionId,
        member_id: MemberId,
    ) -> Result<Option<SubscriptionLog>, StoreError> {
        self.logs
            .iter()
            .filter(|row| row.id_subscribe == subscription_id && row.id_member == member_id)
            .min_by_key(|row| row.id_sublog)
            .cloned()
            .map(log_from_row)
            .transpose()
    }

    fn save_subscription_log(&mut self, log: &SubscriptionLog) -> Result<(), StoreError> {
        let index = self
            .logs
            .iter()
            .position(|row| row.id_sublog == log.id)
            .ok_or(StoreError::MissingRow {
                table: LOGS_TABLE,
                row_id: log.id,
            })?;

        let previous = std::mem::replace(&mut self.logs[index], log_to_row(log)?);
        if let Err(e) = self.write_logs() {
            self.logs[index] = previous;
            return Err(e);
        }

        debug!(id_sublog = log.id, "Subscription log row saved");
        Ok(())
    }
}

/// Read every row of a headed CSV table
fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, &e))?;
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(file);

    reader
        .deserialize()
        .map(|record| record.map_err(|e| StoreError::csv(path, &e)))
        .collect()
}
