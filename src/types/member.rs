//! Member identity record, read only here.

use super::MemberId;

/// The parts of a forum member that receipts need
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub id: MemberId,
    /// Login name
    pub member_name: String,
    /// Display name
    pub real_name: String,
    pub email: String,
}
