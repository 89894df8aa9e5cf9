//! Membership-welfare record keeping: extraction of monthly
//! contribution tables from hand-maintained spreadsheets, local or
//! shared online.

pub mod config;
pub mod fetch;
pub mod housekeeping;
pub mod locate;
pub mod report;
pub mod summary;
pub mod workbook;
