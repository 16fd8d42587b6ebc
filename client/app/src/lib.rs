//! Orchestration layer for Xefers: configuration, the campaign creation and
//! redemption flows, the owner listing, and analytics history. Each flow
//! composes the gateway crates the way the corresponding page composed them.

pub mod config;
pub mod flows;
pub mod history;
