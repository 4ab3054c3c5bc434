//! Flatten the account summary hierarchy

use crate::reporting::AccountSummaries;
use serde::Serialize;

/// One (account, web property, profile) triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummaryRecord {
    pub account_id: String,
    pub brand: String,
    pub space: String,
    pub property_id: String,
    pub profile_id: String,
    pub profile_name: String,
}

/// One record per profile, labelled with the caller's brand and space
///
/// Accounts without properties and properties without profiles produce no
/// records.
pub fn flatten_account_summaries(
    summaries: &AccountSummaries,
    brand: &str,
    space: &str,
) -> Vec<AccountSummaryRecord> {
    summaries
        .items
        .iter()
        .flat_map(|account| {
            account.web_properties.iter().flat_map(move |property| {
                property.profiles.iter().map(move |profile| AccountSummaryRecord {
                    account_id: account.id.clone(),
                    brand: brand.to_string(),
                    space: space.to_string(),
                    property_id: property.id.clone(),
                    profile_id: profile.id.clone(),
                    profile_name: profile.name.clone(),
                })
            })
        })
        .collect()
}
