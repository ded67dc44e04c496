//! Donation and financial reports.

mod designation_accounts;
mod expected_monthly_totals;
mod financial_accounts;

use crate::composer::SubgraphDescriptor;

pub fn reports() -> Vec<SubgraphDescriptor> {
    vec![
        designation_accounts::descriptor(),
        financial_accounts::descriptor(),
        expected_monthly_totals::descriptor(),
    ]
}
