//! The settings pages: connected services, notifications, organization
//! administration and data exports.

mod export_data;
mod google;
mod mailchimp;
mod notifications;
mod organizations;

use crate::composer::SubgraphDescriptor;

pub fn preferences() -> Vec<SubgraphDescriptor> {
    vec![
        google::descriptor(),
        mailchimp::descriptor(),
        notifications::descriptor(),
        organizations::descriptor(),
        export_data::descriptor(),
    ]
}
