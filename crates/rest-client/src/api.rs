//! The REST operations used by the rest subgraph, one method each.
//!
//! Every method returns the JSON:API document as returned by the backend;
//! mapping it into GraphQL shapes is the caller's business.

use reqwest::Method;
use serde_json::{json, Map, Value};

use crate::client::RestClient;
use crate::error::RestResult;

/// Page size of the organization searches.
pub const ORGANIZATION_SEARCH_PER_PAGE: u32 = 10;

/// Filters of a financial account entries listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntriesQuery {
    /// `YYYY-MM-DD..YYYY-MM-DD`
    pub date_range: Option<String>,
    pub category_id: Option<String>,
    pub wildcard_search: Option<String>,
    pub sort: Option<String>,
}

#[async_trait::async_trait]
pub trait RestApi: Send + Sync {
    async fn google_accounts(&self) -> RestResult;

    async fn google_account_integrations(
        &self,
        google_account_id: &str,
        account_list_id: &str,
    ) -> RestResult;

    async fn create_google_integration(
        &self,
        google_account_id: &str,
        account_list_id: &str,
        attributes: Map<String, Value>,
    ) -> RestResult;

    async fn update_google_integration(
        &self,
        google_account_id: &str,
        integration_id: &str,
        attributes: Map<String, Value>,
    ) -> RestResult;

    /// `integration` names what to sync, e.g. `calendar`.
    async fn sync_google_integration(
        &self,
        google_account_id: &str,
        integration_id: &str,
        integration: &str,
    ) -> RestResult;

    async fn delete_google_account(&self, google_account_id: &str) -> RestResult;

    async fn mailchimp_account(&self, account_list_id: &str) -> RestResult;

    async fn sync_mailchimp_account(&self, account_list_id: &str) -> RestResult;

    async fn delete_mailchimp_account(&self, account_list_id: &str) -> RestResult;

    async fn notification_preferences(&self, account_list_id: &str) -> RestResult;

    async fn search_organization_account_lists(
        &self,
        organization_id: &str,
        search: &str,
        page: u32,
    ) -> RestResult;

    async fn search_organization_contacts(
        &self,
        organization_id: &str,
        search: &str,
        page: u32,
    ) -> RestResult;

    async fn organization_invites(&self, organization_id: &str) -> RestResult;

    async fn delete_organization_invite(
        &self,
        organization_id: &str,
        invite_id: &str,
    ) -> RestResult;

    async fn export_data(
        &self,
        account_list_id: &str,
        format: &str,
        mailing: bool,
        labels: Option<&str>,
    ) -> RestResult;

    async fn designation_accounts(&self, account_list_id: &str) -> RestResult;

    async fn financial_account_summary(
        &self,
        account_list_id: &str,
        financial_account_id: &str,
    ) -> RestResult;

    async fn financial_account_entries(
        &self,
        account_list_id: &str,
        financial_account_id: &str,
        query: &EntriesQuery,
    ) -> RestResult;

    async fn expected_monthly_totals(&self, account_list_id: &str) -> RestResult;

    async fn excluded_appeal_contacts(
        &self,
        appeal_id: &str,
        page: u32,
        per_page: u32,
    ) -> RestResult;

    async fn delete_excluded_appeal_contact(
        &self,
        appeal_id: &str,
        excluded_appeal_contact_id: &str,
    ) -> RestResult;
}

#[async_trait::async_trait]
impl RestApi for RestClient {
    async fn google_accounts(&self) -> RestResult {
        self.send(Method::GET, &["user", "google_accounts"], &[], None)
            .await
    }

    async fn google_account_integrations(
        &self,
        google_account_id: &str,
        account_list_id: &str,
    ) -> RestResult {
        self.send(
            Method::GET,
            &["user", "google_accounts", google_account_id, "google_integrations"],
            &[("account_list_id", account_list_id.to_string())],
            None,
        )
        .await
    }

    async fn create_google_integration(
        &self,
        google_account_id: &str,
        account_list_id: &str,
        attributes: Map<String, Value>,
    ) -> RestResult {
        let body = json!({
            "data": {
                "type": "google_integrations",
                "attributes": attributes,
                "relationships": {
                    "account_list": { "data": { "type": "account_lists", "id": account_list_id } }
                }
            }
        });
        self.send(
            Method::POST,
            &["user", "google_accounts", google_account_id, "google_integrations"],
            &[],
            Some(&body),
        )
        .await
    }

    async fn update_google_integration(
        &self,
        google_account_id: &str,
        integration_id: &str,
        attributes: Map<String, Value>,
    ) -> RestResult {
        let body = json!({
            "data": {
                "id": integration_id,
                "type": "google_integrations",
                "attributes": attributes
            }
        });
        self.send(
            Method::PUT,
            &[
                "user",
                "google_accounts",
                google_account_id,
                "google_integrations",
                integration_id,
            ],
            &[],
            Some(&body),
        )
        .await
    }

    async fn sync_google_integration(
        &self,
        google_account_id: &str,
        integration_id: &str,
        integration: &str,
    ) -> RestResult {
        self.send(
            Method::GET,
            &[
                "user",
                "google_accounts",
                google_account_id,
                "google_integrations",
                integration_id,
                "sync",
            ],
            &[("integration", integration.to_string())],
            None,
        )
        .await
    }

    async fn delete_google_account(&self, google_account_id: &str) -> RestResult {
        self.send(
            Method::DELETE,
            &["user", "google_accounts", google_account_id],
            &[],
            None,
        )
        .await
    }

    async fn mailchimp_account(&self, account_list_id: &str) -> RestResult {
        self.send(
            Method::GET,
            &["account_lists", account_list_id, "mail_chimp_account"],
            &[],
            None,
        )
        .await
    }

    async fn sync_mailchimp_account(&self, account_list_id: &str) -> RestResult {
        self.send(
            Method::GET,
            &["account_lists", account_list_id, "mail_chimp_account", "sync"],
            &[],
            None,
        )
        .await
    }

    async fn delete_mailchimp_account(&self, account_list_id: &str) -> RestResult {
        self.send(
            Method::DELETE,
            &["account_lists", account_list_id, "mail_chimp_account"],
            &[],
            None,
        )
        .await
    }

    async fn notification_preferences(&self, account_list_id: &str) -> RestResult {
        self.send(
            Method::GET,
            &["account_lists", account_list_id, "notification_preferences"],
            &[("include", "notification_type".to_string())],
            None,
        )
        .await
    }

    async fn search_organization_account_lists(
        &self,
        organization_id: &str,
        search: &str,
        page: u32,
    ) -> RestResult {
        self.send(
            Method::GET,
            &["organizations", organization_id, "account_lists"],
            &[
                ("search", search.to_string()),
                ("page", page.to_string()),
                ("per_page", ORGANIZATION_SEARCH_PER_PAGE.to_string()),
                ("include", "users".to_string()),
            ],
            None,
        )
        .await
    }

    async fn search_organization_contacts(
        &self,
        organization_id: &str,
        search: &str,
        page: u32,
    ) -> RestResult {
        self.send(
            Method::GET,
            &["organizations", organization_id, "contacts"],
            &[
                ("search", search.to_string()),
                ("page", page.to_string()),
                ("per_page", ORGANIZATION_SEARCH_PER_PAGE.to_string()),
                ("include", "people".to_string()),
            ],
            None,
        )
        .await
    }

    async fn organization_invites(&self, organization_id: &str) -> RestResult {
        self.send(
            Method::GET,
            &["organizations", organization_id, "invites"],
            &[],
            None,
        )
        .await
    }

    async fn delete_organization_invite(
        &self,
        organization_id: &str,
        invite_id: &str,
    ) -> RestResult {
        self.send(
            Method::DELETE,
            &["organizations", organization_id, "invites", invite_id],
            &[],
            None,
        )
        .await
    }

    async fn export_data(
        &self,
        account_list_id: &str,
        format: &str,
        mailing: bool,
        labels: Option<&str>,
    ) -> RestResult {
        let mut params = Map::new();
        let export_type = if mailing { "mailing" } else { "contacts" };
        params.insert("type".to_string(), Value::from(export_type));
        if let Some(labels) = labels {
            params.insert("labels".to_string(), Value::from(labels));
        }
        let body = json!({
            "data": {
                "type": "export_logs",
                "attributes": {
                    "export_format": format,
                    "params": params
                }
            }
        });
        self.send(
            Method::POST,
            &["account_lists", account_list_id, "exports"],
            &[],
            Some(&body),
        )
        .await
    }

    async fn designation_accounts(&self, account_list_id: &str) -> RestResult {
        self.send(
            Method::GET,
            &["account_lists", account_list_id, "designation_accounts"],
            &[("include", "organization".to_string())],
            None,
        )
        .await
    }

    async fn financial_account_summary(
        &self,
        account_list_id: &str,
        financial_account_id: &str,
    ) -> RestResult {
        self.send(
            Method::GET,
            &[
                "account_lists",
                account_list_id,
                "financial_accounts",
                financial_account_id,
                "summaries",
            ],
            &[("include", "categories".to_string())],
            None,
        )
        .await
    }

    async fn financial_account_entries(
        &self,
        account_list_id: &str,
        financial_account_id: &str,
        query: &EntriesQuery,
    ) -> RestResult {
        let mut params = vec![("include", "category".to_string())];
        if let Some(date_range) = &query.date_range {
            params.push(("filter[entry_date]", date_range.clone()));
        }
        if let Some(category_id) = &query.category_id {
            params.push(("filter[category_id]", category_id.clone()));
        }
        if let Some(search) = query.wildcard_search.as_ref().filter(|search| !search.is_empty()) {
            params.push(("filter[wildcard_search]", search.clone()));
        }
        if let Some(sort) = &query.sort {
            params.push(("sort", sort.clone()));
        }
        self.send(
            Method::GET,
            &[
                "account_lists",
                account_list_id,
                "financial_accounts",
                financial_account_id,
                "entries",
            ],
            &params,
            None,
        )
        .await
    }

    async fn expected_monthly_totals(&self, account_list_id: &str) -> RestResult {
        self.send(
            Method::GET,
            &["reports", "expected_monthly_totals"],
            &[("account_list_id", account_list_id.to_string())],
            None,
        )
        .await
    }

    async fn excluded_appeal_contacts(
        &self,
        appeal_id: &str,
        page: u32,
        per_page: u32,
    ) -> RestResult {
        self.send(
            Method::GET,
            &["appeals", appeal_id, "excluded_appeal_contacts"],
            &[
                ("include", "contact".to_string()),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ],
            None,
        )
        .await
    }

    async fn delete_excluded_appeal_contact(
        &self,
        appeal_id: &str,
        excluded_appeal_contact_id: &str,
    ) -> RestResult {
        self.send(
            Method::DELETE,
            &[
                "appeals",
                appeal_id,
                "excluded_appeal_contacts",
                excluded_appeal_contact_id,
            ],
            &[],
            None,
        )
        .await
    }
}
