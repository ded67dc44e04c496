use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use rest_client::{EntriesQuery, RestApi, RestError, RestResult};
use rest_subgraph::RestSubgraph;
use serde_json::{json, Map, Value};

type Call = (&'static str, Vec<String>);

/// Answers every REST call with a canned document and records its arguments.
#[derive(Default)]
struct FakeRest {
    documents: HashMap<&'static str, Value>,
    failures: HashMap<&'static str, fn() -> RestError>,
    calls: Mutex<Vec<Call>>,
}

impl FakeRest {
    fn with(mut self, method: &'static str, document: Value) -> Self {
        self.documents.insert(method, document);
        self
    }

    fn failing(mut self, method: &'static str, error: fn() -> RestError) -> Self {
        self.failures.insert(method, error);
        self
    }

    fn respond(&self, method: &'static str, args: Vec<String>) -> RestResult {
        self.calls.lock().unwrap().push((method, args));
        if let Some(error) = self.failures.get(method) {
            return Err(error());
        }
        Ok(self.documents.get(method).cloned().unwrap_or(Value::Null))
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

fn args<const N: usize>(values: [&str; N]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

#[async_trait::async_trait]
impl RestApi for FakeRest {
    async fn google_accounts(&self) -> RestResult {
        self.respond("google_accounts", vec![])
    }

    async fn google_account_integrations(
        &self,
        google_account_id: &str,
        account_list_id: &str,
    ) -> RestResult {
        self.respond("google_account_integrations", args([google_account_id, account_list_id]))
    }

    async fn create_google_integration(
        &self,
        google_account_id: &str,
        account_list_id: &str,
        attributes: Map<String, Value>,
    ) -> RestResult {
        let attributes = Value::Object(attributes).to_string();
        self.respond(
            "create_google_integration",
            args([google_account_id, account_list_id, &attributes]),
        )
    }

    async fn update_google_integration(
        &self,
        google_account_id: &str,
        integration_id: &str,
        attributes: Map<String, Value>,
    ) -> RestResult {
        let attributes = Value::Object(attributes).to_string();
        self.respond(
            "update_google_integration",
            args([google_account_id, integration_id, &attributes]),
        )
    }

    async fn sync_google_integration(
        &self,
        google_account_id: &str,
        integration_id: &str,
        integration: &str,
    ) -> RestResult {
        self.respond(
            "sync_google_integration",
            args([google_account_id, integration_id, integration]),
        )
    }

    async fn delete_google_account(&self, google_account_id: &str) -> RestResult {
        self.respond("delete_google_account", args([google_account_id]))
    }

    async fn mailchimp_account(&self, account_list_id: &str) -> RestResult {
        self.respond("mailchimp_account", args([account_list_id]))
    }

    async fn sync_mailchimp_account(&self, account_list_id: &str) -> RestResult {
        self.respond("sync_mailchimp_account", args([account_list_id]))
    }

    async fn delete_mailchimp_account(&self, account_list_id: &str) -> RestResult {
        self.respond("delete_mailchimp_account", args([account_list_id]))
    }

    async fn notification_preferences(&self, account_list_id: &str) -> RestResult {
        self.respond("notification_preferences", args([account_list_id]))
    }

    async fn search_organization_account_lists(
        &self,
        organization_id: &str,
        search: &str,
        page: u32,
    ) -> RestResult {
        self.respond(
            "search_organization_account_lists",
            args([organization_id, search, &page.to_string()]),
        )
    }

    async fn search_organization_contacts(
        &self,
        organization_id: &str,
        search: &str,
        page: u32,
    ) -> RestResult {
        self.respond(
            "search_organization_contacts",
            args([organization_id, search, &page.to_string()]),
        )
    }

    async fn organization_invites(&self, organization_id: &str) -> RestResult {
        self.respond("organization_invites", args([organization_id]))
    }

    async fn delete_organization_invite(
        &self,
        organization_id: &str,
        invite_id: &str,
    ) -> RestResult {
        self.respond("delete_organization_invite", args([organization_id, invite_id]))
    }

    async fn export_data(
        &self,
        account_list_id: &str,
        format: &str,
        mailing: bool,
        labels: Option<&str>,
    ) -> RestResult {
        self.respond(
            "export_data",
            args([account_list_id, format, &mailing.to_string(), labels.unwrap_or("-")]),
        )
    }

    async fn designation_accounts(&self, account_list_id: &str) -> RestResult {
        self.respond("designation_accounts", args([account_list_id]))
    }

    async fn financial_account_summary(
        &self,
        account_list_id: &str,
        financial_account_id: &str,
    ) -> RestResult {
        self.respond("financial_account_summary", args([account_list_id, financial_account_id]))
    }

    async fn financial_account_entries(
        &self,
        account_list_id: &str,
        financial_account_id: &str,
        query: &EntriesQuery,
    ) -> RestResult {
        self.respond(
            "financial_account_entries",
            args([account_list_id, financial_account_id, &format!("{query:?}")]),
        )
    }

    async fn expected_monthly_totals(&self, account_list_id: &str) -> RestResult {
        self.respond("expected_monthly_totals", args([account_list_id]))
    }

    async fn excluded_appeal_contacts(
        &self,
        appeal_id: &str,
        page: u32,
        per_page: u32,
    ) -> RestResult {
        self.respond(
            "excluded_appeal_contacts",
            args([appeal_id, &page.to_string(), &per_page.to_string()]),
        )
    }

    async fn delete_excluded_appeal_contact(
        &self,
        appeal_id: &str,
        excluded_appeal_contact_id: &str,
    ) -> RestResult {
        self.respond(
            "delete_excluded_appeal_contact",
            args([appeal_id, excluded_appeal_contact_id]),
        )
    }
}

fn subgraph() -> RestSubgraph {
    rest_subgraph::build().unwrap()
}

async fn execute(rest: &Arc<FakeRest>, query: &str) -> (Value, Vec<async_graphql::ServerError>) {
    let response = subgraph().execute(query, rest.clone()).await;
    (response.data.into_json().unwrap(), response.errors)
}

#[test]
fn test_every_area_is_composed() {
    let subgraph = subgraph();
    let queries: Vec<&str> = subgraph.query_fields().iter().map(String::as_str).collect();
    assert_eq!(
        queries,
        vec![
            "googleAccounts",
            "googleAccountIntegrations",
            "mailchimpAccount",
            "notificationPreferences",
            "searchOrganizationsAccountLists",
            "searchOrganizationsContacts",
            "organizationInvites",
            "designationAccounts",
            "financialAccountSummary",
            "financialAccountEntries",
            "expectedMonthlyTotalReport",
            "excludedAppealContacts",
        ]
    );
    let mutations: Vec<&str> = subgraph.mutation_fields().iter().map(String::as_str).collect();
    assert_eq!(
        mutations,
        vec![
            "createGoogleIntegration",
            "updateGoogleIntegration",
            "syncGoogleAccount",
            "deleteGoogleAccount",
            "syncMailchimpAccount",
            "deleteMailchimpAccount",
            "deleteOrganizationInvite",
            "exportData",
            "deleteExcludedAppealContact",
        ]
    );
}

#[tokio::test]
async fn test_google_accounts_are_mapped() {
    let rest = Arc::new(FakeRest::default().with(
        "google_accounts",
        json!({
            "data": [{
                "id": "1",
                "type": "google_accounts",
                "attributes": { "email": "a@b.c", "token_expired": false, "remote_id": "r" }
            }]
        }),
    ));
    let (data, errors) =
        execute(&rest, "{ googleAccounts { id email tokenExpired remoteId } }").await;
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(
        data,
        json!({
            "googleAccounts": [
                { "id": "1", "email": "a@b.c", "tokenExpired": false, "remoteId": "r" }
            ]
        })
    );
}

#[tokio::test]
async fn test_integration_calendars_and_activity_types() {
    let rest = Arc::new(FakeRest::default().with(
        "google_account_integrations",
        json!({
            "data": [{
                "id": "i-1",
                "type": "google_integrations",
                "attributes": {
                    "calendar_integration": true,
                    "calendar_integrations": ["Appointment", "call"],
                    "calendars": [{ "id": "primary", "name": "Main", "extra_key": 1 }]
                }
            }]
        }),
    ));
    let (data, errors) = execute(
        &rest,
        r#"{ googleAccountIntegrations(input: { googleAccountId: "g-1", accountListId: "al-1" }) {
            id calendarIntegration calendarIntegrations calendars { id name } } }"#,
    )
    .await;
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(
        data,
        json!({
            "googleAccountIntegrations": [{
                "id": "i-1",
                "calendarIntegration": true,
                "calendarIntegrations": ["APPOINTMENT", "CALL"],
                "calendars": [{ "id": "primary", "name": "Main" }]
            }]
        })
    );
    assert_eq!(
        rest.calls(),
        vec![("google_account_integrations", args(["g-1", "al-1"]))]
    );
}

#[tokio::test]
async fn test_integration_input_is_sent_as_snake_case_attributes() {
    let rest = Arc::new(FakeRest::default().with(
        "create_google_integration",
        json!({
            "data": {
                "id": "i-2",
                "type": "google_integrations",
                "attributes": { "calendar_id": "cal" }
            }
        }),
    ));
    let (data, errors) = execute(
        &rest,
        r#"mutation { createGoogleIntegration(input: {
            googleAccountId: "g-1",
            accountListId: "al-1",
            googleIntegration: { calendarIntegration: true, calendarId: "cal", calendarName: null }
        }) { id calendarId } }"#,
    )
    .await;
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(data, json!({ "createGoogleIntegration": { "id": "i-2", "calendarId": "cal" } }));
    assert_eq!(
        rest.calls(),
        vec![(
            "create_google_integration",
            args(["g-1", "al-1", r#"{"calendar_integration":true,"calendar_id":"cal"}"#])
        )]
    );
}

#[tokio::test]
async fn test_missing_mailchimp_account_is_null() {
    let rest = Arc::new(FakeRest::default().failing("mailchimp_account", || RestError::NotFound));
    let (data, errors) = execute(
        &rest,
        r#"{ mailchimpAccount(input: { accountListId: "al-1" }) { id } }"#,
    )
    .await;
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(data, json!({ "mailchimpAccount": null }));
}

#[tokio::test]
async fn test_rest_failures_become_coded_field_errors() {
    let rest = Arc::new(
        FakeRest::default().failing("organization_invites", || RestError::InvalidBaseUrl),
    );
    let (data, errors) = execute(
        &rest,
        r#"{ organizationInvites(input: { organizationId: "o-1" }) { id } }"#,
    )
    .await;
    assert_eq!(data, Value::Null);
    assert_eq!(errors.len(), 1);
    let extensions = serde_json::to_value(&errors[0].extensions).unwrap();
    assert_eq!(extensions, json!({ "code": "NETWORK_ERROR" }));
}

#[tokio::test]
async fn test_search_defaults_and_pagination() {
    let rest = Arc::new(FakeRest::default().with(
        "search_organization_contacts",
        json!({
            "data": [{
                "id": "c-1",
                "type": "contacts",
                "attributes": { "name": "Smith, Jo" },
                "relationships": { "people": { "data": [{ "id": "p-1", "type": "people" }] } }
            }],
            "included": [{ "id": "p-1", "type": "people", "attributes": { "first_name": "Jo" } }],
            "meta": {
                "pagination": { "page": "1", "per_page": 10, "total_count": 1, "total_pages": 1 }
            }
        }),
    ));
    let (data, errors) = execute(
        &rest,
        r#"{ searchOrganizationsContacts(input: { organizationId: "o-1", pageNumber: null }) {
            contacts { id name people { id firstName } }
            pagination { page perPage totalCount totalPages } } }"#,
    )
    .await;
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(
        data,
        json!({
            "searchOrganizationsContacts": {
                "contacts": [{
                    "id": "c-1",
                    "name": "Smith, Jo",
                    "people": [{ "id": "p-1", "firstName": "Jo" }]
                }],
                "pagination": { "page": 1, "perPage": 10, "totalCount": 1, "totalPages": 1 }
            }
        })
    );
    assert_eq!(
        rest.calls(),
        vec![("search_organization_contacts", args(["o-1", "", "1"]))]
    );
}

#[tokio::test]
async fn test_designation_accounts_are_grouped_with_numeric_balances() {
    let rest = Arc::new(FakeRest::default().with(
        "designation_accounts",
        json!({
            "data": [
                {
                    "id": "d-1",
                    "type": "designation_accounts",
                    "attributes": { "balance": "12.5", "converted_balance": "abc" },
                    "relationships": {
                        "organization": { "data": { "id": "o-1", "type": "organizations" } }
                    }
                },
                {
                    "id": "d-2",
                    "type": "designation_accounts",
                    "attributes": { "balance": 3, "converted_balance": 3 },
                    "relationships": {
                        "organization": { "data": { "id": "o-1", "type": "organizations" } }
                    }
                }
            ],
            "included": [{ "id": "o-1", "type": "organizations", "attributes": { "name": "Cru" } }]
        }),
    ));
    let (data, errors) = execute(
        &rest,
        r#"{ designationAccounts(input: { accountListId: "al-1" }) {
            organizationName designationAccounts { id balance convertedBalance } } }"#,
    )
    .await;
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(
        data,
        json!({
            "designationAccounts": [{
                "organizationName": "Cru",
                "designationAccounts": [
                    { "id": "d-1", "balance": 12.5, "convertedBalance": 0 },
                    { "id": "d-2", "balance": 3.0, "convertedBalance": 3.0 }
                ]
            }]
        })
    );
}

#[tokio::test]
async fn test_notification_types_are_inlined() {
    let rest = Arc::new(FakeRest::default().with(
        "notification_preferences",
        json!({
            "data": [{
                "id": "n-1",
                "type": "notification_preferences",
                "attributes": { "app": true, "email": false, "task": true },
                "relationships": {
                    "notification_type": { "data": { "id": "t-1", "type": "notification_types" } }
                }
            }],
            "included": [{
                "id": "t-1",
                "type": "notification_types",
                "attributes": { "description_for_email": "Partner missed a gift" }
            }]
        }),
    ));
    let (data, errors) = execute(
        &rest,
        r#"{ notificationPreferences(input: { accountListId: "al-1" }) {
            id app notificationType { id descriptionForEmail } } }"#,
    )
    .await;
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(
        data,
        json!({
            "notificationPreferences": [{
                "id": "n-1",
                "app": true,
                "notificationType": { "id": "t-1", "descriptionForEmail": "Partner missed a gift" }
            }]
        })
    );
}

#[tokio::test]
async fn test_export_returns_the_export_id() {
    let rest = Arc::new(FakeRest::default().with(
        "export_data",
        json!({ "data": { "id": 42, "type": "export_logs", "attributes": {} } }),
    ));
    let (data, errors) = execute(
        &rest,
        r#"mutation {
            exportData(input: { accountListId: "al-1", format: "csv", mailing: true })
        }"#,
    )
    .await;
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(data, json!({ "exportData": "42" }));
    assert_eq!(rest.calls(), vec![("export_data", args(["al-1", "csv", "true", "-"]))]);
}

#[tokio::test]
async fn test_excluded_appeal_contacts_default_paging() {
    let rest = Arc::new(FakeRest::default());
    let (data, errors) = execute(
        &rest,
        r#"{
            excludedAppealContacts(input: { appealId: "a-1" }) { nodes { id } pagination { page } }
        }"#,
    )
    .await;
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(data, json!({ "excludedAppealContacts": { "nodes": [], "pagination": null } }));
    assert_eq!(
        rest.calls(),
        vec![("excluded_appeal_contacts", args(["a-1", "1", "25"]))]
    );
}

#[tokio::test]
async fn test_entries_filters_default_to_empty_search() {
    let rest = Arc::new(FakeRest::default());
    let (_, errors) = execute(
        &rest,
        r#"{ financialAccountEntries(input: {
            accountListId: "al-1", financialAccountId: "fa-1", dateRange: "2024-01-01..2024-01-31"
        }) { entries { id } } }"#,
    )
    .await;
    assert!(errors.is_empty(), "{errors:?}");
    let query = EntriesQuery {
        date_range: Some("2024-01-01..2024-01-31".to_string()),
        category_id: None,
        wildcard_search: Some(String::new()),
        sort: None,
    };
    assert_eq!(
        rest.calls(),
        vec![("financial_account_entries", args(["al-1", "fa-1", &format!("{query:?}")]))]
    );
}
