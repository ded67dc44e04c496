use async_graphql::dynamic::{FieldFuture, TypeRef};
use field_mapper::{Coercion, TypeMapping};
use serde_json::{Map, Value};

use crate::composer::{RootField, SubgraphDescriptor};
use crate::context::{data_sources, rest_error, Input};
use crate::fields::{input_object, object, to_field_value};

const REPORT: &str = "ExpectedMonthlyTotalReport";
const DONATION: &str = "ExpectedMonthlyTotalDonation";
/// The resource as returned by the REST API, before grouping.
const REPORT_RESOURCE: &str = "ExpectedMonthlyTotals";
const LIKELIHOODS: [&str; 3] = ["received", "likely", "unlikely"];

pub fn descriptor() -> SubgraphDescriptor {
    SubgraphDescriptor::new("ExpectedMonthlyTotals")
        .object(object(
            REPORT,
            &[
                ("received", TypeRef::named_nn_list_nn(DONATION)),
                ("likely", TypeRef::named_nn_list_nn(DONATION)),
                ("unlikely", TypeRef::named_nn_list_nn(DONATION)),
                ("currency", TypeRef::named(TypeRef::STRING)),
                ("currencySymbol", TypeRef::named(TypeRef::STRING)),
            ],
        ))
        .object(object(
            DONATION,
            &[
                ("contactId", TypeRef::named(TypeRef::ID)),
                ("contactName", TypeRef::named(TypeRef::STRING)),
                ("contactStatus", TypeRef::named(TypeRef::STRING)),
                ("convertedAmount", TypeRef::named_nn(TypeRef::FLOAT)),
                ("convertedCurrency", TypeRef::named(TypeRef::STRING)),
                ("donationAmount", TypeRef::named_nn(TypeRef::FLOAT)),
                ("donationCurrency", TypeRef::named(TypeRef::STRING)),
                ("pledgeAmount", TypeRef::named(TypeRef::FLOAT)),
                ("pledgeCurrency", TypeRef::named(TypeRef::STRING)),
                ("pledgeFrequency", TypeRef::named(TypeRef::STRING)),
                ("type", TypeRef::named(TypeRef::STRING)),
            ],
        ))
        .input_object(input_object(
            "ExpectedMonthlyTotalReportInput",
            &[("accountListId", TypeRef::named_nn(TypeRef::ID))],
        ))
        .mapping(
            TypeMapping::new(REPORT_RESOURCE)
                .coerce("expectedDonations", Coercion::Nested(DONATION)),
        )
        .mapping(
            ["convertedAmount", "donationAmount", "pledgeAmount"]
                .into_iter()
                .fold(TypeMapping::new(DONATION), |mapping, field| {
                    mapping.coerce(field, Coercion::Float)
                }),
        )
        .query(
            RootField::new("expectedMonthlyTotalReport", TypeRef::named_nn(REPORT), |ctx| {
                FieldFuture::new(async move {
                    let account_list_id = Input::of(&ctx)?.string("accountListId")?;
                    let sources = data_sources(&ctx)?;
                    let document = sources
                        .rest
                        .expected_monthly_totals(&account_list_id)
                        .await
                        .map_err(rest_error)?;
                    let totals = sources.mapping.one(REPORT_RESOURCE, Some(&document));
                    Ok(to_field_value(group_by_likelihood(totals.as_ref())))
                })
            })
            .input("ExpectedMonthlyTotalReportInput"),
        )
}

/// Split the expected donations into received, likely and unlikely ones.
/// Donations of any other type are left out.
fn group_by_likelihood(totals: Option<&Value>) -> Value {
    let mut report: Map<String, Value> = LIKELIHOODS
        .iter()
        .map(|likelihood| ((*likelihood).to_string(), Value::Array(Vec::new())))
        .collect();
    let donations = totals
        .and_then(|totals| totals.get("expectedDonations"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten();
    for donation in donations {
        let likelihood = donation.get("type").and_then(Value::as_str).unwrap_or_default();
        if let Some(Value::Array(group)) = report.get_mut(likelihood) {
            group.push(donation.clone());
        }
    }
    for (field, source) in [
        ("currency", "totalCurrency"),
        ("currencySymbol", "totalCurrencySymbol"),
    ] {
        let value = totals
            .and_then(|totals| totals.get(source))
            .cloned()
            .unwrap_or(Value::Null);
        report.insert(field.to_string(), value);
    }
    Value::Object(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_donations_are_grouped_by_likelihood() {
        let totals = json!({
            "id": "al-1",
            "expectedDonations": [
                { "contactName": "A", "type": "received", "donationAmount": 10.0 },
                { "contactName": "B", "type": "unlikely", "donationAmount": 5.0 },
                { "contactName": "C", "type": "received", "donationAmount": 1.0 },
                { "contactName": "D", "type": "someday", "donationAmount": 2.0 }
            ],
            "totalCurrency": "USD",
            "totalCurrencySymbol": "$"
        });
        assert_eq!(
            group_by_likelihood(Some(&totals)),
            json!({
                "received": [
                    { "contactName": "A", "type": "received", "donationAmount": 10.0 },
                    { "contactName": "C", "type": "received", "donationAmount": 1.0 }
                ],
                "likely": [],
                "unlikely": [{ "contactName": "B", "type": "unlikely", "donationAmount": 5.0 }],
                "currency": "USD",
                "currencySymbol": "$"
            })
        );
    }

    #[test]
    fn test_missing_report_has_empty_groups() {
        assert_eq!(
            group_by_likelihood(None),
            json!({
                "received": [],
                "likely": [],
                "unlikely": [],
                "currency": null,
                "currencySymbol": null
            })
        );
    }
}
