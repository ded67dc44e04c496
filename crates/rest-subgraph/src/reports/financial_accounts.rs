use async_graphql::dynamic::{FieldFuture, TypeRef};
use field_mapper::{Coercion, TypeMapping};
use rest_client::EntriesQuery;

use crate::composer::{RootField, SubgraphDescriptor};
use crate::context::{data_sources, rest_error, Input};
use crate::fields::{input_object, list, object, to_field_value};
use crate::shared::{paginated, DATE, PAGINATION};

const SUMMARY: &str = "FinancialAccountSummaryItem";
const SUMMARY_CATEGORY: &str = "FinancialAccountSummaryCategory";
const ENTRY: &str = "FinancialAccountEntry";
const CATEGORY: &str = "FinancialAccountCategory";

pub fn descriptor() -> SubgraphDescriptor {
    SubgraphDescriptor::new("FinancialAccounts")
        .object(object(
            SUMMARY,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("startDate", TypeRef::named(DATE)),
                ("endDate", TypeRef::named(DATE)),
                ("openingBalance", TypeRef::named(TypeRef::FLOAT)),
                ("closingBalance", TypeRef::named(TypeRef::FLOAT)),
                ("credits", TypeRef::named(TypeRef::FLOAT)),
                ("debits", TypeRef::named(TypeRef::FLOAT)),
                ("difference", TypeRef::named(TypeRef::FLOAT)),
                ("creditsCategories", TypeRef::named_list(SUMMARY_CATEGORY)),
                ("debitsCategories", TypeRef::named_list(SUMMARY_CATEGORY)),
            ],
        ))
        .object(object(
            SUMMARY_CATEGORY,
            &[
                ("id", TypeRef::named(TypeRef::ID)),
                ("name", TypeRef::named(TypeRef::STRING)),
                ("code", TypeRef::named(TypeRef::STRING)),
                ("amount", TypeRef::named(TypeRef::FLOAT)),
            ],
        ))
        .object(object(
            "FinancialAccountEntries",
            &[
                ("entries", TypeRef::named_nn_list_nn(ENTRY)),
                ("pagination", TypeRef::named(PAGINATION)),
            ],
        ))
        .object(object(
            ENTRY,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("amount", TypeRef::named_nn(TypeRef::FLOAT)),
                ("code", TypeRef::named(TypeRef::STRING)),
                ("currency", TypeRef::named(TypeRef::STRING)),
                ("description", TypeRef::named(TypeRef::STRING)),
                ("entryDate", TypeRef::named(DATE)),
                ("type", TypeRef::named(TypeRef::STRING)),
                ("category", TypeRef::named(CATEGORY)),
            ],
        ))
        .object(object(
            CATEGORY,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("name", TypeRef::named(TypeRef::STRING)),
                ("code", TypeRef::named(TypeRef::STRING)),
            ],
        ))
        .input_object(input_object(
            "FinancialAccountSummaryInput",
            &[
                ("accountListId", TypeRef::named_nn(TypeRef::ID)),
                ("financialAccountId", TypeRef::named_nn(TypeRef::ID)),
            ],
        ))
        .input_object(input_object(
            "FinancialAccountEntriesInput",
            &[
                ("accountListId", TypeRef::named_nn(TypeRef::ID)),
                ("financialAccountId", TypeRef::named_nn(TypeRef::ID)),
                ("dateRange", TypeRef::named(TypeRef::STRING)),
                ("categoryId", TypeRef::named(TypeRef::ID)),
                ("wildcardSearch", TypeRef::named(TypeRef::STRING)),
                ("sortBy", TypeRef::named(TypeRef::STRING)),
            ],
        ))
        .mapping(
            ["openingBalance", "closingBalance", "credits", "debits", "difference"]
                .into_iter()
                .fold(TypeMapping::new(SUMMARY), |mapping, field| {
                    mapping.coerce(field, Coercion::Float)
                })
                .coerce("creditsCategories", Coercion::Nested(SUMMARY_CATEGORY))
                .coerce("debitsCategories", Coercion::Nested(SUMMARY_CATEGORY)),
        )
        .mapping(TypeMapping::new(SUMMARY_CATEGORY).coerce("amount", Coercion::Float))
        .mapping(
            TypeMapping::new(ENTRY)
                .coerce("amount", Coercion::Float)
                .relationship("category", CATEGORY),
        )
        .query(financial_account_summary())
        .query(financial_account_entries())
}

fn financial_account_summary() -> RootField {
    RootField::new(
        "financialAccountSummary",
        TypeRef::named_nn_list_nn(SUMMARY),
        |ctx| {
            FieldFuture::new(async move {
                let input = Input::of(&ctx)?;
                let account_list_id = input.string("accountListId")?;
                let financial_account_id = input.string("financialAccountId")?;
                let sources = data_sources(&ctx)?;
                let document = sources
                    .rest
                    .financial_account_summary(&account_list_id, &financial_account_id)
                    .await
                    .map_err(rest_error)?;
                Ok(Some(list(sources.mapping.many(SUMMARY, Some(&document)))))
            })
        },
    )
    .input("FinancialAccountSummaryInput")
}

fn financial_account_entries() -> RootField {
    RootField::new(
        "financialAccountEntries",
        TypeRef::named_nn("FinancialAccountEntries"),
        |ctx| {
            FieldFuture::new(async move {
                let input = Input::of(&ctx)?;
                let account_list_id = input.string("accountListId")?;
                let financial_account_id = input.string("financialAccountId")?;
                let query = EntriesQuery {
                    date_range: input.optional_string("dateRange")?,
                    category_id: input.optional_string("categoryId")?,
                    wildcard_search: Some(input.string_or_empty("wildcardSearch")?),
                    sort: input.optional_string("sortBy")?,
                };
                let sources = data_sources(&ctx)?;
                let document = sources
                    .rest
                    .financial_account_entries(&account_list_id, &financial_account_id, &query)
                    .await
                    .map_err(rest_error)?;
                let page = sources.mapping.page(ENTRY, Some(&document));
                Ok(to_field_value(paginated("entries", page)))
            })
        },
    )
    .input("FinancialAccountEntriesInput")
}
