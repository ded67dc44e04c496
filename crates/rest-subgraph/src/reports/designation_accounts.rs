use async_graphql::dynamic::{FieldFuture, TypeRef};
use field_mapper::{Coercion, TypeMapping};
use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::composer::{RootField, SubgraphDescriptor};
use crate::context::{data_sources, rest_error, Input};
use crate::fields::{input_object, list, object};
use crate::shared::DATE_TIME;

const GROUP: &str = "DesignationAccountsGroup";
const ACCOUNT: &str = "DesignationAccount";
const ORGANIZATION: &str = "DesignationAccountOrganization";

pub fn descriptor() -> SubgraphDescriptor {
    SubgraphDescriptor::new("DesignationAccounts")
        .object(object(
            GROUP,
            &[
                ("organizationName", TypeRef::named_nn(TypeRef::STRING)),
                ("designationAccounts", TypeRef::named_nn_list_nn(ACCOUNT)),
            ],
        ))
        .object(object(
            ACCOUNT,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("active", TypeRef::named(TypeRef::BOOLEAN)),
                ("balance", TypeRef::named_nn(TypeRef::FLOAT)),
                ("balanceUpdatedAt", TypeRef::named(DATE_TIME)),
                ("convertedBalance", TypeRef::named_nn(TypeRef::FLOAT)),
                ("currency", TypeRef::named(TypeRef::STRING)),
                ("designationNumber", TypeRef::named(TypeRef::STRING)),
                ("exchangeRate", TypeRef::named(TypeRef::FLOAT)),
                ("name", TypeRef::named(TypeRef::STRING)),
                ("organization", TypeRef::named(ORGANIZATION)),
            ],
        ))
        .object(object(
            ORGANIZATION,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("name", TypeRef::named(TypeRef::STRING)),
            ],
        ))
        .input_object(input_object(
            "DesignationAccountsInput",
            &[("accountListId", TypeRef::named_nn(TypeRef::ID))],
        ))
        .mapping(
            TypeMapping::new(ACCOUNT)
                .coerce("balance", Coercion::Float)
                .coerce("convertedBalance", Coercion::Float)
                .coerce("exchangeRate", Coercion::Float)
                .relationship("organization", ORGANIZATION),
        )
        .query(
            RootField::new("designationAccounts", TypeRef::named_nn_list_nn(GROUP), |ctx| {
                FieldFuture::new(async move {
                    let account_list_id = Input::of(&ctx)?.string("accountListId")?;
                    let sources = data_sources(&ctx)?;
                    let document = sources
                        .rest
                        .designation_accounts(&account_list_id)
                        .await
                        .map_err(rest_error)?;
                    let accounts = sources.mapping.many(ACCOUNT, Some(&document));
                    Ok(Some(list(group_by_organization(accounts))))
                })
            })
            .input("DesignationAccountsInput"),
        )
}

/// Group accounts by the name of their organization, in order of first
/// appearance. Accounts without an organization share the group named `""`.
fn group_by_organization(accounts: Vec<Value>) -> Vec<Value> {
    let mut groups: IndexMap<String, Vec<Value>> = IndexMap::new();
    for account in accounts {
        let organization = account
            .pointer("/organization/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        groups.entry(organization).or_default().push(account);
    }
    groups
        .into_iter()
        .map(|(name, accounts)| {
            json!({ "organizationName": name, "designationAccounts": accounts })
        })
        .collect()
}
