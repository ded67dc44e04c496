use async_graphql::dynamic::{FieldFuture, TypeRef};
use field_mapper::{Coercion, TypeMapping};
use rest_client::RestErrorKind;

use crate::composer::{RootField, SubgraphDescriptor};
use crate::context::{data_sources, rest_error, Input};
use crate::fields::{input_object, object, to_field_value};
use crate::shared::DATE_TIME;

const ACCOUNT: &str = "MailchimpAccount";
const LISTS: &str = "MailchimpAccountLists";
const INPUT: &str = "MailchimpAccountInput";

pub fn descriptor() -> SubgraphDescriptor {
    SubgraphDescriptor::new("Mailchimp")
        .object(object(
            ACCOUNT,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("active", TypeRef::named_nn(TypeRef::BOOLEAN)),
                ("autoLogCampaigns", TypeRef::named_nn(TypeRef::BOOLEAN)),
                ("createdAt", TypeRef::named(DATE_TIME)),
                ("listsAvailableForNewsletters", TypeRef::named_list(LISTS)),
                ("listsLink", TypeRef::named(TypeRef::STRING)),
                ("listsPresent", TypeRef::named_nn(TypeRef::BOOLEAN)),
                ("primaryListId", TypeRef::named(TypeRef::ID)),
                ("primaryListName", TypeRef::named(TypeRef::STRING)),
                ("updatedAt", TypeRef::named(DATE_TIME)),
                ("updatedInDbAt", TypeRef::named(DATE_TIME)),
                ("valid", TypeRef::named_nn(TypeRef::BOOLEAN)),
                ("validateKey", TypeRef::named_nn(TypeRef::BOOLEAN)),
                ("validationError", TypeRef::named(TypeRef::STRING)),
            ],
        ))
        .object(object(
            LISTS,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("name", TypeRef::named_nn(TypeRef::STRING)),
            ],
        ))
        .input_object(input_object(
            INPUT,
            &[("accountListId", TypeRef::named_nn(TypeRef::ID))],
        ))
        .mapping(
            TypeMapping::new(ACCOUNT)
                .coerce("listsAvailableForNewsletters", Coercion::Nested(LISTS)),
        )
        .query(mailchimp_account())
        .mutation(sync_mailchimp_account())
        .mutation(delete_mailchimp_account())
}

/// `null` until a Mailchimp account is connected, which the REST API reports
/// as 404.
fn mailchimp_account() -> RootField {
    RootField::new("mailchimpAccount", TypeRef::named(ACCOUNT), |ctx| {
        FieldFuture::new(async move {
            let account_list_id = Input::of(&ctx)?.string("accountListId")?;
            let sources = data_sources(&ctx)?;
            match sources.rest.mailchimp_account(&account_list_id).await {
                Ok(document) => Ok(sources
                    .mapping
                    .one(ACCOUNT, Some(&document))
                    .and_then(to_field_value)),
                Err(err) if err.kind() == RestErrorKind::NotFound => Ok(None),
                Err(err) => Err(rest_error(err)),
            }
        })
    })
    .input(INPUT)
}

fn sync_mailchimp_account() -> RootField {
    RootField::new("syncMailchimpAccount", TypeRef::named_nn(TypeRef::BOOLEAN), |ctx| {
        FieldFuture::new(async move {
            let account_list_id = Input::of(&ctx)?.string("accountListId")?;
            data_sources(&ctx)?
                .rest
                .sync_mailchimp_account(&account_list_id)
                .await
                .map_err(rest_error)?;
            Ok(Some(async_graphql::Value::from(true)))
        })
    })
    .input(INPUT)
}

fn delete_mailchimp_account() -> RootField {
    RootField::new("deleteMailchimpAccount", TypeRef::named_nn(TypeRef::BOOLEAN), |ctx| {
        FieldFuture::new(async move {
            let account_list_id = Input::of(&ctx)?.string("accountListId")?;
            data_sources(&ctx)?
                .rest
                .delete_mailchimp_account(&account_list_id)
                .await
                .map_err(rest_error)?;
            Ok(Some(async_graphql::Value::from(true)))
        })
    })
    .input(INPUT)
}
