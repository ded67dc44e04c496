use async_graphql::dynamic::{FieldFuture, TypeRef};
use field_mapper::{Coercion, TypeMapping};

use crate::composer::{RootField, SubgraphDescriptor};
use crate::context::{data_sources, rest_error, Input};
use crate::fields::{input_object, list, object, to_field_value};
use crate::shared::DATE_TIME;

const ACCOUNT: &str = "GoogleAccountAttributes";
const INTEGRATION: &str = "GoogleAccountIntegration";
const CALENDARS: &str = "GoogleAccountIntegrationCalendars";

pub fn descriptor() -> SubgraphDescriptor {
    SubgraphDescriptor::new("GoogleIntegrations")
        .object(object(
            ACCOUNT,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("email", TypeRef::named_nn(TypeRef::STRING)),
                ("primary", TypeRef::named(TypeRef::BOOLEAN)),
                ("remoteId", TypeRef::named(TypeRef::STRING)),
                ("tokenExpired", TypeRef::named_nn(TypeRef::BOOLEAN)),
                ("createdAt", TypeRef::named(DATE_TIME)),
                ("updatedAt", TypeRef::named(DATE_TIME)),
                ("updatedInDbAt", TypeRef::named(DATE_TIME)),
            ],
        ))
        .object(object(
            INTEGRATION,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("calendarId", TypeRef::named(TypeRef::STRING)),
                ("calendarIntegration", TypeRef::named_nn(TypeRef::BOOLEAN)),
                ("calendarIntegrations", TypeRef::named_nn_list_nn(TypeRef::STRING)),
                ("calendarName", TypeRef::named(TypeRef::STRING)),
                ("calendars", TypeRef::named_list(CALENDARS)),
                ("createdAt", TypeRef::named(DATE_TIME)),
                ("updatedAt", TypeRef::named(DATE_TIME)),
                ("updatedInDbAt", TypeRef::named(DATE_TIME)),
            ],
        ))
        .object(object(
            CALENDARS,
            &[
                ("id", TypeRef::named_nn(TypeRef::STRING)),
                ("name", TypeRef::named_nn(TypeRef::STRING)),
            ],
        ))
        .input_object(input_object(
            "GoogleAccountIntegrationsInput",
            &[
                ("googleAccountId", TypeRef::named_nn(TypeRef::ID)),
                ("accountListId", TypeRef::named_nn(TypeRef::ID)),
            ],
        ))
        .input_object(input_object(
            "GoogleIntegrationAttributesInput",
            &[
                ("calendarIntegration", TypeRef::named(TypeRef::BOOLEAN)),
                ("calendarIntegrations", TypeRef::named_nn_list(TypeRef::STRING)),
                ("calendarId", TypeRef::named(TypeRef::STRING)),
                ("calendarName", TypeRef::named(TypeRef::STRING)),
                ("overwrite", TypeRef::named(TypeRef::BOOLEAN)),
            ],
        ))
        .input_object(input_object(
            "CreateGoogleIntegrationInput",
            &[
                ("googleAccountId", TypeRef::named_nn(TypeRef::ID)),
                ("accountListId", TypeRef::named_nn(TypeRef::ID)),
                ("googleIntegration", TypeRef::named("GoogleIntegrationAttributesInput")),
            ],
        ))
        .input_object(input_object(
            "UpdateGoogleIntegrationInput",
            &[
                ("googleAccountId", TypeRef::named_nn(TypeRef::ID)),
                ("googleIntegrationId", TypeRef::named_nn(TypeRef::ID)),
                ("googleIntegration", TypeRef::named_nn("GoogleIntegrationAttributesInput")),
            ],
        ))
        .input_object(input_object(
            "SyncGoogleAccountInput",
            &[
                ("googleAccountId", TypeRef::named_nn(TypeRef::ID)),
                ("googleIntegrationId", TypeRef::named_nn(TypeRef::ID)),
                ("integrationName", TypeRef::named_nn(TypeRef::STRING)),
            ],
        ))
        .input_object(input_object(
            "DeleteGoogleAccountInput",
            &[("accountId", TypeRef::named_nn(TypeRef::ID))],
        ))
        .mapping(TypeMapping::new(ACCOUNT))
        .mapping(
            TypeMapping::new(INTEGRATION)
                .coerce("calendarIntegrations", Coercion::EnumCase)
                .coerce("calendars", Coercion::Nested(CALENDARS)),
        )
        .query(google_accounts())
        .query(google_account_integrations())
        .mutation(create_google_integration())
        .mutation(update_google_integration())
        .mutation(sync_google_account())
        .mutation(delete_google_account())
}

fn google_accounts() -> RootField {
    RootField::new("googleAccounts", TypeRef::named_nn_list_nn(ACCOUNT), |ctx| {
        FieldFuture::new(async move {
            let sources = data_sources(&ctx)?;
            let document = sources.rest.google_accounts().await.map_err(rest_error)?;
            Ok(Some(list(sources.mapping.many(ACCOUNT, Some(&document)))))
        })
    })
}

fn google_account_integrations() -> RootField {
    RootField::new(
        "googleAccountIntegrations",
        TypeRef::named_nn_list_nn(INTEGRATION),
        |ctx| {
            FieldFuture::new(async move {
                let input = Input::of(&ctx)?;
                let google_account_id = input.string("googleAccountId")?;
                let account_list_id = input.string("accountListId")?;
                let sources = data_sources(&ctx)?;
                let document = sources
                    .rest
                    .google_account_integrations(&google_account_id, &account_list_id)
                    .await
                    .map_err(rest_error)?;
                Ok(Some(list(sources.mapping.many(INTEGRATION, Some(&document)))))
            })
        },
    )
    .input("GoogleAccountIntegrationsInput")
}

fn create_google_integration() -> RootField {
    RootField::new("createGoogleIntegration", TypeRef::named(INTEGRATION), |ctx| {
        FieldFuture::new(async move {
            let input = Input::of(&ctx)?;
            let google_account_id = input.string("googleAccountId")?;
            let account_list_id = input.string("accountListId")?;
            let attributes = input.attributes("googleIntegration")?;
            let sources = data_sources(&ctx)?;
            let document = sources
                .rest
                .create_google_integration(&google_account_id, &account_list_id, attributes)
                .await
                .map_err(rest_error)?;
            Ok(sources
                .mapping
                .one(INTEGRATION, Some(&document))
                .and_then(to_field_value))
        })
    })
    .input("CreateGoogleIntegrationInput")
}

fn update_google_integration() -> RootField {
    RootField::new("updateGoogleIntegration", TypeRef::named(INTEGRATION), |ctx| {
        FieldFuture::new(async move {
            let input = Input::of(&ctx)?;
            let google_account_id = input.string("googleAccountId")?;
            let integration_id = input.string("googleIntegrationId")?;
            let attributes = input.attributes("googleIntegration")?;
            let sources = data_sources(&ctx)?;
            let document = sources
                .rest
                .update_google_integration(&google_account_id, &integration_id, attributes)
                .await
                .map_err(rest_error)?;
            Ok(sources
                .mapping
                .one(INTEGRATION, Some(&document))
                .and_then(to_field_value))
        })
    })
    .input("UpdateGoogleIntegrationInput")
}

fn sync_google_account() -> RootField {
    RootField::new("syncGoogleAccount", TypeRef::named_nn(TypeRef::BOOLEAN), |ctx| {
        FieldFuture::new(async move {
            let input = Input::of(&ctx)?;
            let google_account_id = input.string("googleAccountId")?;
            let integration_id = input.string("googleIntegrationId")?;
            let integration = input.string("integrationName")?;
            data_sources(&ctx)?
                .rest
                .sync_google_integration(&google_account_id, &integration_id, &integration)
                .await
                .map_err(rest_error)?;
            Ok(Some(async_graphql::Value::from(true)))
        })
    })
    .input("SyncGoogleAccountInput")
}

fn delete_google_account() -> RootField {
    RootField::new("deleteGoogleAccount", TypeRef::named_nn(TypeRef::BOOLEAN), |ctx| {
        FieldFuture::new(async move {
            let google_account_id = Input::of(&ctx)?.string("accountId")?;
            data_sources(&ctx)?
                .rest
                .delete_google_account(&google_account_id)
                .await
                .map_err(rest_error)?;
            Ok(Some(async_graphql::Value::from(true)))
        })
    })
    .input("DeleteGoogleAccountInput")
}
