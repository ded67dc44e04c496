use async_graphql::dynamic::{FieldFuture, TypeRef};

use crate::composer::{RootField, SubgraphDescriptor};
use crate::context::{data_sources, rest_error, Input};
use crate::fields::input_object;

pub fn descriptor() -> SubgraphDescriptor {
    SubgraphDescriptor::new("ExportData")
        .input_object(input_object(
            "ExportDataInput",
            &[
                ("accountListId", TypeRef::named_nn(TypeRef::ID)),
                ("format", TypeRef::named_nn(TypeRef::STRING)),
                ("mailing", TypeRef::named_nn(TypeRef::BOOLEAN)),
                ("labelType", TypeRef::named(TypeRef::STRING)),
            ],
        ))
        .mutation(
            // resolves to the id of the export log the download is served from
            RootField::new("exportData", TypeRef::named_nn(TypeRef::ID), |ctx| {
                FieldFuture::new(async move {
                    let input = Input::of(&ctx)?;
                    let account_list_id = input.string("accountListId")?;
                    let format = input.string("format")?;
                    let mailing = input.boolean("mailing")?;
                    let labels = input.optional_string("labelType")?;
                    let document = data_sources(&ctx)?
                        .rest
                        .export_data(&account_list_id, &format, mailing, labels.as_deref())
                        .await
                        .map_err(rest_error)?;
                    let id = document
                        .pointer("/data/id")
                        .and_then(|id| match id {
                            serde_json::Value::String(id) => Some(id.clone()),
                            serde_json::Value::Number(id) => Some(id.to_string()),
                            _ => None,
                        })
                        .ok_or_else(|| {
                            async_graphql::Error::new("the export did not return an id")
                        })?;
                    Ok(Some(async_graphql::Value::from(id)))
                })
            })
            .input("ExportDataInput"),
        )
}
