use async_graphql::dynamic::{FieldFuture, TypeRef};
use field_mapper::TypeMapping;

use crate::composer::{RootField, SubgraphDescriptor};
use crate::context::{data_sources, rest_error, Input};
use crate::fields::{input_object, list, object};

const PREFERENCE: &str = "NotificationPreference";
const TYPE: &str = "NotificationType";

pub fn descriptor() -> SubgraphDescriptor {
    SubgraphDescriptor::new("Notifications")
        .object(object(
            PREFERENCE,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("app", TypeRef::named_nn(TypeRef::BOOLEAN)),
                ("email", TypeRef::named_nn(TypeRef::BOOLEAN)),
                ("task", TypeRef::named_nn(TypeRef::BOOLEAN)),
                ("notificationType", TypeRef::named(TYPE)),
            ],
        ))
        .object(object(
            TYPE,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("type", TypeRef::named(TypeRef::STRING)),
                ("description", TypeRef::named(TypeRef::STRING)),
                ("descriptionForEmail", TypeRef::named(TypeRef::STRING)),
            ],
        ))
        .input_object(input_object(
            "NotificationPreferencesInput",
            &[("accountListId", TypeRef::named_nn(TypeRef::ID))],
        ))
        .mapping(TypeMapping::new(PREFERENCE).relationship("notification_type", TYPE))
        .query(
            RootField::new(
                "notificationPreferences",
                TypeRef::named_nn_list_nn(PREFERENCE),
                |ctx| {
                    FieldFuture::new(async move {
                        let account_list_id = Input::of(&ctx)?.string("accountListId")?;
                        let sources = data_sources(&ctx)?;
                        let document = sources
                            .rest
                            .notification_preferences(&account_list_id)
                            .await
                            .map_err(rest_error)?;
                        Ok(Some(list(sources.mapping.many(PREFERENCE, Some(&document)))))
                    })
                },
            )
            .input("NotificationPreferencesInput"),
        )
}
