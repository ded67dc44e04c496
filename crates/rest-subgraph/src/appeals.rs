//! Contacts excluded from an appeal.

use async_graphql::dynamic::{FieldFuture, TypeRef};
use field_mapper::{Coercion, TypeMapping};

use crate::composer::{RootField, SubgraphDescriptor};
use crate::context::{data_sources, rest_error, Input};
use crate::fields::{input_object, object, to_field_value};
use crate::shared::{paginated, PAGINATION};

const EXCLUDED: &str = "ExcludedAppealContact";
const CONTACT: &str = "ExcludedAppealContactInfo";
const DEFAULT_PAGE_SIZE: u32 = 25;

pub fn appeals() -> Vec<SubgraphDescriptor> {
    vec![SubgraphDescriptor::new("Appeals")
        .object(object(
            "ExcludedAppealContacts",
            &[
                ("nodes", TypeRef::named_nn_list_nn(EXCLUDED)),
                ("pagination", TypeRef::named(PAGINATION)),
            ],
        ))
        .object(object(
            EXCLUDED,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("reasons", TypeRef::named_list(TypeRef::STRING)),
                ("contact", TypeRef::named(CONTACT)),
            ],
        ))
        .object(object(
            CONTACT,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("name", TypeRef::named(TypeRef::STRING)),
                ("pledgeAmount", TypeRef::named(TypeRef::FLOAT)),
                ("pledgeCurrency", TypeRef::named(TypeRef::STRING)),
                ("pledgeFrequency", TypeRef::named(TypeRef::STRING)),
                ("pledgeReceived", TypeRef::named(TypeRef::BOOLEAN)),
                ("status", TypeRef::named(TypeRef::STRING)),
            ],
        ))
        .input_object(input_object(
            "ExcludedAppealContactsInput",
            &[
                ("appealId", TypeRef::named_nn(TypeRef::ID)),
                ("pageNumber", TypeRef::named(TypeRef::INT)),
                ("pageSize", TypeRef::named(TypeRef::INT)),
            ],
        ))
        .input_object(input_object(
            "DeleteExcludedAppealContactInput",
            &[
                ("appealId", TypeRef::named_nn(TypeRef::ID)),
                ("excludedContactId", TypeRef::named_nn(TypeRef::ID)),
            ],
        ))
        .mapping(TypeMapping::new(EXCLUDED).relationship("contact", CONTACT))
        .mapping(TypeMapping::new(CONTACT).coerce("pledgeAmount", Coercion::Float))
        .query(excluded_appeal_contacts())
        .mutation(delete_excluded_appeal_contact())]
}

fn excluded_appeal_contacts() -> RootField {
    RootField::new(
        "excludedAppealContacts",
        TypeRef::named_nn("ExcludedAppealContacts"),
        |ctx| {
            FieldFuture::new(async move {
                let input = Input::of(&ctx)?;
                let appeal_id = input.string("appealId")?;
                let page = input.page("pageNumber", 1)?;
                let per_page = input.page("pageSize", DEFAULT_PAGE_SIZE)?;
                let sources = data_sources(&ctx)?;
                let document = sources
                    .rest
                    .excluded_appeal_contacts(&appeal_id, page, per_page)
                    .await
                    .map_err(rest_error)?;
                let page = sources.mapping.page(EXCLUDED, Some(&document));
                Ok(to_field_value(paginated("nodes", page)))
            })
        },
    )
    .input("ExcludedAppealContactsInput")
}

fn delete_excluded_appeal_contact() -> RootField {
    RootField::new(
        "deleteExcludedAppealContact",
        TypeRef::named_nn(TypeRef::BOOLEAN),
        |ctx| {
            FieldFuture::new(async move {
                let input = Input::of(&ctx)?;
                let appeal_id = input.string("appealId")?;
                let excluded_contact_id = input.string("excludedContactId")?;
                data_sources(&ctx)?
                    .rest
                    .delete_excluded_appeal_contact(&appeal_id, &excluded_contact_id)
                    .await
                    .map_err(rest_error)?;
                Ok(Some(async_graphql::Value::from(true)))
            })
        },
    )
    .input("DeleteExcludedAppealContactInput")
}
