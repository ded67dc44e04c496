use async_graphql::dynamic::{FieldFuture, TypeRef};
use field_mapper::TypeMapping;

use crate::composer::{RootField, SubgraphDescriptor};
use crate::context::{data_sources, rest_error, Input};
use crate::fields::{input_object, list, object, to_field_value};
use crate::shared::{paginated, DATE_TIME, PAGINATION};

const ACCOUNT_LIST: &str = "OrganizationsAccountList";
const ACCOUNT_LIST_USER: &str = "OrganizationAccountListUser";
const CONTACT: &str = "OrganizationsContact";
const PERSON: &str = "OrganizationsContactPerson";
const INVITE: &str = "OrganizationInvite";

pub fn descriptor() -> SubgraphDescriptor {
    SubgraphDescriptor::new("Organizations")
        .object(object(
            "SearchOrganizationsAccountLists",
            &[
                ("accountLists", TypeRef::named_nn_list_nn(ACCOUNT_LIST)),
                ("pagination", TypeRef::named(PAGINATION)),
            ],
        ))
        .object(object(
            ACCOUNT_LIST,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("name", TypeRef::named(TypeRef::STRING)),
                ("users", TypeRef::named_list(ACCOUNT_LIST_USER)),
                ("createdAt", TypeRef::named(DATE_TIME)),
                ("updatedAt", TypeRef::named(DATE_TIME)),
            ],
        ))
        .object(object(
            ACCOUNT_LIST_USER,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("firstName", TypeRef::named(TypeRef::STRING)),
                ("lastName", TypeRef::named(TypeRef::STRING)),
            ],
        ))
        .object(object(
            "SearchOrganizationsContacts",
            &[
                ("contacts", TypeRef::named_nn_list_nn(CONTACT)),
                ("pagination", TypeRef::named(PAGINATION)),
            ],
        ))
        .object(object(
            CONTACT,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("name", TypeRef::named(TypeRef::STRING)),
                ("squareAvatar", TypeRef::named(TypeRef::STRING)),
                ("allowDeletion", TypeRef::named(TypeRef::BOOLEAN)),
                ("accountListId", TypeRef::named(TypeRef::ID)),
                ("people", TypeRef::named_list(PERSON)),
            ],
        ))
        .object(object(
            PERSON,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("firstName", TypeRef::named(TypeRef::STRING)),
                ("lastName", TypeRef::named(TypeRef::STRING)),
                ("primaryEmailAddress", TypeRef::named(TypeRef::STRING)),
                ("primaryPhoneNumber", TypeRef::named(TypeRef::STRING)),
            ],
        ))
        .object(object(
            INVITE,
            &[
                ("id", TypeRef::named_nn(TypeRef::ID)),
                ("acceptedAt", TypeRef::named(DATE_TIME)),
                ("code", TypeRef::named(TypeRef::STRING)),
                ("createdAt", TypeRef::named(DATE_TIME)),
                ("inviteUserAs", TypeRef::named(TypeRef::STRING)),
                ("recipientEmail", TypeRef::named(TypeRef::STRING)),
            ],
        ))
        .input_object(input_object(
            "SearchOrganizationsAccountListsInput",
            &[
                ("organizationId", TypeRef::named_nn(TypeRef::ID)),
                ("search", TypeRef::named(TypeRef::STRING)),
                ("pageNumber", TypeRef::named(TypeRef::INT)),
            ],
        ))
        .input_object(input_object(
            "SearchOrganizationsContactsInput",
            &[
                ("organizationId", TypeRef::named_nn(TypeRef::ID)),
                ("search", TypeRef::named(TypeRef::STRING)),
                ("pageNumber", TypeRef::named(TypeRef::INT)),
            ],
        ))
        .input_object(input_object(
            "OrganizationInvitesInput",
            &[("organizationId", TypeRef::named_nn(TypeRef::ID))],
        ))
        .input_object(input_object(
            "DeleteOrganizationInviteInput",
            &[
                ("organizationId", TypeRef::named_nn(TypeRef::ID)),
                ("inviteId", TypeRef::named_nn(TypeRef::ID)),
            ],
        ))
        .mapping(TypeMapping::new(ACCOUNT_LIST).relationship("users", ACCOUNT_LIST_USER))
        .mapping(TypeMapping::new(CONTACT).relationship("people", PERSON))
        .query(search_account_lists())
        .query(search_contacts())
        .query(organization_invites())
        .mutation(delete_organization_invite())
}

fn search_account_lists() -> RootField {
    RootField::new(
        "searchOrganizationsAccountLists",
        TypeRef::named_nn("SearchOrganizationsAccountLists"),
        |ctx| {
            FieldFuture::new(async move {
                let input = Input::of(&ctx)?;
                let organization_id = input.string("organizationId")?;
                let search = input.string_or_empty("search")?;
                let page = input.page("pageNumber", 1)?;
                let sources = data_sources(&ctx)?;
                let document = sources
                    .rest
                    .search_organization_account_lists(&organization_id, &search, page)
                    .await
                    .map_err(rest_error)?;
                let page = sources.mapping.page(ACCOUNT_LIST, Some(&document));
                Ok(to_field_value(paginated("accountLists", page)))
            })
        },
    )
    .input("SearchOrganizationsAccountListsInput")
}

fn search_contacts() -> RootField {
    RootField::new(
        "searchOrganizationsContacts",
        TypeRef::named_nn("SearchOrganizationsContacts"),
        |ctx| {
            FieldFuture::new(async move {
                let input = Input::of(&ctx)?;
                let organization_id = input.string("organizationId")?;
                let search = input.string_or_empty("search")?;
                let page = input.page("pageNumber", 1)?;
                let sources = data_sources(&ctx)?;
                let document = sources
                    .rest
                    .search_organization_contacts(&organization_id, &search, page)
                    .await
                    .map_err(rest_error)?;
                let page = sources.mapping.page(CONTACT, Some(&document));
                Ok(to_field_value(paginated("contacts", page)))
            })
        },
    )
    .input("SearchOrganizationsContactsInput")
}

/// Every invite of the organization. The pagination block is dropped.
fn organization_invites() -> RootField {
    RootField::new("organizationInvites", TypeRef::named_nn_list_nn(INVITE), |ctx| {
        FieldFuture::new(async move {
            let organization_id = Input::of(&ctx)?.string("organizationId")?;
            let sources = data_sources(&ctx)?;
            let document = sources
                .rest
                .organization_invites(&organization_id)
                .await
                .map_err(rest_error)?;
            Ok(Some(list(sources.mapping.many(INVITE, Some(&document)))))
        })
    })
    .input("OrganizationInvitesInput")
}

fn delete_organization_invite() -> RootField {
    RootField::new(
        "deleteOrganizationInvite",
        TypeRef::named_nn(TypeRef::BOOLEAN),
        |ctx| {
            FieldFuture::new(async move {
                let input = Input::of(&ctx)?;
                let organization_id = input.string("organizationId")?;
                let invite_id = input.string("inviteId")?;
                data_sources(&ctx)?
                    .rest
                    .delete_organization_invite(&organization_id, &invite_id)
                    .await
                    .map_err(rest_error)?;
                Ok(Some(async_graphql::Value::from(true)))
            })
        },
    )
    .input("DeleteOrganizationInviteInput")
}
