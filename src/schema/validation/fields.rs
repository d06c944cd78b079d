use tracing::instrument;

use crate::{
    types::Field as TypeField, Location, Request, Schema, SelectionField,
    TypeOrUnionOrInterface,
};

use super::{
    collect::{collect_typed, Ancestor, CollectorTyped},
    locations_of, ValidationError,
};

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_selection_fields_exist(
    request: &Request,
    schema: &Schema,
) -> Vec<ValidationError> {
    collect_typed(&SelectionFieldsExistCollector::default(), request, schema)
}

#[derive(Default)]
struct SelectionFieldsExistCollector {}

impl<'a> CollectorTyped<'a, ValidationError, Vec<ValidationError>>
    for SelectionFieldsExistCollector
{
    #[instrument(
        level = "trace",
        skip(self, field, type_field, enclosing_type, _ancestors, _schema, _request)
    )]
    fn visit_field(
        &self,
        field: &'a SelectionField,
        type_field: Option<&'a TypeField>,
        enclosing_type: TypeOrUnionOrInterface<'a>,
        _ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> (Vec<ValidationError>, bool) {
        (
            type_field
                .is_none()
                .then(|| {
                    selection_field_doesnt_exist_validation_error(
                        &field.name,
                        enclosing_type.name(),
                        field.location,
                    )
                })
                .into_iter()
                .collect(),
            true,
        )
    }
}

fn selection_field_doesnt_exist_validation_error(
    field_name: &str,
    type_name: &str,
    location: Option<Location>,
) -> ValidationError {
    ValidationError::new(
        format!("Field `{field_name}` doesn't exist on `{type_name}`"),
        locations_of([location]),
    )
}

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_scalar_leafs(request: &Request, schema: &Schema) -> Vec<ValidationError> {
    collect_typed(&ScalarLeafsCollector::default(), request, schema)
}

#[derive(Default)]
struct ScalarLeafsCollector {}

impl<'a> CollectorTyped<'a, ValidationError, Vec<ValidationError>> for ScalarLeafsCollector {
    #[instrument(
        level = "trace",
        skip(self, field, type_field, _enclosing_type, _ancestors, schema, _request)
    )]
    fn visit_field(
        &self,
        field: &'a SelectionField,
        type_field: Option<&'a TypeField>,
        _enclosing_type: TypeOrUnionOrInterface<'a>,
        _ancestors: &[Ancestor<'a>],
        schema: &'a Schema,
        _request: &'a Request,
    ) -> (Vec<ValidationError>, bool) {
        let Some(type_field) = type_field else {
            return (vec![], true);
        };
        let Some(field_type) = schema.maybe_type_or_union_or_interface(type_field.type_.name())
        else {
            return (vec![], true);
        };

        (
            match (field_type.is_composite(), field.selection_set.as_ref()) {
                (true, None) => Some(no_selection_on_object_type_validation_error(
                    &field.name,
                    field_type.name(),
                    field.location,
                )),
                (false, Some(_)) => Some(selection_on_scalar_type_validation_error(
                    &field.name,
                    field_type.name(),
                    field.location,
                )),
                _ => None,
            }
            .into_iter()
            .collect(),
            true,
        )
    }
}

fn selection_on_scalar_type_validation_error(
    field_name: &str,
    type_name: &str,
    location: Option<Location>,
) -> ValidationError {
    ValidationError::new(
        format!(
            "Field `{field_name}` can't have selection set because it is of scalar type `{type_name}`"
        ),
        locations_of([location]),
    )
}

fn no_selection_on_object_type_validation_error(
    field_name: &str,
    type_name: &str,
    location: Option<Location>,
) -> ValidationError {
    ValidationError::new(
        format!(
            "Field `{field_name}` must have selection set because it is of non-scalar type `{type_name}`"
        ),
        locations_of([location]),
    )
}
