use itertools::Itertools;
use tracing::instrument;

use crate::{
    types::Field as TypeField, Argument, Directive, IndexMap, Location, Param, Request, Schema,
    SelectionField, TypeOrUnionOrInterface, Value,
};

use super::{
    collect::{collect_typed, Ancestor, CollectorTyped},
    locations_of, ValidationError,
};

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_argument_names_exist(
    request: &Request,
    schema: &Schema,
) -> Vec<ValidationError> {
    collect_typed(&ArgumentNamesExistCollector::default(), request, schema)
}

#[derive(Default)]
struct ArgumentNamesExistCollector {}

impl<'a> CollectorTyped<'a, ValidationError, Vec<ValidationError>> for ArgumentNamesExistCollector {
    #[instrument(
        level = "trace",
        skip(self, field, type_field, _enclosing_type, _ancestors, _schema, _request)
    )]
    fn visit_field(
        &self,
        field: &'a SelectionField,
        type_field: Option<&'a TypeField>,
        _enclosing_type: TypeOrUnionOrInterface<'a>,
        _ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> (Vec<ValidationError>, bool) {
        (
            type_field
                .map(|type_field| {
                    argument_names_exist_errors(&field.arguments, &type_field.params, field.location)
                })
                .unwrap_or_default(),
            true,
        )
    }

    #[instrument(level = "trace", skip(self, directive, _ancestors, schema, _request))]
    fn visit_directive(
        &self,
        directive: &'a Directive,
        _ancestors: &[Ancestor<'a>],
        schema: &'a Schema,
        _request: &'a Request,
    ) -> Vec<ValidationError> {
        schema
            .maybe_directive(&directive.name)
            .map(|directive_definition| {
                argument_names_exist_errors(
                    &directive.arguments,
                    &directive_definition.params,
                    directive.location,
                )
            })
            .unwrap_or_default()
    }
}

fn argument_names_exist_errors(
    arguments: &[Argument],
    params: &IndexMap<String, Param>,
    location: Option<Location>,
) -> Vec<ValidationError> {
    arguments
        .iter()
        .unique_by(|argument| &argument.name)
        .filter(|argument| !params.contains_key(argument.name.as_str()))
        .map(|argument| argument_names_exist_validation_error(&argument.name, location))
        .collect()
}

fn argument_names_exist_validation_error(
    name: &str,
    location: Option<Location>,
) -> ValidationError {
    ValidationError::new(
        format!("Non-existent argument: `{name}`"),
        locations_of([location]),
    )
}

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_no_duplicate_arguments(
    request: &Request,
    schema: &Schema,
) -> Vec<ValidationError> {
    collect_typed(&NoDuplicateArgumentsCollector::default(), request, schema)
}

#[derive(Default)]
struct NoDuplicateArgumentsCollector {}

impl<'a> CollectorTyped<'a, ValidationError, Vec<ValidationError>>
    for NoDuplicateArgumentsCollector
{
    #[instrument(
        level = "trace",
        skip(self, field, _type_field, _enclosing_type, _ancestors, _schema, _request)
    )]
    fn visit_field(
        &self,
        field: &'a SelectionField,
        _type_field: Option<&'a TypeField>,
        _enclosing_type: TypeOrUnionOrInterface<'a>,
        _ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> (Vec<ValidationError>, bool) {
        (
            no_duplicate_arguments_errors(&field.arguments, field.location),
            true,
        )
    }

    #[instrument(level = "trace", skip(self, directive, _ancestors, _schema, _request))]
    fn visit_directive(
        &self,
        directive: &'a Directive,
        _ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> Vec<ValidationError> {
        no_duplicate_arguments_errors(&directive.arguments, directive.location)
    }
}

fn no_duplicate_arguments_errors(
    arguments: &[Argument],
    location: Option<Location>,
) -> Vec<ValidationError> {
    arguments
        .iter()
        .counts_by(|argument| &argument.name)
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .sorted_by_key(|name| {
            arguments
                .iter()
                .position(|argument| &argument.name == *name)
        })
        .map(|name| duplicate_argument_validation_error(name, locations_of([location])))
        .collect()
}

fn duplicate_argument_validation_error(name: &str, locations: Vec<Location>) -> ValidationError {
    ValidationError::new(format!("Duplicate argument: `{name}`"), locations)
}

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_required_arguments(
    request: &Request,
    schema: &Schema,
) -> Vec<ValidationError> {
    collect_typed(&RequiredArgumentCollector::default(), request, schema)
}

#[derive(Default)]
struct RequiredArgumentCollector {}

impl<'a> CollectorTyped<'a, ValidationError, Vec<ValidationError>> for RequiredArgumentCollector {
    #[instrument(
        level = "trace",
        skip(self, field, type_field, _enclosing_type, _ancestors, _schema, _request)
    )]
    fn visit_field(
        &self,
        field: &'a SelectionField,
        type_field: Option<&'a TypeField>,
        _enclosing_type: TypeOrUnionOrInterface<'a>,
        _ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> (Vec<ValidationError>, bool) {
        (
            type_field
                .map(|type_field| {
                    required_arguments_errors(&field.arguments, &type_field.params, field.location)
                })
                .unwrap_or_default(),
            true,
        )
    }

    #[instrument(level = "trace", skip(self, directive, _ancestors, schema, _request))]
    fn visit_directive(
        &self,
        directive: &'a Directive,
        _ancestors: &[Ancestor<'a>],
        schema: &'a Schema,
        _request: &'a Request,
    ) -> Vec<ValidationError> {
        schema
            .maybe_directive(&directive.name)
            .map(|directive_definition| {
                required_arguments_errors(
                    &directive.arguments,
                    &directive_definition.params,
                    directive.location,
                )
            })
            .unwrap_or_default()
    }
}

/// A required param counts as missing when it is absent or given a literal
/// `null`. A variable always counts as provided.
fn required_arguments_errors(
    arguments: &[Argument],
    params: &IndexMap<String, Param>,
    location: Option<Location>,
) -> Vec<ValidationError> {
    params
        .values()
        .filter(|param| param.is_required())
        .filter(|param| {
            !arguments.iter().any(|argument| {
                argument.name == param.name && !matches!(argument.value, Value::Null)
            })
        })
        .map(|param| required_argument_validation_error(&param.name, location))
        .collect()
}

fn required_argument_validation_error(name: &str, location: Option<Location>) -> ValidationError {
    ValidationError::new(
        format!("Missing required argument `{name}`"),
        locations_of([location]),
    )
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::schema::validation::test_utils::{messages, run_rule};

    #[test]
    fn test_argument_names_exist() {
        let errors = run_rule(
            validate_argument_names_exist,
            indoc!(
                "
                {
                  actor(id: 1, idd: 2, idd: 3) {
                    friends(first: 2, last: 3) { name }
                    name @skip(if: true, unless: false)
                  }
                  missing(whatever: 1)
                  anything @unknown(whatever: 1) { __typename }
                }
                "
            ),
        );

        assert_eq!(
            messages(&errors),
            vec![
                "Non-existent argument: `idd`",
                "Non-existent argument: `last`",
                "Non-existent argument: `unless`",
            ]
        );
        assert_eq!(errors[0].locations, vec![Location::new(2, 3)]);
        assert_eq!(errors[2].locations, vec![Location::new(4, 10)]);
    }

    #[test]
    fn test_no_duplicate_arguments() {
        let errors = run_rule(
            validate_no_duplicate_arguments,
            indoc!(
                "
                {
                  actors(first: 1, ids: [], first: 2, ids: [1], first: 3) { name }
                  actor(id: 1) @include(if: true, if: false) { name }
                }
                "
            ),
        );

        assert_eq!(
            messages(&errors),
            vec![
                "Duplicate argument: `first`",
                "Duplicate argument: `ids`",
                "Duplicate argument: `if`",
            ]
        );
        assert_eq!(errors[0].locations, vec![Location::new(2, 3)]);
    }

    #[test]
    fn test_required_arguments() {
        let errors = run_rule(
            validate_required_arguments,
            indoc!(
                "
                query($id: ID!) {
                  a: actor { name }
                  b: actor(id: null) {
                    roles(filter: {}) { title }
                    friends { name }
                  }
                  c: actor(id: $id) { name @include }
                }
                "
            ),
        );

        assert_eq!(
            messages(&errors),
            vec![
                "Missing required argument `id`",
                "Missing required argument `id`",
                "Missing required argument `kind`",
                "Missing required argument `if`",
            ]
        );
        assert_eq!(errors[3].locations, vec![Location::new(7, 28)]);
    }
}
