use std::fmt;

use smol_str::SmolStr;
use tracing::instrument;

use crate::{
    types::Field as TypeField, Argument, BuiltInScalarType, Directive, IndexMap, Location,
    OperationDefinition, Param, Request, ScalarType, Schema, SelectionField, Type,
    TypeFull, TypeOrUnionOrInterface, Value,
};

use super::{
    collect::{collect_typed, Ancestor, CollectorTyped},
    locations_of, ValidationError,
};

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_values_of_correct_type(
    request: &Request,
    schema: &Schema,
) -> Vec<ValidationError> {
    collect_typed(&ValuesOfCorrectTypeCollector::default(), request, schema)
}

#[derive(Default)]
struct ValuesOfCorrectTypeCollector {}

impl<'a> CollectorTyped<'a, ValidationError, Vec<ValidationError>>
    for ValuesOfCorrectTypeCollector
{
    #[instrument(level = "trace", skip(self, operation, _root_type, schema, _request))]
    fn visit_operation(
        &self,
        operation: &'a OperationDefinition,
        _root_type: Option<TypeOrUnionOrInterface<'a>>,
        schema: &'a Schema,
        _request: &'a Request,
    ) -> (Vec<ValidationError>, bool) {
        (
            operation
                .variable_definitions
                .iter()
                .filter_map(|variable_definition| {
                    variable_definition
                        .default_value
                        .as_ref()
                        .map(|default_value| (variable_definition, default_value))
                })
                .flat_map(|(variable_definition, default_value)| {
                    let context = ValueContext::VariableDefault(&variable_definition.name);
                    value_problems(default_value, &variable_definition.type_, schema)
                        .into_iter()
                        .map(move |problem| {
                            problem.into_validation_error(context, variable_definition.location)
                        })
                })
                .collect(),
            true,
        )
    }

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
        (
            type_field
                .map(|type_field| {
                    arguments_errors(&field.arguments, &type_field.params, field.location, schema)
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
                arguments_errors(
                    &directive.arguments,
                    &directive_definition.params,
                    directive.location,
                    schema,
                )
            })
            .unwrap_or_default()
    }
}

fn arguments_errors(
    arguments: &[Argument],
    params: &IndexMap<String, Param>,
    location: Option<Location>,
    schema: &Schema,
) -> Vec<ValidationError> {
    arguments
        .iter()
        .filter_map(|argument| {
            params
                .get(argument.name.as_str())
                .map(|param| (argument, param))
        })
        // a missing non-null value is reported as a missing required argument
        .filter(|(argument, param)| {
            !(matches!(argument.value, Value::Null) && param.is_required())
        })
        .flat_map(|(argument, param)| {
            let context = ValueContext::Argument(&argument.name);
            value_problems(&argument.value, &param.type_, schema)
                .into_iter()
                .map(move |problem| problem.into_validation_error(context, location))
        })
        .collect()
}

#[derive(Copy, Clone)]
enum ValueContext<'a> {
    Argument(&'a str),
    VariableDefault(&'a str),
}

impl fmt::Display for ValueContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argument(name) => write!(f, "argument `{name}`"),
            Self::VariableDefault(name) => write!(f, "default value of `${name}`"),
        }
    }
}

enum ValueProblem<'a> {
    Invalid {
        value: &'a Value,
        expected: &'a TypeFull,
    },
    UnknownField {
        field_name: &'a SmolStr,
        type_name: &'a str,
    },
    MissingField {
        field_name: &'a str,
        type_name: &'a str,
    },
}

impl ValueProblem<'_> {
    fn into_validation_error(
        self,
        context: ValueContext<'_>,
        location: Option<Location>,
    ) -> ValidationError {
        ValidationError::new(
            match self {
                Self::Invalid { value, expected } => {
                    format!("Invalid value `{value}` for {context}, expected type `{expected}`")
                }
                Self::UnknownField {
                    field_name,
                    type_name,
                } => {
                    format!("Unknown field `{field_name}` of input type `{type_name}` in {context}")
                }
                Self::MissingField {
                    field_name,
                    type_name,
                } => format!(
                    "Missing required field `{field_name}` of input type `{type_name}` in {context}"
                ),
            },
            locations_of([location]),
        )
    }
}

/// Structurally matches a literal against an input type. Variables are
/// checked against their usage position by a separate rule, and types the
/// schema doesn't know are left alone.
fn value_problems<'a>(
    value: &'a Value,
    type_: &'a TypeFull,
    schema: &'a Schema,
) -> Vec<ValueProblem<'a>> {
    match (value, type_) {
        (Value::Variable(_), _) => vec![],
        (Value::Null, TypeFull::NonNull(_)) => vec![ValueProblem::Invalid {
            value,
            expected: type_,
        }],
        (Value::Null, _) => vec![],
        (value, TypeFull::NonNull(inner)) => value_problems(value, inner, schema),
        (Value::List(items), TypeFull::List(inner)) => items
            .iter()
            .flat_map(|item| value_problems(item, inner, schema))
            .collect(),
        // a single item is coerced to a one-element list
        (value, TypeFull::List(inner)) => value_problems(value, inner, schema),
        (value, TypeFull::Type(name)) => match schema.maybe_type(name) {
            Some(Type::Scalar(scalar_type)) => {
                if scalar_accepts(scalar_type, value) {
                    vec![]
                } else {
                    vec![ValueProblem::Invalid {
                        value,
                        expected: type_,
                    }]
                }
            }
            Some(Type::Enum(enum_type)) => match value {
                Value::EnumVariant(variant) if enum_type.has_value(variant) => vec![],
                _ => vec![ValueProblem::Invalid {
                    value,
                    expected: type_,
                }],
            },
            Some(Type::InputObject(input_object_type)) => {
                let Value::Object(fields) = value else {
                    return vec![ValueProblem::Invalid {
                        value,
                        expected: type_,
                    }];
                };
                fields
                    .keys()
                    .filter(|field_name| !input_object_type.fields.contains_key(field_name.as_str()))
                    .map(|field_name| ValueProblem::UnknownField {
                        field_name,
                        type_name: &input_object_type.name,
                    })
                    .chain(input_object_type.fields.values().flat_map(|param| {
                        match fields.get(param.name.as_str()) {
                            Some(field_value) => value_problems(field_value, &param.type_, schema),
                            None if param.is_required() => vec![ValueProblem::MissingField {
                                field_name: &param.name,
                                type_name: &input_object_type.name,
                            }],
                            None => vec![],
                        }
                    }))
                    .collect()
            }
            Some(Type::Object(_)) | None => vec![],
        },
    }
}

fn scalar_accepts(scalar_type: &ScalarType, value: &Value) -> bool {
    match scalar_type {
        ScalarType::BuiltIn(BuiltInScalarType::Int) => {
            matches!(value, Value::Int(value) if i32::try_from(*value).is_ok())
        }
        ScalarType::BuiltIn(BuiltInScalarType::Float) => {
            matches!(value, Value::Int(_) | Value::Float(_))
        }
        ScalarType::BuiltIn(BuiltInScalarType::String) => matches!(value, Value::String(_)),
        ScalarType::BuiltIn(BuiltInScalarType::Boolean) => matches!(value, Value::Bool(_)),
        ScalarType::BuiltIn(BuiltInScalarType::Id) => {
            matches!(value, Value::String(_) | Value::Int(_))
        }
        ScalarType::Custom(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::schema::validation::test_utils::{messages, run_rule};

    #[test]
    fn test_scalar_and_enum_literals() {
        let errors = run_rule(
            validate_values_of_correct_type,
            indoc!(
                "
                {
                  actor(id: 1.5) { name }
                  actors(first: \"ten\", ids: [\"a\", 2, true]) { name }
                  many: actors(first: 3000000000, ids: [3000000000]) { name }
                  favoriteColor(color: \"RED\")
                  count(limit: 3)
                  search: favoriteColor(color: PURPLE)
                }
                "
            ),
        );

        assert_eq!(
            messages(&errors),
            vec![
                "Invalid value `1.5` for argument `id`, expected type `ID`",
                "Invalid value `\"ten\"` for argument `first`, expected type `Int`",
                "Invalid value `true` for argument `ids`, expected type `ID`",
                "Invalid value `3000000000` for argument `first`, expected type `Int`",
                "Invalid value `\"RED\"` for argument `color`, expected type `Color`",
                "Invalid value `PURPLE` for argument `color`, expected type `Color`",
            ]
        );
        assert_eq!(errors[0].locations, vec![Location::new(2, 3)]);
    }

    #[test]
    fn test_input_objects() {
        let errors = run_rule(
            validate_values_of_correct_type,
            indoc!(
                "
                {
                  count(filter: { minYear: 1999, titles: \"Lead\", kind: SUPPORTING })
                  a: count(filter: { year: 1999, titles: [null] })
                  b: count(filter: 3)
                }
                "
            ),
        );

        assert_eq!(
            messages(&errors),
            vec![
                "Unknown field `year` of input type `RoleFilter` in argument `filter`",
                "Invalid value `null` for argument `filter`, expected type `String!`",
                "Invalid value `3` for argument `filter`, expected type `RoleFilter`",
            ]
        );
    }

    #[test]
    fn test_required_input_object_field() {
        let schema = crate::Schema::from_sdl(indoc!(
            "
            input Range { from: Int!, to: Int }
            type Query { within(range: Range): Int }
            "
        ))
        .unwrap();
        let request = crate::parse("{ within(range: { to: 3 }) }").unwrap();
        assert_eq!(
            messages(&validate_values_of_correct_type(&request, &schema)),
            vec!["Missing required field `from` of input type `Range` in argument `range`"]
        );
    }

    #[test]
    fn test_null_and_variables() {
        let errors = run_rule(
            validate_values_of_correct_type,
            indoc!(
                "
                query($first: Int = \"one\", $id: ID!) {
                  actor(id: null) { name }
                  other: actor(id: $id) {
                    friends(first: null) { name }
                    roles(kind: $kind) { title }
                  }
                  actors(ids: null) { name @include(if: $id) }
                }
                "
            ),
        );

        assert_eq!(
            messages(&errors),
            vec!["Invalid value `\"one\"` for default value of `$first`, expected type `Int`"]
        );
    }
}
