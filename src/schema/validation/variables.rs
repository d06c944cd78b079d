use std::{collections::HashSet, ptr};

use indexmap::IndexSet;
use itertools::Itertools;
use smol_str::SmolStr;
use squalid::_d;
use tracing::instrument;

use crate::{
    types::Field as TypeField, Argument, Directive, IndexMap, Location, OperationDefinition,
    Param, Request, Schema, SelectionField, Type, TypeFull, TypeOrUnionOrInterface, Value,
    VariableDefinition,
};

use super::{
    collect::{collect, collect_typed, Ancestor, Collector, CollectorTyped},
    locations_of, ValidationError,
};

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_variables_are_input_types(
    request: &Request,
    schema: &Schema,
) -> Vec<ValidationError> {
    request
        .document
        .operations()
        .flat_map(|operation_definition| &operation_definition.variable_definitions)
        .filter_map(|variable_definition| {
            let type_ = schema.maybe_type_or_union_or_interface(variable_definition.type_.name())?;
            let is_input = matches!(type_, TypeOrUnionOrInterface::Type(type_) if type_.is_input());
            (!is_input).then(|| {
                ValidationError::new(
                    format!(
                        "Variable `${}` can't be of non-input type `{}`",
                        variable_definition.name,
                        variable_definition.type_
                    ),
                    locations_of([variable_definition.location]),
                )
            })
        })
        .collect()
}

#[instrument(level = "trace", skip(request))]
pub(super) fn validate_unique_variable_names(request: &Request) -> Vec<ValidationError> {
    request
        .document
        .operations()
        .flat_map(|operation_definition| {
            let mut variables_by_name: IndexMap<&SmolStr, Vec<&VariableDefinition>> = _d();
            for variable_definition in &operation_definition.variable_definitions {
                variables_by_name
                    .entry(&variable_definition.name)
                    .or_default()
                    .push(variable_definition);
            }
            variables_by_name
                .into_iter()
                .filter(|(_, variable_definitions)| variable_definitions.len() > 1)
                .map(|(name, variable_definitions)| {
                    ValidationError::new(
                        format!("Non-unique variable names: `${name}`"),
                        locations_of(
                            variable_definitions
                                .iter()
                                .map(|variable_definition| variable_definition.location),
                        ),
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// A `$name` reference inside a field or directive argument.
#[derive(Copy, Clone, Debug)]
struct VariableUsage<'a> {
    /// The operation or fragment definition the reference sits under.
    root: Ancestor<'a>,
    name: &'a SmolStr,
    location: Option<Location>,
}

#[derive(Default)]
struct VariableUsagesCollector {}

impl<'a> Collector<'a, VariableUsage<'a>, Vec<VariableUsage<'a>>> for VariableUsagesCollector {
    #[instrument(level = "trace", skip(self, field, ancestors, _schema, _request))]
    fn visit_field(
        &self,
        field: &'a SelectionField,
        ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> (Vec<VariableUsage<'a>>, bool) {
        (
            variable_usages(&field.arguments, ancestors, field.location),
            true,
        )
    }

    #[instrument(level = "trace", skip(self, directive, ancestors, _schema, _request))]
    fn visit_directive(
        &self,
        directive: &'a Directive,
        ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> Vec<VariableUsage<'a>> {
        variable_usages(&directive.arguments, ancestors, directive.location)
    }
}

fn variable_usages<'a>(
    arguments: &'a [Argument],
    ancestors: &[Ancestor<'a>],
    location: Option<Location>,
) -> Vec<VariableUsage<'a>> {
    let Some(root) = ancestors.first().copied() else {
        return vec![];
    };
    arguments
        .iter()
        .flat_map(|argument| argument.value.variable_names())
        .map(|name| VariableUsage {
            root,
            name,
            location,
        })
        .collect()
}

/// The fragments an operation reaches, so usages inside them can be
/// attributed to it.
struct OperationScope<'a> {
    operation_definition: &'a OperationDefinition,
    reachable_fragments: IndexSet<&'a str>,
    request: &'a Request,
}

impl<'a> OperationScope<'a> {
    fn new(operation_definition: &'a OperationDefinition, request: &'a Request) -> Self {
        Self {
            operation_definition,
            reachable_fragments: request
                .document
                .fragment_spread_names(&operation_definition.selection_set),
            request,
        }
    }

    fn contains(&self, root: &Ancestor<'a>) -> bool {
        match root {
            Ancestor::Operation(operation_definition) => {
                ptr::eq(*operation_definition, self.operation_definition)
            }
            Ancestor::FragmentDefinition(fragment_definition) => {
                self.reachable_fragments
                    .contains(fragment_definition.name.as_str())
                    && self
                        .request
                        .maybe_fragment(&fragment_definition.name)
                        .is_some_and(|canonical| ptr::eq(canonical, *fragment_definition))
            }
            _ => false,
        }
    }
}

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_no_undefined_variables(
    request: &Request,
    schema: &Schema,
) -> Vec<ValidationError> {
    let usages = collect(&VariableUsagesCollector::default(), request, schema);

    request
        .document
        .operations()
        .flat_map(|operation_definition| {
            let scope = OperationScope::new(operation_definition, request);
            usages
                .iter()
                .filter(|usage| scope.contains(&usage.root))
                .filter(|usage| {
                    operation_definition
                        .maybe_variable_definition(usage.name)
                        .is_none()
                })
                .map(|usage| {
                    ValidationError::new(
                        match operation_definition.name.as_ref() {
                            Some(operation_name) => format!(
                                "Variable `${}` is not defined by operation `{operation_name}`",
                                usage.name
                            ),
                            None => format!("Variable `${}` is not defined", usage.name),
                        },
                        locations_of([usage.location]),
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// One error per operation, naming every variable it declares but never
/// references.
#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_all_variables_used(
    request: &Request,
    schema: &Schema,
) -> Vec<ValidationError> {
    let usages = collect(&VariableUsagesCollector::default(), request, schema);

    request
        .document
        .operations()
        .filter_map(|operation_definition| {
            let scope = OperationScope::new(operation_definition, request);
            let used_names: HashSet<&str> = usages
                .iter()
                .filter(|usage| scope.contains(&usage.root))
                .map(|usage| usage.name.as_str())
                .collect();
            let unused = operation_definition
                .variable_definitions
                .iter()
                .filter(|variable_definition| {
                    !used_names.contains(variable_definition.name.as_str())
                })
                .unique_by(|variable_definition| &variable_definition.name)
                .collect::<Vec<_>>();
            if unused.is_empty() {
                return None;
            }

            let names = unused
                .iter()
                .map(|variable_definition| format!("`${}`", variable_definition.name))
                .join(", ");
            Some(ValidationError::new(
                match unused.len() {
                    1 => format!("Unused variable: {names}"),
                    _ => format!("Unused variables: {names}"),
                },
                locations_of(
                    unused
                        .iter()
                        .map(|variable_definition| variable_definition.location),
                ),
            ))
        })
        .collect()
}

/// A variable reference together with the input type its position expects.
#[derive(Copy, Clone, Debug)]
struct TypedVariableUsage<'a> {
    usage: VariableUsage<'a>,
    expected: &'a TypeFull,
}

#[derive(Default)]
struct TypedVariableUsagesCollector {}

impl<'a> CollectorTyped<'a, TypedVariableUsage<'a>, Vec<TypedVariableUsage<'a>>>
    for TypedVariableUsagesCollector
{
    #[instrument(
        level = "trace",
        skip(self, field, type_field, _enclosing_type, ancestors, schema, _request)
    )]
    fn visit_field(
        &self,
        field: &'a SelectionField,
        type_field: Option<&'a TypeField>,
        _enclosing_type: TypeOrUnionOrInterface<'a>,
        ancestors: &[Ancestor<'a>],
        schema: &'a Schema,
        _request: &'a Request,
    ) -> (Vec<TypedVariableUsage<'a>>, bool) {
        (
            type_field
                .map(|type_field| {
                    typed_variable_usages(
                        &field.arguments,
                        &type_field.params,
                        ancestors,
                        field.location,
                        schema,
                    )
                })
                .unwrap_or_default(),
            true,
        )
    }

    #[instrument(level = "trace", skip(self, directive, ancestors, schema, _request))]
    fn visit_directive(
        &self,
        directive: &'a Directive,
        ancestors: &[Ancestor<'a>],
        schema: &'a Schema,
        _request: &'a Request,
    ) -> Vec<TypedVariableUsage<'a>> {
        schema
            .maybe_directive(&directive.name)
            .map(|directive_definition| {
                typed_variable_usages(
                    &directive.arguments,
                    &directive_definition.params,
                    ancestors,
                    directive.location,
                    schema,
                )
            })
            .unwrap_or_default()
    }
}

fn typed_variable_usages<'a>(
    arguments: &'a [Argument],
    params: &'a IndexMap<String, Param>,
    ancestors: &[Ancestor<'a>],
    location: Option<Location>,
    schema: &'a Schema,
) -> Vec<TypedVariableUsage<'a>> {
    let Some(root) = ancestors.first().copied() else {
        return vec![];
    };
    let mut ret: Vec<TypedVariableUsage<'a>> = _d();
    for argument in arguments {
        if let Some(param) = params.get(argument.name.as_str()) {
            push_typed_variable_usages(
                &argument.value,
                &param.type_,
                root,
                location,
                schema,
                &mut ret,
            );
        }
    }
    ret
}

/// Descends through list and input object literals, tracking the type each
/// nested position expects.
fn push_typed_variable_usages<'a>(
    value: &'a Value,
    expected: &'a TypeFull,
    root: Ancestor<'a>,
    location: Option<Location>,
    schema: &'a Schema,
    ret: &mut Vec<TypedVariableUsage<'a>>,
) {
    match value {
        Value::Variable(name) => ret.push(TypedVariableUsage {
            usage: VariableUsage {
                root,
                name,
                location,
            },
            expected,
        }),
        Value::List(items) => {
            if let TypeFull::List(item_type) = expected.nullable() {
                for item in items {
                    push_typed_variable_usages(item, item_type, root, location, schema, ret);
                }
            }
        }
        Value::Object(fields) => {
            let Some(input_object_type) = schema
                .maybe_type(expected.name())
                .and_then(Type::maybe_as_input_object)
            else {
                return;
            };
            if matches!(expected.nullable(), TypeFull::List(_)) {
                return;
            }
            for (field_name, field_value) in fields {
                if let Some(param) = input_object_type.fields.get(field_name.as_str()) {
                    push_typed_variable_usages(
                        field_value,
                        &param.type_,
                        root,
                        location,
                        schema,
                        ret,
                    );
                }
            }
        }
        _ => {}
    }
}

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_variables_in_allowed_position(
    request: &Request,
    schema: &Schema,
) -> Vec<ValidationError> {
    let typed_usages = collect_typed(&TypedVariableUsagesCollector::default(), request, schema);

    request
        .document
        .operations()
        .flat_map(|operation_definition| {
            let scope = OperationScope::new(operation_definition, request);
            typed_usages
                .iter()
                .filter(|typed_usage| scope.contains(&typed_usage.usage.root))
                .filter_map(|typed_usage| {
                    let variable_definition = operation_definition
                        .maybe_variable_definition(typed_usage.usage.name)?;
                    if !schema.is_input_type(variable_definition.type_.name()) {
                        return None;
                    }
                    (!is_type_compatible(&variable_definition.type_, typed_usage.expected)).then(
                        || {
                            ValidationError::new(
                                format!(
                                    "Variable `${}` of type `{}` can't be used in position expecting `{}`",
                                    typed_usage.usage.name,
                                    variable_definition.type_,
                                    typed_usage.expected
                                ),
                                locations_of([typed_usage.usage.location]),
                            )
                        },
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Structural check of a variable's declared type against the type its
/// usage position expects. Only nullability may be relaxed: a non-null
/// variable fits a nullable position, never the other way round.
fn is_type_compatible(variable_type: &TypeFull, expected: &TypeFull) -> bool {
    match (variable_type, expected) {
        (TypeFull::NonNull(variable_type), TypeFull::NonNull(expected)) => {
            is_type_compatible(variable_type, expected)
        }
        (_, TypeFull::NonNull(_)) => false,
        (TypeFull::NonNull(variable_type), expected) => is_type_compatible(variable_type, expected),
        (TypeFull::List(variable_type), TypeFull::List(expected)) => {
            is_type_compatible(variable_type, expected)
        }
        (TypeFull::List(_), _) | (_, TypeFull::List(_)) => false,
        (TypeFull::Type(variable_type), TypeFull::Type(expected)) => variable_type == expected,
    }
}
