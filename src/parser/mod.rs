use graphql_parser::query::{
    self as ast, Definition, OperationDefinition as AstOperationDefinition, TypeCondition,
};
use smol_str::SmolStr;
use tracing::instrument;

use crate::{
    Argument, Directive, Document, Error, ExecutableDefinition, FragmentDefinition,
    FragmentSpread, InlineFragment, Location, OperationDefinition, OperationType, Request,
    Result, Selection, SelectionField, SelectionSet, TypeFull, Value, VariableDefinition,
};

#[instrument(level = "trace", skip(source))]
pub fn parse(source: &str) -> Result<Request> {
    let document = ast::parse_query::<String>(source)
        .map_err(|error| Error::DocumentParse(error.to_string()))?;

    Ok(Request::new(Document::new(
        document
            .definitions
            .iter()
            .map(convert_definition)
            .collect::<Result<_>>()?,
    )))
}

fn convert_definition(definition: &Definition<'_, String>) -> Result<ExecutableDefinition> {
    Ok(match definition {
        Definition::Operation(operation_definition) => {
            ExecutableDefinition::Operation(convert_operation(operation_definition)?)
        }
        Definition::Fragment(fragment_definition) => {
            let TypeCondition::On(on) = &fragment_definition.type_condition;
            ExecutableDefinition::Fragment(FragmentDefinition::new(
                fragment_definition.name.as_str().into(),
                on.as_str().into(),
                convert_directives(&fragment_definition.directives)?,
                convert_selection_set(&fragment_definition.selection_set)?,
                Some(fragment_definition.position.into()),
            ))
        }
    })
}

fn convert_operation(
    operation_definition: &AstOperationDefinition<'_, String>,
) -> Result<OperationDefinition> {
    let (operation_type, name, variable_definitions, directives, selection_set, position) =
        match operation_definition {
            AstOperationDefinition::SelectionSet(selection_set) => {
                return Ok(OperationDefinition {
                    operation_type: OperationType::Query,
                    name: None,
                    variable_definitions: vec![],
                    selection_set: convert_selection_set(selection_set)?,
                    directives: vec![],
                    location: Some(selection_set.span.0.into()),
                });
            }
            AstOperationDefinition::Query(query) => (
                OperationType::Query,
                &query.name,
                &query.variable_definitions,
                &query.directives,
                &query.selection_set,
                query.position,
            ),
            AstOperationDefinition::Mutation(mutation) => (
                OperationType::Mutation,
                &mutation.name,
                &mutation.variable_definitions,
                &mutation.directives,
                &mutation.selection_set,
                mutation.position,
            ),
            AstOperationDefinition::Subscription(subscription) => (
                OperationType::Subscription,
                &subscription.name,
                &subscription.variable_definitions,
                &subscription.directives,
                &subscription.selection_set,
                subscription.position,
            ),
        };

    Ok(OperationDefinition {
        operation_type,
        name: name.as_deref().map(SmolStr::from),
        variable_definitions: variable_definitions
            .iter()
            .map(|variable_definition| {
                Ok(VariableDefinition::new(
                    variable_definition.name.as_str().into(),
                    convert_type(&variable_definition.var_type),
                    variable_definition
                        .default_value
                        .as_ref()
                        .map(convert_value)
                        .transpose()?,
                    vec![],
                    Some(variable_definition.position.into()),
                ))
            })
            .collect::<Result<_>>()?,
        selection_set: convert_selection_set(selection_set)?,
        directives: convert_directives(directives)?,
        location: Some(position.into()),
    })
}

fn convert_selection_set(selection_set: &ast::SelectionSet<'_, String>) -> Result<SelectionSet> {
    Ok(SelectionSet::new(
        selection_set
            .items
            .iter()
            .map(convert_selection)
            .collect::<Result<_>>()?,
        Some(selection_set.span.0.into()),
    ))
}

fn convert_selection(selection: &ast::Selection<'_, String>) -> Result<Selection> {
    Ok(match selection {
        ast::Selection::Field(field) => Selection::Field(SelectionField {
            alias: field.alias.as_deref().map(SmolStr::from),
            name: field.name.as_str().into(),
            // `graphql_parser` represents a missing selection set as an empty
            // one (`{}` on its own doesn't parse).
            selection_set: if field.selection_set.items.is_empty() {
                None
            } else {
                Some(convert_selection_set(&field.selection_set)?)
            },
            arguments: convert_arguments(&field.arguments)?,
            directives: convert_directives(&field.directives)?,
            location: Some(field.position.into()),
        }),
        ast::Selection::FragmentSpread(fragment_spread) => {
            Selection::FragmentSpread(FragmentSpread::new(
                fragment_spread.fragment_name.as_str().into(),
                convert_directives(&fragment_spread.directives)?,
                Some(fragment_spread.position.into()),
            ))
        }
        ast::Selection::InlineFragment(inline_fragment) => {
            Selection::InlineFragment(InlineFragment::new(
                inline_fragment
                    .type_condition
                    .as_ref()
                    .map(|TypeCondition::On(on)| on.as_str().into()),
                convert_directives(&inline_fragment.directives)?,
                convert_selection_set(&inline_fragment.selection_set)?,
                Some(inline_fragment.position.into()),
            ))
        }
    })
}

fn convert_directives(directives: &[ast::Directive<'_, String>]) -> Result<Vec<Directive>> {
    directives
        .iter()
        .map(|directive| {
            Ok(Directive::new(
                directive.name.as_str().into(),
                convert_arguments(&directive.arguments)?,
                Some(Location::from(directive.position)),
            ))
        })
        .collect()
}

fn convert_arguments(arguments: &[(String, ast::Value<'_, String>)]) -> Result<Vec<Argument>> {
    arguments
        .iter()
        .map(|(name, value)| Ok(Argument::new(name.as_str(), convert_value(value)?)))
        .collect()
}

pub(crate) fn convert_value(value: &ast::Value<'_, String>) -> Result<Value> {
    Ok(match value {
        ast::Value::Variable(name) => Value::Variable(name.as_str().into()),
        ast::Value::Int(number) => Value::Int(number.as_i64().ok_or_else(|| {
            Error::DocumentParse(format!("integer out of range: {number:?}"))
        })?),
        ast::Value::Float(value) => Value::Float(*value),
        ast::Value::String(value) => Value::String(value.as_str().into()),
        ast::Value::Boolean(value) => Value::Bool(*value),
        ast::Value::Null => Value::Null,
        ast::Value::Enum(value) => Value::EnumVariant(value.as_str().into()),
        ast::Value::List(items) => {
            Value::List(items.iter().map(convert_value).collect::<Result<_>>()?)
        }
        ast::Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, value)| Ok((SmolStr::from(name.as_str()), convert_value(value)?)))
                .collect::<Result<_>>()?,
        ),
    })
}

pub(crate) fn convert_type(type_: &ast::Type<'_, String>) -> TypeFull {
    match type_ {
        ast::Type::NamedType(name) => TypeFull::named(name.as_str()),
        ast::Type::ListType(inner) => TypeFull::list(convert_type(inner)),
        ast::Type::NonNullType(inner) => TypeFull::non_null(convert_type(inner)),
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_parse_locations() {
        let request = parse(indoc!(
            "
            query Named($id: ID!) {
              actor(id: $id) {
                ...actorFields @include(if: true)
                ... on Actor {
                  name
                }
              }
            }

            fragment actorFields on Actor {
              alias: name
            }
            "
        ))
        .unwrap();

        let operation = request.document.operations().next().unwrap();
        assert_eq!(operation.operation_type, OperationType::Query);
        assert_eq!(operation.name.as_deref(), Some("Named"));
        assert_eq!(operation.location, Some(Location::new(1, 1)));
        let variable_definition = &operation.variable_definitions[0];
        assert_eq!(variable_definition.location, Some(Location::new(1, 13)));
        assert_eq!(
            variable_definition.type_,
            TypeFull::non_null(TypeFull::named("ID"))
        );

        let actor = operation.selection_set.items[0].maybe_as_field().unwrap();
        assert_eq!(actor.location, Some(Location::new(2, 3)));
        assert_eq!(
            actor.arguments,
            vec![Argument::new("id", Value::Variable("id".into()))]
        );
        let Selection::FragmentSpread(fragment_spread) =
            &actor.selection_set.as_ref().unwrap().items[0]
        else {
            panic!("expected fragment spread");
        };
        assert_eq!(fragment_spread.location, Some(Location::new(3, 5)));
        assert_eq!(
            fragment_spread.directives[0].location,
            Some(Location::new(3, 20))
        );
        let Selection::InlineFragment(inline_fragment) =
            &actor.selection_set.as_ref().unwrap().items[1]
        else {
            panic!("expected inline fragment");
        };
        assert_eq!(inline_fragment.on.as_deref(), Some("Actor"));
        assert_eq!(inline_fragment.location, Some(Location::new(4, 5)));

        let fragment = request.maybe_fragment("actorFields").unwrap();
        assert_eq!(fragment.location, Some(Location::new(10, 1)));
        let aliased = fragment.selection_set.items[0].maybe_as_field().unwrap();
        assert_eq!(aliased.response_name(), "alias");
        assert!(aliased.selection_set.is_none());
    }

    #[test]
    fn test_parse_shorthand_operation() {
        let request = parse("{ actors { name } }").unwrap();
        let operation = request.document.operations().next().unwrap();
        assert_eq!(operation.operation_type, OperationType::Query);
        assert!(operation.name.is_none());
        assert_eq!(operation.location, Some(Location::new(1, 1)));
    }

    #[test]
    fn test_parse_values() {
        let request = parse(
            r#"{ f(a: 1, b: 2.5, c: "s", d: false, e: null, f: RED, g: [1, $v], h: {x: 1}) }"#,
        )
        .unwrap();
        let field = request.document.operations().next().unwrap().selection_set.items[0]
            .maybe_as_field()
            .unwrap();
        let values = field
            .arguments
            .iter()
            .map(|argument| argument.value.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            values,
            vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::String("s".into()),
                Value::Bool(false),
                Value::Null,
                Value::EnumVariant("RED".into()),
                Value::List(vec![Value::Int(1), Value::Variable("v".into())]),
                Value::Object([("x".into(), Value::Int(1))].into_iter().collect()),
            ]
        );
    }

    #[test]
    fn test_parse_syntax_error() {
        assert!(matches!(parse("{ actors { "), Err(Error::DocumentParse(_))));
    }
}
