use std::ptr;

use tracing::instrument;

use crate::{Directive, Request, Schema};

use super::{
    collect::{collect, Ancestor, Collector},
    locations_of, ValidationError,
};

fn owned_directives<'a>(owner: &Ancestor<'a>) -> &'a [Directive] {
    match owner {
        Ancestor::Operation(operation_definition) => &operation_definition.directives,
        Ancestor::FragmentDefinition(fragment_definition) => &fragment_definition.directives,
        Ancestor::VariableDefinition(variable_definition) => &variable_definition.directives,
        Ancestor::Field(field) => &field.directives,
        Ancestor::FragmentSpread(fragment_spread) => &fragment_spread.directives,
        Ancestor::InlineFragment(inline_fragment) => &inline_fragment.directives,
    }
}

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_directives_exist(request: &Request, schema: &Schema) -> Vec<ValidationError> {
    collect(&DirectivesExistCollector::default(), request, schema)
}

#[derive(Default)]
struct DirectivesExistCollector {}

impl<'a> Collector<'a, ValidationError, Vec<ValidationError>> for DirectivesExistCollector {
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
            .is_none()
            .then(|| {
                ValidationError::new(
                    format!("Non-existent directive: `@{}`", directive.name),
                    locations_of([directive.location]),
                )
            })
            .into_iter()
            .collect()
    }
}

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_directives_place(request: &Request, schema: &Schema) -> Vec<ValidationError> {
    collect(&DirectivesPlaceCollector::default(), request, schema)
}

#[derive(Default)]
struct DirectivesPlaceCollector {}

impl<'a> Collector<'a, ValidationError, Vec<ValidationError>> for DirectivesPlaceCollector {
    #[instrument(level = "trace", skip(self, directive, ancestors, schema, _request))]
    fn visit_directive(
        &self,
        directive: &'a Directive,
        ancestors: &[Ancestor<'a>],
        schema: &'a Schema,
        _request: &'a Request,
    ) -> Vec<ValidationError> {
        let (Some(directive_definition), Some(owner)) =
            (schema.maybe_directive(&directive.name), ancestors.last())
        else {
            return vec![];
        };

        (!directive_definition.is_allowed_at(owner.directive_location()))
            .then(|| {
                ValidationError::new(
                    format!(
                        "Directive `@{}` can't be used in this position",
                        directive.name
                    ),
                    locations_of([directive.location]),
                )
            })
            .into_iter()
            .collect()
    }
}

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_directives_duplicate(
    request: &Request,
    schema: &Schema,
) -> Vec<ValidationError> {
    collect(&DirectivesDuplicateCollector::default(), request, schema)
}

#[derive(Default)]
struct DirectivesDuplicateCollector {}

impl<'a> Collector<'a, ValidationError, Vec<ValidationError>> for DirectivesDuplicateCollector {
    /// Reports each repeated name once, from its first occurrence.
    #[instrument(level = "trace", skip(self, directive, ancestors, schema, _request))]
    fn visit_directive(
        &self,
        directive: &'a Directive,
        ancestors: &[Ancestor<'a>],
        schema: &'a Schema,
        _request: &'a Request,
    ) -> Vec<ValidationError> {
        let (Some(directive_definition), Some(owner)) =
            (schema.maybe_directive(&directive.name), ancestors.last())
        else {
            return vec![];
        };
        if directive_definition.is_repeatable {
            return vec![];
        }

        let same_name = owned_directives(owner)
            .iter()
            .filter(|sibling| sibling.name == directive.name)
            .collect::<Vec<_>>();
        if same_name.len() < 2 || !ptr::eq(same_name[0], directive) {
            return vec![];
        }

        vec![ValidationError::new(
            format!(
                "Directive `@{}` can't be used more than once",
                directive.name
            ),
            locations_of(same_name.iter().map(|sibling| sibling.location)),
        )]
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::{
        schema::validation::test_utils::{messages, run_rule},
        Location,
    };

    #[test]
    fn test_directives_exist() {
        let errors = run_rule(
            validate_directives_exist,
            indoc!(
                "
                query @onQuery @live {
                  actors @skip(if: false) @defer { ...F @cached }
                }
                fragment F on Actor @experimental { name }
                "
            ),
        );

        assert_eq!(
            messages(&errors),
            vec![
                "Non-existent directive: `@defer`",
                "Non-existent directive: `@live`",
                "Non-existent directive: `@experimental`",
            ]
        );
        assert_eq!(errors[1].locations, vec![Location::new(1, 16)]);
    }

    #[test]
    fn test_directives_place() {
        let errors = run_rule(
            validate_directives_place,
            indoc!(
                "
                query @onQuery @include(if: true) {
                  actors @cached { ...F @cached ... @tag(name: \"x\") { name @onQuery } }
                }
                mutation M @onQuery { renameActor(id: 1, name: \"x\") { name } }
                fragment F on Actor @skip(if: true) { name @whatever }
                "
            ),
        );

        assert_eq!(
            messages(&errors),
            vec![
                "Directive `@cached` can't be used in this position",
                "Directive `@onQuery` can't be used in this position",
                "Directive `@include` can't be used in this position",
                "Directive `@onQuery` can't be used in this position",
                "Directive `@skip` can't be used in this position",
            ]
        );
    }

    #[test]
    fn test_directives_duplicate() {
        let errors = run_rule(
            validate_directives_duplicate,
            indoc!(
                "
                {
                  actors @cached @skip(if: false) @cached @cached {
                    name @tag(name: \"a\") @tag(name: \"b\") @unknown @unknown
                    ... @skip(if: true) @include(if: true) { age }
                  }
                }
                "
            ),
        );

        assert_eq!(
            messages(&errors),
            vec!["Directive `@cached` can't be used more than once"]
        );
        assert_eq!(
            errors[0].locations,
            vec![
                Location::new(2, 10),
                Location::new(2, 35),
                Location::new(2, 43),
            ]
        );
    }
}
