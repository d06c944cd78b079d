use std::{
    collections::{HashMap, HashSet, VecDeque},
    ptr,
};

use itertools::Itertools;
use smol_str::SmolStr;
use squalid::_d;
use tracing::instrument;

use crate::{
    FragmentDefinition, FragmentSpread, IndexMap, InlineFragment, Location, Request, Schema,
    TypeOrUnionOrInterface, VariableDefinition,
};

use super::{
    collect::{collect, collect_typed, Ancestor, Collector, CollectorTyped},
    locations_of, ValidationError,
};

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_type_names_exist(request: &Request, schema: &Schema) -> Vec<ValidationError> {
    collect(&TypeNamesExistCollector::default(), request, schema)
}

#[derive(Default)]
struct TypeNamesExistCollector {}

impl<'a> Collector<'a, ValidationError, Vec<ValidationError>> for TypeNamesExistCollector {
    #[instrument(level = "trace", skip(self, fragment_definition, schema, _request))]
    fn visit_fragment_definition(
        &self,
        fragment_definition: &'a FragmentDefinition,
        schema: &'a Schema,
        _request: &'a Request,
    ) -> (Vec<ValidationError>, bool) {
        (
            schema
                .maybe_type_or_union_or_interface(&fragment_definition.on)
                .is_none()
                .then(|| {
                    type_names_exist_validation_error(
                        &fragment_definition.on,
                        fragment_definition.location,
                    )
                })
                .into_iter()
                .collect(),
            true,
        )
    }

    #[instrument(
        level = "trace",
        skip(self, variable_definition, _ancestors, schema, _request)
    )]
    fn visit_variable_definition(
        &self,
        variable_definition: &'a VariableDefinition,
        _ancestors: &[Ancestor<'a>],
        schema: &'a Schema,
        _request: &'a Request,
    ) -> Vec<ValidationError> {
        let type_name = variable_definition.type_.name();
        schema
            .maybe_type_or_union_or_interface(type_name)
            .is_none()
            .then(|| type_names_exist_validation_error(type_name, variable_definition.location))
            .into_iter()
            .collect()
    }

    #[instrument(level = "trace", skip(self, inline_fragment, _ancestors, schema, _request))]
    fn visit_inline_fragment(
        &self,
        inline_fragment: &'a InlineFragment,
        _ancestors: &[Ancestor<'a>],
        schema: &'a Schema,
        _request: &'a Request,
    ) -> (Vec<ValidationError>, bool) {
        (
            inline_fragment
                .on
                .as_ref()
                .filter(|on| schema.maybe_type_or_union_or_interface(on).is_none())
                .map(|on| type_names_exist_validation_error(on, inline_fragment.location))
                .into_iter()
                .collect(),
            true,
        )
    }
}

fn type_names_exist_validation_error(
    type_name: &str,
    location: Option<Location>,
) -> ValidationError {
    ValidationError::new(
        format!("Unknown type name: `{type_name}`"),
        locations_of([location]),
    )
}

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_fragments_on_composite_types(
    request: &Request,
    schema: &Schema,
) -> Vec<ValidationError> {
    collect(&FragmentsOnCompositeTypesCollector::default(), request, schema)
}

#[derive(Default)]
struct FragmentsOnCompositeTypesCollector {}

impl<'a> Collector<'a, ValidationError, Vec<ValidationError>>
    for FragmentsOnCompositeTypesCollector
{
    #[instrument(level = "trace", skip(self, fragment_definition, schema, _request))]
    fn visit_fragment_definition(
        &self,
        fragment_definition: &'a FragmentDefinition,
        schema: &'a Schema,
        _request: &'a Request,
    ) -> (Vec<ValidationError>, bool) {
        (
            schema
                .maybe_type_or_union_or_interface(&fragment_definition.on)
                .filter(|type_condition| !type_condition.is_composite())
                .map(|type_condition| {
                    ValidationError::new(
                        format!(
                            "Fragment `{}` can't be of {} type `{}`",
                            fragment_definition.name,
                            type_condition.kind(),
                            type_condition.name()
                        ),
                        locations_of([fragment_definition.location]),
                    )
                })
                .into_iter()
                .collect(),
            true,
        )
    }

    #[instrument(level = "trace", skip(self, inline_fragment, _ancestors, schema, _request))]
    fn visit_inline_fragment(
        &self,
        inline_fragment: &'a InlineFragment,
        _ancestors: &[Ancestor<'a>],
        schema: &'a Schema,
        _request: &'a Request,
    ) -> (Vec<ValidationError>, bool) {
        (
            inline_fragment
                .on
                .as_ref()
                .and_then(|on| schema.maybe_type_or_union_or_interface(on))
                .filter(|type_condition| !type_condition.is_composite())
                .map(|type_condition| {
                    ValidationError::new(
                        format!(
                            "Inline fragment can't be of {} type `{}`",
                            type_condition.kind(),
                            type_condition.name()
                        ),
                        locations_of([inline_fragment.location]),
                    )
                })
                .into_iter()
                .collect(),
            true,
        )
    }
}

#[instrument(level = "trace", skip(request))]
pub(super) fn validate_fragment_name_uniqueness(request: &Request) -> Vec<ValidationError> {
    let mut fragments_by_name: IndexMap<&SmolStr, Vec<&FragmentDefinition>> = _d();
    for fragment_definition in request.document.fragments() {
        fragments_by_name
            .entry(&fragment_definition.name)
            .or_default()
            .push(fragment_definition);
    }

    fragments_by_name
        .into_iter()
        .filter(|(_, fragments)| fragments.len() > 1)
        .map(|(name, fragments)| {
            ValidationError::new(
                format!("Non-unique fragment names: `{name}`"),
                locations_of(fragments.iter().map(|fragment| fragment.location)),
            )
        })
        .collect()
}

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_fragment_spreads_exist(
    request: &Request,
    schema: &Schema,
) -> Vec<ValidationError> {
    collect(&FragmentSpreadsExistCollector::default(), request, schema)
}

#[derive(Default)]
struct FragmentSpreadsExistCollector {}

impl<'a> Collector<'a, ValidationError, Vec<ValidationError>> for FragmentSpreadsExistCollector {
    #[instrument(level = "trace", skip(self, fragment_spread, _ancestors, _schema, request))]
    fn visit_fragment_spread(
        &self,
        fragment_spread: &'a FragmentSpread,
        _ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        request: &'a Request,
    ) -> Vec<ValidationError> {
        request
            .maybe_fragment(&fragment_spread.name)
            .is_none()
            .then(|| {
                ValidationError::new(
                    format!("Non-existent fragment: `{}`", fragment_spread.name),
                    locations_of([fragment_spread.location]),
                )
            })
            .into_iter()
            .collect()
    }
}

/// Fragments no operation reaches, directly or through other fragments.
#[instrument(level = "trace", skip(request))]
pub(super) fn validate_unused_fragments(request: &Request) -> Vec<ValidationError> {
    let all_used_fragment_names: HashSet<&str> = request
        .document
        .operations()
        .flat_map(|operation_definition| {
            request
                .document
                .fragment_spread_names(&operation_definition.selection_set)
        })
        .collect();

    request
        .document
        .fragments()
        .filter(|fragment_definition| {
            !all_used_fragment_names.contains(fragment_definition.name.as_str())
        })
        .map(|fragment_definition| {
            ValidationError::new(
                format!("Unused fragment: `{}`", fragment_definition.name),
                locations_of([fragment_definition.location]),
            )
        })
        .collect()
}

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_fragment_spreads_relevant_type(
    request: &Request,
    schema: &Schema,
) -> Vec<ValidationError> {
    collect_typed(
        &FragmentSpreadsRelevantTypeCollector::default(),
        request,
        schema,
    )
}

#[derive(Default)]
struct FragmentSpreadsRelevantTypeCollector {}

impl<'a> CollectorTyped<'a, ValidationError, Vec<ValidationError>>
    for FragmentSpreadsRelevantTypeCollector
{
    #[instrument(
        level = "trace",
        skip(self, fragment_spread, enclosing_type, _ancestors, schema, request)
    )]
    fn visit_fragment_spread(
        &self,
        fragment_spread: &'a FragmentSpread,
        enclosing_type: TypeOrUnionOrInterface<'a>,
        _ancestors: &[Ancestor<'a>],
        schema: &'a Schema,
        request: &'a Request,
    ) -> Vec<ValidationError> {
        let Some(type_condition) = request
            .maybe_fragment(&fragment_spread.name)
            .and_then(|fragment_definition| schema.maybe_composite_type(&fragment_definition.on))
        else {
            return vec![];
        };

        (!have_overlap(enclosing_type, type_condition, schema))
            .then(|| {
                ValidationError::new(
                    format!(
                        "Fragment `{}` has no overlap with parent type `{}`",
                        fragment_spread.name,
                        enclosing_type.name()
                    ),
                    locations_of([fragment_spread.location]),
                )
            })
            .into_iter()
            .collect()
    }

    #[instrument(
        level = "trace",
        skip(self, inline_fragment, enclosing_type, _ancestors, schema, _request)
    )]
    fn visit_inline_fragment(
        &self,
        inline_fragment: &'a InlineFragment,
        enclosing_type: TypeOrUnionOrInterface<'a>,
        _ancestors: &[Ancestor<'a>],
        schema: &'a Schema,
        _request: &'a Request,
    ) -> (Vec<ValidationError>, bool) {
        (
            inline_fragment
                .on
                .as_ref()
                .and_then(|on| schema.maybe_composite_type(on))
                .filter(|type_condition| !have_overlap(enclosing_type, *type_condition, schema))
                .map(|type_condition| {
                    ValidationError::new(
                        format!(
                            "Inline fragment on `{}` has no overlap with parent type `{}`",
                            type_condition.name(),
                            enclosing_type.name()
                        ),
                        locations_of([inline_fragment.location]),
                    )
                })
                .into_iter()
                .collect(),
            true,
        )
    }
}

fn have_overlap<'a>(
    a: TypeOrUnionOrInterface<'a>,
    b: TypeOrUnionOrInterface<'a>,
    schema: &'a Schema,
) -> bool {
    schema
        .all_concrete_type_names(a)
        .intersection(&schema.all_concrete_type_names(b))
        .next()
        .is_some()
}

/// Every fragment sitting on a spread cycle gets its own error, located at
/// each fragment definition along that cycle.
#[instrument(level = "trace", skip(request))]
pub(super) fn validate_no_fragment_cycles(request: &Request) -> Vec<ValidationError> {
    request
        .document
        .fragments()
        .filter(|fragment_definition| {
            request
                .maybe_fragment(&fragment_definition.name)
                .is_some_and(|canonical| ptr::eq(canonical, *fragment_definition))
        })
        .filter_map(|fragment_definition| {
            let cycle = shortest_cycle_through(&fragment_definition.name, request)?;
            Some(ValidationError::new(
                match cycle.len() {
                    1 => format!(
                        "Cannot spread fragment `{}` within itself",
                        fragment_definition.name
                    ),
                    _ => format!(
                        "Cannot spread fragment `{}` within itself via {}",
                        fragment_definition.name,
                        cycle[1..].iter().map(|name| format!("`{name}`")).join(", ")
                    ),
                },
                locations_of(cycle.iter().map(|name| {
                    request
                        .maybe_fragment(name)
                        .and_then(|fragment_definition| fragment_definition.location)
                })),
            ))
        })
        .collect()
}

/// Breadth-first search along direct spreads from `start` back to itself.
/// The returned path begins with `start`.
fn shortest_cycle_through<'a>(start: &'a str, request: &'a Request) -> Option<Vec<&'a str>> {
    let mut predecessors: HashMap<&'a str, &'a str> = _d();
    let mut visited: HashSet<&'a str> = [start].into_iter().collect();
    let mut queue: VecDeque<&'a str> = [start].into_iter().collect();

    while let Some(name) = queue.pop_front() {
        let Some(fragment_definition) = request.maybe_fragment(name) else {
            continue;
        };
        for fragment_spread in fragment_definition.selection_set.fragment_spreads() {
            let next = fragment_spread.name.as_str();
            if next == start {
                let mut path = vec![name];
                let mut cursor = name;
                while let Some(predecessor) = predecessors.get(cursor) {
                    path.push(*predecessor);
                    cursor = *predecessor;
                }
                path.reverse();
                return Some(path);
            }
            if visited.insert(next) {
                predecessors.insert(next, name);
                queue.push_back(next);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::schema::validation::test_utils::{messages, run_rule};

    #[test]
    fn test_type_names_exist() {
        let errors = run_rule(
            validate_type_names_exist,
            indoc!(
                "
                query($filter: Filter, $ok: [RoleFilter!]) {
                  anything { ... on Robot { id } ... { __typename } }
                }
                fragment F on Nowhere { id }
                "
            ),
        );

        assert_eq!(
            messages(&errors),
            vec![
                "Unknown type name: `Filter`",
                "Unknown type name: `Robot`",
                "Unknown type name: `Nowhere`",
            ]
        );
        assert_eq!(errors[2].locations, vec![Location::new(4, 1)]);
    }

    #[test]
    fn test_fragments_on_composite_types() {
        let errors = run_rule(
            validate_fragments_on_composite_types,
            indoc!(
                "
                { actor(id: 1) { ...Named ... on String { length } ... on HasName { name } ... on RoleFilter { kind } } }
                fragment Named on Color { name }
                fragment Fine on ActorOrDesigner { __typename }
                "
            ),
        );

        assert_eq!(
            messages(&errors),
            vec![
                "Inline fragment can't be of scalar type `String`",
                "Inline fragment can't be of input object type `RoleFilter`",
                "Fragment `Named` can't be of enum type `Color`",
            ]
        );
    }

    #[test]
    fn test_fragment_name_uniqueness() {
        let errors = run_rule(
            |request, _| validate_fragment_name_uniqueness(request),
            indoc!(
                "
                { actors { ...A } }
                fragment A on Actor { name }
                fragment A on Actor { age }
                "
            ),
        );

        assert_eq!(messages(&errors), vec!["Non-unique fragment names: `A`"]);
        assert_eq!(
            errors[0].locations,
            vec![Location::new(2, 1), Location::new(3, 1)]
        );
    }

    #[test]
    fn test_fragment_spreads_exist() {
        let errors = run_rule(
            validate_fragment_spreads_exist,
            "{ actors { ...Known ...Unknown nope { ...AlsoUnknown } } } fragment Known on Actor { name }",
        );

        assert_eq!(
            messages(&errors),
            vec![
                "Non-existent fragment: `Unknown`",
                "Non-existent fragment: `AlsoUnknown`",
            ]
        );
    }

    #[test]
    fn test_unused_fragments() {
        let errors = run_rule(
            |request, _| validate_unused_fragments(request),
            indoc!(
                "
                { actors { ...Direct } }
                fragment Direct on Actor { ...Transitive }
                fragment Transitive on Actor { name }
                fragment Orphan on Actor { ...Transitive ...Orphan }
                "
            ),
        );

        assert_eq!(messages(&errors), vec!["Unused fragment: `Orphan`"]);
        assert_eq!(errors[0].locations, vec![Location::new(4, 1)]);
    }

    #[test]
    fn test_fragment_spreads_relevant_type() {
        let errors = run_rule(
            validate_fragment_spreads_relevant_type,
            indoc!(
                "
                {
                  actor(id: 1) { ...OnDesigner ...OnHasName ... on Designer { id } ... on ActorOrDesigner { __typename } }
                  searchByName(name: \"x\") { ...OnDesigner ... on Role { title } }
                }
                fragment OnDesigner on Designer { portfolio }
                fragment OnHasName on HasName { name }
                "
            ),
        );

        assert_eq!(
            messages(&errors),
            vec![
                "Fragment `OnDesigner` has no overlap with parent type `Actor`",
                "Inline fragment on `Designer` has no overlap with parent type `Actor`",
                "Inline fragment on `Role` has no overlap with parent type `HasName`",
            ]
        );
    }

    #[test]
    fn test_self_spread_is_one_cycle() {
        let errors = run_rule(
            |request, _| validate_no_fragment_cycles(request),
            "fragment F on Actor { name ...F }",
        );

        assert_eq!(
            messages(&errors),
            vec!["Cannot spread fragment `F` within itself"]
        );
        assert_eq!(errors[0].locations, vec![Location::new(1, 1)]);
    }

    #[test]
    fn test_every_cycle_participant_is_reported() {
        let errors = run_rule(
            |request, _| validate_no_fragment_cycles(request),
            indoc!(
                "
                fragment A on Actor { bestFriend { ...B } }
                fragment B on Actor { ... on Actor { ...C } }
                fragment C on Actor { ...A }
                fragment D on Actor { ...A }
                "
            ),
        );

        assert_eq!(
            messages(&errors),
            vec![
                "Cannot spread fragment `A` within itself via `B`, `C`",
                "Cannot spread fragment `B` within itself via `C`, `A`",
                "Cannot spread fragment `C` within itself via `A`, `B`",
            ]
        );
        assert_eq!(
            errors[0].locations,
            vec![
                Location::new(1, 1),
                Location::new(2, 1),
                Location::new(3, 1),
            ]
        );
    }
}
