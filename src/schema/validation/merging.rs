use std::collections::HashSet;

use squalid::_d;
use tracing::{instrument, trace};

use crate::{
    types::Field as TypeField, Argument, FragmentSpread, IndexMap, Request, Schema, Selection,
    SelectionField, SelectionSet, SelectionSetId, TypeFull, TypeOrUnionOrInterface,
};

use super::{
    collect::{collect_typed, enclosing_scope, Ancestor, CollectorTyped},
    locations_of, ValidationError,
};

/// A field selected into the response of selection set `scope`, together
/// with the schema field it resolves to.
#[derive(Copy, Clone, Debug)]
struct MergeCandidate<'a> {
    scope: SelectionSetId,
    field: &'a SelectionField,
    type_field: &'a TypeField,
}

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_overlapping_fields_can_be_merged(
    request: &Request,
    schema: &Schema,
) -> Vec<ValidationError> {
    let candidates: Vec<MergeCandidate<'_>> =
        collect_typed(&MergeCandidatesCollector::default(), request, schema);

    let mut by_scope_and_response_name: IndexMap<
        SelectionSetId,
        IndexMap<&str, Vec<MergeCandidate<'_>>>,
    > = _d();
    for candidate in candidates {
        by_scope_and_response_name
            .entry(candidate.scope)
            .or_default()
            .entry(candidate.field.response_name().as_str())
            .or_default()
            .push(candidate);
    }

    by_scope_and_response_name
        .into_values()
        .flat_map(|by_response_name| by_response_name.into_iter())
        .filter(|(_, candidates)| !is_mergeable_group(candidates, schema))
        .map(|(response_name, candidates)| {
            trace!(response_name, count = candidates.len(), "conflicting fields");
            ValidationError::new(
                format!("Fields with response name `{response_name}` can't be merged"),
                locations_of(candidates.iter().map(|candidate| candidate.field.location)),
            )
        })
        .collect()
}

/// A group passes as soon as any two of its members can be merged.
fn is_mergeable_group(candidates: &[MergeCandidate<'_>], schema: &Schema) -> bool {
    if candidates.len() < 2 {
        return true;
    }
    candidates.iter().enumerate().any(|(index, a)| {
        candidates[index + 1..]
            .iter()
            .any(|b| are_mergeable(a, b, schema))
    })
}

fn are_mergeable(a: &MergeCandidate<'_>, b: &MergeCandidate<'_>, schema: &Schema) -> bool {
    a.field.name == b.field.name
        && have_same_arguments(&a.field.arguments, &b.field.arguments)
        && have_same_response_shape(&a.type_field.type_, &b.type_field.type_, schema)
}

/// Order-insensitive, comparing literals structurally.
fn have_same_arguments(a: &[Argument], b: &[Argument]) -> bool {
    a.len() == b.len()
        && a.iter().all(|a_argument| {
            b.iter().any(|b_argument| {
                a_argument.name == b_argument.name && a_argument.value == b_argument.value
            })
        })
}

fn have_same_response_shape(a: &TypeFull, b: &TypeFull, schema: &Schema) -> bool {
    match (a, b) {
        (TypeFull::NonNull(a), TypeFull::NonNull(b)) => have_same_response_shape(a, b, schema),
        (TypeFull::NonNull(_), _) | (_, TypeFull::NonNull(_)) => false,
        (TypeFull::List(a), TypeFull::List(b)) => have_same_response_shape(a, b, schema),
        (TypeFull::List(_), _) | (_, TypeFull::List(_)) => false,
        (TypeFull::Type(a), TypeFull::Type(b)) => {
            if schema.is_leaf_type(a) || schema.is_leaf_type(b) {
                return a == b;
            }
            schema.maybe_composite_type(a).is_some() && schema.maybe_composite_type(b).is_some()
        }
    }
}

#[derive(Default)]
struct MergeCandidatesCollector {}

impl<'a> CollectorTyped<'a, MergeCandidate<'a>, Vec<MergeCandidate<'a>>>
    for MergeCandidatesCollector
{
    #[instrument(
        level = "trace",
        skip(self, field, type_field, _enclosing_type, ancestors, _schema, _request)
    )]
    fn visit_field(
        &self,
        field: &'a SelectionField,
        type_field: Option<&'a TypeField>,
        _enclosing_type: TypeOrUnionOrInterface<'a>,
        ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> (Vec<MergeCandidate<'a>>, bool) {
        (
            type_field
                .zip(enclosing_scope(ancestors))
                .map(|(type_field, scope)| MergeCandidate {
                    scope: scope.id,
                    field,
                    type_field,
                })
                .into_iter()
                .collect(),
            true,
        )
    }

    /// The spread fragment's fields are attributed to the selection set the
    /// spread sits in.
    #[instrument(
        level = "trace",
        skip(self, fragment_spread, _enclosing_type, ancestors, schema, request)
    )]
    fn visit_fragment_spread(
        &self,
        fragment_spread: &'a FragmentSpread,
        _enclosing_type: TypeOrUnionOrInterface<'a>,
        ancestors: &[Ancestor<'a>],
        schema: &'a Schema,
        request: &'a Request,
    ) -> Vec<MergeCandidate<'a>> {
        let Some(scope) = enclosing_scope(ancestors) else {
            return vec![];
        };
        let mut ret: Vec<MergeCandidate<'a>> = _d();
        let mut visited_fragments: HashSet<&'a str> = _d();
        push_spread_candidates(
            fragment_spread,
            scope.id,
            schema,
            request,
            &mut visited_fragments,
            &mut ret,
        );
        ret
    }
}

fn push_spread_candidates<'a>(
    fragment_spread: &'a FragmentSpread,
    scope: SelectionSetId,
    schema: &'a Schema,
    request: &'a Request,
    visited_fragments: &mut HashSet<&'a str>,
    ret: &mut Vec<MergeCandidate<'a>>,
) {
    if !visited_fragments.insert(fragment_spread.name.as_str()) {
        return;
    }
    let Some(fragment_definition) = request.maybe_fragment(&fragment_spread.name) else {
        return;
    };
    let Some(type_condition) = schema.maybe_composite_type(&fragment_definition.on) else {
        return;
    };
    push_selection_set_candidates(
        &fragment_definition.selection_set,
        type_condition,
        scope,
        schema,
        request,
        visited_fragments,
        ret,
    );
}

fn push_selection_set_candidates<'a>(
    selection_set: &'a SelectionSet,
    enclosing_type: TypeOrUnionOrInterface<'a>,
    scope: SelectionSetId,
    schema: &'a Schema,
    request: &'a Request,
    visited_fragments: &mut HashSet<&'a str>,
    ret: &mut Vec<MergeCandidate<'a>>,
) {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => {
                if let Some(type_field) = schema.maybe_field_on(enclosing_type, &field.name) {
                    ret.push(MergeCandidate {
                        scope,
                        field,
                        type_field,
                    });
                }
            }
            Selection::InlineFragment(inline_fragment) => {
                let narrowed_type = match inline_fragment.on.as_ref() {
                    Some(on) => schema.maybe_composite_type(on),
                    None => Some(enclosing_type),
                };
                if let Some(narrowed_type) = narrowed_type {
                    push_selection_set_candidates(
                        &inline_fragment.selection_set,
                        narrowed_type,
                        scope,
                        schema,
                        request,
                        visited_fragments,
                        ret,
                    );
                }
            }
            Selection::FragmentSpread(fragment_spread) => {
                push_spread_candidates(
                    fragment_spread,
                    scope,
                    schema,
                    request,
                    visited_fragments,
                    ret,
                );
            }
        }
    }
}
