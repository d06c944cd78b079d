use std::collections::HashSet;

use indexmap::IndexSet;
use smol_str::SmolStr;
use squalid::_d;
use tracing::instrument;

use crate::{
    IndexMap, OperationDefinition, OperationType, Request, Schema, Selection, SelectionSet,
};

use super::{locations_of, ValidationError};

#[instrument(level = "trace", skip(request))]
pub(super) fn validate_operation_name_uniqueness(request: &Request) -> Vec<ValidationError> {
    let mut operations_by_name: IndexMap<&SmolStr, Vec<&OperationDefinition>> = _d();
    for operation_definition in request.document.operations() {
        if let Some(name) = operation_definition.name.as_ref() {
            operations_by_name
                .entry(name)
                .or_default()
                .push(operation_definition);
        }
    }

    operations_by_name
        .into_iter()
        .filter(|(_, operations)| operations.len() > 1)
        .map(|(name, operations)| {
            ValidationError::new(
                format!("Non-unique operation names: `{name}`"),
                locations_of(operations.iter().map(|operation| operation.location)),
            )
        })
        .collect()
}

#[instrument(level = "trace", skip(request))]
pub(super) fn validate_lone_anonymous_operation(request: &Request) -> Vec<ValidationError> {
    if request.document.operations().nth(1).is_none() {
        return vec![];
    }

    request
        .document
        .operations()
        .filter(|operation_definition| operation_definition.name.is_none())
        .map(|operation_definition| {
            ValidationError::new(
                "Anonymous operation must be only operation",
                locations_of([operation_definition.location]),
            )
        })
        .collect()
}

#[instrument(level = "trace", skip(request, schema))]
pub(super) fn validate_known_operation_types(
    request: &Request,
    schema: &Schema,
) -> Vec<ValidationError> {
    request
        .document
        .operations()
        .filter(|operation_definition| {
            schema
                .type_name_for_operation_type(operation_definition.operation_type)
                .is_none()
        })
        .map(|operation_definition| {
            ValidationError::new(
                format!(
                    "Schema doesn't support `{}` operations",
                    operation_definition.operation_type
                ),
                locations_of([operation_definition.location]),
            )
        })
        .collect()
}

#[instrument(level = "trace", skip(request))]
pub(super) fn validate_subscription_single_root_field(request: &Request) -> Vec<ValidationError> {
    request
        .document
        .operations()
        .filter(|operation_definition| {
            operation_definition.operation_type == OperationType::Subscription
        })
        .filter_map(|operation_definition| {
            let mut response_names: IndexSet<&SmolStr> = _d();
            let mut visited_fragments: HashSet<&str> = _d();
            collect_root_response_names(
                &operation_definition.selection_set,
                request,
                &mut visited_fragments,
                &mut response_names,
            );
            if response_names.len() == 1 {
                return None;
            }

            Some(ValidationError::new(
                match operation_definition.name.as_ref() {
                    Some(name) => {
                        format!("Subscription `{name}` must select exactly one root field")
                    }
                    None => "Anonymous subscription must select exactly one root field".to_owned(),
                },
                locations_of([operation_definition.location]),
            ))
        })
        .collect()
}

fn collect_root_response_names<'a>(
    selection_set: &'a SelectionSet,
    request: &'a Request,
    visited_fragments: &mut HashSet<&'a str>,
    response_names: &mut IndexSet<&'a SmolStr>,
) {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => {
                response_names.insert(field.response_name());
            }
            Selection::InlineFragment(inline_fragment) => {
                collect_root_response_names(
                    &inline_fragment.selection_set,
                    request,
                    visited_fragments,
                    response_names,
                );
            }
            Selection::FragmentSpread(fragment_spread) => {
                if !visited_fragments.insert(fragment_spread.name.as_str()) {
                    continue;
                }
                if let Some(fragment) = request.maybe_fragment(&fragment_spread.name) {
                    collect_root_response_names(
                        &fragment.selection_set,
                        request,
                        visited_fragments,
                        response_names,
                    );
                }
            }
        }
    }
}
