use serde::Serialize;

use crate::{Result, ValidationError};

#[derive(Serialize)]
struct ErrorsResponse<'a> {
    errors: &'a [ValidationError],
}

/// Serializes validation errors into the `{"errors": [...]}` shape a
/// rejected request is answered with.
pub fn json_from_errors(errors: &[ValidationError]) -> Result<String> {
    Ok(serde_json::to_string(&ErrorsResponse { errors })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Location;

    #[test]
    fn test_json_from_errors() {
        let errors = [ValidationError::new(
            "Unused variable: `$x`",
            vec![Location::new(1, 9)],
        )];

        assert_eq!(
            json_from_errors(&errors).unwrap(),
            r#"{"errors":[{"message":"Unused variable: `$x`","locations":[{"line":1,"column":9}]}]}"#
        );
        assert_eq!(json_from_errors(&[]).unwrap(), r#"{"errors":[]}"#);
    }
}
