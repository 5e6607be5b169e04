use crate::params::{fields, ExtractedParams};

use super::models::QueryNode;

/// Translate extracted parameters into filter clauses.
///
/// Focal bounds become inclusive ranges (a lens covers the requested focal
/// length); every other field is an exact term.
pub fn build_param_filters(params: &ExtractedParams) -> Vec<QueryNode> {
    params
        .iter()
        .map(|(field, value)| match (field, value.as_f64()) {
            (fields::FOCAL_LENGTH_MIN, Some(min)) => {
                QueryNode::range(fields::FOCAL_LENGTH_MIN, None, Some(min))
            }
            (fields::FOCAL_LENGTH_MAX, Some(max)) => {
                QueryNode::range(fields::FOCAL_LENGTH_MAX, Some(max), None)
            }
            _ => QueryNode::term(field, value.to_json()),
        })
        .collect()
}
