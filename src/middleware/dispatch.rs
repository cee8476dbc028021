use axum::{extract::FromRequestParts, http::request::Parts};
use percent_encoding::percent_decode_str;

use crate::error::{GatewayError, GatewayResult};
use crate::query::escape_literal;
use crate::router::API_PREFIX;

/// Ordered path segments of one API call.
///
/// Built once per request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiRequest {
    args: Vec<String>,
}

impl ApiRequest {
    /// Split a raw (still percent-encoded) path on `/` after trimming leading
    /// and trailing separators, then decode each segment on its own, so an
    /// encoded `%2F` stays inside its segment.
    ///
    /// Interior empty segments are kept; an empty path has no segments.
    pub fn from_path(raw_path: &str) -> GatewayResult<Self> {
        let trimmed = raw_path.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let args = trimmed
            .split('/')
            .map(decode_segment)
            .collect::<GatewayResult<Vec<_>>>()?;
        Ok(Self { args })
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Fail unless at least `expected` segments are present.
    pub fn ensure_min_args(&self, expected: usize) -> GatewayResult<()> {
        if self.args.len() < expected {
            return Err(GatewayError::InvalidArgumentsCount {
                expected,
                actual: self.args.len(),
            });
        }
        Ok(())
    }

    /// Segments passed through `escape_literal`, for splicing into a literal
    /// statement such as `QuerySpec::render` produces. Statements run through
    /// the executor bind the raw `args` instead; never feed these to a bind.
    pub fn sanitized(&self) -> Vec<String> {
        self.args.iter().map(|a| escape_literal(a)).collect()
    }
}

fn decode_segment(raw: &str) -> GatewayResult<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| {
            GatewayError::InvalidArgument(format!("segment `{raw}` is not valid UTF-8"))
        })
}

impl<S> FromRequestParts<S> for ApiRequest
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path();
        Self::from_path(path.strip_prefix(API_PREFIX).unwrap_or(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_separators() {
        let req = ApiRequest::from_path("/find/users/id/eq/5/").expect("valid path");
        assert_eq!(req.args(), ["find", "users", "id", "eq", "5"]);
        assert_eq!(req.arg(1), Some("users"));
        assert_eq!(req.arg(9), None);
    }

    #[test]
    fn keeps_interior_empty_segments() {
        let req = ApiRequest::from_path("a//b").expect("valid path");
        assert_eq!(req.args(), ["a", "", "b"]);
    }

    #[test]
    fn empty_path_has_no_segments() {
        assert!(ApiRequest::from_path("").expect("valid path").is_empty());
        assert!(ApiRequest::from_path("///").expect("valid path").is_empty());
    }

    #[test]
    fn ensure_min_args_is_strictly_below() {
        let req = ApiRequest::from_path("auth/u1/secret").expect("valid path");
        assert!(req.ensure_min_args(2).is_ok());
        assert!(req.ensure_min_args(3).is_ok());
        let err = req.ensure_min_args(4).expect_err("too few");
        assert!(matches!(
            err,
            GatewayError::InvalidArgumentsCount {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn sanitized_copies_leave_the_request_untouched() {
        let req = ApiRequest::from_path("get/users/name/o'neil").expect("valid path");
        assert_eq!(req.sanitized()[3], "o''neil");
        assert_eq!(req.arg(3), Some("o'neil"));
    }

    #[test]
    fn segments_are_decoded_after_splitting() {
        let req = ApiRequest::from_path("get/users/code/a%2Fb/%3C%3D").expect("valid path");
        assert_eq!(req.args(), ["get", "users", "code", "a/b", "<="]);

        let req = ApiRequest::from_path("find/rooms/name/eq/o%27neil%20jr").expect("valid path");
        assert_eq!(req.arg(4), Some("o'neil jr"));
    }

    #[test]
    fn undecodable_segments_are_invalid_arguments() {
        let err = ApiRequest::from_path("get/users/name/%FF").expect_err("invalid utf-8");
        assert!(matches!(err, GatewayError::InvalidArgument(_)));
        assert_eq!(err.kind(), "InvalidArgumentsCount");
    }
}
