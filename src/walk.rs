//! Recursive traversal shared by every claim-tree algorithm.
//!
//! Validation, concealing, selection and revealing all walk the same
//! `serde_json::Value` tree. They only differ in what happens at objects and
//! scalars, which is what a [`ClaimPolicy`] decides. Arrays are handled here:
//! each item is walked with the same request context.
use serde_json::{Map, Value};

use crate::Error;

/// Per-algorithm behavior plugged into [`walk`].
pub(crate) trait ClaimPolicy {
    /// Context threaded through the walk alongside the claims, such as the
    /// matching node of a disclosure request tree.
    type Request: Copy;

    type Output;

    fn scalar(&mut self, value: &Value) -> Result<Self::Output, Error>;

    /// Context used for every item of an array walked under `request`.
    fn array_request(&self, request: Self::Request) -> Self::Request;

    fn array(&mut self, items: Vec<Self::Output>) -> Self::Output;

    /// Handles an object. Implementations recurse into children by calling
    /// [`walk`] themselves.
    fn object(
        &mut self,
        object: &Map<String, Value>,
        request: Self::Request,
    ) -> Result<Self::Output, Error>;
}

pub(crate) fn walk<P: ClaimPolicy>(
    policy: &mut P,
    value: &Value,
    request: P::Request,
) -> Result<P::Output, Error> {
    match value {
        Value::Array(items) => {
            let reference = policy.array_request(request);
            let items = items
                .iter()
                .map(|item| walk(policy, item, reference))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(policy.array(items))
        }
        Value::Object(object) => policy.object(object, request),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            policy.scalar(value)
        }
    }
}

/// Rejects any occurrence of the reserved `_sd` property.
///
/// Fails on the first occurrence, reporting the object keys leading to it.
pub(crate) struct ReservedClaims {
    path: Vec<String>,
}

impl ReservedClaims {
    pub fn check(claims: &Value) -> Result<(), Error> {
        walk(&mut Self { path: Vec::new() }, claims, ())
    }

    fn pointer(&self, key: &str) -> String {
        let mut pointer = String::new();
        for segment in self.path.iter().map(String::as_str).chain([key]) {
            pointer.push('/');
            pointer.push_str(&segment.replace('~', "~0").replace('/', "~1"));
        }
        pointer
    }
}

impl ClaimPolicy for ReservedClaims {
    type Request = ();
    type Output = ();

    fn scalar(&mut self, _value: &Value) -> Result<(), Error> {
        Ok(())
    }

    fn array_request(&self, _request: ()) {}

    fn array(&mut self, _items: Vec<()>) {}

    fn object(&mut self, object: &Map<String, Value>, _request: ()) -> Result<(), Error> {
        for (key, value) in object {
            if key == crate::SD_CLAIM_NAME {
                return Err(Error::ReservedClaim(self.pointer(key)));
            }

            self.path.push(key.clone());
            walk(self, value, ())?;
            self.path.pop();
        }

        Ok(())
    }
}
