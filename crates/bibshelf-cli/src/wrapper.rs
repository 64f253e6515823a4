//! Response wrapping for the JSON printed on stdout.
//!
//! Every response is an object with a `success` flag. Successful results are
//! placed under a key named after what the command returns; failures carry the
//! error message and an HTTP-style status.

use bibshelf_core::ShelfError;
use serde_json::{json, Value};

/// Wrap a command result as `{success: true, <key>: result}`.
pub fn wrap_response(command: &str, result: Value) -> Value {
    match command {
        // List wrappers
        "list" => json!({
            "success": true,
            "libraries": if result.is_null() { json!([]) } else { result }
        }),
        "entries" | "all" => json!({
            "success": true,
            "entries": if result.is_null() { json!([]) } else { result }
        }),
        "summary" => json!({
            "success": true,
            "libraries": if result.is_null() { json!([]) } else { result }
        }),

        "get" => json!({ "success": true, "entry": result }),
        "exists" => json!({ "success": true, "exists": result.as_bool().unwrap_or(false) }),
        "remove" => json!({ "success": true, "removed": result.as_bool().unwrap_or(false) }),

        // create/delete return the library name, insert/update return nothing
        _ => {
            let mut response = json!({ "success": true });
            if let (Value::Object(target), Value::Object(extra)) = (&mut response, result) {
                target.extend(extra);
            }
            response
        }
    }
}

/// Build the failure response for an error.
pub fn error_response(error: &ShelfError) -> Value {
    json!({
        "success": false,
        "error": error.to_string(),
        "status": error.to_status_code(),
    })
}

/// Process exit code: 2 for errors the caller can fix, 1 otherwise.
pub fn exit_code(error: &ShelfError) -> i32 {
    if error.is_caller_error() {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_list() {
        let wrapped = wrap_response("list", json!(["a.bib", "b.bib"]));
        assert_eq!(wrapped["success"], true);
        assert_eq!(wrapped["libraries"], json!(["a.bib", "b.bib"]));
    }

    #[test]
    fn test_wrap_null_entries() {
        let wrapped = wrap_response("entries", Value::Null);
        assert_eq!(wrapped["entries"], json!([]));
    }

    #[test]
    fn test_wrap_missing_entry() {
        let wrapped = wrap_response("get", Value::Null);
        assert_eq!(wrapped["success"], true);
        assert!(wrapped["entry"].is_null());
    }

    #[test]
    fn test_wrap_bool_commands() {
        assert_eq!(wrap_response("exists", json!(true))["exists"], true);
        assert_eq!(wrap_response("remove", json!(false))["removed"], false);
    }

    #[test]
    fn test_wrap_merges_objects() {
        let wrapped = wrap_response("create", json!({ "library": "refs" }));
        assert_eq!(wrapped, json!({ "success": true, "library": "refs" }));

        let wrapped = wrap_response("insert", Value::Null);
        assert_eq!(wrapped, json!({ "success": true }));
    }

    #[test]
    fn test_error_response() {
        let err = ShelfError::Conflict {
            library: "refs.bib".into(),
            citation_key: "abc1".into(),
        };
        let response = error_response(&err);
        assert_eq!(response["success"], false);
        assert_eq!(response["status"], 409);
        assert!(response["error"].as_str().unwrap().contains("abc1"));
        assert_eq!(exit_code(&err), 2);

        let err = ShelfError::Config {
            message: "bad dir".into(),
        };
        assert_eq!(exit_code(&err), 1);
    }
}
