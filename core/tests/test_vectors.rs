//! Verify `Dispatcher::build_request` against JSON test vectors stored in
//! `test-vectors/`.
//!
//! Each case describes a descriptor and either the wire request it must
//! produce or the error it must fail with. JSON bodies are compared as parsed
//! values so key order does not matter.

use dispatch_core::{DispatchError, Dispatcher, HttpMethod, Request, RequestContext};
use serde_json::Value;

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn pairs(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            let arr = pair.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn build_descriptor(input: &Value) -> Request {
    let method = parse_method(input["method"].as_str().unwrap());
    let mut request = Request::new(method, input["uri"].as_str().unwrap());

    for (key, value) in input["headers"].as_object().unwrap() {
        request = request.with_header(key.clone(), value.as_str().unwrap());
    }
    for (key, value) in pairs(&input["query"]) {
        request = request.with_query(key, value);
    }
    let body = &input["body"];
    if let Some(map) = body.get("json") {
        request = request.with_json(map.as_object().unwrap().clone());
    } else if let Some(raw) = body.get("raw") {
        request = request.with_body(raw.as_str().unwrap());
    }
    request
}

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let defaults = vectors["default_headers"]
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v.as_str().unwrap().to_string()));
    let dispatcher = Dispatcher::new(vectors["host"].as_str().unwrap(), defaults);

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let descriptor = build_descriptor(&case["input"]);
        let result = dispatcher.build_request(&RequestContext::capture(&descriptor));

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "InvalidUrl" => assert!(matches!(err, DispatchError::InvalidUrl(_)), "{name}: {err:?}"),
                "InvalidHeader" => {
                    assert!(matches!(err, DispatchError::InvalidHeader { .. }), "{name}: {err:?}")
                }
                other => panic!("{name}: unknown expected_error: {other}"),
            }
            continue;
        }

        let req = result.unwrap();
        let expected = &case["expected_request"];
        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, expected["url"].as_str().unwrap(), "{name}: url");
        assert_eq!(req.query, pairs(&expected["query"]), "{name}: query");
        assert_eq!(req.headers, pairs(&expected["headers"]), "{name}: headers");

        let body = &expected["body"];
        if body.is_null() {
            assert!(req.body.is_none(), "{name}: body should be None");
        } else if let Some(json) = body.get("json") {
            let sent: Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&sent, json, "{name}: json body");
        } else {
            let raw = body["raw"].as_str().unwrap();
            assert_eq!(req.body.as_deref(), Some(raw.as_bytes()), "{name}: raw body");
        }
    }
}
