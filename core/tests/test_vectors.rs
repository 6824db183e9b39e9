//! Verify request construction and response classification against JSON
//! vectors stored in `test-vectors/`.
//!
//! Form values are compared field by field and in order; `params` values
//! are compared as parsed JSON so key order inside the object does not matter.

use std::cell::RefCell;
use std::collections::VecDeque;

use brickset_core::{
    ApiClient, ClientConfig, Error, GetSetsParams, HttpRequest, HttpResponse,
    MinifigCollectionParams, MinifigCollectionUpdate, OrderBy, SetCollectionParams, SortKey,
    Transport, TransportError,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000/api/v3.asmx";
const KEY_OK: &str = r#"{"status":"success"}"#;

/// Answers each POST with the next queued body, always with HTTP 200.
struct Replay(RefCell<VecDeque<String>>);

impl Replay {
    fn new(bodies: &[&str]) -> Self {
        Replay(RefCell::new(bodies.iter().map(|b| b.to_string()).collect()))
    }
}

impl Transport for Replay {
    fn post(&self, _request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let body = self.0.borrow_mut().pop_front().expect("no body left to replay");
        Ok(HttpResponse { status: 200, body })
    }
}

fn client(api_key: &str, bodies: &[&str]) -> ApiClient<Replay> {
    let config = ClientConfig::default().with_base_url(BASE_URL);
    ApiClient::with_transport(api_key, config, Replay::new(bodies)).unwrap()
}

fn text(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

fn flag(args: &Value, key: &str) -> Option<bool> {
    args.get(key).and_then(Value::as_bool)
}

fn sort_key(name: &str) -> SortKey {
    match name {
        "Pieces" => SortKey::Pieces,
        "Number" => SortKey::Number,
        "YearFrom" => SortKey::YearFrom,
        other => panic!("sort key not used by vectors: {other}"),
    }
}

fn build(c: &ApiClient<Replay>, call: &str, args: &Value) -> HttpRequest {
    let set_id = text(args, "set_id").unwrap_or_default();
    match call {
        "get_themes" => c.build_get_themes(),
        "get_subthemes" => c.build_get_subthemes(&text(args, "theme").unwrap()),
        "get_years" => c.build_get_years(&text(args, "theme").unwrap()),
        "get_sets" => {
            let mut params = GetSetsParams {
                theme: text(args, "theme"),
                subtheme: text(args, "subtheme"),
                set_number: text(args, "set_number"),
                year: text(args, "year"),
                order_by: text(args, "order_by_desc").map(|k| OrderBy::Descending(sort_key(&k))),
                owned: flag(args, "owned"),
                wanted: flag(args, "wanted"),
                ..GetSetsParams::default()
            };
            if let Some(size) = args.get("page_size").and_then(Value::as_u64) {
                params.page_size = size as u32;
            }
            c.build_get_sets(&params).unwrap()
        }
        "get_instructions" => c.build_get_instructions(&set_id),
        "get_additional_images" => c.build_get_additional_images(&set_id),
        "get_reviews" => c.build_get_reviews(&set_id),
        "get_minifig_collection_owned" => c.build_get_minifig_collection_owned().unwrap(),
        "get_minifig_collection" => {
            let params = MinifigCollectionParams {
                owned: flag(args, "owned"),
                wanted: flag(args, "wanted"),
                query: text(args, "query"),
            };
            c.build_get_minifig_collection(&params).unwrap()
        }
        "set_collection" => {
            let params = SetCollectionParams {
                own: flag(args, "own"),
                want: flag(args, "want"),
                qty_owned: args.get("qty_owned").and_then(Value::as_u64).map(|q| q as u32),
                ..SetCollectionParams::default()
            };
            c.build_set_collection(&set_id, &params).unwrap()
        }
        "set_minifig_collection" => {
            let params = MinifigCollectionUpdate {
                own: flag(args, "own"),
                ..MinifigCollectionUpdate::default()
            };
            c.build_set_minifig_collection(&text(args, "minifig_number").unwrap(), &params)
                .unwrap()
        }
        "get_user_notes" => c.build_get_user_notes(),
        "get_user_minifig_notes" => c.build_get_user_minifig_notes(),
        other => panic!("unknown call: {other}"),
    }
}

/// Run a call and reduce a successful result to its length.
fn run(c: &ApiClient<Replay>, call: &str) -> Result<usize, Error> {
    match call {
        "get_themes" => c.get_themes().map(|v| v.len()),
        "get_sets" => c.get_sets(&GetSetsParams::default()).map(|v| v.len()),
        "get_instructions" => c.get_instructions("6905").map(|v| v.len()),
        "get_additional_images" => c.get_additional_images("6905").map(|v| v.len()),
        "get_reviews" => c.get_reviews("6905").map(|v| v.len()),
        "get_minifig_collection_owned" => c.get_minifig_collection_owned().map(|v| v.len()),
        "get_user_notes" => c.get_user_notes().map(|v| v.len()),
        other => panic!("unknown call: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let api_key = vectors["api_key"].as_str().unwrap();

    let c = client(api_key, &[KEY_OK]);
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected = &case["expected_request"];

        let req = build(&c, case["call"].as_str().unwrap(), &case["args"]);
        assert_eq!(
            req.url,
            format!("{BASE_URL}/{}", expected["endpoint"].as_str().unwrap()),
            "{name}: url"
        );

        let fields = expected["fields"].as_array().unwrap();
        let expected_names: Vec<&str> = fields.iter().map(|f| f[0].as_str().unwrap()).collect();
        assert_eq!(req.field_names(), expected_names, "{name}: field order");

        for f in fields {
            let key = f[0].as_str().unwrap();
            let actual = req.field(key).unwrap();
            match f[1].as_str() {
                Some(value) => assert_eq!(actual, value, "{name}: {key}"),
                None => {
                    let parsed: Value = serde_json::from_str(actual).unwrap();
                    assert_eq!(parsed, expected["params"], "{name}: params");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let c = client("key-1", &[KEY_OK, case["body"].as_str().unwrap()]);
        let result = run(&c, case["call"].as_str().unwrap());

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "InvalidRequest" => {
                    let message = case["expected_message"].as_str().unwrap();
                    assert_eq!(err, Error::InvalidRequest(message.to_string()), "{name}");
                }
                "InvalidSetId" => {
                    assert_eq!(err, Error::InvalidSetId("6905".to_string()), "{name}")
                }
                "MalformedResponse" => {
                    assert!(matches!(err, Error::MalformedResponse(_)), "{name}: got {err:?}")
                }
                other => panic!("{name}: unknown expected_error: {other}"),
            }
        } else {
            let len = result.unwrap();
            assert_eq!(len as u64, case["expected_len"].as_u64().unwrap(), "{name}: length");
        }
    }
}
