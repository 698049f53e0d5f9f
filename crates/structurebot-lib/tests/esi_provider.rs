mod common;

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use structurebot_lib::error::Error;
use structurebot_lib::{
    EsiClient, FittedModule, RetryPolicy, Structure, StructureProvider, TypeCatalog,
    TypeRegistry,
};

use common::fixture_registry;

const CORP_ID: i64 = 98_000_001;
const TOKEN: &str = "access-token";

fn mock_ids(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/universe/ids/")
        .match_body(Matcher::Json(json!(["Test Corp"])))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "corporations": [{ "id": CORP_ID, "name": "Test Corp" }] }).to_string(),
        )
        .create()
}

fn mock_page(
    server: &mut ServerGuard,
    path: &str,
    page: u32,
    pages: u32,
    body: serde_json::Value,
) -> mockito::Mock {
    server
        .mock("GET", path)
        .match_query(Matcher::UrlEncoded("page".into(), page.to_string()))
        .match_header("authorization", format!("Bearer {TOKEN}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("x-pages", &pages.to_string())
        .with_body(body.to_string())
        .create()
}

fn client(server: &Server) -> EsiClient {
    EsiClient::new(server.url(), RetryPolicy::immediate(3))
        .expect("client builds")
        .with_access_token(TOKEN)
}

fn structures_path() -> String {
    format!("/corporations/{CORP_ID}/structures/")
}

fn assets_path() -> String {
    format!("/corporations/{CORP_ID}/assets/")
}

#[test]
fn resolves_corporation_names() {
    let mut server = Server::new();
    let ids = mock_ids(&mut server);

    let id = client(&server)
        .corporation_id("Test Corp")
        .expect("corporation resolves");
    assert_eq!(id, CORP_ID);
    ids.assert();
}

#[test]
fn unknown_corporation_is_reported() {
    let mut server = Server::new();
    let _ids = server
        .mock("POST", "/universe/ids/")
        .with_status(200)
        .with_body("{}")
        .create();

    let err = client(&server)
        .corporation_id("Nobody")
        .expect_err("no corporation");
    match err {
        Error::CorporationNotFound { name } => assert_eq!(name, "Nobody"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn joins_paged_structures_with_fitted_assets() {
    let mut server = Server::new();
    let _ids = mock_ids(&mut server);
    let first = mock_page(
        &mut server,
        &structures_path(),
        1,
        2,
        json!([{
            "structure_id": 1_001,
            "type_id": 35825,
            "name": "J-Home - Factory",
            "fuel_expires": "2024-06-04T12:00:00Z"
        }]),
    );
    let second = mock_page(
        &mut server,
        &structures_path(),
        2,
        2,
        json!([{
            "structure_id": 1_002,
            "type_id": 35832,
            "unanchors_at": "2024-06-03T12:00:00Z"
        }]),
    );
    let _assets = mock_page(
        &mut server,
        &assets_path(),
        1,
        1,
        json!([
            { "type_id": 35878, "location_id": 1_001, "location_flag": "ServiceSlot0" },
            { "type_id": 35891, "location_id": 1_001, "location_flag": "ServiceSlot1" },
            { "type_id": 56201, "location_id": 1_001, "location_flag": "QuantumCoreRoom" },
            { "type_id": 34, "location_id": 1_001, "location_flag": "CorpSAG1" },
            { "type_id": 35894, "location_id": 60_003_760, "location_flag": "Hangar" }
        ]),
    );

    let records = client(&server)
        .corporation_structures("Test Corp")
        .expect("records load");
    first.assert();
    second.assert();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].structure_id, 1_001);
    assert_eq!(records[0].name.as_deref(), Some("J-Home - Factory"));
    assert_eq!(records[0].modules.len(), 4);
    assert!(records[0].modules.contains(&FittedModule {
        type_id: 56201,
        location_flag: "QuantumCoreRoom".to_string(),
    }));
    assert_eq!(records[1].structure_id, 1_002);
    assert!(records[1].modules.is_empty());
    assert!(records[1].unanchors_at.is_some());

    let registry = fixture_registry();
    let structures: Vec<Structure> = records
        .into_iter()
        .map(|record| Structure::from_record(record, &registry))
        .collect::<Result<_, _>>()
        .expect("structures resolve");

    let factory = &structures[0];
    assert_eq!(factory.display_name(), "J-Home - Factory");
    assert_eq!(factory.type_name(), "Raitaru");
    assert!(factory.has_core());
    assert_eq!(factory.fuel_rate(&registry).expect("rate"), 18.0);
    assert!(structures[1].unanchoring());
    assert_eq!(structures[1].display_name(), "Astrahus");
}

#[test]
fn from_corporation_preserves_upstream_order() {
    let mut server = Server::new();
    let _ids = mock_ids(&mut server);
    let _structures = mock_page(
        &mut server,
        &structures_path(),
        1,
        1,
        json!([
            { "structure_id": 3, "type_id": 35826 },
            { "structure_id": 1, "type_id": 35825 },
            { "structure_id": 2, "type_id": 35832 }
        ]),
    );
    let _assets = mock_page(&mut server, &assets_path(), 1, 1, json!([]));

    let registry = fixture_registry();
    let structures = Structure::from_corporation(&client(&server), &registry, "Test Corp")
        .expect("structures load");
    let ids: Vec<i64> = structures.iter().map(Structure::structure_id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
    assert!(structures.iter().all(|s| s.fitting().is_empty()));
}

#[test]
fn unknown_fitted_module_aborts_the_load() {
    let mut server = Server::new();
    let _ids = mock_ids(&mut server);
    let _structures = mock_page(
        &mut server,
        &structures_path(),
        1,
        1,
        json!([{ "structure_id": 7, "type_id": 35825 }]),
    );
    let _assets = mock_page(
        &mut server,
        &assets_path(),
        1,
        1,
        json!([{ "type_id": 99_999, "location_id": 7, "location_flag": "ServiceSlot0" }]),
    );

    let registry = TypeRegistry::new(
        TypeCatalog::from_path(&common::fixtures_dir().join("structure_types.csv"))
            .expect("catalog"),
    );
    let err = Structure::from_corporation(&client(&server), &registry, "Test Corp")
        .expect_err("unknown module");
    match err {
        Error::UnresolvedModule {
            structure_id,
            type_id,
            ..
        } => {
            assert_eq!(structure_id, 7);
            assert_eq!(type_id, 99_999);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn server_errors_are_retried_until_the_budget_runs_out() {
    let mut server = Server::new();
    let ids = server
        .mock("POST", "/universe/ids/")
        .with_status(502)
        .with_body(r#"{"error":"Bad gateway"}"#)
        .expect(3)
        .create();

    let err = client(&server)
        .corporation_id("Test Corp")
        .expect_err("upstream down");
    ids.assert();
    match err {
        Error::RetriesExhausted { attempts, last, .. } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, Error::Esi { status: 502, ref message, .. } if message == "Bad gateway"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn forbidden_is_not_retried() {
    let mut server = Server::new();
    let _ids = mock_ids(&mut server);
    let structures = server
        .mock("GET", structures_path().as_str())
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(r#"{"error":"Character does not have required role(s)"}"#)
        .expect(1)
        .create();

    let err = client(&server)
        .corporation_structures("Test Corp")
        .expect_err("forbidden");
    structures.assert();
    assert!(matches!(err, Error::Esi { status: 403, .. }));
}

#[test]
fn corporation_endpoints_require_a_token() {
    let mut server = Server::new();
    let _ids = mock_ids(&mut server);

    let client = EsiClient::new(server.url(), RetryPolicy::immediate(3)).expect("client builds");
    let err = client
        .corporation_structures("Test Corp")
        .expect_err("no token");
    assert!(matches!(err, Error::Auth { .. }));
}
