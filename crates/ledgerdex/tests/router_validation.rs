use ledgerdex::{
    ErrorKind, ErrorOrigin, Router,
    core::db::{Db, ledger::MemoryLedger},
};

fn setup() -> (Router<MemoryLedger>, Db<MemoryLedger>) {
    (
        Router::asset_routes(),
        Db::with_defaults(MemoryLedger::new()),
    )
}

#[test]
fn asset_routes_register_every_operation() {
    let router = Router::<MemoryLedger>::asset_routes();

    assert_eq!(
        router.operations(),
        [
            "creatAsset",
            "createAsset",
            "deleteAsset",
            "getAllAssets",
            "getAsset",
            "getAssetByOwner",
            "getAssetByType",
            "getHistoryForRecord",
            "getPrivateData",
            "putPrivateData",
            "richQuery",
            "updateAsset",
        ]
    );
}

#[test]
fn unknown_function_is_rejected() {
    let (router, mut db) = setup();

    let err = router
        .invoke::<&str>(&mut db, "getCertificate", &[])
        .expect_err("unknown function should fail");

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.origin, ErrorOrigin::Interface);
}

#[test]
fn create_validates_arguments_before_touching_the_ledger() {
    let (router, mut db) = setup();
    let cases: [(&[&str], &str); 5] = [
        (
            &["001", "test", "food"],
            "Incorrect number of arguments. Expecting 7",
        ),
        (
            &["001", "", "food", "cathy", "true", "", "0"],
            "2nd argument must be a non-empty string",
        ),
        (
            &["001", "test", "food", "", "true", "", "0"],
            "4th argument must be a non-empty string",
        ),
        (
            &["001", "test", "food", "cathy", "maybe", "", "0"],
            "5th argument must be a boolean string",
        ),
        (
            &["001", "test", "food", "cathy", "true", "", "soon"],
            "7th argument must be a numeric string",
        ),
    ];

    for (args, message) in cases {
        let err = router
            .invoke(&mut db, "createAsset", args)
            .expect_err("invalid args should fail");

        assert_eq!(err.kind, ErrorKind::Validation, "{message}");
        assert_eq!(err.message, message);
    }

    assert!(db.ledger().is_empty());
}

#[test]
fn single_argument_operations_check_arity() {
    let (router, mut db) = setup();

    for function in [
        "getAsset",
        "deleteAsset",
        "getAssetByType",
        "getAssetByOwner",
        "getHistoryForRecord",
        "richQuery",
    ] {
        let err = router
            .invoke::<&str>(&mut db, function, &[])
            .expect_err("missing argument should fail");

        assert_eq!(err.kind, ErrorKind::Validation, "{function}");
    }
}

#[test]
fn put_private_data_requires_a_marble_id() {
    let (router, mut db) = setup();

    let err = router
        .invoke(&mut db, "putPrivateData", &["collectionMarbles", r#"{"Name":"mmm"}"#])
        .expect_err("missing id should fail");
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = router
        .invoke(&mut db, "putPrivateData", &["collectionMarbles", "not json"])
        .expect_err("bad JSON should fail");
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = router
        .invoke(&mut db, "putPrivateData", &["", "{}"])
        .expect_err("empty partition should fail");
    assert_eq!(err.message, "1st argument must be a non-empty string");
}

#[test]
fn malformed_rich_query_surfaces_as_store_unavailable() {
    let (router, mut db) = setup();

    let err = router
        .invoke(&mut db, "richQuery", &["SELECT *"])
        .expect_err("bad query should fail");

    assert_eq!(err.kind, ErrorKind::StoreUnavailable);
    assert_eq!(err.origin, ErrorOrigin::Ledger);
}

#[test]
fn custom_routes_can_be_registered() {
    fn ping(_: &mut Db<MemoryLedger>, _: &[&str]) -> Result<Vec<u8>, ledgerdex::Error> {
        Ok(b"pong".to_vec())
    }

    let (mut router, mut db) = setup();
    assert!(router.register("ping", ping).is_none());

    let out = router
        .invoke::<&str>(&mut db, "ping", &[])
        .expect("ping should answer");
    assert_eq!(out, b"pong");
}
