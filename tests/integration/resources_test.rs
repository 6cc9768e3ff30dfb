use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde_json::{Map, json};

use cert_manager::{
    AcmeQuery, CreationError, Error, Method, NewAcmeAccount, NewDomain, PageRequest,
    PersonDetails, ReportFilter, Response,
};

use super::test_utils::{FakeServer, query, url};

#[test]
fn creation_returns_ids_from_location_headers() -> Result<()> {
    let server = FakeServer::start();
    let client = server.client();

    server.reply_created(&url("/domain/v1/31"));
    server.reply_created(&url("/acme/v1/account/32"));
    server.reply_created(&url("/person/v1/33"));

    let domain = client.domain().create(&NewDomain {
        name: "example.com".to_string(),
        org_id: 4,
        cert_types: vec!["SSL".to_string()],
        extra: Map::new(),
    })?;
    let account = client.acme().create(&NewAcmeAccount {
        name: "ops".to_string(),
        acme_server: "https://acme.example/v2".to_string(),
        org_id: 4,
        ev_details: Map::new(),
        extra: Map::new(),
    })?;
    let person = client.person().create(&PersonDetails {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: "jane@example.com".to_string(),
        org_id: 4,
        ..Default::default()
    })?;

    assert_eq!((domain.id, account.id, person.id), (31, 32, 33));
    Ok(())
}

#[test]
fn creation_contract_violations_are_reported() -> Result<()> {
    let server = FakeServer::start();
    let domain = server.client().domain();
    let new_domain = NewDomain {
        name: "example.com".to_string(),
        org_id: 4,
        cert_types: Vec::new(),
        extra: Map::new(),
    };

    server.reply(Response::new(200).with_header("Location", url("/domain/v1/31")));
    server.reply(Response::new(201));
    server.reply_created(&url("/domain/v1/not_a_number"));

    match domain.create(&new_domain) {
        Err(Error::Creation(CreationError::UnexpectedStatus { status: 200, .. })) => {}
        other => bail!("expected unexpected-status error, got {other:?}"),
    }
    match domain.create(&new_domain) {
        Err(Error::Creation(CreationError::MissingLocation { .. })) => {}
        other => bail!("expected missing-location error, got {other:?}"),
    }
    match domain.create(&new_domain) {
        Err(Error::Creation(CreationError::IdNotFound { location, .. })) => {
            assert!(location.ends_with("/not_a_number"))
        }
        other => bail!("expected id-not-found error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn admin_and_organization_load_on_construction() -> Result<()> {
    let server = FakeServer::start();
    let client = server.client();

    server.reply_json(200, json!([{"id": 1, "login": "root"}]));
    server.reply_json(
        200,
        json!([{"id": 4, "name": "Acme", "departments": [{"id": 40, "name": "IT"}]}]),
    );

    let admin = client.admin()?;
    let org = client.organization()?;
    assert_eq!(server.requests().len(), 2);

    assert_eq!(admin.all(false)?.len(), 1);
    assert_eq!(org.find(Some("Acme"), Some("IT"))?[0]["id"], 40);
    assert_eq!(server.requests().len(), 2);
    Ok(())
}

#[test]
fn acme_accounts_are_paginated_and_cached() -> Result<()> {
    let server = FakeServer::start();
    let acme = server.client().acme();

    let full_page: Vec<_> = (0..200).map(|id| json!({"id": id})).collect();
    server.reply_json(200, json!(full_page));
    server.reply_json(200, json!([]));

    assert_eq!(acme.all(4, false)?.len(), 200);
    assert_eq!(acme.all(4, false)?.len(), 200);

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(query(&requests[0], "organizationId"), Some("4"));
    assert_eq!(query(&requests[1], "position"), Some("200"));

    server.reply_json(200, json!([{"id": 1}]));
    let filtered: Vec<_> = acme
        .find(
            &AcmeQuery {
                org_id: 4,
                status: Some("ACTIVE".to_string()),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .collect::<cert_manager::Result<_>>()?;
    assert_eq!(filtered.len(), 1);
    assert_eq!(query(&server.last_request()?, "status"), Some("ACTIVE"));
    Ok(())
}

#[test]
fn server_side_validation_surfaces_the_description() -> Result<()> {
    let server = FakeServer::start();
    let client = server.client();

    server.reply_json(400, json!({"code": -1, "description": "Domain is not delegated"}));
    match client.dcv().start_validation_email("example.com") {
        Err(Error::ServerValidation { description, .. }) => {
            assert_eq!(description, "Domain is not delegated")
        }
        other => bail!("expected server validation error, got {other:?}"),
    }

    server.reply(Response::new(400).with_text("<html>Bad Request</html>"));
    match client.report().domains() {
        Err(Error::Http(err)) => assert_eq!(err.status(), 400),
        other => bail!("expected plain HTTP error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn reports_post_their_filters() -> Result<()> {
    let server = FakeServer::start();
    let report = server.client().report();
    server.reply_json(200, json!({"reports": [{"id": 1}]}));

    let from = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    let result = report.activity(&ReportFilter::between(from, to))?;

    assert_eq!(result["reports"][0]["id"], 1);
    let request = server.last_request()?;
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, url("/report/v1/activity"));
    assert_eq!(
        request.json(),
        Some(&json!({"from": "2024-06-01", "to": "2024-06-30"}))
    );
    Ok(())
}
