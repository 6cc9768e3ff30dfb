use anyhow::{Result, anyhow, bail};
use serde_json::{Value, json};

use cert_manager::certificates::CertificateFilter;
use cert_manager::{
    CertFormat, Certificates, Collected, CustomField, Error, PageRequest, Response,
    SmimeReplacement, SslEnrollment,
};

use super::test_utils::{FakeServer, query, url};

const CSR: &str = "-----BEGIN CERTIFICATE REQUEST-----\nMIIBfake\n-----END CERTIFICATE REQUEST-----\n";

fn script_ssl_catalog(server: &FakeServer) {
    server.reply_json(
        200,
        json!([
            {"id": 224, "name": "InCommon SSL (SHA-2)", "terms": [365, 730]},
            {"id": 227, "name": "InCommon Wildcard SSL Certificate (SHA-2)", "terms": [365]}
        ]),
    );
    server.reply_json(200, json!([{"id": 1, "name": "ticket", "mandatory": true}]));
}

#[test]
fn ssl_enroll_collect_renew_revoke() -> Result<()> {
    let server = FakeServer::start();
    let ssl = server.client().ssl();

    script_ssl_catalog(&server);
    server.reply_json(200, json!({"renewId": "r-1", "sslId": 1001}));
    let mut request = SslEnrollment::new("InCommon SSL (SHA-2)", CSR, 730, 12);
    request.subject_alt_names = vec!["www.example.com".into()];
    request.custom_fields = vec![CustomField::new("ticket", "OPS-1")];
    let enrolled = ssl.enroll(&request)?;
    let cert_id = enrolled["sslId"]
        .as_u64()
        .ok_or_else(|| anyhow!("enroll returned no sslId: {enrolled}"))?;

    server.reply_json(400, json!({"code": 0, "description": "Being processed by Sectigo"}));
    if ssl.collect(cert_id, CertFormat::Pem)? != (Collected::Pending { status: Some(400) }) {
        bail!("expected pending collect while the order is processed");
    }

    server.reply(Response::new(200).with_text("-----BEGIN CERTIFICATE-----\nMIIC\n"));
    let pem = ssl
        .collect(cert_id, CertFormat::Pem)?
        .into_ready()
        .ok_or_else(|| anyhow!("expected certificate body"))?;
    assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));

    server.reply_json(200, json!({"sslId": 1002}));
    assert_eq!(ssl.renew(cert_id)?["sslId"], 1002);

    server.reply(Response::new(204));
    ssl.revoke(cert_id, "superseded")?;

    assert_eq!(
        server.urls(),
        vec![
            url("/ssl/v1/types"),
            url("/ssl/v1/customFields"),
            url("/ssl/v1/enroll"),
            url("/ssl/v1/collect/1001/pem"),
            url("/ssl/v1/collect/1001/pem"),
            url("/ssl/v1/renewById/1001"),
            url("/ssl/v1/revoke/1001"),
        ]
    );
    Ok(())
}

#[test]
fn ssl_catalog_is_fetched_once_across_enrollments() -> Result<()> {
    let server = FakeServer::start();
    let ssl = server.client().ssl();

    script_ssl_catalog(&server);
    server.reply_json(200, json!({"sslId": 1}));
    server.reply_json(200, json!({"sslId": 2}));

    let mut request = SslEnrollment::new("InCommon Wildcard SSL Certificate (SHA-2)", CSR, 365, 12);
    request.custom_fields = vec![CustomField::new("ticket", "OPS-2")];
    ssl.enroll(&request)?;
    ssl.enroll(&request)?;

    assert_eq!(server.requests().len(), 4);
    Ok(())
}

#[test]
fn ssl_invalid_enrollments_never_reach_the_server() -> Result<()> {
    let server = FakeServer::start();
    let ssl = server.client().ssl();
    script_ssl_catalog(&server);

    let mut request = SslEnrollment::new("InCommon Wildcard SSL Certificate (SHA-2)", CSR, 730, 12);
    request.custom_fields = vec![CustomField::new("ticket", "OPS-3")];
    match ssl.enroll(&request) {
        Err(Error::Validation(msg)) if msg.contains("Valid terms are 365") => {}
        other => bail!("expected term validation error, got {other:?}"),
    }

    request.term = 365;
    request.custom_fields.push(CustomField::new("ticket", "OPS-4"));
    match ssl.enroll(&request) {
        Err(Error::Validation(msg)) if msg.starts_with("too many") => {}
        other => bail!("expected duplicate custom field error, got {other:?}"),
    }

    assert!(server.requests().iter().all(|r| !r.url.ends_with("/enroll")));
    Ok(())
}

#[test]
fn ssl_listing_walks_pages_lazily() -> Result<()> {
    let server = FakeServer::start();
    let ssl = server.client().ssl();
    server.reply_json(200, json!([{"sslId": 1}, {"sslId": 2}]));
    server.reply_json(200, json!([{"sslId": 3}, {"sslId": 4}]));

    let filter = CertificateFilter {
        org_id: Some(12),
        ..Default::default()
    };
    let first_three: Vec<Value> = ssl
        .list(&filter, PageRequest::new(2, 0))
        .take(3)
        .collect::<cert_manager::Result<_>>()?;

    assert_eq!(first_three.len(), 3);
    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(query(&requests[1], "position"), Some("2"));
    assert_eq!(query(&requests[1], "orgId"), Some("12"));
    Ok(())
}

#[test]
fn smime_collect_distinguishes_pending_revoked_and_failures() -> Result<()> {
    let server = FakeServer::start();
    let smime = server.client().smime();

    server.reply_json(400, json!({"code": -183, "description": "pending"}));
    server.reply_json(400, json!({"code": -192, "description": "revoked"}));
    server.reply_json(400, json!({"code": -105, "description": "invalid id"}));

    assert!(matches!(
        smime.collect(8, CertFormat::X509)?,
        Collected::Pending { .. }
    ));
    assert_eq!(smime.collect(8, CertFormat::X509)?, Collected::Revoked);
    match smime.collect(8, CertFormat::X509) {
        Err(Error::Http(err)) => assert_eq!(err.body().and_then(|b| b.code), Some(-105)),
        other => bail!("expected the original HTTP error, got {other:?}"),
    }

    let request = server.last_request()?;
    assert_eq!(request.url, url("/smime/v1/collect/8"));
    assert_eq!(query(&request, "format"), Some("x509"));
    Ok(())
}

#[test]
fn smime_newer_version_calls_leave_default_address_intact() -> Result<()> {
    let server = FakeServer::start();
    let smime = server.client().smime();

    server.reply_json(200, json!([{"id": 1}]));
    server.reply_json(500, json!({"code": -1, "description": "down"}));
    server.reply_json(200, json!({"orderNumber": 5}));

    smime.list_by_email("jane@example.com")?;
    assert!(smime.replace(5, &SmimeReplacement::new(CSR, "rekey")).is_err());
    smime.renew(5)?;

    assert_eq!(
        server.urls(),
        vec![
            url("/smime/v2/byPersonEmail/jane%40example.com"),
            url("/smime/v2/replace/order/5"),
            url("/smime/v1/renew/order/5"),
        ]
    );
    Ok(())
}
