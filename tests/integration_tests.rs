use httpmock::prelude::*;
use httpmock::Mock;
use peppol_lookup::core::inference::{
    HERMES_MIGRATION_URL, HERMES_PROVIDER, TEAMLEADER_ACCESS_POINT, TEAMLEADER_ENDPOINT,
};
use peppol_lookup::domain::model::ParticipantReport;
use peppol_lookup::{
    Language, LookupConfig, LookupEngine, LookupError, OutputFormat, OutputMode, Renderer,
    ReportView,
};
use regex::Regex;
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;

const BODY: &str = "0123456749";
const INVOICE_DOCTYPE: &str = "busdox-docid-qns::urn:oasis:names:specification:ubl:schema:xsd:Invoice-2::Invoice##urn:cen.eu:en16931:2017#compliant#urn:fdc:peppol.eu:2017:poacc:billing:3.0::2.1";

/// Participant id as it appears in a request path, encoded or not.
fn pid_pattern(scheme: &str) -> String {
    let value = match scheme {
        "9925" => format!("BE{}", BODY),
        _ => BODY.to_string(),
    };
    format!("iso6523-actorid-upis(%3A|:)(%3A|:){}(%3A|:){}", scheme, value)
}

fn path_regex(facet: &str, scheme: &str, suffix: &str) -> Regex {
    Regex::new(&format!(
        "^/{}/digitprod/{}{}$",
        facet,
        pid_pattern(scheme),
        suffix
    ))
    .unwrap()
}

fn mock_json<'a>(
    server: &'a MockServer,
    facet: &str,
    scheme: &str,
    suffix: &str,
    status: u16,
    body: Value,
) -> Mock<'a> {
    let regex = path_regex(facet, scheme, suffix);
    server.mock(|when, then| {
        when.method(GET).path_matches(regex);
        then.status(status)
            .header("Content-Type", "application/json")
            .json_body(body);
    })
}

fn existence(server: &MockServer, scheme: &str, exists: bool) {
    mock_json(
        server,
        "ppidexistence",
        scheme,
        "",
        200,
        json!({ "exists": exists, "smpHostURI": "https://smp.example-host.eu/" }),
    );
}

fn business_card(server: &MockServer, scheme: &str, country: Option<&str>) {
    mock_json(
        server,
        "businesscard",
        scheme,
        "",
        200,
        json!({
            "entity": [{
                "name": [{ "name": "Acme BV" }],
                "countrycode": country,
                "geoinfo": "Gent",
                "contact": [{ "email": "info@acme.be" }]
            }]
        }),
    );
}

fn catalogue<'a>(server: &'a MockServer, scheme: &str) -> Mock<'a> {
    mock_json(
        server,
        "smpquery",
        scheme,
        "",
        200,
        json!({
            "smpHostURI": "https://smp.example-host.eu/",
            "urls": [
                { "href": "x", "documentTypeID": "busdox-docid-qns::urn:oasis:names:specification:ubl:schema:xsd:CreditNote-2::CreditNote" },
                { "href": "y", "documentTypeID": INVOICE_DOCTYPE, "niceName": "Peppol BIS Billing UBL Invoice V3" }
            ]
        }),
    )
}

fn service_detail<'a>(server: &'a MockServer, scheme: &str, endpoint: Value) -> Mock<'a> {
    mock_json(
        server,
        "smpquery",
        scheme,
        "/.*Invoice.*",
        200,
        json!({
            "documentTypeID": INVOICE_DOCTYPE,
            "serviceinfo": {
                "processes": [{
                    "processID": "urn:fdc:peppol.eu:2017:poacc:billing:01:1.0",
                    "endpoints": [endpoint]
                }]
            }
        }),
    )
}

fn config_for(server: &MockServer) -> LookupConfig {
    let mut config = LookupConfig::default();
    config.directory.base_url = server.base_url();
    config.directory.timeout_seconds = 5;
    config
}

fn engine_for(config: &LookupConfig) -> LookupEngine<peppol_lookup::DirectoryClient> {
    LookupEngine::from_config(config).unwrap()
}

fn pair(view: ReportView) -> (ParticipantReport, ParticipantReport) {
    match view {
        ReportView::Pair { enterprise, vat } => (enterprise, vat),
        other => panic!("expected pair view, got {:?}", other),
    }
}

#[tokio::test]
async fn test_end_to_end_teamleader_participant() {
    let server = MockServer::start();

    existence(&server, "0208", true);
    business_card(&server, "0208", Some("BE"));
    let catalogue_mock = catalogue(&server, "0208");
    let detail_mock = service_detail(
        &server,
        "0208",
        json!({
            "transportProfile": "peppol-transport-as4-v2_0",
            "endpointReference": "https://ap.some-hosting.net/as4",
            "technicalContactUrl": "mailto:Peppol@Teamleader.eu",
            "certificateDetails": { "subject": "CN=PBE000123, O=Some Hosting NV, C=BE" }
        }),
    );
    existence(&server, "9925", false);

    let engine = engine_for(&config_for(&server));
    let report = engine.lookup("BE 0123.456.749").await.unwrap();

    catalogue_mock.assert();
    detail_mock.assert();
    assert_eq!(report.query, BODY);

    let (enterprise, vat) = pair(report.view);
    assert!(enterprise.exists);
    assert!(!vat.exists);

    for side in [&enterprise, &vat] {
        assert_eq!(side.company_name.as_value(), Some("Acme BV"));
        assert_eq!(side.country.as_value(), Some("BE"));
        assert_eq!(side.location.as_value(), Some("Gent"));
        assert_eq!(side.technical_contact.as_value(), Some("Peppol@Teamleader.eu"));
        assert_eq!(side.access_point.as_value(), Some(TEAMLEADER_ACCESS_POINT));
        assert_eq!(side.service_endpoint.as_value(), Some(TEAMLEADER_ENDPOINT));
        assert_eq!(side.document_types.len(), 2);
    }
    assert_eq!(
        vat.participant_id,
        format!("iso6523-actorid-upis::9925:BE{}", BODY)
    );
}

#[tokio::test]
async fn test_government_channel_is_terminal() {
    let server = MockServer::start();

    existence(&server, "0208", true);
    business_card(&server, "0208", Some("BE"));
    catalogue(&server, "0208");
    service_detail(
        &server,
        "0208",
        json!({
            "endpointReference": "https://ap.hermes-belgium.be/as4",
            "technicalContactUrl": "mailto:einvoice@bosa.fgov.be"
        }),
    );

    let config = config_for(&server);
    let report = engine_for(&config).lookup(BODY).await.unwrap();

    assert_eq!(
        report.view,
        ReportView::GovernmentChannel {
            provider: HERMES_PROVIDER.to_string(),
            migration_url: HERMES_MIGRATION_URL.to_string(),
        }
    );

    let text = Renderer::new(Language::En, OutputFormat::Text)
        .render(report)
        .unwrap();
    assert!(text.contains(HERMES_MIGRATION_URL));
}

#[tokio::test]
async fn test_total_failure_is_upstream_unavailable() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET);
        then.status(503);
    });

    let result = engine_for(&config_for(&server)).lookup(BODY).await;

    assert!(matches!(result, Err(LookupError::UpstreamUnavailable)));
    // 兩個 scheme 各三個 facet，不重試
    mock.assert_hits(6);
}

#[tokio::test]
async fn test_existence_defaults_true_when_only_business_card_answers() {
    let server = MockServer::start();

    mock_json(&server, "ppidexistence", "0208", "", 500, json!({}));
    business_card(&server, "0208", None);

    let report = engine_for(&config_for(&server)).lookup(BODY).await.unwrap();
    let (enterprise, vat) = pair(report.view);

    assert!(enterprise.exists);
    assert!(!vat.exists);
    assert_eq!(vat.company_name.as_value(), Some("Acme BV"));
}

#[tokio::test]
async fn test_country_is_merged_across_schemes() {
    let server = MockServer::start();

    existence(&server, "0208", true);
    business_card(&server, "0208", None);
    existence(&server, "9925", true);
    business_card(&server, "9925", Some("BE"));

    let report = engine_for(&config_for(&server)).lookup(BODY).await.unwrap();
    let (enterprise, vat) = pair(report.view);

    assert_eq!(enterprise.country.as_value(), Some("BE"));
    assert_eq!(vat.country.as_value(), Some("BE"));
    // 只剩 hosting URI 可推斷 access point
    assert_eq!(enterprise.access_point.as_value(), Some("smp.example-host.eu"));
}

#[tokio::test]
async fn test_explicit_absence_is_not_registered() {
    let server = MockServer::start();

    existence(&server, "0208", false);
    existence(&server, "9925", false);

    let result = engine_for(&config_for(&server)).lookup(BODY).await;

    match result {
        Err(LookupError::NotRegistered { participant }) => assert_eq!(participant, BODY),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_input_makes_no_requests() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET);
        then.status(200);
    });

    let engine = engine_for(&config_for(&server));
    for input in ["12345678", "012345678901", "BE01234A6749", ""] {
        assert!(engine.lookup(input).await.is_err(), "{} accepted", input);
    }

    mock.assert_hits(0);
}

#[tokio::test]
async fn test_unreachable_directory_is_transport_blocked() {
    let mut config = LookupConfig::default();
    config.directory.base_url = "http://127.0.0.1:1".to_string();
    config.directory.timeout_seconds = 5;

    let result = engine_for(&config).lookup(BODY).await;

    assert!(matches!(result, Err(LookupError::TransportBlocked)));
}

#[tokio::test]
async fn test_unreachable_relay_falls_back_to_directory() {
    let server = MockServer::start();
    existence(&server, "0208", true);
    business_card(&server, "0208", Some("BE"));

    let mut config = config_for(&server);
    config.directory.relay_url = Some("http://127.0.0.1:1/relay".to_string());

    let report = engine_for(&config).lookup(BODY).await.unwrap();
    let (enterprise, _) = pair(report.view);

    assert_eq!(enterprise.company_name.as_value(), Some("Acme BV"));
}

#[tokio::test]
async fn test_config_file_drives_single_mode_json_output() {
    let server = MockServer::start();
    existence(&server, "0208", false);
    existence(&server, "9925", true);
    business_card(&server, "9925", Some("BE"));

    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[directory]
base_url = "{}"
timeout_seconds = 5

[output]
mode = "single"
language = "nl"
format = "json"
"#,
        server.base_url()
    )
    .unwrap();

    let config = LookupConfig::from_file(file.path()).unwrap();
    let engine = engine_for(&config);
    assert_eq!(engine.mode(), OutputMode::Single);

    let report = engine.lookup(BODY).await.unwrap();
    let mut renderer = Renderer::new(Language::Nl, config.format());
    let json: Value = serde_json::from_str(&renderer.render(report).unwrap()).unwrap();

    assert_eq!(json["view"], "single");
    assert_eq!(json["participant"]["scheme"], "9925");
    assert_eq!(json["participant"]["company_name"]["value"], "Acme BV");
    assert_eq!(json["participant"]["provider"]["value"], "smp.example-host.eu");
}
