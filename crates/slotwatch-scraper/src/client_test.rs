use std::collections::BTreeMap;

use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::error::ChallengeError;

const CHALLENGE_PAGE: &str = r#"<html><body>
<script>
function challenge() {
  var form = document.forms[0];
  form.token.value = "abc" + "123";
  var sum = 0;
  for (var i = 0; i < 10; i++) { sum += i; }
  form.checksum.value = sum;
}
</script>
<form action="/next" method="post">
  <input type="hidden" name="token" id="token" value="" />
  <input type="hidden" name="checksum" id="checksum" value="" />
</form>
</body></html>"#;

fn office() -> Office {
    Office {
        name: "SJ".to_string(),
        id: "516".to_string(),
        lat: 37.35,
        lng: -121.85,
    }
}

fn settings(drive_test: bool) -> WatchSettings {
    let mut form_fields = BTreeMap::new();
    form_fields.insert("mode".to_string(), "OfficeVisit".to_string());
    form_fields.insert("firstName".to_string(), "Jane".to_string());

    WatchSettings {
        home: "123 Main St".to_string(),
        max_distance_miles: 50.0,
        check_every_minutes: 10,
        seconds_between_requests: 0,
        find_appointment_within_days: 30.0,
        drive_test,
        schedule: BTreeMap::new(),
        form_fields,
    }
}

#[tokio::test]
async fn two_stage_pipeline_recovers_fields_and_returns_results() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("officeId=516"))
        .and(body_string_contains("numberItems=1"))
        .and(body_string_contains("taskRWT=true"))
        .and(body_string_contains("firstName=Jane"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHALLENGE_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/wasapp/foa/findOfficeVisit.do"))
        .and(body_string_contains("token=abc123"))
        .and(body_string_contains("checksum=45"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>results</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = AppointmentClient::new(&server.uri(), "test-agent", 5).unwrap();
    let html = client
        .fetch_appointment_page(&office(), &settings(false))
        .await
        .unwrap();
    assert_eq!(html, "<html>results</html>");
}

#[tokio::test]
async fn drive_test_mode_uses_the_drive_test_flow() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("requestedTask=DT"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHALLENGE_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/wasapp/foa/findDriveTest.do"))
        .respond_with(ResponseTemplate::new(200).set_body_string("dt results"))
        .expect(1)
        .mount(&server)
        .await;

    let client = AppointmentClient::new(&server.uri(), "test-agent", 5).unwrap();
    let html = client
        .fetch_appointment_page(&office(), &settings(true))
        .await
        .unwrap();
    assert_eq!(html, "dt results");
}

#[tokio::test]
async fn non_success_status_is_an_unexpected_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = AppointmentClient::new(&server.uri(), "test-agent", 5).unwrap();
    let err = client
        .fetch_appointment_page(&office(), &settings(false))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ScraperError::UnexpectedStatus { status: 500, .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn connection_refused_is_a_network_error() {
    // Nothing listens on port 1.
    let client = AppointmentClient::new("http://127.0.0.1:1", "test-agent", 5).unwrap();
    let err = client
        .fetch_appointment_page(&office(), &settings(false))
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::Http(_)), "got: {err:?}");
}

#[tokio::test]
async fn challenge_failure_aborts_before_the_second_request() {
    let server = MockServer::start().await;

    // Interstitial with no form: the pipeline must stop at stage 2. No mock is
    // mounted for the results path, so a stray second POST would 404 the test.
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = AppointmentClient::new(&server.uri(), "test-agent", 5).unwrap();
    let err = client
        .fetch_appointment_page(&office(), &settings(false))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ScraperError::Challenge(ChallengeError::NoForm)),
        "got: {err:?}"
    );
}
