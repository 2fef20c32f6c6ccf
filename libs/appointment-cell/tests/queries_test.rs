use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

async fn create_test_app(config: AppConfig) -> Router {
    appointment_routes(Arc::new(config))
}

fn test_config(mock_server: &MockServer) -> AppConfig {
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();
    config
}

fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Mounts the join lookups shared by the list tests: one doctor row and
/// two patient rows behind id=in.(...) queries.
async fn mount_doctor_view_mocks(
    mock_server: &MockServer,
    doctor_id: Uuid,
    patient_one: Uuid,
    patient_two: Uuid,
) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("email", "eq.aoife.brennan@clinic.ie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(
                &doctor_id.to_string(),
                "Dr. Aoife Brennan",
                "Cardiology",
                "aoife.brennan@clinic.ie",
                &["09:00-09:30", "10:00-10:30"],
            ),
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("in.({})", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(
                &doctor_id.to_string(),
                "Dr. Aoife Brennan",
                "Cardiology",
                "aoife.brennan@clinic.ie",
                &["09:00-09:30", "10:00-10:30"],
            ),
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("in.({},{})", patient_one, patient_two)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_response(
                &patient_one.to_string(),
                "Sean Murphy",
                "sean.murphy@example.com",
            ),
            MockSupabaseResponses::patient_response(
                &patient_two.to_string(),
                "Ciara O'Brien",
                "ciara.obrien@example.com",
            ),
        ])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_doctor_appointments_list_all() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let doctor_id = Uuid::new_v4();
    let patient_one = Uuid::new_v4();
    let patient_two = Uuid::new_v4();

    mount_doctor_view_mocks(&mock_server, doctor_id, patient_one, patient_two).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &Uuid::new_v4().to_string(),
                &doctor_id.to_string(),
                &patient_one.to_string(),
                "2026-09-14T09:00:00+00:00",
                "scheduled",
            ),
            MockSupabaseResponses::appointment_response(
                &Uuid::new_v4().to_string(),
                &doctor_id.to_string(),
                &patient_two.to_string(),
                "2026-09-14T10:00:00+00:00",
                "scheduled",
            ),
        ])))
        .mount(&mock_server)
        .await;

    let user = TestUser::doctor("aoife.brennan@clinic.ie");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let response = app.oneshot(get_request("/doctor", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = response_json(response).await;
    assert_eq!(json_response["success"], true);

    let appointments = json_response["appointments"].as_array().unwrap();
    assert_eq!(appointments.len(), 2);
    assert_eq!(appointments[0]["doctor_name"], "Dr. Aoife Brennan");
    assert_eq!(appointments[0]["patient_name"], "Sean Murphy");
    assert_eq!(appointments[0]["patient_email"], "sean.murphy@example.com");
    assert_eq!(appointments[0]["patient_phone"], "+353851234567");
    assert_eq!(appointments[1]["patient_name"], "Ciara O'Brien");
}

#[tokio::test]
async fn test_doctor_appointments_patient_name_fragment() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let doctor_id = Uuid::new_v4();
    let patient_one = Uuid::new_v4();
    let patient_two = Uuid::new_v4();

    mount_doctor_view_mocks(&mock_server, doctor_id, patient_one, patient_two).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &Uuid::new_v4().to_string(),
                &doctor_id.to_string(),
                &patient_one.to_string(),
                "2026-09-14T09:00:00+00:00",
                "scheduled",
            ),
            MockSupabaseResponses::appointment_response(
                &Uuid::new_v4().to_string(),
                &doctor_id.to_string(),
                &patient_two.to_string(),
                "2026-09-14T10:00:00+00:00",
                "scheduled",
            ),
        ])))
        .mount(&mock_server)
        .await;

    let user = TestUser::doctor("aoife.brennan@clinic.ie");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    // Case-insensitive substring match applied after the join.
    let response = app
        .oneshot(get_request("/doctor?patient_name=murphy", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = response_json(response).await;
    let appointments = json_response["appointments"].as_array().unwrap();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0]["patient_name"], "Sean Murphy");
}

#[tokio::test]
async fn test_doctor_appointments_date_window_with_placeholder_name() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let doctor_id = Uuid::new_v4();
    let patient_one = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("email", "eq.aoife.brennan@clinic.ie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(
                &doctor_id.to_string(),
                "Dr. Aoife Brennan",
                "Cardiology",
                "aoife.brennan@clinic.ie",
                &["09:00-09:30"],
            ),
        ])))
        .mount(&mock_server)
        .await;

    // The day filter must arrive as a half-open window on the column.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("appointment_time", "gte.2026-09-14T00:00:00+00:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &Uuid::new_v4().to_string(),
                &doctor_id.to_string(),
                &patient_one.to_string(),
                "2026-09-14T09:00:00+00:00",
                "scheduled",
            ),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("in.({})", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(
                &doctor_id.to_string(),
                "Dr. Aoife Brennan",
                "Cardiology",
                "aoife.brennan@clinic.ie",
                &["09:00-09:30"],
            ),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("in.({})", patient_one)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_response(
                &patient_one.to_string(),
                "Sean Murphy",
                "sean.murphy@example.com",
            ),
        ])))
        .mount(&mock_server)
        .await;

    let user = TestUser::doctor("aoife.brennan@clinic.ie");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    // "all" is a placeholder, not a name filter.
    let response = app
        .oneshot(get_request("/doctor?patient_name=all&date=2026-09-14", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = response_json(response).await;
    assert_eq!(json_response["appointments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_doctor_appointments_invalid_date() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let user = TestUser::doctor("aoife.brennan@clinic.ie");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let response = app
        .oneshot(get_request("/doctor?date=14-09-2026", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json_response = response_json(response).await;
    assert_eq!(json_response["error"], "Invalid date format. Use YYYY-MM-DD");
}

#[tokio::test]
async fn test_doctor_appointments_unknown_doctor() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let user = TestUser::doctor("ghost@clinic.ie");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let response = app.oneshot(get_request("/doctor", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json_response = response_json(response).await;
    assert_eq!(json_response["error"], "Doctor not found");
}

#[tokio::test]
async fn test_doctor_appointments_rejects_patient_token() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let user = TestUser::patient("sean.murphy@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let response = app.oneshot(get_request("/doctor", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

async fn mount_patient_view_mocks(
    mock_server: &MockServer,
    patient_id: Uuid,
    doctor_one: Uuid,
    doctor_two: Uuid,
) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("email", "eq.sean.murphy@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_response(
                &patient_id.to_string(),
                "Sean Murphy",
                "sean.murphy@example.com",
            ),
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("in.({},{})", doctor_one, doctor_two)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(
                &doctor_one.to_string(),
                "Dr. Aoife Brennan",
                "Cardiology",
                "aoife.brennan@clinic.ie",
                &["09:00-09:30"],
            ),
            MockSupabaseResponses::doctor_response(
                &doctor_two.to_string(),
                "Dr. Liam Walsh",
                "Dermatology",
                "liam.walsh@clinic.ie",
                &["10:00-10:30"],
            ),
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("in.({})", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_response(
                &patient_id.to_string(),
                "Sean Murphy",
                "sean.murphy@example.com",
            ),
        ])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_patient_appointments_list_all() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let patient_id = Uuid::new_v4();
    let doctor_one = Uuid::new_v4();
    let doctor_two = Uuid::new_v4();

    mount_patient_view_mocks(&mock_server, patient_id, doctor_one, doctor_two).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", format!("eq.{}", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &Uuid::new_v4().to_string(),
                &doctor_one.to_string(),
                &patient_id.to_string(),
                "2026-09-14T09:00:00+00:00",
                "scheduled",
            ),
            MockSupabaseResponses::appointment_response(
                &Uuid::new_v4().to_string(),
                &doctor_two.to_string(),
                &patient_id.to_string(),
                "2026-06-02T10:00:00+00:00",
                "completed",
            ),
        ])))
        .mount(&mock_server)
        .await;

    let user = TestUser::patient("sean.murphy@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let response = app.oneshot(get_request("/patient", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = response_json(response).await;
    let appointments = json_response["appointments"].as_array().unwrap();
    assert_eq!(appointments.len(), 2);
    assert_eq!(appointments[0]["doctor_name"], "Dr. Aoife Brennan");
    assert_eq!(appointments[1]["doctor_name"], "Dr. Liam Walsh");
    assert_eq!(appointments[1]["status"], "completed");
}

#[tokio::test]
async fn test_patient_appointments_future_condition() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("email", "eq.sean.murphy@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_response(
                &patient_id.to_string(),
                "Sean Murphy",
                "sean.murphy@example.com",
            ),
        ])))
        .mount(&mock_server)
        .await;

    // A condition narrows on the stored flag and orders ascending.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", format!("eq.{}", patient_id)))
        .and(query_param("status", "eq.scheduled"))
        .and(query_param("order", "appointment_time.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &Uuid::new_v4().to_string(),
                &doctor_id.to_string(),
                &patient_id.to_string(),
                "2026-09-14T09:00:00+00:00",
                "scheduled",
            ),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("in.({})", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(
                &doctor_id.to_string(),
                "Dr. Aoife Brennan",
                "Cardiology",
                "aoife.brennan@clinic.ie",
                &["09:00-09:30"],
            ),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("in.({})", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_response(
                &patient_id.to_string(),
                "Sean Murphy",
                "sean.murphy@example.com",
            ),
        ])))
        .mount(&mock_server)
        .await;

    let user = TestUser::patient("sean.murphy@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let response = app
        .oneshot(get_request("/patient?condition=future", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = response_json(response).await;
    let appointments = json_response["appointments"].as_array().unwrap();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0]["status"], "scheduled");
}

#[tokio::test]
async fn test_patient_appointments_doctor_name_fragment() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let patient_id = Uuid::new_v4();
    let doctor_one = Uuid::new_v4();
    let doctor_two = Uuid::new_v4();

    mount_patient_view_mocks(&mock_server, patient_id, doctor_one, doctor_two).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", format!("eq.{}", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &Uuid::new_v4().to_string(),
                &doctor_one.to_string(),
                &patient_id.to_string(),
                "2026-09-14T09:00:00+00:00",
                "scheduled",
            ),
            MockSupabaseResponses::appointment_response(
                &Uuid::new_v4().to_string(),
                &doctor_two.to_string(),
                &patient_id.to_string(),
                "2026-09-15T10:00:00+00:00",
                "scheduled",
            ),
        ])))
        .mount(&mock_server)
        .await;

    let user = TestUser::patient("sean.murphy@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let response = app
        .oneshot(get_request("/patient?doctor_name=walsh", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = response_json(response).await;
    let appointments = json_response["appointments"].as_array().unwrap();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0]["doctor_name"], "Dr. Liam Walsh");
}

#[tokio::test]
async fn test_patient_appointments_invalid_condition() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let user = TestUser::patient("sean.murphy@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let response = app
        .oneshot(get_request("/patient?condition=sometime", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json_response = response_json(response).await;
    assert_eq!(
        json_response["error"],
        "Invalid condition. Use 'past' or 'future'."
    );
}

#[tokio::test]
async fn test_patient_appointments_unknown_patient() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let user = TestUser::patient("ghost@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let response = app.oneshot(get_request("/patient", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json_response = response_json(response).await;
    assert_eq!(json_response["error"], "Patient not found");
}
